/*
MIT License

Copyright (c) 2026 Raja Lehtihet and Wael El Oraiby

Permission is hereby granted, free of charge, to any person obtaining a copy
of this software and associated documentation files (the "Software"), to deal
in the Software without restriction, including without limitation the rights
to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:

The above copyright notice and this permission notice shall be included in all
copies or substantial portions of the Software.

THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
SOFTWARE.
*/

//! Crate unit tests.

use super::*;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

fn parse(source: &str) -> Catalog {
    parse_catalog(source).expect("parse")
}

fn type_set(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|name| name.to_string()).collect()
}

fn record(fields: &[(&str, Value)]) -> Value {
    Value::Record(
        fields
            .iter()
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect(),
    )
}

fn tuple(items: &[f64]) -> Value {
    Value::Tuple(items.iter().map(|n| Value::Number(*n)).collect())
}

/// Runs one unary formula against a fresh two-type catalog.
fn formula_result(expr: &str, input: Value) -> Result<Value, ExecutionError> {
    let dsl = format!(
        "type In\ntype Out\nfn f {{\n  sig: In -> Out\n  impl: formula(\"{expr}\")\n}}\n"
    );
    let catalog = parse(&dsl);
    let plans = solve(&catalog, &type_set(&["In"]), "Out", DEFAULT_MAX_DEPTH).expect("solve");
    let context = ExecutionContext::new().bind("In", input);
    Executor::new(context).execute(&plans[0])
}

fn formula_number(expr: &str, input: Value) -> f64 {
    formula_result(expr, input)
        .expect("execute")
        .as_number()
        .expect("numeric result")
}

const TWO_STEP_CATALOG: &str = r#"
# carbon-footprint toy pipeline
type Product
type Energy [unit=J, range=>=0]
type CO2 [unit=kg]

fn usesEnergy {
  sig: Product -> Energy
  impl: formula("value * 1.0")
  cost: 1
  confidence: 0.9
}

fn energyToCO2 {
  sig: Energy -> CO2
  impl: formula("value * 0.5")
  cost: 1
  confidence: 0.95
}
"#;

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

#[test]
fn parses_types_attributes_and_products() {
    let catalog = parse(
        r#"
        type Product
        type Energy [unit=J, range=>=0]
        type All = Product x Energy
    "#,
    );

    assert!(catalog.get_type("Product").is_some());
    let energy = catalog.get_type("Energy").expect("Energy");
    assert_eq!(energy.unit(), Some("J"));
    assert_eq!(energy.attr("range"), Some(">=0"));

    let all = catalog.get_type("All").expect("All");
    assert!(all.is_product());
    assert_eq!(
        all.components.as_deref(),
        Some(&["Product".to_string(), "Energy".to_string()][..])
    );
    assert!(catalog.is_product_type("All"));
    assert!(!catalog.is_product_type("Energy"));
}

#[test]
fn parses_product_with_unicode_separator() {
    let catalog = parse("type A\ntype B\ntype C\ntype P = A × B × C");
    let p = catalog.get_type("P").expect("P");
    assert_eq!(p.components.as_ref().map(Vec::len), Some(3));
}

#[test]
fn parses_function_definitions_with_defaults() {
    let catalog = parse(
        r#"
        type Fuel
        type CO2

        fn fuelToCO2 {
          sig: Fuel -> CO2
          impl: formula("co2 = value * 2.5")
          cost: 1.5
          confidence: 0.98
          doc: "Stoichiometric conversion"
          inverse_of: co2ToFuel
        }

        fn fallback {
          sig: Fuel -> CO2
        }
    "#,
    );

    assert_eq!(catalog.funcs().len(), 2);
    let func = &catalog.funcs()[0];
    assert_eq!(func.name, "fuelToCO2");
    assert_eq!(func.domain, vec!["Fuel".to_string()]);
    assert_eq!(func.codomain, "CO2");
    assert_eq!(func.cost, 1.5);
    assert_eq!(func.confidence, 0.98);
    assert_eq!(func.doc.as_deref(), Some("Stoichiometric conversion"));
    assert_eq!(func.inverse_of.as_deref(), Some("co2ToFuel"));
    assert_eq!(func.signature(), "Fuel -> CO2");

    // Missing fields fall back: cost 1, confidence 1, identity impl.
    let fallback = &catalog.funcs()[1];
    assert_eq!(fallback.cost, 1.0);
    assert_eq!(fallback.confidence, 1.0);
    assert_eq!(fallback.implementation.kind(), "builtin");
}

#[test]
fn parses_multiarg_signatures() {
    let catalog = parse(
        r#"
        type A
        type B
        type C
        type D

        fn parens {
          sig: (A, B, C) -> D
          impl: formula("arg0 + arg1 + arg2")
        }

        fn bare {
          sig: A, B -> D
          impl: formula("arg0 + arg1")
        }
    "#,
    );

    let parens = &catalog.funcs()[0];
    assert!(parens.is_multiarg());
    assert_eq!(parens.arity(), 3);
    assert_eq!(parens.signature(), "(A, B, C) -> D");

    let bare = &catalog.funcs()[1];
    assert_eq!(bare.domain, vec!["A".to_string(), "B".to_string()]);
}

#[test]
fn indexes_functions_by_codomain_and_domain() {
    let catalog = parse(
        r#"
        type A
        type B
        type C

        fn f { sig: A -> C }
        fn g { sig: (A, B) -> C }
    "#,
    );

    assert_eq!(catalog.funcs_returning("C").len(), 2);
    assert_eq!(catalog.funcs_returning("A").len(), 0);
    assert_eq!(catalog.funcs_accepting("A").len(), 2);
    assert_eq!(catalog.funcs_accepting("B").len(), 1);
}

#[test]
fn ignores_comments_and_unknown_fields() {
    let catalog = parse(
        r#"
        # leading comment
        type A   # trailing comment
        type B

        fn f {
          sig: A -> B
          impl: formula("value + 1")
          owner: data-platform team
          priority: 3
        }
    "#,
    );
    assert_eq!(catalog.funcs().len(), 1);
    assert_eq!(catalog.funcs()[0].implementation.kind(), "formula");
}

#[test]
fn legacy_attr_lines_attach_to_preceding_type() {
    let catalog = parse(
        r#"
        type Sensor
        attr unit:Celsius
        attr precision:Float
        type Reading
    "#,
    );
    let sensor = catalog.get_type("Sensor").expect("Sensor");
    assert_eq!(sensor.attr("unit"), Some("Celsius"));
    assert_eq!(sensor.attr("precision"), Some("Float"));
    assert!(catalog.get_type("Reading").expect("Reading").attrs.is_empty());
}

#[test]
fn rejects_attr_line_without_preceding_type() {
    let err = parse_catalog("attr unit:Celsius").expect_err("parse should fail");
    assert!(err.message.contains("Attribute line"));
}

#[test]
fn reports_duplicate_type_names() {
    let err = parse_catalog("type A\ntype A").expect_err("parse should fail");
    assert_eq!(err.kind, ParseErrorKind::DuplicateTypeName);
    assert_eq!(err.line, 2);
    assert!(err.to_string().contains("Duplicate type 'A'"));
}

#[test]
fn declaration_order_is_immaterial_for_references() {
    // The function precedes its types; validation runs after the full pass.
    let catalog = parse(
        r#"
        fn f {
          sig: A -> B
          impl: formula("value")
        }
        type A
        type B
    "#,
    );
    assert_eq!(catalog.funcs().len(), 1);
}

#[test]
fn reports_undeclared_type_references() {
    let err = parse_catalog("type A\nfn f {\n  sig: A -> Nope\n}").expect_err("parse should fail");
    assert_eq!(err.kind, ParseErrorKind::UndeclaredTypeReference);
    assert!(err.to_string().contains("Nope"));
    assert_eq!(err.line, 3);
}

#[test]
fn reports_undeclared_product_components() {
    let err = parse_catalog("type A\ntype P = A x Missing").expect_err("parse should fail");
    assert_eq!(err.kind, ParseErrorKind::UndeclaredTypeReference);
    assert!(err.to_string().contains("Missing"));
}

#[test]
fn reports_missing_sig_field() {
    let err =
        parse_catalog("type A\nfn f {\n  impl: formula(\"value\")\n}").expect_err("parse should fail");
    assert_eq!(err.kind, ParseErrorKind::MalformedSignature);
    assert!(err.message.contains("missing its 'sig'"));
}

#[test]
fn reports_malformed_signatures() {
    for (case, source) in [
        ("missing codomain", "type A\nfn f {\n  sig: A ->\n}"),
        ("missing domain", "type A\nfn f {\n  sig: -> A\n}"),
        ("empty parens", "type A\nfn f {\n  sig: () -> A\n}"),
        ("missing arrow", "type A\nfn f {\n  sig: A B\n}"),
    ] {
        let err = parse_catalog(source).expect_err(case);
        assert_eq!(err.kind, ParseErrorKind::MalformedSignature, "{case}");
        assert!(err.line > 0, "{case}: expected a line number");
    }
}

#[test]
fn reports_malformed_impls() {
    for (case, source) in [
        (
            "unknown kind",
            "type A\nfn f {\n  sig: A -> A\n  impl: python(\"x\")\n}",
        ),
        (
            "unquoted argument",
            "type A\nfn f {\n  sig: A -> A\n  impl: formula(value)\n}",
        ),
        (
            "bad json literal",
            "type A\nfn f {\n  sig: A -> A\n  impl: json({broken})\n}",
        ),
    ] {
        let err = parse_catalog(source).expect_err(case);
        assert_eq!(err.kind, ParseErrorKind::MalformedImpl, "{case}");
    }
}

#[test]
fn reports_invalid_embedded_expressions_as_malformed_impls() {
    let err = parse_catalog(
        "type A\nfn f {\n  sig: A -> A\n  impl: formula(\"value +\")\n}",
    )
    .expect_err("parse should fail");
    assert_eq!(err.kind, ParseErrorKind::MalformedImpl);
    assert!(err.message.contains("value +"));

    let err = parse_catalog(
        "type A\nfn f {\n  sig: A -> A\n  impl: json({\"x\": \"1 +\"})\n}",
    )
    .expect_err("parse should fail");
    assert_eq!(err.kind, ParseErrorKind::MalformedImpl);
}

#[test]
fn reports_unterminated_function_blocks() {
    let err = parse_catalog("type A\nfn f {\n  sig: A -> A").expect_err("parse should fail");
    assert_eq!(err.kind, ParseErrorKind::UnterminatedFunctionBlock);
    assert!(err.line > 0);
}

#[test]
fn reports_line_and_caret_for_syntax_errors() {
    let err = parse_catalog("type A\nwobble B").expect_err("parse should fail");
    assert_eq!(err.line, 2);
    assert!(err.column > 0);
    assert_eq!(err.snippet, "wobble B");
    assert!(err.pointer.contains('^'));
}

#[test]
fn rejects_negative_cost_and_out_of_range_confidence() {
    let err = parse_catalog("type A\nfn f {\n  sig: A -> A\n  cost: -1\n}")
        .expect_err("parse should fail");
    assert!(err.message.contains("negative cost"));

    let err = parse_catalog("type A\nfn f {\n  sig: A -> A\n  confidence: 1.5\n}")
        .expect_err("parse should fail");
    assert!(err.message.contains("confidence"));
}

#[test]
fn parses_rest_method_and_url() {
    let catalog = parse(
        r#"
        type A
        type B
        fn fetch {
          sig: A -> B
          impl: rest("GET, https://api.example.com/v1/lookup")
        }
        fn bare {
          sig: A -> B
          impl: rest("https://api.example.com/v1/lookup")
        }
    "#,
    );
    match &catalog.funcs()[0].implementation {
        Impl::Rest { method, url } => {
            assert_eq!(method.as_deref(), Some("GET"));
            assert_eq!(url, "https://api.example.com/v1/lookup");
        }
        other => panic!("unexpected impl {other:?}"),
    }
    match &catalog.funcs()[1].implementation {
        Impl::Rest { method, url } => {
            assert!(method.is_none());
            assert_eq!(url, "https://api.example.com/v1/lookup");
        }
        other => panic!("unexpected impl {other:?}"),
    }
}

#[test]
fn canonical_pretty_print_round_trips() {
    let catalog = parse(
        r#"
        type Product
        type Energy [unit=J, range=>=0]
        type CO2 [unit=kg]
        type All = Product x Energy

        fn usesEnergy {
          sig: Product -> Energy
          impl: sparql("SELECT ?e WHERE { ?p :usesEnergy ?e }")
          cost: 2
          confidence: 0.9
          doc: "Lookup from the asset graph"
        }

        fn report {
          sig: (Energy, CO2) -> All
          impl: json({"energy": "arg0", "co2": "arg1 * 2", "audited": true})
          cost: 1
        }

        fn label {
          sig: CO2 -> Product
          impl: template("CO2: {{amount}} kg", {"amount": "value"})
          inverse_of: usesEnergy
        }
    "#,
    );

    let canonical = catalog.to_dsl();
    let reparsed = parse(&canonical);
    assert_eq!(reparsed.to_dsl(), canonical);
}

// ---------------------------------------------------------------------------
// Expression evaluation
// ---------------------------------------------------------------------------

#[test]
fn evaluates_arithmetic_with_precedence() {
    assert_eq!(formula_number("2 + 3 * 4", Value::Number(0.0)), 14.0);
    assert_eq!(formula_number("(1 + 2) * 3", Value::Number(0.0)), 9.0);
    assert_eq!(formula_number("2 ** 3 ** 2", Value::Number(0.0)), 512.0);
    assert_eq!(formula_number("-2 ** 2", Value::Number(0.0)), -4.0);
    assert_eq!(formula_number("7 % 4", Value::Number(0.0)), 3.0);
    assert_eq!(formula_number("value * 2", Value::Number(10.0)), 20.0);
    assert_eq!(formula_number("x + 100", Value::Number(20.0)), 120.0);
}

#[test]
fn strips_one_assignment_prefix_from_formulas() {
    assert_eq!(formula_number("y = x * 2", Value::Number(21.0)), 42.0);
    // `==` never starts an assignment prefix.
    assert_eq!(
        formula_result("value == 5 ? 1 : 0", Value::Number(5.0)).expect("execute"),
        Value::Number(1.0)
    );
}

#[test]
fn evaluates_comparisons_logic_and_ternary() {
    assert_eq!(
        formula_result("value >= 10 && value < 100", Value::Number(42.0)).expect("execute"),
        Value::Bool(true)
    );
    assert_eq!(
        formula_result("value < 10 || value == 42", Value::Number(42.0)).expect("execute"),
        Value::Bool(true)
    );
    assert_eq!(
        formula_result("!(value > 0)", Value::Number(3.0)).expect("execute"),
        Value::Bool(false)
    );
    assert_eq!(
        formula_result("value > 10 ? 'big' : 'small'", Value::Number(42.0)).expect("execute"),
        Value::Str("big".to_string())
    );
}

#[test]
fn evaluates_member_and_index_access() {
    let input = record(&[("fuel", Value::Number(400.0)), ("elec", Value::Number(3000.0))]);
    assert_eq!(formula_number("value.fuel + value.elec", input.clone()), 3400.0);
    assert_eq!(formula_number("value['fuel'] * 2", input.clone()), 800.0);
    // Record fields are also spread into the scope directly.
    assert_eq!(formula_number("fuel + elec", input), 3400.0);

    let seq = tuple(&[10.0, 20.0, 30.0]);
    assert_eq!(formula_number("value[1]", seq.clone()), 20.0);
    assert_eq!(formula_number("value[-1]", seq), 30.0);
}

#[test]
fn evaluates_whitelisted_calls() {
    assert_eq!(formula_number("abs(value)", Value::Number(-3.0)), 3.0);
    assert_eq!(formula_number("round(value)", Value::Number(2.6)), 3.0);
    assert_eq!(formula_number("sqrt(16)", Value::Number(0.0)), 4.0);
    assert_eq!(formula_number("min(4, 2, 9)", Value::Number(0.0)), 2.0);
    assert_eq!(formula_number("max(value)", tuple(&[1.0, 7.0, 5.0])), 7.0);
    assert_eq!(formula_number("sum(value)", tuple(&[1.0, 2.0, 3.0])), 6.0);
    assert_eq!(formula_number("len(value)", tuple(&[1.0, 2.0, 3.0])), 3.0);
    assert_eq!(formula_number("int('42') + 1", Value::Number(0.0)), 43.0);
    assert_eq!(
        formula_result("str(value) + '!'", Value::Number(7.0)).expect("execute"),
        Value::Str("7!".to_string())
    );
    assert_eq!(
        formula_result("isinstance(value, 'number')", Value::Number(1.0)).expect("execute"),
        Value::Bool(true)
    );
}

#[test]
fn rejects_unknown_functions_without_side_effects() {
    let err = formula_result("system('rm -rf /')", Value::Number(1.0)).expect_err("must fail");
    match err {
        ExecutionError::Expression { function, source } => {
            assert_eq!(function, "f");
            assert!(source.message.contains("unknown function 'system'"));
            assert_eq!(source.expression, "system('rm -rf /')");
            assert!(!source.scope_keys.is_empty());
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn rejects_unknown_identifiers() {
    let err = formula_result("value + emission_factor", Value::Number(1.0)).expect_err("must fail");
    assert!(err.to_string().contains("unknown identifier 'emission_factor'"));
}

#[test]
fn context_variables_seed_the_scope() {
    let catalog = parse(
        "type Fuel\ntype CO2\nfn conv {\n  sig: Fuel -> CO2\n  impl: formula(\"value * emission_factor\")\n}",
    );
    let plans = solve(&catalog, &type_set(&["Fuel"]), "CO2", DEFAULT_MAX_DEPTH).expect("solve");
    let context = ExecutionContext::new()
        .bind("Fuel", 100.0)
        .with_variable("emission_factor", 2.5);
    let result = Executor::new(context).execute(&plans[0]).expect("execute");
    assert_eq!(result, Value::Number(250.0));
}

#[test]
fn positional_args_override_spread_record_fields() {
    let catalog = parse(
        "type A\ntype B\ntype C\nfn f {\n  sig: (A, B) -> C\n  impl: formula(\"arg1 + fuel\")\n}",
    );
    let plans = solve(&catalog, &type_set(&["A", "B"]), "C", DEFAULT_MAX_DEPTH).expect("solve");
    let context = ExecutionContext::new()
        .bind(
            "A",
            record(&[("arg1", Value::Number(999.0)), ("fuel", Value::Number(400.0))]),
        )
        .bind("B", 7.0);
    let result = Executor::new(context).execute(&plans[0]).expect("execute");
    // The spread `arg1` field loses to the positional binding.
    assert_eq!(result, Value::Number(407.0));
}

// ---------------------------------------------------------------------------
// Solver
// ---------------------------------------------------------------------------

#[test]
fn goal_in_sources_yields_identity_leaf() {
    let catalog = parse("type A");
    let plans = solve(&catalog, &type_set(&["A"]), "A", DEFAULT_MAX_DEPTH).expect("solve");
    assert_eq!(plans.len(), 1);
    let leaf = &plans[0];
    assert!(leaf.is_leaf());
    assert_eq!(leaf.cost, 0.0);
    assert_eq!(leaf.confidence, 1.0);
    assert_eq!(leaf.proof_string(), "id");
}

#[test]
fn empty_catalog_without_source_match_yields_no_plans() {
    let catalog = parse("type A\ntype B");
    let plans = solve(&catalog, &type_set(&["A"]), "B", DEFAULT_MAX_DEPTH).expect("solve");
    assert!(plans.is_empty());
}

#[test]
fn two_step_unary_pipeline() {
    let catalog = parse(TWO_STEP_CATALOG);
    let plans = solve(&catalog, &type_set(&["Product"]), "CO2", DEFAULT_MAX_DEPTH).expect("solve");
    assert_eq!(plans.len(), 1);

    let plan = &plans[0];
    assert_eq!(plan.cost, 2.0);
    assert!((plan.confidence - 0.855).abs() < 1e-9);
    assert_eq!(plan.proof_string(), "usesEnergy ∘ energyToCO2");
    let tree = plan.tree_string();
    assert!(tree.contains("energyToCO2 : Energy -> CO2"));
    assert!(tree.contains("source Product"));

    let context = ExecutionContext::new().bind("Product", 1000.0);
    let result = Executor::new(context).execute(plan).expect("execute");
    assert_eq!(result, Value::Number(500.0));
}

#[test]
fn ranking_prefers_cheaper_direct_route() {
    let dsl = format!(
        "{TWO_STEP_CATALOG}\nfn usesElectricity {{\n  sig: Product -> CO2\n  impl: formula(\"value * 0.4\")\n  cost: 1\n  confidence: 0.8\n}}\n"
    );
    let catalog = parse(&dsl);
    let plans = solve(&catalog, &type_set(&["Product"]), "CO2", DEFAULT_MAX_DEPTH).expect("solve");
    assert_eq!(plans.len(), 2);

    assert_eq!(plans[0].cost, 1.0);
    assert!((plans[0].confidence - 0.8).abs() < 1e-9);
    assert_eq!(plans[0].func.as_ref().expect("func").name, "usesElectricity");

    assert_eq!(plans[1].cost, 2.0);
    assert!((plans[1].confidence - 0.855).abs() < 1e-9);
}

#[test]
fn cost_ties_fall_back_to_confidence_then_declaration_order() {
    let catalog = parse(
        r#"
        type A
        type B
        fn low  { sig: A -> B
                  cost: 1
                  confidence: 0.7 }
        fn high { sig: A -> B
                  cost: 1.0005
                  confidence: 0.9 }
        fn tied { sig: A -> B
                  cost: 1
                  confidence: 0.9 }
    "#,
    );
    let plans = solve(&catalog, &type_set(&["A"]), "B", DEFAULT_MAX_DEPTH).expect("solve");
    assert_eq!(plans.len(), 3);
    // Costs within the tolerance rank by confidence, then declaration order.
    assert_eq!(plans[0].func.as_ref().expect("func").name, "high");
    assert_eq!(plans[1].func.as_ref().expect("func").name, "tied");
    assert_eq!(plans[2].func.as_ref().expect("func").name, "low");
}

#[test]
fn solver_output_is_sorted() {
    let catalog = parse(
        r#"
        type A
        type B
        type C
        fn direct { sig: A -> C
                    cost: 5 }
        fn step1  { sig: A -> B }
        fn step2  { sig: B -> C }
    "#,
    );
    let plans = solve(&catalog, &type_set(&["A"]), "C", DEFAULT_MAX_DEPTH).expect("solve");
    assert!(plans.len() >= 2);
    for pair in plans.windows(2) {
        assert!(pair[0].cost <= pair[1].cost + 1e-3, "output must be sorted");
    }
}

#[test]
fn accumulated_cost_and_confidence_invariants_hold() {
    let dsl = format!(
        "{TWO_STEP_CATALOG}\nfn usesElectricity {{\n  sig: Product -> CO2\n  impl: formula(\"value * 0.4\")\n  cost: 1\n  confidence: 0.8\n}}\n"
    );
    let catalog = parse(&dsl);
    let plans = solve(&catalog, &type_set(&["Product"]), "CO2", DEFAULT_MAX_DEPTH).expect("solve");

    fn check(node: &SolutionNode) {
        if let Some(func) = &node.func {
            assert_eq!(node.children.len(), func.arity());
            for (child, dom) in node.children.iter().zip(&func.domain) {
                assert_eq!(&child.produced, dom);
                check(child);
            }
            let cost = node.children.iter().map(|c| c.cost).sum::<f64>() + func.cost;
            let confidence = node.children.iter().map(|c| c.confidence).product::<f64>()
                * func.confidence;
            assert!((node.cost - cost).abs() < 1e-12);
            assert!((node.confidence - confidence).abs() < 1e-12);
        } else {
            assert_eq!(node.cost, 0.0);
            assert_eq!(node.confidence, 1.0);
        }
    }
    for plan in &plans {
        check(plan);
    }
}

#[test]
fn depth_bound_cuts_the_search() {
    let catalog = parse(TWO_STEP_CATALOG);
    // max_depth 0 with goal not in sources: nothing is reachable.
    let plans = solve(&catalog, &type_set(&["Product"]), "CO2", 0).expect("solve");
    assert!(plans.is_empty());
    // The chain needs two applications; one is not enough.
    let plans = solve(&catalog, &type_set(&["Product"]), "CO2", 1).expect("solve");
    assert!(plans.is_empty());
    let plans = solve(&catalog, &type_set(&["Product"]), "CO2", 2).expect("solve");
    assert_eq!(plans.len(), 1);
}

#[test]
fn self_referencing_domain_is_pruned_by_depth() {
    let catalog = parse(
        r#"
        type G
        fn widen { sig: G -> G
                   cost: 1
                   confidence: 0.5 }
    "#,
    );
    let plans = solve(&catalog, &type_set(&["G"]), "G", 3).expect("solve");
    // The leaf ranks first; the self-application builds on the best child
    // (the leaf again) and stays finite.
    assert_eq!(plans.len(), 2);
    assert!(plans[0].is_leaf());
    assert_eq!(plans[1].cost, 1.0);
    assert_eq!(plans[1].confidence, 0.5);
    assert!(plans[1].children[0].is_leaf());
}

#[test]
fn uninhabitable_domain_contributes_no_candidates() {
    let catalog = parse(
        r#"
        type A
        type Orphan
        type Goal
        fn needsOrphan { sig: Orphan -> Goal }
    "#,
    );
    let plans = solve(&catalog, &type_set(&["A"]), "Goal", DEFAULT_MAX_DEPTH).expect("solve");
    assert!(plans.is_empty());
}

#[test]
fn three_argument_aggregation() {
    let catalog = parse(
        r#"
        type Facility
        type S1
        type S2
        type S3
        type Total

        fn scope1 { sig: Facility -> S1
                    impl: formula("fuel * 2.5") }
        fn scope2 { sig: Facility -> S2
                    impl: formula("elec * 0.5") }
        fn scope3 { sig: Facility -> S3
                    impl: formula("elec * 0.04") }
        fn agg {
          sig: S1, S2, S3 -> Total
          impl: formula("arg0 + arg1 + arg2")
          cost: 1
          confidence: 1.0
        }
    "#,
    );

    let plans = solve(&catalog, &type_set(&["Facility"]), "Total", DEFAULT_MAX_DEPTH).expect("solve");
    assert_eq!(plans.len(), 1);
    let plan = &plans[0];
    assert_eq!(plan.children.len(), 3);
    for child in &plan.children {
        assert_eq!(child.children.len(), 1);
        assert_eq!(child.children[0].produced, "Facility");
    }
    assert_eq!(plan.proof_string(), "⟨scope1, scope2, scope3⟩ ∘ agg");

    let context = ExecutionContext::new().bind(
        "Facility",
        record(&[("fuel", Value::Number(400.0)), ("elec", Value::Number(3000.0))]),
    );
    let result = Executor::new(context).execute(plan).expect("execute");
    assert_eq!(result, Value::Number(2620.0));
}

#[test]
fn product_goal_requires_an_explicit_constructor() {
    let with_constructor = parse(
        r#"
        type A
        type B
        type C
        type All = A × B × C
        fn mkAll { sig: (A, B, C) -> All
                   impl: builtin("identity") }
    "#,
    );
    let plans = solve(
        &with_constructor,
        &type_set(&["A", "B", "C"]),
        "All",
        DEFAULT_MAX_DEPTH,
    )
    .expect("solve");
    assert_eq!(plans.len(), 1);

    let context = ExecutionContext::new().bind("A", 1.0).bind("B", 2.0).bind("C", 3.0);
    let result = Executor::new(context).execute(&plans[0]).expect("execute");
    assert_eq!(result, tuple(&[1.0, 2.0, 3.0]));

    // Without a declared constructor the product is never synthesized.
    let without = parse("type A\ntype B\ntype C\ntype All = A × B × C");
    let plans = solve(&without, &type_set(&["A", "B", "C"]), "All", DEFAULT_MAX_DEPTH)
        .expect("solve");
    assert!(plans.is_empty());
}

#[test]
fn solver_validates_goal_and_source_types() {
    let catalog = parse("type A");
    let err = solve(&catalog, &type_set(&["A"]), "Nope", DEFAULT_MAX_DEPTH).expect_err("must fail");
    assert_eq!(err, SolverError::UnknownGoalType("Nope".to_string()));

    let err = solve(&catalog, &type_set(&["Nope"]), "A", DEFAULT_MAX_DEPTH).expect_err("must fail");
    assert_eq!(err, SolverError::UnknownSourceType("Nope".to_string()));
}

#[test]
fn solution_serializes_to_json() {
    let catalog = parse(TWO_STEP_CATALOG);
    let plans = solve(&catalog, &type_set(&["Product"]), "CO2", DEFAULT_MAX_DEPTH).expect("solve");
    let json = plans[0].to_json();

    assert_eq!(json["type"], "CO2");
    assert_eq!(json["func"]["name"], "energyToCO2");
    assert_eq!(json["func"]["impl_kind"], "formula");
    assert_eq!(json["cost"], 2.0);
    assert_eq!(json["children"][0]["type"], "Energy");
    assert_eq!(json["children"][0]["children"][0]["type"], "Product");
}

// ---------------------------------------------------------------------------
// DAG synthesis
// ---------------------------------------------------------------------------

#[test]
fn same_source_id_demanded_twice_shares_one_leaf() {
    let catalog = parse(
        r#"
        type S
        type T
        fn pair { sig: (S, S) -> T
                  impl: formula("arg0 + arg1") }
    "#,
    );
    let sources: BTreeMap<String, String> = [("s1".to_string(), "S".to_string())].into();
    let dag = solve_dag(&catalog, &sources, "T", DEFAULT_MAX_DEPTH)
        .expect("solve")
        .expect("plan");

    let root = dag.root();
    assert_eq!(root.children.len(), 2);
    assert!(Rc::ptr_eq(&root.children[0], &root.children[1]));
    assert_eq!(root.children[0].source.as_deref(), Some("s1"));
    assert_eq!(dag.leaves().len(), 1);
    // Shared leaves still contribute zero cost once.
    assert_eq!(dag.cost(), 1.0);

    let context = ExecutionContext::new().bind("s1", 21.0);
    let result = Executor::new(context).execute_dag(&dag).expect("execute");
    assert_eq!(result, Value::Number(42.0));
}

#[test]
fn distinct_source_ids_bind_distinct_leaves() {
    let catalog = parse(
        r#"
        type S
        type T
        fn pair { sig: (S, S) -> T
                  impl: formula("arg0 - arg1") }
    "#,
    );
    let sources: BTreeMap<String, String> = [
        ("a".to_string(), "S".to_string()),
        ("b".to_string(), "S".to_string()),
    ]
    .into();
    let dag = solve_dag(&catalog, &sources, "T", DEFAULT_MAX_DEPTH)
        .expect("solve")
        .expect("plan");

    let root = dag.root();
    assert!(!Rc::ptr_eq(&root.children[0], &root.children[1]));
    // Domain positions consume ids in map order.
    assert_eq!(root.children[0].source.as_deref(), Some("a"));
    assert_eq!(root.children[1].source.as_deref(), Some("b"));

    let context = ExecutionContext::new().bind("a", 10.0).bind("b", 4.0);
    let result = Executor::new(context).execute_dag(&dag).expect("execute");
    assert_eq!(result, Value::Number(6.0));
}

#[test]
fn dag_schedule_is_topological_and_deduplicated() {
    let catalog = parse(
        r#"
        type S
        type T
        fn pair { sig: (S, S) -> T
                  impl: formula("arg0 + arg1") }
    "#,
    );
    let sources: BTreeMap<String, String> = [("s1".to_string(), "S".to_string())].into();
    let dag = solve_dag(&catalog, &sources, "T", DEFAULT_MAX_DEPTH)
        .expect("solve")
        .expect("plan");

    let schedule = dag.schedule();
    // One shared leaf plus the root.
    assert_eq!(schedule.len(), 2);
    assert!(schedule[0].is_leaf());
    assert!(Rc::ptr_eq(&schedule[1], dag.root()));
}

#[test]
fn dag_leaves_resolve_by_source_id() {
    let catalog = parse(
        r#"
        type S
        type T
        fn conv { sig: S -> T
                  impl: formula("value * 2") }
    "#,
    );
    let sources: BTreeMap<String, String> = [("reading".to_string(), "S".to_string())].into();
    let dag = solve_dag(&catalog, &sources, "T", DEFAULT_MAX_DEPTH)
        .expect("solve")
        .expect("plan");

    // Missing binding names the source id, not the type.
    let err = Executor::new(ExecutionContext::new())
        .execute_dag(&dag)
        .expect_err("must fail");
    match err {
        ExecutionError::MissingSourceBinding { name } => assert_eq!(name, "reading"),
        other => panic!("unexpected error {other:?}"),
    }

    let context = ExecutionContext::new().bind("reading", 8.0);
    let result = Executor::new(context).execute_dag(&dag).expect("execute");
    assert_eq!(result, Value::Number(16.0));
}

#[test]
fn dag_synthesis_returns_none_without_a_plan() {
    let catalog = parse("type S\ntype T");
    let sources: BTreeMap<String, String> = [("s".to_string(), "S".to_string())].into();
    let dag = solve_dag(&catalog, &sources, "T", DEFAULT_MAX_DEPTH).expect("solve");
    assert!(dag.is_none());

    let bad: BTreeMap<String, String> = [("s".to_string(), "Nope".to_string())].into();
    let err = solve_dag(&catalog, &bad, "T", DEFAULT_MAX_DEPTH).expect_err("must fail");
    assert_eq!(err, SolverError::UnknownSourceType("Nope".to_string()));
}

// ---------------------------------------------------------------------------
// Execution engine
// ---------------------------------------------------------------------------

#[test]
fn leaf_execution_reads_the_context() {
    let catalog = parse("type A");
    let plans = solve(&catalog, &type_set(&["A"]), "A", DEFAULT_MAX_DEPTH).expect("solve");
    let context = ExecutionContext::new().bind("A", 123.0);
    let result = Executor::new(context).execute(&plans[0]).expect("execute");
    assert_eq!(result, Value::Number(123.0));

    let err = Executor::new(ExecutionContext::new())
        .execute(&plans[0])
        .expect_err("must fail");
    match err {
        ExecutionError::MissingSourceBinding { name } => assert_eq!(name, "A"),
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn identity_builtin_returns_its_input() {
    let catalog = parse(
        "type A\ntype B\nfn same {\n  sig: A -> B\n  impl: builtin(\"identity\")\n}",
    );
    let plans = solve(&catalog, &type_set(&["A"]), "B", DEFAULT_MAX_DEPTH).expect("solve");
    for input in [
        Value::Number(42.0),
        Value::Str("payload".to_string()),
        tuple(&[1.0, 2.0]),
        record(&[("k", Value::Bool(true))]),
    ] {
        let context = ExecutionContext::new().bind("A", input.clone());
        let result = Executor::new(context).execute(&plans[0]).expect("execute");
        assert_eq!(result, input);
    }
}

#[test]
fn sequence_builtins_aggregate_tuples() {
    let cases = [
        ("sum", 15.0),
        ("product", 120.0),
        ("average", 3.0),
        ("first", 1.0),
        ("last", 5.0),
        ("count", 5.0),
    ];
    for (name, expected) in cases {
        let dsl = format!(
            "type Readings\ntype Stat\nfn agg {{\n  sig: Readings -> Stat\n  impl: builtin(\"{name}\")\n}}"
        );
        let catalog = parse(&dsl);
        let plans = solve(&catalog, &type_set(&["Readings"]), "Stat", DEFAULT_MAX_DEPTH)
            .expect("solve");
        let context = ExecutionContext::new().bind("Readings", tuple(&[1.0, 2.0, 3.0, 4.0, 5.0]));
        let result = Executor::new(context).execute(&plans[0]).expect("execute");
        assert_eq!(result, Value::Number(expected), "builtin {name}");
    }
}

#[test]
fn numeric_builtins_and_unknown_names() {
    let dsl = "type A\ntype B\nfn f {\n  sig: A -> B\n  impl: builtin(\"abs\")\n}";
    let catalog = parse(dsl);
    let plans = solve(&catalog, &type_set(&["A"]), "B", DEFAULT_MAX_DEPTH).expect("solve");
    let context = ExecutionContext::new().bind("A", -9.0);
    assert_eq!(
        Executor::new(context).execute(&plans[0]).expect("execute"),
        Value::Number(9.0)
    );

    let dsl = "type A\ntype B\nfn f {\n  sig: A -> B\n  impl: builtin(\"mystery\")\n}";
    let catalog = parse(dsl);
    let plans = solve(&catalog, &type_set(&["A"]), "B", DEFAULT_MAX_DEPTH).expect("solve");
    let err = Executor::new(ExecutionContext::new().bind("A", 1.0))
        .execute(&plans[0])
        .expect_err("must fail");
    match err {
        ExecutionError::UnknownBuiltin { function, name } => {
            assert_eq!(function, "f");
            assert_eq!(name, "mystery");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn json_template_evaluates_string_leaves_only() {
    let catalog = parse(
        r#"
        type A
        type B
        type Report
        fn report {
          sig: A, B -> Report
          impl: json({"x": "arg0", "y": "arg1 * 2", "flag": true})
          cost: 1
        }
    "#,
    );
    let plans = solve(&catalog, &type_set(&["A", "B"]), "Report", DEFAULT_MAX_DEPTH).expect("solve");
    let context = ExecutionContext::new().bind("A", 3.0).bind("B", 4.0);
    let result = Executor::new(context).execute(&plans[0]).expect("execute");

    assert_eq!(
        result,
        record(&[
            ("flag", Value::Bool(true)),
            ("x", Value::Number(3.0)),
            ("y", Value::Number(8.0)),
        ])
    );
}

#[test]
fn nested_json_templates_preserve_structure() {
    let catalog = parse(
        r#"
        type A
        type Report
        fn report {
          sig: A -> Report
          impl: json({"meta": {"version": 2, "source": "'sensor'"}, "values": ["value", "value * 2"], "empty": null})
        }
    "#,
    );
    let plans = solve(&catalog, &type_set(&["A"]), "Report", DEFAULT_MAX_DEPTH).expect("solve");
    let context = ExecutionContext::new().bind("A", 5.0);
    let result = Executor::new(context).execute(&plans[0]).expect("execute");

    let Value::Record(fields) = result else {
        panic!("expected record");
    };
    assert_eq!(fields["empty"], Value::Null);
    assert_eq!(
        fields["values"],
        Value::Tuple(vec![Value::Number(5.0), Value::Number(10.0)])
    );
    let Value::Record(meta) = &fields["meta"] else {
        panic!("expected nested record");
    };
    assert_eq!(meta["version"], Value::Number(2.0));
    assert_eq!(meta["source"], Value::Str("sensor".to_string()));
}

#[test]
fn string_templates_substitute_placeholders() {
    let catalog = parse(
        r#"
        type CO2
        type Label
        fn label {
          sig: CO2 -> Label
          impl: template("emissions: {{amount}} kg ({{grade}})", {"amount": "value", "grade": "value > 100 ? 'high' : 'low'"})
        }
    "#,
    );
    let plans = solve(&catalog, &type_set(&["CO2"]), "Label", DEFAULT_MAX_DEPTH).expect("solve");
    let context = ExecutionContext::new().bind("CO2", 250.0);
    let result = Executor::new(context).execute(&plans[0]).expect("execute");
    assert_eq!(result, Value::Str("emissions: 250 kg (high)".to_string()));
}

#[test]
fn unknown_template_placeholders_raise() {
    let catalog = parse(
        r#"
        type A
        type B
        fn f {
          sig: A -> B
          impl: template("{{missing}}", {"present": "value"})
        }
    "#,
    );
    let plans = solve(&catalog, &type_set(&["A"]), "B", DEFAULT_MAX_DEPTH).expect("solve");
    let err = Executor::new(ExecutionContext::new().bind("A", 1.0))
        .execute(&plans[0])
        .expect_err("must fail");
    assert!(err.to_string().contains("unknown placeholder 'missing'"));
}

#[test]
fn remote_queries_mock_then_context_then_resolver() {
    let catalog = parse(
        r#"
        type A
        type B
        fn fetch {
          sig: A -> B
          impl: sparql("SELECT ?e WHERE { ?p :usesEnergy ?e }")
        }
    "#,
    );
    let plans = solve(&catalog, &type_set(&["A"]), "B", DEFAULT_MAX_DEPTH).expect("solve");

    // Unresolved: deterministic mock.
    let context = ExecutionContext::new().bind("A", 1.0);
    let result = Executor::new(context).execute(&plans[0]).expect("execute");
    assert_eq!(result, Value::Number(MOCK_REMOTE_RESULT));

    // A context binding under the function name takes precedence.
    let context = ExecutionContext::new().bind("A", 1.0).bind("fetch", 55.0);
    let result = Executor::new(context).execute(&plans[0]).expect("execute");
    assert_eq!(result, Value::Number(55.0));

    // Otherwise a registered resolver is delegated to.
    let context = ExecutionContext::new().bind("A", 7.0);
    let mut executor = Executor::new(context).with_resolver(|func, inputs| {
        assert_eq!(func.name, "fetch");
        let n = inputs[0].as_number().ok_or("expected a number")?;
        Ok(Value::Number(n * 3.0))
    });
    assert_eq!(executor.execute(&plans[0]).expect("execute"), Value::Number(21.0));

    // Resolver failures surface as execution errors.
    let context = ExecutionContext::new().bind("A", 7.0);
    let mut executor =
        Executor::new(context).with_resolver(|_, _| Err("endpoint unreachable".to_string()));
    let err = executor.execute(&plans[0]).expect_err("must fail");
    match err {
        ExecutionError::Resolver { function, message } => {
            assert_eq!(function, "fetch");
            assert!(message.contains("unreachable"));
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn rest_impls_share_the_remote_dispatch() {
    let catalog = parse(
        r#"
        type A
        type B
        fn call {
          sig: A -> B
          impl: rest("POST, https://api.example.com/convert")
        }
    "#,
    );
    let plans = solve(&catalog, &type_set(&["A"]), "B", DEFAULT_MAX_DEPTH).expect("solve");
    let context = ExecutionContext::new().bind("A", 1.0);
    let result = Executor::new(context).execute(&plans[0]).expect("execute");
    assert_eq!(result, Value::Number(MOCK_REMOTE_RESULT));
}

#[test]
fn execution_is_deterministic() {
    let catalog = parse(TWO_STEP_CATALOG);
    let plans = solve(&catalog, &type_set(&["Product"]), "CO2", DEFAULT_MAX_DEPTH).expect("solve");
    let context = ExecutionContext::new().bind("Product", 1000.0);
    let mut executor = Executor::new(context);
    let first = executor.execute(&plans[0]).expect("execute");
    let second = executor.execute(&plans[0]).expect("execute");
    assert_eq!(first, second);
}

#[test]
fn high_level_synthesize_and_execute() {
    let catalog = parse(TWO_STEP_CATALOG);
    let result = synthesize_and_execute(&catalog, &[("Product", Value::Number(1000.0))], "CO2")
        .expect("pipeline");
    assert_eq!(result, Value::Number(500.0));

    let (value, plan) = execute_best_plan(&catalog, "Product", Value::Number(1000.0), "CO2")
        .expect("pipeline");
    assert_eq!(value, Value::Number(500.0));
    assert_eq!(plan.cost, 2.0);

    let err = synthesize_and_execute(&catalog, &[("CO2", Value::Number(1.0))], "Product")
        .expect_err("must fail");
    assert!(matches!(err, Error::NoPlan { .. }));
}

#[test]
fn high_level_multi_source_pipeline() {
    let catalog = parse(
        r#"
        type S1
        type S2
        type S3
        type Total
        fn agg {
          sig: (S1, S2, S3) -> Total
          impl: formula("arg0 + arg1 + arg2")
        }
    "#,
    );
    let result = synthesize_and_execute(
        &catalog,
        &[
            ("S1", Value::Number(100.0)),
            ("S2", Value::Number(200.0)),
            ("S3", Value::Number(300.0)),
        ],
        "Total",
    )
    .expect("pipeline");
    assert_eq!(result, Value::Number(600.0));
}

// ---------------------------------------------------------------------------
// Provenance
// ---------------------------------------------------------------------------

#[test]
fn provenance_records_entities_activities_and_edges() {
    let catalog = parse(TWO_STEP_CATALOG);
    let plans = solve(&catalog, &type_set(&["Product"]), "CO2", DEFAULT_MAX_DEPTH).expect("solve");
    let context = ExecutionContext::new().bind("Product", 1000.0);
    let mut executor = Executor::new(context).with_provenance();
    let result = executor.execute(&plans[0]).expect("execute");
    assert_eq!(result, Value::Number(500.0));

    let graph = executor.take_provenance().expect("provenance");
    assert_eq!(graph.activities().len(), 2);
    // Source, intermediate, and final values; shared nodes recorded once.
    assert_eq!(graph.entities().len(), 3);
    assert_eq!(graph.usages().len(), 2);
    assert_eq!(graph.generations().len(), 2);
    assert_eq!(graph.derivations().len(), 2);

    assert_eq!(graph.entities()[0].id, "entity_0");
    assert_eq!(graph.entities()[0].type_name, "Product");
    assert_eq!(graph.entities()[2].type_name, "CO2");
    assert_eq!(graph.entities()[2].value, "500");

    assert_eq!(graph.activities()[0].func_id, "usesEnergy");
    assert_eq!(graph.activities()[0].func_signature, "Product -> Energy");
    assert!(graph.activities()[0].ended_at.is_some());

    assert_eq!(graph.usages()[0].role, "arg0");
    assert_eq!(graph.generations()[0].role, "output");
}

#[test]
fn provenance_tracks_lineage_chains() {
    let catalog = parse(TWO_STEP_CATALOG);
    let plans = solve(&catalog, &type_set(&["Product"]), "CO2", DEFAULT_MAX_DEPTH).expect("solve");
    let context = ExecutionContext::new().bind("Product", 1000.0);
    let mut executor = Executor::new(context).with_provenance();
    executor.execute(&plans[0]).expect("execute");

    let graph = executor.take_provenance().expect("provenance");
    let output = graph.entities().last().expect("output entity").id.clone();
    assert_eq!(
        graph.entity_lineage(&output),
        vec!["entity_2", "entity_1", "entity_0"]
    );
    assert_eq!(
        graph.activity_chain(&output),
        vec!["activity_1", "activity_0"]
    );
}

#[test]
fn provenance_shared_dag_leaves_record_one_entity() {
    let catalog = parse(
        r#"
        type S
        type T
        fn pair { sig: (S, S) -> T
                  impl: formula("arg0 + arg1") }
    "#,
    );
    let sources: BTreeMap<String, String> = [("s1".to_string(), "S".to_string())].into();
    let dag = solve_dag(&catalog, &sources, "T", DEFAULT_MAX_DEPTH)
        .expect("solve")
        .expect("plan");
    let context = ExecutionContext::new().bind("s1", 21.0);
    let mut executor = Executor::new(context).with_provenance();
    executor.execute_dag(&dag).expect("execute");

    let graph = executor.take_provenance().expect("provenance");
    // The shared leaf is one entity used twice.
    assert_eq!(graph.entities().len(), 2);
    assert_eq!(graph.usages().len(), 2);
    assert_eq!(graph.usages()[0].entity, graph.usages()[1].entity);
    assert_eq!(graph.usages()[0].role, "arg0");
    assert_eq!(graph.usages()[1].role, "arg1");
}

#[test]
fn provenance_exports_json_turtle_and_jsonld() {
    let catalog = parse(TWO_STEP_CATALOG);
    let plans = solve(&catalog, &type_set(&["Product"]), "CO2", DEFAULT_MAX_DEPTH).expect("solve");
    let context = ExecutionContext::new().bind("Product", 1000.0);
    let mut executor = Executor::new(context).with_provenance();
    executor.execute(&plans[0]).expect("execute");
    let graph = executor.take_provenance().expect("provenance");

    let json = graph.to_json();
    assert_eq!(json["namespace"], "http://example.org/provenance/");
    assert!(json["entities"]["entity_0"]["prov:generatedAtTime"].is_string());
    assert_eq!(json["activities"]["activity_0"]["func_id"], "usesEnergy");
    assert_eq!(json["usages"][0]["role"], "arg0");
    assert_eq!(json["derivations"].as_array().map(Vec::len), Some(2));

    let turtle = graph.export_turtle();
    assert!(turtle.contains("@prefix prov: <http://www.w3.org/ns/prov#> ."));
    assert!(turtle.contains("a prov:Entity"));
    assert!(turtle.contains("prov:used"));
    assert!(turtle.contains("prov:wasGeneratedBy"));
    assert!(turtle.contains("prov:wasDerivedFrom"));
    assert!(turtle.contains("prov:startedAtTime"));

    let jsonld: serde_json::Value =
        serde_json::from_str(&graph.export_jsonld()).expect("valid JSON-LD");
    assert_eq!(jsonld["@context"]["prov"], "http://www.w3.org/ns/prov#");
    assert!(jsonld["@graph"].as_array().is_some_and(|g| !g.is_empty()));
}

// ---------------------------------------------------------------------------
// Values
// ---------------------------------------------------------------------------

#[test]
fn values_render_like_their_sources() {
    assert_eq!(Value::Number(3.0).to_string(), "3");
    assert_eq!(Value::Number(2.5).to_string(), "2.5");
    assert_eq!(Value::Str("abc".to_string()).to_string(), "abc");
    assert_eq!(tuple(&[1.0, 2.0]).to_string(), "(1, 2)");
    assert_eq!(
        record(&[("k", Value::Number(1.0))]).to_string(),
        "{k: 1}"
    );
}

#[test]
fn values_round_trip_through_json() {
    let value = record(&[
        ("flag", Value::Bool(true)),
        ("n", Value::Number(2.5)),
        ("seq", tuple(&[1.0, 2.0])),
    ]);
    assert_eq!(Value::from_json(&value.to_json()), value);
}
