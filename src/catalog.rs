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

//! Catalog model: typed values and functions plus derived search indices.
//!
//! A catalog is built once from source text and never mutated afterwards;
//! solver and executor only read it. Function records are shared via `Rc`
//! so solution nodes can reference them without copying.

use crate::ast::{CatalogSource, Expr, ImplDecl, Item, SourceSpan, TypeBody};
use crate::diagnostics::{ParseError, ParseErrorKind};
use crate::parser::{parse_catalog_source, parse_expression_text, parse_formula_text};
use std::collections::HashMap;
use std::fmt::Write as _;
use std::rc::Rc;

/// One declared type: atomic (attributes only) or product (ordered
/// component type names).
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDef {
    /// Unique type name.
    pub name: String,
    /// Attribute pairs in declaration order (empty for products).
    pub attrs: Vec<(String, String)>,
    /// Product decomposition; `None` for atomic types.
    pub components: Option<Vec<String>>,
}

impl TypeDef {
    /// Returns whether this is a product type.
    pub fn is_product(&self) -> bool {
        self.components.is_some()
    }

    /// Looks up one attribute value.
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Returns the declared `unit` attribute, if any.
    pub fn unit(&self) -> Option<&str> {
        self.attr("unit")
    }
}

/// One embedded expression compiled from its textual form.
///
/// The original text is kept for diagnostics and canonical printing.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledExpr {
    /// Expression text as written in the catalog.
    pub source: String,
    /// Parsed body (assignment prefix already stripped for formulas).
    pub(crate) body: Expr,
}

/// Structured-data template: JSON shape whose string leaves are compiled
/// expressions and whose other leaves are preserved verbatim.
#[derive(Debug, Clone, PartialEq)]
pub enum JsonTemplate {
    /// Literal null.
    Null,
    /// Literal boolean.
    Bool(bool),
    /// Literal number.
    Number(f64),
    /// Expression leaf, evaluated against the scope at execution time.
    Expr(CompiledExpr),
    /// Array rebuilt with evaluated children.
    Array(Vec<JsonTemplate>),
    /// Object rebuilt with evaluated children (keys in canonical order).
    Object(Vec<(String, JsonTemplate)>),
}

/// How a function computes its output. A closed tagged union; the executor
/// pattern-matches once per call.
#[derive(Debug, Clone, PartialEq)]
pub enum Impl {
    /// Restricted arithmetic expression over the evaluation scope.
    Formula(CompiledExpr),
    /// Structured-data template.
    Json(JsonTemplate),
    /// String template with `{{key}}` placeholders.
    Template {
        /// Pattern text.
        pattern: String,
        /// Placeholder bindings in canonical key order.
        bindings: Vec<(String, CompiledExpr)>,
    },
    /// Remote query placeholder, resolved from context or mocked.
    Sparql {
        /// Query text.
        query: String,
    },
    /// Remote query placeholder, resolved from context or mocked.
    Rest {
        /// HTTP method when the argument was `"METHOD, URL"`.
        method: Option<String>,
        /// Endpoint URL.
        url: String,
    },
    /// Named built-in aggregate (validated at execution time).
    Builtin {
        /// Built-in name.
        name: String,
    },
}

impl Impl {
    /// Short kind label used by serialization surfaces.
    pub fn kind(&self) -> &'static str {
        match self {
            Impl::Formula(_) => "formula",
            Impl::Json(_) => "json",
            Impl::Template { .. } => "template",
            Impl::Sparql { .. } => "sparql",
            Impl::Rest { .. } => "rest",
            Impl::Builtin { .. } => "builtin",
        }
    }
}

/// One declared function.
///
/// Names need not be unique: overloads producing the same codomain become
/// alternative plans for the solver.
#[derive(Debug, Clone, PartialEq)]
pub struct FuncDef {
    /// Function name.
    pub name: String,
    /// Domain type names in declaration order (never empty).
    pub domain: Vec<String>,
    /// Codomain type name.
    pub codomain: String,
    /// Additive non-negative cost.
    pub cost: f64,
    /// Multiplicative confidence in `[0, 1]`.
    pub confidence: f64,
    /// Implementation record.
    pub implementation: Impl,
    /// Documentation string.
    pub doc: Option<String>,
    /// Name of the function this one inverts.
    pub inverse_of: Option<String>,
    // Declaration index; used as the deterministic ranking tiebreaker.
    pub(crate) index: usize,
}

impl FuncDef {
    /// Number of domain positions.
    pub fn arity(&self) -> usize {
        self.domain.len()
    }

    /// Returns whether this function takes more than one input.
    pub fn is_multiarg(&self) -> bool {
        self.domain.len() > 1
    }

    /// Renders the signature (`A -> B`, `(A, B) -> C`).
    pub fn signature(&self) -> String {
        if self.is_multiarg() {
            format!("({}) -> {}", self.domain.join(", "), self.codomain)
        } else {
            format!("{} -> {}", self.domain[0], self.codomain)
        }
    }
}

/// The parsed, immutable collection of type and function definitions plus
/// derived indices for codomain/domain lookup during search.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    types: Vec<TypeDef>,
    type_index: HashMap<String, usize>,
    funcs: Vec<Rc<FuncDef>>,
    by_codomain: HashMap<String, Vec<Rc<FuncDef>>>,
    by_domain: HashMap<String, Vec<Rc<FuncDef>>>,
}

impl Catalog {
    /// Parses catalog source text into an indexed catalog.
    pub fn parse(source: &str) -> Result<Catalog, ParseError> {
        let parsed = parse_catalog_source(source)?;
        Catalog::from_items(parsed, source)
    }

    /// Returns declared types in declaration order.
    pub fn types(&self) -> &[TypeDef] {
        &self.types
    }

    /// Looks up one type by name.
    pub fn get_type(&self, name: &str) -> Option<&TypeDef> {
        self.type_index.get(name).map(|idx| &self.types[*idx])
    }

    /// Returns whether `name` is a declared type.
    pub fn contains_type(&self, name: &str) -> bool {
        self.type_index.contains_key(name)
    }

    /// Returns whether `name` is a declared product type.
    pub fn is_product_type(&self, name: &str) -> bool {
        self.get_type(name).is_some_and(TypeDef::is_product)
    }

    /// Returns declared functions in declaration order.
    pub fn funcs(&self) -> &[Rc<FuncDef>] {
        &self.funcs
    }

    /// Returns functions whose codomain is `type_name`.
    pub fn funcs_returning(&self, type_name: &str) -> &[Rc<FuncDef>] {
        self.by_codomain
            .get(type_name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Returns functions with `type_name` anywhere in their domain.
    pub fn funcs_accepting(&self, type_name: &str) -> &[Rc<FuncDef>] {
        self.by_domain
            .get(type_name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn from_items(parsed: CatalogSource, source: &str) -> Result<Catalog, ParseError> {
        let mut catalog = Catalog::default();

        // First pass: collect type declarations and legacy attribute lines so
        // function signatures can reference types in any order.
        for item in &parsed.items {
            match item {
                Item::Type(decl) => {
                    if catalog.type_index.contains_key(&decl.name) {
                        return Err(ParseError::from_span(
                            format!("Duplicate type '{}'", decl.name),
                            source,
                            &decl.span,
                        )
                        .with_kind(ParseErrorKind::DuplicateTypeName));
                    }
                    let def = match &decl.body {
                        TypeBody::Atomic { attrs } => TypeDef {
                            name: decl.name.clone(),
                            attrs: attrs.clone(),
                            components: None,
                        },
                        TypeBody::Product { components } => TypeDef {
                            name: decl.name.clone(),
                            attrs: Vec::new(),
                            components: Some(components.clone()),
                        },
                    };
                    catalog.type_index.insert(decl.name.clone(), catalog.types.len());
                    catalog.types.push(def);
                }
                Item::Attr(attr) => {
                    // Legacy dialect: attach to the most recent atomic type.
                    let Some(last) = catalog.types.last_mut() else {
                        return Err(ParseError::from_span(
                            "Attribute line without a preceding type declaration",
                            source,
                            &attr.span,
                        ));
                    };
                    if last.is_product() {
                        return Err(ParseError::from_span(
                            format!("Attribute line cannot apply to product type '{}'", last.name),
                            source,
                            &attr.span,
                        ));
                    }
                    last.attrs.push((attr.key.clone(), attr.value.clone()));
                }
                Item::Fn(_) => {}
            }
        }

        // Product components must themselves be declared types.
        for def in &catalog.types {
            let Some(components) = &def.components else {
                continue;
            };
            for component in components {
                if !catalog.type_index.contains_key(component) {
                    let span = parsed
                        .items
                        .iter()
                        .find_map(|item| match item {
                            Item::Type(decl) if decl.name == def.name => Some(decl.span.clone()),
                            _ => None,
                        })
                        .expect("product definition originates from a type declaration");
                    return Err(ParseError::from_span(
                        format!(
                            "Product type '{}' references undeclared type '{component}'",
                            def.name
                        ),
                        source,
                        &span,
                    )
                    .with_kind(ParseErrorKind::UndeclaredTypeReference));
                }
            }
        }

        // Second pass: build function records, validating signatures against
        // the full type set and compiling embedded expressions.
        for item in &parsed.items {
            let Item::Fn(decl) = item else {
                continue;
            };

            let Some(sig) = &decl.sig else {
                return Err(ParseError::from_span(
                    format!("Function '{}' is missing its 'sig' field", decl.name),
                    source,
                    &decl.span,
                )
                .with_kind(ParseErrorKind::MalformedSignature));
            };
            for name in sig.domain.iter().chain(std::iter::once(&sig.codomain)) {
                if !catalog.type_index.contains_key(name) {
                    return Err(ParseError::from_span(
                        format!(
                            "Function '{}' references undeclared type '{name}'",
                            decl.name
                        ),
                        source,
                        &sig.span,
                    )
                    .with_kind(ParseErrorKind::UndeclaredTypeReference));
                }
            }

            let cost = decl.cost.unwrap_or(1.0);
            if cost < 0.0 || cost.is_nan() {
                return Err(ParseError::from_span(
                    format!("Function '{}' has a negative cost", decl.name),
                    source,
                    &decl.span,
                ));
            }
            let confidence = decl.confidence.unwrap_or(1.0);
            if !(0.0..=1.0).contains(&confidence) {
                return Err(ParseError::from_span(
                    format!("Function '{}' has a confidence outside [0, 1]", decl.name),
                    source,
                    &decl.span,
                ));
            }

            let implementation = match &decl.implementation {
                Some((spec, span)) => compile_impl(spec, span, source)?,
                // A missing impl falls back to the identity pass-through.
                None => Impl::Builtin {
                    name: "identity".to_string(),
                },
            };

            let func = Rc::new(FuncDef {
                name: decl.name.clone(),
                domain: sig.domain.clone(),
                codomain: sig.codomain.clone(),
                cost,
                confidence,
                implementation,
                doc: decl.doc.clone(),
                inverse_of: decl.inverse_of.clone(),
                index: catalog.funcs.len(),
            });

            catalog
                .by_codomain
                .entry(func.codomain.clone())
                .or_default()
                .push(func.clone());
            // A multi-argument function appears in each of its domain buckets.
            for dom in &func.domain {
                let bucket = catalog.by_domain.entry(dom.clone()).or_default();
                if !bucket.iter().any(|f| Rc::ptr_eq(f, &func)) {
                    bucket.push(func.clone());
                }
            }
            catalog.funcs.push(func);
        }

        Ok(catalog)
    }

    /// Renders the catalog in its canonical textual form.
    ///
    /// Parsing the canonical form and re-rendering it is textually
    /// idempotent; comments are not preserved.
    pub fn to_dsl(&self) -> String {
        let mut out = String::new();
        for def in &self.types {
            match &def.components {
                Some(components) => {
                    let _ = writeln!(out, "type {} = {}", def.name, components.join(" x "));
                }
                None if def.attrs.is_empty() => {
                    let _ = writeln!(out, "type {}", def.name);
                }
                None => {
                    let attrs = def
                        .attrs
                        .iter()
                        .map(|(k, v)| format!("{k}={v}"))
                        .collect::<Vec<_>>()
                        .join(", ");
                    let _ = writeln!(out, "type {} [{attrs}]", def.name);
                }
            }
        }

        for func in &self.funcs {
            let _ = writeln!(out, "\nfn {} {{", func.name);
            let _ = writeln!(out, "  sig: {}", func.signature());
            let _ = writeln!(out, "  impl: {}", render_impl(&func.implementation));
            let _ = writeln!(out, "  cost: {}", func.cost);
            let _ = writeln!(out, "  confidence: {}", func.confidence);
            if let Some(doc) = &func.doc {
                let _ = writeln!(out, "  doc: \"{doc}\"");
            }
            if let Some(inverse) = &func.inverse_of {
                let _ = writeln!(out, "  inverse_of: {inverse}");
            }
            let _ = writeln!(out, "}}");
        }
        out
    }
}

/// Compiles a parsed `impl:` payload, parsing every embedded expression.
fn compile_impl(
    spec: &ImplDecl,
    span: &SourceSpan,
    source: &str,
) -> Result<Impl, ParseError> {
    match spec {
        ImplDecl::Formula { source: text } => {
            let body = parse_formula_text(text).map_err(|err| {
                malformed_impl(
                    format!("Invalid formula expression '{text}': {}", err.message),
                    span,
                    source,
                )
            })?;
            Ok(Impl::Formula(CompiledExpr {
                source: text.clone(),
                body,
            }))
        }
        ImplDecl::Json { schema } => Ok(Impl::Json(compile_json_template(schema, span, source)?)),
        ImplDecl::Template { pattern, bindings } => {
            let serde_json::Value::Object(map) = bindings else {
                return Err(malformed_impl(
                    "Template bindings must be a JSON object",
                    span,
                    source,
                ));
            };
            let mut compiled = Vec::with_capacity(map.len());
            for (key, value) in map {
                let serde_json::Value::String(text) = value else {
                    return Err(malformed_impl(
                        format!("Template binding '{key}' must be an expression string"),
                        span,
                        source,
                    ));
                };
                let body = parse_expression_text(text).map_err(|err| {
                    malformed_impl(
                        format!("Invalid binding expression '{text}': {}", err.message),
                        span,
                        source,
                    )
                })?;
                compiled.push((
                    key.clone(),
                    CompiledExpr {
                        source: text.clone(),
                        body,
                    },
                ));
            }
            Ok(Impl::Template {
                pattern: pattern.clone(),
                bindings: compiled,
            })
        }
        ImplDecl::Sparql { query } => Ok(Impl::Sparql {
            query: query.clone(),
        }),
        ImplDecl::Rest { spec } => {
            // A `"METHOD, URL"` argument splits on the first comma.
            let implementation = match spec.split_once(',') {
                Some((method, url)) => Impl::Rest {
                    method: Some(method.trim().to_string()),
                    url: url.trim().to_string(),
                },
                None => Impl::Rest {
                    method: None,
                    url: spec.trim().to_string(),
                },
            };
            Ok(implementation)
        }
        ImplDecl::Builtin { name } => Ok(Impl::Builtin { name: name.clone() }),
    }
}

/// Compiles a JSON schema literal: string leaves become expressions, other
/// leaves are preserved as data.
fn compile_json_template(
    schema: &serde_json::Value,
    span: &SourceSpan,
    source: &str,
) -> Result<JsonTemplate, ParseError> {
    match schema {
        serde_json::Value::Null => Ok(JsonTemplate::Null),
        serde_json::Value::Bool(b) => Ok(JsonTemplate::Bool(*b)),
        serde_json::Value::Number(n) => Ok(JsonTemplate::Number(n.as_f64().unwrap_or(f64::NAN))),
        serde_json::Value::String(text) => {
            let body = parse_expression_text(text).map_err(|err| {
                malformed_impl(
                    format!("Invalid schema expression '{text}': {}", err.message),
                    span,
                    source,
                )
            })?;
            Ok(JsonTemplate::Expr(CompiledExpr {
                source: text.clone(),
                body,
            }))
        }
        serde_json::Value::Array(items) => {
            let mut compiled = Vec::with_capacity(items.len());
            for item in items {
                compiled.push(compile_json_template(item, span, source)?);
            }
            Ok(JsonTemplate::Array(compiled))
        }
        serde_json::Value::Object(fields) => {
            let mut compiled = Vec::with_capacity(fields.len());
            for (key, value) in fields {
                compiled.push((key.clone(), compile_json_template(value, span, source)?));
            }
            Ok(JsonTemplate::Object(compiled))
        }
    }
}

fn malformed_impl(message: impl Into<String>, span: &SourceSpan, source: &str) -> ParseError {
    ParseError::from_span(message, source, span).with_kind(ParseErrorKind::MalformedImpl)
}

/// Renders one implementation record in canonical form.
fn render_impl(implementation: &Impl) -> String {
    match implementation {
        Impl::Formula(expr) => format!("formula(\"{}\")", expr.source),
        Impl::Json(template) => format!("json({})", render_json_template(template)),
        Impl::Template { pattern, bindings } => {
            let fields = bindings
                .iter()
                .map(|(key, expr)| {
                    format!(
                        "{}:{}",
                        serde_json::Value::String(key.clone()),
                        serde_json::Value::String(expr.source.clone())
                    )
                })
                .collect::<Vec<_>>()
                .join(",");
            format!("template(\"{pattern}\", {{{fields}}})")
        }
        Impl::Sparql { query } => format!("sparql(\"{query}\")"),
        Impl::Rest { method, url } => match method {
            Some(method) => format!("rest(\"{method}, {url}\")"),
            None => format!("rest(\"{url}\")"),
        },
        Impl::Builtin { name } => format!("builtin(\"{name}\")"),
    }
}

/// Reconstructs the compact JSON form of a schema template.
fn render_json_template(template: &JsonTemplate) -> String {
    match template {
        JsonTemplate::Null => "null".to_string(),
        JsonTemplate::Bool(b) => b.to_string(),
        JsonTemplate::Number(n) => serde_json::Number::from_f64(*n)
            .map(|n| n.to_string())
            .unwrap_or_else(|| "null".to_string()),
        JsonTemplate::Expr(expr) => serde_json::Value::String(expr.source.clone()).to_string(),
        JsonTemplate::Array(items) => {
            let rendered = items
                .iter()
                .map(render_json_template)
                .collect::<Vec<_>>()
                .join(",");
            format!("[{rendered}]")
        }
        JsonTemplate::Object(fields) => {
            let rendered = fields
                .iter()
                .map(|(key, value)| {
                    format!(
                        "{}:{}",
                        serde_json::Value::String(key.clone()),
                        render_json_template(value)
                    )
                })
                .collect::<Vec<_>>()
                .join(",");
            format!("{{{rendered}}}")
        }
    }
}
