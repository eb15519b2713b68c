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

//! Pipeline execution: walks a solved plan against a concrete context,
//! dispatching once per call on the implementation kind.
//!
//! Execution is post-order and single-threaded; DAG nodes are evaluated
//! exactly once (memoized by node identity). The first error terminates
//! the evaluation; there are no retries and no partial results.

use crate::catalog::{FuncDef, Impl};
use crate::eval::{ExpressionEvaluationError, Scope, eval_expr, eval_json_template, eval_template};
use crate::provenance::ProvenanceGraph;
use crate::solver::{SolutionDag, SolutionNode};
use crate::value::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::Rc;

/// Deterministic result returned for unresolved remote-query kinds.
pub const MOCK_REMOTE_RESULT: f64 = 100.0;

/// Errors raised while executing a plan.
#[derive(Debug)]
pub enum ExecutionError {
    /// An embedded expression failed to evaluate.
    Expression {
        /// Function at fault.
        function: String,
        /// Underlying evaluation failure.
        source: ExpressionEvaluationError,
    },
    /// A leaf had no binding in the execution context.
    MissingSourceBinding {
        /// Missing binding name (type name or source id).
        name: String,
    },
    /// A `builtin(...)` implementation names an unknown aggregate.
    UnknownBuiltin {
        /// Function at fault.
        function: String,
        /// Unknown built-in name.
        name: String,
    },
    /// A built-in aggregate received an input it cannot process.
    InvalidInput {
        /// Function at fault.
        function: String,
        /// Cause message.
        message: String,
    },
    /// A registered external resolver failed.
    Resolver {
        /// Function at fault.
        function: String,
        /// Resolver-provided message.
        message: String,
    },
}

impl fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionError::Expression { function, source } => {
                write!(f, "Function '{function}': {source}")
            }
            ExecutionError::MissingSourceBinding { name } => {
                write!(f, "Missing source binding '{name}'")
            }
            ExecutionError::UnknownBuiltin { function, name } => {
                write!(f, "Function '{function}': unknown builtin '{name}'")
            }
            ExecutionError::InvalidInput { function, message } => {
                write!(f, "Function '{function}': {message}")
            }
            ExecutionError::Resolver { function, message } => {
                write!(f, "Function '{function}': resolver failed: {message}")
            }
        }
    }
}

impl std::error::Error for ExecutionError {}

/// Read-only bindings for one evaluation: leaf values keyed by type name
/// (or source id in the DAG case) plus named variables visible to
/// expression scopes.
#[derive(Debug, Clone, Default)]
pub struct ExecutionContext {
    bindings: BTreeMap<String, Value>,
    variables: BTreeMap<String, Value>,
}

impl ExecutionContext {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds one leaf value (type name, source id, or function name for
    /// remote-query overrides).
    pub fn bind(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.bindings.insert(name.into(), value.into());
        self
    }

    /// Adds one named variable visible to formula/json/template scopes.
    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }

    /// Looks up one binding.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.bindings.get(name)
    }
}

type Resolver = dyn Fn(&FuncDef, &[Value]) -> Result<Value, String>;

/// Walks solved plans and produces final values.
pub struct Executor {
    context: ExecutionContext,
    resolver: Option<Box<Resolver>>,
    provenance: Option<ProvenanceGraph>,
}

impl Executor {
    /// Creates an executor over a context.
    pub fn new(context: ExecutionContext) -> Self {
        Self {
            context,
            resolver: None,
            provenance: None,
        }
    }

    /// Registers an external resolver for `sparql` / `rest` implementations.
    pub fn with_resolver(
        mut self,
        resolver: impl Fn(&FuncDef, &[Value]) -> Result<Value, String> + 'static,
    ) -> Self {
        self.resolver = Some(Box::new(resolver));
        self
    }

    /// Enables provenance recording.
    pub fn with_provenance(mut self) -> Self {
        self.provenance = Some(ProvenanceGraph::new());
        self
    }

    /// Returns the accumulated provenance graph, if recording is enabled.
    pub fn provenance(&self) -> Option<&ProvenanceGraph> {
        self.provenance.as_ref()
    }

    /// Drains the accumulated provenance graph.
    pub fn take_provenance(&mut self) -> Option<ProvenanceGraph> {
        self.provenance.take()
    }

    /// Executes a tree plan; leaves resolve from the context by type name.
    pub fn execute(&mut self, root: &Rc<SolutionNode>) -> Result<Value, ExecutionError> {
        let mut run = Run {
            memo: HashMap::new(),
            entity_ids: HashMap::new(),
        };
        self.eval_node(root, &mut run)
    }

    /// Executes a DAG plan; leaves resolve from the context by source id.
    pub fn execute_dag(&mut self, dag: &SolutionDag) -> Result<Value, ExecutionError> {
        self.execute(dag.root())
    }

    fn eval_node(
        &mut self,
        node: &Rc<SolutionNode>,
        run: &mut Run,
    ) -> Result<Value, ExecutionError> {
        let key = Rc::as_ptr(node);
        if let Some(hit) = run.memo.get(&key) {
            return Ok(hit.clone());
        }

        let value = if let Some(func) = node.func.clone() {
            // Children first (post-order), in domain declaration order.
            let mut inputs = Vec::with_capacity(node.children.len());
            for child in &node.children {
                inputs.push(self.eval_node(child, run)?);
            }
            self.invoke(&func, node, &inputs, run)?
        } else {
            let name = node.source.as_deref().unwrap_or(&node.produced);
            self.context
                .get(name)
                .cloned()
                .ok_or_else(|| ExecutionError::MissingSourceBinding {
                    name: name.to_string(),
                })?
        };

        run.memo.insert(key, value.clone());
        Ok(value)
    }

    fn invoke(
        &mut self,
        func: &Rc<FuncDef>,
        node: &Rc<SolutionNode>,
        inputs: &[Value],
        run: &mut Run,
    ) -> Result<Value, ExecutionError> {
        let activity = self
            .provenance
            .as_mut()
            .map(|graph| graph.begin_activity(func));

        if let Some(activity) = &activity {
            let graph = self
                .provenance
                .as_mut()
                .expect("activity only exists when recording is enabled");
            for (idx, (child, input)) in node.children.iter().zip(inputs).enumerate() {
                // Shared children keep one entity, keyed by node identity.
                let entity = run
                    .entity_ids
                    .entry(Rc::as_ptr(child))
                    .or_insert_with(|| graph.add_entity(&child.produced, input))
                    .clone();
                graph.add_usage(activity, &entity, &format!("arg{idx}"));
            }
        }

        let output = self.dispatch(func, inputs)?;

        if let Some(activity) = &activity {
            let graph = self
                .provenance
                .as_mut()
                .expect("activity only exists when recording is enabled");
            let output_entity = graph.add_entity(&func.codomain, &output);
            graph.add_generation(&output_entity, activity, "output");
            for child in &node.children {
                let child_entity = run.entity_ids[&Rc::as_ptr(child)].clone();
                graph.add_derivation(&output_entity, &child_entity, activity);
            }
            run.entity_ids.insert(Rc::as_ptr(node), output_entity);
            graph.end_activity(activity);
        }

        Ok(output)
    }

    /// Dispatches one call on the implementation kind.
    fn dispatch(&mut self, func: &Rc<FuncDef>, inputs: &[Value]) -> Result<Value, ExecutionError> {
        let expression_error = |source| ExecutionError::Expression {
            function: func.name.clone(),
            source,
        };

        match &func.implementation {
            Impl::Formula(expr) => {
                let scope = self.scope_for(inputs);
                eval_expr(expr, &scope).map_err(expression_error)
            }
            Impl::Json(template) => {
                let scope = self.scope_for(inputs);
                eval_json_template(template, &scope).map_err(expression_error)
            }
            Impl::Template { pattern, bindings } => {
                let scope = self.scope_for(inputs);
                eval_template(pattern, bindings, &scope).map_err(expression_error)
            }
            Impl::Sparql { .. } | Impl::Rest { .. } => self.resolve_remote(func, inputs),
            Impl::Builtin { name } => builtin_aggregate(func, name, inputs),
        }
    }

    fn scope_for(&self, inputs: &[Value]) -> Scope {
        Scope::for_inputs(inputs, &self.context.variables)
    }

    /// Resolves a remote-query implementation: context override first, then
    /// the registered resolver, then the deterministic mock value.
    fn resolve_remote(
        &mut self,
        func: &Rc<FuncDef>,
        inputs: &[Value],
    ) -> Result<Value, ExecutionError> {
        if let Some(bound) = self.context.get(&func.name) {
            return Ok(bound.clone());
        }
        if let Some(resolver) = &self.resolver {
            return resolver(func, inputs).map_err(|message| ExecutionError::Resolver {
                function: func.name.clone(),
                message,
            });
        }
        Ok(Value::Number(MOCK_REMOTE_RESULT))
    }
}

/// Per-execution state: value memoization and provenance entity ids, both
/// keyed by node identity.
struct Run {
    memo: HashMap<*const SolutionNode, Value>,
    entity_ids: HashMap<*const SolutionNode, String>,
}

/// Dispatches one built-in aggregate.
fn builtin_aggregate(
    func: &Rc<FuncDef>,
    name: &str,
    inputs: &[Value],
) -> Result<Value, ExecutionError> {
    let invalid = |message: String| ExecutionError::InvalidInput {
        function: func.name.clone(),
        message,
    };
    // Multi-argument invocations collapse into one tuple input, so sequence
    // aggregates work unchanged over n-ary signatures.
    let sole = |inputs: &[Value]| -> Result<Value, ExecutionError> {
        match inputs {
            [] => Err(invalid(format!("builtin '{name}' received no input"))),
            [input] => Ok(input.clone()),
            many => Ok(Value::Tuple(many.to_vec())),
        }
    };

    match name {
        "identity" => sole(inputs),
        // Sequence aggregates treat the sole input as a tuple; any other
        // value passes through unchanged (`count` reports 1).
        "sum" => match sole(inputs)? {
            Value::Tuple(items) => Ok(Value::Number(numbers(&items).map_err(invalid)?.iter().sum())),
            other => Ok(other),
        },
        "product" => match sole(inputs)? {
            Value::Tuple(items) => Ok(Value::Number(
                numbers(&items).map_err(invalid)?.iter().product(),
            )),
            other => Ok(other),
        },
        "average" => match sole(inputs)? {
            Value::Tuple(items) if !items.is_empty() => {
                let numbers = numbers(&items).map_err(invalid)?;
                Ok(Value::Number(
                    numbers.iter().sum::<f64>() / numbers.len() as f64,
                ))
            }
            other => Ok(other),
        },
        "first" => match sole(inputs)? {
            Value::Tuple(items) => items
                .first()
                .cloned()
                .ok_or_else(|| invalid("builtin 'first' received an empty sequence".to_string())),
            other => Ok(other),
        },
        "last" => match sole(inputs)? {
            Value::Tuple(items) => items
                .last()
                .cloned()
                .ok_or_else(|| invalid("builtin 'last' received an empty sequence".to_string())),
            other => Ok(other),
        },
        "count" => match sole(inputs)? {
            Value::Tuple(items) => Ok(Value::Number(items.len() as f64)),
            _ => Ok(Value::Number(1.0)),
        },
        "abs" | "round" => {
            let input = sole(inputs)?;
            let n = input.as_number().ok_or_else(|| {
                invalid(format!(
                    "builtin '{name}' expects a number, got {}",
                    input.type_label()
                ))
            })?;
            Ok(Value::Number(if name == "abs" { n.abs() } else { n.round() }))
        }
        _ => Err(ExecutionError::UnknownBuiltin {
            function: func.name.clone(),
            name: name.to_string(),
        }),
    }
}

/// Extracts the numeric items of a sequence aggregate input.
fn numbers(items: &[Value]) -> Result<Vec<f64>, String> {
    items
        .iter()
        .map(|item| {
            item.as_number().ok_or_else(|| {
                format!("sequence aggregate expects numbers, got {}", item.type_label())
            })
        })
        .collect()
}
