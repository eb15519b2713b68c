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

//! Safe evaluation of the restricted expression sub-language.
//!
//! This module is the single choke-point enforcing safety: evaluation is
//! pure (no I/O, no ambient state), deterministic, and only identifiers
//! present in the scope or in the closed builtin whitelist resolve.

mod builtins;
mod interp;

use crate::catalog::{CompiledExpr, JsonTemplate};
use crate::value::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Evaluation failure with the failing expression, the visible scope keys,
/// and the underlying cause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpressionEvaluationError {
    /// Underlying cause message.
    pub message: String,
    /// Failing expression text.
    pub expression: String,
    /// Names visible in the scope at failure time.
    pub scope_keys: Vec<String>,
}

impl fmt::Display for ExpressionEvaluationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Failed to evaluate '{}': {} (scope: {})",
            self.expression,
            self.message,
            self.scope_keys.join(", ")
        )
    }
}

impl std::error::Error for ExpressionEvaluationError {}

/// Named bindings visible to one expression evaluation.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    bindings: BTreeMap<String, Value>,
}

impl Scope {
    /// Builds the evaluation scope for one function invocation.
    ///
    /// Binding order (later entries override earlier ones):
    /// 1. caller-provided named variables,
    /// 2. record inputs spread field-by-field (in input order),
    /// 3. positional `arg{i}` bindings,
    /// 4. `value` / `input` / `x` aliases when there is exactly one input,
    /// 5. `scope1`..`scope3` aliases for three-argument functions.
    pub fn for_inputs(inputs: &[Value], variables: &BTreeMap<String, Value>) -> Scope {
        let mut bindings = variables.clone();

        for input in inputs {
            if let Value::Record(fields) = input {
                for (key, value) in fields {
                    bindings.insert(key.clone(), value.clone());
                }
            }
        }

        for (idx, input) in inputs.iter().enumerate() {
            bindings.insert(format!("arg{idx}"), input.clone());
        }

        if let [input] = inputs {
            bindings.insert("value".to_string(), input.clone());
            bindings.insert("input".to_string(), input.clone());
            bindings.insert("x".to_string(), input.clone());
        }

        if inputs.len() == 3 {
            for (idx, input) in inputs.iter().enumerate() {
                bindings.insert(format!("scope{}", idx + 1), input.clone());
            }
        }

        Scope { bindings }
    }

    /// Resolves one name.
    pub(crate) fn get(&self, name: &str) -> Option<&Value> {
        self.bindings.get(name)
    }

    /// Returns the visible names in sorted order.
    pub(crate) fn keys(&self) -> Vec<String> {
        self.bindings.keys().cloned().collect()
    }
}

/// Evaluates one compiled expression against a scope.
pub(crate) fn eval_expr(
    expr: &CompiledExpr,
    scope: &Scope,
) -> Result<Value, ExpressionEvaluationError> {
    interp::eval(&expr.body, scope).map_err(|message| ExpressionEvaluationError {
        message,
        expression: expr.source.clone(),
        scope_keys: scope.keys(),
    })
}

/// Evaluates a structured-data template: expression leaves are replaced by
/// their results, other leaves are preserved, records and arrays are
/// rebuilt with evaluated children.
pub(crate) fn eval_json_template(
    template: &JsonTemplate,
    scope: &Scope,
) -> Result<Value, ExpressionEvaluationError> {
    match template {
        JsonTemplate::Null => Ok(Value::Null),
        JsonTemplate::Bool(b) => Ok(Value::Bool(*b)),
        JsonTemplate::Number(n) => Ok(Value::Number(*n)),
        JsonTemplate::Expr(expr) => eval_expr(expr, scope),
        JsonTemplate::Array(items) => {
            let mut evaluated = Vec::with_capacity(items.len());
            for item in items {
                evaluated.push(eval_json_template(item, scope)?);
            }
            Ok(Value::Tuple(evaluated))
        }
        JsonTemplate::Object(fields) => {
            let mut evaluated = BTreeMap::new();
            for (key, value) in fields {
                evaluated.insert(key.clone(), eval_json_template(value, scope)?);
            }
            Ok(Value::Record(evaluated))
        }
    }
}

/// Evaluates a string template: every `{{name}}` placeholder is replaced by
/// the rendered value of `bindings[name]`; unknown placeholders raise.
pub(crate) fn eval_template(
    pattern: &str,
    bindings: &[(String, CompiledExpr)],
    scope: &Scope,
) -> Result<Value, ExpressionEvaluationError> {
    let mut result = String::new();
    let mut rest = pattern;

    while let Some(open) = rest.find("{{") {
        let (before, tail) = rest.split_at(open);
        result.push_str(before);
        let Some(close) = tail.find("}}") else {
            return Err(ExpressionEvaluationError {
                message: "unterminated '{{' placeholder".to_string(),
                expression: pattern.to_string(),
                scope_keys: scope.keys(),
            });
        };
        let name = tail[2..close].trim();
        let Some((_, expr)) = bindings.iter().find(|(key, _)| key == name) else {
            return Err(ExpressionEvaluationError {
                message: format!("unknown placeholder '{name}'"),
                expression: pattern.to_string(),
                scope_keys: scope.keys(),
            });
        };
        let value = eval_expr(expr, scope)?;
        result.push_str(&value.to_string());
        rest = &tail[close + 2..];
    }
    result.push_str(rest);

    Ok(Value::Str(result))
}
