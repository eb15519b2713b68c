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

//! Closed whitelist of functions callable from expressions.
//!
//! Any name outside this set is a runtime error; there is no dynamic
//! string-to-code path anywhere in evaluation.

use crate::value::Value;
use std::collections::BTreeMap;

/// Dispatches one whitelisted call.
pub(super) fn call(name: &str, args: &[Value]) -> Result<Value, String> {
    match name {
        "abs" => unary_numeric(name, args, f64::abs),
        "round" => unary_numeric(name, args, f64::round),
        "sqrt" => unary_numeric(name, args, f64::sqrt),
        "log" => unary_numeric(name, args, f64::ln),
        "exp" => unary_numeric(name, args, f64::exp),
        "sin" => unary_numeric(name, args, f64::sin),
        "cos" => unary_numeric(name, args, f64::cos),
        "tan" => unary_numeric(name, args, f64::tan),
        "min" => fold_numbers(name, args, f64::min),
        "max" => fold_numbers(name, args, f64::max),
        "sum" => {
            let numbers = spread_numbers(name, args)?;
            Ok(Value::Number(numbers.iter().sum()))
        }
        "len" => {
            let [value] = expect_1_arg(name, args)?;
            let len = match value {
                Value::Str(s) => s.chars().count(),
                Value::Tuple(items) => items.len(),
                Value::Record(fields) => fields.len(),
                other => {
                    return Err(format!("len expects a sequence, got {}", other.type_label()));
                }
            };
            Ok(Value::Number(len as f64))
        }
        "isinstance" => {
            let [value, kind] = expect_2_args(name, args)?;
            let Value::Str(kind) = kind else {
                return Err("isinstance expects a type-name string".to_string());
            };
            is_instance(value, kind).map(Value::Bool)
        }
        "dict" => match args {
            [] => Ok(Value::Record(BTreeMap::new())),
            [Value::Record(fields)] => Ok(Value::Record(fields.clone())),
            [other] => Err(format!("dict expects a record, got {}", other.type_label())),
            _ => Err(arity_error(name, "at most 1", args.len())),
        },
        "list" | "tuple" => match args {
            [] => Ok(Value::Tuple(Vec::new())),
            [Value::Tuple(items)] => Ok(Value::Tuple(items.clone())),
            [Value::Str(s)] => Ok(Value::Tuple(
                s.chars().map(|c| Value::Str(c.to_string())).collect(),
            )),
            [Value::Record(fields)] => Ok(Value::Tuple(
                fields.keys().map(|k| Value::Str(k.clone())).collect(),
            )),
            [other] => Err(format!(
                "{name} expects a sequence, got {}",
                other.type_label()
            )),
            _ => Err(arity_error(name, "at most 1", args.len())),
        },
        "str" => {
            let [value] = expect_1_arg(name, args)?;
            Ok(Value::Str(value.to_string()))
        }
        "int" => {
            let [value] = expect_1_arg(name, args)?;
            let n = coerce_number(name, value)?;
            Ok(Value::Number(n.trunc()))
        }
        "float" => {
            let [value] = expect_1_arg(name, args)?;
            let n = coerce_number(name, value)?;
            Ok(Value::Number(n))
        }
        "dir" => {
            let [value] = expect_1_arg(name, args)?;
            match value {
                Value::Record(fields) => Ok(Value::Tuple(
                    fields.keys().map(|k| Value::Str(k.clone())).collect(),
                )),
                _ => Ok(Value::Tuple(Vec::new())),
            }
        }
        _ => Err(format!("unknown function '{name}'")),
    }
}

/// Classifies a value against a type-name string.
fn is_instance(value: &Value, kind: &str) -> Result<bool, String> {
    let matches = match kind {
        "number" | "int" | "float" => matches!(value, Value::Number(_)),
        "str" | "string" => matches!(value, Value::Str(_)),
        "bool" => matches!(value, Value::Bool(_)),
        "list" | "tuple" => matches!(value, Value::Tuple(_)),
        "dict" | "record" => matches!(value, Value::Record(_)),
        "null" | "none" => matches!(value, Value::Null),
        _ => {
            return Err(format!("isinstance: unknown type name '{kind}'"));
        }
    };
    Ok(matches)
}

/// Applies a one-argument numeric function.
fn unary_numeric(name: &str, args: &[Value], f: fn(f64) -> f64) -> Result<Value, String> {
    let [value] = expect_1_arg(name, args)?;
    let n = value
        .as_number()
        .ok_or_else(|| format!("{name} expects a number, got {}", value.type_label()))?;
    Ok(Value::Number(f(n)))
}

/// Folds numbers pairwise (`min`, `max`).
fn fold_numbers(name: &str, args: &[Value], f: fn(f64, f64) -> f64) -> Result<Value, String> {
    let numbers = spread_numbers(name, args)?;
    let Some(first) = numbers.first() else {
        return Err(format!("{name} expects at least one value"));
    };
    Ok(Value::Number(
        numbers[1..].iter().fold(*first, |acc, n| f(acc, *n)),
    ))
}

/// Accepts either one sequence argument or a variadic list of numbers.
fn spread_numbers(name: &str, args: &[Value]) -> Result<Vec<f64>, String> {
    let items: &[Value] = match args {
        [Value::Tuple(items)] => items.as_slice(),
        other => other,
    };
    items
        .iter()
        .map(|value| {
            value
                .as_number()
                .ok_or_else(|| format!("{name} expects numbers, got {}", value.type_label()))
        })
        .collect()
}

/// Coerces a value to a number (`int` / `float` builtins).
fn coerce_number(name: &str, value: &Value) -> Result<f64, String> {
    match value {
        Value::Number(n) => Ok(*n),
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Value::Str(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("{name}: cannot parse '{s}' as a number")),
        other => Err(format!("{name} expects a number, got {}", other.type_label())),
    }
}

/// Validates and extracts exactly one argument.
fn expect_1_arg<'a>(name: &str, args: &'a [Value]) -> Result<[&'a Value; 1], String> {
    // Keep function arity checks centralized for consistent diagnostics.
    match args {
        [value] => Ok([value]),
        _ => Err(arity_error(name, "exactly 1", args.len())),
    }
}

/// Validates and extracts exactly two arguments.
fn expect_2_args<'a>(name: &str, args: &'a [Value]) -> Result<[&'a Value; 2], String> {
    // Keep function arity checks centralized for consistent diagnostics.
    match args {
        [first, second] => Ok([first, second]),
        _ => Err(arity_error(name, "exactly 2", args.len())),
    }
}

fn arity_error(name: &str, expected: &str, found: usize) -> String {
    format!("{name} expects {expected} argument(s), found {found}")
}
