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

//! AST interpreter for the restricted expression sub-language.

use crate::ast::{BinOp, Expr, ExprKind, UnaryOp};
use crate::value::Value;

use super::Scope;
use super::builtins;

/// Recursively evaluates one expression node.
pub(super) fn eval(expr: &Expr, scope: &Scope) -> Result<Value, String> {
    match &expr.kind {
        ExprKind::Number(n) => Ok(Value::Number(*n)),
        ExprKind::Str(s) => Ok(Value::Str(s.clone())),
        ExprKind::Bool(b) => Ok(Value::Bool(*b)),
        ExprKind::Ident(name) => {
            // Identifier lookup is scope-driven; there is no global fallback.
            scope
                .get(name)
                .cloned()
                .ok_or_else(|| format!("unknown identifier '{name}'"))
        }
        ExprKind::Unary { op, expr } => {
            let value = eval(expr, scope)?;
            eval_unary(*op, value)
        }
        ExprKind::Binary { op, left, right } => match op {
            // Logical operators short-circuit on the left operand.
            BinOp::And => {
                let left = eval(left, scope)?;
                if !left.is_truthy() {
                    return Ok(Value::Bool(false));
                }
                let right = eval(right, scope)?;
                Ok(Value::Bool(right.is_truthy()))
            }
            BinOp::Or => {
                let left = eval(left, scope)?;
                if left.is_truthy() {
                    return Ok(Value::Bool(true));
                }
                let right = eval(right, scope)?;
                Ok(Value::Bool(right.is_truthy()))
            }
            _ => {
                let left = eval(left, scope)?;
                let right = eval(right, scope)?;
                eval_binary(*op, left, right)
            }
        },
        ExprKind::Ternary {
            cond,
            then_branch,
            else_branch,
        } => {
            let cond = eval(cond, scope)?;
            if cond.is_truthy() {
                eval(then_branch, scope)
            } else {
                eval(else_branch, scope)
            }
        }
        ExprKind::Call { name, args } => {
            let mut evaluated = Vec::with_capacity(args.len());
            for arg in args {
                evaluated.push(eval(arg, scope)?);
            }
            builtins::call(name, &evaluated)
        }
        ExprKind::Member { base, key } => {
            let base = eval(base, scope)?;
            member(&base, key)
        }
        ExprKind::Index { base, index } => {
            let base = eval(base, scope)?;
            let index = eval(index, scope)?;
            subscript(&base, &index)
        }
    }
}

/// Applies a unary operator.
fn eval_unary(op: UnaryOp, value: Value) -> Result<Value, String> {
    match op {
        UnaryOp::Plus => match value {
            Value::Number(n) => Ok(Value::Number(n)),
            other => Err(format!("unary '+' requires a number, got {}", other.type_label())),
        },
        UnaryOp::Neg => match value {
            Value::Number(n) => Ok(Value::Number(-n)),
            other => Err(format!("unary '-' requires a number, got {}", other.type_label())),
        },
        UnaryOp::Not => Ok(Value::Bool(!value.is_truthy())),
    }
}

/// Applies a non-logical binary operator.
fn eval_binary(op: BinOp, left: Value, right: Value) -> Result<Value, String> {
    match op {
        BinOp::Add => match (left, right) {
            (Value::Number(l), Value::Number(r)) => Ok(Value::Number(l + r)),
            (Value::Str(l), Value::Str(r)) => Ok(Value::Str(format!("{l}{r}"))),
            (Value::Tuple(mut l), Value::Tuple(r)) => {
                l.extend(r);
                Ok(Value::Tuple(l))
            }
            (l, r) => Err(binary_type_error("+", &l, &r)),
        },
        BinOp::Sub => numeric(op, left, right, |l, r| l - r),
        BinOp::Mul => numeric(op, left, right, |l, r| l * r),
        BinOp::Div => numeric(op, left, right, |l, r| l / r),
        BinOp::Rem => numeric(op, left, right, |l, r| l % r),
        BinOp::Pow => numeric(op, left, right, f64::powf),
        BinOp::Eq => Ok(Value::Bool(left == right)),
        BinOp::Ne => Ok(Value::Bool(left != right)),
        BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => compare(op, left, right),
        BinOp::And | BinOp::Or => unreachable!("logical operators are handled with short-circuit"),
    }
}

/// Applies a numeric binary operator.
fn numeric(op: BinOp, left: Value, right: Value, f: fn(f64, f64) -> f64) -> Result<Value, String> {
    match (left, right) {
        (Value::Number(l), Value::Number(r)) => Ok(Value::Number(f(l, r))),
        (l, r) => Err(binary_type_error(op_symbol(op), &l, &r)),
    }
}

/// Applies an ordering comparison (numbers and strings only).
fn compare(op: BinOp, left: Value, right: Value) -> Result<Value, String> {
    let ordering = match (&left, &right) {
        (Value::Number(l), Value::Number(r)) => l.partial_cmp(r),
        (Value::Str(l), Value::Str(r)) => Some(l.cmp(r)),
        _ => {
            return Err(binary_type_error(op_symbol(op), &left, &right));
        }
    };
    // NaN comparisons are false across all ordering operators.
    let Some(ordering) = ordering else {
        return Ok(Value::Bool(false));
    };
    let result = match op {
        BinOp::Lt => ordering.is_lt(),
        BinOp::Le => ordering.is_le(),
        BinOp::Gt => ordering.is_gt(),
        BinOp::Ge => ordering.is_ge(),
        _ => unreachable!("compare is only called with ordering operators"),
    };
    Ok(Value::Bool(result))
}

/// Selects a record member (`obj.key`).
fn member(base: &Value, key: &str) -> Result<Value, String> {
    match base {
        Value::Record(fields) => fields
            .get(key)
            .cloned()
            .ok_or_else(|| format!("record has no field '{key}'")),
        other => Err(format!(
            "member access '.{key}' requires a record, got {}",
            other.type_label()
        )),
    }
}

/// Applies a subscript (`obj['key']`, `seq[n]`, `text[n]`).
fn subscript(base: &Value, index: &Value) -> Result<Value, String> {
    match (base, index) {
        (Value::Record(_), Value::Str(key)) => member(base, key),
        (Value::Tuple(items), Value::Number(n)) => {
            let idx = sequence_index(*n, items.len())?;
            Ok(items[idx].clone())
        }
        (Value::Str(text), Value::Number(n)) => {
            let chars: Vec<char> = text.chars().collect();
            let idx = sequence_index(*n, chars.len())?;
            Ok(Value::Str(chars[idx].to_string()))
        }
        (base, index) => Err(format!(
            "cannot index {} with {}",
            base.type_label(),
            index.type_label()
        )),
    }
}

/// Resolves a numeric index; negative indices count from the end.
fn sequence_index(raw: f64, len: usize) -> Result<usize, String> {
    if raw.fract() != 0.0 || !raw.is_finite() {
        return Err(format!("index {raw} is not an integer"));
    }
    let signed = raw as i64;
    let resolved = if signed < 0 {
        signed + len as i64
    } else {
        signed
    };
    if resolved < 0 || resolved as usize >= len {
        return Err(format!("index {signed} out of range for length {len}"));
    }
    Ok(resolved as usize)
}

fn binary_type_error(symbol: &str, left: &Value, right: &Value) -> String {
    format!(
        "operator '{symbol}' is not defined for {} and {}",
        left.type_label(),
        right.type_label()
    )
}

fn op_symbol(op: BinOp) -> &'static str {
    match op {
        BinOp::Add => "+",
        BinOp::Sub => "-",
        BinOp::Mul => "*",
        BinOp::Div => "/",
        BinOp::Rem => "%",
        BinOp::Pow => "**",
        BinOp::Lt => "<",
        BinOp::Le => "<=",
        BinOp::Gt => ">",
        BinOp::Ge => ">=",
        BinOp::Eq => "==",
        BinOp::Ne => "!=",
        BinOp::And => "&&",
        BinOp::Or => "||",
    }
}
