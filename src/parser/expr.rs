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

//! Parser for the restricted expression sub-language.
//!
//! Precedence, low to high: ternary, `||`, `&&`, equality, comparison,
//! additive, multiplicative, unary, power (`**`, right-associative),
//! postfix (call/member/index), primary.

use crate::ast::{BinOp, Expr, ExprKind, SourceSpan, Span, UnaryOp};
use nom::Parser;
use nom::{
    branch::alt,
    bytes::complete::{tag, take_while},
    character::complete::char,
    combinator::{map, map_res, opt},
    error::context,
    multi::separated_list0,
    number::complete::recognize_float,
    sequence::{delimited, preceded},
};

use super::PResult;
use super::utils::{identifier, keyword, string_literal, ws, ws_char};

/// Top-level expression parser.
pub(super) fn expr(input: Span<'_>) -> PResult<'_, Expr> {
    parse_ternary(input)
}

/// Parses an expression with an optional `ident =` assignment prefix.
///
/// Only a single prefix is recognized; the expression value is the value of
/// the right-hand side. `==` never starts a prefix.
pub(super) fn formula_body(input: Span<'_>) -> PResult<'_, Expr> {
    let (rest, _) = opt(assignment_prefix).parse(input)?;
    expr(rest)
}

/// Recognizes `ident =` not followed by a second `=`.
fn assignment_prefix(input: Span<'_>) -> PResult<'_, ()> {
    let (rest, _) = ws(identifier).parse(input)?;
    let (rest, _) = char('=')(rest)?;
    if rest.fragment().starts_with('=') {
        return Err(nom::Err::Error(nom::error::VerboseError {
            errors: vec![(
                input,
                nom::error::VerboseErrorKind::Nom(nom::error::ErrorKind::Tag),
            )],
        }));
    }
    Ok((rest, ()))
}

/// Parses right-associative `cond ? a : b`.
fn parse_ternary(input: Span<'_>) -> PResult<'_, Expr> {
    let (rest, cond) = parse_or(input)?;
    let (rest, question) = opt(ws_char('?')).parse(rest)?;
    if question.is_none() {
        return Ok((rest, cond));
    }

    let (rest, then_branch) = expr(rest)?;
    let (rest, _) = context("':'", ws_char(':')).parse(rest)?;
    let (rest, else_branch) = parse_ternary(rest)?;
    let span = cond.span.merge(&else_branch.span);
    Ok((
        rest,
        Expr {
            kind: ExprKind::Ternary {
                cond: Box::new(cond),
                then_branch: Box::new(then_branch),
                else_branch: Box::new(else_branch),
            },
            span,
        },
    ))
}

/// Parses left-associative `||`.
fn parse_or(input: Span<'_>) -> PResult<'_, Expr> {
    let (mut input, mut left) = parse_and(input)?;
    loop {
        let (next, op) = opt(ws(tag("||"))).parse(input)?;
        if op.is_none() {
            break;
        }

        let (next, right) = parse_and(next)?;
        left = binary(BinOp::Or, left, right);
        input = next;
    }
    Ok((input, left))
}

/// Parses left-associative `&&`.
fn parse_and(input: Span<'_>) -> PResult<'_, Expr> {
    let (mut input, mut left) = parse_equality(input)?;
    loop {
        let (next, op) = opt(ws(tag("&&"))).parse(input)?;
        if op.is_none() {
            break;
        }

        let (next, right) = parse_equality(next)?;
        left = binary(BinOp::And, left, right);
        input = next;
    }
    Ok((input, left))
}

/// Parses left-associative `==` / `!=`.
fn parse_equality(input: Span<'_>) -> PResult<'_, Expr> {
    let (mut input, mut left) = parse_comparison(input)?;
    loop {
        let (next, op) = opt(alt((
            map(ws(tag("==")), |_| BinOp::Eq),
            map(ws(tag("!=")), |_| BinOp::Ne),
        )))
        .parse(input)?;
        let Some(op) = op else {
            break;
        };

        let (next, right) = parse_comparison(next)?;
        left = binary(op, left, right);
        input = next;
    }
    Ok((input, left))
}

/// Parses left-associative `<` / `<=` / `>` / `>=`.
fn parse_comparison(input: Span<'_>) -> PResult<'_, Expr> {
    let (mut input, mut left) = parse_additive(input)?;
    loop {
        // Two-character operators must be tried before their prefixes.
        let (next, op) = opt(alt((
            map(ws(tag("<=")), |_| BinOp::Le),
            map(ws(tag(">=")), |_| BinOp::Ge),
            map(ws(tag("<")), |_| BinOp::Lt),
            map(ws(tag(">")), |_| BinOp::Gt),
        )))
        .parse(input)?;
        let Some(op) = op else {
            break;
        };

        let (next, right) = parse_additive(next)?;
        left = binary(op, left, right);
        input = next;
    }
    Ok((input, left))
}

/// Parses left-associative `+` / `-`.
fn parse_additive(input: Span<'_>) -> PResult<'_, Expr> {
    let (mut input, mut left) = parse_multiplicative(input)?;
    loop {
        let (next, op) = opt(alt((ws_char('+'), ws_char('-')))).parse(input)?;
        let Some(op_char) = op else {
            break;
        };

        // Left-associative fold: `a-b-c` becomes `(a-b)-c`.
        let (next, right) = parse_multiplicative(next)?;
        let op = if op_char == '+' {
            BinOp::Add
        } else {
            BinOp::Sub
        };
        left = binary(op, left, right);
        input = next;
    }
    Ok((input, left))
}

/// Parses left-associative `*` / `/` / `%`.
fn parse_multiplicative(input: Span<'_>) -> PResult<'_, Expr> {
    let (mut input, mut left) = parse_unary(input)?;
    loop {
        let (next, op) = opt(alt((
            map(ws_char('*'), |_| BinOp::Mul),
            map(ws_char('/'), |_| BinOp::Div),
            map(ws_char('%'), |_| BinOp::Rem),
        )))
        .parse(input)?;
        let Some(op) = op else {
            break;
        };

        let (next, right) = parse_unary(next)?;
        left = binary(op, left, right);
        input = next;
    }
    Ok((input, left))
}

/// Parses prefix `+` / `-` / `!`.
fn parse_unary(input: Span<'_>) -> PResult<'_, Expr> {
    let start = input;
    // Unary operators are parsed recursively to support chains like `--x`.
    let (rest, op) = opt(alt((
        map(ws_char('+'), |_| UnaryOp::Plus),
        map(ws_char('-'), |_| UnaryOp::Neg),
        map(ws_char('!'), |_| UnaryOp::Not),
    )))
    .parse(input)?;
    if let Some(op) = op {
        let (rest, inner) = parse_unary(rest)?;
        let span = SourceSpan::from_bounds(start, rest);
        return Ok((
            rest,
            Expr {
                kind: ExprKind::Unary {
                    op,
                    expr: Box::new(inner),
                },
                span,
            },
        ));
    }
    parse_power(rest)
}

/// Parses right-associative `**`.
fn parse_power(input: Span<'_>) -> PResult<'_, Expr> {
    let (rest, base) = parse_postfix(input)?;
    let (rest, op) = opt(ws(tag("**"))).parse(rest)?;
    if op.is_none() {
        return Ok((rest, base));
    }

    // The exponent re-enters the unary level so `2 ** -3` parses.
    let (rest, exponent) = parse_unary(rest)?;
    Ok((rest, binary(BinOp::Pow, base, exponent)))
}

/// Parses postfix member/index chains (`a.b['c'][0]`).
fn parse_postfix(input: Span<'_>) -> PResult<'_, Expr> {
    let (mut input, mut base) = parse_primary(input)?;
    loop {
        if let (next, Some(key)) = opt(preceded(ws_char('.'), ws(identifier))).parse(input)? {
            let mut span = base.span.clone();
            span.end = next.location_offset();
            base = Expr {
                kind: ExprKind::Member {
                    base: Box::new(base),
                    key,
                },
                span,
            };
            input = next;
            continue;
        }

        let (next, index) = opt(delimited(
            ws_char('['),
            expr,
            context("']'", ws_char(']')),
        ))
        .parse(input)?;
        let Some(index) = index else {
            break;
        };
        let mut span = base.span.clone();
        span.end = next.location_offset();
        base = Expr {
            kind: ExprKind::Index {
                base: Box::new(base),
                index: Box::new(index),
            },
            span,
        };
        input = next;
    }
    Ok((input, base))
}

/// Parses expression atoms.
fn parse_primary(input: Span<'_>) -> PResult<'_, Expr> {
    alt((
        parse_parenthesized,
        parse_number,
        parse_string,
        parse_bool,
        parse_ident_or_call,
    ))
    .parse(input)
}

/// Parses parenthesized expressions.
fn parse_parenthesized(input: Span<'_>) -> PResult<'_, Expr> {
    let start = input;
    let (input, inner) = delimited(ws_char('('), expr, context("')'", ws_char(')'))).parse(input)?;
    let mut inner = inner;
    // Preserve outer range for better diagnostics around parenthesized terms.
    inner.span = SourceSpan::from_bounds(start, input);
    Ok((input, inner))
}

/// Parses numeric literal expressions.
fn parse_number(input: Span<'_>) -> PResult<'_, Expr> {
    let start = input;
    let (input, n) = ws(map_res(recognize_float, |s: Span<'_>| {
        s.fragment().parse::<f64>()
    }))
    .parse(input)?;
    let span = SourceSpan::from_bounds(start, input);
    Ok((
        input,
        Expr {
            kind: ExprKind::Number(n),
            span,
        },
    ))
}

/// Parses single- or double-quoted string literal expressions.
fn parse_string(input: Span<'_>) -> PResult<'_, Expr> {
    let start = input;
    let (input, text) = ws(alt((string_literal, single_quoted))).parse(input)?;
    let span = SourceSpan::from_bounds(start, input);
    Ok((
        input,
        Expr {
            kind: ExprKind::Str(text),
            span,
        },
    ))
}

/// Parses a single-quoted string literal (`'key'`).
fn single_quoted(input: Span<'_>) -> PResult<'_, String> {
    map(
        delimited(
            char('\''),
            take_while(|c| c != '\'' && c != '\n' && c != '\r'),
            context("closing quote", char('\'')),
        ),
        |s: Span<'_>| s.fragment().to_string(),
    )
    .parse(input)
}

/// Parses boolean literal expressions.
fn parse_bool(input: Span<'_>) -> PResult<'_, Expr> {
    let start = input;
    let (input, value) = ws(alt((
        map(keyword("true"), |_| true),
        map(keyword("false"), |_| false),
    )))
    .parse(input)?;
    let span = SourceSpan::from_bounds(start, input);
    Ok((
        input,
        Expr {
            kind: ExprKind::Bool(value),
            span,
        },
    ))
}

/// Parses either identifier or function call expression.
fn parse_ident_or_call(input: Span<'_>) -> PResult<'_, Expr> {
    let start = input;
    let (input, name) = ws(identifier).parse(input)?;
    let (input, args) = opt(delimited(
        ws_char('('),
        separated_list0(ws_char(','), expr),
        context("')'", ws_char(')')),
    ))
    .parse(input)?;

    let span = SourceSpan::from_bounds(start, input);
    // A name followed by `(...)` is parsed as call, otherwise identifier.
    let kind = if let Some(args) = args {
        ExprKind::Call { name, args }
    } else {
        ExprKind::Ident(name)
    };

    Ok((input, Expr { kind, span }))
}

/// Builds a binary node with a merged span.
fn binary(op: BinOp, left: Expr, right: Expr) -> Expr {
    let span = left.span.merge(&right.span);
    Expr {
        kind: ExprKind::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        },
        span,
    }
}
