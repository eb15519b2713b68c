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

//! `nom` parser for the catalog language.
//!
//! The grammar supports:
//! - atomic `type Name [key=value, ...]` declarations
//! - product `type Name = A x B x C` declarations (`x` or `×`)
//! - legacy `attr key:type` attribute lines
//! - `fn name { sig/impl/cost/confidence/doc/inverse_of }` blocks
//!
//! The expression sub-language (used by `formula`, `json` string leaves and
//! `template` bindings) supports literals, identifiers, member/index access,
//! arithmetic, comparisons, logical operators, a ternary conditional, and
//! calls into a closed function whitelist.

mod decls;
mod expr;
mod utils;

use crate::ast::{CatalogSource, Expr, SourceSpan, Span};
use crate::diagnostics::{ParseError, ParseErrorKind};
use nom::{
    IResult,
    combinator::all_consuming,
    error::{VerboseError, VerboseErrorKind},
    sequence::delimited,
};

use self::utils::ws0;

type PResult<'a, O> = IResult<Span<'a>, O, VerboseError<Span<'a>>>;

/// Parses full catalog source into a spanned item list.
pub(crate) fn parse_catalog_source(source: &str) -> Result<CatalogSource, ParseError> {
    let input = Span::new(source);
    // `all_consuming` ensures trailing garbage is treated as syntax error.
    let (_, items) = match all_consuming(delimited(ws0, decls::items, ws0))(input) {
        Ok(v) => v,
        Err(err) => return Err(parse_error_to_diagnostic(err, source)),
    };
    Ok(CatalogSource { items })
}

/// Parses one standalone expression of the restricted sub-language.
pub(crate) fn parse_expression_text(source: &str) -> Result<Expr, ParseError> {
    let input = Span::new(source);
    match all_consuming(delimited(ws0, expr::expr, ws0))(input) {
        Ok((_, parsed)) => Ok(parsed),
        Err(err) => Err(parse_error_to_diagnostic(err, source)),
    }
}

/// Parses a formula body, stripping one optional `ident =` prefix.
pub(crate) fn parse_formula_text(source: &str) -> Result<Expr, ParseError> {
    let input = Span::new(source);
    match all_consuming(delimited(ws0, expr::formula_body, ws0))(input) {
        Ok((_, parsed)) => Ok(parsed),
        Err(err) => Err(parse_error_to_diagnostic(err, source)),
    }
}

/// Converts a `nom` verbose error to crate-level parse diagnostics.
fn parse_error_to_diagnostic(err: nom::Err<VerboseError<Span<'_>>>, source: &str) -> ParseError {
    match err {
        nom::Err::Incomplete(_) => ParseError::message_only("Incomplete input"),
        nom::Err::Error(e) | nom::Err::Failure(e) => {
            let kind = classify_error(&e);
            // Use the deepest recorded parser error as the diagnostic anchor.
            if let Some((span, verbose_kind)) = e.errors.last() {
                let span = SourceSpan::from_bounds(*span, *span);
                let detail = match verbose_kind {
                    VerboseErrorKind::Context(ctx) => format!("Syntax error: expected {ctx}"),
                    VerboseErrorKind::Char(c) => format!("Syntax error: expected '{c}'"),
                    VerboseErrorKind::Nom(kind) => format!("Syntax error near {kind:?}"),
                };
                ParseError::from_span(detail, source, &span).with_kind(kind)
            } else {
                ParseError::message_only("Syntax error")
            }
        }
    }
}

/// Maps recorded context labels onto the parse-failure classification.
fn classify_error(err: &VerboseError<Span<'_>>) -> ParseErrorKind {
    for (_, kind) in &err.errors {
        let VerboseErrorKind::Context(ctx) = kind else {
            continue;
        };
        match *ctx {
            "signature" => return ParseErrorKind::MalformedSignature,
            "implementation" => return ParseErrorKind::MalformedImpl,
            "closing '}'" => return ParseErrorKind::UnterminatedFunctionBlock,
            _ => {}
        }
    }
    ParseErrorKind::Syntax
}
