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

//! Declaration and top-level item parsers.

use crate::ast::{
    AttrLine, FnDecl, ImplDecl, Item, SigDecl, SourceSpan, Span, TypeBody, TypeDecl,
};
use nom::Parser;
use nom::{
    branch::alt,
    bytes::complete::{tag, take_while},
    combinator::{cut, map, map_res, opt, value},
    error::context,
    multi::{many0, separated_list0, separated_list1},
    number::complete::recognize_float,
    sequence::{delimited, preceded},
};

use super::PResult;
use super::utils::{identifier, json_literal, keyword, string_literal, ws, ws0, ws_char};

/// Parses one top-level item.
pub(super) fn top_item(input: Span<'_>) -> PResult<'_, Item> {
    alt((
        map(type_decl, Item::Type),
        map(attr_line, Item::Attr),
        map(fn_decl, Item::Fn),
    ))
    .parse(input)
}

/// Parses a `type` declaration (atomic or product).
fn type_decl(input: Span<'_>) -> PResult<'_, TypeDecl> {
    // Spans anchor at the keyword, not at leading trivia.
    let (input, _) = ws0(input)?;
    let start = input;
    let (input, _) = keyword("type")(input)?;
    let (input, name) = context("type name", ws(identifier)).parse(input)?;

    // A declaration is a product iff a bare `=` appears before any `[`.
    let (input, eq) = opt(ws_char('=')).parse(input)?;
    if eq.is_some() {
        let (input, components) = context(
            "product components",
            cut(separated_list1(product_separator, ws(identifier))),
        )
        .parse(input)?;
        let span = SourceSpan::from_bounds(start, input);
        return Ok((
            input,
            TypeDecl {
                name,
                body: TypeBody::Product { components },
                span,
            },
        ));
    }

    let (input, attrs) = opt(delimited(
        ws_char('['),
        separated_list0(ws_char(','), attr_pair),
        context("']'", cut(ws_char(']'))),
    ))
    .parse(input)?;
    let span = SourceSpan::from_bounds(start, input);
    Ok((
        input,
        TypeDecl {
            name,
            body: TypeBody::Atomic {
                attrs: attrs.unwrap_or_default(),
            },
            span,
        },
    ))
}

/// Parses the product component separator (`x` or `×`, whitespace-framed).
fn product_separator(input: Span<'_>) -> PResult<'_, ()> {
    ws(alt((value((), tag("×")), keyword("x")))).parse(input)
}

/// Parses one `key=value` attribute pair; the value runs to `,` / `]` / EOL.
fn attr_pair(input: Span<'_>) -> PResult<'_, (String, String)> {
    let (input, key) = ws(identifier).parse(input)?;
    let (input, _) = ws_char('=').parse(input)?;
    let (input, raw) = take_while(|c| c != ',' && c != ']' && c != '\n' && c != '\r')(input)?;
    Ok((input, (key, raw.fragment().trim().to_string())))
}

/// Parses a legacy `attr key:type` line.
fn attr_line(input: Span<'_>) -> PResult<'_, AttrLine> {
    let (input, _) = ws0(input)?;
    let start = input;
    let (input, _) = keyword("attr")(input)?;
    let (input, key) = context("attribute key", cut(ws(identifier))).parse(input)?;
    let (input, _) = context("':'", cut(ws_char(':'))).parse(input)?;
    let (input, ty) = context("attribute type", cut(ws(identifier))).parse(input)?;
    let span = SourceSpan::from_bounds(start, input);
    Ok((
        input,
        AttrLine {
            key,
            value: ty,
            span,
        },
    ))
}

/// One recognized (or ignored) field inside a `fn` block.
enum Field {
    Sig(SigDecl),
    Impl(ImplDecl, SourceSpan),
    Cost(f64),
    Confidence(f64),
    Doc(String),
    InverseOf(String),
    Ignored,
}

/// Parses a `fn name { ... }` declaration block.
fn fn_decl(input: Span<'_>) -> PResult<'_, FnDecl> {
    let (input, _) = ws0(input)?;
    let start = input;
    let (input, _) = keyword("fn")(input)?;
    let (input, name) = context("function name", cut(ws(identifier))).parse(input)?;
    let (input, _) = context("'{'", cut(ws_char('{'))).parse(input)?;
    let (input, fields) = many0(field).parse(input)?;
    let (input, _) = context("closing '}'", cut(ws_char('}'))).parse(input)?;
    let span = SourceSpan::from_bounds(start, input);

    let mut decl = FnDecl {
        name,
        sig: None,
        implementation: None,
        cost: None,
        confidence: None,
        doc: None,
        inverse_of: None,
        span,
    };
    // Field order is insignificant; a repeated field keeps the last value.
    for field in fields {
        match field {
            Field::Sig(sig) => decl.sig = Some(sig),
            Field::Impl(implementation, span) => {
                decl.implementation = Some((implementation, span))
            }
            Field::Cost(cost) => decl.cost = Some(cost),
            Field::Confidence(confidence) => decl.confidence = Some(confidence),
            Field::Doc(doc) => decl.doc = Some(doc),
            Field::InverseOf(name) => decl.inverse_of = Some(name),
            Field::Ignored => {}
        }
    }

    Ok((input, decl))
}

/// Parses one field inside a `fn` block.
fn field(input: Span<'_>) -> PResult<'_, Field> {
    alt((
        sig_field,
        impl_field,
        cost_field,
        confidence_field,
        doc_field,
        inverse_field,
        unknown_field,
    ))
    .parse(input)
}

/// Parses `sig: DOMAIN -> CODOMAIN`.
fn sig_field(input: Span<'_>) -> PResult<'_, Field> {
    let (input, _) = ws0(input)?;
    let start = input;
    let (input, _) = keyword("sig")(input)?;
    let (input, _) = ws_char(':').parse(input)?;
    // Malformed signatures must not degrade into ignored fields.
    let (input, (domain, codomain)) = context("signature", cut(signature)).parse(input)?;
    let span = SourceSpan::from_bounds(start, input);
    Ok((
        input,
        Field::Sig(SigDecl {
            domain,
            codomain,
            span,
        }),
    ))
}

/// Parses the `DOMAIN -> CODOMAIN` payload of a `sig:` field.
fn signature(input: Span<'_>) -> PResult<'_, (Vec<String>, String)> {
    // Domain: `(A, B, ...)`, a bare `A, B, ...` list, or a single name.
    let (input, domain) = alt((
        delimited(
            ws_char('('),
            separated_list1(ws_char(','), ws(identifier)),
            context("')'", ws_char(')')),
        ),
        separated_list1(ws_char(','), ws(identifier)),
    ))
    .parse(input)?;
    let (input, _) = context("'->'", ws(tag("->"))).parse(input)?;
    let (input, codomain) = context("codomain type", ws(identifier)).parse(input)?;
    Ok((input, (domain, codomain)))
}

/// Parses `impl: KIND(ARG)`.
fn impl_field(input: Span<'_>) -> PResult<'_, Field> {
    let (input, _) = ws0(input)?;
    let start = input;
    let (input, _) = keyword("impl")(input)?;
    let (input, _) = ws_char(':').parse(input)?;
    // Unknown kinds and bad arguments must not degrade into ignored fields.
    let (input, implementation) = context("implementation", cut(impl_spec)).parse(input)?;
    let span = SourceSpan::from_bounds(start, input);
    Ok((input, Field::Impl(implementation, span)))
}

/// Parses the `KIND(ARG)` payload of an `impl:` field.
fn impl_spec(input: Span<'_>) -> PResult<'_, ImplDecl> {
    alt((
        map(quoted_impl("formula"), |source| ImplDecl::Formula { source }),
        map(quoted_impl("sparql"), |query| ImplDecl::Sparql { query }),
        map(quoted_impl("rest"), |spec| ImplDecl::Rest { spec }),
        map(quoted_impl("builtin"), |name| ImplDecl::Builtin { name }),
        json_impl,
        template_impl,
    ))
    .parse(input)
}

/// Parses `KIND("...")` for the string-argument implementation kinds.
fn quoted_impl<'a>(kind: &'static str) -> impl FnMut(Span<'a>) -> PResult<'a, String> {
    move |input| {
        let (input, _) = ws(keyword(kind)).parse(input)?;
        delimited(
            ws_char('('),
            ws(string_literal),
            context("')'", ws_char(')')),
        )
        .parse(input)
    }
}

/// Parses `json({...})`.
fn json_impl(input: Span<'_>) -> PResult<'_, ImplDecl> {
    let (input, _) = ws(keyword("json")).parse(input)?;
    let (input, schema) = delimited(
        ws_char('('),
        ws(json_literal),
        context("')'", ws_char(')')),
    )
    .parse(input)?;
    Ok((input, ImplDecl::Json { schema }))
}

/// Parses `template("pattern", {bindings})`.
fn template_impl(input: Span<'_>) -> PResult<'_, ImplDecl> {
    let (input, _) = ws(keyword("template")).parse(input)?;
    let (input, (pattern, bindings)) = delimited(
        ws_char('('),
        nom::sequence::separated_pair(ws(string_literal), ws_char(','), ws(json_literal)),
        context("')'", ws_char(')')),
    )
    .parse(input)?;
    Ok((input, ImplDecl::Template { pattern, bindings }))
}

/// Parses `cost: NUMBER`.
fn cost_field(input: Span<'_>) -> PResult<'_, Field> {
    let (input, _) = ws(keyword("cost")).parse(input)?;
    let (input, _) = ws_char(':').parse(input)?;
    let (input, cost) = context("number", cut(number)).parse(input)?;
    Ok((input, Field::Cost(cost)))
}

/// Parses `confidence: NUMBER`.
fn confidence_field(input: Span<'_>) -> PResult<'_, Field> {
    let (input, _) = ws(keyword("confidence")).parse(input)?;
    let (input, _) = ws_char(':').parse(input)?;
    let (input, confidence) = context("number", cut(number)).parse(input)?;
    Ok((input, Field::Confidence(confidence)))
}

/// Parses `doc: "STRING"`.
fn doc_field(input: Span<'_>) -> PResult<'_, Field> {
    let (input, _) = ws(keyword("doc")).parse(input)?;
    let (input, _) = ws_char(':').parse(input)?;
    let (input, doc) = context("doc string", cut(ws(string_literal))).parse(input)?;
    Ok((input, Field::Doc(doc)))
}

/// Parses `inverse_of: NAME`.
fn inverse_field(input: Span<'_>) -> PResult<'_, Field> {
    let (input, _) = ws(keyword("inverse_of")).parse(input)?;
    let (input, _) = ws_char(':').parse(input)?;
    let (input, name) = context("function name", cut(ws(identifier))).parse(input)?;
    Ok((input, Field::InverseOf(name)))
}

/// Consumes an unrecognized field line without interpreting it.
fn unknown_field(input: Span<'_>) -> PResult<'_, Field> {
    // Forward compatibility: unknown field names inside a block are ignored.
    let (input, _) = ws(preceded(
        identifier,
        preceded(
            ws_char(':'),
            take_while(|c| c != '\n' && c != '\r' && c != '}' && c != '#'),
        ),
    ))
    .parse(input)?;
    Ok((input, Field::Ignored))
}

/// Parses a floating-point number token.
fn number(input: Span<'_>) -> PResult<'_, f64> {
    ws(map_res(recognize_float, |s: Span<'_>| {
        s.fragment().parse::<f64>()
    }))
    .parse(input)
}

/// Parses all top-level items.
pub(super) fn items(input: Span<'_>) -> PResult<'_, Vec<Item>> {
    many0(top_item).parse(input)
}
