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

//! AST definitions for the catalog language with precise source spans.
//!
//! The parser creates this AST first. Catalog construction then validates
//! cross-references and compiles embedded expression strings into [`Expr`]
//! trees ready for interpretation.

use nom_locate::LocatedSpan;

/// Parser input span type carrying byte offsets and line/column info.
pub type Span<'a> = LocatedSpan<&'a str>;

/// Source range and anchor position for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSpan {
    /// Start byte offset (inclusive).
    pub start: usize,
    /// End byte offset (exclusive).
    pub end: usize,
    /// 1-based line number.
    pub line: usize,
    /// 1-based UTF-8 column.
    pub column: usize,
}

impl SourceSpan {
    /// Creates a source span from parser start/end positions.
    pub fn from_bounds(start: Span<'_>, end: Span<'_>) -> Self {
        Self {
            start: start.location_offset(),
            end: end.location_offset(),
            line: start.location_line() as usize,
            column: start.get_utf8_column(),
        }
    }

    /// Returns span length in bytes.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Returns a span that starts at `self` and ends at `other`.
    pub fn merge(&self, other: &Self) -> Self {
        Self {
            start: self.start,
            end: other.end,
            line: self.line,
            column: self.column,
        }
    }
}

/// Unary operators of the expression sub-language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// Numeric no-op (`+x`).
    Plus,
    /// Numeric negation (`-x`).
    Neg,
    /// Logical negation (`!x`).
    Not,
}

/// Binary operators of the expression sub-language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    /// Addition / concatenation (`+`).
    Add,
    /// Subtraction (`-`).
    Sub,
    /// Multiplication (`*`).
    Mul,
    /// Division (`/`).
    Div,
    /// Remainder (`%`).
    Rem,
    /// Power (`**`, right-associative).
    Pow,
    /// Less-than (`<`).
    Lt,
    /// Less-or-equal (`<=`).
    Le,
    /// Greater-than (`>`).
    Gt,
    /// Greater-or-equal (`>=`).
    Ge,
    /// Structural equality (`==`).
    Eq,
    /// Structural inequality (`!=`).
    Ne,
    /// Logical and (`&&`, short-circuiting).
    And,
    /// Logical or (`||`, short-circuiting).
    Or,
}

/// Expression node variants.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// Numeric literal.
    Number(f64),
    /// String literal.
    Str(String),
    /// Boolean literal.
    Bool(bool),
    /// Identifier reference resolved against the evaluation scope.
    Ident(String),
    /// Unary operation.
    Unary {
        /// Operator kind.
        op: UnaryOp,
        /// Operand.
        expr: Box<Expr>,
    },
    /// Binary operation.
    Binary {
        /// Operator kind.
        op: BinOp,
        /// Left operand.
        left: Box<Expr>,
        /// Right operand.
        right: Box<Expr>,
    },
    /// Conditional (`cond ? a : b`).
    Ternary {
        /// Condition.
        cond: Box<Expr>,
        /// Value when the condition is truthy.
        then_branch: Box<Expr>,
        /// Value when the condition is falsy.
        else_branch: Box<Expr>,
    },
    /// Call to a whitelisted function.
    Call {
        /// Function name.
        name: String,
        /// Call arguments.
        args: Vec<Expr>,
    },
    /// Record member access (`obj.key`).
    Member {
        /// Base expression.
        base: Box<Expr>,
        /// Member key.
        key: String,
    },
    /// Subscript access (`obj['key']`, `seq[n]`).
    Index {
        /// Base expression.
        base: Box<Expr>,
        /// Index expression.
        index: Box<Expr>,
    },
}

/// Spanned expression node.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    /// Expression payload.
    pub kind: ExprKind,
    /// Source location for diagnostics.
    pub span: SourceSpan,
}

/// Body of a `type` declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeBody {
    /// Atomic type with optional `[key=value, ...]` attributes.
    Atomic {
        /// Declared attribute pairs in source order.
        attrs: Vec<(String, String)>,
    },
    /// Product type (`type Name = A x B x C`).
    Product {
        /// Component type names in source order.
        components: Vec<String>,
    },
}

/// One `type` declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDecl {
    /// Declared type name.
    pub name: String,
    /// Atomic or product payload.
    pub body: TypeBody,
    /// Source location for diagnostics.
    pub span: SourceSpan,
}

/// Legacy `attr key:type` line attaching one attribute to the preceding
/// atomic type declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct AttrLine {
    /// Attribute key.
    pub key: String,
    /// Attribute value (a type token in the legacy dialect).
    pub value: String,
    /// Source location for diagnostics.
    pub span: SourceSpan,
}

/// Parsed `sig:` field.
#[derive(Debug, Clone, PartialEq)]
pub struct SigDecl {
    /// Domain type names in declaration order (never empty).
    pub domain: Vec<String>,
    /// Codomain type name.
    pub codomain: String,
    /// Source location for diagnostics.
    pub span: SourceSpan,
}

/// Parsed `impl:` field payload, prior to expression compilation.
#[derive(Debug, Clone, PartialEq)]
pub enum ImplDecl {
    /// Arithmetic expression over the evaluation scope.
    Formula {
        /// Raw expression text (may carry an `ident =` prefix).
        source: String,
    },
    /// Structured-data template whose string leaves are expressions.
    Json {
        /// JSON literal as written.
        schema: serde_json::Value,
    },
    /// String template with `{{key}}` placeholders and binding expressions.
    Template {
        /// Template pattern.
        pattern: String,
        /// Binding map (JSON object; values are expression strings).
        bindings: serde_json::Value,
    },
    /// Remote query placeholder.
    Sparql {
        /// Query text.
        query: String,
    },
    /// Remote query placeholder (`"METHOD, URL"` or bare URL).
    Rest {
        /// Raw argument as written.
        spec: String,
    },
    /// Named built-in aggregate.
    Builtin {
        /// Built-in name (validated at execution time).
        name: String,
    },
}

/// One `fn` declaration block.
#[derive(Debug, Clone, PartialEq)]
pub struct FnDecl {
    /// Function name (overloads producing the same codomain are allowed).
    pub name: String,
    /// Mandatory signature field.
    pub sig: Option<SigDecl>,
    /// Implementation field with its own span for malformed-impl anchors.
    pub implementation: Option<(ImplDecl, SourceSpan)>,
    /// Additive cost (defaults to 1).
    pub cost: Option<f64>,
    /// Multiplicative confidence (defaults to 1).
    pub confidence: Option<f64>,
    /// Documentation string.
    pub doc: Option<String>,
    /// Name of the function this one inverts.
    pub inverse_of: Option<String>,
    /// Source location for diagnostics.
    pub span: SourceSpan,
}

/// One top-level catalog item in source order.
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    /// Type declaration.
    Type(TypeDecl),
    /// Legacy attribute line.
    Attr(AttrLine),
    /// Function declaration.
    Fn(FnDecl),
}

/// Full parsed catalog source.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogSource {
    /// Top-level items in source order.
    pub items: Vec<Item>,
}
