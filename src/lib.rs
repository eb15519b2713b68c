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

//! Type-directed synthesis and execution of data-transformation pipelines.
//!
//! This crate provides:
//! - A catalog DSL parser (`type` / `fn` declarations with typed signatures).
//! - A type-inhabitation solver that composes catalog functions into plans
//!   producing a goal type, ranked by cost and confidence.
//! - A multi-source DAG synthesizer with shared source leaves.
//! - An execution engine dispatching on implementation kind (`formula`,
//!   `json`, `template`, `sparql`, `rest`, `builtin`).
//! - A safe interpreter for the restricted expression sub-language.
//! - Optional PROV-style provenance recording with JSON / Turtle / JSON-LD
//!   export.
//!
//! # Pipeline
//!
//! 1. Parse catalog text into an indexed [`Catalog`].
//! 2. Solve a goal type from source types into ranked [`SolutionNode`]
//!    plans (or a [`SolutionDag`] over named sources).
//! 3. Execute the chosen plan against an [`ExecutionContext`].
//!
//! # Safety
//!
//! Embedded expressions are parsed into static ASTs and interpreted against
//! an explicit scope; only a closed function whitelist is callable and
//! there is no dynamic string-to-code path. Remote-query implementation
//! kinds (`sparql`, `rest`) resolve from the context, a registered
//! resolver, or a deterministic mock value; the library itself performs
//! no I/O.

mod ast;
mod catalog;
mod diagnostics;
mod eval;
mod exec;
mod parser;
mod provenance;
mod solver;
mod value;

#[cfg(test)]
mod tests;

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

pub use ast::SourceSpan;
pub use catalog::{Catalog, CompiledExpr, FuncDef, Impl, JsonTemplate, TypeDef};
pub use diagnostics::{ParseError, ParseErrorKind};
pub use eval::{ExpressionEvaluationError, Scope};
pub use exec::{ExecutionContext, ExecutionError, Executor, MOCK_REMOTE_RESULT};
pub use provenance::{
    Activity, Agent, Association, Derivation, Entity, Generation, ProvenanceGraph, Usage,
};
pub use solver::{
    DEFAULT_MAX_DEPTH, SolutionDag, SolutionNode, SolverError, solve, solve_dag,
};
pub use value::Value;

/// Any failure from the parse / solve / execute pipeline.
#[derive(Debug)]
pub enum Error {
    /// Catalog parsing failed.
    Parse(ParseError),
    /// Solver input validation failed.
    Solver(SolverError),
    /// Plan execution failed.
    Execution(ExecutionError),
    /// No plan produces the goal type from the given sources.
    NoPlan {
        /// Requested goal type.
        goal: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Parse(err) => write!(f, "{err}"),
            Error::Solver(err) => write!(f, "{err}"),
            Error::Execution(err) => write!(f, "{err}"),
            Error::NoPlan { goal } => write!(f, "No plan produces '{goal}'"),
        }
    }
}

impl std::error::Error for Error {}

impl From<ParseError> for Error {
    fn from(value: ParseError) -> Self {
        Error::Parse(value)
    }
}

impl From<SolverError> for Error {
    fn from(value: SolverError) -> Self {
        Error::Solver(value)
    }
}

impl From<ExecutionError> for Error {
    fn from(value: ExecutionError) -> Self {
        Error::Execution(value)
    }
}

/// Parses catalog source text into an indexed catalog.
pub fn parse_catalog(source: &str) -> Result<Catalog, ParseError> {
    Catalog::parse(source)
}

/// Synthesizes and executes in one call.
///
/// Each source is a `(type name, value)` pair. A single source runs the
/// best tree plan; multiple sources run a DAG plan with one leaf per
/// source (source ids `source_{type}_{i}`).
pub fn synthesize_and_execute(
    catalog: &Catalog,
    sources: &[(&str, Value)],
    goal: &str,
) -> Result<Value, Error> {
    if let [(source_type, value)] = sources {
        let source_set = std::iter::once(source_type.to_string()).collect();
        let plans = solve(catalog, &source_set, goal, DEFAULT_MAX_DEPTH)?;
        let Some(best) = plans.first() else {
            return Err(Error::NoPlan {
                goal: goal.to_string(),
            });
        };
        let context = ExecutionContext::new().bind(source_type.to_string(), value.clone());
        return Ok(Executor::new(context).execute(best)?);
    }

    let mut ids: BTreeMap<String, String> = BTreeMap::new();
    let mut context = ExecutionContext::new();
    for (idx, (source_type, value)) in sources.iter().enumerate() {
        let id = format!("source_{source_type}_{idx}");
        ids.insert(id.clone(), source_type.to_string());
        context = context.bind(id, value.clone());
    }

    let dag = solve_dag(catalog, &ids, goal, DEFAULT_MAX_DEPTH)?.ok_or_else(|| Error::NoPlan {
        goal: goal.to_string(),
    })?;
    Ok(Executor::new(context).execute_dag(&dag)?)
}

/// Solves and executes a single-source pipeline, returning the best plan's
/// result together with the plan itself.
pub fn execute_best_plan(
    catalog: &Catalog,
    source_type: &str,
    source_value: Value,
    goal: &str,
) -> Result<(Value, Rc<SolutionNode>), Error> {
    let source_set = std::iter::once(source_type.to_string()).collect();
    let plans = solve(catalog, &source_set, goal, DEFAULT_MAX_DEPTH)?;
    let Some(best) = plans.first() else {
        return Err(Error::NoPlan {
            goal: goal.to_string(),
        });
    };
    let context = ExecutionContext::new().bind(source_type.to_string(), source_value);
    let value = Executor::new(context).execute(best)?;
    Ok((value, best.clone()))
}
