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

//! Error types surfaced by solver APIs.
//!
//! Absence of a plan is not an error (the result is simply empty); errors
//! are raised only for invalid inputs.

use std::fmt;

/// Errors produced by `solve` / `solve_dag` input validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolverError {
    /// The goal type is not declared in the catalog.
    UnknownGoalType(String),
    /// A source type is not declared in the catalog.
    UnknownSourceType(String),
}

impl fmt::Display for SolverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverError::UnknownGoalType(name) => write!(f, "Unknown goal type '{name}'"),
            SolverError::UnknownSourceType(name) => write!(f, "Unknown source type '{name}'"),
        }
    }
}

impl std::error::Error for SolverError {}
