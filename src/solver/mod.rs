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

//! Type-inhabitation solver: enumerates and ranks compositions of catalog
//! functions that produce a goal type from a set of source types.
//!
//! The search runs backward from the goal, bounded by a maximum number of
//! function applications from the root, and memoizes per
//! `(type name, depth)` so shared sub-problems are solved once. Cycles
//! through the catalog are cut by the depth bound.

mod dag;
mod errors;

use crate::catalog::{Catalog, FuncDef};
use serde_json::json;
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};
use std::rc::Rc;

pub use dag::{SolutionDag, solve_dag};
pub use errors::SolverError;

/// Default bound on function applications from the root.
pub const DEFAULT_MAX_DEPTH: usize = 5;

// Costs within this distance rank as equal and fall through to confidence.
const COST_TOLERANCE: f64 = 1e-3;

/// One node of a synthesized plan.
///
/// A leaf is a value supplied directly from a source; an inner node applies
/// a catalog function to its children (one child per domain position, in
/// declaration order).
#[derive(Debug, Clone, PartialEq)]
pub struct SolutionNode {
    /// Type produced by this node.
    pub produced: String,
    /// Applied function; `None` iff this node is a leaf.
    pub func: Option<Rc<FuncDef>>,
    /// Child plans, one per domain position.
    pub children: Vec<Rc<SolutionNode>>,
    /// Accumulated cost (children plus this function).
    pub cost: f64,
    /// Accumulated confidence (children times this function).
    pub confidence: f64,
    /// Bound source id; set on leaves of a [`SolutionDag`].
    pub source: Option<String>,
}

impl SolutionNode {
    /// Returns whether this node is a source leaf.
    pub fn is_leaf(&self) -> bool {
        self.func.is_none()
    }

    /// Creates a zero-cost, unity-confidence source leaf.
    pub(crate) fn leaf(type_name: &str) -> Rc<SolutionNode> {
        Rc::new(SolutionNode {
            produced: type_name.to_string(),
            func: None,
            children: Vec::new(),
            cost: 0.0,
            confidence: 1.0,
            source: None,
        })
    }

    /// Creates a function application node over already-solved children.
    pub(crate) fn apply(func: Rc<FuncDef>, children: Vec<Rc<SolutionNode>>) -> Rc<SolutionNode> {
        debug_assert_eq!(children.len(), func.arity());
        let cost = children.iter().map(|child| child.cost).sum::<f64>() + func.cost;
        let confidence = children
            .iter()
            .map(|child| child.confidence)
            .product::<f64>()
            * func.confidence;
        Rc::new(SolutionNode {
            produced: func.codomain.clone(),
            func: Some(func),
            children,
            cost,
            confidence,
            source: None,
        })
    }

    /// Renders the compact proof term (`g ∘ f`, `⟨a, b⟩ ∘ f`).
    pub fn proof_string(&self) -> String {
        let Some(func) = &self.func else {
            return "id".to_string();
        };
        if self.children.len() == 1 {
            let child = &self.children[0];
            if child.is_leaf() {
                return func.name.clone();
            }
            return format!("{} ∘ {}", child.proof_string(), func.name);
        }
        let parts = self
            .children
            .iter()
            .map(|child| child.proof_string())
            .collect::<Vec<_>>()
            .join(", ");
        format!("⟨{parts}⟩ ∘ {}", func.name)
    }

    /// Renders an indented tree view of the plan.
    pub fn tree_string(&self) -> String {
        let mut lines = Vec::new();
        self.render_tree(0, &mut lines);
        lines.join("\n")
    }

    fn render_tree(&self, indent: usize, lines: &mut Vec<String>) {
        let pad = "  ".repeat(indent);
        match &self.func {
            None => {
                let binding = self
                    .source
                    .as_deref()
                    .map(|id| format!(" ({id})"))
                    .unwrap_or_default();
                lines.push(format!("{pad}source {}{binding}", self.produced));
            }
            Some(func) => {
                lines.push(format!(
                    "{pad}{} : {} [cost {}, confidence {}]",
                    func.name,
                    func.signature(),
                    self.cost,
                    self.confidence
                ));
                for child in &self.children {
                    child.render_tree(indent + 1, lines);
                }
            }
        }
    }

    /// Serializes the plan to the JSON exchange form.
    pub fn to_json(&self) -> serde_json::Value {
        let mut node = json!({
            "type": self.produced,
            "children": self.children.iter().map(|c| c.to_json()).collect::<Vec<_>>(),
            "cost": self.cost,
            "confidence": self.confidence,
        });
        if let Some(func) = &self.func {
            node["func"] = json!({
                "name": func.name,
                "signature": func.signature(),
                "impl_kind": func.implementation.kind(),
            });
        }
        if let Some(source) = &self.source {
            node["source"] = json!(source);
        }
        node
    }
}

/// Solves the goal type from a set of source type names.
///
/// Returns ranked root candidates (best first); an empty list means no plan
/// exists within the depth bound.
pub fn solve(
    catalog: &Catalog,
    sources: &BTreeSet<String>,
    goal: &str,
    max_depth: usize,
) -> Result<Vec<Rc<SolutionNode>>, SolverError> {
    if !catalog.contains_type(goal) {
        return Err(SolverError::UnknownGoalType(goal.to_string()));
    }
    for source in sources {
        if !catalog.contains_type(source) {
            return Err(SolverError::UnknownSourceType(source.clone()));
        }
    }

    let mut search = Search {
        catalog,
        sources,
        memo: HashMap::new(),
    };
    Ok(search.candidates(goal, 0, max_depth))
}

struct Search<'a> {
    catalog: &'a Catalog,
    sources: &'a BTreeSet<String>,
    // Memoized ranked candidates per (type name, depth); candidate nodes are
    // immutable so sharing them across plans is safe.
    memo: HashMap<(String, usize), Vec<Rc<SolutionNode>>>,
}

impl Search<'_> {
    fn candidates(&mut self, type_name: &str, depth: usize, max_depth: usize) -> Vec<Rc<SolutionNode>> {
        let key = (type_name.to_string(), depth);
        if let Some(hit) = self.memo.get(&key) {
            return hit.clone();
        }

        let mut out = Vec::new();
        if self.sources.contains(type_name) {
            out.push(SolutionNode::leaf(type_name));
        }

        // The depth bound counts function applications from the root; at the
        // bound only source leaves remain.
        if depth < max_depth {
            'funcs: for func in self.catalog.funcs_returning(type_name) {
                let mut children = Vec::with_capacity(func.arity());
                for dom in &func.domain {
                    let sub = self.candidates(dom, depth + 1, max_depth);
                    // One candidate per function: the best plan per position.
                    let Some(best) = sub.first() else {
                        continue 'funcs;
                    };
                    children.push(best.clone());
                }
                out.push(SolutionNode::apply(func.clone(), children));
            }
        }

        sort_candidates(&mut out);
        self.memo.insert(key, out.clone());
        out
    }
}

/// Orders candidates: cost ascending (with tolerance), then confidence
/// descending, then declaration index for a stable output.
fn sort_candidates(candidates: &mut [Rc<SolutionNode>]) {
    candidates.sort_by(|a, b| rank(a, b));
}

fn rank(a: &SolutionNode, b: &SolutionNode) -> Ordering {
    if (a.cost - b.cost).abs() > COST_TOLERANCE {
        return a.cost.total_cmp(&b.cost);
    }
    match b.confidence.total_cmp(&a.confidence) {
        // Leaves (no function) order before any application.
        Ordering::Equal => declaration_index(a).cmp(&declaration_index(b)),
        other => other,
    }
}

fn declaration_index(node: &SolutionNode) -> Option<usize> {
    node.func.as_ref().map(|func| func.index)
}
