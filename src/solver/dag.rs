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

//! Multi-source synthesis: plans whose leaves are bound to named source
//! ids, with one shared leaf object per source id.

use crate::catalog::Catalog;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::rc::Rc;

use super::{SolutionNode, SolverError, solve};

/// A plan over named sources.
///
/// Distinct source ids are distinct leaves even when they share a type
/// name; every use of the same source id is the same leaf object
/// (`Rc` identity), so the plan forms a DAG rather than a tree.
#[derive(Debug, Clone)]
pub struct SolutionDag {
    root: Rc<SolutionNode>,
    leaves: BTreeMap<String, Rc<SolutionNode>>,
}

impl SolutionDag {
    /// Returns the goal-producing root node.
    pub fn root(&self) -> &Rc<SolutionNode> {
        &self.root
    }

    /// Returns the shared leaf bound to each source id.
    pub fn leaves(&self) -> &BTreeMap<String, Rc<SolutionNode>> {
        &self.leaves
    }

    /// Accumulated cost of the plan.
    pub fn cost(&self) -> f64 {
        self.root.cost
    }

    /// Accumulated confidence of the plan.
    pub fn confidence(&self) -> f64 {
        self.root.confidence
    }

    /// Renders the compact proof term.
    pub fn proof_string(&self) -> String {
        self.root.proof_string()
    }

    /// Returns a valid execution schedule: post-order (children before
    /// parent), visiting each shared node exactly once.
    pub fn schedule(&self) -> Vec<Rc<SolutionNode>> {
        let mut seen = HashSet::new();
        let mut order = Vec::new();
        visit(&self.root, &mut seen, &mut order);
        order
    }
}

fn visit(
    node: &Rc<SolutionNode>,
    seen: &mut HashSet<*const SolutionNode>,
    order: &mut Vec<Rc<SolutionNode>>,
) {
    if !seen.insert(Rc::as_ptr(node)) {
        return;
    }
    for child in &node.children {
        visit(child, seen, order);
    }
    order.push(node.clone());
}

/// Solves the goal type from named sources (source id → type name).
///
/// Returns `None` when no plan exists within the depth bound.
pub fn solve_dag(
    catalog: &Catalog,
    sources: &BTreeMap<String, String>,
    goal: &str,
    max_depth: usize,
) -> Result<Option<SolutionDag>, SolverError> {
    for type_name in sources.values() {
        if !catalog.contains_type(type_name) {
            return Err(SolverError::UnknownSourceType(type_name.clone()));
        }
    }

    let source_types: BTreeSet<String> = sources.values().cloned().collect();
    let roots = solve(catalog, &source_types, goal, max_depth)?;
    let Some(best) = roots.first() else {
        return Ok(None);
    };

    let mut binder = Binder::new(sources);
    let root = binder.bind(best);
    Ok(Some(SolutionDag {
        root,
        leaves: binder.bound,
    }))
}

/// Rewrites the leaves of a tree plan into shared, source-id-bound leaves.
struct Binder<'a> {
    ids_by_type: HashMap<&'a str, Vec<&'a str>>,
    consumed: HashMap<String, usize>,
    bound: BTreeMap<String, Rc<SolutionNode>>,
}

impl<'a> Binder<'a> {
    fn new(sources: &'a BTreeMap<String, String>) -> Self {
        let mut ids_by_type: HashMap<&str, Vec<&str>> = HashMap::new();
        for (id, type_name) in sources {
            ids_by_type
                .entry(type_name.as_str())
                .or_default()
                .push(id.as_str());
        }
        Self {
            ids_by_type,
            consumed: HashMap::new(),
            bound: BTreeMap::new(),
        }
    }

    fn bind(&mut self, node: &Rc<SolutionNode>) -> Rc<SolutionNode> {
        if node.is_leaf() {
            return self.bind_leaf(node);
        }

        // Domain positions consume source ids in declaration order.
        let children = node
            .children
            .iter()
            .map(|child| self.bind(child))
            .collect::<Vec<_>>();
        Rc::new(SolutionNode {
            produced: node.produced.clone(),
            func: node.func.clone(),
            children,
            cost: node.cost,
            confidence: node.confidence,
            source: None,
        })
    }

    fn bind_leaf(&mut self, node: &Rc<SolutionNode>) -> Rc<SolutionNode> {
        let ids = self
            .ids_by_type
            .get(node.produced.as_str())
            .expect("solver leaves only arise from source types")
            .clone();
        let cursor = self.consumed.entry(node.produced.clone()).or_default();
        // Distinct ids of the same type are handed out in map order; once
        // exhausted, further demands reuse the first id's shared leaf.
        let id = if *cursor < ids.len() {
            let id = ids[*cursor];
            *cursor += 1;
            id
        } else {
            ids[0]
        };

        self.bound
            .entry(id.to_string())
            .or_insert_with(|| {
                Rc::new(SolutionNode {
                    produced: node.produced.clone(),
                    func: None,
                    children: Vec::new(),
                    cost: 0.0,
                    confidence: 1.0,
                    source: Some(id.to_string()),
                })
            })
            .clone()
    }
}
