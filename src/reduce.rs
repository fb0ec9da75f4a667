//! Structural-congruence reduction.
//!
//! `Reducer` rewrites a term into a smaller congruent one by applying fixed
//! algebraic identities bottom-up:
//!
//! | Rule | Result |
//! |------|--------|
//! | `0 + P`, `P + 0` | `P` |
//! | `P + P` (same node) | `P` |
//! | `0 \| P`, `P \| 0` | `P` |
//! | `0 \ L` | `0` |
//! | `P \ ∅` | `P` |
//! | `(P \ L1) \ L2` | `P \ (L1 ∪ L2)` (new node) |
//! | `0[f]` | `0` |
//!
//! Children are reduced first and a parent whose children changed has its
//! references redirected in place. Every visited node is memoised, so a
//! shared node is reduced once; a node that fires no rule maps to itself.
//! Callers must use the returned identifier: a firing rule returns a
//! different node.
//!
//! Named references are not descended through; definition bodies are reduced
//! by [`Reducer::reduce_program`].
//!
//! # Determinism
//! The same graph reduced in the same order produces the same identifiers,
//! including those of merged restriction nodes.

use crate::arena::ProcessId;
use crate::error::EngineError;
use crate::graph::ProcessGraph;
use crate::term::Process;
use hashbrown::HashMap;
use tracing::{debug, trace};

/// Rule that fired at a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RewriteKind {
    /// `0 + P → P`, `P + 0 → P`.
    SumIdentity,
    /// `P + P → P`.
    SumIdempotence,
    /// `0 | P → P`, `P | 0 → P`.
    ParallelIdentity,
    /// `0 \ L → 0`.
    RestrictionOfNull,
    /// `P \ ∅ → P`.
    EmptyRestriction,
    /// `(P \ L1) \ L2 → P \ (L1 ∪ L2)`.
    RestrictionMerge,
    /// `0[f] → 0`.
    RelabellingOfNull,
}

/// Memoising structural-congruence reducer.
///
/// The memo is scoped to one graph; a reducer must not be reused on another.
#[derive(Debug, Default)]
pub struct Reducer {
    /// Node → reduced node. Stable nodes map to themselves.
    memo: HashMap<ProcessId, ProcessId>,
    /// Number of rule firings per kind.
    fired: HashMap<RewriteKind, usize>,
}

impl Reducer {
    /// Creates a reducer with an empty memo.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reduces the term rooted at `id` and returns the reduced node.
    pub fn reduce(&mut self, graph: &mut ProcessGraph, id: ProcessId) -> Result<ProcessId, EngineError> {
        self.visit(graph, id)
    }

    /// Reduces every definition body and redirects the named processes to
    /// the reduced bodies.
    pub fn reduce_program(&mut self, graph: &mut ProcessGraph) -> Result<(), EngineError> {
        for named in graph.named_processes() {
            if let Some(body) = graph.body_of(named)? {
                let reduced = self.visit(graph, body)?;
                if reduced != body {
                    graph.set_body(named, reduced)?;
                }
            }
        }
        debug!(fired = self.total_fired(), memo = self.memo.len(), "reduced program definitions");
        Ok(())
    }

    /// Returns `true` if `id` has been visited and fired no rule.
    pub fn is_stable(&self, id: ProcessId) -> bool {
        self.memo.get(&id) == Some(&id)
    }

    /// Number of times `kind` fired.
    pub fn fired(&self, kind: RewriteKind) -> usize {
        self.fired.get(&kind).copied().unwrap_or(0)
    }

    /// Total number of rule firings.
    pub fn total_fired(&self) -> usize {
        self.fired.values().sum()
    }

    fn record(&mut self, kind: RewriteKind, from: ProcessId, to: ProcessId) -> ProcessId {
        trace!(?kind, %from, %to, "reduction rule fired");
        *self.fired.entry(kind).or_insert(0) += 1;
        to
    }

    fn reduced(&self, id: ProcessId) -> Result<ProcessId, EngineError> {
        self.memo.get(&id).copied().ok_or(EngineError::ProcessNotFound(id))
    }

    /// Post-order walk with an explicit stack of `(id, children_done)`
    /// frames.
    fn visit(&mut self, graph: &mut ProcessGraph, root: ProcessId) -> Result<ProcessId, EngineError> {
        let mut stack = vec![(root, false)];
        while let Some((id, children_done)) = stack.pop() {
            if self.memo.contains_key(&id) {
                continue;
            }
            let process = graph.process(id)?.clone();
            if !children_done {
                stack.push((id, true));
                for child in process.children().into_iter().rev() {
                    if !self.memo.contains_key(&child) {
                        stack.push((child, false));
                    }
                }
                continue;
            }
            let result = self.rewrite(graph, id, process)?;
            self.memo.insert(id, result);
        }
        self.reduced(root)
    }

    /// Redirects the children of `id` to their reduced nodes and applies the
    /// first matching rule. Children must already be reduced.
    fn rewrite(
        &mut self,
        graph: &mut ProcessGraph,
        id: ProcessId,
        process: Process,
    ) -> Result<ProcessId, EngineError> {
        let result = match process {
            Process::Null | Process::Named { .. } => id,
            Process::ActionPrefix { action, next } => {
                let reduced = self.reduced(next)?;
                if reduced != next {
                    *graph.process_mut(id)? = Process::ActionPrefix { action, next: reduced };
                }
                id
            }
            Process::DelayPrefix { delay, next } => {
                let reduced = self.reduced(next)?;
                if reduced != next {
                    *graph.process_mut(id)? = Process::DelayPrefix { delay, next: reduced };
                }
                id
            }
            Process::Sum { left, right } => {
                let (l, r) = (self.reduced(left)?, self.reduced(right)?);
                if (l, r) != (left, right) {
                    *graph.process_mut(id)? = Process::Sum { left: l, right: r };
                }
                if graph.is_null(l) {
                    self.record(RewriteKind::SumIdentity, id, r)
                } else if graph.is_null(r) {
                    self.record(RewriteKind::SumIdentity, id, l)
                } else if l == r {
                    self.record(RewriteKind::SumIdempotence, id, l)
                } else {
                    id
                }
            }
            Process::Parallel { left, right } => {
                let (l, r) = (self.reduced(left)?, self.reduced(right)?);
                if (l, r) != (left, right) {
                    *graph.process_mut(id)? = Process::Parallel { left: l, right: r };
                }
                if graph.is_null(l) {
                    self.record(RewriteKind::ParallelIdentity, id, r)
                } else if graph.is_null(r) {
                    self.record(RewriteKind::ParallelIdentity, id, l)
                } else {
                    id
                }
            }
            Process::Restriction { body, labels } => {
                let reduced = self.reduced(body)?;
                if reduced != body {
                    *graph.process_mut(id)? = Process::Restriction {
                        body: reduced,
                        labels: labels.clone(),
                    };
                }
                if graph.is_null(reduced) {
                    self.record(RewriteKind::RestrictionOfNull, id, reduced)
                } else if labels.is_empty() {
                    self.record(RewriteKind::EmptyRestriction, id, reduced)
                } else if let Process::Restriction { body: inner, labels: inner_labels } =
                    graph.process(reduced)?.clone()
                {
                    let mut union = inner_labels;
                    union.extend(labels);
                    let merged = graph.add(Process::Restriction { body: inner, labels: union });
                    self.memo.insert(merged, merged);
                    self.record(RewriteKind::RestrictionMerge, id, merged)
                } else {
                    id
                }
            }
            Process::Relabelling { body, relabelling } => {
                let reduced = self.reduced(body)?;
                if reduced != body {
                    *graph.process_mut(id)? = Process::Relabelling {
                        body: reduced,
                        relabelling,
                    };
                }
                if graph.is_null(reduced) {
                    self.record(RewriteKind::RelabellingOfNull, id, reduced)
                } else {
                    id
                }
            }
        };
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::{Action, RelabelMap};

    fn prefixed(graph: &mut ProcessGraph, label: &str) -> ProcessId {
        let zero = graph.null();
        graph.prefix(Action::input(label), zero)
    }

    #[test]
    fn sum_with_null_is_the_other_branch() {
        let mut graph = ProcessGraph::new();
        let zero = graph.null();
        let p = prefixed(&mut graph, "a");
        let left = graph.sum(zero, p);
        let right = graph.sum(p, zero);
        let mut reducer = Reducer::new();
        assert_eq!(reducer.reduce(&mut graph, left).unwrap(), p);
        assert_eq!(reducer.reduce(&mut graph, right).unwrap(), p);
        assert_eq!(reducer.fired(RewriteKind::SumIdentity), 2);
    }

    #[test]
    fn sum_of_same_node_collapses() {
        let mut graph = ProcessGraph::new();
        let p = prefixed(&mut graph, "a");
        let twice = graph.sum(p, p);
        let mut reducer = Reducer::new();
        assert_eq!(reducer.reduce(&mut graph, twice).unwrap(), p);
    }

    #[test]
    fn parallel_of_nulls_is_null() {
        let mut graph = ProcessGraph::new();
        let z1 = graph.null();
        let z2 = graph.null();
        let par = graph.parallel(z1, z2);
        let mut reducer = Reducer::new();
        let reduced = reducer.reduce(&mut graph, par).unwrap();
        assert!(graph.is_null(reduced));
    }

    #[test]
    fn nested_restrictions_merge() {
        let mut graph = ProcessGraph::new();
        let p = prefixed(&mut graph, "c");
        let inner = graph.restrict(p, ["a"]);
        let outer = graph.restrict(inner, ["b"]);
        let mut reducer = Reducer::new();
        let reduced = reducer.reduce(&mut graph, outer).unwrap();
        assert_ne!(reduced, outer);
        assert_eq!(
            graph.process(reduced).unwrap(),
            &Process::Restriction {
                body: p,
                labels: ["a".to_string(), "b".to_string()].into(),
            }
        );
        assert!(reducer.is_stable(reduced));
    }

    #[test]
    fn empty_restriction_disappears() {
        let mut graph = ProcessGraph::new();
        let p = prefixed(&mut graph, "a");
        let hidden = graph.restrict(p, Vec::<String>::new());
        let mut reducer = Reducer::new();
        assert_eq!(reducer.reduce(&mut graph, hidden).unwrap(), p);
    }

    #[test]
    fn operators_over_null_vanish() {
        let mut graph = ProcessGraph::new();
        let zero = graph.null();
        let hidden = graph.restrict(zero, ["a"]);
        let renamed = graph.relabel(zero, RelabelMap::new().with("b", "a"));
        let mut reducer = Reducer::new();
        assert_eq!(reducer.reduce(&mut graph, hidden).unwrap(), zero);
        assert_eq!(reducer.reduce(&mut graph, renamed).unwrap(), zero);
    }

    #[test]
    fn children_are_redirected_in_place() {
        let mut graph = ProcessGraph::new();
        let zero = graph.null();
        let p = prefixed(&mut graph, "a");
        let inner = graph.sum(zero, p);
        let guarded = graph.prefix(Action::input("b"), inner);
        let mut reducer = Reducer::new();
        assert_eq!(reducer.reduce(&mut graph, guarded).unwrap(), guarded);
        assert_eq!(
            graph.process(guarded).unwrap(),
            &Process::ActionPrefix { action: Action::input("b"), next: p }
        );
    }

    #[test]
    fn reduction_is_idempotent() {
        let mut graph = ProcessGraph::new();
        let zero = graph.null();
        let p = prefixed(&mut graph, "a");
        let sum = graph.sum(p, zero);
        let par = graph.parallel(sum, zero);
        let inner = graph.restrict(par, ["x"]);
        let outer = graph.restrict(inner, ["y"]);
        let mut reducer = Reducer::new();
        let once = reducer.reduce(&mut graph, outer).unwrap();
        let mut fresh = Reducer::new();
        let twice = fresh.reduce(&mut graph, once).unwrap();
        assert_eq!(once, twice);
        assert_eq!(fresh.total_fired(), 0);
    }

    #[test]
    fn definitions_are_reduced_without_unfolding() {
        let mut graph = ProcessGraph::new();
        let p = graph.named("P");
        let zero = graph.null();
        let loop_body = graph.prefix(Action::input("a"), p);
        let body = graph.sum(loop_body, zero);
        graph.define("P", body).unwrap();
        let mut reducer = Reducer::new();
        reducer.reduce_program(&mut graph).unwrap();
        assert_eq!(graph.body_of(p).unwrap(), Some(loop_body));
    }

    #[test]
    fn long_chains_reduce_without_recursion() {
        let mut graph = ProcessGraph::new();
        let zero = graph.null();
        let mut term = graph.prefix(Action::input("a"), zero);
        for _ in 0..100_000 {
            let pad = graph.null();
            term = graph.sum(term, pad);
        }
        let mut reducer = Reducer::new();
        let reduced = reducer.reduce(&mut graph, term).unwrap();
        assert_eq!(
            graph.process(reduced).unwrap(),
            &Process::ActionPrefix { action: Action::input("a"), next: zero }
        );
        assert_eq!(reducer.fired(RewriteKind::SumIdentity), 100_000);
    }

    #[test]
    fn foreign_ids_are_not_found() {
        let mut graph = ProcessGraph::new();
        graph.null();
        let missing = ProcessId::new(5);
        assert_eq!(
            Reducer::new().reduce(&mut graph, missing),
            Err(EngineError::ProcessNotFound(missing))
        );
    }
}
