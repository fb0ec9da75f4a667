//! Guardedness of recursive definitions.
//!
//! A definition `P = body` is guarded when every path from `body` back to a
//! process name passes through a prefix (`a.`, `tau.`, or a delay). An
//! unguarded definition such as `P = P` or `P = P + a.0` has no well-defined
//! one-step successors, so callers check programs before exploring them.
//!
//! The check is a depth-first search over definitions with three marks per
//! term: *visiting* (on the current path), *guarded* and
//! *unguarded*. Reaching a visiting name without crossing a prefix closes an
//! unguarded cycle; every name on that path is unguarded, as is every name
//! whose body reaches an unguarded name before a prefix.
//!
//! Names without a definition are treated as guarded here;
//! [`ProcessGraph::errors`] reports them.
//!
//! # Citations
//! - Milner, "Communication and Concurrency", Prentice Hall (1989), §4.5 – guarded recursion

use crate::arena::ProcessId;
use crate::error::EngineError;
use crate::graph::ProcessGraph;
use crate::term::Process;
use hashbrown::HashMap;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Guarded,
    Unguarded,
}

/// Guardedness search state for one graph.
#[derive(Debug, Default)]
pub struct GuardednessChecker {
    /// Marks on named processes and the terms below them.
    marks: HashMap<ProcessId, Mark>,
}

impl GuardednessChecker {
    /// Creates a checker with no marks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the unguarded named processes of `graph`, in name order.
    pub fn check(&mut self, graph: &ProcessGraph) -> Result<Vec<ProcessId>, EngineError> {
        let mut unguarded = Vec::new();
        for named in graph.named_processes() {
            if self.unguarded(graph, named)? {
                unguarded.push(named);
            }
        }
        if !unguarded.is_empty() {
            let names: Vec<String> = unguarded.iter().map(|&id| graph.display(id).to_string()).collect();
            warn!(count = unguarded.len(), names = %names.join(", "), "unguarded recursive definitions");
        }
        Ok(unguarded)
    }

    /// Depth-first search from `root` with an explicit stack of
    /// `(id, children_done)` frames. Prefixes end a path, so a `Visiting`
    /// node reached again closes an unguarded cycle.
    fn unguarded(&mut self, graph: &ProcessGraph, root: ProcessId) -> Result<bool, EngineError> {
        let mut stack = vec![(root, false)];
        while let Some((id, children_done)) = stack.pop() {
            if !children_done {
                if self.marks.contains_key(&id) {
                    continue;
                }
                self.marks.insert(id, Mark::Visiting);
                stack.push((id, true));
                for child in unguarded_children(graph, id)?.into_iter().rev() {
                    if !self.marks.contains_key(&child) {
                        stack.push((child, false));
                    }
                }
                continue;
            }
            // Every child is searched so that every name below is marked.
            let mut unguarded = false;
            for child in unguarded_children(graph, id)? {
                unguarded |= matches!(self.marks.get(&child), Some(Mark::Visiting | Mark::Unguarded));
            }
            let mark = if unguarded { Mark::Unguarded } else { Mark::Guarded };
            self.marks.insert(id, mark);
        }
        Ok(self.marks.get(&root) == Some(&Mark::Unguarded))
    }
}

/// Terms reachable from `id` without crossing a prefix.
fn unguarded_children(graph: &ProcessGraph, id: ProcessId) -> Result<Vec<ProcessId>, EngineError> {
    Ok(match graph.process(id)? {
        Process::Null | Process::ActionPrefix { .. } | Process::DelayPrefix { .. } => Vec::new(),
        Process::Named { .. } => graph.body_of(id)?.into_iter().collect(),
        other => other.children(),
    })
}

/// Returns the unguarded named processes of `graph`, in name order.
pub fn unguarded_processes(graph: &ProcessGraph) -> Result<Vec<ProcessId>, EngineError> {
    GuardednessChecker::new().check(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::Action;

    #[test]
    fn prefixed_recursion_is_guarded() {
        let mut graph = ProcessGraph::new();
        let p = graph.named("P");
        let body = graph.prefix(Action::input("a"), p);
        graph.define("P", body).unwrap();
        assert!(unguarded_processes(&graph).unwrap().is_empty());
    }

    #[test]
    fn delay_is_a_guard() {
        let mut graph = ProcessGraph::new();
        let p = graph.named("P");
        let body = graph.delay(1, p);
        graph.define("P", body).unwrap();
        assert!(unguarded_processes(&graph).unwrap().is_empty());
    }

    #[test]
    fn self_reference_is_unguarded() {
        let mut graph = ProcessGraph::new();
        let p = graph.named("P");
        graph.define("P", p).unwrap();
        assert_eq!(unguarded_processes(&graph).unwrap(), vec![p]);
    }

    #[test]
    fn mutual_recursion_is_unguarded_for_both() {
        let mut graph = ProcessGraph::new();
        let p = graph.named("P");
        let q = graph.named("Q");
        graph.define("P", q).unwrap();
        graph.define("Q", p).unwrap();
        assert_eq!(unguarded_processes(&graph).unwrap(), vec![p, q]);
    }

    #[test]
    fn reaching_an_unguarded_name_is_unguarded() {
        let mut graph = ProcessGraph::new();
        let p = graph.named("P");
        graph.define("P", p).unwrap();
        let zero = graph.null();
        let a = graph.prefix(Action::input("a"), zero);
        let body = graph.sum(p, a);
        let r = graph.define("R", body).unwrap();
        assert_eq!(unguarded_processes(&graph).unwrap(), vec![p, r]);
    }

    #[test]
    fn indirect_guard_through_another_name() {
        let mut graph = ProcessGraph::new();
        let p = graph.named("P");
        let q = graph.named("Q");
        graph.define("P", q).unwrap();
        let body = graph.prefix(Action::output("a"), p);
        graph.define("Q", body).unwrap();
        assert!(unguarded_processes(&graph).unwrap().is_empty());
    }

    #[test]
    fn operators_do_not_guard() {
        let mut graph = ProcessGraph::new();
        let p = graph.named("P");
        let hidden = graph.restrict(p, ["a"]);
        let zero = graph.null();
        let par = graph.parallel(hidden, zero);
        graph.define("P", par).unwrap();
        assert_eq!(unguarded_processes(&graph).unwrap(), vec![p]);
    }

    #[test]
    fn undefined_names_count_as_guarded() {
        let mut graph = ProcessGraph::new();
        let missing = graph.named("Missing");
        graph.define("P", missing).unwrap();
        assert!(unguarded_processes(&graph).unwrap().is_empty());
    }

    #[test]
    fn long_operator_chains_are_searched_without_recursion() {
        let mut graph = ProcessGraph::new();
        let p = graph.named("P");
        let mut body = p;
        for _ in 0..100_000 {
            let zero = graph.null();
            body = graph.parallel(body, zero);
        }
        graph.define("P", body).unwrap();
        let zero = graph.null();
        let mut guarded = graph.prefix(Action::input("a"), zero);
        for _ in 0..100_000 {
            let zero = graph.null();
            guarded = graph.sum(zero, guarded);
        }
        graph.define("Q", guarded).unwrap();
        assert_eq!(unguarded_processes(&graph).unwrap(), vec![p]);
    }
}
