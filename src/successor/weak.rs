//! Weak (observable) transitions.
//!
//! `P =a=> P'` holds when `P --tau-->* Q --a--> Q' --tau-->* P'` for an
//! observable `a`. Silent steps are saturated away and never appear in the
//! result; delays count as observable.
//!
//! Exploration is a depth-first worklist over the silent closure of the
//! source with an ordered visited set. The silent closure of every target is
//! memoised separately from the result cache, since many sources share
//! targets. Termination requires every silent closure to be finite.
//!
//! # Citations
//! - Milner, "Communication and Concurrency", Prentice Hall (1989), §5.1 – weak transitions

use super::SuccessorGenerator;
use crate::arena::ProcessId;
use crate::error::EngineError;
use crate::graph::ProcessGraph;
use crate::ordered::OrderedSet;
use crate::transition::TransitionSet;
use hashbrown::HashMap;
use std::sync::Arc;
use tracing::trace;

/// Decorator producing weak transitions from the inner generator's steps.
#[derive(Debug)]
pub struct Weak<G> {
    inner: G,
    cache: HashMap<ProcessId, Arc<TransitionSet>>,
    /// Silent closure of a process, itself included, in identifier order.
    closures: HashMap<ProcessId, Arc<Vec<ProcessId>>>,
}

impl<G: SuccessorGenerator> Weak<G> {
    /// Wraps `inner`.
    pub fn new(inner: G) -> Self {
        Self {
            inner,
            cache: HashMap::new(),
            closures: HashMap::new(),
        }
    }

    /// Processes reachable from `id` by zero or more silent steps.
    pub fn silent_closure(
        &mut self,
        graph: &mut ProcessGraph,
        id: ProcessId,
    ) -> Result<Arc<Vec<ProcessId>>, EngineError> {
        if let Some(hit) = self.closures.get(&id) {
            return Ok(Arc::clone(hit));
        }
        let mut visited: OrderedSet<ProcessId> = OrderedSet::new();
        let mut stack = vec![id];
        while let Some(state) = stack.pop() {
            if !visited.insert(state) {
                continue;
            }
            let steps = self.inner.successors(graph, state)?;
            stack.extend(steps.iter().filter(|t| t.action.is_silent()).map(|t| t.target));
        }
        let closure = Arc::new(visited.iter().copied().collect::<Vec<_>>());
        self.closures.insert(id, Arc::clone(&closure));
        Ok(closure)
    }
}

impl<G: SuccessorGenerator> SuccessorGenerator for Weak<G> {
    fn successors(
        &mut self,
        graph: &mut ProcessGraph,
        id: ProcessId,
    ) -> Result<Arc<TransitionSet>, EngineError> {
        if let Some(hit) = self.cache.get(&id) {
            trace!(%id, "weak successors cache hit");
            return Ok(Arc::clone(hit));
        }
        let mut weak = TransitionSet::new();
        let mut visited: OrderedSet<ProcessId> = OrderedSet::new();
        let mut stack = vec![id];
        while let Some(state) = stack.pop() {
            if !visited.insert(state) {
                continue;
            }
            let steps = self.inner.successors(graph, state)?;
            for step in steps.iter() {
                if step.action.is_silent() {
                    stack.push(step.target);
                    continue;
                }
                let closure = self.silent_closure(graph, step.target)?;
                for &target in closure.iter() {
                    weak.add(step.action.clone(), target);
                }
            }
        }
        trace!(%id, silent = visited.len(), steps = weak.len(), "saturated weak successors");
        let set = Arc::new(weak);
        self.cache.insert(id, Arc::clone(&set));
        Ok(set)
    }
}
