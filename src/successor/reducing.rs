//! Successors modulo structural congruence.

use super::SuccessorGenerator;
use crate::arena::ProcessId;
use crate::error::EngineError;
use crate::graph::ProcessGraph;
use crate::reduce::Reducer;
use crate::transition::{Transition, TransitionSet};
use hashbrown::HashMap;
use std::sync::Arc;

/// Decorator that reduces the target of every inner transition.
///
/// Two inner targets that reduce to the same node become one transition.
#[derive(Debug)]
pub struct Reducing<G> {
    inner: G,
    reducer: Reducer,
    cache: HashMap<ProcessId, Arc<TransitionSet>>,
}

impl<G: SuccessorGenerator> Reducing<G> {
    /// Wraps `inner` with a fresh reducer.
    pub fn new(inner: G) -> Self {
        Self::with_reducer(inner, Reducer::new())
    }

    /// Wraps `inner`, continuing with `reducer`'s memo (typically the one that
    /// reduced the program).
    pub fn with_reducer(inner: G, reducer: Reducer) -> Self {
        Self {
            inner,
            reducer,
            cache: HashMap::new(),
        }
    }

    /// The wrapped generator.
    pub fn inner(&self) -> &G {
        &self.inner
    }
}

impl<G: SuccessorGenerator> SuccessorGenerator for Reducing<G> {
    fn successors(
        &mut self,
        graph: &mut ProcessGraph,
        id: ProcessId,
    ) -> Result<Arc<TransitionSet>, EngineError> {
        if let Some(hit) = self.cache.get(&id) {
            return Ok(Arc::clone(hit));
        }
        let strict = self.inner.successors(graph, id)?;
        let mut reduced = TransitionSet::new();
        for step in strict.iter() {
            let target = self.reducer.reduce(graph, step.target)?;
            reduced.insert(Transition::new(step.action.clone(), target));
        }
        let set = Arc::new(reduced);
        self.cache.insert(id, Arc::clone(&set));
        Ok(set)
    }
}
