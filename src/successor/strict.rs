//! Strict one-step transitions.
//!
//! The rules, by term kind:
//!
//! | Term | Transitions |
//! |------|-------------|
//! | `0` | none |
//! | `a.P` | `a → P` |
//! | `d.P` (delay) | `d → P` |
//! | `P + Q` | those of `P` and of `Q` |
//! | `P \| Q` | `a → P' \| Q`, `a → P \| Q'`, and `tau → P' \| Q'` for complementary `a`, `'a` |
//! | `P \ L` | `a → P' \ L` for `a` not on a label in `L` |
//! | `P[f]` | `f(a) → P'[f]` |
//! | `X` (`X = P`) | those of `P` |
//!
//! Derived terms (`P' | Q`, `P' \ L`, …) are interned, so exploring a finite
//! state space allocates finitely many nodes. Delays interleave in parallel
//! composition like any other action.
//!
//! # Citations
//! - Milner, "Communication and Concurrency", Prentice Hall (1989), §2.5 – transition rules
//! - Plotkin, "A structural approach to operational semantics", DAIMI FN-19 (1981)

use super::SuccessorGenerator;
use crate::arena::ProcessId;
use crate::error::EngineError;
use crate::graph::ProcessGraph;
use crate::share::TermSharer;
use crate::term::{Action, Process};
use crate::transition::TransitionSet;
use hashbrown::{HashMap, HashSet};
use std::sync::Arc;
use tracing::trace;

/// Structural operational semantics of CCS/TCCS terms.
#[derive(Debug, Default)]
pub struct StrictSuccessors {
    sharer: TermSharer,
    cache: HashMap<ProcessId, Arc<TransitionSet>>,
}

impl StrictSuccessors {
    /// Creates a generator with its own, empty, sharer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a generator that interns derived terms through `sharer`,
    /// typically the one that shared the program.
    pub fn with_sharer(sharer: TermSharer) -> Self {
        Self {
            sharer,
            ..Self::default()
        }
    }

    /// Number of processes with cached transitions.
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    fn cached_set(&self, id: ProcessId) -> Result<Arc<TransitionSet>, EngineError> {
        self.cache.get(&id).cloned().ok_or(EngineError::ProcessNotFound(id))
    }

    /// Terms whose transitions `id` is built from. Nested choices are
    /// flattened to their operands, which are the only ones cached.
    fn dependencies(graph: &ProcessGraph, id: ProcessId) -> Result<Vec<ProcessId>, EngineError> {
        match graph.process(id)? {
            Process::Null | Process::ActionPrefix { .. } | Process::DelayPrefix { .. } => Ok(Vec::new()),
            Process::Named { name, body } => match body {
                Some(body) => Ok(vec![*body]),
                None => Err(EngineError::UndefinedProcess(name.clone())),
            },
            Process::Sum { .. } => {
                let mut operands = Vec::new();
                let mut pending = vec![id];
                while let Some(current) = pending.pop() {
                    match graph.process(current)? {
                        Process::Sum { left, right } => {
                            pending.push(*right);
                            pending.push(*left);
                        }
                        _ => operands.push(current),
                    }
                }
                Ok(operands)
            }
            other => Ok(other.children()),
        }
    }

    /// Fills the cache for `root` and every term it depends on, with an
    /// explicit stack of `(id, children_done)` frames. Reaching a term that
    /// is still being expanded means a name unfolds into itself without a
    /// prefix.
    fn explore(&mut self, graph: &mut ProcessGraph, root: ProcessId) -> Result<(), EngineError> {
        let mut stack = vec![(root, false)];
        let mut expanding: HashSet<ProcessId> = HashSet::new();
        while let Some((id, children_done)) = stack.pop() {
            if self.cache.contains_key(&id) {
                continue;
            }
            if children_done {
                let set = self.compute(graph, id)?;
                expanding.remove(&id);
                self.cache.insert(id, Arc::new(set));
                continue;
            }
            let dependencies = Self::dependencies(graph, id)?;
            expanding.insert(id);
            stack.push((id, true));
            for dependency in dependencies.into_iter().rev() {
                if self.cache.contains_key(&dependency) {
                    continue;
                }
                if expanding.contains(&dependency) {
                    let name = unfolding_name(graph, dependency, &stack)?;
                    return Err(EngineError::UnguardedRecursion(name));
                }
                stack.push((dependency, false));
            }
        }
        Ok(())
    }

    /// Transitions of `id`, whose dependencies are all cached.
    fn compute(&mut self, graph: &mut ProcessGraph, id: ProcessId) -> Result<TransitionSet, EngineError> {
        let mut out = TransitionSet::new();
        match graph.process(id)?.clone() {
            Process::Null => {}
            Process::ActionPrefix { action, next } => {
                out.add(action, next);
            }
            Process::DelayPrefix { delay, next } => {
                out.add(Action::Delay(delay), next);
            }
            Process::Sum { .. } => {
                for operand in Self::dependencies(graph, id)? {
                    let steps = self.cached_set(operand)?;
                    out.union_with(&steps);
                }
            }
            Process::Parallel { left, right } => {
                let lefts = self.cached_set(left)?;
                let rights = self.cached_set(right)?;
                for step in lefts.iter() {
                    let target = self.sharer.intern(graph, Process::Parallel { left: step.target, right });
                    out.add(step.action.clone(), target);
                }
                for step in rights.iter() {
                    let target = self.sharer.intern(graph, Process::Parallel { left, right: step.target });
                    out.add(step.action.clone(), target);
                }
                for l in lefts.iter() {
                    for r in rights.iter().filter(|r| l.action.synchronises_with(&r.action)) {
                        let target = self.sharer.intern(
                            graph,
                            Process::Parallel { left: l.target, right: r.target },
                        );
                        out.add(Action::Tau, target);
                    }
                }
            }
            Process::Restriction { body, labels } => {
                let inner = self.cached_set(body)?;
                for step in inner.iter() {
                    if step.action.label().map_or(false, |label| labels.contains(label)) {
                        continue;
                    }
                    let target = self.sharer.intern(
                        graph,
                        Process::Restriction { body: step.target, labels: labels.clone() },
                    );
                    out.add(step.action.clone(), target);
                }
            }
            Process::Relabelling { body, relabelling } => {
                let inner = self.cached_set(body)?;
                for step in inner.iter() {
                    let target = self.sharer.intern(
                        graph,
                        Process::Relabelling { body: step.target, relabelling: relabelling.clone() },
                    );
                    out.add(relabelling.apply(&step.action), target);
                }
            }
            Process::Named { name, body } => {
                let body = body.ok_or(EngineError::UndefinedProcess(name))?;
                let inner = self.cached_set(body)?;
                out.union_with(&inner);
            }
        }
        Ok(out)
    }
}

/// Name to report for a cycle closed at `reentered`: its own name, or the
/// innermost name being expanded on the path above it.
fn unfolding_name(
    graph: &ProcessGraph,
    reentered: ProcessId,
    stack: &[(ProcessId, bool)],
) -> Result<String, EngineError> {
    let expanded = stack.iter().rev().filter(|(_, done)| *done).map(|(id, _)| *id);
    for id in std::iter::once(reentered).chain(expanded) {
        if let Process::Named { name, .. } = graph.process(id)? {
            return Ok(name.clone());
        }
    }
    Ok(graph.display(reentered).to_string())
}

impl SuccessorGenerator for StrictSuccessors {
    fn successors(
        &mut self,
        graph: &mut ProcessGraph,
        id: ProcessId,
    ) -> Result<Arc<TransitionSet>, EngineError> {
        if let Some(hit) = self.cache.get(&id) {
            trace!(%id, "strict successors cache hit");
            return Ok(Arc::clone(hit));
        }
        self.explore(graph, id)?;
        self.cached_set(id)
    }
}
