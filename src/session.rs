//! Per-program sessions.
//!
//! A `Session` takes ownership of a built `ProcessGraph` and prepares it for
//! exploration:
//!
//! 1. undefined names are rejected;
//! 2. the program is fingerprinted;
//! 3. definitions are shared (hash-consed);
//! 4. definitions are reduced, if configured;
//! 5. guardedness is checked, and unguarded definitions rejected if
//!    configured.
//!
//! It then assembles the successor pipeline from its [`EngineConfig`]. All
//! caches belong to the session; dropping it releases them. A new program
//! needs a new session.

use crate::arena::ProcessId;
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::fingerprint::{program_fingerprint, HashValue};
use crate::graph::ProcessGraph;
use crate::guard::unguarded_processes;
use crate::reduce::Reducer;
use crate::share::{ShareReport, TermSharer};
use crate::successor::{Collapse, Collapsing, Reducing, StrictSuccessors, SuccessorGenerator, Weak};
use crate::transition::TransitionSet;
use std::sync::Arc;
use tracing::debug;

/// A prepared program with its successor pipeline.
pub struct Session {
    graph: ProcessGraph,
    config: EngineConfig,
    pipeline: Box<dyn SuccessorGenerator>,
    unguarded: Vec<ProcessId>,
    fingerprint: HashValue,
    shared: ShareReport,
    reductions: usize,
}

impl Session {
    /// Prepares `graph` according to `config`.
    ///
    /// # Errors
    /// - `UndefinedProcess` for the first referenced but undefined name.
    /// - `UnguardedDefinitions` if `config.reject_unguarded` is set and some
    ///   definition is unguarded.
    pub fn new(mut graph: ProcessGraph, config: EngineConfig) -> Result<Self, EngineError> {
        if let Some(error) = graph.errors().into_iter().next() {
            return Err(error);
        }
        let fingerprint = program_fingerprint(&graph)?;

        let mut sharer = TermSharer::new();
        let shared = sharer.share_program(&mut graph)?;

        let mut reducer = Reducer::new();
        if config.reduce {
            reducer.reduce_program(&mut graph)?;
        }
        let reductions = reducer.total_fired();

        let unguarded = unguarded_processes(&graph)?;
        if config.reject_unguarded && !unguarded.is_empty() {
            let names = unguarded.iter().map(|&id| graph.display(id).to_string()).collect();
            return Err(EngineError::UnguardedDefinitions(names));
        }

        let strict = StrictSuccessors::with_sharer(sharer);
        let pipeline: Box<dyn SuccessorGenerator> = match (config.reduce, config.weak) {
            (false, false) => Box::new(strict),
            (true, false) => Box::new(Reducing::with_reducer(strict, reducer)),
            (false, true) => Box::new(Weak::new(strict)),
            (true, true) => Box::new(Weak::new(Reducing::with_reducer(strict, reducer))),
        };

        debug!(
            %fingerprint,
            nodes = graph.len(),
            merged = shared.merged,
            reductions,
            unguarded = unguarded.len(),
            weak = config.weak,
            "session ready"
        );
        Ok(Self {
            graph,
            config,
            pipeline,
            unguarded,
            fingerprint,
            shared,
            reductions,
        })
    }

    /// Transitions of `id` through the configured pipeline.
    pub fn successors(&mut self, id: ProcessId) -> Result<Arc<TransitionSet>, EngineError> {
        self.pipeline.successors(&mut self.graph, id)
    }

    /// Transitions of the named process `name`.
    pub fn successors_by_name(&mut self, name: &str) -> Result<Arc<TransitionSet>, EngineError> {
        let id = self.process_by_name(name)?;
        self.successors(id)
    }

    /// Resolves a process name.
    pub fn process_by_name(&self, name: &str) -> Result<ProcessId, EngineError> {
        self.pipeline.process_by_name(&self.graph, name)
    }

    /// The prepared graph.
    pub fn graph(&self) -> &ProcessGraph {
        &self.graph
    }

    /// The configuration the session was built with.
    pub fn config(&self) -> EngineConfig {
        self.config
    }

    /// Unguarded named processes, in name order.
    pub fn unguarded(&self) -> &[ProcessId] {
        &self.unguarded
    }

    /// Content fingerprint of the program as it was handed in.
    pub fn fingerprint(&self) -> HashValue {
        self.fingerprint
    }

    /// Outcome of the sharing pass.
    pub fn share_report(&self) -> ShareReport {
        self.shared
    }

    /// Number of reduction rules fired on the definitions.
    pub fn reductions(&self) -> usize {
        self.reductions
    }

    /// View of the session's transition system quotiented by `collapse`.
    ///
    /// The view borrows the session's pipeline, so its results build on the
    /// session's caches; its own cache is dropped with it.
    pub fn quotient<C: Collapse>(&mut self, collapse: C) -> QuotientView<'_, C> {
        QuotientView {
            graph: &mut self.graph,
            collapsing: Collapsing::new(&mut *self.pipeline, collapse),
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("config", &self.config)
            .field("nodes", &self.graph.len())
            .field("unguarded", &self.unguarded)
            .field("fingerprint", &self.fingerprint)
            .finish()
    }
}

/// Quotient of a session under one collapse mapping.
pub struct QuotientView<'s, C> {
    graph: &'s mut ProcessGraph,
    collapsing: Collapsing<&'s mut (dyn SuccessorGenerator + 'static), C>,
}

impl<C: Collapse> QuotientView<'_, C> {
    /// Transitions of the class of `id`, with representative targets.
    pub fn successors(&mut self, id: ProcessId) -> Result<Arc<TransitionSet>, EngineError> {
        self.collapsing.successors(&mut *self.graph, id)
    }

    /// Transitions of the class of the named process `name`.
    pub fn successors_by_name(&mut self, name: &str) -> Result<Arc<TransitionSet>, EngineError> {
        let id = self.collapsing.process_by_name(&*self.graph, name)?;
        self.successors(id)
    }
}
