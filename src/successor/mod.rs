//! Successor generation.
//!
//! A [`SuccessorGenerator`] computes the labelled one-step transitions of a
//! process. Generators compose as decorators: each stage owns the stage it
//! wraps and refines its output.
//!
//! ```text
//! StrictSuccessors -> Reducing -> Weak -> Collapsing
//! ```
//!
//! - [`StrictSuccessors`]: structural operational semantics of CCS/TCCS.
//! - [`Reducing`]: reduces every target modulo structural congruence.
//! - [`Weak`]: observable steps `tau* a tau*`.
//! - [`Collapsing`]: successors of a quotient given by a [`Collapse`] mapping.
//!
//! Every stage caches its results per process and returns them as
//! `Arc<TransitionSet>`, so repeated calls are cheap and callers may hold on
//! to a set after the generator moves on.

pub mod collapse;
pub mod reducing;
pub mod strict;
pub mod weak;

pub use collapse::{Collapse, CollapsedProcess, Collapsing, PartitionCollapse};
pub use reducing::Reducing;
pub use strict::StrictSuccessors;
pub use weak::Weak;

use crate::arena::ProcessId;
use crate::error::EngineError;
use crate::graph::ProcessGraph;
use crate::term::Process;
use crate::transition::TransitionSet;
use std::sync::Arc;

/// Source of labelled one-step transitions.
///
/// Implementations may allocate derived terms in `graph`, which is why it is
/// passed mutably. A generator is bound to the graph it was first called
/// with.
pub trait SuccessorGenerator {
    /// Transitions of `id`.
    fn successors(
        &mut self,
        graph: &mut ProcessGraph,
        id: ProcessId,
    ) -> Result<Arc<TransitionSet>, EngineError>;

    /// Resolves a process name.
    fn process_by_name(&self, graph: &ProcessGraph, name: &str) -> Result<ProcessId, EngineError> {
        graph
            .process_by_name(name)
            .ok_or_else(|| EngineError::UnknownProcessName(name.to_string()))
    }

    /// Resolves a process identifier.
    fn process_by_id<'g>(&self, graph: &'g ProcessGraph, id: ProcessId) -> Result<&'g Process, EngineError> {
        graph.process(id)
    }
}

impl<G: SuccessorGenerator + ?Sized> SuccessorGenerator for Box<G> {
    fn successors(
        &mut self,
        graph: &mut ProcessGraph,
        id: ProcessId,
    ) -> Result<Arc<TransitionSet>, EngineError> {
        (**self).successors(graph, id)
    }

    fn process_by_name(&self, graph: &ProcessGraph, name: &str) -> Result<ProcessId, EngineError> {
        (**self).process_by_name(graph, name)
    }

    fn process_by_id<'g>(&self, graph: &'g ProcessGraph, id: ProcessId) -> Result<&'g Process, EngineError> {
        (**self).process_by_id(graph, id)
    }
}

impl<G: SuccessorGenerator + ?Sized> SuccessorGenerator for &mut G {
    fn successors(
        &mut self,
        graph: &mut ProcessGraph,
        id: ProcessId,
    ) -> Result<Arc<TransitionSet>, EngineError> {
        (**self).successors(graph, id)
    }

    fn process_by_name(&self, graph: &ProcessGraph, name: &str) -> Result<ProcessId, EngineError> {
        (**self).process_by_name(graph, name)
    }

    fn process_by_id<'g>(&self, graph: &'g ProcessGraph, id: ProcessId) -> Result<&'g Process, EngineError> {
        (**self).process_by_id(graph, id)
    }
}
