//! Shared-term graph.
//!
//! `ProcessGraph` owns every process-term node of one program. It is the
//! surface an external parser builds against (`null`, `named`, `define`,
//! `sum`, …) and the store the sharing and reduction passes rewrite in
//! place.
//!
//! # Invariants
//! - Identifiers are assigned monotonically and never reused.
//! - Nodes are never removed; a node made redundant by sharing or reduction
//!   simply becomes unreachable.
//! - Each name has exactly one `Named` node; every occurrence of the name
//!   refers to it.
//! - Builder calls never share: two calls to `null()` give two nodes. The
//!   sharing pass is what canonicalises.

pub mod display;

pub use display::TermDisplay;

use crate::arena::{ProcessArena, ProcessId};
use crate::error::EngineError;
use crate::term::{Action, LabelSet, Process, ProcessNode, RelabelMap};
use hashbrown::HashMap;

/// Arena-backed graph of process terms.
#[derive(Debug, Clone, Default)]
pub struct ProcessGraph {
    /// Node storage.
    arena: ProcessArena<ProcessNode>,
    /// Name table: process name → its `Named` node.
    names: HashMap<String, ProcessId>,
}

impl ProcessGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes ever allocated (reachable or not).
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    /// Returns `true` if no node has been allocated.
    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Allocates a node for `process`.
    pub fn add(&mut self, process: Process) -> ProcessId {
        let id = self.arena.next_id();
        self.arena.allocate(ProcessNode { id, process })
    }

    /// Adds `0`.
    pub fn null(&mut self) -> ProcessId {
        self.add(Process::Null)
    }

    /// Returns the `Named` node for `name`, creating an undefined one if the
    /// name has not been seen yet.
    pub fn named(&mut self, name: &str) -> ProcessId {
        if let Some(&id) = self.names.get(name) {
            return id;
        }
        let id = self.add(Process::Named {
            name: name.to_string(),
            body: None,
        });
        self.names.insert(name.to_string(), id);
        id
    }

    /// Defines `name = body` and returns the `Named` node.
    ///
    /// Returns `DuplicateDefinition` if `name` already has a body.
    pub fn define(&mut self, name: &str, definition: ProcessId) -> Result<ProcessId, EngineError> {
        self.process(definition)?;
        let id = self.named(name);
        match self.process_mut(id)? {
            Process::Named { body, .. } if body.is_none() => {
                *body = Some(definition);
                Ok(id)
            }
            _ => Err(EngineError::DuplicateDefinition(name.to_string())),
        }
    }

    /// Adds `left + right`.
    pub fn sum(&mut self, left: ProcessId, right: ProcessId) -> ProcessId {
        self.add(Process::Sum { left, right })
    }

    /// Adds `left | right`.
    pub fn parallel(&mut self, left: ProcessId, right: ProcessId) -> ProcessId {
        self.add(Process::Parallel { left, right })
    }

    /// Adds `action.next`.
    pub fn prefix(&mut self, action: Action, next: ProcessId) -> ProcessId {
        self.add(Process::ActionPrefix { action, next })
    }

    /// Adds `body \ labels`.
    pub fn restrict<I, S>(&mut self, body: ProcessId, labels: I) -> ProcessId
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: LabelSet = labels.into_iter().map(Into::into).collect();
        self.add(Process::Restriction { body, labels })
    }

    /// Adds `body[relabelling]`.
    pub fn relabel(&mut self, body: ProcessId, relabelling: RelabelMap) -> ProcessId {
        self.add(Process::Relabelling { body, relabelling })
    }

    /// Adds the TCCS delay prefix `delay.next`.
    pub fn delay(&mut self, delay: u32, next: ProcessId) -> ProcessId {
        self.add(Process::DelayPrefix { delay, next })
    }

    /// Looks up the term stored at `id`.
    pub fn process(&self, id: ProcessId) -> Result<&Process, EngineError> {
        self.arena
            .get(id)
            .map(|node| &node.process)
            .ok_or(EngineError::ProcessNotFound(id))
    }

    /// Mutable access for the in-place rewriting passes.
    pub(crate) fn process_mut(&mut self, id: ProcessId) -> Result<&mut Process, EngineError> {
        self.arena
            .get_mut(id)
            .map(|node| &mut node.process)
            .ok_or(EngineError::ProcessNotFound(id))
    }

    /// Returns the node stored at `id`, if any.
    pub fn process_by_id(&self, id: ProcessId) -> Option<&ProcessNode> {
        self.arena.get(id)
    }

    /// Returns the `Named` node for `name`, if the name is known.
    pub fn process_by_name(&self, name: &str) -> Option<ProcessId> {
        self.names.get(name).copied()
    }

    /// Returns `true` if `id` refers to `0`.
    pub fn is_null(&self, id: ProcessId) -> bool {
        matches!(self.arena.get(id), Some(node) if node.process.is_null())
    }

    /// All named processes, in name order.
    pub fn named_processes(&self) -> Vec<ProcessId> {
        let mut entries: Vec<(&String, ProcessId)> =
            self.names.iter().map(|(name, &id)| (name, id)).collect();
        entries.sort();
        entries.into_iter().map(|(_, id)| id).collect()
    }

    /// Body of the named process `id`, if it is defined.
    pub fn body_of(&self, id: ProcessId) -> Result<Option<ProcessId>, EngineError> {
        match self.process(id)? {
            Process::Named { body, .. } => Ok(*body),
            _ => Ok(None),
        }
    }

    /// Replaces the body of the named process `id`.
    pub(crate) fn set_body(&mut self, id: ProcessId, new_body: ProcessId) -> Result<(), EngineError> {
        if let Process::Named { body, .. } = self.process_mut(id)? {
            *body = Some(new_body);
        }
        Ok(())
    }

    /// Problems a caller should surface before exploring the program:
    /// names that are referenced but never defined.
    pub fn errors(&self) -> Vec<EngineError> {
        self.named_processes()
            .into_iter()
            .filter_map(|id| match self.arena.get(id).map(|node| &node.process) {
                Some(Process::Named { name, body: None }) => {
                    Some(EngineError::UndefinedProcess(name.clone()))
                }
                _ => None,
            })
            .collect()
    }

    /// Renders `id` in CCS notation.
    pub fn display(&self, id: ProcessId) -> TermDisplay<'_> {
        TermDisplay::new(self, id)
    }
}
