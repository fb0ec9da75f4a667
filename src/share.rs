//! Hash-consing of process terms.
//!
//! `TermSharer` rewrites a freshly built term forest into a DAG in which
//! structurally identical subterms are one node. The pass is post-order:
//! children are canonicalised first, then the node's structure key (kind tag
//! plus canonical child identifiers) is looked up. A hit discards the node in
//! favour of the registered one; a miss registers the node as canonical.
//! Parents have their child references redirected in place.
//!
//! Choice and parallel composition key their branches smallest-identifier
//! first, so `P + Q` and `Q + P` share a node.
//!
//! The bulk pass does not key restriction or relabelling nodes: each one
//! stays unique even when its label set or renaming equals another's.
//! [`TermSharer::intern`], used for terms built during exploration, does key
//! them by content.
//!
//! # Citations
//! - Filliâtre & Conchon, "Type-safe modular hash-consing", ML Workshop (2006)
//! - Ershov, "On programming of arithmetic operations", CACM 1(8) (1958) – value numbering

use crate::arena::ProcessId;
use crate::error::EngineError;
use crate::graph::ProcessGraph;
use crate::term::{Action, LabelSet, Process, RelabelMap};
use hashbrown::HashMap;
use tracing::debug;

/// Structure key of a canonical node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum StructureKey {
    Null,
    Named(String),
    Sum(ProcessId, ProcessId),
    Parallel(ProcessId, ProcessId),
    Prefix(Action, ProcessId),
    Delay(u32, ProcessId),
    Restriction(ProcessId, LabelSet),
    Relabelling(ProcessId, RelabelMap),
}

fn ordered_pair(a: ProcessId, b: ProcessId) -> (ProcessId, ProcessId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Structure key of `process`, assuming its children are canonical.
///
/// `with_operators` selects whether restriction and relabelling are keyed.
pub(crate) fn structure_key(process: &Process, with_operators: bool) -> Option<StructureKey> {
    match process {
        Process::Null => Some(StructureKey::Null),
        Process::Named { name, .. } => Some(StructureKey::Named(name.clone())),
        Process::Sum { left, right } => {
            let (a, b) = ordered_pair(*left, *right);
            Some(StructureKey::Sum(a, b))
        }
        Process::Parallel { left, right } => {
            let (a, b) = ordered_pair(*left, *right);
            Some(StructureKey::Parallel(a, b))
        }
        Process::ActionPrefix { action, next } => Some(StructureKey::Prefix(action.clone(), *next)),
        Process::DelayPrefix { delay, next } => Some(StructureKey::Delay(*delay, *next)),
        Process::Restriction { body, labels } if with_operators => {
            Some(StructureKey::Restriction(*body, labels.clone()))
        }
        Process::Relabelling { body, relabelling } if with_operators => {
            Some(StructureKey::Relabelling(*body, relabelling.clone()))
        }
        Process::Restriction { .. } | Process::Relabelling { .. } => None,
    }
}

/// Summary of one sharing pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShareReport {
    /// Distinct nodes visited.
    pub visited: usize,
    /// Nodes replaced by an existing canonical node.
    pub merged: usize,
}

/// Hash-consing pass with its structure map.
///
/// The structure map and the canonical-of memo live as long as the sharer,
/// which must not outlive its graph.
#[derive(Debug, Default)]
pub struct TermSharer {
    /// Structure key → canonical node.
    structures: HashMap<StructureKey, ProcessId>,
    /// Visited node → its canonical node.
    canonical: HashMap<ProcessId, ProcessId>,
    report: ShareReport,
}

impl TermSharer {
    /// Creates a sharer with empty tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Shares every definition body of `graph` and redirects the bodies of
    /// the named processes to their canonical nodes.
    pub fn share_program(&mut self, graph: &mut ProcessGraph) -> Result<ShareReport, EngineError> {
        let before = self.report;
        for named in graph.named_processes() {
            self.visit(graph, named)?;
            if let Some(body) = graph.body_of(named)? {
                let canonical = self.visit(graph, body)?;
                graph.set_body(named, canonical)?;
            }
        }
        let pass = ShareReport {
            visited: self.report.visited - before.visited,
            merged: self.report.merged - before.merged,
        };
        debug!(
            visited = pass.visited,
            merged = pass.merged,
            distinct = self.structures.len(),
            "shared program terms"
        );
        Ok(pass)
    }

    /// Shares the term rooted at `id` and returns its canonical node.
    pub fn share(&mut self, graph: &mut ProcessGraph, id: ProcessId) -> Result<ProcessId, EngineError> {
        self.visit(graph, id)
    }

    /// Canonical node previously computed for `id`.
    pub fn canonical_of(&self, id: ProcessId) -> Option<ProcessId> {
        self.canonical.get(&id).copied()
    }

    /// Totals over every pass run by this sharer.
    pub fn report(&self) -> ShareReport {
        self.report
    }

    /// Returns the canonical node for `process`, allocating it if no node
    /// with this structure exists yet.
    ///
    /// Children of `process` must already be canonical. Unlike the bulk pass,
    /// restriction and relabelling are keyed by content here.
    pub fn intern(&mut self, graph: &mut ProcessGraph, process: Process) -> ProcessId {
        match structure_key(&process, true) {
            Some(key) => {
                if let Some(&existing) = self.structures.get(&key) {
                    return existing;
                }
                let id = graph.add(process);
                self.structures.insert(key, id);
                self.canonical.insert(id, id);
                id
            }
            None => graph.add(process),
        }
    }

    fn canonical_child(&self, id: ProcessId) -> Result<ProcessId, EngineError> {
        self.canonical.get(&id).copied().ok_or(EngineError::ProcessNotFound(id))
    }

    /// Post-order walk with an explicit stack of `(id, children_done)`
    /// frames.
    fn visit(&mut self, graph: &mut ProcessGraph, root: ProcessId) -> Result<ProcessId, EngineError> {
        let mut stack = vec![(root, false)];
        while let Some((id, children_done)) = stack.pop() {
            if self.canonical.contains_key(&id) {
                continue;
            }
            let process = graph.process(id)?.clone();
            if !children_done {
                stack.push((id, true));
                // Named references are roots; their bodies are shared from
                // `share_program`.
                for child in process.children().into_iter().rev() {
                    if !self.canonical.contains_key(&child) {
                        stack.push((child, false));
                    }
                }
                continue;
            }
            let rewritten = match process {
                process @ (Process::Null | Process::Named { .. }) => process,
                Process::Sum { left, right } => Process::Sum {
                    left: self.canonical_child(left)?,
                    right: self.canonical_child(right)?,
                },
                Process::Parallel { left, right } => Process::Parallel {
                    left: self.canonical_child(left)?,
                    right: self.canonical_child(right)?,
                },
                Process::ActionPrefix { action, next } => Process::ActionPrefix {
                    action,
                    next: self.canonical_child(next)?,
                },
                Process::DelayPrefix { delay, next } => Process::DelayPrefix {
                    delay,
                    next: self.canonical_child(next)?,
                },
                Process::Restriction { body, labels } => Process::Restriction {
                    body: self.canonical_child(body)?,
                    labels,
                },
                Process::Relabelling { body, relabelling } => Process::Relabelling {
                    body: self.canonical_child(body)?,
                    relabelling,
                },
            };
            let key = structure_key(&rewritten, false);
            let slot = graph.process_mut(id)?;
            if *slot != rewritten {
                *slot = rewritten;
            }
            let canonical = match key {
                Some(key) => *self.structures.entry(key).or_insert(id),
                None => id,
            };
            self.report.visited += 1;
            if canonical != id {
                self.report.merged += 1;
            }
            self.canonical.insert(id, canonical);
        }
        self.canonical_child(root)
    }
}
