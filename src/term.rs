//! Process-term kinds.
//!
//! A process term is one node of a `ProcessGraph`. Children are referenced by
//! `ProcessId`, never owned, so recursive definitions (`P = a.P`) are plain
//! back-references into the arena.
//!
//! # Citations
//! - Milner, "Communication and Concurrency", Prentice Hall (1989) – CCS
//! - Yi, "CCS + Time = an Interleaving Model for Real Time Systems", ICALP (1991) – TCCS delays

use crate::arena::ProcessId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Name of the distinguished silent action.
pub const TAU: &str = "tau";

/// Set of channel labels hidden by a restriction.
pub type LabelSet = BTreeSet<String>;

/// An action performed by a transition.
///
/// The derived order (silent, then visible by label and polarity, then
/// delays) is the order transitions are listed in a `TransitionSet`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Action {
    /// The internal, unobservable action.
    Tau,
    /// Input on `label`, or output (`'label`) when `complement` is set.
    Visible {
        /// Channel name.
        label: String,
        /// Output polarity.
        complement: bool,
    },
    /// TCCS delay of the given number of time units.
    Delay(u32),
}

impl Action {
    /// Input action on `label`.
    pub fn input(label: impl Into<String>) -> Self {
        Action::Visible {
            label: label.into(),
            complement: false,
        }
    }

    /// Output action on `label`.
    pub fn output(label: impl Into<String>) -> Self {
        Action::Visible {
            label: label.into(),
            complement: true,
        }
    }

    /// Returns `true` for the silent action.
    #[inline]
    pub fn is_silent(&self) -> bool {
        matches!(self, Action::Tau)
    }

    /// Channel label of a visible action.
    pub fn label(&self) -> Option<&str> {
        match self {
            Action::Visible { label, .. } => Some(label),
            Action::Tau | Action::Delay(_) => None,
        }
    }

    /// Returns `true` if `self` and `other` are the two halves of a handshake.
    pub fn synchronises_with(&self, other: &Action) -> bool {
        match (self, other) {
            (
                Action::Visible { label: a, complement: ca },
                Action::Visible { label: b, complement: cb },
            ) => a == b && ca != cb,
            _ => false,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Tau => f.write_str(TAU),
            Action::Visible { label, complement: false } => f.write_str(label),
            Action::Visible { label, complement: true } => write!(f, "'{}", label),
            Action::Delay(units) => write!(f, "{}", units),
        }
    }
}

/// Channel renaming applied by a relabelling operator, `P[new/old]`.
///
/// Polarity is preserved; the silent action and delays are never renamed.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RelabelMap {
    renames: BTreeMap<String, String>,
}

impl RelabelMap {
    /// Creates an empty renaming.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `old ↦ new`, returning the updated map.
    pub fn with(mut self, new: impl Into<String>, old: impl Into<String>) -> Self {
        self.renames.insert(old.into(), new.into());
        self
    }

    /// Applies the renaming to an action.
    pub fn apply(&self, action: &Action) -> Action {
        match action {
            Action::Visible { label, complement } => match self.renames.get(label) {
                Some(new) => Action::Visible {
                    label: new.clone(),
                    complement: *complement,
                },
                None => action.clone(),
            },
            Action::Tau | Action::Delay(_) => action.clone(),
        }
    }

    /// Returns `true` if nothing is renamed.
    pub fn is_empty(&self) -> bool {
        self.renames.is_empty()
    }

    /// `(new, old)` pairs in order of the old label.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.renames.iter().map(|(old, new)| (new.as_str(), old.as_str()))
    }
}

/// One process-term kind with its child references.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Process {
    /// The inactive process `0`.
    Null,
    /// A named process. `body` is `None` while the name is only referenced.
    Named {
        /// Process name.
        name: String,
        /// Defining term.
        body: Option<ProcessId>,
    },
    /// Choice `left + right`.
    Sum {
        /// Left branch.
        left: ProcessId,
        /// Right branch.
        right: ProcessId,
    },
    /// Parallel composition `left | right`.
    Parallel {
        /// Left component.
        left: ProcessId,
        /// Right component.
        right: ProcessId,
    },
    /// Action prefix `action.next`.
    ActionPrefix {
        /// Prefix action.
        action: Action,
        /// Continuation.
        next: ProcessId,
    },
    /// Restriction `body \ labels`.
    Restriction {
        /// Restricted term.
        body: ProcessId,
        /// Hidden channels.
        labels: LabelSet,
    },
    /// Relabelling `body[f]`.
    Relabelling {
        /// Relabelled term.
        body: ProcessId,
        /// Renaming.
        relabelling: RelabelMap,
    },
    /// TCCS delay prefix `delay.next`.
    DelayPrefix {
        /// Number of time units.
        delay: u32,
        /// Continuation.
        next: ProcessId,
    },
}

impl Process {
    /// Short kind tag, used in log output.
    pub fn kind(&self) -> &'static str {
        match self {
            Process::Null => "null",
            Process::Named { .. } => "named",
            Process::Sum { .. } => "sum",
            Process::Parallel { .. } => "parallel",
            Process::ActionPrefix { .. } => "prefix",
            Process::Restriction { .. } => "restriction",
            Process::Relabelling { .. } => "relabelling",
            Process::DelayPrefix { .. } => "delay",
        }
    }

    /// Returns `true` for `0`.
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Process::Null)
    }

    /// Structural children, left to right.
    ///
    /// The body of a named process is not a structural child: references to
    /// a name stay references.
    pub fn children(&self) -> Vec<ProcessId> {
        match self {
            Process::Null | Process::Named { .. } => Vec::new(),
            Process::Sum { left, right } | Process::Parallel { left, right } => {
                vec![*left, *right]
            }
            Process::ActionPrefix { next, .. } | Process::DelayPrefix { next, .. } => vec![*next],
            Process::Restriction { body, .. } | Process::Relabelling { body, .. } => vec![*body],
        }
    }
}

/// A process term together with its identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessNode {
    /// Identifier of this node.
    pub id: ProcessId,
    /// Term kind and children.
    pub process: Process,
}
