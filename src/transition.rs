//! Transitions and deduplicating transition sets.
//!
//! A `TransitionSet` is keyed on the transition signature (action, then
//! target identifier) and stored in an `OrderedSet`, so insertion order
//! never matters and iteration is always in signature order.
//!
//! Sets cross the worker boundary as CBOR, the same encoding the query
//! cache used for persistence.

use crate::arena::ProcessId;
use crate::error::EngineError;
use crate::ordered::OrderedSet;
use crate::term::Action;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One labelled step `--action--> target`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Transition {
    /// Action performed.
    pub action: Action,
    /// Process reached.
    pub target: ProcessId,
}

impl Transition {
    /// Creates a transition.
    pub fn new(action: Action, target: ProcessId) -> Self {
        Self { action, target }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "--{}--> {}", self.action, self.target)
    }
}

/// Deduplicating set of transitions.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Transition>", into = "Vec<Transition>")]
pub struct TransitionSet {
    inner: OrderedSet<Transition>,
}

impl TransitionSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a transition; returns `true` if it was new.
    pub fn insert(&mut self, transition: Transition) -> bool {
        self.inner.insert(transition)
    }

    /// Adds `--action--> target`; returns `true` if it was new.
    pub fn add(&mut self, action: Action, target: ProcessId) -> bool {
        self.insert(Transition::new(action, target))
    }

    /// Returns `true` if the set holds `transition`.
    pub fn contains(&self, transition: &Transition) -> bool {
        self.inner.contains(transition)
    }

    /// Number of distinct transitions.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns `true` if there are no transitions.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Transitions in signature order.
    pub fn iter(&self) -> impl Iterator<Item = &Transition> {
        self.inner.iter()
    }

    /// Transitions labelled `action`.
    pub fn with_action<'a>(&'a self, action: &'a Action) -> impl Iterator<Item = &'a Transition> + 'a {
        self.iter().filter(move |t| &t.action == action)
    }

    /// Targets reachable by `action`, in identifier order.
    pub fn targets(&self, action: &Action) -> Vec<ProcessId> {
        self.with_action(action).map(|t| t.target).collect()
    }

    /// Adds every transition of `other`.
    pub fn union_with(&mut self, other: &TransitionSet) {
        for transition in other.iter() {
            self.insert(transition.clone());
        }
    }

    /// Encodes the set as CBOR.
    pub fn to_cbor(&self) -> Result<Vec<u8>, EngineError> {
        Ok(serde_cbor::to_vec(self)?)
    }

    /// Decodes a set from CBOR.
    pub fn from_cbor(bytes: &[u8]) -> Result<Self, EngineError> {
        Ok(serde_cbor::from_slice(bytes)?)
    }
}

impl PartialEq for TransitionSet {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl Eq for TransitionSet {}

impl fmt::Debug for TransitionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl FromIterator<Transition> for TransitionSet {
    fn from_iter<I: IntoIterator<Item = Transition>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl Extend<Transition> for TransitionSet {
    fn extend<I: IntoIterator<Item = Transition>>(&mut self, iter: I) {
        for transition in iter {
            self.insert(transition);
        }
    }
}

impl From<Vec<Transition>> for TransitionSet {
    fn from(transitions: Vec<Transition>) -> Self {
        transitions.into_iter().collect()
    }
}

impl From<TransitionSet> for Vec<Transition> {
    fn from(set: TransitionSet) -> Self {
        set.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: u32) -> ProcessId {
        ProcessId::new(raw)
    }

    #[test]
    fn duplicates_collapse() {
        let mut set = TransitionSet::new();
        assert!(set.add(Action::input("a"), id(1)));
        assert!(!set.add(Action::input("a"), id(1)));
        assert!(set.add(Action::output("a"), id(1)));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn insertion_order_is_irrelevant() {
        let forward: TransitionSet = vec![
            Transition::new(Action::input("b"), id(2)),
            Transition::new(Action::Tau, id(5)),
            Transition::new(Action::input("a"), id(3)),
        ]
        .into();
        let backward: TransitionSet = vec![
            Transition::new(Action::input("a"), id(3)),
            Transition::new(Action::Tau, id(5)),
            Transition::new(Action::input("b"), id(2)),
        ]
        .into();
        assert_eq!(forward, backward);
        let order: Vec<_> = forward.iter().map(|t| t.action.clone()).collect();
        assert_eq!(order, vec![Action::Tau, Action::input("a"), Action::input("b")]);
    }

    #[test]
    fn targets_by_action() {
        let mut set = TransitionSet::new();
        set.add(Action::input("a"), id(9));
        set.add(Action::input("a"), id(4));
        set.add(Action::input("b"), id(1));
        assert_eq!(set.targets(&Action::input("a")), vec![id(4), id(9)]);
        assert!(set.targets(&Action::Tau).is_empty());
    }

    #[test]
    fn cbor_transport_preserves_the_set() {
        let mut set = TransitionSet::new();
        set.add(Action::output("x"), id(7));
        set.add(Action::Delay(2), id(3));
        let bytes = set.to_cbor().unwrap();
        let decoded = TransitionSet::from_cbor(&bytes).unwrap();
        assert_eq!(decoded, set);
    }

    #[test]
    fn garbage_is_an_encoding_error() {
        let err = TransitionSet::from_cbor(&[0xff, 0x00]).unwrap_err();
        assert!(matches!(err, EngineError::Encoding(_)));
    }
}
