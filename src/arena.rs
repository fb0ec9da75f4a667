//! Arena storage for process-term nodes.
//!
//! Provides `ProcessId` (a dense, total-orderable identifier) and
//! `ProcessArena` (contiguous, append-only storage). Nodes are never freed
//! one by one; a whole arena is dropped when its program is replaced.
//!
//! # Determinism
//! - `ProcessId` ordering is by its inner `u32`.
//! - Identifiers are handed out in allocation order and never reused, so the
//!   same sequence of builder calls yields the same identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Dense identifier of a process-term node.
///
/// `ProcessId(u32)` is `Copy`, `Eq`, `Ord`, `Hash`. The inner value is an
/// index into the arena's slot array. Within one graph two nodes with the
/// same identifier are the same node.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProcessId(u32);

impl ProcessId {
    /// Creates a `ProcessId` from a raw `u32`.
    ///
    /// Identifiers are normally obtained from a `ProcessGraph`; a hand-made
    /// identifier is only meaningful for the graph that issued it.
    #[inline]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw `u32` index.
    #[inline]
    pub const fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProcessId({})", self.0)
    }
}

/// Append-only storage indexed by `ProcessId`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessArena<T> {
    slots: Vec<T>,
}

impl<T> ProcessArena<T> {
    /// Creates a new empty arena.
    pub fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// Returns the identifier the next allocation will receive.
    pub fn next_id(&self) -> ProcessId {
        ProcessId(self.slots.len() as u32)
    }

    /// Allocates a new slot holding `data` and returns its `ProcessId`.
    ///
    /// # Panics
    /// Panics if the arena already holds `u32::MAX` nodes.
    pub fn allocate(&mut self, data: T) -> ProcessId {
        let idx = self.slots.len();
        assert!(idx < u32::MAX as usize, "process arena capacity exceeded");
        self.slots.push(data);
        ProcessId(idx as u32)
    }

    /// Returns a reference to the data stored at `id`, if present.
    pub fn get(&self, id: ProcessId) -> Option<&T> {
        self.slots.get(id.as_u32() as usize)
    }

    /// Returns a mutable reference to the data stored at `id`, if present.
    pub fn get_mut(&mut self, id: ProcessId) -> Option<&mut T> {
        self.slots.get_mut(id.as_u32() as usize)
    }

    /// Returns the number of allocated nodes.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if nothing has been allocated.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Iterates over all nodes in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = (ProcessId, &T)> {
        self.slots
            .iter()
            .enumerate()
            .map(|(idx, data)| (ProcessId(idx as u32), data))
    }
}

impl<T> Default for ProcessArena<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arena_basic() {
        let mut arena: ProcessArena<&'static str> = ProcessArena::new();
        assert!(arena.is_empty());
        assert_eq!(arena.next_id(), ProcessId::new(0));

        let id1 = arena.allocate("hello");
        let id2 = arena.allocate("world");
        assert_eq!(id1.as_u32(), 0);
        assert_eq!(id2.as_u32(), 1);
        assert_eq!(arena.len(), 2);
        assert_eq!(arena.get(id1), Some(&"hello"));
        assert_eq!(arena.get(ProcessId::new(7)), None);

        *arena.get_mut(id2).unwrap() = "there";
        assert_eq!(arena.get(id2), Some(&"there"));
    }

    #[test]
    fn identifiers_are_monotone() {
        let mut arena: ProcessArena<i32> = ProcessArena::new();
        let ids: Vec<_> = (0..5).map(|i| arena.allocate(i)).collect();
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
        let collected: Vec<_> = arena.iter().map(|(id, &val)| (id.as_u32(), val)).collect();
        assert_eq!(collected, vec![(0, 0), (1, 1), (2, 2), (3, 3), (4, 4)]);
    }

    #[test]
    fn display_is_stable() {
        assert_eq!(ProcessId::new(12).to_string(), "ProcessId(12)");
    }
}
