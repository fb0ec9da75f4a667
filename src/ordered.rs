//! Ordered associative containers backed by a treap.
//!
//! `OrderedMap` keeps its keys in the order given by a caller-supplied
//! `Comparator`; `OrderedSet` is the same tree without values. Both are the
//! storage for transition sets and for the visited sets of the search
//! passes.
//!
//! Each node carries a priority drawn from a seeded ChaCha8 stream. Insertion
//! is plain BST insertion followed by rotations that lift the new node while
//! its priority exceeds its parent's, so the tree is a max-heap on priority
//! and has expected depth O(log n) without any rebalancing metadata.
//!
//! # Determinism
//! The priority stream starts from a fixed seed, so the tree shape (and
//! therefore everything observable about it) is a function of the insertion
//! history alone. Iteration order is always comparator order.
//!
//! # Citations
//! - Seidel & Aragon, "Randomized search trees", Algorithmica 16 (1996)

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::cmp::Ordering;
use std::fmt;

/// Seed of the priority stream when none is given.
pub const DEFAULT_SEED: u64 = 0x7EA9_5EED;

/// Total order over keys of type `K`.
pub trait Comparator<K: ?Sized> {
    /// Compares two keys.
    fn compare(&self, a: &K, b: &K) -> Ordering;
}

/// The key type's own `Ord`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NaturalOrder;

impl<K: Ord + ?Sized> Comparator<K> for NaturalOrder {
    #[inline]
    fn compare(&self, a: &K, b: &K) -> Ordering {
        a.cmp(b)
    }
}

/// Order given by a closure.
#[derive(Clone, Copy)]
pub struct OrderBy<F>(pub F);

impl<K: ?Sized, F> Comparator<K> for OrderBy<F>
where
    F: Fn(&K, &K) -> Ordering,
{
    #[inline]
    fn compare(&self, a: &K, b: &K) -> Ordering {
        (self.0)(a, b)
    }
}

impl<F> fmt::Debug for OrderBy<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OrderBy(..)")
    }
}

#[derive(Debug, Clone)]
struct TreapNode<K, V> {
    key: K,
    value: V,
    priority: u64,
    left: Option<usize>,
    right: Option<usize>,
}

/// Ordered map over a caller-supplied total order.
#[derive(Clone)]
pub struct OrderedMap<K, V, C = NaturalOrder> {
    nodes: Vec<TreapNode<K, V>>,
    root: Option<usize>,
    cmp: C,
    rng: ChaCha8Rng,
}

impl<K, V, C: Comparator<K> + Default> OrderedMap<K, V, C> {
    /// Creates an empty map using the comparator's default value.
    pub fn new() -> Self {
        Self::with_comparator(C::default())
    }

    /// Creates an empty map with a specific priority seed.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_comparator_and_seed(C::default(), seed)
    }
}

impl<K, V, C: Comparator<K> + Default> Default for OrderedMap<K, V, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, C> OrderedMap<K, V, C> {
    /// Returns the number of distinct keys.
    #[inline]
    pub fn size(&self) -> usize {
        self.nodes.len()
    }

    /// Alias of [`size`](Self::size).
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the map holds no keys.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Lazy in-order traversal. Each call starts a fresh walk.
    pub fn iter(&self) -> Iter<'_, K, V> {
        let mut iter = Iter {
            nodes: &self.nodes,
            stack: Vec::new(),
        };
        iter.push_left_spine(self.root);
        iter
    }

    /// Keys in comparator order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.iter().map(|(k, _)| k)
    }

    /// Values in key order.
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.iter().map(|(_, v)| v)
    }

    /// Calls `f` on every entry in key order.
    pub fn for_each<F: FnMut(&K, &V)>(&self, mut f: F) {
        for (k, v) in self.iter() {
            f(k, v);
        }
    }

    /// Height of the tree (0 when empty).
    pub fn height(&self) -> usize {
        let mut best = 0;
        let mut stack: Vec<(usize, usize)> = self.root.map(|r| (r, 1)).into_iter().collect();
        while let Some((idx, depth)) = stack.pop() {
            best = best.max(depth);
            let node = &self.nodes[idx];
            stack.extend(node.left.map(|l| (l, depth + 1)));
            stack.extend(node.right.map(|r| (r, depth + 1)));
        }
        best
    }

    fn rotate_right(&mut self, idx: usize) -> usize {
        let Some(left) = self.nodes[idx].left else {
            return idx;
        };
        self.nodes[idx].left = self.nodes[left].right;
        self.nodes[left].right = Some(idx);
        left
    }

    fn rotate_left(&mut self, idx: usize) -> usize {
        let Some(right) = self.nodes[idx].right else {
            return idx;
        };
        self.nodes[idx].right = self.nodes[right].left;
        self.nodes[right].left = Some(idx);
        right
    }
}

impl<K, V, C: Comparator<K>> OrderedMap<K, V, C> {
    /// Creates an empty map ordered by `cmp`.
    pub fn with_comparator(cmp: C) -> Self {
        Self::with_comparator_and_seed(cmp, DEFAULT_SEED)
    }

    /// Creates an empty map ordered by `cmp` with a specific priority seed.
    pub fn with_comparator_and_seed(cmp: C, seed: u64) -> Self {
        Self {
            nodes: Vec::new(),
            root: None,
            cmp,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Associates `value` with `key`.
    ///
    /// If the key is already present its value is overwritten in place and
    /// the previous value is returned; no node is added.
    pub fn set(&mut self, key: K, value: V) -> Option<V> {
        let mut replaced = None;
        let root = self.insert_at(self.root, key, value, &mut replaced);
        self.root = Some(root);
        replaced
    }

    /// Returns the value stored under `key`.
    pub fn get(&self, key: &K) -> Option<&V> {
        self.find(key).map(|idx| &self.nodes[idx].value)
    }

    /// Returns a mutable reference to the value stored under `key`.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let idx = self.find(key)?;
        Some(&mut self.nodes[idx].value)
    }

    /// Returns `true` if `key` has been set.
    pub fn has(&self, key: &K) -> bool {
        self.find(key).is_some()
    }

    fn find(&self, key: &K) -> Option<usize> {
        let mut cursor = self.root;
        while let Some(idx) = cursor {
            let node = &self.nodes[idx];
            cursor = match self.cmp.compare(key, &node.key) {
                Ordering::Equal => return Some(idx),
                Ordering::Less => node.left,
                Ordering::Greater => node.right,
            };
        }
        None
    }

    /// Inserts below `at` and returns the index of the subtree's new root.
    fn insert_at(&mut self, at: Option<usize>, key: K, value: V, replaced: &mut Option<V>) -> usize {
        let Some(idx) = at else {
            let priority = self.rng.gen::<u64>();
            self.nodes.push(TreapNode {
                key,
                value,
                priority,
                left: None,
                right: None,
            });
            return self.nodes.len() - 1;
        };
        match self.cmp.compare(&key, &self.nodes[idx].key) {
            Ordering::Equal => {
                *replaced = Some(std::mem::replace(&mut self.nodes[idx].value, value));
                idx
            }
            Ordering::Less => {
                let child = self.insert_at(self.nodes[idx].left, key, value, replaced);
                self.nodes[idx].left = Some(child);
                if self.nodes[child].priority > self.nodes[idx].priority {
                    self.rotate_right(idx)
                } else {
                    idx
                }
            }
            Ordering::Greater => {
                let child = self.insert_at(self.nodes[idx].right, key, value, replaced);
                self.nodes[idx].right = Some(child);
                if self.nodes[child].priority > self.nodes[idx].priority {
                    self.rotate_left(idx)
                } else {
                    idx
                }
            }
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug, C> fmt::Debug for OrderedMap<K, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<'a, K, V, C> IntoIterator for &'a OrderedMap<K, V, C> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// In-order iterator over an `OrderedMap`.
pub struct Iter<'a, K, V> {
    nodes: &'a [TreapNode<K, V>],
    stack: Vec<usize>,
}

impl<K, V> Iter<'_, K, V> {
    fn push_left_spine(&mut self, mut cursor: Option<usize>) {
        while let Some(idx) = cursor {
            self.stack.push(idx);
            cursor = self.nodes[idx].left;
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.stack.pop()?;
        let nodes = self.nodes;
        let node = &nodes[idx];
        self.push_left_spine(node.right);
        Some((&node.key, &node.value))
    }
}

/// Ordered set over a caller-supplied total order.
#[derive(Clone)]
pub struct OrderedSet<K, C = NaturalOrder> {
    map: OrderedMap<K, (), C>,
}

impl<K, C: Comparator<K> + Default> OrderedSet<K, C> {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self { map: OrderedMap::new() }
    }
}

impl<K, C: Comparator<K> + Default> Default for OrderedSet<K, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, C: Comparator<K>> OrderedSet<K, C> {
    /// Creates an empty set ordered by `cmp`.
    pub fn with_comparator(cmp: C) -> Self {
        Self {
            map: OrderedMap::with_comparator(cmp),
        }
    }

    /// Adds `key`; returns `true` if it was not present.
    pub fn insert(&mut self, key: K) -> bool {
        self.map.set(key, ()).is_none()
    }

    /// Returns `true` if `key` is present.
    pub fn contains(&self, key: &K) -> bool {
        self.map.has(key)
    }
}

impl<K, C> OrderedSet<K, C> {
    /// Number of elements.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns `true` if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Elements in comparator order.
    pub fn iter(&self) -> impl Iterator<Item = &K> {
        self.map.keys()
    }
}

impl<K: fmt::Debug, C> fmt::Debug for OrderedSet<K, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<K, C: Comparator<K> + Default> FromIterator<K> for OrderedSet<K, C> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut set = Self::new();
        for key in iter {
            set.insert(key);
        }
        set
    }
}

impl<K, C: Comparator<K>> Extend<K> for OrderedSet<K, C> {
    fn extend<I: IntoIterator<Item = K>>(&mut self, iter: I) {
        for key in iter {
            self.insert(key);
        }
    }
}
