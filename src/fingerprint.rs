//! Content fingerprints of programs.
//!
//! A program fingerprint is a Merkle hash over the definitions of a
//! `ProcessGraph`: every term hashes its kind, its payload (action, labels,
//! renaming) and the hashes of its children; a reference to a named process
//! hashes only the name, which keeps recursive definitions finite. The
//! program hash combines `(name, body hash)` pairs in name order.
//!
//! The result depends on content only: two graphs built from the same
//! definitions in a different order (hence with different identifiers) have
//! the same fingerprint, and any change to a body changes it.
//!
//! # Citations
//! - Merkle, "A digital signature based on a conventional encryption function", CRYPTO (1987)
//! - SHA-256: NIST FIPS 180-4 (2015)
//! - Domain separation & length prefixing: Bernstein et al., "How to hash into elliptic curves" (2009)

use crate::arena::ProcessId;
use crate::error::EngineError;
use crate::graph::ProcessGraph;
use crate::term::{Action, Process};
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// A 256-bit hash value.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HashValue(pub [u8; 32]);

impl HashValue {
    /// The all-zero hash.
    #[inline]
    pub fn zero() -> Self {
        Self([0u8; 32])
    }

    /// Returns the raw byte array.
    #[inline]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Computes SHA-256 of `data` with domain separation.
    ///
    /// The input is `b"CCS:<domain>:v1" || len(data) as u64 LE || data`.
    pub fn hash_with_domain(domain: &[u8], data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(b"CCS:");
        hasher.update(domain);
        hasher.update(b":v1");
        hasher.update((data.len() as u64).to_le_bytes());
        hasher.update(data);
        Self(hasher.finalize().into())
    }
}

impl fmt::Display for HashValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "HashValue({:02x}{:02x}{:02x}{:02x}…)",
            self.0[0], self.0[1], self.0[2], self.0[3]
        )
    }
}

fn push_str(data: &mut Vec<u8>, s: &str) {
    data.extend_from_slice(&(s.len() as u64).to_le_bytes());
    data.extend_from_slice(s.as_bytes());
}

fn push_action(data: &mut Vec<u8>, action: &Action) {
    match action {
        Action::Tau => data.push(0),
        Action::Visible { label, complement } => {
            data.push(if *complement { 2 } else { 1 });
            push_str(data, label);
        }
        Action::Delay(units) => {
            data.push(3);
            data.extend_from_slice(&units.to_le_bytes());
        }
    }
}

/// Memoised term hashing over one graph.
#[derive(Debug, Default)]
pub struct TermHasher {
    memo: HashMap<ProcessId, HashValue>,
}

impl TermHasher {
    /// Creates a hasher with an empty memo.
    pub fn new() -> Self {
        Self::default()
    }

    /// Content hash of the term at `id`.
    pub fn term_hash(&mut self, graph: &ProcessGraph, id: ProcessId) -> Result<HashValue, EngineError> {
        let mut stack = vec![(id, false)];
        while let Some((current, children_done)) = stack.pop() {
            if self.memo.contains_key(&current) {
                continue;
            }
            let process = graph.process(current)?;
            if !children_done {
                stack.push((current, true));
                for child in process.children().into_iter().rev() {
                    if !self.memo.contains_key(&child) {
                        stack.push((child, false));
                    }
                }
                continue;
            }
            let hash = self.node_hash(process)?;
            self.memo.insert(current, hash);
        }
        self.hashed(id)
    }

    fn hashed(&self, id: ProcessId) -> Result<HashValue, EngineError> {
        self.memo.get(&id).copied().ok_or(EngineError::ProcessNotFound(id))
    }

    /// Hash of one node whose children are already hashed.
    fn node_hash(&self, process: &Process) -> Result<HashValue, EngineError> {
        let mut data = Vec::new();
        let domain: &[u8] = match process {
            Process::Null => b"NULL",
            Process::Named { name, .. } => {
                push_str(&mut data, name);
                b"NAMED"
            }
            Process::Sum { left, right } => {
                data.extend_from_slice(self.hashed(*left)?.as_bytes());
                data.extend_from_slice(self.hashed(*right)?.as_bytes());
                b"SUM"
            }
            Process::Parallel { left, right } => {
                data.extend_from_slice(self.hashed(*left)?.as_bytes());
                data.extend_from_slice(self.hashed(*right)?.as_bytes());
                b"PARALLEL"
            }
            Process::ActionPrefix { action, next } => {
                push_action(&mut data, action);
                data.extend_from_slice(self.hashed(*next)?.as_bytes());
                b"PREFIX"
            }
            Process::DelayPrefix { delay, next } => {
                data.extend_from_slice(&delay.to_le_bytes());
                data.extend_from_slice(self.hashed(*next)?.as_bytes());
                b"DELAY"
            }
            Process::Restriction { body, labels } => {
                data.extend_from_slice(&(labels.len() as u64).to_le_bytes());
                for label in labels {
                    push_str(&mut data, label);
                }
                data.extend_from_slice(self.hashed(*body)?.as_bytes());
                b"RESTRICTION"
            }
            Process::Relabelling { body, relabelling } => {
                for (new, old) in relabelling.iter() {
                    push_str(&mut data, old);
                    push_str(&mut data, new);
                }
                data.extend_from_slice(self.hashed(*body)?.as_bytes());
                b"RELABELLING"
            }
        };
        Ok(HashValue::hash_with_domain(domain, &data))
    }
}

/// Fingerprint of every definition in `graph`.
///
/// Undefined names contribute their name with an empty body marker.
pub fn program_fingerprint(graph: &ProcessGraph) -> Result<HashValue, EngineError> {
    let mut hasher = TermHasher::new();
    let mut data = Vec::new();
    for named in graph.named_processes() {
        if let Process::Named { name, .. } = graph.process(named)? {
            push_str(&mut data, name);
        }
        match graph.body_of(named)? {
            Some(body) => {
                data.push(1);
                data.extend_from_slice(hasher.term_hash(graph, body)?.as_bytes());
            }
            None => data.push(0),
        }
    }
    Ok(HashValue::hash_with_domain(b"PROGRAM", &data))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn looping(graph: &mut ProcessGraph, label: &str) -> ProcessId {
        let p = graph.named("P");
        let body = graph.prefix(Action::input(label), p);
        graph.define("P", body).unwrap()
    }

    #[test]
    fn independent_of_identifier_assignment() {
        let mut first = ProcessGraph::new();
        looping(&mut first, "a");
        let zero = first.null();
        let body = first.prefix(Action::output("b"), zero);
        first.define("Q", body).unwrap();

        let mut second = ProcessGraph::new();
        let padding = second.null();
        let zero = second.null();
        let body = second.prefix(Action::output("b"), zero);
        second.define("Q", body).unwrap();
        looping(&mut second, "a");
        assert_ne!(padding, zero);

        assert_eq!(
            program_fingerprint(&first).unwrap(),
            program_fingerprint(&second).unwrap()
        );
    }

    #[test]
    fn changes_when_a_body_changes() {
        let mut first = ProcessGraph::new();
        looping(&mut first, "a");
        let mut second = ProcessGraph::new();
        looping(&mut second, "b");
        assert_ne!(
            program_fingerprint(&first).unwrap(),
            program_fingerprint(&second).unwrap()
        );
    }

    #[test]
    fn polarity_is_part_of_the_hash() {
        let mut graph = ProcessGraph::new();
        let zero = graph.null();
        let input = graph.prefix(Action::input("a"), zero);
        let output = graph.prefix(Action::output("a"), zero);
        let mut hasher = TermHasher::new();
        assert_ne!(
            hasher.term_hash(&graph, input).unwrap(),
            hasher.term_hash(&graph, output).unwrap()
        );
    }

    #[test]
    fn display_shows_a_prefix() {
        let hash = HashValue::hash_with_domain(b"TEST", b"");
        assert!(hash.to_string().starts_with("HashValue("));
        assert_ne!(hash, HashValue::zero());
    }

    #[test]
    fn long_prefix_chains_hash_without_recursion() {
        let mut graph = ProcessGraph::new();
        let p = graph.named("P");
        let mut body = p;
        for i in 0..100_000u32 {
            body = if i % 2 == 0 {
                graph.prefix(Action::input("a"), body)
            } else {
                graph.delay(i, body)
            };
        }
        graph.define("P", body).unwrap();
        let first = program_fingerprint(&graph).unwrap();
        assert_eq!(program_fingerprint(&graph).unwrap(), first);
    }
}
