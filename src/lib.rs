//! ccs-engine: shared, reduced and incrementally explored CCS/TCCS terms.
//!
//! This crate stores process terms of Milner's Calculus of Communicating
//! Systems (with TCCS delay prefixes) as a graph of shared nodes and derives
//! their labelled transitions on demand:
//! - `ProcessGraph` is the arena an external parser builds a program into.
//! - `TermSharer` hash-conses the program so identical subterms are one node.
//! - `Reducer` rewrites terms modulo structural congruence (`P + 0 = P`, …).
//! - `unguarded_processes` finds recursive definitions without a guard.
//! - `SuccessorGenerator` stages (`StrictSuccessors`, `Reducing`, `Weak`,
//!   `Collapsing`) compose into a pipeline answering "what can this process
//!   do next?".
//! - `Session` runs all of the above for one program.
//!
//! # Example
//!
//! ```
//! use ccs_engine::prelude::*;
//!
//! // P = a.'b.P
//! let mut graph = ProcessGraph::new();
//! let p = graph.named("P");
//! let then = graph.prefix(Action::output("b"), p);
//! let body = graph.prefix(Action::input("a"), then);
//! graph.define("P", body).unwrap();
//!
//! let mut session = Session::new(graph, EngineConfig::default()).unwrap();
//! let steps = session.successors_by_name("P").unwrap();
//! assert_eq!(steps.len(), 1);
//! ```
//!
//! # References
//!
//! - Milner, R. "Communication and Concurrency", Prentice Hall (1989)
//! - Yi, W. "CCS + Time = an Interleaving Model for Real Time Systems", ICALP (1991)
//! - Seidel, R. & Aragon, C. "Randomized search trees", Algorithmica 16 (1996)

pub mod arena;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod graph;
pub mod guard;
pub mod ordered;
pub mod reduce;
pub mod session;
pub mod share;
pub mod successor;
pub mod term;
pub mod transition;

mod proptests;

pub use arena::ProcessId;
pub use config::EngineConfig;
pub use error::EngineError;
pub use graph::ProcessGraph;
pub use session::{QuotientView, Session};
pub use term::{Action, Process};
pub use transition::{Transition, TransitionSet};

/// Prelude for convenient usage.
pub mod prelude {
    pub use crate::arena::ProcessId;
    pub use crate::config::EngineConfig;
    pub use crate::error::EngineError;
    pub use crate::fingerprint::{program_fingerprint, HashValue};
    pub use crate::graph::ProcessGraph;
    pub use crate::guard::unguarded_processes;
    pub use crate::ordered::{OrderedMap, OrderedSet};
    pub use crate::reduce::Reducer;
    pub use crate::session::{QuotientView, Session};
    pub use crate::share::{ShareReport, TermSharer};
    pub use crate::successor::{
        Collapse, CollapsedProcess, Collapsing, PartitionCollapse, Reducing, StrictSuccessors,
        SuccessorGenerator, Weak,
    };
    pub use crate::term::{Action, LabelSet, Process, RelabelMap};
    pub use crate::transition::{Transition, TransitionSet};
}

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use std::collections::BTreeSet;

    #[test]
    fn sharing_then_reduction_of_a_small_program() {
        // P = a.0 + a.0 ; Q = P | 0
        let mut graph = ProcessGraph::new();
        let z1 = graph.null();
        let z2 = graph.null();
        let a1 = graph.prefix(Action::input("a"), z1);
        let a2 = graph.prefix(Action::input("a"), z2);
        let body_p = graph.sum(a1, a2);
        let p = graph.define("P", body_p).unwrap();
        let z3 = graph.null();
        let body_q = graph.parallel(p, z3);
        let q = graph.define("Q", body_q).unwrap();

        let mut sharer = TermSharer::new();
        sharer.share_program(&mut graph).unwrap();
        assert_eq!(sharer.canonical_of(a2), Some(a1));

        let mut reducer = Reducer::new();
        reducer.reduce_program(&mut graph).unwrap();
        assert_eq!(graph.body_of(p).unwrap(), Some(a1));
        assert_eq!(graph.body_of(q).unwrap(), Some(p));
    }

    #[test]
    fn weak_session_hides_internal_handshakes() {
        // Sys = (a.'c.0 | c.b.0) \ {c}
        let mut graph = ProcessGraph::new();
        let zero = graph.null();
        let send = graph.prefix(Action::output("c"), zero);
        let left = graph.prefix(Action::input("a"), send);
        let then_b = graph.prefix(Action::input("b"), zero);
        let right = graph.prefix(Action::input("c"), then_b);
        let par = graph.parallel(left, right);
        let sys = graph.restrict(par, ["c"]);
        graph.define("Sys", sys).unwrap();

        let mut session = Session::new(graph, EngineConfig::weak()).unwrap();
        let first = session.successors_by_name("Sys").unwrap();
        let actions: BTreeSet<String> = first.iter().map(|t| t.action.to_string()).collect();
        assert_eq!(actions, BTreeSet::from(["a".to_string()]));
        // Both the state right after `a` and its silent successor are
        // weak `a`-successors.
        assert_eq!(first.targets(&Action::input("a")).len(), 2);

        // After `a` the handshake on `c` is silent, so `b` is weakly enabled
        // from every `a`-successor.
        for &after_a in &first.targets(&Action::input("a")) {
            let next = session.successors(after_a).unwrap();
            assert!(!next.targets(&Action::input("b")).is_empty());
            assert!(next.targets(&Action::Tau).is_empty());
        }
    }

    #[test]
    fn transition_sets_cross_the_worker_boundary() {
        let mut graph = ProcessGraph::new();
        let zero = graph.null();
        let a = graph.prefix(Action::input("a"), zero);
        let co_a = graph.prefix(Action::output("a"), zero);
        let par = graph.parallel(a, co_a);
        graph.define("P", par).unwrap();

        let mut session = Session::new(graph, EngineConfig::default()).unwrap();
        let steps = session.successors_by_name("P").unwrap();
        let bytes = steps.to_cbor().unwrap();
        assert_eq!(TransitionSet::from_cbor(&bytes).unwrap(), *steps);
    }
}
