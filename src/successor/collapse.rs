//! Successors of a quotient.
//!
//! A [`Collapse`] maps every process to the class it belongs to: a
//! representative identifier and the processes the representative stands
//! for. `Collapsing` answers for a process with the union of the inner
//! successors of every member of its class, each target replaced by its own
//! representative. This is how a bisimulation result turns into a minimised
//! transition system without rebuilding the graph.
//!
//! Results are cached by representative, so every member of a class shares
//! one set. A mapping that claims `p` belongs to a class whose member list
//! does not contain `p` is rejected with `InconsistentCollapse` before any
//! inner generator is called.

use super::SuccessorGenerator;
use crate::arena::ProcessId;
use crate::error::EngineError;
use crate::graph::ProcessGraph;
use crate::transition::TransitionSet;
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::trace;

/// A class of the quotient: its representative and members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollapsedProcess {
    /// Representative identifier.
    pub id: ProcessId,
    /// Members of the class.
    pub sub_processes: Vec<ProcessId>,
}

impl CollapsedProcess {
    /// The singleton class of `id`.
    pub fn singleton(id: ProcessId) -> Self {
        Self {
            id,
            sub_processes: vec![id],
        }
    }

    /// Returns `true` if `id` is a member.
    pub fn contains(&self, id: ProcessId) -> bool {
        self.sub_processes.contains(&id)
    }
}

/// Maps a process to its class.
pub trait Collapse {
    /// Class of `id`. Processes outside every class are their own singleton.
    fn representative_of(&self, id: ProcessId) -> CollapsedProcess;
}

impl<C: Collapse + ?Sized> Collapse for &C {
    fn representative_of(&self, id: ProcessId) -> CollapsedProcess {
        (**self).representative_of(id)
    }
}

/// Collapse built from a partition of process identifiers.
///
/// The representative of a class is its smallest member.
#[derive(Debug, Clone, Default)]
pub struct PartitionCollapse {
    classes: Vec<CollapsedProcess>,
    class_of: HashMap<ProcessId, usize>,
}

impl PartitionCollapse {
    /// Builds a collapse from disjoint classes.
    ///
    /// Empty classes are ignored and duplicates inside one class are merged.
    /// Returns `OverlappingCollapseClass` if an identifier is in two classes.
    pub fn from_classes<I, S>(classes: I) -> Result<Self, EngineError>
    where
        I: IntoIterator<Item = S>,
        S: IntoIterator<Item = ProcessId>,
    {
        let mut collapse = Self::default();
        for class in classes {
            let mut members: Vec<ProcessId> = class.into_iter().collect();
            members.sort_unstable();
            members.dedup();
            let Some(&representative) = members.first() else {
                continue;
            };
            let index = collapse.classes.len();
            for &member in &members {
                if collapse.class_of.insert(member, index).is_some() {
                    return Err(EngineError::OverlappingCollapseClass(member));
                }
            }
            collapse.classes.push(CollapsedProcess {
                id: representative,
                sub_processes: members,
            });
        }
        Ok(collapse)
    }

    /// Number of non-singleton classes given at construction.
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Returns `true` if no class was given.
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl Collapse for PartitionCollapse {
    fn representative_of(&self, id: ProcessId) -> CollapsedProcess {
        match self.class_of.get(&id) {
            Some(&index) => self.classes[index].clone(),
            None => CollapsedProcess::singleton(id),
        }
    }
}

/// Decorator producing the successors of the quotient under `C`.
#[derive(Debug)]
pub struct Collapsing<G, C> {
    inner: G,
    collapse: C,
    /// Representative → successors of its class.
    cache: HashMap<ProcessId, Arc<TransitionSet>>,
}

impl<G: SuccessorGenerator, C: Collapse> Collapsing<G, C> {
    /// Wraps `inner` with the quotient given by `collapse`.
    pub fn new(inner: G, collapse: C) -> Self {
        Self {
            inner,
            collapse,
            cache: HashMap::new(),
        }
    }

    /// The collapse mapping.
    pub fn collapse(&self) -> &C {
        &self.collapse
    }

    fn class_of(&self, id: ProcessId) -> Result<CollapsedProcess, EngineError> {
        let class = self.collapse.representative_of(id);
        if !class.contains(id) {
            return Err(EngineError::InconsistentCollapse {
                process: id,
                representative: class.id,
            });
        }
        Ok(class)
    }
}

impl<G: SuccessorGenerator, C: Collapse> SuccessorGenerator for Collapsing<G, C> {
    fn successors(
        &mut self,
        graph: &mut ProcessGraph,
        id: ProcessId,
    ) -> Result<Arc<TransitionSet>, EngineError> {
        let class = self.class_of(id)?;
        if let Some(hit) = self.cache.get(&class.id) {
            trace!(%id, representative = %class.id, "collapsed successors cache hit");
            return Ok(Arc::clone(hit));
        }
        let mut quotient = TransitionSet::new();
        for &member in &class.sub_processes {
            let steps = self.inner.successors(graph, member)?;
            for step in steps.iter() {
                let target = self.class_of(step.target)?;
                quotient.add(step.action.clone(), target.id);
            }
        }
        let set = Arc::new(quotient);
        self.cache.insert(class.id, Arc::clone(&set));
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::successor::{StrictSuccessors, Weak};
    use crate::term::Action;

    struct Lying;

    impl Collapse for Lying {
        fn representative_of(&self, id: ProcessId) -> CollapsedProcess {
            let other = ProcessId::new(id.as_u32() + 1);
            CollapsedProcess {
                id: other,
                sub_processes: vec![other],
            }
        }
    }

    #[test]
    fn partition_rejects_overlap() {
        let classes = vec![
            vec![ProcessId::new(1), ProcessId::new(2)],
            vec![ProcessId::new(2), ProcessId::new(3)],
        ];
        assert_eq!(
            PartitionCollapse::from_classes(classes).unwrap_err(),
            EngineError::OverlappingCollapseClass(ProcessId::new(2))
        );
    }

    #[test]
    fn partition_picks_smallest_member() {
        let collapse =
            PartitionCollapse::from_classes(vec![vec![ProcessId::new(7), ProcessId::new(3)]]).unwrap();
        let class = collapse.representative_of(ProcessId::new(7));
        assert_eq!(class.id, ProcessId::new(3));
        assert!(class.contains(ProcessId::new(7)));
        assert_eq!(
            collapse.representative_of(ProcessId::new(9)),
            CollapsedProcess::singleton(ProcessId::new(9))
        );
    }

    #[test]
    fn class_members_share_successors() {
        let mut graph = ProcessGraph::new();
        let zero = graph.null();
        let a = graph.prefix(Action::input("a"), zero);
        let b = graph.prefix(Action::input("b"), zero);
        let collapse = PartitionCollapse::from_classes(vec![vec![a, b]]).unwrap();
        let mut collapsing = Collapsing::new(StrictSuccessors::new(), collapse);

        let from_a = collapsing.successors(&mut graph, a).unwrap();
        let from_b = collapsing.successors(&mut graph, b).unwrap();
        assert!(Arc::ptr_eq(&from_a, &from_b));
        assert_eq!(from_a.len(), 2);
    }

    #[test]
    fn targets_map_to_representatives() {
        let mut graph = ProcessGraph::new();
        let zero = graph.null();
        let tail = graph.prefix(Action::Tau, zero);
        let p = graph.prefix(Action::input("a"), tail);
        let q = graph.prefix(Action::input("a"), zero);
        let collapse = PartitionCollapse::from_classes(vec![vec![zero, tail]]).unwrap();
        let mut collapsing = Collapsing::new(Weak::new(StrictSuccessors::new()), collapse);

        let from_p = collapsing.successors(&mut graph, p).unwrap();
        let from_q = collapsing.successors(&mut graph, q).unwrap();
        assert_eq!(*from_p, *from_q);
        assert_eq!(from_p.targets(&Action::input("a")), vec![zero]);
    }

    #[test]
    fn inconsistent_mapping_fails_fast() {
        let mut graph = ProcessGraph::new();
        let zero = graph.null();
        let mut collapsing = Collapsing::new(StrictSuccessors::new(), Lying);
        assert_eq!(
            collapsing.successors(&mut graph, zero),
            Err(EngineError::InconsistentCollapse {
                process: zero,
                representative: ProcessId::new(1),
            })
        );
    }

    #[test]
    fn membership_ignores_member_order() {
        let class = CollapsedProcess {
            id: ProcessId::new(2),
            sub_processes: vec![ProcessId::new(9), ProcessId::new(2), ProcessId::new(5)],
        };
        assert!(class.contains(ProcessId::new(5)));
        assert!(class.contains(ProcessId::new(9)));
        assert!(!class.contains(ProcessId::new(3)));
    }

    #[test]
    fn foreign_ids_are_not_found() {
        let mut graph = ProcessGraph::new();
        graph.null();
        let missing = ProcessId::new(graph.len() as u32 + 5);
        let mut collapsing = Collapsing::new(StrictSuccessors::new(), PartitionCollapse::default());
        assert_eq!(
            collapsing.successors(&mut graph, missing),
            Err(EngineError::ProcessNotFound(missing))
        );
    }
}
