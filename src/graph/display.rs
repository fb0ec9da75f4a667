//! CCS notation for graph terms.

use super::ProcessGraph;
use crate::arena::ProcessId;
use crate::term::Process;
use std::fmt;

/// Binding strength, loosest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    Sum,
    Parallel,
    Prefix,
    Postfix,
    Atom,
}

fn precedence(process: &Process) -> Precedence {
    match process {
        Process::Sum { .. } => Precedence::Sum,
        Process::Parallel { .. } => Precedence::Parallel,
        Process::ActionPrefix { .. } | Process::DelayPrefix { .. } => Precedence::Prefix,
        Process::Restriction { .. } | Process::Relabelling { .. } => Precedence::Postfix,
        Process::Null | Process::Named { .. } => Precedence::Atom,
    }
}

/// Lazily formatted view of one term; see [`ProcessGraph::display`].
///
/// Named processes print as their name; their bodies are not expanded.
pub struct TermDisplay<'g> {
    graph: &'g ProcessGraph,
    id: ProcessId,
}

impl<'g> TermDisplay<'g> {
    pub(crate) fn new(graph: &'g ProcessGraph, id: ProcessId) -> Self {
        Self { graph, id }
    }

    fn write_at(&self, f: &mut fmt::Formatter<'_>, id: ProcessId, min: Precedence) -> fmt::Result {
        let Ok(process) = self.graph.process(id) else {
            return write!(f, "<missing {}>", id);
        };
        let wrap = precedence(process) < min;
        if wrap {
            f.write_str("(")?;
        }
        match process {
            Process::Null => f.write_str("0")?,
            Process::Named { name, .. } => f.write_str(name)?,
            Process::Sum { left, right } => {
                self.write_at(f, *left, Precedence::Sum)?;
                f.write_str(" + ")?;
                self.write_at(f, *right, Precedence::Sum)?;
            }
            Process::Parallel { left, right } => {
                self.write_at(f, *left, Precedence::Parallel)?;
                f.write_str(" | ")?;
                self.write_at(f, *right, Precedence::Parallel)?;
            }
            Process::ActionPrefix { action, next } => {
                write!(f, "{}.", action)?;
                self.write_at(f, *next, Precedence::Prefix)?;
            }
            Process::DelayPrefix { delay, next } => {
                write!(f, "{}.", delay)?;
                self.write_at(f, *next, Precedence::Prefix)?;
            }
            Process::Restriction { body, labels } => {
                self.write_at(f, *body, Precedence::Postfix)?;
                let labels: Vec<&str> = labels.iter().map(String::as_str).collect();
                write!(f, " \\ {{{}}}", labels.join(", "))?;
            }
            Process::Relabelling { body, relabelling } => {
                self.write_at(f, *body, Precedence::Postfix)?;
                let pairs: Vec<String> = relabelling
                    .iter()
                    .map(|(new, old)| format!("{}/{}", new, old))
                    .collect();
                write!(f, "[{}]", pairs.join(", "))?;
            }
        }
        if wrap {
            f.write_str(")")?;
        }
        Ok(())
    }
}

impl fmt::Display for TermDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_at(f, self.id, Precedence::Sum)
    }
}
