//! Error type shared by every engine component.

use crate::arena::ProcessId;

/// Error type for graph lookups, successor generation and collapsing.
///
/// Every error is scoped to the call that produced it; no component keeps
/// a poisoned state after returning one.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// Identifier does not belong to the graph.
    #[error("process {0} not found")]
    ProcessNotFound(ProcessId),
    /// No named process with this name exists.
    #[error("unknown process name '{0}'")]
    UnknownProcessName(String),
    /// Name is referenced but has no definition.
    #[error("process '{0}' is referenced but never defined")]
    UndefinedProcess(String),
    /// Name was defined twice.
    #[error("process '{0}' is already defined")]
    DuplicateDefinition(String),
    /// Unfolding a named process reached itself without passing a prefix.
    #[error("process '{0}' unfolds into itself without an action prefix")]
    UnguardedRecursion(String),
    /// The program contains unguarded definitions and the session rejects them.
    #[error("unguarded recursive definitions: {}", .0.join(", "))]
    UnguardedDefinitions(Vec<String>),
    /// A collapse capability returned a representative that does not cover
    /// the process it was asked about.
    #[error("collapse representative {representative} does not cover process {process}")]
    InconsistentCollapse {
        /// Process that was looked up.
        process: ProcessId,
        /// Representative that was returned for it.
        representative: ProcessId,
    },
    /// A partition listed the same process in two classes.
    #[error("process {0} occurs in more than one collapse class")]
    OverlappingCollapseClass(ProcessId),
    /// CBOR encoding or decoding failed.
    #[error("CBOR encoding failed: {0}")]
    Encoding(String),
}

impl From<serde_cbor::Error> for EngineError {
    fn from(err: serde_cbor::Error) -> Self {
        EngineError::Encoding(err.to_string())
    }
}
