use crate::kind::ResourceKind;

/// Errors returned by document assembly and rewriting.
///
/// Every variant is terminal for the call that produced it: no partially assembled or partially
/// rewritten document is ever returned alongside an error.
#[derive(Debug, thiserror::Error)]
pub enum AssemblyError {
    #[error("resource error: identifier allocation failed: {0}")]
    Resource(#[from] erx_uuid::UuidError),

    #[error("missing reference: document has no {kind} entry")]
    MissingReference { kind: ResourceKind },

    #[error("ambiguous reference: document has {count} {kind} entries")]
    AmbiguousReference { kind: ResourceKind, count: usize },

    #[error("invalid field path '{path}' in {kind}: {reason}")]
    InvalidFieldPath {
        kind: ResourceKind,
        path: String,
        reason: String,
    },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("document invariant violated: {0}")]
    InvariantViolated(String),
}

pub type AssemblyResult<T> = std::result::Result<T, AssemblyError>;
