//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent violations of the node tree's rules.
/// These are independent of infrastructure concerns.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    /// Leaf access on a branch node, or a branch value handed to a leaf setter.
    #[error("not a leaf: {0}")]
    NotALeaf(String),

    #[error("unsupported value: {0}")]
    UnsupportedValue(String),

    #[error("invalid label '{0}': labels must be non-empty and must not contain '/'")]
    InvalidLabel(String),

    #[error("label '{label}' already exists under '{parent}'")]
    LabelConflict { parent: String, label: String },

    #[error("the root node cannot be deleted or moved")]
    RootDeletion,

    #[error("node not found in tree")]
    NodeNotFound,

    #[error("moving '{0}' would make it its own ancestor")]
    Cycle(String),

    #[error("corrupt node store: {0}")]
    CorruptStore(String),
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
