//! Application-level errors (wraps domain errors)

use thiserror::Error;

use crate::domain::DomainError;

/// Application errors wrap domain errors and add application-level context.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("unable to decode {format}: {message}")]
    Decode { format: String, message: String },

    #[error("unable to encode {format}: {message}")]
    Encode { format: String, message: String },

    #[error("unknown format: {0}")]
    UnknownFormat(String),

    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    #[error("config error: {message}")]
    Config { message: String },

    #[error("operation failed: {context}")]
    OperationFailed {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl ApplicationError {
    /// Surface a domain error at the service boundary. Leaf/branch dispatch
    /// failures become a type mismatch, everything else passes through.
    pub fn from_domain(e: DomainError) -> Self {
        match e {
            DomainError::NotALeaf(path) => ApplicationError::TypeMismatch {
                expected: "a leaf".to_string(),
                found: format!("a branch at '{}'", path),
            },
            other => ApplicationError::Domain(other),
        }
    }
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
