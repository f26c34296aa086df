//! Error types for builder operations.

use thiserror::Error;

/// Result type for builder operations.
pub type BuilderResult<T> = Result<T, BuilderError>;

/// Errors that can occur while editing a surface.
#[derive(Debug, Error)]
pub enum BuilderError {
    /// A node required by the operation does not exist.
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    /// The node cannot receive children (or its single slot is occupied).
    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    /// Attaching `node` under `target` would make the tree cyclic.
    #[error("Attaching {node} under {target} would create a cycle")]
    CycleDetected {
        /// The node being attached.
        node: String,
        /// The prospective parent.
        target: String,
    },

    /// An id is already taken by another node.
    #[error("Duplicate node id: {0}")]
    DuplicateId(String),

    /// Raw surface text was rejected; the current document is unchanged.
    #[error("Import failed: {0}")]
    Import(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An external collaborator (widget service, asset presigner) failed.
    #[error("Service error: {0}")]
    Service(#[from] ServiceError),
}

/// Errors reported by external collaborators.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ServiceError {
    /// The requested widget or asset does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The request could not be completed (connection, timeout, status).
    #[error("Request failed: {0}")]
    Request(String),

    /// The response did not match the expected structure.
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
}
