//! Patch error types.

use std::time::Duration;

use thiserror::Error;

/// Result type alias for patch operations.
pub type PatchResult<T> = Result<T, PatchError>;

/// Errors returned when a replica patch cannot be applied.
#[derive(Debug, Error)]
pub enum PatchError {
    #[error("{kind} {namespace}/{name} not found")]
    NotFound {
        kind: String,
        namespace: String,
        name: String,
    },

    #[error("patch timed out after {0:?}")]
    Timeout(Duration),

    /// Any other API or transport failure.
    #[error("api error: {0}")]
    Api(#[from] kube::Error),
}
