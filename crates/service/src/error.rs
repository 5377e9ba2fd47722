//! Typed error enum for the service layer.

use mailtriage_core::ValidationError;
use mailtriage_storage::StorageError;
use thiserror::Error;

/// Service-layer error unifying storage failures and rejected input.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Storage operation failed (DB, not found, etc.).
    #[error("storage: {0}")]
    Storage(#[from] StorageError),

    /// Caller provided invalid input.
    #[error("{0}")]
    Validation(#[from] ValidationError),
}

impl ServiceError {
    /// Whether this error is likely transient (worth retrying).
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Storage(e) if e.is_transient())
    }

    /// Whether this error represents a not-found condition.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Storage(e) if e.is_not_found())
    }
}
