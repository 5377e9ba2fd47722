use std::time::Duration;

use mailtriage_core::ValidationError;
use thiserror::Error;

/// Failure talking to the dashboard API.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RemoteError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("malformed API response: {0}")]
    Envelope(String),
}

impl RemoteError {
    /// Network hiccups and 5xx responses may succeed on a later attempt.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            Self::Status { status, .. } => *status >= 500,
            Self::Envelope(_) => false,
        }
    }
}

/// A page request that did not produce a page.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FetchError {
    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("page fetch timed out after {0:?}")]
    Timeout(Duration),
}

impl FetchError {
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Remote(e) => e.is_transient(),
            Self::Timeout(_) => true,
        }
    }
}

/// A user mutation that was rejected locally or by the server.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MutationError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("mutation already settled")]
    AlreadySettled,
}

impl MutationError {
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}
