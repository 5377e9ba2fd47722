//! Typed error enum for the notification sender.

use std::time::Duration;

use thiserror::Error;

/// Errors from a single delivery attempt.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("bot token and chat id are required")]
    MissingCredentials,
    #[error("HTTP request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),
    #[error("HTTP status {code}: {body}")]
    HttpStatus { code: u16, body: String },
    #[error("delivery abandoned after {0:?}")]
    Timeout(Duration),
    #[error("client initialization failed: {0}")]
    ClientInit(String),
}
