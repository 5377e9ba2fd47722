use thiserror::Error;

use crate::constants::MAX_BATCH_IDS;

/// Malformed caller input, rejected before any store or remote call.
///
/// The `Display` text of each variant is the exact message returned by the
/// HTTP boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValidationError {
    #[error("Limit must be a number between 1 and 100")]
    InvalidLimit,

    #[error("Offset must be a non-negative number")]
    InvalidOffset,

    #[error("read_status must be 0 (unread) or 1 (read)")]
    InvalidReadStatus,

    #[error("Invalid email type")]
    InvalidEmailType,

    #[error("recipient must be a non-empty string")]
    EmptyRecipient,

    #[error("Email ID is required")]
    MissingEmailId,

    #[error("is_read parameter is required")]
    MissingIsRead,

    #[error("Invalid email ID")]
    InvalidEmailId,

    #[error("is_read must be 0 (unread) or 1 (read)")]
    InvalidIsRead,

    #[error("ids must be a non-empty array")]
    EmptyIdList,

    #[error("ids array exceeds maximum of {MAX_BATCH_IDS} items")]
    TooManyIds,

    #[error("emailResult is required unless emailType is none")]
    MissingResult,
}

/// Errors raised while decoding domain values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CoreError {
    #[error("unknown email type: {0}")]
    UnknownEmailType(String),

    #[error("unknown read filter: {0}")]
    UnknownReadFilter(String),
}
