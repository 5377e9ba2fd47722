//! Shared constants for mailtriage.
//!
//! Centralizes limits that both the HTTP boundary and the client cache rely on.

/// Largest page the list endpoint will serve.
pub const MAX_LIST_LIMIT: u32 = 100;

/// Page size used by the list endpoint when the caller omits `limit`.
pub const DEFAULT_LIST_LIMIT: u32 = 100;

/// Page size requested by the client cache for each infinite-scroll step.
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Maximum number of IDs in a batch delete request (DoS protection).
pub const MAX_BATCH_IDS: usize = 500;

/// Bounded wait for a single notification delivery, in seconds.
pub const NOTIFY_TIMEOUT_SECS: u64 = 10;

/// Default auto-refresh interval for watched views, in milliseconds.
pub const DEFAULT_REFRESH_INTERVAL_MS: i64 = 30_000;

/// Cached pages younger than this are not revalidated on focus or reconnect.
pub const DEFAULT_STALE_MS: u64 = 5_000;

/// Freshness window for the cached recipient directory, in seconds.
pub const RECIPIENTS_STALE_SECS: u64 = 300;

/// Bounded wait for a single page fetch, in seconds.
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;
