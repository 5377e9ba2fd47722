//! Outbound notifications for mailtriage.
//!
//! Delivery is best-effort: callers hand over a message and move on. Failures
//! and timeouts are logged here and never reach the caller.

#![allow(clippy::missing_errors_doc, reason = "Errors are self-explanatory from Result types")]

mod client;
mod error;

pub use client::{
    DEFAULT_TELEGRAM_API, TelegramCredentials, TelegramNotifier, escape_html, format_ingest_message,
};
pub use error::NotifyError;

/// Fire-and-forget notification sink.
pub trait Notifier: Send + Sync {
    /// Queue `message` for delivery. Never blocks on the network and never fails.
    fn notify(&self, message: String);
}
