//! Service layer for mailtriage
//!
//! Centralizes business logic between the HTTP handlers and the email store.

#![allow(clippy::missing_errors_doc, reason = "Errors are self-explanatory from Result types")]
#![allow(missing_debug_implementations, reason = "Internal types")]

mod email_service;
mod error;

pub use email_service::EmailService;
pub use error::ServiceError;
