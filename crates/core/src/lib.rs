//! Core types and validation rules for mailtriage
//!
//! This crate contains domain types shared by the server, the storage layer
//! and the client cache.

mod constants;
mod email;
mod env_config;
mod envelope;
mod error;
mod filter;
mod list_params;

pub use constants::*;
pub use email::*;
pub use env_config::{env_non_empty, env_parse_with_default};
pub use envelope::*;
pub use error::*;
pub use filter::*;
pub use list_params::*;
