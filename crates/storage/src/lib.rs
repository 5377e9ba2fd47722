//! Storage layer for mailtriage
//!
//! The persistent email store behind the HTTP API. An in-memory backend is
//! always available; PostgreSQL is enabled with the `postgres` feature.

mod backend;
mod error;
mod memory;
#[cfg(feature = "postgres")]
mod pg_migrations;
#[cfg(feature = "postgres")]
mod pg_storage;
pub mod traits;

pub use backend::StorageBackend;
pub use error::StorageError;
pub use memory::InMemoryStore;
#[cfg(feature = "postgres")]
pub use pg_storage::PgStorage;
pub use traits::EmailStore;
