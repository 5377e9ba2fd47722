//! Unified storage backend with enum dispatch.

use async_trait::async_trait;
use mailtriage_core::{Email, EmailType, ListParams, NewEmail};

use crate::error::StorageError;
use crate::memory::InMemoryStore;
use crate::traits::EmailStore;

macro_rules! dispatch {
    ($self:expr, $method:ident ( $($arg:expr),* $(,)? )) => {
        match $self {
            StorageBackend::Memory(s) => <InMemoryStore as EmailStore>::$method(s, $($arg),*).await,
            #[cfg(feature = "postgres")]
            StorageBackend::Postgres(s) => <crate::pg_storage::PgStorage as EmailStore>::$method(s, $($arg),*).await,
        }
    };
}

#[derive(Clone, Debug)]
pub enum StorageBackend {
    Memory(InMemoryStore),
    #[cfg(feature = "postgres")]
    Postgres(crate::pg_storage::PgStorage),
}

impl StorageBackend {
    #[must_use]
    pub fn new_memory() -> Self {
        Self::Memory(InMemoryStore::new())
    }

    #[cfg(feature = "postgres")]
    pub async fn new_postgres(database_url: &str) -> Result<Self, StorageError> {
        Ok(Self::Postgres(crate::pg_storage::PgStorage::new(database_url).await?))
    }

    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Memory(_) => "memory",
            #[cfg(feature = "postgres")]
            Self::Postgres(_) => "postgres",
        }
    }
}

impl From<InMemoryStore> for StorageBackend {
    fn from(store: InMemoryStore) -> Self {
        Self::Memory(store)
    }
}

#[async_trait]
impl EmailStore for StorageBackend {
    async fn list(&self, params: &ListParams) -> Result<Vec<Email>, StorageError> {
        dispatch!(self, list(params))
    }

    async fn count(&self, params: &ListParams) -> Result<u64, StorageError> {
        dispatch!(self, count(params))
    }

    async fn set_read_status(&self, id: i64, is_read: bool) -> Result<bool, StorageError> {
        dispatch!(self, set_read_status(id, is_read))
    }

    async fn delete(&self, id: i64) -> Result<bool, StorageError> {
        dispatch!(self, delete(id))
    }

    async fn batch_delete(&self, ids: &[i64]) -> Result<u64, StorageError> {
        dispatch!(self, batch_delete(ids))
    }

    async fn update_result(
        &self,
        id: i64,
        email_result: Option<&str>,
        email_type: EmailType,
    ) -> Result<bool, StorageError> {
        dispatch!(self, update_result(id, email_result, email_type))
    }

    async fn recipients(&self) -> Result<Vec<String>, StorageError> {
        dispatch!(self, recipients())
    }

    async fn insert(&self, email: NewEmail) -> Result<Email, StorageError> {
        dispatch!(self, insert(email))
    }
}
