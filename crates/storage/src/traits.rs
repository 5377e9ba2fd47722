//! Storage trait abstraction
//!
//! Async operations the service layer needs from the email store.

use async_trait::async_trait;
use mailtriage_core::{Email, EmailType, ListParams, NewEmail};

use crate::error::StorageError;

/// CRUD operations on ingested emails.
#[async_trait]
pub trait EmailStore: Send + Sync {
    /// One page of emails matching `params`, newest first.
    async fn list(&self, params: &ListParams) -> Result<Vec<Email>, StorageError>;

    /// Number of emails matching the filters of `params` (paging ignored).
    async fn count(&self, params: &ListParams) -> Result<u64, StorageError>;

    /// Set read status. Returns `false` if no email has this id.
    async fn set_read_status(&self, id: i64, is_read: bool) -> Result<bool, StorageError>;

    /// Delete one email. Returns `false` if no email has this id.
    async fn delete(&self, id: i64) -> Result<bool, StorageError>;

    /// Delete several emails. Returns the number actually removed.
    async fn batch_delete(&self, ids: &[i64]) -> Result<u64, StorageError>;

    /// Replace the extracted result. Returns `false` if no email has this id.
    async fn update_result(
        &self,
        id: i64,
        email_result: Option<&str>,
        email_type: EmailType,
    ) -> Result<bool, StorageError>;

    /// Every distinct recipient address, sorted.
    async fn recipients(&self) -> Result<Vec<String>, StorageError>;

    /// Store a newly ingested email and return it with its assigned id.
    async fn insert(&self, email: NewEmail) -> Result<Email, StorageError>;
}
