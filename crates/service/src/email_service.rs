use std::sync::Arc;

use mailtriage_core::{Email, EmailType, ListParams, MAX_BATCH_IDS, NewEmail, ValidationError};
use mailtriage_notify::{Notifier, format_ingest_message};
use mailtriage_storage::{EmailStore, StorageBackend, StorageError};

use crate::ServiceError;

pub struct EmailService {
    storage: Arc<StorageBackend>,
    notifier: Option<Arc<dyn Notifier>>,
}

impl EmailService {
    #[must_use]
    pub fn new(storage: Arc<StorageBackend>, notifier: Option<Arc<dyn Notifier>>) -> Self {
        Self { storage, notifier }
    }

    /// One page plus the filtered total, queried concurrently.
    pub async fn list(&self, params: &ListParams) -> Result<(Vec<Email>, u64), ServiceError> {
        let (emails, total) =
            tokio::try_join!(self.storage.list(params), self.storage.count(params))?;
        Ok((emails, total))
    }

    pub async fn set_read_status(&self, id: i64, is_read: bool) -> Result<(), ServiceError> {
        if !self.storage.set_read_status(id, is_read).await? {
            return Err(StorageError::email_not_found(id).into());
        }
        tracing::debug!(id, is_read, "email read status updated");
        Ok(())
    }

    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        if !self.storage.delete(id).await? {
            return Err(StorageError::email_not_found(id).into());
        }
        tracing::info!(id, "email deleted");
        Ok(())
    }

    /// Deletes every existing id; unknown ids are skipped, not an error.
    pub async fn batch_delete(&self, ids: &[i64]) -> Result<u64, ServiceError> {
        if ids.is_empty() {
            return Err(ValidationError::EmptyIdList.into());
        }
        if ids.len() > MAX_BATCH_IDS {
            return Err(ValidationError::TooManyIds.into());
        }
        if ids.iter().any(|id| *id < 1) {
            return Err(ValidationError::InvalidEmailId.into());
        }
        let deleted = self.storage.batch_delete(ids).await?;
        tracing::info!(requested = ids.len(), deleted, "batch delete");
        Ok(deleted)
    }

    pub async fn update_result(
        &self,
        id: i64,
        email_result: Option<String>,
        email_type: EmailType,
    ) -> Result<(), ServiceError> {
        let email_result = email_result.map(|r| r.trim().to_owned()).filter(|r| !r.is_empty());
        if email_result.is_none() && email_type != EmailType::None {
            return Err(ValidationError::MissingResult.into());
        }
        if !self.storage.update_result(id, email_result.as_deref(), email_type).await? {
            return Err(StorageError::email_not_found(id).into());
        }
        Ok(())
    }

    pub async fn recipients(&self) -> Result<Vec<String>, ServiceError> {
        Ok(self.storage.recipients().await?)
    }

    /// Stores a new message and, if it carries a result, notifies.
    pub async fn ingest(&self, email: NewEmail) -> Result<Email, ServiceError> {
        let stored = self.storage.insert(email).await?;
        tracing::info!(id = stored.id, email_type = %stored.email_type, "email ingested");
        if let Some(notifier) = &self.notifier {
            if stored.actionable_result().is_some() {
                notifier.notify(format_ingest_message(&stored));
            }
        }
        Ok(stored)
    }
}
