//! In-memory email store.
//!
//! Backs the server when no database is configured, and every test that
//! needs a store.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;
use mailtriage_core::{Email, EmailType, ListParams, NewEmail};
use tokio::sync::RwLock;

use crate::error::StorageError;
use crate::traits::EmailStore;

#[derive(Debug, Default)]
struct MemoryState {
    emails: BTreeMap<i64, Email>,
    next_id: i64,
}

#[derive(Clone, Debug, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with already-identified emails.
    #[must_use]
    pub fn with_emails(emails: impl IntoIterator<Item = Email>) -> Self {
        let emails: BTreeMap<i64, Email> = emails.into_iter().map(|e| (e.id, e)).collect();
        let next_id = emails.keys().next_back().copied().unwrap_or(0);
        Self { state: Arc::new(RwLock::new(MemoryState { emails, next_id })) }
    }

    fn matching<'a>(state: &'a MemoryState, params: &ListParams) -> Vec<&'a Email> {
        let mut found: Vec<&Email> = state.emails.values().filter(|e| params.matches(e)).collect();
        found.sort_by_key(|e| (Reverse(e.sent_at), Reverse(e.id)));
        found
    }
}

#[async_trait]
impl EmailStore for InMemoryStore {
    async fn list(&self, params: &ListParams) -> Result<Vec<Email>, StorageError> {
        let state = self.state.read().await;
        let offset = usize::try_from(params.offset).unwrap_or(usize::MAX);
        let limit = usize::try_from(params.limit).unwrap_or(usize::MAX);
        Ok(Self::matching(&state, params).into_iter().skip(offset).take(limit).cloned().collect())
    }

    async fn count(&self, params: &ListParams) -> Result<u64, StorageError> {
        let state = self.state.read().await;
        Ok(Self::matching(&state, params).len() as u64)
    }

    async fn set_read_status(&self, id: i64, is_read: bool) -> Result<bool, StorageError> {
        let mut state = self.state.write().await;
        Ok(state.emails.get_mut(&id).map(|email| *email = email.with_read_status(is_read)).is_some())
    }

    async fn delete(&self, id: i64) -> Result<bool, StorageError> {
        Ok(self.state.write().await.emails.remove(&id).is_some())
    }

    async fn batch_delete(&self, ids: &[i64]) -> Result<u64, StorageError> {
        let mut state = self.state.write().await;
        Ok(ids.iter().filter(|id| state.emails.remove(*id).is_some()).count() as u64)
    }

    async fn update_result(
        &self,
        id: i64,
        email_result: Option<&str>,
        email_type: EmailType,
    ) -> Result<bool, StorageError> {
        let mut state = self.state.write().await;
        let Some(email) = state.emails.get_mut(&id) else {
            return Ok(false);
        };
        *email = email.with_result(email_result.map(ToOwned::to_owned), email_type);
        Ok(true)
    }

    async fn recipients(&self) -> Result<Vec<String>, StorageError> {
        let state = self.state.read().await;
        let distinct: BTreeSet<&str> = state.emails.values().map(|e| e.to_address.as_str()).collect();
        Ok(distinct.into_iter().map(ToOwned::to_owned).collect())
    }

    async fn insert(&self, email: NewEmail) -> Result<Email, StorageError> {
        let mut state = self.state.write().await;
        state.next_id = state.next_id.saturating_add(1);
        let stored = email.into_email(state.next_id);
        state.emails.insert(stored.id, stored.clone());
        Ok(stored)
    }
}
