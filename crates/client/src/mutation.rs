//! User mutations: patch the cache now, confirm with the server, then
//! settle.
//!
//! | kind   | optimistic            | confirmed        | failed               |
//! |--------|-----------------------|------------------|----------------------|
//! | mark   | read status patched   | kept             | kept                 |
//! | delete | ids hidden            | all invalidated  | ids shown again      |
//! | update | result/type patched   | all invalidated  | result/type restored |

use std::sync::Arc;

use mailtriage_core::{EmailType, MAX_BATCH_IDS, ValidationError};

use crate::cache::{PaginatedCache, Scope};
use crate::error::MutationError;
use crate::fetcher::EmailRemote;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationIntent {
    Mark { id: i64, is_read: bool },
    Delete { id: i64 },
    BatchDelete { ids: Vec<i64> },
    UpdateResult { id: i64, email_result: Option<String>, email_type: EmailType },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Mark,
    Delete,
    UpdateResult,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MutationState {
    #[default]
    Idle,
    OptimisticallyApplied,
    Confirmed,
    Failed,
}

impl MutationIntent {
    #[must_use]
    pub fn ids(&self) -> Vec<i64> {
        match self {
            Self::Mark { id, .. } | Self::Delete { id } | Self::UpdateResult { id, .. } => vec![*id],
            Self::BatchDelete { ids } => ids.clone(),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> MutationKind {
        match self {
            Self::Mark { .. } => MutationKind::Mark,
            Self::Delete { .. } | Self::BatchDelete { .. } => MutationKind::Delete,
            Self::UpdateResult { .. } => MutationKind::UpdateResult,
        }
    }

    /// Rejects malformed input; trims the update result.
    fn validate(self) -> Result<Self, ValidationError> {
        if let Self::BatchDelete { ids } = &self {
            if ids.is_empty() {
                return Err(ValidationError::EmptyIdList);
            }
            if ids.len() > MAX_BATCH_IDS {
                return Err(ValidationError::TooManyIds);
            }
        }
        if self.ids().iter().any(|id| *id < 1) {
            return Err(ValidationError::InvalidEmailId);
        }
        match self {
            Self::UpdateResult { id, email_result, email_type } => {
                let email_result =
                    email_result.map(|r| r.trim().to_owned()).filter(|r| !r.is_empty());
                if email_result.is_none() && email_type != EmailType::None {
                    return Err(ValidationError::MissingResult);
                }
                Ok(Self::UpdateResult { id, email_result, email_type })
            },
            other => Ok(other),
        }
    }
}

#[derive(Debug)]
enum Rollback {
    Keep,
    Unhide(Vec<i64>),
    /// Previous `(email_result, email_type)` of the updated item, if cached.
    Restore { id: i64, previous: Option<(Option<String>, EmailType)> },
}

/// A mutation whose optimistic patch is already in the cache.
pub struct PendingMutation {
    cache: Arc<PaginatedCache>,
    remote: Arc<dyn EmailRemote>,
    intent: MutationIntent,
    rollback: Rollback,
    state: MutationState,
}

impl PendingMutation {
    #[must_use]
    pub const fn state(&self) -> MutationState {
        self.state
    }

    #[must_use]
    pub const fn intent(&self) -> &MutationIntent {
        &self.intent
    }

    async fn call_remote(&self) -> Result<u64, MutationError> {
        match &self.intent {
            MutationIntent::Mark { id, is_read } => self.remote.mark(*id, *is_read).await?,
            MutationIntent::Delete { id } => self.remote.delete(*id).await?,
            MutationIntent::BatchDelete { ids } => return Ok(self.remote.batch_delete(ids).await?),
            MutationIntent::UpdateResult { id, email_result, email_type } => {
                self.remote.update_result(*id, email_result.as_deref(), *email_type).await?;
            },
        }
        Ok(1)
    }

    /// Sends the confirming call and settles the cache. Returns how many
    /// items the server reports as affected.
    pub async fn reconcile(&mut self) -> Result<u64, MutationError> {
        if self.state != MutationState::OptimisticallyApplied {
            return Err(MutationError::AlreadySettled);
        }
        let kind = self.intent.kind();
        match self.call_remote().await {
            Ok(affected) => {
                self.state = MutationState::Confirmed;
                if kind != MutationKind::Mark {
                    self.cache.invalidate(Scope::All);
                    if let Rollback::Unhide(ids) = &self.rollback {
                        self.cache.unhide(ids);
                    }
                }
                tracing::debug!(?kind, affected, "mutation confirmed");
                Ok(affected)
            },
            Err(err) => {
                self.state = MutationState::Failed;
                match &self.rollback {
                    Rollback::Keep => {},
                    Rollback::Unhide(ids) => self.cache.unhide(ids),
                    Rollback::Restore { id, previous: Some((email_result, email_type)) } => {
                        self.cache.apply_patch(
                            |e| e.id == *id,
                            |e| e.with_result(email_result.clone(), *email_type),
                        );
                    },
                    Rollback::Restore { previous: None, .. } => {},
                }
                tracing::warn!(?kind, ids = ?self.intent.ids(), error = %err, "mutation failed");
                Err(err)
            },
        }
    }
}

pub struct MutationCoordinator {
    cache: Arc<PaginatedCache>,
    remote: Arc<dyn EmailRemote>,
}

impl MutationCoordinator {
    #[must_use]
    pub fn new(cache: Arc<PaginatedCache>, remote: Arc<dyn EmailRemote>) -> Self {
        Self { cache, remote }
    }

    /// Validates `intent` and applies its optimistic patch synchronously.
    pub fn begin(&self, intent: MutationIntent) -> Result<PendingMutation, MutationError> {
        let intent = intent.validate()?;
        for id in intent.ids() {
            if self.cache.find_item(id).is_none() {
                tracing::info!(id, "mutating email that is not cached");
            }
        }

        let rollback = match &intent {
            MutationIntent::Mark { id, is_read } => {
                self.cache.apply_patch(|e| e.id == *id, |e| e.with_read_status(*is_read));
                Rollback::Keep
            },
            MutationIntent::Delete { id } => {
                self.cache.hide(&[*id]);
                Rollback::Unhide(vec![*id])
            },
            MutationIntent::BatchDelete { ids } => {
                self.cache.hide(ids);
                Rollback::Unhide(ids.clone())
            },
            MutationIntent::UpdateResult { id, email_result, email_type } => {
                let previous =
                    self.cache.find_item(*id).map(|e| (e.email_result, e.email_type));
                self.cache.apply_patch(
                    |e| e.id == *id,
                    |e| e.with_result(email_result.clone(), *email_type),
                );
                Rollback::Restore { id: *id, previous }
            },
        };

        Ok(PendingMutation {
            cache: Arc::clone(&self.cache),
            remote: Arc::clone(&self.remote),
            intent,
            rollback,
            state: MutationState::OptimisticallyApplied,
        })
    }

    pub async fn execute(&self, intent: MutationIntent) -> Result<u64, MutationError> {
        self.begin(intent)?.reconcile().await
    }

    pub async fn mark(&self, id: i64, is_read: bool) -> Result<(), MutationError> {
        self.execute(MutationIntent::Mark { id, is_read }).await.map(drop)
    }

    /// Marks read only if the cached copy is unread; used when a result is
    /// copied or a link opened. Returns whether a mark was sent.
    pub async fn acknowledge(&self, id: i64) -> Result<bool, MutationError> {
        match self.cache.find_item(id) {
            Some(email) if !email.is_read() => {
                self.mark(id, true).await?;
                Ok(true)
            },
            _ => Ok(false),
        }
    }

    pub async fn delete(&self, id: i64) -> Result<(), MutationError> {
        self.execute(MutationIntent::Delete { id }).await.map(drop)
    }

    pub async fn batch_delete(&self, ids: Vec<i64>) -> Result<u64, MutationError> {
        self.execute(MutationIntent::BatchDelete { ids }).await
    }

    pub async fn update_result(
        &self,
        id: i64,
        email_result: Option<String>,
        email_type: EmailType,
    ) -> Result<(), MutationError> {
        self.execute(MutationIntent::UpdateResult { id, email_result, email_type }).await.map(drop)
    }
}
