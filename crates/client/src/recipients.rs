//! Cached list of distinct recipients for the filter picker.

use std::sync::Arc;
use std::time::Duration;

use mailtriage_core::RECIPIENTS_STALE_SECS;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::error::RemoteError;
use crate::fetcher::EmailRemote;

pub struct RecipientDirectory {
    remote: Arc<dyn EmailRemote>,
    ttl: Duration,
    cached: Mutex<Option<(Instant, Vec<String>)>>,
}

impl RecipientDirectory {
    #[must_use]
    pub fn new(remote: Arc<dyn EmailRemote>) -> Self {
        Self::with_ttl(remote, Duration::from_secs(RECIPIENTS_STALE_SECS))
    }

    #[must_use]
    pub fn with_ttl(remote: Arc<dyn EmailRemote>, ttl: Duration) -> Self {
        Self { remote, ttl, cached: Mutex::new(None) }
    }

    /// Cached recipients, refetched once older than the TTL. Concurrent
    /// callers share one fetch. A failed refetch keeps the old list.
    pub async fn get(&self) -> Result<Vec<String>, RemoteError> {
        let mut cached = self.cached.lock().await;
        if let Some((fetched_at, recipients)) = cached.as_ref() {
            if fetched_at.elapsed() < self.ttl {
                return Ok(recipients.clone());
            }
        }
        let recipients = self.remote.recipients().await?;
        tracing::debug!(count = recipients.len(), "recipient directory refreshed");
        *cached = Some((Instant::now(), recipients.clone()));
        Ok(recipients)
    }

    pub async fn invalidate(&self) {
        *self.cached.lock().await = None;
    }
}
