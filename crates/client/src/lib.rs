//! Client-side cache for the mailtriage dashboard.
//!
//! Keeps filter-scoped, infinitely scrollable views of the remote email
//! collection consistent across page loads, background refreshes and
//! optimistic user mutations.

#![allow(missing_docs, reason = "Internal crate with self-explanatory API")]
#![allow(unreachable_pub, reason = "pub items are re-exported")]
#![allow(clippy::significant_drop_tightening, reason = "Lock scopes are explicit blocks")]

pub mod cache;
mod config;
pub mod error;
pub mod fetcher;
pub mod mutation;
pub mod recipients;
pub mod refresh;

#[cfg(test)]
mod fetcher_tests;
#[cfg(test)]
mod testing;

use std::sync::Arc;

pub use cache::{CacheEvent, EntrySnapshot, Page, PageOutcome, PaginatedCache, Scope, Subscription};
pub use config::ClientConfig;
pub use error::{FetchError, MutationError, RemoteError};
pub use fetcher::{EmailRemote, FetchedPage, HttpEmailApi, PageFetcher};
pub use mutation::{MutationCoordinator, MutationIntent, MutationState, PendingMutation};
pub use recipients::RecipientDirectory;
pub use refresh::{RefreshConfig, RefreshHandle, RefreshReport, RefreshScheduler, RefreshTrigger};

/// Everything a dashboard view needs, wired to one API base URL.
pub struct TriageClient {
    cache: Arc<PaginatedCache>,
    mutations: MutationCoordinator,
    recipients: RecipientDirectory,
    refresh: RefreshConfig,
}

impl TriageClient {
    pub fn connect(config: ClientConfig) -> Result<Self, RemoteError> {
        let api = Arc::new(HttpEmailApi::new(config.base_url.clone(), config.fetch_timeout)?);
        tracing::info!(base_url = %config.base_url, page_size = config.page_size, "client configured");
        Ok(Self::with_backend(api.clone(), api, &config))
    }

    /// Wires the client over arbitrary fetcher and remote implementations.
    #[must_use]
    pub fn with_backend(
        fetcher: Arc<dyn PageFetcher>,
        remote: Arc<dyn EmailRemote>,
        config: &ClientConfig,
    ) -> Self {
        let cache = Arc::new(PaginatedCache::new(fetcher, config.page_size, config.fetch_timeout));
        Self {
            mutations: MutationCoordinator::new(Arc::clone(&cache), Arc::clone(&remote)),
            recipients: RecipientDirectory::new(remote),
            cache,
            refresh: config.refresh.clone(),
        }
    }

    #[must_use]
    pub const fn cache(&self) -> &Arc<PaginatedCache> {
        &self.cache
    }

    #[must_use]
    pub const fn mutations(&self) -> &MutationCoordinator {
        &self.mutations
    }

    #[must_use]
    pub const fn recipients(&self) -> &RecipientDirectory {
        &self.recipients
    }

    /// Starts background revalidation for this client's cache.
    #[must_use]
    pub fn start_refresh(&self) -> RefreshHandle {
        RefreshScheduler::new(Arc::clone(&self.cache), self.refresh.clone()).spawn()
    }
}
