//! Filter-scoped page cache.
//!
//! Every entry lives in one map behind a single lock, so a patch becomes
//! visible in all entries at once. The lock is never held across a fetch.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use mailtriage_core::{Email, FilterSet, Signature};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::time::Instant;

use crate::error::FetchError;
use crate::fetcher::{FetchedPage, PageFetcher};

const EVENT_CAPACITY: usize = 256;

/// A contiguous run of items as one fetch returned them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub items: Vec<Email>,
    pub start_offset: u64,
    pub count: u64,
}

#[derive(Debug, Default)]
struct CacheEntry {
    pages: Vec<Page>,
    /// Unknown until the first fetch lands.
    total: Option<u64>,
    /// Token of the fetch currently allowed to write into this entry.
    in_flight: Option<u64>,
    fetched_at: Option<Instant>,
}

impl CacheEntry {
    fn loaded_count(&self) -> u64 {
        self.pages.iter().map(|p| p.count).sum()
    }

    fn has_next_page(&self) -> bool {
        self.total.is_none_or(|total| self.loaded_count() < total)
    }

    fn contains(&self, id: i64) -> bool {
        self.pages.iter().flat_map(|p| &p.items).any(|e| e.id == id)
    }

    fn reset(&mut self) {
        self.pages.clear();
        self.total = None;
        self.in_flight = None;
        self.fetched_at = None;
    }

    /// Appends `page` at `offset`; returns the number of items added.
    fn append(&mut self, offset: u64, page: FetchedPage) -> u64 {
        debug_assert_eq!(offset, self.loaded_count());
        let count = page.items.len() as u64;
        let mut total = page.total;
        if count == 0 && total > offset {
            tracing::warn!(offset, total, "empty page before reported end, treating as exhausted");
            total = offset;
        }
        self.total = Some(total);
        if count > 0 {
            self.pages.push(Page { items: page.items, start_offset: offset, count });
        }
        self.fetched_at = Some(Instant::now());
        count
    }

    fn refresh_first_page(&mut self, page: FetchedPage) -> RevalidateOutcome {
        let unchanged = match self.pages.first() {
            Some(first) => first.items == page.items,
            None => page.items.is_empty() && self.total.is_some(),
        };
        if unchanged {
            self.total = Some(page.total);
            self.fetched_at = Some(Instant::now());
            return RevalidateOutcome::Unchanged;
        }
        self.pages.clear();
        self.total = None;
        self.append(0, page);
        RevalidateOutcome::Rebuilt
    }
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<Signature, CacheEntry>,
    /// Ids removed optimistically; filtered out of every snapshot.
    hidden: HashSet<i64>,
    active: Option<Signature>,
    observers: HashMap<Signature, usize>,
    next_token: u64,
}

/// Change notification delivered to subscribers of a signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEvent {
    PageAppended { signature: Signature, start_offset: u64, count: u64 },
    Patched { signature: Signature },
    Invalidated { signature: Signature },
    Refreshed { signature: Signature, rebuilt: bool },
    FetchFailed { signature: Signature, message: String },
}

impl CacheEvent {
    #[must_use]
    pub const fn signature(&self) -> &Signature {
        match self {
            Self::PageAppended { signature, .. }
            | Self::Patched { signature }
            | Self::Invalidated { signature }
            | Self::Refreshed { signature, .. }
            | Self::FetchFailed { signature, .. } => signature,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    InFlight,
    Exhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOutcome {
    Appended { start_offset: u64, count: u64 },
    Skipped(SkipReason),
    /// The response arrived after the request was cancelled or superseded.
    Discarded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevalidateOutcome {
    /// First page matched; only total and timestamp were refreshed.
    Unchanged,
    /// Entry rebuilt from offset 0.
    Rebuilt,
    /// Another fetch for the signature was in flight.
    Skipped,
    Discarded,
}

#[derive(Debug, Clone, Copy)]
pub enum Scope<'a> {
    Signature(&'a Signature),
    All,
}

/// Read-only view of one entry, with optimistically deleted items removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntrySnapshot {
    pub items: Vec<Email>,
    pub loaded_count: u64,
    pub total: Option<u64>,
    pub has_next_page: bool,
    pub fetching: bool,
}

/// Clears the in-flight marker if the fetch future is dropped before it
/// completes.
struct InFlightGuard<'a> {
    cache: &'a PaginatedCache,
    signature: &'a Signature,
    token: u64,
    armed: bool,
}

impl InFlightGuard<'_> {
    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut state = self.cache.write();
        if let Some(entry) = state.entries.get_mut(self.signature) {
            if entry.in_flight == Some(self.token) {
                entry.in_flight = None;
                tracing::debug!(signature = %self.signature, "abandoned fetch released");
            }
        }
    }
}

pub struct PaginatedCache {
    state: RwLock<CacheState>,
    fetcher: Arc<dyn PageFetcher>,
    page_size: u32,
    fetch_timeout: Duration,
    events: broadcast::Sender<CacheEvent>,
}

impl PaginatedCache {
    #[must_use]
    pub fn new(fetcher: Arc<dyn PageFetcher>, page_size: u32, fetch_timeout: Duration) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            state: RwLock::new(CacheState::default()),
            fetcher,
            page_size: page_size.max(1),
            fetch_timeout,
            events,
        }
    }

    #[must_use]
    pub const fn page_size(&self) -> u32 {
        self.page_size
    }

    fn read(&self) -> RwLockReadGuard<'_, CacheState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, CacheState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: CacheEvent) {
        // No receivers is fine.
        let _ = self.events.send(event);
    }

    /// Ensures an entry exists for `signature`.
    pub fn get_or_create_entry(&self, signature: &Signature) {
        self.write().entries.entry(signature.clone()).or_default();
    }

    /// Declares the signature the user is looking at. A fetch still running
    /// for the previously active signature is cancelled.
    pub fn set_active(&self, filters: &FilterSet) -> Signature {
        let signature = filters.signature();
        let mut state = self.write();
        let previous = state.active.replace(signature.clone());
        if let Some(previous) = previous.filter(|p| *p != signature) {
            if let Some(entry) = state.entries.get_mut(&previous) {
                if entry.in_flight.take().is_some() {
                    tracing::debug!(signature = %previous, "cancelled fetch for inactive view");
                }
            }
        }
        state.entries.entry(signature.clone()).or_default();
        signature
    }

    #[must_use]
    pub fn active(&self) -> Option<Signature> {
        self.read().active.clone()
    }

    /// Abandons the in-flight fetch for `signature`; its result will be
    /// discarded. Returns whether anything was cancelled.
    pub fn cancel(&self, signature: &Signature) -> bool {
        self.write()
            .entries
            .get_mut(signature)
            .and_then(|entry| entry.in_flight.take())
            .is_some()
    }

    /// Unknown totals count as "more to load".
    #[must_use]
    pub fn has_next_page(&self, signature: &Signature) -> bool {
        self.read().entries.get(signature).is_none_or(CacheEntry::has_next_page)
    }

    fn begin_fetch(
        &self,
        signature: &Signature,
        require_next: bool,
    ) -> Result<(u64, u64), SkipReason> {
        let mut state = self.write();
        state.next_token += 1;
        let token = state.next_token;
        let entry = state.entries.entry(signature.clone()).or_default();
        if entry.in_flight.is_some() {
            return Err(SkipReason::InFlight);
        }
        if require_next && !entry.has_next_page() {
            return Err(SkipReason::Exhausted);
        }
        entry.in_flight = Some(token);
        Ok((token, entry.loaded_count()))
    }

    async fn fetch_bounded(
        &self,
        signature: &Signature,
        offset: u64,
    ) -> Result<FetchedPage, FetchError> {
        tokio::time::timeout(self.fetch_timeout, self.fetcher.fetch(signature, offset, self.page_size))
            .await
            .map_err(|_| FetchError::Timeout(self.fetch_timeout))?
    }

    /// Fetches the page after everything loaded so far.
    ///
    /// A no-op while another fetch for the signature is running or once the
    /// collection is exhausted. Failures leave the loaded pages untouched.
    pub async fn request_next_page(&self, signature: &Signature) -> Result<PageOutcome, FetchError> {
        let (token, offset) = match self.begin_fetch(signature, true) {
            Ok(started) => started,
            Err(reason) => {
                tracing::debug!(%signature, ?reason, "next page request skipped");
                return Ok(PageOutcome::Skipped(reason));
            },
        };
        let mut guard = InFlightGuard { cache: self, signature, token, armed: true };
        let result = self.fetch_bounded(signature, offset).await;
        guard.disarm();

        let appended = {
            let mut state = self.write();
            let Some(entry) =
                state.entries.get_mut(signature).filter(|e| e.in_flight == Some(token))
            else {
                tracing::debug!(%signature, offset, "discarding stale page response");
                return Ok(PageOutcome::Discarded);
            };
            entry.in_flight = None;
            result.map(|page| entry.append(offset, page))
        };

        match appended {
            Ok(count) => {
                tracing::debug!(%signature, offset, count, "page appended");
                self.emit(CacheEvent::PageAppended {
                    signature: signature.clone(),
                    start_offset: offset,
                    count,
                });
                Ok(PageOutcome::Appended { start_offset: offset, count })
            },
            Err(err) => {
                tracing::warn!(%signature, offset, error = %err, "page fetch failed");
                self.emit(CacheEvent::FetchFailed {
                    signature: signature.clone(),
                    message: err.to_string(),
                });
                Err(err)
            },
        }
    }

    /// Refetches the first page. An identical first page only refreshes the
    /// total; anything else rebuilds the entry from offset 0.
    pub async fn revalidate(&self, signature: &Signature) -> Result<RevalidateOutcome, FetchError> {
        let Ok((token, _)) = self.begin_fetch(signature, false) else {
            return Ok(RevalidateOutcome::Skipped);
        };
        let mut guard = InFlightGuard { cache: self, signature, token, armed: true };
        let result = self.fetch_bounded(signature, 0).await;
        guard.disarm();

        let refreshed = {
            let mut state = self.write();
            let Some(entry) =
                state.entries.get_mut(signature).filter(|e| e.in_flight == Some(token))
            else {
                tracing::debug!(%signature, "discarding stale revalidation");
                return Ok(RevalidateOutcome::Discarded);
            };
            entry.in_flight = None;
            result.map(|page| entry.refresh_first_page(page))
        };

        match refreshed {
            Ok(outcome) => {
                let rebuilt = outcome == RevalidateOutcome::Rebuilt;
                tracing::debug!(%signature, rebuilt, "entry revalidated");
                self.emit(CacheEvent::Refreshed { signature: signature.clone(), rebuilt });
                Ok(outcome)
            },
            Err(err) => {
                tracing::warn!(%signature, error = %err, "revalidation failed");
                self.emit(CacheEvent::FetchFailed {
                    signature: signature.clone(),
                    message: err.to_string(),
                });
                Err(err)
            },
        }
    }

    /// Replaces every cached item matching `matcher` with `patch(item)`,
    /// across all entries under one write lock. Returns the number of
    /// copies that changed; unchanged entries emit no event.
    pub fn apply_patch<M, P>(&self, matcher: M, patch: P) -> usize
    where
        M: Fn(&Email) -> bool,
        P: Fn(&Email) -> Email,
    {
        let mut replaced = 0;
        let mut touched = Vec::new();
        {
            let mut state = self.write();
            for (signature, entry) in &mut state.entries {
                let before = replaced;
                for item in entry.pages.iter_mut().flat_map(|p| p.items.iter_mut()) {
                    if matcher(item) {
                        let patched = patch(item);
                        if patched != *item {
                            *item = patched;
                            replaced += 1;
                        }
                    }
                }
                if replaced > before {
                    touched.push(signature.clone());
                }
            }
        }
        for signature in touched {
            self.emit(CacheEvent::Patched { signature });
        }
        replaced
    }

    /// Discards pages and totals; the next request starts at offset 0.
    /// In-flight fetches for the cleared entries are abandoned.
    pub fn invalidate(&self, scope: Scope<'_>) {
        let mut cleared = Vec::new();
        {
            let mut state = self.write();
            match scope {
                Scope::Signature(signature) => {
                    if let Some(entry) = state.entries.get_mut(signature) {
                        entry.reset();
                        cleared.push(signature.clone());
                    }
                },
                Scope::All => {
                    for (signature, entry) in &mut state.entries {
                        entry.reset();
                        cleared.push(signature.clone());
                    }
                },
            }
        }
        tracing::debug!(entries = cleared.len(), "cache invalidated");
        for signature in cleared {
            self.emit(CacheEvent::Invalidated { signature });
        }
    }

    /// Hides ids from every snapshot without touching page offsets.
    pub fn hide(&self, ids: &[i64]) {
        self.set_hidden(ids, true);
    }

    pub fn unhide(&self, ids: &[i64]) {
        self.set_hidden(ids, false);
    }

    fn set_hidden(&self, ids: &[i64], hidden: bool) {
        let touched: Vec<Signature> = {
            let mut state = self.write();
            for id in ids {
                if hidden {
                    state.hidden.insert(*id);
                } else {
                    state.hidden.remove(id);
                }
            }
            state
                .entries
                .iter()
                .filter(|(_, entry)| ids.iter().any(|id| entry.contains(*id)))
                .map(|(signature, _)| signature.clone())
                .collect()
        };
        for signature in touched {
            self.emit(CacheEvent::Patched { signature });
        }
    }

    #[must_use]
    pub fn snapshot(&self, signature: &Signature) -> Option<EntrySnapshot> {
        let state = self.read();
        let entry = state.entries.get(signature)?;
        let items = entry
            .pages
            .iter()
            .flat_map(|p| &p.items)
            .filter(|e| !state.hidden.contains(&e.id))
            .cloned()
            .collect();
        Some(EntrySnapshot {
            items,
            loaded_count: entry.loaded_count(),
            total: entry.total,
            has_next_page: entry.has_next_page(),
            fetching: entry.in_flight.is_some(),
        })
    }

    #[must_use]
    pub fn pages(&self, signature: &Signature) -> Vec<Page> {
        self.read().entries.get(signature).map(|e| e.pages.clone()).unwrap_or_default()
    }

    /// First cached copy of `id`, hidden or not.
    #[must_use]
    pub fn find_item(&self, id: i64) -> Option<Email> {
        self.read()
            .entries
            .values()
            .flat_map(|entry| entry.pages.iter().flat_map(|p| &p.items))
            .find(|e| e.id == id)
            .cloned()
    }

    /// Whether the entry was never fetched or was fetched at least
    /// `stale_after` ago.
    #[must_use]
    pub fn is_stale(&self, signature: &Signature, stale_after: Duration) -> bool {
        self.read()
            .entries
            .get(signature)
            .and_then(|entry| entry.fetched_at)
            .is_none_or(|at| at.elapsed() >= stale_after)
    }

    /// Signatures with at least one observer, plus the active one.
    #[must_use]
    pub fn watched_signatures(&self) -> Vec<Signature> {
        let state = self.read();
        let mut watched: Vec<Signature> = state.observers.keys().cloned().collect();
        if let Some(active) = &state.active {
            if !state.observers.contains_key(active) {
                watched.push(active.clone());
            }
        }
        watched.sort_by_cached_key(Signature::key);
        watched
    }

    pub fn subscribe(self: &Arc<Self>, signature: &Signature) -> Subscription {
        {
            let mut state = self.write();
            *state.observers.entry(signature.clone()).or_insert(0) += 1;
            state.entries.entry(signature.clone()).or_default();
        }
        Subscription {
            cache: Arc::clone(self),
            signature: signature.clone(),
            events: self.events.subscribe(),
        }
    }

    fn release(&self, signature: &Signature) {
        let mut state = self.write();
        if let Some(count) = state.observers.get_mut(signature) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                state.observers.remove(signature);
            }
        }
    }

    /// Drops entries that nobody observes and that are not active.
    /// Returns how many were evicted.
    pub fn evict_unobserved(&self) -> usize {
        let mut state = self.write();
        let CacheState { entries, observers, active, .. } = &mut *state;
        let before = entries.len();
        entries.retain(|signature, _| {
            observers.contains_key(signature) || active.as_ref() == Some(signature)
        });
        let evicted = before - entries.len();
        if evicted > 0 {
            tracing::debug!(evicted, "evicted unobserved entries");
        }
        evicted
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.read().entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A view's registration for one signature. Dropping it releases the
/// registration.
pub struct Subscription {
    cache: Arc<PaginatedCache>,
    signature: Signature,
    events: broadcast::Receiver<CacheEvent>,
}

impl Subscription {
    #[must_use]
    pub const fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Next event for this subscription's signature.
    pub async fn next_event(&mut self) -> Option<CacheEvent> {
        loop {
            match self.events.recv().await {
                Ok(event) if *event.signature() == self.signature => return Some(event),
                Ok(_) => {},
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(signature = %self.signature, skipped, "subscriber lagged");
                },
                Err(RecvError::Closed) => return None,
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cache.release(&self.signature);
    }
}
