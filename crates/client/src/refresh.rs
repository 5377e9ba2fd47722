//! Silent background revalidation of watched signatures.

use std::sync::Arc;
use std::time::Duration;

use mailtriage_core::{DEFAULT_REFRESH_INTERVAL_MS, DEFAULT_STALE_MS, env_parse_with_default};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Interval, MissedTickBehavior};

use crate::cache::{PaginatedCache, RevalidateOutcome};

const TRIGGER_QUEUE: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshConfig {
    /// `None` disables the periodic trigger.
    pub interval: Option<Duration>,
    pub stale_after: Duration,
    pub refresh_on_focus: bool,
    pub refresh_on_reconnect: bool,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval: interval_from_millis(DEFAULT_REFRESH_INTERVAL_MS),
            stale_after: Duration::from_millis(DEFAULT_STALE_MS),
            refresh_on_focus: true,
            refresh_on_reconnect: true,
        }
    }
}

impl RefreshConfig {
    #[must_use]
    pub fn from_env() -> Self {
        let interval_ms =
            env_parse_with_default("MAILTRIAGE_REFRESH_INTERVAL_MS", DEFAULT_REFRESH_INTERVAL_MS);
        let stale_ms = env_parse_with_default("MAILTRIAGE_STALE_MS", DEFAULT_STALE_MS);
        Self {
            interval: interval_from_millis(interval_ms),
            stale_after: Duration::from_millis(stale_ms),
            ..Self::default()
        }
    }
}

/// Non-positive intervals disable periodic refresh.
#[must_use]
pub fn interval_from_millis(millis: i64) -> Option<Duration> {
    u64::try_from(millis).ok().filter(|ms| *ms > 0).map(Duration::from_millis)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTrigger {
    Interval,
    FocusRegained,
    ConnectivityRegained,
}

/// What one trigger did across the watched signatures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshReport {
    pub unchanged: usize,
    pub rebuilt: usize,
    pub skipped: usize,
    pub failed: usize,
}

pub struct RefreshScheduler {
    cache: Arc<PaginatedCache>,
    config: RefreshConfig,
}

impl RefreshScheduler {
    #[must_use]
    pub fn new(cache: Arc<PaginatedCache>, config: RefreshConfig) -> Self {
        Self { cache, config }
    }

    #[must_use]
    pub const fn config(&self) -> &RefreshConfig {
        &self.config
    }

    /// Revalidates watched signatures for one trigger. Focus and
    /// connectivity triggers only touch entries past the staleness window.
    pub async fn handle_trigger(&self, trigger: RefreshTrigger) -> RefreshReport {
        let mut report = RefreshReport::default();
        let enabled = match trigger {
            RefreshTrigger::Interval => true,
            RefreshTrigger::FocusRegained => self.config.refresh_on_focus,
            RefreshTrigger::ConnectivityRegained => self.config.refresh_on_reconnect,
        };
        if !enabled {
            return report;
        }

        for signature in self.cache.watched_signatures() {
            if trigger != RefreshTrigger::Interval
                && !self.cache.is_stale(&signature, self.config.stale_after)
            {
                report.skipped += 1;
                continue;
            }
            match self.cache.revalidate(&signature).await {
                Ok(RevalidateOutcome::Unchanged) => report.unchanged += 1,
                Ok(RevalidateOutcome::Rebuilt) => report.rebuilt += 1,
                Ok(RevalidateOutcome::Skipped | RevalidateOutcome::Discarded) => {
                    report.skipped += 1;
                },
                // Already logged by the cache; the next trigger retries.
                Err(_) => report.failed += 1,
            }
        }
        tracing::debug!(?trigger, ?report, "refresh pass finished");
        report
    }

    /// Runs the scheduler until the returned handle is shut down.
    #[must_use]
    pub fn spawn(self) -> RefreshHandle {
        let (triggers, mut rx) = mpsc::channel(TRIGGER_QUEUE);
        let task = tokio::spawn(async move {
            let mut ticker = self.config.interval.map(|period| {
                let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
                ticker
            });
            tracing::info!(interval = ?self.config.interval, "refresh scheduler started");
            loop {
                tokio::select! {
                    () = next_tick(&mut ticker) => {
                        self.handle_trigger(RefreshTrigger::Interval).await;
                    }
                    trigger = rx.recv() => match trigger {
                        Some(trigger) => {
                            self.handle_trigger(trigger).await;
                        }
                        None => break,
                    }
                }
            }
            tracing::info!("refresh scheduler stopped");
        });
        RefreshHandle { triggers, task }
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        },
        None => std::future::pending().await,
    }
}

pub struct RefreshHandle {
    triggers: mpsc::Sender<RefreshTrigger>,
    task: JoinHandle<()>,
}

impl RefreshHandle {
    /// Queues a trigger; `false` once the scheduler has stopped.
    pub async fn trigger(&self, trigger: RefreshTrigger) -> bool {
        self.triggers.send(trigger).await.is_ok()
    }

    /// Stops the loop after the pass in progress, if any.
    pub async fn shutdown(self) {
        drop(self.triggers);
        if let Err(err) = self.task.await {
            tracing::warn!(error = %err, "refresh scheduler task failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use mailtriage_core::FilterSet;

    use super::*;
    use crate::fetcher::PageFetcher;
    use crate::testing::{FakeServer, email};

    fn setup(count: i64) -> (Arc<FakeServer>, Arc<PaginatedCache>) {
        let server = Arc::new(FakeServer::with_count(count));
        let fetcher: Arc<dyn PageFetcher> = server.clone();
        (server, Arc::new(PaginatedCache::new(fetcher, 50, Duration::from_secs(30))))
    }

    fn config(interval: Option<Duration>) -> RefreshConfig {
        RefreshConfig { interval, ..RefreshConfig::default() }
    }

    #[test]
    fn non_positive_interval_disables_timer() {
        assert_eq!(interval_from_millis(0), None);
        assert_eq!(interval_from_millis(-5), None);
        assert_eq!(interval_from_millis(30_000), Some(Duration::from_secs(30)));
    }

    #[tokio::test(start_paused = true)]
    async fn focus_skips_fresh_entries() {
        let (server, cache) = setup(10);
        let sig = cache.set_active(&FilterSet::default());
        cache.request_next_page(&sig).await.unwrap();
        let scheduler = RefreshScheduler::new(Arc::clone(&cache), config(None));

        let report = scheduler.handle_trigger(RefreshTrigger::FocusRegained).await;
        assert_eq!(report, RefreshReport { skipped: 1, ..RefreshReport::default() });
        assert_eq!(server.fetch_calls.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_secs(6)).await;
        let report = scheduler.handle_trigger(RefreshTrigger::ConnectivityRegained).await;
        assert_eq!(report.unchanged, 1);
    }

    #[tokio::test]
    async fn interval_ignores_staleness_and_rebuilds_on_change() {
        let (server, cache) = setup(10);
        let sig = cache.set_active(&FilterSet::default());
        cache.request_next_page(&sig).await.unwrap();
        server.insert(email(11));

        let scheduler = RefreshScheduler::new(Arc::clone(&cache), config(None));
        let report = scheduler.handle_trigger(RefreshTrigger::Interval).await;
        assert_eq!(report.rebuilt, 1);
        assert_eq!(cache.snapshot(&sig).unwrap().items[0].id, 11);
    }

    #[tokio::test]
    async fn disabled_focus_refresh_does_nothing() {
        let (server, cache) = setup(3);
        cache.set_active(&FilterSet::default());
        let scheduler = RefreshScheduler::new(
            Arc::clone(&cache),
            RefreshConfig { refresh_on_focus: false, ..config(None) },
        );
        let report = scheduler.handle_trigger(RefreshTrigger::FocusRegained).await;
        assert_eq!(report, RefreshReport::default());
        assert_eq!(server.fetch_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failures_are_counted_not_raised() {
        let (server, cache) = setup(3);
        cache.set_active(&FilterSet::default());
        server.fail_fetch.store(true, Ordering::SeqCst);
        let scheduler = RefreshScheduler::new(Arc::clone(&cache), config(None));
        let report = scheduler.handle_trigger(RefreshTrigger::Interval).await;
        assert_eq!(report.failed, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn spawned_loop_fires_on_interval_and_stops() {
        let (server, cache) = setup(3);
        cache.set_active(&FilterSet::default());
        let handle =
            RefreshScheduler::new(Arc::clone(&cache), config(Some(Duration::from_secs(30)))).spawn();

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert_eq!(server.fetch_calls.load(Ordering::SeqCst), 1);

        assert!(handle.trigger(RefreshTrigger::Interval).await);
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(server.fetch_calls.load(Ordering::SeqCst), 2);
        handle.shutdown().await;
    }
}
