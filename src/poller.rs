//! Periodic page refresh.
//!
//! A poller owns one background task per polled page. The first cycle runs
//! immediately, later cycles follow a fixed period. Each cycle is raced
//! against the shutdown signal, so stopping the poller also abandons any
//! request still in flight and nothing lands in the cache afterwards.
//!
//! Readers hold a [`PageCache`]: a cheap clone that exposes the latest
//! committed [`PageSnapshot`] and a broadcast of failure [`Notice`]s.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{RwLock, broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::dashboard::{Cycle, ResourceFailure};

/// Notices buffered per subscriber before the oldest are dropped.
const NOTICE_CAPACITY: usize = 16;

/// Raised once for every cycle in which at least one request failed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notice {
    pub page: &'static str,
    pub cycle: u64,
    pub message: String,
    pub failures: Vec<ResourceFailure>,
    pub raised_at: DateTime<Utc>,
}

impl Notice {
    /// Build the notice for a cycle, `None` when nothing failed.
    pub fn for_cycle(
        page: &'static str,
        cycle: u64,
        failures: Vec<ResourceFailure>,
        raised_at: DateTime<Utc>,
    ) -> Option<Self> {
        if failures.is_empty() {
            return None;
        }
        Some(Self {
            page,
            cycle,
            message: format!(
                "Failed to refresh {page}: {} request(s) failed",
                failures.len()
            ),
            failures,
            raised_at,
        })
    }
}

/// Latest committed state of a polled page.
#[derive(Debug, Clone, Serialize)]
pub struct PageSnapshot<V> {
    pub page: &'static str,
    /// `None` until the first cycle completes.
    pub view: Option<V>,
    /// Number of the last committed cycle, 0 before the first.
    pub cycle: u64,
    pub refreshed_at: Option<DateTime<Utc>>,
    /// Failure notice of the last cycle, cleared by a clean one.
    pub notice: Option<Notice>,
}

impl<V> PageSnapshot<V> {
    /// Snapshot of a page loaded once, outside any poller.
    pub fn single(page: &'static str, outcome: Cycle<V>) -> Self {
        let now = Utc::now();
        Self {
            page,
            view: Some(outcome.view),
            cycle: 1,
            refreshed_at: Some(now),
            notice: Notice::for_cycle(page, 1, outcome.failures, now),
        }
    }
}

/// Shared read side of a polled page.
#[derive(Clone)]
pub struct PageCache<V> {
    page: &'static str,
    state: Arc<RwLock<PageSnapshot<V>>>,
    notices: broadcast::Sender<Notice>,
    cycles: watch::Sender<u64>,
}

impl<V: Clone> PageCache<V> {
    pub fn new(page: &'static str) -> Self {
        let (notices, _) = broadcast::channel(NOTICE_CAPACITY);
        let (cycles, _) = watch::channel(0);
        Self {
            page,
            state: Arc::new(RwLock::new(PageSnapshot {
                page,
                view: None,
                cycle: 0,
                refreshed_at: None,
                notice: None,
            })),
            notices,
            cycles,
        }
    }

    pub fn page(&self) -> &'static str {
        self.page
    }

    /// Copy of the latest committed state.
    pub async fn snapshot(&self) -> PageSnapshot<V> {
        self.state.read().await.clone()
    }

    /// Latest committed view, if any.
    pub async fn view(&self) -> Option<V> {
        self.state.read().await.view.clone()
    }

    /// Receive a [`Notice`] for every failing cycle from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.notices.subscribe()
    }

    /// Observe the number of the last committed cycle.
    pub fn watch_cycles(&self) -> watch::Receiver<u64> {
        self.cycles.subscribe()
    }

    /// Commit the outcome of cycle number `cycle`.
    ///
    /// Outcomes older than the committed cycle are dropped. Returns whether
    /// the outcome was applied.
    pub async fn commit(&self, cycle: u64, outcome: Cycle<V>) -> bool {
        let mut state = self.state.write().await;
        if cycle <= state.cycle {
            debug!(
                page = self.page,
                cycle,
                current = state.cycle,
                "Discarding outdated cycle"
            );
            return false;
        }

        let now = Utc::now();
        let notice = Notice::for_cycle(self.page, cycle, outcome.failures, now);

        state.view = Some(outcome.view);
        state.cycle = cycle;
        state.refreshed_at = Some(now);
        state.notice = notice.clone();
        drop(state);

        if let Some(notice) = notice {
            warn!(
                page = self.page,
                cycle,
                failed = notice.failures.len(),
                "Page refresh incomplete"
            );
            // No subscribers is fine; the notice stays on the snapshot.
            let _ = self.notices.send(notice);
        } else {
            debug!(page = self.page, cycle, "Page refreshed");
        }
        self.cycles.send_replace(cycle);

        true
    }
}

/// Handle to a running poller.
pub struct PollHandle {
    page: &'static str,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl PollHandle {
    /// Stop polling, abandon any in-flight cycle and wait for the task.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            warn!(page = self.page, error = %e, "Poller task ended abnormally");
        }
        info!(page = self.page, "Poller stopped");
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Start refreshing `cache` every `period`.
///
/// `refresh` receives the currently committed view so it can carry values
/// of failed resources forward. Dropping the returned handle also stops
/// the task.
pub fn spawn<V, F, Fut>(cache: PageCache<V>, period: Duration, refresh: F) -> PollHandle
where
    V: Clone + Send + Sync + 'static,
    F: Fn(Option<V>) -> Fut + Send + 'static,
    Fut: Future<Output = Cycle<V>> + Send + 'static,
{
    let (shutdown, mut stop) = watch::channel(false);
    let page = cache.page();

    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut cycle = 0u64;

        info!(page, period_secs = period.as_secs(), "Poller started");

        loop {
            tokio::select! {
                biased;
                _ = stop.changed() => break,
                _ = ticker.tick() => {}
            }

            cycle += 1;
            let previous = cache.view().await;

            let outcome = tokio::select! {
                biased;
                _ = stop.changed() => {
                    debug!(page, cycle, "Cycle cancelled by shutdown");
                    break;
                }
                outcome = refresh(previous) => outcome,
            };

            cache.commit(cycle, outcome).await;
        }
    });

    PollHandle {
        page,
        shutdown,
        task,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::Resource;
    use crate::error::ClientError;
    use std::sync::atomic::{AtomicU64, Ordering};

    const PERIOD: Duration = Duration::from_secs(30);

    fn failure() -> ResourceFailure {
        ResourceFailure {
            resource: "status",
            error: "/status answered with HTTP 500".to_string(),
        }
    }

    #[tokio::test]
    async fn test_commit_drops_outdated_cycles() {
        let cache: PageCache<u32> = PageCache::new("test");

        assert!(
            cache
                .commit(2, Cycle { view: 2, failures: vec![] })
                .await
        );
        assert!(
            !cache
                .commit(1, Cycle { view: 1, failures: vec![] })
                .await
        );

        let snapshot = cache.snapshot().await;
        assert_eq!(snapshot.view, Some(2));
        assert_eq!(snapshot.cycle, 2);
    }

    #[tokio::test]
    async fn test_clean_cycle_clears_notice() {
        let cache: PageCache<u32> = PageCache::new("test");
        let mut notices = cache.subscribe();

        cache
            .commit(1, Cycle { view: 1, failures: vec![failure()] })
            .await;
        assert!(cache.snapshot().await.notice.is_some());
        assert_eq!(notices.try_recv().unwrap().cycle, 1);

        cache.commit(2, Cycle { view: 2, failures: vec![] }).await;
        assert!(cache.snapshot().await.notice.is_none());
        assert!(notices.try_recv().is_err());
    }

    #[test]
    fn test_single_snapshot() {
        let clean = PageSnapshot::single("npk", Cycle { view: 1, failures: vec![] });
        assert_eq!(clean.cycle, 1);
        assert!(clean.notice.is_none());

        let partial = PageSnapshot::single("npk", Cycle { view: 1, failures: vec![failure()] });
        let notice = partial.notice.unwrap();
        assert_eq!(notice.message, "Failed to refresh npk: 1 request(s) failed");
        assert_eq!(notice.failures.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_cycle_runs_immediately() {
        let cache: PageCache<u64> = PageCache::new("dashboard");
        let calls = Arc::new(AtomicU64::new(0));
        let counter = calls.clone();

        let handle = spawn(cache.clone(), PERIOD, move |_| {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            async move { Cycle { view: n, failures: vec![] } }
        });

        let mut cycles = cache.watch_cycles();
        cycles.wait_for(|c| *c >= 1).await.unwrap();

        let snapshot = cache.snapshot().await;
        assert_eq!(snapshot.view, Some(1));
        assert!(snapshot.refreshed_at.is_some());

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_cycles_keep_value_and_notify_once_each() {
        let cache: PageCache<Resource<u64>> = PageCache::new("dashboard");
        let mut notices = cache.subscribe();
        let calls = Arc::new(AtomicU64::new(0));
        let counter = calls.clone();

        // First cycle succeeds, every later one fails.
        let handle = spawn(cache.clone(), PERIOD, move |previous: Option<Resource<u64>>| {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                let result = if n == 0 {
                    Ok(41)
                } else {
                    Err(ClientError::Status {
                        endpoint: "/status".to_string(),
                        status: 500,
                    })
                };
                let mut failures = Vec::new();
                if let Err(e) = &result {
                    failures.push(ResourceFailure {
                        resource: "status",
                        error: e.to_string(),
                    });
                }
                Cycle {
                    view: previous.unwrap_or_default().merge(result, Utc::now()),
                    failures,
                }
            }
        });

        let mut cycles = cache.watch_cycles();
        cycles.wait_for(|c| *c >= 3).await.unwrap();
        handle.shutdown().await;

        let snapshot = cache.snapshot().await;
        assert_eq!(snapshot.view.as_ref().and_then(|v| v.value()), Some(&41));
        assert!(matches!(snapshot.view, Some(Resource::Stale { .. })));

        let mut seen = Vec::new();
        while let Ok(notice) = notices.try_recv() {
            seen.push(notice.cycle);
        }
        let expected: Vec<u64> = (2..=snapshot.cycle).collect();
        assert_eq!(seen, expected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_polling() {
        let cache: PageCache<u64> = PageCache::new("waterlogging");
        let calls = Arc::new(AtomicU64::new(0));
        let counter = calls.clone();

        let handle = spawn(cache.clone(), PERIOD, move |_| {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            async move { Cycle { view: n, failures: vec![] } }
        });

        cache.watch_cycles().wait_for(|c| *c >= 2).await.unwrap();
        handle.shutdown().await;
        let stopped_at = calls.load(Ordering::SeqCst);

        tokio::time::advance(PERIOD * 10).await;
        tokio::task::yield_now().await;

        assert_eq!(calls.load(Ordering::SeqCst), stopped_at);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_abandons_in_flight_cycle() {
        let cache: PageCache<u64> = PageCache::new("dashboard");

        let handle = spawn(cache.clone(), PERIOD, |_| async {
            std::future::pending::<()>().await;
            Cycle { view: 1, failures: vec![] }
        });

        tokio::task::yield_now().await;
        handle.shutdown().await;

        let snapshot = cache.snapshot().await;
        assert_eq!(snapshot.view, None);
        assert_eq!(snapshot.cycle, 0);
    }

    #[test]
    fn test_dropping_handle_stops_task() {
        tokio_test::block_on(async {
            let cache: PageCache<u64> = PageCache::new("dashboard");
            let handle = spawn(cache, PERIOD, |_| async {
                Cycle { view: 1, failures: vec![] }
            });
            let PollHandle { task, shutdown, .. } = handle;
            drop(shutdown);
            tokio_test::assert_ok!(task.await);
        });
    }
}
