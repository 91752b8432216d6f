//! Repeats poll cycles on a fixed interval until shutdown.

use crate::poller::{CycleOutcome, Poller};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

/// Run one cycle right away, then one per `interval`, until `shutdown` becomes
/// true or its sender is dropped. Returns the number of cycles run.
///
/// Cycles never overlap. A signal that arrives mid-cycle takes effect once the
/// cycle finishes.
pub async fn run(poller: &Poller, interval: Duration, mut shutdown: watch::Receiver<bool>) -> u64 {
    let mut ticker = tokio::time::interval(interval);
    // A cycle longer than the interval pushes the schedule back instead of
    // firing a burst of catch-up cycles.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(interval_secs = interval.as_secs(), "Scheduler started");

    let mut cycles = 0u64;
    loop {
        tokio::select! {
            biased;
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
            _ = ticker.tick() => {
                if *shutdown.borrow() {
                    break;
                }
                cycles += 1;
                match poller.run_cycle().await {
                    CycleOutcome::Completed(report) => {
                        info!(cycle = cycles, total = report.total, new = report.new, "Cycle finished");
                    }
                    CycleOutcome::FetchFailed(reason) => {
                        warn!(cycle = cycles, %reason, "Cycle aborted");
                    }
                }
            }
        }
    }

    info!(cycles, "Scheduler stopped");
    cycles
}

#[cfg(test)]
mod tests {
    use super::*;
    use apartment_alerts::{DbError, Notifier, NotifierResult, SeenStore};
    use apartment_core::Listing;
    use apartment_feeds::{FetchResult, ListingSource};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    #[derive(Default)]
    struct CountingSource {
        fetches: AtomicU64,
    }

    #[async_trait]
    impl ListingSource for CountingSource {
        async fn fetch(&self) -> FetchResult<Vec<Listing>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }
    }

    struct NoopStore;

    #[async_trait]
    impl SeenStore for NoopStore {
        async fn is_new(&self, _id: &str) -> Result<bool, DbError> {
            Ok(true)
        }

        async fn mark_seen(&self, _listing: &Listing) -> Result<(), DbError> {
            Ok(())
        }
    }

    struct NoopNotifier;

    #[async_trait]
    impl Notifier for NoopNotifier {
        async fn send_listing(&self, _listing: &Listing) -> NotifierResult<()> {
            Ok(())
        }

        async fn send_status(&self, _t: usize, _n: usize, _s: &[Listing]) -> NotifierResult<()> {
            Ok(())
        }

        async fn send_error(&self, _message: &str) {}
    }

    fn poller(source: Arc<CountingSource>) -> Arc<Poller> {
        Arc::new(Poller::new(source, Arc::new(NoopStore), Arc::new(NoopNotifier)))
    }

    const HALF_HOUR: Duration = Duration::from_secs(30 * 60);

    #[tokio::test(start_paused = true)]
    async fn test_runs_immediately_then_on_interval() {
        let source = Arc::new(CountingSource::default());
        let poller = poller(source.clone());
        let (tx, rx) = watch::channel(false);

        let handle = tokio::spawn(async move { run(&poller, HALF_HOUR, rx).await });

        // Cycles at 0, 30 and 60 minutes
        tokio::time::sleep(Duration::from_secs(61 * 60)).await;
        tx.send(true).unwrap();

        let cycles = handle.await.unwrap();
        assert_eq!(cycles, 3);
        assert_eq!(source.fetches.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_when_sender_dropped() {
        let source = Arc::new(CountingSource::default());
        let poller = poller(source.clone());
        let (tx, rx) = watch::channel(false);

        let handle = tokio::spawn(async move { run(&poller, HALF_HOUR, rx).await });
        tokio::time::sleep(Duration::from_secs(60)).await;
        drop(tx);

        assert_eq!(handle.await.unwrap(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_already_signalled_runs_nothing() {
        let source = Arc::new(CountingSource::default());
        let (_tx, rx) = watch::channel(true);

        let cycles = run(&poller(source.clone()), HALF_HOUR, rx).await;

        assert_eq!(cycles, 0);
        assert_eq!(source.fetches.load(Ordering::SeqCst), 0);
    }
}
