//! A single poll cycle: fetch, filter against the seen set, notify, record.

use apartment_alerts::{Notifier, SeenStore};
use apartment_core::Listing;
use apartment_feeds::ListingSource;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

/// Tuning knobs for a cycle.
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Pause after each listing that was both notified and recorded.
    /// Keeps bursts under the webhook rate limit.
    pub notify_delay: Duration,
    /// Listings included in the status summary.
    pub sample_size: usize,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            notify_delay: Duration::from_millis(500),
            sample_size: 3,
        }
    }
}

/// Counts for a cycle that got past the fetch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Listings returned by the source.
    pub total: usize,
    /// Listings notified and recorded this cycle.
    pub new: usize,
    /// Listings skipped because they were already recorded.
    pub already_seen: usize,
    /// Listings that hit a store or notifier error.
    pub failed: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The source failed; nothing was processed.
    FetchFailed(String),
    Completed(CycleReport),
}

/// Runs poll cycles against explicitly owned collaborators.
pub struct Poller {
    source: Arc<dyn ListingSource>,
    store: Arc<dyn SeenStore>,
    notifier: Arc<dyn Notifier>,
    config: PollerConfig,
}

enum ListingResult {
    New,
    AlreadySeen,
    Failed,
}

impl Poller {
    pub fn new(
        source: Arc<dyn ListingSource>,
        store: Arc<dyn SeenStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            source,
            store,
            notifier,
            config: PollerConfig::default(),
        }
    }

    pub fn with_config(mut self, config: PollerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &PollerConfig {
        &self.config
    }

    /// Run one cycle to completion.
    ///
    /// Only a fetch failure ends the cycle early. Errors on a single listing
    /// are reported and the loop moves on; that listing is retried next cycle
    /// since it was never recorded.
    pub async fn run_cycle(&self) -> CycleOutcome {
        info!("Starting poll");

        let listings = match self.source.fetch().await {
            Ok(listings) => listings,
            Err(e) => {
                error!(error = %e, "Error fetching listings");
                let message = format!("Failed to fetch listings: {}", e);
                self.notifier.send_error(&message).await;
                return CycleOutcome::FetchFailed(message);
            }
        };
        info!(total = listings.len(), "Fetched listings");

        let mut report = CycleReport {
            total: listings.len(),
            ..Default::default()
        };

        for listing in &listings {
            match self.process(listing).await {
                ListingResult::New => {
                    report.new += 1;
                    if !self.config.notify_delay.is_zero() {
                        tokio::time::sleep(self.config.notify_delay).await;
                    }
                }
                ListingResult::AlreadySeen => report.already_seen += 1,
                ListingResult::Failed => report.failed += 1,
            }
        }

        info!(
            new = report.new,
            already_seen = report.already_seen,
            failed = report.failed,
            "Poll complete"
        );

        let sample_len = listings.len().min(self.config.sample_size);
        if let Err(e) = self
            .notifier
            .send_status(report.total, report.new, &listings[..sample_len])
            .await
        {
            error!(error = %e, "Error sending status update");
            self.notifier
                .send_error(&format!("Error sending status update: {}", e))
                .await;
        }

        CycleOutcome::Completed(report)
    }

    async fn process(&self, listing: &Listing) -> ListingResult {
        let id = listing.id.as_str();

        match self.store.is_new(id).await {
            Ok(true) => {}
            Ok(false) => {
                debug!(listing_id = %id, "Already seen");
                return ListingResult::AlreadySeen;
            }
            Err(e) => {
                error!(listing_id = %id, error = %e, "Error checking listing");
                self.notifier
                    .send_error(&format!("Error checking listing {}: {}", id, e))
                    .await;
                return ListingResult::Failed;
            }
        }

        if let Err(e) = self.notifier.send_listing(listing).await {
            error!(listing_id = %id, error = %e, "Error sending notification");
            self.notifier
                .send_error(&format!("Error sending notification for {}: {}", id, e))
                .await;
            return ListingResult::Failed;
        }

        // Notified but not recorded means it will be notified again next cycle.
        if let Err(e) = self.store.mark_seen(listing).await {
            error!(listing_id = %id, error = %e, "Error marking listing as seen");
            self.notifier
                .send_error(&format!("Error marking listing {} as seen: {}", id, e))
                .await;
            return ListingResult::Failed;
        }

        info!(
            listing_id = %id,
            area = %listing.area_name,
            address = %listing.address(),
            price = listing.price,
            "New listing"
        );
        ListingResult::New
    }
}
