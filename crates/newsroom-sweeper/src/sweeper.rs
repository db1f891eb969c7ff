use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use newsroom_core::event::NEWS_SCHEDULED_PUBLISH;
use newsroom_events::EventBroadcaster;
use newsroom_store::{ContentStore, Result};
use tokio::sync::watch;
use tracing::{error, info, warn};

/// Promotes due drafts to Published on a fixed cadence.
///
/// Holds the store behind the narrow [`ContentStore`] seam and a broadcaster
/// handle for announcing each batch. [`run_sweep`](Self::run_sweep) is public
/// so tests can drive exactly one sweep deterministically instead of waiting
/// on the timer.
pub struct PublicationSweeper {
    store: Arc<dyn ContentStore>,
    broadcaster: EventBroadcaster,
    interval: Duration,
}

impl PublicationSweeper {
    pub fn new(
        store: Arc<dyn ContentStore>,
        broadcaster: EventBroadcaster,
        interval: Duration,
    ) -> Self {
        Self {
            store,
            broadcaster,
            interval,
        }
    }

    /// Execute one sweep: find due drafts, publish them as a batch, announce.
    ///
    /// Returns the number of articles the store actually transitioned. An
    /// empty due set returns `Ok(0)` with no store write and no event. The
    /// wall clock read here is authoritative for "due" — clock skew against
    /// an external store is an accepted risk.
    pub async fn run_sweep(&self) -> Result<usize> {
        let now = Utc::now();
        let due = self.store.find_due_drafts(now).await?;
        if due.is_empty() {
            return Ok(0);
        }

        let published = self.store.bulk_set_published(&due).await?;
        if published != due.len() {
            // Benign race: something else changed an article's status between
            // the query and the update. The store's count is the honest one.
            warn!(
                queried = due.len(),
                published, "due set shrank between query and bulk update"
            );
        }

        // Emit only after the update is confirmed, and only when the batch
        // transitioned something.
        if published > 0 {
            self.broadcaster.publish(
                NEWS_SCHEDULED_PUBLISH,
                serde_json::json!({ "updatedIds": due }),
            );
        }
        Ok(published)
    }

    /// Main loop. Sweeps once per interval until `shutdown` broadcasts `true`.
    ///
    /// Sweeps never overlap: the next tick is only taken after the previous
    /// sweep's awaits have settled, and missed ticks are skipped rather than
    /// bursted. Store errors are logged and absorbed — the next tick is the
    /// retry.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(interval_secs = self.interval.as_secs(), "publication sweeper started");

        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    match self.run_sweep().await {
                        Ok(0) => {}
                        Ok(n) => info!(published = n, "scheduled articles published"),
                        Err(e) => error!("publication sweep failed: {e}"),
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("publication sweeper shutting down");
                        break;
                    }
                }
            }
        }
    }
}
