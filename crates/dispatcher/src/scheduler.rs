//! Poll loop: claim due events, hand each one to its own delivery task, sleep.

use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use subnotify_common::config::AppConfig;
use subnotify_common::error::AppError;
use subnotify_notifier::Deliverer;

use crate::store::EventStore;

/// Owns the store and every delivery task it has spawned.
pub struct Scheduler<S> {
    store: S,
    deliverer: Deliverer,
    poll_interval: Duration,
    lookahead_secs: i64,
    tracker: TaskTracker,
}

impl<S: EventStore> Scheduler<S> {
    pub fn new(store: S, deliverer: Deliverer, poll_interval: Duration, lookahead_secs: i64) -> Self {
        Self {
            store,
            deliverer,
            poll_interval,
            lookahead_secs,
            tracker: TaskTracker::new(),
        }
    }

    pub fn from_config(store: S, deliverer: Deliverer, config: &AppConfig) -> Self {
        Self::new(
            store,
            deliverer,
            Duration::from_secs(config.poll_interval_secs),
            config.lookahead_secs,
        )
    }

    /// Poll until `shutdown` fires. Returns an error only when the store is gone for good.
    pub async fn run(&self, shutdown: CancellationToken) -> Result<(), AppError> {
        tracing::info!(
            poll_interval_secs = self.poll_interval.as_secs(),
            lookahead_secs = self.lookahead_secs,
            "Scheduler started"
        );

        loop {
            let spawned = self.tick().await?;
            tracing::info!(
                spawned,
                in_flight = self.tracker.len(),
                "Sleeping until next poll"
            );

            tokio::select! {
                _ = tokio::time::sleep(self.poll_interval) => {}
                _ = shutdown.cancelled() => {
                    tracing::info!("Scheduler received shutdown signal");
                    return Ok(());
                }
            }
        }
    }

    /// Run one poll cycle and return how many deliveries were started.
    pub async fn tick(&self) -> Result<usize, AppError> {
        let now = Utc::now().timestamp();
        let events = match self.store.fetch_due(now, self.lookahead_secs).await {
            Ok(events) => events,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to fetch due events, retrying next poll");
                return Ok(0);
            }
        };

        let spawned = events.len();
        for event in events {
            tracing::debug!(event_id = event.id, due_at = event.due_at, "Scheduling delivery");
            let deliverer = self.deliverer.clone();
            self.tracker.spawn(async move {
                deliverer.run(event).await;
            });
        }

        Ok(spawned)
    }

    /// Deliveries that have not finished yet.
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Stop accepting deliveries and wait up to `grace` for the running ones.
    ///
    /// Returns the number of deliveries still running when the grace period ended;
    /// those are abandoned when the runtime shuts down.
    pub async fn drain(&self, grace: Duration) -> usize {
        self.tracker.close();
        if tokio::time::timeout(grace, self.tracker.wait()).await.is_ok() {
            return 0;
        }

        let abandoned = self.tracker.len();
        tracing::warn!(abandoned, "Abandoning in-flight deliveries");
        abandoned
    }
}
