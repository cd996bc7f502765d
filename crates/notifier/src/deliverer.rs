//! Per-event delivery: wait until due, post, retry in place on 429.
//!
//! ```text
//! run(event)
//!   ├─ sleep until event.due_at          (immediately if already past)
//!   ├─ build payload, encode once
//!   └─ loop:
//!        POST webhook_url
//!          ├─ 200 / 204 → Delivered
//!          ├─ 429       → sleep retry_after, resend the same bytes
//!          └─ other     → Failed (body logged)
//! ```
//!
//! Transport and encode errors end the delivery. Nothing is reported back to
//! the scheduler; the outcome only shows up in the logs.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use reqwest::header::{CONTENT_TYPE, HeaderMap, RETRY_AFTER};
use serde::Deserialize;

use subnotify_common::types::{DeliveryStatus, PendingEvent};

use crate::error::DeliveryError;
use crate::payload::NotificationPayload;

/// Delay used when a 429 carries neither a readable body nor a Retry-After header.
const FALLBACK_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Body Discord sends along with a 429.
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimited {
    #[serde(default)]
    pub message: String,
    /// Seconds to wait before the next request
    pub retry_after: f64,
    #[serde(default)]
    pub global: bool,
    #[serde(default)]
    pub code: Option<i64>,
}

/// Sends notifications for claimed events. Cheap to clone; clones share the HTTP client.
#[derive(Debug, Clone, Default)]
pub struct Deliverer {
    client: reqwest::Client,
}

impl Deliverer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drive one event from hand-off to its terminal state.
    pub async fn run(&self, event: PendingEvent) -> DeliveryStatus {
        let delay = delay_until(event.due_at, Utc::now());
        tracing::debug!(
            event_id = event.id,
            due_at = ?event.due_at_utc(),
            delay_ms = as_millis_u64(delay),
            "Waiting for return time"
        );
        tokio::time::sleep(delay).await;

        let status = match self.deliver(&event).await {
            Ok(attempts) => {
                tracing::info!(event_id = event.id, attempts, "Notification delivered");
                DeliveryStatus::Delivered
            }
            Err(e) => {
                tracing::error!(event_id = event.id, error = %e, "Notification delivery failed");
                DeliveryStatus::Failed
            }
        };
        tracing::debug!(event_id = event.id, status = %status, "Delivery finished");
        status
    }

    /// Build the payload for `event` and send it now. Returns the number of attempts.
    pub async fn deliver(&self, event: &PendingEvent) -> Result<u32, DeliveryError> {
        let payload = NotificationPayload::build(event);
        self.send(&event.webhook_url, &payload).await
    }

    /// Post `payload` to `url`, resending the identical body after every 429.
    pub async fn send(&self, url: &str, payload: &NotificationPayload) -> Result<u32, DeliveryError> {
        let body = serde_json::to_vec(payload)?;
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            let response = self
                .client
                .post(url)
                .header(CONTENT_TYPE, "application/json")
                .body(body.clone())
                .send()
                .await?;

            let status = response.status();
            match status {
                StatusCode::OK | StatusCode::NO_CONTENT => return Ok(attempts),
                StatusCode::TOO_MANY_REQUESTS => {
                    let headers = response.headers().clone();
                    let limit = match response.bytes().await {
                        Ok(bytes) => serde_json::from_slice::<RateLimited>(&bytes).ok(),
                        Err(_) => None,
                    };
                    let delay = retry_delay(limit.as_ref(), &headers);

                    tracing::warn!(
                        attempt = attempts,
                        retry_after_ms = as_millis_u64(delay),
                        global = limit.as_ref().is_some_and(|l| l.global),
                        "Rate limited by webhook, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                _ => {
                    let body = response
                        .text()
                        .await
                        .unwrap_or_else(|e| format!("<unreadable body: {e}>"));
                    return Err(DeliveryError::Rejected { status, body });
                }
            }
        }
    }
}

/// Time left until `due_at` (unix seconds). Zero when the due time has passed.
pub fn delay_until(due_at: i64, now: DateTime<Utc>) -> Duration {
    let remaining_ms = due_at
        .saturating_mul(1000)
        .saturating_sub(now.timestamp_millis());
    u64::try_from(remaining_ms)
        .map(Duration::from_millis)
        .unwrap_or(Duration::ZERO)
}

/// How long to back off after a 429: body `retry_after`, else the Retry-After header.
fn retry_delay(limit: Option<&RateLimited>, headers: &HeaderMap) -> Duration {
    let seconds = limit.map(|l| l.retry_after).or_else(|| {
        headers
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<f64>().ok())
    });

    match seconds {
        Some(s) => seconds_to_duration(s),
        None => FALLBACK_RETRY_DELAY,
    }
}

fn as_millis_u64(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn seconds_to_duration(seconds: f64) -> Duration {
    if !seconds.is_finite() || seconds <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(seconds).unwrap_or(Duration::MAX)
}
