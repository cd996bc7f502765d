use chrono::{DateTime, TimeZone, Utc};

/// A submarine return waiting to be announced, as stored in `public."SubNotify"`.
///
/// Rows are written by the tracker plugin and consumed exactly once by the
/// dispatcher: a row is deleted as soon as a poll claims it.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct PendingEvent {
    pub id: i64,
    /// Discord webhook target. Untrusted until it passes validation.
    #[sqlx(rename = "webhook")]
    pub webhook_url: String,
    /// Embed title (the submarine name)
    #[sqlx(rename = "name")]
    pub title: String,
    /// Embed description
    #[sqlx(rename = "content")]
    pub body: String,
    /// Discord user to ping, 0 when absent
    #[sqlx(rename = "mention")]
    pub mention_user: i64,
    /// Discord role to ping, 0 when absent
    #[sqlx(rename = "role_mention")]
    pub mention_role: i64,
    /// Unix timestamp (seconds) at which the voyage returns
    #[sqlx(rename = "return_time")]
    pub due_at: i64,
}

impl PendingEvent {
    /// The due time as a UTC datetime, for logging.
    pub fn due_at_utc(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.due_at, 0).single()
    }
}

/// Final state of a single delivery task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryStatus {
    Delivered,
    Failed,
}

impl std::fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeliveryStatus::Delivered => write!(f, "delivered"),
            DeliveryStatus::Failed => write!(f, "failed"),
        }
    }
}
