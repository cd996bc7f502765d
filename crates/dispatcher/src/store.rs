use std::future::Future;

use sqlx::PgPool;

use subnotify_common::error::AppError;
use subnotify_common::types::PendingEvent;
use subnotify_notifier::webhook::is_valid_webhook_url;

/// Backing store of pending return notifications.
///
/// Implementors provide the raw row operations; [`EventStore::fetch_due`]
/// layers validation and claiming on top.
pub trait EventStore: Send + Sync {
    /// Rows whose due time is strictly before `deadline` (unix seconds).
    fn select_due_before(
        &self,
        deadline: i64,
    ) -> impl Future<Output = Result<Vec<PendingEvent>, AppError>> + Send;

    /// Remove rows by id. Unknown ids are ignored.
    fn delete(&self, ids: &[i64]) -> impl Future<Output = Result<u64, AppError>> + Send;

    /// Whether the underlying connection has been shut down for good.
    ///
    /// A connection lost mid-query surfaces as [`AppError::StoreClosed`] instead.
    fn is_closed(&self) -> bool;

    /// Claim every event due within `lookahead_secs` of `now`.
    ///
    /// Valid and invalid rows are both deleted before this returns; only the
    /// valid ones are handed back. On error nothing has been deleted, so the
    /// rows come back on the next poll.
    fn fetch_due(
        &self,
        now: i64,
        lookahead_secs: i64,
    ) -> impl Future<Output = Result<Vec<PendingEvent>, AppError>> + Send {
        async move {
            if self.is_closed() {
                return Err(AppError::StoreClosed);
            }

            let rows = self
                .select_due_before(now.saturating_add(lookahead_secs))
                .await?;
            if rows.is_empty() {
                return Ok(rows);
            }

            let (valid, invalid) = partition_by_webhook(rows);
            for event in &invalid {
                tracing::warn!(
                    event_id = event.id,
                    webhook = %event.webhook_url,
                    "Invalid webhook, discarding event"
                );
            }

            let ids: Vec<i64> = valid.iter().chain(&invalid).map(|e| e.id).collect();
            let deleted = self.delete(&ids).await?;

            tracing::info!(
                claimed = valid.len(),
                discarded = invalid.len(),
                deleted,
                "Claimed due events"
            );
            Ok(valid)
        }
    }
}

/// Split rows into `(valid, invalid)` by their webhook URL.
pub fn partition_by_webhook(rows: Vec<PendingEvent>) -> (Vec<PendingEvent>, Vec<PendingEvent>) {
    rows.into_iter()
        .partition(|event| is_valid_webhook_url(&event.webhook_url))
}

/// [`EventStore`] over the `public."SubNotify"` table.
#[derive(Clone)]
pub struct PgEventStore {
    pool: PgPool,
}

impl PgEventStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl EventStore for PgEventStore {
    async fn select_due_before(&self, deadline: i64) -> Result<Vec<PendingEvent>, AppError> {
        let rows = sqlx::query_as::<_, PendingEvent>(
            r#"
            SELECT id, webhook, content, name, mention, role_mention, return_time
            FROM public."SubNotify"
            WHERE return_time < $1
            "#,
        )
        .bind(deadline)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::from_store)?;

        Ok(rows)
    }

    async fn delete(&self, ids: &[i64]) -> Result<u64, AppError> {
        let result = sqlx::query(r#"DELETE FROM public."SubNotify" WHERE id = ANY($1)"#)
            .bind(ids)
            .execute(&self.pool)
            .await
            .map_err(AppError::from_store)?;

        Ok(result.rows_affected())
    }

    fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }
}
