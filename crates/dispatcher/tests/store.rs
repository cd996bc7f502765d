//! Integration tests for the Postgres-backed event store.
//!
//! These tests require a running PostgreSQL database and the `DATABASE_URL`
//! environment variable to be set. Run with:
//!
//! ```bash
//! DATABASE_URL="postgresql://..." cargo test -p subnotify-dispatcher --test store -- --ignored --nocapture
//! ```

use sqlx::PgPool;

use subnotify_common::error::AppError;
use subnotify_dispatcher::store::{EventStore, PgEventStore};

const NOW: i64 = 1_700_000_000;
const VALID: &str = "https://discord.com/api/webhooks/123456789/tok-en_1";

async fn setup(pool: &PgPool) -> PgEventStore {
    sqlx::migrate!("../../migrations").run(pool).await.unwrap();

    sqlx::query(r#"DELETE FROM public."SubNotify""#)
        .execute(pool)
        .await
        .unwrap();

    PgEventStore::new(pool.clone())
}

async fn insert(pool: &PgPool, webhook: &str, name: &str, mention: i64, role_mention: i64, return_time: i64) -> i64 {
    let (id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO public."SubNotify" (webhook, content, name, mention, role_mention, return_time)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id
        "#,
    )
    .bind(webhook)
    .bind("Returned!")
    .bind(name)
    .bind(mention)
    .bind(role_mention)
    .bind(return_time)
    .fetch_one(pool)
    .await
    .unwrap();
    id
}

async fn remaining_ids(pool: &PgPool) -> Vec<i64> {
    let rows: Vec<(i64,)> = sqlx::query_as(r#"SELECT id FROM public."SubNotify" ORDER BY id"#)
        .fetch_all(pool)
        .await
        .unwrap();
    rows.into_iter().map(|(id,)| id).collect()
}

#[sqlx::test]
#[ignore] // Requires DATABASE_URL — run explicitly with --ignored
async fn test_fetch_due_maps_columns(pool: PgPool) {
    let store = setup(&pool).await;
    let id = insert(&pool, VALID, "Voyage A", 123, 456, NOW + 60).await;

    let events = store.fetch_due(NOW, 600).await.unwrap();

    assert_eq!(events.len(), 1);
    let event = &events[0];
    assert_eq!(event.id, id);
    assert_eq!(event.webhook_url, VALID);
    assert_eq!(event.title, "Voyage A");
    assert_eq!(event.body, "Returned!");
    assert_eq!(event.mention_user, 123);
    assert_eq!(event.mention_role, 456);
    assert_eq!(event.due_at, NOW + 60);
}

#[sqlx::test]
#[ignore] // Requires DATABASE_URL — run explicitly with --ignored
async fn test_fetch_due_claims_valid_and_invalid(pool: PgPool) {
    let store = setup(&pool).await;
    let valid = insert(&pool, VALID, "Voyage A", 0, 0, NOW + 2).await;
    let _invalid = insert(&pool, "https://evil.example.com/hook", "Voyage B", 0, 0, NOW + 2).await;
    let later = insert(&pool, VALID, "Voyage C", 0, 0, NOW + 600).await;

    let events = store.fetch_due(NOW, 600).await.unwrap();

    assert_eq!(events.iter().map(|e| e.id).collect::<Vec<_>>(), vec![valid]);
    assert_eq!(remaining_ids(&pool).await, vec![later]);

    // claimed rows never come back
    assert!(store.fetch_due(NOW, 600).await.unwrap().is_empty());
}

#[sqlx::test]
#[ignore] // Requires DATABASE_URL — run explicitly with --ignored
async fn test_closed_pool_is_fatal(pool: PgPool) {
    let store = setup(&pool).await;
    insert(&pool, VALID, "Voyage A", 0, 0, NOW).await;

    pool.close().await;

    let err = store.fetch_due(NOW, 600).await.unwrap_err();
    assert!(matches!(err, AppError::StoreClosed));
    assert_eq!(err.exit_code(), 100);
}
