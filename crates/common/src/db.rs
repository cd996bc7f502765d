use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};

use crate::config::DatabaseConfig;

/// Build connection options from the configured store location.
pub fn connect_options(database: &DatabaseConfig) -> Result<PgConnectOptions, sqlx::Error> {
    match database {
        DatabaseConfig::Url(url) => url.parse(),
        DatabaseConfig::Parts {
            host,
            port,
            user,
            password,
            database,
        } => Ok(PgConnectOptions::new()
            .host(host)
            .port(*port)
            .username(user)
            .password(password)
            .database(database)),
    }
}

/// Create the PostgreSQL pool the dispatcher owns for its whole lifetime.
///
/// The pool connects eagerly so that an unreachable store is reported at startup.
pub async fn create_pool(database: &DatabaseConfig, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect_with(connect_options(database)?)
        .await?;

    tracing::info!(max_connections, "Connected to PostgreSQL");
    Ok(pool)
}
