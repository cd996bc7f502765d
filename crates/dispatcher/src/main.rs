//! SubNotify dispatcher binary entrypoint.

use std::process::ExitCode;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use subnotify_common::config::AppConfig;
use subnotify_common::db;
use subnotify_common::error::AppError;
use subnotify_dispatcher::scheduler::Scheduler;
use subnotify_dispatcher::store::PgEventStore;
use subnotify_notifier::Deliverer;

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("subnotify_dispatcher=info,subnotify_notifier=info")
        }))
        .json()
        .init();

    tracing::info!("SubNotify dispatcher starting...");

    let config = match AppConfig::from_env().map_err(|e| AppError::Config(e.to_string())) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            return ExitCode::from(e.exit_code());
        }
    };

    let pool = match db::create_pool(&config.database, config.db_max_connections).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!(error = %e, "Unable to connect to database");
            return ExitCode::from(AppError::Database(e).exit_code());
        }
    };

    let scheduler = Scheduler::from_config(PgEventStore::new(pool.clone()), Deliverer::new(), &config);

    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Received shutdown signal, stopping gracefully...");
            signal.cancel();
        }
    });

    let code = match scheduler.run(shutdown).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Scheduler exited with error");
            ExitCode::from(e.exit_code())
        }
    };

    scheduler
        .drain(Duration::from_secs(config.shutdown_grace_secs))
        .await;
    pool.close().await;

    tracing::info!("SubNotify dispatcher stopped.");
    code
}
