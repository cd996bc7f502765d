use thiserror::Error;

/// Exit status when the store cannot be reached at startup.
pub const EXIT_STORE_UNREACHABLE: u8 = 1;

/// Exit status for invalid configuration.
pub const EXIT_CONFIG: u8 = 2;

/// Exit status when the store connection is found closed mid-run.
pub const EXIT_STORE_CLOSED: u8 = 100;

/// Common error types used across the application.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Store connection is closed")]
    StoreClosed,

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    /// Whether the process can keep running after this error.
    ///
    /// A failed query is retried on the next poll; a closed store is not.
    pub fn is_fatal(&self) -> bool {
        matches!(self, AppError::StoreClosed | AppError::Config(_))
    }

    /// Classify an error from a store that was reachable at startup.
    ///
    /// Losing the connection is not recoverable: there is no reconnection logic.
    pub fn from_store(err: sqlx::Error) -> Self {
        if matches!(
            err,
            sqlx::Error::PoolClosed
                | sqlx::Error::PoolTimedOut
                | sqlx::Error::WorkerCrashed
                | sqlx::Error::Io(_)
        ) {
            tracing::error!(error = %err, "Lost connection to the store");
            return AppError::StoreClosed;
        }
        AppError::Database(err)
    }

    /// Process exit status for a fatal error.
    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::Database(_) => EXIT_STORE_UNREACHABLE,
            AppError::StoreClosed => EXIT_STORE_CLOSED,
            AppError::Config(_) => EXIT_CONFIG,
        }
    }
}
