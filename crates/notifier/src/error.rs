use reqwest::StatusCode;
use thiserror::Error;

/// Terminal failure of a single delivery. None of these are retried.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("Unable to encode payload as JSON: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Unable to send webhook: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Webhook rejected with status {status}: {body}")]
    Rejected { status: StatusCode, body: String },
}
