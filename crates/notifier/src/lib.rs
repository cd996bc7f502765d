//! Discord webhook delivery for submarine return notifications.
//!
//! - [`webhook`] decides which URLs are allowed to receive anything at all
//! - [`payload`] turns a [`PendingEvent`](subnotify_common::types::PendingEvent) into the execute-webhook body
//! - [`deliverer`] waits for the due time and posts, honouring 429 rate limits

pub mod deliverer;
pub mod error;
pub mod payload;
pub mod webhook;

pub use deliverer::Deliverer;
pub use error::DeliveryError;
