use std::sync::LazyLock;

use regex::Regex;

/// Accepted webhook address shape, matched against the lower-cased URL.
static WEBHOOK_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^.*(discord|discordapp)\.com/api/webhooks/([0-9]+)/([a-z0-9_-]+)$")
        .expect("webhook pattern is valid")
});

/// Check that a URL points at a Discord execute-webhook endpoint.
///
/// Rows carrying anything else are never delivered.
pub fn is_valid_webhook_url(url: &str) -> bool {
    WEBHOOK_URL.is_match(&url.to_lowercase())
}
