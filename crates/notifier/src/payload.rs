//! Execute-webhook body for a submarine return.
//!
//! Mirrors the subset of Discord's `WebhookContent` / `Embed` JSON the tracker
//! uses. Empty fields are left out of the encoded body.

use serde::{Deserialize, Serialize};

use subnotify_common::types::PendingEvent;

/// Display name of the webhook author.
pub const USERNAME: &str = "[Submarine Tracker]";

/// Avatar shown next to every notification.
pub const AVATAR_URL: &str =
    "https://raw.githubusercontent.com/Infiziert90/SubmarineTracker/master/SubmarineTracker/images/icon.png";

/// Embed accent colour.
pub const EMBED_COLOR: &str = "8447519";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPayload {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub avatar_url: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<Embed>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Embed {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub color: String,
}

impl NotificationPayload {
    /// Build the notification for an event. Pure: same event, same payload.
    pub fn build(event: &PendingEvent) -> Self {
        Self {
            username: USERNAME.to_string(),
            content: mention_prefix(event.mention_user, event.mention_role),
            avatar_url: AVATAR_URL.to_string(),
            embeds: vec![Embed {
                title: event.title.clone(),
                description: event.body.clone(),
                color: EMBED_COLOR.to_string(),
            }],
        }
    }
}

/// `<@user>` followed by `<@&role>`, skipping ids that are not positive.
pub fn mention_prefix(user: i64, role: i64) -> Option<String> {
    let mut mentions = String::new();
    if user > 0 {
        mentions.push_str(&format!("<@{}>", user));
    }
    if role > 0 {
        mentions.push_str(&format!("<@&{}>", role));
    }

    (!mentions.is_empty()).then_some(mentions)
}
