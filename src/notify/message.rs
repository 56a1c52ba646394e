//! Notification payload shaping.

use chrono::{DateTime, Utc};
use serde_json::{json, Value};

/// Footer legend shown on every presence embed.
pub const FOOTER_LEGEND: &str = "👑 Main account | 👤 Alt account";

/// Embed color for Online / `InGame` statuses.
pub const COLOR_GREEN: u32 = 0x2ecc71;

/// Embed color for everything else.
pub const COLOR_BLUE: u32 = 0x3498db;

/// Embed color for admin announcements.
pub const COLOR_BLURPLE: u32 = 0x5865F2;

/// One name/value field on a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationField {
    /// Field name.
    pub name: String,
    /// Field value (may contain markdown).
    pub value: String,
}

/// A structured message ready for chat delivery.
///
/// Produced by the composer, consumed by a [`super::ChatDelivery`]
/// backend. Composing one has no I/O side effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Embed title.
    pub title: String,
    /// Optional body text below the title.
    pub description: Option<String>,
    /// Additional fields (game link, stale-data note).
    pub fields: Vec<NotificationField>,
    /// Footer legend.
    pub footer: String,
    /// Thumbnail image URL, if any.
    pub thumbnail_url: Option<String>,
    /// Accent color.
    pub color: u32,
    /// When the notification was composed.
    pub timestamp: DateTime<Utc>,
}

impl Notification {
    /// Creates a notification with a title and color and nothing else.
    #[must_use]
    pub fn new(title: impl Into<String>, color: u32) -> Self {
        Self {
            title: title.into(),
            description: None,
            fields: Vec::new(),
            footer: FOOTER_LEGEND.to_string(),
            thumbnail_url: None,
            color,
            timestamp: Utc::now(),
        }
    }

    /// Creates an admin announcement.
    #[must_use]
    pub fn announcement(message: impl Into<String>) -> Self {
        let mut n = Self::new("📢 Announcement", COLOR_BLURPLE);
        n.description = Some(message.into());
        n.footer = String::new();
        n
    }

    /// Appends a field.
    pub fn push_field(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.push(NotificationField {
            name: name.into(),
            value: value.into(),
        });
    }

    /// Renders the notification as a Discord embed object.
    #[must_use]
    pub fn to_embed_json(&self) -> Value {
        let mut embed = json!({
            "title": self.title,
            "color": self.color,
            "timestamp": self.timestamp.to_rfc3339(),
        });

        if let Some(description) = &self.description {
            embed["description"] = json!(description);
        }
        if !self.fields.is_empty() {
            embed["fields"] = Value::Array(
                self.fields
                    .iter()
                    .map(|f| json!({ "name": f.name, "value": f.value, "inline": false }))
                    .collect(),
            );
        }
        if !self.footer.is_empty() {
            embed["footer"] = json!({ "text": self.footer });
        }
        if let Some(url) = &self.thumbnail_url {
            embed["thumbnail"] = json!({ "url": url });
        }

        embed
    }
}
