//! Discord REST delivery backend.

use super::{ChatDelivery, DeliveryError, Notification};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct DmChannel {
    id: String,
}

/// Delivers notifications as direct messages through the Discord REST API.
///
/// Each delivery is two calls: open (or reuse) the DM channel for the
/// recipient, then create a message carrying the embed. Discord returns
/// the same channel for repeat opens, so no channel cache is kept here.
pub struct DiscordDelivery {
    client: reqwest::Client,
    token: String,
    api_base: String,
}

impl DiscordDelivery {
    /// Creates a Discord delivery backend.
    #[must_use]
    pub fn new(token: impl Into<String>, api_base: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(format!("Statuswatch/{}", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            token: token.into(),
            api_base: api_base.into(),
        }
    }

    fn auth_header(&self) -> String {
        format!("Bot {}", self.token)
    }

    async fn open_dm_channel(&self, subscriber_id: u64) -> Result<String, DeliveryError> {
        let url = format!("{}/users/@me/channels", self.api_base);
        let response = self
            .client
            .post(&url)
            .header("Authorization", self.auth_header())
            .json(&json!({ "recipient_id": subscriber_id.to_string() }))
            .send()
            .await?
            .error_for_status()?;

        let channel: DmChannel = response.json().await?;
        Ok(channel.id)
    }
}

#[async_trait]
impl ChatDelivery for DiscordDelivery {
    async fn deliver(
        &self,
        subscriber_id: u64,
        notification: &Notification,
    ) -> Result<(), DeliveryError> {
        let channel_id = self.open_dm_channel(subscriber_id).await?;

        let url = format!("{}/channels/{channel_id}/messages", self.api_base);
        self.client
            .post(&url)
            .header("Authorization", self.auth_header())
            .json(&json!({ "embeds": [notification.to_embed_json()] }))
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }
}
