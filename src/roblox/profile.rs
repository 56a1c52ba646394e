//! User profile client.

use super::ApiError;
use crate::config::RobloxConfig;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

/// Fallback display name when the profile lookup fails.
pub const UNKNOWN_NAME: &str = "Unknown";

/// Fallback avatar image when the profile lookup fails.
pub const PLACEHOLDER_THUMBNAIL: &str =
    "https://www.roblox.com/Thumbs/Asset.ashx?width=420&height=420&assetId=0";

/// Display name and avatar for a tracked account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityProfile {
    /// Display name.
    pub name: String,
    /// Avatar headshot URL.
    pub thumbnail_url: String,
}

impl EntityProfile {
    /// The degraded profile used when the lookup fails.
    #[must_use]
    pub fn unknown() -> Self {
        Self {
            name: UNKNOWN_NAME.to_string(),
            thumbnail_url: PLACEHOLDER_THUMBNAIL.to_string(),
        }
    }
}

/// Trait for the profile lookup API.
#[async_trait]
pub trait ProfileApi: Send + Sync {
    /// Fetches the profile for one account.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on network failure or a malformed response.
    async fn profile(&self, entity_id: u64) -> Result<EntityProfile, ApiError>;
}

/// Looks up a profile, degrading to the "Unknown" placeholder on failure.
///
/// Enrichment failure must never block a notification, so this is the
/// form the engine always calls.
pub async fn profile_or_unknown(api: &dyn ProfileApi, entity_id: u64) -> EntityProfile {
    match api.profile(entity_id).await {
        Ok(profile) => profile,
        Err(e) => {
            tracing::debug!(entity_id, error = %e, "profile lookup failed, using placeholder");
            EntityProfile::unknown()
        },
    }
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    name: String,
}

/// HTTP client for `users.roblox.com`.
///
/// The thumbnail URL is constructed, not fetched; the thumbnails service
/// resolves it when the chat client renders the embed.
pub struct ProfileClient {
    client: reqwest::Client,
    users_base: String,
    thumbnails_base: String,
}

impl ProfileClient {
    /// Creates a profile client.
    #[must_use]
    pub fn new(config: &RobloxConfig, timeout: Duration) -> Self {
        Self {
            client: super::build_http_client(timeout),
            users_base: config.users_base.clone(),
            thumbnails_base: config.thumbnails_base.clone(),
        }
    }

    fn thumbnail_url(&self, entity_id: u64) -> String {
        format!(
            "{}/v1/users/avatar-headshot?userIds={entity_id}&size=720x720&format=Png&isCircular=false",
            self.thumbnails_base
        )
    }
}

#[async_trait]
impl ProfileApi for ProfileClient {
    async fn profile(&self, entity_id: u64) -> Result<EntityProfile, ApiError> {
        let url = format!("{}/v1/users/{entity_id}", self.users_base);
        let response = self.client.get(&url).send().await?.error_for_status()?;
        let body: UserResponse = response.json().await?;

        Ok(EntityProfile {
            name: body.name,
            thumbnail_url: self.thumbnail_url(entity_id),
        })
    }
}
