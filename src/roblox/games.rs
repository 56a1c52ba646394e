//! Place details client.

use super::ApiError;
use crate::config::RobloxConfig;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

/// Title and canonical link for a game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameInfo {
    /// Game title.
    pub name: String,
    /// Canonical game page URL.
    pub url: String,
}

/// Canonical game page link for a place id.
#[must_use]
pub fn game_url(place_id: u64) -> String {
    format!("https://www.roblox.com/games/{place_id}")
}

/// Trait for the game-title lookup API.
#[async_trait]
pub trait GameTitleApi: Send + Sync {
    /// Fetches title and link for a place id.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on network failure or when the place id has
    /// no details record.
    async fn place_details(&self, place_id: u64) -> Result<GameInfo, ApiError>;
}

#[derive(Debug, Deserialize)]
struct PlaceDetails {
    name: String,
}

/// HTTP client for `games.roblox.com`.
pub struct GameTitleClient {
    client: reqwest::Client,
    base: String,
}

impl GameTitleClient {
    /// Creates a game-title client.
    #[must_use]
    pub fn new(config: &RobloxConfig, timeout: Duration) -> Self {
        Self {
            client: super::build_http_client(timeout),
            base: config.games_base.clone(),
        }
    }
}

#[async_trait]
impl GameTitleApi for GameTitleClient {
    async fn place_details(&self, place_id: u64) -> Result<GameInfo, ApiError> {
        let url = format!(
            "{}/v1/games/multiget-place-details?placeIds={place_id}",
            self.base
        );
        let response = self.client.get(&url).send().await?.error_for_status()?;
        let body: Vec<PlaceDetails> = response.json().await?;

        let details = body
            .into_iter()
            .next()
            .ok_or(ApiError::MissingRecord(place_id))?;

        Ok(GameInfo {
            name: details.name,
            url: game_url(place_id),
        })
    }
}
