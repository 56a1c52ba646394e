//! Presence query client.

use super::ApiError;
use crate::config::RobloxConfig;
use crate::models::PresenceStatus;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

/// One presence record as reported by the live API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresenceRecord {
    /// Mapped presence status.
    pub status: PresenceStatus,
    /// Root place id of the game being played, if any.
    pub place_id: Option<u64>,
}

/// Trait for the presence query API.
#[async_trait]
pub trait PresenceApi: Send + Sync {
    /// Fetches the live presence record for one account.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on network failure, timeout, non-2xx status,
    /// or a response without a record for the account.
    async fn user_presence(&self, entity_id: u64) -> Result<PresenceRecord, ApiError>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PresenceResponse {
    user_presences: Vec<UserPresence>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserPresence {
    user_presence_type: i64,
    root_place_id: Option<u64>,
}

/// HTTP client for `presence.roblox.com`.
pub struct PresenceClient {
    client: reqwest::Client,
    base: String,
}

impl PresenceClient {
    /// Creates a presence client with the given endpoint base and request
    /// timeout.
    #[must_use]
    pub fn new(config: &RobloxConfig, timeout: Duration) -> Self {
        Self {
            client: super::build_http_client(timeout),
            base: config.presence_base.clone(),
        }
    }
}

#[async_trait]
impl PresenceApi for PresenceClient {
    async fn user_presence(&self, entity_id: u64) -> Result<PresenceRecord, ApiError> {
        let url = format!("{}/v1/presence/users", self.base);
        let response = self
            .client
            .post(&url)
            .json(&json!({ "userIds": [entity_id] }))
            .send()
            .await?
            .error_for_status()?;

        let body: PresenceResponse = response.json().await?;
        let record = body
            .user_presences
            .into_iter()
            .next()
            .ok_or(ApiError::MissingRecord(entity_id))?;

        Ok(PresenceRecord {
            status: PresenceStatus::from_code(record.user_presence_type),
            place_id: record.root_place_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_parsing() {
        let raw = r#"{"userPresences":[{"userPresenceType":2,"lastLocation":"Jailbreak","rootPlaceId":606849621,"userId":42}]}"#;
        let body: PresenceResponse = serde_json::from_str(raw).expect("parse");
        let record = &body.user_presences[0];
        assert_eq!(record.user_presence_type, 2);
        assert_eq!(record.root_place_id, Some(606_849_621));
    }

    #[test]
    fn test_null_place_id() {
        let raw = r#"{"userPresences":[{"userPresenceType":1,"rootPlaceId":null}]}"#;
        let body: PresenceResponse = serde_json::from_str(raw).expect("parse");
        assert!(body.user_presences[0].root_place_id.is_none());
    }
}
