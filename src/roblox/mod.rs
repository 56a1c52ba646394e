//! Roblox API clients.
//!
//! Three read-only external services, each behind an async trait so the
//! engine and tests can swap implementations:
//!
//! - presence query (numeric presence type + root place id)
//! - user profile (display name + avatar thumbnail URL)
//! - place details (game title + canonical link)
//!
//! Every client converts failure into a typed [`ApiError`]; callers match
//! on it and degrade (cache fallback, placeholder profile, omitted game
//! field). No API failure ever propagates out of a poll cycle.

mod games;
mod presence;
mod profile;

pub use games::{GameInfo, GameTitleApi, GameTitleClient};
pub use presence::{PresenceApi, PresenceClient, PresenceRecord};
pub use profile::{profile_or_unknown, EntityProfile, ProfileApi, ProfileClient};

use std::time::Duration;
use thiserror::Error;

/// Failure of a single Roblox API call.
///
/// Timeouts, connection errors, and non-2xx statuses all surface through
/// the `Request` variant via `reqwest`; the others cover responses that
/// arrived but did not contain a usable record.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The HTTP request failed (network error, timeout, non-2xx status).
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The response parsed but held no record for the requested id.
    #[error("no record for id {0}")]
    MissingRecord(u64),
}

/// Builds the shared HTTP client used by all Roblox API clients.
pub(crate) fn build_http_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent(format!("Statuswatch/{}", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}
