//! # Statuswatch
//!
//! A Discord notifier for Roblox account presence changes.
//!
//! Statuswatch polls the Roblox presence API on a fixed interval, compares
//! each subscription's freshly observed status against the last recorded
//! one, and DMs the subscriber an embed describing the transition. When the
//! presence API is unreachable the last successfully observed snapshot is
//! served from a durable cache, explicitly marked stale.
//!
//! ## Pipeline
//!
//! fetch (live or cached-stale) → classify transition → compose embed →
//! deliver → record new status. Each distinct Roblox account is fetched at
//! most once per cycle, however many subscribers track it.
//!
//! ## Example
//!
//! ```rust,ignore
//! use statuswatch::engine::{classify, PresenceFetcher};
//!
//! let fetcher = PresenceFetcher::new(presence_api, cache);
//! let (snapshot, live) = fetcher.fetch(entity_id).await;
//! if let Some(transition) = classify(subscription.last_status, &snapshot) {
//!     // compose and deliver
//! }
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

use thiserror::Error as ThisError;

// Module declarations
pub mod config;
pub mod engine;
pub mod models;
pub mod notify;
pub mod observability;
pub mod roblox;
pub mod services;
pub mod storage;

// Re-exports for convenience
pub use config::WatchConfig;
pub use engine::{classify, compose, PollScheduler, PresenceFetcher};
pub use models::{PresenceSnapshot, PresenceStatus, Subscription, Transition, TransitionKind};
pub use notify::{ChatDelivery, Notification};
pub use services::SubscriptionService;
pub use storage::{JsonFileCache, PresenceCache, SqliteRegistry, SubscriptionRegistry};

/// Error type for statuswatch operations.
///
/// Uses `thiserror` for automatic `Display` and `Error` trait
/// implementations. Only failures that must reach a caller live here;
/// fetch, enrichment, and delivery failures are degraded at their call
/// sites (see the module docs of [`engine`]) and never surface as values
/// of this type.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `InvalidInput` | Malformed CLI arguments, out-of-range identifiers |
/// | `Registry` | Subscription store queries or writes fail |
/// | `Cache` | The presence cache file cannot be read or written |
/// | `Config` | The configuration file cannot be read or parsed |
#[derive(Debug, ThisError)]
pub enum Error {
    /// Invalid input was provided.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A subscription registry operation failed.
    ///
    /// Fatal for the current subscription's unit of work only; the poll
    /// cycle continues with the remaining subscriptions.
    #[error("registry operation '{operation}' failed: {cause}")]
    Registry {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },

    /// A presence cache operation failed.
    #[error("cache operation '{operation}' failed: {cause}")]
    Cache {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },

    /// Configuration could not be loaded.
    #[error("config operation '{operation}' failed: {cause}")]
    Config {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },
}

/// Result type alias for statuswatch operations.
pub type Result<T> = std::result::Result<T, Error>;
