//! Presence monitoring engine.
//!
//! The engine sequences one poll cycle: fetch each tracked account's
//! presence (live, or cached-and-stale on failure), classify the change
//! against each subscription's last recorded status, compose an embed for
//! reportable transitions, dispatch it, and record the new status.
//!
//! External failures never abort a cycle. Fetch failures degrade to the
//! cache-or-unknown sentinel, enrichment failures to placeholders,
//! delivery failures to a log line (the status still advances so the
//! transition is not redetected), and registry failures are fatal only
//! for the one subscription that hit them.

mod composer;
mod detector;
mod fetcher;
mod scheduler;

pub use composer::{compose, compose_status_check};
pub use detector::classify;
pub use fetcher::PresenceFetcher;
pub use scheduler::{CycleStats, PollScheduler};
