//! Presence status and snapshot types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Marker appended to a status label when the value was served from cache.
pub const STALE_MARKER: char = '*';

/// A Roblox presence status.
///
/// The presence API reports status as a numeric presence type; the mapping
/// is fixed: 1 → Online, 2 → `InGame`, 3 → `InStudio`, 4 → Invisible. Any
/// other code, and the cache-miss sentinel, collapse to Unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PresenceStatus {
    /// Online on the website or app.
    Online,
    /// Playing a game.
    InGame,
    /// Working in Roblox Studio.
    InStudio,
    /// Appearing offline.
    Invisible,
    /// No usable information (unmapped code or cache miss).
    Unknown,
}

impl PresenceStatus {
    /// Maps a numeric presence type from the API to a status.
    #[must_use]
    pub const fn from_code(code: i64) -> Self {
        match code {
            1 => Self::Online,
            2 => Self::InGame,
            3 => Self::InStudio,
            4 => Self::Invisible,
            _ => Self::Unknown,
        }
    }

    /// Returns the numeric presence type, or `None` for Unknown.
    #[must_use]
    pub const fn code(self) -> Option<i64> {
        match self {
            Self::Online => Some(1),
            Self::InGame => Some(2),
            Self::InStudio => Some(3),
            Self::Invisible => Some(4),
            Self::Unknown => None,
        }
    }

    /// Returns the status as a string slice.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Online => "Online",
            Self::InGame => "InGame",
            Self::InStudio => "InStudio",
            Self::Invisible => "Invisible",
            Self::Unknown => "Unknown",
        }
    }

    /// Emoji used by the one-shot status command.
    #[must_use]
    pub const fn emoji(self) -> &'static str {
        match self {
            Self::Online => "🟢",
            Self::InGame => "🎮",
            Self::InStudio => "💻",
            Self::Invisible => "👻",
            Self::Unknown => "❓",
        }
    }

    /// Whether this status is `InGame`.
    #[must_use]
    pub const fn is_in_game(self) -> bool {
        matches!(self, Self::InGame)
    }

    /// Whether this status is the Unknown sentinel.
    #[must_use]
    pub const fn is_unknown(self) -> bool {
        matches!(self, Self::Unknown)
    }

    /// Returns all status variants.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Online,
            Self::InGame,
            Self::InStudio,
            Self::Invisible,
            Self::Unknown,
        ]
    }
}

impl fmt::Display for PresenceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single observed (or cached) presence reading.
///
/// Snapshots are ephemeral: one is constructed per poll cycle per tracked
/// account and never shared across cycles. A snapshot is either live (just
/// fetched) or stale (reused from the cache after a failed live fetch).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceSnapshot {
    /// Observed presence status.
    pub status: PresenceStatus,
    /// Root place id of the game being played, if any.
    pub place_id: Option<u64>,
    /// When this reading was taken from the live API.
    pub observed_at: DateTime<Utc>,
    /// Whether this value was served from cache after a failed live fetch.
    pub stale: bool,
}

impl PresenceSnapshot {
    /// Creates a live snapshot observed now.
    #[must_use]
    pub fn live(status: PresenceStatus, place_id: Option<u64>) -> Self {
        Self {
            status,
            place_id,
            observed_at: Utc::now(),
            stale: false,
        }
    }

    /// The sentinel returned when the live fetch failed and no cached
    /// entry exists: Unknown, stale, no place id.
    #[must_use]
    pub fn unknown_stale() -> Self {
        Self {
            status: PresenceStatus::Unknown,
            place_id: None,
            observed_at: Utc::now(),
            stale: true,
        }
    }

    /// Marks the snapshot stale. Idempotent: marking an already-stale
    /// snapshot changes nothing, so the label never accumulates markers.
    pub fn mark_stale(&mut self) {
        self.stale = true;
    }

    /// Status label for display, with the stale marker appended at most
    /// once (e.g. `InGame*`).
    #[must_use]
    pub fn label(&self) -> String {
        if self.stale {
            format!("{}{STALE_MARKER}", self.status)
        } else {
            self.status.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(1, PresenceStatus::Online; "online")]
    #[test_case(2, PresenceStatus::InGame; "in game")]
    #[test_case(3, PresenceStatus::InStudio; "in studio")]
    #[test_case(4, PresenceStatus::Invisible; "invisible")]
    #[test_case(0, PresenceStatus::Unknown; "zero")]
    #[test_case(5, PresenceStatus::Unknown; "out of range")]
    #[test_case(-1, PresenceStatus::Unknown; "negative")]
    fn test_status_from_code(code: i64, expected: PresenceStatus) {
        assert_eq!(PresenceStatus::from_code(code), expected);
    }

    #[test]
    fn test_code_round_trip() {
        for status in PresenceStatus::all() {
            if let Some(code) = status.code() {
                assert_eq!(PresenceStatus::from_code(code), *status);
            } else {
                assert!(status.is_unknown());
            }
        }
    }

    #[test]
    fn test_stale_marker_applied_once() {
        let mut snapshot = PresenceSnapshot::live(PresenceStatus::InGame, Some(1234));
        assert_eq!(snapshot.label(), "InGame");

        snapshot.mark_stale();
        assert_eq!(snapshot.label(), "InGame*");

        // Re-annotating must not double-mark.
        snapshot.mark_stale();
        assert_eq!(snapshot.label().matches(STALE_MARKER).count(), 1);
        assert_eq!(snapshot.label(), "InGame*");
    }

    #[test]
    fn test_unknown_sentinel() {
        let sentinel = PresenceSnapshot::unknown_stale();
        assert!(sentinel.status.is_unknown());
        assert!(sentinel.stale);
        assert!(sentinel.place_id.is_none());
        assert_eq!(sentinel.label(), "Unknown*");
    }
}
