//! Subscription type linking a Discord subscriber to a tracked account.

use super::PresenceStatus;

/// A subscriber's interest in one tracked Roblox account.
///
/// Uniquely identified by the (subscriber, entity) pair. A subscriber may
/// hold many subscriptions, at most one of which is primary by convention;
/// the flag is assigned once at registration and never rebalanced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    /// Discord user id of the subscriber.
    pub subscriber_id: u64,
    /// Roblox user id of the tracked account.
    pub entity_id: u64,
    /// Whether this is the subscriber's primary (main) account.
    pub is_primary: bool,
    /// Status recorded after the last processed transition, if any.
    pub last_status: Option<PresenceStatus>,
    /// Display name captured at registration time, if the lookup succeeded.
    pub display_name: Option<String>,
}

impl Subscription {
    /// Icon distinguishing a primary subscription from a secondary one.
    #[must_use]
    pub const fn icon(&self) -> &'static str {
        if self.is_primary { "👑" } else { "👤" }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_icon_follows_primary_flag() {
        let mut sub = Subscription {
            subscriber_id: 7,
            entity_id: 42,
            is_primary: true,
            last_status: None,
            display_name: None,
        };
        assert_eq!(sub.icon(), "👑");
        sub.is_primary = false;
        assert_eq!(sub.icon(), "👤");
    }
}
