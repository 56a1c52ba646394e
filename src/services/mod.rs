//! Business logic services.
//!
//! The subscription service sits between the CLI front end and the
//! registry, owning the registration rules the engine itself does not
//! care about.

use crate::models::{PresenceStatus, Subscription};
use crate::storage::SubscriptionRegistry;
use crate::{Error, Result};
use std::sync::Arc;

/// Registration, removal, and listing of subscriptions.
pub struct SubscriptionService {
    registry: Arc<dyn SubscriptionRegistry>,
}

impl SubscriptionService {
    /// Creates a service over a registry.
    #[must_use]
    pub fn new(registry: Arc<dyn SubscriptionRegistry>) -> Self {
        Self { registry }
    }

    /// Registers a tracked account for a subscriber.
    ///
    /// The subscription is primary iff the subscriber currently holds no
    /// other subscriptions. The flag is assigned here once and never
    /// rebalanced, even if the primary subscription is later removed.
    /// `display_name` and `initial_status` come from lookups performed by
    /// the caller so the stored row starts from reality; both may be
    /// absent when those lookups failed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the (subscriber, entity) pair is
    /// already registered, or [`Error::Registry`] if the store fails.
    pub fn register(
        &self,
        subscriber_id: u64,
        entity_id: u64,
        display_name: Option<String>,
        initial_status: Option<PresenceStatus>,
    ) -> Result<Subscription> {
        if self.registry.get(subscriber_id, entity_id)?.is_some() {
            return Err(Error::InvalidInput(format!(
                "subscriber {subscriber_id} already tracks account {entity_id}"
            )));
        }

        let is_primary = self.registry.count_for(subscriber_id)? == 0;
        let subscription = Subscription {
            subscriber_id,
            entity_id,
            is_primary,
            last_status: initial_status,
            display_name,
        };

        self.registry.add(&subscription)?;
        tracing::info!(subscriber_id, entity_id, is_primary, "registered subscription");
        Ok(subscription)
    }

    /// Removes a subscription. Returns `true` if one was removed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Registry`] if the store fails.
    pub fn unregister(&self, subscriber_id: u64, entity_id: u64) -> Result<bool> {
        let removed = self.registry.remove(subscriber_id, entity_id)?;
        if removed {
            tracing::info!(subscriber_id, entity_id, "removed subscription");
        }
        Ok(removed)
    }

    /// Lists a subscriber's subscriptions.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Registry`] if the store fails.
    pub fn list(&self, subscriber_id: u64) -> Result<Vec<Subscription>> {
        self.registry.list_for(subscriber_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::SqliteRegistry;

    fn service() -> SubscriptionService {
        SubscriptionService::new(Arc::new(SqliteRegistry::in_memory().expect("registry")))
    }

    #[test]
    fn test_first_registration_is_primary() {
        let service = service();

        let first = service
            .register(7, 42, Some("builderman".to_string()), None)
            .expect("register");
        assert!(first.is_primary);

        let second = service.register(7, 43, None, None).expect("register");
        assert!(!second.is_primary);

        // A different subscriber starts fresh.
        let other = service.register(9, 42, None, None).expect("register");
        assert!(other.is_primary);
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let service = service();
        service.register(7, 42, None, None).expect("register");
        assert!(matches!(
            service.register(7, 42, None, None),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_primary_flag_not_rebalanced_after_removal() {
        let service = service();
        service.register(7, 42, None, None).expect("register");
        service.register(7, 43, None, None).expect("register");

        assert!(service.unregister(7, 42).expect("unregister"));

        // The surviving subscription stays secondary; no auto-promotion.
        let remaining = service.list(7).expect("list");
        assert_eq!(remaining.len(), 1);
        assert!(!remaining[0].is_primary);

        // But a fresh registration now counts one existing subscription,
        // so it is secondary too.
        let re_added = service.register(7, 44, None, None).expect("register");
        assert!(!re_added.is_primary);
    }

    #[test]
    fn test_unregister_missing_returns_false() {
        let service = service();
        assert!(!service.unregister(7, 42).expect("unregister"));
    }
}
