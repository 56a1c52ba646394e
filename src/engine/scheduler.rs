//! Periodic poll driver.

use super::{classify, compose, PresenceFetcher};
use crate::models::{PresenceSnapshot, Subscription};
use crate::notify::ChatDelivery;
use crate::roblox::{profile_or_unknown, GameTitleApi, ProfileApi};
use crate::storage::SubscriptionRegistry;
use crate::Result;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Counters for one poll cycle.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CycleStats {
    /// Subscriptions read at cycle start.
    pub subscriptions: usize,
    /// Live-or-cached fetches performed (one per distinct entity).
    pub fetches: usize,
    /// Notifications dispatched (including failed delivery attempts).
    pub dispatched: usize,
    /// Delivery attempts that failed.
    pub delivery_failures: usize,
    /// Subscriptions whose processing failed (registry errors).
    pub errors: usize,
}

/// Drives the fetch → detect → notify → persist cycle on a fixed interval.
///
/// Within a cycle, subscriptions are grouped by tracked account so each
/// account is fetched exactly once; the resulting snapshot is reused for
/// every subscription on it, each of which classifies and notifies
/// independently. Processing is sequential, with a pacing delay between
/// successive chat deliveries (but not between fetches).
pub struct PollScheduler {
    registry: Arc<dyn SubscriptionRegistry>,
    fetcher: PresenceFetcher,
    profiles: Arc<dyn ProfileApi>,
    games: Arc<dyn GameTitleApi>,
    delivery: Arc<dyn ChatDelivery>,
    poll_interval: Duration,
    pacing_delay: Duration,
}

impl PollScheduler {
    /// Creates a scheduler over the engine's collaborators.
    #[must_use]
    pub fn new(
        registry: Arc<dyn SubscriptionRegistry>,
        fetcher: PresenceFetcher,
        profiles: Arc<dyn ProfileApi>,
        games: Arc<dyn GameTitleApi>,
        delivery: Arc<dyn ChatDelivery>,
        poll_interval: Duration,
        pacing_delay: Duration,
    ) -> Self {
        Self {
            registry,
            fetcher,
            profiles,
            games,
            delivery,
            poll_interval,
            pacing_delay,
        }
    }

    /// Runs cycles until the shutdown flag flips.
    ///
    /// Shutdown is honored between subscriptions: the in-flight unit of
    /// work (notify + status update) always completes, so no transition is
    /// left half-applied.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let stats = self.run_cycle(&shutdown).await;
                    tracing::debug!(?stats, "poll cycle complete");
                }
                changed = shutdown.changed() => {
                    // A dropped sender can never signal, so it counts as
                    // a shutdown request.
                    if changed.is_err() {
                        break;
                    }
                }
            }

            if *shutdown.borrow() {
                break;
            }
        }

        tracing::info!("poll scheduler stopped");
    }

    /// Runs one poll cycle over a snapshot of the subscription list.
    ///
    /// Registrations and removals arriving mid-cycle are simply reflected
    /// in the next cycle.
    pub async fn run_cycle(&self, shutdown: &watch::Receiver<bool>) -> CycleStats {
        let mut stats = CycleStats::default();

        let subscriptions = match self.registry.list_all() {
            Ok(subscriptions) => subscriptions,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read subscription list, skipping cycle");
                return stats;
            },
        };
        stats.subscriptions = subscriptions.len();

        let mut by_entity: BTreeMap<u64, Vec<Subscription>> = BTreeMap::new();
        for subscription in subscriptions {
            by_entity
                .entry(subscription.entity_id)
                .or_default()
                .push(subscription);
        }

        'cycle: for (entity_id, subscriptions) in by_entity {
            let (snapshot, live) = self.fetcher.fetch(entity_id).await;
            stats.fetches += 1;
            tracing::trace!(entity_id, live, status = %snapshot.label(), "fetched presence");

            for subscription in &subscriptions {
                if let Err(e) = self.process_subscription(subscription, &snapshot, &mut stats).await
                {
                    stats.errors += 1;
                    tracing::warn!(
                        subscriber_id = subscription.subscriber_id,
                        entity_id,
                        error = %e,
                        "subscription processing failed"
                    );
                }

                if *shutdown.borrow() {
                    tracing::info!("shutdown requested, ending cycle after current unit of work");
                    break 'cycle;
                }
            }
        }

        stats
    }

    /// Processes one subscription against an already-fetched snapshot.
    ///
    /// On a reportable transition the notification is composed and
    /// dispatched, then the recorded status is updated whether or not
    /// delivery succeeded — an unreachable recipient must not cause the
    /// same transition to be redetected next cycle.
    async fn process_subscription(
        &self,
        subscription: &Subscription,
        snapshot: &PresenceSnapshot,
        stats: &mut CycleStats,
    ) -> Result<()> {
        let Some(transition) = classify(subscription.last_status, snapshot) else {
            return Ok(());
        };

        let profile = profile_or_unknown(&*self.profiles, subscription.entity_id).await;
        let notification = compose(subscription, &transition, &profile, &*self.games).await;

        stats.dispatched += 1;
        if let Err(e) = self
            .delivery
            .deliver(subscription.subscriber_id, &notification)
            .await
        {
            stats.delivery_failures += 1;
            tracing::warn!(
                subscriber_id = subscription.subscriber_id,
                entity_id = subscription.entity_id,
                error = %e,
                "notification delivery failed, advancing status anyway"
            );
        }

        let updated = self.registry.update_status(
            subscription.subscriber_id,
            subscription.entity_id,
            transition.snapshot.status,
        );

        if updated.is_ok() {
            tracing::info!(
                subscriber_id = subscription.subscriber_id,
                entity_id = subscription.entity_id,
                previous = ?transition.previous,
                new = %transition.snapshot.status,
                kind = ?transition.kind,
                "processed transition"
            );
        }

        // Pace chat deliveries, not fetches. A delivery went out above,
        // so the delay applies even when the status write failed.
        tokio::time::sleep(self.pacing_delay).await;
        updated
    }
}
