//! Notification composition.

use crate::models::{PresenceSnapshot, PresenceStatus, Subscription, Transition, TransitionKind};
use crate::notify::{Notification, COLOR_BLUE, COLOR_GREEN};
use crate::roblox::{EntityProfile, GameTitleApi};

/// Note attached when the underlying data came from the cache.
const STALE_NOTE: &str = "* indicates cached data which may be inaccurate";

const fn color_for(status: PresenceStatus) -> u32 {
    match status {
        PresenceStatus::Online | PresenceStatus::InGame => COLOR_GREEN,
        _ => COLOR_BLUE,
    }
}

fn title_part(transition: &Transition) -> String {
    match transition.kind {
        TransitionKind::WentOffline => "is now offline".to_string(),
        TransitionKind::EnteredGame => "is now InGame".to_string(),
        // Stale marker is stripped from the title; the note field carries
        // the staleness warning instead.
        TransitionKind::GenericChange => format!("is now {}", transition.snapshot.status),
    }
}

/// Attempts the game-title lookup and appends the Playing field.
///
/// Lookup failure is silent: the field is simply omitted, never blocking
/// delivery.
async fn push_game_field(
    notification: &mut Notification,
    snapshot: &PresenceSnapshot,
    games: &dyn GameTitleApi,
) {
    let Some(place_id) = snapshot.place_id else {
        return;
    };
    match games.place_details(place_id).await {
        Ok(game) => {
            notification.push_field("Playing", format!("[{}]({})", game.name, game.url));
        },
        Err(e) => {
            tracing::debug!(place_id, error = %e, "game title lookup failed, omitting field");
        },
    }
}

/// Composes the notification for a reportable transition.
///
/// Pure message shaping plus one optional read-only lookup (the game
/// title, only for [`TransitionKind::EnteredGame`] with a known place id).
/// Nothing is sent from here.
pub async fn compose(
    subscription: &Subscription,
    transition: &Transition,
    profile: &EntityProfile,
    games: &dyn GameTitleApi,
) -> Notification {
    let title = format!(
        "{} {} {}",
        subscription.icon(),
        profile.name,
        title_part(transition)
    );

    let mut notification = Notification::new(title, color_for(transition.snapshot.status));
    notification.thumbnail_url = Some(profile.thumbnail_url.clone());

    if transition.kind == TransitionKind::EnteredGame {
        push_game_field(&mut notification, &transition.snapshot, games).await;
    }

    if transition.snapshot.stale {
        notification.push_field("Note", STALE_NOTE);
    }

    notification
}

/// Composes the embed for a one-shot interactive status check.
///
/// Unlike transition notifications the title shows the label with any
/// stale marker intact, plus a status emoji.
pub async fn compose_status_check(
    subscription: &Subscription,
    snapshot: &PresenceSnapshot,
    profile: &EntityProfile,
    games: &dyn GameTitleApi,
) -> Notification {
    let title = format!(
        "{} {} {} is {}",
        subscription.icon(),
        snapshot.status.emoji(),
        profile.name,
        snapshot.label()
    );

    let mut notification = Notification::new(title, color_for(snapshot.status));
    notification.thumbnail_url = Some(profile.thumbnail_url.clone());

    if snapshot.status.is_in_game() {
        push_game_field(&mut notification, snapshot, games).await;
    }

    if snapshot.stale {
        notification.push_field("Note", STALE_NOTE);
    }

    notification
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::classify;
    use crate::notify::FOOTER_LEGEND;
    use crate::roblox::{ApiError, GameInfo};
    use async_trait::async_trait;

    struct StubGames {
        result: Option<GameInfo>,
    }

    #[async_trait]
    impl GameTitleApi for StubGames {
        async fn place_details(&self, place_id: u64) -> Result<GameInfo, ApiError> {
            self.result
                .clone()
                .ok_or(ApiError::MissingRecord(place_id))
        }
    }

    fn games_with(name: &str, place_id: u64) -> StubGames {
        StubGames {
            result: Some(GameInfo {
                name: name.to_string(),
                url: format!("https://www.roblox.com/games/{place_id}"),
            }),
        }
    }

    fn games_failing() -> StubGames {
        StubGames { result: None }
    }

    fn sub(is_primary: bool) -> Subscription {
        Subscription {
            subscriber_id: 7,
            entity_id: 42,
            is_primary,
            last_status: Some(PresenceStatus::InGame),
            display_name: Some("builderman".to_string()),
        }
    }

    fn profile() -> EntityProfile {
        EntityProfile {
            name: "builderman".to_string(),
            thumbnail_url: "https://example.com/headshot.png".to_string(),
        }
    }

    #[tokio::test]
    async fn test_went_offline_title() {
        let snapshot = PresenceSnapshot::live(PresenceStatus::Online, None);
        let transition = classify(Some(PresenceStatus::InGame), &snapshot).expect("reportable");

        let n = compose(&sub(true), &transition, &profile(), &games_failing()).await;
        assert_eq!(n.title, "👑 builderman is now offline");
        assert_eq!(n.color, COLOR_GREEN);
        assert_eq!(n.footer, FOOTER_LEGEND);
        assert!(n.fields.is_empty());
    }

    #[tokio::test]
    async fn test_entered_game_attaches_playing_field() {
        let snapshot = PresenceSnapshot::live(PresenceStatus::InGame, Some(606_849_621));
        let transition = classify(Some(PresenceStatus::Online), &snapshot).expect("reportable");

        let n = compose(
            &sub(false),
            &transition,
            &profile(),
            &games_with("Jailbreak", 606_849_621),
        )
        .await;
        assert_eq!(n.title, "👤 builderman is now InGame");
        assert_eq!(n.fields.len(), 1);
        assert_eq!(n.fields[0].name, "Playing");
        assert_eq!(
            n.fields[0].value,
            "[Jailbreak](https://www.roblox.com/games/606849621)"
        );
    }

    #[tokio::test]
    async fn test_game_lookup_failure_omits_field() {
        let snapshot = PresenceSnapshot::live(PresenceStatus::InGame, Some(606_849_621));
        let transition = classify(Some(PresenceStatus::Online), &snapshot).expect("reportable");

        let n = compose(&sub(false), &transition, &profile(), &games_failing()).await;
        assert!(n.fields.is_empty());
    }

    #[tokio::test]
    async fn test_entered_game_without_place_id_omits_field() {
        let snapshot = PresenceSnapshot::live(PresenceStatus::InGame, None);
        let transition = classify(Some(PresenceStatus::Online), &snapshot).expect("reportable");

        let n = compose(&sub(false), &transition, &profile(), &games_failing()).await;
        assert!(n.fields.is_empty());
    }

    #[tokio::test]
    async fn test_stale_title_stripped_and_note_added() {
        let mut snapshot = PresenceSnapshot::live(PresenceStatus::Invisible, None);
        snapshot.mark_stale();
        let transition = classify(Some(PresenceStatus::Online), &snapshot).expect("reportable");

        let n = compose(&sub(true), &transition, &profile(), &games_failing()).await;
        // Title shows the bare status; the marker lives in the note.
        assert_eq!(n.title, "👑 builderman is now Invisible");
        assert_eq!(n.fields.len(), 1);
        assert_eq!(n.fields[0].name, "Note");
    }

    #[tokio::test]
    async fn test_status_check_keeps_marker() {
        let mut snapshot = PresenceSnapshot::live(PresenceStatus::Online, None);
        snapshot.mark_stale();

        let n = compose_status_check(&sub(true), &snapshot, &profile(), &games_failing()).await;
        assert_eq!(n.title, "👑 🟢 builderman is Online*");
        assert_eq!(n.fields.len(), 1);
        assert_eq!(n.fields[0].name, "Note");
    }
}
