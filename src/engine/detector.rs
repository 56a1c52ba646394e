//! Status transition classification.

use crate::models::{PresenceSnapshot, Transition, TransitionKind};
use crate::PresenceStatus;

/// Classifies the change between a subscription's last recorded status and
/// a newly observed snapshot.
///
/// Returns `None` when there is nothing to report: the new status is the
/// Unknown sentinel (insufficient information to assert a change), or it
/// equals the previous recorded status exactly. Staleness alone never
/// creates a transition — a stale `InGame` after a recorded `InGame` is a
/// no-op.
///
/// Reportable changes classify in priority order:
///
/// 1. [`TransitionKind::WentOffline`] — previous was `InGame`, new is not.
/// 2. [`TransitionKind::EnteredGame`] — new is `InGame`, previous was not
///    (including no previous status at all).
/// 3. [`TransitionKind::GenericChange`] — any other differing pair.
#[must_use]
pub fn classify(
    previous: Option<PresenceStatus>,
    snapshot: &PresenceSnapshot,
) -> Option<Transition> {
    if snapshot.status.is_unknown() {
        return None;
    }
    if previous == Some(snapshot.status) {
        return None;
    }

    let kind = match previous {
        Some(p) if p.is_in_game() => TransitionKind::WentOffline,
        _ if snapshot.status.is_in_game() => TransitionKind::EnteredGame,
        _ => TransitionKind::GenericChange,
    };

    Some(Transition {
        kind,
        previous,
        snapshot: snapshot.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn snap(status: PresenceStatus) -> PresenceSnapshot {
        PresenceSnapshot::live(status, None)
    }

    #[test_case(PresenceStatus::InGame, PresenceStatus::Online, TransitionKind::WentOffline; "left game to online")]
    #[test_case(PresenceStatus::InGame, PresenceStatus::Invisible, TransitionKind::WentOffline; "left game to invisible")]
    #[test_case(PresenceStatus::InGame, PresenceStatus::InStudio, TransitionKind::WentOffline; "left game to studio")]
    #[test_case(PresenceStatus::Online, PresenceStatus::InGame, TransitionKind::EnteredGame; "online to game")]
    #[test_case(PresenceStatus::Invisible, PresenceStatus::InGame, TransitionKind::EnteredGame; "invisible to game")]
    #[test_case(PresenceStatus::Online, PresenceStatus::Invisible, TransitionKind::GenericChange; "online to invisible")]
    #[test_case(PresenceStatus::InStudio, PresenceStatus::Online, TransitionKind::GenericChange; "studio to online")]
    fn test_classification_table(
        previous: PresenceStatus,
        new: PresenceStatus,
        expected: TransitionKind,
    ) {
        let transition = classify(Some(previous), &snap(new)).expect("reportable");
        assert_eq!(transition.kind, expected);
        assert_eq!(transition.previous, Some(previous));
        assert_eq!(transition.snapshot.status, new);
    }

    #[test]
    fn test_no_previous_status() {
        let t = classify(None, &snap(PresenceStatus::InGame)).expect("reportable");
        assert_eq!(t.kind, TransitionKind::EnteredGame);

        let t = classify(None, &snap(PresenceStatus::Online)).expect("reportable");
        assert_eq!(t.kind, TransitionKind::GenericChange);
    }

    #[test]
    fn test_unknown_is_never_reportable() {
        assert!(classify(Some(PresenceStatus::InGame), &snap(PresenceStatus::Unknown)).is_none());
        assert!(classify(None, &PresenceSnapshot::unknown_stale()).is_none());
    }

    #[test]
    fn test_equal_status_is_a_noop() {
        for status in PresenceStatus::all() {
            assert!(classify(Some(*status), &snap(*status)).is_none());
        }
    }

    #[test]
    fn test_stale_equal_status_is_still_a_noop() {
        // Scenario B: live fetch failed, cache holds InGame, previous is
        // InGame. Staleness does not make an unchanged status reportable.
        let mut cached = snap(PresenceStatus::InGame);
        cached.mark_stale();
        assert!(classify(Some(PresenceStatus::InGame), &cached).is_none());
    }

    #[test]
    fn test_stale_differing_status_is_reportable() {
        let mut cached = snap(PresenceStatus::Online);
        cached.mark_stale();
        let t = classify(Some(PresenceStatus::InGame), &cached).expect("reportable");
        assert_eq!(t.kind, TransitionKind::WentOffline);
        assert!(t.snapshot.stale);
    }
}
