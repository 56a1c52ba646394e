//! Classified status transitions.

use super::{PresenceSnapshot, PresenceStatus};

/// The kind of a reportable status change, in classification priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionKind {
    /// Previous status was `InGame` and the new one is not.
    WentOffline,
    /// New status is `InGame` and the previous one was not.
    EnteredGame,
    /// Any other differing status pair.
    GenericChange,
}

/// A reportable change between two recorded statuses.
///
/// Carries the new snapshot and the previous status so composers and logs
/// can show both sides of the change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// Classification of the change.
    pub kind: TransitionKind,
    /// Status recorded before this change, if any was recorded.
    pub previous: Option<PresenceStatus>,
    /// The newly observed snapshot.
    pub snapshot: PresenceSnapshot,
}
