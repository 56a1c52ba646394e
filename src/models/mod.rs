//! Data models for statuswatch.
//!
//! This module contains the core data structures shared by the engine,
//! storage, and delivery layers.

mod presence;
mod subscription;
mod transition;

pub use presence::{PresenceSnapshot, PresenceStatus};
pub use subscription::Subscription;
pub use transition::{Transition, TransitionKind};
