//! Storage backends.
//!
//! Two stores back the engine: the subscription registry (SQLite,
//! authoritative for who tracks whom and the last recorded status) and the
//! presence cache (JSON file, last successfully observed snapshot per
//! tracked account). Both sit behind traits so the engine and tests can
//! swap implementations.

mod cache;
mod registry;

pub use cache::{JsonFileCache, MemoryCache, PresenceCache};
pub use registry::{SqliteRegistry, SubscriptionRegistry};
