//! Subscription registry trait and SQLite backend.

use crate::models::{PresenceStatus, Subscription};
use crate::{Error, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

/// Trait for subscription registry backends.
///
/// The registry is the authoritative record of which subscriber tracks
/// which Roblox account, the primary flag, and the status recorded after
/// the last processed transition. The poll scheduler reads the full list
/// at cycle start and writes one row per processed subscription.
pub trait SubscriptionRegistry: Send + Sync {
    /// Lists every subscription.
    fn list_all(&self) -> Result<Vec<Subscription>>;

    /// Lists a single subscriber's subscriptions.
    fn list_for(&self, subscriber_id: u64) -> Result<Vec<Subscription>>;

    /// Looks up one subscription by its (subscriber, entity) key.
    fn get(&self, subscriber_id: u64, entity_id: u64) -> Result<Option<Subscription>>;

    /// Inserts a subscription row.
    fn add(&self, subscription: &Subscription) -> Result<()>;

    /// Deletes a subscription row. Returns `true` if a row was deleted.
    fn remove(&self, subscriber_id: u64, entity_id: u64) -> Result<bool>;

    /// Records the status of the last processed transition.
    fn update_status(
        &self,
        subscriber_id: u64,
        entity_id: u64,
        status: PresenceStatus,
    ) -> Result<()>;

    /// Number of subscriptions a subscriber currently holds.
    fn count_for(&self, subscriber_id: u64) -> Result<usize>;

    /// Distinct subscriber ids, for broadcasts.
    fn distinct_subscribers(&self) -> Result<Vec<u64>>;
}

/// Helper to acquire a mutex lock with poison recovery.
///
/// If the mutex is poisoned by a panic in a previous critical section we
/// recover the inner value and log a warning, so one panicked operation
/// cannot take the whole registry down with it.
pub(crate) fn acquire_lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::warn!("registry mutex was poisoned, recovering");
            poisoned.into_inner()
        },
    }
}

/// Converts an external identifier to SQLite's integer type.
fn encode_id(id: u64, what: &str) -> Result<i64> {
    i64::try_from(id).map_err(|_| Error::InvalidInput(format!("{what} {id} out of range")))
}

/// `SQLite`-based subscription registry.
///
/// # Concurrency Model
///
/// Uses a `Mutex<Connection>` because `rusqlite::Connection` is not `Sync`.
/// WAL mode and a 5-second `busy_timeout` handle contention between the
/// poll driver and on-demand CLI queries; last-write-wins is acceptable
/// per the engine's consistency requirements.
pub struct SqliteRegistry {
    /// Connection to the `SQLite` database.
    conn: Mutex<Connection>,
    /// Path to the database file (None for in-memory).
    db_path: Option<PathBuf>,
}

impl SqliteRegistry {
    /// Creates a registry backed by a database file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Registry`] if the database cannot be opened or
    /// initialized.
    pub fn new(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();
        let conn = Connection::open(&db_path).map_err(|e| Error::Registry {
            operation: "open_sqlite".to_string(),
            cause: e.to_string(),
        })?;

        let registry = Self {
            conn: Mutex::new(conn),
            db_path: Some(db_path),
        };

        registry.initialize()?;
        Ok(registry)
    }

    /// Creates an in-memory registry (useful for testing).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Registry`] if the schema cannot be initialized.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| Error::Registry {
            operation: "open_sqlite_in_memory".to_string(),
            cause: e.to_string(),
        })?;

        let registry = Self {
            conn: Mutex::new(conn),
            db_path: None,
        };

        registry.initialize()?;
        Ok(registry)
    }

    /// Returns the database path (None for in-memory).
    #[must_use]
    pub const fn db_path(&self) -> Option<&PathBuf> {
        self.db_path.as_ref()
    }

    /// Initializes pragmas and the schema.
    fn initialize(&self) -> Result<()> {
        let conn = acquire_lock(&self.conn);

        // journal_mode returns a row, which would make execute_batch fail.
        let _ = conn.pragma_update(None, "journal_mode", "WAL");
        let _ = conn.pragma_update(None, "synchronous", "NORMAL");
        let _ = conn.pragma_update(None, "busy_timeout", "5000");

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS subscriptions (
                 subscriber_id INTEGER NOT NULL,
                 entity_id     INTEGER NOT NULL,
                 is_primary    INTEGER NOT NULL DEFAULT 0,
                 last_status   INTEGER,
                 display_name  TEXT,
                 PRIMARY KEY (subscriber_id, entity_id)
             );",
        )
        .map_err(|e| Error::Registry {
            operation: "initialize_schema".to_string(),
            cause: e.to_string(),
        })
    }

    fn row_to_subscription(row: &rusqlite::Row<'_>) -> rusqlite::Result<Subscription> {
        let subscriber_id: i64 = row.get(0)?;
        let entity_id: i64 = row.get(1)?;
        let is_primary: bool = row.get(2)?;
        let last_status: Option<i64> = row.get(3)?;
        let display_name: Option<String> = row.get(4)?;

        Ok(Subscription {
            subscriber_id: subscriber_id.unsigned_abs(),
            entity_id: entity_id.unsigned_abs(),
            is_primary,
            last_status: last_status.map(PresenceStatus::from_code),
            display_name,
        })
    }

    fn query_rows(&self, sql: &str, params: &[&dyn rusqlite::ToSql]) -> Result<Vec<Subscription>> {
        let conn = acquire_lock(&self.conn);
        let mut stmt = conn.prepare(sql).map_err(|e| Error::Registry {
            operation: "prepare_query".to_string(),
            cause: e.to_string(),
        })?;

        let rows = stmt
            .query_map(params, Self::row_to_subscription)
            .map_err(|e| Error::Registry {
                operation: "query_subscriptions".to_string(),
                cause: e.to_string(),
            })?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| Error::Registry {
                operation: "read_subscription_row".to_string(),
                cause: e.to_string(),
            })
    }
}

const SELECT_COLUMNS: &str =
    "SELECT subscriber_id, entity_id, is_primary, last_status, display_name FROM subscriptions";

impl SubscriptionRegistry for SqliteRegistry {
    fn list_all(&self) -> Result<Vec<Subscription>> {
        self.query_rows(
            &format!("{SELECT_COLUMNS} ORDER BY subscriber_id, entity_id"),
            &[],
        )
    }

    fn list_for(&self, subscriber_id: u64) -> Result<Vec<Subscription>> {
        let id = encode_id(subscriber_id, "subscriber id")?;
        self.query_rows(
            &format!("{SELECT_COLUMNS} WHERE subscriber_id = ?1 ORDER BY entity_id"),
            &[&id],
        )
    }

    fn get(&self, subscriber_id: u64, entity_id: u64) -> Result<Option<Subscription>> {
        let subscriber = encode_id(subscriber_id, "subscriber id")?;
        let entity = encode_id(entity_id, "entity id")?;

        let conn = acquire_lock(&self.conn);
        conn.query_row(
            &format!("{SELECT_COLUMNS} WHERE subscriber_id = ?1 AND entity_id = ?2"),
            params![subscriber, entity],
            Self::row_to_subscription,
        )
        .optional()
        .map_err(|e| Error::Registry {
            operation: "get_subscription".to_string(),
            cause: e.to_string(),
        })
    }

    fn add(&self, subscription: &Subscription) -> Result<()> {
        let subscriber = encode_id(subscription.subscriber_id, "subscriber id")?;
        let entity = encode_id(subscription.entity_id, "entity id")?;

        let conn = acquire_lock(&self.conn);
        conn.execute(
            "INSERT INTO subscriptions (subscriber_id, entity_id, is_primary, last_status, display_name)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                subscriber,
                entity,
                subscription.is_primary,
                subscription.last_status.and_then(PresenceStatus::code),
                subscription.display_name,
            ],
        )
        .map_err(|e| Error::Registry {
            operation: "add_subscription".to_string(),
            cause: e.to_string(),
        })?;

        Ok(())
    }

    fn remove(&self, subscriber_id: u64, entity_id: u64) -> Result<bool> {
        let subscriber = encode_id(subscriber_id, "subscriber id")?;
        let entity = encode_id(entity_id, "entity id")?;

        let conn = acquire_lock(&self.conn);
        let deleted = conn
            .execute(
                "DELETE FROM subscriptions WHERE subscriber_id = ?1 AND entity_id = ?2",
                params![subscriber, entity],
            )
            .map_err(|e| Error::Registry {
                operation: "remove_subscription".to_string(),
                cause: e.to_string(),
            })?;

        Ok(deleted > 0)
    }

    fn update_status(
        &self,
        subscriber_id: u64,
        entity_id: u64,
        status: PresenceStatus,
    ) -> Result<()> {
        let subscriber = encode_id(subscriber_id, "subscriber id")?;
        let entity = encode_id(entity_id, "entity id")?;

        let conn = acquire_lock(&self.conn);
        conn.execute(
            "UPDATE subscriptions SET last_status = ?3
             WHERE subscriber_id = ?1 AND entity_id = ?2",
            params![subscriber, entity, status.code()],
        )
        .map_err(|e| Error::Registry {
            operation: "update_status".to_string(),
            cause: e.to_string(),
        })?;

        Ok(())
    }

    fn count_for(&self, subscriber_id: u64) -> Result<usize> {
        let id = encode_id(subscriber_id, "subscriber id")?;

        let conn = acquire_lock(&self.conn);
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM subscriptions WHERE subscriber_id = ?1",
                params![id],
                |row| row.get(0),
            )
            .map_err(|e| Error::Registry {
                operation: "count_subscriptions".to_string(),
                cause: e.to_string(),
            })?;

        Ok(usize::try_from(count).unwrap_or(0))
    }

    fn distinct_subscribers(&self) -> Result<Vec<u64>> {
        let conn = acquire_lock(&self.conn);
        let mut stmt = conn
            .prepare("SELECT DISTINCT subscriber_id FROM subscriptions ORDER BY subscriber_id")
            .map_err(|e| Error::Registry {
                operation: "prepare_query".to_string(),
                cause: e.to_string(),
            })?;

        let rows = stmt
            .query_map([], |row| row.get::<_, i64>(0))
            .map_err(|e| Error::Registry {
                operation: "query_subscribers".to_string(),
                cause: e.to_string(),
            })?;

        rows.map(|r| r.map(i64::unsigned_abs))
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| Error::Registry {
                operation: "read_subscriber_row".to_string(),
                cause: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sub(subscriber_id: u64, entity_id: u64, is_primary: bool) -> Subscription {
        Subscription {
            subscriber_id,
            entity_id,
            is_primary,
            last_status: Some(PresenceStatus::Online),
            display_name: Some("builderman".to_string()),
        }
    }

    #[test]
    fn test_add_get_remove() {
        let registry = SqliteRegistry::in_memory().expect("registry");
        registry.add(&sub(7, 42, true)).expect("add");

        let stored = registry.get(7, 42).expect("get").expect("present");
        assert!(stored.is_primary);
        assert_eq!(stored.last_status, Some(PresenceStatus::Online));
        assert_eq!(stored.display_name.as_deref(), Some("builderman"));

        assert!(registry.remove(7, 42).expect("remove"));
        assert!(!registry.remove(7, 42).expect("second remove"));
        assert!(registry.get(7, 42).expect("get").is_none());
    }

    #[test]
    fn test_duplicate_add_rejected() {
        let registry = SqliteRegistry::in_memory().expect("registry");
        registry.add(&sub(7, 42, true)).expect("add");
        assert!(matches!(
            registry.add(&sub(7, 42, false)),
            Err(Error::Registry { .. })
        ));
    }

    #[test]
    fn test_update_status_round_trips() {
        let registry = SqliteRegistry::in_memory().expect("registry");
        registry.add(&sub(7, 42, true)).expect("add");

        registry
            .update_status(7, 42, PresenceStatus::InGame)
            .expect("update");
        let stored = registry.get(7, 42).expect("get").expect("present");
        assert_eq!(stored.last_status, Some(PresenceStatus::InGame));
    }

    #[test]
    fn test_null_status_maps_to_none() {
        let registry = SqliteRegistry::in_memory().expect("registry");
        let mut s = sub(7, 42, true);
        s.last_status = None;
        registry.add(&s).expect("add");

        let stored = registry.get(7, 42).expect("get").expect("present");
        assert!(stored.last_status.is_none());
    }

    #[test]
    fn test_count_and_distinct() {
        let registry = SqliteRegistry::in_memory().expect("registry");
        registry.add(&sub(7, 42, true)).expect("add");
        registry.add(&sub(7, 43, false)).expect("add");
        registry.add(&sub(9, 42, true)).expect("add");

        assert_eq!(registry.count_for(7).expect("count"), 2);
        assert_eq!(registry.count_for(9).expect("count"), 1);
        assert_eq!(registry.count_for(11).expect("count"), 0);
        assert_eq!(registry.distinct_subscribers().expect("distinct"), vec![7, 9]);
        assert_eq!(registry.list_all().expect("list").len(), 3);
        assert_eq!(registry.list_for(7).expect("list").len(), 2);
    }
}
