//! The Index Registry: lazy-per-collection in-memory cache backed by the
//! `index_registry` table (§4.C).
//!
//! Follows the teacher's connection-owning-struct pattern (`ZenDb`): the
//! registry holds a `libsql::Connection` and exposes async methods that
//! read/write through it, keeping an in-memory cache for cheap repeated
//! lookups within a request.

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use hotfield_core::json::DataType;
use tracing::{debug, warn};

use crate::error::IndexError;
use crate::slot::{IndexStats, SlotBinding};
use crate::snapshot::IndexSnapshot;

fn data_type_from_str(s: &str) -> DataType {
    match s {
        "INTEGER" => DataType::Integer,
        "REAL" => DataType::Real,
        _ => DataType::Text,
    }
}

/// In-memory cache of per-collection slot bindings, backed by the
/// `index_registry` table.
///
/// Collections are loaded lazily: the first call touching a collection
/// pulls its bindings from storage; subsequent calls serve from cache.
/// Promotion (`bind`) invalidates nothing else — it simply adds to the
/// cache for the collection it targets, matching the teacher's
/// lazy-load-with-invalidation-on-write policy.
pub struct IndexRegistry {
    conn: libsql::Connection,
    pool_size: usize,
    loaded: HashSet<String>,
    cache: HashMap<String, HashMap<String, SlotBinding>>,
}

impl IndexRegistry {
    #[must_use]
    pub fn new(conn: libsql::Connection, pool_size: usize) -> Self {
        Self { conn, pool_size, loaded: HashSet::new(), cache: HashMap::new() }
    }

    #[must_use]
    pub const fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// Load the bindings for `collection` from storage into the cache.
    /// A no-op if already loaded.
    ///
    /// # Errors
    ///
    /// Returns `IndexError::LibSql` if the query fails.
    pub async fn load(&mut self, collection: &str) -> Result<(), IndexError> {
        if self.loaded.contains(collection) {
            return Ok(());
        }

        let mut rows = self
            .conn
            .query(
                "SELECT field_path, slot, data_type FROM index_registry WHERE collection = ?1",
                [collection],
            )
            .await?;

        let mut bindings = HashMap::new();
        while let Some(row) = rows.next().await? {
            let field_path: String = row.get(0)?;
            let slot: i64 = row.get(1)?;
            let data_type: String = row.get(2)?;
            bindings.insert(
                field_path.clone(),
                SlotBinding { field_path, slot: slot as u32, data_type: data_type_from_str(&data_type) },
            );
        }

        debug!(collection, bindings = bindings.len(), "loaded index registry bindings");
        self.cache.insert(collection.to_string(), bindings);
        self.loaded.insert(collection.to_string());
        Ok(())
    }

    /// The slot binding for `field_path` in `collection`, or `None` if the
    /// field has not been promoted. Requires `load` to have been called
    /// for this collection first; an un-loaded collection always reports
    /// no bindings.
    #[must_use]
    pub fn mapping(&self, collection: &str, field_path: &str) -> Option<&SlotBinding> {
        self.cache.get(collection)?.get(field_path)
    }

    /// All bindings for `collection`, in no particular order.
    #[must_use]
    pub fn mappings_of(&self, collection: &str) -> Vec<&SlotBinding> {
        self.cache.get(collection).map(|m| m.values().collect()).unwrap_or_default()
    }

    /// The lowest-numbered free slot for `collection`, or `None` if the
    /// pool is exhausted.
    #[must_use]
    pub fn allocate_slot(&self, collection: &str) -> Option<u32> {
        let used: HashSet<u32> =
            self.cache.get(collection).map(|m| m.values().map(|b| b.slot).collect()).unwrap_or_default();
        (1..=self.pool_size as u32).find(|slot| !used.contains(slot))
    }

    /// Persist and cache a new binding.
    ///
    /// # Errors
    ///
    /// Returns `IndexError::AlreadyBound` if `field_path` already has a
    /// binding, `IndexError::SlotAlreadyUsed` if `slot` is occupied by a
    /// different field, `IndexError::SlotOutOfRange` if `slot` is outside
    /// `1..=pool_size`, or `IndexError::LibSql` on a storage failure.
    pub async fn bind(
        &mut self,
        collection: &str,
        field_path: &str,
        slot: u32,
        data_type: DataType,
    ) -> Result<(), IndexError> {
        if slot == 0 || slot as usize > self.pool_size {
            return Err(IndexError::SlotOutOfRange { slot, pool_size: self.pool_size });
        }

        self.load(collection).await?;

        let existing = self.cache.entry(collection.to_string()).or_default();
        if existing.contains_key(field_path) {
            return Err(IndexError::AlreadyBound {
                collection: collection.to_string(),
                field_path: field_path.to_string(),
            });
        }
        if existing.values().any(|b| b.slot == slot) {
            return Err(IndexError::SlotAlreadyUsed { collection: collection.to_string(), slot });
        }

        let now = Utc::now().to_rfc3339();
        self.conn
            .execute(
                "INSERT INTO index_registry (collection, field_path, slot, data_type, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                libsql::params![collection, field_path, i64::from(slot), data_type.as_sql(), now],
            )
            .await?;

        existing.insert(
            field_path.to_string(),
            SlotBinding { field_path: field_path.to_string(), slot, data_type },
        );

        tracing::info!(collection, field_path, slot, %data_type, "bound field to index slot");
        Ok(())
    }

    /// Summary statistics for a collection's slot usage.
    #[must_use]
    pub fn stats(&self, collection: &str) -> IndexStats {
        let bindings: Vec<SlotBinding> = self.cache.get(collection).map(|m| m.values().cloned().collect()).unwrap_or_default();
        IndexStats { pool_size: self.pool_size, slots_used: bindings.len(), bindings }
    }

    /// An immutable snapshot of `collection`'s bindings for the Query
    /// Translator.
    #[must_use]
    pub fn snapshot(&self, collection: &str) -> IndexSnapshot {
        if !self.loaded.contains(collection) {
            warn!(collection, "snapshot requested before load(); treating as unindexed");
        }
        IndexSnapshot::new(self.pool_size, self.cache.get(collection).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_conn() -> libsql::Connection {
        let db = libsql::Builder::new_local(":memory:").build().await.unwrap();
        let conn = db.connect().unwrap();
        conn.execute_batch(
            "CREATE TABLE index_registry (
                collection TEXT NOT NULL,
                field_path TEXT NOT NULL,
                slot INTEGER NOT NULL,
                data_type TEXT NOT NULL,
                created_at TEXT NOT NULL,
                PRIMARY KEY (collection, field_path)
            );",
        )
        .await
        .unwrap();
        conn
    }

    #[tokio::test]
    async fn bind_then_mapping_roundtrips() {
        let conn = test_conn().await;
        let mut reg = IndexRegistry::new(conn, 20);
        reg.load("users").await.unwrap();
        reg.bind("users", "email", 1, DataType::Text).await.unwrap();

        let binding = reg.mapping("users", "email").unwrap();
        assert_eq!(binding.slot, 1);
        assert_eq!(binding.data_type, DataType::Text);
        assert!(reg.mapping("users", "age").is_none());
    }

    #[tokio::test]
    async fn double_bind_same_field_fails() {
        let conn = test_conn().await;
        let mut reg = IndexRegistry::new(conn, 20);
        reg.bind("users", "email", 1, DataType::Text).await.unwrap();
        let err = reg.bind("users", "email", 2, DataType::Text).await.unwrap_err();
        assert!(matches!(err, IndexError::AlreadyBound { .. }));
    }

    #[tokio::test]
    async fn binding_an_occupied_slot_fails() {
        let conn = test_conn().await;
        let mut reg = IndexRegistry::new(conn, 20);
        reg.bind("users", "email", 1, DataType::Text).await.unwrap();
        let err = reg.bind("users", "age", 1, DataType::Integer).await.unwrap_err();
        assert!(matches!(err, IndexError::SlotAlreadyUsed { .. }));
    }

    #[tokio::test]
    async fn allocate_slot_finds_lowest_free() {
        let conn = test_conn().await;
        let mut reg = IndexRegistry::new(conn, 3);
        reg.load("users").await.unwrap();
        assert_eq!(reg.allocate_slot("users"), Some(1));
        reg.bind("users", "email", 1, DataType::Text).await.unwrap();
        assert_eq!(reg.allocate_slot("users"), Some(2));
        reg.bind("users", "age", 2, DataType::Integer).await.unwrap();
        reg.bind("users", "name", 3, DataType::Text).await.unwrap();
        assert_eq!(reg.allocate_slot("users"), None);
    }

    #[tokio::test]
    async fn bindings_persist_and_reload() {
        let conn = test_conn().await;
        {
            let mut reg = IndexRegistry::new(conn.clone(), 20);
            reg.bind("users", "email", 1, DataType::Text).await.unwrap();
        }

        let mut reg2 = IndexRegistry::new(conn, 20);
        reg2.load("users").await.unwrap();
        assert_eq!(reg2.mapping("users", "email").unwrap().slot, 1);
    }

    #[tokio::test]
    async fn stats_reports_pool_usage() {
        let conn = test_conn().await;
        let mut reg = IndexRegistry::new(conn, 20);
        reg.bind("users", "email", 1, DataType::Text).await.unwrap();
        reg.bind("users", "age", 2, DataType::Integer).await.unwrap();

        let stats = reg.stats("users");
        assert_eq!(stats.pool_size, 20);
        assert_eq!(stats.slots_used, 2);
    }

    #[tokio::test]
    async fn slot_out_of_range_is_rejected() {
        let conn = test_conn().await;
        let mut reg = IndexRegistry::new(conn, 20);
        let err = reg.bind("users", "email", 21, DataType::Text).await.unwrap_err();
        assert!(matches!(err, IndexError::SlotOutOfRange { .. }));
    }
}
