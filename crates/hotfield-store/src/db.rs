//! Connection management and migration running.
//!
//! Follows the teacher's `ZenDb` pattern: a thin struct owning a
//! `libsql::Connection`, with `open_local`/`open_file` constructors and a
//! migration runner that embeds its SQL at compile time.

use crate::error::StoreError;

const MIGRATION_001: &str = include_str!("../migrations/001_initial.sql");

/// Owns the libSQL connection backing a [`crate::document_store::DocumentStore`].
pub struct HotfieldDb {
    conn: libsql::Connection,
}

impl HotfieldDb {
    /// Open an in-memory database. Every call creates an independent
    /// database -- useful for tests, not for sharing state across
    /// connections.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::LibSql` if the database cannot be opened or
    /// migrated.
    pub async fn open_in_memory() -> Result<Self, StoreError> {
        let db = libsql::Builder::new_local(":memory:").build().await?;
        let conn = db.connect()?;
        let this = Self { conn };
        this.run_migrations().await?;
        Ok(this)
    }

    /// Open (creating if absent) a file-backed database at `path`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::LibSql` if the database cannot be opened or
    /// migrated.
    pub async fn open_file(path: &str) -> Result<Self, StoreError> {
        let db = libsql::Builder::new_local(path).build().await?;
        let conn = db.connect()?;
        let this = Self { conn };
        this.run_migrations().await?;
        Ok(this)
    }

    /// The underlying connection, cloned (libSQL connections are cheap
    /// handles, following the teacher's `ZenDb::conn()` convention).
    #[must_use]
    pub fn conn(&self) -> libsql::Connection {
        self.conn.clone()
    }

    async fn run_migrations(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(MIGRATION_001).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn open_in_memory_creates_tables() {
        let db = HotfieldDb::open_in_memory().await.unwrap();
        let mut rows = db
            .conn()
            .query("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name", ())
            .await
            .unwrap();
        let mut names = Vec::new();
        while let Some(row) = rows.next().await.unwrap() {
            names.push(row.get::<String>(0).unwrap());
        }
        assert!(names.contains(&"documents".to_string()));
        assert!(names.contains(&"index_registry".to_string()));
        assert!(names.contains(&"query_patterns".to_string()));
        assert!(names.contains(&"vectors".to_string()));
    }

    #[tokio::test]
    async fn migrations_are_idempotent() {
        let db = HotfieldDb::open_in_memory().await.unwrap();
        // Re-running the migration batch must not error (CREATE ... IF NOT EXISTS).
        db.run_migrations().await.unwrap();
    }
}
