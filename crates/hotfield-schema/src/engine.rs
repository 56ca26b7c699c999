//! The Schema Evolution Engine (§4.F): promotes hot fields into indexed
//! slot columns, creates the backing partial index, and backfills
//! historical rows.

use std::collections::HashMap;

use hotfield_core::json::Json;
use hotfield_index::{slot_column_name, IndexRegistry};
use hotfield_patterns::PatternAnalyzer;
use libsql::Value;
use tracing::{info, warn};

use crate::error::SchemaError;
use crate::paths::{is_array_segment_path, leaf_paths};

/// Rows touched per backfill page, per §4.F.
pub const BACKFILL_PAGE_SIZE: i64 = 1000;

/// Owns the connection used for DDL and backfill; collaborates with an
/// [`IndexRegistry`] and [`PatternAnalyzer`] supplied by the caller
/// (the Document Store Surface owns both, long-lived, across requests).
pub struct SchemaEngine {
    conn: libsql::Connection,
    backfill_page_size: i64,
}

impl SchemaEngine {
    #[must_use]
    pub const fn new(conn: libsql::Connection) -> Self {
        Self::with_page_size(conn, BACKFILL_PAGE_SIZE)
    }

    /// Build a `SchemaEngine` with a non-default backfill page size
    /// (§5's "Maximum backfill page: 1,000 rows" is the canonical bound;
    /// this lets `HotfieldConfig::backfill_page_size` override it).
    #[must_use]
    pub const fn with_page_size(conn: libsql::Connection, backfill_page_size: i64) -> Self {
        Self { conn, backfill_page_size }
    }

    /// Walk `document`'s leaf fields, consult the Pattern Analyzer for
    /// each, and promote any that have crossed the threshold. Returns the
    /// field paths that were promoted by this call.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError` if a promotion attempt fails for a reason
    /// other than pool exhaustion (array-segment paths are skipped, not
    /// surfaced as errors, since a real document may legitimately have a
    /// field shaped like one).
    pub async fn analyze_after_insert(
        &self,
        registry: &mut IndexRegistry,
        analyzer: &mut PatternAnalyzer,
        collection: &str,
        document: &Json,
    ) -> Result<Vec<String>, SchemaError> {
        let mut promoted = Vec::new();
        for path in leaf_paths(document) {
            if is_array_segment_path(&path) {
                continue;
            }
            if analyzer.should_promote(collection, &path).await? {
                let Some(sample) = document.extract(&path) else { continue };
                match self.promote(registry, analyzer, collection, &path, sample).await {
                    Ok(true) => promoted.push(path),
                    Ok(false) => {}
                    Err(err) => warn!(collection, field = path.as_str(), %err, "promotion attempt failed"),
                }
            }
        }
        Ok(promoted)
    }

    /// Promote `field_path` in `collection` to an indexed slot column.
    ///
    /// Returns `Ok(false)` without changing state if the field is already
    /// bound (idempotent) or the slot pool is exhausted (advisory
    /// failure, per §4.F — the field stays queryable on the JSON path).
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::UnsupportedPath` if `field_path` contains an
    /// array segment, or a storage error if any promotion step fails.
    pub async fn promote(
        &self,
        registry: &mut IndexRegistry,
        analyzer: &mut PatternAnalyzer,
        collection: &str,
        field_path: &str,
        sample_value: &Json,
    ) -> Result<bool, SchemaError> {
        if is_array_segment_path(field_path) {
            return Err(SchemaError::UnsupportedPath(field_path.to_string()));
        }

        registry.load(collection).await?;
        if registry.mapping(collection, field_path).is_some() {
            return Ok(false);
        }

        let Some(slot) = registry.allocate_slot(collection) else {
            warn!(collection, field = field_path, "slot pool exhausted, promotion skipped");
            return Ok(false);
        };

        let data_type = sample_value.infer_data_type();

        registry.bind(collection, field_path, slot, data_type).await?;

        self.create_partial_index(collection, slot).await?;
        self.backfill(collection, field_path, slot).await?;

        analyzer.mark_indexed(collection, field_path).await?;

        info!(collection, field = field_path, slot, %data_type, "promoted field to indexed slot");
        Ok(true)
    }

    /// Recompute every bound slot value for `doc_id` and write them in
    /// one statement. Called on every insert and update.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError` if the registry load or the update fails.
    pub async fn update_indexed_columns(
        &self,
        registry: &mut IndexRegistry,
        collection: &str,
        doc_id: &str,
        document: &Json,
    ) -> Result<(), SchemaError> {
        registry.load(collection).await?;
        let bindings = registry.mappings_of(collection);
        if bindings.is_empty() {
            return Ok(());
        }

        let mut assignments = Vec::with_capacity(bindings.len());
        let mut params: Vec<Value> = Vec::with_capacity(bindings.len() + 1);
        for binding in &bindings {
            let column = slot_column_name(binding.slot);
            assignments.push(format!("{column} = ?"));
            let value = document.extract(&binding.field_path).map_or(Value::Null, json_to_sql_value);
            params.push(value);
        }
        params.push(Value::Text(doc_id.to_string()));

        let sql = format!("UPDATE documents SET {} WHERE id = ?", assignments.join(", "));
        self.conn.execute(&sql, params).await?;
        Ok(())
    }

    /// Non-undefined slot extractions for `document`, keyed by slot
    /// number. Requires `registry` to already have `collection` loaded.
    #[must_use]
    pub fn extract_indexed_values(&self, registry: &IndexRegistry, collection: &str, document: &Json) -> HashMap<u32, Json> {
        registry
            .mappings_of(collection)
            .into_iter()
            .filter_map(|binding| document.extract(&binding.field_path).map(|v| (binding.slot, v.clone())))
            .collect()
    }

    async fn create_partial_index(&self, collection: &str, slot: u32) -> Result<(), SchemaError> {
        let column = slot_column_name(slot);
        let index_name = format!("idx_slot_{slot}_{}", sanitize_identifier(collection));
        let sql = format!(
            "CREATE INDEX IF NOT EXISTS {index_name} ON documents({column}) WHERE collection = '{}'",
            escape_sql_literal(collection)
        );
        self.conn.execute_batch(&sql).await?;
        Ok(())
    }

    /// Backfill historical rows in pages of [`BACKFILL_PAGE_SIZE`] (or the
    /// engine's configured override), ordered by primary key, idempotently.
    /// Also serves as the recovery pass for an interrupted backfill:
    /// re-running only touches rows whose slot is still `NULL` and whose
    /// payload has a value.
    async fn backfill(&self, collection: &str, field_path: &str, slot: u32) -> Result<(), SchemaError> {
        let column = slot_column_name(slot);
        let mut cursor = String::new();

        loop {
            let mut rows = self
                .conn
                .query(
                    "SELECT id, payload FROM documents
                     WHERE collection = ?1 AND id > ?2
                     ORDER BY id LIMIT ?3",
                    libsql::params![collection, cursor.as_str(), self.backfill_page_size],
                )
                .await?;

            let mut page_ids = Vec::new();
            let mut updates: Vec<(String, Value)> = Vec::new();
            while let Some(row) = rows.next().await? {
                let id: String = row.get(0)?;
                let payload: String = row.get(1)?;
                page_ids.push(id.clone());

                let document: Json = serde_json::from_str::<serde_json::Value>(&payload)
                    .map(Json::from)
                    .unwrap_or(Json::Null);
                let value = document.extract(field_path).map_or(Value::Null, json_to_sql_value);
                updates.push((id, value));
            }

            if page_ids.is_empty() {
                break;
            }

            for (id, value) in &updates {
                self.conn
                    .execute(
                        &format!("UPDATE documents SET {column} = ? WHERE id = ?"),
                        vec![value.clone(), Value::Text(id.clone())],
                    )
                    .await?;
            }

            cursor = page_ids.into_iter().max().unwrap_or(cursor);

            if (updates.len() as i64) < self.backfill_page_size {
                break;
            }
        }

        Ok(())
    }
}

fn sanitize_identifier(s: &str) -> String {
    s.chars().map(|c| if c.is_ascii_alphanumeric() { c } else { '_' }).collect()
}

fn escape_sql_literal(s: &str) -> String {
    s.replace('\'', "''")
}

fn json_to_sql_value(v: &Json) -> Value {
    match v {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Integer(i64::from(*b)),
        Json::Int(i) => Value::Integer(*i),
        Json::Float(f) => Value::Real(*f),
        Json::Str(s) => Value::Text(s.clone()),
        Json::Array(_) | Json::Object(_) => {
            let as_serde: serde_json::Value = v.clone().into();
            Value::Text(as_serde.to_string())
        }
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
            );
            CREATE TABLE query_patterns (
                collection TEXT NOT NULL,
                field TEXT NOT NULL,
                count INTEGER NOT NULL,
                last_queried TEXT NOT NULL,
                avg_result_count REAL NOT NULL,
                is_indexed_now INTEGER NOT NULL,
                PRIMARY KEY (collection, field)
            );
            CREATE TABLE documents (
                id TEXT PRIMARY KEY,
                collection TEXT NOT NULL,
                payload TEXT NOT NULL,
                deleted INTEGER NOT NULL DEFAULT 0,
                slot_1 TEXT, slot_2 TEXT, slot_3 TEXT
            );",
        )
        .await
        .unwrap();
        conn
    }

    #[tokio::test]
    async fn promote_binds_slot_and_backfills() {
        let conn = test_conn().await;
        conn.execute(
            "INSERT INTO documents (id, collection, payload) VALUES (?1, 'users', ?2)",
            libsql::params!["doc-1", r#"{"email":"a@x.com"}"#],
        )
        .await
        .unwrap();
        conn.execute(
            "INSERT INTO documents (id, collection, payload) VALUES (?1, 'users', ?2)",
            libsql::params!["doc-2", r#"{"name":"no email here"}"#],
        )
        .await
        .unwrap();

        let mut registry = IndexRegistry::new(conn.clone(), 3);
        let mut analyzer = PatternAnalyzer::new(conn.clone());
        let engine = SchemaEngine::new(conn.clone());

        let promoted = engine
            .promote(&mut registry, &mut analyzer, "users", "email", &Json::Str("a@x.com".to_string()))
            .await
            .unwrap();
        assert!(promoted);
        assert_eq!(registry.mapping("users", "email").unwrap().slot, 1);

        let mut rows = conn.query("SELECT id, slot_1 FROM documents ORDER BY id", ()).await.unwrap();
        let row1 = rows.next().await.unwrap().unwrap();
        let slot1: Option<String> = row1.get(1).ok();
        assert_eq!(slot1, Some("a@x.com".to_string()));
        let row2 = rows.next().await.unwrap().unwrap();
        let slot2: Option<String> = row2.get(1).ok();
        assert_eq!(slot2, None);
    }

    #[tokio::test]
    async fn promote_is_idempotent() {
        let conn = test_conn().await;
        let mut registry = IndexRegistry::new(conn.clone(), 3);
        let mut analyzer = PatternAnalyzer::new(conn.clone());
        let engine = SchemaEngine::new(conn.clone());

        let first = engine.promote(&mut registry, &mut analyzer, "users", "email", &Json::Str("x".into())).await.unwrap();
        let second = engine.promote(&mut registry, &mut analyzer, "users", "email", &Json::Str("y".into())).await.unwrap();
        assert!(first);
        assert!(!second);
        assert_eq!(registry.mapping("users", "email").unwrap().slot, 1);
    }

    #[tokio::test]
    async fn promote_rejects_array_segment_paths() {
        let conn = test_conn().await;
        let mut registry = IndexRegistry::new(conn.clone(), 3);
        let mut analyzer = PatternAnalyzer::new(conn.clone());
        let engine = SchemaEngine::new(conn.clone());

        let err = engine
            .promote(&mut registry, &mut analyzer, "users", "tags.0", &Json::Str("x".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, SchemaError::UnsupportedPath(_)));
    }

    #[tokio::test]
    async fn promote_returns_false_when_pool_exhausted() {
        let conn = test_conn().await;
        let mut registry = IndexRegistry::new(conn.clone(), 1);
        let mut analyzer = PatternAnalyzer::new(conn.clone());
        let engine = SchemaEngine::new(conn.clone());

        engine.promote(&mut registry, &mut analyzer, "users", "email", &Json::Str("x".into())).await.unwrap();
        let second = engine.promote(&mut registry, &mut analyzer, "users", "name", &Json::Str("y".into())).await.unwrap();
        assert!(!second);
    }

    #[tokio::test]
    async fn update_indexed_columns_recomputes_all_bound_slots() {
        let conn = test_conn().await;
        conn.execute(
            "INSERT INTO documents (id, collection, payload) VALUES (?1, 'users', ?2)",
            libsql::params!["doc-1", r#"{"email":"old@x.com"}"#],
        )
        .await
        .unwrap();

        let mut registry = IndexRegistry::new(conn.clone(), 3);
        let mut analyzer = PatternAnalyzer::new(conn.clone());
        let engine = SchemaEngine::new(conn.clone());
        engine.promote(&mut registry, &mut analyzer, "users", "email", &Json::Str("old@x.com".into())).await.unwrap();

        let updated: Json = serde_json::json!({"email": "new@x.com"}).into();
        engine.update_indexed_columns(&mut registry, "users", "doc-1", &updated).await.unwrap();

        let mut rows = conn.query("SELECT slot_1 FROM documents WHERE id = 'doc-1'", ()).await.unwrap();
        let row = rows.next().await.unwrap().unwrap();
        let slot1: String = row.get(0).unwrap();
        assert_eq!(slot1, "new@x.com");
    }

    #[tokio::test]
    async fn extract_indexed_values_skips_absent_fields() {
        let conn = test_conn().await;
        let mut registry = IndexRegistry::new(conn.clone(), 3);
        let mut analyzer = PatternAnalyzer::new(conn.clone());
        let engine = SchemaEngine::new(conn.clone());
        engine.promote(&mut registry, &mut analyzer, "users", "email", &Json::Str("x".into())).await.unwrap();
        registry.load("users").await.unwrap();

        let doc: Json = serde_json::json!({"name": "no email"}).into();
        let values = engine.extract_indexed_values(&registry, "users", &doc);
        assert!(values.is_empty());
    }
}
