//! The Document Store Surface (§4.G): insert/find/count/update/delete,
//! wiring the Query Translator, Index Registry, Pattern Analyzer, and
//! Schema Evolution Engine together on every request.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use hotfield_core::json::Json;
use hotfield_core::{ids, Document, Envelope};
use hotfield_filter::{Filter, Update};
use hotfield_index::{slot_column_name, IndexRegistry};
use hotfield_patterns::{PatternAnalyzer, Suggestion};
use hotfield_query::{translate, translate_with_select, QueryOptions};
use hotfield_schema::SchemaEngine;
use libsql::Value;
use tracing::debug;

use crate::config::HotfieldConfig;
use crate::db::HotfieldDb;
use crate::error::StoreError;

/// The insert/find/update/delete/count surface over one libSQL database.
///
/// Owns the single, process-lifetime [`IndexRegistry`] and
/// [`PatternAnalyzer`] caches (both keyed internally by collection, per
/// §9 "Process-wide state") and a [`SchemaEngine`] for promotion and
/// slot maintenance.
pub struct DocumentStore {
    conn: libsql::Connection,
    registry: IndexRegistry,
    analyzer: PatternAnalyzer,
    schema: SchemaEngine,
}

impl DocumentStore {
    /// Build a store over an already-open connection.
    #[must_use]
    pub fn new(conn: libsql::Connection, config: &HotfieldConfig) -> Self {
        Self {
            registry: IndexRegistry::new(conn.clone(), config.slot_pool_size),
            analyzer: PatternAnalyzer::with_threshold(conn.clone(), config.promotion_threshold),
            schema: SchemaEngine::with_page_size(conn.clone(), config.backfill_page_size),
            conn,
        }
    }

    /// Open an ephemeral in-memory store with default configuration.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::LibSql` if the database cannot be opened.
    pub async fn open_in_memory() -> Result<Self, StoreError> {
        let db = HotfieldDb::open_in_memory().await?;
        Ok(Self::new(db.conn(), &HotfieldConfig::default()))
    }

    /// Open a file-backed store at `config.db_path`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::LibSql` if the database cannot be opened.
    pub async fn open(config: &HotfieldConfig) -> Result<Self, StoreError> {
        let db = HotfieldDb::open_file(&config.db_path).await?;
        Ok(Self::new(db.conn(), config))
    }

    /// Insert `payload` as a new document in `collection`. Assigns `_id`
    /// if the payload carries no top-level `_id` field (§4.G).
    ///
    /// # Errors
    ///
    /// Returns `StoreError::LibSql` wrapping a unique-constraint
    /// violation if `_id` already exists in this collection (§8's
    /// insert-delete-reinsert law).
    pub async fn insert(&mut self, collection: &str, mut payload: Json) -> Result<Document, StoreError> {
        reject_reserved_root_fields(&payload)?;
        let id = extract_or_generate_id(&mut payload);
        let now = Utc::now();
        let envelope = Envelope::new(id.clone(), collection.to_string(), now);

        self.registry.load(collection).await?;
        let slot_values = self.schema.extract_indexed_values(&self.registry, collection, &payload);
        self.insert_row(&envelope, &payload, &slot_values).await?;

        let promoted = self
            .schema
            .analyze_after_insert(&mut self.registry, &mut self.analyzer, collection, &payload)
            .await?;
        if !promoted.is_empty() {
            debug!(collection, ?promoted, "promoted fields on insert");
        }

        Ok(Document { envelope, payload })
    }

    /// Find every live document in `collection` matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Query` if translation fails, or a storage
    /// error if execution fails.
    pub async fn find(
        &mut self,
        collection: &str,
        filter: &Filter,
        options: &QueryOptions,
    ) -> Result<Vec<Document>, StoreError> {
        self.registry.load(collection).await?;
        let snapshot = self.registry.snapshot(collection);
        let translation = translate(collection, filter, options, &snapshot)?;

        let mut rows = self.conn.query(&translation.sql, translation.params.clone()).await?;
        let mut documents = Vec::new();
        while let Some(row) = rows.next().await? {
            documents.push(row_to_document(&row)?);
        }

        self.record_usage_and_maybe_promote(collection, &translation.touched_fields, &documents).await?;
        Ok(documents)
    }

    /// Find a single live document by its `_id`, or `None` if absent or
    /// tombstoned (§8 seed scenario 6).
    ///
    /// # Errors
    ///
    /// See [`DocumentStore::find`].
    pub async fn find_by_id(&mut self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let filter = Filter::eq("_id", Json::Str(id.to_string()));
        let mut docs = self.find(collection, &filter, &QueryOptions::new().with_limit(1)).await?;
        Ok(docs.pop())
    }

    /// Count live documents in `collection` matching `filter`, without
    /// materialising rows.
    ///
    /// # Errors
    ///
    /// See [`DocumentStore::find`].
    pub async fn count(&mut self, collection: &str, filter: &Filter) -> Result<u64, StoreError> {
        self.registry.load(collection).await?;
        let snapshot = self.registry.snapshot(collection);
        let options = QueryOptions::new();
        let translation = translate_with_select(collection, filter, &options, &snapshot, "COUNT(*)")?;

        let mut rows = self.conn.query(&translation.sql, translation.params.clone()).await?;
        #[allow(clippy::cast_sign_loss)]
        let count = match rows.next().await? {
            Some(row) => row.get::<i64>(0)? as u64,
            None => 0,
        };

        self.analyzer.record(collection, &translation.touched_fields, count).await?;
        Ok(count)
    }

    /// Apply `update` to every live document matching `filter`, bumping
    /// `version`/`_updated_at` and recomputing bound slots for each
    /// touched document in the same write (§4.G).
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Update` if an operator cannot be applied to a
    /// matched document's current value.
    pub async fn update_many(&mut self, collection: &str, filter: &Filter, update: &Update) -> Result<u64, StoreError> {
        if update.is_empty() {
            return Ok(0);
        }

        self.registry.load(collection).await?;
        let snapshot = self.registry.snapshot(collection);
        let options = QueryOptions::new();
        let translation = translate(collection, filter, &options, &snapshot)?;

        let mut rows = self.conn.query(&translation.sql, translation.params.clone()).await?;
        let mut matched = Vec::new();
        while let Some(row) = rows.next().await? {
            matched.push(row_to_document(&row)?);
        }

        let count = matched.len() as u64;
        for mut doc in matched {
            crate::apply_update::apply_update(&mut doc.payload, update)?;
            doc.envelope.bump(Utc::now());
            let slot_values = self.schema.extract_indexed_values(&self.registry, collection, &doc.payload);
            self.update_row(&doc.envelope, &doc.payload, &slot_values).await?;
        }

        self.analyzer.record(collection, &translation.touched_fields, count).await?;
        Ok(count)
    }

    /// Tombstone every live document matching `filter`, and delete any
    /// vector owned by each (§3's "Vectors are independently owned per
    /// document; deleting the document deletes its vector").
    ///
    /// # Errors
    ///
    /// See [`DocumentStore::find`].
    pub async fn delete_many(&mut self, collection: &str, filter: &Filter) -> Result<u64, StoreError> {
        self.registry.load(collection).await?;
        let snapshot = self.registry.snapshot(collection);
        let options = QueryOptions::new();
        let translation = translate_with_select(collection, filter, &options, &snapshot, "id")?;

        let mut rows = self.conn.query(&translation.sql, translation.params.clone()).await?;
        let mut ids = Vec::new();
        while let Some(row) = rows.next().await? {
            ids.push(row.get::<String>(0)?);
        }

        let now = Utc::now().to_rfc3339();
        for id in &ids {
            self.conn
                .execute(
                    "UPDATE documents SET deleted = 1, updated_at = ?1 WHERE id = ?2",
                    libsql::params![now.as_str(), id.as_str()],
                )
                .await?;
            self.conn
                .execute("DELETE FROM vectors WHERE document_id = ?1", libsql::params![id.as_str()])
                .await?;
        }

        self.analyzer.record(collection, &translation.touched_fields, ids.len() as u64).await?;
        Ok(ids.len() as u64)
    }

    /// Promotion suggestions for `collection`, ranked by impact (§4.E).
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Pattern` if the underlying scan fails.
    pub async fn suggestions(&mut self, collection: &str) -> Result<Vec<Suggestion>, StoreError> {
        Ok(self.analyzer.suggestions(collection).await?)
    }

    /// The underlying connection, cloned. Exposed for callers -- such as
    /// `hotfield-search`'s vector engine -- that share this database's
    /// schema but live in a separate crate to avoid a dependency cycle.
    #[must_use]
    pub fn raw_conn(&self) -> libsql::Connection {
        self.conn.clone()
    }

    /// Current slot-pool usage for `collection`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::LibSql` if `collection` has never been
    /// loaded and the registry load fails.
    pub async fn index_stats(&mut self, collection: &str) -> Result<hotfield_index::IndexStats, StoreError> {
        self.registry.load(collection).await?;
        Ok(self.registry.stats(collection))
    }

    async fn record_usage_and_maybe_promote(
        &mut self,
        collection: &str,
        touched_fields: &[String],
        documents: &[Document],
    ) -> Result<(), StoreError> {
        self.analyzer.record(collection, touched_fields, documents.len() as u64).await?;

        for field in touched_fields {
            if self.analyzer.should_promote(collection, field).await? {
                let Some(sample) = documents.iter().find_map(|d| d.payload.extract(field)) else {
                    continue;
                };
                self.schema
                    .promote(&mut self.registry, &mut self.analyzer, collection, field, sample)
                    .await?;
            }
        }
        Ok(())
    }

    async fn insert_row(&self, envelope: &Envelope, payload: &Json, slot_values: &HashMap<u32, Json>) -> Result<(), StoreError> {
        let pool_size = self.registry.pool_size();
        let mut columns: Vec<String> =
            ["id", "collection", "version", "created_at", "updated_at", "deleted", "payload"]
                .into_iter()
                .map(str::to_string)
                .collect();
        let mut values = vec![
            Value::Text(envelope.id.clone()),
            Value::Text(envelope.collection.clone()),
            Value::Integer(envelope.version as i64),
            Value::Text(envelope.created_at.to_rfc3339()),
            Value::Text(envelope.updated_at.to_rfc3339()),
            Value::Integer(i64::from(envelope.deleted)),
            Value::Text(payload_to_text(payload)),
        ];
        for slot in 1..=pool_size as u32 {
            columns.push(slot_column_name(slot));
            values.push(slot_values.get(&slot).map_or(Value::Null, json_to_sql_value));
        }

        let placeholders: Vec<String> = (1..=values.len()).map(|i| format!("?{i}")).collect();
        let sql = format!("INSERT INTO documents ({}) VALUES ({})", columns.join(", "), placeholders.join(", "));
        self.conn.execute(&sql, values).await?;
        Ok(())
    }

    async fn update_row(&self, envelope: &Envelope, payload: &Json, slot_values: &HashMap<u32, Json>) -> Result<(), StoreError> {
        let pool_size = self.registry.pool_size();
        let mut assignments = vec!["version = ?1".to_string(), "updated_at = ?2".to_string(), "payload = ?3".to_string()];
        let mut values = vec![
            Value::Integer(envelope.version as i64),
            Value::Text(envelope.updated_at.to_rfc3339()),
            Value::Text(payload_to_text(payload)),
        ];
        for slot in 1..=pool_size as u32 {
            values.push(slot_values.get(&slot).map_or(Value::Null, json_to_sql_value));
            assignments.push(format!("{} = ?{}", slot_column_name(slot), values.len()));
        }
        values.push(Value::Text(envelope.id.clone()));
        let id_param = values.len();

        let sql = format!("UPDATE documents SET {} WHERE id = ?{id_param}", assignments.join(", "));
        self.conn.execute(&sql, values).await?;
        Ok(())
    }
}

/// Reject root-level user fields that collide with the reserved/envelope
/// namespaces (§6): `$`-prefixed names are never valid field names, and
/// `_`-prefixed names other than `_id` address envelope state the caller
/// cannot set directly.
fn reject_reserved_root_fields(payload: &Json) -> Result<(), StoreError> {
    let Json::Object(fields) = payload else { return Ok(()) };
    for (key, _) in fields {
        if hotfield_core::json::is_reserved_operator(key) {
            return Err(hotfield_filter::FilterError::ReservedFieldName(key.clone()).into());
        }
        if key != "_id" && hotfield_core::json::is_envelope_field(key) {
            return Err(hotfield_filter::FilterError::EnvelopeFieldName(key.clone()).into());
        }
    }
    Ok(())
}

fn extract_or_generate_id(payload: &mut Json) -> String {
    if let Json::Object(fields) = payload {
        if let Some(pos) = fields.iter().position(|(k, _)| k == "_id") {
            let (_, value) = fields.remove(pos);
            if let Json::Str(s) = value {
                return s;
            }
        }
    }
    ids::generate("doc")
}

fn payload_to_text(payload: &Json) -> String {
    serde_json::Value::from(payload.clone()).to_string()
}

fn json_to_sql_value(v: &Json) -> Value {
    match v {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Integer(i64::from(*b)),
        Json::Int(i) => Value::Integer(*i),
        Json::Float(f) => Value::Real(*f),
        Json::Str(s) => Value::Text(s.clone()),
        Json::Array(_) | Json::Object(_) => Value::Text(payload_to_text(v)),
    }
}

fn row_to_document(row: &libsql::Row) -> Result<Document, StoreError> {
    let id: String = row.get(0)?;
    let collection: String = row.get(1)?;
    let version: i64 = row.get(2)?;
    let created_at: String = row.get(3)?;
    let updated_at: String = row.get(4)?;
    let deleted: i64 = row.get(5)?;
    let payload_text: String = row.get(6)?;

    let payload: Json = serde_json::from_str::<serde_json::Value>(&payload_text)
        .map(Json::from)
        .map_err(|e| StoreError::Other(anyhow::anyhow!("malformed payload for document {id}: {e}")))?;

    Ok(Document {
        envelope: Envelope {
            id,
            collection,
            #[allow(clippy::cast_sign_loss)]
            version: version as u64,
            created_at: parse_datetime(&created_at)?,
            updated_at: parse_datetime(&updated_at)?,
            deleted: deleted != 0,
        },
        payload,
    })
}

/// Parse a TEXT timestamp column as either RFC 3339 or SQLite's
/// `datetime('now')` default format, matching the teacher's
/// `zen_db::helpers::parse_datetime`.
fn parse_datetime(s: &str) -> Result<DateTime<Utc>, StoreError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map(|naive| naive.and_utc())
        .map_err(|e| StoreError::Other(anyhow::anyhow!("failed to parse timestamp '{s}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hotfield_filter::{parse_filter, parse_update};

    fn filter(json: serde_json::Value) -> Filter {
        parse_filter(&json).unwrap()
    }

    fn update(json: serde_json::Value) -> Update {
        parse_update(&json).unwrap()
    }

    #[tokio::test]
    async fn insert_assigns_id_when_absent() {
        let mut store = DocumentStore::open_in_memory().await.unwrap();
        let doc = store.insert("users", serde_json::json!({"name": "Alice"}).into()).await.unwrap();
        assert!(doc.envelope.id.starts_with("doc-"));
        assert_eq!(doc.envelope.version, 1);
    }

    #[tokio::test]
    async fn insert_uses_supplied_id() {
        let mut store = DocumentStore::open_in_memory().await.unwrap();
        let doc = store.insert("users", serde_json::json!({"_id": "doc-custom", "name": "Bob"}).into()).await.unwrap();
        assert_eq!(doc.envelope.id, "doc-custom");
        assert_eq!(doc.payload.extract("_id"), None, "the _id field should not appear in the stored payload");
    }

    #[tokio::test]
    async fn insert_rejects_non_id_envelope_field_names() {
        let mut store = DocumentStore::open_in_memory().await.unwrap();
        let err = store.insert("users", serde_json::json!({"_version": 5}).into()).await.unwrap_err();
        assert!(matches!(err, StoreError::Filter(hotfield_filter::FilterError::EnvelopeFieldName(_))));
    }

    #[tokio::test]
    async fn insert_rejects_dollar_prefixed_field_names() {
        let mut store = DocumentStore::open_in_memory().await.unwrap();
        let err = store.insert("users", serde_json::json!({"$bad": 1}).into()).await.unwrap_err();
        assert!(matches!(err, StoreError::Filter(hotfield_filter::FilterError::ReservedFieldName(_))));
    }

    #[tokio::test]
    async fn duplicate_id_fails_unique_constraint() {
        let mut store = DocumentStore::open_in_memory().await.unwrap();
        store.insert("users", serde_json::json!({"_id": "dup", "name": "A"}).into()).await.unwrap();
        let err = store.insert("users", serde_json::json!({"_id": "dup", "name": "B"}).into()).await.unwrap_err();
        assert!(matches!(err, StoreError::LibSql(_)));
    }

    #[tokio::test]
    async fn seed_scenario_implicit_equality() {
        let mut store = DocumentStore::open_in_memory().await.unwrap();
        store.insert("users", serde_json::json!({"role": "engineer"}).into()).await.unwrap();
        store.insert("users", serde_json::json!({"role": "designer"}).into()).await.unwrap();

        let results = store.find("users", &filter(serde_json::json!({"role": "engineer"})), &QueryOptions::new()).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].payload.extract("role"), Some(&Json::Str("engineer".into())));
    }

    #[tokio::test]
    async fn tombstoned_documents_are_excluded_from_all_reads() {
        let mut store = DocumentStore::open_in_memory().await.unwrap();
        let doc = store.insert("users", serde_json::json!({"name": "Alice"}).into()).await.unwrap();

        let deleted = store.delete_many("users", &filter(serde_json::json!({"_id": doc.envelope.id.clone()}))).await.unwrap();
        assert_eq!(deleted, 1);

        assert!(store.find_by_id("users", &doc.envelope.id).await.unwrap().is_none());
        assert_eq!(store.count("users", &filter(serde_json::json!({"_id": doc.envelope.id}))).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn update_many_bumps_version_and_applies_set() {
        let mut store = DocumentStore::open_in_memory().await.unwrap();
        let doc = store.insert("users", serde_json::json!({"name": "Alice", "age": 30}).into()).await.unwrap();

        let updated = store
            .update_many(
                "users",
                &filter(serde_json::json!({"_id": doc.envelope.id.clone()})),
                &update(serde_json::json!({"$set": {"age": 31}})),
            )
            .await
            .unwrap();
        assert_eq!(updated, 1);

        let reloaded = store.find_by_id("users", &doc.envelope.id).await.unwrap().unwrap();
        assert_eq!(reloaded.envelope.version, 2);
        assert_eq!(reloaded.payload.extract("age"), Some(&Json::Int(31)));
    }

    #[tokio::test]
    async fn applying_same_update_twice_is_equivalent_to_once() {
        let mut store = DocumentStore::open_in_memory().await.unwrap();
        let doc = store.insert("users", serde_json::json!({"name": "Alice"}).into()).await.unwrap();
        let id_filter = filter(serde_json::json!({"_id": doc.envelope.id.clone()}));
        let set_name = update(serde_json::json!({"$set": {"name": "Bob"}}));

        store.update_many("users", &id_filter, &set_name).await.unwrap();
        let once = store.find_by_id("users", &doc.envelope.id).await.unwrap().unwrap();

        store.update_many("users", &id_filter, &set_name).await.unwrap();
        let twice = store.find_by_id("users", &doc.envelope.id).await.unwrap().unwrap();

        assert_eq!(once.payload, twice.payload);
    }

    #[tokio::test]
    async fn seed_scenario_index_promotion_after_100_queries() {
        let mut store = DocumentStore::open_in_memory().await.unwrap();
        store.insert("users", serde_json::json!({"email": "x@y"}).into()).await.unwrap();

        for _ in 0..100 {
            store.find("users", &filter(serde_json::json!({"email": "x@y"})), &QueryOptions::new()).await.unwrap();
        }

        let stats = store.index_stats("users").await.unwrap();
        assert_eq!(stats.slots_used, 1);
        assert_eq!(stats.bindings[0].field_path, "email");

        let translation_check = store.find("users", &filter(serde_json::json!({"email": "x@y"})), &QueryOptions::new()).await.unwrap();
        assert_eq!(translation_check.len(), 1);
    }

    #[tokio::test]
    async fn limit_zero_yields_zero_documents() {
        let mut store = DocumentStore::open_in_memory().await.unwrap();
        store.insert("users", serde_json::json!({"name": "Alice"}).into()).await.unwrap();
        let results = store.find("users", &filter(serde_json::json!({})), &QueryOptions::new().with_limit(0)).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn backfill_correctness_over_2500_documents() {
        let mut store = DocumentStore::open_in_memory().await.unwrap();
        for i in 0..2_500 {
            store.insert("users", serde_json::json!({"email": format!("user{i}@x.com")}).into()).await.unwrap();
        }

        // Directly promote rather than looping 100 queries, to keep the test fast;
        // exercises the same backfill path as organic promotion.
        store.registry.load("users").await.unwrap();
        store
            .schema
            .promote(&mut store.registry, &mut store.analyzer, "users", "email", &Json::Str("user0@x.com".into()))
            .await
            .unwrap();

        let mut rows = store.conn.query("SELECT COUNT(*) FROM documents WHERE collection = 'users' AND slot_1 IS NULL", ()).await.unwrap();
        let null_count: i64 = rows.next().await.unwrap().unwrap().get(0).unwrap();
        assert_eq!(null_count, 0, "every row must have its slot backfilled");
    }
}
