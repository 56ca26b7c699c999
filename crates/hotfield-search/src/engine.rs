//! The Vector Search Engine (§4.H): owns the `vectors` table and runs
//! brute-force k-NN over it.
//!
//! Shares its libSQL connection with a `hotfield_store::DocumentStore`
//! rather than depending on that crate directly (`hotfield-store` would
//! otherwise have to depend back on `hotfield-search` to cascade deletes,
//! a cycle). Callers wire the two together by handing both constructors
//! the same connection.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use hotfield_core::{ids, Json};

use crate::error::SearchError;
use crate::options::SearchOptions;
use crate::record::VectorRecord;
use crate::stats::SearchStats;

/// One scored candidate returned by [`VectorSearchEngine::search`].
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    /// The matched vector row.
    pub vector_ref: VectorRecord,
    /// The raw metric output: a similarity value for [`crate::options::Metric::Cosine`]/[`crate::options::Metric::Dot`],
    /// a distance value for [`crate::options::Metric::Euclidean`]/[`crate::options::Metric::Manhattan`].
    pub score: f64,
    /// Populated only for distance metrics, duplicating `score` under a
    /// name that doesn't require the caller to know the chosen metric's
    /// polarity (§6 response shape: `{ vector_ref, score, distance? }`).
    pub distance: Option<f64>,
}

/// Owns the `vectors` table: insertion, deletion, and brute-force k-NN
/// search.
pub struct VectorSearchEngine {
    conn: libsql::Connection,
}

impl VectorSearchEngine {
    /// Wrap an existing connection (expected to already carry the
    /// `vectors` table, e.g. via `hotfield_store::DocumentStore::raw_conn`).
    #[must_use]
    pub const fn new(conn: libsql::Connection) -> Self {
        Self { conn }
    }

    /// Insert or replace the embedding owned by `(document_id, model_name)`
    /// (§6: `vectors` table has `UNIQUE (document_id, model_name)`).
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Vector`] if `vector` fails dimension/finite
    /// validation, or [`SearchError::LibSql`] on a storage failure.
    pub async fn insert_vector(
        &self,
        document_id: &str,
        collection: &str,
        vector: &[f32],
        model_name: Option<&str>,
        metadata: Option<&Json>,
    ) -> Result<VectorRecord, SearchError> {
        hotfield_vector::validate(vector)?;
        let now = Utc::now();
        let id = ids::generate("vec");
        let blob = hotfield_vector::blob::encode(vector);
        #[allow(clippy::cast_possible_truncation)]
        let dimensions = vector.len() as i64;
        let metadata_json = metadata.map(payload_to_text);

        self.conn
            .execute(
                "INSERT INTO vectors (id, document_id, collection, vector_blob, dimensions, normalized, model_name, metadata_json, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6, ?7, ?8, ?8)
                 ON CONFLICT (document_id, model_name) DO UPDATE SET
                     vector_blob = excluded.vector_blob,
                     dimensions = excluded.dimensions,
                     collection = excluded.collection,
                     metadata_json = excluded.metadata_json,
                     updated_at = excluded.updated_at",
                libsql::params![
                    id.clone(),
                    document_id.to_string(),
                    collection.to_string(),
                    blob,
                    dimensions,
                    model_name.map(ToString::to_string),
                    metadata_json,
                    now.to_rfc3339(),
                ],
            )
            .await?;

        Ok(VectorRecord {
            id,
            document_id: document_id.to_string(),
            collection: collection.to_string(),
            vector: vector.to_vec(),
            #[allow(clippy::cast_sign_loss)]
            dimensions: dimensions as usize,
            normalized: false,
            model_name: model_name.map(ToString::to_string),
            metadata: metadata.cloned(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Delete the embedding owned by `document_id` (and `model_name`, if
    /// given). Returns whether a row was removed.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::LibSql`] on a storage failure.
    pub async fn delete_vector(&self, document_id: &str, model_name: Option<&str>) -> Result<bool, SearchError> {
        let affected = if let Some(model_name) = model_name {
            self.conn
                .execute(
                    "DELETE FROM vectors WHERE document_id = ?1 AND model_name = ?2",
                    libsql::params![document_id.to_string(), model_name.to_string()],
                )
                .await?
        } else {
            self.conn
                .execute("DELETE FROM vectors WHERE document_id = ?1", libsql::params![document_id.to_string()])
                .await?
        };
        Ok(affected > 0)
    }

    /// Brute-force k-NN search (§4.H's 8-step algorithm).
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Vector`] if `query_vector` fails validation,
    /// [`SearchError::NegativeThreshold`] if `options.threshold` is
    /// negative, or [`SearchError::LibSql`] on a storage failure.
    pub async fn search(
        &self,
        query_vector: &[f32],
        options: &SearchOptions,
    ) -> Result<(Vec<SearchHit>, SearchStats), SearchError> {
        let started = std::time::Instant::now();
        hotfield_vector::validate(query_vector)?;
        if let Some(threshold) = options.threshold {
            if threshold < 0.0 {
                return Err(SearchError::NegativeThreshold(threshold));
            }
        }

        // Step 1: load using the cheapest available filter.
        let candidates = self.load_candidates(options).await?;
        let vectors_scanned = candidates.len();
        let mut survivors = Vec::with_capacity(candidates.len());

        for candidate in candidates {
            // Step 2: dimension mismatch.
            if candidate.vector.len() != query_vector.len() {
                continue;
            }
            // Step 3: metadata filter, exact match on every provided key.
            if let Some(filter) = &options.metadata_filter {
                if !matches_metadata(&candidate.metadata, filter) {
                    continue;
                }
            }
            // Step 4: compute the chosen metric.
            let score = options.metric.compute(&candidate.vector, query_vector)?;
            // Step 5: threshold.
            if let Some(threshold) = options.threshold {
                let keep = if options.metric.is_distance() { score <= threshold } else { score >= threshold };
                if !keep {
                    continue;
                }
            }
            // Step 7: self-match exclusion.
            if !options.include_self && hotfield_vector::approx_eq(&candidate.vector, query_vector) {
                continue;
            }
            survivors.push((candidate, score));
        }

        // Step 6: sort.
        if options.metric.is_distance() {
            survivors.sort_by(|a, b| a.1.total_cmp(&b.1));
        } else {
            survivors.sort_by(|a, b| b.1.total_cmp(&a.1));
        }

        // Step 8: truncate to limit.
        let vectors_filtered = vectors_scanned.saturating_sub(survivors.len());
        survivors.truncate(options.limit);
        let results_returned = survivors.len();

        let hits = survivors
            .into_iter()
            .map(|(vector_ref, score)| SearchHit {
                distance: options.metric.is_distance().then_some(score),
                score,
                vector_ref,
            })
            .collect();

        #[allow(clippy::cast_possible_truncation)]
        let stats = SearchStats {
            query_time_ms: started.elapsed().as_millis() as u64,
            vectors_scanned,
            vectors_filtered,
            results_returned,
            cache_hit: false,
        };

        Ok((hits, stats))
    }

    async fn load_candidates(&self, options: &SearchOptions) -> Result<Vec<VectorRecord>, SearchError> {
        const COLUMNS: &str =
            "id, document_id, collection, vector_blob, dimensions, normalized, model_name, metadata_json, created_at, updated_at";

        let mut rows = if let Some(collection) = &options.collection {
            self.conn
                .query(
                    &format!("SELECT {COLUMNS} FROM vectors WHERE collection = ?1"),
                    libsql::params![collection.clone()],
                )
                .await?
        } else if let Some(model_name) = &options.model_name {
            self.conn
                .query(
                    &format!("SELECT {COLUMNS} FROM vectors WHERE model_name = ?1"),
                    libsql::params![model_name.clone()],
                )
                .await?
        } else if let Some(dimensions) = options.dimensions {
            #[allow(clippy::cast_possible_wrap)]
            let dimensions = dimensions as i64;
            self.conn
                .query(&format!("SELECT {COLUMNS} FROM vectors WHERE dimensions = ?1"), libsql::params![dimensions])
                .await?
        } else {
            self.conn.query(&format!("SELECT {COLUMNS} FROM vectors"), ()).await?
        };

        let mut records = Vec::new();
        while let Some(row) = rows.next().await? {
            records.push(row_to_record(&row)?);
        }
        Ok(records)
    }
}

fn matches_metadata(stored: &Option<Json>, filter: &HashMap<String, Json>) -> bool {
    let Some(Json::Object(entries)) = stored else {
        return false;
    };
    filter.iter().all(|(key, expected)| entries.iter().any(|(k, v)| k == key && v == expected))
}

fn payload_to_text(payload: &Json) -> String {
    serde_json::Value::from(payload.clone()).to_string()
}

fn row_to_record(row: &libsql::Row) -> Result<VectorRecord, SearchError> {
    let id: String = row.get(0)?;
    let document_id: String = row.get(1)?;
    let collection: String = row.get(2)?;
    let vector_blob: Vec<u8> = row.get(3)?;
    let dimensions: i64 = row.get(4)?;
    let normalized: i64 = row.get(5)?;
    let model_name: Option<String> = row.get(6)?;
    let metadata_json: Option<String> = row.get(7)?;
    let created_at: String = row.get(8)?;
    let updated_at: String = row.get(9)?;

    let vector = hotfield_vector::blob::decode(&vector_blob)?;
    let metadata = metadata_json
        .map(|text| {
            serde_json::from_str::<serde_json::Value>(&text)
                .map(Json::from)
                .map_err(|e| SearchError::MalformedMetadata(format!("{id}: {e}")))
        })
        .transpose()?;

    Ok(VectorRecord {
        id,
        document_id,
        collection,
        vector,
        #[allow(clippy::cast_sign_loss)]
        dimensions: dimensions as usize,
        normalized: normalized != 0,
        model_name,
        metadata,
        created_at: parse_datetime(&created_at)?,
        updated_at: parse_datetime(&updated_at)?,
    })
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, SearchError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map(|naive| naive.and_utc())
        .map_err(|e| SearchError::Other(anyhow::anyhow!("failed to parse timestamp '{s}': {e}")))
}
