//! The Pattern Analyzer: tracks how often each field is queried and how
//! many rows each query returns, to drive index promotion decisions
//! (§4.E).

use std::collections::HashMap;

use chrono::Utc;
use tracing::debug;

use crate::entry::{Impact, PatternEntry, Suggestion};
use crate::error::PatternError;

/// Default promotion threshold (§4.E).
pub const DEFAULT_PROMOTION_THRESHOLD: u64 = 100;

/// Write-through cache of per-`(collection, field)` counters, backed by
/// the `query_patterns` table. Single-writer per key, as required by §5.
pub struct PatternAnalyzer {
    conn: libsql::Connection,
    promotion_threshold: u64,
    cache: HashMap<(String, String), PatternEntry>,
}

impl PatternAnalyzer {
    #[must_use]
    pub fn new(conn: libsql::Connection) -> Self {
        Self::with_threshold(conn, DEFAULT_PROMOTION_THRESHOLD)
    }

    #[must_use]
    pub fn with_threshold(conn: libsql::Connection, promotion_threshold: u64) -> Self {
        Self { conn, promotion_threshold, cache: HashMap::new() }
    }

    /// Record that `fields` were touched by a query against `collection`
    /// that returned `result_count` rows. Increments `count` for every
    /// field, and folds `result_count` into `avg_result_count` via the
    /// running mean `(old + new) / 2`, matching the teacher's
    /// two-observation smoothing rather than a weighted EMA.
    ///
    /// # Errors
    ///
    /// Returns `PatternError::LibSql` if persistence fails.
    pub async fn record(
        &mut self,
        collection: &str,
        fields: &[String],
        result_count: u64,
    ) -> Result<(), PatternError> {
        let now = Utc::now();
        for field in fields {
            let key = (collection.to_string(), field.clone());
            let entry = self.load_or_default(&key).await?;

            let new_avg = if entry.count == 0 {
                result_count as f64
            } else {
                (entry.avg_result_count + result_count as f64) / 2.0
            };

            let updated = PatternEntry {
                collection: collection.to_string(),
                field: field.clone(),
                count: entry.count + 1,
                last_queried: now,
                avg_result_count: new_avg,
                is_indexed_now: entry.is_indexed_now,
            };

            self.persist(&updated).await?;
            self.cache.insert(key, updated);
        }
        Ok(())
    }

    /// Mark a field as now indexed (called once the Schema Evolution
    /// Engine promotes it), so future `should_promote` calls stop firing.
    ///
    /// # Errors
    ///
    /// Returns `PatternError::LibSql` if persistence fails.
    pub async fn mark_indexed(&mut self, collection: &str, field: &str) -> Result<(), PatternError> {
        let key = (collection.to_string(), field.to_string());
        let mut entry = self.load_or_default(&key).await?;
        entry.is_indexed_now = true;
        self.persist(&entry).await?;
        self.cache.insert(key, entry);
        Ok(())
    }

    /// `true` if `field` in `collection` has crossed the promotion
    /// threshold and is not already indexed.
    ///
    /// # Errors
    ///
    /// Returns `PatternError::LibSql` if the entry must be loaded and
    /// that load fails.
    pub async fn should_promote(&mut self, collection: &str, field: &str) -> Result<bool, PatternError> {
        let key = (collection.to_string(), field.to_string());
        let entry = self.load_or_default(&key).await?;
        Ok(entry.count >= self.promotion_threshold && !entry.is_indexed_now)
    }

    /// All unindexed fields in `collection` that have ever been queried,
    /// ranked by descending [`Impact`] then by descending count.
    ///
    /// # Errors
    ///
    /// Returns `PatternError::LibSql` if the scan fails.
    pub async fn suggestions(&mut self, collection: &str) -> Result<Vec<Suggestion>, PatternError> {
        self.load_collection(collection).await?;

        let mut out: Vec<Suggestion> = self
            .cache
            .iter()
            .filter(|((c, _), entry)| c == collection && !entry.is_indexed_now)
            .map(|(_, entry)| Suggestion {
                field: entry.field.clone(),
                count: entry.count,
                avg_result_count: entry.avg_result_count,
                impact: Impact::estimate(entry.count, entry.avg_result_count),
            })
            .collect();

        out.sort_by(|a, b| b.impact.cmp(&a.impact).then(b.count.cmp(&a.count)));
        Ok(out)
    }

    async fn load_or_default(&mut self, key: &(String, String)) -> Result<PatternEntry, PatternError> {
        if let Some(entry) = self.cache.get(key) {
            return Ok(entry.clone());
        }

        let (collection, field) = key;
        let mut rows = self
            .conn
            .query(
                "SELECT count, last_queried, avg_result_count, is_indexed_now
                 FROM query_patterns WHERE collection = ?1 AND field = ?2",
                libsql::params![collection.as_str(), field.as_str()],
            )
            .await?;

        let entry = if let Some(row) = rows.next().await? {
            let count: i64 = row.get(0)?;
            let last_queried: String = row.get(1)?;
            let avg_result_count: f64 = row.get(2)?;
            let is_indexed_now: i64 = row.get(3)?;
            PatternEntry {
                collection: collection.clone(),
                field: field.clone(),
                count: count as u64,
                last_queried: chrono::DateTime::parse_from_rfc3339(&last_queried)
                    .map(|dt| dt.with_timezone(&Utc))
                    .unwrap_or_else(|_| Utc::now()),
                avg_result_count,
                is_indexed_now: is_indexed_now != 0,
            }
        } else {
            PatternEntry {
                collection: collection.clone(),
                field: field.clone(),
                count: 0,
                last_queried: Utc::now(),
                avg_result_count: 0.0,
                is_indexed_now: false,
            }
        };

        self.cache.insert(key.clone(), entry.clone());
        Ok(entry)
    }

    async fn load_collection(&mut self, collection: &str) -> Result<(), PatternError> {
        let mut rows = self
            .conn
            .query(
                "SELECT field, count, last_queried, avg_result_count, is_indexed_now
                 FROM query_patterns WHERE collection = ?1",
                [collection],
            )
            .await?;

        while let Some(row) = rows.next().await? {
            let field: String = row.get(0)?;
            let count: i64 = row.get(1)?;
            let last_queried: String = row.get(2)?;
            let avg_result_count: f64 = row.get(3)?;
            let is_indexed_now: i64 = row.get(4)?;
            let key = (collection.to_string(), field.clone());
            self.cache.entry(key).or_insert(PatternEntry {
                collection: collection.to_string(),
                field,
                count: count as u64,
                last_queried: chrono::DateTime::parse_from_rfc3339(&last_queried)
                    .map(|dt| dt.with_timezone(&Utc))
                    .unwrap_or_else(|_| Utc::now()),
                avg_result_count,
                is_indexed_now: is_indexed_now != 0,
            });
        }
        Ok(())
    }

    async fn persist(&self, entry: &PatternEntry) -> Result<(), PatternError> {
        self.conn
            .execute(
                "INSERT INTO query_patterns (collection, field, count, last_queried, avg_result_count, is_indexed_now)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT (collection, field) DO UPDATE SET
                    count = excluded.count,
                    last_queried = excluded.last_queried,
                    avg_result_count = excluded.avg_result_count,
                    is_indexed_now = excluded.is_indexed_now",
                libsql::params![
                    entry.collection.as_str(),
                    entry.field.as_str(),
                    entry.count as i64,
                    entry.last_queried.to_rfc3339(),
                    entry.avg_result_count,
                    i64::from(entry.is_indexed_now),
                ],
            )
            .await?;
        debug!(collection = entry.collection, field = entry.field, count = entry.count, "persisted query pattern");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_conn() -> libsql::Connection {
        let db = libsql::Builder::new_local(":memory:").build().await.unwrap();
        let conn = db.connect().unwrap();
        conn.execute_batch(
            "CREATE TABLE query_patterns (
                collection TEXT NOT NULL,
                field TEXT NOT NULL,
                count INTEGER NOT NULL,
                last_queried TEXT NOT NULL,
                avg_result_count REAL NOT NULL,
                is_indexed_now INTEGER NOT NULL,
                PRIMARY KEY (collection, field)
            );",
        )
        .await
        .unwrap();
        conn
    }

    #[tokio::test]
    async fn record_increments_count_monotonically() {
        let conn = test_conn().await;
        let mut analyzer = PatternAnalyzer::new(conn);
        for _ in 0..5 {
            analyzer.record("users", &["email".to_string()], 10).await.unwrap();
        }
        assert!(!analyzer.should_promote("users", "email").await.unwrap());
        let entry = analyzer.load_or_default(&("users".into(), "email".into())).await.unwrap();
        assert_eq!(entry.count, 5);
    }

    #[tokio::test]
    async fn avg_result_count_is_stable_under_identical_observations() {
        let conn = test_conn().await;
        let mut analyzer = PatternAnalyzer::new(conn);
        for _ in 0..10 {
            analyzer.record("users", &["email".to_string()], 42).await.unwrap();
        }
        let entry = analyzer.load_or_default(&("users".into(), "email".into())).await.unwrap();
        assert!((entry.avg_result_count - 42.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn should_promote_fires_past_threshold() {
        let conn = test_conn().await;
        let mut analyzer = PatternAnalyzer::with_threshold(conn, 3);
        for _ in 0..3 {
            analyzer.record("users", &["email".to_string()], 1).await.unwrap();
        }
        assert!(analyzer.should_promote("users", "email").await.unwrap());
    }

    #[tokio::test]
    async fn mark_indexed_stops_promotion_suggestions() {
        let conn = test_conn().await;
        let mut analyzer = PatternAnalyzer::with_threshold(conn, 1);
        analyzer.record("users", &["email".to_string()], 1).await.unwrap();
        assert!(analyzer.should_promote("users", "email").await.unwrap());
        analyzer.mark_indexed("users", "email").await.unwrap();
        assert!(!analyzer.should_promote("users", "email").await.unwrap());
    }

    #[tokio::test]
    async fn suggestions_ranks_by_impact_then_count() {
        let conn = test_conn().await;
        let mut analyzer = PatternAnalyzer::new(conn);
        for _ in 0..1100 {
            analyzer.record("users", &["email".to_string()], 150).await.unwrap();
        }
        for _ in 0..600 {
            analyzer.record("users", &["age".to_string()], 10).await.unwrap();
        }
        let suggestions = analyzer.suggestions("users").await.unwrap();
        assert_eq!(suggestions[0].field, "email");
        assert_eq!(suggestions[0].impact, Impact::High);
        assert_eq!(suggestions[1].field, "age");
        assert_eq!(suggestions[1].impact, Impact::Medium);
    }

    #[tokio::test]
    async fn persisted_counters_survive_reload() {
        let conn = test_conn().await;
        {
            let mut analyzer = PatternAnalyzer::new(conn.clone());
            analyzer.record("users", &["email".to_string()], 5).await.unwrap();
        }
        let mut analyzer2 = PatternAnalyzer::new(conn);
        let entry = analyzer2.load_or_default(&("users".into(), "email".into())).await.unwrap();
        assert_eq!(entry.count, 1);
    }
}
