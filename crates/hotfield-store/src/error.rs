//! The error type all Document Store Surface operations converge on.
//!
//! Mirrors `zen_db::error::DatabaseError`'s shape, but aggregates the
//! per-crate errors from the rest of the workspace (§7's error kinds map
//! onto specific variants here: `Input` onto [`StoreError::Filter`] /
//! [`StoreError::Update`], `Consistency` onto [`StoreError::LibSql`]
//! constraint failures, `Internal invariant violation` onto
//! [`StoreError::Schema`] / [`StoreError::Index`]).

use thiserror::Error;

/// Errors from the Document Store Surface.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The filter or update body did not match the client-facing grammar
    /// (§6) -- an Input error per §7, never retried.
    #[error("filter error: {0}")]
    Filter(#[from] hotfield_filter::FilterError),

    /// Query translation failed (e.g. an unrecognised `$type` name).
    #[error("query error: {0}")]
    Query(#[from] hotfield_query::QueryError),

    /// Index Registry operation failed.
    #[error("index error: {0}")]
    Index(#[from] hotfield_index::IndexError),

    /// Pattern Analyzer operation failed.
    #[error("pattern error: {0}")]
    Pattern(#[from] hotfield_patterns::PatternError),

    /// Schema Evolution Engine operation failed.
    #[error("schema error: {0}")]
    Schema(#[from] hotfield_schema::SchemaError),

    /// An update operator was applied against a value it cannot operate
    /// on (e.g. `$inc` on a string field).
    #[error("update error: {0}")]
    Update(String),

    /// No document exists with the given id (or it is tombstoned).
    #[error("document not found: {0}")]
    NotFound(String),

    /// Underlying libSQL error, including unique-constraint violations
    /// (a Consistency error per §7 -- surfaced verbatim, never
    /// auto-resolved).
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// Configuration failed to load.
    #[error("configuration error: {0}")]
    Config(#[from] figment::Error),

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
