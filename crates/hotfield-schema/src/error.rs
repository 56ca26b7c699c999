//! Errors from the Schema Evolution Engine.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaError {
    /// A field path contains a purely-numeric segment (array indexing),
    /// which is never eligible for promotion.
    #[error("field path '{0}' contains an array segment and cannot be promoted")]
    UnsupportedPath(String),

    #[error("index error: {0}")]
    Index(#[from] hotfield_index::IndexError),

    #[error("pattern error: {0}")]
    Pattern(#[from] hotfield_patterns::PatternError),

    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
