//! Error types for the Vector Search Engine.
//!
//! Mirrors `zen_search::error::SearchError`'s shape: a catch-all
//! `Other(anyhow::Error)` arm plus domain-specific variants for the
//! failure modes this crate actually surfaces. The Input-kind errors
//! (§7) -- unknown metric, dimension mismatch, negative threshold --
//! are never retried by a caller.

use thiserror::Error;

/// Errors from vector insertion and k-NN search.
#[derive(Debug, Error)]
pub enum SearchError {
    /// A vector scalar failed validation, or the query/candidate vectors
    /// disagreed in dimensionality.
    #[error(transparent)]
    Vector(#[from] hotfield_vector::VectorError),

    /// `threshold` was negative (§4.H step 5).
    #[error("threshold must be non-negative, got {0}")]
    NegativeThreshold(f64),

    /// `metadata_json` stored for a vector row was not a JSON object.
    #[error("stored metadata for vector '{0}' is not a JSON object")]
    MalformedMetadata(String),

    /// Underlying libSQL error.
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
