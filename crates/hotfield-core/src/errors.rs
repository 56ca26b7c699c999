//! Cross-cutting error types for hotfield.
//!
//! This module defines errors that can originate from any crate in the
//! system. Domain-specific errors (e.g., `QueryError`, `SchemaError`) are
//! defined in their respective crates. A unified error type is deferred to
//! `hotfield-store`, where all crate errors converge.

use thiserror::Error;

/// Errors that can be raised by any hotfield crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A field path was malformed (empty segment, or a reserved `$`-prefixed
    /// name used where a field path was expected).
    #[error("invalid field path: {0}")]
    InvalidPath(String),

    /// Data failed validation (shape, type, or constraint).
    #[error("validation error: {0}")]
    Validation(String),

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
