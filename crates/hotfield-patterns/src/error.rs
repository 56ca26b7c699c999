//! Errors from the Pattern Analyzer.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PatternError {
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
