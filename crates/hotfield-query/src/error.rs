//! Errors from query translation.

use thiserror::Error;

/// Errors raised while translating a [`hotfield_filter::Filter`] into SQL.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// A `$type` operand did not match any recognised type name.
    #[error("unrecognised $type value '{0}'")]
    UnsupportedType(String),
}
