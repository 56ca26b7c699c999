//! Errors raised while parsing a filter or update expression.

use thiserror::Error;

/// Errors from parsing the client-facing filter/update grammar (§6).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FilterError {
    /// A field name started with `$`, which is reserved for operators.
    #[error("field name '{0}' is reserved (starts with '$')")]
    ReservedFieldName(String),

    /// A field name started with `_`, which addresses envelope fields and
    /// cannot be used as a user field in a filter/update body.
    #[error("field name '{0}' addresses an envelope field and cannot be used as a user field")]
    EnvelopeFieldName(String),

    /// An operator key was not one of the recognised operators (§6).
    #[error("unknown operator '{0}'")]
    UnknownOperator(String),

    /// `$and`/`$or` had zero children.
    #[error("'{0}' must have at least one child")]
    EmptyLogical(&'static str),

    /// An operator's operand had the wrong shape (e.g. `$in` given a
    /// non-array).
    #[error("malformed operand for '{operator}': {reason}")]
    MalformedOperand { operator: String, reason: String },

    /// The top-level filter or update value was not a JSON object.
    #[error("expected a JSON object, got: {0}")]
    NotAnObject(String),
}
