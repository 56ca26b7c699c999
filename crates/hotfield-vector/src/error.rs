//! Error types for vector primitives.

use thiserror::Error;

/// Errors from vector arithmetic.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VectorError {
    /// Two vectors compared or combined had different dimensions.
    #[error("dimension mismatch: {a} vs {b}")]
    DimensionMismatch { a: usize, b: usize },

    /// Normalization was attempted on a zero vector.
    #[error("cannot normalize a zero vector")]
    ZeroVector,

    /// A vector scalar was not finite (NaN or infinite).
    #[error("vector contains a non-finite value at index {index}")]
    NonFinite { index: usize },

    /// A vector had zero dimensions, or exceeded the maximum allowed.
    #[error("dimensions {0} out of bounds [1, 4096]")]
    DimensionsOutOfBounds(usize),

    /// A blob had a length that is not a multiple of 4 bytes, or did not
    /// match the expected dimension count.
    #[error("malformed vector blob: {0}")]
    MalformedBlob(String),
}
