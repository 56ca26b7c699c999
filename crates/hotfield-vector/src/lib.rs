//! # hotfield-vector
//!
//! Stateless float-vector arithmetic: norms, normalization, distance
//! metrics, scalar quantization, and blob encoding. No I/O, no async — the
//! leaf dependency of the Vector Search Engine (`hotfield-search`) and the
//! Schema Evolution Engine's numeric column handling.

#![forbid(unsafe_code)]

pub mod blob;
pub mod error;
pub mod metric;
pub mod quantize;

pub use error::VectorError;
pub use metric::{
    approx_eq, cosine, cosine_distance, dot, euclidean, manhattan, norm, normalize,
    squared_euclidean, validate, EPSILON, MAX_DIMENSIONS,
};
