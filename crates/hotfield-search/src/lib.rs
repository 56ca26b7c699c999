//! # hotfield-search
//!
//! The Vector Search Engine (§4.H): a brute-force k-NN engine over vectors
//! stored alongside documents, scored in Rust using `hotfield-vector`'s
//! metric primitives. Shares its connection with `hotfield-store` rather
//! than depending on it.

#![forbid(unsafe_code)]

pub mod engine;
pub mod error;
pub mod options;
pub mod record;
pub mod stats;

pub use engine::{SearchHit, VectorSearchEngine};
pub use error::SearchError;
pub use options::{Metric, SearchOptions};
pub use record::VectorRecord;
pub use stats::SearchStats;
