//! # hotfield-schema
//!
//! The Schema Evolution Engine (§4.F): promotes hot fields into the
//! dynamic index pool, creates the backing partial index, backfills
//! existing rows, and keeps each document's slot columns in sync on
//! write.

#![forbid(unsafe_code)]

pub mod engine;
pub mod error;
pub mod paths;

pub use engine::{SchemaEngine, BACKFILL_PAGE_SIZE};
pub use error::SchemaError;
pub use paths::{is_array_segment_path, leaf_paths};
