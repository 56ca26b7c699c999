//! # hotfield-patterns
//!
//! The Pattern Analyzer (§4.E): tracks per-field query frequency and
//! result-set size, and decides when a field has earned a slot in the
//! dynamic index pool.

#![forbid(unsafe_code)]

pub mod analyzer;
pub mod entry;
pub mod error;

pub use analyzer::{PatternAnalyzer, DEFAULT_PROMOTION_THRESHOLD};
pub use entry::{Impact, PatternEntry, Suggestion};
pub use error::PatternError;
