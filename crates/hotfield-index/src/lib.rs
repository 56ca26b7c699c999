//! # hotfield-index
//!
//! The Index Registry (§4.C): tracks which field paths have been promoted
//! to a dedicated slot column, and hands out immutable snapshots for the
//! Query Translator to consult.

#![forbid(unsafe_code)]

pub mod error;
pub mod registry;
pub mod slot;
pub mod snapshot;

pub use error::IndexError;
pub use registry::IndexRegistry;
pub use slot::{slot_column_name, IndexStats, SlotBinding};
pub use snapshot::IndexSnapshot;
