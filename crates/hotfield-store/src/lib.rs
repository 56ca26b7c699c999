//! # hotfield-store
//!
//! The Document Store Surface (§4.G): the crate downstream callers embed
//! to open a database, configure it, and run insert/find/count/update/
//! delete against collections. Wires the Index Registry, Pattern
//! Analyzer, Schema Evolution Engine, and Query Translator into one
//! connection-owning struct.

#![forbid(unsafe_code)]

mod apply_update;
pub mod config;
pub mod db;
pub mod document_store;
pub mod error;
pub mod tracing_init;

pub use config::HotfieldConfig;
pub use db::HotfieldDb;
pub use document_store::DocumentStore;
pub use error::StoreError;
pub use tracing_init::init_tracing;

pub use hotfield_core::{Document, Envelope, Json};
pub use hotfield_filter::{parse_filter, parse_update, Filter, Operator, Update, UpdateOp};
pub use hotfield_query::{QueryOptions, SortDirection};
