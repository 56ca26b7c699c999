//! # hotfield-core
//!
//! Shared types for hotfield: the document envelope, the `Json` value type
//! used throughout the Filter AST and Query Translator, ID generation, and
//! cross-cutting error types.
//!
//! This crate provides the foundational types shared across all hotfield
//! crates:
//! - [`Json`] — a closed tagged-variant JSON value, used instead of
//!   `serde_json::Value` directly so the filter/update grammar's semantics
//!   (§4.B, §9 of the design) stay exactly what we specify, independent of
//!   `serde_json`'s own coercion behavior.
//! - [`Document`] / [`Envelope`] — the always-present document metadata.
//! - [`ids`] — prefixed ID generation (`doc-xxxxxxxx` style).
//! - [`errors`] — the cross-cutting [`errors::CoreError`].

#![forbid(unsafe_code)]

pub mod envelope;
pub mod errors;
pub mod ids;
pub mod json;

pub use envelope::{Document, Envelope};
pub use errors::CoreError;
pub use json::Json;
