//! # hotfield-query
//!
//! The Query Translator (§4.D): compiles a [`hotfield_filter::Filter`]
//! into parameterised SQL against the `documents` table, choosing between
//! an indexed slot column and a `json_extract` fallback per field.

#![forbid(unsafe_code)]

pub mod error;
pub mod options;
pub mod translator;

pub use error::QueryError;
pub use options::{QueryOptions, SortDirection};
pub use translator::{regex_to_like, translate, translate_with_select, Translation};
