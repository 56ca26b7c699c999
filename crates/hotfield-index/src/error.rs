//! Errors from the Index Registry.

use thiserror::Error;

/// Errors raised while loading, allocating, or binding index slots.
#[derive(Debug, Error)]
pub enum IndexError {
    /// The slot pool for a collection has no free slots left.
    #[error("slot pool for collection '{0}' is exhausted")]
    PoolExhausted(String),

    /// `bind` was called twice for the same `(collection, field_path)`.
    #[error("field '{field_path}' in collection '{collection}' is already bound to a slot")]
    AlreadyBound { collection: String, field_path: String },

    /// `bind` was called with a slot already occupied by another field.
    #[error("slot {slot} in collection '{collection}' is already in use")]
    SlotAlreadyUsed { collection: String, slot: u32 },

    /// A slot id fell outside `1..=pool_size`.
    #[error("slot {slot} is out of range for a pool of size {pool_size}")]
    SlotOutOfRange { slot: u32, pool_size: usize },

    /// Underlying libSQL error.
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
