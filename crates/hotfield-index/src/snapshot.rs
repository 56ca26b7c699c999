//! An immutable, cloned view of one collection's bindings, handed to the
//! Query Translator so translation stays a pure function of
//! `(collection, filter, options, snapshot)` (§4.D).

use std::collections::HashMap;

use crate::slot::SlotBinding;

/// A point-in-time snapshot of the slot bindings for a single collection.
#[derive(Debug, Clone, Default)]
pub struct IndexSnapshot {
    pool_size: usize,
    bindings: HashMap<String, SlotBinding>,
}

impl IndexSnapshot {
    #[must_use]
    pub fn new(pool_size: usize, bindings: HashMap<String, SlotBinding>) -> Self {
        Self { pool_size, bindings }
    }

    /// The slot binding for `field_path`, if the field has been promoted.
    #[must_use]
    pub fn mapping(&self, field_path: &str) -> Option<&SlotBinding> {
        self.bindings.get(field_path)
    }

    #[must_use]
    pub const fn pool_size(&self) -> usize {
        self.pool_size
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
