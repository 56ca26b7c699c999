//! Slot bindings and the column-naming convention shared with
//! `hotfield-query` and `hotfield-schema`.

use hotfield_core::json::DataType;

/// One binding of a field path to a slot column within a collection.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotBinding {
    pub field_path: String,
    pub slot: u32,
    pub data_type: DataType,
}

/// Summary of slot usage for a collection.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexStats {
    pub pool_size: usize,
    pub slots_used: usize,
    pub bindings: Vec<SlotBinding>,
}

/// The SQL column name a slot id is bound to on the `documents` table.
///
/// Slots are 1-indexed (`slot_1 ..= slot_{pool_size}`).
#[must_use]
pub fn slot_column_name(slot: u32) -> String {
    format!("slot_{slot}")
}
