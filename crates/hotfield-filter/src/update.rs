//! The Update AST: `$set`/`$unset`/`$inc`/`$mul`/`$push`/`$pull`/`$addToSet`
//! operators (§4.G, §6).

use hotfield_core::Json;

/// A single update operation on one field path.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOp {
    /// Assign a value, creating intermediate objects as needed.
    Set(Json),
    /// Remove the leaf.
    Unset,
    /// Add `delta` to the current value (absent treated as `0`).
    Inc(f64),
    /// Multiply the current value by `factor` (absent treated as `0`,
    /// matching MongoDB's literal semantics — see DESIGN.md).
    Mul(f64),
    /// Append a value to an array field, creating it if absent.
    Push(Json),
    /// Remove every array element deep-equal to the given value.
    Pull(Json),
    /// Like `Push`, but a no-op if an equal element is already present.
    AddToSet(Json),
}

/// A parsed update expression: an ordered list of `(field_path, op)` pairs.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Update {
    pub ops: Vec<(String, UpdateOp)>,
}

impl Update {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, path: String, op: UpdateOp) {
        self.ops.push((path, op));
    }

    /// `true` if this update has no operations (applying it is a no-op).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}
