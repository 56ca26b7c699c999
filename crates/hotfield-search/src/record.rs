//! The stored row shape backing a single embedding (§6 persisted state
//! layout, `vectors` table).

use chrono::{DateTime, Utc};
use hotfield_core::Json;

/// One stored vector, owned by exactly one `(document_id, model_name)` pair.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorRecord {
    /// This row's own id (`vec-xxxxxxxx`).
    pub id: String,
    /// The document this embedding was computed from.
    pub document_id: String,
    /// The collection the owning document lives in.
    pub collection: String,
    /// The embedding itself.
    pub vector: Vec<f32>,
    /// `vector.len()`, kept as a column so candidate loading can filter on
    /// it without decoding every blob.
    pub dimensions: usize,
    /// Whether `vector` is already unit-length (an optimization hint; the
    /// engine does not rely on it for correctness).
    pub normalized: bool,
    /// The embedding model that produced this vector, if known.
    pub model_name: Option<String>,
    /// Arbitrary metadata, exact-matched by [`crate::options::SearchOptions::metadata_filter`].
    pub metadata: Option<Json>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
