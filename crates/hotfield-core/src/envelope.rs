//! The document envelope: fields present on every stored document,
//! regardless of payload shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::json::Json;

/// Envelope fields always present on a document, never user-controlled.
///
/// Field names intentionally mirror the `_`-prefixed client-facing names
/// from §6 (`_id`, `_collection`, `_version`, `_created_at`, `_updated_at`,
/// `_deleted`) so envelope round-tripping through JSON needs no renaming.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub id: String,
    pub collection: String,
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted: bool,
}

impl Envelope {
    /// A fresh envelope for a newly inserted document.
    #[must_use]
    pub fn new(id: String, collection: String, now: DateTime<Utc>) -> Self {
        Self {
            id,
            collection,
            version: 1,
            created_at: now,
            updated_at: now,
            deleted: false,
        }
    }

    /// Bump the version and updated timestamp for a mutation.
    pub fn bump(&mut self, now: DateTime<Utc>) {
        self.version += 1;
        self.updated_at = now;
    }
}

/// A full document: envelope plus payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(flatten)]
    pub envelope: Envelope,
    pub payload: Json,
}

impl Document {
    /// Extract a value at a dot-separated field path from the payload, or
    /// from an envelope field when `path` starts with `_`.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<Json> {
        if path.starts_with('_') {
            return self.get_envelope_field(path);
        }
        self.payload.extract(path).cloned()
    }

    fn get_envelope_field(&self, path: &str) -> Option<Json> {
        match path {
            "_id" => Some(Json::Str(self.envelope.id.clone())),
            "_collection" => Some(Json::Str(self.envelope.collection.clone())),
            "_version" => Some(Json::Int(self.envelope.version as i64)),
            "_created_at" => Some(Json::Str(self.envelope.created_at.to_rfc3339())),
            "_updated_at" => Some(Json::Str(self.envelope.updated_at.to_rfc3339())),
            "_deleted" => Some(Json::Bool(self.envelope.deleted)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_bump_increments_version() {
        let now = Utc::now();
        let mut env = Envelope::new("doc-1".into(), "users".into(), now);
        assert_eq!(env.version, 1);
        let later = now + chrono::Duration::seconds(1);
        env.bump(later);
        assert_eq!(env.version, 2);
        assert_eq!(env.updated_at, later);
    }

    #[test]
    fn document_get_reads_envelope_and_payload() {
        let now = Utc::now();
        let doc = Document {
            envelope: Envelope::new("doc-1".into(), "users".into(), now),
            payload: serde_json::json!({"name": "Alice"}).into(),
        };
        assert_eq!(doc.get("_id"), Some(Json::Str("doc-1".into())));
        assert_eq!(doc.get("_deleted"), Some(Json::Bool(false)));
        assert_eq!(doc.get("name"), Some(Json::Str("Alice".into())));
        assert_eq!(doc.get("missing"), None);
    }
}
