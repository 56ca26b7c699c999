//! A closed, tagged-variant JSON value.
//!
//! Used instead of `serde_json::Value` directly inside the Filter AST and
//! Query Translator so that equality, ordering, and type-inference
//! semantics are exactly what the design specifies rather than whatever
//! `serde_json` happens to do. Conversions to/from `serde_json::Value` are
//! provided at the boundary (client requests, payload storage).

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A JSON-shaped value: null, boolean, integer, float, string, array, or an
/// ordered object.
///
/// `Object` is a `Vec<(String, Json)>` rather than a map so that documents
/// preserve insertion order, matching the "ordered mapping" data model in
/// the design (§3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Json {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Array(Vec<Json>),
    Object(Vec<(String, Json)>),
}

/// The three SQL storage types a promoted field can bind to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DataType {
    Text,
    Integer,
    Real,
}

impl DataType {
    /// The SQLite column type keyword.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Text => "TEXT",
            Self::Integer => "INTEGER",
            Self::Real => "REAL",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl Json {
    /// Infer the indexed-column data type for this value, per §4.C:
    /// integer number → INTEGER, non-integer number → REAL, anything else
    /// → TEXT.
    #[must_use]
    pub const fn infer_data_type(&self) -> DataType {
        match self {
            Self::Int(_) => DataType::Integer,
            Self::Float(_) => DataType::Real,
            _ => DataType::Text,
        }
    }

    /// `true` if this is `Json::Null`.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Walk a dot-separated field path, returning the value at the leaf or
    /// `None` if any intermediate segment is missing or not an object.
    ///
    /// Array indexing by integer segment is intentionally unsupported here:
    /// `tags.0` resolves only if `tags` is itself an object keyed `"0"`.
    /// Promotion explicitly rejects purely-numeric path segments (see
    /// `hotfield-schema`); extraction stays total and permissive so JSON-path
    /// queries over arrays still degrade gracefully to "not found".
    #[must_use]
    pub fn extract(&self, path: &str) -> Option<&Json> {
        let mut current = self;
        for segment in path.split('.') {
            match current {
                Self::Object(fields) => {
                    current = &fields.iter().find(|(k, _)| k == segment)?.1;
                }
                _ => return None,
            }
        }
        Some(current)
    }

    /// Set a value at a dot-separated field path, creating intermediate
    /// objects as needed. Fails if an intermediate segment already holds a
    /// non-object value.
    ///
    /// # Errors
    ///
    /// Returns an error message if a path segment traverses through a
    /// non-object value.
    pub fn set_path(&mut self, path: &str, value: Json) -> Result<(), String> {
        let segments: Vec<&str> = path.split('.').collect();
        Self::set_path_rec(self, &segments, value)
    }

    fn set_path_rec(target: &mut Json, segments: &[&str], value: Json) -> Result<(), String> {
        let Some((head, rest)) = segments.split_first() else {
            return Err("empty path".to_string());
        };

        if !matches!(target, Json::Object(_)) {
            if matches!(target, Json::Null) {
                *target = Json::Object(Vec::new());
            } else {
                return Err(format!("cannot descend into non-object at '{head}'"));
            }
        }

        let Json::Object(fields) = target else {
            unreachable!("just normalized to Object above");
        };

        if rest.is_empty() {
            if let Some(entry) = fields.iter_mut().find(|(k, _)| k == head) {
                entry.1 = value;
            } else {
                fields.push(((*head).to_string(), value));
            }
            return Ok(());
        }

        if let Some(entry) = fields.iter_mut().find(|(k, _)| k == head) {
            Self::set_path_rec(&mut entry.1, rest, value)
        } else {
            let mut child = Json::Object(Vec::new());
            Self::set_path_rec(&mut child, rest, value)?;
            fields.push(((*head).to_string(), child));
            Ok(())
        }
    }

    /// Remove the leaf at a dot-separated field path. No-op if the path
    /// does not resolve.
    pub fn unset_path(&mut self, path: &str) {
        let segments: Vec<&str> = path.split('.').collect();
        Self::unset_path_rec(self, &segments);
    }

    fn unset_path_rec(target: &mut Json, segments: &[&str]) {
        let Json::Object(fields) = target else {
            return;
        };
        let Some((head, rest)) = segments.split_first() else {
            return;
        };
        if rest.is_empty() {
            fields.retain(|(k, _)| k != head);
            return;
        }
        if let Some(entry) = fields.iter_mut().find(|(k, _)| k == head) {
            Self::unset_path_rec(&mut entry.1, rest);
        }
    }

    /// Numeric value as `f64`, if this is `Int` or `Float`.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// String value, if this is `Str`.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Array elements, if this is `Array`.
    #[must_use]
    pub fn as_array(&self) -> Option<&[Json]> {
        match self {
            Self::Array(a) => Some(a.as_slice()),
            _ => None,
        }
    }

    /// A stable-ish total ordering over heterogeneous JSON values, used for
    /// sort fallback and `$gt`/`$lt` comparisons against the JSON path.
    /// Numbers compare numerically, strings lexicographically; values of
    /// different kinds order by a fixed kind rank (null < bool < number <
    /// string < array < object), matching common MongoDB-adjacent BSON type
    /// ordering closely enough for this design's purposes.
    #[must_use]
    pub fn cmp_loose(&self, other: &Json) -> Ordering {
        fn rank(v: &Json) -> u8 {
            match v {
                Json::Null => 0,
                Json::Bool(_) => 1,
                Json::Int(_) | Json::Float(_) => 2,
                Json::Str(_) => 3,
                Json::Array(_) => 4,
                Json::Object(_) => 5,
            }
        }
        match (self, other) {
            (Json::Bool(a), Json::Bool(b)) => a.cmp(b),
            (a, b) if a.as_f64().is_some() && b.as_f64().is_some() => a
                .as_f64()
                .unwrap()
                .partial_cmp(&b.as_f64().unwrap())
                .unwrap_or(Ordering::Equal),
            (Json::Str(a), Json::Str(b)) => a.cmp(b),
            _ => rank(self).cmp(&rank(other)),
        }
    }
}

impl From<serde_json::Value> for Json {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::Int(i)
                } else {
                    Self::Float(n.as_f64().unwrap_or(0.0))
                }
            }
            serde_json::Value::String(s) => Self::Str(s),
            serde_json::Value::Array(a) => Self::Array(a.into_iter().map(Json::from).collect()),
            serde_json::Value::Object(o) => {
                Self::Object(o.into_iter().map(|(k, v)| (k, Json::from(v))).collect())
            }
        }
    }
}

impl From<Json> for serde_json::Value {
    fn from(value: Json) -> Self {
        match value {
            Json::Null => Self::Null,
            Json::Bool(b) => Self::Bool(b),
            Json::Int(i) => Self::Number(i.into()),
            Json::Float(f) => serde_json::Number::from_f64(f).map_or(Self::Null, Self::Number),
            Json::Str(s) => Self::String(s),
            Json::Array(a) => Self::Array(a.into_iter().map(serde_json::Value::from).collect()),
            Json::Object(o) => Self::Object(
                o.into_iter()
                    .map(|(k, v)| (k, serde_json::Value::from(v)))
                    .collect(),
            ),
        }
    }
}

/// `true` if `name` is a reserved operator key (`$`-prefixed).
#[must_use]
pub fn is_reserved_operator(name: &str) -> bool {
    name.starts_with('$')
}

/// `true` if `name` is an envelope field name (root-level, `_`-prefixed).
#[must_use]
pub fn is_envelope_field(name: &str) -> bool {
    name.starts_with('_')
}
