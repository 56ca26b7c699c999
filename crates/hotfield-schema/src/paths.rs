//! Field-path helpers for promotion eligibility.

use hotfield_core::json::{is_envelope_field, Json};

/// `true` if any dot-separated segment of `path` is purely numeric (an
/// array index). Such paths are reachable by JSON extraction but are
/// never eligible for promotion, since a slot column cannot represent
/// "the Nth element of this document's array".
#[must_use]
pub fn is_array_segment_path(path: &str) -> bool {
    path.split('.').any(|segment| !segment.is_empty() && segment.chars().all(|c| c.is_ascii_digit()))
}

/// Every leaf field path in `document`, skipping envelope (`_`-prefixed)
/// top-level keys. A leaf is any value that is not itself an object;
/// arrays count as leaves (promoting `tags` stores its JSON text form),
/// their elements do not get their own paths since `Json::extract` never
/// indexes into arrays.
#[must_use]
pub fn leaf_paths(document: &Json) -> Vec<String> {
    let mut paths = Vec::new();
    if let Json::Object(fields) = document {
        for (key, value) in fields {
            if is_envelope_field(key) {
                continue;
            }
            collect(key, value, &mut paths);
        }
    }
    paths
}

fn collect(prefix: &str, value: &Json, out: &mut Vec<String>) {
    match value {
        Json::Object(fields) if !fields.is_empty() => {
            for (key, child) in fields {
                collect(&format!("{prefix}.{key}"), child, out);
            }
        }
        _ => out.push(prefix.to_string()),
    }
}
