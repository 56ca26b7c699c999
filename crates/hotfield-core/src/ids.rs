//! Prefixed ID generation.
//!
//! IDs follow the `{prefix}-{8 hex chars}` convention (e.g. `doc-a1b2c3d4`),
//! generated client-side rather than as a SQL `DEFAULT` so the Document
//! Store Surface knows the id *before* it computes indexed slot values for
//! the insert statement.

/// Generate a prefixed ID: `{prefix}-` followed by 8 lowercase hex digits
/// from 4 random bytes.
///
/// # Panics
///
/// Panics if the system random source is unavailable. This mirrors the
/// teacher's use of `randomblob()` inside SQLite, which has no fallible
/// path exposed to callers either.
#[must_use]
pub fn generate(prefix: &str) -> String {
    let mut buf = [0u8; 4];
    getrandom::fill(&mut buf).expect("system random source unavailable");
    let mut out = String::with_capacity(prefix.len() + 9);
    out.push_str(prefix);
    out.push('-');
    for byte in buf {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}
