//! Search-call statistics (§4.H step 8).

/// Diagnostics returned alongside every [`crate::engine::VectorSearchEngine::search`]
/// call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchStats {
    /// Wall-clock time spent inside `search`, in milliseconds.
    pub query_time_ms: u64,
    /// Candidates loaded from storage before any filtering (§4.H step 1).
    pub vectors_scanned: usize,
    /// Candidates dropped by dimension mismatch, metadata filter,
    /// threshold, or the self-match rule (§4.H steps 2, 3, 5, 7).
    pub vectors_filtered: usize,
    /// Length of the returned result list, after `limit` is applied.
    pub results_returned: usize,
    /// Always `false`: this engine has no result cache (reserved for a
    /// future caching layer, kept in the shape for wire compatibility).
    pub cache_hit: bool,
}
