//! Per-`(collection, field)` query counters (§4.E).

use chrono::{DateTime, Utc};

/// Counters for a single `(collection, field)` pair.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternEntry {
    pub collection: String,
    pub field: String,
    pub count: u64,
    pub last_queried: DateTime<Utc>,
    pub avg_result_count: f64,
    pub is_indexed_now: bool,
}

/// Relative priority of a promotion candidate, used to order
/// [`crate::analyzer::PatternAnalyzer::suggestions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Impact {
    Low,
    Medium,
    High,
}

impl Impact {
    /// §4.E's impact-estimate rule: `high` when `count > 1000` and
    /// `avg_result_count > 100`; `medium` when `count > 500` or
    /// `avg_result_count > 50`; `low` otherwise.
    #[must_use]
    pub fn estimate(count: u64, avg_result_count: f64) -> Self {
        if count > 1000 && avg_result_count > 100.0 {
            Self::High
        } else if count > 500 || avg_result_count > 50.0 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

/// A candidate field for promotion, ranked by [`Impact`].
#[derive(Debug, Clone, PartialEq)]
pub struct Suggestion {
    pub field: String,
    pub count: u64,
    pub avg_result_count: f64,
    pub impact: Impact,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn impact_estimate_matches_rule() {
        assert_eq!(Impact::estimate(1001, 101.0), Impact::High);
        assert_eq!(Impact::estimate(1001, 10.0), Impact::Medium); // count > 500
        assert_eq!(Impact::estimate(10, 60.0), Impact::Medium); // avg > 50
        assert_eq!(Impact::estimate(10, 5.0), Impact::Low);
        assert_eq!(Impact::estimate(500, 50.0), Impact::Low); // boundary is exclusive
    }
}
