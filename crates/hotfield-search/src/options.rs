//! Search options and the metric enum (§4.H contract).

use std::collections::HashMap;

use hotfield_core::Json;

/// A similarity or distance metric usable by [`crate::engine::VectorSearchEngine::search`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    /// Cosine similarity, `[-1, 1]`, higher is more similar.
    Cosine,
    /// Euclidean (L2) distance, lower is more similar.
    Euclidean,
    /// Raw dot product, higher is more similar.
    Dot,
    /// Manhattan (L1) distance, lower is more similar.
    Manhattan,
}

impl Metric {
    /// `true` for metrics where a lower score means "more similar" (§4.H
    /// step 5/6).
    #[must_use]
    pub const fn is_distance(self) -> bool {
        matches!(self, Self::Euclidean | Self::Manhattan)
    }

    /// Compute this metric between two equal-length vectors.
    ///
    /// # Errors
    ///
    /// Returns [`hotfield_vector::VectorError::DimensionMismatch`] if `a`
    /// and `b` differ in length.
    pub fn compute(self, a: &[f32], b: &[f32]) -> Result<f64, hotfield_vector::VectorError> {
        match self {
            Self::Cosine => hotfield_vector::cosine(a, b),
            Self::Euclidean => hotfield_vector::euclidean(a, b),
            Self::Dot => hotfield_vector::dot(a, b),
            Self::Manhattan => hotfield_vector::manhattan(a, b),
        }
    }
}

impl Default for Metric {
    fn default() -> Self {
        Self::Cosine
    }
}

/// Options for a k-NN search (§4.H).
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Maximum number of results to return. Default `10`.
    pub limit: usize,
    /// Metric to score candidates with. Default [`Metric::Cosine`].
    pub metric: Metric,
    /// Restrict candidates to this collection (cheapest filter, tried
    /// first).
    pub collection: Option<String>,
    /// Restrict candidates to vectors produced by this embedding model.
    pub model_name: Option<String>,
    /// Restrict candidates to vectors of this dimensionality.
    pub dimensions: Option<usize>,
    /// Score cutoff (§4.H step 5). Must be non-negative.
    pub threshold: Option<f64>,
    /// Whether a candidate identical to the query vector may appear in
    /// results. Default `false`.
    pub include_self: bool,
    /// Exact-match filter against each vector's stored metadata object.
    pub metadata_filter: Option<HashMap<String, Json>>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            limit: 10,
            metric: Metric::Cosine,
            collection: None,
            model_name: None,
            dimensions: None,
            threshold: None,
            include_self: false,
            metadata_filter: None,
        }
    }
}

impl SearchOptions {
    /// A default-valued set of options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the result limit.
    #[must_use]
    pub const fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Set the metric.
    #[must_use]
    pub const fn with_metric(mut self, metric: Metric) -> Self {
        self.metric = metric;
        self
    }

    /// Restrict candidates to a collection.
    #[must_use]
    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = Some(collection.into());
        self
    }

    /// Restrict candidates to an embedding model.
    #[must_use]
    pub fn with_model_name(mut self, model_name: impl Into<String>) -> Self {
        self.model_name = Some(model_name.into());
        self
    }

    /// Restrict candidates to a dimensionality.
    #[must_use]
    pub const fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = Some(dimensions);
        self
    }

    /// Set the score cutoff.
    #[must_use]
    pub const fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = Some(threshold);
        self
    }

    /// Allow a candidate identical to the query vector in results.
    #[must_use]
    pub const fn with_include_self(mut self, include_self: bool) -> Self {
        self.include_self = include_self;
        self
    }

    /// Restrict candidates by exact-match metadata keys.
    #[must_use]
    pub fn with_metadata_filter(mut self, filter: HashMap<String, Json>) -> Self {
        self.metadata_filter = Some(filter);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_match_spec() {
        let options = SearchOptions::default();
        assert_eq!(options.limit, 10);
        assert_eq!(options.metric, Metric::Cosine);
        assert!(!options.include_self);
        assert!(options.threshold.is_none());
    }

    #[test]
    fn distance_metrics_are_euclidean_and_manhattan() {
        assert!(Metric::Euclidean.is_distance());
        assert!(Metric::Manhattan.is_distance());
        assert!(!Metric::Cosine.is_distance());
        assert!(!Metric::Dot.is_distance());
    }

    #[test]
    fn builder_chains_overrides() {
        let options = SearchOptions::new()
            .with_limit(3)
            .with_metric(Metric::Euclidean)
            .with_collection("docs")
            .with_threshold(0.5)
            .with_include_self(true);
        assert_eq!(options.limit, 3);
        assert_eq!(options.metric, Metric::Euclidean);
        assert_eq!(options.collection.as_deref(), Some("docs"));
        assert_eq!(options.threshold, Some(0.5));
        assert!(options.include_self);
    }
}
