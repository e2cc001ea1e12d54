//! Reconciliation configuration.

/// Configuration parameters for a reconciliation run.
#[derive(Debug, Clone)]
pub struct ReconcileConfig {
    /// Coordinate comparison tolerance, in degrees.
    ///
    /// Inputs are rounded to 6 decimal places before comparison, so
    /// values below `5e-7` reject coordinates that differ only by
    /// rounding. The default sits exactly on that floor; widening it is
    /// a product decision, not a code default.
    pub epsilon_deg: f64,

    /// Half-width of the per-stop query box, in degrees.
    pub search_radius_deg: f64,

    /// Maximum in-flight per-stop queries.
    pub max_concurrent_queries: usize,

    /// `generator` string stamped on produced changesets.
    pub generator: String,

    /// `source` tag applied to synthesized route relations.
    pub source: String,
}

impl ReconcileConfig {
    /// Create a configuration with the default parameters.
    pub fn new() -> Self {
        Self {
            epsilon_deg: 5e-7,
            search_radius_deg: 0.001, // ~110m of latitude
            max_concurrent_queries: 4,
            generator: format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
            source: "GTFS".to_string(),
        }
    }

    /// Set the coordinate comparison tolerance.
    pub fn with_epsilon(mut self, epsilon_deg: f64) -> Self {
        self.epsilon_deg = epsilon_deg;
        self
    }

    /// Set the query box half-width.
    pub fn with_search_radius(mut self, radius_deg: f64) -> Self {
        self.search_radius_deg = radius_deg;
        self
    }

    /// Set the maximum in-flight queries.
    pub fn with_max_concurrent(mut self, n: usize) -> Self {
        self.max_concurrent_queries = n;
        self
    }

    /// Set the relation `source` tag.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self::new()
    }
}
