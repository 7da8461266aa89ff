//! Rule-based estimator used to bootstrap LEARN runs
//!
//! The sample grows with the square root of the row estimate, boosted by how
//! distinct the columns are and how much churn the table has seen, then
//! bounded by the configured minimum/maximum and by the table itself.

use statsampler_domain::{
    EstimatorConfig, Feature, Result, SampleSize, SampleSizeDecision, SampleUnit, TableMetrics,
};

use super::ports::SampleSizeEstimator;

/// Deterministic heuristic estimator.
#[derive(Debug, Clone)]
pub struct HeuristicEstimator {
    config: EstimatorConfig,
}

impl HeuristicEstimator {
    pub fn new(config: EstimatorConfig) -> Self {
        Self { config }
    }

    /// Recommended sample in rows, before unit conversion.
    pub fn sample_rows(&self, metrics: &TableMetrics) -> Result<f64> {
        let rows = metrics.row_count()?;
        let distinct_ratio = metrics.require(Feature::AvgDistinctRatio)?.clamp(0.0, 1.0);
        let dead_ratio = metrics.require(Feature::DeadTupleRatio)?.clamp(0.0, 1.0);

        let base = self.config.rows_per_sqrt * rows.sqrt();
        let boosted = base * (1.0 + distinct_ratio) * (1.0 + dead_ratio);
        let bounded = boosted
            .max(self.config.min_sample_rows as f64)
            .min(self.config.max_sample_rows as f64)
            .min(rows);

        Ok(bounded.ceil())
    }
}

impl SampleSizeEstimator for HeuristicEstimator {
    fn estimate(&self, metrics: &TableMetrics) -> Result<SampleSizeDecision> {
        let rows = metrics.row_count()?;
        let sample_rows = self.sample_rows(metrics)?;
        let size = SampleSize::from_rows(sample_rows, rows, self.config.unit);
        Ok(SampleSizeDecision::new(metrics.table().clone(), size, rows))
    }

    fn unit(&self) -> SampleUnit {
        self.config.unit
    }
}
