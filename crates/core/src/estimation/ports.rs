//! Port interfaces for sample-size estimation

use statsampler_domain::{Result, SampleSizeDecision, SampleUnit, TableMetrics};

/// Capability shared by every estimator backend.
///
/// Estimation is pure computation over already-collected metrics, so the
/// trait is synchronous.
pub trait SampleSizeEstimator: Send + Sync {
    /// Recommend a sample size for the table `metrics` describes.
    ///
    /// Fails with `Estimation` when required features are missing.
    fn estimate(&self, metrics: &TableMetrics) -> Result<SampleSizeDecision>;

    /// Unit the returned sizes are expressed in.
    fn unit(&self) -> SampleUnit;
}

/// Opaque fitted model: features in, raw sample-size value out.
///
/// Output is untrusted arithmetic and may fall outside the valid domain;
/// callers clamp it.
pub trait SampleSizeModel: Send + Sync {
    /// Raw prediction in [`SampleSizeModel::unit`].
    fn predict(&self, metrics: &TableMetrics) -> Result<f64>;

    /// Unit the model was trained on.
    fn unit(&self) -> SampleUnit;
}
