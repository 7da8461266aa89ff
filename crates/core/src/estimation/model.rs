//! Model-backed estimator used by APPLY

use std::sync::Arc;

use statsampler_domain::{
    Result, SampleSize, SampleSizeDecision, SampleUnit, StatSamplerError, TableMetrics,
};
use tracing::warn;

use super::ports::{SampleSizeEstimator, SampleSizeModel};

/// Estimator that delegates to a loaded model and clamps its output.
pub struct ModelEstimator {
    model: Arc<dyn SampleSizeModel>,
}

/// Prediction before and after clamping, kept for reporting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClampedPrediction {
    pub raw: f64,
    pub clamped: f64,
}

impl ClampedPrediction {
    pub fn was_clamped(&self) -> bool {
        self.raw != self.clamped
    }
}

impl ModelEstimator {
    pub fn new(model: Arc<dyn SampleSizeModel>) -> Self {
        Self { model }
    }

    /// Predict and clamp into `[0, upper]`, where `upper` is the table's row
    /// count for row units and 1 for fractions.
    ///
    /// Infinite predictions clamp to the nearest bound; NaN carries no
    /// direction and is rejected.
    pub fn predict_clamped(&self, metrics: &TableMetrics) -> Result<ClampedPrediction> {
        let rows = metrics.row_count()?;
        let raw = self.model.predict(metrics)?;
        if raw.is_nan() {
            return Err(StatSamplerError::Estimation {
                table: metrics.table().to_string(),
                reason: "model prediction is NaN".to_string(),
            });
        }

        let upper = self.model.unit().upper_bound(rows);
        let clamped = raw.clamp(0.0, upper);
        let prediction = ClampedPrediction { raw, clamped };
        if prediction.was_clamped() {
            warn!(
                table = %metrics.table(),
                raw,
                clamped,
                upper,
                "model prediction outside valid sample range, clamped"
            );
        }
        Ok(prediction)
    }
}

impl SampleSizeEstimator for ModelEstimator {
    fn estimate(&self, metrics: &TableMetrics) -> Result<SampleSizeDecision> {
        let rows = metrics.row_count()?;
        let prediction = self.predict_clamped(metrics)?;
        let size = SampleSize { value: prediction.clamped, unit: self.model.unit() };
        Ok(SampleSizeDecision::new(metrics.table().clone(), size, rows))
    }

    fn unit(&self) -> SampleUnit {
        self.model.unit()
    }
}
