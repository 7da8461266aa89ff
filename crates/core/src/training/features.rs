//! Feature transform shared by training and prediction

use statsampler_domain::{
    FeatureSchema, RegressionModel, Result, SampleUnit, StatSamplerError, TableMetrics,
};

use crate::estimation::SampleSizeModel;

/// `sign(v) * ln(1 + |v|)`; compresses byte and row counts spanning many
/// orders of magnitude while keeping ratios near zero almost linear.
pub fn signed_log(value: f64) -> f64 {
    value.signum() * value.abs().ln_1p()
}

/// Transformed feature vector for `metrics` in schema order.
pub fn transform(schema: &FeatureSchema, metrics: &TableMetrics) -> Result<Vec<f64>> {
    Ok(schema.vector(metrics)?.into_iter().map(signed_log).collect())
}

impl SampleSizeModel for RegressionModel {
    fn predict(&self, metrics: &TableMetrics) -> Result<f64> {
        let schema = FeatureSchema::current();
        if let Err(reason) = self.validate(&schema) {
            return Err(StatSamplerError::Estimation {
                table: metrics.table().to_string(),
                reason: format!("model incompatible with current features: {reason}"),
            });
        }

        let row = transform(&schema, metrics)?;
        let log_prediction = row
            .iter()
            .zip(&self.means)
            .zip(&self.scales)
            .zip(&self.weights)
            .map(|(((x, mean), scale), weight)| (x - mean) / scale * weight)
            .sum::<f64>()
            + self.intercept;

        Ok(log_prediction.exp_m1())
    }

    fn unit(&self) -> SampleUnit {
        self.unit
    }
}
