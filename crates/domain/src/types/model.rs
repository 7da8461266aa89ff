//! Persisted model artifact
//!
//! The artifact is the only entity whose lifetime crosses process runs: it is
//! written at the end of LEARN and read back at the start of APPLY.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::metrics::FeatureSchema;
use super::sample::SampleUnit;
use crate::constants::MODEL_FORMAT_VERSION;

/// Fitted ridge-regression sample-size model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionModel {
    pub format_version: u32,
    pub model_id: Uuid,
    pub trained_at: DateTime<Utc>,
    pub feature_schema_version: u32,
    pub feature_names: Vec<String>,
    /// Per-feature mean of the transformed training features
    pub means: Vec<f64>,
    /// Per-feature standard deviation (1.0 where the feature was constant)
    pub scales: Vec<f64>,
    pub weights: Vec<f64>,
    pub intercept: f64,
    pub unit: SampleUnit,
    pub example_count: usize,
    pub trained_tables: Vec<String>,
}

impl RegressionModel {
    /// Check the artifact is complete and consistent with `schema`.
    ///
    /// Returns a human-readable reason on failure; callers map it into their
    /// own error variant.
    pub fn validate(&self, schema: &FeatureSchema) -> std::result::Result<(), String> {
        if self.format_version != MODEL_FORMAT_VERSION {
            return Err(format!(
                "unsupported model format version {} (expected {MODEL_FORMAT_VERSION})",
                self.format_version
            ));
        }
        if self.feature_schema_version != schema.version() {
            return Err(format!(
                "feature schema version {} does not match expected {}",
                self.feature_schema_version,
                schema.version()
            ));
        }
        if self.feature_names != schema.names() {
            return Err(format!(
                "feature names {:?} do not match schema {:?}",
                self.feature_names,
                schema.names()
            ));
        }
        let n = self.feature_names.len();
        if self.means.len() != n || self.scales.len() != n || self.weights.len() != n {
            return Err(format!(
                "parameter lengths disagree: features={n}, means={}, scales={}, weights={}",
                self.means.len(),
                self.scales.len(),
                self.weights.len()
            ));
        }
        let all_finite = self
            .means
            .iter()
            .chain(&self.scales)
            .chain(&self.weights)
            .chain(std::iter::once(&self.intercept))
            .all(|v| v.is_finite());
        if !all_finite {
            return Err("model parameters contain non-finite values".to_string());
        }
        if self.scales.iter().any(|s| *s <= 0.0) {
            return Err("model scales must be positive".to_string());
        }
        Ok(())
    }
}
