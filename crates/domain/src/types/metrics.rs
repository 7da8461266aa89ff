//! Table metrics and the versioned feature schema
//!
//! Metrics are a named mapping rather than a positional vector so that schema
//! drift between LEARN and APPLY is caught when features are validated, not
//! silently at prediction time.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::table::TableName;
use crate::constants::FEATURE_SCHEMA_VERSION;
use crate::errors::{Result, StatSamplerError};

/// Every feature the collector produces for schema version 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    /// Planner row estimate (`reltuples`, falling back to live tuples)
    RowEstimate,
    /// Total relation size including indexes and TOAST
    TotalBytes,
    /// Heap pages (`relpages`)
    PageCount,
    /// Number of user columns
    ColumnCount,
    /// Fraction of columns that already have `pg_stats` entries
    StatsCoverage,
    /// Mean null fraction across analysed columns
    AvgNullFrac,
    /// Mean distinct-values ratio across analysed columns, in [0, 1]
    AvgDistinctRatio,
    /// Mean absolute physical/logical order correlation
    AvgAbsCorrelation,
    /// Dead tuples relative to live tuples
    DeadTupleRatio,
    /// Rows modified since the last analyze relative to the row estimate
    ModSinceAnalyzeRatio,
}

impl Feature {
    /// All features, in schema order.
    pub const ALL: [Feature; 10] = [
        Feature::RowEstimate,
        Feature::TotalBytes,
        Feature::PageCount,
        Feature::ColumnCount,
        Feature::StatsCoverage,
        Feature::AvgNullFrac,
        Feature::AvgDistinctRatio,
        Feature::AvgAbsCorrelation,
        Feature::DeadTupleRatio,
        Feature::ModSinceAnalyzeRatio,
    ];

    /// Stable feature name used in metrics maps and model artifacts.
    pub fn as_str(self) -> &'static str {
        match self {
            Feature::RowEstimate => "row_estimate",
            Feature::TotalBytes => "total_bytes",
            Feature::PageCount => "page_count",
            Feature::ColumnCount => "column_count",
            Feature::StatsCoverage => "stats_coverage",
            Feature::AvgNullFrac => "avg_null_frac",
            Feature::AvgDistinctRatio => "avg_distinct_ratio",
            Feature::AvgAbsCorrelation => "avg_abs_correlation",
            Feature::DeadTupleRatio => "dead_tuple_ratio",
            Feature::ModSinceAnalyzeRatio => "mod_since_analyze_ratio",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The fixed feature set shared by training and prediction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSchema {
    version: u32,
    features: Vec<Feature>,
}

impl FeatureSchema {
    /// The schema the current collector produces.
    pub fn current() -> Self {
        Self { version: FEATURE_SCHEMA_VERSION, features: Feature::ALL.to_vec() }
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    /// Feature names in schema order.
    pub fn names(&self) -> Vec<String> {
        self.features.iter().map(|f| f.as_str().to_string()).collect()
    }

    /// Check that `metrics` was produced under this schema and carries every
    /// feature with a finite value.
    pub fn validate(&self, metrics: &TableMetrics) -> Result<()> {
        if metrics.schema_version() != self.version {
            return Err(StatSamplerError::Estimation {
                table: metrics.table().to_string(),
                reason: format!(
                    "feature schema version {} does not match expected {}",
                    metrics.schema_version(),
                    self.version
                ),
            });
        }
        for feature in &self.features {
            metrics.require(*feature)?;
        }
        Ok(())
    }

    /// Extract the feature vector in schema order.
    pub fn vector(&self, metrics: &TableMetrics) -> Result<Vec<f64>> {
        self.validate(metrics)?;
        self.features.iter().map(|feature| metrics.require(*feature)).collect()
    }
}

impl Default for FeatureSchema {
    fn default() -> Self {
        Self::current()
    }
}

/// Snapshot of a table's statistical and physical state.
///
/// Created fresh per table per run and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableMetrics {
    table: TableName,
    schema_version: u32,
    features: BTreeMap<String, f64>,
}

impl TableMetrics {
    /// Build metrics for `table` under the current schema version.
    ///
    /// Completeness is not checked here; estimators validate the feature set
    /// against the schema they need.
    pub fn new(table: TableName, features: BTreeMap<String, f64>) -> Self {
        Self { table, schema_version: FEATURE_SCHEMA_VERSION, features }
    }

    /// Start a typed builder for `table`.
    pub fn builder(table: TableName) -> TableMetricsBuilder {
        TableMetricsBuilder { table, features: BTreeMap::new() }
    }

    pub fn table(&self) -> &TableName {
        &self.table
    }

    pub fn schema_version(&self) -> u32 {
        self.schema_version
    }

    /// Raw named mapping.
    pub fn features(&self) -> &BTreeMap<String, f64> {
        &self.features
    }

    pub fn get(&self, feature: Feature) -> Option<f64> {
        self.features.get(feature.as_str()).copied()
    }

    /// Read a feature, failing with an estimation error when it is missing or
    /// not finite.
    pub fn require(&self, feature: Feature) -> Result<f64> {
        match self.get(feature) {
            Some(value) if value.is_finite() => Ok(value),
            Some(value) => Err(StatSamplerError::Estimation {
                table: self.table.to_string(),
                reason: format!("feature {feature} is not finite ({value})"),
            }),
            None => Err(StatSamplerError::Estimation {
                table: self.table.to_string(),
                reason: format!("missing required feature {feature}"),
            }),
        }
    }

    /// Row estimate clamped to a non-negative count.
    pub fn row_count(&self) -> Result<f64> {
        self.require(Feature::RowEstimate).map(|rows| rows.max(0.0))
    }
}

/// Typed builder that keys features by [`Feature`].
#[derive(Debug)]
pub struct TableMetricsBuilder {
    table: TableName,
    features: BTreeMap<String, f64>,
}

impl TableMetricsBuilder {
    #[must_use]
    pub fn set(mut self, feature: Feature, value: f64) -> Self {
        self.features.insert(feature.as_str().to_string(), value);
        self
    }

    pub fn build(self) -> TableMetrics {
        TableMetrics::new(self.table, self.features)
    }
}
