//! Fixture builders for tables, metrics, plans and models

use chrono::Utc;
use statsampler_domain::constants::MODEL_FORMAT_VERSION;
use statsampler_domain::{
    BufferUsage, Feature, FeatureSchema, PlanOutcome, RegressionModel, SampleUnit, TableMetrics,
    TableName,
};
use uuid::Uuid;

pub fn table(name: &str) -> TableName {
    TableName::parse(name).expect("valid table name")
}

/// Complete metrics for `name` with the heuristic's inputs set explicitly.
pub fn metrics(name: &str, rows: f64, distinct_ratio: f64, dead_ratio: f64) -> TableMetrics {
    Feature::ALL
        .iter()
        .fold(TableMetrics::builder(table(name)), |builder, feature| builder.set(*feature, 0.0))
        .set(Feature::RowEstimate, rows)
        .set(Feature::TotalBytes, rows * 128.0)
        .set(Feature::PageCount, (rows / 64.0).ceil())
        .set(Feature::ColumnCount, 6.0)
        .set(Feature::StatsCoverage, 1.0)
        .set(Feature::AvgDistinctRatio, distinct_ratio)
        .set(Feature::DeadTupleRatio, dead_ratio)
        .build()
}

pub fn plan(name: &str, query: &str) -> PlanOutcome {
    PlanOutcome {
        table: table(name),
        query: query.to_string(),
        root_node: "Limit".to_string(),
        estimated_rows: 100.0,
        actual_rows: 100.0,
        startup_cost: 0.0,
        total_cost: 2.5,
        planning_time_ms: 0.05,
        execution_time_ms: 0.4,
        buffers: BufferUsage { shared_hit_bytes: 8192, ..BufferUsage::default() },
        node_count: 2,
        max_q_error: 1.5,
    }
}

pub fn regression_model(tables: &[&str]) -> RegressionModel {
    let schema = FeatureSchema::current();
    let width = schema.features().len();
    RegressionModel {
        format_version: MODEL_FORMAT_VERSION,
        model_id: Uuid::new_v4(),
        trained_at: Utc::now(),
        feature_schema_version: schema.version(),
        feature_names: schema.names(),
        means: vec![0.0; width],
        scales: vec![1.0; width],
        weights: vec![0.0; width],
        intercept: 500f64.ln_1p(),
        unit: SampleUnit::Rows,
        example_count: tables.len(),
        trained_tables: tables.iter().map(ToString::to_string).collect(),
    }
}
