//! Domain types for the learn/apply estimation pipeline

pub mod metrics;
pub mod model;
pub mod plan;
pub mod sample;
pub mod table;
pub mod training;

pub use metrics::{Feature, FeatureSchema, TableMetrics, TableMetricsBuilder};
pub use model::RegressionModel;
pub use plan::{q_error, BufferUsage, PlanOutcome};
pub use sample::{SampleSize, SampleSizeDecision, SampleUnit};
pub use table::{RepresentativeQuery, TableName};
pub use training::{TrainingCorpus, TrainingExample};
