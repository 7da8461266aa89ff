//! # statsampler Core
//!
//! Pure business logic layer - no database, file or platform code.
//!
//! This crate contains:
//! - Port/adapter interfaces (traits) for every collaborator
//! - Metrics collection over the catalog, sample-size estimation and plan
//!   normalization
//! - Ridge-regression training
//! - The LEARN and APPLY flow controllers
//!
//! ## Architecture Principles
//! - Only depends on `statsampler-domain`
//! - All external dependencies via traits
//! - Collaborators are injected; nothing is fetched from globals

pub mod analyze;
pub mod apply;
pub mod estimation;
pub mod learn;
pub mod metrics;
pub mod planning;
pub mod training;

// Infrastructure ports
pub mod database_session_ports;

// Re-export specific items to avoid ambiguity
pub use analyze::{AnalyzeExecutor, SessionAnalyzeExecutor};
pub use apply::{ApplyFlowController, ApplyOutcome};
pub use database_session_ports::{close_after, DatabaseSession, QueryRow, SqlValue};
pub use estimation::{
    ClampedPrediction, HeuristicEstimator, ModelEstimator, SampleSizeEstimator, SampleSizeModel,
};
pub use learn::{LearnFlowController, LearnPipeline, LearnReport, LearnState, SkippedTable};
pub use metrics::{CatalogMetricsCollector, MetricsCollector};
pub use planning::{ExplainPlanLogger, PlanLogger};
pub use training::{
    ModelLoader, ModelSink, ModelTrainer, RegressionTrainer, TrainedModel,
};
