//! APPLY flow controller
//!
//! Single-shot: load the model, collect the table's metrics, predict and clamp
//! a sample size, and issue exactly one statistics refresh. Any failure aborts
//! the run; there is no partial success.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use statsampler_domain::{
    Result, SampleSize, SampleSizeDecision, SampleUnit, StatSamplerError, TableName,
};
use tracing::{info, instrument};

use crate::analyze::AnalyzeExecutor;
use crate::database_session_ports::{close_after, DatabaseSession};
use crate::estimation::ModelEstimator;
use crate::metrics::MetricsCollector;
use crate::training::ModelLoader;

/// Result of one APPLY run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplyOutcome {
    pub table: TableName,
    pub size: SampleSize,
    pub sample_rows: u64,
    pub raw_prediction: f64,
    /// Whether the raw prediction fell outside the valid range
    pub clamped: bool,
}

/// Sequential APPLY orchestrator over one session.
pub struct ApplyFlowController {
    session: Arc<dyn DatabaseSession>,
    loader: Arc<dyn ModelLoader>,
    metrics: Arc<dyn MetricsCollector>,
    executor: Arc<dyn AnalyzeExecutor>,
    expected_unit: Option<SampleUnit>,
}

impl ApplyFlowController {
    pub fn new(
        session: Arc<dyn DatabaseSession>,
        loader: Arc<dyn ModelLoader>,
        metrics: Arc<dyn MetricsCollector>,
        executor: Arc<dyn AnalyzeExecutor>,
    ) -> Self {
        Self { session, loader, metrics, executor, expected_unit: None }
    }

    /// Refuse models trained in a different unit than `unit`.
    pub fn with_expected_unit(mut self, unit: SampleUnit) -> Self {
        self.expected_unit = Some(unit);
        self
    }

    /// Apply the model at `model_location` to `table` and release the session.
    pub async fn run(self, table: &TableName, model_location: &Path) -> Result<ApplyOutcome> {
        let outcome = self.apply(table, model_location).await;
        close_after(self.session.as_ref(), outcome).await
    }

    /// Full-table refresh without consulting a model, then release the session.
    #[instrument(name = "apply_full_refresh", skip(self), fields(table = %table))]
    pub async fn run_full_refresh(self, table: &TableName) -> Result<()> {
        let outcome = self.executor.run_analyze(table, None).await;
        if outcome.is_ok() {
            info!("full statistics refresh applied");
        }
        close_after(self.session.as_ref(), outcome).await
    }

    #[instrument(
        name = "apply_run",
        skip(self, model_location),
        fields(table = %table, model = %model_location.display())
    )]
    async fn apply(&self, table: &TableName, model_location: &Path) -> Result<ApplyOutcome> {
        let model = self.loader.load(model_location).await?;
        if let Some(expected) = self.expected_unit {
            if model.unit() != expected {
                return Err(StatSamplerError::Config(format!(
                    "model at {} predicts in {} but sample unit is configured as {expected}",
                    model_location.display(),
                    model.unit()
                )));
            }
        }

        let metrics = self.metrics.collect(table).await?;
        let row_count = metrics.row_count()?;
        let prediction = ModelEstimator::new(model.clone()).predict_clamped(&metrics)?;

        let size = SampleSize { value: prediction.clamped, unit: model.unit() };
        let decision = SampleSizeDecision::new(table.clone(), size, row_count);
        self.executor.run_analyze(table, Some(&decision)).await?;

        info!(
            sample_rows = decision.rows,
            raw_prediction = prediction.raw,
            clamped = prediction.was_clamped(),
            "sampled statistics refresh applied"
        );

        Ok(ApplyOutcome {
            table: table.clone(),
            size,
            sample_rows: decision.rows,
            raw_prediction: prediction.raw,
            clamped: prediction.was_clamped(),
        })
    }
}
