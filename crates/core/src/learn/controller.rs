//! LEARN flow controller
//!
//! Drives one run over an ordered list of tables: collect metrics, estimate a
//! sample with the heuristic, refresh statistics with that sample, capture the
//! representative plan, and record the example. Once every table is handled
//! the corpus goes to the trainer. The database session is released exactly
//! once when the run ends, whatever the outcome.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use statsampler_domain::{
    FailurePolicy, Result, StatSamplerError, TableName, TrainingCorpus, TrainingExample,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use super::state::LearnState;
use crate::analyze::AnalyzeExecutor;
use crate::database_session_ports::{close_after, DatabaseSession};
use crate::estimation::SampleSizeEstimator;
use crate::metrics::MetricsCollector;
use crate::planning::PlanLogger;
use crate::training::ModelTrainer;

/// Collaborators one LEARN run is wired from.
pub struct LearnPipeline {
    pub metrics: Arc<dyn MetricsCollector>,
    pub estimator: Arc<dyn SampleSizeEstimator>,
    pub executor: Arc<dyn AnalyzeExecutor>,
    pub plan_logger: Arc<dyn PlanLogger>,
    pub trainer: Arc<dyn ModelTrainer>,
}

/// A table left out of the corpus under [`FailurePolicy::SkipAndContinue`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedTable {
    pub table: TableName,
    pub kind: String,
    pub message: String,
}

impl SkippedTable {
    fn new(table: &TableName, err: &StatSamplerError) -> Self {
        Self { table: table.clone(), kind: err.kind().to_string(), message: err.to_string() }
    }
}

/// Summary of a completed LEARN run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearnReport {
    pub run_id: Uuid,
    pub final_state: LearnState,
    /// Tables that contributed an example, in processing order
    pub processed: Vec<TableName>,
    pub skipped: Vec<SkippedTable>,
    pub model_location: String,
    pub example_count: usize,
}

/// Sequential LEARN orchestrator.
pub struct LearnFlowController {
    session: Arc<dyn DatabaseSession>,
    pipeline: LearnPipeline,
    failure_policy: FailurePolicy,
    cancellation: CancellationToken,
    state: LearnState,
}

impl LearnFlowController {
    /// Take ownership of an open session for the lifetime of one run.
    pub fn new(session: Arc<dyn DatabaseSession>, pipeline: LearnPipeline) -> Self {
        Self {
            session,
            pipeline,
            failure_policy: FailurePolicy::default(),
            cancellation: CancellationToken::new(),
            state: LearnState::Idle,
        }
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Cancellation is honored between tables; an in-flight ANALYZE always
    /// runs to completion.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Process `tables` in order, train, and release the session.
    pub async fn run(mut self, tables: &[TableName]) -> Result<LearnReport> {
        let run_id = Uuid::now_v7();
        let outcome = self.execute(run_id, tables).await;
        close_after(self.session.as_ref(), outcome).await
    }

    #[instrument(
        name = "learn_run",
        skip(self, tables),
        fields(run_id = %run_id, tables = tables.len(), policy = ?self.failure_policy)
    )]
    async fn execute(&mut self, run_id: Uuid, tables: &[TableName]) -> Result<LearnReport> {
        info!("learn run started");

        let mut corpus = TrainingCorpus::new();
        let mut processed = Vec::with_capacity(tables.len());
        let mut skipped = Vec::new();

        self.checkpoint(0)?;
        for (index, table) in tables.iter().enumerate() {
            self.transition(LearnState::ProcessingTable { index, table: table.clone() });

            match self.process_table(table).await {
                Ok(example) => {
                    corpus.push(example);
                    processed.push(table.clone());
                }
                Err(err)
                    if self.failure_policy == FailurePolicy::SkipAndContinue
                        && err.is_table_scoped() =>
                {
                    warn!(table = %table, kind = err.kind(), error = %err, "table skipped");
                    skipped.push(SkippedTable::new(table, &err));
                }
                Err(err) => {
                    error!(table = %table, kind = err.kind(), error = %err, "learn run aborted");
                    self.transition(LearnState::Failed { table: Some(table.clone()) });
                    return Err(err);
                }
            }

            self.checkpoint(index + 1)?;
        }

        self.transition(LearnState::Training);
        let example_count = corpus.len();
        let trained = match self.pipeline.trainer.train(corpus).await {
            Ok(trained) => trained,
            Err(err) => {
                error!(kind = err.kind(), error = %err, "training failed");
                self.transition(LearnState::Failed { table: None });
                return Err(err);
            }
        };

        self.transition(LearnState::Done);
        info!(
            examples = example_count,
            skipped = skipped.len(),
            model_location = %trained.location,
            "learn run finished"
        );

        Ok(LearnReport {
            run_id,
            final_state: self.state.clone(),
            processed,
            skipped,
            model_location: trained.location,
            example_count,
        })
    }

    async fn process_table(&self, table: &TableName) -> Result<TrainingExample> {
        let pipeline = &self.pipeline;

        let metrics = pipeline.metrics.collect(table).await?;
        if metrics.table() != table {
            return Err(StatSamplerError::Internal(format!(
                "metrics collected for {} while processing {table}",
                metrics.table()
            )));
        }

        let decision = pipeline.estimator.estimate(&metrics)?;
        debug!(
            table = %table,
            sample_rows = decision.rows,
            unit = %decision.size.unit,
            "sample size chosen"
        );

        pipeline.executor.run_analyze(table, Some(&decision)).await?;
        let plan = pipeline.plan_logger.capture_plan(table).await?;

        TrainingExample::new(metrics, decision, plan)
    }

    fn checkpoint(&mut self, completed: usize) -> Result<()> {
        if self.cancellation.is_cancelled() {
            warn!(completed, "learn run cancelled");
            self.transition(LearnState::Cancelled { completed });
            return Err(StatSamplerError::Cancelled { completed });
        }
        Ok(())
    }

    fn transition(&mut self, next: LearnState) {
        if !self.state.can_transition_to(&next) {
            warn!(from = %self.state, to = %next, "unexpected learn state transition");
        }
        debug!(from = %self.state, to = %next, "learn state");
        self.state = next;
    }
}
