//! Plan logger over the analyze executor's EXPLAIN path

use std::sync::Arc;

use async_trait::async_trait;
use statsampler_domain::{PlanOutcome, RepresentativeQuery, Result, StatSamplerError, TableName};
use tracing::{info, instrument};

use super::ports::PlanLogger;
use crate::analyze::AnalyzeExecutor;

/// Captures plans for one fixed query shape.
///
/// The template is bound at construction so every table in a run is measured
/// with the same query.
pub struct ExplainPlanLogger {
    executor: Arc<dyn AnalyzeExecutor>,
    query: RepresentativeQuery,
}

impl ExplainPlanLogger {
    pub fn new(executor: Arc<dyn AnalyzeExecutor>, query: RepresentativeQuery) -> Self {
        Self { executor, query }
    }
}

#[async_trait]
impl PlanLogger for ExplainPlanLogger {
    #[instrument(skip(self), fields(table = %table))]
    async fn capture_plan(&self, table: &TableName) -> Result<PlanOutcome> {
        let sql = self.query.render(table);
        let outcome = self.executor.run_and_capture_plan(table, &sql).await?;

        if &outcome.table != table {
            return Err(StatSamplerError::Internal(format!(
                "plan captured for {} while logging {table}",
                outcome.table
            )));
        }

        info!(
            root_node = %outcome.root_node,
            estimated_rows = outcome.estimated_rows,
            actual_rows = outcome.actual_rows,
            total_cost = outcome.total_cost,
            execution_time_ms = outcome.execution_time_ms,
            read_bytes = outcome.buffers.read_bytes(),
            q_error = outcome.max_q_error,
            "plan captured"
        );
        Ok(outcome)
    }

    fn query_template(&self) -> &str {
        self.query.template()
    }
}
