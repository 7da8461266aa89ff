//! Analyze executor backed by a database session

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use statsampler_domain::{PlanOutcome, Result, SampleSizeDecision, StatSamplerError, TableName};
use tracing::{info, instrument};

use super::explain::parse_explain;
use super::ports::AnalyzeExecutor;
use crate::database_session_ports::DatabaseSession;

/// Issues statistics refreshes and EXPLAIN requests through the session.
pub struct SessionAnalyzeExecutor {
    session: Arc<dyn DatabaseSession>,
}

impl SessionAnalyzeExecutor {
    pub fn new(session: Arc<dyn DatabaseSession>) -> Self {
        Self { session }
    }
}

#[async_trait]
impl AnalyzeExecutor for SessionAnalyzeExecutor {
    #[instrument(skip(self, sample), fields(table = %table, sample_rows = sample.map(|s| s.rows)))]
    async fn run_analyze(
        &self,
        table: &TableName,
        sample: Option<&SampleSizeDecision>,
    ) -> Result<()> {
        if let Some(decision) = sample {
            if &decision.table != table {
                return Err(StatSamplerError::Internal(format!(
                    "sample size decided for {} applied to {table}",
                    decision.table
                )));
            }
        }

        let started = Instant::now();
        self.session
            .run_statistics_refresh(table, sample.map(|decision| decision.rows))
            .await
            .map_err(|err| err.with_table(&table.to_string()))?;

        info!(duration_ms = started.elapsed().as_millis() as u64, "statistics refreshed");
        Ok(())
    }

    #[instrument(skip(self, query), fields(table = %table))]
    async fn run_and_capture_plan(&self, table: &TableName, query: &str) -> Result<PlanOutcome> {
        let document = self
            .session
            .run_explain_analyze(query)
            .await
            .map_err(|err| err.with_table(&table.to_string()))?;
        parse_explain(table, query, &document)
    }
}
