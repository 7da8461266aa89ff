//! Port interfaces for statistics refresh and plan capture

use async_trait::async_trait;
use statsampler_domain::{PlanOutcome, Result, SampleSizeDecision, TableName};

/// Trait for issuing ANALYZE and instrumented query executions
#[async_trait]
pub trait AnalyzeExecutor: Send + Sync {
    /// Refresh statistics for `table`, scoped to `sample` when given and
    /// full-table otherwise.
    ///
    /// Database-level failures surface as `Execution` errors bound to the
    /// table; they are never swallowed.
    async fn run_analyze(&self, table: &TableName, sample: Option<&SampleSizeDecision>)
        -> Result<()>;

    /// Execute `query` under EXPLAIN (ANALYZE, BUFFERS, FORMAT JSON) and parse
    /// the result.
    async fn run_and_capture_plan(&self, table: &TableName, query: &str) -> Result<PlanOutcome>;
}
