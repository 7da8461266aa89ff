//! Port interfaces for representative-query plan capture

use async_trait::async_trait;
use statsampler_domain::{PlanOutcome, Result, TableName};

/// Trait for capturing one normalized plan per table
#[async_trait]
pub trait PlanLogger: Send + Sync {
    /// Execute the run's representative query against `table` and return the
    /// normalized outcome.
    async fn capture_plan(&self, table: &TableName) -> Result<PlanOutcome>;

    /// Query template shared by every table in the run.
    fn query_template(&self) -> &str;
}
