//! Port interfaces for table metrics collection

use async_trait::async_trait;
use statsampler_domain::{Result, TableMetrics, TableName};

/// Trait for producing a feature snapshot of one table
#[async_trait]
pub trait MetricsCollector: Send + Sync {
    /// Collect the current metrics for `table`.
    ///
    /// Read-only. Fails with `TableNotFound` when the table does not exist or
    /// is not visible, and `MetricsUnavailable` when required statistics
    /// cannot be read.
    async fn collect(&self, table: &TableName) -> Result<TableMetrics>;
}
