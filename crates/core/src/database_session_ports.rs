//! Database session port.
//!
//! The single collaborator through which core reaches the database: catalog
//! reads, EXPLAIN with execution instrumentation, and statistics refresh.
//! Connection parameters never reach core; adapters are built from
//! configuration by the process entry point and injected here.
//!
//! # Example
//!
//! ```no_run
//! use statsampler_core::DatabaseSession;
//!
//! async fn ping(session: &dyn DatabaseSession) -> statsampler_domain::Result<bool> {
//!     let rows = session.run_query("SELECT 1 AS one", &[]).await?;
//!     Ok(rows.first().and_then(|row| row.get_i64("one")) == Some(1))
//! }
//! ```

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use statsampler_domain::{Result, TableName};
use tracing::warn;

/// A single column value returned by [`DatabaseSession::run_query`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Json(serde_json::Value),
}

impl SqlValue {
    /// Numeric view of the value; integers widen to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SqlValue::Int(v) => Some(*v as f64),
            SqlValue::Float(v) => Some(*v),
            SqlValue::Text(v) => v.parse().ok(),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SqlValue::Int(v) => Some(*v),
            SqlValue::Float(v) if v.fract() == 0.0 => Some(*v as i64),
            SqlValue::Text(v) => v.parse().ok(),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }
}

/// One result row keyed by column name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryRow {
    columns: BTreeMap<String, SqlValue>,
}

impl QueryRow {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, column: impl Into<String>, value: SqlValue) -> Self {
        self.columns.insert(column.into(), value);
        self
    }

    pub fn insert(&mut self, column: impl Into<String>, value: SqlValue) {
        self.columns.insert(column.into(), value);
    }

    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.columns.get(column)
    }

    /// Numeric column; `None` when absent or SQL NULL.
    pub fn get_f64(&self, column: &str) -> Option<f64> {
        self.get(column).and_then(SqlValue::as_f64)
    }

    pub fn get_i64(&self, column: &str) -> Option<i64> {
        self.get(column).and_then(SqlValue::as_i64)
    }
}

/// Port for the database session collaborator.
///
/// Operations are issued sequentially by the flow controllers; adapters are
/// not required to support concurrent use from several workers.
#[async_trait]
pub trait DatabaseSession: Send + Sync {
    /// Run a read query with positional text parameters (`$1`, `$2`, ...).
    async fn run_query(&self, sql: &str, params: &[&str]) -> Result<Vec<QueryRow>>;

    /// Execute `sql` under EXPLAIN (ANALYZE, BUFFERS, FORMAT JSON) and return
    /// the machine-readable plan document.
    async fn run_explain_analyze(&self, sql: &str) -> Result<serde_json::Value>;

    /// Refresh statistics for `table`.
    ///
    /// With `sample_rows` the refresh scans roughly that many rows; without it
    /// the database default (full-table statistics target) applies. Mutates
    /// persisted statistics and cannot be undone except by another refresh.
    async fn run_statistics_refresh(&self, table: &TableName, sample_rows: Option<u64>)
        -> Result<()>;

    /// Release the session. Later calls fail with an execution error.
    async fn close(&self) -> Result<()>;
}

/// Close `session` and fold the close result into a run's `outcome`.
///
/// The run's own error wins; a close failure after a successful run is
/// surfaced rather than dropped.
pub async fn close_after<T>(session: &dyn DatabaseSession, outcome: Result<T>) -> Result<T> {
    let closed = session.close().await;
    match (outcome, closed) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(close_err)) => Err(close_err),
        (Err(err), Ok(())) => Err(err),
        (Err(err), Err(close_err)) => {
            warn!(error = %close_err, "session close failed after run error");
            Err(err)
        }
    }
}
