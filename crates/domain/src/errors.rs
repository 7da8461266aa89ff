//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for statsampler
///
/// Table-scoped variants carry the table they refer to so the invoking process
/// can always report which table caused a termination.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "details", rename_all = "snake_case")]
pub enum StatSamplerError {
    #[error("Table not found or not accessible: {table}")]
    TableNotFound { table: String },

    #[error("Metrics unavailable for {table}: {reason}")]
    MetricsUnavailable { table: String, reason: String },

    #[error("Sample size estimation failed for {table}: {reason}")]
    Estimation { table: String, reason: String },

    #[error("Execution failed{}: {reason}", table_suffix(.table))]
    Execution { table: Option<String>, reason: String },

    #[error("Insufficient training data: need at least {required} examples, have {available}")]
    InsufficientData { required: usize, available: usize },

    #[error("Model not found at {location}: {reason}")]
    ModelNotFound { location: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Run cancelled after {completed} tables")]
    Cancelled { completed: usize },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl StatSamplerError {
    /// Build an execution error that is not yet bound to a table.
    pub fn execution(reason: impl Into<String>) -> Self {
        Self::Execution { table: None, reason: reason.into() }
    }

    /// Attach a table to a session-level execution error.
    ///
    /// Errors that already name a table, and non-execution errors, are
    /// returned unchanged.
    #[must_use]
    pub fn with_table(self, table: &str) -> Self {
        match self {
            Self::Execution { table: None, reason } => {
                Self::Execution { table: Some(table.to_string()), reason }
            }
            other => other,
        }
    }

    /// The table this error refers to, if any.
    pub fn table(&self) -> Option<&str> {
        match self {
            Self::TableNotFound { table }
            | Self::MetricsUnavailable { table, .. }
            | Self::Estimation { table, .. } => Some(table),
            Self::Execution { table, .. } => table.as_deref(),
            _ => None,
        }
    }

    /// Stable label suitable for logs and exit reporting.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::TableNotFound { .. } => "table_not_found",
            Self::MetricsUnavailable { .. } => "metrics_unavailable",
            Self::Estimation { .. } => "estimation",
            Self::Execution { .. } => "execution",
            Self::InsufficientData { .. } => "insufficient_data",
            Self::ModelNotFound { .. } => "model_not_found",
            Self::Config(_) => "config",
            Self::Connection(_) => "connection",
            Self::Cancelled { .. } => "cancelled",
            Self::Internal(_) => "internal",
        }
    }

    /// Whether the error is confined to a single table.
    ///
    /// Only these errors may be skipped under the skip-and-continue policy;
    /// everything else aborts the run.
    pub fn is_table_scoped(&self) -> bool {
        matches!(
            self,
            Self::TableNotFound { .. }
                | Self::MetricsUnavailable { .. }
                | Self::Estimation { .. }
                | Self::Execution { table: Some(_), .. }
        )
    }
}

fn table_suffix(table: &Option<String>) -> String {
    table.as_deref().map(|t| format!(" on {t}")).unwrap_or_default()
}

/// Result type alias for statsampler operations
pub type Result<T> = std::result::Result<T, StatSamplerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_table_binds_unscoped_execution_errors() {
        let err = StatSamplerError::execution("permission denied").with_table("orders");
        assert_eq!(err.table(), Some("orders"));
        assert!(err.is_table_scoped());
        assert_eq!(err.to_string(), "Execution failed on orders: permission denied");
    }

    #[test]
    fn with_table_keeps_existing_binding() {
        let err = StatSamplerError::Execution {
            table: Some("orders".into()),
            reason: "boom".into(),
        }
        .with_table("customers");
        assert_eq!(err.table(), Some("orders"));
    }

    #[test]
    fn unscoped_errors_are_not_skippable() {
        assert!(!StatSamplerError::execution("connection reset").is_table_scoped());
        assert!(!StatSamplerError::Connection("refused".into()).is_table_scoped());
        assert!(!StatSamplerError::InsufficientData { required: 2, available: 0 }
            .is_table_scoped());
    }

    #[test]
    fn kinds_are_stable_labels() {
        assert_eq!(
            StatSamplerError::TableNotFound { table: "t".into() }.kind(),
            "table_not_found"
        );
        assert_eq!(
            StatSamplerError::ModelNotFound { location: "m".into(), reason: "r".into() }.kind(),
            "model_not_found"
        );
        assert_eq!(StatSamplerError::Cancelled { completed: 1 }.kind(), "cancelled");
    }

    #[test]
    fn errors_serialize_with_type_tag() {
        let err = StatSamplerError::Estimation { table: "orders".into(), reason: "x".into() };
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["type"], "estimation");
        assert_eq!(json["details"]["table"], "orders");
    }
}
