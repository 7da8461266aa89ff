//! Configuration structures
//!
//! Only the database connection keys are mandatory; every other section falls
//! back to defaults so a minimal file names just the server to connect to.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_APPLICATION_NAME, DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_DB_PORT,
    DEFAULT_MAX_SAMPLE_ROWS, DEFAULT_MIN_SAMPLE_ROWS, DEFAULT_MIN_TRAINING_EXAMPLES,
    DEFAULT_MODEL_PATH, DEFAULT_RIDGE_LAMBDA, DEFAULT_ROWS_PER_SQRT, DEFAULT_TARGET_Q_ERROR,
};
use crate::errors::{Result, StatSamplerError};
use crate::types::{RepresentativeQuery, SampleUnit};

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(alias = "db")]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub estimator: EstimatorConfig,
    #[serde(default)]
    pub learn: LearnConfig,
    #[serde(default)]
    pub apply: ApplyConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Configuration with defaults everywhere except the database section.
    pub fn with_database(database: DatabaseConfig) -> Self {
        Self {
            database,
            estimator: EstimatorConfig::default(),
            learn: LearnConfig::default(),
            apply: ApplyConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    /// Reject values that are individually well-formed but unusable together.
    pub fn validate(&self) -> Result<()> {
        if self.database.host.trim().is_empty() {
            return Err(StatSamplerError::Config("database.host must not be empty".into()));
        }
        if self.database.dbname.trim().is_empty() {
            return Err(StatSamplerError::Config("database.dbname must not be empty".into()));
        }
        if self.estimator.min_sample_rows > self.estimator.max_sample_rows {
            return Err(StatSamplerError::Config(format!(
                "estimator.min_sample_rows ({}) exceeds max_sample_rows ({})",
                self.estimator.min_sample_rows, self.estimator.max_sample_rows
            )));
        }
        if !(self.estimator.rows_per_sqrt.is_finite() && self.estimator.rows_per_sqrt > 0.0) {
            return Err(StatSamplerError::Config(
                "estimator.rows_per_sqrt must be a positive number".into(),
            ));
        }
        if self.learn.min_training_examples == 0 {
            return Err(StatSamplerError::Config(
                "learn.min_training_examples must be at least 1".into(),
            ));
        }
        if !(self.learn.target_q_error.is_finite() && self.learn.target_q_error >= 1.0) {
            return Err(StatSamplerError::Config("learn.target_q_error must be >= 1.0".into()));
        }
        if !(self.learn.ridge_lambda.is_finite() && self.learn.ridge_lambda > 0.0) {
            return Err(StatSamplerError::Config("learn.ridge_lambda must be positive".into()));
        }
        Ok(())
    }
}

/// Connection parameters for the database session.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub user: String,
    #[serde(default)]
    pub password: Option<String>,
    pub dbname: String,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default)]
    pub require_tls: bool,
    #[serde(default = "default_application_name")]
    pub application_name: String,
}

impl DatabaseConfig {
    pub fn new(
        host: impl Into<String>,
        port: u16,
        user: impl Into<String>,
        password: Option<String>,
        dbname: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            user: user.into(),
            password,
            dbname: dbname.into(),
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            require_tls: false,
            application_name: DEFAULT_APPLICATION_NAME.to_string(),
        }
    }
}

// Manual impl keeps the password out of logs.
impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("dbname", &self.dbname)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("require_tls", &self.require_tls)
            .field("application_name", &self.application_name)
            .finish()
    }
}

/// Bounds and scaling for the heuristic estimator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    pub unit: SampleUnit,
    pub min_sample_rows: u64,
    pub max_sample_rows: u64,
    /// Rows sampled per square root of the row estimate
    pub rows_per_sqrt: f64,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            unit: SampleUnit::Rows,
            min_sample_rows: DEFAULT_MIN_SAMPLE_ROWS,
            max_sample_rows: DEFAULT_MAX_SAMPLE_ROWS,
            rows_per_sqrt: DEFAULT_ROWS_PER_SQRT,
        }
    }
}

/// What a LEARN run does when one table fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Abort the whole run on the first table failure
    #[default]
    FailFast,
    /// Log and record the failed table, then continue with the next one
    SkipAndContinue,
}

impl std::str::FromStr for FailurePolicy {
    type Err = StatSamplerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "fail_fast" => Ok(Self::FailFast),
            "skip_and_continue" | "skip" => Ok(Self::SkipAndContinue),
            other => Err(StatSamplerError::Config(format!("unknown failure policy: {other}"))),
        }
    }
}

/// LEARN-mode settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LearnConfig {
    pub failure_policy: FailurePolicy,
    pub representative_query: RepresentativeQuery,
    pub min_training_examples: usize,
    /// Q-error at which the sample used is considered exactly right
    pub target_q_error: f64,
    pub ridge_lambda: f64,
    pub model_path: PathBuf,
}

impl Default for LearnConfig {
    fn default() -> Self {
        Self {
            failure_policy: FailurePolicy::FailFast,
            representative_query: RepresentativeQuery::default(),
            min_training_examples: DEFAULT_MIN_TRAINING_EXAMPLES,
            target_q_error: DEFAULT_TARGET_Q_ERROR,
            ridge_lambda: DEFAULT_RIDGE_LAMBDA,
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
        }
    }
}

/// APPLY-mode settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplyConfig {
    pub model_path: PathBuf,
}

impl Default for ApplyConfig {
    fn default() -> Self {
        Self { model_path: PathBuf::from(DEFAULT_MODEL_PATH) }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Logging sink settings, applied by the process entry point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: LogFormat::Pretty }
    }
}

fn default_port() -> u16 {
    DEFAULT_DB_PORT
}

fn default_connect_timeout() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_SECS
}

fn default_application_name() -> String {
    DEFAULT_APPLICATION_NAME.to_string()
}
