//! Application constants
//!
//! Centralized location for all domain-level constants used throughout the
//! application.

// Feature schema
pub const FEATURE_SCHEMA_VERSION: u32 = 1;

// Model artifact
pub const MODEL_FORMAT_VERSION: u32 = 1;
pub const DEFAULT_MODEL_PATH: &str = "models/sample_size_model.json";

// Representative query
pub const TABLE_PLACEHOLDER: &str = "{table}";
pub const DEFAULT_REPRESENTATIVE_QUERY: &str = "SELECT * FROM {table} LIMIT 100";

// Heuristic estimator defaults
pub const DEFAULT_MIN_SAMPLE_ROWS: u64 = 300;
pub const DEFAULT_MAX_SAMPLE_ROWS: u64 = 3_000_000;
pub const DEFAULT_ROWS_PER_SQRT: f64 = 30.0;

// Training defaults
pub const DEFAULT_MIN_TRAINING_EXAMPLES: usize = 2;
pub const DEFAULT_TARGET_Q_ERROR: f64 = 2.0;
pub const DEFAULT_RIDGE_LAMBDA: f64 = 1.0;
pub const TARGET_ADJUSTMENT_MIN: f64 = 0.5;
pub const TARGET_ADJUSTMENT_MAX: f64 = 2.0;

// PostgreSQL specifics
pub const ROWS_PER_STATISTICS_TARGET: u64 = 300;
pub const MAX_STATISTICS_TARGET: u64 = 10_000;
pub const BLOCK_SIZE_BYTES: u64 = 8192;
pub const DEFAULT_DB_PORT: u16 = 5432;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_APPLICATION_NAME: &str = "statsampler";
