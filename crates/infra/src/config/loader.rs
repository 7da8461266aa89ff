//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If incomplete, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! Whatever the source, the result is validated before it is returned.
//!
//! ## Environment Variables
//! - `STATSAMPLER_DB_HOST`: Database server host (required)
//! - `STATSAMPLER_DB_PORT`: Database server port (default 5432)
//! - `STATSAMPLER_DB_USER`: Role to connect as (required)
//! - `STATSAMPLER_DB_PASSWORD`: Password, if the server asks for one
//! - `STATSAMPLER_DB_NAME`: Database name (required)
//! - `STATSAMPLER_DB_REQUIRE_TLS`: Whether to connect over TLS (true/false)
//! - `STATSAMPLER_MODEL_PATH`: Model artifact written by LEARN and read by APPLY
//! - `STATSAMPLER_LOG_LEVEL`: Log level or `EnvFilter` directive
//! - `STATSAMPLER_FAILURE_POLICY`: `fail_fast` or `skip_and_continue`
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./statsampler.toml` or `./statsampler.json` (current working directory)
//! 2. `./config.toml` or `./config.json` (current working directory)
//! 3. The same names in the parent and grandparent directories
//! 4. Relative to executable location

use std::path::{Path, PathBuf};

use statsampler_domain::{Config, DatabaseConfig, FailurePolicy, Result, StatSamplerError};

const CONFIG_FILE_NAMES: [&str; 4] =
    ["statsampler.toml", "statsampler.json", "config.toml", "config.json"];

const REQUIRED_ENV_VARS: [&str; 3] =
    ["STATSAMPLER_DB_HOST", "STATSAMPLER_DB_USER", "STATSAMPLER_DB_NAME"];

/// Load configuration with automatic fallback strategy
///
/// Uses environment variables when all required ones are set. Only when a
/// required variable is absent does it fall back to a config file; invalid
/// values in a complete environment are reported, not skipped.
///
/// # Errors
/// Returns `StatSamplerError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - Required fields are missing or values are inconsistent
pub fn load() -> Result<Config> {
    if let Some(missing) = missing_required_env() {
        tracing::debug!(missing, "Environment configuration incomplete, trying file");
        return load_from_file(None);
    }

    let config = load_from_env()?;
    tracing::info!("Configuration loaded from environment variables");
    Ok(config)
}

/// First required environment variable that is not set, if any.
fn missing_required_env() -> Option<&'static str> {
    REQUIRED_ENV_VARS.into_iter().find(|key| std::env::var_os(key).is_none())
}

/// Load configuration from environment variables
///
/// Host, user and database name must be present; every other setting falls
/// back to its default.
///
/// # Errors
/// Returns `StatSamplerError::Config` if required variables are missing
/// or have invalid values.
pub fn load_from_env() -> Result<Config> {
    let host = env_var("STATSAMPLER_DB_HOST")?;
    let user = env_var("STATSAMPLER_DB_USER")?;
    let dbname = env_var("STATSAMPLER_DB_NAME")?;
    let port = match std::env::var("STATSAMPLER_DB_PORT") {
        Ok(raw) => raw
            .parse::<u16>()
            .map_err(|e| StatSamplerError::Config(format!("Invalid database port: {}", e)))?,
        Err(_) => statsampler_domain::constants::DEFAULT_DB_PORT,
    };
    let password = std::env::var("STATSAMPLER_DB_PASSWORD").ok();

    let mut database = DatabaseConfig::new(host, port, user, password, dbname);
    database.require_tls = env_bool("STATSAMPLER_DB_REQUIRE_TLS", false);

    let mut config = Config::with_database(database);

    if let Ok(path) = std::env::var("STATSAMPLER_MODEL_PATH") {
        config.learn.model_path = PathBuf::from(&path);
        config.apply.model_path = PathBuf::from(path);
    }
    if let Ok(level) = std::env::var("STATSAMPLER_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Ok(policy) = std::env::var("STATSAMPLER_FAILURE_POLICY") {
        config.learn.failure_policy = policy.parse::<FailurePolicy>()?;
    }

    config.validate()?;
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Arguments
/// * `path` - Optional path to config file. If `None`, uses
///   [`probe_config_paths`].
///
/// # Errors
/// Returns `StatSamplerError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
/// - Required fields are missing or values are inconsistent
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(StatSamplerError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            StatSamplerError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| StatSamplerError::Config(format!("Failed to read config file: {}", e)))?;

    let config = parse_config(&contents, &config_path)?;
    config.validate()?;
    Ok(config)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
///
/// # Errors
/// Returns `StatSamplerError::Config` if format is invalid or parsing fails.
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| StatSamplerError::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| StatSamplerError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(StatSamplerError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// Probe multiple paths for configuration files
///
/// Searches the current working directory, its parent and grandparent, then
/// the executable's directory and its parent, for `statsampler.{toml,json}`
/// and `config.{toml,json}`.
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut roots = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        roots.extend([cwd.clone(), cwd.join(".."), cwd.join("../..")]);
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            roots.extend([exe_dir.to_path_buf(), exe_dir.join("..")]);
        }
    }

    roots
        .iter()
        .flat_map(|root| CONFIG_FILE_NAMES.iter().map(move |name| root.join(name)))
        .find(|path| path.exists())
}

/// Get required environment variable
///
/// # Errors
/// Returns `StatSamplerError::Config` if the variable is not set.
fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| {
        StatSamplerError::Config(format!("Missing required environment variable: {}", key))
    })
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Mutex;

    use once_cell::sync::Lazy;
    use statsampler_domain::{LogFormat, SampleUnit};
    use tempfile::NamedTempFile;

    use super::*;

    static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    const ENV_KEYS: [&str; 9] = [
        "STATSAMPLER_DB_HOST",
        "STATSAMPLER_DB_PORT",
        "STATSAMPLER_DB_USER",
        "STATSAMPLER_DB_PASSWORD",
        "STATSAMPLER_DB_NAME",
        "STATSAMPLER_DB_REQUIRE_TLS",
        "STATSAMPLER_MODEL_PATH",
        "STATSAMPLER_LOG_LEVEL",
        "STATSAMPLER_FAILURE_POLICY",
    ];

    fn clear_env() {
        for key in ENV_KEYS {
            std::env::remove_var(key);
        }
    }

    fn write_config(contents: &str, extension: &str) -> PathBuf {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(contents.as_bytes()).unwrap();
        let path = temp_file.path().with_extension(extension);
        std::fs::copy(temp_file.path(), &path).unwrap();
        path
    }

    #[test]
    fn test_env_bool_parsing() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");

        std::env::set_var("TEST_SS_BOOL_TRUE", "1");
        std::env::set_var("TEST_SS_BOOL_UPPER", "TRUE");
        std::env::set_var("TEST_SS_BOOL_OFF", "off");

        assert!(env_bool("TEST_SS_BOOL_TRUE", false));
        assert!(env_bool("TEST_SS_BOOL_UPPER", false));
        assert!(!env_bool("TEST_SS_BOOL_OFF", true));

        std::env::remove_var("TEST_SS_BOOL_MISSING");
        assert!(env_bool("TEST_SS_BOOL_MISSING", true));
        assert!(!env_bool("TEST_SS_BOOL_MISSING", false));

        std::env::remove_var("TEST_SS_BOOL_TRUE");
        std::env::remove_var("TEST_SS_BOOL_UPPER");
        std::env::remove_var("TEST_SS_BOOL_OFF");
    }

    #[test]
    fn test_load_from_env_all_vars_set() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        std::env::set_var("STATSAMPLER_DB_HOST", "db.internal");
        std::env::set_var("STATSAMPLER_DB_PORT", "6432");
        std::env::set_var("STATSAMPLER_DB_USER", "analyst");
        std::env::set_var("STATSAMPLER_DB_PASSWORD", "hunter2");
        std::env::set_var("STATSAMPLER_DB_NAME", "warehouse");
        std::env::set_var("STATSAMPLER_DB_REQUIRE_TLS", "yes");
        std::env::set_var("STATSAMPLER_MODEL_PATH", "/var/lib/statsampler/model.json");
        std::env::set_var("STATSAMPLER_LOG_LEVEL", "debug");
        std::env::set_var("STATSAMPLER_FAILURE_POLICY", "skip-and-continue");

        let result = load_from_env();
        assert!(result.is_ok(), "Should load config from env vars, error: {:?}", result.err());

        let config = result.unwrap();
        assert_eq!(config.database.host, "db.internal");
        assert_eq!(config.database.port, 6432);
        assert_eq!(config.database.user, "analyst");
        assert_eq!(config.database.password, Some("hunter2".to_string()));
        assert_eq!(config.database.dbname, "warehouse");
        assert!(config.database.require_tls);
        assert_eq!(config.learn.model_path, PathBuf::from("/var/lib/statsampler/model.json"));
        assert_eq!(config.apply.model_path, config.learn.model_path);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.learn.failure_policy, FailurePolicy::SkipAndContinue);

        clear_env();
    }

    #[test]
    fn test_load_from_env_defaults_optional_vars() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        std::env::set_var("STATSAMPLER_DB_HOST", "localhost");
        std::env::set_var("STATSAMPLER_DB_USER", "postgres");
        std::env::set_var("STATSAMPLER_DB_NAME", "postgres");

        let config = load_from_env().unwrap();
        assert_eq!(config.database.port, 5432);
        assert_eq!(config.database.password, None);
        assert!(!config.database.require_tls);
        assert_eq!(config.learn.failure_policy, FailurePolicy::FailFast);

        clear_env();
    }

    #[test]
    fn test_load_from_env_missing_var() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        std::env::set_var("STATSAMPLER_DB_HOST", "localhost");

        let result = load_from_env();
        assert!(matches!(result, Err(StatSamplerError::Config(_))), "Should be a Config error");

        clear_env();
    }

    #[test]
    fn test_load_from_env_invalid_values() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        std::env::set_var("STATSAMPLER_DB_HOST", "localhost");
        std::env::set_var("STATSAMPLER_DB_USER", "postgres");
        std::env::set_var("STATSAMPLER_DB_NAME", "postgres");
        std::env::set_var("STATSAMPLER_DB_PORT", "not-a-port");
        assert!(matches!(load_from_env(), Err(StatSamplerError::Config(_))));

        std::env::remove_var("STATSAMPLER_DB_PORT");
        std::env::set_var("STATSAMPLER_FAILURE_POLICY", "retry-forever");
        assert!(matches!(load_from_env(), Err(StatSamplerError::Config(_))));

        clear_env();
    }

    #[test]
    fn test_load_reports_bad_values_in_complete_environment() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        std::env::set_var("STATSAMPLER_DB_HOST", "localhost");
        std::env::set_var("STATSAMPLER_DB_USER", "postgres");
        std::env::set_var("STATSAMPLER_DB_NAME", "postgres");
        std::env::set_var("STATSAMPLER_FAILURE_POLICY", "skip_and_contineu");

        let result = load();
        assert!(
            matches!(result, Err(StatSamplerError::Config(ref msg)) if msg.contains("skip_and_contineu")),
            "bad policy should be reported, got {result:?}"
        );

        std::env::remove_var("STATSAMPLER_FAILURE_POLICY");
        std::env::set_var("STATSAMPLER_DB_PORT", "99999");
        let result = load();
        assert!(
            matches!(result, Err(StatSamplerError::Config(ref msg)) if msg.contains("port")),
            "bad port should be reported, got {result:?}"
        );

        clear_env();
    }

    #[test]
    fn test_missing_required_env_names_first_absent_variable() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        assert_eq!(missing_required_env(), Some("STATSAMPLER_DB_HOST"));
        std::env::set_var("STATSAMPLER_DB_HOST", "localhost");
        std::env::set_var("STATSAMPLER_DB_USER", "postgres");
        assert_eq!(missing_required_env(), Some("STATSAMPLER_DB_NAME"));
        std::env::set_var("STATSAMPLER_DB_NAME", "postgres");
        assert_eq!(missing_required_env(), None);

        clear_env();
    }

    #[test]
    fn test_load_from_file_json() {
        let path = write_config(
            r#"{
                "database": {
                    "host": "localhost",
                    "user": "postgres",
                    "password": "secret",
                    "dbname": "shop"
                },
                "estimator": { "unit": "fraction", "max_sample_rows": 100000 },
                "learn": { "min_training_examples": 5 }
            }"#,
            "json",
        );

        let config = load_from_file(Some(path.clone())).unwrap();
        assert_eq!(config.database.dbname, "shop");
        assert_eq!(config.database.port, 5432);
        assert_eq!(config.estimator.unit, SampleUnit::Fraction);
        assert_eq!(config.estimator.max_sample_rows, 100_000);
        assert_eq!(config.learn.min_training_examples, 5);

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_load_from_file_toml_with_db_alias() {
        let path = write_config(
            r#"
[db]
host = "replica"
port = 5433
user = "stats"
dbname = "shop"
require_tls = true

[learn]
failure_policy = "skip_and_continue"
representative_query = "SELECT count(*) FROM {table}"

[logging]
level = "warn"
format = "json"
"#,
            "toml",
        );

        let config = load_from_file(Some(path.clone())).unwrap();
        assert_eq!(config.database.host, "replica");
        assert!(config.database.require_tls);
        assert_eq!(config.learn.failure_policy, FailurePolicy::SkipAndContinue);
        assert_eq!(config.learn.representative_query.template(), "SELECT count(*) FROM {table}");
        assert_eq!(config.logging.format, LogFormat::Json);

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_load_from_file_rejects_inconsistent_values() {
        let path = write_config(
            r#"
[database]
host = "localhost"
user = "postgres"
dbname = "shop"

[estimator]
min_sample_rows = 5000
max_sample_rows = 10
"#,
            "toml",
        );

        let result = load_from_file(Some(path.clone()));
        assert!(matches!(result, Err(StatSamplerError::Config(_))));

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_load_from_file_not_found() {
        let result = load_from_file(Some(PathBuf::from("/nonexistent/statsampler.toml")));
        assert!(matches!(result, Err(StatSamplerError::Config(_))), "Should be a Config error");
    }

    #[test]
    fn test_load_from_file_invalid_json() {
        let path = write_config(r#"{ "this is": "not valid json" "#, "json");

        let result = load_from_file(Some(path.clone()));
        assert!(result.is_err(), "Should fail with invalid JSON");

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_parse_config_missing_database_section() {
        let result = parse_config("[learn]\nmin_training_examples = 3\n", Path::new("x.toml"));
        assert!(result.is_err(), "Database section is mandatory");
    }

    #[test]
    fn test_parse_config_unsupported_format() {
        let result = parse_config("some content", Path::new("test.yaml"));
        assert!(result.is_err(), "Should fail with unsupported format");
    }
}
