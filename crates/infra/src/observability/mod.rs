//! Tracing subscriber setup
//!
//! The process entry point calls [`init_tracing`] once; library code only
//! emits events through `tracing` macros.

use statsampler_domain::{LogFormat, LoggingConfig, Result as DomainResult, StatSamplerError};
use tracing_subscriber::EnvFilter;

/// Filter from `RUST_LOG` when set, else from the configured level.
pub fn env_filter(config: &LoggingConfig) -> DomainResult<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(config.level.to_lowercase()).map_err(|e| {
            StatSamplerError::Config(format!("invalid log level '{}': {e}", config.level))
        }),
    }
}

/// Install the global subscriber.
///
/// Logs go to stderr so command output on stdout stays machine-readable.
/// A subscriber installed earlier (by a test harness, for example) is left
/// in place.
pub fn init_tracing(config: &LoggingConfig) -> DomainResult<()> {
    let filter = env_filter(config)?;
    let builder =
        tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);

    let installed = match config.format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_per_crate_directives() {
        let config = LoggingConfig {
            level: "statsampler_core=debug,warn".to_string(),
            ..LoggingConfig::default()
        };
        assert!(env_filter(&config).is_ok());
    }

    #[test]
    fn init_is_idempotent() {
        let config = LoggingConfig::default();
        assert!(init_tracing(&config).is_ok());
        assert!(init_tracing(&config).is_ok());
    }
}
