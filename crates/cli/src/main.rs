//! statsampler - learned sample sizes for PostgreSQL statistics refresh
//!
//! Run with: `statsampler learn <table>...` or `statsampler apply <table>`
//!
//! The final report goes to stdout and failures to stderr via `println!` and
//! `eprintln!`; everything else is structured logging.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::env;
use std::process::ExitCode;

use anyhow::Context;
use statsampler_domain::{Config, StatSamplerError};
use statsampler_infra::{config, init_tracing};

mod args;
mod commands;

use args::Command;

/// Exit status for runs stopped by an interrupt
const EXIT_CANCELLED: u8 = 130;
/// Exit status for invalid command lines
const EXIT_USAGE: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let dotenv = dotenvy::dotenv();

    let cli = match args::parse(env::args().skip(1)) {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("error: {e:#}");
            eprintln!();
            eprintln!("{}", args::help_text());
            return ExitCode::from(EXIT_USAGE);
        }
    };

    if cli.command == Command::Help {
        println!("{}", args::help_text());
        return ExitCode::SUCCESS;
    }

    let config = match load_config(cli.config.clone()) {
        Ok(config) => config,
        Err(e) => return report_failure(&e),
    };

    if let Err(e) = init_tracing(&config.logging) {
        eprintln!("warning: logging not initialised: {e}");
    }
    match dotenv {
        Ok(path) => tracing::debug!(path = %path.display(), "loaded .env"),
        Err(e) => tracing::debug!(error = %e, "no .env loaded"),
    }

    let result = match cli.command {
        Command::Learn(args) => commands::learn::run(&config, args).await,
        Command::Apply(args) => commands::apply::run(&config, args).await,
        Command::Help => Ok(()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => report_failure(&e),
    }
}

fn load_config(path: Option<std::path::PathBuf>) -> anyhow::Result<Config> {
    match path {
        Some(path) => config::load_from_file(Some(path.clone()))
            .with_context(|| format!("loading config from {}", path.display())),
        None => config::load().context("loading configuration"),
    }
}

/// Print the failure with its kind and table and pick the exit status.
fn report_failure(err: &anyhow::Error) -> ExitCode {
    let Some(domain) = err.downcast_ref::<StatSamplerError>() else {
        eprintln!("error: {err:#}");
        return ExitCode::FAILURE;
    };

    match domain.table() {
        Some(table) => eprintln!("error[{}] table {table}: {err:#}", domain.kind()),
        None => eprintln!("error[{}]: {err:#}", domain.kind()),
    }

    if matches!(domain, StatSamplerError::Cancelled { .. }) {
        ExitCode::from(EXIT_CANCELLED)
    } else {
        ExitCode::FAILURE
    }
}
