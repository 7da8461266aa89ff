//! Command-line argument parsing

use std::path::PathBuf;

use anyhow::{anyhow, bail, Context};
use statsampler_domain::TableName;

/// Parsed invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct Cli {
    /// Explicit config file; otherwise environment, then probed files
    pub config: Option<PathBuf>,
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Learn(LearnArgs),
    Apply(ApplyArgs),
    Help,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LearnArgs {
    pub tables: Vec<TableName>,
    pub skip_failures: bool,
    pub model: Option<PathBuf>,
    pub json: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApplyArgs {
    pub table: TableName,
    pub full: bool,
    pub model: Option<PathBuf>,
    pub json: bool,
}

/// Parse arguments, excluding the program name.
pub fn parse<I>(args: I) -> anyhow::Result<Cli>
where
    I: IntoIterator<Item = String>,
{
    let mut config = None;
    let mut command = None;
    let mut tables = Vec::new();
    let mut model = None;
    let mut skip_failures = false;
    let mut full = false;
    let mut json = false;

    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" | "help" => {
                return Ok(Cli { config, command: Command::Help });
            }
            "-c" | "--config" => config = Some(value_for(&arg, args.next())?.into()),
            "--model" => model = Some(value_for(&arg, args.next())?.into()),
            "--skip-failures" => skip_failures = true,
            "--full" => full = true,
            "--json" => json = true,
            flag if flag.starts_with('-') => bail!("unknown option: {flag}"),
            name @ ("learn" | "apply") if command.is_none() => command = Some(name.to_string()),
            table => tables.push(
                TableName::parse(table).with_context(|| format!("invalid table argument '{table}'"))?,
            ),
        }
    }

    let command = match command.as_deref() {
        Some("learn") => {
            if tables.is_empty() {
                bail!("learn needs at least one table");
            }
            if full {
                bail!("--full only applies to apply");
            }
            Command::Learn(LearnArgs { tables, skip_failures, model, json })
        }
        Some("apply") => {
            if skip_failures {
                bail!("--skip-failures only applies to learn");
            }
            let mut tables = tables.into_iter();
            let table = tables.next().ok_or_else(|| anyhow!("apply needs a table"))?;
            if tables.next().is_some() {
                bail!("apply takes exactly one table");
            }
            if full && model.is_some() {
                bail!("--full refreshes without a model; drop --model");
            }
            Command::Apply(ApplyArgs { table, full, model, json })
        }
        _ => bail!("expected a command: learn or apply"),
    };

    Ok(Cli { config, command })
}

fn value_for(flag: &str, value: Option<String>) -> anyhow::Result<String> {
    value.filter(|v| !v.starts_with('-')).ok_or_else(|| anyhow!("{flag} needs a value"))
}

pub fn help_text() -> String {
    format!(
        "statsampler {version}
Learned sample sizes for PostgreSQL statistics refresh

USAGE:
    statsampler [--config FILE] learn <TABLE>... [--skip-failures] [--model FILE] [--json]
    statsampler [--config FILE] apply <TABLE> [--model FILE | --full] [--json]

COMMANDS:
    learn    Refresh statistics on each table with a heuristic sample, record
             the resulting plans, and train a sample-size model
    apply    Refresh statistics on one table with the sample size the model predicts

OPTIONS:
    -c, --config FILE    Config file (default: environment, then statsampler.toml)
    --model FILE         Model artifact path (default: from config)
    --skip-failures      Skip tables that fail instead of aborting the run
    --full               Full-table refresh without a model
    --json               Print the result as JSON
    -h, --help           Show this help",
        version = env!("CARGO_PKG_VERSION")
    )
}
