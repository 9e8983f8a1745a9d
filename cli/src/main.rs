//! opbatch - run one batch of operations against a SQLite database.
//!
//! Reads the batch JSON from a file (or stdin), prints the response body as
//! pretty JSON and exits non-zero unless the batch committed.

use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use opbatch_session::{BatchService, EngineConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "opbatch", version, about = "Run a transactional batch of insert/update/delete operations")]
struct Args {
    /// TOML configuration file.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// SQLite database file, overriding the configuration.
    #[arg(long, value_name = "PATH")]
    database: Option<PathBuf>,

    /// Batch JSON file; stdin when absent.
    batch_file: Option<PathBuf>,
}

fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();
    let config = load_config(&args)?;

    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .init();

    let body = read_batch(args.batch_file.as_deref())?;
    let service = BatchService::from_config(&config);
    let response = service.handle(&body);
    tracing::debug!(
        database = %service.database().path().display(),
        status = response.status.as_u16(),
        "batch handled"
    );

    println!("{}", response.to_pretty_string());
    Ok(if response.status.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn load_config(args: &Args) -> anyhow::Result<EngineConfig> {
    let mut config = match &args.config {
        Some(path) => EngineConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    config.apply_env_overrides()?;
    if let Some(path) = &args.database {
        config.database.path = path.clone();
    }
    config.validate()?;
    Ok(config)
}

fn read_batch(path: Option<&Path>) -> anyhow::Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading batch file {}", path.display())),
        None => {
            let mut input = String::new();
            io::stdin()
                .lock()
                .read_to_string(&mut input)
                .context("reading batch from stdin")?;
            Ok(input)
        }
    }
}
