// SPDX-FileCopyrightText: 2026 Outlay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outlay - expense tracking with safe retries.
//!
//! This is the binary entry point: `serve` runs the HTTP API, while `add`,
//! `list` and `status` talk to a running server.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod add;
mod list;
mod serve;
mod status;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use outlay_client::{ClientError, SubmitError};
use outlay_config::model::OutlayConfig;
use outlay_config::{ConfigError, render_errors};
use outlay_core::OutlayError;

/// Outlay - expense tracking with safe retries.
#[derive(Parser, Debug)]
#[command(name = "outlay", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, short, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the expense API server.
    Serve,
    /// Record an expense, retrying transient failures.
    Add(add::AddArgs),
    /// List recorded expenses and their total.
    List(list::ListArgs),
    /// Check whether the server is up.
    Status {
        /// Print machine-readable JSON.
        #[arg(long)]
        json: bool,
    },
}

/// Anything a subcommand can fail with.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error(transparent)]
    Outlay(#[from] OutlayError),
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error(transparent)]
    Submit(#[from] SubmitError),
}

impl CommandError {
    /// The user stopped the command; not a failure.
    fn is_cancelled(&self) -> bool {
        matches!(
            self,
            CommandError::Client(ClientError::Cancelled)
                | CommandError::Submit(SubmitError::Cancelled)
        )
    }
}

fn load_config(path: Option<&Path>) -> Result<OutlayConfig, Vec<ConfigError>> {
    match path {
        Some(path) => outlay_config::load_and_validate_path(path),
        None => outlay_config::load_and_validate(),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(errors) => {
            render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.server.log_level);

    let result = match cli.command {
        Commands::Serve => serve::run_serve(config).await.map_err(CommandError::from),
        Commands::Add(args) => add::run_add(&config, args).await,
        Commands::List(args) => list::run_list(&config, args).await,
        Commands::Status { json } => status::run_status(&config, json).await,
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

/// Initializes the tracing subscriber with the given log level.
///
/// Logs go to stderr so command output on stdout stays clean.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("outlay={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn add_parses_flags() {
        let cli = Cli::try_parse_from([
            "outlay", "add", "--amount", "12.50", "--category", "Food", "--description",
            "Lunch", "--date", "2024-02-18",
        ])
        .unwrap();
        match cli.command {
            Commands::Add(args) => {
                assert_eq!(args.amount, 12.5);
                assert_eq!(args.date.as_deref(), Some("2024-02-18"));
                assert!(args.key.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn config_flag_is_global() {
        let cli = Cli::try_parse_from(["outlay", "list", "--config", "/tmp/o.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/o.toml")));
    }

    #[test]
    fn subcommand_is_required() {
        assert!(Cli::try_parse_from(["outlay"]).is_err());
    }

    #[test]
    fn explicit_config_path_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("outlay.toml");
        std::fs::write(&path, "[server]\nport = 4100\n").unwrap();
        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.server.port, 4100);
    }
}
