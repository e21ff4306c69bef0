//! CLI definitions for Repocast.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Repocast CLI.
#[derive(Parser)]
#[command(name = "repocast")]
#[command(about = "Scheduled publishing of repository summaries to configurable API endpoints")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml", global = true)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Run the scheduler and admin API in foreground (default)
    Run {
        /// Admin API host, overrides the config file
        #[arg(long)]
        host: Option<String>,

        /// Admin API port, overrides the config file
        #[arg(long)]
        port: Option<u16>,
    },

    /// Run one job immediately and record its execution
    RunJob {
        /// Job name (collect or message)
        name: String,
    },

    /// Validate the configuration file and exit
    CheckConfig,
}
