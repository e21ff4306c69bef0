//! Repocast - scheduled publishing of repository summaries.
//!
//! Main entry point for the Repocast CLI and server.

mod cli;
mod server;

use clap::Parser;
use tracing::error;

use repocast_config::ConfigLoader;

use crate::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();

    let mut config = ConfigLoader::load_or_default(&cli.config)?;
    config.apply_env_overrides();

    if let Some(Commands::CheckConfig) = cli.command {
        return server::check_config(&config);
    }

    server::init_tracing(&config.logging)?;

    let result = match cli.command {
        None => {
            server::validate(&config)?;
            server::run_server(config).await
        }
        Some(Commands::Run { host, port }) => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            server::validate(&config)?;
            server::run_server(config).await
        }
        Some(Commands::RunJob { name }) => {
            server::validate(&config)?;
            server::run_job(config, &name).await
        }
        Some(Commands::CheckConfig) => Ok(()),
    };

    if let Err(ref e) = result {
        error!("Repocast exited with error: {}", e);
    }
    result
}
