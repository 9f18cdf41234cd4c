//! Registry Search Daemon
//!
//! Indexes API specs held in a registry and serves ranked full-text queries.
//!
//! # Usage
//!
//! ```bash
//! search-daemon start [--port PORT] [--database DRIVER] [--database-config DSN] [--registry URL]
//! search-daemon index RESOURCE_NAME
//! search-daemon query TEXT
//! search-daemon delete RESOURCE_NAME
//! search-daemon operation [--wait] NAME
//! search-daemon admin documents [--project ID] [--offset N]
//! ```
//!
//! # Configuration
//!
//! Configuration is loaded in order (later sources override earlier):
//! 1. Built-in defaults
//! 2. Config file (~/.config/registry-search/config.toml)
//! 3. Environment variables (SEARCH_*)
//! 4. CLI flags

use anyhow::Result;
use clap::Parser;

use search_daemon::{
    handle_admin, handle_delete, handle_index, handle_operation, handle_query, start_daemon, Cli,
    Commands, StartOptions,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Start {
            port,
            database,
            database_config,
            registry,
            fragments,
        } => {
            let options = StartOptions {
                port,
                database,
                database_config,
                registry,
                fragments,
            };
            start_daemon(cli.config.as_deref(), options, cli.log_level.as_deref()).await?;
        }
        Commands::Index {
            endpoint,
            resource_name,
        } => {
            handle_index(&endpoint, &resource_name).await?;
        }
        Commands::Query { endpoint, q } => {
            handle_query(&endpoint, &q).await?;
        }
        Commands::Delete {
            endpoint,
            resource_name,
        } => {
            handle_delete(&endpoint, &resource_name).await?;
        }
        Commands::Operation {
            endpoint,
            name,
            wait,
        } => {
            handle_operation(&endpoint, &name, wait).await?;
        }
        Commands::Admin {
            database,
            database_config,
            command,
        } => {
            handle_admin(cli.config.as_deref(), database, database_config, command).await?;
        }
    }

    Ok(())
}
