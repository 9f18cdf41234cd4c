//! CLI argument parsing for the search daemon.
//!
//! CLI flags override every other configuration source.

use clap::{Parser, Subcommand};

use search_client::DEFAULT_ENDPOINT;

/// Registry Search Daemon
///
/// Indexes API specs from a registry and serves ranked full-text queries.
#[derive(Parser, Debug)]
#[command(name = "search-daemon")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config file (overrides default ~/.config/registry-search/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Daemon commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the search server
    Start {
        /// Override gRPC port
        #[arg(short, long)]
        port: Option<u16>,

        /// Override database driver (sqlite, postgres, cloudsqlpostgres)
        #[arg(long)]
        database: Option<String>,

        /// Override database connection string
        #[arg(long)]
        database_config: Option<String>,

        /// Override registry endpoint
        #[arg(long)]
        registry: Option<String>,

        /// Also index methods, schemas and parameters as separate documents
        #[arg(long)]
        fragments: bool,
    },

    /// Index a spec resource
    Index {
        /// gRPC endpoint of a running daemon
        #[arg(short, long, default_value = DEFAULT_ENDPOINT)]
        endpoint: String,

        /// Spec resource name
        resource_name: String,
    },

    /// Run a full-text query
    Query {
        /// gRPC endpoint of a running daemon
        #[arg(short, long, default_value = DEFAULT_ENDPOINT)]
        endpoint: String,

        /// Query text
        q: String,
    },

    /// Remove the indexed documents of a resource
    Delete {
        /// gRPC endpoint of a running daemon
        #[arg(short, long, default_value = DEFAULT_ENDPOINT)]
        endpoint: String,

        /// Spec resource name
        resource_name: String,
    },

    /// Look up an operation returned by `index`
    Operation {
        /// gRPC endpoint of a running daemon
        #[arg(short, long, default_value = DEFAULT_ENDPOINT)]
        endpoint: String,

        /// Operation name
        name: String,

        /// Wait for the operation instead of reading its current state
        #[arg(short, long)]
        wait: bool,
    },

    /// Administrative commands that read storage directly
    Admin {
        /// Override database driver
        #[arg(long)]
        database: Option<String>,

        /// Override database connection string
        #[arg(long)]
        database_config: Option<String>,

        #[command(subcommand)]
        command: AdminCommands,
    },
}

/// Admin subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum AdminCommands {
    /// List stored documents
    Documents {
        /// Only documents of this project
        #[arg(long)]
        project: Option<String>,

        /// Skip this many documents
        #[arg(long, default_value = "0")]
        offset: i64,
    },
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
