//! Search daemon library exports.
//!
//! # Modules
//!
//! - `cli`: Command-line argument parsing with clap
//! - `commands`: Command implementations (start, client calls, admin)

pub mod cli;
pub mod commands;

pub use cli::{AdminCommands, Cli, Commands};
pub use commands::{
    handle_admin, handle_delete, handle_index, handle_operation, handle_query, load_settings,
    start_daemon, StartOptions,
};
