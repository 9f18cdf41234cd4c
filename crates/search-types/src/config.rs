//! Configuration loading for the search service.
//!
//! Layered config: defaults -> config file -> env vars -> CLI flags.
//! The default config file lives at `~/.config/registry-search/config.toml`
//! (platform equivalent via `directories`).

use config::{Config, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::SearchError;

const APPLICATION: &str = "registry-search";

/// Database drivers the storage layer knows how to open.
pub const SUPPORTED_DRIVERS: &[&str] = &["sqlite", "postgres", "cloudsqlpostgres"];

/// Storage backend selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// One of `sqlite`, `postgres`, `cloudsqlpostgres`
    #[serde(default = "default_driver")]
    pub driver: String,

    /// Backend-specific connection string
    #[serde(default = "default_database_config")]
    pub config: String,
}

fn default_driver() -> String {
    "sqlite".to_string()
}

fn default_database_config() -> String {
    let path = ProjectDirs::from("", "", APPLICATION)
        .map(|p| p.data_local_dir().join("search.db"))
        .unwrap_or_else(|| PathBuf::from("./search.db"));
    format!("sqlite://{}", path.to_string_lossy())
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            driver: default_driver(),
            config: default_database_config(),
        }
    }
}

/// Upstream registry connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrySettings {
    /// gRPC endpoint of the registry service
    #[serde(default = "default_registry_endpoint")]
    pub endpoint: String,
}

fn default_registry_endpoint() -> String {
    "http://localhost:8080".to_string()
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            endpoint: default_registry_endpoint(),
        }
    }
}

/// Extraction options.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexerSettings {
    /// Also index methods, schemas and parameters as separate documents.
    #[serde(default)]
    pub fragments: bool,
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// gRPC server port
    #[serde(default = "default_grpc_port")]
    pub grpc_port: u16,

    /// gRPC server host
    #[serde(default = "default_grpc_host")]
    pub grpc_host: String,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub registry: RegistrySettings,

    #[serde(default)]
    pub indexer: IndexerSettings,
}

fn default_grpc_port() -> u16 {
    50061
}

fn default_grpc_host() -> String {
    "0.0.0.0".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            grpc_port: default_grpc_port(),
            grpc_host: default_grpc_host(),
            log_level: default_log_level(),
            database: DatabaseSettings::default(),
            registry: RegistrySettings::default(),
            indexer: IndexerSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings with layered precedence:
    /// 1. Built-in defaults
    /// 2. Default config file
    /// 3. CLI-specified config file (optional)
    /// 4. Environment variables (`SEARCH_GRPC_PORT`, `SEARCH_DATABASE__DRIVER`, ...)
    ///
    /// CLI flags should be applied by the caller after this returns.
    pub fn load(cli_config_path: Option<&str>) -> Result<Self, SearchError> {
        let config_dir = ProjectDirs::from("", "", APPLICATION)
            .map(|p| p.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));
        let default_config_path = config_dir.join("config");

        let mut builder = Config::builder()
            .set_default("grpc_port", default_grpc_port() as i64)
            .map_err(|e| SearchError::Config(e.to_string()))?
            .set_default("grpc_host", default_grpc_host())
            .map_err(|e| SearchError::Config(e.to_string()))?
            .set_default("log_level", default_log_level())
            .map_err(|e| SearchError::Config(e.to_string()))?
            .set_default("database.driver", default_driver())
            .map_err(|e| SearchError::Config(e.to_string()))?
            .set_default("database.config", default_database_config())
            .map_err(|e| SearchError::Config(e.to_string()))?
            .set_default("registry.endpoint", default_registry_endpoint())
            .map_err(|e| SearchError::Config(e.to_string()))?
            .set_default("indexer.fragments", false)
            .map_err(|e| SearchError::Config(e.to_string()))?
            .add_source(File::with_name(&default_config_path.to_string_lossy()).required(false));

        if let Some(path) = cli_config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix("SEARCH")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings: Settings = builder
            .build()
            .map_err(|e| SearchError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| SearchError::Config(e.to_string()))?;

        settings.validate()?;
        Ok(settings)
    }

    /// Reject settings the storage layer cannot act on.
    pub fn validate(&self) -> Result<(), SearchError> {
        if !SUPPORTED_DRIVERS.contains(&self.database.driver.as_str()) {
            return Err(SearchError::Config(format!(
                "unsupported database driver {:?} (expected one of {})",
                self.database.driver,
                SUPPORTED_DRIVERS.join(", ")
            )));
        }
        if self.database.config.trim().is_empty() {
            return Err(SearchError::Config(
                "database.config must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Get the socket address for the gRPC server
    pub fn grpc_addr(&self) -> String {
        format!("{}:{}", self.grpc_host, self.grpc_port)
    }
}
