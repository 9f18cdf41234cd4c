//! Command implementations for the search daemon.
//!
//! Handles:
//! - start: Load config, open storage, start gRPC server
//! - index, query, delete, operation: Call a running daemon
//! - admin: Read storage directly

use std::fs;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::info;

use search_client::{decode_index_outcome, SearchClient};
use search_indexer::{Indexer, IndexerConfig};
use search_service::{run_server_with_shutdown, GrpcRegistry, SearchServiceImpl};
use search_storage::{Client, Query};
use search_types::{Document, Settings, DOCUMENT_ENTITY};

use crate::cli::AdminCommands;

/// CLI overrides for `start`.
#[derive(Debug, Default, Clone)]
pub struct StartOptions {
    pub port: Option<u16>,
    pub database: Option<String>,
    pub database_config: Option<String>,
    pub registry: Option<String>,
    pub fragments: bool,
}

/// Load settings and apply CLI overrides (highest precedence).
pub fn load_settings(
    config_path: Option<&str>,
    options: &StartOptions,
    log_level_override: Option<&str>,
) -> Result<Settings> {
    let mut settings = Settings::load(config_path).context("Failed to load configuration")?;

    if let Some(port) = options.port {
        settings.grpc_port = port;
    }
    if let Some(driver) = &options.database {
        settings.database.driver = driver.clone();
    }
    if let Some(dsn) = &options.database_config {
        settings.database.config = dsn.clone();
    }
    if let Some(endpoint) = &options.registry {
        settings.registry.endpoint = endpoint.clone();
    }
    if options.fragments {
        settings.indexer.fragments = true;
    }
    if let Some(log_level) = log_level_override {
        settings.log_level = log_level.to_string();
    }

    settings.validate().context("Invalid configuration")?;
    Ok(settings)
}

fn init_logging(level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")
}

/// File path of a SQLite connection string, if it names a file.
pub fn sqlite_path(dsn: &str) -> Option<PathBuf> {
    let rest = dsn
        .strip_prefix("sqlite://")
        .or_else(|| dsn.strip_prefix("sqlite:"))?;
    let path = rest.split('?').next().unwrap_or_default();
    if path.is_empty() || path == ":memory:" {
        return None;
    }
    Some(PathBuf::from(path))
}

/// Open the configured storage backend, creating the SQLite directory if needed.
async fn open_storage(settings: &Settings) -> Result<Client> {
    let database = &settings.database;
    if database.driver == "sqlite" {
        if let Some(parent) = sqlite_path(&database.config).and_then(|p| p.parent().map(PathBuf::from)) {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(&parent).context("Failed to create database directory")?;
            }
        }
    }
    Client::open(&database.driver, &database.config)
        .await
        .with_context(|| format!("Failed to open {} storage", database.driver))
}

/// Start the search server.
///
/// 1. Load configuration (defaults -> file -> env -> CLI)
/// 2. Open storage and the registry client
/// 3. Start gRPC server
/// 4. Shut down gracefully on SIGINT/SIGTERM
pub async fn start_daemon(
    config_path: Option<&str>,
    options: StartOptions,
    log_level_override: Option<&str>,
) -> Result<()> {
    let settings = load_settings(config_path, &options, log_level_override)?;
    init_logging(&settings.log_level)?;

    info!("Search daemon starting...");
    info!("Configuration:");
    info!("  Database driver: {}", settings.database.driver);
    info!("  Registry endpoint: {}", settings.registry.endpoint);
    info!("  gRPC address: {}", settings.grpc_addr());
    info!("  Fragment documents: {}", settings.indexer.fragments);
    info!("  Log level: {}", settings.log_level);

    let client = open_storage(&settings).await?;
    let registry = GrpcRegistry::connect_lazy(&settings.registry.endpoint)
        .context("Invalid registry endpoint")?;
    let indexer = Indexer::new(IndexerConfig::from(&settings.indexer));
    let service = SearchServiceImpl::new(client.clone(), Arc::new(registry), indexer);

    let addr: SocketAddr = settings
        .grpc_addr()
        .parse()
        .context("Invalid gRPC address")?;

    let shutdown_signal = async {
        let ctrl_c = async {
            if let Err(e) = signal::ctrl_c().await {
                tracing::error!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut stream) => {
                    stream.recv().await;
                }
                Err(e) => {
                    tracing::error!("Failed to install SIGTERM handler: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {
                info!("Received Ctrl+C, shutting down...");
            }
            _ = terminate => {
                info!("Received SIGTERM, shutting down...");
            }
        }
    };

    let result = run_server_with_shutdown(addr, service, shutdown_signal).await;
    client.close().await;

    result.map_err(|e| anyhow::anyhow!("Server error: {}", e))
}

async fn connect(endpoint: &str) -> Result<SearchClient> {
    SearchClient::connect(endpoint)
        .await
        .with_context(|| format!("Failed to connect to {}", endpoint))
}

pub async fn handle_index(endpoint: &str, resource_name: &str) -> Result<()> {
    let mut client = connect(endpoint).await?;
    let outcome = client.index(resource_name).await.context("Index failed")?;
    println!("Operation: {}", outcome.operation_name);
    println!("Done: {}", outcome.done);
    println!("Documents: {}", outcome.document_count);
    println!("Message: {}", outcome.message);
    Ok(())
}

pub async fn handle_query(endpoint: &str, q: &str) -> Result<()> {
    let mut client = connect(endpoint).await?;
    let results = client.query(q).await.context("Query failed")?;
    if results.is_empty() {
        println!("No results for {:?}", q);
        return Ok(());
    }
    for (i, result) in results.iter().enumerate() {
        println!("{}. {}", i + 1, result.key);
        for line in result.excerpt.lines() {
            println!("   {}", line);
        }
    }
    Ok(())
}

pub async fn handle_delete(endpoint: &str, resource_name: &str) -> Result<()> {
    let mut client = connect(endpoint).await?;
    let deleted = client.delete(resource_name).await.context("Delete failed")?;
    println!("Deleted {} document(s) for {}", deleted, resource_name);
    Ok(())
}

pub async fn handle_operation(endpoint: &str, name: &str, wait: bool) -> Result<()> {
    let mut client = connect(endpoint).await?;
    let operation = if wait {
        client.wait_operation(name, None).await
    } else {
        client.get_operation(name).await
    }
    .context("Operation lookup failed")?;

    let outcome = decode_index_outcome(operation)?;
    println!("Operation: {}", outcome.operation_name);
    println!("Done: {}", outcome.done);
    println!("Resource: {}", outcome.resource_name);
    println!("Documents: {}", outcome.document_count);
    println!("Message: {}", outcome.message);
    Ok(())
}

/// One line of `admin documents` output.
pub fn format_document(document: &Document) -> String {
    let field = document.field_str();
    format!(
        "{}\t{}\t{}\t{}",
        document.key,
        document.kind,
        if field.is_empty() { "-" } else { field },
        document.project_id
    )
}

pub async fn handle_admin(
    config_path: Option<&str>,
    database: Option<String>,
    database_config: Option<String>,
    command: AdminCommands,
) -> Result<()> {
    let options = StartOptions {
        database,
        database_config,
        ..Default::default()
    };
    let settings = load_settings(config_path, &options, None)?;
    let client = open_storage(&settings).await?;

    match command {
        AdminCommands::Documents { project, offset } => {
            let mut query = Query::new(DOCUMENT_ENTITY).offset(offset);
            if let Some(project) = &project {
                query = query.require("project_id", project);
            }

            let mut session = client.session().await.context("Failed to open session")?;
            let documents = session.run(&query).await.context("Failed to list documents")?;
            let mut count = 0;
            for (_, document) in documents {
                println!("{}", format_document(&document));
                count += 1;
            }
            println!("{} document(s)", count);
        }
    }

    client.close().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use search_types::{Field, SPEC_KIND};

    #[test]
    fn test_sqlite_path() {
        assert_eq!(
            sqlite_path("sqlite:///var/lib/search/search.db"),
            Some(PathBuf::from("/var/lib/search/search.db"))
        );
        assert_eq!(
            sqlite_path("sqlite:data/search.db?mode=rwc"),
            Some(PathBuf::from("data/search.db"))
        );
        assert_eq!(sqlite_path("sqlite::memory:"), None);
        assert_eq!(sqlite_path("postgres://localhost/registry"), None);
    }

    #[test]
    fn test_format_document() {
        let mut document = Document {
            key: "projects/p/locations/global/apis/a/versions/v/specs/s".to_string(),
            kind: SPEC_KIND.to_string(),
            project_id: "p".to_string(),
            ..Default::default()
        };
        assert_eq!(
            format_document(&document),
            "projects/p/locations/global/apis/a/versions/v/specs/s\tSpec\t-\tp"
        );

        document.field = Some(Field::Methods);
        assert!(format_document(&document).contains("\tmethods\t"));
    }

    #[test]
    fn test_cli_overrides_win() {
        let options = StartOptions {
            port: Some(6000),
            database: Some("sqlite".to_string()),
            database_config: Some("sqlite::memory:".to_string()),
            registry: Some("http://registry:1234".to_string()),
            fragments: true,
        };
        let settings = load_settings(None, &options, Some("debug")).unwrap();
        assert_eq!(settings.grpc_port, 6000);
        assert_eq!(settings.database.config, "sqlite::memory:");
        assert_eq!(settings.registry.endpoint, "http://registry:1234");
        assert!(settings.indexer.fragments);
        assert_eq!(settings.log_level, "debug");
    }

    #[test]
    fn test_invalid_driver_rejected() {
        let options = StartOptions {
            database: Some("mysql".to_string()),
            ..Default::default()
        };
        assert!(load_settings(None, &options, None).is_err());
    }

    #[tokio::test]
    async fn test_admin_documents_on_empty_store() {
        let dir = tempfile::TempDir::new().unwrap();
        let dsn = format!("sqlite://{}", dir.path().join("nested/search.db").display());
        let result = handle_admin(
            None,
            Some("sqlite".to_string()),
            Some(dsn),
            AdminCommands::Documents {
                project: Some("demo".to_string()),
                offset: 0,
            },
        )
        .await;
        assert!(result.is_ok());
        assert!(dir.path().join("nested/search.db").exists());
    }
}
