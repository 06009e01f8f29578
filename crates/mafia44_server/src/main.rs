//! Mafia44 server binary.

use anyhow::{Context, Result};
use clap::Parser;
use mafia44_server::cli::{Cli, Command};
use mafia44_server::{GameService, ServerConfig, SqliteStore, SystemClock, router};
use std::path::PathBuf;
use tracing::{info, instrument};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,mafia44_server=debug")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve {
            config,
            host,
            port,
            db_path,
        } => {
            let config = load_config(config)?.with_overrides(host, port, db_path);
            run_server(config).await
        }
        Command::Migrate { config, db_path } => {
            let config = load_config(config)?.with_overrides(None, None, db_path);
            run_migrations(&config)
        }
    }
}

/// Reads the config file if one was given, defaults otherwise.
#[instrument]
fn load_config(path: Option<PathBuf>) -> Result<ServerConfig> {
    match path {
        Some(path) => Ok(ServerConfig::from_file(path)?),
        None => Ok(ServerConfig::default()),
    }
}

/// Apply the embedded migrations.
#[instrument(skip(config), fields(db_path = %config.db_path()))]
fn run_migrations(config: &ServerConfig) -> Result<()> {
    let store = SqliteStore::new(config.db_path().clone())?;
    store.run_migrations()?;
    info!("Database is up to date");
    Ok(())
}

/// Run the HTTP game server
#[instrument(skip(config), fields(host = %config.host(), port = config.port()))]
async fn run_server(config: ServerConfig) -> Result<()> {
    let store = SqliteStore::new(config.db_path().clone())?;
    store.run_migrations()?;

    let service = GameService::new(store, SystemClock, *config.default_min_move_time()).shared();
    let app = router(service);

    let listener = tokio::net::TcpListener::bind((config.host().as_str(), *config.port()))
        .await
        .with_context(|| format!("Failed to bind {}:{}", config.host(), config.port()))?;
    info!("Server ready at http://{}:{}/", config.host(), config.port());

    axum::serve(listener, app).await?;
    Ok(())
}
