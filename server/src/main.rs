use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper_util::rt::{TokioIo, TokioTimer};
use hyper_util::service::TowerToHyperService;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

// Error tracing
use anyhow::{Context, Result, anyhow};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use server::auth::{SigningSecret, TokenService};
use server::database::SqliteUserStore;
use server::handlers::http::build_service;
use server::{App, AppState, SessionSettings};
use shared::config::load_config;

#[derive(Debug, Parser)]
#[command(name = "userdir-server", version, about = "User directory API server")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let config_path = cli.config.to_string_lossy().into_owned();
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path))?;

    let secret = config
        .auth
        .resolved_jwt_secret()
        .ok_or_else(|| anyhow!("No signing secret configured"))?;
    let tokens = Arc::new(
        TokenService::new(&SigningSecret::new(secret)).context("Failed to build token service")?,
    );

    let store = SqliteUserStore::connect(&config.database.url)
        .await
        .with_context(|| format!("Failed to open database {}", config.database.url))?;

    let state = AppState::new(
        Arc::new(store),
        tokens,
        SessionSettings::from(&config.auth),
    );
    let app = App::new(state);

    let service = build_service::<Incoming>(
        app,
        &config.cors,
        Duration::from_secs(config.server.request_timeout_secs),
    )?;

    let addr = config.server.addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Listening on http://{}", addr);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!("Failed to accept connection: {}", e);
                        continue;
                    }
                };

                let io = TokioIo::new(stream);
                let service = TowerToHyperService::new(service.clone());

                tokio::task::spawn(async move {
                    if let Err(err) = http1::Builder::new()
                        .timer(TokioTimer::new())
                        .serve_connection(io, service)
                        .await
                    {
                        error!("Error serving connection from {}: {:?}", peer, err);
                    }
                });
            }
            _ = &mut shutdown => {
                info!("Shutdown signal received, closing listener");
                break;
            }
        }
    }

    Ok(())
}
