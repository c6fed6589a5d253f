//! Entertainment service (ivi-ent) - Main entry point
//!
//! Loads the media catalog, builds the entertainment facade and serves it over
//! HTTP/WebSocket until Ctrl+C or SIGTERM.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use ivi_common::config::{load_toml, locate_config_file, resolve_media_folder};
use ivi_common::Catalog;
use ivi_ent::api::{self, AppContext};
use ivi_ent::config::TomlConfig;
use ivi_ent::EntertainmentFacade;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for ivi-ent
#[derive(Parser, Debug)]
#[command(name = "ivi-ent")]
#[command(about = "Infotainment entertainment service")]
#[command(version)]
struct Args {
    /// Port to listen on (overrides the config file)
    #[arg(short, long, env = "IVI_PORT")]
    port: Option<u16>,

    /// Path to the TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Folder containing the media catalog files
    #[arg(short, long)]
    media_folder: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = locate_config_file(args.config.as_deref());
    let toml_config: TomlConfig =
        load_toml(config_path.as_deref()).context("Failed to load configuration")?;

    // Initialize tracing
    let level = toml_config.logging.level.as_str();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("ivi_ent={level},ivi_common={level},tower_http=info").into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match (&config_path, &args.config) {
        (Some(path), _) => info!("Configuration: {}", path.display()),
        (None, Some(explicit)) => warn!(
            "Config file not found: {}, using built-in defaults",
            explicit.display()
        ),
        (None, None) => warn!("No config file found, using built-in defaults"),
    }

    let ent_config = toml_config
        .entertainment()
        .context("Invalid configuration")?;

    let port = args.port.unwrap_or(toml_config.port);
    let media_folder = resolve_media_folder(
        args.media_folder.as_deref(),
        toml_config.media_folder.as_deref(),
    );
    info!("Starting entertainment service on port {}", port);
    info!("Media folder: {}", media_folder.display());

    let catalog = Catalog::load(&media_folder)
        .with_context(|| format!("Failed to load media catalog from {}", media_folder.display()))?;

    let facade = EntertainmentFacade::new(&catalog, &ent_config);
    let app = api::create_router(AppContext::new(facade));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
