use anyhow::{Context, Result};
use assetvault::{AssetStore, FileVault, VaultConfig};
use axum::http::HeaderValue;
use clap::Parser;
use meshdrop::web;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// The Meshdrop asset-delivery server
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Port to listen on
    #[arg(short, long, default_value = "5000")]
    port: u16,

    /// Base directory for the vault (models/ and temp_assets/ live here).
    /// Falls back to MESHDROP_VAULT_PATH, then ~/.meshdrop/vault.
    #[arg(long)]
    vault_path: Option<PathBuf>,

    /// Source asset filename under models/
    #[arg(long)]
    source_file: Option<String>,

    /// Simulated processing latency for generate requests, in milliseconds
    #[arg(long, default_value = "2000")]
    latency_ms: u64,

    /// Allowed CORS origin (repeatable). Any origin when omitted.
    #[arg(long = "allow-origin")]
    allow_origins: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let mut config = match cli.vault_path {
        Some(path) => VaultConfig::with_base_path(path),
        None => VaultConfig::from_env()?,
    };
    if let Some(source) = cli.source_file {
        config.source_file = source;
    }

    let vault = FileVault::new(config).context("Failed to initialize asset vault")?;
    tracing::info!("Vault ready at: {}", vault.config().base_path.display());
    tracing::info!("   Source asset: {}", vault.config().source_path().display());
    if !vault.source_exists() {
        tracing::warn!("Source asset not found; /generate will report 404 until it appears");
    }

    let origins = cli
        .allow_origins
        .iter()
        .map(|o| {
            HeaderValue::from_str(o).with_context(|| format!("invalid CORS origin: {o}"))
        })
        .collect::<Result<Vec<_>>>()?;

    let state = web::WebState {
        vault: Arc::new(vault),
        latency: Duration::from_millis(cli.latency_ms),
    };
    let app = web::router(state, origins);

    let addr = format!("0.0.0.0:{}", cli.port);
    tracing::info!("Meshdrop starting on http://{}", addr);
    tracing::info!("   Generate: POST http://{}/generate", addr);
    tracing::info!("   Model: GET http://{}/models/{{id}}", addr);
    tracing::info!("   Health: GET http://{}/health", addr);

    let bind_addr: std::net::SocketAddr = addr.parse().context("Failed to parse bind address")?;
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Wait for SIGINT (Ctrl+C) or SIGTERM (cargo-watch, systemd, etc.)
async fn shutdown_signal() {
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received SIGINT (Ctrl+C), shutting down gracefully...");
        }
        _ = async {
            #[cfg(unix)]
            {
                use tokio::signal::unix::{signal, SignalKind};
                let mut sigterm =
                    signal(SignalKind::terminate()).expect("Failed to setup SIGTERM handler");
                sigterm.recv().await;
            }
            #[cfg(not(unix))]
            {
                std::future::pending::<()>().await;
            }
        } => {
            tracing::info!("Received SIGTERM, shutting down gracefully...");
        }
    }
}
