//! platewised: Platewise HTTP daemon.
//!
//! Serves `POST /api/analyze-food` and `GET /health` over HTTP.

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tracing::info;

use platewise::PlatewiseError;
use platewise::config::{Config, Secrets};
use platewise::server::{AppState, router};

/// Platewise daemon: food photo nutrient analysis service.
#[derive(Parser)]
#[command(name = "platewised")]
#[command(version = platewise::PKG_VERSION)]
#[command(about = "Platewise food analysis daemon")]
struct Args {
    /// Path to configuration file.
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,

    /// Address to bind, overriding the config file.
    #[arg(short, long, env = "PLATEWISE_ADDRESS")]
    address: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    // Load configuration
    let config = Config::load_or_default(args.config.as_deref())?;
    let secrets = Secrets::load()?;

    let analyzer = config.analyzer_builder(&secrets)?.build()?;
    info!(strategies = ?analyzer.strategies(), "analyzer ready");

    let address = args.address.unwrap_or_else(|| config.server.address.clone());
    let addr: SocketAddr = address
        .parse()
        .map_err(|e| PlatewiseError::Configuration(format!("Invalid address: {e}")))?;

    let state = AppState::new(Arc::new(analyzer), config.server.limits.max_image_bytes);
    let app = router(state, &config.server.limits);

    info!(version = platewise::version_string(), %addr, "platewised starting");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("platewised stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
