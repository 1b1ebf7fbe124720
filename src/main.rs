use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use clap::Parser;
use tokio::signal;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

use tollgate::config::TollgateConfig;
use tollgate::http::{self, HttpServer};
use tollgate::ratelimit::RateLimiter;

#[derive(Parser, Debug)]
#[command(
    name = "tollgate",
    about = "Fixed-window rate limiting service for public write endpoints",
    version
)]
struct Args {
    /// Path to a YAML configuration file (defaults apply when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured listen address
    #[arg(short, long)]
    listen: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .with_target(false)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    info!("Starting Tollgate Rate Limiting Service");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let mut config = match &args.config {
        Some(path) => TollgateConfig::from_file(path)?,
        None => TollgateConfig::default(),
    };
    if let Some(listen) = args.listen {
        config.server.http_addr = listen;
    }

    // Validate the policies before accepting any traffic
    let contact = config.rate_limiting.contact.to_policy()?;
    let subscribe = config.rate_limiting.subscribe.to_policy()?;
    let sweep_interval = config.rate_limiting.sweep_interval()?;
    info!(
        http_addr = %config.server.http_addr,
        contact_limit = contact.limit(),
        subscribe_limit = subscribe.limit(),
        "Configuration loaded"
    );

    // Initialize the rate limiter and its background reaper
    let limiter = Arc::new(RateLimiter::new());
    limiter.start_reaper(sweep_interval);
    info!("Rate limiter initialized");

    // Create and start the HTTP server
    let router = http::router(Arc::clone(&limiter), contact, subscribe);
    let server = HttpServer::new(config.server.http_addr, router);

    info!("Starting HTTP server on {}", config.server.http_addr);

    // Run the server with graceful shutdown on Ctrl+C
    server.serve_with_shutdown(shutdown_signal()).await?;

    limiter.stop_reaper().await;
    info!("Tollgate Rate Limiting Service stopped");
    Ok(())
}

/// Wait for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
