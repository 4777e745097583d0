//! ingress-guard server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ request id ─▶ trace ─▶ timeout ─▶ origin gate ─▶ body size guard ─▶ handlers
//!                                                         │ 401            │ 413
//!     Client Response ◀───────────────────────────────────┴────────────────┴──────────────
//!
//!     config file ─▶ watcher ─▶ SettingsService (ArcSwap) ◀─ read per body chunk
//! ```

use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use ingress_guard::config::loader::{default_config, load_config};
use ingress_guard::config::watcher::UploadSettingsWatcher;
use ingress_guard::lifecycle::{signals, Shutdown};
use ingress_guard::observability::{logging, metrics};
use ingress_guard::HttpServer;

#[derive(Parser)]
#[command(name = "ingress-guard")]
#[command(about = "HTTP server guarded by origin validation and upload size limits", long_about = None)]
struct Args {
    /// TOML configuration file, watched for changes.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => default_config()?,
    };

    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "ingress-guard starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_file_size_upload_mb = ?config.uploads.max_file_size_upload,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        // Validated at load time.
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        }
    }

    // Keep the watcher handle alive for the lifetime of the server.
    let (_watcher, upload_updates) = match &args.config {
        Some(path) => {
            let (watcher, updates) = UploadSettingsWatcher::new(path, config.uploads);
            (Some(watcher.run()?), updates)
        }
        None => {
            let (_, updates) = mpsc::unbounded_channel();
            (None, updates)
        }
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    signals::spawn_signal_handler(shutdown);

    let server = HttpServer::new(config);
    server.run(listener, upload_updates, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
