//! static-serve
//!
//! Serves one or more directories of static files, each on its own port,
//! without ever listing directory contents.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ listener (net) ─▶ axum router (http::server)
//!                                            │
//!                                            ▼
//!                     Health ─▶ HeaderDump ─▶ AccessLog ─▶ Fallback
//!                                                             │
//!                                                             ▼
//!                                           FileServer ─▶ JustFiles ─▶ disk | memory
//!                                                                         ▲
//!                                                       notify watcher ───┘
//!
//!     SIGINT/SIGTERM ─▶ Shutdown broadcast ─▶ every listener drains
//!                                          ─▶ watchers closed afterwards
//! ```

use clap::Parser;

use static_serve::config::cli::Cli;
use static_serve::lifecycle::{signals, startup, Coordinator};
use static_serve::observability::logging;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    if cli.version {
        println!("{}", startup::build_info());
        return Ok(());
    }
    logging::init(&cli.log_level);
    startup::log_build_info();

    let config = cli.into_config()?;
    tracing::info!(
        sites = config.sites.len(),
        fs = ?config.fs,
        health_port = ?config.health_port,
        tls = config.tls.is_some(),
        "Configuration loaded"
    );

    let coordinator = Coordinator::build(&config).await?;
    tracing::info!(instances = coordinator.len(), "Starting listeners");
    let running = coordinator.start();

    signals::wait_for_termination().await;
    running.shutdown().await;

    tracing::info!("Shutdown complete");
    Ok(())
}
