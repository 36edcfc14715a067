//! Capture service binary for the Pokedex collection.
//!
//! Wires the `PostgreSQL` capture store into the capture engine, serves
//! the HTTP API, and drives the process lifecycle from startup through
//! graceful shutdown.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from the environment
//! 2. Initialize structured logging (tracing)
//! 3. Connect the connection pool
//! 4. Bootstrap the schema (failure aborts with a non-zero exit)
//! 5. Bind the listener and enter `Serving`
//! 6. Serve until SIGINT or SIGTERM moves the lifecycle to `Draining`
//! 7. Wait for in-flight requests, close the pool, enter `Stopped`

mod config;
mod error;
mod service;

use pokedex_core::Lifecycle;
use pokedex_core::lifecycle::shutdown_signal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, ServiceConfig};
use crate::error::ServiceError;

/// Application entry point for the capture service.
///
/// # Errors
///
/// Returns an error if configuration, database connection, schema
/// bootstrap, or binding fails. The process then exits non-zero.
#[tokio::main]
async fn main() -> Result<(), ServiceError> {
    // 1. Load configuration.
    let config = ServiceConfig::from_env()?;

    // 2. Initialize structured logging.
    init_tracing(config.log_format);
    info!(
        host = %config.server.host,
        port = config.server.port,
        max_connections = config.postgres.max_connections,
        shutdown_timeout_secs = config.shutdown_timeout.as_secs(),
        "pokedex-server starting"
    );

    let lifecycle = Lifecycle::new();

    // Translate signals into a drain. Repeat signals are logged only.
    let signals = {
        let lifecycle = lifecycle.clone();
        tokio::spawn(async move {
            loop {
                shutdown_signal().await;
                if lifecycle.begin_draining() {
                    info!("Shutdown requested, draining");
                } else {
                    warn!(phase = %lifecycle.phase(), "Shutdown already in progress");
                }
            }
        })
    };

    // 3-7. Connect, bootstrap, serve, drain, close.
    let result = service::run(&config, &lifecycle).await;
    signals.abort();

    result?;
    info!("Shutdown complete");
    Ok(())
}
/// Install the global tracing subscriber.
///
/// The filter comes from `RUST_LOG` and defaults to `info`.
fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    match format {
        LogFormat::Pretty => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}
