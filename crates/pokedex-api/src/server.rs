//! API server lifecycle management.
//!
//! [`bind`] claims the TCP port, [`serve`] runs the router until a
//! shutdown future resolves, and [`serve_until_drained`] ties serving to
//! the process [`Lifecycle`]: once the phase reaches `Draining` no new
//! connections are accepted and in-flight requests get a bounded grace
//! period to finish.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use pokedex_core::Lifecycle;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::router::build_router;
use crate::state::AppState;

/// Configuration for the API server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// The host address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// The TCP port to listen on.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: String::from("0.0.0.0"),
            port: 4000,
        }
    }
}

/// Errors that can occur when starting or running the API server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Failed to bind to the network address.
    #[error("bind error: {0}")]
    Bind(String),

    /// The server encountered a fatal error while serving.
    #[error("serve error: {0}")]
    Serve(String),

    /// The serving task panicked or was cancelled.
    #[error("server task error: {0}")]
    Task(String),
}

/// Bind a TCP listener for the configured address.
///
/// # Errors
///
/// Returns [`ServerError::Bind`] if the address is invalid or in use.
pub async fn bind(config: &ServerConfig) -> Result<TcpListener, ServerError> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| ServerError::Bind(format!("invalid address: {e}")))?;

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| ServerError::Bind(format!("bind failed on {addr}: {e}")))?;

    Ok(listener)
}

/// Serve the API on `listener` until `shutdown` resolves, then wait for
/// open connections to finish.
///
/// # Errors
///
/// Returns [`ServerError::Serve`] if the server hits a fatal I/O error.
pub async fn serve<F>(
    listener: TcpListener,
    state: Arc<AppState>,
    shutdown: F,
) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let router = build_router(state);

    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "API server listening");
    }

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| ServerError::Serve(format!("serve error: {e}")))?;

    info!("API server stopped accepting connections");
    Ok(())
}

/// Serve until the lifecycle in `state` reaches `Draining`, allowing
/// in-flight requests at most `grace` to complete.
///
/// When the grace period elapses the serving task is aborted and the
/// function returns normally so shutdown can proceed; connections still
/// open at that point end with the runtime.
///
/// # Errors
///
/// Returns [`ServerError`] if serving fails before a drain was requested.
pub async fn serve_until_drained(
    listener: TcpListener,
    state: Arc<AppState>,
    grace: Duration,
) -> Result<(), ServerError> {
    let lifecycle: Lifecycle = state.lifecycle.clone();
    let shutdown = {
        let lifecycle = lifecycle.clone();
        async move { lifecycle.drained().await }
    };

    let mut server = tokio::spawn(serve(listener, state, shutdown));

    let joined = tokio::select! {
        joined = &mut server => joined,
        () = lifecycle.drained() => {
            info!(grace_ms = grace.as_millis(), "Draining in-flight requests");
            if let Ok(joined) = tokio::time::timeout(grace, &mut server).await {
                joined
            } else {
                warn!(
                    grace_ms = grace.as_millis(),
                    "Drain grace period elapsed, abandoning in-flight requests"
                );
                server.abort();
                return Ok(());
            }
        }
    };

    joined.map_err(|e| ServerError::Task(e.to_string()))?
}
