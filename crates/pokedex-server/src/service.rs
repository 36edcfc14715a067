//! Startup and shutdown sequence of the capture service.
//!
//! [`run`] owns everything between "configuration loaded" and "process
//! may exit". Draining is requested through the [`Lifecycle`] handle, so
//! the signal watcher in `main` and tests drive it the same way.

use std::sync::Arc;

use pokedex_api::AppState;
use pokedex_core::{CaptureEngine, Lifecycle, LifecyclePhase};
use pokedex_db::{CaptureStore, PostgresPool};
use tracing::{error, info, warn};

use crate::config::ServiceConfig;
use crate::error::ServiceError;

/// Connect, bootstrap, serve until draining, then release resources.
///
/// The lifecycle ends in `Stopped` on every path that returns.
///
/// # Errors
///
/// Returns [`ServiceError::Connect`] or [`ServiceError::Bootstrap`] if the
/// store cannot be prepared (nothing is bound in that case), and
/// [`ServiceError::Server`] if binding or serving fails.
pub async fn run(config: &ServiceConfig, lifecycle: &Lifecycle) -> Result<(), ServiceError> {
    let pool = match PostgresPool::connect(&config.postgres).await {
        Ok(pool) => pool,
        Err(source) => {
            error!(error = %source, "Failed to connect to PostgreSQL");
            lifecycle.transition(LifecyclePhase::Stopped)?;
            return Err(ServiceError::Connect { source });
        }
    };

    run_with_pool(config, lifecycle, pool).await
}

/// [`run`] against an already constructed pool.
pub async fn run_with_pool(
    config: &ServiceConfig,
    lifecycle: &Lifecycle,
    pool: PostgresPool,
) -> Result<(), ServiceError> {
    // Bootstrap the schema before accepting any request.
    if let Err(source) = pool.bootstrap().await {
        error!(error = %source, "Schema bootstrap failed, refusing to serve");
        pool.close(config.shutdown_timeout).await;
        lifecycle.transition(LifecyclePhase::Stopped)?;
        return Err(ServiceError::Bootstrap { source });
    }
    info!("Schema ready");

    let listener = match pokedex_api::bind(&config.server).await {
        Ok(listener) => listener,
        Err(e) => {
            pool.close(config.shutdown_timeout).await;
            lifecycle.transition(LifecyclePhase::Stopped)?;
            return Err(e.into());
        }
    };

    let store = Arc::new(CaptureStore::new(pool.pool().clone()));
    let state = Arc::new(AppState::new(
        CaptureEngine::new(store),
        lifecycle.clone(),
    ));
    lifecycle.transition(LifecyclePhase::Serving)?;
    info!("Accepting requests");

    let served = pokedex_api::serve_until_drained(listener, state, config.shutdown_timeout).await;
    if let Err(e) = &served {
        error!(error = %e, "Server stopped unexpectedly");
    }

    // Requests first, then connections.
    lifecycle.begin_draining();
    if !pool.close(config.shutdown_timeout).await {
        warn!("Connection pool did not close cleanly");
    }
    lifecycle.transition(LifecyclePhase::Stopped)?;

    served?;
    Ok(())
}
