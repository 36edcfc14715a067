//! Error types for the capture service binary.
//!
//! [`ServiceError`] is the top-level error type that wraps all possible
//! failure modes during startup and shutdown. Any of them makes the
//! process exit with a non-zero status.

/// Errors raised while reading the environment.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required variable is unset or empty.
    #[error("missing required env var {0}")]
    Missing(&'static str),

    /// A variable is set but cannot be parsed.
    #[error("invalid {name}: {reason}")]
    Invalid {
        /// The variable name.
        name: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

/// Top-level error for the capture service binary.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: ConfigError,
    },

    /// The database could not be reached.
    #[error("database connection error: {source}")]
    Connect {
        /// The underlying database error.
        source: pokedex_db::DbError,
    },

    /// The schema could not be created. The server never started.
    #[error("schema bootstrap failed: {source}")]
    Bootstrap {
        /// The underlying database error.
        source: pokedex_db::DbError,
    },

    /// The HTTP server failed to bind or serve.
    #[error("server error: {source}")]
    Server {
        /// The underlying server error.
        #[from]
        source: pokedex_api::ServerError,
    },

    /// A lifecycle transition was rejected.
    #[error("lifecycle error: {source}")]
    Lifecycle {
        /// The underlying lifecycle error.
        #[from]
        source: pokedex_core::LifecycleError,
    },
}
