//! Configuration types for the capture service.
//!
//! All configuration is loaded from environment variables. The only
//! required variable is `DATABASE_URL`; everything else has a default.

use std::time::Duration;

use pokedex_api::ServerConfig;
use pokedex_db::PostgresConfig;

use crate::error::ConfigError;

/// Default TCP port.
const DEFAULT_PORT: u16 = 4000;

/// Default bind address.
const DEFAULT_HOST: &str = "0.0.0.0";

/// Default bound on draining requests and closing the pool, in seconds.
const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 10;

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Complete service configuration loaded from the environment.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// HTTP bind address.
    pub server: ServerConfig,
    /// Connection pool settings.
    pub postgres: PostgresConfig,
    /// Bound on each shutdown step (request drain, pool close).
    pub shutdown_timeout: Duration,
    /// Log output format.
    pub log_format: LogFormat,
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    ///
    /// Required variables:
    /// - `DATABASE_URL` -- `PostgreSQL` connection string
    ///
    /// Optional variables:
    /// - `HOST` -- bind address (default `0.0.0.0`)
    /// - `PORT` -- TCP port (default 4000)
    /// - `DB_MAX_CONNECTIONS` -- pool size (default 10)
    /// - `DB_ACQUIRE_TIMEOUT_MS` -- wait for a free connection (default 5000)
    /// - `DB_IDLE_TIMEOUT_SECS` -- idle connection lifetime (default 300)
    /// - `DB_STATEMENT_TIMEOUT_MS` -- server-side statement timeout (default unset)
    /// - `SHUTDOWN_TIMEOUT_SECS` -- bound on drain and pool close (default 10)
    /// - `LOG_FORMAT` -- `pretty` or `json` (default `pretty`)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|url| !url.trim().is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let host = lookup("HOST").unwrap_or_else(|| DEFAULT_HOST.to_owned());
        let port: u16 = parse_or(&lookup, "PORT", DEFAULT_PORT)?;

        let defaults = PostgresConfig::new(&database_url);
        let max_connections = parse_or(&lookup, "DB_MAX_CONNECTIONS", defaults.max_connections)?;
        if max_connections == 0 {
            return Err(ConfigError::Invalid {
                name: "DB_MAX_CONNECTIONS",
                reason: String::from("must be at least 1"),
            });
        }
        let acquire_timeout_ms = parse_or(
            &lookup,
            "DB_ACQUIRE_TIMEOUT_MS",
            u64::try_from(defaults.acquire_timeout.as_millis()).unwrap_or(u64::MAX),
        )?;
        let idle_timeout_secs = parse_or(
            &lookup,
            "DB_IDLE_TIMEOUT_SECS",
            defaults.idle_timeout.as_secs(),
        )?;
        let statement_timeout = lookup("DB_STATEMENT_TIMEOUT_MS")
            .map(|raw| parse_value::<u64>("DB_STATEMENT_TIMEOUT_MS", &raw))
            .transpose()?
            .map(Duration::from_millis);

        let shutdown_timeout_secs =
            parse_or(&lookup, "SHUTDOWN_TIMEOUT_SECS", DEFAULT_SHUTDOWN_TIMEOUT_SECS)?;

        let log_format = match lookup("LOG_FORMAT").as_deref().map(str::to_ascii_lowercase) {
            None => LogFormat::default(),
            Some(raw) => match raw.as_str() {
                "pretty" | "text" => LogFormat::Pretty,
                "json" => LogFormat::Json,
                other => {
                    return Err(ConfigError::Invalid {
                        name: "LOG_FORMAT",
                        reason: format!("expected `pretty` or `json`, got `{other}`"),
                    });
                }
            },
        };

        Ok(Self {
            server: ServerConfig { host, port },
            postgres: defaults
                .with_max_connections(max_connections)
                .with_acquire_timeout(Duration::from_millis(acquire_timeout_ms))
                .with_idle_timeout(Duration::from_secs(idle_timeout_secs))
                .with_statement_timeout(statement_timeout),
            shutdown_timeout: Duration::from_secs(shutdown_timeout_secs),
            log_format,
        })
    }
}

/// Parse an optional variable, falling back to `default` when unset.
fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    lookup(name).map_or(Ok(default), |raw| parse_value(name, &raw))
}

fn parse_value<T>(name: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        name,
        reason: e.to_string(),
    })
}
