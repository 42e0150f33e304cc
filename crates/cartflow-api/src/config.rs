//! Server configuration read from the environment.

use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::AppError;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// Where events and read models are kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    /// Process memory; lost on restart.
    Memory,
    /// One JSON-lines file per cart under `dir`. Read models stay in memory.
    File {
        /// Directory holding the stream files.
        dir: PathBuf,
    },
    /// PostgreSQL for both events and read models.
    Postgres {
        /// Connection string.
        url: String,
        /// Pool size.
        max_connections: u32,
    },
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Memory => "memory",
            Self::File { .. } => "file",
            Self::Postgres { .. } => "postgres",
        })
    }
}

/// Configuration for the API server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Interface to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
    /// Event store backing.
    pub backend: StoreBackend,
    /// OTLP collector endpoint; spans are only exported when set.
    pub otlp_endpoint: Option<String>,
}

impl AppConfig {
    /// Reads the configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a variable is missing or malformed.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`, which maps a variable name
    /// to its value.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a variable is missing or malformed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let host = lookup("HOST").unwrap_or_else(|| DEFAULT_HOST.to_owned());
        let port = parse_or(&lookup, "PORT", DEFAULT_PORT)?;

        let backend = match lookup("EVENT_STORE").as_deref().unwrap_or("memory") {
            "memory" => StoreBackend::Memory,
            "file" => StoreBackend::File {
                dir: lookup("EVENT_LOG_DIR")
                    .map(PathBuf::from)
                    .ok_or_else(|| missing("EVENT_LOG_DIR", "file"))?,
            },
            "postgres" => StoreBackend::Postgres {
                url: lookup("DATABASE_URL").ok_or_else(|| missing("DATABASE_URL", "postgres"))?,
                max_connections: parse_or(
                    &lookup,
                    "DATABASE_MAX_CONNECTIONS",
                    DEFAULT_MAX_CONNECTIONS,
                )?,
            },
            other => {
                return Err(AppError::Config(format!(
                    "EVENT_STORE must be one of memory, file, postgres (got {other:?})"
                )));
            }
        };

        Ok(Self {
            host,
            port,
            backend,
            otlp_endpoint: lookup("OTEL_EXPORTER_OTLP_ENDPOINT").filter(|v| !v.is_empty()),
        })
    }

    /// The socket address to listen on.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `HOST:PORT` is not a socket address.
    pub fn bind_addr(&self) -> Result<SocketAddr, AppError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))
    }
}

fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .parse()
            .map_err(|e| AppError::Config(format!("{key} is invalid: {e}"))),
        None => Ok(default),
    }
}

fn missing(key: &str, backend: &str) -> AppError {
    AppError::Config(format!(
        "{key} environment variable must be set when EVENT_STORE={backend}"
    ))
}
