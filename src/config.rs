use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} must be {expected}, got '{value}'")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Redis,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "redis" => Ok(StoreBackend::Redis),
            "memory" => Ok(StoreBackend::Memory),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub redis_url: String,
    pub backend: StoreBackend,
    pub request_timeout: Duration,
    pub list_page_size: u64,
}

impl Config {
    /// Reads the process environment. Call `dotenvy::dotenv()` first to pick
    /// up a `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

        let port = get("PORT", "8080");
        let port = port.parse::<u16>().map_err(|_| ConfigError::Invalid {
            name: "PORT",
            expected: "a valid port number",
            value: port,
        })?;

        let backend = get("STORE_BACKEND", "redis");
        let backend = backend.parse::<StoreBackend>().map_err(|_| ConfigError::Invalid {
            name: "STORE_BACKEND",
            expected: "'redis' or 'memory'",
            value: backend,
        })?;

        let timeout_ms = get("REQUEST_TIMEOUT_MS", "5000");
        let timeout_ms = match timeout_ms.parse::<u64>() {
            Ok(ms) if ms > 0 => ms,
            _ => {
                return Err(ConfigError::Invalid {
                    name: "REQUEST_TIMEOUT_MS",
                    expected: "a positive number of milliseconds",
                    value: timeout_ms,
                })
            }
        };

        let page_size = get("LIST_PAGE_SIZE", "5");
        let list_page_size = match page_size.parse::<u64>() {
            Ok(n) if n > 0 => n,
            _ => {
                return Err(ConfigError::Invalid {
                    name: "LIST_PAGE_SIZE",
                    expected: "a positive integer",
                    value: page_size,
                })
            }
        };

        Ok(Self {
            host: get("HOST", "0.0.0.0"),
            port,
            redis_url: get("REDIS_URL", "redis://127.0.0.1:6379"),
            backend,
            request_timeout: Duration::from_millis(timeout_ms),
            list_page_size,
        })
    }
}
