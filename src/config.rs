use std::env;
use std::time::Duration;

pub const DEFAULT_EXCHANGE_API_BASE_URL: &str = "https://v6.exchangerate-api.com/v6";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
}

/// Settings resolved once at startup and handed to the services.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    /// `None` keeps the server up; conversions then fail with a configuration error.
    pub exchange_api_key: Option<String>,
    pub exchange_api_base_url: String,
    pub exchange_api_timeout: Duration,
    pub bind_addr: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let exchange_api_key = lookup("EXCHANGE_API_KEY")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        let exchange_api_base_url = lookup("EXCHANGE_API_BASE_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_EXCHANGE_API_BASE_URL.to_string());

        let exchange_api_timeout = match lookup("EXCHANGE_API_TIMEOUT_SECS") {
            Some(raw) => {
                let secs = raw
                    .trim()
                    .parse::<u64>()
                    .ok()
                    .filter(|s| *s > 0)
                    .ok_or_else(|| ConfigError::Invalid {
                        var: "EXCHANGE_API_TIMEOUT_SECS",
                        value: raw.clone(),
                    })?;
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        let bind_addr = lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());

        Ok(Self {
            database_url,
            exchange_api_key,
            exchange_api_base_url,
            exchange_api_timeout,
            bind_addr,
        })
    }
}
