//! Runtime configuration read from the environment.

use std::time::Duration;

/// Environment variable for the Postgres connection string.
pub const DATABASE_URL_ENV_VAR: &str = "DATABASE_URL";
/// Environment variable that switches database access on or off.
pub const BACKEND_ENABLED_ENV_VAR: &str = "REGISTRATION_BACKEND_ENABLED";
/// Environment variable for the number of connection attempts.
pub const CONNECT_RETRIES_ENV_VAR: &str = "REGISTRATION_CONNECT_RETRIES";
/// Environment variable for the base retry delay in milliseconds.
pub const RETRY_DELAY_ENV_VAR: &str = "REGISTRATION_RETRY_DELAY_MS";
/// Environment variable for the tracing filter.
pub const LOG_ENV_VAR: &str = "REGISTRATION_LOG";

const DEFAULT_CONNECT_RETRIES: u32 = 3;
const DEFAULT_RETRY_DELAY_MS: u64 = 500;

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{var} must be a boolean, got {value:?}")]
    InvalidBool { var: &'static str, value: String },
    #[error("{var} must be a non-negative integer, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },
    #[error("{0} must be set to reach the registration database")]
    MissingDatabaseUrl(&'static str),
    #[error("backend access is disabled ({0}=false); pass CSV input instead")]
    BackendDisabled(&'static str),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub database_url: Option<String>,
    pub backend_enabled: bool,
    pub connect_retries: u32,
    pub retry_delay: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: None,
            backend_enabled: true,
            connect_retries: DEFAULT_CONNECT_RETRIES,
            retry_delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config {
            database_url: lookup(DATABASE_URL_ENV_VAR).filter(|url| !url.trim().is_empty()),
            ..Config::default()
        };

        if let Some(value) = lookup(BACKEND_ENABLED_ENV_VAR) {
            config.backend_enabled = parse_bool(BACKEND_ENABLED_ENV_VAR, &value)?;
        }
        if let Some(value) = lookup(CONNECT_RETRIES_ENV_VAR) {
            config.connect_retries = parse_number(CONNECT_RETRIES_ENV_VAR, &value)? as u32;
        }
        if let Some(value) = lookup(RETRY_DELAY_ENV_VAR) {
            config.retry_delay = Duration::from_millis(parse_number(RETRY_DELAY_ENV_VAR, &value)?);
        }

        Ok(config)
    }

    /// Connection string for database-backed commands.
    pub fn database_url(&self) -> Result<&str, ConfigError> {
        if !self.backend_enabled {
            return Err(ConfigError::BackendDisabled(BACKEND_ENABLED_ENV_VAR));
        }
        self.database_url
            .as_deref()
            .ok_or(ConfigError::MissingDatabaseUrl(DATABASE_URL_ENV_VAR))
    }

    /// Delay before retry `attempt` (1-based); grows linearly.
    pub fn retry_delay_for(&self, attempt: u32) -> Duration {
        self.retry_delay * attempt
    }
}

fn parse_bool(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidBool {
            var,
            value: value.to_string(),
        }),
    }
}

fn parse_number(var: &'static str, value: &str) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse::<u64>()
        .ok()
        .filter(|n| *n <= u64::from(u32::MAX))
        .ok_or_else(|| ConfigError::InvalidNumber {
            var,
            value: value.to_string(),
        })
}
