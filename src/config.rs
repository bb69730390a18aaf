//! Configuration management for the lending server

use chrono::Duration;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

/// Longest accepted session lifetime (one year)
pub const MAX_SESSION_TTL_HOURS: u64 = 24 * 366;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AuthConfig {
    /// Name of the session cookie
    pub session_cookie: String,
    pub session_ttl_hours: u64,
    /// Add the `Secure` attribute to the session cookie
    pub secure_cookie: bool,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// `pretty` or `json`
    pub format: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StoreConfig {
    /// Load a handful of sample books at startup
    pub seed_sample_books: bool,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

impl AppConfig {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let config = Config::builder()
            // Start with default configuration
            .add_source(File::with_name("config/default").required(false))
            // Layer on the environment-specific file
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add environment variables (with prefix LENDING_), e.g. LENDING_SERVER__PORT
            .add_source(
                Environment::with_prefix("LENDING")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("server.port", env::var("PORT").ok())?
            .build()?;

        let config: AppConfig = config.try_deserialize()?;
        config.check()?;
        Ok(config)
    }

    /// Reject values the server cannot work with
    pub fn check(&self) -> Result<(), ConfigError> {
        if self.auth.session_ttl_hours > MAX_SESSION_TTL_HOURS {
            return Err(ConfigError::Message(format!(
                "auth.session_ttl_hours must be at most {} (got {})",
                MAX_SESSION_TTL_HOURS, self.auth.session_ttl_hours
            )));
        }
        Ok(())
    }
}

impl AuthConfig {
    /// Session lifetime, capped at [`MAX_SESSION_TTL_HOURS`]
    pub fn session_ttl(&self) -> Duration {
        Duration::hours(self.session_ttl_hours.min(MAX_SESSION_TTL_HOURS) as i64)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_cookie: "sid".to_string(),
            session_ttl_hours: 24,
            secure_cookie: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            seed_sample_books: true,
        }
    }
}
