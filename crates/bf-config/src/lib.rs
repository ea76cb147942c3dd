//! # bf-config
//!
//! Layered settings for the birdfeed binary: built-in defaults, then an
//! optional `birdfeed.toml`, then `BIRDFEED__SECTION__KEY` environment
//! variables (a `.env` file is loaded first).

use bf_core::clock::ClockScope;
use bf_core::models::FeedLimits;
use config::{Config, ConfigBuilder, Environment, File};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// e.g. `sqlite:birdfeed.db` or `sqlite::memory:`
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct AuthSettings {
    pub jwt_secret: SecretString,
    pub token_ttl_secs: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClockSettings {
    pub scope: ClockScope,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub auth: AuthSettings,
    pub feed: FeedLimits,
    pub clock: ClockSettings,
}

impl Settings {
    /// Reads `.env`, `birdfeed.toml` and the environment on top of the defaults.
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = dotenvy::dotenv() {
            log::debug!("loaded environment from {}", path.display());
        }

        let config = Self::defaults()?
            .add_source(File::with_name("birdfeed").required(false))
            .add_source(
                Environment::with_prefix("BIRDFEED")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        Self::from_config(config)
    }

    /// Every key except `auth.jwt_secret`, which has no safe default.
    pub fn defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, SettingsError> {
        let limits = FeedLimits::default();
        Ok(Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("database.url", "sqlite:birdfeed.db")?
            .set_default("auth.token_ttl_secs", 3600)?
            .set_default("feed.default_limit", limits.default_limit as u64)?
            .set_default("feed.max_limit", limits.max_limit as u64)?
            .set_default("clock.scope", ClockScope::default().to_string())?)
    }

    pub fn from_config(config: Config) -> Result<Self, SettingsError> {
        let settings: Settings = config.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), SettingsError> {
        if self.auth.jwt_secret.expose_secret().is_empty() {
            return Err(SettingsError::Invalid("auth.jwt_secret must not be empty".into()));
        }
        if self.auth.token_ttl_secs <= 0 {
            return Err(SettingsError::Invalid("auth.token_ttl_secs must be positive".into()));
        }
        if self.feed.max_limit == 0 {
            return Err(SettingsError::Invalid("feed.max_limit must be positive".into()));
        }
        if self.feed.default_limit > self.feed.max_limit {
            return Err(SettingsError::Invalid(format!(
                "feed.default_limit ({}) exceeds feed.max_limit ({})",
                self.feed.default_limit, self.feed.max_limit
            )));
        }
        Ok(())
    }

    pub fn bind_address(&self) -> (String, u16) {
        (self.server.host.clone(), self.server.port)
    }
}
