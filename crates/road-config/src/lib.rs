//! # road-config
//!
//! Layered configuration loading for Roadtrack using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`ROADTRACK_*` prefix, `__` as separator)
//! 2. Working-directory `roadtrack.toml`
//! 3. User-level `~/.config/roadtrack/config.toml`
//! 4. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! Figment maps `ROADTRACK_AUTH__JWT_SECRET` -> `auth.jwt_secret`,
//! `ROADTRACK_REALTIME__HEARTBEAT_INTERVAL_SECS` -> `realtime.heartbeat_interval_secs`, etc.
//!
//! # Usage
//!
//! ```no_run
//! use road_config::RoadConfig;
//!
//! let config = RoadConfig::load_with_dotenv().expect("config");
//! config.validate_for_serve().expect("serveable");
//! println!("listening on {}", config.server.bind);
//! ```

mod auth;
mod database;
mod error;
mod realtime;
mod server;
mod uploads;

pub use auth::AuthConfig;
pub use database::DatabaseConfig;
pub use error::ConfigError;
pub use realtime::RealtimeConfig;
pub use server::ServerConfig;
pub use uploads::UploadConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// File name of the working-directory config file.
pub const LOCAL_CONFIG_FILE: &str = "roadtrack.toml";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RoadConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub uploads: UploadConfig,
    #[serde(default)]
    pub realtime: RealtimeConfig,
}

impl RoadConfig {
    /// Load configuration from all sources (TOML files + environment variables).
    ///
    /// Does NOT call `dotenvy`; use [`Self::load_with_dotenv`] for `.env` support.
    pub fn load() -> Result<Self, ConfigError> {
        Self::figment().extract().map_err(ConfigError::from)
    }

    /// Load configuration after reading a `.env` file from the current
    /// directory, if one exists. Variables already set in the process win.
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::load()
    }

    /// Build the figment provider chain.
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        let local_path = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        figment.merge(Env::prefixed("ROADTRACK_").split("__"))
    }

    /// Path to the user-global config file.
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("roadtrack").join("config.toml"))
    }

    /// Checks required before the HTTP server starts.
    ///
    /// # Errors
    ///
    /// `NotConfigured` when no JWT secret is set, `InvalidValue` for any
    /// out-of-range value.
    pub fn validate_for_serve(&self) -> Result<(), ConfigError> {
        if !self.auth.is_configured() {
            return Err(ConfigError::NotConfigured {
                section: "auth".into(),
            });
        }
        if self.auth.token_ttl_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "auth.token_ttl_secs".into(),
                reason: "must be greater than zero".into(),
            });
        }
        if !self.server.upload_base_path.starts_with('/') {
            return Err(ConfigError::InvalidValue {
                field: "server.upload_base_path".into(),
                reason: "must start with '/'".into(),
            });
        }
        if self.uploads.max_bytes == 0 {
            return Err(ConfigError::InvalidValue {
                field: "uploads.max_bytes".into(),
                reason: "must be greater than zero".into(),
            });
        }
        self.realtime.validate()
    }
}
