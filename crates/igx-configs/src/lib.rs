//! # igx-configs
//!
//! Layered runtime settings: built-in defaults, then `.env`, then `IGX_*`
//! environment variables (e.g. `IGX_DATABASE_URL`, `IGX_SESSION_SECRET`).

use std::path::{Path, PathBuf};

use config::{Config, Environment};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;

/// Loads the nearest `.env` into the process environment, returning its path.
///
/// Runs before logging is initialised, so `RUST_LOG` may come from the file.
/// Variables already set in the environment are not overridden.
pub fn load_dotenv() -> Option<PathBuf> {
    dotenvy::dotenv().ok()
}

/// Like [`load_dotenv`], for the `.env` file in `dir`.
pub fn load_dotenv_from(dir: &Path) -> Option<PathBuf> {
    let path = dir.join(".env");
    dotenvy::from_path(&path).ok().map(|()| path)
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load settings: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid setting `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Process-wide settings for the IGX binary.
#[derive(Debug)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    /// sqlx connection string, e.g. `sqlite:igx.db` or `sqlite::memory:`
    pub database_url: String,
    /// Key for signing session cookies
    pub session_secret: SecretString,
    /// Directory served under `/static`
    pub static_dir: String,
}

#[derive(Deserialize)]
struct RawSettings {
    host: String,
    port: u16,
    database_url: String,
    #[serde(default)]
    session_secret: String,
    static_dir: String,
}

impl Settings {
    /// Reads `IGX_*` variables from the environment. Call [`load_dotenv`] first
    /// for `.env` values to be seen.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_source(Environment::with_prefix("IGX").try_parsing(true))
    }

    /// Builds settings from an arbitrary source layered over the defaults.
    pub fn from_source<S>(source: S) -> Result<Self, ConfigError>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let raw: RawSettings = Config::builder()
            .set_default("host", "127.0.0.1")?
            .set_default("port", 8080)?
            .set_default("database_url", "sqlite:igx.db")?
            .set_default("static_dir", "./static")?
            .add_source(source)
            .build()?
            .try_deserialize()?;

        let settings = Settings {
            host: raw.host,
            port: raw.port,
            database_url: raw.database_url,
            session_secret: SecretString::from(raw.session_secret),
            static_dir: raw.static_dir,
        };
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::Invalid {
                field: "port",
                reason: "must be non-zero".to_string(),
            });
        }
        if self.database_url.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "database_url",
                reason: "must not be empty".to_string(),
            });
        }
        if self.session_secret.expose_secret().len() < 16 {
            return Err(ConfigError::Invalid {
                field: "session_secret",
                reason: "must be at least 16 bytes".to_string(),
            });
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }
}
