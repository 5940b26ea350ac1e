//! Client configuration.
//!
//! Settings are read from `{config_dir}/postline/config.json` when present and
//! then overridden from the environment: `PUBLIC_BACKEND_URL` first, then
//! `LOCAL_BACKEND_URL`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Backend used when neither the file nor the environment names one.
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:5000";

/// Environment variables consulted for the backend, highest priority first.
pub const BACKEND_ENV_VARS: [&str; 2] = ["PUBLIC_BACKEND_URL", "LOCAL_BACKEND_URL"];

/// Largest accepted expiry leeway, in seconds (one day).
pub const MAX_EXPIRY_LEEWAY_SECS: i64 = 86_400;

/// Client settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the messaging backend.
    pub backend_url: String,
    /// Transport timeout for a single request, in seconds.
    pub request_timeout_secs: u64,
    /// A token expiring within this many seconds is treated as expired.
    pub expiry_leeway_secs: i64,
    /// Keyring service name credentials are filed under.
    pub keyring_service: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            request_timeout_secs: 30,
            expiry_leeway_secs: 0,
            keyring_service: "postline".to_string(),
        }
    }
}

impl Config {
    /// Returns the default config file location.
    #[must_use]
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("postline")
            .join("config.json")
    }

    /// Loads the config from the default location and the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be read or parsed,
    /// or the resulting settings are unusable.
    pub async fn load() -> Result<Self> {
        Self::load_with_env(&Self::default_path()).await
    }

    /// Loads the config from `path`, applies the process environment and
    /// validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed, or
    /// the resulting settings are unusable.
    pub async fn load_with_env(path: &Path) -> Result<Self> {
        let config = Self::load_from(path)
            .await?
            .with_env(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    /// Loads the config from a file, falling back to defaults if it is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No config file at {}", path.display());
            return Ok(Self::default());
        }

        let contents = tokio::fs::read_to_string(path).await?;
        let config = serde_json::from_str(&contents)?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Saves the config as pretty JSON, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub async fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }

        let contents = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, contents).await?;

        info!("Config saved to {}", path.display());
        Ok(())
    }

    /// Rewrites the file at `path` with its own settings and defaults for
    /// anything it leaves out. Environment overrides are never written.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or written.
    pub async fn write_file_settings(path: &Path) -> Result<Self> {
        let config = Self::load_from(path).await?;
        config.save_to(path).await?;
        Ok(config)
    }

    /// Applies backend overrides from an environment lookup.
    #[must_use]
    pub fn with_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = BACKEND_ENV_VARS
            .iter()
            .filter_map(|&name| lookup(name))
            .find(|value| !value.trim().is_empty())
        {
            debug!("Backend URL taken from environment: {url}");
            self.backend_url = url;
        }
        self
    }

    /// Checks that the settings are usable.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend URL is not http(s), the timeout is zero,
    /// or the expiry leeway exceeds [`MAX_EXPIRY_LEEWAY_SECS`].
    pub fn validate(&self) -> Result<()> {
        let url = self.backend_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(Error::Config(format!(
                "backend_url must be an http(s) URL, got {url:?}"
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(Error::Config(
                "request_timeout_secs must be greater than zero".into(),
            ));
        }
        if self.expiry_leeway_secs > MAX_EXPIRY_LEEWAY_SECS {
            return Err(Error::Config(format!(
                "expiry_leeway_secs must be at most {MAX_EXPIRY_LEEWAY_SECS}, got {}",
                self.expiry_leeway_secs
            )));
        }
        Ok(())
    }

    /// Joins an API path onto the backend URL.
    #[must_use]
    pub fn api_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.backend_url.trim().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Returns the request timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Returns the expiry leeway, clamped to `0..=MAX_EXPIRY_LEEWAY_SECS`.
    #[must_use]
    pub fn expiry_leeway(&self) -> chrono::Duration {
        chrono::Duration::try_seconds(self.expiry_leeway_secs.clamp(0, MAX_EXPIRY_LEEWAY_SECS))
            .unwrap_or_else(chrono::Duration::zero)
    }
}
