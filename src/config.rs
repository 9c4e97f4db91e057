use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::{ilog_debug, Error, Result};

pub const DEFAULT_SERVER_URL: &str = "http://localhost:5000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    /// Base URL of the transformation backend, without the `/api` suffix.
    pub server_url: Option<String>,
    /// Whole-request timeout for backend calls.
    pub timeout_secs: Option<u64>,
}

impl Config {
    pub fn app_dir() -> Result<PathBuf> {
        Ok(dirs::home_dir().ok_or(Error::NoHomeDir)?.join(".imagetext"))
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::app_dir()?.join("config.toml"))
    }

    pub fn effective_server_url(&self) -> &str {
        self.server_url
            .as_deref()
            .map(|url| url.trim_end_matches('/'))
            .filter(|url| !url.is_empty())
            .unwrap_or(DEFAULT_SERVER_URL)
    }

    pub fn effective_timeout(&self) -> Duration {
        Duration::from_secs(
            self.timeout_secs
                .filter(|secs| *secs > 0)
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
        )
    }

    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        ilog_debug!("Config::load path={}", path.display());
        if !path.exists() {
            ilog_debug!("Config file not found, using defaults");
            return Ok(Self::default());
        }
        let config: Self = toml::from_str(&fs::read_to_string(&path)?)?;
        ilog_debug!(
            "Config loaded: server_url={:?}, timeout_secs={:?}",
            config.server_url,
            config.timeout_secs
        );
        Ok(config)
    }

    /// Load the file config under a `--server` override. Without a home
    /// directory an explicit server is still enough to run.
    pub fn load_with_server(server_url: Option<String>) -> Result<Self> {
        Self::or_default_for(Self::load(), server_url)
    }

    fn or_default_for(loaded: Result<Self>, server_url: Option<String>) -> Result<Self> {
        let config = match loaded {
            Err(Error::NoHomeDir) if server_url.is_some() => {
                ilog_debug!("No home directory, using defaults with --server");
                Self::default()
            }
            other => other?,
        };
        Ok(config.with_overrides(server_url, None))
    }

    pub fn save(&self) -> Result<()> {
        let app_dir = Self::app_dir()?;
        if !app_dir.exists() {
            ilog_debug!("Creating app directory: {}", app_dir.display());
            fs::create_dir_all(&app_dir)?;
        }
        let path = Self::config_path()?;
        fs::write(&path, toml::to_string_pretty(self)?)?;
        ilog_debug!("Config saved to {}", path.display());
        Ok(())
    }

    /// Apply command-line overrides on top of the file values.
    pub fn with_overrides(mut self, server_url: Option<String>, timeout_secs: Option<u64>) -> Self {
        if server_url.is_some() {
            self.server_url = server_url;
        }
        if timeout_secs.is_some() {
            self.timeout_secs = timeout_secs;
        }
        self
    }
}
