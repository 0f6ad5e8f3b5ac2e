// Handles configuration loading, saving, and defaults.
use crate::context::AppContext;
use crate::storage::LocalStorage;
use anyhow::{Error, Result};
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Duration;

fn default_backend_url() -> String {
    "http://127.0.0.1:8000".to_string()
}
fn default_request_timeout() -> u64 {
    30
}
fn default_log_level() -> String {
    "warn".to_string()
}
fn default_preview_upcoming() -> usize {
    3
}
fn default_preview_past() -> usize {
    5
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct Config {
    /// Scheme and authority of the REST backend; `/api/...` paths are appended.
    #[serde(default = "default_backend_url")]
    pub backend_url: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Ask the backend to seed demo data after startup.
    #[serde(default)]
    pub seed_on_startup: bool,
    /// Upcoming events shown in preview contexts (home page).
    #[serde(default = "default_preview_upcoming")]
    pub preview_upcoming: usize,
    /// Most recent past events shown in the list view.
    #[serde(default = "default_preview_past")]
    pub preview_past: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: default_backend_url(),
            request_timeout_secs: default_request_timeout(),
            log_level: default_log_level(),
            seed_on_startup: false,
            preview_upcoming: default_preview_upcoming(),
            preview_past: default_preview_past(),
        }
    }
}

impl Config {
    /// Load the configuration from disk using an explicit context.
    /// Returns a contextualized error if reading or parsing fails.
    pub fn load(ctx: &dyn AppContext) -> Result<Self> {
        let path = ctx.get_config_file_path()?;

        // Explicitly detect missing file so callers can fall back to defaults.
        if !path.exists() {
            return Err(anyhow::anyhow!("Config file not found"));
        }

        let contents = fs::read_to_string(&path).map_err(|e| {
            anyhow::anyhow!("Failed to read config file '{}': {}", path.display(), e)
        })?;

        let config: Config = toml::from_str(&contents).map_err(|e| {
            anyhow::anyhow!("Failed to parse config file '{}': {}", path.display(), e)
        })?;

        Ok(config)
    }

    /// Like `load`, but a missing file yields the defaults.
    /// Parse and permission errors are still propagated.
    pub fn load_or_default(ctx: &dyn AppContext) -> Result<Self> {
        match Self::load(ctx) {
            Ok(config) => Ok(config),
            Err(e) if Self::is_missing_config_error(&e) => Ok(Self::default()),
            Err(e) => Err(e),
        }
    }

    /// Helper to detect whether an anyhow::Error indicates that the config file was missing.
    pub fn is_missing_config_error(err: &Error) -> bool {
        if err.to_string().contains("Config file not found") {
            return true;
        }

        // Walk the error chain and look for an underlying IO NotFound.
        for cause in err.chain() {
            if let Some(io_err) = cause.downcast_ref::<std::io::Error>()
                && io_err.kind() == std::io::ErrorKind::NotFound
            {
                return true;
            }
        }

        false
    }

    /// Save configuration using an explicit context.
    pub fn save(&self, ctx: &dyn AppContext) -> Result<()> {
        let path = ctx.get_config_file_path()?;
        LocalStorage::with_lock(&path, || {
            let toml_str = toml::to_string_pretty(self)?;
            LocalStorage::atomic_write(&path, toml_str)?;
            Ok(())
        })?;
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    /// Unknown level names fall back to `Warn`.
    pub fn log_level_filter(&self) -> LevelFilter {
        self.log_level
            .trim()
            .parse::<LevelFilter>()
            .unwrap_or(LevelFilter::Warn)
    }
}
