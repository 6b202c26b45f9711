use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{SessionError, SessionResult};

/// Environment variable overriding `service.api_url`
pub const API_URL_ENV: &str = "VIGIL_API_URL";

/// Violation thresholds, fixed for the life of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Per-bucket limit for fullscreen exits, F11 presses, right clicks and
    /// consecutive suspicious frames
    pub normal: u32,
    /// Limit on escape-class signals; crossing it halts regardless of buckets
    pub escape_bypass: u32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            normal: 3,
            escape_bypass: 10,
        }
    }
}

/// Where the classification and quiz services live
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub api_url: String,
    pub request_timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            api_url: String::from("http://localhost:8000"),
            request_timeout_secs: 10,
        }
    }
}

impl ServiceConfig {
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Monitor configuration, usually read from `config.toml`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub duration_seconds: u32,
    pub sample_interval_secs: u64,
    pub quiz_id: u64,
    pub thresholds: Thresholds,
    pub service: ServiceConfig,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            duration_seconds: 1800, // 30 minutes
            sample_interval_secs: 5,
            quiz_id: 1,
            thresholds: Thresholds::default(),
            service: ServiceConfig::default(),
        }
    }
}

impl MonitorConfig {
    /// Load configuration from `path`, or from the default location.
    ///
    /// A missing file yields the defaults. `VIGIL_API_URL` overrides the
    /// service URL either way.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed,
    /// or if the default config directory cannot be determined.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => default_config_path()?,
        };

        let config = if path.exists() {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            let config = Self::from_toml_str(&raw)
                .with_context(|| format!("Invalid config file {}", path.display()))?;
            log::debug!("Loaded config from {}", path.display());
            config
        } else {
            log::debug!("No config at {}, using defaults", path.display());
            Self::default()
        };

        Ok(config.with_api_url_override(std::env::var(API_URL_ENV).ok()))
    }

    /// Parse configuration from TOML text
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML for this schema.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Render as TOML
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Replace the service URL when an override is present and non-empty
    #[must_use]
    pub fn with_api_url_override(mut self, api_url: Option<String>) -> Self {
        if let Some(url) = api_url.filter(|u| !u.trim().is_empty()) {
            self.service.api_url = url;
        }
        self
    }

    /// Reject configurations the monitor cannot run with
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Config`] for zero thresholds, a zero
    /// duration or a zero sampling interval.
    pub fn validate(&self) -> SessionResult<()> {
        if self.duration_seconds == 0 {
            return Err(SessionError::Config("duration_seconds must be > 0".into()));
        }
        if self.sample_interval_secs == 0 {
            return Err(SessionError::Config(
                "sample_interval_secs must be > 0".into(),
            ));
        }
        if self.thresholds.normal == 0 || self.thresholds.escape_bypass == 0 {
            return Err(SessionError::Config("thresholds must be > 0".into()));
        }
        Ok(())
    }

    #[must_use]
    pub fn sample_interval(&self) -> Duration {
        Duration::from_secs(self.sample_interval_secs)
    }
}

/// Get the config directory for vigil.
///
/// # Errors
///
/// Returns an error if the config directory cannot be determined.
pub fn get_config_dir() -> Result<PathBuf> {
    let mut path = dirs::config_dir().ok_or_else(|| anyhow::anyhow!("Failed to get config dir"))?;
    path.push("vigil");
    Ok(path)
}

/// Default location of `config.toml`
///
/// # Errors
///
/// Returns an error if the config directory cannot be determined.
pub fn default_config_path() -> Result<PathBuf> {
    Ok(get_config_dir()?.join("config.toml"))
}
