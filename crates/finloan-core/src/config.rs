//! Configuration for FinLoan.
//!
//! Reads `~/.finloan/config.yaml`. Every field has a default, so a missing
//! file at the default location is not an error; an explicitly requested file
//! that does not exist is.
//!
//! ```yaml
//! form:
//!   validation_debounce_ms: 500
//!   alert_duration_ms: 5000
//! storage:
//!   dir: /home/me/.finloan/storage
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::error::{FinloanError, Result};
use crate::logging::finloan_home;

/// Upper bound for the live validation delay.
pub const MAX_DEBOUNCE_MS: u64 = 10_000;

/// Lower bound for how long an alert stays on screen.
pub const MIN_ALERT_DURATION_MS: u64 = 500;

/// Default config file path (`~/.finloan/config.yaml`).
pub fn config_path() -> Option<PathBuf> {
    finloan_home().ok().map(|home| home.join("config.yaml"))
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct FinloanConfig {
    /// Form behaviour
    #[serde(default)]
    pub form: FormConfig,

    /// Local storage location
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Form timing configuration.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct FormConfig {
    /// Delay after the last keystroke before a field is validated.
    #[serde(default = "default_validation_debounce")]
    pub validation_debounce_ms: u64,

    /// How long alert banners stay visible.
    #[serde(default = "default_alert_duration")]
    pub alert_duration_ms: u64,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            validation_debounce_ms: default_validation_debounce(),
            alert_duration_ms: default_alert_duration(),
        }
    }
}

impl FormConfig {
    pub fn validation_debounce(&self) -> Duration {
        Duration::from_millis(self.validation_debounce_ms)
    }

    pub fn alert_duration(&self) -> Duration {
        Duration::from_millis(self.alert_duration_ms)
    }
}

fn default_validation_debounce() -> u64 {
    500
}

fn default_alert_duration() -> u64 {
    5000
}

/// Storage configuration.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct StorageConfig {
    /// Directory holding stored values. Defaults to `~/.finloan/storage`.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

impl StorageConfig {
    /// Resolve the storage directory, falling back to `~/.finloan/storage`.
    pub fn resolve_dir(&self) -> Result<PathBuf> {
        match &self.dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(finloan_home()?.join("storage")),
        }
    }
}

impl FinloanConfig {
    /// Load configuration from the default path, or defaults when absent.
    pub fn load() -> Result<Self> {
        match config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => {
                debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load and validate configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| FinloanError::ConfigNotFound {
            path: path.to_path_buf(),
            source: Some(e),
        })?;
        let config = Self::parse(&content).map_err(|message| FinloanError::ConfigInvalid {
            path: path.to_path_buf(),
            message,
        })?;
        config.validate()?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    pub fn parse(content: &str) -> std::result::Result<Self, String> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str::<FinloanConfig>(content).map_err(|e| e.to_string())
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.form.validation_debounce_ms > MAX_DEBOUNCE_MS {
            return Err(FinloanError::ConfigValidation {
                message: format!(
                    "validation_debounce_ms must be <= {MAX_DEBOUNCE_MS}, got {}",
                    self.form.validation_debounce_ms
                ),
            });
        }

        if self.form.alert_duration_ms < MIN_ALERT_DURATION_MS {
            return Err(FinloanError::ConfigValidation {
                message: format!(
                    "alert_duration_ms must be >= {MIN_ALERT_DURATION_MS}, got {}",
                    self.form.alert_duration_ms
                ),
            });
        }

        Ok(())
    }
}
