//! Configuration management for tidy.
//!
//! Loads settings from `$TIDY_CONFIG` or `<config dir>/tidy/config.toml`,
//! falling back to defaults.

use crate::descriptor::DEFAULT_SWEEP_MIN_AGE;
use crate::error::{Result, TidyError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable pointing at an explicit config file
pub const CONFIG_ENV: &str = "TIDY_CONFIG";

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Filter used when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Temporary-file sweep settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Files younger than this are left alone
    #[serde(default = "default_min_age_secs")]
    pub min_age_secs: u64,

    /// Scanned after the standard temp directories
    #[serde(default)]
    pub extra_dirs: Vec<PathBuf>,
}

fn default_min_age_secs() -> u64 {
    DEFAULT_SWEEP_MIN_AGE.as_secs()
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            min_age_secs: default_min_age_secs(),
            extra_dirs: Vec::new(),
        }
    }
}

/// Plan-tier resolution settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubscriptionConfig {
    /// Identities that always resolve to ENTERPRISE/active
    #[serde(default)]
    pub bypass_emails: Vec<String>,

    #[serde(default)]
    pub pro_price_ids: Vec<String>,

    #[serde(default)]
    pub enterprise_price_ids: Vec<String>,
}

/// Replacement program and/or arguments for a process-backed tool
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<String>>,
}

/// Full configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub log: LogConfig,

    #[serde(default)]
    pub sweep: SweepConfig,

    #[serde(default)]
    pub subscription: SubscriptionConfig,

    /// Keyed by canonical tool name (`sfc`, `dism`, ...)
    #[serde(default)]
    pub tools: BTreeMap<String, ToolOverride>,
}

impl Config {
    /// Load config from the first location that exists, or return defaults.
    ///
    /// A file that exists but cannot be read or parsed is an error rather
    /// than a silent fallback, so overrides are never dropped unnoticed.
    pub fn load() -> Result<Self> {
        match Self::candidate_paths().into_iter().find(|path| path.exists()) {
            Some(path) => Self::load_from_path(&path),
            None => {
                debug!("Config not found, using defaults");
                Ok(Config::default())
            }
        }
    }

    fn candidate_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Ok(explicit) = std::env::var(CONFIG_ENV) {
            paths.push(PathBuf::from(explicit));
        }
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("tidy").join("config.toml"));
        }
        paths
    }

    /// Load config from specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| TidyError::Config(format!("{}: {}", path.display(), e)))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| TidyError::Config(format!("{}: {}", path.display(), e)))?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| TidyError::Config(e.to_string()))
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| TidyError::Config(e.to_string()))
    }
}
