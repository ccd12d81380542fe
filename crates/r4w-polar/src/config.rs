//! # Configuration
//!
//! YAML configuration for the construction harness.
//!
//! ## Configuration Search Path
//!
//! Configuration is loaded from the first file found:
//! 1. Path specified via `R4W_POLAR_CONFIG` environment variable
//! 2. `./r4w-polar.yaml` (current directory)
//! 3. `~/.config/r4w-polar/config.yaml` (user config)
//! 4. `/etc/r4w-polar/config.yaml` (system config)
//!
//! ## Example Configuration
//!
//! ```yaml
//! construction:
//!   block_size: 1024
//!   design_snr_db: 0.0
//!   method: bhattacharyya
//!   info_bits: 512
//!
//! logging:
//!   level: info
//!   format: compact
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::construction::{Construction, Method};
use crate::design::{BlockSpec, DesignPoint};
use crate::observe::LogConfig;
use crate::types::PolarResult;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "R4W_POLAR_CONFIG";

/// Error type for configuration operations.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Configuration file not found
    NotFound(String),
    /// Failed to read or write configuration file
    ReadError(String),
    /// Failed to parse configuration
    ParseError(String),
    /// Invalid configuration value
    ValidationError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::NotFound(msg) => write!(f, "config not found: {}", msg),
            ConfigError::ReadError(msg) => write!(f, "failed to read config: {}", msg),
            ConfigError::ParseError(msg) => write!(f, "failed to parse config: {}", msg),
            ConfigError::ValidationError(msg) => write!(f, "invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Code and design point to construct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConstructionConfig {
    /// Block size N (power of two)
    pub block_size: usize,
    /// Design SNR in dB
    pub design_snr_db: f64,
    /// Construction method
    pub method: Method,
    /// Information bits K; N - K positions are frozen
    pub info_bits: usize,
}

impl Default for ConstructionConfig {
    fn default() -> Self {
        Self {
            block_size: 1024,
            design_snr_db: 0.0,
            method: Method::Bhattacharyya,
            info_bits: 512,
        }
    }
}

impl ConstructionConfig {
    /// Frozen positions implied by `block_size - info_bits`.
    pub fn frozen_count(&self) -> usize {
        self.block_size.saturating_sub(self.info_bits)
    }

    /// Run the configured construction.
    pub fn build(&self) -> PolarResult<Construction> {
        Construction::for_block(self.method, self.block_size, self.design_snr_db)
    }
}

/// Complete harness configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolarConfig {
    /// Configuration version
    pub version: String,
    pub construction: ConstructionConfig,
    pub logging: LogConfig,
}

impl Default for PolarConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            construction: ConstructionConfig::default(),
            logging: LogConfig::default(),
        }
    }
}

impl PolarConfig {
    /// Load configuration from the default search path.
    ///
    /// Returns the default config if no file is found. A path named by
    /// `R4W_POLAR_CONFIG` that does not exist is an error.
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            let path = PathBuf::from(path);
            if !path.exists() {
                return Err(ConfigError::NotFound(format!(
                    "{} = {}",
                    CONFIG_ENV,
                    path.display()
                )));
            }
            return Self::load_from(&path);
        }

        for path in Self::config_search_paths() {
            if path.exists() {
                return Self::load_from(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))?;

        Self::parse(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(yaml).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content =
            serde_yaml::to_string(self).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        std::fs::write(path, content)
            .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))
    }

    /// Get configuration search paths, excluding the environment override.
    pub fn config_search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("./r4w-polar.yaml")];

        if let Some(dirs) = directories::ProjectDirs::from("", "", "r4w-polar") {
            paths.push(dirs.config_dir().join("config.yaml"));
        }

        paths.push(PathBuf::from("/etc/r4w-polar/config.yaml"));

        paths
    }

    /// Validate the configuration.
    ///
    /// Block size and SNR go through the same checks as a construction, so
    /// a config that validates will build.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let c = &self.construction;

        BlockSpec::from_size(c.block_size)
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;
        DesignPoint::new(c.design_snr_db)
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;

        if c.info_bits > c.block_size {
            return Err(ConfigError::ValidationError(format!(
                "info_bits {} exceeds block_size {}",
                c.info_bits, c.block_size
            )));
        }

        if let Some(filter) = &self.logging.filter {
            if filter.contains(char::is_whitespace) && !filter.trim().is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "logging.filter must not contain whitespace: {:?}",
                    filter
                )));
            }
        }

        Ok(())
    }

    /// Generate example configuration YAML.
    pub fn example_yaml() -> String {
        serde_yaml::to_string(&Self::default()).unwrap_or_default()
    }
}
