//! Planner configuration and its TOML loader.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fetch limit used when the caller did not set one and limit adjustment is enabled.
pub const DEFAULT_NO_LIMIT: usize = 1000;
/// Ceiling applied to caller limits when limit adjustment is enabled.
pub const MAX_BASE_LIMIT: usize = 20_000;
/// Absolute ceiling for any per-index fetch.
pub const HARD_MAX_LIMIT: usize = 100_000;

/// Knobs that influence how the planner sizes backend index calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Replace the hard ceiling with smaller working limits for index calls.
    pub adjust_query_limit: bool,
    /// Limit used for unlimited queries when `adjust_query_limit` is set.
    pub default_no_limit: usize,
    /// Cap applied to caller limits when `adjust_query_limit` is set.
    pub max_base_limit: usize,
    /// Upper bound on every index fetch.
    pub hard_max_limit: usize,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            adjust_query_limit: false,
            default_no_limit: DEFAULT_NO_LIMIT,
            max_base_limit: MAX_BASE_LIMIT,
            hard_max_limit: HARD_MAX_LIMIT,
        }
    }
}

impl PlannerConfig {
    /// Preset that keeps index calls small for interactive workloads.
    pub fn adaptive() -> Self {
        Self {
            adjust_query_limit: true,
            ..Self::default()
        }
    }

    /// Parses a configuration from TOML text and validates it.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: PlannerConfig =
            toml::from_str(contents).map_err(|source| ConfigError::Parse {
                path: None,
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a configuration file; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: PlannerConfig =
            toml::from_str(&contents).map_err(|source| ConfigError::Parse {
                path: Some(path.to_path_buf()),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Serializes the configuration back to TOML.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|source| ConfigError::Serialize { source })
    }

    /// Checks that the limits are positive and ordered.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_no_limit == 0 || self.max_base_limit == 0 || self.hard_max_limit == 0 {
            return Err(ConfigError::InvalidLimits {
                reason: "limits must be greater than zero",
            });
        }
        if self.default_no_limit > self.max_base_limit {
            return Err(ConfigError::InvalidLimits {
                reason: "default_no_limit exceeds max_base_limit",
            });
        }
        if self.max_base_limit > self.hard_max_limit {
            return Err(ConfigError::InvalidLimits {
                reason: "max_base_limit exceeds hard_max_limit",
            });
        }
        Ok(())
    }
}

/// Failures while loading planner configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File exists but could not be read.
    #[error("failed to read planner config {path}: {source}")]
    Read {
        /// File that failed.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// TOML was malformed or had wrong field types.
    #[error("failed to parse planner config{}: {source}", display_path(.path))]
    Parse {
        /// File that failed, when loaded from disk.
        path: Option<PathBuf>,
        /// Underlying TOML error.
        source: toml::de::Error,
    },
    /// Configuration could not be rendered as TOML.
    #[error("failed to serialize planner config: {source}")]
    Serialize {
        /// Underlying TOML error.
        source: toml::ser::Error,
    },
    /// Limits are inconsistent.
    #[error("invalid planner limits: {reason}")]
    InvalidLimits {
        /// What is wrong with the limits.
        reason: &'static str,
    },
}

fn display_path(path: &Option<PathBuf>) -> String {
    match path {
        Some(path) => format!(" {}", path.display()),
        None => String::new(),
    }
}
