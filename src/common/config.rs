//! Configuration for the workload driver

use crate::common::utils::parse_duration;
use crate::common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Workload configuration
///
/// Loadable from a TOML file, with every field optional. CLI flags override
/// file values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Target service URI
    #[serde(default = "default_target")]
    pub target: String,

    /// How long to drive load (e.g. "30s", "5m")
    #[serde(default = "default_duration")]
    pub duration: String,

    /// Mean generated key size in bytes
    #[serde(default = "default_mean_key_size")]
    pub mean_key_size: usize,

    /// Mean generated value size in bytes
    #[serde(default = "default_mean_value_size")]
    pub mean_value_size: usize,

    /// Maximum number of RPCs left outstanding before the loop waits for
    /// one to complete
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,

    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_target() -> String {
    "http://127.0.0.1:50051".to_string()
}
fn default_duration() -> String {
    "60s".to_string()
}
fn default_mean_key_size() -> usize {
    64
}
fn default_mean_value_size() -> usize {
    65536
}
fn default_max_in_flight() -> usize {
    64
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target: default_target(),
            duration: default_duration(),
            mean_key_size: default_mean_key_size(),
            mean_value_size: default_mean_value_size(),
            max_in_flight: default_max_in_flight(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .build()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;

        let cfg: Config = settings
            .try_deserialize()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check that the configuration is usable.
    pub fn validate(&self) -> Result<()> {
        if self.mean_key_size == 0 {
            return Err(Error::InvalidConfig("mean_key_size must be nonzero".into()));
        }
        if self.mean_value_size == 0 {
            return Err(Error::InvalidConfig(
                "mean_value_size must be nonzero".into(),
            ));
        }
        if self.max_in_flight == 0 {
            return Err(Error::InvalidConfig("max_in_flight must be nonzero".into()));
        }
        parse_duration(&self.duration)?;
        Ok(())
    }

    /// Parsed run duration.
    pub fn run_duration(&self) -> Result<Duration> {
        parse_duration(&self.duration)
    }
}
