// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine configuration

use mq_core::MAX_DELAY;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors loading an [`EngineConfig`]
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("poll_interval must be greater than zero")]
    ZeroPollInterval,
}

/// Tunables for the in-memory engine
///
/// ```toml
/// poll_interval = "250ms"
/// max_delay = "1day"
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// How long dequeue sleeps between checks of an empty queue
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,
    /// Longest delay accepted on enqueue
    #[serde(with = "humantime_serde")]
    pub max_delay: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            max_delay: Duration::from_secs(u64::from(MAX_DELAY)),
        }
    }
}

impl EngineConfig {
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Parse a TOML document; absent keys keep their defaults
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(input)?;
        config.validate()
    }

    /// Load from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let input = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&input)
    }

    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.poll_interval.is_zero() {
            return Err(ConfigError::ZeroPollInterval);
        }
        Ok(self)
    }

    /// `max_delay` in whole seconds, as compared against message delays
    pub fn max_delay_secs(&self) -> u32 {
        u32::try_from(self.max_delay.as_secs()).unwrap_or(u32::MAX)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
