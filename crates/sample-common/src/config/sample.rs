//! Sampling store configuration structure.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_QUIESCE_POLL_MS, DEFAULT_ROW_LIMIT, DEFAULT_SAMPLE_RATE};
use crate::error::{SampleError, SampleResult};

/// Registry-wide configuration.
///
/// # Example
///
/// ```rust
/// use sample_common::config::SampleConfig;
///
/// let config = SampleConfig::from_toml_str("rate = 50\nlimit = 200").unwrap();
/// assert_eq!(config.rate, 50);
/// assert_eq!(config.limit, 200);
/// assert!(config.marker_dir.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleConfig {
    /// Sampling rate for new tables; a write is admitted with probability
    /// `1 / rate`.
    #[serde(default = "default_rate")]
    pub rate: u32,

    /// Maximum rows held by a new table between scans.
    #[serde(default = "default_limit")]
    pub limit: u32,

    /// Directory holding one `<name>.sample` marker file per table.
    /// No marker files are written when unset.
    #[serde(default)]
    pub marker_dir: Option<PathBuf>,

    /// Interval between quiescence checks while dropping or renaming.
    #[serde(default = "default_quiesce_poll_ms")]
    pub quiesce_poll_ms: u64,
}

fn default_rate() -> u32 {
    DEFAULT_SAMPLE_RATE
}

fn default_limit() -> u32 {
    DEFAULT_ROW_LIMIT
}

fn default_quiesce_poll_ms() -> u64 {
    DEFAULT_QUIESCE_POLL_MS
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            rate: default_rate(),
            limit: default_limit(),
            marker_dir: None,
            quiesce_poll_ms: default_quiesce_poll_ms(),
        }
    }
}

impl SampleConfig {
    /// Parses a configuration from TOML text. Missing keys take defaults.
    pub fn from_toml_str(text: &str) -> SampleResult<Self> {
        let config: Self = toml::from_str(text)
            .map_err(|e| SampleError::config(format!("invalid config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates a configuration file.
    pub fn load(path: impl AsRef<Path>) -> SampleResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    /// Renders the configuration as TOML.
    pub fn to_toml_string(&self) -> SampleResult<String> {
        toml::to_string_pretty(self)
            .map_err(|e| SampleError::config(format!("cannot serialize config: {e}")))
    }

    /// Sets the default sampling rate.
    #[must_use]
    pub fn with_rate(mut self, rate: u32) -> Self {
        self.rate = rate;
        self
    }

    /// Sets the default row limit.
    #[must_use]
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    /// Sets the marker file directory.
    #[must_use]
    pub fn with_marker_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.marker_dir = Some(dir.into());
        self
    }

    /// Sets the quiescence poll interval in milliseconds.
    #[must_use]
    pub fn with_quiesce_poll_ms(mut self, millis: u64) -> Self {
        self.quiesce_poll_ms = millis;
        self
    }

    /// Returns the quiescence poll interval.
    #[must_use]
    pub fn quiesce_poll_interval(&self) -> Duration {
        Duration::from_millis(self.quiesce_poll_ms)
    }

    /// Validates the configuration and returns an error if invalid.
    pub fn validate(&self) -> SampleResult<()> {
        if self.rate == 0 {
            return Err(SampleError::config("rate must be at least 1"));
        }

        if self.limit == 0 {
            return Err(SampleError::config("limit must be at least 1"));
        }

        if self.quiesce_poll_ms == 0 {
            return Err(SampleError::config("quiesce_poll_ms must be at least 1"));
        }

        Ok(())
    }
}
