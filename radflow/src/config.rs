//! Runner configuration.

use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Prefix of the environment variables read by [`RunnerConfig::with_env_overrides`].
pub const ENV_PREFIX: &str = "RADFLOW_";

/// Tunables of the pipeline runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Lower bound of a simulated stage duration (inclusive), in milliseconds.
    #[serde(default = "default_min_stage_duration_ms")]
    pub min_stage_duration_ms: u64,
    /// Upper bound of a simulated stage duration (exclusive), in milliseconds.
    #[serde(default = "default_max_stage_duration_ms")]
    pub max_stage_duration_ms: u64,
    /// Scheduler tick period, in milliseconds.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Nominal duration recorded for a skipped stage, in seconds.
    #[serde(default = "default_skipped_stage_duration_secs")]
    pub skipped_stage_duration_secs: f64,
    /// A stage still running after this long is failed, in milliseconds.
    #[serde(default = "default_stage_timeout_ms")]
    pub stage_timeout_ms: u64,
    /// Number of findings per synthesized result.
    #[serde(default = "default_findings_per_result")]
    pub findings_per_result: usize,
}

fn default_min_stage_duration_ms() -> u64 {
    1500
}

fn default_max_stage_duration_ms() -> u64 {
    2500
}

fn default_tick_interval_ms() -> u64 {
    16
}

fn default_skipped_stage_duration_secs() -> f64 {
    0.1
}

fn default_stage_timeout_ms() -> u64 {
    10_000
}

fn default_findings_per_result() -> usize {
    3
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            min_stage_duration_ms: default_min_stage_duration_ms(),
            max_stage_duration_ms: default_max_stage_duration_ms(),
            tick_interval_ms: default_tick_interval_ms(),
            skipped_stage_duration_secs: default_skipped_stage_duration_secs(),
            stage_timeout_ms: default_stage_timeout_ms(),
            findings_per_result: default_findings_per_result(),
        }
    }
}

impl RunnerConfig {
    /// Creates a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a JSON document; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Loads a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Applies `RADFLOW_*` overrides from the process environment.
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides looked up by variable name.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        fn parse<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
            value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                key: key.to_string(),
                value: value.to_string(),
            })
        }

        let var = |name: &str| {
            let key = format!("{ENV_PREFIX}{name}");
            lookup(&key).map(|value| (key, value))
        };

        if let Some((k, v)) = var("MIN_STAGE_DURATION_MS") {
            self.min_stage_duration_ms = parse(&k, &v)?;
        }
        if let Some((k, v)) = var("MAX_STAGE_DURATION_MS") {
            self.max_stage_duration_ms = parse(&k, &v)?;
        }
        if let Some((k, v)) = var("TICK_INTERVAL_MS") {
            self.tick_interval_ms = parse(&k, &v)?;
        }
        if let Some((k, v)) = var("SKIPPED_STAGE_DURATION_SECS") {
            self.skipped_stage_duration_secs = parse(&k, &v)?;
        }
        if let Some((k, v)) = var("STAGE_TIMEOUT_MS") {
            self.stage_timeout_ms = parse(&k, &v)?;
        }
        if let Some((k, v)) = var("FINDINGS_PER_RESULT") {
            self.findings_per_result = parse(&k, &v)?;
        }
        Ok(self)
    }

    /// Sets the duration bounds.
    #[must_use]
    pub fn with_stage_duration_ms(mut self, min: u64, max: u64) -> Self {
        self.min_stage_duration_ms = min;
        self.max_stage_duration_ms = max;
        self
    }

    /// Sets the tick period.
    #[must_use]
    pub fn with_tick_interval_ms(mut self, ms: u64) -> Self {
        self.tick_interval_ms = ms;
        self
    }

    /// Sets the per-stage timeout.
    #[must_use]
    pub fn with_stage_timeout_ms(mut self, ms: u64) -> Self {
        self.stage_timeout_ms = ms;
        self
    }

    /// Checks ranges and consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_stage_duration_ms == 0 {
            return Err(ConfigError::invalid("min_stage_duration_ms", "must be positive"));
        }
        if self.max_stage_duration_ms <= self.min_stage_duration_ms {
            return Err(ConfigError::invalid(
                "max_stage_duration_ms",
                format!(
                    "must exceed min_stage_duration_ms ({})",
                    self.min_stage_duration_ms
                ),
            ));
        }
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::invalid("tick_interval_ms", "must be positive"));
        }
        if !self.skipped_stage_duration_secs.is_finite() || self.skipped_stage_duration_secs < 0.0 {
            return Err(ConfigError::invalid(
                "skipped_stage_duration_secs",
                "must be a non-negative number",
            ));
        }
        if self.stage_timeout_ms <= self.max_stage_duration_ms {
            return Err(ConfigError::invalid(
                "stage_timeout_ms",
                format!(
                    "must exceed max_stage_duration_ms ({})",
                    self.max_stage_duration_ms
                ),
            ));
        }
        if self.findings_per_result == 0 {
            return Err(ConfigError::invalid("findings_per_result", "must be positive"));
        }
        Ok(())
    }

    /// Tick period as a `Duration`.
    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Stage timeout as a `Duration`.
    #[must_use]
    pub fn stage_timeout(&self) -> Duration {
        Duration::from_millis(self.stage_timeout_ms)
    }
}
