//! Configuration for the query engine.
//!
//! This module provides configuration handling with:
//! - YAML file support
//! - Validation and defaults

use crate::core::{Result, VantageError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Complete configuration for the query engine
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Rollup configuration
    pub rollup: RollupConfig,
    /// Chart shaping configuration
    pub chart: ChartConfig,
    /// Profile handling configuration
    pub profile: ProfileConfig,
}

/// Rollup configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollupConfig {
    /// Width of a coarse rollup bucket
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
    /// Query ranges longer than this are answered from rollups
    #[serde(with = "humantime_serde")]
    pub threshold: Duration,
}

/// Chart shaping configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartConfig {
    /// Nominal spacing between fine-grained data points
    #[serde(with = "humantime_serde")]
    pub data_point_interval: Duration,
    /// How many named series before folding the rest into "Other"
    pub top_n: usize,
    /// Last point older than this many intervals triggers a final downslope
    pub downslope_slack_intervals: f64,
}

/// Profile handling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileConfig {
    /// Fraction of total samples below which a subtree is truncated
    pub truncate_leaf_fraction: f64,
    /// Significant value digits kept by latency histograms
    pub histogram_significant_digits: u8,
}

impl Default for RollupConfig {
    fn default() -> Self {
        RollupConfig {
            interval: Duration::from_secs(300),    // 5 minute buckets
            threshold: Duration::from_secs(3600),  // roll up past 1 hour
        }
    }
}

impl Default for ChartConfig {
    fn default() -> Self {
        ChartConfig {
            data_point_interval: Duration::from_secs(60),
            top_n: 5,
            downslope_slack_intervals: 1.5,
        }
    }
}

impl Default for ProfileConfig {
    fn default() -> Self {
        ProfileConfig {
            truncate_leaf_fraction: 0.001, // drop subtrees below 0.1% of samples
            histogram_significant_digits: 3,
        }
    }
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Result<Self> {
        let config = Config::default();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)
            .map_err(|e| VantageError::config(format!("failed to parse {}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.rollup.interval.is_zero() {
            return Err(VantageError::config("rollup interval must be greater than 0"));
        }

        if self.rollup.threshold < self.rollup.interval {
            return Err(VantageError::config(format!(
                "rollup threshold ({:?}) must be at least the rollup interval ({:?})",
                self.rollup.threshold, self.rollup.interval
            )));
        }

        if self.chart.data_point_interval.is_zero() {
            return Err(VantageError::config("data point interval must be greater than 0"));
        }

        if self.chart.top_n == 0 {
            return Err(VantageError::config("top_n must be greater than 0"));
        }

        if self.chart.downslope_slack_intervals < 1.0 {
            return Err(VantageError::config(format!(
                "downslope slack must be at least 1 interval, got {}",
                self.chart.downslope_slack_intervals
            )));
        }

        if !(0.0..=1.0).contains(&self.profile.truncate_leaf_fraction) {
            return Err(VantageError::config(format!(
                "truncate leaf fraction must be between 0.0 and 1.0, got {}",
                self.profile.truncate_leaf_fraction
            )));
        }

        if !(1..=5).contains(&self.profile.histogram_significant_digits) {
            return Err(VantageError::config(format!(
                "histogram significant digits must be between 1 and 5, got {}",
                self.profile.histogram_significant_digits
            )));
        }

        Ok(())
    }

    /// Rollup interval in milliseconds
    pub fn rollup_interval_millis(&self) -> i64 {
        self.rollup.interval.as_millis() as i64
    }

    /// Rollup threshold in milliseconds
    pub fn rollup_threshold_millis(&self) -> i64 {
        self.rollup.threshold.as_millis() as i64
    }

    /// Fine-grained data point interval in milliseconds
    pub fn data_point_interval_millis(&self) -> i64 {
        self.chart.data_point_interval.as_millis() as i64
    }
}
