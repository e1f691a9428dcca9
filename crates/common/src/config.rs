//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{SteadyError, SteadyResult};

/// Global application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Smoothing, cleanup, and fix thresholds.
    pub pipeline: PipelineConfig,

    /// Session store defaults.
    pub sessions: SessionDefaults,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Thresholds for the tick-to-segment pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub smoothing: SmoothingConfig,
    pub cleanup: CleanupConfig,
    pub fixes: FixConfig,
}

/// Majority-filter parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    /// Number of trailing raw labels considered.
    pub window: usize,

    /// Shaky labels in the window needed to enter SHAKY.
    /// Returning to GOOD requires fewer than this many.
    pub majority: usize,

    /// A single tick at or above this confidence enters SHAKY immediately.
    pub override_confidence: f64,
}

/// Noise thresholds for the cleanup pass (seconds).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanupConfig {
    /// GOOD segments shorter than this are absorbed into a GOOD neighbor.
    pub min_good_secs: f64,

    /// SHAKY segments shorter than this are dropped.
    pub min_shaky_secs: f64,

    /// SHAKY gaps shorter than this between two GOOD segments are merged away.
    pub merge_gap_secs: f64,
}

/// Duration limits for fix suggestion and bridge eligibility (seconds).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FixConfig {
    /// SHAKY segments up to and including this duration are suggested BRIDGE.
    pub bridge_suggest_max_secs: f64,

    /// BRIDGE is only allowed strictly below this duration.
    pub bridge_max_secs: f64,
}

/// Session store parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionDefaults {
    /// Sessions untouched for longer than this are evicted.
    pub idle_ttl_secs: u64,

    /// Nominal tick rate reported in edit plans.
    pub ticks_hz: u32,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "steadycut_session=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            window: 3,
            majority: 2,
            override_confidence: 0.95,
        }
    }
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            min_good_secs: 1.0,
            min_shaky_secs: 0.5,
            merge_gap_secs: 0.5,
        }
    }
}

impl Default for FixConfig {
    fn default() -> Self {
        Self {
            bridge_suggest_max_secs: 2.0,
            bridge_max_secs: 8.0,
        }
    }
}

impl Default for SessionDefaults {
    fn default() -> Self {
        Self {
            idle_ttl_secs: 3600,
            ticks_hz: 1,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl PipelineConfig {
    /// Reject thresholds the pipeline cannot work with.
    pub fn validate(&self) -> SteadyResult<()> {
        let s = &self.smoothing;
        if s.window == 0 {
            return Err(SteadyError::config("smoothing.window must be at least 1"));
        }
        if s.majority == 0 || s.majority > s.window {
            return Err(SteadyError::config(format!(
                "smoothing.majority must be in 1..={}",
                s.window
            )));
        }

        for (name, value) in [
            ("smoothing.override_confidence", s.override_confidence),
            ("cleanup.min_good_secs", self.cleanup.min_good_secs),
            ("cleanup.min_shaky_secs", self.cleanup.min_shaky_secs),
            ("cleanup.merge_gap_secs", self.cleanup.merge_gap_secs),
            ("fixes.bridge_suggest_max_secs", self.fixes.bridge_suggest_max_secs),
            ("fixes.bridge_max_secs", self.fixes.bridge_max_secs),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(SteadyError::config(format!(
                    "{name} must be a finite non-negative number, got {value}"
                )));
            }
        }

        Ok(())
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match Self::load_from(&config_path) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!("Failed to load config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Load and validate config from an explicit path.
    pub fn load_from(path: &Path) -> SteadyResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.pipeline.validate()?;
        Ok(config)
    }

    /// Save config to the standard location.
    pub fn save(&self) -> Result<(), std::io::Error> {
        let config_path = config_file_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(config_path, json)
    }
}

/// Standard config file location.
fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("steadycut").join("config.json")
}
