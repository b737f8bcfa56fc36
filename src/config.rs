use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::approach::{ProbabilityModel, RefinerConfig};
use crate::engine::{
    DEFAULT_APSIS_THRESHOLD_KM, DEFAULT_SAMPLING_INTERVAL_S, DEFAULT_SPATIAL_THRESHOLD_KM,
};
use crate::propagate::PropagationModel;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Top-level YAML configuration. Every section may be omitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub engine: EngineConfig,
    pub screening: ScreeningDefaults,
    pub batch: BatchConfig,
}

impl Config {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes to unit, not an empty map.
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Config = serde_yaml::from_str(content)?;
        Ok(config)
    }
}

/// Limits and models applied to every assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_max_window_hours")]
    pub max_window_hours: f64,
    #[serde(default = "default_max_samples")]
    pub max_samples: usize,
    #[serde(default)]
    pub refiner: RefinerConfig,
    #[serde(default)]
    pub propagation_model: PropagationModel,
    #[serde(default)]
    pub probability_model: ProbabilityModel,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_window_hours: default_max_window_hours(),
            max_samples: default_max_samples(),
            refiner: RefinerConfig::default(),
            propagation_model: PropagationModel::default(),
            probability_model: ProbabilityModel::default(),
        }
    }
}

fn default_max_window_hours() -> f64 {
    7.0 * 24.0
}

fn default_max_samples() -> usize {
    200_000
}

/// Request parameters used by the CLI when no flag overrides them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreeningDefaults {
    #[serde(default = "default_sampling_interval_s")]
    pub sampling_interval_s: i64,
    #[serde(default = "default_spatial_threshold_km")]
    pub spatial_threshold_km: f64,
    #[serde(default = "default_apsis_threshold_km")]
    pub apsis_threshold_km: f64,
    #[serde(default = "default_radius_m")]
    pub primary_radius_m: f64,
    #[serde(default = "default_radius_m")]
    pub secondary_radius_m: f64,
}

impl Default for ScreeningDefaults {
    fn default() -> Self {
        Self {
            sampling_interval_s: default_sampling_interval_s(),
            spatial_threshold_km: default_spatial_threshold_km(),
            apsis_threshold_km: default_apsis_threshold_km(),
            primary_radius_m: default_radius_m(),
            secondary_radius_m: default_radius_m(),
        }
    }
}

fn default_sampling_interval_s() -> i64 {
    DEFAULT_SAMPLING_INTERVAL_S
}

fn default_spatial_threshold_km() -> f64 {
    DEFAULT_SPATIAL_THRESHOLD_KM
}

fn default_apsis_threshold_km() -> f64 {
    DEFAULT_APSIS_THRESHOLD_KM
}

fn default_radius_m() -> f64 {
    5.0
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Distance at which two catalog objects become a candidate pair.
    #[serde(default = "default_spatial_threshold_km")]
    pub pair_threshold_km: f64,
    #[serde(default = "default_identical_tolerance_km")]
    pub identical_tolerance_km: f64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            pair_threshold_km: default_spatial_threshold_km(),
            identical_tolerance_km: default_identical_tolerance_km(),
        }
    }
}

fn default_identical_tolerance_km() -> f64 {
    crate::engine::batch::IDENTICAL_TOLERANCE_KM
}
