use chrono::{DateTime, Utc};
use serde::Serialize;
use strum_macros::Display;

use crate::propagate::PropagationError;
use crate::window::TimeWindow;

/// Filter that ended an assessment early.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FilterStage {
    ApsisBands,
    SpatialProximity,
}

impl FilterStage {
    /// Numeric code used in training labels; 0 means not rejected.
    pub fn code(&self) -> u8 {
        match self {
            FilterStage::ApsisBands => 1,
            FilterStage::SpatialProximity => 2,
        }
    }
}

/// Minimum found in one candidate window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RefinedApproach {
    pub window: TimeWindow,
    pub epoch: DateTime<Utc>,
    pub distance_km: f64,
    pub relative_speed_km_s: f64,
    pub probability: f64,
}

/// A sampled epoch that was skipped because one object failed to propagate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropagationWarning {
    pub catalog_id: u64,
    pub epoch: DateTime<Utc>,
    pub message: String,
}

impl From<&PropagationError> for PropagationWarning {
    fn from(err: &PropagationError) -> Self {
        Self {
            catalog_id: err.catalog_id(),
            epoch: err.epoch(),
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Diagnostics {
    /// Grid epochs per object.
    pub samples: usize,
    /// Per-object samples that failed to propagate.
    pub skipped_samples: usize,
    pub candidate_windows: usize,
    pub refine_evaluations: usize,
    pub refine_failures: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairAssessmentResult {
    pub primary_id: u64,
    pub secondary_id: u64,
    pub window: TimeWindow,
    pub rejected_by: Option<FilterStage>,
    /// For an apsis rejection this is the radial band gap.
    pub min_distance_km: f64,
    pub min_distance_epoch: Option<DateTime<Utc>>,
    pub relative_speed_km_s: Option<f64>,
    pub max_probability: f64,
    pub approaches: Vec<RefinedApproach>,
    pub warnings: Vec<PropagationWarning>,
    pub diagnostics: Diagnostics,
}

impl PairAssessmentResult {
    pub fn is_rejected(&self) -> bool {
        self.rejected_by.is_some()
    }

    pub fn rejection_code(&self) -> u8 {
        self.rejected_by.map(|s| s.code()).unwrap_or(0)
    }
}
