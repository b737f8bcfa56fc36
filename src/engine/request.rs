use chrono::Duration;

use crate::config::EngineConfig;
use crate::elements::OrbitalElementSet;
use crate::engine::error::EngineError;
use crate::propagate::SampleGrid;
use crate::window::TimeWindow;

pub const DEFAULT_SAMPLING_INTERVAL_S: i64 = 900;
pub const DEFAULT_SPATIAL_THRESHOLD_KM: f64 = 12.0;
pub const DEFAULT_APSIS_THRESHOLD_KM: f64 = 10.0;

/// One pair, one window. Radii have no default.
#[derive(Debug, Clone, Copy)]
pub struct PairAssessmentRequest<'a> {
    pub primary: &'a OrbitalElementSet,
    pub secondary: &'a OrbitalElementSet,
    pub window: TimeWindow,
    pub sampling_interval: Duration,
    pub spatial_threshold_km: f64,
    pub apsis_threshold_km: f64,
    pub primary_radius_m: f64,
    pub secondary_radius_m: f64,
}

impl<'a> PairAssessmentRequest<'a> {
    pub fn new(
        primary: &'a OrbitalElementSet,
        secondary: &'a OrbitalElementSet,
        window: TimeWindow,
        primary_radius_m: f64,
        secondary_radius_m: f64,
    ) -> Self {
        Self {
            primary,
            secondary,
            window,
            sampling_interval: Duration::seconds(DEFAULT_SAMPLING_INTERVAL_S),
            spatial_threshold_km: DEFAULT_SPATIAL_THRESHOLD_KM,
            apsis_threshold_km: DEFAULT_APSIS_THRESHOLD_KM,
            primary_radius_m,
            secondary_radius_m,
        }
    }

    pub fn with_sampling_interval(mut self, interval: Duration) -> Self {
        self.sampling_interval = interval;
        self
    }

    pub fn with_spatial_threshold_km(mut self, threshold: f64) -> Self {
        self.spatial_threshold_km = threshold;
        self
    }

    pub fn with_apsis_threshold_km(mut self, threshold: f64) -> Self {
        self.apsis_threshold_km = threshold;
        self
    }

    /// The same request with the two objects exchanged.
    pub fn swapped(&self) -> Self {
        Self {
            primary: self.secondary,
            secondary: self.primary,
            primary_radius_m: self.secondary_radius_m,
            secondary_radius_m: self.primary_radius_m,
            ..*self
        }
    }

    pub fn combined_radius_km(&self) -> f64 {
        (self.primary_radius_m + self.secondary_radius_m) / 1000.0
    }

    pub fn grid(&self) -> SampleGrid {
        SampleGrid::new(self.window, self.sampling_interval)
    }

    /// Reject malformed requests before anything is propagated.
    pub fn validate(&self, config: &EngineConfig) -> Result<(), EngineError> {
        let span = self.window.duration();
        if span < Duration::zero() {
            return Err(EngineError::invalid_request(
                "window",
                format!("stop {} precedes start {}", self.window.stop, self.window.start),
            ));
        }
        let hours = span.num_milliseconds() as f64 / 3_600_000.0;
        if hours > config.max_window_hours {
            return Err(EngineError::invalid_request(
                "window",
                format!(
                    "{:.1} h exceeds the maximum of {:.1} h",
                    hours, config.max_window_hours
                ),
            ));
        }

        if self.sampling_interval.num_milliseconds() <= 0 {
            return Err(EngineError::invalid_request(
                "sampling_interval",
                format!(
                    "must be positive, got {} ms",
                    self.sampling_interval.num_milliseconds()
                ),
            ));
        }
        let samples = SampleGrid::len_for(span, self.sampling_interval);
        if samples > config.max_samples {
            return Err(EngineError::invalid_request(
                "sampling_interval",
                format!(
                    "{samples} samples exceed the limit of {}",
                    config.max_samples
                ),
            ));
        }

        non_negative("spatial_threshold_km", self.spatial_threshold_km)?;
        non_negative("apsis_threshold_km", self.apsis_threshold_km)?;
        non_negative("primary_radius_m", self.primary_radius_m)?;
        non_negative("secondary_radius_m", self.secondary_radius_m)?;
        Ok(())
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), EngineError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(EngineError::invalid_request(
            field,
            format!("must be finite and non-negative, got {value}"),
        ))
    }
}
