use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::constants::{EARTH_RADIUS_KM, J2, KE, MINUTES_PER_DAY, SECONDS_PER_DAY, TWO_PI};
use crate::elements::error::ElementsError;

/// Mean elements in the units a two-line element record publishes them in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MeanElements {
    pub inclination_deg: f64,
    pub raan_deg: f64,
    pub eccentricity: f64,
    pub arg_perigee_deg: f64,
    pub mean_anomaly_deg: f64,
    /// Kozai mean motion, revolutions per day.
    pub mean_motion_rev_day: f64,
    /// B* drag term, inverse Earth radii.
    pub bstar: f64,
    /// First derivative of mean motion divided by two, rev/day^2.
    pub mean_motion_dot: f64,
    /// Second derivative of mean motion divided by six, rev/day^3.
    pub mean_motion_ddot: f64,
}

/// A validated orbital element set.
///
/// The only ways to obtain one are [`OrbitalElementSet::new`] and
/// [`OrbitalElementSet::from_tle`], both of which enforce the invariants
/// (finite fields, `0 <= e < 1`, `n > 0`, inclination within `[0, 180]`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrbitalElementSet {
    catalog_id: u64,
    name: Option<String>,
    epoch: DateTime<Utc>,
    elements: MeanElements,
}

impl OrbitalElementSet {
    pub fn new(
        catalog_id: u64,
        epoch: DateTime<Utc>,
        elements: MeanElements,
    ) -> Result<Self, ElementsError> {
        validate(catalog_id, &elements)?;
        Ok(Self {
            catalog_id,
            name: None,
            epoch,
            elements,
        })
    }

    /// Parse a two-line element record. `name` is the optional title line.
    pub fn from_tle(name: Option<String>, line1: &str, line2: &str) -> Result<Self, ElementsError> {
        let parsed = sgp4::Elements::from_tle(name, line1.as_bytes(), line2.as_bytes())?;
        Self::from_sgp4(&parsed)
    }

    pub fn from_sgp4(elements: &sgp4::Elements) -> Result<Self, ElementsError> {
        let mean = MeanElements {
            inclination_deg: elements.inclination,
            raan_deg: elements.right_ascension,
            eccentricity: elements.eccentricity,
            arg_perigee_deg: elements.argument_of_perigee,
            mean_anomaly_deg: elements.mean_anomaly,
            mean_motion_rev_day: elements.mean_motion,
            bstar: elements.drag_term,
            mean_motion_dot: elements.mean_motion_dot,
            mean_motion_ddot: elements.mean_motion_ddot,
        };
        let set = Self::new(elements.norad_id as u64, elements.datetime.and_utc(), mean)?;
        Ok(set.with_name(elements.object_name.clone()))
    }

    pub fn with_name(mut self, name: Option<String>) -> Self {
        self.name = name;
        self
    }

    pub fn catalog_id(&self) -> u64 {
        self.catalog_id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("NORAD {}", self.catalog_id))
    }

    pub fn epoch(&self) -> DateTime<Utc> {
        self.epoch
    }

    pub fn mean_elements(&self) -> &MeanElements {
        &self.elements
    }

    pub fn eccentricity(&self) -> f64 {
        self.elements.eccentricity
    }

    pub fn inclination(&self) -> f64 {
        self.elements.inclination_deg.to_radians()
    }

    pub fn raan(&self) -> f64 {
        self.elements.raan_deg.to_radians()
    }

    pub fn arg_perigee(&self) -> f64 {
        self.elements.arg_perigee_deg.to_radians()
    }

    pub fn mean_anomaly(&self) -> f64 {
        self.elements.mean_anomaly_deg.to_radians()
    }

    pub fn bstar(&self) -> f64 {
        self.elements.bstar
    }

    /// Kozai mean motion in radians per minute.
    pub fn kozai_mean_motion(&self) -> f64 {
        self.elements.mean_motion_rev_day * TWO_PI / MINUTES_PER_DAY
    }

    /// Brouwer mean motion in radians per minute, recovered from the Kozai
    /// value the same way SGP4 initialization does.
    pub fn brouwer_mean_motion(&self) -> f64 {
        let n = self.kozai_mean_motion();
        let e = self.eccentricity();
        let cosio = self.inclination().cos();
        let omeosq = 1.0 - e * e;
        let rteosq = omeosq.sqrt();

        let ak = (KE / n).powf(2.0 / 3.0);
        let d1 = 0.75 * J2 * (3.0 * cosio * cosio - 1.0) / (rteosq * omeosq);
        let del = d1 / (ak * ak);
        let adel = ak * (1.0 - del * del - del * (1.0 / 3.0 + 134.0 * del * del / 81.0));
        let del = d1 / (adel * adel);
        n / (1.0 + del)
    }

    /// Mean semi-major axis in Earth radii.
    pub fn semi_major_axis_er(&self) -> f64 {
        (KE / self.brouwer_mean_motion()).powf(2.0 / 3.0)
    }

    pub fn semi_major_axis_km(&self) -> f64 {
        self.semi_major_axis_er() * EARTH_RADIUS_KM
    }

    pub fn periapsis_km(&self) -> f64 {
        self.semi_major_axis_km() * (1.0 - self.eccentricity())
    }

    pub fn apoapsis_km(&self) -> f64 {
        self.semi_major_axis_km() * (1.0 + self.eccentricity())
    }

    pub fn period(&self) -> Duration {
        let minutes = TWO_PI / self.brouwer_mean_motion();
        Duration::milliseconds((minutes * 60_000.0).round() as i64)
    }

    /// Signed age of the element set at `at`, in days.
    pub fn age_days(&self, at: DateTime<Utc>) -> f64 {
        seconds_between(self.epoch, at) / SECONDS_PER_DAY
    }

    /// Fractional minutes from the element epoch to `at`.
    pub fn minutes_since_epoch(&self, at: DateTime<Utc>) -> f64 {
        seconds_between(self.epoch, at) / 60.0
    }
}

pub(crate) fn seconds_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    let delta = to - from;
    match delta.num_microseconds() {
        Some(us) => us as f64 * 1e-6,
        None => delta.num_milliseconds() as f64 * 1e-3,
    }
}

fn validate(catalog_id: u64, elements: &MeanElements) -> Result<(), ElementsError> {
    let out_of_range = |field: &'static str, reason: String| ElementsError::OutOfRange {
        catalog_id,
        field,
        reason,
    };

    let fields = [
        ("inclination", elements.inclination_deg),
        ("raan", elements.raan_deg),
        ("eccentricity", elements.eccentricity),
        ("arg_perigee", elements.arg_perigee_deg),
        ("mean_anomaly", elements.mean_anomaly_deg),
        ("mean_motion", elements.mean_motion_rev_day),
        ("bstar", elements.bstar),
        ("mean_motion_dot", elements.mean_motion_dot),
        ("mean_motion_ddot", elements.mean_motion_ddot),
    ];
    if let Some((field, value)) = fields.iter().find(|(_, v)| !v.is_finite()) {
        return Err(out_of_range(*field, format!("must be finite, got {}", value)));
    }

    if !(0.0..1.0).contains(&elements.eccentricity) {
        return Err(out_of_range(
            "eccentricity",
            format!("must be within [0, 1), got {}", elements.eccentricity),
        ));
    }
    if elements.mean_motion_rev_day <= 0.0 {
        return Err(out_of_range(
            "mean_motion",
            format!("must be positive, got {}", elements.mean_motion_rev_day),
        ));
    }
    if !(0.0..=180.0).contains(&elements.inclination_deg) {
        return Err(out_of_range(
            "inclination",
            format!("must be within [0, 180] deg, got {}", elements.inclination_deg),
        ));
    }

    Ok(())
}
