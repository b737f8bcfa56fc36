use std::io::Write;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::constants::{
    earth_surface_velocity_km_s, EARTH_RADIUS_KM, JD_J2000, JD_UNIX_EPOCH, SECONDS_PER_DAY,
};
use crate::engine::result::PairAssessmentResult;
use crate::propagate::{Satellite, SecularModel};

/// Inputs describing one object of a pair. Angles in radians, rates in
/// rad/min, lengths in Earth radii, velocities in units of the circular
/// velocity at the Earth's surface.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SatelliteFeatures {
    pub catalog_id: u64,
    pub mean_motion_dot: f64,
    pub mean_motion_ddot: f64,
    pub bstar: f64,
    pub inclination: f64,
    pub raan: f64,
    pub eccentricity: f64,
    pub arg_perigee: f64,
    pub mean_anomaly: f64,
    pub mean_motion_kozai: f64,
    pub raan_rate: f64,
    pub arg_perigee_rate: f64,
    pub mean_anomaly_rate: f64,
    pub semi_major_axis: f64,
    pub perigee_altitude: f64,
    pub apogee_altitude: f64,
    /// State at the element epoch; NaN when it cannot be propagated.
    pub position: [f64; 3],
    pub velocity: [f64; 3],
    /// Hours from the element epoch to the window start.
    pub tle_age_hours: f64,
    pub radius_m: f64,
}

impl SatelliteFeatures {
    const COLUMNS: [&'static str; 25] = [
        "satnum", "ndot", "nddot", "bstar", "inclo", "nodeo", "ecco", "argpo", "mo", "no_kozai",
        "nodedot", "argpdot", "mdot", "a", "altp", "alta", "r_x", "r_y", "r_z", "v_x", "v_y",
        "v_z", "tle_age", "radius_m", "epoch",
    ];

    pub fn new(satellite: &Satellite, window_start: DateTime<Utc>, radius_m: f64) -> Self {
        let elements = satellite.elements();
        let mean = elements.mean_elements();
        let secular = SecularModel::new(elements);
        let a = elements.semi_major_axis_er();
        let e = elements.eccentricity();

        let (position, velocity) = match satellite.propagate(elements.epoch()) {
            Ok(state) => {
                let v_unit = earth_surface_velocity_km_s();
                (
                    state.position_km.map(|c| c / EARTH_RADIUS_KM),
                    state.velocity_km_s.map(|c| c / v_unit),
                )
            }
            Err(err) => {
                log::warn!("features for catalog {}: {}", elements.catalog_id(), err);
                ([f64::NAN; 3], [f64::NAN; 3])
            }
        };

        Self {
            catalog_id: elements.catalog_id(),
            mean_motion_dot: mean.mean_motion_dot,
            mean_motion_ddot: mean.mean_motion_ddot,
            bstar: mean.bstar,
            inclination: elements.inclination(),
            raan: elements.raan(),
            eccentricity: e,
            arg_perigee: elements.arg_perigee(),
            mean_anomaly: elements.mean_anomaly(),
            mean_motion_kozai: elements.kozai_mean_motion(),
            raan_rate: secular.raan_rate(),
            arg_perigee_rate: secular.arg_perigee_rate(),
            mean_anomaly_rate: secular.mean_anomaly_rate(),
            semi_major_axis: a,
            perigee_altitude: a * (1.0 - e) - 1.0,
            apogee_altitude: a * (1.0 + e) - 1.0,
            position,
            velocity,
            tle_age_hours: elements.age_days(window_start) * 24.0,
            radius_m,
        }
    }

    fn record(&self, epoch: DateTime<Utc>) -> Vec<String> {
        let mut fields = vec![
            self.catalog_id.to_string(),
            self.mean_motion_dot.to_string(),
            self.mean_motion_ddot.to_string(),
            self.bstar.to_string(),
            self.inclination.to_string(),
            self.raan.to_string(),
            self.eccentricity.to_string(),
            self.arg_perigee.to_string(),
            self.mean_anomaly.to_string(),
            self.mean_motion_kozai.to_string(),
            self.raan_rate.to_string(),
            self.arg_perigee_rate.to_string(),
            self.mean_anomaly_rate.to_string(),
            self.semi_major_axis.to_string(),
            self.perigee_altitude.to_string(),
            self.apogee_altitude.to_string(),
        ];
        fields.extend(self.position.iter().map(f64::to_string));
        fields.extend(self.velocity.iter().map(f64::to_string));
        fields.push(self.tle_age_hours.to_string());
        fields.push(self.radius_m.to_string());
        fields.push(epoch.to_rfc3339());
        fields
    }
}

/// Targets for one pair. A rejected pair carries zeros apart from its code.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Labels {
    pub filter_code: u8,
    /// Days since J2000 of the closest approach, divided by 1e5.
    pub t_close: f64,
    /// `ln(1 + d_min)` with `d_min` in km.
    pub ln_d_min: f64,
    pub probability: f64,
}

impl Labels {
    const COLUMNS: [&'static str; 4] = ["filter_rej_code", "t_close", "ln_d_min", "probab"];

    pub fn from_result(result: &PairAssessmentResult) -> Self {
        if let Some(stage) = result.rejected_by {
            return Self {
                filter_code: stage.code(),
                t_close: 0.0,
                ln_d_min: 0.0,
                probability: 0.0,
            };
        }
        Self {
            filter_code: 0,
            t_close: result
                .min_distance_epoch
                .map(|t| days_since_j2000(t) / 1e5)
                .unwrap_or(0.0),
            ln_d_min: result.min_distance_km.ln_1p(),
            probability: result.max_probability,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelRow {
    pub primary: SatelliteFeatures,
    pub primary_epoch: DateTime<Utc>,
    pub secondary: SatelliteFeatures,
    pub secondary_epoch: DateTime<Utc>,
    pub labels: Labels,
}

impl LabelRow {
    pub fn new(
        a: &Satellite,
        b: &Satellite,
        result: &PairAssessmentResult,
        radii_m: (f64, f64),
    ) -> Self {
        let start = result.window.start;
        Self {
            primary: SatelliteFeatures::new(a, start, radii_m.0),
            primary_epoch: a.elements().epoch(),
            secondary: SatelliteFeatures::new(b, start, radii_m.1),
            secondary_epoch: b.elements().epoch(),
            labels: Labels::from_result(result),
        }
    }

    pub fn header() -> Vec<String> {
        let mut header: Vec<String> = SatelliteFeatures::COLUMNS
            .iter()
            .map(|c| format!("{c}_1"))
            .collect();
        header.extend(SatelliteFeatures::COLUMNS.iter().map(|c| format!("{c}_2")));
        header.extend(Labels::COLUMNS.iter().map(|c| c.to_string()));
        header
    }

    pub fn record(&self) -> Vec<String> {
        let mut fields = self.primary.record(self.primary_epoch);
        fields.extend(self.secondary.record(self.secondary_epoch));
        fields.push(self.labels.filter_code.to_string());
        fields.push(self.labels.t_close.to_string());
        fields.push(self.labels.ln_d_min.to_string());
        fields.push(self.labels.probability.to_string());
        fields
    }
}

/// Write rows as CSV with a header line.
pub fn write_labels<W: Write>(rows: &[LabelRow], writer: W) -> Result<(), csv::Error> {
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(LabelRow::header())?;
    for row in rows {
        out.write_record(row.record())?;
    }
    out.flush()?;
    Ok(())
}

pub(crate) fn days_since_j2000(at: DateTime<Utc>) -> f64 {
    let unix_seconds = at.timestamp() as f64 + at.timestamp_subsec_nanos() as f64 * 1e-9;
    unix_seconds / SECONDS_PER_DAY + JD_UNIX_EPOCH - JD_J2000
}
