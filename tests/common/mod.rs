#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};

use nearmiss::config::EngineConfig;
use nearmiss::elements::parse_tle;
use nearmiss::{ConjunctionEngine, MeanElements, OrbitalElementSet, PropagationModel};

pub const ISS_TLE: &str = "ISS (ZARYA)
1 25544U 98067A   21275.59097222  .00002182  00000-0  50300-4 0  9998
2 25544  51.6442  21.5553 0005545  45.1234 315.6789 15.48815347249553";

pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
}

pub fn iss() -> OrbitalElementSet {
    parse_tle(ISS_TLE).unwrap()
}

/// Drag-free element set at [`epoch`].
pub fn elements(catalog_id: u64, mean: MeanElements) -> OrbitalElementSet {
    OrbitalElementSet::new(catalog_id, epoch(), mean).unwrap()
}

pub fn circular(
    catalog_id: u64,
    inclination_deg: f64,
    raan_deg: f64,
    mean_motion_rev_day: f64,
) -> OrbitalElementSet {
    elements(
        catalog_id,
        MeanElements {
            inclination_deg,
            raan_deg,
            eccentricity: 0.0,
            arg_perigee_deg: 0.0,
            mean_anomaly_deg: 0.0,
            mean_motion_rev_day,
            bstar: 0.0,
            mean_motion_dot: 0.0,
            mean_motion_ddot: 0.0,
        },
    )
}

pub fn engine(model: PropagationModel) -> ConjunctionEngine {
    ConjunctionEngine::new(EngineConfig {
        propagation_model: model,
        ..EngineConfig::default()
    })
}
