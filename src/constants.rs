// WGS-84 values, matching the geopotential handed to the SGP4 model.
pub const EARTH_RADIUS_KM: f64 = 6378.137;
pub const MU_EARTH_KM3_S2: f64 = 398_600.5;
pub const J2: f64 = 0.001_082_629_989_05;
pub const J3: f64 = -0.000_002_532_153_06;

/// sqrt(mu) in Earth radii^1.5 per minute.
pub const KE: f64 = 0.074_366_853_168_713_85;

pub const MINUTES_PER_DAY: f64 = 1440.0;
pub const SECONDS_PER_DAY: f64 = 86_400.0;
pub const TWO_PI: f64 = std::f64::consts::TAU;

/// Julian date of the J2000 epoch (2000-01-01T12:00:00).
pub const JD_J2000: f64 = 2_451_545.0;
pub const JD_UNIX_EPOCH: f64 = 2_440_587.5;

/// Circular velocity at the Earth's surface, km/s.
pub fn earth_surface_velocity_km_s() -> f64 {
    (MU_EARTH_KM3_S2 / EARTH_RADIUS_KM).sqrt()
}
