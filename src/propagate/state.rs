use chrono::{DateTime, Utc};
use serde::Serialize;

/// Position and velocity in the propagator's inertial (TEME) frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StateVector {
    pub epoch: DateTime<Utc>,
    pub position_km: [f64; 3],
    pub velocity_km_s: [f64; 3],
}

impl StateVector {
    pub fn radius_km(&self) -> f64 {
        norm(self.position_km)
    }

    pub fn speed_km_s(&self) -> f64 {
        norm(self.velocity_km_s)
    }

    pub fn distance_to(&self, other: &StateVector) -> f64 {
        self.distance_squared_to(other).sqrt()
    }

    pub fn distance_squared_to(&self, other: &StateVector) -> f64 {
        let d = sub(other.position_km, self.position_km);
        dot(d, d)
    }

    pub fn relative_speed_to(&self, other: &StateVector) -> f64 {
        norm(sub(other.velocity_km_s, self.velocity_km_s))
    }
}

pub(crate) fn sub(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

pub(crate) fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

pub(crate) fn norm(a: [f64; 3]) -> f64 {
    dot(a, a).sqrt()
}
