use chrono::{DateTime, Utc};

use crate::constants::{EARTH_RADIUS_KM, J2, MINUTES_PER_DAY, TWO_PI};
use crate::elements::OrbitalElementSet;
use crate::propagate::error::PropagationError;
use crate::propagate::kepler::{solve_kepler, KEPLER_MAX_ITERATIONS, KEPLER_TOLERANCE};
use crate::propagate::state::StateVector;

/// Mean elements advanced with first-order J2 secular rates and the TLE
/// mean-motion derivative as a drag term, then converted to Cartesian state
/// through Kepler's equation.
#[derive(Debug, Clone)]
pub struct SecularModel {
    catalog_id: u64,
    epoch: DateTime<Utc>,
    /// Brouwer mean motion, rad/min.
    n0: f64,
    /// Semi-major axis, km.
    a0: f64,
    e0: f64,
    i0: f64,
    raan0: f64,
    argp0: f64,
    m0: f64,
    raan_dot: f64,
    argp_dot: f64,
    m_dot: f64,
    /// Half the mean-motion rate, rad/min^2.
    half_n_dot: f64,
}

impl SecularModel {
    pub fn new(elements: &OrbitalElementSet) -> Self {
        let n0 = elements.brouwer_mean_motion();
        let a_er = elements.semi_major_axis_er();
        let e0 = elements.eccentricity();
        let i0 = elements.inclination();

        let beta_sq = 1.0 - e0 * e0;
        let p = a_er * beta_sq;
        let cos_i = i0.cos();
        let theta2 = cos_i * cos_i;
        let k = 1.5 * J2 * n0 / (p * p);

        Self {
            catalog_id: elements.catalog_id(),
            epoch: elements.epoch(),
            n0,
            a0: a_er * EARTH_RADIUS_KM,
            e0,
            i0,
            raan0: elements.raan(),
            argp0: elements.arg_perigee(),
            m0: elements.mean_anomaly(),
            raan_dot: -k * cos_i,
            argp_dot: 0.5 * k * (5.0 * theta2 - 1.0),
            m_dot: n0 + 0.5 * k * beta_sq.sqrt() * (3.0 * theta2 - 1.0),
            half_n_dot: elements.mean_elements().mean_motion_dot * TWO_PI
                / (MINUTES_PER_DAY * MINUTES_PER_DAY),
        }
    }

    /// Secular node rate, rad/min.
    pub fn raan_rate(&self) -> f64 {
        self.raan_dot
    }

    /// Secular perigee rate, rad/min.
    pub fn arg_perigee_rate(&self) -> f64 {
        self.argp_dot
    }

    /// Mean anomaly rate including the J2 correction, rad/min.
    pub fn mean_anomaly_rate(&self) -> f64 {
        self.m_dot
    }

    pub fn propagate(&self, epoch: DateTime<Utc>) -> Result<StateVector, PropagationError> {
        let t = crate::elements::seconds_between(self.epoch, epoch) / 60.0;

        let n = self.n0 + 2.0 * self.half_n_dot * t;
        let decayed = |perigee_km: f64| PropagationError::Decayed {
            catalog_id: self.catalog_id,
            epoch,
            perigee_km,
        };
        if n <= 0.0 {
            return Err(decayed(0.0));
        }
        let a = self.a0 * (self.n0 / n).powf(2.0 / 3.0);
        let e = self.e0;
        if a * (1.0 - e) < EARTH_RADIUS_KM {
            return Err(decayed(a * (1.0 - e)));
        }

        let raan = self.raan0 + self.raan_dot * t;
        let argp = self.argp0 + self.argp_dot * t;
        let mean_anomaly = self.m0 + self.m_dot * t + self.half_n_dot * t * t;

        let solution = solve_kepler(mean_anomaly, e, KEPLER_TOLERANCE, KEPLER_MAX_ITERATIONS)
            .ok_or(PropagationError::KeplerDivergence {
                catalog_id: self.catalog_id,
                epoch,
                eccentricity: e,
                iterations: KEPLER_MAX_ITERATIONS,
            })?;
        let (sin_e, cos_e) = solution.eccentric_anomaly.sin_cos();
        let beta = (1.0 - e * e).sqrt();

        // Perifocal frame.
        let x = a * (cos_e - e);
        let y = a * beta * sin_e;
        let e_dot = (n / 60.0) / (1.0 - e * cos_e);
        let vx = -a * sin_e * e_dot;
        let vy = a * beta * cos_e * e_dot;

        let (sin_o, cos_o) = raan.sin_cos();
        let (sin_w, cos_w) = argp.sin_cos();
        let (sin_i, cos_i) = self.i0.sin_cos();
        let p_axis = [
            cos_o * cos_w - sin_o * sin_w * cos_i,
            sin_o * cos_w + cos_o * sin_w * cos_i,
            sin_w * sin_i,
        ];
        let q_axis = [
            -cos_o * sin_w - sin_o * cos_w * cos_i,
            -sin_o * sin_w + cos_o * cos_w * cos_i,
            cos_w * sin_i,
        ];

        Ok(StateVector {
            epoch,
            position_km: [
                x * p_axis[0] + y * q_axis[0],
                x * p_axis[1] + y * q_axis[1],
                x * p_axis[2] + y * q_axis[2],
            ],
            velocity_km_s: [
                vx * p_axis[0] + vy * q_axis[0],
                vx * p_axis[1] + vy * q_axis[1],
                vx * p_axis[2] + vy * q_axis[2],
            ],
        })
    }
}
