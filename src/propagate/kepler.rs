use std::f64::consts::PI;

use crate::constants::TWO_PI;

pub const KEPLER_TOLERANCE: f64 = 1e-8;
pub const KEPLER_MAX_ITERATIONS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeplerSolution {
    pub eccentric_anomaly: f64,
    pub iterations: usize,
}

/// Newton solve of `E - e sin E = M` for elliptic orbits.
///
/// Returns `None` when the step is still above `tolerance` after
/// `max_iterations` updates.
pub fn solve_kepler(
    mean_anomaly: f64,
    eccentricity: f64,
    tolerance: f64,
    max_iterations: usize,
) -> Option<KeplerSolution> {
    let m = wrap_pi(mean_anomaly);
    let mut e_anom = if eccentricity < 0.8 {
        m + eccentricity * m.sin()
    } else {
        m + (0.85 * eccentricity).copysign(m)
    };

    for iteration in 1..=max_iterations {
        let f = e_anom - eccentricity * e_anom.sin() - m;
        let f_prime = 1.0 - eccentricity * e_anom.cos();
        let delta = f / f_prime;
        e_anom -= delta;
        if delta.abs() < tolerance {
            return Some(KeplerSolution {
                eccentric_anomaly: e_anom,
                iterations: iteration,
            });
        }
    }

    None
}

/// Reduce an angle to `[-pi, pi)`.
pub fn wrap_pi(angle: f64) -> f64 {
    (angle + PI).rem_euclid(TWO_PI) - PI
}
