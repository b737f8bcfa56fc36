use crate::constants::{EARTH_RADIUS_KM, J2, J3, TWO_PI};
use crate::elements::OrbitalElementSet;
use crate::propagate::PropagationModel;

/// Orbital period, minutes, above which SGP4 switches to its deep-space branch.
const DEEP_SPACE_PERIOD_MIN: f64 = 225.0;

/// Lunisolar allowance for deep-space orbits, as a fraction of the mean
/// semi-major axis.
const DEEP_SPACE_MARGIN_FRACTION: f64 = 1.0e-3;

/// Bound on how far `model` can place the object outside its mean
/// `[periapsis, apoapsis]` band, km.
///
/// The secular model keeps the radius on the mean ellipse. SGP4 adds the
/// short-period J2 radial terms and the J3 long-period eccentricity, and for
/// deep-space orbits the lunisolar periodics.
pub fn radial_margin_km(elements: &OrbitalElementSet, model: PropagationModel) -> f64 {
    match model {
        PropagationModel::Secular => 0.0,
        PropagationModel::Sgp4 => {
            let a = elements.semi_major_axis_er();
            let e = elements.eccentricity();
            let (sin_i, cos_i) = elements.inclination().sin_cos();
            let p = a * (1.0 - e * e);

            let short_period = 1.5 * J2 / p * (1.0 + (3.0 * cos_i * cos_i - 1.0).abs());
            let long_period = 0.5 * (J3 / J2).abs() * sin_i.abs() * a / p;
            let deep_space = if TWO_PI / elements.brouwer_mean_motion() >= DEEP_SPACE_PERIOD_MIN {
                DEEP_SPACE_MARGIN_FRACTION * a
            } else {
                0.0
            };
            (short_period + long_period + deep_space) * EARTH_RADIUS_KM
        }
    }
}

/// Radial band `(lowest, highest)` the object can occupy under `model`, km.
pub fn radial_band_km(elements: &OrbitalElementSet, model: PropagationModel) -> (f64, f64) {
    let margin = radial_margin_km(elements, model);
    (elements.periapsis_km() - margin, elements.apoapsis_km() + margin)
}

/// Radial gap between the bands of two orbits, km. Negative when the bands
/// overlap. Never larger than the true minimum separation under `model`.
pub fn band_gap_km(a: &OrbitalElementSet, b: &OrbitalElementSet, model: PropagationModel) -> f64 {
    let (a_low, a_high) = radial_band_km(a, model);
    let (b_low, b_high) = radial_band_km(b, model);
    a_low.max(b_low) - a_high.min(b_high)
}

/// True when the radial bands are further apart than `dist_threshold_km`, in
/// which case the two objects can never come within the threshold.
pub fn quick_reject(
    a: &OrbitalElementSet,
    b: &OrbitalElementSet,
    dist_threshold_km: f64,
    model: PropagationModel,
) -> bool {
    let gap = band_gap_km(a, b, model);
    let rejected = gap > dist_threshold_km;
    log::debug!(
        "apsis filter {} / {} ({}): band gap {:.3} km, threshold {:.3} km, rejected={}",
        a.catalog_id(),
        b.catalog_id(),
        model,
        gap,
        dist_threshold_km,
        rejected
    );
    rejected
}
