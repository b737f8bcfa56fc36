use serde::{Deserialize, Serialize};
use statrs::function::erf::{erf, erfc};
use statrs::function::gamma::ln_gamma;

/// Beyond this many standard deviations the disk integral is 0 or 1 to
/// double precision.
const SIGMA_CUTOFF: f64 = 40.0;

/// Above this non-centrality the Poisson series gets long; the disk edge is
/// then locally straight and a one-dimensional normal tail is exact enough.
const SERIES_LIMIT: f64 = 1.0e4;

/// How the position uncertainty at closest approach is modelled.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProbabilityModel {
    /// Worst case over all isotropic standard deviations.
    #[default]
    MaxProbability,
    Isotropic { sigma_km: f64 },
    /// Standard deviation growing linearly with the older element set's age.
    AgeScaled {
        base_sigma_km: f64,
        growth_km_per_day: f64,
    },
}

impl ProbabilityModel {
    /// Standard deviation for an encounter, `None` for the worst-case model.
    pub fn sigma_km(&self, encounter: &Encounter) -> Option<f64> {
        match *self {
            ProbabilityModel::MaxProbability => None,
            ProbabilityModel::Isotropic { sigma_km } => Some(sigma_km),
            ProbabilityModel::AgeScaled {
                base_sigma_km,
                growth_km_per_day,
            } => Some(base_sigma_km + growth_km_per_day * encounter.age_days.abs()),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        let positive = |name: &str, value: f64| {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(format!("{name} must be positive and finite, got {value}"))
            }
        };
        match *self {
            ProbabilityModel::MaxProbability => Ok(()),
            ProbabilityModel::Isotropic { sigma_km } => positive("sigma_km", sigma_km),
            ProbabilityModel::AgeScaled {
                base_sigma_km,
                growth_km_per_day,
            } => {
                positive("base_sigma_km", base_sigma_km)?;
                if growth_km_per_day.is_finite() && growth_km_per_day >= 0.0 {
                    Ok(())
                } else {
                    Err(format!(
                        "growth_km_per_day must be non-negative and finite, got {growth_km_per_day}"
                    ))
                }
            }
        }
    }
}

/// Geometry of a short, rectilinear encounter at closest approach.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Encounter {
    pub miss_distance_km: f64,
    pub relative_speed_km_s: f64,
    /// Age of the older element set at the encounter, days.
    pub age_days: f64,
}

/// Probability that the two hard bodies overlap, in `[0, 1]`.
///
/// The miss vector lies in the encounter plane (normal to the relative
/// velocity), so only the miss distance enters; the relative speed only
/// matters for the rectilinear assumption itself.
pub fn estimate_probability(
    encounter: &Encounter,
    combined_radius_km: f64,
    model: &ProbabilityModel,
) -> f64 {
    let d = encounter.miss_distance_km.max(0.0);
    if !(combined_radius_km > 0.0) {
        return 0.0;
    }
    let p = match model.sigma_km(encounter) {
        None => max_probability(d, combined_radius_km),
        Some(sigma) => disk_probability(d, combined_radius_km, sigma),
    };
    p.clamp(0.0, 1.0)
}

/// Largest probability any isotropic standard deviation can give:
/// `P = (erf((r+1)t / 2sqrt(r)) + erf((r-1)t / 2sqrt(r))) / 2` with `r = R/d`
/// and `t = sqrt(-ln((1-r)/(1+r)))`. An encounter inside the hard body is
/// certain.
pub fn max_probability(miss_distance_km: f64, combined_radius_km: f64) -> f64 {
    if combined_radius_km <= 0.0 {
        return 0.0;
    }
    if miss_distance_km <= 0.0 {
        return 1.0;
    }
    let r = combined_radius_km / miss_distance_km;
    if r >= 1.0 {
        return 1.0;
    }
    let t = (r.ln_1p() - (-r).ln_1p()).sqrt();
    let scale = t / (2.0 * r.sqrt());
    0.5 * (erf((r + 1.0) * scale) + erf((r - 1.0) * scale))
}

/// Mass of a circular normal `N(d, sigma^2 I)` inside the disk of radius `R`
/// around the origin: a Poisson-weighted sum of central chi-square CDFs.
pub fn disk_probability(miss_distance_km: f64, combined_radius_km: f64, sigma_km: f64) -> f64 {
    let d = miss_distance_km.max(0.0);
    let radius = combined_radius_km;
    if radius <= 0.0 {
        return 0.0;
    }
    if !(sigma_km > 0.0) {
        return if d < radius { 1.0 } else { 0.0 };
    }
    if (d - radius) / sigma_km > SIGMA_CUTOFF {
        return 0.0;
    }
    if (radius - d) / sigma_km > SIGMA_CUTOFF {
        return 1.0;
    }

    let mu = d * d / (2.0 * sigma_km * sigma_km);
    let x = radius * radius / (2.0 * sigma_km * sigma_km);
    if mu > SERIES_LIMIT || x > SERIES_LIMIT {
        // Edge is straight on the scale of sigma.
        return 0.5 * erfc((d - radius) / (sigma_km * std::f64::consts::SQRT_2));
    }

    let terms = (mu + SIGMA_CUTOFF * mu.sqrt() + SIGMA_CUTOFF).ceil() as usize;
    let ln_mu = if mu > 0.0 { mu.ln() } else { f64::NEG_INFINITY };
    let ln_x = x.ln();

    let mut total = 0.0;
    // Running sum of exp(-x) x^m / m! for m <= n.
    let mut lower_tail = 0.0;
    for n in 0..=terms {
        let nf = n as f64;
        lower_tail += (-x + nf * ln_x - ln_gamma(nf + 1.0)).exp();
        let weight = if n == 0 {
            (-mu).exp()
        } else {
            (-mu + nf * ln_mu - ln_gamma(nf + 1.0)).exp()
        };
        total += weight * (1.0 - lower_tail).max(0.0);
    }
    total
}
