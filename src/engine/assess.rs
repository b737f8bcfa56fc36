use std::sync::Arc;

use rayon::prelude::*;

use crate::approach::{estimate_probability, refine, ClosestApproach, Encounter};
use crate::config::EngineConfig;
use crate::engine::error::EngineError;
use crate::engine::request::PairAssessmentRequest;
use crate::engine::result::{
    Diagnostics, FilterStage, PairAssessmentResult, PropagationWarning, RefinedApproach,
};
use crate::propagate::{PropagationModel, Satellite, Trajectory, TrajectoryCache};
use crate::screening::{band_gap_km, find_candidate_windows, quick_reject, SampledApproach};
use crate::window::TimeWindow;

/// Where the filter cascade left a pair.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Screening {
    Rejected {
        stage: FilterStage,
        distance_km: f64,
        closest: Option<SampledApproach>,
    },
    Candidates {
        windows: Vec<TimeWindow>,
        closest: Option<SampledApproach>,
    },
}

/// Stateless conjunction assessment with a fixed configuration.
#[derive(Debug, Clone, Default)]
pub struct ConjunctionEngine {
    config: EngineConfig,
}

impl ConjunctionEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn assess(&self, request: &PairAssessmentRequest) -> Result<PairAssessmentResult, EngineError> {
        self.assess_cached(request, None)
    }

    /// Like [`assess`](Self::assess), drawing sampled trajectories from
    /// `cache` when given.
    pub fn assess_cached(
        &self,
        request: &PairAssessmentRequest,
        cache: Option<&TrajectoryCache>,
    ) -> Result<PairAssessmentResult, EngineError> {
        self.validate(request)?;
        let a = Satellite::new(request.primary.clone(), self.config.propagation_model)?;
        let b = Satellite::new(request.secondary.clone(), self.config.propagation_model)?;
        self.run(&a, &b, request, cache)
    }

    /// Assess two prepared satellites. `request` supplies the window,
    /// thresholds and radii; its element sets must be the satellites' own.
    pub fn assess_satellites(
        &self,
        a: &Satellite,
        b: &Satellite,
        request: &PairAssessmentRequest,
        cache: Option<&TrajectoryCache>,
    ) -> Result<PairAssessmentResult, EngineError> {
        debug_assert!(
            *request.primary == *a.elements() && *request.secondary == *b.elements(),
            "request element sets differ from the satellites being assessed"
        );
        self.validate(request)?;
        self.run(a, b, request, cache)
    }

    fn validate(&self, request: &PairAssessmentRequest) -> Result<(), EngineError> {
        request.validate(&self.config)?;
        self.config
            .probability_model
            .validate()
            .map_err(|reason| EngineError::invalid_request("probability_model", reason))
    }

    fn run(
        &self,
        a: &Satellite,
        b: &Satellite,
        request: &PairAssessmentRequest,
        cache: Option<&TrajectoryCache>,
    ) -> Result<PairAssessmentResult, EngineError> {
        let mut diagnostics = Diagnostics::default();
        let mut warnings = Vec::new();

        // Mixed models take the wider SGP4 bands.
        let band_model = if a.model() == b.model() {
            a.model()
        } else {
            PropagationModel::Sgp4
        };
        let screening = if quick_reject(
            a.elements(),
            b.elements(),
            request.apsis_threshold_km,
            band_model,
        ) {
            Screening::Rejected {
                stage: FilterStage::ApsisBands,
                distance_km: band_gap_km(a.elements(), b.elements(), band_model),
                closest: None,
            }
        } else {
            let grid = request.grid();
            let sample = |sat: &Satellite| match cache {
                Some(cache) => cache.get_or_sample(sat, grid),
                None => Arc::new(Trajectory::sample(sat, grid)),
            };
            let (ta, tb) = rayon::join(|| sample(a), || sample(b));

            diagnostics.samples = grid.len();
            diagnostics.skipped_samples = (ta.len() - ta.valid_count()) + (tb.len() - tb.valid_count());
            warnings = collect_warnings(&ta, &tb);
            ensure_common_sample(&ta, &tb)?;

            let spatial = find_candidate_windows(&ta, &tb, &request.window, request.spatial_threshold_km);
            if spatial.rejected() {
                Screening::Rejected {
                    stage: FilterStage::SpatialProximity,
                    distance_km: spatial.closest.map(|c| c.distance_km).unwrap_or(f64::INFINITY),
                    closest: spatial.closest,
                }
            } else {
                Screening::Candidates {
                    windows: spatial.windows,
                    closest: spatial.closest,
                }
            }
        };

        let (windows, closest) = match screening {
            Screening::Rejected {
                stage,
                distance_km,
                closest,
            } => {
                log::debug!(
                    "pair {} / {} rejected by {} at {:.3} km",
                    a.catalog_id(),
                    b.catalog_id(),
                    stage,
                    distance_km
                );
                return Ok(PairAssessmentResult {
                    primary_id: a.catalog_id(),
                    secondary_id: b.catalog_id(),
                    window: request.window,
                    rejected_by: Some(stage),
                    min_distance_km: distance_km,
                    min_distance_epoch: closest.map(|c| c.epoch),
                    relative_speed_km_s: closest.map(|c| c.relative_speed_km_s),
                    max_probability: 0.0,
                    approaches: Vec::new(),
                    warnings,
                    diagnostics,
                });
            }
            Screening::Candidates { windows, closest } => (windows, closest),
        };
        diagnostics.candidate_windows = windows.len();

        let refinements: Vec<_> = windows
            .par_iter()
            .map(|window| (*window, refine(a, b, window, &self.config.refiner)))
            .collect();

        let mut approaches = Vec::with_capacity(refinements.len());
        for (window, refinement) in refinements {
            diagnostics.refine_evaluations += refinement.evaluations;
            diagnostics.refine_failures += refinement.failed_evaluations;
            if let Some(found) = refinement.approach {
                approaches.push(RefinedApproach {
                    window,
                    epoch: found.epoch,
                    distance_km: found.distance_km,
                    relative_speed_km_s: found.relative_speed_km_s,
                    probability: self.probability(a, b, request, &found),
                });
            } else {
                log::warn!(
                    "pair {} / {}: no propagable epoch in window {} .. {}",
                    a.catalog_id(),
                    b.catalog_id(),
                    window.start,
                    window.stop
                );
            }
        }

        // The sampled minimum competes with the refined ones so the result
        // is never worse than the grid itself.
        let sampled = closest.map(|c| {
            let found = ClosestApproach {
                epoch: c.epoch,
                distance_km: c.distance_km,
                relative_speed_km_s: c.relative_speed_km_s,
            };
            (found, self.probability(a, b, request, &found))
        });
        let candidates = approaches
            .iter()
            .map(|r| {
                (
                    ClosestApproach {
                        epoch: r.epoch,
                        distance_km: r.distance_km,
                        relative_speed_km_s: r.relative_speed_km_s,
                    },
                    r.probability,
                )
            })
            .chain(sampled);

        let (nearest, max_probability) = aggregate(candidates);
        log::debug!(
            "pair {} / {}: {} windows, min {:?} km, max probability {:.3e}",
            a.catalog_id(),
            b.catalog_id(),
            approaches.len(),
            nearest.map(|n| n.distance_km),
            max_probability
        );

        Ok(PairAssessmentResult {
            primary_id: a.catalog_id(),
            secondary_id: b.catalog_id(),
            window: request.window,
            rejected_by: None,
            min_distance_km: nearest.map(|n| n.distance_km).unwrap_or(f64::INFINITY),
            min_distance_epoch: nearest.map(|n| n.epoch),
            relative_speed_km_s: nearest.map(|n| n.relative_speed_km_s),
            max_probability,
            approaches,
            warnings,
            diagnostics,
        })
    }

    fn probability(
        &self,
        a: &Satellite,
        b: &Satellite,
        request: &PairAssessmentRequest,
        found: &ClosestApproach,
    ) -> f64 {
        let encounter = Encounter {
            miss_distance_km: found.distance_km,
            relative_speed_km_s: found.relative_speed_km_s,
            age_days: a
                .elements()
                .age_days(found.epoch)
                .abs()
                .max(b.elements().age_days(found.epoch).abs()),
        };
        estimate_probability(
            &encounter,
            request.combined_radius_km(),
            &self.config.probability_model,
        )
    }
}

/// Assess with the default engine configuration.
pub fn assess(request: &PairAssessmentRequest) -> Result<PairAssessmentResult, EngineError> {
    ConjunctionEngine::default().assess(request)
}

/// Smallest distance (earliest epoch on ties) and largest probability,
/// independent of the order candidates arrive in.
fn aggregate(
    candidates: impl Iterator<Item = (ClosestApproach, f64)>,
) -> (Option<ClosestApproach>, f64) {
    let mut nearest: Option<ClosestApproach> = None;
    let mut max_probability: f64 = 0.0;
    for (candidate, probability) in candidates {
        max_probability = max_probability.max(probability);
        let closer = match &nearest {
            None => true,
            Some(best) => {
                candidate.distance_km < best.distance_km
                    || (candidate.distance_km == best.distance_km && candidate.epoch < best.epoch)
            }
        };
        if closer {
            nearest = Some(candidate);
        }
    }
    (nearest, max_probability)
}

fn collect_warnings(a: &Trajectory, b: &Trajectory) -> Vec<PropagationWarning> {
    let mut warnings: Vec<PropagationWarning> = a
        .failures()
        .chain(b.failures())
        .map(PropagationWarning::from)
        .collect();
    warnings.sort_by(|x, y| (x.epoch, x.catalog_id).cmp(&(y.epoch, y.catalog_id)));
    for trajectory in [a, b] {
        let skipped = trajectory.len() - trajectory.valid_count();
        if skipped > 0 {
            log::warn!(
                "catalog {}: skipped {} of {} samples after propagation failures",
                trajectory.catalog_id(),
                skipped,
                trajectory.len()
            );
        }
    }
    warnings
}

/// Fail the pair when no grid epoch has a state for both objects.
fn ensure_common_sample(a: &Trajectory, b: &Trajectory) -> Result<(), EngineError> {
    if a.valid().any(|(i, _)| b.state(i).is_some()) {
        return Ok(());
    }
    let source = a
        .failures()
        .next()
        .or_else(|| b.failures().next())
        .cloned();
    match source {
        Some(source) => Err(EngineError::PropagationDivergence {
            catalog_id: source.catalog_id(),
            source,
        }),
        // Unreachable with a non-empty grid; treat as a malformed request.
        None => Err(EngineError::invalid_request("window", "no sample epochs")),
    }
}
