use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::Duration;
use rayon::prelude::*;

use crate::elements::Catalog;
use crate::engine::assess::ConjunctionEngine;
use crate::engine::dataset::LabelRow;
use crate::engine::error::EngineError;
use crate::engine::request::{
    PairAssessmentRequest, DEFAULT_APSIS_THRESHOLD_KM, DEFAULT_SAMPLING_INTERVAL_S,
    DEFAULT_SPATIAL_THRESHOLD_KM,
};
use crate::engine::result::PairAssessmentResult;
use crate::propagate::{SampleGrid, Satellite, TrajectoryCache};
use crate::screening::KdTree;
use crate::window::TimeWindow;

/// Objects whose states at the first object's element epoch agree within this
/// distance are treated as one physical object (docked, duplicate entries).
pub const IDENTICAL_TOLERANCE_KM: f64 = 0.1;

/// Window, thresholds and radii shared by every pair of a batch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatchParams {
    pub window: TimeWindow,
    pub sampling_interval: Duration,
    /// Catalog-wide discovery radius.
    pub pair_threshold_km: f64,
    pub spatial_threshold_km: f64,
    pub apsis_threshold_km: f64,
    pub primary_radius_m: f64,
    pub secondary_radius_m: f64,
    pub identical_tolerance_km: f64,
}

impl BatchParams {
    pub fn new(window: TimeWindow, primary_radius_m: f64, secondary_radius_m: f64) -> Self {
        Self {
            window,
            sampling_interval: Duration::seconds(DEFAULT_SAMPLING_INTERVAL_S),
            pair_threshold_km: DEFAULT_SPATIAL_THRESHOLD_KM,
            spatial_threshold_km: DEFAULT_SPATIAL_THRESHOLD_KM,
            apsis_threshold_km: DEFAULT_APSIS_THRESHOLD_KM,
            primary_radius_m,
            secondary_radius_m,
            identical_tolerance_km: IDENTICAL_TOLERANCE_KM,
        }
    }

    fn request<'a>(&self, a: &'a Satellite, b: &'a Satellite) -> PairAssessmentRequest<'a> {
        PairAssessmentRequest {
            primary: a.elements(),
            secondary: b.elements(),
            window: self.window,
            sampling_interval: self.sampling_interval,
            spatial_threshold_km: self.spatial_threshold_km,
            apsis_threshold_km: self.apsis_threshold_km,
            primary_radius_m: self.primary_radius_m,
            secondary_radius_m: self.secondary_radius_m,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    /// Satellites that could be initialised for propagation.
    pub satellites: usize,
    pub pairs_discovered: usize,
    pub results: Vec<PairAssessmentResult>,
    pub rows: Vec<LabelRow>,
    /// Pairs dropped after an assessment error.
    pub failed: usize,
}

/// Index pairs `(i, j)`, `i < j`, that come within `threshold_km` of each
/// other at any grid epoch. Same-catalog pairs and physically identical
/// objects are dropped. Sorted.
pub fn discover_pairs(
    satellites: &[Satellite],
    grid: SampleGrid,
    threshold_km: f64,
    identical_tolerance_km: f64,
    cache: &TrajectoryCache,
) -> Vec<(usize, usize)> {
    let trajectories: Vec<_> = satellites
        .par_iter()
        .map(|sat| cache.get_or_sample(sat, grid))
        .collect();

    let per_epoch: Vec<Vec<(usize, usize)>> = (0..grid.len())
        .into_par_iter()
        .map(|k| {
            let tree = KdTree::new(
                trajectories
                    .iter()
                    .enumerate()
                    .filter_map(|(i, t)| t.state(k).map(|s| (s.position_km, i))),
            );
            tree.pairs_within(threshold_km)
        })
        .collect();

    let candidates: BTreeSet<(usize, usize)> = per_epoch.into_iter().flatten().collect();

    candidates
        .into_iter()
        .filter(|&(i, j)| {
            let (a, b) = (&satellites[i], &satellites[j]);
            if a.catalog_id() == b.catalog_id() {
                log::debug!("skipping pair {i}/{j}: same catalog id {}", a.catalog_id());
                return false;
            }
            if physically_identical(a, b, identical_tolerance_km) {
                log::debug!(
                    "skipping pair {} / {}: identical orbits",
                    a.catalog_id(),
                    b.catalog_id()
                );
                return false;
            }
            true
        })
        .collect()
}

fn physically_identical(a: &Satellite, b: &Satellite, tolerance_km: f64) -> bool {
    let at = a.elements().epoch();
    match (a.propagate(at), b.propagate(at)) {
        (Ok(sa), Ok(sb)) => sa.distance_to(&sb) <= tolerance_km,
        _ => false,
    }
}

/// Catalog-wide screening: discover candidate pairs, then assess each one.
pub struct BatchRunner {
    engine: ConjunctionEngine,
    cache: Arc<TrajectoryCache>,
}

impl BatchRunner {
    pub fn new(engine: ConjunctionEngine, cache: Arc<TrajectoryCache>) -> Self {
        Self { engine, cache }
    }

    pub fn engine(&self) -> &ConjunctionEngine {
        &self.engine
    }

    pub fn cache(&self) -> &TrajectoryCache {
        &self.cache
    }

    pub fn run(&self, catalog: &Catalog, params: &BatchParams) -> Result<BatchReport, EngineError> {
        let model = self.engine.config().propagation_model;
        let satellites: Vec<Satellite> = catalog
            .entries()
            .iter()
            .filter_map(|elements| match Satellite::new(elements.clone(), model) {
                Ok(sat) => Some(sat),
                Err(e) => {
                    log::warn!("Skipping {}: {}", elements.display_name(), e);
                    None
                }
            })
            .collect();

        let Some(first) = satellites.first() else {
            return Ok(BatchReport::default());
        };
        params.request(first, first).validate(self.engine.config())?;
        if !(params.pair_threshold_km.is_finite() && params.pair_threshold_km >= 0.0) {
            return Err(EngineError::invalid_request(
                "pair_threshold_km",
                format!("must be finite and non-negative, got {}", params.pair_threshold_km),
            ));
        }

        let grid = SampleGrid::new(params.window, params.sampling_interval);
        log::info!(
            "Discovering pairs among {} satellites over {} epochs",
            satellites.len(),
            grid.len()
        );
        let pairs = discover_pairs(
            &satellites,
            grid,
            params.pair_threshold_km,
            params.identical_tolerance_km,
            &self.cache,
        );
        log::info!("{} candidate pairs to assess", pairs.len());

        let total = pairs.len();
        let done = AtomicUsize::new(0);
        let failed = AtomicUsize::new(0);

        let assessed: Vec<(PairAssessmentResult, LabelRow)> = pairs
            .par_iter()
            .filter_map(|&(i, j)| {
                let (a, b) = (&satellites[i], &satellites[j]);
                let outcome = self
                    .engine
                    .assess_satellites(a, b, &params.request(a, b), Some(&self.cache));

                let finished = done.fetch_add(1, Ordering::Relaxed) + 1;
                report_progress(finished, total);

                match outcome {
                    Ok(result) => {
                        let row = LabelRow::new(
                            a,
                            b,
                            &result,
                            (params.primary_radius_m, params.secondary_radius_m),
                        );
                        Some((result, row))
                    }
                    Err(e) => {
                        log::warn!(
                            "Pair {} / {} failed: {}",
                            a.catalog_id(),
                            b.catalog_id(),
                            e
                        );
                        failed.fetch_add(1, Ordering::Relaxed);
                        None
                    }
                }
            })
            .collect();

        let (results, rows) = assessed.into_iter().unzip();
        Ok(BatchReport {
            satellites: satellites.len(),
            pairs_discovered: total,
            results,
            rows,
            failed: failed.into_inner(),
        })
    }
}

fn report_progress(finished: usize, total: usize) {
    let quarter = total / 4;
    if quarter == 0 {
        return;
    }
    if finished % quarter == 0 && finished / quarter <= 3 {
        log::info!("[{}/4] pairs assessed ({finished}/{total})", finished / quarter);
    }
}
