use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::propagate::{SampleGrid, Satellite, StateVector};
use crate::window::TimeWindow;

const INV_PHI: f64 = 0.618_033_988_749_894_8;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefinerConfig {
    /// Coarse scan step, seconds.
    pub coarse_step_s: f64,
    /// Stop once the golden-section bracket is narrower than this, seconds.
    pub tolerance_s: f64,
    pub max_iterations: usize,
}

impl Default for RefinerConfig {
    fn default() -> Self {
        Self {
            coarse_step_s: 60.0,
            tolerance_s: 1.0,
            max_iterations: 100,
        }
    }
}

/// Local minimum of the separation inside one window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClosestApproach {
    pub epoch: DateTime<Utc>,
    pub distance_km: f64,
    pub relative_speed_km_s: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Refinement {
    /// `None` when no epoch in the window could be propagated for both.
    pub approach: Option<ClosestApproach>,
    pub evaluations: usize,
    pub failed_evaluations: usize,
    pub iterations: usize,
}

struct Evaluator<'a> {
    a: &'a Satellite,
    b: &'a Satellite,
    evaluations: usize,
    failed: usize,
    best: Option<(f64, StateVector, StateVector)>,
}

impl Evaluator<'_> {
    /// Squared separation at `epoch`, infinite when either side fails.
    fn distance_squared(&mut self, epoch: DateTime<Utc>) -> f64 {
        self.evaluations += 1;
        match (self.a.propagate(epoch), self.b.propagate(epoch)) {
            (Ok(sa), Ok(sb)) => {
                let d2 = sa.distance_squared_to(&sb);
                if self.best.as_ref().map_or(true, |(best, _, _)| d2 < *best) {
                    self.best = Some((d2, sa, sb));
                }
                d2
            }
            _ => {
                self.failed += 1;
                f64::INFINITY
            }
        }
    }
}

/// Coarse scan of `window` followed by golden-section search on the squared
/// distance over one coarse step on each side of the best scan point.
pub fn refine(a: &Satellite, b: &Satellite, window: &TimeWindow, config: &RefinerConfig) -> Refinement {
    let step = seconds(config.coarse_step_s.max(config.tolerance_s).max(1e-3));
    let mut eval = Evaluator {
        a,
        b,
        evaluations: 0,
        failed: 0,
        best: None,
    };

    let grid = SampleGrid::new(*window, step);
    for epoch in grid.epochs() {
        eval.distance_squared(epoch);
    }

    let Some(scan_best) = eval.best.as_ref().map(|(_, sa, _)| sa.epoch) else {
        return Refinement {
            approach: None,
            evaluations: eval.evaluations,
            failed_evaluations: eval.failed,
            iterations: 0,
        };
    };

    let bracket = TimeWindow::around(scan_best, step)
        .clip(window)
        .unwrap_or(TimeWindow::new(scan_best, scan_best));
    let origin = bracket.start;
    let at = |offset_s: f64| origin + seconds(offset_s);

    let mut lo = 0.0;
    let mut hi = crate::elements::seconds_between(bracket.start, bracket.stop);
    let mut x1 = hi - INV_PHI * (hi - lo);
    let mut x2 = lo + INV_PHI * (hi - lo);
    let mut f1 = eval.distance_squared(at(x1));
    let mut f2 = eval.distance_squared(at(x2));
    let mut iterations = 0;

    while hi - lo > config.tolerance_s && iterations < config.max_iterations {
        iterations += 1;
        if f1 <= f2 {
            hi = x2;
            x2 = x1;
            f2 = f1;
            x1 = hi - INV_PHI * (hi - lo);
            f1 = eval.distance_squared(at(x1));
        } else {
            lo = x1;
            x1 = x2;
            f1 = f2;
            x2 = lo + INV_PHI * (hi - lo);
            f2 = eval.distance_squared(at(x2));
        }
    }
    eval.distance_squared(at(0.5 * (lo + hi)));

    let approach = eval.best.map(|(d2, sa, sb)| ClosestApproach {
        epoch: sa.epoch,
        distance_km: d2.sqrt(),
        relative_speed_km_s: sa.relative_speed_to(&sb),
    });

    Refinement {
        approach,
        evaluations: eval.evaluations,
        failed_evaluations: eval.failed,
        iterations,
    }
}

fn seconds(value: f64) -> Duration {
    Duration::microseconds((value * 1e6).round() as i64)
}
