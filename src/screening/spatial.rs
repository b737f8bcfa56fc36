use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::propagate::Trajectory;
use crate::screening::kdtree::KdTree;
use crate::window::{merge_windows, TimeWindow};

/// Closest simultaneous sampled separation of a pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SampledApproach {
    pub distance_km: f64,
    pub epoch: DateTime<Utc>,
    pub relative_speed_km_s: f64,
}

/// Outcome of the proximity screen over two trajectories on the same grid.
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialScreen {
    /// Merged, clipped sub-windows worth refining. Empty when nothing came
    /// within the threshold.
    pub windows: Vec<TimeWindow>,
    /// `None` only when no grid epoch has a valid state for both objects.
    pub closest: Option<SampledApproach>,
    /// Number of `(A sample, B sample)` matches that seeded the windows.
    pub matches: usize,
}

impl SpatialScreen {
    pub fn rejected(&self) -> bool {
        self.windows.is_empty()
    }
}

/// Match every valid sample of `b` against the sampled path of `a`. Any A
/// sample within `dist_threshold_km` seeds a window of one grid interval on
/// each side of both matched epochs.
///
/// Both trajectories must share a grid.
pub fn find_candidate_windows(
    a: &Trajectory,
    b: &Trajectory,
    window: &TimeWindow,
    dist_threshold_km: f64,
) -> SpatialScreen {
    let grid = a.grid();
    debug_assert_eq!(grid, b.grid());
    let interval = grid.interval();

    let tree = KdTree::new(a.valid().map(|(i, state)| (state.position_km, i)));

    let mut seeds = Vec::new();
    let mut matches = 0;
    for (j, state) in b.valid() {
        for i in tree.within_radius(state.position_km, dist_threshold_km) {
            matches += 1;
            seeds.push(TimeWindow::around(grid.epoch(i), interval));
            if i != j {
                seeds.push(TimeWindow::around(grid.epoch(j), interval));
            }
        }
    }

    let windows = merge_windows(seeds.iter().filter_map(|w| w.clip(window)).collect());

    let closest = a
        .valid()
        .filter_map(|(i, sa)| b.state(i).map(|sb| (sa, sb)))
        .map(|(sa, sb)| SampledApproach {
            distance_km: sa.distance_to(sb),
            epoch: sa.epoch,
            relative_speed_km_s: sa.relative_speed_to(sb),
        })
        .fold(None, |best: Option<SampledApproach>, candidate| match best {
            Some(best) if best.distance_km <= candidate.distance_km => Some(best),
            _ => Some(candidate),
        });

    log::debug!(
        "spatial filter {} / {}: {} matches, {} windows, closest sample {:?} km",
        a.catalog_id(),
        b.catalog_id(),
        matches,
        windows.len(),
        closest.map(|c| c.distance_km)
    );

    SpatialScreen {
        windows,
        closest,
        matches,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::{MeanElements, OrbitalElementSet};
    use crate::propagate::{PropagationModel, SampleGrid, Satellite};
    use chrono::{Duration, TimeZone};

    fn epoch() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap()
    }

    fn satellite(catalog_id: u64, raan_deg: f64, inclination_deg: f64) -> Satellite {
        let elements = OrbitalElementSet::new(
            catalog_id,
            epoch(),
            MeanElements {
                inclination_deg,
                raan_deg,
                eccentricity: 0.0,
                arg_perigee_deg: 0.0,
                mean_anomaly_deg: 0.0,
                mean_motion_rev_day: 15.2,
                bstar: 0.0,
                mean_motion_dot: 0.0,
                mean_motion_ddot: 0.0,
            },
        )
        .unwrap();
        Satellite::new(elements, PropagationModel::Secular).unwrap()
    }

    fn screen(a: &Satellite, b: &Satellite, threshold: f64) -> SpatialScreen {
        let window = TimeWindow::starting_at(epoch(), Duration::hours(6));
        let grid = SampleGrid::new(window, Duration::minutes(5));
        find_candidate_windows(
            &Trajectory::sample(a, grid),
            &Trajectory::sample(b, grid),
            &window,
            threshold,
        )
    }

    #[test]
    fn identical_orbits_cover_whole_window() {
        let a = satellite(1, 30.0, 60.0);
        let b = satellite(2, 30.0, 60.0);
        let result = screen(&a, &b, 12.0);
        assert_eq!(
            result.windows,
            vec![TimeWindow::starting_at(epoch(), Duration::hours(6))]
        );
        let closest = result.closest.unwrap();
        assert!(closest.distance_km < 1e-9);
        assert_eq!(closest.epoch, epoch());
    }

    #[test]
    fn far_planes_are_rejected_with_closest_sample() {
        // Equatorial rings 90 degrees apart in phase never come close.
        let a = satellite(1, 0.0, 0.0);
        let b = satellite(2, 90.0, 0.0);
        let result = screen(&a, &b, 12.0);
        assert!(result.rejected());
        assert_eq!(result.matches, 0);
        let chord = 2.0 * a.elements().semi_major_axis_km() * (45f64).to_radians().sin();
        assert!((result.closest.unwrap().distance_km - chord).abs() < 1e-6);
    }

    #[test]
    fn windows_are_symmetric_under_swap() {
        // Crossing planes: the paths intersect at the nodes.
        let a = satellite(1, 0.0, 50.0);
        let b = satellite(2, 0.0, 70.0);
        let ab = screen(&a, &b, 200.0);
        let ba = screen(&b, &a, 200.0);
        assert!(!ab.rejected());
        assert_eq!(ab.windows, ba.windows);
        assert_eq!(ab.matches, ba.matches);
        assert_eq!(
            ab.closest.map(|c| c.distance_km),
            ba.closest.map(|c| c.distance_km)
        );
    }
}
