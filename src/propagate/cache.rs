use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};

use crate::propagate::satellite::{PropagationModel, Satellite};
use crate::propagate::trajectory::{SampleGrid, Trajectory};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct TrajectoryKey {
    catalog_id: u64,
    element_epoch: DateTime<Utc>,
    /// Bit patterns of the mean elements; two sets may share id and epoch.
    elements: [u64; 9],
    grid: SampleGrid,
    model: PropagationModel,
}

impl TrajectoryKey {
    fn new(satellite: &Satellite, grid: SampleGrid) -> Self {
        let elements = satellite.elements();
        let m = elements.mean_elements();
        Self {
            catalog_id: elements.catalog_id(),
            element_epoch: elements.epoch(),
            elements: [
                m.inclination_deg,
                m.raan_deg,
                m.eccentricity,
                m.arg_perigee_deg,
                m.mean_anomaly_deg,
                m.mean_motion_rev_day,
                m.bstar,
                m.mean_motion_dot,
                m.mean_motion_ddot,
            ]
            .map(f64::to_bits),
            grid,
            model: satellite.model(),
        }
    }
}

/// Shared store of sampled trajectories for batch runs.
///
/// Nothing in the engine caches on its own; callers that assess many pairs
/// on one grid hand a cache in so each satellite is propagated once.
#[derive(Debug, Default)]
pub struct TrajectoryCache {
    entries: RwLock<HashMap<TrajectoryKey, Arc<Trajectory>>>,
}

impl TrajectoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_sample(&self, satellite: &Satellite, grid: SampleGrid) -> Arc<Trajectory> {
        let key = TrajectoryKey::new(satellite, grid);

        if let Some(hit) = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return hit.clone();
        }

        // Sample outside the lock; a racing thread may do the same work, and
        // the first insert wins so every caller shares one trajectory.
        let sampled = Arc::new(Trajectory::sample(satellite, grid));
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(key)
            .or_insert(sampled)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::{MeanElements, OrbitalElementSet};
    use crate::window::TimeWindow;
    use chrono::{Duration, TimeZone};

    fn satellite(catalog_id: u64) -> Satellite {
        let elements = OrbitalElementSet::new(
            catalog_id,
            Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap(),
            MeanElements {
                inclination_deg: 97.5,
                raan_deg: 10.0,
                eccentricity: 0.001,
                arg_perigee_deg: 90.0,
                mean_anomaly_deg: 0.0,
                mean_motion_rev_day: 14.8,
                bstar: 0.0,
                mean_motion_dot: 0.0,
                mean_motion_ddot: 0.0,
            },
        )
        .unwrap();
        Satellite::new(elements, PropagationModel::Secular).unwrap()
    }

    #[test]
    fn reuses_trajectory_for_same_key() {
        let cache = TrajectoryCache::new();
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 6, 0, 0).unwrap();
        let grid = SampleGrid::new(
            TimeWindow::starting_at(start, Duration::hours(2)),
            Duration::minutes(10),
        );

        let sat = satellite(11);
        let first = cache.get_or_sample(&sat, grid);
        let second = cache.get_or_sample(&sat, grid);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);

        let other_grid = SampleGrid::new(
            TimeWindow::starting_at(start, Duration::hours(2)),
            Duration::minutes(5),
        );
        cache.get_or_sample(&sat, other_grid);
        cache.get_or_sample(&satellite(12), grid);
        assert_eq!(cache.len(), 3);

        // Same catalog number and epoch, different orbit.
        let mut mean = *sat.elements().mean_elements();
        mean.raan_deg += 1.0;
        let moved = OrbitalElementSet::new(11, sat.elements().epoch(), mean).unwrap();
        let moved = Satellite::new(moved, PropagationModel::Secular).unwrap();
        let third = cache.get_or_sample(&moved, grid);
        assert!(!Arc::ptr_eq(&first, &third));
        assert_eq!(cache.len(), 4);

        cache.clear();
        assert!(cache.is_empty());
    }
}
