mod common;

use approx::assert_relative_eq;
use chrono::Duration;

use nearmiss::config::EngineConfig;
use nearmiss::engine::propagate_with;
use nearmiss::propagate::{Satellite, TrajectoryCache};
use nearmiss::screening::{band_gap_km, quick_reject};
use nearmiss::{
    assess, ConjunctionEngine, EngineError, FilterStage, MeanElements, OrbitalElementSet,
    PairAssessmentRequest, PropagationModel, TimeWindow,
};

use common::{circular, elements, engine, epoch, iss};

fn chord_km(elements: &OrbitalElementSet, separation_deg: f64, model: PropagationModel) -> f64 {
    let radius = propagate_with(elements, epoch(), model).unwrap().radius_km();
    2.0 * radius * (separation_deg.to_radians() / 2.0).sin()
}

fn iss_neighbour() -> OrbitalElementSet {
    let iss = iss();
    let mut mean = *iss.mean_elements();
    mean.raan_deg += 0.05;
    OrbitalElementSet::new(90_001, iss.epoch(), mean).unwrap()
}

#[test]
fn coplanar_rings_meet_at_the_chord() {
    let a = circular(1, 0.0, 0.0, 15.0);
    let b = circular(2, 0.0, 0.05, 15.0);
    let window = TimeWindow::starting_at(epoch(), Duration::hours(3));
    let request = PairAssessmentRequest::new(&a, &b, window, 5.0, 5.0);

    let result = engine(PropagationModel::Secular).assess(&request).unwrap();
    let expected = chord_km(&a, 0.05, PropagationModel::Secular);
    assert!(result.rejected_by.is_none());
    assert!(!result.approaches.is_empty());
    assert_relative_eq!(result.min_distance_km, expected, max_relative = 1e-9);
    assert!(result.max_probability > 0.0 && result.max_probability < 1.0);

    let result = engine(PropagationModel::Sgp4).assess(&request).unwrap();
    let expected = chord_km(&a, 0.05, PropagationModel::Sgp4);
    assert_relative_eq!(result.min_distance_km, expected, epsilon = 0.1);
}

#[test]
fn separated_bands_are_rejected_without_sampling() {
    let leo = circular(1, 51.6, 0.0, 15.5);
    let geo = circular(2, 0.0, 0.0, 1.0027);
    let window = TimeWindow::starting_at(epoch(), Duration::days(1));
    let request = PairAssessmentRequest::new(&leo, &geo, window, 5.0, 5.0);

    let result = assess(&request).unwrap();
    assert_eq!(result.rejected_by, Some(FilterStage::ApsisBands));
    assert_eq!(result.rejection_code(), 1);
    assert_eq!(result.diagnostics.samples, 0);
    assert!(result.min_distance_epoch.is_none());
    assert!(result.min_distance_km > 30_000.0);
    assert_eq!(result.max_probability, 0.0);
    assert!(result.approaches.is_empty());
}

#[test]
fn identical_elements_collide() {
    let a = circular(1, 51.6, 30.0, 15.5);
    let b = circular(2, 51.6, 30.0, 15.5);
    let window = TimeWindow::starting_at(epoch(), Duration::hours(2));
    let request = PairAssessmentRequest::new(&a, &b, window, 5.0, 5.0);

    let result = assess(&request).unwrap();
    assert!(result.rejected_by.is_none());
    assert!(result.min_distance_km < 1e-9);
    assert_eq!(result.max_probability, 1.0);
}

#[test]
fn swapping_the_pair_changes_nothing() {
    let a = iss();
    let b = iss_neighbour();
    let window = TimeWindow::starting_at(a.epoch(), Duration::hours(6));
    let request = PairAssessmentRequest::new(&a, &b, window, 10.0, 2.0);
    let engine = ConjunctionEngine::default();

    let forward = engine.assess(&request).unwrap();
    let backward = engine.assess(&request.swapped()).unwrap();
    assert!(forward.rejected_by.is_none());
    assert_eq!(forward.rejected_by, backward.rejected_by);
    assert_eq!(forward.primary_id, backward.secondary_id);
    assert_relative_eq!(forward.min_distance_km, backward.min_distance_km, max_relative = 1e-12);
    assert_relative_eq!(forward.max_probability, backward.max_probability, max_relative = 1e-12);
    assert_eq!(forward.diagnostics.candidate_windows, backward.diagnostics.candidate_windows);
}

#[test]
fn refined_windows_stay_inside_the_request() {
    let a = iss();
    let b = iss_neighbour();
    let window = TimeWindow::starting_at(a.epoch(), Duration::hours(4));
    let request = PairAssessmentRequest::new(&a, &b, window, 5.0, 5.0);

    let result = assess(&request).unwrap();
    assert!(result.min_distance_km < request.spatial_threshold_km);
    for approach in &result.approaches {
        assert!(approach.window.start >= window.start && approach.window.stop <= window.stop);
        assert!(approach.window.contains(approach.epoch));
        assert!(approach.distance_km >= result.min_distance_km);
        assert!(approach.probability <= result.max_probability);
    }
}

#[test]
fn spatial_filter_rejects_only_beyond_the_threshold() {
    let a = circular(1, 0.0, 0.0, 15.0);
    let b = circular(2, 0.0, 0.1, 15.0);
    let chord = chord_km(&a, 0.1, PropagationModel::Secular);
    let window = TimeWindow::starting_at(epoch(), Duration::hours(1));
    let engine = engine(PropagationModel::Secular);

    let outside = PairAssessmentRequest::new(&a, &b, window, 5.0, 5.0)
        .with_spatial_threshold_km(chord * 0.99);
    let rejected = engine.assess(&outside).unwrap();
    assert_eq!(rejected.rejected_by, Some(FilterStage::SpatialProximity));
    assert_eq!(rejected.max_probability, 0.0);
    assert!(rejected.min_distance_epoch.is_some());
    assert!(rejected.min_distance_km > outside.spatial_threshold_km);
    for epoch in outside.grid().epochs() {
        let sa = propagate_with(&a, epoch, PropagationModel::Secular).unwrap();
        let sb = propagate_with(&b, epoch, PropagationModel::Secular).unwrap();
        assert!(sa.distance_to(&sb) > outside.spatial_threshold_km);
    }

    let inside = outside.with_spatial_threshold_km(chord * 1.01);
    let accepted = engine.assess(&inside).unwrap();
    assert!(accepted.rejected_by.is_none());
    assert_relative_eq!(accepted.min_distance_km, chord, max_relative = 1e-9);
}

#[test]
fn zero_length_window_takes_one_sample() {
    let a = iss();
    let b = iss_neighbour();
    let window = TimeWindow::new(a.epoch(), a.epoch());
    let request = PairAssessmentRequest::new(&a, &b, window, 5.0, 5.0);

    let first = assess(&request).unwrap();
    let second = assess(&request).unwrap();
    assert_eq!(first.diagnostics.samples, 1);
    assert_eq!(first, second);
    if let Some(at) = first.min_distance_epoch {
        assert_eq!(at, a.epoch());
    }
}

#[test]
fn cached_and_fresh_trajectories_agree() {
    let a = iss();
    let b = iss_neighbour();
    let window = TimeWindow::starting_at(a.epoch(), Duration::hours(3));
    let request = PairAssessmentRequest::new(&a, &b, window, 5.0, 5.0);
    let engine = ConjunctionEngine::default();
    let cache = TrajectoryCache::new();

    let fresh = engine.assess(&request).unwrap();
    let cached = engine.assess_cached(&request, Some(&cache)).unwrap();
    let again = engine.assess_cached(&request.swapped(), Some(&cache)).unwrap();
    assert_eq!(fresh, cached);
    assert_eq!(cache.len(), 2);
    assert_relative_eq!(again.min_distance_km, cached.min_distance_km, max_relative = 1e-12);
}

#[test]
fn malformed_requests_fail_before_propagation() {
    let a = iss();
    let b = iss_neighbour();
    let start = a.epoch();

    let too_long = PairAssessmentRequest::new(
        &a,
        &b,
        TimeWindow::starting_at(start, Duration::days(8)),
        5.0,
        5.0,
    );
    assert!(matches!(
        assess(&too_long),
        Err(EngineError::InvalidRequest { field: "window", .. })
    ));

    let negative_radius = PairAssessmentRequest::new(
        &a,
        &b,
        TimeWindow::starting_at(start, Duration::hours(1)),
        -1.0,
        5.0,
    );
    assert!(matches!(
        assess(&negative_radius),
        Err(EngineError::InvalidRequest {
            field: "primary_radius_m",
            ..
        })
    ));

    let engine = ConjunctionEngine::new(EngineConfig {
        probability_model: nearmiss::approach::ProbabilityModel::Isotropic { sigma_km: 0.0 },
        ..EngineConfig::default()
    });
    let request = PairAssessmentRequest::new(
        &a,
        &b,
        TimeWindow::starting_at(start, Duration::hours(1)),
        5.0,
        5.0,
    );
    assert!(matches!(
        engine.assess(&request),
        Err(EngineError::InvalidRequest {
            field: "probability_model",
            ..
        })
    ));
}

#[test]
fn pair_that_never_propagates_diverges() {
    // Both below the surface: the bands overlap, every sample decays.
    let a = circular(1, 0.0, 0.0, 17.5);
    let b = circular(2, 0.0, 1.0, 17.5);
    let window = TimeWindow::starting_at(epoch(), Duration::hours(1));
    let request = PairAssessmentRequest::new(&a, &b, window, 5.0, 5.0);

    match engine(PropagationModel::Secular).assess(&request) {
        Err(EngineError::PropagationDivergence { catalog_id, .. }) => {
            assert!(catalog_id == 1 || catalog_id == 2)
        }
        other => panic!("expected divergence, got {other:?}"),
    }
}

#[test]
fn age_scaled_model_lowers_probability_for_stale_elements() {
    let a = circular(1, 0.0, 0.0, 15.0);
    let b = circular(2, 0.0, 0.05, 15.0);
    let fresh = TimeWindow::starting_at(epoch(), Duration::hours(2));
    let stale = TimeWindow::starting_at(epoch() + Duration::days(20), Duration::hours(2));
    let engine = ConjunctionEngine::new(EngineConfig {
        propagation_model: PropagationModel::Secular,
        probability_model: nearmiss::approach::ProbabilityModel::AgeScaled {
            base_sigma_km: 10.0,
            growth_km_per_day: 2.0,
        },
        ..EngineConfig::default()
    });

    let near = engine
        .assess(&PairAssessmentRequest::new(&a, &b, fresh, 50.0, 50.0))
        .unwrap();
    let far = engine
        .assess(&PairAssessmentRequest::new(&a, &b, stale, 50.0, 50.0))
        .unwrap();
    assert_relative_eq!(near.min_distance_km, far.min_distance_km, max_relative = 1e-9);
    assert!(far.max_probability < near.max_probability);
}

/// Argument of latitude, degrees, at which the orbit `(inclination, raan)`
/// crosses the node line it shares with `(other_inclination, other_raan)`.
fn crossing_latitude_deg(
    inclination: f64,
    raan: f64,
    other_inclination: f64,
    other_raan: f64,
) -> f64 {
    let normal = |i: f64, o: f64| {
        let (i, o) = (i.to_radians(), o.to_radians());
        [i.sin() * o.sin(), -i.sin() * o.cos(), i.cos()]
    };
    let (h1, h2) = (normal(inclination, raan), normal(other_inclination, other_raan));
    let node = [
        h1[1] * h2[2] - h1[2] * h2[1],
        h1[2] * h2[0] - h1[0] * h2[2],
        h1[0] * h2[1] - h1[1] * h2[0],
    ];

    let (i, o) = (inclination.to_radians(), raan.to_radians());
    let p = [o.cos(), o.sin(), 0.0];
    let q = [-o.sin() * i.cos(), o.cos() * i.cos(), i.sin()];
    let dot = |u: [f64; 3], v: [f64; 3]| u[0] * v[0] + u[1] * v[1] + u[2] * v[2];
    dot(node, q).atan2(dot(node, p)).to_degrees().rem_euclid(360.0)
}

/// Circular orbit at argument of latitude `u_deg` at epoch.
fn circular_at(
    catalog_id: u64,
    inclination_deg: f64,
    raan_deg: f64,
    n: f64,
    u_deg: f64,
) -> OrbitalElementSet {
    elements(
        catalog_id,
        MeanElements {
            inclination_deg,
            raan_deg,
            eccentricity: 0.0,
            arg_perigee_deg: 0.0,
            mean_anomaly_deg: u_deg,
            mean_motion_rev_day: n,
            bstar: 0.0,
            mean_motion_dot: 0.0,
            mean_motion_ddot: 0.0,
        },
    )
}

#[test]
fn sgp4_pair_closer_than_its_mean_bands_is_not_band_rejected() {
    // Two crossing planes, both objects at the shared node at epoch, with
    // mean radii 12 km apart. SGP4 periodics pull them closer than that.
    let (i1, o1, i2, o2) = (150.0, 0.0, 70.0, 50.0);
    let u1 = crossing_latitude_deg(i1, o1, i2, o2);
    let u2 = crossing_latitude_deg(i2, o2, i1, o1);
    let a = circular_at(1, i1, o1, 15.0, u1);

    let (mut low, mut high) = (14.9, 15.2);
    for _ in 0..60 {
        let mid = 0.5 * (low + high);
        let b = circular_at(2, i2, o2, mid, u2);
        if a.semi_major_axis_km() - b.semi_major_axis_km() < 12.0 {
            low = mid;
        } else {
            high = mid;
        }
    }
    let b = circular_at(2, i2, o2, 0.5 * (low + high), u2);
    assert_relative_eq!(band_gap_km(&a, &b, PropagationModel::Secular), 12.0, epsilon = 1e-6);
    assert!(quick_reject(&a, &b, 10.0, PropagationModel::Secular));

    let window = TimeWindow::starting_at(epoch() - Duration::minutes(1), Duration::minutes(2));
    let request = PairAssessmentRequest::new(&a, &b, window, 5.0, 5.0)
        .with_sampling_interval(Duration::seconds(1));
    let sampled_min = request
        .grid()
        .epochs()
        .map(|t| {
            let sa = propagate_with(&a, t, PropagationModel::Sgp4).unwrap();
            let sb = propagate_with(&b, t, PropagationModel::Sgp4).unwrap();
            sa.distance_to(&sb)
        })
        .fold(f64::INFINITY, f64::min);
    assert!(sampled_min < request.apsis_threshold_km, "sampled minimum {sampled_min:.3} km");
    assert!(!quick_reject(&a, &b, request.apsis_threshold_km, PropagationModel::Sgp4));

    let result = assess(&request).unwrap();
    assert_ne!(result.rejected_by, Some(FilterStage::ApsisBands));
    assert!(result.rejected_by.is_none());
    assert!(result.min_distance_km <= sampled_min + 1e-3);
}

#[test]
fn sgp4_band_rejection_holds_against_sampled_distances() {
    let a = circular(1, 51.6, 0.0, 15.5);
    for (inclination, raan, n) in [(0.0, 0.0, 15.2), (97.0, 40.0, 15.2), (63.4, 120.0, 15.8)] {
        let b = circular(2, inclination, raan, n);
        let threshold = 10.0;
        assert!(quick_reject(&a, &b, threshold, PropagationModel::Sgp4), "i = {inclination}, n = {n}");
        let window = TimeWindow::starting_at(epoch(), Duration::hours(6));
        let request = PairAssessmentRequest::new(&a, &b, window, 5.0, 5.0)
            .with_sampling_interval(Duration::seconds(30));
        for t in request.grid().epochs() {
            let sa = propagate_with(&a, t, PropagationModel::Sgp4).unwrap();
            let sb = propagate_with(&b, t, PropagationModel::Sgp4).unwrap();
            assert!(sa.distance_to(&sb) > threshold, "i = {inclination}, n = {n}");
        }
    }
}

#[test]
fn decay_partway_through_the_window_leaves_warnings() {
    // Drag pulls the perigee below the surface roughly two days after epoch.
    let mut mean = *circular(1, 0.0, 0.0, 15.0).mean_elements();
    mean.mean_motion_dot = 0.5;
    let decaying = elements(1, mean);
    let partner = circular(2, 0.0, 30.0, 15.0);

    let window = TimeWindow::starting_at(epoch() + Duration::hours(46), Duration::hours(6));
    let request = PairAssessmentRequest::new(&decaying, &partner, window, 5.0, 5.0);
    let grid = request.grid();
    let failed: Vec<_> = grid
        .epochs()
        .filter(|&t| propagate_with(&decaying, t, PropagationModel::Secular).is_err())
        .collect();
    assert!(!failed.is_empty());
    assert!(failed.len() < grid.len());
    for t in grid.epochs().filter(|t| !failed.contains(t)) {
        assert!(t < failed[0]);
    }

    let result = engine(PropagationModel::Secular).assess(&request).unwrap();
    assert_eq!(result.diagnostics.samples, grid.len());
    assert_eq!(result.diagnostics.skipped_samples, failed.len());
    let warned: Vec<_> = result.warnings.iter().map(|w| w.epoch).collect();
    assert_eq!(warned, failed);
    assert!(result.warnings.iter().all(|w| w.catalog_id == 1));
    if let Some(at) = result.min_distance_epoch {
        assert!(at < failed[0]);
    }
}

#[cfg(debug_assertions)]
#[test]
#[should_panic(expected = "request element sets differ")]
fn prepared_satellites_must_match_the_request() {
    let a = circular(1, 0.0, 0.0, 15.0);
    let b = circular(2, 0.0, 0.05, 15.0);
    let other = circular(3, 0.0, 0.1, 15.0);
    let sa = Satellite::new(a.clone(), PropagationModel::Secular).unwrap();
    let sb = Satellite::new(other, PropagationModel::Secular).unwrap();
    let window = TimeWindow::starting_at(epoch(), Duration::hours(1));
    let request = PairAssessmentRequest::new(&a, &b, window, 5.0, 5.0);

    let _ = engine(PropagationModel::Secular).assess_satellites(&sa, &sb, &request, None);
}
