use chrono::{DateTime, Duration, Utc};

use crate::propagate::error::PropagationError;
use crate::propagate::satellite::Satellite;
use crate::propagate::state::StateVector;
use crate::window::TimeWindow;

/// Epochs `start + k * interval` strictly before `stop`, followed by `stop`
/// itself. A zero-length window has exactly one epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SampleGrid {
    window: TimeWindow,
    interval: Duration,
    len: usize,
}

impl SampleGrid {
    /// Callers validate that the window is not reversed and the interval is
    /// positive.
    pub fn new(window: TimeWindow, interval: Duration) -> Self {
        Self {
            window,
            interval,
            len: grid_len(window.duration(), interval),
        }
    }

    /// Number of epochs a grid over `span` would hold, without building it.
    pub fn len_for(span: Duration, interval: Duration) -> usize {
        grid_len(span, interval)
    }

    pub fn window(&self) -> TimeWindow {
        self.window
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn epoch(&self, index: usize) -> DateTime<Utc> {
        if index + 1 >= self.len {
            self.window.stop
        } else {
            self.window.start + self.interval * index as i32
        }
    }

    pub fn epochs(&self) -> impl Iterator<Item = DateTime<Utc>> + '_ {
        (0..self.len).map(|i| self.epoch(i))
    }
}

fn grid_len(span: Duration, interval: Duration) -> usize {
    let span_ms = span.num_milliseconds();
    let interval_ms = interval.num_milliseconds();
    if span_ms <= 0 || interval_ms <= 0 {
        return 1;
    }
    let steps = (span_ms + interval_ms - 1) / interval_ms;
    steps as usize + 1
}

/// One satellite sampled on a grid. Each slot holds the state or the reason
/// it could not be computed.
#[derive(Debug)]
pub struct Trajectory {
    catalog_id: u64,
    grid: SampleGrid,
    samples: Vec<Result<StateVector, PropagationError>>,
}

impl Trajectory {
    pub fn sample(satellite: &Satellite, grid: SampleGrid) -> Self {
        let samples = grid.epochs().map(|epoch| satellite.propagate(epoch)).collect();
        Self {
            catalog_id: satellite.catalog_id(),
            grid,
            samples,
        }
    }

    pub fn catalog_id(&self) -> u64 {
        self.catalog_id
    }

    pub fn grid(&self) -> &SampleGrid {
        &self.grid
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn state(&self, index: usize) -> Option<&StateVector> {
        self.samples.get(index).and_then(|s| s.as_ref().ok())
    }

    /// Successfully propagated samples with their grid index.
    pub fn valid(&self) -> impl Iterator<Item = (usize, &StateVector)> + '_ {
        self.samples
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().ok().map(|state| (i, state)))
    }

    pub fn failures(&self) -> impl Iterator<Item = &PropagationError> + '_ {
        self.samples.iter().filter_map(|s| s.as_ref().err())
    }

    pub fn valid_count(&self) -> usize {
        self.samples.iter().filter(|s| s.is_ok()).count()
    }
}
