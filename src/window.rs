use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// Closed time interval `[start, stop]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub stop: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, stop: DateTime<Utc>) -> Self {
        Self { start, stop }
    }

    pub fn starting_at(start: DateTime<Utc>, length: Duration) -> Self {
        Self {
            start,
            stop: start + length,
        }
    }

    pub fn duration(&self) -> Duration {
        self.stop - self.start
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at <= self.stop
    }

    /// Intersection with `bounds`, or `None` when they do not overlap.
    pub fn clip(&self, bounds: &TimeWindow) -> Option<TimeWindow> {
        let start = self.start.max(bounds.start);
        let stop = self.stop.min(bounds.stop);
        (start <= stop).then_some(TimeWindow { start, stop })
    }

    /// Window of `± half_width` around `center`.
    pub fn around(center: DateTime<Utc>, half_width: Duration) -> Self {
        Self {
            start: center - half_width,
            stop: center + half_width,
        }
    }
}

/// Sort and coalesce windows that overlap or touch.
pub fn merge_windows(mut windows: Vec<TimeWindow>) -> Vec<TimeWindow> {
    windows.sort_by_key(|w| (w.start, w.stop));

    let mut merged: Vec<TimeWindow> = Vec::with_capacity(windows.len());
    for window in windows {
        match merged.last_mut() {
            Some(last) if window.start <= last.stop => {
                last.stop = last.stop.max(window.stop);
            }
            _ => merged.push(window),
        }
    }
    merged
}
