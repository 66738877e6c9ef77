use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{to_seconds, HistoryStore, LonLat, VehicleName};

/// Movement between two consecutive observations of one vehicle. Derived fresh from the store;
/// never stored.
#[derive(Clone, Debug, PartialEq)]
pub struct Segment {
    pub vehicle: VehicleName,
    // Starts and ends exactly at the two observations, with any interpolated points in between.
    // Always at least 2 points.
    path: Vec<LonLat>,
    /// Whole seconds since the epoch
    pub start_time: i64,
    pub end_time: i64,
    /// 0 for the vehicle's newest segment, counting up for older ones
    pub age: usize,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Segments {
    pub finished: Vec<Segment>,
    /// At most one per vehicle
    pub animating: Vec<Segment>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentConfig {
    /// How many evenly spaced points to insert into each segment, so the animated trail grows
    /// smoothly even if the map draws paths per vertex
    pub interpolation_points: usize,
    /// Make older segments more transparent
    pub fade_by_age: bool,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            interpolation_points: 0,
            fade_by_age: true,
        }
    }
}

pub struct SegmentBuilder {
    config: SegmentConfig,
}

impl SegmentBuilder {
    pub fn new(config: SegmentConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SegmentConfig {
        &self.config
    }

    /// Splits every vehicle's history into finished segments and the one currently animating.
    /// Segments that haven't started yet at `now` are left out entirely.
    pub fn build(&self, store: &HistoryStore, now: DateTime<Utc>) -> Segments {
        let now = to_seconds(now);
        let mut segments = Segments::default();
        for (vehicle, history) in store.iter() {
            let observations = history.observations();
            let num_segments = observations.len().saturating_sub(1);
            for idx in 1..observations.len() {
                let prev = &observations[idx - 1];
                let next = &observations[idx];
                let start_time = prev.seconds();
                let end_time = next.seconds();

                if now < start_time {
                    // Everything after this is even later
                    break;
                }
                let segment = Segment {
                    vehicle: vehicle.clone(),
                    path: self.path(prev.pos, next.pos),
                    start_time,
                    end_time,
                    age: num_segments - idx,
                };
                if now >= end_time {
                    segments.finished.push(segment);
                } else {
                    segments.animating.push(segment);
                    break;
                }
            }
        }
        segments
    }

    fn path(&self, from: LonLat, to: LonLat) -> Vec<LonLat> {
        let n = self.config.interpolation_points;
        let mut path = Vec::with_capacity(n + 2);
        path.push(from);
        for i in 1..=n {
            path.push(from.lerp(to, i as f64 / (n + 1) as f64));
        }
        path.push(to);
        path
    }
}

impl Segment {
    pub fn path(&self) -> &[LonLat] {
        &self.path
    }

    pub fn from(&self) -> LonLat {
        self.path[0]
    }

    pub fn to(&self) -> LonLat {
        self.path[self.path.len() - 1]
    }

    pub fn is_finished(&self, now: f64) -> bool {
        now >= self.end_time as f64
    }

    /// How far along the segment the vehicle is at `now` (fractional seconds), always in [0, 1].
    /// Segments with equal start and end times are treated as lasting one second.
    pub fn fraction(&self, now: f64) -> f64 {
        let duration = (self.end_time - self.start_time).max(1) as f64;
        ((now - self.start_time as f64) / duration).clamp(0.0, 1.0)
    }

    /// Where the vehicle is at `now`. Never goes past the end of the segment.
    pub fn interpolate(&self, now: f64) -> LonLat {
        if self.end_time <= self.start_time {
            return self.to();
        }
        self.from().lerp(self.to(), self.fraction(now))
    }

    /// The part of the path already covered at `now`, ending exactly at the interpolated
    /// position
    pub fn trail_until(&self, now: f64) -> Vec<LonLat> {
        let pct = self.fraction(now);
        let last_idx = self.path.len() - 1;
        let mut pts = Vec::new();
        for (idx, pt) in self.path.iter().enumerate() {
            if (idx as f64) / (last_idx as f64) < pct {
                pts.push(*pt);
            } else {
                break;
            }
        }
        let head = self.interpolate(now);
        if pts.is_empty() {
            pts.push(self.from());
        }
        pts.push(head);
        pts
    }
}
