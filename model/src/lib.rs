#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

mod animation;
mod config;
mod history;
mod ingest;
mod render;
mod segment;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use self::animation::AnimationClock;
pub use self::config::{Config, RadiusConfig};
pub use self::history::{Append, HistoryStore, VehicleHistory, VehicleInfo};
pub use self::ingest::{ingest, IngestStats};
pub use self::render::{describe, Frame, MapSurface, PathPrimitive, PointPrimitive, Rgba};
pub use self::segment::{Segment, SegmentBuilder, SegmentConfig, Segments};

/// How the feed identifies a vehicle. Depending on the feed, this is a fleet number or the label.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VehicleName(pub String);

impl fmt::Display for VehicleName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// WGS84 degrees. Everything here stays in lon/lat; projecting is the map's problem.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LonLat {
    lon: f64,
    lat: f64,
}

impl LonLat {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    pub fn x(self) -> f64 {
        self.lon
    }

    pub fn y(self) -> f64 {
        self.lat
    }

    /// Linear interpolation; `pct` is clamped to [0, 1], so this never leaves the line.
    pub fn lerp(self, other: LonLat, pct: f64) -> LonLat {
        if pct <= 0.0 {
            return self;
        }
        if pct >= 1.0 {
            return other;
        }
        LonLat::new(
            self.lon + pct * (other.lon - self.lon),
            self.lat + pct * (other.lat - self.lat),
        )
    }

    /// Distance in degrees. Only good enough for picking nearby things.
    pub fn approx_dist(self, other: LonLat) -> f64 {
        (self.lon - other.lon).hypot(self.lat - other.lat)
    }

    pub fn to_array(self) -> [f64; 2] {
        [self.lon, self.lat]
    }
}

/// One reported position of a vehicle
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub pos: LonLat,
    pub time: DateTime<Utc>,
}

impl Observation {
    pub fn new(pos: LonLat, time: DateTime<Utc>) -> Self {
        Self { pos, time }
    }

    /// Whole seconds since the epoch, rounded down. Segments only have second resolution.
    pub fn seconds(&self) -> i64 {
        to_seconds(self.time)
    }
}

pub(crate) fn to_seconds(time: DateTime<Utc>) -> i64 {
    time.timestamp_millis().div_euclid(1000)
}

/// Fractional seconds since the epoch, for smooth interpolation between whole-second segments
pub(crate) fn to_fractional_seconds(time: DateTime<Utc>) -> f64 {
    time.timestamp_millis() as f64 / 1000.0
}

#[cfg(test)]
pub(crate) fn at_ms(ms: i64) -> DateTime<Utc> {
    use chrono::TimeZone;
    Utc.timestamp_millis_opt(ms).unwrap()
}
