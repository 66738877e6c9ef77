use geojson::{Feature, FeatureCollection, GeoJson, Geometry, JsonObject, Value};

use crate::{HistoryStore, LonLat, VehicleName};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn from_colorous(c: colorous::Color, a: u8) -> Self {
        Self::new(c.r, c.g, c.b, a)
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
    }
}

/// A trail piece, as a polyline
#[derive(Clone, Debug, PartialEq)]
pub struct PathPrimitive {
    pub vehicle: VehicleName,
    pub points: Vec<[f64; 2]>,
    pub color: Rgba,
}

/// A vehicle's head marker
#[derive(Clone, Debug, PartialEq)]
pub struct PointPrimitive {
    pub vehicle: VehicleName,
    pub position: [f64; 2],
    /// Meters
    pub radius: f64,
    pub color: Rgba,
}

/// Everything to draw for one frame
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Frame {
    pub paths: Vec<PathPrimitive>,
    pub points: Vec<PointPrimitive>,
}

/// Whatever actually draws the map. It owns the camera, projection, and hit-testing.
pub trait MapSurface {
    /// The current zoom level, in the usual web map sense
    fn zoom(&self) -> f64;
    fn draw(&mut self, frame: &Frame);
}

impl Frame {
    /// The vehicle whose head is closest to `pos`, if any is within `tolerance` degrees. This
    /// backs the map's hover callback.
    pub fn pick(&self, pos: LonLat, tolerance: f64) -> Option<&VehicleName> {
        let mut best: Option<(&VehicleName, f64)> = None;
        for pt in &self.points {
            let dist = pos.approx_dist(LonLat::new(pt.position[0], pt.position[1]));
            if dist > tolerance {
                continue;
            }
            if best.map(|(_, d)| dist < d).unwrap_or(true) {
                best = Some((&pt.vehicle, dist));
            }
        }
        best.map(|(vehicle, _)| vehicle)
    }

    pub fn to_geojson(&self) -> GeoJson {
        let mut features = Vec::new();
        for path in &self.paths {
            let mut properties = JsonObject::new();
            properties.insert("vehicle".to_string(), path.vehicle.0.clone().into());
            properties.insert("color".to_string(), path.color.to_hex().into());
            features.push(feature(
                Value::LineString(path.points.iter().map(|pt| pt.to_vec()).collect()),
                properties,
            ));
        }
        for pt in &self.points {
            let mut properties = JsonObject::new();
            properties.insert("vehicle".to_string(), pt.vehicle.0.clone().into());
            properties.insert("color".to_string(), pt.color.to_hex().into());
            properties.insert("radius".to_string(), pt.radius.into());
            features.push(feature(Value::Point(pt.position.to_vec()), properties));
        }
        GeoJson::FeatureCollection(FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        })
    }
}

fn feature(value: Value, properties: JsonObject) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(value)),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

/// Tooltip text for a vehicle
pub fn describe(store: &HistoryStore, vehicle: &VehicleName) -> String {
    let history = match store.get(vehicle) {
        Some(history) => history,
        None => return format!("{vehicle} (unknown)"),
    };
    let mut txt = format!("Vehicle {vehicle}");
    if !history.info.line.is_empty() {
        txt.push_str(&format!(", line {}", history.info.line));
    }
    if !history.info.brigade.is_empty() {
        txt.push_str(&format!(", brigade {}", history.info.brigade));
    }
    if let Some(last) = history.last() {
        txt.push_str(&format!(", last seen {}", last.time.format("%H:%M:%S")));
    }
    txt
}
