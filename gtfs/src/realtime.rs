use anyhow::Result;
use gtfs_rt::{FeedEntity, FeedMessage};
use prost::Message;

use crate::IdSource;

/// A single vehicle position from the feed. Nothing is validated or filtered yet; missing text
/// fields are empty strings.
#[derive(Clone, Debug, PartialEq)]
pub struct VehicleReport {
    pub id: String,
    /// The vehicle label. Often the brigade number painted on the bus.
    pub label: String,
    pub route: String,
    pub lon: f64,
    pub lat: f64,
    /// Seconds since the Unix epoch, if the feed reported it
    pub timestamp: Option<u64>,
}

/// Decodes a GTFS-Realtime `FeedMessage` and keeps the vehicle positions. Entities that aren't
/// vehicles or don't have a position are skipped. An empty payload is a valid, empty feed.
pub fn decode_vehicle_positions(bytes: &[u8], id_source: IdSource) -> Result<Vec<VehicleReport>> {
    let feed =
        FeedMessage::decode(bytes).map_err(|err| anyhow!("Couldn't decode FeedMessage: {err}"))?;

    let total = feed.entity.len();
    let mut reports = Vec::new();
    for entity in feed.entity {
        if let Some(report) = to_report(entity, id_source) {
            reports.push(report);
        }
    }
    if reports.len() != total {
        debug!(
            "Skipped {} of {} feed entities without a vehicle position",
            total - reports.len(),
            total
        );
    }
    Ok(reports)
}

fn to_report(entity: FeedEntity, id_source: IdSource) -> Option<VehicleReport> {
    if entity.is_deleted == Some(true) {
        return None;
    }
    let vehicle = entity.vehicle?;
    let position = vehicle.position?;

    let descriptor = vehicle.vehicle.unwrap_or_default();
    let label = descriptor.label.unwrap_or_default();
    let id = match id_source {
        IdSource::VehicleId => descriptor.id.unwrap_or_default(),
        IdSource::Label => label.clone(),
        IdSource::Entity => entity.id,
    };
    let route = vehicle
        .trip
        .and_then(|trip| trip.route_id)
        .unwrap_or_default();

    Some(VehicleReport {
        id,
        label,
        route,
        lon: position.longitude as f64,
        lat: position.latitude as f64,
        timestamp: vehicle.timestamp,
    })
}
