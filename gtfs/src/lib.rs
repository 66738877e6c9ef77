//! Reads vehicle positions out of GTFS-Realtime feeds.

#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

mod fetch;
mod ids;
mod realtime;

pub use fetch::FeedClient;
pub use ids::IdSource;
pub use realtime::{decode_vehicle_positions, VehicleReport};
