use serde::{Deserialize, Serialize};

/// Feeds disagree about which field identifies a vehicle. Some put the fleet number in the
/// descriptor's `id`, some only fill in `label`, and a few only have a stable entity ID.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdSource {
    VehicleId,
    Label,
    Entity,
}

impl Default for IdSource {
    fn default() -> Self {
        IdSource::VehicleId
    }
}

impl std::str::FromStr for IdSource {
    type Err = anyhow::Error;

    fn from_str(x: &str) -> anyhow::Result<Self> {
        match x {
            "vehicle_id" | "id" => Ok(IdSource::VehicleId),
            "label" => Ok(IdSource::Label),
            "entity" => Ok(IdSource::Entity),
            _ => bail!("Unknown id source {x}; use vehicle_id, label, or entity"),
        }
    }
}
