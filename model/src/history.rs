use std::collections::{BTreeMap, VecDeque};

use crate::{Config, Observation, VehicleName};

/// The recent positions of every vehicle seen so far. This is the only state that lives across
/// frames; everything drawn is derived from it.
pub struct HistoryStore {
    max_len: usize,
    vehicles: BTreeMap<VehicleName, VehicleHistory>,
    // Bumped whenever any observation is added or removed
    version: u64,
}

pub struct VehicleHistory {
    pub info: VehicleInfo,
    // Time strictly increases (no equal adjacent pairs)
    observations: VecDeque<Observation>,
}

/// Only for tooltips; never used for animation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VehicleInfo {
    pub line: String,
    pub brigade: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Append {
    /// The first observation of a new vehicle
    Seeded,
    Appended { evicted: usize },
    /// Same or earlier time than the last observation; dropped
    Stale,
    /// Exactly the last observation again; dropped
    Duplicate,
}

impl HistoryStore {
    /// Uses the default history length from `Config`
    pub fn new() -> Self {
        Self::with_max_len(Config::default().history_length)
    }

    pub fn with_max_len(max_len: usize) -> Self {
        Self {
            max_len: max_len.max(1),
            vehicles: BTreeMap::new(),
            version: 0,
        }
    }

    /// New vehicles start with just this one observation. Otherwise the observation must be
    /// strictly newer than the last one, or it's silently dropped. The oldest observations are
    /// evicted to stay within the bound.
    pub fn append(&mut self, vehicle: &VehicleName, obs: Observation) -> Append {
        let history = match self.vehicles.get_mut(vehicle) {
            Some(history) => history,
            None => {
                self.vehicles.insert(
                    vehicle.clone(),
                    VehicleHistory {
                        info: VehicleInfo::default(),
                        observations: VecDeque::from(vec![obs]),
                    },
                );
                self.version += 1;
                return Append::Seeded;
            }
        };

        if let Some(last) = history.observations.back() {
            if *last == obs {
                return Append::Duplicate;
            }
            if obs.time <= last.time {
                return Append::Stale;
            }
        }
        history.observations.push_back(obs);
        self.version += 1;

        let mut evicted = 0;
        while self.vehicles[vehicle].len() > self.max_len {
            self.evict_oldest(vehicle);
            evicted += 1;
        }
        Append::Appended { evicted }
    }

    pub fn evict_oldest(&mut self, vehicle: &VehicleName) -> Option<Observation> {
        let obs = self.vehicles.get_mut(vehicle)?.observations.pop_front()?;
        self.version += 1;
        Some(obs)
    }

    /// Does nothing for unknown vehicles
    pub fn set_info(&mut self, vehicle: &VehicleName, info: VehicleInfo) {
        if let Some(history) = self.vehicles.get_mut(vehicle) {
            history.info = info;
        }
    }

    pub fn get(&self, vehicle: &VehicleName) -> Option<&VehicleHistory> {
        self.vehicles.get(vehicle)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&VehicleName, &VehicleHistory)> {
        self.vehicles.iter()
    }

    /// The number of vehicles
    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn total_observations(&self) -> usize {
        self.vehicles.values().map(|h| h.len()).sum()
    }
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl VehicleHistory {
    /// Oldest first
    pub fn observations(&self) -> &VecDeque<Observation> {
        &self.observations
    }

    pub fn last(&self) -> Option<&Observation> {
        self.observations.back()
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}
