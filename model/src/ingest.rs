use chrono::{DateTime, TimeZone, Utc};

use gtfs::VehicleReport;

use crate::{Append, HistoryStore, LonLat, Observation, VehicleInfo, VehicleName};

/// What happened to one batch of reports
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub seeded: usize,
    pub appended: usize,
    pub stale: usize,
    pub duplicate: usize,
    /// No vehicle ID, or a nonsense timestamp
    pub skipped: usize,
    pub evicted: usize,
}

impl IngestStats {
    pub fn changed(&self) -> bool {
        self.seeded + self.appended > 0
    }
}

/// Records one batch of reports from the feed. This is the only place the store is modified, and
/// the whole batch is applied in one go. Reports without a timestamp are assumed to be from
/// `now`.
pub fn ingest(store: &mut HistoryStore, reports: Vec<VehicleReport>, now: DateTime<Utc>) -> IngestStats {
    let mut stats = IngestStats::default();
    for report in reports {
        if report.id.is_empty() {
            trace!("Skipping a report without a vehicle ID");
            stats.skipped += 1;
            continue;
        }
        let time = match report.timestamp {
            Some(secs) => match i64::try_from(secs)
                .ok()
                .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
            {
                Some(time) => time,
                None => {
                    debug!("Skipping {} with timestamp {secs}", report.id);
                    stats.skipped += 1;
                    continue;
                }
            },
            None => now,
        };

        let vehicle = VehicleName(report.id);
        let obs = Observation::new(LonLat::new(report.lon, report.lat), time);
        match store.append(&vehicle, obs) {
            Append::Seeded => {
                stats.seeded += 1;
            }
            Append::Appended { evicted } => {
                stats.appended += 1;
                stats.evicted += evicted;
            }
            // Rejected reports don't touch anything, metadata included
            Append::Stale => {
                stats.stale += 1;
                continue;
            }
            Append::Duplicate => {
                stats.duplicate += 1;
                continue;
            }
        }
        store.set_info(
            &vehicle,
            VehicleInfo {
                line: report.route,
                brigade: report.label,
            },
        );
    }

    debug!(
        "Ingested batch: {} new vehicles, {} moved, {} stale, {} duplicate, {} skipped",
        stats.seeded, stats.appended, stats.stale, stats.duplicate, stats.skipped
    );
    stats
}
