use chrono::{DateTime, Utc};
use futures_channel::mpsc::UnboundedReceiver;

use gtfs::VehicleReport;
use model::{ingest, AnimationClock, Config, Frame, HistoryStore, MapSurface};

/// Everything the frame loop owns between frames
pub struct Live {
    pub store: HistoryStore,
    pub clock: AnimationClock,
    // Only one fetch at a time; a slow fetch just delays the next one
    fetch_in_flight: bool,
}

pub struct Step {
    /// The caller should start a fetch and send its batch back over the channel
    pub start_fetch: bool,
    pub frame: Frame,
}

impl Live {
    pub fn new(config: &Config) -> Self {
        Self {
            store: HistoryStore::with_max_len(config.history_length),
            clock: AnimationClock::new(config),
            fetch_in_flight: false,
        }
    }

    /// One frame. Every finished fetch is applied, one whole batch at a time, before anything is
    /// drawn.
    pub fn step<M: MapSurface>(
        &mut self,
        batches: &mut UnboundedReceiver<Vec<VehicleReport>>,
        now: DateTime<Utc>,
        map: &mut M,
    ) -> Step {
        while let Ok(Some(batch)) = batches.try_next() {
            self.fetch_in_flight = false;
            let stats = ingest(&mut self.store, batch, now);
            info!(
                "{} vehicles ({} new, {} moved, {} stale), {} observations total",
                self.store.len(),
                stats.seeded,
                stats.appended,
                stats.stale,
                self.store.total_observations()
            );
        }

        let mut start_fetch = false;
        if !self.fetch_in_flight && self.clock.fetch_due(now) {
            self.clock.mark_fetch(now);
            self.fetch_in_flight = true;
            start_fetch = true;
        }

        let frame = self.clock.draw(&self.store, now, map);
        Step { start_fetch, frame }
    }
}
