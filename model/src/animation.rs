use chrono::{DateTime, Utc};

use crate::{
    to_fractional_seconds, to_seconds, Config, Frame, HistoryStore, LonLat, PathPrimitive,
    PointPrimitive, RadiusConfig, Rgba, SegmentBuilder, Segments, VehicleHistory,
};

const MOVING_HEAD: Rgba = Rgba::new(220, 40, 40, 255);
// The feed stopped updating this vehicle; its head is frozen at the last position
const STALLED_HEAD: Rgba = Rgba::new(140, 140, 140, 255);
const MIN_TRAIL_ALPHA: f64 = 40.0;

/// Drives the animation. Call `frame` on every display refresh; it's independent of how often
/// new data arrives. The state that has to survive between frames lives here, not in the
/// caller.
pub struct AnimationClock {
    builder: SegmentBuilder,
    radius: RadiusConfig,
    fetch_period: chrono::Duration,

    last_fetch: Option<DateTime<Utc>>,
    next_fetch: Option<DateTime<Utc>>,

    // Segments only change when the store does or a new second starts
    cache_key: Option<(u64, i64)>,
    cached_segments: Segments,
}

impl AnimationClock {
    pub fn new(config: &Config) -> Self {
        Self {
            builder: SegmentBuilder::new(config.segments.clone()),
            radius: config.radius.clone(),
            fetch_period: chrono::Duration::seconds(config.fetch_period_secs as i64),

            last_fetch: None,
            next_fetch: None,

            cache_key: None,
            cached_segments: Segments::default(),
        }
    }

    /// True before the first fetch, then once per fetch period
    pub fn fetch_due(&self, now: DateTime<Utc>) -> bool {
        match self.next_fetch {
            Some(next) => now >= next,
            None => true,
        }
    }

    pub fn mark_fetch(&mut self, now: DateTime<Utc>) {
        self.last_fetch = Some(now);
        self.next_fetch = Some(now + self.fetch_period);
    }

    pub fn last_fetch(&self) -> Option<DateTime<Utc>> {
        self.last_fetch
    }

    pub fn next_fetch(&self) -> Option<DateTime<Utc>> {
        self.next_fetch
    }

    /// The segments at `now`, recalculated only if needed
    pub fn segments(&mut self, store: &HistoryStore, now: DateTime<Utc>) -> &Segments {
        let key = (store.version(), to_seconds(now));
        if self.cache_key != Some(key) {
            self.cached_segments = self.builder.build(store, now);
            self.cache_key = Some(key);
        }
        &self.cached_segments
    }

    pub fn frame(&mut self, store: &HistoryStore, now: DateTime<Utc>, zoom: f64) -> Frame {
        self.segments(store, now);
        let now_secs = to_fractional_seconds(now);
        let max_len = store.max_len();
        let fade = self.builder.config().fade_by_age;

        let mut frame = Frame::default();
        for seg in &self.cached_segments.finished {
            frame.paths.push(PathPrimitive {
                vehicle: seg.vehicle.clone(),
                points: seg.path().iter().map(|pt| pt.to_array()).collect(),
                color: trail_color(seg.age, max_len, fade),
            });
        }
        for seg in &self.cached_segments.animating {
            frame.paths.push(PathPrimitive {
                vehicle: seg.vehicle.clone(),
                points: seg
                    .trail_until(now_secs)
                    .into_iter()
                    .map(|pt| pt.to_array())
                    .collect(),
                color: trail_color(seg.age, max_len, fade),
            });
        }

        let radius = self.radius.at_zoom(zoom);
        // Both lists are in vehicle order, following the store
        let mut animating = self.cached_segments.animating.iter().peekable();
        for (vehicle, history) in store.iter() {
            let (pos, color) = match animating.next_if(|seg| &seg.vehicle == vehicle) {
                Some(seg) => (seg.interpolate(now_secs), MOVING_HEAD),
                None => match resting_position(history, to_seconds(now)) {
                    Some(pos) => (pos, STALLED_HEAD),
                    None => continue,
                },
            };
            frame.points.push(PointPrimitive {
                vehicle: vehicle.clone(),
                position: pos.to_array(),
                radius,
                color,
            });
        }
        frame
    }

    /// Draws one frame onto the map, using the map's current zoom
    pub fn draw<M: crate::MapSurface>(
        &mut self,
        store: &HistoryStore,
        now: DateTime<Utc>,
        map: &mut M,
    ) -> Frame {
        let frame = self.frame(store, now, map.zoom());
        map.draw(&frame);
        frame
    }
}

/// Where to show a vehicle that isn't animating: the latest observation that's not in the future,
/// or the earliest one if all of them are
fn resting_position(history: &VehicleHistory, now: i64) -> Option<LonLat> {
    let observations = history.observations();
    observations
        .iter()
        .rev()
        .find(|obs| obs.seconds() <= now)
        .or_else(|| observations.front())
        .map(|obs| obs.pos)
}

fn trail_color(age: usize, max_len: usize, fade: bool) -> Rgba {
    // 1 for the newest segment, approaching 0 for the oldest the store can hold
    let recency = 1.0 - (age as f64 / max_len.max(1) as f64).min(1.0);
    let color = colorous::YELLOW_ORANGE_RED.eval_continuous(0.3 + 0.7 * recency);
    let alpha = if fade {
        MIN_TRAIL_ALPHA + (255.0 - MIN_TRAIL_ALPHA) * recency
    } else {
        255.0
    };
    Rgba::from_colorous(color, alpha.round() as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{at_ms, ingest, MapSurface, Observation, VehicleName};
    use gtfs::VehicleReport;

    fn bus(id: &str) -> VehicleName {
        VehicleName(id.to_string())
    }

    fn scenario() -> HistoryStore {
        let mut store = HistoryStore::new();
        store.append(&bus("B1"), Observation::new(LonLat::new(21.0, 52.2), at_ms(0)));
        store.append(
            &bus("B1"),
            Observation::new(LonLat::new(21.01, 52.21), at_ms(10_000)),
        );
        store
    }

    fn head(frame: &Frame, id: &str) -> PointPrimitive {
        frame
            .points
            .iter()
            .find(|pt| pt.vehicle.0 == id)
            .unwrap()
            .clone()
    }

    #[test]
    fn head_moves_then_freezes() {
        let store = scenario();
        let mut clock = AnimationClock::new(&Config::default());

        let frame = clock.frame(&store, at_ms(5_000), 12.0);
        let pt = head(&frame, "B1");
        assert!((pt.position[0] - 21.005).abs() < 1e-9);
        assert!((pt.position[1] - 52.205).abs() < 1e-9);
        assert_eq!(pt.color, MOVING_HEAD);
        // The animated trail ends at the head
        assert_eq!(frame.paths.len(), 1);
        assert_eq!(*frame.paths[0].points.last().unwrap(), pt.position);

        // Long after the last observation, the head stays put instead of vanishing
        for ms in [10_000, 60_000, 3_600_000] {
            let frame = clock.frame(&store, at_ms(ms), 12.0);
            let pt = head(&frame, "B1");
            assert_eq!(pt.position, [21.01, 52.21]);
            assert_eq!(pt.color, STALLED_HEAD);
            assert_eq!(frame.paths[0].points, vec![[21.0, 52.2], [21.01, 52.21]]);
        }
    }

    #[test]
    fn single_observation_has_a_head() {
        let mut store = HistoryStore::new();
        store.append(&bus("B1"), Observation::new(LonLat::new(21.0, 52.2), at_ms(10_000)));
        let mut clock = AnimationClock::new(&Config::default());

        let frame = clock.frame(&store, at_ms(20_000), 12.0);
        assert!(frame.paths.is_empty());
        assert_eq!(head(&frame, "B1").position, [21.0, 52.2]);

        // Even if the report claims to be from the future
        let frame = clock.frame(&store, at_ms(0), 12.0);
        assert!(frame.paths.is_empty());
        assert_eq!(head(&frame, "B1").position, [21.0, 52.2]);
    }

    #[test]
    fn nothing_drawn_before_start() {
        let store = scenario();
        let mut clock = AnimationClock::new(&Config::default());
        let frame = clock.frame(&store, at_ms(-5_000), 12.0);
        assert!(frame.paths.is_empty());
        assert_eq!(head(&frame, "B1").position, [21.0, 52.2]);
    }

    #[test]
    fn failed_fetch_keeps_everything() {
        let mut store = scenario();
        let mut clock = AnimationClock::new(&Config::default());
        let before = clock.frame(&store, at_ms(7_000), 12.0);

        // A failed fetch delivers nothing
        ingest(&mut store, Vec::new(), at_ms(7_000));
        let after = clock.frame(&store, at_ms(7_000), 12.0);
        assert_eq!(before, after);
        assert!(!after.points.is_empty());
    }

    #[test]
    fn new_data_invalidates_cache() {
        let mut store = scenario();
        let mut clock = AnimationClock::new(&Config::default());
        assert_eq!(clock.frame(&store, at_ms(12_000), 12.0).paths.len(), 1);

        ingest(
            &mut store,
            vec![VehicleReport {
                id: "B1".to_string(),
                label: String::new(),
                route: String::new(),
                lon: 21.02,
                lat: 52.22,
                timestamp: Some(20),
            }],
            at_ms(12_000),
        );
        // Same second, but the store changed
        let frame = clock.frame(&store, at_ms(12_000), 12.0);
        assert_eq!(frame.paths.len(), 2);
        assert_eq!(head(&frame, "B1").color, MOVING_HEAD);
    }

    #[test]
    fn many_vehicles() {
        let mut store = scenario();
        // B0 sorts before B1 and is stalled; B2 is animating
        store.append(&bus("B0"), Observation::new(LonLat::new(20.0, 50.0), at_ms(0)));
        store.append(&bus("B2"), Observation::new(LonLat::new(22.0, 53.0), at_ms(0)));
        store.append(&bus("B2"), Observation::new(LonLat::new(22.1, 53.0), at_ms(20_000)));
        let mut clock = AnimationClock::new(&Config::default());

        let frame = clock.frame(&store, at_ms(5_000), 12.0);
        assert_eq!(frame.points.len(), 3);
        assert_eq!(head(&frame, "B0").color, STALLED_HEAD);
        assert_eq!(head(&frame, "B1").color, MOVING_HEAD);
        let b2 = head(&frame, "B2");
        assert_eq!(b2.color, MOVING_HEAD);
        assert!((b2.position[0] - 22.025).abs() < 1e-9);
    }

    #[test]
    fn radius_follows_zoom() {
        let store = scenario();
        let mut clock = AnimationClock::new(&Config::default());
        let far = head(&clock.frame(&store, at_ms(5_000), 10.0), "B1").radius;
        let near = head(&clock.frame(&store, at_ms(5_000), 15.0), "B1").radius;
        assert!(near < far);
    }

    #[test]
    fn older_trails_fade() {
        let newest = trail_color(0, 100, true);
        let older = trail_color(50, 100, true);
        let oldest = trail_color(200, 100, true);
        assert_eq!(newest.a, 255);
        assert!(older.a < newest.a);
        assert_eq!(oldest.a, MIN_TRAIL_ALPHA as u8);
        assert_eq!(trail_color(50, 100, false).a, 255);
    }

    #[test]
    fn fetch_schedule() {
        let mut clock = AnimationClock::new(&Config::default());
        assert!(clock.fetch_due(at_ms(0)));
        clock.mark_fetch(at_ms(0));
        assert_eq!(clock.last_fetch(), Some(at_ms(0)));
        assert!(!clock.fetch_due(at_ms(14_999)));
        assert!(clock.fetch_due(at_ms(15_000)));
        assert_eq!(clock.next_fetch(), Some(at_ms(15_000)));
    }

    struct FakeMap {
        zoom: f64,
        drawn: usize,
    }

    impl MapSurface for FakeMap {
        fn zoom(&self) -> f64 {
            self.zoom
        }

        fn draw(&mut self, _: &Frame) {
            self.drawn += 1;
        }
    }

    #[test]
    fn draws_onto_map() {
        let store = scenario();
        let mut clock = AnimationClock::new(&Config::default());
        let mut map = FakeMap {
            zoom: 40.0,
            drawn: 0,
        };
        let frame = clock.draw(&store, at_ms(5_000), &mut map);
        assert_eq!(map.drawn, 1);
        assert_eq!(head(&frame, "B1").radius, RadiusConfig::default().min);
    }
}
