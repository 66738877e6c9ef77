use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use gtfs::IdSource;

use crate::SegmentConfig;

/// Every tuning knob. Any field missing from a config file takes the default.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// The GTFS-Realtime vehicle positions endpoint, or the proxy in front of it
    pub feed_url: String,
    pub id_source: IdSource,
    pub fetch_period_secs: u64,
    pub fetch_timeout_secs: u64,
    /// How many observations to keep per vehicle
    pub history_length: usize,
    pub frames_per_second: u32,
    pub segments: SegmentConfig,
    pub radius: RadiusConfig,
}

/// Head markers shrink as the map zooms in: `max(base * exp(-decay * zoom), min)`, in meters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadiusConfig {
    pub base: f64,
    pub decay: f64,
    pub min: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            feed_url: String::new(),
            id_source: IdSource::default(),
            fetch_period_secs: 15,
            fetch_timeout_secs: 10,
            history_length: 100,
            frames_per_second: 30,
            segments: SegmentConfig::default(),
            radius: RadiusConfig::default(),
        }
    }
}

impl Default for RadiusConfig {
    fn default() -> Self {
        Self {
            base: 400.0,
            decay: 0.25,
            min: 4.0,
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs_err::read_to_string(path)?;
        Self::from_json(&contents).map_err(|err| anyhow!("{path}: {err}"))
    }

    pub fn from_json(contents: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.fetch_period_secs == 0 {
            bail!("fetch_period_secs must be positive");
        }
        if self.frames_per_second == 0 {
            bail!("frames_per_second must be positive");
        }
        if self.history_length == 0 {
            bail!("history_length must be at least 1");
        }
        if !(self.radius.min >= 0.0 && self.radius.base >= self.radius.min) {
            bail!(
                "Radius base {} must be at least the minimum {}",
                self.radius.base,
                self.radius.min
            );
        }
        Ok(())
    }

    pub fn fetch_period(&self) -> Duration {
        Duration::from_secs(self.fetch_period_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.frames_per_second as f64)
    }
}

impl RadiusConfig {
    pub fn at_zoom(&self, zoom: f64) -> f64 {
        (self.base * (-self.decay * zoom).exp()).max(self.min)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file() {
        let config = Config::from_json(
            r#"{
                "feed_url": "http://localhost:8080/vehicles.pb",
                "id_source": "label",
                "history_length": 20,
                "segments": { "interpolation_points": 4 }
            }"#,
        )
        .unwrap();
        assert_eq!(config.id_source, IdSource::Label);
        assert_eq!(config.history_length, 20);
        assert_eq!(config.segments.interpolation_points, 4);
        assert!(config.segments.fade_by_age);
        assert_eq!(config.fetch_period(), Duration::from_secs(15));
        assert_eq!(config.radius, RadiusConfig::default());
    }

    #[test]
    fn rejects_nonsense() {
        assert!(Config::from_json(r#"{ "fetch_period_secs": 0 }"#).is_err());
        assert!(Config::from_json(r#"{ "radius": { "base": 1.0, "min": 5.0 } }"#).is_err());
        assert!(Config::from_json("not json").is_err());
    }

    #[test]
    fn radius_shrinks_with_zoom() {
        let radius = RadiusConfig::default();
        let mut last = f64::MAX;
        for zoom in 0..=15 {
            let r = radius.at_zoom(zoom as f64);
            assert!(r < last);
            last = r;
        }
        assert_eq!(radius.at_zoom(40.0), radius.min);
    }
}
