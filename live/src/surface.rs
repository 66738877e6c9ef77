use std::time::{Duration, Instant};

use model::{Frame, MapSurface};

/// Stands in for a real map: remembers the latest frame and periodically writes it out as
/// GeoJSON, so any web map can poll the file and draw it.
pub struct GeoJsonSurface {
    zoom: f64,
    output: Option<String>,
    write_every: Duration,
    last_write: Option<Instant>,
    frames_drawn: usize,
    latest: Frame,
}

impl GeoJsonSurface {
    pub fn new(zoom: f64, output: Option<String>) -> Self {
        Self {
            zoom,
            output,
            write_every: Duration::from_secs(1),
            last_write: None,
            frames_drawn: 0,
            latest: Frame::default(),
        }
    }

    pub fn frames_drawn(&self) -> usize {
        self.frames_drawn
    }

    fn maybe_write(&mut self) {
        let path = match self.output {
            Some(ref path) => path,
            None => return,
        };
        if let Some(last) = self.last_write {
            if last.elapsed() < self.write_every {
                return;
            }
        }
        self.last_write = Some(Instant::now());
        if let Err(err) = fs_err::write(path, self.latest.to_geojson().to_string()) {
            warn!("Couldn't write the frame: {err}");
        }
    }
}

impl MapSurface for GeoJsonSurface {
    fn zoom(&self) -> f64 {
        self.zoom
    }

    fn draw(&mut self, frame: &Frame) {
        self.frames_drawn += 1;
        self.latest = frame.clone();
        self.maybe_write();
    }
}
