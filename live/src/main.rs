#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

mod logger;
mod step;
mod surface;

use anyhow::Result;
use chrono::Utc;
use futures_channel::mpsc;
use structopt::StructOpt;
use tokio::time::MissedTickBehavior;

use gtfs::{FeedClient, IdSource, VehicleReport};
use model::Config;

use self::step::Live;
use self::surface::GeoJsonSurface;

#[derive(StructOpt)]
struct Args {
    /// A JSON file with settings. Anything missing takes the default, and flags below override it.
    #[structopt(long)]
    config: Option<String>,
    /// The GTFS-Realtime vehicle positions URL, or a proxy in front of it
    #[structopt(long)]
    feed_url: Option<String>,
    /// Which field identifies vehicles: vehicle_id, label, or entity
    #[structopt(long)]
    id_source: Option<IdSource>,
    /// Seconds between fetches
    #[structopt(long)]
    fetch_period: Option<u64>,
    /// How many observations to keep per vehicle
    #[structopt(long)]
    history_length: Option<usize>,
    #[structopt(long)]
    fps: Option<u32>,
    /// Write the latest frame as GeoJSON to this path, at most once a second
    #[structopt(long)]
    geojson_out: Option<String>,
    /// The map zoom level to size vehicle markers for
    #[structopt(long, default_value = "13")]
    zoom: f64,
}

impl Args {
    fn config(&mut self) -> Result<Config> {
        let mut config = match self.config.take() {
            Some(path) => Config::load(&path)?,
            None => Config::default(),
        };
        if let Some(url) = self.feed_url.take() {
            config.feed_url = url;
        }
        if let Some(id_source) = self.id_source {
            config.id_source = id_source;
        }
        if let Some(secs) = self.fetch_period {
            config.fetch_period_secs = secs;
        }
        if let Some(n) = self.history_length {
            config.history_length = n;
        }
        if let Some(fps) = self.fps {
            config.frames_per_second = fps;
        }
        if config.feed_url.is_empty() {
            bail!("No feed URL; pass --feed-url or set feed_url in the config");
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() {
    logger::setup();

    let mut args = Args::from_args();
    if let Err(err) = run(&mut args) {
        error!("{err:#}");
        std::process::exit(1);
    }
}

fn run(args: &mut Args) -> Result<()> {
    let config = args.config()?;
    let client = FeedClient::new(
        config.feed_url.clone(),
        config.id_source,
        config.fetch_timeout(),
    )?;
    let surface = GeoJsonSurface::new(args.zoom, args.geojson_out.take());

    // Fetching and animating interleave on one thread, so the store never needs a lock
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(animate(config, client, surface))
}

async fn animate(config: Config, client: FeedClient, mut surface: GeoJsonSurface) -> Result<()> {
    info!(
        "Polling {} every {}s, animating at {} fps",
        client.url(),
        config.fetch_period_secs,
        config.frames_per_second
    );

    let mut live = Live::new(&config);
    let (tx, mut rx) = mpsc::unbounded::<Vec<VehicleReport>>();

    let mut ticker = tokio::time::interval(config.frame_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = &mut ctrl_c => {
                info!(
                    "Quitting after {} frames, tracking {} vehicles",
                    surface.frames_drawn(),
                    live.store.len()
                );
                return Ok(());
            }
        }

        let step = live.step(&mut rx, Utc::now(), &mut surface);
        if step.start_fetch {
            let client = client.clone();
            let tx = tx.clone();
            tokio::spawn(async move {
                let batch = client.poll().await;
                // The receiver only goes away when quitting
                let _ = tx.unbounded_send(batch);
            });
        }
        trace!(
            "Drew {} paths and {} vehicles",
            step.frame.paths.len(),
            step.frame.points.len()
        );
    }
}
