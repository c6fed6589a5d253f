//! FM tuner
//!
//! Holds the station list and the selected station. While a station is tuned a
//! periodic generator announces a pseudo-random catalog track as radio text;
//! selecting a station replaces the generator.

use crate::error::Result;
use crate::live::{LiveStream, LiveValue};
use crate::scheduler::{ScheduledTask, SerialScheduler};
use async_trait::async_trait;
use futures::StreamExt;
use ivi_common::{Station, Track};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tracing::{debug, info, warn};

#[async_trait]
pub trait Radio: Send + Sync {
    fn name(&self) -> &str;

    async fn list(&self) -> Arc<[Station]>;

    /// Live index of the tuned station
    fn now_playing(&self) -> LiveStream<usize>;

    /// Live announced track; `None` until the first announcement
    fn radio_text(&self) -> LiveStream<Option<Track>>;

    /// Tune to `index`; the audio connection is not consulted
    async fn select(&self, index: usize) -> Result<()>;
}

struct TunerInner {
    name: String,
    scheduler: SerialScheduler,
    stations: Arc<[Station]>,
    tracks: Arc<[Track]>,
    station: LiveValue<usize>,
    text: LiveValue<Option<Track>>,
    generator: Mutex<Option<ScheduledTask>>,
    interval: Duration,
    rng: Mutex<StdRng>,
}

pub struct RadioTuner {
    inner: Arc<TunerInner>,
}

impl RadioTuner {
    /// Create the tuner and start announcing for station 0
    pub fn new(
        name: &str,
        stations: Arc<[Station]>,
        tracks: Arc<[Track]>,
        scheduler: SerialScheduler,
        interval: Duration,
        seed: Option<u64>,
    ) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let inner = Arc::new(TunerInner {
            name: name.to_string(),
            scheduler,
            stations,
            tracks,
            station: LiveValue::new(0),
            text: LiveValue::new(None),
            generator: Mutex::new(None),
            interval,
            rng: Mutex::new(rng),
        });

        info!(
            "Tuner '{}' with {} stations",
            inner.name,
            inner.stations.len()
        );

        let tuner = Arc::clone(&inner);
        if let Err(e) = inner.scheduler.execute(move || tuner.tune(0)) {
            warn!("Tuner '{}' could not start announcing: {}", inner.name, e);
        }

        Self { inner }
    }
}

impl TunerInner {
    fn tune(self: &Arc<Self>, index: usize) {
        self.station.set(index);

        let mut generator = self.generator.lock();
        if let Some(previous) = generator.take() {
            debug!("Tuner '{}' dropping previous announcer", self.name);
            previous.cancel();
        }

        let tuner: Weak<TunerInner> = Arc::downgrade(self);
        let scheduled = self
            .scheduler
            .schedule_periodic(Duration::ZERO, self.interval, move || {
                if let Some(tuner) = tuner.upgrade() {
                    tuner.announce(index);
                }
            });
        match scheduled {
            Ok(task) => *generator = Some(task),
            Err(e) => warn!("Tuner '{}' station {} has no radio text: {}", self.name, index, e),
        }
    }

    fn announce(&self, station: usize) {
        if self.tracks.is_empty() {
            return;
        }
        let pick = self.rng.lock().gen_range(0..self.tracks.len());
        let track = self.tracks[pick].clone();
        debug!(
            "Tuner '{}' station {} announces '{}'",
            self.name, station, track.title
        );
        self.text.set(Some(track));
    }
}

impl Drop for RadioTuner {
    fn drop(&mut self) {
        if let Some(generator) = self.inner.generator.lock().take() {
            generator.cancel();
        }
    }
}

#[async_trait]
impl Radio for RadioTuner {
    fn name(&self) -> &str {
        &self.inner.name
    }

    async fn list(&self) -> Arc<[Station]> {
        Arc::clone(&self.inner.stations)
    }

    fn now_playing(&self) -> LiveStream<usize> {
        self.inner.station.subscribe()
    }

    fn radio_text(&self) -> LiveStream<Option<Track>> {
        self.inner.text.subscribe()
    }

    async fn select(&self, index: usize) -> Result<()> {
        info!("Tuner '{}': select station {}", self.inner.name, index);
        let tuner = Arc::clone(&self.inner);
        self.inner.scheduler.submit(move || tuner.tune(index)).await
    }
}

/// Announcements only, skipping the initial `None`
pub fn announcements(radio: &dyn Radio) -> LiveStream<Track> {
    radio
        .radio_text()
        .filter_map(|item| async move { item.transpose() })
        .boxed()
}
