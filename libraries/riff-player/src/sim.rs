//! Clock-driven sound engine
//!
//! Plays nothing. Each track has a length; a sound "plays" by letting the
//! tokio clock run, scaled by speed, and fires the same callbacks a native
//! engine would: load completion after a short delay, and end of playback
//! once the position reaches the length. Needs a tokio runtime.

use crate::{
    engine::{EnginePosition, EngineNotifier, SoundEngine, SoundHandle},
    error::{PlayerError, Result},
    types::{AudioCategory, TrackSource},
};
use std::collections::HashMap;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};

/// Default simulated track length (seconds)
const DEFAULT_DURATION_SECS: f64 = 180.0;

/// Default simulated load latency
const DEFAULT_LOAD_DELAY: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, PartialEq)]
enum CatalogEntry {
    Playable { duration: f64 },
    Broken { message: String },
}

/// Simulated engine with a catalog of track lengths
#[derive(Debug, Clone)]
pub struct SimulatedEngine {
    catalog: HashMap<TrackSource, CatalogEntry>,
    default_duration: f64,
    load_delay: Duration,
    category: Option<AudioCategory>,
}

impl Default for SimulatedEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedEngine {
    pub fn new() -> Self {
        Self {
            catalog: HashMap::new(),
            default_duration: DEFAULT_DURATION_SECS,
            load_delay: DEFAULT_LOAD_DELAY,
            category: None,
        }
    }

    /// Length used for sources missing from the catalog
    pub fn with_default_duration(mut self, seconds: f64) -> Result<Self> {
        self.default_duration = checked_duration(seconds)?;
        Ok(self)
    }

    /// Delay between `load` and the load callback
    pub fn with_load_delay(mut self, delay: Duration) -> Self {
        self.load_delay = delay;
        self
    }

    /// Register a playable source
    pub fn insert_track(&mut self, source: TrackSource, duration_secs: f64) -> Result<()> {
        let duration = checked_duration(duration_secs)?;
        self.catalog.insert(source, CatalogEntry::Playable { duration });
        Ok(())
    }

    /// Register a source whose load fails with `message`
    pub fn insert_broken(&mut self, source: TrackSource, message: impl Into<String>) {
        self.catalog.insert(
            source,
            CatalogEntry::Broken {
                message: message.into(),
            },
        );
    }

    /// Category set by the controller, if any
    pub fn category(&self) -> Option<AudioCategory> {
        self.category
    }
}

/// Track lengths must be finite and non-negative
fn checked_duration(seconds: f64) -> Result<f64> {
    if seconds.is_finite() && seconds >= 0.0 {
        Ok(seconds)
    } else {
        Err(PlayerError::Config(format!("Invalid simulated track length: {seconds}")))
    }
}

impl SoundEngine for SimulatedEngine {
    type Sound = SimulatedSound;

    fn set_category(&mut self, category: AudioCategory) {
        self.category = Some(category);
    }

    fn load(&mut self, source: &TrackSource, notifier: EngineNotifier) -> SimulatedSound {
        let entry = self
            .catalog
            .get(source)
            .cloned()
            .unwrap_or(CatalogEntry::Playable {
                duration: self.default_duration,
            });
        let duration = match &entry {
            CatalogEntry::Playable { duration } => *duration,
            CatalogEntry::Broken { .. } => 0.0,
        };

        let delay = self.load_delay;
        let load_task = tokio::spawn(async move {
            time::sleep(delay).await;
            match entry {
                CatalogEntry::Playable { .. } => notifier.load_succeeded(),
                CatalogEntry::Broken { message } => notifier.load_failed(message),
            }
        });

        SimulatedSound {
            duration,
            position: 0.0,
            playing_since: None,
            speed: 1.0,
            volume: 1.0,
            on_complete: None,
            load_task: Some(load_task),
            finish_task: None,
        }
    }
}

/// One simulated engine instance
#[derive(Debug)]
pub struct SimulatedSound {
    duration: f64,

    /// Position at `playing_since` (or the paused position)
    position: f64,
    playing_since: Option<Instant>,

    speed: f32,
    volume: f32,
    on_complete: Option<EngineNotifier>,
    load_task: Option<JoinHandle<()>>,
    finish_task: Option<JoinHandle<()>>,
}

impl SimulatedSound {
    /// Volume last set by the controller
    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    fn live_position(&self) -> f64 {
        match self.playing_since {
            Some(since) => {
                let played = since.elapsed().as_secs_f64() * f64::from(self.speed);
                (self.position + played).min(self.duration)
            }
            None => self.position,
        }
    }

    /// Move the anchor to now
    fn settle(&mut self) {
        self.position = self.live_position();
        if self.playing_since.is_some() {
            self.playing_since = Some(Instant::now());
        }
    }

    fn cancel_finish(&mut self) {
        if let Some(task) = self.finish_task.take() {
            task.abort();
        }
    }

    fn schedule_finish(&mut self) {
        self.cancel_finish();

        let (Some(notifier), Some(_)) = (self.on_complete.clone(), self.playing_since) else {
            return;
        };

        let remaining = ((self.duration - self.position) / f64::from(self.speed)).max(0.0);
        self.finish_task = Some(tokio::spawn(async move {
            time::sleep(Duration::from_secs_f64(remaining)).await;
            notifier.playback_finished(true);
        }));
    }
}

impl SoundHandle for SimulatedSound {
    fn play(&mut self, on_complete: EngineNotifier) {
        self.settle();
        if self.position >= self.duration {
            self.position = 0.0;
        }

        self.on_complete = Some(on_complete);
        self.playing_since = Some(Instant::now());
        self.schedule_finish();
    }

    fn pause(&mut self) {
        self.settle();
        self.playing_since = None;
        self.cancel_finish();
    }

    fn stop(&mut self) {
        self.playing_since = None;
        self.position = 0.0;
        self.cancel_finish();
    }

    fn release(&mut self) {
        self.stop();
        self.on_complete = None;
        if let Some(task) = self.load_task.take() {
            task.abort();
        }
    }

    fn duration(&self) -> f64 {
        self.duration
    }

    fn current_time(&self) -> EnginePosition {
        let seconds = self.live_position();
        EnginePosition {
            seconds,
            is_playing: self.playing_since.is_some() && seconds < self.duration,
        }
    }

    fn set_current_time(&mut self, seconds: f64) {
        self.settle();
        self.position = seconds.clamp(0.0, self.duration);
        if self.playing_since.is_some() {
            self.playing_since = Some(Instant::now());
            self.schedule_finish();
        }
    }

    fn set_speed(&mut self, speed: f32) {
        self.settle();
        self.speed = speed;
        if self.playing_since.is_some() {
            self.schedule_finish();
        }
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
    }
}

impl Drop for SimulatedSound {
    fn drop(&mut self) {
        self.release();
    }
}
