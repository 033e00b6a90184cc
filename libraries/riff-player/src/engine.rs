//! Native sound engine interface
//!
//! Abstracts the platform player (AVAudioPlayer, MediaPlayer, a desktop
//! decoder...) behind two traits. The engine decodes and outputs audio on its
//! own threads and reports back through an [`EngineNotifier`], which only
//! queues a message. The controller applies queued messages on its own thread.

use crate::error::LoadFailure;
use crate::types::{AudioCategory, TrackSource};
use std::fmt;
use tokio::sync::mpsc::UnboundedSender;
use tracing::trace;

/// Platform sound engine
///
/// Creates one [`SoundHandle`] per track load.
pub trait SoundEngine: Send {
    /// Engine instance bound to one track
    type Sound: SoundHandle;

    /// Configure platform audio routing
    ///
    /// Called once when the controller is created.
    fn set_category(&mut self, _category: AudioCategory) {}

    /// Start preparing a track
    ///
    /// Must return immediately. The engine reports the outcome exactly once
    /// through `notifier.load_succeeded()` or `notifier.load_failed(..)`,
    /// from any thread, possibly before this call returns.
    fn load(&mut self, source: &TrackSource, notifier: EngineNotifier) -> Self::Sound;
}

/// Engine instance bound to exactly one track
pub trait SoundHandle: Send {
    /// Start or resume output
    ///
    /// When output ends the engine calls `on_complete.playback_finished(true)`;
    /// when it is interrupted, `playback_finished(false)`.
    fn play(&mut self, on_complete: EngineNotifier);

    /// Pause output, keeping the position
    fn pause(&mut self);

    /// Stop output and rewind
    fn stop(&mut self);

    /// Free native resources
    ///
    /// The handle is dropped right after. Callbacks fired after release are
    /// discarded by the controller.
    fn release(&mut self);

    /// Track length in seconds (valid once loaded)
    fn duration(&self) -> f64;

    /// Live playback position
    fn current_time(&self) -> EnginePosition;

    /// Move the playback position (seconds)
    fn set_current_time(&mut self, seconds: f64);

    /// Playback speed multiplier
    fn set_speed(&mut self, speed: f32);

    /// Output volume (0.0-1.0)
    fn set_volume(&mut self, volume: f32);
}

/// Position reported by an engine instance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnginePosition {
    pub seconds: f64,
    pub is_playing: bool,
}

/// Identity of one engine instance
///
/// Allocated by the controller per load and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(u64);

impl InstanceId {
    pub(crate) fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Callback queued by an engine instance
#[derive(Debug, Clone, PartialEq)]
pub struct EngineNotification {
    pub(crate) instance: InstanceId,
    pub(crate) kind: NotificationKind,
}

impl EngineNotification {
    /// Instance that fired the callback
    pub fn instance(&self) -> InstanceId {
        self.instance
    }

    pub fn kind(&self) -> &NotificationKind {
        &self.kind
    }
}

/// The two callback channels of an engine instance
#[derive(Debug, Clone, PartialEq)]
pub enum NotificationKind {
    /// Track preparation finished
    LoadCompleted(Result<(), LoadFailure>),

    /// Output ended (`reached_end`) or was interrupted
    PlaybackCompleted { reached_end: bool },
}

/// Notification port handed to one engine instance
///
/// Cheap to clone, `Send`, and safe to call after the controller is gone.
#[derive(Debug, Clone)]
pub struct EngineNotifier {
    instance: InstanceId,
    tx: UnboundedSender<EngineNotification>,
}

impl EngineNotifier {
    pub(crate) fn new(instance: InstanceId, tx: UnboundedSender<EngineNotification>) -> Self {
        Self { instance, tx }
    }

    /// Instance this port belongs to
    pub fn instance(&self) -> InstanceId {
        self.instance
    }

    /// Report that the track is ready to play
    pub fn load_succeeded(&self) {
        self.send(NotificationKind::LoadCompleted(Ok(())));
    }

    /// Report that the track could not be prepared
    pub fn load_failed(&self, message: impl Into<String>) {
        self.send(NotificationKind::LoadCompleted(Err(LoadFailure::new(message))));
    }

    /// Report the end of output
    pub fn playback_finished(&self, reached_end: bool) {
        self.send(NotificationKind::PlaybackCompleted { reached_end });
    }

    fn send(&self, kind: NotificationKind) {
        let notification = EngineNotification {
            instance: self.instance,
            kind,
        };

        if self.tx.send(notification).is_err() {
            trace!(instance = %self.instance, "Controller gone, dropping engine callback");
        }
    }
}
