//! Player controller - core orchestration
//!
//! Owns all player state, turns transport actions into engine calls and
//! status transitions, and applies engine callbacks queued by the current
//! engine instance. Callbacks from released instances are discarded.

use crate::{
    engine::{
        EngineNotification, EngineNotifier, InstanceId, NotificationKind, SoundEngine,
        SoundHandle,
    },
    error::{LoadFailure, Result},
    events::PlayerEvent,
    format::format_time,
    shuffle::{ShufflePool, ShuffleState},
    types::{
        is_valid_speed, ControlAvailability, NavigationPolicy, PlayerOptions, PlayerSnapshot,
        PlayerStatus, Playlist, Track,
    },
    volume::Volume,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

/// Traversal direction for next/previous
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Forward,
    Backward,
}

/// The live engine instance and its notification port
struct BoundSound<S> {
    id: InstanceId,
    handle: S,
    notifier: EngineNotifier,
}

/// Central player state machine
///
/// Single-threaded: every method takes `&mut self`. Engine callbacks are
/// queued and applied by [`PlayerController::process_notifications`] (or by
/// [`crate::PlayerService`], which drives the controller on one task).
pub struct PlayerController<E: SoundEngine> {
    engine: E,
    playlist: Playlist,
    options: PlayerOptions,

    // State
    status: PlayerStatus,
    current_index: usize,
    current_time: f64,
    duration: f64,
    speed: f32,
    volume: Volume,
    shuffle: ShuffleState,
    looping: bool,
    last_error: Option<LoadFailure>,

    // Engine binding
    sound: Option<BoundSound<E::Sound>>,
    next_instance: u64,
    notification_tx: UnboundedSender<EngineNotification>,
    notification_rx: UnboundedReceiver<EngineNotification>,

    rng: StdRng,

    // Event queue for UI synchronization
    pending_events: Vec<PlayerEvent>,
}

impl<E: SoundEngine> PlayerController<E> {
    /// Create a controller and start loading the first track
    pub fn new(mut engine: E, playlist: Playlist, options: PlayerOptions) -> Result<Self> {
        options.validate()?;

        engine.set_category(options.category);

        let (notification_tx, notification_rx) = mpsc::unbounded_channel();
        let rng = match options.shuffle_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let shuffle = if options.shuffle {
            ShuffleState::On(ShufflePool::new())
        } else {
            ShuffleState::Off
        };

        let mut controller = Self {
            engine,
            playlist,
            status: PlayerStatus::Loading,
            current_index: 0,
            current_time: 0.0,
            duration: 0.0,
            speed: options.initial_speed,
            volume: Volume::new(options.initial_volume),
            shuffle,
            looping: options.looping,
            last_error: None,
            sound: None,
            next_instance: 0,
            notification_tx,
            notification_rx,
            rng,
            pending_events: Vec::new(),
            options,
        };

        controller.load(0);
        Ok(controller)
    }

    // ===== Loading =====

    /// Make the track at `index` current and start loading it
    ///
    /// Releases the previous engine instance first. Out-of-range indices are
    /// ignored. Allowed in any status; a load in flight is superseded.
    pub fn load(&mut self, index: usize) {
        if index >= self.playlist.len() {
            debug!(index, track_count = self.playlist.len(), "Ignoring load of out-of-range index");
            return;
        }

        self.release_sound();

        self.current_index = index;
        self.current_time = 0.0;
        self.duration = 0.0;
        if let ShuffleState::On(pool) = &mut self.shuffle {
            pool.remove(index);
        }
        self.set_status(PlayerStatus::Loading);

        self.next_instance += 1;
        let id = InstanceId::new(self.next_instance);
        let notifier = EngineNotifier::new(id, self.notification_tx.clone());
        let track = &self.playlist.tracks()[index];

        if self.options.log_status {
            info!(index, instance = %id, name = %track.name, source = %track.source, "Loading track");
        } else {
            debug!(index, instance = %id, source = %track.source, "Loading track");
        }

        let handle = self.engine.load(&track.source, notifier.clone());
        self.sound = Some(BoundSound {
            id,
            handle,
            notifier,
        });

        self.pending_events.push(PlayerEvent::TrackChanged {
            index,
            name: track.name.clone(),
        });
    }

    fn on_load_completed(&mut self, result: std::result::Result<(), LoadFailure>) {
        if self.status != PlayerStatus::Loading {
            debug!(status = %self.status, "Ignoring repeated load completion");
            return;
        }

        match result {
            Err(failure) => {
                warn!(index = self.current_index, error = %failure, "Track failed to load");
                self.pending_events.push(PlayerEvent::LoadFailed {
                    index: self.current_index,
                    message: failure.message.clone(),
                });
                self.last_error = Some(failure);
                self.set_status(PlayerStatus::Error);
            }
            Ok(()) => {
                let Some(sound) = self.sound.as_mut() else {
                    return;
                };

                let duration = sound.handle.duration();
                self.duration = if duration.is_finite() && duration > 0.0 {
                    duration
                } else {
                    0.0
                };

                // Settings survive track changes
                sound.handle.set_speed(self.speed);
                sound.handle.set_volume(self.volume.gain());

                self.last_error = None;
                self.set_status(PlayerStatus::Ready);
                self.push_position();
                self.play();
            }
        }
    }

    // ===== Transport =====

    /// Start or resume playback
    ///
    /// Ignored while already playing, loading, or after a load error.
    pub fn play(&mut self) {
        if self.status == PlayerStatus::Playing {
            return;
        }
        if !self.status.can_transition_to(PlayerStatus::Playing) {
            debug!(status = %self.status, "Ignoring play");
            return;
        }

        let gain = self.volume.gain();
        let Some(sound) = self.sound.as_mut() else {
            return;
        };

        sound.handle.set_volume(gain);
        sound.handle.play(sound.notifier.clone());
        self.set_status(PlayerStatus::Playing);
    }

    /// Pause playback (only while playing)
    pub fn pause(&mut self) {
        if self.status != PlayerStatus::Playing {
            return;
        }
        let Some(sound) = self.sound.as_mut() else {
            return;
        };

        sound.handle.pause();
        self.set_status(PlayerStatus::Paused);
    }

    /// Stop playback and rewind (only while playing or paused)
    pub fn stop(&mut self) {
        if !self.status.can_transition_to(PlayerStatus::Stopped) {
            return;
        }
        let Some(sound) = self.sound.as_mut() else {
            return;
        };

        sound.handle.stop();
        self.current_time = 0.0;
        self.set_status(PlayerStatus::Stopped);
        self.push_position();
    }

    /// Advance to the next track
    ///
    /// Shuffle draws from the pool; otherwise moves forward by one, wrapping
    /// or stopping at the end depending on the navigation policy.
    pub fn next(&mut self) {
        self.step(Direction::Forward);
    }

    /// Go back to the previous track
    ///
    /// Shuffle draws from the same pool as `next`.
    pub fn previous(&mut self) {
        self.step(Direction::Backward);
    }

    fn step(&mut self, direction: Direction) -> bool {
        if self.sound.is_none() {
            return false;
        }
        // Track changes wait for the current load to finish
        if self.status == PlayerStatus::Loading {
            debug!(?direction, "Ignoring track change while loading");
            return false;
        }

        match self.target_index(direction) {
            Some(index) => {
                self.load(index);
                true
            }
            None => {
                debug!(?direction, index = self.current_index, "No track in that direction");
                false
            }
        }
    }

    fn target_index(&mut self, direction: Direction) -> Option<usize> {
        let count = self.playlist.len();
        let current = self.current_index;

        if let ShuffleState::On(pool) = &mut self.shuffle {
            // A single-track playlist has nothing else to draw; replay it
            return Some(pool.draw(current, count, &mut self.rng).unwrap_or(current));
        }

        match (direction, self.options.navigation) {
            (Direction::Forward, NavigationPolicy::Wrap) => Some((current + 1) % count),
            (Direction::Forward, NavigationPolicy::Clamped) => {
                (current + 1 < count).then_some(current + 1)
            }
            (Direction::Backward, NavigationPolicy::Wrap) => {
                Some(current.checked_sub(1).unwrap_or(count - 1))
            }
            (Direction::Backward, NavigationPolicy::Clamped) => current.checked_sub(1),
        }
    }

    /// Engine reported the end of output
    ///
    /// `reached_end == false` (an interruption) changes nothing. At the end of
    /// a track, loop replays it from the start; otherwise this acts as `next`.
    /// Only a playing track can end: a signal queued before a pause or stop
    /// is dropped.
    pub fn playback_completed(&mut self, reached_end: bool) {
        if !reached_end {
            debug!(index = self.current_index, "Playback interrupted");
            return;
        }
        if self.status != PlayerStatus::Playing {
            debug!(
                index = self.current_index,
                status = %self.status,
                "Ignoring end of track while not playing"
            );
            return;
        }

        if self.looping {
            self.restart_current();
        } else if !self.step(Direction::Forward) {
            // End of a clamped playlist
            self.stop();
        }
    }

    fn restart_current(&mut self) {
        let Some(sound) = self.sound.as_mut() else {
            return;
        };

        debug!(index = self.current_index, "Looping track");
        sound.handle.set_current_time(0.0);
        sound.handle.play(sound.notifier.clone());
        self.current_time = 0.0;
        self.set_status(PlayerStatus::Playing);
        self.push_position();
    }

    // ===== Seek =====

    /// Move to `seconds` in the current track
    ///
    /// No clamping; `increase_time`/`decrease_time` clamp before calling.
    pub fn seek_to_time(&mut self, seconds: f64) {
        if !seconds.is_finite() {
            return;
        }
        let Some(sound) = self.sound.as_mut() else {
            return;
        };

        sound.handle.set_current_time(seconds);
        self.current_time = seconds;
        self.push_position();
    }

    /// Skip forward by the time rate, stopping at the end of the track
    pub fn increase_time(&mut self) {
        self.skip_by(self.options.time_rate_secs);
    }

    /// Skip back by the time rate, stopping at the start of the track
    pub fn decrease_time(&mut self) {
        self.skip_by(-self.options.time_rate_secs);
    }

    fn skip_by(&mut self, delta: f64) {
        let Some(sound) = self.sound.as_ref() else {
            return;
        };

        // Read the engine, not the cached position, which lags by a poll tick
        let live = sound.handle.current_time().seconds;
        let live = if live.is_finite() {
            live
        } else {
            self.current_time
        };

        self.seek_to_time((live + delta).clamp(0.0, self.duration));
    }

    /// Poll the engine position
    ///
    /// Only queries the engine while playing. Returns whether
    /// `current_time` changed.
    pub fn poll_position(&mut self) -> bool {
        if self.status != PlayerStatus::Playing {
            return false;
        }
        let Some(sound) = self.sound.as_ref() else {
            return false;
        };

        let seconds = sound.handle.current_time().seconds;
        if !seconds.is_finite() {
            return false;
        }
        let seconds = if self.duration > 0.0 {
            seconds.clamp(0.0, self.duration)
        } else {
            seconds.max(0.0)
        };

        if seconds == self.current_time {
            return false;
        }

        self.current_time = seconds;
        self.push_position();
        true
    }

    // ===== Speed & Volume =====

    /// Set playback speed
    ///
    /// Values outside `(0, 2]` are ignored.
    pub fn set_speed(&mut self, speed: f32) {
        if !is_valid_speed(speed) {
            debug!(speed, "Ignoring out-of-range speed");
            return;
        }

        self.speed = speed;
        if let Some(sound) = self.sound.as_mut() {
            sound.handle.set_speed(speed);
        }
        self.pending_events.push(PlayerEvent::SpeedChanged { speed });
    }

    /// Set volume (0-100)
    ///
    /// Values above 100 are ignored. A positive level also unmutes.
    pub fn change_volume(&mut self, level: u8) {
        if !self.volume.set_level(level) {
            debug!(level, "Ignoring out-of-range volume");
            return;
        }

        self.apply_volume();
    }

    /// Mute audio, remembering the current volume
    pub fn mute(&mut self) {
        if self.volume.mute() {
            self.apply_volume();
        }
    }

    /// Unmute audio, restoring the volume from before the mute
    pub fn unmute(&mut self) {
        if self.volume.unmute() {
            self.apply_volume();
        }
    }

    /// Toggle mute state
    pub fn toggle_mute(&mut self) {
        self.volume.toggle_mute();
        self.apply_volume();
    }

    fn apply_volume(&mut self) {
        if let Some(sound) = self.sound.as_mut() {
            sound.handle.set_volume(self.volume.gain());
        }
        self.pending_events.push(PlayerEvent::VolumeChanged {
            level: self.volume.level(),
            is_muted: self.volume.is_muted(),
        });
    }

    // ===== Shuffle & Loop =====

    /// Toggle shuffle
    ///
    /// The pool is filled lazily by the next `next`/`previous`.
    pub fn toggle_shuffle(&mut self) {
        self.shuffle.toggle();
        self.push_modes();
    }

    /// Toggle loop of the current track
    pub fn toggle_loop(&mut self) {
        self.looping = !self.looping;
        self.push_modes();
    }

    fn push_modes(&mut self) {
        self.pending_events.push(PlayerEvent::ModesChanged {
            shuffle: self.shuffle.is_on(),
            looping: self.looping,
        });
    }

    // ===== Engine callbacks =====

    /// Apply one engine callback
    ///
    /// Returns false if it came from a released instance and was discarded.
    pub fn handle_notification(&mut self, notification: EngineNotification) -> bool {
        let live = self.sound.as_ref().map(|sound| sound.id);
        if live != Some(notification.instance) {
            debug!(
                instance = %notification.instance,
                "Discarding callback from released engine instance"
            );
            return false;
        }

        match notification.kind {
            NotificationKind::LoadCompleted(result) => self.on_load_completed(result),
            NotificationKind::PlaybackCompleted { reached_end } => {
                self.playback_completed(reached_end);
            }
        }
        true
    }

    /// Apply every queued engine callback
    ///
    /// Returns how many were applied (stale ones are not counted).
    pub fn process_notifications(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(notification) = self.notification_rx.try_recv() {
            if self.handle_notification(notification) {
                applied += 1;
            }
        }
        applied
    }

    /// Wait for the next engine callback
    pub(crate) async fn next_notification(&mut self) -> Option<EngineNotification> {
        self.notification_rx.recv().await
    }

    // ===== Lifecycle =====

    /// Release the engine instance and drop the controller
    pub fn dispose(mut self) {
        self.release_sound();
    }

    fn release_sound(&mut self) {
        if let Some(mut sound) = self.sound.take() {
            debug!(instance = %sound.id, "Releasing engine instance");
            sound.handle.release();
        }
    }

    fn set_status(&mut self, status: PlayerStatus) {
        if self.status == status {
            return;
        }

        let previous = self.status;
        self.status = status;

        if self.options.log_status {
            info!(from = %previous, to = %status, index = self.current_index, "Player status");
        } else {
            debug!(from = %previous, to = %status, index = self.current_index, "Player status");
        }

        self.pending_events.push(PlayerEvent::StatusChanged { status });
    }

    fn push_position(&mut self) {
        self.pending_events.push(PlayerEvent::PositionUpdate {
            current_time: self.current_time,
            duration: self.duration,
        });
    }

    // ===== State Queries =====

    pub fn status(&self) -> PlayerStatus {
        self.status
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_track(&self) -> &Track {
        &self.playlist.tracks()[self.current_index]
    }

    pub fn current_track_name(&self) -> &str {
        &self.current_track().name
    }

    pub fn playlist(&self) -> &Playlist {
        &self.playlist
    }

    pub fn track_count(&self) -> usize {
        self.playlist.len()
    }

    /// Position in seconds as of the last poll or seek
    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    /// Track length in seconds (0 until loaded)
    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn current_time_string(&self) -> String {
        format_time(self.current_time)
    }

    pub fn duration_string(&self) -> String {
        format_time(self.duration)
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn volume(&self) -> u8 {
        self.volume.level()
    }

    pub fn previous_volume(&self) -> u8 {
        self.volume.previous_level()
    }

    pub fn is_muted(&self) -> bool {
        self.volume.is_muted()
    }

    pub fn is_shuffle(&self) -> bool {
        self.shuffle.is_on()
    }

    pub fn is_loop(&self) -> bool {
        self.looping
    }

    /// Shuffle pool of the current cycle (empty when shuffle is off)
    pub fn remaining_shuffle_indices(&self) -> &[usize] {
        self.shuffle.remaining()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.last_error.as_ref().map(|failure| failure.message.as_str())
    }

    pub fn last_error(&self) -> Option<&LoadFailure> {
        self.last_error.as_ref()
    }

    /// Seconds skipped by increase/decrease time
    pub fn time_rate(&self) -> f64 {
        self.options.time_rate_secs
    }

    pub fn options(&self) -> &PlayerOptions {
        &self.options
    }

    /// Whether an engine instance is bound
    pub fn is_bound(&self) -> bool {
        self.sound.is_some()
    }

    /// Id of the bound engine instance
    pub fn current_instance(&self) -> Option<InstanceId> {
        self.sound.as_ref().map(|sound| sound.id)
    }

    /// Which transport controls are usable right now
    pub fn controls(&self) -> ControlAvailability {
        let loading = self.status == PlayerStatus::Loading;
        let free_navigation =
            self.shuffle.is_on() || self.options.navigation == NavigationPolicy::Wrap;

        ControlAvailability {
            play: self.status != PlayerStatus::Playing
                && self.status.can_transition_to(PlayerStatus::Playing),
            pause: self.status == PlayerStatus::Playing,
            stop: self.status.can_transition_to(PlayerStatus::Stopped),
            next: !loading && (free_navigation || self.current_index + 1 < self.playlist.len()),
            previous: !loading && (free_navigation || self.current_index > 0),
        }
    }

    /// Copy of the full state for rendering
    pub fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            status: self.status,
            current_index: self.current_index,
            track_count: self.playlist.len(),
            track_name: self.current_track_name().to_string(),
            current_time: self.current_time,
            duration: self.duration,
            current_time_string: self.current_time_string(),
            duration_string: self.duration_string(),
            speed: self.speed,
            volume: self.volume.level(),
            previous_volume: self.volume.previous_level(),
            is_muted: self.volume.is_muted(),
            is_shuffle: self.shuffle.is_on(),
            is_loop: self.looping,
            remaining_shuffle_indices: self.shuffle.remaining().to_vec(),
            error_message: self.error_message().map(str::to_string),
            controls: self.controls(),
        }
    }

    /// Drain queued events
    pub fn take_events(&mut self) -> Vec<PlayerEvent> {
        std::mem::take(&mut self.pending_events)
    }
}

impl<E: SoundEngine> Drop for PlayerController<E> {
    fn drop(&mut self) {
        self.release_sound();
    }
}
