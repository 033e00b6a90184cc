//! Test helpers and fixtures for controller tests
//!
//! `ScriptedEngine` never fires callbacks on its own. Tests decide when a
//! load finishes or a track ends by calling the recorded notifiers, then
//! apply them with `process_notifications`, so every interleaving is explicit.

#![allow(dead_code)]

use riff_player::{
    AudioCategory, EngineNotifier, EnginePosition, InstanceId, PlayerController, PlayerOptions,
    PlayerStatus, Playlist, SoundEngine, SoundHandle, Track, TrackSource,
};
use std::sync::{Arc, Mutex, MutexGuard, Once};

static INIT: Once = Once::new();

/// Initialize test logging once per binary
pub fn init_logging() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    });
}

/// Engine call as seen by the scripted engine
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    SetCategory(AudioCategory),
    Load(InstanceId, TrackSource),
    Play(InstanceId),
    Pause(InstanceId),
    Stop(InstanceId),
    Release(InstanceId),
    SetCurrentTime(InstanceId, f64),
    SetSpeed(InstanceId, f32),
    SetVolume(InstanceId, f32),
}

#[derive(Debug)]
struct ScriptState {
    calls: Vec<Call>,
    notifiers: Vec<EngineNotifier>,
    duration: f64,
    position: f64,
    position_queries: usize,
}

/// Engine whose callbacks are fired by the test
pub struct ScriptedEngine {
    state: Arc<Mutex<ScriptState>>,
}

/// Test-side view of a `ScriptedEngine`
#[derive(Clone)]
pub struct Script {
    state: Arc<Mutex<ScriptState>>,
}

/// Create an engine and its script (tracks report 200s by default)
pub fn scripted() -> (ScriptedEngine, Script) {
    let state = Arc::new(Mutex::new(ScriptState {
        calls: Vec::new(),
        notifiers: Vec::new(),
        duration: 200.0,
        position: 0.0,
        position_queries: 0,
    }));

    (
        ScriptedEngine {
            state: Arc::clone(&state),
        },
        Script { state },
    )
}

fn lock(state: &Mutex<ScriptState>) -> MutexGuard<'_, ScriptState> {
    state.lock().expect("script state poisoned")
}

impl Script {
    /// Every engine call so far, in order
    pub fn calls(&self) -> Vec<Call> {
        lock(&self.state).calls.clone()
    }

    pub fn clear_calls(&self) {
        lock(&self.state).calls.clear();
    }

    /// Number of engine instances created
    pub fn load_count(&self) -> usize {
        lock(&self.state).notifiers.len()
    }

    /// Notifier handed to the nth instance (0-based)
    pub fn notifier(&self, nth: usize) -> EngineNotifier {
        lock(&self.state).notifiers[nth].clone()
    }

    /// Notifier of the newest instance
    pub fn last_notifier(&self) -> EngineNotifier {
        lock(&self.state)
            .notifiers
            .last()
            .cloned()
            .expect("no instance loaded")
    }

    /// Track length reported by every instance
    pub fn set_duration(&self, seconds: f64) {
        lock(&self.state).duration = seconds;
    }

    /// Live position reported by every instance
    pub fn set_position(&self, seconds: f64) {
        lock(&self.state).position = seconds;
    }

    /// Instances released so far
    pub fn released(&self) -> Vec<InstanceId> {
        lock(&self.state)
            .calls
            .iter()
            .filter_map(|call| match call {
                Call::Release(id) => Some(*id),
                _ => None,
            })
            .collect()
    }

    /// Sources loaded so far, in order
    pub fn loaded_sources(&self) -> Vec<TrackSource> {
        lock(&self.state)
            .calls
            .iter()
            .filter_map(|call| match call {
                Call::Load(_, source) => Some(source.clone()),
                _ => None,
            })
            .collect()
    }

    /// Last volume pushed to any instance
    pub fn last_volume(&self) -> Option<f32> {
        lock(&self.state).calls.iter().rev().find_map(|call| match call {
            Call::SetVolume(_, volume) => Some(*volume),
            _ => None,
        })
    }

    /// Number of live position reads
    pub fn position_queries(&self) -> usize {
        lock(&self.state).position_queries
    }

    pub fn count(&self, matches: impl Fn(&Call) -> bool) -> usize {
        lock(&self.state).calls.iter().filter(|call| matches(call)).count()
    }
}

impl SoundEngine for ScriptedEngine {
    type Sound = ScriptedSound;

    fn set_category(&mut self, category: AudioCategory) {
        lock(&self.state).calls.push(Call::SetCategory(category));
    }

    fn load(&mut self, source: &TrackSource, notifier: EngineNotifier) -> ScriptedSound {
        let mut state = lock(&self.state);
        let id = notifier.instance();
        state.calls.push(Call::Load(id, source.clone()));
        state.notifiers.push(notifier);

        ScriptedSound {
            id,
            state: Arc::clone(&self.state),
        }
    }
}

/// Instance created by `ScriptedEngine`
pub struct ScriptedSound {
    id: InstanceId,
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedSound {
    fn record(&self, call: Call) {
        lock(&self.state).calls.push(call);
    }
}

impl SoundHandle for ScriptedSound {
    fn play(&mut self, _on_complete: EngineNotifier) {
        self.record(Call::Play(self.id));
    }

    fn pause(&mut self) {
        self.record(Call::Pause(self.id));
    }

    fn stop(&mut self) {
        self.record(Call::Stop(self.id));
    }

    fn release(&mut self) {
        self.record(Call::Release(self.id));
    }

    fn duration(&self) -> f64 {
        lock(&self.state).duration
    }

    fn current_time(&self) -> EnginePosition {
        let mut state = lock(&self.state);
        state.position_queries += 1;
        EnginePosition {
            seconds: state.position,
            is_playing: true,
        }
    }

    fn set_current_time(&mut self, seconds: f64) {
        let mut state = lock(&self.state);
        state.position = seconds;
        state.calls.push(Call::SetCurrentTime(self.id, seconds));
    }

    fn set_speed(&mut self, speed: f32) {
        self.record(Call::SetSpeed(self.id, speed));
    }

    fn set_volume(&mut self, volume: f32) {
        self.record(Call::SetVolume(self.id, volume));
    }
}

/// Playlist of `count` tracks named "Track 0", "Track 1", ...
pub fn playlist(count: usize) -> Playlist {
    let tracks = (0..count)
        .map(|i| {
            Track::new(
                format!("Track {i}"),
                TrackSource::url(format!("https://example.com/{i}.mp3")),
            )
        })
        .collect();

    Playlist::new(tracks).expect("playlist must not be empty")
}

/// Controller over `count` tracks, first load still in flight
pub fn controller(
    count: usize,
    options: PlayerOptions,
) -> (PlayerController<ScriptedEngine>, Script) {
    init_logging();
    let (engine, script) = scripted();
    let player = PlayerController::new(engine, playlist(count), options)
        .expect("Failed to create controller");
    (player, script)
}

/// Finish the newest load and apply it
pub fn finish_load(player: &mut PlayerController<ScriptedEngine>, script: &Script) {
    script.last_notifier().load_succeeded();
    player.process_notifications();
}

/// Controller over `count` tracks, first track loaded and playing
pub fn playing_controller(
    count: usize,
    options: PlayerOptions,
) -> (PlayerController<ScriptedEngine>, Script) {
    let (mut player, script) = controller(count, options);
    finish_load(&mut player, &script);
    assert_eq!(player.status(), PlayerStatus::Playing);
    (player, script)
}

/// Let the current track end and apply the callback
pub fn finish_track(player: &mut PlayerController<ScriptedEngine>, script: &Script) {
    script.last_notifier().playback_finished(true);
    player.process_notifications();
}
