//! Core types for the player

use crate::error::{PlayerError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One playable item
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Track {
    /// Display name
    pub name: String,

    /// Where the engine finds the audio
    pub source: TrackSource,
}

impl Track {
    pub fn new(name: impl Into<String>, source: TrackSource) -> Self {
        Self {
            name: name.into(),
            source,
        }
    }
}

/// Location of a track's audio, one variant per engine constructor
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TrackSource {
    /// File shipped with the app, relative to a platform base directory
    Bundle {
        path: String,
        #[serde(default)]
        base_path: BasePath,
    },

    /// Remote audio streamed over the network
    Url { url: String },

    /// Audio compiled into the app as a resource handle
    Embedded { resource: ResourceId },
}

impl TrackSource {
    pub fn bundle(path: impl Into<String>, base_path: BasePath) -> Self {
        Self::Bundle {
            path: path.into(),
            base_path,
        }
    }

    pub fn url(url: impl Into<String>) -> Self {
        Self::Url { url: url.into() }
    }

    pub fn embedded(resource: impl Into<ResourceId>) -> Self {
        Self::Embedded {
            resource: resource.into(),
        }
    }
}

impl fmt::Display for TrackSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bundle { path, base_path } => write!(f, "{base_path}:{path}"),
            Self::Url { url } => f.write_str(url),
            Self::Embedded { resource } => write!(f, "resource:{resource}"),
        }
    }
}

/// Base directory tag for bundle-relative tracks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BasePath {
    #[default]
    MainBundle,
    Documents,
    Library,
    Caches,
}

impl fmt::Display for BasePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::MainBundle => "main_bundle",
            Self::Documents => "documents",
            Self::Library => "library",
            Self::Caches => "caches",
        };
        f.write_str(name)
    }
}

/// Handle of an embedded audio resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(pub u32);

impl From<u32> for ResourceId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ordered, immutable, non-empty list of tracks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Playlist {
    tracks: Vec<Track>,
}

impl Playlist {
    pub fn new(tracks: Vec<Track>) -> Result<Self> {
        if tracks.is_empty() {
            return Err(PlayerError::EmptyPlaylist);
        }
        Ok(Self { tracks })
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    /// Whether the playlist has no tracks
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }
}

/// Player status
///
/// Transitions are restricted to the table in [`PlayerStatus::can_transition_to`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerStatus {
    /// Engine is preparing the current track
    Loading,

    /// Track prepared; immediately followed by `Playing`
    Ready,

    /// Engine failed to prepare the current track
    Error,

    /// Audio is playing
    Playing,

    /// Paused mid-track
    Paused,

    /// Stopped and rewound
    Stopped,
}

impl PlayerStatus {
    /// Whether `self -> next` is a legal transition
    ///
    /// Entering `Loading` is always legal (track changes supersede an
    /// in-flight load). Only load completion leaves `Loading`.
    pub fn can_transition_to(self, next: PlayerStatus) -> bool {
        use PlayerStatus::{Error, Loading, Paused, Playing, Ready, Stopped};

        match (self, next) {
            (_, Loading) => true,
            (Loading, Ready | Error) => true,
            (Ready | Paused | Stopped, Playing) => true,
            (Playing, Paused) => true,
            (Playing | Paused, Stopped) => true,
            _ => false,
        }
    }
}

impl fmt::Display for PlayerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Loading => "loading",
            Self::Ready => "ready",
            Self::Error => "error",
            Self::Playing => "playing",
            Self::Paused => "paused",
            Self::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Platform audio routing mode, set once at startup
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioCategory {
    /// Keeps playing with the silent switch on and in the background
    #[default]
    Playback,

    /// Mixes with other apps' audio
    Ambient,

    /// Silenced by the silent switch
    SoloAmbient,
}

/// What next/previous do at the playlist boundaries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigationPolicy {
    /// Wrap around modulo the track count
    #[default]
    Wrap,

    /// Stop at the ends (next at the last track and previous at the first are no-ops)
    Clamped,
}

/// Configuration for a player controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerOptions {
    /// Seconds skipped by increase/decrease time (default: 15)
    #[serde(default = "default_time_rate_secs")]
    pub time_rate_secs: f64,

    /// Log every status transition at info level (default: false)
    #[serde(default)]
    pub log_status: bool,

    /// Position poll interval while playing (default: 100 ms)
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Initial volume (0-100, default: 100)
    #[serde(default = "default_volume")]
    pub initial_volume: u8,

    /// Initial speed multiplier (0-2, default: 1.0)
    #[serde(default = "default_speed")]
    pub initial_speed: f32,

    /// Start with shuffle on (default: false)
    #[serde(default)]
    pub shuffle: bool,

    /// Start with loop on (default: false)
    #[serde(default)]
    pub looping: bool,

    /// Boundary behavior of next/previous (default: wrap)
    #[serde(default)]
    pub navigation: NavigationPolicy,

    /// Audio category applied at startup (default: playback)
    #[serde(default)]
    pub category: AudioCategory,

    /// Fixed shuffle seed for reproducible order (default: random)
    #[serde(default)]
    pub shuffle_seed: Option<u64>,
}

fn default_time_rate_secs() -> f64 {
    15.0
}

fn default_poll_interval_ms() -> u64 {
    100
}

fn default_volume() -> u8 {
    100
}

fn default_speed() -> f32 {
    1.0
}

impl Default for PlayerOptions {
    fn default() -> Self {
        Self {
            time_rate_secs: default_time_rate_secs(),
            log_status: false,
            poll_interval_ms: default_poll_interval_ms(),
            initial_volume: default_volume(),
            initial_speed: default_speed(),
            shuffle: false,
            looping: false,
            navigation: NavigationPolicy::default(),
            category: AudioCategory::default(),
            shuffle_seed: None,
        }
    }
}

impl PlayerOptions {
    /// Validate option ranges
    pub fn validate(&self) -> Result<()> {
        if !(self.time_rate_secs.is_finite() && self.time_rate_secs > 0.0) {
            return Err(PlayerError::Config(format!(
                "time_rate_secs must be positive, got {}",
                self.time_rate_secs
            )));
        }

        if !is_valid_speed(self.initial_speed) {
            return Err(PlayerError::Config(format!(
                "initial_speed must be in (0, 2], got {}",
                self.initial_speed
            )));
        }

        if self.initial_volume > MAX_VOLUME {
            return Err(PlayerError::Config(format!(
                "initial_volume must be at most {MAX_VOLUME}, got {}",
                self.initial_volume
            )));
        }

        if self.poll_interval_ms == 0 {
            return Err(PlayerError::Config(
                "poll_interval_ms must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

/// Highest accepted playback speed
pub const MAX_SPEED: f32 = 2.0;

/// Highest accepted volume percent
pub const MAX_VOLUME: u8 = 100;

/// Speeds in `(0, MAX_SPEED]` are accepted; NaN is not
pub(crate) fn is_valid_speed(speed: f32) -> bool {
    speed > 0.0 && speed <= MAX_SPEED
}

/// Which transport controls are currently usable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlAvailability {
    pub play: bool,
    pub pause: bool,
    pub stop: bool,
    pub next: bool,
    pub previous: bool,
}

/// Read-only copy of the player state for rendering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub status: PlayerStatus,
    pub current_index: usize,
    pub track_count: usize,
    pub track_name: String,
    pub current_time: f64,
    pub duration: f64,
    pub current_time_string: String,
    pub duration_string: String,
    pub speed: f32,
    pub volume: u8,
    pub previous_volume: u8,
    pub is_muted: bool,
    pub is_shuffle: bool,
    pub is_loop: bool,
    pub remaining_shuffle_indices: Vec<usize>,
    pub error_message: Option<String>,
    pub controls: ControlAvailability,
}
