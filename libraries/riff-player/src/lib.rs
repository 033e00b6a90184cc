//! Riff Player - Player Controller
//!
//! Platform-agnostic audio player controller for Riff Player.
//!
//! This crate provides:
//! - Playlist navigation (wrapping or clamped next/previous)
//! - Shuffle without repeats until every other track has played
//! - Loop of the current track
//! - Volume (0-100, mute/unmute with restore) and speed (0-2x)
//! - Seek and fixed-step skip forward/back
//! - Position polling while playing, with `HH:MM:SS` display strings
//!
//! # Architecture
//!
//! `riff-player` never touches audio itself. The platform engine is provided
//! through the [`SoundEngine`] and [`SoundHandle`] traits; engine callbacks
//! arrive through an [`EngineNotifier`] and are applied on the controller's
//! thread, so the state machine stays single-threaded.
//!
//! - [`PlayerController`] is the synchronous state machine
//! - [`PlayerService`] runs a controller on a tokio task and hands out
//!   cloneable [`PlayerHandle`]s
//! - [`SimulatedEngine`] is a clock-driven engine for tools and tests
//!
//! # Example: Driving the Controller
//!
//! ```rust
//! use riff_player::{PlayerController, PlayerOptions, Playlist, SimulatedEngine, Track, TrackSource};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> riff_player::Result<()> {
//! let playlist = Playlist::new(vec![
//!     Track::new("Intro", TrackSource::url("https://example.com/intro.mp3")),
//!     Track::new("Theme", TrackSource::embedded(7)),
//! ])?;
//!
//! let mut player = PlayerController::new(SimulatedEngine::new(), playlist, PlayerOptions::default())?;
//! assert_eq!(player.current_track_name(), "Intro");
//!
//! player.change_volume(40);
//! player.toggle_shuffle();
//! assert_eq!(player.volume(), 40);
//! assert!(player.is_shuffle());
//! # Ok(())
//! # }
//! ```
//!
//! # Example: Running as a Service
//!
//! ```rust,no_run
//! use riff_player::{PlayerController, PlayerOptions, PlayerService, Playlist, SimulatedEngine, Track, TrackSource};
//!
//! # async fn run() -> riff_player::Result<()> {
//! let playlist = Playlist::new(vec![Track::new("Theme", TrackSource::embedded(7))])?;
//! let controller = PlayerController::new(SimulatedEngine::new(), playlist, PlayerOptions::default())?;
//!
//! let handle = PlayerService::spawn(controller);
//! let mut state = handle.subscribe();
//!
//! handle.next().await?;
//! state.changed().await.ok();
//! println!("{} {}", state.borrow().track_name, state.borrow().current_time_string);
//!
//! handle.shutdown().await?;
//! # Ok(())
//! # }
//! ```

mod controller;
mod engine;
mod error;
mod events;
mod format;
mod poller;
mod service;
mod shuffle;
mod sim;
pub mod types;
mod volume;

// Public exports
pub use controller::PlayerController;
pub use engine::{
    EngineNotification, EngineNotifier, EnginePosition, InstanceId, NotificationKind,
    SoundEngine, SoundHandle,
};
pub use error::{LoadFailure, PlayerError, Result};
pub use events::PlayerEvent;
pub use format::format_time;
pub use poller::PositionPoller;
pub use service::{PlayerCommand, PlayerHandle, PlayerService};
pub use shuffle::{ShufflePool, ShuffleState};
pub use sim::{SimulatedEngine, SimulatedSound};
pub use types::{
    AudioCategory, BasePath, ControlAvailability, NavigationPolicy, PlayerOptions,
    PlayerSnapshot, PlayerStatus, Playlist, ResourceId, Track, TrackSource, MAX_SPEED,
    MAX_VOLUME,
};
pub use volume::Volume;
