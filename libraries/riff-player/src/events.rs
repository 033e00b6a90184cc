//! Player Events
//!
//! Event-based communication for UI synchronization.
//! Events are queued by the controller at key points:
//! - Status changes (loading, play, pause, stop, error)
//! - Track changes
//! - Position updates (poll ticks and seeks)
//! - Volume, speed and mode changes

use crate::types::PlayerStatus;
use serde::{Deserialize, Serialize};

/// Events emitted by the player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlayerEvent {
    /// Status changed
    StatusChanged {
        /// The new status
        status: PlayerStatus,
    },

    /// A new track became current (emitted when its load starts)
    TrackChanged {
        /// Index in the playlist
        index: usize,
        /// Display name
        name: String,
    },

    /// Position changed
    PositionUpdate {
        /// Current position in seconds
        current_time: f64,
        /// Track duration in seconds (0 while loading)
        duration: f64,
    },

    /// Volume or mute changed
    VolumeChanged {
        /// Stored volume level (0-100)
        level: u8,
        /// Whether audio is muted
        is_muted: bool,
    },

    /// Speed changed
    SpeedChanged { speed: f32 },

    /// Shuffle or loop toggled
    ModesChanged { shuffle: bool, looping: bool },

    /// Engine failed to prepare a track
    LoadFailed {
        /// Index of the failed track
        index: usize,
        /// Engine message
        message: String,
    },
}

impl PlayerEvent {
    /// Whether this is a high-frequency position update
    ///
    /// Useful for consumers that only log discrete changes.
    pub fn is_position_update(&self) -> bool {
        matches!(self, Self::PositionUpdate { .. })
    }
}
