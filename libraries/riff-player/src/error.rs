//! Error types for the player

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Player errors
///
/// Transport actions never return these: a violated precondition is a
/// silent no-op, and engine load failures surface as [`LoadFailure`] in the
/// player state instead.
#[derive(Debug, Error)]
pub enum PlayerError {
    /// Playlist has no tracks
    #[error("Playlist is empty")]
    EmptyPlaylist,

    /// Invalid player or application configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// The player service task has stopped
    #[error("Player service is no longer running")]
    ServiceClosed,
}

/// Result type for player operations
pub type Result<T> = std::result::Result<T, PlayerError>;

/// Engine failure while preparing a track
///
/// Kept as the player's last error until the next successful load.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("Failed to load track: {message}")]
pub struct LoadFailure {
    /// Message reported by the engine
    pub message: String,
}

impl LoadFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
