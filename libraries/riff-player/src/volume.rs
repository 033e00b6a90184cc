//! Volume and mute state
//!
//! Volume is an integer percent (0-100) mapped linearly onto the engine's
//! 0.0-1.0 range. Muting forces the engine to silence without touching the
//! stored level, and remembers the level it muted from.

use crate::types::MAX_VOLUME;

/// Volume controller
#[derive(Debug, Clone)]
pub struct Volume {
    /// Volume level (0-100)
    level: u8,

    /// Mute state (preserves volume level)
    muted: bool,

    /// Level snapshotted by the last mute
    previous_level: u8,
}

impl Volume {
    /// Create new volume controller
    ///
    /// Levels above 100 are clamped.
    pub fn new(level: u8) -> Self {
        let level = level.min(MAX_VOLUME);

        Self {
            level,
            muted: false,
            previous_level: level,
        }
    }

    /// Set volume level (0-100)
    ///
    /// Returns false (and changes nothing) for levels above 100. Any level
    /// above zero also clears mute.
    pub fn set_level(&mut self, level: u8) -> bool {
        if level > MAX_VOLUME {
            return false;
        }

        self.level = level;
        if level > 0 {
            self.muted = false;
        }
        true
    }

    /// Get current volume level (0-100)
    pub fn level(&self) -> u8 {
        self.level
    }

    /// Level that unmute restores
    pub fn previous_level(&self) -> u8 {
        self.previous_level
    }

    /// Mute audio, remembering the current level
    ///
    /// Returns false if already muted.
    pub fn mute(&mut self) -> bool {
        if self.muted {
            return false;
        }

        self.previous_level = self.level;
        self.muted = true;
        true
    }

    /// Unmute audio, restoring the level from before the mute
    ///
    /// Returns false if not muted.
    pub fn unmute(&mut self) -> bool {
        if !self.muted {
            return false;
        }

        self.level = self.previous_level;
        self.muted = false;
        true
    }

    /// Toggle mute state
    pub fn toggle_mute(&mut self) {
        if self.muted {
            self.unmute();
        } else {
            self.mute();
        }
    }

    /// Check if muted
    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Engine volume (0.0-1.0)
    ///
    /// Returns 0.0 if muted, otherwise the level as a fraction
    pub fn gain(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            f32::from(self.level) / f32::from(MAX_VOLUME)
        }
    }
}

impl Default for Volume {
    fn default() -> Self {
        Self::new(MAX_VOLUME)
    }
}
