//! Playlist and player configuration

use riff_player::{PlayerError, PlayerOptions, Playlist, Result, SimulatedEngine, Track, TrackSource};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub player: PlayerOptions,

    #[serde(default = "default_simulation")]
    pub simulation: SimulationSettings,

    #[serde(default)]
    pub tracks: Vec<TrackConfig>,
}

/// Behavior of the simulated engine
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SimulationSettings {
    #[serde(default = "default_load_delay_ms")]
    pub load_delay_ms: u64,

    /// Length of tracks without `duration_secs`
    #[serde(default = "default_duration_secs")]
    pub default_duration_secs: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TrackConfig {
    pub name: String,

    pub source: TrackSource,

    #[serde(default)]
    pub duration_secs: Option<f64>,

    /// Simulate a load failure with this message
    #[serde(default)]
    pub fail: Option<String>,
}

impl AppConfig {
    /// Load configuration from `path` and the environment
    ///
    /// Variables look like `RIFF_PLAYER__TIME_RATE_SECS=30`.
    pub fn load(path: &Path) -> Result<Self> {
        Self::load_with_env(
            path,
            config::Environment::with_prefix("RIFF")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
    }

    fn load_with_env(path: &Path, env: config::Environment) -> Result<Self> {
        if !path.exists() {
            return Err(PlayerError::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }

        let settings = config::Config::builder()
            .add_source(config::File::from(path))
            .add_source(env)
            .build()
            .map_err(|e| PlayerError::Config(e.to_string()))?;

        settings
            .try_deserialize()
            .map_err(|e| PlayerError::Config(e.to_string()))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.tracks.is_empty() {
            return Err(PlayerError::EmptyPlaylist);
        }

        self.player.validate()?;

        for (index, track) in self.tracks.iter().enumerate() {
            if track.name.trim().is_empty() {
                return Err(PlayerError::Config(format!("Track {index} has no name")));
            }

            if let Some(duration) = track.duration_secs {
                if !(duration.is_finite() && duration > 0.0) {
                    return Err(PlayerError::Config(format!(
                        "Track '{}' has invalid duration {duration}",
                        track.name
                    )));
                }
            }
        }

        if !(self.simulation.default_duration_secs.is_finite()
            && self.simulation.default_duration_secs > 0.0)
        {
            return Err(PlayerError::Config(
                "simulation.default_duration_secs must be positive".to_string(),
            ));
        }

        Ok(())
    }

    pub fn playlist(&self) -> Result<Playlist> {
        let tracks = self
            .tracks
            .iter()
            .map(|track| Track::new(track.name.clone(), track.source.clone()))
            .collect();

        Playlist::new(tracks)
    }

    /// Simulated engine with every configured track registered
    pub fn engine(&self) -> Result<SimulatedEngine> {
        let mut engine = SimulatedEngine::new()
            .with_load_delay(Duration::from_millis(self.simulation.load_delay_ms))
            .with_default_duration(self.simulation.default_duration_secs)?;

        for track in &self.tracks {
            match (&track.fail, track.duration_secs) {
                (Some(message), _) => engine.insert_broken(track.source.clone(), message.clone()),
                (None, Some(duration)) => engine.insert_track(track.source.clone(), duration)?,
                (None, None) => {}
            }
        }

        Ok(engine)
    }
}

// Default values
fn default_simulation() -> SimulationSettings {
    SimulationSettings {
        load_delay_ms: default_load_delay_ms(),
        default_duration_secs: default_duration_secs(),
    }
}

fn default_load_delay_ms() -> u64 {
    150
}

fn default_duration_secs() -> f64 {
    180.0
}
