//! Riff - command-line playlist player

mod commands;
mod config;

use anyhow::Context;
use clap::Parser;
use commands::{parse_line, Command};
use config::{AppConfig, TrackConfig};
use riff_player::{PlayerController, PlayerEvent, PlayerHandle, PlayerService, PlayerSnapshot};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "riff")]
#[command(about = "Riff Player playlist controller", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "riff.toml")]
    config: PathBuf,

    /// Print player events as JSON lines
    #[arg(short, long)]
    events: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "riff=info,riff_player=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let config = AppConfig::load(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    config.validate()?;

    tracing::info!(
        tracks = config.tracks.len(),
        shuffle = config.player.shuffle,
        looping = config.player.looping,
        "Starting Riff Player"
    );

    let controller = PlayerController::new(config.engine()?, config.playlist()?, config.player.clone())?;
    let handle = PlayerService::spawn(controller);

    if cli.events {
        tokio::spawn(print_events(handle.events()));
    }

    run_console(&handle, &config).await?;

    handle.shutdown().await?;
    tracing::info!("Riff Player stopped");

    Ok(())
}

/// Read commands from stdin until `quit` or end of input
async fn run_console(handle: &PlayerHandle, config: &AppConfig) -> anyhow::Result<()> {
    println!("Type `help` for commands.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let command = match parse_line(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(err) => {
                // Help and usage errors alike
                err.print()?;
                continue;
            }
        };

        match command {
            Command::Play => handle.play().await?,
            Command::Pause => handle.pause().await?,
            Command::Stop => handle.stop().await?,
            Command::Next => handle.next().await?,
            Command::Previous => handle.previous().await?,
            Command::Load { number } => handle.load(usize::try_from(number - 1)?).await?,
            Command::Seek { seconds } => handle.seek_to_time(seconds).await?,
            Command::Forward => handle.increase_time().await?,
            Command::Back => handle.decrease_time().await?,
            Command::Speed { value } => handle.set_speed(value).await?,
            Command::Volume { level } => handle.change_volume(level).await?,
            Command::Mute => handle.mute().await?,
            Command::Unmute => handle.unmute().await?,
            Command::Shuffle => handle.toggle_shuffle().await?,
            Command::Loop => handle.toggle_loop().await?,
            Command::Status { json } => {
                let snapshot = handle.snapshot().await?;
                if json {
                    println!("{}", serde_json::to_string_pretty(&snapshot)?);
                } else {
                    println!("{}", status_line(&snapshot));
                }
                continue;
            }
            Command::Tracks => {
                let current = handle.latest().current_index;
                for (index, track) in config.tracks.iter().enumerate() {
                    println!("{}", track_line(index, current, track));
                }
                continue;
            }
            Command::Quit => break,
        }

        println!("{}", status_line(&handle.snapshot().await?));
    }

    Ok(())
}

fn status_line(snapshot: &PlayerSnapshot) -> String {
    let mut line = format!(
        "[{}] {}/{} {}  {} / {}  vol {}{}  {}x",
        snapshot.status,
        snapshot.current_index + 1,
        snapshot.track_count,
        snapshot.track_name,
        snapshot.current_time_string,
        snapshot.duration_string,
        snapshot.volume,
        if snapshot.is_muted { " (muted)" } else { "" },
        snapshot.speed,
    );

    if snapshot.is_shuffle {
        line.push_str("  shuffle");
    }
    if snapshot.is_loop {
        line.push_str("  loop");
    }
    if let Some(message) = &snapshot.error_message {
        line.push_str("  error: ");
        line.push_str(message);
    }

    line
}

/// One `tracks` row, numbered from 1 like the status line and `load`
fn track_line(index: usize, current: usize, track: &TrackConfig) -> String {
    let marker = if index == current { '>' } else { ' ' };
    format!("{marker} {:>3}  {}  ({})", index + 1, track.name, track.source)
}

async fn print_events(mut events: broadcast::Receiver<PlayerEvent>) {
    loop {
        match events.recv().await {
            Ok(event) if event.is_position_update() => {}
            Ok(event) => match serde_json::to_string(&event) {
                Ok(json) => println!("{json}"),
                Err(e) => tracing::warn!("Failed to encode event: {}", e),
            },
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::debug!(skipped, "Event printer lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use riff_player::{ControlAvailability, PlayerStatus};

    fn snapshot() -> PlayerSnapshot {
        PlayerSnapshot {
            status: PlayerStatus::Playing,
            current_index: 1,
            track_count: 4,
            track_name: "Theme".to_string(),
            current_time: 75.0,
            duration: 200.0,
            current_time_string: "00:01:15".to_string(),
            duration_string: "00:03:20".to_string(),
            speed: 1.5,
            volume: 60,
            previous_volume: 60,
            is_muted: false,
            is_shuffle: true,
            is_loop: false,
            remaining_shuffle_indices: vec![0, 3],
            error_message: None,
            controls: ControlAvailability {
                play: false,
                pause: true,
                stop: true,
                next: true,
                previous: true,
            },
        }
    }

    #[test]
    fn status_line_shows_position_and_modes() {
        assert_eq!(
            status_line(&snapshot()),
            "[playing] 2/4 Theme  00:01:15 / 00:03:20  vol 60  1.5x  shuffle"
        );
    }

    #[test]
    fn status_line_shows_mute_and_error() {
        let mut snapshot = snapshot();
        snapshot.status = PlayerStatus::Error;
        snapshot.is_muted = true;
        snapshot.is_shuffle = false;
        snapshot.error_message = Some("stream offline".to_string());

        let line = status_line(&snapshot);
        assert!(line.starts_with("[error] "));
        assert!(line.contains("vol 60 (muted)"));
        assert!(line.ends_with("error: stream offline"));
    }

    #[test]
    fn track_numbers_match_status_line() {
        let track = TrackConfig {
            name: "Theme".to_string(),
            source: riff_player::TrackSource::embedded(7),
            duration_secs: None,
            fail: None,
        };

        // Index 1 is shown as 2/4 in the status line
        let line = track_line(1, 1, &track);
        assert!(line.starts_with(">   2  Theme  ("));
        assert!(status_line(&snapshot()).contains(" 2/4 "));

        assert!(track_line(0, 1, &track).starts_with("    1  Theme"));
    }

    #[test]
    fn cli_defaults() {
        let cli = Cli::try_parse_from(["riff"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("riff.toml"));
        assert!(!cli.events);

        let cli = Cli::try_parse_from(["riff", "-c", "party.toml", "--events"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("party.toml"));
        assert!(cli.events);
    }
}
