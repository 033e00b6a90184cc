//! Interactive commands read from stdin

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(no_binary_name = true, name = "riff", disable_version_flag = true)]
struct Line {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, PartialEq, Subcommand)]
pub enum Command {
    /// Start or resume playback
    Play,
    /// Pause playback
    Pause,
    /// Stop and rewind
    Stop,
    /// Skip to the next track
    #[command(alias = "n")]
    Next,
    /// Go to the previous track
    #[command(alias = "p", alias = "prev")]
    Previous,
    /// Select a track by number (as shown by `tracks`, starting at 1)
    Load {
        #[arg(value_parser = clap::value_parser!(u64).range(1..))]
        number: u64,
    },
    /// Seek to a position in seconds
    Seek { seconds: f64 },
    /// Skip forward by the time rate
    #[command(alias = "ff")]
    Forward,
    /// Skip back by the time rate
    #[command(alias = "rew")]
    Back,
    /// Set playback speed (0-2]
    Speed { value: f32 },
    /// Set volume (0-100)
    #[command(alias = "vol")]
    Volume {
        #[arg(value_parser = clap::value_parser!(u8).range(0..=100))]
        level: u8,
    },
    /// Mute audio
    Mute,
    /// Restore the volume from before mute
    Unmute,
    /// Toggle shuffle
    Shuffle,
    /// Toggle loop of the current track
    Loop,
    /// Show player state
    #[command(alias = "s")]
    Status {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the playlist
    Tracks,
    /// Release the player and exit
    #[command(alias = "exit", alias = "q")]
    Quit,
}

/// Parse one input line
///
/// Blank lines parse to `None`. `help` and usage errors come back as
/// `clap::Error`, ready to print.
pub fn parse_line(line: &str) -> Result<Option<Command>, clap::Error> {
    let words: Vec<&str> = line.split_whitespace().collect();
    if words.is_empty() {
        return Ok(None);
    }

    Line::try_parse_from(words).map(|line| Some(line.command))
}
