//! Command-line interface

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

/// Sign recognizer - temporal hand-gesture recognition served over HTTP
#[derive(Parser, Debug)]
#[command(name = "sign-recognizer")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Settings file (defaults to the user config directory)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve word and letter predictions over HTTP
    Serve {
        /// Override the configured port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Run the word recognizer over a recorded landmark stream
    Replay {
        /// JSON-lines frame stream
        #[arg(short, long)]
        input: PathBuf,

        /// Playback rate; frames the recognizer cannot keep up with are dropped (0 = as fast as possible, nothing dropped)
        #[arg(long, default_value = "0")]
        fps: f32,
    },

    /// Cut training samples for one label out of a recorded stream
    Record {
        /// Gesture label (stored upper-case)
        #[arg(short, long, value_parser = parse_label)]
        label: String,

        /// JSON-lines frame stream
        #[arg(short, long)]
        input: PathBuf,

        /// Stop after this many samples (defaults to the configured count)
        #[arg(short, long)]
        samples: Option<usize>,

        /// Delete existing samples for the label first
        #[arg(long)]
        fresh: bool,
    },

    /// Summarize the recorded dataset
    Dataset,

    /// Write the effective settings to a file
    WriteConfig {
        /// Destination (defaults to the user config directory)
        path: Option<PathBuf>,
    },
}

/// Frame spacing for a paced replay; `None` means unpaced
pub fn replay_interval(fps: f32) -> Option<Duration> {
    if fps.is_nan() || fps <= 0.0 {
        return None;
    }
    Duration::try_from_secs_f32(1.0 / fps).ok()
}

fn parse_label(value: &str) -> Result<String, String> {
    let label = value.trim().to_uppercase();
    if label.is_empty() {
        return Err("label must not be empty".to_string());
    }
    Ok(label)
}
