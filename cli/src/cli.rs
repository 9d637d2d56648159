//! Command-line interface

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Offline tooling for blink-driven morse input
#[derive(Parser, Debug)]
#[command(name = "blinkmorse")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Feed a recorded trace through a session and print what it decodes
    Replay {
        /// JSON array of frames: `{ "t": 0.0, "ear": 0.3 }` or with `left`/`right` landmarks
        trace: PathBuf,

        /// Session config (JSON); unset fields keep their defaults
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Calibrated profile path prefix (reads `<P>_data.json`, `<P>_model.json`)
        #[arg(short, long)]
        profile: Option<PathBuf>,

        /// Print each event as a JSON line
        #[arg(long)]
        json: bool,
    },

    /// Build a profile from labelled blink recordings
    Calibrate {
        /// JSON array of blink events performed as dots
        #[arg(long)]
        dots: PathBuf,

        /// JSON array of blink events performed as dashes
        #[arg(long)]
        dashes: PathBuf,

        /// Profile path prefix to write
        #[arg(short, long)]
        out: PathBuf,

        /// Dense network trained elsewhere, attached to the profile
        #[arg(long)]
        network: Option<PathBuf>,
    },

    /// Print the morse table
    Chart,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
