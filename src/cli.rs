use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Process every video in a folder (Ctrl-C cancels after the current file)
    Run {
        /// Input folder containing videos (not searched recursively)
        #[arg(short, long)]
        input_dir: PathBuf,

        /// Output folder; one sub-folder is created per video
        #[arg(short, long)]
        output_dir: PathBuf,

        /// frames: 1 image every N seconds; segments: N-second video parts
        #[arg(short, long)]
        mode: Option<String>,

        /// Interval in seconds (fractions allowed)
        #[arg(short = 'n', long)]
        interval: Option<f64>,

        /// Print the final summary as JSON on stdout
        #[arg(long)]
        json: bool,
    },

    /// Show the ffmpeg commands a run would execute, without running them
    Plan {
        /// Input folder containing videos
        #[arg(short, long)]
        input_dir: PathBuf,

        /// Output folder
        #[arg(short, long)]
        output_dir: PathBuf,

        /// frames or segments
        #[arg(short, long)]
        mode: Option<String>,

        /// Interval in seconds
        #[arg(short = 'n', long)]
        interval: Option<f64>,
    },

    /// Check that ffmpeg can be found and report its version
    Check,

    /// Write the default configuration file
    InitConfig {
        /// Destination path
        #[arg(short, long, default_value = "config.toml")]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
