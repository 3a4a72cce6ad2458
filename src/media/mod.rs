// Media job plumbing around the external ffmpeg binary
//
// - Commands: job description and ffmpeg argument builders
// - Runner: synchronous execution of built commands

pub mod commands;
pub mod runner;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub use commands::*;
pub use runner::*;

use crate::config::MediaConfig;
use crate::error::{Result, VideoCutterError};

/// What each batch does with every video
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Frames: one JPEG every N seconds
    Frames,
    /// Segments: N-second parts, stream copy first, re-encode on failure
    Segments,
}

impl FromStr for Mode {
    type Err = VideoCutterError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "frames" | "images" => Ok(Mode::Frames),
            "segments" | "video" => Ok(Mode::Segments),
            _ => Err(VideoCutterError::InvalidMode(s.to_string())),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Frames => write!(f, "frames"),
            Mode::Segments => write!(f, "segments"),
        }
    }
}

/// Strictly positive, finite number of seconds.
///
/// Displays in its shortest decimal form (`5`, `2.5`), which is the text
/// ffmpeg receives in `fps=1/N` and `-segment_time N`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval(f64);

impl Interval {
    pub fn new(seconds: f64) -> Result<Self> {
        if !seconds.is_finite() || seconds <= 0.0 {
            return Err(VideoCutterError::InvalidInterval(format!(
                "{} (must be a positive number of seconds)",
                seconds
            )));
        }
        Ok(Self(seconds))
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One unit of work: a single source video and where its output goes
#[derive(Debug, Clone)]
pub struct Job {
    pub source: PathBuf,
    pub output_dir: PathBuf,
    pub mode: Mode,
    pub interval: Interval,
}

impl Job {
    pub fn new(source: PathBuf, output_dir: PathBuf, mode: Mode, interval: Interval) -> Self {
        Self {
            source,
            output_dir,
            mode,
            interval,
        }
    }
}

/// Outcome of one finished external process
#[derive(Debug, Clone)]
pub struct RunResult {
    /// `None` when the process was terminated by a signal
    pub exit_code: Option<i32>,
    /// Combined stdout and stderr
    pub output: String,
    pub duration: Duration,
}

impl RunResult {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Executes built commands on the calling thread
pub trait JobRunner: Send + Sync {
    /// Verify the external tool can be started
    fn check_availability(&self) -> Result<()>;

    /// First line of the tool's version banner
    fn version_info(&self) -> Result<String>;

    /// Run one command to completion and capture its output
    fn run(&self, command: &MediaCommand) -> Result<RunResult>;
}

/// Factory for creating job runner instances
pub struct JobRunnerFactory;

impl JobRunnerFactory {
    /// Create the default runner implementation (ffmpeg subprocess)
    pub fn create_runner(config: &MediaConfig) -> Box<dyn JobRunner> {
        Box::new(runner::FfmpegRunner::new(config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_rejects_non_positive() {
        for bad in [0.0, -1.0, -0.5, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                Interval::new(bad),
                Err(VideoCutterError::InvalidInterval(_))
            ));
        }
    }

    #[test]
    fn test_interval_display() {
        assert_eq!(Interval::new(5.0).unwrap().to_string(), "5");
        assert_eq!(Interval::new(2.5).unwrap().to_string(), "2.5");
        assert_eq!(Interval::new(0.25).unwrap().to_string(), "0.25");
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!("frames".parse::<Mode>().unwrap(), Mode::Frames);
        assert_eq!("Images".parse::<Mode>().unwrap(), Mode::Frames);
        assert_eq!(" SEGMENTS ".parse::<Mode>().unwrap(), Mode::Segments);
        assert_eq!("video".parse::<Mode>().unwrap(), Mode::Segments);
        assert!(matches!(
            "gif".parse::<Mode>(),
            Err(VideoCutterError::InvalidMode(_))
        ));
    }
}
