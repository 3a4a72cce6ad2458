//! The batch worker: one pass over a folder of videos.
//!
//! A [`BatchWorker`] is built from the user's inputs, a [`JobRunner`], a
//! [`CancelToken`] and the sending half of an event channel. [`BatchWorker::run`]
//! checks every start-time precondition before touching any file, then
//! processes the discovered videos strictly in order on the calling thread.
//! Per-file failures are recorded and the batch moves on. Cancellation is
//! only observed between files, so the file in progress always finishes.

use chrono::{DateTime, Local};
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::MediaConfig;
use crate::discovery::discover_videos;
use crate::error::{Result, VideoCutterError};
use crate::media::{Interval, Job, JobRunner, MediaCommand, MediaCommandBuilder, Mode, RunResult};

/// Timestamp format used in output folder names
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

const MAX_NAME_SUFFIX: u32 = 1000;

/// Cooperative cancellation flag shared between the front-end and the worker
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation after the current file. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchState {
    Idle,
    Running,
    Completed,
    Cancelled,
    Failed,
}

impl BatchState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, BatchState::Completed | BatchState::Cancelled | BatchState::Failed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Succeeded,
    /// Stream copy failed, the re-encode succeeded
    SucceededWithFallback,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileOutcome {
    pub source: PathBuf,
    pub output_dir: Option<PathBuf>,
    pub status: FileStatus,
    /// Every command line attempted for this file, in order
    pub commands: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub state: BatchState,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Files never started because the batch was cancelled
    pub skipped: usize,
    pub outcomes: Vec<FileOutcome>,
}

impl BatchSummary {
    fn new(total: usize) -> Self {
        Self {
            state: BatchState::Running,
            total,
            succeeded: 0,
            failed: 0,
            skipped: 0,
            outcomes: Vec::with_capacity(total),
        }
    }

    fn record(&mut self, outcome: FileOutcome) {
        match outcome.status {
            FileStatus::Succeeded | FileStatus::SucceededWithFallback => self.succeeded += 1,
            FileStatus::Failed => self.failed += 1,
        }
        self.outcomes.push(outcome);
    }
}

/// Messages from the worker to the front-end, delivered in emission order
#[derive(Debug, Clone)]
pub enum BatchEvent {
    Progress { current: usize, total: usize },
    Log(String),
    Finished(BatchSummary),
}

/// What the user asked for when pressing Start
#[derive(Debug, Clone)]
pub struct BatchRequest {
    pub input_dir: PathBuf,
    pub output_root: PathBuf,
    pub mode: Mode,
    pub interval: f64,
}

pub struct BatchWorker {
    request: BatchRequest,
    builder: MediaCommandBuilder,
    runner: Box<dyn JobRunner>,
    cancel: CancelToken,
    events: UnboundedSender<BatchEvent>,
    state: BatchState,
}

impl BatchWorker {
    pub fn new(
        request: BatchRequest,
        config: &MediaConfig,
        runner: Box<dyn JobRunner>,
        cancel: CancelToken,
        events: UnboundedSender<BatchEvent>,
    ) -> Self {
        Self {
            request,
            builder: MediaCommandBuilder::new(config.clone()),
            runner,
            cancel,
            events,
            state: BatchState::Idle,
        }
    }

    pub fn state(&self) -> BatchState {
        self.state
    }

    /// Run the batch on a dedicated blocking thread.
    ///
    /// The event sender is dropped when the worker finishes, which closes the
    /// channel for the receiver.
    pub fn spawn(mut self) -> JoinHandle<Result<BatchSummary>> {
        tokio::task::spawn_blocking(move || self.run())
    }

    /// Process every discovered video and return the summary.
    ///
    /// Returns `Err` only for start-time precondition failures, in which case
    /// no output folder has been created and no command has been run.
    pub fn run(&mut self) -> Result<BatchSummary> {
        if self.state != BatchState::Idle {
            if self.state.is_terminal() {
                warn!("Ignoring start request: batch already ended as {:?}", self.state);
            } else {
                warn!("Ignoring start request: batch is still running");
            }
            return Err(VideoCutterError::BatchActive);
        }
        self.state = BatchState::Running;

        let (interval, videos) = match self.preflight() {
            Ok(ready) => ready,
            Err(e) => {
                // the caller reports the error itself
                debug!("Batch could not start: {}", e);
                self.state = BatchState::Failed;
                return Err(e);
            }
        };

        let total = videos.len();
        info!(
            "Starting {} batch over {} file(s), interval {}s",
            self.request.mode, total, interval
        );
        let mut summary = BatchSummary::new(total);

        for (index, source) in videos.iter().enumerate() {
            if self.cancel.is_cancelled() {
                summary.skipped = total - index;
                break;
            }

            let outcome = self.process_file(source, interval);
            summary.record(outcome);
            self.emit(BatchEvent::Progress {
                current: index + 1,
                total,
            });
        }

        if summary.skipped > 0 {
            info!("Batch cancelled with {} file(s) not started", summary.skipped);
            self.log(format!(
                "Cancelled by user; {} file(s) not started",
                summary.skipped
            ));
            self.state = BatchState::Cancelled;
        } else {
            info!(
                "Batch completed: {} succeeded, {} failed",
                summary.succeeded, summary.failed
            );
            self.state = BatchState::Completed;
        }

        summary.state = self.state;
        self.emit(BatchEvent::Finished(summary.clone()));
        Ok(summary)
    }

    fn preflight(&self) -> Result<(Interval, Vec<PathBuf>)> {
        let interval = Interval::new(self.request.interval)?;

        let videos = discover_videos(&self.request.input_dir)?;
        if videos.is_empty() {
            return Err(VideoCutterError::InputNotFound(format!(
                "no video files found in {}",
                self.request.input_dir.display()
            )));
        }
        info!("Found {} video file(s) to process", videos.len());

        self.runner.check_availability()?;
        match self.runner.version_info() {
            Ok(version) => info!("Using {}", version),
            Err(e) => debug!("Could not read ffmpeg version: {}", e),
        }

        fs::create_dir_all(&self.request.output_root).map_err(|e| {
            VideoCutterError::OutputUnavailable(format!(
                "cannot create {}: {}",
                self.request.output_root.display(),
                e
            ))
        })?;

        Ok((interval, videos))
    }

    fn process_file(&self, source: &Path, interval: Interval) -> FileOutcome {
        let name = source
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| source.display().to_string());
        self.log(format!("Processing: {}", name));

        let output_dir = match create_output_dir(&self.request.output_root, source, Local::now()) {
            Ok(dir) => dir,
            Err(e) => {
                warn!("Cannot create output folder for {}: {}", name, e);
                self.log(format!("Cannot create output folder for {}: {}", name, e));
                self.log(format!("Skipped (error): {}", name));
                return FileOutcome {
                    source: source.to_path_buf(),
                    output_dir: None,
                    status: FileStatus::Failed,
                    commands: Vec::new(),
                };
            }
        };

        let job = Job::new(
            source.to_path_buf(),
            output_dir.clone(),
            self.request.mode,
            interval,
        );
        let plan = self.builder.plan(&job);
        let mut commands = vec![plan.primary.command_line()];

        let status = if self.attempt(&plan.primary) {
            FileStatus::Succeeded
        } else if let Some(fallback) = &plan.fallback {
            self.log(format!("   (retrying with {})", fallback.description));
            commands.push(fallback.command_line());
            if self.attempt(fallback) {
                FileStatus::SucceededWithFallback
            } else {
                FileStatus::Failed
            }
        } else {
            FileStatus::Failed
        };

        match status {
            FileStatus::Failed => {
                warn!("Failed: {}", name);
                self.log(format!("Skipped (error): {}", name));
            }
            _ => {
                info!("Done: {} -> {}", name, output_dir.display());
                self.log(format!("Done: {} -> {}", name, output_dir.display()));
            }
        }

        FileOutcome {
            source: source.to_path_buf(),
            output_dir: Some(output_dir),
            status,
            commands,
        }
    }

    /// Run one command, log it and its failure output, report success
    fn attempt(&self, command: &MediaCommand) -> bool {
        self.log(format!("   $ {}", command.command_line()));

        match self.runner.run(command) {
            Ok(result) if result.success() => {
                debug!("{} took {:.2?}", command.description, result.duration);
                true
            }
            Ok(result) => {
                warn!("{} failed with {}", command.description, describe_exit(&result));
                self.log(format!(
                    "   ffmpeg error ({}):\n{}",
                    describe_exit(&result),
                    result.output.trim_end()
                ));
                false
            }
            Err(e) => {
                warn!("{}: {}", command.description, e);
                self.log(format!("   Exception: {}", e));
                false
            }
        }
    }

    fn log(&self, text: String) {
        self.emit(BatchEvent::Log(text));
    }

    fn emit(&self, event: BatchEvent) {
        if self.events.send(event).is_err() {
            debug!("Event receiver dropped");
        }
    }
}

fn describe_exit(result: &RunResult) -> String {
    match result.exit_code {
        Some(code) => format!("exit code {}", code),
        None => "terminated by signal".to_string(),
    }
}

/// `<stem>-<YYYYMMDD_HHMMSS>` for a source file processed at `now`
pub fn output_dir_name(source: &Path, now: DateTime<Local>) -> String {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "video".to_string());
    format!("{}-{}", stem, now.format(TIMESTAMP_FORMAT))
}

/// Create a fresh output folder for `source` under `root`.
///
/// When `<stem>-<timestamp>` already exists (same stem within the same
/// second), `-1`, `-2`, ... is appended until an unused name is found.
pub fn create_output_dir(root: &Path, source: &Path, now: DateTime<Local>) -> io::Result<PathBuf> {
    let base = output_dir_name(source, now);

    for suffix in 0..MAX_NAME_SUFFIX {
        let candidate = if suffix == 0 {
            root.join(&base)
        } else {
            root.join(format!("{}-{}", base, suffix))
        };

        match fs::create_dir(&candidate) {
            Ok(()) => return Ok(candidate),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e),
        }
    }

    Err(io::Error::new(
        io::ErrorKind::AlreadyExists,
        format!("no free output folder name for {}", base),
    ))
}
