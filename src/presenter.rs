use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::debug;

use crate::batch::{BatchEvent, BatchState, BatchSummary, FileStatus};

/// Terminal rendering of a running batch
pub struct Presenter {
    bar: ProgressBar,
    quiet_log: bool,
}

impl Presenter {
    /// `quiet_log` suppresses the per-file log lines, e.g. when stdout carries JSON
    pub fn new(quiet_log: bool) -> Self {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        Self { bar, quiet_log }
    }

    /// Render events until the worker closes the channel.
    ///
    /// Returns the summary if the batch got far enough to emit one.
    pub async fn consume(&self, mut events: UnboundedReceiver<BatchEvent>) -> Option<BatchSummary> {
        let mut summary = None;

        while let Some(event) = events.recv().await {
            match event {
                BatchEvent::Progress { current, total } => {
                    self.bar.set_length(total as u64);
                    self.bar.set_position(current as u64);
                }
                BatchEvent::Log(text) => {
                    debug!("{}", text);
                    if !self.quiet_log {
                        self.bar.println(text);
                    }
                }
                BatchEvent::Finished(s) => {
                    self.bar.finish_with_message(finish_message(&s));
                    summary = Some(s);
                }
            }
        }

        if summary.is_none() {
            self.bar.finish_and_clear();
        }
        summary
    }

    pub fn note_cancel_requested(&self) {
        self.bar
            .println("Cancellation requested; finishing the current file...");
    }
}

fn finish_message(summary: &BatchSummary) -> &'static str {
    match summary.state {
        BatchState::Completed if summary.failed == 0 => "all tasks finished",
        BatchState::Cancelled => "cancelled",
        _ => "finished with issues",
    }
}

/// Human-readable closing report
pub fn render_summary(summary: &BatchSummary) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "\nBatch {:?}: {} of {} succeeded, {} failed, {} not started\n",
        summary.state, summary.succeeded, summary.total, summary.failed, summary.skipped
    ));

    for outcome in &summary.outcomes {
        let name = outcome
            .source
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let status = match outcome.status {
            FileStatus::Succeeded => "ok",
            FileStatus::SucceededWithFallback => "ok (re-encoded)",
            FileStatus::Failed => "FAILED",
        };
        let target = outcome
            .output_dir
            .as_ref()
            .map(|d| d.display().to_string())
            .unwrap_or_else(|| "-".to_string());
        out.push_str(&format!("  {:<16} {:<40} {}\n", status, name, target));
    }

    out
}
