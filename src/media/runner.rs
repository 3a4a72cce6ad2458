use std::process::{Command, Stdio};
use std::time::Instant;
use tracing::{debug, info};

use crate::config::MediaConfig;
use crate::error::{Result, VideoCutterError};
use super::{JobRunner, MediaCommand, MediaCommandBuilder, RunResult};

/// Runs commands as blocking ffmpeg subprocesses
pub struct FfmpegRunner {
    binary_path: String,
    version_check: MediaCommand,
}

impl FfmpegRunner {
    pub fn new(config: &MediaConfig) -> Self {
        Self {
            binary_path: config.binary_path.clone(),
            version_check: MediaCommandBuilder::new(config.clone()).version_check(),
        }
    }

    fn version_output(&self) -> Result<std::process::Output> {
        process(&self.version_check).output().map_err(|e| {
            VideoCutterError::ToolUnavailable(format!(
                "'{}' could not be started ({}). Please install ffmpeg and ensure it is in PATH",
                self.binary_path, e
            ))
        })
    }
}

/// Child process for a built command.
///
/// stdin is closed so an unexpected overwrite prompt fails instead of hanging.
/// On unix the child leads its own process group, so a terminal Ctrl-C only
/// reaches this program and the running file can finish.
fn process(command: &MediaCommand) -> Command {
    let mut process = Command::new(&command.binary_path);
    process.args(&command.args).stdin(Stdio::null());
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        process.process_group(0);
    }
    process
}

impl JobRunner for FfmpegRunner {
    fn check_availability(&self) -> Result<()> {
        let output = self.version_output()?;

        if output.status.success() {
            info!("ffmpeg is available at {}", self.binary_path);
            Ok(())
        } else {
            Err(VideoCutterError::ToolUnavailable(format!(
                "'{} -version' exited with {}",
                self.binary_path, output.status
            )))
        }
    }

    fn version_info(&self) -> Result<String> {
        let output = self.version_output()?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout.lines().next().unwrap_or("Unknown version").to_string())
    }

    fn run(&self, command: &MediaCommand) -> Result<RunResult> {
        debug!("Executing: {}", command.command_line());
        debug!("Description: {}", command.description);

        let started = Instant::now();
        let output = process(command).output().map_err(|e| {
            VideoCutterError::Invocation(format!(
                "failed to start {}: {}",
                command.binary_path, e
            ))
        })?;
        let duration = started.elapsed();

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));

        debug!(
            "{} finished with {} in {:.2?}",
            command.description, output.status, duration
        );

        Ok(RunResult {
            exit_code: output.status.code(),
            output: text,
            duration,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runner(binary_path: &str) -> FfmpegRunner {
        FfmpegRunner::new(&MediaConfig {
            binary_path: binary_path.to_string(),
            ..MediaConfig::default()
        })
    }

    #[test]
    fn test_missing_binary_is_tool_unavailable() {
        let runner = runner("/nonexistent/bin/ffmpeg-missing");
        assert!(matches!(
            runner.check_availability(),
            Err(VideoCutterError::ToolUnavailable(_))
        ));
    }

    #[test]
    fn test_missing_binary_run_is_invocation_error() {
        let runner = runner("/nonexistent/bin/ffmpeg-missing");
        let cmd = MediaCommand::new("/nonexistent/bin/ffmpeg-missing", "probe").arg("-version");
        assert!(matches!(
            runner.run(&cmd),
            Err(VideoCutterError::Invocation(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_exit_codes_and_captured_output() {
        let runner = runner("sh");

        let ok = runner
            .run(&MediaCommand::new("sh", "ok").arg("-c").arg("echo out; echo err >&2"))
            .unwrap();
        assert!(ok.success());
        assert!(ok.output.contains("out"));
        assert!(ok.output.contains("err"));

        let failed = runner
            .run(&MediaCommand::new("sh", "fail").arg("-c").arg("echo broken >&2; exit 3"))
            .unwrap();
        assert!(!failed.success());
        assert_eq!(failed.exit_code, Some(3));
        assert!(failed.output.contains("broken"));
    }

    #[test]
    fn test_version_check_uses_configured_binary() {
        let runner = runner("/opt/ffmpeg/bin/ffmpeg");
        assert_eq!(
            runner.version_check.command_line(),
            "/opt/ffmpeg/bin/ffmpeg -version"
        );
    }

    /// Process group id (field 5) from the contents of a /proc/<pid>/stat file
    #[cfg(target_os = "linux")]
    fn pgid_from_stat(stat: &str) -> i64 {
        let after_name = &stat[stat.rfind(')').unwrap() + 1..];
        after_name.split_whitespace().nth(2).unwrap().parse().unwrap()
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_child_runs_in_its_own_process_group() {
        let own_pgid = pgid_from_stat(&std::fs::read_to_string("/proc/self/stat").unwrap());

        let runner = runner("sh");
        let result = runner
            .run(&MediaCommand::new("sh", "stat").arg("-c").arg("cat /proc/$$/stat"))
            .unwrap();
        assert!(result.success());
        let child_pgid = pgid_from_stat(&result.output);

        assert_ne!(child_pgid, own_pgid);
    }
}
