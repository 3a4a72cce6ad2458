use std::path::Path;

use crate::config::MediaConfig;
use super::{Job, Mode};

/// Frame file name pattern, six-digit sequence starting at 1
pub const FRAME_PATTERN: &str = "frame_%06d.jpg";
/// Segment file stem pattern, three-digit sequence starting at 0
pub const SEGMENT_STEM_PATTERN: &str = "part_%03d";

const CONTAINER_EXTENSIONS: [&str; 5] = ["mp4", "m4v", "mov", "mkv", "webm"];

/// One external tool invocation, fixed once built
#[derive(Debug, Clone, PartialEq)]
pub struct MediaCommand {
    pub binary_path: String,
    pub args: Vec<String>,
    pub description: String,
}

impl MediaCommand {
    /// Create a new media processing command
    pub fn new<S1: Into<String>, S2: Into<String>>(binary_path: S1, description: S2) -> Self {
        Self {
            binary_path: binary_path.into(),
            args: Vec::new(),
            description: description.into(),
        }
    }

    /// Add an argument
    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add input file
    pub fn input<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg("-i").arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Add output file
    pub fn output<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Force overwrite output
    pub fn overwrite(self) -> Self {
        self.arg("-y")
    }

    /// Quiet banner and set ffmpeg's own log level
    pub fn quiet<S: Into<String>>(self, loglevel: S) -> Self {
        self.arg("-hide_banner").arg("-loglevel").arg(loglevel)
    }

    /// Set video codec
    pub fn video_codec<S: Into<String>>(self, codec: S) -> Self {
        self.arg("-c:v").arg(codec)
    }

    /// Set audio codec
    pub fn audio_codec<S: Into<String>>(self, codec: S) -> Self {
        self.arg("-c:a").arg(codec)
    }

    /// Copy every stream without re-encoding
    pub fn copy_all(self) -> Self {
        self.arg("-c").arg("copy")
    }

    /// Add video filter
    pub fn video_filter<S: Into<String>>(self, filter: S) -> Self {
        self.arg("-vf").arg(filter)
    }

    /// Keep every stream of the first input
    pub fn map_all(self) -> Self {
        self.arg("-map").arg("0")
    }

    /// Use the segment muxer cutting every `seconds`
    pub fn segment<S: Into<String>>(self, seconds: S) -> Self {
        self.arg("-f").arg("segment")
            .arg("-segment_time").arg(seconds)
            .arg("-reset_timestamps").arg("1")
    }

    /// Binary and arguments joined by single spaces, as written to the log
    pub fn command_line(&self) -> String {
        std::iter::once(self.binary_path.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// The invocations for one job: what to try first, and what to try if that fails
#[derive(Debug, Clone)]
pub struct JobPlan {
    pub primary: MediaCommand,
    pub fallback: Option<MediaCommand>,
}

/// Builds ffmpeg invocations for jobs. Pure: no filesystem access, no processes.
pub struct MediaCommandBuilder {
    config: MediaConfig,
}

impl MediaCommandBuilder {
    pub fn new(config: MediaConfig) -> Self {
        Self { config }
    }

    pub fn plan(&self, job: &Job) -> JobPlan {
        match job.mode {
            Mode::Frames => JobPlan {
                primary: self.extract_frames(job),
                fallback: None,
            },
            Mode::Segments => JobPlan {
                primary: self.split_stream_copy(job),
                fallback: Some(self.split_reencode(job)),
            },
        }
    }

    /// One frame every N seconds as sequentially numbered JPEGs
    pub fn extract_frames(&self, job: &Job) -> MediaCommand {
        self.base(format!("Extract frames every {}s", job.interval))
            .input(&job.source)
            .video_filter(format!("fps=1/{}", job.interval))
            .arg("-q:v").arg(self.config.jpeg_quality.to_string())
            .output(job.output_dir.join(FRAME_PATTERN))
    }

    /// N-second parts without re-encoding; cuts land on keyframes
    pub fn split_stream_copy(&self, job: &Job) -> MediaCommand {
        self.base(format!("Split into {}s segments (stream copy)", job.interval))
            .input(&job.source)
            .map_all()
            .copy_all()
            .segment(job.interval.to_string())
            .output(job.output_dir.join(self.segment_pattern(&job.source)))
    }

    /// N-second parts re-encoded with the configured codecs
    pub fn split_reencode(&self, job: &Job) -> MediaCommand {
        self.base(format!(
            "Split into {}s segments ({}/{} re-encode)",
            job.interval, self.config.video_codec, self.config.audio_codec
        ))
        .input(&job.source)
        .map_all()
        .video_codec(&self.config.video_codec)
        .audio_codec(&self.config.audio_codec)
        .segment(job.interval.to_string())
        .output(job.output_dir.join(self.segment_pattern(&job.source)))
    }

    /// Build version check command
    pub fn version_check(&self) -> MediaCommand {
        MediaCommand::new(&self.config.binary_path, "Version check").arg("-version")
    }

    fn base(&self, description: String) -> MediaCommand {
        MediaCommand::new(&self.config.binary_path, description)
            .quiet(&self.config.loglevel)
            .overwrite()
    }

    fn segment_pattern(&self, source: &Path) -> String {
        let ext = if self.config.keep_source_container {
            source
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e.to_lowercase())
                .filter(|e| CONTAINER_EXTENSIONS.contains(&e.as_str()))
                .unwrap_or_else(|| "mp4".to_string())
        } else {
            "mp4".to_string()
        };
        format!("{}.{}", SEGMENT_STEM_PATTERN, ext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::Interval;
    use std::path::PathBuf;

    fn job(mode: Mode, secs: f64, source: &str) -> Job {
        Job::new(
            PathBuf::from(source),
            PathBuf::from("/out/clip-20240102_030405"),
            mode,
            Interval::new(secs).unwrap(),
        )
    }

    fn builder() -> MediaCommandBuilder {
        MediaCommandBuilder::new(MediaConfig::default())
    }

    fn value_after<'a>(cmd: &'a MediaCommand, flag: &str) -> Option<&'a str> {
        cmd.args
            .iter()
            .position(|a| a == flag)
            .and_then(|i| cmd.args.get(i + 1))
            .map(String::as_str)
    }

    #[test]
    fn test_frames_command_line() {
        let plan = builder().plan(&job(Mode::Frames, 5.0, "/in/clip.mp4"));
        assert!(plan.fallback.is_none());
        assert_eq!(
            plan.primary.command_line(),
            "ffmpeg -hide_banner -loglevel error -y -i /in/clip.mp4 -vf fps=1/5 -q:v 2 \
             /out/clip-20240102_030405/frame_%06d.jpg"
        );
    }

    #[test]
    fn test_frames_rate_matches_interval() {
        for secs in [1.0, 5.0, 2.5, 0.5, 3600.0] {
            let plan = builder().plan(&job(Mode::Frames, secs, "/in/a.mov"));
            assert_eq!(
                value_after(&plan.primary, "-vf"),
                Some(format!("fps=1/{}", secs).as_str())
            );
            assert!(plan.primary.args.last().unwrap().ends_with("frame_%06d.jpg"));
        }
    }

    #[test]
    fn test_segments_primary_and_fallback() {
        let plan = builder().plan(&job(Mode::Segments, 10.0, "/in/clip.mkv"));
        let fallback = plan.fallback.expect("segments always carry a fallback");

        assert_eq!(
            plan.primary.command_line(),
            "ffmpeg -hide_banner -loglevel error -y -i /in/clip.mkv -map 0 -c copy -f segment \
             -segment_time 10 -reset_timestamps 1 /out/clip-20240102_030405/part_%03d.mp4"
        );
        assert_eq!(
            fallback.command_line(),
            "ffmpeg -hide_banner -loglevel error -y -i /in/clip.mkv -map 0 -c:v libx264 -c:a aac \
             -f segment -segment_time 10 -reset_timestamps 1 /out/clip-20240102_030405/part_%03d.mp4"
        );
    }

    #[test]
    fn test_segments_share_duration_and_pattern() {
        for secs in [1.0, 7.5, 600.0] {
            let plan = builder().plan(&job(Mode::Segments, secs, "/in/x.avi"));
            let fallback = plan.fallback.unwrap();
            assert_eq!(
                value_after(&plan.primary, "-segment_time"),
                value_after(&fallback, "-segment_time")
            );
            assert_eq!(plan.primary.args.last(), fallback.args.last());
            assert!(fallback.args.last().unwrap().ends_with("part_%03d.mp4"));
            assert_eq!(value_after(&plan.primary, "-c"), Some("copy"));
            assert_eq!(value_after(&fallback, "-c:v"), Some("libx264"));
            assert_eq!(value_after(&fallback, "-c:a"), Some("aac"));
        }
    }

    #[test]
    fn test_keep_source_container() {
        let builder = MediaCommandBuilder::new(MediaConfig {
            keep_source_container: true,
            ..MediaConfig::default()
        });

        let mkv = builder.plan(&job(Mode::Segments, 10.0, "/in/clip.MKV"));
        assert!(mkv.primary.args.last().unwrap().ends_with("part_%03d.mkv"));

        let avi = builder.plan(&job(Mode::Segments, 10.0, "/in/clip.avi"));
        assert!(avi.primary.args.last().unwrap().ends_with("part_%03d.mp4"));
    }

    #[test]
    fn test_custom_binary_and_quality() {
        let builder = MediaCommandBuilder::new(MediaConfig {
            binary_path: "/usr/local/bin/ffmpeg".to_string(),
            jpeg_quality: 5,
            ..MediaConfig::default()
        });
        let plan = builder.plan(&job(Mode::Frames, 5.0, "/in/clip.mp4"));
        assert!(plan.primary.command_line().starts_with("/usr/local/bin/ffmpeg "));
        assert_eq!(value_after(&plan.primary, "-q:v"), Some("5"));
        assert_eq!(builder.version_check().command_line(), "/usr/local/bin/ffmpeg -version");
    }
}
