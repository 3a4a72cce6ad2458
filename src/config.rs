use serde::{Deserialize, Serialize};
use std::path::Path;
use crate::error::{Result, VideoCutterError};
use crate::media::Mode;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub media: MediaConfig,
    #[serde(default)]
    pub batch: BatchConfig,
}

/// Missing keys fall back to `MediaConfig::default()`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    /// Path to ffmpeg binary
    pub binary_path: String,
    /// Value passed to ffmpeg's `-loglevel`
    pub loglevel: String,
    /// JPEG quality for extracted frames (`-q:v`, 2-31, lower = better)
    pub jpeg_quality: u8,
    /// Video encoder used when stream copy segmentation fails
    pub video_codec: String,
    /// Audio encoder used when stream copy segmentation fails
    pub audio_codec: String,
    /// Write segments in the source container (mp4/m4v/mov/mkv/webm) instead of always mp4
    pub keep_source_container: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Mode used when none is given on the command line
    pub mode: Mode,
    /// Interval in seconds used when none is given on the command line
    pub interval: f64,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            binary_path: "ffmpeg".to_string(),
            loglevel: "error".to_string(),
            jpeg_quality: 2,
            video_codec: "libx264".to_string(),
            audio_codec: "aac".to_string(),
            keep_source_container: false,
        }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Frames,
            interval: 5.0,
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| VideoCutterError::Config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| VideoCutterError::Config(format!("Failed to parse config file: {}", e)))
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| VideoCutterError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| VideoCutterError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [media]
            binary_path = "/opt/ffmpeg/bin/ffmpeg"
            video_codec = "libx265"
            audio_codec = "aac"
            "#,
        )
        .unwrap();

        assert_eq!(config.media.binary_path, "/opt/ffmpeg/bin/ffmpeg");
        assert_eq!(config.media.video_codec, "libx265");
        assert_eq!(config.media.jpeg_quality, 2);
        assert_eq!(config.media.loglevel, "error");
        assert!(!config.media.keep_source_container);
        assert_eq!(config.batch.mode, Mode::Frames);
        assert_eq!(config.batch.interval, 5.0);
    }

    #[test]
    fn test_single_key_media_section() {
        let config: Config = toml::from_str("[media]\nloglevel = \"info\"").unwrap();

        assert_eq!(config.media.loglevel, "info");
        assert_eq!(config.media.binary_path, "ffmpeg");
        assert_eq!(config.media.video_codec, "libx264");
        assert_eq!(config.media.audio_codec, "aac");
        assert_eq!(config.batch.mode, Mode::Frames);
    }

    #[test]
    fn test_single_key_batch_section() {
        let config: Config = toml::from_str("[batch]\ninterval = 10").unwrap();

        assert_eq!(config.batch.interval, 10.0);
        assert_eq!(config.batch.mode, Mode::Frames);
        assert_eq!(config.media.binary_path, "ffmpeg");

        let config: Config = toml::from_str("[batch]\nmode = \"segments\"").unwrap();
        assert_eq!(config.batch.mode, Mode::Segments);
        assert_eq!(config.batch.interval, 5.0);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.batch.mode = Mode::Segments;
        config.batch.interval = 2.5;
        config.save_to_file(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.batch.mode, Mode::Segments);
        assert_eq!(loaded.batch.interval, 2.5);
        assert_eq!(loaded.media.binary_path, "ffmpeg");
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::from_file(dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, VideoCutterError::Config(_)));
    }
}
