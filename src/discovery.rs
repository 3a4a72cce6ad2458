//! Finding the videos a batch will process.
//!
//! Only the top level of the input folder is scanned. Matching is by
//! extension, case-insensitive, and the result is sorted by path so a batch
//! always processes files in the same order.

use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{Result, VideoCutterError};

/// Extensions treated as videos
pub const VIDEO_EXTENSIONS: [&str; 6] = ["mp4", "mov", "m4v", "mkv", "avi", "webm"];

/// Whether `path` carries one of [`VIDEO_EXTENSIONS`]
pub fn is_video_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| VIDEO_EXTENSIONS.iter().any(|v| ext.eq_ignore_ascii_case(v)))
        .unwrap_or(false)
}

/// List the video files directly inside `input_dir`, sorted by path.
///
/// Fails with [`VideoCutterError::InputNotFound`] when the folder is missing,
/// not a folder, or unreadable. An empty result is returned as `Ok`.
pub fn discover_videos(input_dir: &Path) -> Result<Vec<PathBuf>> {
    if !input_dir.is_dir() {
        return Err(VideoCutterError::InputNotFound(format!(
            "{} does not exist or is not a folder",
            input_dir.display()
        )));
    }

    let mut videos = Vec::new();
    for entry in WalkDir::new(input_dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| {
            VideoCutterError::InputNotFound(format!("cannot read {}: {}", input_dir.display(), e))
        })?;

        if entry.path().is_file() && is_video_file(entry.path()) {
            videos.push(entry.into_path());
        } else {
            debug!("Ignoring {}", entry.path().display());
        }
    }

    videos.sort();
    Ok(videos)
}
