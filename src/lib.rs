//! Video Cutter - batch frame extraction and segmentation
//!
//! Processes every video in a folder with ffmpeg, either sampling one still
//! image every N seconds or splitting each video into N-second parts.

pub mod cli;
pub mod config;
pub mod discovery;
pub mod media;
pub mod batch;
pub mod presenter;
pub mod error;
