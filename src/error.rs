use thiserror::Error;

#[derive(Error, Debug)]
pub enum VideoCutterError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Input folder not usable: {0}")]
    InputNotFound(String),

    #[error("Output folder not usable: {0}")]
    OutputUnavailable(String),

    #[error("ffmpeg not available: {0}")]
    ToolUnavailable(String),

    #[error("Invalid interval: {0}")]
    InvalidInterval(String),

    #[error("Invalid mode '{0}'. Valid modes: frames, segments")]
    InvalidMode(String),

    #[error("Invocation failed: {0}")]
    Invocation(String),

    #[error("A batch run is already active or finished on this worker")]
    BatchActive,

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, VideoCutterError>;
