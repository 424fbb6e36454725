use thiserror::Error;

/// Crate-wide error type
#[derive(Error, Debug)]
pub enum RecError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No encoder found for MIME type {0}")]
    CodecNotFound(String),

    #[error("Frame size mismatch: expected {expected} bytes, got {actual}")]
    FrameSize { expected: usize, actual: usize },

    #[error("Encode error: {0}")]
    Encode(String),

    #[error("Muxer callback error: {0}")]
    Muxer(String),

    #[error("Invalid session state: {0}")]
    InvalidState(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RecError>;
