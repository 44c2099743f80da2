use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error("Invalid configuration: {0}")]
    ConfigurationError(String),

    #[error("Color distance out of range: {0}")]
    RangeError(String),

    #[error("Failed to decode frame: {0}")]
    DecodeError(String),

    #[error("Row {row} is ambiguous: expected 1 or 2 troughs but found {troughs}")]
    AmbiguousRow { row: usize, troughs: usize },

    #[error("Failed to write debug image: {0}")]
    SinkError(String),

    #[error("Frame source failed: {0}")]
    SourceError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ProcessorError>;
