//! Error types for fingerprint operations.

use thiserror::Error;

/// The main error type for fingerprint operations.
#[derive(Error, Debug)]
pub enum PhashError {
    /// Two fingerprints produced by different algorithms were compared.
    #[error("Can't compare fingerprints created by different algorithms: {left} != {right}")]
    IncompatibleAlgorithm {
        /// Algorithm id of the left operand.
        left: i32,
        /// Algorithm id of the right operand.
        right: i32,
    },

    /// Bit position outside of the fingerprint length.
    #[error("Bit out of bounds: {position} >= {length}")]
    OutOfRange {
        /// The requested bit position.
        position: u64,
        /// The fingerprint length in bits.
        length: u32,
    },

    /// An argument outside of its valid domain.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored record could not be decoded.
    #[error("Corrupt data: {0}")]
    CorruptData(String),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Image encoding error.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for fingerprint operations.
pub type Result<T> = std::result::Result<T, PhashError>;

impl From<bincode::Error> for PhashError {
    fn from(err: bincode::Error) -> Self {
        match *err {
            bincode::ErrorKind::Io(io) if io.kind() != std::io::ErrorKind::UnexpectedEof => {
                PhashError::Io(io)
            }
            other => PhashError::CorruptData(other.to_string()),
        }
    }
}
