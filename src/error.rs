//! Error types for dadaseq

use std::io;
use thiserror::Error;

/// Result type for dadaseq operations
pub type Result<T> = std::result::Result<T, DadaSeqError>;

/// Errors that can occur while reading a file sequence
#[derive(Debug, Error)]
pub enum DadaSeqError {
    /// Empty or invalid file list, or invalid configuration file
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Header of the first file could not be parsed
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// Seek target outside the logical stream
    #[error("Seek target {target} outside logical stream range [0, {total}]")]
    SeekRange {
        /// Requested logical offset
        target: i128,
        /// Logical size of the stream
        total: u64,
    },

    /// Backward transition requested at the first file
    #[error("Already at the first file of the sequence")]
    Boundary,

    /// Underlying read failed after some bytes were already transferred
    #[error("Read failed after {transferred} bytes: {source}")]
    PartialRead {
        /// Bytes placed into the caller's buffer before the failure
        transferred: usize,
        /// Underlying error
        source: io::Error,
    },

    /// Stream ended before a complete value could be read
    #[error("Stream ended while reading a value: needed {needed} bytes, got {available}")]
    ShortValue {
        /// Size of the requested value in bytes
        needed: usize,
        /// Bytes that were available before the end of the stream
        available: usize,
    },

    /// Reader has not been opened, or was closed
    #[error("Reader is not open")]
    NotOpen,

    /// Reader is in a failed state after an unrecovered error
    #[error("Reader failed; reopen or seek to recover")]
    Failed,
}

impl DadaSeqError {
    /// Whether this error belongs to the I/O category (OS errors and header parsing)
    #[must_use]
    pub fn is_io(&self) -> bool {
        matches!(
            self,
            Self::Io(_) | Self::InvalidHeader(_) | Self::PartialRead { .. }
        )
    }
}

impl From<DadaSeqError> for io::Error {
    fn from(err: DadaSeqError) -> Self {
        match err {
            DadaSeqError::Io(e) | DadaSeqError::PartialRead { source: e, .. } => e,
            DadaSeqError::SeekRange { .. } | DadaSeqError::Boundary => {
                io::Error::new(io::ErrorKind::InvalidInput, err)
            }
            DadaSeqError::ShortValue { .. } => io::Error::new(io::ErrorKind::UnexpectedEof, err),
            DadaSeqError::InvalidHeader(_) => io::Error::new(io::ErrorKind::InvalidData, err),
            DadaSeqError::Configuration(_) | DadaSeqError::NotOpen | DadaSeqError::Failed => {
                io::Error::new(io::ErrorKind::Other, err)
            }
        }
    }
}
