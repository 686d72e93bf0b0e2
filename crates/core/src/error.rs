//! Error types for battle recording
//!
//! This module defines all error types used throughout the record subsystem.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! Every failure is classified by [`ErrorKind`] so that the record manager can
//! decide between "abandon the spool" (ordering), "reset and continue" (I/O,
//! decode) and "reject the file" (incompatible legacy format).

use std::io;
use thiserror::Error;

/// Result type alias for record operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the battle record subsystem
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error (spool file, record file, archive stream)
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// A turn was appended or replayed out of sequence
    #[error("Turn ordering violated in round {round}: expected turn {expected}, got {found}")]
    OrderingViolation {
        /// Round the turn belongs to
        round: u32,
        /// Next turn index the store expected
        expected: u32,
        /// Turn index that was supplied or read
        found: u32,
    },

    /// Data corruption detected (CRC mismatch, truncated frame, dangling reference)
    #[error("Data corruption: {0}")]
    Corruption(String),

    /// Recording state can no longer be trusted
    #[error("Unrecoverable record state: {0}")]
    Unrecoverable(String),

    /// Record was written by an older, unsupported layout
    #[error("Incompatible record format: {0}")]
    FormatIncompatible(String),

    /// Record is not in the expected format at all
    #[error("Invalid record format: {0}")]
    InvalidFormat(String),

    /// Archive container error
    #[error("Archive error: {0}")]
    ArchiveError(String),

    /// Compression/decompression failed
    #[error("Compression error: {0}")]
    CompressionError(String),

    /// XML encoding or parsing failed
    #[error("XML error: {0}")]
    XmlError(String),

    /// CSV encoding failed
    #[error("CSV error: {0}")]
    CsvError(String),

    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Caller supplied an invalid argument
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Operation is not valid in the current state
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

/// Coarse classification of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Turn sequence is broken; the spool must be discarded
    Ordering,
    /// Underlying I/O failed
    Io,
    /// Known but unsupported legacy layout
    Incompatible,
    /// Malformed, truncated or corrupt data
    Decode,
    /// Anything else (bad input, invalid state, config)
    Other,
}

impl Error {
    /// Create a serialization error
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::SerializationError(msg.into())
    }

    /// Create a corruption error
    pub fn corruption(msg: impl Into<String>) -> Self {
        Self::Corruption(msg.into())
    }

    /// Create an unrecoverable-state error
    pub fn unrecoverable(msg: impl Into<String>) -> Self {
        Self::Unrecoverable(msg.into())
    }

    /// Create an incompatible-format error
    pub fn incompatible(msg: impl Into<String>) -> Self {
        Self::FormatIncompatible(msg.into())
    }

    /// Create an invalid-format error
    pub fn invalid_format(msg: impl Into<String>) -> Self {
        Self::InvalidFormat(msg.into())
    }

    /// Create an archive error
    pub fn archive(msg: impl Into<String>) -> Self {
        Self::ArchiveError(msg.into())
    }

    /// Create a compression error
    pub fn compression(msg: impl Into<String>) -> Self {
        Self::CompressionError(msg.into())
    }

    /// Create an XML error
    pub fn xml(msg: impl Into<String>) -> Self {
        Self::XmlError(msg.into())
    }

    /// Create a CSV error
    pub fn csv(msg: impl Into<String>) -> Self {
        Self::CsvError(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create an invalid operation error
    pub fn invalid_operation(msg: impl Into<String>) -> Self {
        Self::InvalidOperation(msg.into())
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::OrderingViolation { .. } | Error::Unrecoverable(_) => ErrorKind::Ordering,
            Error::IoError(_) => ErrorKind::Io,
            Error::FormatIncompatible(_) => ErrorKind::Incompatible,
            Error::SerializationError(_)
            | Error::Corruption(_)
            | Error::InvalidFormat(_)
            | Error::ArchiveError(_)
            | Error::CompressionError(_)
            | Error::XmlError(_)
            | Error::CsvError(_) => ErrorKind::Decode,
            Error::ConfigError(_) | Error::InvalidInput(_) | Error::InvalidOperation(_) => {
                ErrorKind::Other
            }
        }
    }

    /// True if the current recording (or spool) cannot be continued
    pub fn is_fatal(&self) -> bool {
        self.kind() == ErrorKind::Ordering
    }
}

impl From<rmp_serde::encode::Error> for Error {
    fn from(e: rmp_serde::encode::Error) -> Self {
        Error::SerializationError(e.to_string())
    }
}

impl From<rmp_serde::decode::Error> for Error {
    fn from(e: rmp_serde::decode::Error) -> Self {
        Error::SerializationError(e.to_string())
    }
}
