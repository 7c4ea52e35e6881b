use std::io;
use thiserror::Error;

/// Result type for asar operations
pub type Result<T> = std::result::Result<T, AsarError>;

/// Unified error type for all asar operations
#[derive(Debug, Error)]
pub enum AsarError {
    // Container errors
    #[error("Invalid archive format: {0}")]
    InvalidFormat(String),

    #[error("File not found in archive: {0}")]
    FileNotFound(String),

    #[error("Not a directory in archive: {0}")]
    NotADirectory(String),

    #[error("Not a file in archive: {0}")]
    NotAFile(String),

    #[error("Packed file has no offset: {0}")]
    MissingOffset(String),

    // Integrity errors, fatal; see [`AsarError::is_fatal`]
    #[error("Integrity check failed: expected {expected}, got {actual}")]
    IntegrityViolation { expected: String, actual: String },

    #[error("Unsupported hash algorithm in integrity descriptor")]
    UnsupportedHashAlgorithm,

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid UTF-8 in file contents: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
}

impl AsarError {
    /// Whether this error is in the fatal class.
    ///
    /// Fatal errors mean the archive's contents failed cryptographic
    /// validation: the bytes on disk do not match what the index promised.
    /// An embedding host must treat them as unrecoverable and abort the
    /// process rather than serve the data; archives are a trust boundary for
    /// code loading, and a tampered file must never reach the application.
    /// Every other variant is an ordinary failure value and safe to handle.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            AsarError::IntegrityViolation { .. } | AsarError::UnsupportedHashAlgorithm
        )
    }
}
