//! Error types for bundle operations.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, BundleError>;

/// Errors that can occur while reading, patching or writing bundles.
#[derive(Error, Debug)]
pub enum BundleError {
    /// Filesystem or stream I/O failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to read or write a binary record.
    #[error("binary record error: {0}")]
    BinRecord(#[from] binrw::Error),

    /// Failed to parse or serialize an engine profile file.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The file does not start with the bundle magic.
    #[error("invalid bundle magic: {0:016x}")]
    InvalidMagic(u64),

    /// The bundle format version is not supported.
    #[error("unsupported bundle version: {0}")]
    InvalidVersion(u32),

    /// A directory entry points outside the content block.
    #[error("object {path_id} byte range {offset}+{size} exceeds bundle length {len}")]
    ObjectOutOfBounds {
        path_id: i64,
        offset: u64,
        size: u64,
        len: usize,
    },

    /// An object's bytes do not match its directory checksum.
    #[error("object {path_id} checksum mismatch")]
    ChecksumMismatch { path_id: i64 },

    /// An aligned-string offset is outside the blob.
    #[error("string offset {offset} out of range for blob of {len} bytes")]
    OffsetOutOfRange { offset: usize, len: usize },

    /// The blob is empty where a string field was expected.
    #[error("empty blob")]
    EmptyBlob,

    /// A length prefix points past the end of the blob.
    #[error("string at offset {offset} is truncated (length {len})")]
    TruncatedString { offset: usize, len: usize },

    /// A string field holds bytes that are not valid UTF-8.
    #[error("string at offset {offset} is not valid UTF-8")]
    InvalidUtf8 { offset: usize },

    /// No engine profile matches the requested engine version.
    #[error("unknown engine version: {0}")]
    UnknownEngineVersion(String),
}
