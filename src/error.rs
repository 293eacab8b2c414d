//! Typed error taxonomy for the core. Mutating calls are transactional with
//! respect to observable buffer state: on failure the buffer, undo stacks,
//! and line index are left exactly as they were before the call.

use std::io;
use std::path::PathBuf;

/// The error type returned by every fallible core operation.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// `insert` was asked to write past `total_len`.
    #[error("position {pos} is out of bounds (buffer length {len})")]
    PositionOutOfBounds {
        /// The offending position.
        pos: u64,
        /// The buffer's length at the time of the call.
        len: u64,
    },

    /// `get_range` was asked to read past `total_len`.
    #[error("range [{start}, {start}+{length}) is out of bounds (buffer length {len})")]
    OutOfRange {
        /// Requested range start.
        start: u64,
        /// Requested range length.
        length: u64,
        /// The buffer's length at the time of the call.
        len: u64,
    },

    /// The piece iterator encountered a byte sequence that is not valid UTF-8.
    #[error("invalid UTF-8 sequence at byte offset {pos}")]
    InvalidUtf8 {
        /// Byte offset of the first offending byte.
        pos: u64,
    },

    /// The load target does not exist.
    #[error("file not found: {0}")]
    FileNotFound(PathBuf),

    /// Detection found a NUL byte in the first 8 KiB: treated as binary.
    #[error("refusing to load binary file: {0}")]
    BinaryFile(PathBuf),

    /// Detector returned `Unknown`, or no lossless encoder exists for a save.
    #[error("unsupported encoding for {0}")]
    UnsupportedEncoding(String),

    /// A lone surrogate or a truncated surrogate pair was found while
    /// decoding UTF-16.
    #[error("invalid UTF-16 sequence at byte offset {pos}")]
    InvalidUtf16 {
        /// Byte offset of the first offending code unit.
        pos: u64,
    },

    /// The piece table's cached `total_len` disagrees with the sum of piece
    /// lengths. This is a programmer error, never expected in correct code.
    #[error("buffer inconsistency: total_len={total_len} but pieces sum to {actual}")]
    BufferInconsistency {
        /// The cached length.
        total_len: u64,
        /// The length actually observed by summing pieces.
        actual: u64,
    },

    /// An OS-level I/O error, passed through unchanged.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Convenience alias used throughout the crate.
pub type CoreResult<T> = Result<T, CoreError>;
