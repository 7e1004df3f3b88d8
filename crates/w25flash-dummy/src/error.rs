//! Error types for image file handling

use std::path::PathBuf;
use thiserror::Error;

/// Emulator image errors
#[derive(Debug, Error)]
pub enum DummyError {
    /// Failed to read an image file
    #[error("Failed to read image {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write an image file
    #[error("Failed to write image {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Image is larger than the emulated chip
    #[error("Image is {found} bytes but the chip holds {capacity}")]
    ImageTooLarge { found: usize, capacity: usize },

    /// Capacity code has no entry in the chip table
    #[error("Unsupported capacity code 0x{0:02X}")]
    UnsupportedCapacity(u8),
}

/// Result type for emulator image operations
pub type Result<T> = std::result::Result<T, DummyError>;
