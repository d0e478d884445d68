//! Error types for voxel-rs.

use thiserror::Error;

/// The main error type for voxel-rs setup operations.
///
/// Every variant is fatal at startup: a pipeline that failed to build one of
/// its inputs never renders a frame.
#[derive(Error, Debug)]
pub enum VoxelError {
    /// Raw data length does not match the declared layout.
    #[error("{what} size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch {
        /// Which input was being loaded ("volume", "transfer function").
        what: &'static str,
        /// Expected number of bytes.
        expected: usize,
        /// Number of bytes actually supplied.
        actual: usize,
    },

    /// The voxel count overflowed, or an empty grid was given where voxels
    /// are required.
    #[error("invalid volume dimensions {width}x{height}x{depth}")]
    InvalidDimensions {
        /// Width in voxels.
        width: u32,
        /// Height in voxels.
        height: u32,
        /// Depth in voxels.
        depth: u32,
    },

    /// Offscreen surface attachments are missing or inconsistent.
    #[error("incomplete surface: {0}")]
    IncompleteSurface(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration parse error.
    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),

    /// The passes of a frame cannot be ordered.
    #[error("frame schedule error: {0}")]
    Schedule(#[from] crate::pass::ScheduleError),
}

/// A specialized Result type for voxel-rs operations.
pub type Result<T> = std::result::Result<T, VoxelError>;
