//! Error types for collective operations.

use thiserror::Error;

/// Result type for collective operations.
pub type Result<T> = std::result::Result<T, CollectiveError>;

/// Errors from the distributed long-context primitive and its binding.
#[derive(Error, Debug)]
pub enum CollectiveError {
    /// No long-context primitive is available in this process.
    #[error("long-context attention not available: {0}")]
    NotAvailable(String),

    /// The primitive was already resolved; registration came too late.
    #[error("long-context attention already resolved; register it before first use")]
    AlreadyResolved,

    /// Process group metadata is inconsistent.
    #[error("invalid process group: rank {rank} with world size {world_size}")]
    InvalidGroup {
        /// Rank of this process.
        rank: usize,
        /// Number of participating processes.
        world_size: usize,
    },

    /// Failure inside the collective communication step.
    #[error("communication error: {0}")]
    Communication(String),

    /// Candle tensor error raised by the primitive.
    #[error("tensor error: {0}")]
    Tensor(#[from] candle_core::Error),
}
