//! Process group context handed to the long-context primitive.

use crate::error::{CollectiveError, Result};

/// Position of this process within a sequence-parallel group.
///
/// The group is passed through to the primitive untouched. Every
/// participating process must call with shard-consistent metadata; this is
/// a caller obligation and is not checked across processes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessGroup {
    rank: usize,
    world_size: usize,
}

impl ProcessGroup {
    /// Create a group context, validating `rank < world_size`.
    pub fn new(rank: usize, world_size: usize) -> Result<Self> {
        if world_size == 0 || rank >= world_size {
            return Err(CollectiveError::InvalidGroup { rank, world_size });
        }
        Ok(Self { rank, world_size })
    }

    /// A degenerate group containing only this process.
    pub fn single() -> Self {
        Self {
            rank: 0,
            world_size: 1,
        }
    }

    /// Rank of this process.
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Number of participating processes.
    pub fn world_size(&self) -> usize {
        self.world_size
    }

    /// True when the sequence is not actually sharded.
    pub fn is_single(&self) -> bool {
        self.world_size == 1
    }
}
