use serde::{Deserialize, Serialize};

use crate::core::ByteRange;
use crate::error::ChunkError;

/// One contiguous byte range assigned to a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChunkPlan {
    /// 1-based chunk id, also the assembly order.
    pub id: u32,
    /// Inclusive start offset.
    pub offset_from: u64,
    /// Exclusive end offset.
    pub offset_to: u64,
}

impl ChunkPlan {
    pub fn new(id: u32, offset_from: u64, offset_to: u64) -> Self {
        Self {
            id,
            offset_from,
            offset_to,
        }
    }

    pub fn len(&self) -> u64 {
        self.offset_to - self.offset_from
    }

    pub fn is_empty(&self) -> bool {
        self.offset_from == self.offset_to
    }

    pub fn range(&self) -> ByteRange {
        ByteRange::new(self.offset_from, self.offset_to)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ChunkStatus {
    #[default]
    Pending,
    InFlight,
    Completed,
    Failed,
}

/// Mutable bookkeeping for one chunk, owned by the download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkState {
    pub plan: ChunkPlan,
    pub bytes_written: u64,
    pub status: ChunkStatus,
    /// Error of the last failed attempt, cleared on reset.
    pub last_error: Option<ChunkError>,
}

impl ChunkState {
    pub fn new(plan: ChunkPlan) -> Self {
        Self {
            plan,
            bytes_written: 0,
            status: ChunkStatus::Pending,
            last_error: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == ChunkStatus::Completed
    }
}
