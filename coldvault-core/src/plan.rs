//! Partition planning for multipart uploads

use serde::{Deserialize, Serialize};

use crate::ByteRange;

/// Most parts a single multipart upload may have
pub const MAX_PARTS: u64 = 10_000;

/// Smallest part size, and the tree hash leaf size
pub const MIN_PART_SIZE: u64 = 1024 * 1024;

/// Largest part size the service accepts (4 GiB)
pub const MAX_PART_SIZE: u64 = 4 * 1024 * 1024 * 1024;

/// How an archive is split into parts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchivePlan {
    pub total_size: u64,
    pub part_size: u64,
    pub part_count: u64,
}

impl ArchivePlan {
    /// Plan an archive of `total_size` bytes.
    ///
    /// Starts at [`MIN_PART_SIZE`] and doubles the part size until the
    /// archive fits in [`MAX_PARTS`] parts. A zero byte archive has zero
    /// parts; callers decide whether that is acceptable.
    pub fn for_size(total_size: u64) -> Self {
        let mut part_size = MIN_PART_SIZE;
        while total_size / part_size > MAX_PARTS {
            part_size *= 2;
        }

        ArchivePlan {
            total_size,
            part_size,
            part_count: total_size.div_ceil(part_size),
        }
    }

    /// True for a zero byte archive
    pub fn is_empty(&self) -> bool {
        self.part_count == 0
    }

    /// Whether the part size is within what the service accepts
    pub fn within_service_limits(&self) -> bool {
        self.part_size <= MAX_PART_SIZE
    }

    /// Length of part `index`; only the last part may be short
    pub fn part_len(&self, index: u64) -> Option<u64> {
        if index >= self.part_count {
            return None;
        }
        let start = index * self.part_size;
        Some(self.part_size.min(self.total_size - start))
    }

    /// Byte range of part `index`
    pub fn range_for(&self, index: u64) -> Option<ByteRange> {
        self.part_len(index)
            .map(|len| ByteRange::new(index * self.part_size, len))
    }
}
