use thiserror::Error;

use crate::view::Generation;

/// Every failure the buffer and range index can report.
///
/// All of them are per-operation: the owning connection handler decides
/// whether to reject the message, close the connection, or size its pools
/// differently. Nothing in this crate retries.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BufError {
    /// A byte window or slot index does not exist in the current state.
    #[error("out of range: {0}")]
    OutOfRange(#[from] OutOfRange),
    /// The range pool is exhausted for the current message.
    #[error("too many ranges (capacity {capacity})")]
    CapacityExceeded {
        /// Number of slots the pool was built with.
        capacity: usize,
    },
    /// Growing the backing storage would pass the configured byte limit.
    #[error("buffer limit exceeded: {requested} bytes requested, limit is {limit}")]
    LimitExceeded {
        /// Total bytes the operation needed to hold.
        requested: usize,
        /// Configured `max_capacity`.
        limit: usize,
    },
}

/// Why a read was refused.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutOfRange {
    /// `start + length` runs past the logical length of the view.
    #[error("window {start}+{length} exceeds logical length {len}")]
    Bounds {
        /// First byte of the requested window.
        start: usize,
        /// Requested window length.
        length: usize,
        /// Logical length of the view at the time of the read.
        len: usize,
    },
    /// The range was recorded before a compaction moved the bytes it
    /// describes.
    #[error("stale range: recorded at generation {range}, view is at generation {view}")]
    Stale {
        /// Generation stamped on the range.
        range: Generation,
        /// Generation of the view it was read against.
        view: Generation,
    },
    /// A slot index at or past the number of active ranges.
    #[error("slot {index} is not active ({count} in use)")]
    Slot {
        /// Requested slot.
        index: usize,
        /// Active slots in the set.
        count: usize,
    },
}

impl OutOfRange {
    pub(crate) fn bounds(start: usize, length: usize, len: usize) -> BufError {
        BufError::OutOfRange(Self::Bounds { start, length, len })
    }
}
