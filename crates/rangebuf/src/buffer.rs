//! Growable byte store fed by a non-blocking socket.
//!
//! Layout
//! - `data[..read]` has been consumed by the parser but is still physically
//!   present, because ranges recorded for the current message may point into
//!   it.
//! - `data[read..]` is unread input. The write cursor is `data.len()`.
//! - `0 <= read <= data.len() <= data.capacity()` always holds.
//!
//! Compaction policy
//! - [`Buffer::compact`] shifts `data[read..]` down to offset 0 and bumps the
//!   buffer's [`Generation`]. Offsets recorded before the shift are therefore
//!   never silently re-read: every range carries the generation it was
//!   recorded against and refuses to read through a view at another one.
//! - Ranges that must survive the shift are renormalized eagerly: either call
//!   [`Buffer::compact_with`], or feed the returned [`Compaction`] to
//!   [`RangeSet::renormalize`]. Both subtract the discarded length from every
//!   live range and restamp it; ranges that pointed into the discarded prefix
//!   stay stale and fail with [`crate::OutOfRange::Stale`].
//! - Growth reallocates storage but keeps offsets, so it never changes the
//!   generation.
use alloc::vec::Vec;

use crate::{
    error::{BufError, OutOfRange},
    options::BufferOptions,
    range_set::RangeSet,
    view::{ByteView, Generation},
};

/// Smallest allocation made when growing from nothing.
const MIN_GROWTH: usize = 64;

/// Receipt of one [`Buffer::compact`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Compaction {
    /// Bytes removed from the front of the buffer.
    pub discarded: usize,
    /// Generation the discarded layout was at.
    pub from: Generation,
    /// Generation after the shift; equal to `from` for a no-op.
    pub to: Generation,
}

impl Compaction {
    /// Whether nothing moved.
    #[must_use]
    pub const fn is_noop(&self) -> bool {
        self.discarded == 0
    }
}

/// Append-only byte store with a read cursor; see the module docs for
/// the layout and compaction policy.
#[derive(Debug, Clone)]
pub struct Buffer {
    data: Vec<u8>,
    read: usize,
    limit: Option<usize>,
    generation: Generation,
}

impl Default for Buffer {
    fn default() -> Self {
        Self::new()
    }
}

impl Buffer {
    /// An empty buffer with [`BufferOptions::default`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(BufferOptions::default())
    }

    /// An empty buffer sized by `options`. The initial allocation never
    /// exceeds `max_capacity`.
    #[must_use]
    pub fn with_options(options: BufferOptions) -> Self {
        let initial = options
            .max_capacity
            .map_or(options.initial_capacity, |limit| {
                options.initial_capacity.min(limit)
            });
        Self {
            data: Vec::with_capacity(initial),
            read: 0,
            limit: options.max_capacity,
            generation: Generation::ZERO,
        }
    }

    /// Copy `chunk` in after the write cursor, growing storage geometrically
    /// if it does not fit.
    ///
    /// # Errors
    ///
    /// [`BufError::LimitExceeded`] if the buffer would outgrow its configured
    /// limit; nothing is appended in that case.
    pub fn append(&mut self, chunk: &[u8]) -> Result<(), BufError> {
        let needed = self
            .data
            .len()
            .checked_add(chunk.len())
            .ok_or(BufError::LimitExceeded {
                requested: usize::MAX,
                limit: self.limit.unwrap_or(usize::MAX),
            })?;
        if needed > self.data.capacity() {
            self.grow_for(needed)?;
        }
        self.data.extend_from_slice(chunk);
        Ok(())
    }

    fn grow_for(&mut self, needed: usize) -> Result<(), BufError> {
        self.check_limit(needed)?;
        let mut target = needed
            .max(self.data.capacity().saturating_mul(2))
            .max(MIN_GROWTH);
        if let Some(limit) = self.limit {
            target = target.min(limit);
        }
        self.reserve_total(target);
        Ok(())
    }

    /// Reallocate so that at least `capacity` bytes fit, keeping every byte
    /// and offset.
    ///
    /// # Errors
    ///
    /// [`BufError::LimitExceeded`] if `capacity` is past the configured limit.
    pub fn grow_to(&mut self, capacity: usize) -> Result<(), BufError> {
        self.check_limit(capacity)?;
        self.reserve_total(capacity);
        Ok(())
    }

    fn check_limit(&self, requested: usize) -> Result<(), BufError> {
        match self.limit {
            Some(limit) if requested > limit => {
                Err(BufError::LimitExceeded { requested, limit })
            }
            _ => Ok(()),
        }
    }

    fn reserve_total(&mut self, capacity: usize) {
        if capacity <= self.data.capacity() {
            return;
        }
        let before = self.data.capacity();
        self.data.reserve_exact(capacity - self.data.len());
        tracing::trace!(before, after = self.data.capacity(), "grew buffer");
    }

    /// Mark everything before `position` as consumed.
    ///
    /// The bytes stay readable until the next compaction. Positions behind
    /// the read cursor leave it where it is.
    ///
    /// # Errors
    ///
    /// [`OutOfRange::Bounds`] if `position` is past the write cursor.
    pub fn consume_up_to(&mut self, position: usize) -> Result<(), BufError> {
        if position > self.data.len() {
            return Err(OutOfRange::bounds(position, 0, self.data.len()));
        }
        self.read = self.read.max(position);
        Ok(())
    }

    /// Consume the next `n` unread bytes.
    ///
    /// # Errors
    ///
    /// [`OutOfRange::Bounds`] if fewer than `n` bytes are unread.
    pub fn consume(&mut self, n: usize) -> Result<(), BufError> {
        let position = self
            .read
            .checked_add(n)
            .ok_or_else(|| OutOfRange::bounds(self.read, n, self.data.len()))?;
        self.consume_up_to(position)
    }

    /// Discard the consumed prefix, moving the unread bytes to offset 0.
    ///
    /// Every range recorded against the old layout becomes stale unless it is
    /// renormalized with the returned receipt. Compacting with nothing
    /// consumed moves nothing and keeps the generation.
    #[must_use = "ranges recorded before the compaction are stale until renormalized"]
    pub fn compact(&mut self) -> Compaction {
        let from = self.generation;
        let discarded = self.read;
        if discarded == 0 {
            return Compaction {
                discarded,
                from,
                to: from,
            };
        }

        let len = self.data.len();
        self.data.copy_within(discarded..len, 0);
        self.data.truncate(len - discarded);
        self.read = 0;
        self.generation = from.next();

        tracing::trace!(
            discarded,
            remaining = self.data.len(),
            generation = %self.generation,
            "compacted buffer"
        );
        Compaction {
            discarded,
            from,
            to: self.generation,
        }
    }

    /// Compact and renormalize `ranges` in the same step.
    pub fn compact_with(&mut self, ranges: &mut RangeSet) -> Compaction {
        let compaction = self.compact();
        ranges.renormalize(&compaction);
        compaction
    }

    /// Drop every byte and rewind both cursors.
    ///
    /// Storage is kept for reuse. The generation always moves on, even when
    /// the buffer is already empty, so no range from before the clear can
    /// read the bytes that arrive next.
    pub fn clear(&mut self) {
        self.generation = self.generation.next();
        self.data.clear();
        self.read = 0;
    }

    /// Bytes appended but not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.read
    }

    /// The unread bytes, `[read_position, write_position)`.
    #[must_use]
    pub fn unread(&self) -> &[u8] {
        &self.data[self.read..]
    }

    /// Offset of the first unread byte.
    #[must_use]
    pub fn read_position(&self) -> usize {
        self.read
    }

    /// Offset the next append writes to.
    #[must_use]
    pub fn write_position(&self) -> usize {
        self.data.len()
    }

    /// Logical length: everything up to the write cursor, consumed or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether no bytes are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Allocated bytes.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    /// Configured byte limit, if any.
    #[must_use]
    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Current layout generation.
    #[must_use]
    pub fn generation(&self) -> Generation {
        self.generation
    }
}

impl ByteView for Buffer {
    fn as_slice(&self) -> &[u8] {
        &self.data
    }

    fn generation(&self) -> Generation {
        self.generation
    }
}
