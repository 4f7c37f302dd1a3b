//! Fixed-capacity pool of [`Range`] slots.
//!
//! The pool is allocated once per parse context and reused for every message:
//! slots are handed out by index and never freed individually, so a
//! long-running connection does not allocate per token.
//!
//! Slots `[0, len)` are active and stamped with the set's generation; slots
//! `[len, capacity)` are always in the reset state.
use alloc::{
    boxed::Box,
    collections::BTreeMap,
    string::String,
    vec,
};
use core::{
    fmt,
    ops::{Bound, Index, RangeBounds},
};

use bstr::ByteSlice;

use crate::{
    buffer::Compaction,
    error::{BufError, OutOfRange},
    range::Range,
    scanner::PrefixScanner,
    view::{ByteView, Generation},
};

/// Key/value pairs folded out of a run of ranges.
pub type Associations = BTreeMap<String, String>;

/// Fixed-capacity, index-addressed pool of ranges over one view.
#[derive(Debug, Clone)]
pub struct RangeSet {
    ranges: Box<[Range]>,
    count: usize,
    generation: Generation,
}

impl RangeSet {
    /// A pool of `capacity` reset slots, bound to [`Generation::ZERO`].
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            ranges: vec![Range::new(); capacity].into_boxed_slice(),
            count: 0,
            generation: Generation::ZERO,
        }
    }

    /// Claim the next unused slot and return its index.
    ///
    /// The slot comes back set to an empty range at the set's generation;
    /// fill it in through [`RangeSet::get_mut`].
    ///
    /// # Errors
    ///
    /// [`BufError::CapacityExceeded`] once every slot is in use. The pool is
    /// never grown here: indices already handed out must stay valid.
    pub fn reserve(&mut self) -> Result<usize, BufError> {
        if self.count >= self.ranges.len() {
            return Err(BufError::CapacityExceeded {
                capacity: self.ranges.len(),
            });
        }
        let index = self.count;
        let slot = &mut self.ranges[index];
        slot.set(0, 0);
        slot.stamp(self.generation);
        self.count += 1;
        Ok(index)
    }

    /// [`RangeSet::reserve`] and set the slot to `start`/`length`.
    ///
    /// # Errors
    ///
    /// [`BufError::CapacityExceeded`] once every slot is in use.
    pub fn append(&mut self, start: usize, length: usize) -> Result<usize, BufError> {
        let index = self.reserve()?;
        self.ranges[index].set(start, length);
        Ok(index)
    }

    /// Reset every active slot and start over at index 0.
    ///
    /// Touches only the slots in use, and is idempotent.
    pub fn reset(&mut self) -> &mut Self {
        for range in &mut self.ranges[..self.count] {
            range.reset();
        }
        self.count = 0;
        self
    }

    /// Reset, then stamp future ranges with `view`'s current generation.
    ///
    /// Needed when a set is paired with a view that has already been
    /// compacted, or that compacted without this set being renormalized.
    pub fn rebind<V: ByteView + ?Sized>(&mut self, view: &V) -> &mut Self {
        self.reset();
        self.generation = view.generation();
        self
    }

    /// Move every active range along with the bytes of a compaction.
    ///
    /// Ranges that pointed into the discarded prefix, and every range of a
    /// set that missed an earlier compaction, keep their old generation and
    /// refuse to read afterwards. Returns how many ranges were relocated.
    pub fn renormalize(&mut self, compaction: &Compaction) -> usize {
        if compaction.is_noop() {
            return self.count;
        }

        if self.generation != compaction.from {
            tracing::debug!(
                set = %self.generation,
                from = %compaction.from,
                to = %compaction.to,
                active = self.count,
                "range set missed a compaction, leaving its ranges stale"
            );
            self.generation = compaction.to;
            return 0;
        }

        let mut relocated = 0;
        for range in &mut self.ranges[..self.count] {
            if range.is_set()
                && range.generation() == compaction.from
                && range.relocate(compaction.discarded, compaction.to)
            {
                relocated += 1;
            }
        }
        self.generation = compaction.to;

        tracing::trace!(
            discarded = compaction.discarded,
            relocated,
            stale = self.count - relocated,
            "renormalized ranges"
        );
        relocated
    }

    /// Active slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.count
    }

    /// Whether no slot is active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Number of slots, fixed at construction.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.ranges.len()
    }

    /// Generation stamped on ranges handed out from now on.
    #[must_use]
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// The active range at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Range> {
        self.as_slice().get(index)
    }

    /// Mutable access to the active range at `index`.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Range> {
        self.ranges[..self.count].get_mut(index)
    }

    /// Like [`RangeSet::get`], reporting a missing slot as an error.
    ///
    /// # Errors
    ///
    /// [`OutOfRange::Slot`] for an inactive index.
    pub fn range(&self, index: usize) -> Result<&Range, BufError> {
        self.get(index).ok_or(BufError::OutOfRange(OutOfRange::Slot {
            index,
            count: self.count,
        }))
    }

    /// The most recently claimed slot.
    pub fn last_mut(&mut self) -> Option<&mut Range> {
        self.ranges[..self.count].last_mut()
    }

    /// The active ranges in insertion order.
    #[must_use]
    pub fn as_slice(&self) -> &[Range] {
        &self.ranges[..self.count]
    }

    /// Iterate over the active ranges.
    pub fn iter(&self) -> core::slice::Iter<'_, Range> {
        self.as_slice().iter()
    }

    /// First active range whose content starts with `prefix`.
    pub fn find_by_prefix<V: ByteView + ?Sized>(
        &self,
        view: &V,
        prefix: &[u8],
        case_sensitive: bool,
    ) -> Option<&Range> {
        PrefixScanner::new(prefix, case_sensitive).find(view, self)
    }

    /// Fold the ranges at `indices` into key/value pairs, splitting each on
    /// the first `separator`.
    ///
    /// A range without the separator contributes its whole text as the key
    /// and an empty value; repeated keys keep the last value seen.
    ///
    /// # Errors
    ///
    /// [`OutOfRange::Slot`] if `indices` reaches past the active ranges, or
    /// any error from reading a range (stale or out of bounds).
    pub fn to_map<V, R>(
        &self,
        view: &V,
        indices: R,
        separator: &[u8],
    ) -> Result<Associations, BufError>
    where
        V: ByteView + ?Sized,
        R: RangeBounds<usize>,
    {
        let from = match indices.start_bound() {
            Bound::Included(&i) => i,
            Bound::Excluded(&i) => i.saturating_add(1),
            Bound::Unbounded => 0,
        };
        let to = match indices.end_bound() {
            Bound::Included(&i) => i.saturating_add(1),
            Bound::Excluded(&i) => i,
            Bound::Unbounded => self.count,
        };
        if to > self.count {
            return Err(OutOfRange::Slot {
                index: to - 1,
                count: self.count,
            }
            .into());
        }

        let mut map = Associations::new();
        for range in self.as_slice().get(from..to).unwrap_or_default() {
            let text = range.bytes(view)?;
            let (key, value) = if separator.is_empty() {
                (text, &b""[..])
            } else {
                text.split_once_str(separator).unwrap_or((text, &b""[..]))
            };
            if key.is_empty() {
                tracing::debug!(token = ?text.as_bstr(), "folding token without a key");
            }
            map.insert(
                key.to_str_lossy().into_owned(),
                value.to_str_lossy().into_owned(),
            );
        }
        Ok(map)
    }

    /// Render the active ranges as `[<a>, <b>]`.
    ///
    /// # Errors
    ///
    /// Any error from reading a range.
    pub fn render<V: ByteView + ?Sized>(&self, view: &V) -> Result<String, BufError> {
        let mut out = String::from("[");
        for (i, range) in self.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            out.push('<');
            out.push_str(&range.str(view)?);
            out.push('>');
        }
        out.push(']');
        Ok(out)
    }
}

impl Index<usize> for RangeSet {
    type Output = Range;

    fn index(&self, index: usize) -> &Range {
        &self.as_slice()[index]
    }
}

impl<'a> IntoIterator for &'a RangeSet {
    type Item = &'a Range;
    type IntoIter = core::slice::Iter<'a, Range>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Display for RangeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RangeSet[{}/{}]", self.count, self.capacity())
    }
}
