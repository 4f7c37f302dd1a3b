use alloc::string::String;

use crate::{
    error::{BufError, OutOfRange},
    view::{ByteView, Generation},
};

/// A token's location inside a [`ByteView`]: `start`, `length`, and the
/// generation of the view it was recorded against.
///
/// Setting a range never validates it; a parser may record a token before
/// all of its bytes have arrived. Validation happens on every read, which is
/// also where a range that outlived a compaction is caught.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Range {
    start: usize,
    length: usize,
    set: bool,
    generation: Generation,
}

impl Range {
    /// A reset range: `start == 0`, `length == 0`, not set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            start: 0,
            length: 0,
            set: false,
            generation: Generation::ZERO,
        }
    }

    /// A set range over a view at [`Generation::ZERO`].
    #[must_use]
    pub const fn at(start: usize, length: usize) -> Self {
        Self {
            start,
            length,
            set: true,
            generation: Generation::ZERO,
        }
    }

    /// Overwrite in place. The generation stamp is left untouched.
    pub fn set(&mut self, start: usize, length: usize) {
        self.start = start;
        self.length = length;
        self.set = true;
    }

    /// A set range recorded against `view`'s current layout.
    #[must_use]
    pub fn in_view<V: ByteView + ?Sized>(view: &V, start: usize, length: usize) -> Self {
        let mut range = Self::new();
        range.set_in(view, start, length);
        range
    }

    /// Overwrite in place and stamp the range with `view`'s current
    /// generation, so it reads back after `view` has been compacted.
    pub fn set_in<V: ByteView + ?Sized>(&mut self, view: &V, start: usize, length: usize) {
        self.set(start, length);
        self.generation = view.generation();
    }

    /// Back to the reset state.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub(crate) fn stamp(&mut self, generation: Generation) {
        self.generation = generation;
    }

    /// Offset of the first byte.
    #[must_use]
    pub const fn start(&self) -> usize {
        self.start
    }

    /// Length in bytes.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.length
    }

    /// One past the last byte, saturating.
    #[must_use]
    pub const fn end(&self) -> usize {
        self.start.saturating_add(self.length)
    }

    /// Whether the range covers no bytes.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Whether the range was set since its last reset.
    #[must_use]
    pub const fn is_set(&self) -> bool {
        self.set
    }

    /// Generation the range was recorded against.
    #[must_use]
    pub const fn generation(&self) -> Generation {
        self.generation
    }

    /// Whether reading this range through `view` would be refused as stale.
    ///
    /// Ranges never read through a [`Generation::DETACHED`] view.
    pub fn is_stale<V: ByteView + ?Sized>(&self, view: &V) -> bool {
        let current = view.generation();
        self.set && (self.generation != current || current == Generation::DETACHED)
    }

    /// The same range with its first `n` bytes dropped (clamped).
    #[must_use]
    pub fn trim_front(&self, n: usize) -> Range {
        let n = n.min(self.length);
        Range {
            start: self.start + n,
            length: self.length - n,
            ..*self
        }
    }

    /// Borrow the bytes this range describes.
    ///
    /// An unset range reads as empty.
    ///
    /// # Errors
    ///
    /// [`OutOfRange::Stale`] if `view` moved its bytes since the range was
    /// recorded, [`OutOfRange::Bounds`] if the window runs past the view.
    pub fn bytes<'v, V: ByteView + ?Sized>(&self, view: &'v V) -> Result<&'v [u8], BufError> {
        if !self.set {
            return Ok(&[]);
        }
        self.check_fresh(view)?;
        view.window(self.start, self.length)
    }

    /// Copy the range out as text.
    ///
    /// # Errors
    ///
    /// Same as [`Range::bytes`].
    pub fn str<V: ByteView + ?Sized>(&self, view: &V) -> Result<String, BufError> {
        if !self.set {
            return Ok(String::new());
        }
        self.check_fresh(view)?;
        view.to_text(self.start, self.length)
    }

    /// Whether the range holds exactly `literal`. Stale ranges never match.
    pub fn equals<V: ByteView + ?Sized>(
        &self,
        view: &V,
        literal: &[u8],
        case_sensitive: bool,
    ) -> bool {
        self.length == literal.len() && self.starts_with(view, literal, case_sensitive)
    }

    /// Whether the range begins with `prefix`. Stale ranges never match.
    pub fn starts_with<V: ByteView + ?Sized>(
        &self,
        view: &V,
        prefix: &[u8],
        case_sensitive: bool,
    ) -> bool {
        prefix.len() <= self.length
            && !self.is_stale(view)
            && view.matches(self.start, prefix, case_sensitive)
    }

    fn check_fresh<V: ByteView + ?Sized>(&self, view: &V) -> Result<(), BufError> {
        if !self.is_stale(view) {
            return Ok(());
        }
        tracing::debug!(
            start = self.start,
            length = self.length,
            range = %self.generation,
            view = %view.generation(),
            "refusing to read stale range"
        );
        Err(OutOfRange::Stale {
            range: self.generation,
            view: view.generation(),
        }
        .into())
    }

    /// Shift down by `by` bytes into generation `to`. Ranges that started in
    /// the discarded prefix cannot be relocated and keep their old stamp.
    pub(crate) fn relocate(&mut self, by: usize, to: Generation) -> bool {
        if self.start < by {
            return false;
        }
        self.start -= by;
        self.generation = to;
        true
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use super::*;
    use crate::Buffer;

    #[test]
    fn reset_range_is_empty_and_unset() {
        let mut range = Range::at(3, 4);
        range.reset();
        assert_eq!(range, Range::new());
        assert!(range.is_empty());
        assert!(!range.is_set());
        assert_eq!(range.str(&b"abc"[..]).unwrap(), "");
    }

    #[test]
    fn str_materializes_the_window() {
        let view = b"GET /a HTTP/1.1".to_vec();
        let mut range = Range::new();
        range.set(4, 2);
        assert_eq!(range.str(&view).unwrap(), "/a");
        assert_eq!(range.bytes(&view).unwrap(), b"/a");
        assert_eq!(range.end(), 6);
    }

    #[test]
    fn set_does_not_validate_until_read() {
        let mut view: Vec<u8> = b"GET /lo".to_vec();
        let range = Range::at(4, 5);
        assert_eq!(range.str(&view), Err(OutOfRange::bounds(4, 5, 7)));
        view.extend_from_slice(b"ng");
        assert_eq!(range.str(&view).unwrap(), "/long");
    }

    #[test]
    fn equals_and_prefix_honour_case_mode() {
        let view = &b"Content-Type: text/html"[..];
        let range = Range::at(0, view.len());
        assert!(range.starts_with(view, b"content-type", false));
        assert!(!range.starts_with(view, b"content-type", true));
        assert!(!range.equals(view, b"content-type", false));
        assert!(Range::at(0, 12).equals(view, b"CONTENT-TYPE", false));
        assert!(!Range::at(0, 3).starts_with(view, b"Content", true));
    }

    #[test]
    fn stale_range_fails_closed() {
        let mut buffer = Buffer::new();
        buffer.append(b"xxxxGET").unwrap();
        let range = Range::at(4, 3);
        assert_eq!(range.str(&buffer).unwrap(), "GET");

        buffer.consume_up_to(4).unwrap();
        let _ = buffer.compact();
        assert!(range.is_stale(&buffer));
        assert!(matches!(
            range.str(&buffer),
            Err(BufError::OutOfRange(OutOfRange::Stale { .. }))
        ));
        assert!(!range.starts_with(&buffer, b"G", true));
    }

    #[test]
    fn trim_front_clamps() {
        let range = Range::at(2, 5);
        assert_eq!(range.trim_front(2), Range::at(4, 3));
        assert_eq!(range.trim_front(9), Range::at(7, 0));
    }

    #[test]
    fn relocate_refuses_ranges_in_discarded_prefix() {
        let mut kept = Range::at(50, 10);
        assert!(kept.relocate(40, Generation::ZERO.next()));
        assert_eq!(kept.start(), 10);
        assert_eq!(kept.generation(), Generation::ZERO.next());

        let mut lost = Range::at(10, 10);
        assert!(!lost.relocate(40, Generation::ZERO.next()));
        assert_eq!(lost.generation(), Generation::ZERO);
    }
}
