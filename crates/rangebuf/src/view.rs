//! Read-side access to byte regions.
//!
//! [`ByteView`] is the only thing ranges and scanners know about the storage
//! they index. Every view reports a [`Generation`]; a [`crate::Buffer`] bumps
//! it whenever a compaction relocates bytes, which is what lets a
//! [`crate::Range`] recorded before the move refuse to read afterwards.
use alloc::string::String;
use core::fmt;

use bstr::{BStr, ByteSlice};

use crate::error::{BufError, OutOfRange};

/// Layout epoch of a view.
///
/// Offsets recorded against one generation are only meaningful while the view
/// stays at that generation.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    /// Generation of every freshly created view.
    pub const ZERO: Generation = Generation(0);

    /// Generation of a view whose offsets are rebased onto another view's
    /// bytes. No range is ever readable through it.
    pub const DETACHED: Generation = Generation(u64::MAX);

    /// The generation following this one. Never [`Generation::DETACHED`].
    #[must_use]
    pub const fn next(self) -> Generation {
        let next = self.0.wrapping_add(1);
        if next == Self::DETACHED.0 {
            Self::ZERO
        } else {
            Generation(next)
        }
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::DETACHED {
            f.write_str("detached")
        } else {
            self.0.fmt(f)
        }
    }
}

/// Indexed, bounds-checked reads over a contiguous byte region.
///
/// Implementors only provide [`ByteView::as_slice`]; the logical length is the
/// length of that slice, and nothing past it is ever readable.
pub trait ByteView {
    /// The bytes that are currently valid.
    fn as_slice(&self) -> &[u8];

    /// Layout epoch; plain slices never move and stay at [`Generation::ZERO`].
    fn generation(&self) -> Generation {
        Generation::ZERO
    }

    /// Logical length in bytes.
    fn len(&self) -> usize {
        self.as_slice().len()
    }

    /// Whether no bytes are readable.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The byte at `index`.
    ///
    /// # Errors
    ///
    /// [`OutOfRange::Bounds`] when `index` is at or past the logical length.
    fn byte_at(&self, index: usize) -> Result<u8, BufError> {
        self.as_slice()
            .get(index)
            .copied()
            .ok_or_else(|| OutOfRange::bounds(index, 1, self.len()))
    }

    /// Borrow `length` bytes starting at `start`.
    ///
    /// # Errors
    ///
    /// [`OutOfRange::Bounds`] when the window runs past the logical length.
    fn window(&self, start: usize, length: usize) -> Result<&[u8], BufError> {
        let bytes = self.as_slice();
        start
            .checked_add(length)
            .and_then(|end| bytes.get(start..end))
            .ok_or_else(|| OutOfRange::bounds(start, length, bytes.len()))
    }

    /// A read-only view sharing this view's storage.
    ///
    /// A slice from offset 0 keeps this view's offsets and generation. Any
    /// other slice is rebased and reports [`Generation::DETACHED`], so ranges
    /// recorded against this view refuse to read through it; wrap
    /// [`Bytes::get`] in [`Bytes::new`] to index the slice on its own.
    ///
    /// # Errors
    ///
    /// [`OutOfRange::Bounds`] when the window runs past the logical length.
    fn slice(&self, start: usize, length: usize) -> Result<Bytes<'_>, BufError> {
        let generation = if start == 0 {
            self.generation()
        } else {
            Generation::DETACHED
        };
        Ok(Bytes {
            bytes: self.window(start, length)?,
            generation,
        })
    }

    /// Compare `pattern.len()` bytes at `offset` with `pattern`.
    ///
    /// Case-insensitive comparison folds ASCII letters only. A pattern that
    /// would run past the logical length does not match: during a streaming
    /// parse the rest of the token may simply not have arrived yet.
    fn matches(&self, offset: usize, pattern: &[u8], case_sensitive: bool) -> bool {
        let Some(end) = offset.checked_add(pattern.len()) else {
            return false;
        };
        match self.as_slice().get(offset..end) {
            Some(window) if case_sensitive => window == pattern,
            Some(window) => window.eq_ignore_ascii_case(pattern),
            None => false,
        }
    }

    /// Copy a window out as text, replacing invalid UTF-8 with U+FFFD.
    ///
    /// # Errors
    ///
    /// [`OutOfRange::Bounds`] when the window runs past the logical length.
    fn to_text(&self, start: usize, length: usize) -> Result<String, BufError> {
        Ok(self.window(start, length)?.to_str_lossy().into_owned())
    }

    /// Offset of the first occurrence of `needle` at or after `from`.
    fn find_from(&self, from: usize, needle: &[u8]) -> Option<usize> {
        let haystack = self.as_slice().get(from..)?;
        ByteSlice::find(haystack, needle).map(|at| at + from)
    }
}

impl ByteView for [u8] {
    fn as_slice(&self) -> &[u8] {
        self
    }
}

impl ByteView for alloc::vec::Vec<u8> {
    fn as_slice(&self) -> &[u8] {
        self
    }
}

/// A borrowed window into another view.
///
/// Offsets inside a `Bytes` are relative to its own first byte. A `Bytes`
/// cut from the middle of another view is [`Generation::DETACHED`].
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Bytes<'a> {
    bytes: &'a [u8],
    generation: Generation,
}

impl<'a> Bytes<'a> {
    /// Wrap a plain slice at [`Generation::ZERO`].
    #[must_use]
    pub const fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            generation: Generation::ZERO,
        }
    }

    /// The underlying slice, with the lifetime of the original storage.
    #[must_use]
    pub const fn get(&self) -> &'a [u8] {
        self.bytes
    }
}

impl ByteView for Bytes<'_> {
    fn as_slice(&self) -> &[u8] {
        self.bytes
    }

    fn generation(&self) -> Generation {
        self.generation
    }
}

impl fmt::Debug for Bytes<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bytes")
            .field("bytes", &BStr::new(self.bytes))
            .field("generation", &self.generation)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use alloc::{format, string::ToString};

    use rstest::rstest;

    use super::*;

    const HEAD: &[u8] = b"GET /a HTTP/1.1\r\nHost: x\r\n";

    #[test]
    fn byte_at_is_bounded_by_logical_length() {
        assert_eq!(HEAD.byte_at(0), Ok(b'G'));
        assert_eq!(
            HEAD.byte_at(HEAD.len()),
            Err(OutOfRange::bounds(HEAD.len(), 1, HEAD.len()))
        );
    }

    #[test]
    fn slice_shares_storage() {
        let path = HEAD.slice(4, 2).unwrap();
        assert_eq!(path.get(), b"/a");
        assert!(core::ptr::eq(path.get().as_ptr(), HEAD[4..].as_ptr()));
        assert_eq!(path.byte_at(1), Ok(b'a'));
        assert!(path.slice(1, 2).is_err());
    }

    #[test]
    fn rebased_slice_refuses_ranges_from_its_parent() {
        let mut buffer = crate::Buffer::new();
        buffer.append(HEAD).unwrap();
        let host = crate::Range::in_view(&buffer, 17, 4);
        assert_eq!(host.str(&buffer).unwrap(), "Host");

        let head = buffer.slice(0, 6).unwrap();
        assert_eq!(head.generation(), buffer.generation());

        let tail = buffer.slice(10, HEAD.len() - 10).unwrap();
        assert_eq!(tail.generation(), Generation::DETACHED);
        assert!(host.is_stale(&tail));
        assert!(matches!(
            host.str(&tail),
            Err(BufError::OutOfRange(OutOfRange::Stale { .. }))
        ));

        let own = Bytes::new(tail.get());
        assert_eq!(crate::Range::at(7, 4).str(&own).unwrap(), "Host");
    }

    #[test]
    fn next_generation_skips_detached() {
        assert_eq!(Generation(u64::MAX - 1).next(), Generation::ZERO);
        assert_eq!(Generation::DETACHED.to_string(), "detached");
    }

    #[test]
    fn window_rejects_overflowing_lengths() {
        assert!(HEAD.window(1, usize::MAX).is_err());
        assert_eq!(HEAD.window(HEAD.len(), 0), Ok(&b""[..]));
    }

    #[rstest]
    #[case(0, b"GET", true, true)]
    #[case(0, b"get", true, false)]
    #[case(0, b"get", false, true)]
    #[case(17, b"HOST:", false, true)]
    #[case(4, b"/A", false, true)]
    #[case(24, b"\r\n", true, true)]
    #[case(24, b"\r\n\r\n", true, false)]
    #[case(usize::MAX, b"x", false, false)]
    fn matches_folds_ascii_only_and_never_overruns(
        #[case] offset: usize,
        #[case] pattern: &[u8],
        #[case] case_sensitive: bool,
        #[case] expected: bool,
    ) {
        assert_eq!(HEAD.matches(offset, pattern, case_sensitive), expected);
    }

    #[test]
    fn case_folding_leaves_non_ascii_alone() {
        let text = "É".as_bytes();
        assert!(!text.matches(0, "é".as_bytes(), false));
        assert!(text.matches(0, "É".as_bytes(), false));
    }

    #[test]
    fn to_text_copies_and_replaces_invalid_utf8() {
        assert_eq!(HEAD.to_text(0, 3).unwrap(), "GET");
        assert_eq!(b"a\xffb".to_text(0, 3).unwrap(), "a\u{fffd}b");
    }

    #[test]
    fn find_from_reports_absolute_offsets() {
        assert_eq!(HEAD.find_from(0, b"\r\n"), Some(15));
        assert_eq!(HEAD.find_from(16, b"\r\n"), Some(24));
        assert_eq!(HEAD.find_from(25, b"\r\n"), None);
        assert_eq!(HEAD.find_from(HEAD.len() + 1, b"\r\n"), None);
    }

    #[test]
    fn debug_renders_bytes_as_text() {
        let view = Bytes::new(b"a\r\n");
        insta::assert_snapshot!(
            format!("{view:?}"),
            @r#"Bytes { bytes: "a\r\n", generation: Generation(0) }"#
        );
    }
}
