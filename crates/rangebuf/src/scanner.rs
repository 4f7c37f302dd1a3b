use crate::{range::Range, range_set::RangeSet, view::ByteView};

/// Finds the first range in a [`RangeSet`] whose content starts with a
/// marker, e.g. a header name.
///
/// Scans are linear over the active ranges in insertion order. Not finding
/// the marker is the normal case for optional headers, so every lookup
/// returns an `Option` and never fails. Stale ranges never match.
#[derive(Debug, Clone, Copy)]
pub struct PrefixScanner<'p> {
    prefix: &'p [u8],
    case_sensitive: bool,
}

impl<'p> PrefixScanner<'p> {
    /// A scanner for ranges starting with `prefix`.
    #[must_use]
    pub const fn new(prefix: &'p [u8], case_sensitive: bool) -> Self {
        Self {
            prefix,
            case_sensitive,
        }
    }

    /// Index of the first matching range.
    pub fn find_index<V: ByteView + ?Sized>(&self, view: &V, ranges: &RangeSet) -> Option<usize> {
        ranges
            .iter()
            .position(|range| range.starts_with(view, self.prefix, self.case_sensitive))
    }

    /// The first matching range.
    pub fn find<'r, V: ByteView + ?Sized>(
        &self,
        view: &V,
        ranges: &'r RangeSet,
    ) -> Option<&'r Range> {
        self.find_index(view, ranges).map(|index| &ranges[index])
    }

    /// The rest of the first matching range after the marker, with leading
    /// spaces and tabs dropped.
    ///
    /// With the marker `b"host:"`, a range over `Host:  example.org` yields a
    /// range over `example.org`.
    pub fn value_of<V: ByteView + ?Sized>(&self, view: &V, ranges: &RangeSet) -> Option<Range> {
        let mut value = self.find(view, ranges)?.trim_front(self.prefix.len());
        while !value.is_empty() && matches!(view.byte_at(value.start()), Ok(b' ' | b'\t')) {
            value = value.trim_front(1);
        }
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Buffer;

    const HEADERS: &[u8] = b"Host:  example.org\r\nContent-Type: text/html\r\nX-Empty:\r\n";

    fn header_ranges(view: &[u8]) -> RangeSet {
        let mut ranges = RangeSet::with_capacity(8);
        let mut at = 0;
        while let Some(end) = view.find_from(at, b"\r\n") {
            ranges.append(at, end - at).unwrap();
            at = end + 2;
        }
        ranges
    }

    #[test]
    fn case_insensitive_lookup_finds_header() {
        let ranges = header_ranges(HEADERS);
        let found = PrefixScanner::new(b"content-type", false)
            .find(HEADERS, &ranges)
            .unwrap();
        assert_eq!(found.str(HEADERS).unwrap(), "Content-Type: text/html");
        assert_eq!(
            PrefixScanner::new(b"content-type", true).find(HEADERS, &ranges),
            None
        );
    }

    #[test]
    fn missing_marker_is_not_found() {
        let ranges = header_ranges(HEADERS);
        assert_eq!(PrefixScanner::new(b"Accept", false).find_index(HEADERS, &ranges), None);
        let empty = RangeSet::with_capacity(1);
        assert_eq!(PrefixScanner::new(b"Host", false).find(HEADERS, &empty), None);
    }

    #[test]
    fn first_match_wins() {
        let view = &b"a=1a=2"[..];
        let mut ranges = RangeSet::with_capacity(2);
        ranges.append(0, 3).unwrap();
        ranges.append(3, 3).unwrap();
        assert_eq!(PrefixScanner::new(b"a=", true).find_index(view, &ranges), Some(0));
    }

    #[test]
    fn value_of_skips_marker_and_leading_blanks() {
        let ranges = header_ranges(HEADERS);
        let host = PrefixScanner::new(b"host:", false)
            .value_of(HEADERS, &ranges)
            .unwrap();
        assert_eq!(host.str(HEADERS).unwrap(), "example.org");

        let empty = PrefixScanner::new(b"x-empty:", false)
            .value_of(HEADERS, &ranges)
            .unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn stale_ranges_are_skipped() {
        let mut buffer = Buffer::new();
        buffer.append(b"..Host: a").unwrap();
        let mut ranges = RangeSet::with_capacity(1);
        ranges.append(2, 7).unwrap();
        buffer.consume_up_to(2).unwrap();
        let _ = buffer.compact();
        assert_eq!(PrefixScanner::new(b"Host", true).find(&buffer, &ranges), None);
    }
}
