use std::fmt;

use serde::{Deserialize, Serialize};

/// Half-open byte range `[start, end)` of the remote resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ByteRange {
    /// First byte, inclusive.
    pub start: u64,
    /// End offset, exclusive.
    pub end: u64,
}

impl ByteRange {
    pub fn new(start: u64, end: u64) -> Self {
        debug_assert!(start <= end, "range start {start} past end {end}");
        Self { start, end }
    }

    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Value for an HTTP `Range` header. HTTP ranges are inclusive on both ends.
    ///
    /// Returns `None` for an empty range, which HTTP cannot express.
    pub fn header_value(&self) -> Option<String> {
        if self.is_empty() {
            return None;
        }
        Some(format!("bytes={}-{}", self.start, self.end - 1))
    }

    /// Parse a `Content-Range` value such as `bytes 0-99/1000` or `bytes 0-99/*`.
    ///
    /// Unsatisfied ranges (`bytes */1000`) and malformed values yield `None`.
    pub fn from_content_range(value: &str) -> Option<Self> {
        let spec = value.trim().strip_prefix("bytes")?.trim_start();
        let (span, _total) = spec.split_once('/')?;
        let (first, last) = span.split_once('-')?;
        let first = first.trim().parse::<u64>().ok()?;
        let last = last.trim().parse::<u64>().ok()?;
        if last < first {
            return None;
        }
        Some(Self::new(first, last.checked_add(1)?))
    }
}

impl fmt::Display for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            write!(f, "bytes {}-{} empty", self.start, self.end)
        } else {
            write!(f, "bytes {}-{}", self.start, self.end - 1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_value_is_inclusive() {
        assert_eq!(ByteRange::new(0, 3).header_value().as_deref(), Some("bytes=0-2"));
        assert_eq!(ByteRange::new(6, 10).header_value().as_deref(), Some("bytes=6-9"));
    }

    #[test]
    fn empty_range_has_no_header() {
        let range = ByteRange::new(4, 4);
        assert!(range.is_empty());
        assert_eq!(range.len(), 0);
        assert_eq!(range.header_value(), None);
    }

    #[test]
    fn content_range_round_trips_header_value() {
        assert_eq!(
            ByteRange::from_content_range("bytes 6-9/10"),
            Some(ByteRange::new(6, 10))
        );
        assert_eq!(
            ByteRange::from_content_range("bytes 0-99/*"),
            Some(ByteRange::new(0, 100))
        );
    }

    #[test]
    fn malformed_content_range_is_rejected() {
        assert_eq!(ByteRange::from_content_range("bytes */1000"), None);
        assert_eq!(ByteRange::from_content_range("bytes 9-3/10"), None);
        assert_eq!(ByteRange::from_content_range("items 0-1/2"), None);
        assert_eq!(ByteRange::from_content_range("bytes 0-1"), None);
    }
}
