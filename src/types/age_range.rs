use std::fmt;

use crate::error::{RegionError, Result};

/// A half-open integer age band `[start, end)`.
///
/// Construction validates `start <= end`; non-negativity is carried by the
/// type. Ranges may be empty (`start == end`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AgeRange {
    start: u32,
    end: u32,
}

impl AgeRange {
    pub fn new(start: u32, end: u32) -> Result<Self> {
        if start > end {
            return Err(RegionError::InvalidAgeRange { start, end });
        }
        Ok(Self { start, end })
    }

    #[inline]
    pub fn start(&self) -> u32 {
        self.start
    }

    #[inline]
    pub fn end(&self) -> u32 {
        self.end
    }

    #[inline]
    pub fn span(&self) -> u32 {
        self.end - self.start
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// True if the two ranges overlap or are adjacent, i.e. their union is
    /// itself a contiguous range.
    #[inline]
    pub fn is_connected(&self, other: &AgeRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// The (possibly empty) common sub-range, or `None` for disconnected
    /// ranges.
    pub fn intersection(&self, other: &AgeRange) -> Option<AgeRange> {
        self.is_connected(other).then(|| AgeRange {
            start: self.start.max(other.start),
            end: self.end.min(other.end),
        })
    }

    /// True if `other` lies entirely within this range.
    #[inline]
    pub fn encloses(&self, other: &AgeRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

impl fmt::Display for AgeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}
