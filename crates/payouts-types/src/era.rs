//! Era indices and era windows.

use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};

/// A discrete settlement period. Eras are totally ordered.
pub type EraIndex = u32;

/// Half-open range of eras `[start, end)`, iterated oldest first.
///
/// `start <= end` always holds; a window with `start == end` is empty.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EraWindow {
    start: EraIndex,
    end: EraIndex,
}

impl EraWindow {
    /// Build a window. A `start` at or past `end` yields the empty window
    /// anchored at `end`.
    pub fn new(start: EraIndex, end: EraIndex) -> Self {
        if start >= end {
            Self::empty_at(end)
        } else {
            Self { start, end }
        }
    }

    /// The empty window `[end, end)`.
    pub fn empty_at(end: EraIndex) -> Self {
        Self { start: end, end }
    }

    /// First era in the window (inclusive).
    pub fn start(&self) -> EraIndex {
        self.start
    }

    /// One past the last era in the window.
    pub fn end(&self) -> EraIndex {
        self.end
    }

    /// Number of eras covered.
    pub fn len(&self) -> usize {
        (self.end - self.start) as usize
    }

    /// Whether the window covers no era.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Whether `era` lies in `[start, end)`.
    pub fn contains(&self, era: EraIndex) -> bool {
        era >= self.start && era < self.end
    }

    /// Eras oldest to newest.
    pub fn eras(&self) -> Range<EraIndex> {
        self.start..self.end
    }
}

impl fmt::Display for EraWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}
