//! Aligned line ranges.
//!
//! A [`RangeDifference`] pairs a range of reference ("left") lines with a range of working
//! ("right") lines. A diff is an ordered list of them that partitions both documents:
//! consecutive entries are adjacent on both sides, the first starts at line 0 on both sides and
//! the last ends at the respective line counts.

use std::ops::Range;

/// Whether the two ranges of a [`RangeDifference`] are identical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DifferenceKind {
    /// Both ranges hold the same lines (and have the same length).
    NoChange,
    /// The ranges differ; either side may be empty.
    Change,
}

/// A pair of aligned line ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RangeDifference {
    kind: DifferenceKind,
    left_start: usize,
    left_length: usize,
    right_start: usize,
    right_length: usize,
}

impl RangeDifference {
    /// Creates a range difference.
    pub const fn new(
        kind: DifferenceKind,
        left_start: usize,
        left_length: usize,
        right_start: usize,
        right_length: usize,
    ) -> Self {
        Self {
            kind,
            left_start,
            left_length,
            right_start,
            right_length,
        }
    }

    /// An unchanged run of `length` lines.
    pub const fn no_change(left_start: usize, right_start: usize, length: usize) -> Self {
        Self::new(
            DifferenceKind::NoChange,
            left_start,
            length,
            right_start,
            length,
        )
    }

    /// A changed block.
    pub const fn change(
        left_start: usize,
        left_length: usize,
        right_start: usize,
        right_length: usize,
    ) -> Self {
        Self::new(
            DifferenceKind::Change,
            left_start,
            left_length,
            right_start,
            right_length,
        )
    }

    /// Kind of this entry.
    pub fn kind(&self) -> DifferenceKind {
        self.kind
    }

    /// Returns `true` for [`DifferenceKind::Change`].
    pub fn is_change(&self) -> bool {
        self.kind == DifferenceKind::Change
    }

    /// First reference line.
    pub fn left_start(&self) -> usize {
        self.left_start
    }

    /// Number of reference lines.
    pub fn left_length(&self) -> usize {
        self.left_length
    }

    /// Exclusive end of the reference range.
    pub fn left_end(&self) -> usize {
        self.left_start + self.left_length
    }

    /// First working line.
    pub fn right_start(&self) -> usize {
        self.right_start
    }

    /// Number of working lines.
    pub fn right_length(&self) -> usize {
        self.right_length
    }

    /// Exclusive end of the working range.
    pub fn right_end(&self) -> usize {
        self.right_start + self.right_length
    }

    /// Reference line range.
    pub fn left_range(&self) -> Range<usize> {
        self.left_start..self.left_end()
    }

    /// Working line range.
    pub fn right_range(&self) -> Range<usize> {
        self.right_start..self.right_end()
    }

    /// Larger of the two lengths.
    pub fn max_length(&self) -> usize {
        self.left_length.max(self.right_length)
    }

    /// Returns `true` if working line `line` falls into this entry.
    pub fn contains_right_line(&self, line: usize) -> bool {
        self.right_range().contains(&line)
    }

    pub(crate) fn shift_right(&mut self, delta: isize) {
        self.right_start = self.right_start.saturating_add_signed(delta);
    }

    /// Grows `self` to also cover `next`, which must directly follow it on both sides.
    pub(crate) fn absorb(&mut self, next: &RangeDifference) {
        debug_assert_eq!(self.left_end(), next.left_start);
        debug_assert_eq!(self.right_end(), next.right_start);
        self.left_length += next.left_length;
        self.right_length += next.right_length;
    }

    fn is_empty(&self) -> bool {
        self.left_length == 0 && self.right_length == 0
    }
}

/// Appends `difference` to `list`, merging it into the last entry when both have the same kind.
///
/// Keeps the list canonical: no empty entries and no two adjacent entries of the same kind.
pub(crate) fn push_merged(list: &mut Vec<RangeDifference>, difference: RangeDifference) {
    if difference.is_empty() {
        return;
    }
    if let Some(last) = list.last_mut()
        && last.kind == difference.kind
        && last.left_end() == difference.left_start
        && last.right_end() == difference.right_start
    {
        last.absorb(&difference);
        return;
    }
    list.push(difference);
}

/// Returns `true` if `differences` partitions `0..left_lines` and `0..right_lines`.
pub fn is_partition(differences: &[RangeDifference], left_lines: usize, right_lines: usize) -> bool {
    let mut left = 0;
    let mut right = 0;
    for difference in differences {
        if difference.left_start != left || difference.right_start != right {
            return false;
        }
        if difference.kind == DifferenceKind::NoChange
            && difference.left_length != difference.right_length
        {
            return false;
        }
        left = difference.left_end();
        right = difference.right_end();
    }
    left == left_lines && right == right_lines
}
