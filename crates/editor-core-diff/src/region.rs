//! Per-line diff information.

use crate::range_difference::{DifferenceKind, RangeDifference};
use crate::text;
use ropey::Rope;
use std::fmt;

/// Classification of a working line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeType {
    /// The line matches the reference.
    Unchanged,
    /// The line replaces a reference line.
    Changed,
    /// The line has no counterpart in the reference.
    Added,
}

/// Diff information for one working line, or for a whole [`RangeDifference`] when reported in a
/// [`DiffModelEvent`](crate::DiffModelEvent).
#[derive(Clone)]
pub struct DiffRegion {
    difference: RangeDifference,
    offset: usize,
    removed_above: usize,
    removed_below: usize,
    reference: Option<Rope>,
}

impl DiffRegion {
    /// Region describing working line `line`, which must fall into `differences[index]`.
    pub(crate) fn for_line(
        differences: &[RangeDifference],
        index: usize,
        line: usize,
        reference: Option<Rope>,
    ) -> Self {
        let difference = differences[index];
        let offset = line.saturating_sub(difference.right_start());
        let unchanged = difference.kind() == DifferenceKind::NoChange;

        let mut removed_above = 0;
        if unchanged && offset == 0 && index > 0 {
            removed_above = pure_deletion_len(&differences[index - 1]);
        }

        let mut removed_below = 0;
        if offset + 1 == difference.right_length() {
            removed_below = if unchanged {
                differences.get(index + 1).map_or(0, pure_deletion_len)
            } else {
                difference
                    .left_length()
                    .saturating_sub(difference.right_length())
            };
        }

        Self {
            difference,
            offset,
            removed_above,
            removed_below,
            reference,
        }
    }

    /// Region describing a whole entry (reported at its first working line).
    pub(crate) fn for_difference(difference: RangeDifference, reference: Option<Rope>) -> Self {
        let removed_below = if difference.is_change() && difference.right_length() <= 1 {
            difference
                .left_length()
                .saturating_sub(difference.right_length())
        } else {
            0
        };
        Self {
            difference,
            offset: 0,
            removed_above: 0,
            removed_below,
            reference,
        }
    }

    /// Placeholder answered while the differ is suspended: a single changed line.
    pub(crate) fn suspended() -> Self {
        Self::for_difference(RangeDifference::change(0, 1, 0, 1), None)
    }

    /// Classification of the line.
    pub fn change_type(&self) -> ChangeType {
        match self.difference.kind() {
            DifferenceKind::NoChange => ChangeType::Unchanged,
            DifferenceKind::Change if self.offset >= self.difference.left_length() => {
                ChangeType::Added
            }
            DifferenceKind::Change => ChangeType::Changed,
        }
    }

    /// Returns `true` if the line differs from the reference or borders deleted lines.
    pub fn has_changes(&self) -> bool {
        self.change_type() != ChangeType::Unchanged
            || self.removed_above > 0
            || self.removed_below > 0
    }

    /// The entry the line belongs to.
    pub fn difference(&self) -> RangeDifference {
        self.difference
    }

    /// Offset of the line within [`difference`](Self::difference)'s working range.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Working line this region describes.
    pub fn line(&self) -> usize {
        self.difference.right_start() + self.offset
    }

    /// Reference line paired with this line, if any.
    pub fn reference_line(&self) -> Option<usize> {
        let line = self.difference.left_start() + self.offset;
        (line < self.difference.left_end()).then_some(line)
    }

    /// Reference lines deleted directly above this line.
    pub fn removed_lines_above(&self) -> usize {
        self.removed_above
    }

    /// Reference lines deleted directly below this line.
    pub fn removed_lines_below(&self) -> usize {
        self.removed_below
    }

    /// Reference text behind this line: the paired reference line (unless unchanged) followed
    /// by the lines removed below it. Lines carry no delimiters.
    ///
    /// Empty for added lines and whenever the reference is not available.
    pub fn original_text(&self) -> Vec<String> {
        let Some(reference) = &self.reference else {
            return Vec::new();
        };
        let Some(line) = self.reference_line() else {
            return Vec::new();
        };
        let start = if self.change_type() == ChangeType::Unchanged {
            line + 1
        } else {
            line
        };
        text::lines(reference, start, line + 1 + self.removed_below)
    }
}

fn pure_deletion_len(difference: &RangeDifference) -> usize {
    if difference.right_length() == 0 {
        difference.left_length()
    } else {
        0
    }
}

impl PartialEq for DiffRegion {
    fn eq(&self, other: &Self) -> bool {
        self.difference == other.difference
            && self.offset == other.offset
            && self.removed_above == other.removed_above
            && self.removed_below == other.removed_below
    }
}

impl Eq for DiffRegion {}

impl fmt::Debug for DiffRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiffRegion")
            .field("difference", &self.difference)
            .field("offset", &self.offset)
            .field("change_type", &self.change_type())
            .field("removed_above", &self.removed_above)
            .field("removed_below", &self.removed_below)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference() -> Option<Rope> {
        Some(Rope::from_str("a\nb\nc\nd\ne"))
    }

    #[test]
    fn changed_block_reports_surplus_below_its_last_line() {
        // reference a b c d e, working a X e
        let list = [
            RangeDifference::no_change(0, 0, 1),
            RangeDifference::change(1, 3, 1, 1),
            RangeDifference::no_change(4, 2, 1),
        ];
        let region = DiffRegion::for_line(&list, 1, 1, reference());
        assert_eq!(region.change_type(), ChangeType::Changed);
        assert_eq!(region.removed_lines_below(), 2);
        assert_eq!(region.removed_lines_above(), 0);
        assert_eq!(region.original_text(), vec!["b", "c", "d"]);

        // Change blocks are not pure deletions, so their neighbors report nothing.
        let after = DiffRegion::for_line(&list, 2, 2, reference());
        assert_eq!(after.removed_lines_above(), 0);
        assert!(after.original_text().is_empty());
    }

    #[test]
    fn pure_deletion_is_reported_on_both_neighbors() {
        // reference a b c d e, working a b e
        let list = [
            RangeDifference::no_change(0, 0, 2),
            RangeDifference::change(2, 2, 2, 0),
            RangeDifference::no_change(4, 2, 1),
        ];
        let above = DiffRegion::for_line(&list, 0, 1, reference());
        assert_eq!(above.change_type(), ChangeType::Unchanged);
        assert_eq!(above.removed_lines_below(), 2);
        assert_eq!(above.original_text(), vec!["c", "d"]);

        assert!(above.has_changes());

        let first = DiffRegion::for_line(&list, 0, 0, reference());
        assert_eq!(first.removed_lines_below(), 0);
        assert!(!first.has_changes());

        let below = DiffRegion::for_line(&list, 2, 2, reference());
        assert_eq!(below.removed_lines_above(), 2);
        assert_eq!(below.removed_lines_below(), 0);
    }

    #[test]
    fn lines_beyond_the_reference_side_are_added() {
        let list = [
            RangeDifference::no_change(0, 0, 1),
            RangeDifference::change(1, 1, 1, 3),
        ];
        let changed = DiffRegion::for_line(&list, 1, 1, reference());
        assert_eq!(changed.change_type(), ChangeType::Changed);
        assert_eq!(changed.reference_line(), Some(1));
        assert_eq!(changed.original_text(), vec!["b"]);

        let added = DiffRegion::for_line(&list, 1, 3, reference());
        assert_eq!(added.change_type(), ChangeType::Added);
        assert_eq!(added.reference_line(), None);
        assert!(added.original_text().is_empty());
        assert_eq!(added.line(), 3);
    }

    #[test]
    fn suspended_placeholder_is_a_changed_line() {
        let region = DiffRegion::suspended();
        assert_eq!(region.change_type(), ChangeType::Changed);
        assert!(region.has_changes());
        assert!(region.original_text().is_empty());
    }
}
