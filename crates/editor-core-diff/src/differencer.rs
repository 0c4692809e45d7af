//! Range differencer over equivalence classes.
//!
//! Wraps `similar`'s Myers implementation: equal runs become [`DifferenceKind::NoChange`]
//! entries and each maximal run of deletions/insertions/replacements becomes a single
//! [`DifferenceKind::Change`] entry.
//!
//! Myers strips the common prefix before searching, so an inserted copy of a repeated line is
//! attributed to the end of the repeated run.

use crate::equivalence::EquivalenceClass;
use crate::range_difference::{DifferenceKind, RangeDifference, push_merged};
use similar::{Algorithm, DiffTag, capture_diff};
use std::ops::Range;

/// Diffs `left_range` of `left` against `right_range` of `right`.
///
/// The result partitions both ranges (it is empty only when both ranges are empty) and is
/// canonical: adjacent entries always differ in kind.
pub fn find_differences(
    left: &EquivalenceClass,
    left_range: Range<usize>,
    right: &EquivalenceClass,
    right_range: Range<usize>,
) -> Vec<RangeDifference> {
    let (left_start, right_start) = (left_range.start, right_range.start);
    let (left_end, right_end) = (left_range.end, right_range.end);
    let ops = capture_diff(
        Algorithm::Myers,
        left.tokens(),
        left_range,
        right.tokens(),
        right_range,
    );

    // Op ranges only carry lengths reliably; positions come from running cursors.
    let mut differences = Vec::with_capacity(ops.len());
    let (mut left_line, mut right_line) = (left_start, right_start);
    for op in &ops {
        let (tag, old, new) = op.as_tag_tuple();
        let kind = match tag {
            DiffTag::Equal => DifferenceKind::NoChange,
            DiffTag::Delete | DiffTag::Insert | DiffTag::Replace => DifferenceKind::Change,
        };
        push_merged(
            &mut differences,
            RangeDifference::new(kind, left_line, old.len(), right_line, new.len()),
        );
        left_line += old.len();
        right_line += new.len();
    }
    debug_assert_eq!((left_line, right_line), (left_end, right_end));
    differences
}

/// Diffs two complete documents.
pub fn diff_all(left: &EquivalenceClass, right: &EquivalenceClass) -> Vec<RangeDifference> {
    find_differences(left, 0..left.len(), right, 0..right.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::range_difference::is_partition;
    use pretty_assertions::assert_eq;

    fn diff(left: &str, right: &str) -> Vec<RangeDifference> {
        diff_all(
            &EquivalenceClass::from_text(left),
            &EquivalenceClass::from_text(right),
        )
    }

    #[test]
    fn identical_documents_are_one_unchanged_run() {
        assert_eq!(
            diff("a\nb\nc", "a\nb\nc"),
            vec![RangeDifference::no_change(0, 0, 3)]
        );
    }

    #[test]
    fn replaced_line() {
        assert_eq!(
            diff("a\nb\nc", "a\nx\nc"),
            vec![
                RangeDifference::no_change(0, 0, 1),
                RangeDifference::change(1, 1, 1, 1),
                RangeDifference::no_change(2, 2, 1),
            ]
        );
    }

    #[test]
    fn inserted_line() {
        assert_eq!(
            diff("a\nb\nc", "a\nb\ny\nc"),
            vec![
                RangeDifference::no_change(0, 0, 2),
                RangeDifference::change(2, 0, 2, 1),
                RangeDifference::no_change(2, 3, 1),
            ]
        );
    }

    #[test]
    fn deleted_lines_at_end() {
        assert_eq!(
            diff("a\nb\nc", "a"),
            vec![
                RangeDifference::no_change(0, 0, 1),
                RangeDifference::change(1, 2, 1, 0),
            ]
        );
    }

    #[test]
    fn insertion_into_a_repeated_run_lands_at_its_end() {
        assert_eq!(
            diff("r\nr\nr\nz", "r\nr\nr\nr\nz"),
            vec![
                RangeDifference::no_change(0, 0, 3),
                RangeDifference::change(3, 0, 3, 1),
                RangeDifference::no_change(3, 4, 1),
            ]
        );
    }

    #[test]
    fn adjacent_edits_form_one_change_block() {
        let differences = diff("a\nb\nc\nd", "a\nx\ny\nz\nd");
        assert_eq!(
            differences,
            vec![
                RangeDifference::no_change(0, 0, 1),
                RangeDifference::change(1, 2, 1, 3),
                RangeDifference::no_change(3, 4, 1),
            ]
        );
    }

    #[test]
    fn sub_ranges_keep_absolute_coordinates() {
        let left = EquivalenceClass::from_text("a\nb\nc\nd\ne");
        let right = EquivalenceClass::from_text("a\nb\nX\nd\ne");
        let differences = find_differences(&left, 1..4, &right, 1..4);
        assert_eq!(
            differences,
            vec![
                RangeDifference::no_change(1, 1, 1),
                RangeDifference::change(2, 1, 2, 1),
                RangeDifference::no_change(3, 3, 1),
            ]
        );
    }

    fn assert_aligned(left: &EquivalenceClass, right: &EquivalenceClass) {
        let differences = diff_all(left, right);
        assert!(
            is_partition(&differences, left.len(), right.len()),
            "{differences:?}"
        );
        for difference in &differences {
            if !difference.is_change() {
                assert_eq!(
                    left.tokens()[difference.left_range()],
                    right.tokens()[difference.right_range()]
                );
            }
        }
    }

    #[test]
    fn deletion_before_a_repeated_line_stays_in_order() {
        let left = EquivalenceClass::from_text("b\na");
        let right = EquivalenceClass::from_text("a\na");
        assert_aligned(&left, &right);
        assert_eq!(
            diff_all(&left, &right)
                .iter()
                .filter(|difference| !difference.is_change())
                .map(RangeDifference::left_length)
                .sum::<usize>(),
            1
        );
    }

    #[test]
    fn sub_range_cursors_start_at_the_window() {
        let left = EquivalenceClass::from_text("x\nb\na\ny");
        let right = EquivalenceClass::from_text("x\na\na\ny");
        let differences = find_differences(&left, 1..3, &right, 1..3);
        let first = differences.first().unwrap();
        assert_eq!((first.left_start(), first.right_start()), (1, 1));
        let last = differences.last().unwrap();
        assert_eq!((last.left_end(), last.right_end()), (3, 3));
        for pair in differences.windows(2) {
            assert_eq!(pair[0].left_end(), pair[1].left_start());
            assert_eq!(pair[0].right_end(), pair[1].right_start());
        }
    }

    #[test]
    fn results_partition_both_documents() {
        let cases = [
            ("", ""),
            ("a", ""),
            ("", "a\nb"),
            ("a\nb\nc\nd\ne\nf", "f\ne\nd\nc\nb\na"),
            ("x\ny\nx\ny", "y\nx\ny\nx\ny"),
            ("b\na", "a\na"),
            ("a\nb\nc\nb", "b\nb\na\nc"),
        ];
        for (left, right) in cases {
            assert_aligned(
                &EquivalenceClass::from_text(left),
                &EquivalenceClass::from_text(right),
            );
        }
    }
}
