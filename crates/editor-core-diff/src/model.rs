//! The diff model and its incremental update.
//!
//! [`DiffModel`] holds the equivalence classes of both documents and the [`RangeDifference`]
//! list aligning them. It is purely synchronous: [`LineDiffer`](crate::LineDiffer) drives it from
//! document notifications and its initialization worker, but it can also be used directly.
//!
//! # Incremental update
//!
//! After an edit touching `removed_lines` pre-edit lines at `first_line` (replaced by
//! `inserted_lines` lines), [`DiffModel::apply_edit`]:
//!
//! 1. widens the touched span over any repeated-line run continuing right after it,
//! 2. looks outward from the span for the nearest unchanged runs of at least
//!    `size = max(removed_lines, inserted_lines) + 1` lines on either side (falling back to the
//!    first/last entry),
//! 3. trims those anchors down to `size` lines, re-diffs the resulting window and
//! 4. splices the result into the list, shifting everything after it by the line delta.
//!
//! Edits or windows over the configured bounds are refused with [`IncrementalFallback`]; the
//! caller then recomputes the model from scratch.

use crate::config::DifferConfig;
use crate::differencer;
use crate::equivalence::{EquivalenceClass, LineToken};
use crate::event::LineEdit;
use crate::range_difference::{DifferenceKind, RangeDifference, is_partition, push_merged};
use ropey::Rope;

/// Entries affected by one incremental update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DifferenceDelta {
    /// Entries that were inserted into the list.
    pub added: Vec<RangeDifference>,
    /// Entries that were removed from the list (pre-edit coordinates).
    pub removed: Vec<RangeDifference>,
    /// Entries after the edit whose working range moved (post-edit coordinates).
    pub changed: Vec<RangeDifference>,
}

impl DifferenceDelta {
    /// Returns `true` if the update left the list untouched.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }
}

/// Why an edit could not be applied incrementally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncrementalFallback {
    /// The edit touches more lines than `max_incremental_lines`.
    EditTooLarge,
    /// The re-diff window exceeds `max_window_lines`.
    WindowTooLarge,
    /// The edit does not fit the model (the model is stale).
    Inconsistent,
}

/// Line diff between a reference and a working document.
#[derive(Debug, Clone, Default)]
pub struct DiffModel {
    differences: Vec<RangeDifference>,
    left: EquivalenceClass,
    right: EquivalenceClass,
}

impl DiffModel {
    /// Computes the full diff of `working` against `reference`.
    pub fn new(reference: &Rope, working: &Rope) -> Self {
        Self::from_classes(
            EquivalenceClass::from_rope(reference),
            EquivalenceClass::from_rope(working),
        )
    }

    /// Computes the full diff of two tokenized documents.
    pub fn from_classes(left: EquivalenceClass, right: EquivalenceClass) -> Self {
        let differences = differencer::diff_all(&left, &right);
        Self {
            differences,
            left,
            right,
        }
    }

    /// The aligned ranges, ordered by line.
    pub fn differences(&self) -> &[RangeDifference] {
        &self.differences
    }

    /// Tokens of the reference document.
    pub fn reference_class(&self) -> &EquivalenceClass {
        &self.left
    }

    /// Tokens of the working document.
    pub fn working_class(&self) -> &EquivalenceClass {
        &self.right
    }

    /// Returns `true` if the list partitions both documents.
    pub fn is_consistent(&self) -> bool {
        is_partition(&self.differences, self.left.len(), self.right.len())
    }

    /// Index of the entry containing working line `line`.
    ///
    /// `hint` is the index returned by the previous lookup; the hinted entry and its successor
    /// are checked before falling back to a binary search.
    pub fn index_of_working_line(&self, line: usize, hint: usize) -> Option<usize> {
        for index in [hint, hint.saturating_add(1)] {
            if let Some(difference) = self.differences.get(index)
                && difference.contains_right_line(line)
            {
                return Some(index);
            }
        }
        let index = self
            .differences
            .partition_point(|difference| difference.right_end() <= line);
        (index < self.differences.len()).then_some(index)
    }

    /// Updates the model after `edit`; `after` is the post-edit working text.
    ///
    /// On error the model no longer describes the working text and must be rebuilt with
    /// [`DiffModel::new`].
    pub fn apply_edit(
        &mut self,
        edit: &LineEdit,
        after: &Rope,
        config: &DifferConfig,
    ) -> Result<DifferenceDelta, IncrementalFallback> {
        if edit.removed_lines > config.max_incremental_lines
            || edit.inserted_lines > config.max_incremental_lines
        {
            return Err(IncrementalFallback::EditTooLarge);
        }
        let old_lines = self.right.len();
        if self.differences.is_empty()
            || edit.removed_lines == 0
            || edit.first_line + edit.removed_lines > old_lines
            || after.len_lines() + edit.removed_lines != old_lines + edit.inserted_lines
        {
            return Err(IncrementalFallback::Inconsistent);
        }

        let size = edit.removed_lines.max(edit.inserted_lines) + 1;
        let line_delta = edit.line_delta();
        let first_line = edit.first_line;

        // Pre-edit coordinates from here on, until the splice.
        let run_end = repetition_end(
            after,
            edit.inserted_end(),
            size - 1,
            config.max_repetition_scan,
        );
        let mut last_line = edit.last_removed_line();
        if run_end > edit.inserted_end() {
            last_line = last_line.max(run_end - edit.inserted_lines + edit.removed_lines - 1);
        }

        let before_index = self.anchor_before(first_line, size);
        let after_index = self.anchor_after(last_line, size);
        if before_index > after_index {
            return Err(IncrementalFallback::Inconsistent);
        }
        let before = self.differences[before_index];
        let after_anchor = self.differences[after_index];

        let shift_before = if before.kind() == DifferenceKind::NoChange {
            first_line
                .min(before.right_end())
                .saturating_sub(before.right_start())
                .saturating_sub(size)
        } else {
            0
        };
        let shift_after = if after_anchor.kind() == DifferenceKind::NoChange {
            after_anchor
                .right_end()
                .saturating_sub((last_line + 1).max(after_anchor.right_start()))
                .saturating_sub(size)
        } else {
            0
        };

        let left_start = before.left_start() + shift_before;
        let right_start = before.right_start() + shift_before;
        let left_end = after_anchor.left_end() - shift_after;
        let right_end = (after_anchor.right_end() - shift_after)
            .checked_add_signed(line_delta)
            .ok_or(IncrementalFallback::Inconsistent)?;
        if right_end < right_start || left_end < left_start || right_end > after.len_lines() {
            return Err(IncrementalFallback::Inconsistent);
        }
        if left_end - left_start > config.max_window_lines
            || right_end - right_start > config.max_window_lines
        {
            return Err(IncrementalFallback::WindowTooLarge);
        }

        tracing::trace!(
            first_line,
            last_line,
            size,
            left = ?(left_start..left_end),
            right = ?(right_start..right_end),
            "re-diffing window"
        );

        self.right.update(after, edit);

        let mut window = Vec::new();
        if shift_before > 0 {
            window.push(RangeDifference::no_change(
                before.left_start(),
                before.right_start(),
                shift_before,
            ));
        }
        for difference in differencer::find_differences(
            &self.left,
            left_start..left_end,
            &self.right,
            right_start..right_end,
        ) {
            push_merged(&mut window, difference);
        }
        if shift_after > 0 {
            push_merged(
                &mut window,
                RangeDifference::no_change(left_end, right_end, shift_after),
            );
        }

        // Fold same-kind neighbors into the window so the list stays canonical.
        let mut start_index = before_index;
        let mut end_index = after_index + 1;
        if start_index > 0
            && let Some(first) = window.first().copied()
        {
            let previous = self.differences[start_index - 1];
            if previous.kind() == first.kind() {
                let mut merged = previous;
                merged.absorb(&first);
                window[0] = merged;
                start_index -= 1;
            }
        }
        if let Some(next) = self.differences.get(end_index).copied()
            && let Some(last) = window.last_mut()
        {
            let mut shifted = next;
            shifted.shift_right(line_delta);
            if shifted.kind() == last.kind() {
                last.absorb(&shifted);
                end_index += 1;
            }
        }

        let window_len = window.len();
        let removed: Vec<RangeDifference> = self
            .differences
            .splice(start_index..end_index, window.iter().copied())
            .collect();

        let mut delta = DifferenceDelta::default();
        for index in 0..removed.len().max(window_len) {
            match (removed.get(index), window.get(index)) {
                (Some(old), Some(new)) if old == new => {}
                (old, new) => {
                    delta.removed.extend(old.copied());
                    delta.added.extend(new.copied());
                }
            }
        }
        for difference in &mut self.differences[start_index + window_len..] {
            difference.shift_right(line_delta);
            if line_delta != 0 {
                delta.changed.push(*difference);
            }
        }

        match self.differences.last() {
            Some(last)
                if last.left_end() == self.left.len() && last.right_end() == self.right.len() =>
            {
                Ok(delta)
            }
            _ => Err(IncrementalFallback::Inconsistent),
        }
    }

    /// Index of the nearest entry at or before `line` that is an unchanged run with at least
    /// `size` lines before `line`; the first entry if there is none.
    fn anchor_before(&self, line: usize, size: usize) -> usize {
        let limit = self
            .differences
            .partition_point(|difference| difference.right_end() < line)
            .min(self.differences.len() - 1);
        (0..=limit)
            .rev()
            .find(|&index| {
                let difference = &self.differences[index];
                difference.kind() == DifferenceKind::NoChange
                    && line
                        .min(difference.right_end())
                        .saturating_sub(difference.right_start())
                        >= size
            })
            .unwrap_or(0)
    }

    /// Index of the nearest entry at or after `line` that is an unchanged run with at least
    /// `size` lines after `line`; the last entry if there is none.
    fn anchor_after(&self, line: usize, size: usize) -> usize {
        let last = self.differences.len() - 1;
        let limit = self
            .differences
            .partition_point(|difference| difference.right_start() <= line)
            .saturating_sub(1);
        (limit..=last)
            .find(|&index| {
                let difference = &self.differences[index];
                difference.kind() == DifferenceKind::NoChange
                    && difference
                        .right_end()
                        .saturating_sub((line + 1).max(difference.right_start()))
                        >= size
            })
            .unwrap_or(last)
    }
}

/// End (exclusive) of the run of lines starting at `start` that repeat the lines `period` above
/// them, scanning at most `limit` lines.
fn repetition_end(text: &Rope, start: usize, period: usize, limit: usize) -> usize {
    let line_count = text.len_lines();
    let mut end = start;
    while end < line_count && end - start < limit {
        let Some(previous) = end.checked_sub(period) else {
            break;
        };
        if LineToken::of_line(text, end) != LineToken::of_line(text, previous) {
            break;
        }
        end += 1;
    }
    end
}
