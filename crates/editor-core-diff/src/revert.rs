//! Copying reference text back into the working document.
//!
//! Every revert is planned against a snapshot of the working document taken while the differ is
//! synchronized with exactly that version, and applied as a single version-checked edit. The edit
//! then flows back through the differ's normal edit notifications.

use crate::differ::{DifferState, LineDiffer};
use crate::document::DocumentSnapshot;
use crate::error::{DifferError, LocationError};
use crate::range_difference::{DifferenceKind, RangeDifference};
use crate::region::DiffRegion;
use crate::text;
use ropey::Rope;
use std::ops::Range;

/// Working lines to replace and the reference lines to put in their place.
struct LineReplacement {
    lines: Range<usize>,
    replacement: Vec<String>,
}

/// A char-level edit of the working document.
#[derive(Debug, PartialEq, Eq)]
struct TextEdit {
    offset: usize,
    len: usize,
    text: String,
}

struct RevertContext<'a> {
    differences: &'a [RangeDifference],
    reference: &'a Rope,
    line_count: usize,
}

impl RevertContext<'_> {
    fn index_of(&self, line: usize) -> Result<usize, DifferError> {
        let index = self
            .differences
            .partition_point(|difference| difference.right_end() <= line);
        if index < self.differences.len() {
            Ok(index)
        } else {
            Err(LocationError::InvalidLine {
                line,
                line_count: self.line_count,
            }
            .into())
        }
    }

    fn reference_lines(&self, lines: Range<usize>) -> Vec<String> {
        text::lines(self.reference, lines.start, lines.end)
    }
}

impl LineDiffer {
    /// Replaces working line `line` with its reference counterpart; an added line is deleted.
    ///
    /// Unchanged lines are left alone.
    pub fn revert_line(&self, line: usize) -> Result<(), DifferError> {
        self.revert_with(|context| {
            let index = context.index_of(line)?;
            let difference = context.differences[index];
            if difference.kind() == DifferenceKind::NoChange {
                return Ok(None);
            }
            let reference_line = difference.left_start() + (line - difference.right_start());
            let replacement = if reference_line < difference.left_end() {
                context.reference_lines(reference_line..reference_line + 1)
            } else {
                Vec::new()
            };
            Ok(Some((
                LineReplacement {
                    lines: line..line + 1,
                    replacement,
                },
                (),
            )))
        })
        .map(|_| ())
    }

    /// Replaces the whole changed block containing `line` with its reference lines.
    pub fn revert_block(&self, line: usize) -> Result<(), DifferError> {
        self.revert_with(|context| {
            let index = context.index_of(line)?;
            let difference = context.differences[index];
            if difference.kind() == DifferenceKind::NoChange {
                return Ok(None);
            }
            Ok(Some((
                LineReplacement {
                    lines: difference.right_range(),
                    replacement: context.reference_lines(difference.left_range()),
                },
                (),
            )))
        })
        .map(|_| ())
    }

    /// Replaces working lines `start..start + count` with the reference lines they map to.
    ///
    /// A selection ending inside a changed block takes the block's remaining reference lines only
    /// if it covers the block to its end. Reference lines deleted directly above the first or
    /// below the last selected line are restored as well.
    pub fn revert_selection(&self, start: usize, count: usize) -> Result<(), DifferError> {
        if count == 0 {
            return Ok(());
        }
        self.revert_with(|context| {
            let end = start
                .checked_add(count)
                .filter(|end| *end <= context.line_count)
                .ok_or(LocationError::InvalidLine {
                    line: start.saturating_add(count) - 1,
                    line_count: context.line_count,
                })?;
            let first_index = context.index_of(start)?;
            let last_index = context.index_of(end - 1)?;

            let first = context.differences[first_index];
            let mut left_start =
                first.left_start() + (start - first.right_start()).min(first.left_length());
            let deleted_above = if start == first.right_start() {
                first_index
                    .checked_sub(1)
                    .map(|index| context.differences[index])
                    .filter(|previous| previous.right_length() == 0)
            } else {
                None
            };
            if let Some(previous) = deleted_above {
                left_start = previous.left_start();
            }

            let last = context.differences[last_index];
            let mut left_end = if last.is_change() && end == last.right_end() {
                last.left_end()
            } else {
                last.left_start() + (end - last.right_start()).min(last.left_length())
            };
            let deleted_below = if end == last.right_end() {
                context
                    .differences
                    .get(last_index + 1)
                    .filter(|next| next.right_length() == 0)
            } else {
                None
            };
            if let Some(next) = deleted_below {
                left_end = next.left_end();
            }

            if deleted_above.is_none()
                && deleted_below.is_none()
                && !context.differences[first_index..=last_index]
                    .iter()
                    .any(RangeDifference::is_change)
            {
                return Ok(None);
            }
            Ok(Some((
                LineReplacement {
                    lines: start..end,
                    replacement: context.reference_lines(left_start..left_end.max(left_start)),
                },
                (),
            )))
        })
        .map(|_| ())
    }

    /// Re-inserts the reference lines deleted directly below working line `line`.
    ///
    /// Returns the number of restored lines (0 if nothing was deleted there).
    pub fn restore_after_line(&self, line: usize) -> Result<usize, DifferError> {
        self.revert_with(|context| {
            let index = context.index_of(line)?;
            let region = DiffRegion::for_line(context.differences, index, line, None);
            if region.removed_lines_below() == 0 {
                return Ok(None);
            }
            let difference = if region.difference().is_change() {
                region.difference()
            } else {
                match context.differences.get(index + 1) {
                    Some(next) => *next,
                    None => return Ok(None),
                }
            };
            let restored = difference.left_start() + difference.right_length()
                ..difference.left_end();
            let count = restored.len();
            Ok(Some((
                LineReplacement {
                    lines: difference.right_end()..difference.right_end(),
                    replacement: context.reference_lines(restored),
                },
                count,
            )))
        })
        .map(Option::unwrap_or_default)
    }

    fn revert_with<T>(
        &self,
        plan: impl FnOnce(&RevertContext<'_>) -> Result<Option<(LineReplacement, T)>, DifferError>,
    ) -> Result<Option<T>, DifferError> {
        let document = {
            let core = self.shared.lock_core();
            if core.state() != DifferState::Synchronized {
                return Err(DifferError::NotSynchronized);
            }
            core.working_document()
                .cloned()
                .ok_or(DifferError::NotConnected)?
        };
        let snapshot = document.snapshot();

        let (edit, value) = {
            let core = self.shared.lock_core();
            if core.state() != DifferState::Synchronized {
                return Err(DifferError::NotSynchronized);
            }
            if core.synced_version != snapshot.version() {
                return Err(LocationError::ConcurrentModification {
                    expected: core.synced_version,
                    actual: snapshot.version(),
                }
                .into());
            }
            let Some(reference) = core.reference.as_ref() else {
                return Err(DifferError::NotSynchronized);
            };
            let context = RevertContext {
                differences: core.model.differences(),
                reference,
                line_count: snapshot.line_count(),
            };
            match plan(&context)? {
                Some((replacement, value)) => (line_edit(&snapshot, &replacement)?, value),
                None => return Ok(None),
            }
        };

        tracing::debug!(
            offset = edit.offset,
            len = edit.len,
            "reverting working text to reference"
        );
        document.replace_if_version(snapshot.version(), edit.offset, edit.len, &edit.text)?;
        Ok(Some(value))
    }
}

/// Translates a line replacement into a char edit.
///
/// Lines are joined with `\n`. The last line of a document has no delimiter, so deleting it eats
/// the delimiter of the line above, and appending after it starts with one.
fn line_edit(
    snapshot: &DocumentSnapshot,
    replacement: &LineReplacement,
) -> Result<TextEdit, LocationError> {
    let text = snapshot.text();
    let line_count = text.len_lines();
    let Range { start, end } = replacement.lines;
    if start > end || end > line_count {
        return Err(LocationError::InvalidLine {
            line: end,
            line_count,
        });
    }
    let joined = replacement.replacement.join("\n");
    let has_replacement = !replacement.replacement.is_empty();

    if end < line_count {
        let offset = text.line_to_char(start);
        return Ok(TextEdit {
            offset,
            len: text.line_to_char(end) - offset,
            text: if has_replacement {
                joined + "\n"
            } else {
                String::new()
            },
        });
    }

    let char_count = text.len_chars();
    if start == end {
        return Ok(TextEdit {
            offset: char_count,
            len: 0,
            text: if has_replacement {
                format!("\n{joined}")
            } else {
                String::new()
            },
        });
    }

    let mut offset = text.line_to_char(start);
    if !has_replacement && start > 0 {
        offset -= 1;
    }
    Ok(TextEdit {
        offset,
        len: char_count - offset,
        text: joined,
    })
}
