//! Document edit events.
//!
//! A [`DocumentEvent`] describes a single replacement applied to a
//! [`TextDocument`](crate::TextDocument), expressed in **character offsets** (Unicode scalar
//! values). Listeners observe every event twice: once before the text is mutated and once after.
//!
//! [`LineEdit`] is the line-level view of an event that the differ works with: which lines of the
//! pre-edit text were touched and how many lines now stand in their place.

use crate::error::LocationError;
use ropey::Rope;

/// A single text replacement expressed in character offsets.
///
/// Semantics:
/// - `offset` is a character offset in the document **before** the edit is applied.
/// - `removed_len` characters starting at `offset` are replaced by `inserted_text`.
/// - `version` is the document version **after** the edit; versions increase by one per edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentEvent {
    /// Start character offset of the replaced range.
    pub offset: usize,
    /// Number of replaced characters (may be zero).
    pub removed_len: usize,
    /// Inserted text (may be empty).
    pub inserted_text: String,
    /// Document version once this edit is applied.
    pub version: u64,
}

impl DocumentEvent {
    /// Creates a new event.
    pub fn new(
        offset: usize,
        removed_len: usize,
        inserted_text: impl Into<String>,
        version: u64,
    ) -> Self {
        Self {
            offset,
            removed_len,
            inserted_text: inserted_text.into(),
            version,
        }
    }

    /// Exclusive end of the replaced range in the pre-edit document.
    pub fn removed_end(&self) -> usize {
        self.offset.saturating_add(self.removed_len)
    }

    /// Length of `inserted_text` in characters.
    pub fn inserted_len(&self) -> usize {
        self.inserted_text.chars().count()
    }

    /// Number of lines the inserted text spans once applied (line breaks + 1).
    pub fn inserted_line_count(&self) -> usize {
        count_line_breaks(&self.inserted_text) + 1
    }

    /// Applies this edit to `text`.
    pub fn apply_to(&self, text: &mut Rope) -> Result<(), LocationError> {
        let end = checked_end(text, self.offset, self.removed_len)?;
        if end > self.offset {
            text.remove(self.offset..end);
        }
        if !self.inserted_text.is_empty() {
            text.insert(self.offset, &self.inserted_text);
        }
        Ok(())
    }
}

/// The line-level footprint of a [`DocumentEvent`].
///
/// `removed_lines` pre-edit lines starting at `first_line` are replaced by `inserted_lines`
/// post-edit lines starting at the same index. Both counts are at least one: an edit always
/// touches the line it starts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineEdit {
    /// First touched line (same index before and after the edit).
    pub first_line: usize,
    /// Number of touched lines in the pre-edit text.
    pub removed_lines: usize,
    /// Number of lines standing in their place after the edit.
    pub inserted_lines: usize,
}

impl LineEdit {
    /// Computes the line footprint of `event` against the pre-edit text `before`.
    pub fn analyze(before: &Rope, event: &DocumentEvent) -> Result<Self, LocationError> {
        let end = checked_end(before, event.offset, event.removed_len)?;
        let first_line = before.char_to_line(event.offset);
        let last_line = before.char_to_line(end);
        Ok(Self {
            first_line,
            removed_lines: last_line - first_line + 1,
            inserted_lines: event.inserted_line_count(),
        })
    }

    /// Signed change in the document's line count.
    pub fn line_delta(&self) -> isize {
        self.inserted_lines as isize - self.removed_lines as isize
    }

    /// Last touched line in the pre-edit text (inclusive).
    pub fn last_removed_line(&self) -> usize {
        self.first_line + self.removed_lines - 1
    }

    /// Exclusive end of the touched lines in the post-edit text.
    pub fn inserted_end(&self) -> usize {
        self.first_line + self.inserted_lines
    }
}

pub(crate) fn count_line_breaks(text: &str) -> usize {
    text.bytes().filter(|b| *b == b'\n').count()
}

fn checked_end(text: &Rope, offset: usize, len: usize) -> Result<usize, LocationError> {
    let char_count = text.len_chars();
    offset
        .checked_add(len)
        .filter(|end| *end <= char_count)
        .ok_or(LocationError::InvalidRange {
            start: offset,
            end: offset.saturating_add(len),
            len: char_count,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_line_replacement() {
        let before = Rope::from_str("a\nb\nc");
        let edit = LineEdit::analyze(&before, &DocumentEvent::new(2, 1, "x", 1)).unwrap();
        assert_eq!(
            edit,
            LineEdit {
                first_line: 1,
                removed_lines: 1,
                inserted_lines: 1,
            }
        );
        assert_eq!(edit.line_delta(), 0);
    }

    #[test]
    fn deleting_a_line_touches_the_following_one() {
        // Removing "b\n" pulls "c" up onto line 1.
        let before = Rope::from_str("a\nb\nc");
        let edit = LineEdit::analyze(&before, &DocumentEvent::new(2, 2, "", 1)).unwrap();
        assert_eq!(edit.first_line, 1);
        assert_eq!(edit.removed_lines, 2);
        assert_eq!(edit.inserted_lines, 1);
        assert_eq!(edit.line_delta(), -1);
        assert_eq!(edit.last_removed_line(), 2);
    }

    #[test]
    fn insertion_at_end_of_document() {
        let before = Rope::from_str("a\nb");
        let event = DocumentEvent::new(3, 0, "\nc\nd", 1);
        let edit = LineEdit::analyze(&before, &event).unwrap();
        assert_eq!(edit.first_line, 1);
        assert_eq!(edit.removed_lines, 1);
        assert_eq!(edit.inserted_lines, 3);
        assert_eq!(edit.inserted_end(), 4);

        let mut text = before.clone();
        event.apply_to(&mut text).unwrap();
        assert_eq!(text.to_string(), "a\nb\nc\nd");
    }

    #[test]
    fn out_of_range_event_is_rejected() {
        let before = Rope::from_str("abc");
        let err = LineEdit::analyze(&before, &DocumentEvent::new(2, 5, "", 1)).unwrap_err();
        assert_eq!(
            err,
            LocationError::InvalidRange {
                start: 2,
                end: 7,
                len: 3,
            }
        );
    }

    #[test]
    fn offsets_are_characters_not_bytes() {
        let mut text = Rope::from_str("héllo\nwörld");
        let event = DocumentEvent::new(7, 1, "o", 1);
        assert_eq!(LineEdit::analyze(&text, &event).unwrap().first_line, 1);
        event.apply_to(&mut text).unwrap();
        assert_eq!(text.to_string(), "héllo\nworld");
    }
}
