//! Line equivalence classes.
//!
//! Every line is reduced to a [`LineToken`] (content hash plus length) so that the differencer
//! compares small fixed-size values instead of strings. Line delimiters never take part in the
//! comparison: `"a\r\n"`, `"a\n"` and a final `"a"` all map to the same token.

use crate::event::LineEdit;
use ropey::{Rope, RopeSlice};
use std::collections::hash_map::DefaultHasher;
use std::hash::Hasher;

/// Comparison key of one line.
///
/// Two lines with equal text always have equal tokens. Unequal lines collide only if both the
/// 64-bit hash and the length agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LineToken {
    hash: u64,
    len: u32,
}

impl LineToken {
    /// Token of a line given as a string (a trailing `\r` is ignored).
    pub fn of_str(line: &str) -> Self {
        let line = line.strip_suffix('\n').unwrap_or(line);
        let line = line.strip_suffix('\r').unwrap_or(line);
        let mut hasher = DefaultHasher::new();
        hasher.write(line.as_bytes());
        Self {
            hash: hasher.finish(),
            len: clamp_len(line.chars().count()),
        }
    }

    /// Token of a rope line (its delimiter, if present, is ignored).
    pub fn of_slice(line: RopeSlice<'_>) -> Self {
        let mut len = line.len_chars();
        if len > 0 && line.char(len - 1) == '\n' {
            len -= 1;
        }
        if len > 0 && line.char(len - 1) == '\r' {
            len -= 1;
        }
        let content = line.slice(..len);
        // `Hasher::write` on a streaming hasher is independent of how the bytes are split, so
        // rope chunk boundaries do not change the token.
        let mut hasher = DefaultHasher::new();
        for chunk in content.chunks() {
            hasher.write(chunk.as_bytes());
        }
        Self {
            hash: hasher.finish(),
            len: clamp_len(len),
        }
    }

    /// Token of line `line` of `text`.
    pub fn of_line(text: &Rope, line: usize) -> Self {
        Self::of_slice(text.line(line))
    }

    /// Content hash.
    pub fn hash_value(&self) -> u64 {
        self.hash
    }

    /// Line length in chars, without delimiter (saturates at `u32::MAX`).
    pub fn char_len(&self) -> usize {
        self.len as usize
    }
}

fn clamp_len(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}

/// Per-line tokens of one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EquivalenceClass {
    tokens: Vec<LineToken>,
}

impl EquivalenceClass {
    /// Tokenizes every line of `text`.
    pub fn from_rope(text: &Rope) -> Self {
        Self {
            tokens: text.lines().map(LineToken::of_slice).collect(),
        }
    }

    /// Tokenizes every line of `text`.
    pub fn from_text(text: &str) -> Self {
        Self::from_rope(&Rope::from_str(text))
    }

    /// Number of lines.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Returns `true` if the class holds no lines (never the case for a tokenized document).
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Token of `line`.
    pub fn token(&self, line: usize) -> Option<LineToken> {
        self.tokens.get(line).copied()
    }

    /// All tokens in line order.
    pub fn tokens(&self) -> &[LineToken] {
        &self.tokens
    }

    /// Re-tokenizes the lines touched by `edit`; `after` is the post-edit text.
    ///
    /// Lines outside the edit keep their tokens and only shift position.
    pub fn update(&mut self, after: &Rope, edit: &LineEdit) {
        let removed_end = (edit.first_line + edit.removed_lines).min(self.tokens.len());
        let first_line = edit.first_line.min(removed_end);
        let inserted_end = edit.inserted_end().min(after.len_lines());
        self.tokens.splice(
            first_line..removed_end,
            (first_line..inserted_end).map(|line| LineToken::of_line(after, line)),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::DocumentEvent;

    #[test]
    fn delimiters_do_not_affect_tokens() {
        let text = Rope::from_str("a\r\na\na");
        let class = EquivalenceClass::from_rope(&text);
        assert_eq!(class.len(), 3);
        assert_eq!(class.token(0), class.token(1));
        assert_eq!(class.token(1), class.token(2));
        assert_eq!(class.token(0), Some(LineToken::of_str("a")));
        assert_eq!(LineToken::of_str("a\r\n"), LineToken::of_str("a"));
    }

    #[test]
    fn tokens_distinguish_content_and_length() {
        let a = LineToken::of_str("abc");
        let b = LineToken::of_str("abd");
        assert_ne!(a, b);
        assert_eq!(a.char_len(), 3);
        assert_eq!(LineToken::of_str("").char_len(), 0);
    }

    #[test]
    fn rope_chunking_does_not_change_tokens() {
        let long_line = "x".repeat(5000);
        let mut text = Rope::from_str(&long_line);
        text.insert(2500, "");
        assert_eq!(LineToken::of_line(&text, 0), LineToken::of_str(&long_line));
    }

    #[test]
    fn update_matches_full_tokenization() {
        let mut text = Rope::from_str("one\ntwo\nthree\nfour");
        let mut class = EquivalenceClass::from_rope(&text);

        let edits = [
            DocumentEvent::new(4, 3, "2\n2.5", 1),
            DocumentEvent::new(0, 8, "", 2),
            DocumentEvent::new(0, 0, "zero\n", 3),
        ];
        for event in &edits {
            let edit = LineEdit::analyze(&text, event).unwrap();
            event.apply_to(&mut text).unwrap();
            class.update(&text, &edit);
            assert_eq!(class, EquivalenceClass::from_rope(&text));
        }
    }
}
