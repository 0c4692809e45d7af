use ropey::{Rope, RopeSlice};

// Only LF breaks lines (ropey is built without `cr_lines`), so N newlines => N+1 lines and a
// CRLF line keeps its `\r` in the slice returned here.
pub(crate) fn line_slice(text: &Rope, line: usize) -> RopeSlice<'_> {
    let slice = text.line(line);
    let len = slice.len_chars();
    if len > 0 && slice.char(len - 1) == '\n' {
        slice.slice(..len - 1)
    } else {
        slice
    }
}

pub(crate) fn line_string(text: &Rope, line: usize) -> String {
    line_slice(text, line).to_string()
}

/// Lines `start..end` of `text` without delimiters, clamped to the text.
pub(crate) fn lines(text: &Rope, start: usize, end: usize) -> Vec<String> {
    let end = end.min(text.len_lines());
    (start.min(end)..end)
        .map(|line| line_string(text, line))
        .collect()
}
