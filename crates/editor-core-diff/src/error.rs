//! Error types for documents, reference providers and the line differ.

use thiserror::Error;

/// A location (character range, line or version) that does not fit the current document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    /// The character range lies outside the document.
    #[error("invalid range {start}..{end} (document has {len} chars)")]
    InvalidRange {
        /// Range start (char offset).
        start: usize,
        /// Range end (char offset, exclusive).
        end: usize,
        /// Document length in chars.
        len: usize,
    },

    /// The line index lies outside the document.
    #[error("invalid line {line} (document has {line_count} lines)")]
    InvalidLine {
        /// Requested line index.
        line: usize,
        /// Number of lines in the document.
        line_count: usize,
    },

    /// The document was modified between reading it and applying an edit.
    #[error("document changed concurrently (expected version {expected}, found {actual})")]
    ConcurrentModification {
        /// Version the edit was computed against.
        expected: u64,
        /// Version found when applying it.
        actual: u64,
    },
}

/// Failure to produce a reference snapshot.
#[derive(Debug, Error)]
pub enum ReferenceError {
    /// The provider has no reference content (e.g. an untracked file).
    #[error("reference unavailable: {0}")]
    Unavailable(String),

    /// The request was cancelled because a newer initialization superseded it.
    #[error("reference request cancelled")]
    Cancelled,

    /// Reading the reference failed.
    #[error("failed to read reference: {0}")]
    Io(#[from] std::io::Error),
}

/// Why the differ could not take a consistent snapshot of both texts.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// No reference provider is configured.
    #[error("no reference provider configured")]
    NoProvider,

    /// The provider failed.
    #[error(transparent)]
    Reference(#[from] ReferenceError),
}

/// Errors returned by [`LineDiffer`](crate::LineDiffer) operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DifferError {
    /// The differ is not synchronized with the working document.
    #[error("line differ is not synchronized")]
    NotSynchronized,

    /// No working document is connected.
    #[error("no document connected")]
    NotConnected,

    /// The differ is already connected to another document.
    #[error("line differ is connected to a different document")]
    DocumentMismatch,

    /// A line or range argument does not fit the working document.
    #[error(transparent)]
    Location(#[from] LocationError),
}

/// Invalid differ configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration could not be parsed.
    #[error("failed to parse differ configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// A parsed value is out of range.
    #[error("invalid value for `{field}`: {reason}")]
    InvalidValue {
        /// Offending field.
        field: &'static str,
        /// Why it is rejected.
        reason: &'static str,
    },
}
