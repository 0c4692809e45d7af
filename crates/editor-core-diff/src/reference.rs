//! Reference ("original") text providers.
//!
//! A [`ReferenceProvider`] supplies the baseline the working document is compared against, for
//! example the last saved content or the version-control head. Providers are queried from the
//! differ's background worker and may block; long-running providers should poll the
//! [`CancelToken`] they are handed and bail out with [`ReferenceError::Cancelled`].

use crate::document::TextDocument;
use crate::error::ReferenceError;
use ropey::Rope;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Cooperative cancellation flag for one initialization run.
///
/// A token is cancelled as soon as a newer initialization (or a suspend/disconnect) supersedes
/// the run it was issued for.
#[derive(Debug, Clone)]
pub struct CancelToken {
    current: Arc<AtomicU64>,
    generation: u64,
}

impl CancelToken {
    pub(crate) fn new(current: Arc<AtomicU64>, generation: u64) -> Self {
        Self {
            current,
            generation,
        }
    }

    /// A token that is never cancelled.
    pub fn never() -> Self {
        Self::new(Arc::new(AtomicU64::new(0)), 0)
    }

    /// Returns `true` once the run this token belongs to has been superseded.
    pub fn is_cancelled(&self) -> bool {
        self.current.load(Ordering::SeqCst) != self.generation
    }

    /// Returns [`ReferenceError::Cancelled`] if the token is cancelled.
    pub fn check(&self) -> Result<(), ReferenceError> {
        if self.is_cancelled() {
            Err(ReferenceError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Reference text handed out by a provider.
#[derive(Debug, Clone)]
pub struct ReferenceSnapshot {
    text: Rope,
    document: Option<TextDocument>,
    version: u64,
}

impl ReferenceSnapshot {
    /// A fixed reference text.
    pub fn from_text(text: &str) -> Self {
        Self::from_rope(Rope::from_str(text))
    }

    /// A fixed reference text.
    pub fn from_rope(text: Rope) -> Self {
        Self {
            text,
            document: None,
            version: 0,
        }
    }

    /// The current content of a live reference document.
    ///
    /// The differ watches `document` and reinitializes whenever it is edited.
    pub fn from_document(document: &TextDocument) -> Self {
        let snapshot = document.snapshot();
        Self {
            version: snapshot.version(),
            text: snapshot.into_text(),
            document: Some(document.clone()),
        }
    }

    /// Reference text.
    pub fn text(&self) -> &Rope {
        &self.text
    }

    /// The live document behind the text, if any.
    pub fn document(&self) -> Option<&TextDocument> {
        self.document.as_ref()
    }

    /// Version of [`document`](Self::document) the text was taken at (0 for fixed texts).
    pub fn version(&self) -> u64 {
        self.version
    }
}

/// Source of reference text.
pub trait ReferenceProvider: Send + Sync {
    /// Produces the current reference.
    fn reference(&self, cancel: &CancelToken) -> Result<ReferenceSnapshot, ReferenceError>;

    /// Releases resources; called when the provider is replaced or the differ disconnects.
    fn dispose(&self) {}
}

/// A reference fixed at construction time.
#[derive(Debug, Clone)]
pub struct StaticReference {
    text: Rope,
}

impl StaticReference {
    /// Creates a provider that always answers `text`.
    pub fn new(text: &str) -> Self {
        Self {
            text: Rope::from_str(text),
        }
    }
}

impl ReferenceProvider for StaticReference {
    fn reference(&self, _cancel: &CancelToken) -> Result<ReferenceSnapshot, ReferenceError> {
        Ok(ReferenceSnapshot::from_rope(self.text.clone()))
    }
}

/// A reference backed by another (live) document.
#[derive(Debug, Clone)]
pub struct DocumentReference {
    document: TextDocument,
}

impl DocumentReference {
    /// Uses `document` as reference.
    pub fn new(document: TextDocument) -> Self {
        Self { document }
    }

    /// The reference document.
    pub fn document(&self) -> &TextDocument {
        &self.document
    }
}

impl ReferenceProvider for DocumentReference {
    fn reference(&self, cancel: &CancelToken) -> Result<ReferenceSnapshot, ReferenceError> {
        cancel.check()?;
        Ok(ReferenceSnapshot::from_document(&self.document))
    }
}

/// A reference read from a file on every initialization (e.g. the last saved content).
#[derive(Debug, Clone)]
pub struct FileReference {
    path: PathBuf,
}

impl FileReference {
    /// Reads the reference from `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ReferenceProvider for FileReference {
    fn reference(&self, cancel: &CancelToken) -> Result<ReferenceSnapshot, ReferenceError> {
        cancel.check()?;
        let text = std::fs::read_to_string(&self.path)?;
        cancel.check()?;
        Ok(ReferenceSnapshot::from_text(&text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_token_tracks_generation() {
        let current = Arc::new(AtomicU64::new(3));
        let token = CancelToken::new(current.clone(), 3);
        assert!(!token.is_cancelled());
        current.fetch_add(1, Ordering::SeqCst);
        assert!(token.is_cancelled());
        assert!(matches!(token.check(), Err(ReferenceError::Cancelled)));
        assert!(!CancelToken::never().is_cancelled());
    }

    #[test]
    fn document_reference_snapshots_current_text() {
        let document = TextDocument::new("base");
        let provider = DocumentReference::new(document.clone());
        document.insert(4, "line").unwrap();

        let snapshot = provider.reference(&CancelToken::never()).unwrap();
        assert_eq!(snapshot.text().to_string(), "baseline");
        assert_eq!(snapshot.version(), 1);
        assert!(snapshot.document().unwrap().same_document(&document));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let provider = FileReference::new("/definitely/not/here.txt");
        let err = provider.reference(&CancelToken::never()).unwrap_err();
        assert!(matches!(err, ReferenceError::Io(_)));
    }

    #[test]
    fn file_reference_reads_content() {
        let path = std::env::temp_dir().join(format!(
            "editor-core-diff-reference-{}.txt",
            std::process::id()
        ));
        std::fs::write(&path, "saved\ncontent").unwrap();
        let snapshot = FileReference::new(&path)
            .reference(&CancelToken::never())
            .unwrap();
        assert_eq!(snapshot.text().len_lines(), 2);
        std::fs::remove_file(&path).unwrap();
    }
}
