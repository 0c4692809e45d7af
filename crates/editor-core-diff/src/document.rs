//! Shared, versioned text documents.
//!
//! [`TextDocument`] is a cheaply clonable handle to a rope-backed text buffer. Every edit bumps
//! the document version by one and is announced to registered [`DocumentListener`]s twice: once
//! before the text changes and once after. Both notifications are delivered while the document's
//! write lock is held, so listeners observe edits in order and never interleave with another
//! edit of the same document.
//!
//! Listeners must not edit or snapshot the document they are notified about.

use crate::error::LocationError;
use crate::event::DocumentEvent;
use ropey::Rope;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

/// Observer of document edits.
pub trait DocumentListener: Send + Sync {
    /// Called before `event` is applied; `text` is the pre-edit text.
    fn document_about_to_be_changed(&self, text: &Rope, event: &DocumentEvent);

    /// Called after `event` is applied; `text` is the post-edit text.
    fn document_changed(&self, text: &Rope, event: &DocumentEvent);
}

/// Handle returned by [`TextDocument::add_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentListenerId(u64);

/// An immutable, consistent copy of a document's text at some version.
#[derive(Debug, Clone)]
pub struct DocumentSnapshot {
    text: Rope,
    version: u64,
}

impl DocumentSnapshot {
    /// The text at [`version`](Self::version).
    pub fn text(&self) -> &Rope {
        &self.text
    }

    /// Document version the snapshot was taken at.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Number of lines (N newlines => N+1 lines).
    pub fn line_count(&self) -> usize {
        self.text.len_lines()
    }

    /// Consumes the snapshot, returning its text.
    pub fn into_text(self) -> Rope {
        self.text
    }
}

struct Content {
    text: Rope,
    version: u64,
}

type ListenerEntry = (DocumentListenerId, Arc<dyn DocumentListener>);

struct Inner {
    content: RwLock<Content>,
    listeners: Mutex<Vec<ListenerEntry>>,
    next_listener_id: AtomicU64,
}

/// A shared text document.
///
/// Clones refer to the same document; use [`same_document`](Self::same_document) to compare
/// identities.
#[derive(Clone)]
pub struct TextDocument {
    inner: Arc<Inner>,
}

impl TextDocument {
    /// Creates a document holding `text` at version 0.
    pub fn new(text: &str) -> Self {
        Self::from_rope(Rope::from_str(text))
    }

    /// Creates a document from an existing rope.
    pub fn from_rope(text: Rope) -> Self {
        Self {
            inner: Arc::new(Inner {
                content: RwLock::new(Content { text, version: 0 }),
                listeners: Mutex::new(Vec::new()),
                next_listener_id: AtomicU64::new(1),
            }),
        }
    }

    /// Returns `true` if both handles refer to the same document.
    pub fn same_document(&self, other: &TextDocument) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Current version (number of edits applied so far).
    pub fn version(&self) -> u64 {
        self.read().version
    }

    /// Full text as a `String`.
    pub fn text(&self) -> String {
        self.read().text.to_string()
    }

    /// Number of chars in the document.
    pub fn char_count(&self) -> usize {
        self.read().text.len_chars()
    }

    /// Number of lines (N newlines => N+1 lines).
    pub fn line_count(&self) -> usize {
        self.read().text.len_lines()
    }

    /// Text of `line` without its line delimiter.
    pub fn line_text(&self, line: usize) -> Option<String> {
        let content = self.read();
        (line < content.text.len_lines()).then(|| crate::text::line_string(&content.text, line))
    }

    /// Takes a consistent snapshot of text and version.
    pub fn snapshot(&self) -> DocumentSnapshot {
        let content = self.read();
        DocumentSnapshot {
            text: content.text.clone(),
            version: content.version,
        }
    }

    /// Replaces `len` chars at `offset` with `text`.
    ///
    /// An empty replacement (nothing removed, nothing inserted) is a no-op and does not bump the
    /// version.
    pub fn replace(&self, offset: usize, len: usize, text: &str) -> Result<(), LocationError> {
        self.apply(None, offset, len, text)
    }

    /// Like [`replace`](Self::replace), but fails with
    /// [`LocationError::ConcurrentModification`] unless the document is still at
    /// `expected_version`.
    pub fn replace_if_version(
        &self,
        expected_version: u64,
        offset: usize,
        len: usize,
        text: &str,
    ) -> Result<(), LocationError> {
        self.apply(Some(expected_version), offset, len, text)
    }

    /// Inserts `text` at `offset`.
    pub fn insert(&self, offset: usize, text: &str) -> Result<(), LocationError> {
        self.replace(offset, 0, text)
    }

    /// Deletes `len` chars at `offset`.
    pub fn delete(&self, offset: usize, len: usize) -> Result<(), LocationError> {
        self.replace(offset, len, "")
    }

    /// Replaces the whole text.
    pub fn set_text(&self, text: &str) -> Result<(), LocationError> {
        let mut content = self.write();
        let len = content.text.len_chars();
        self.apply_locked(&mut content, 0, len, text)
    }

    /// Registers a listener; it is notified of every subsequent edit.
    pub fn add_listener(&self, listener: Arc<dyn DocumentListener>) -> DocumentListenerId {
        let id = DocumentListenerId(self.inner.next_listener_id.fetch_add(1, Ordering::Relaxed));
        self.listeners().push((id, listener));
        id
    }

    /// Unregisters a listener. Returns `false` if it was not registered.
    pub fn remove_listener(&self, id: DocumentListenerId) -> bool {
        let mut listeners = self.listeners();
        let before = listeners.len();
        listeners.retain(|(listener_id, _)| *listener_id != id);
        listeners.len() != before
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners().len()
    }

    fn apply(
        &self,
        expected_version: Option<u64>,
        offset: usize,
        len: usize,
        text: &str,
    ) -> Result<(), LocationError> {
        let mut content = self.write();
        if let Some(expected) = expected_version
            && content.version != expected
        {
            return Err(LocationError::ConcurrentModification {
                expected,
                actual: content.version,
            });
        }
        self.apply_locked(&mut content, offset, len, text)
    }

    fn apply_locked(
        &self,
        content: &mut Content,
        offset: usize,
        len: usize,
        text: &str,
    ) -> Result<(), LocationError> {
        let char_count = content.text.len_chars();
        if offset.checked_add(len).is_none_or(|end| end > char_count) {
            return Err(LocationError::InvalidRange {
                start: offset,
                end: offset.saturating_add(len),
                len: char_count,
            });
        }
        if len == 0 && text.is_empty() {
            return Ok(());
        }

        let event = DocumentEvent::new(offset, len, text, content.version + 1);
        let listeners: Vec<Arc<dyn DocumentListener>> = self
            .listeners()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        for listener in &listeners {
            listener.document_about_to_be_changed(&content.text, &event);
        }
        event.apply_to(&mut content.text)?;
        content.version = event.version;
        for listener in &listeners {
            listener.document_changed(&content.text, &event);
        }
        Ok(())
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Content> {
        self.inner
            .content
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Content> {
        self.inner
            .content
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn listeners(&self) -> std::sync::MutexGuard<'_, Vec<ListenerEntry>> {
        self.inner
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for TextDocument {
    fn default() -> Self {
        Self::new("")
    }
}

impl fmt::Debug for TextDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let content = self.read();
        f.debug_struct("TextDocument")
            .field("version", &content.version)
            .field("chars", &content.text.len_chars())
            .field("lines", &content.text.len_lines())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<String>>,
    }

    impl DocumentListener for Recorder {
        fn document_about_to_be_changed(&self, text: &Rope, event: &DocumentEvent) {
            self.calls
                .lock()
                .unwrap()
                .push(format!("before v{} {:?}", event.version, text.to_string()));
        }

        fn document_changed(&self, text: &Rope, event: &DocumentEvent) {
            self.calls
                .lock()
                .unwrap()
                .push(format!("after v{} {:?}", event.version, text.to_string()));
        }
    }

    #[test]
    fn edits_bump_version_and_notify_twice() {
        let doc = TextDocument::new("a\nb");
        let recorder = Arc::new(Recorder::default());
        doc.add_listener(recorder.clone());

        doc.replace(2, 1, "x").unwrap();
        assert_eq!(doc.text(), "a\nx");
        assert_eq!(doc.version(), 1);
        assert_eq!(
            *recorder.calls.lock().unwrap(),
            vec![
                "before v1 \"a\\nb\"".to_string(),
                "after v1 \"a\\nx\"".to_string()
            ]
        );
    }

    #[test]
    fn empty_replacement_is_a_noop() {
        let doc = TextDocument::new("abc");
        doc.replace(1, 0, "").unwrap();
        assert_eq!(doc.version(), 0);
    }

    #[test]
    fn invalid_range_is_rejected() {
        let doc = TextDocument::new("abc");
        assert_eq!(
            doc.delete(2, 2),
            Err(LocationError::InvalidRange {
                start: 2,
                end: 4,
                len: 3,
            })
        );
        assert_eq!(doc.version(), 0);
    }

    #[test]
    fn replace_if_version_detects_concurrent_edits() {
        let doc = TextDocument::new("abc");
        let snapshot = doc.snapshot();
        doc.insert(0, "z").unwrap();
        assert_eq!(
            doc.replace_if_version(snapshot.version(), 0, 1, "y"),
            Err(LocationError::ConcurrentModification {
                expected: 0,
                actual: 1,
            })
        );
        doc.replace_if_version(1, 0, 1, "y").unwrap();
        assert_eq!(doc.text(), "yabc");
    }

    #[test]
    fn removed_listener_is_not_notified() {
        let doc = TextDocument::new("");
        let recorder = Arc::new(Recorder::default());
        let id = doc.add_listener(recorder.clone());
        assert!(doc.remove_listener(id));
        assert!(!doc.remove_listener(id));
        doc.insert(0, "x").unwrap();
        assert!(recorder.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn snapshot_is_unaffected_by_later_edits() {
        let doc = TextDocument::new("one\ntwo");
        let snapshot = doc.snapshot();
        doc.set_text("three").unwrap();
        assert_eq!(snapshot.text().to_string(), "one\ntwo");
        assert_eq!(snapshot.line_count(), 2);
        assert_eq!(doc.line_text(0).as_deref(), Some("three"));
        assert_eq!(doc.line_text(1), None);
    }
}
