#![warn(missing_docs)]
//! Editor Core Diff - incremental line-level "quick diff" for headless editors
//!
//! # Overview
//!
//! `editor-core-diff` tracks how a live working document differs, line by line, from a reference
//! text (the last saved content, a version-control head, another document). Editors use it to
//! paint change bars in the gutter, show the original text of a changed line, and revert lines or
//! blocks back to the reference.
//!
//! # Core Features
//!
//! - **Full diff in the background**: a per-differ worker thread computes the initial diff
//!   (debounced, cancellable, superseded by newer requests)
//! - **Incremental updates**: every edit re-diffs only a small window around the edited lines
//! - **Per-line queries**: [`LineDiffer::line_info`] answers [`ChangeType`], deleted-line markers
//!   and original text, with a cache for sequential access
//! - **Reverts**: line, block, selection and "restore deleted lines" operations
//! - **Change notifications**: batched added/removed/changed [`DiffRegion`]s
//!
//! # Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  LineDiffer (lifecycle, queries, reverts)   │  ← Public API
//! ├─────────────────────────────────────────────┤
//! │  DiffModel (full + incremental re-diff)     │  ← Diff State
//! ├─────────────────────────────────────────────┤
//! │  Range differencer (Myers via `similar`)    │  ← Algorithm
//! ├─────────────────────────────────────────────┤
//! │  Equivalence classes (line tokens)          │  ← Comparison
//! ├─────────────────────────────────────────────┤
//! │  TextDocument (Rope + version + listeners)  │  ← Text Storage
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use editor_core_diff::{ChangeType, DifferConfig, LineDiffer, StaticReference, TextDocument};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let document = TextDocument::new("a\nb\nc");
//! let differ = LineDiffer::with_config(DifferConfig::default().with_debounce(Duration::ZERO));
//! differ.set_reference_provider(Arc::new(StaticReference::new("a\nb\nc")));
//! differ.connect(&document).unwrap();
//! assert!(differ.wait_until_synchronized(Duration::from_secs(5)));
//!
//! // Insert a line after "b": it shows up as added.
//! document.insert(3, "\ny").unwrap();
//! assert_eq!(differ.line_info(2).unwrap().change_type(), ChangeType::Added);
//!
//! // And reverting it restores the reference.
//! differ.revert_line(2).unwrap();
//! assert_eq!(document.text(), "a\nb\nc");
//! ```
//!
//! # Coordinates
//!
//! Text offsets are **character offsets** (Unicode scalar values). Lines are separated by `\n`
//! only: N newlines make N+1 lines, and a trailing `\r` belongs to the line (it is ignored when
//! comparing lines).

pub mod config;
pub mod differ;
pub mod differencer;
pub mod document;
pub mod equivalence;
pub mod error;
pub mod event;
pub mod model;
pub mod range_difference;
pub mod reference;
pub mod region;
mod revert;
mod text;

pub use config::DifferConfig;
pub use differ::{DiffModelEvent, DiffModelListener, DifferState, LineDiffer, ListenerId};
pub use differencer::find_differences;
pub use document::{DocumentListener, DocumentListenerId, DocumentSnapshot, TextDocument};
pub use equivalence::{EquivalenceClass, LineToken};
pub use error::{ConfigError, DifferError, LocationError, ReferenceError, SnapshotError};
pub use event::{DocumentEvent, LineEdit};
pub use model::{DiffModel, DifferenceDelta, IncrementalFallback};
pub use range_difference::{DifferenceKind, RangeDifference, is_partition};
pub use reference::{
    CancelToken, DocumentReference, FileReference, ReferenceProvider, ReferenceSnapshot,
    StaticReference,
};
pub use region::{ChangeType, DiffRegion};
