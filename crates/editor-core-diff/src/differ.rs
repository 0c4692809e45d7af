//! The line differ.
//!
//! [`LineDiffer`] keeps a [`DiffModel`] in sync with a live working [`TextDocument`] and a
//! reference supplied by a [`ReferenceProvider`].
//!
//! # States
//!
//! - [`DifferState::Suspended`]: not tracking (not connected, or [`LineDiffer::suspend`]ed).
//!   [`LineDiffer::line_info`] answers a single synthetic changed line.
//! - [`DifferState::Initializing`]: a full diff is pending on the background worker. Queries
//!   answer nothing; working-document edits are queued and replayed by the worker before it
//!   publishes.
//! - [`DifferState::Synchronized`]: queries are answered from the model, and every edit updates
//!   it incrementally on the editing thread.
//!
//! # Threading
//!
//! Each differ owns at most one worker thread, spawned on first use. Initialization requests
//! carry a generation number; a newer request supersedes older ones, and a superseded run
//! publishes nothing. Requests arriving within the configured debounce delay are coalesced.
//!
//! Locks are always taken in the order *document, then differ*: document notifications arrive
//! with the document locked, while the worker snapshots documents without holding the differ
//! lock. Change listeners run with no differ lock held, but may run while the working document
//! is locked, so they must not edit it.

use crate::config::DifferConfig;
use crate::document::{DocumentListener, DocumentListenerId, TextDocument};
use crate::error::{ConfigError, DifferError, LocationError, SnapshotError};
use crate::event::{DocumentEvent, LineEdit};
use crate::model::{DiffModel, DifferenceDelta};
use crate::range_difference::RangeDifference;
use crate::reference::{CancelToken, ReferenceProvider, ReferenceSnapshot};
use crate::region::DiffRegion;
use ropey::Rope;
use std::fmt;
use std::mem;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError, Weak};
use std::thread;
use std::time::Duration;

/// Lifecycle state of a [`LineDiffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DifferState {
    /// Not tracking edits.
    Suspended,
    /// A full diff is pending.
    Initializing,
    /// The model matches the working document.
    Synchronized,
}

/// Batched change notification.
///
/// Incremental updates report the entries replaced around the edit (`removed`/`added`) and the
/// entries that merely moved (`changed`). Full (re)initializations report `reset`, with the whole
/// previous model in `removed` and the whole new model in `added`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffModelEvent {
    /// Regions that appeared.
    pub added: Vec<DiffRegion>,
    /// Regions that disappeared.
    pub removed: Vec<DiffRegion>,
    /// Regions that moved without changing.
    pub changed: Vec<DiffRegion>,
    /// Whether the whole model was replaced.
    pub reset: bool,
}

impl DiffModelEvent {
    /// Returns `true` if nothing changed.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }

    fn reset(
        old: &[RangeDifference],
        old_reference: Option<Rope>,
        new: &[RangeDifference],
        new_reference: Option<Rope>,
    ) -> Self {
        Self {
            added: regions(new, &new_reference),
            removed: regions(old, &old_reference),
            changed: Vec::new(),
            reset: true,
        }
    }

    fn from_delta(delta: &DifferenceDelta, reference: &Option<Rope>) -> Self {
        Self {
            added: regions(&delta.added, reference),
            removed: regions(&delta.removed, reference),
            changed: regions(&delta.changed, reference),
            reset: false,
        }
    }
}

fn regions(differences: &[RangeDifference], reference: &Option<Rope>) -> Vec<DiffRegion> {
    differences
        .iter()
        .map(|difference| DiffRegion::for_difference(*difference, reference.clone()))
        .collect()
}

/// Callback receiving [`DiffModelEvent`]s.
pub type DiffModelListener = Arc<dyn Fn(&DiffModelEvent) + Send + Sync>;

/// Handle returned by [`LineDiffer::add_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct Attachment {
    document: TextDocument,
    listener: DocumentListenerId,
}

impl Attachment {
    fn detach(self) {
        self.document.remove_listener(self.listener);
    }
}

struct PendingEdit {
    edit: LineEdit,
    version: u64,
}

pub(crate) struct Core {
    state: DifferState,
    suspended: bool,
    // Set when the last initialization failed; edits are not queued until the next request.
    stalled: bool,
    connections: usize,
    working: Option<Attachment>,
    provider: Option<Arc<dyn ReferenceProvider>>,
    reference_watch: Option<Attachment>,
    pub(crate) model: DiffModel,
    pub(crate) reference: Option<Rope>,
    pub(crate) synced_version: u64,
    pending: Option<PendingEdit>,
    queued: Vec<DocumentEvent>,
    last_index: usize,
}

impl Core {
    pub(crate) fn state(&self) -> DifferState {
        self.state
    }

    pub(crate) fn working_document(&self) -> Option<&TextDocument> {
        self.working.as_ref().map(|attachment| &attachment.document)
    }
}

pub(crate) struct Shared {
    config: DifferConfig,
    core: Mutex<Core>,
    synchronized: Condvar,
    generation: Arc<AtomicU64>,
    listeners: Mutex<Vec<(ListenerId, DiffModelListener)>>,
    next_listener_id: AtomicU64,
    worker: Mutex<Option<mpsc::Sender<u64>>>,
}

/// Incremental line differ between a working document and a reference.
///
/// Clones share the same differ.
///
/// ```
/// use editor_core_diff::{ChangeType, DifferConfig, LineDiffer, StaticReference, TextDocument};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let document = TextDocument::new("a\nx\nc");
/// let differ = LineDiffer::with_config(DifferConfig::default().with_debounce(Duration::ZERO));
/// differ.set_reference_provider(Arc::new(StaticReference::new("a\nb\nc")));
/// differ.connect(&document).unwrap();
/// assert!(differ.wait_until_synchronized(Duration::from_secs(5)));
///
/// let info = differ.line_info(1).unwrap();
/// assert_eq!(info.change_type(), ChangeType::Changed);
/// assert_eq!(info.original_text(), vec!["b".to_string()]);
/// ```
#[derive(Clone)]
pub struct LineDiffer {
    pub(crate) shared: Arc<Shared>,
}

impl LineDiffer {
    /// Creates a suspended, unconnected differ with default configuration.
    pub fn new() -> Self {
        Self::with_config(DifferConfig::default())
    }

    /// Creates a suspended, unconnected differ after checking `config` with
    /// [`DifferConfig::validate`].
    pub fn try_with_config(config: DifferConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::with_config(config))
    }

    /// Creates a suspended, unconnected differ.
    ///
    /// `config` is taken as is; [`try_with_config`](Self::try_with_config) validates it first.
    /// A zero `max_window_lines` makes every edit fall back to a full reinitialization.
    pub fn with_config(config: DifferConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                config,
                core: Mutex::new(Core {
                    state: DifferState::Suspended,
                    suspended: false,
                    stalled: false,
                    connections: 0,
                    working: None,
                    provider: None,
                    reference_watch: None,
                    model: DiffModel::default(),
                    reference: None,
                    synced_version: 0,
                    pending: None,
                    queued: Vec::new(),
                    last_index: 0,
                }),
                synchronized: Condvar::new(),
                generation: Arc::new(AtomicU64::new(0)),
                listeners: Mutex::new(Vec::new()),
                next_listener_id: AtomicU64::new(1),
                worker: Mutex::new(None),
            }),
        }
    }

    /// The configuration.
    pub fn config(&self) -> &DifferConfig {
        &self.shared.config
    }

    /// Sets the reference provider and reinitializes.
    ///
    /// The previous provider, if any, is disposed.
    pub fn set_reference_provider(&self, provider: Arc<dyn ReferenceProvider>) {
        let (previous, generation) = {
            let mut core = self.shared.lock_core();
            let previous = core.provider.replace(Arc::clone(&provider));
            (previous, self.shared.begin_initialize(&mut core))
        };
        if let Some(previous) = previous
            && !Arc::ptr_eq(&previous, &provider)
        {
            previous.dispose();
        }
        if let Some(generation) = generation {
            self.shared.schedule(generation);
        }
    }

    /// The current reference provider.
    pub fn reference_provider(&self) -> Option<Arc<dyn ReferenceProvider>> {
        self.shared.lock_core().provider.clone()
    }

    /// Connects the working document.
    ///
    /// Connections are counted: connecting the same document again only bumps the count.
    /// The first connection starts tracking and requests an initialization.
    pub fn connect(&self, document: &TextDocument) -> Result<(), DifferError> {
        let generation = {
            let mut core = self.shared.lock_core();
            if let Some(working) = &core.working {
                if !working.document.same_document(document) {
                    return Err(DifferError::DocumentMismatch);
                }
                core.connections += 1;
                return Ok(());
            }
            let listener = document.add_listener(Arc::new(WorkingListener {
                shared: Arc::downgrade(&self.shared),
            }));
            core.working = Some(Attachment {
                document: document.clone(),
                listener,
            });
            core.connections = 1;
            tracing::debug!("line differ connected");
            self.shared.begin_initialize(&mut core)
        };
        if let Some(generation) = generation {
            self.shared.schedule(generation);
        }
        Ok(())
    }

    /// Drops one connection of `document`.
    ///
    /// The last disconnect stops tracking, clears the model and disposes the reference provider.
    pub fn disconnect(&self, document: &TextDocument) -> Result<(), DifferError> {
        let (event, provider) = {
            let mut core = self.shared.lock_core();
            match &core.working {
                Some(working) if working.document.same_document(document) => {}
                Some(_) => return Err(DifferError::DocumentMismatch),
                None => return Err(DifferError::NotConnected),
            }
            core.connections -= 1;
            if core.connections > 0 {
                return Ok(());
            }
            if let Some(working) = core.working.take() {
                working.detach();
            }
            tracing::debug!("line differ disconnected");
            let event = self.shared.enter_suspended(&mut core);
            (event, core.provider.take())
        };
        if let Some(provider) = provider {
            provider.dispose();
        }
        self.shared.fire(&event);
        Ok(())
    }

    /// Number of active connections.
    pub fn connection_count(&self) -> usize {
        self.shared.lock_core().connections
    }

    /// Returns `true` while a document is connected.
    pub fn is_connected(&self) -> bool {
        self.shared.lock_core().working.is_some()
    }

    /// Stops tracking edits until [`resume`](Self::resume); the provider and connection stay.
    pub fn suspend(&self) {
        let event = {
            let mut core = self.shared.lock_core();
            if core.suspended {
                return;
            }
            core.suspended = true;
            tracing::debug!("line differ suspended");
            self.shared.enter_suspended(&mut core)
        };
        self.shared.fire(&event);
    }

    /// Resumes tracking and reinitializes.
    pub fn resume(&self) {
        let generation = {
            let mut core = self.shared.lock_core();
            if !core.suspended {
                return;
            }
            core.suspended = false;
            tracing::debug!("line differ resumed");
            self.shared.begin_initialize(&mut core)
        };
        if let Some(generation) = generation {
            self.shared.schedule(generation);
        }
    }

    /// Returns `true` if [`suspend`](Self::suspend)ed.
    pub fn is_suspended(&self) -> bool {
        self.shared.lock_core().suspended
    }

    /// Requests a full reinitialization (debounced, runs on the worker).
    pub fn initialize(&self) {
        self.shared.request_initialize();
    }

    /// Current state.
    pub fn state(&self) -> DifferState {
        self.shared.lock_core().state
    }

    /// Returns `true` in [`DifferState::Synchronized`].
    pub fn is_synchronized(&self) -> bool {
        self.state() == DifferState::Synchronized
    }

    /// Blocks until the differ is synchronized or `timeout` elapses.
    pub fn wait_until_synchronized(&self, timeout: Duration) -> bool {
        let core = self.shared.lock_core();
        let (core, _) = self
            .shared
            .synchronized
            .wait_timeout_while(core, timeout, |core| {
                core.state != DifferState::Synchronized
            })
            .unwrap_or_else(PoisonError::into_inner);
        core.state == DifferState::Synchronized
    }

    /// Diff information for working line `line`.
    ///
    /// Returns the synthetic changed placeholder while suspended and `None` while initializing
    /// or when `line` is past the end of the working document.
    pub fn line_info(&self, line: usize) -> Option<DiffRegion> {
        let mut core = self.shared.lock_core();
        match core.state {
            DifferState::Suspended => Some(DiffRegion::suspended()),
            DifferState::Initializing => None,
            DifferState::Synchronized => {
                let index = core.model.index_of_working_line(line, core.last_index)?;
                core.last_index = index;
                Some(DiffRegion::for_line(
                    core.model.differences(),
                    index,
                    line,
                    core.reference.clone(),
                ))
            }
        }
    }

    /// Snapshot of the aligned ranges (empty unless synchronized).
    pub fn differences(&self) -> Vec<RangeDifference> {
        let core = self.shared.lock_core();
        if core.state == DifferState::Synchronized {
            core.model.differences().to_vec()
        } else {
            Vec::new()
        }
    }

    /// Registers a change listener.
    ///
    /// A panicking listener is logged and skipped; it does not affect other listeners.
    pub fn add_listener<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&DiffModelEvent) + Send + Sync + 'static,
    {
        let id = ListenerId(self.shared.next_listener_id.fetch_add(1, Ordering::Relaxed));
        self.shared
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(listener)));
        id
    }

    /// Unregisters a change listener. Returns `false` if it was not registered.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self
            .shared
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let before = listeners.len();
        listeners.retain(|(listener_id, _)| *listener_id != id);
        listeners.len() != before
    }
}

impl Default for LineDiffer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for LineDiffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let core = self.shared.lock_core();
        f.debug_struct("LineDiffer")
            .field("state", &core.state)
            .field("connections", &core.connections)
            .field("differences", &core.model.differences().len())
            .finish()
    }
}

impl Shared {
    pub(crate) fn lock_core(&self) -> MutexGuard<'_, Core> {
        self.core.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Moves to `Initializing` and returns the new generation, unless tracking is off.
    fn begin_initialize(&self, core: &mut Core) -> Option<u64> {
        if core.suspended || core.working.is_none() {
            return None;
        }
        core.state = DifferState::Initializing;
        core.stalled = false;
        core.pending = None;
        core.queued.clear();
        Some(self.generation.fetch_add(1, Ordering::SeqCst) + 1)
    }

    fn request_initialize(self: &Arc<Self>) {
        let generation = {
            let mut core = self.lock_core();
            self.begin_initialize(&mut core)
        };
        if let Some(generation) = generation {
            self.schedule(generation);
        }
    }

    fn enter_suspended(&self, core: &mut Core) -> DiffModelEvent {
        self.generation.fetch_add(1, Ordering::SeqCst);
        core.state = DifferState::Suspended;
        core.stalled = false;
        core.pending = None;
        core.queued.clear();
        core.last_index = 0;
        if let Some(watch) = core.reference_watch.take() {
            watch.detach();
        }
        let old = mem::take(&mut core.model);
        let old_reference = core.reference.take();
        DiffModelEvent::reset(old.differences(), old_reference, &[], None)
    }

    fn schedule(self: &Arc<Self>, generation: u64) {
        let mut worker = self.worker.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(requests) = worker.as_ref()
            && requests.send(generation).is_ok()
        {
            return;
        }

        let (requests, inbox) = mpsc::channel();
        let shared = Arc::downgrade(self);
        let debounce = self.config.debounce();
        let spawned = thread::Builder::new()
            .name("editor-core-diff".into())
            .spawn(move || worker_loop(shared, inbox, debounce));
        match spawned {
            Ok(_) => {
                // The receiver is alive in the new thread, so this cannot fail.
                let _ = requests.send(generation);
                *worker = Some(requests);
            }
            Err(err) => {
                tracing::warn!(%err, "could not spawn diff worker; initializing inline");
                drop(worker);
                self.run_initialization(generation);
            }
        }
    }

    fn run_initialization(self: &Arc<Self>, generation: u64) {
        let cancel = CancelToken::new(Arc::clone(&self.generation), generation);
        let (document, provider) = {
            let core = self.lock_core();
            if cancel.is_cancelled() {
                return;
            }
            let Some(working) = &core.working else {
                return;
            };
            (working.document.clone(), core.provider.clone())
        };
        tracing::debug!(generation, "initializing line differ");

        // Snapshot the working text before fetching the reference: edits made while the
        // provider runs are queued and replayed on top of this copy.
        let snapshot = document.snapshot();
        let reference = match provider {
            Some(provider) => provider.reference(&cancel).map_err(SnapshotError::from),
            None => Err(SnapshotError::NoProvider),
        };
        if cancel.is_cancelled() {
            tracing::debug!(generation, "initialization superseded");
            return;
        }
        let reference = match reference {
            Ok(reference) => reference,
            Err(err) => {
                self.fail_initialization(generation, &err);
                return;
            }
        };

        let mut version = snapshot.version();
        let mut working = snapshot.into_text();
        let mut model = DiffModel::new(reference.text(), &working);

        loop {
            if cancel.is_cancelled() {
                tracing::debug!(generation, "initialization superseded");
                return;
            }
            let queued = {
                let mut core = self.lock_core();
                if cancel.is_cancelled() {
                    return;
                }
                let queued: Vec<DocumentEvent> = core
                    .queued
                    .drain(..)
                    .filter(|event| event.version > version)
                    .collect();
                if queued.is_empty() {
                    let event = self.publish(&mut core, model, &reference, version);
                    drop(core);
                    self.fire(&event);
                    self.synchronized.notify_all();
                    if let Some(document) = reference.document()
                        && document.version() != reference.version()
                    {
                        tracing::debug!("reference changed during initialization");
                        self.request_initialize();
                    }
                    return;
                }
                queued
            };

            tracing::trace!(generation, edits = queued.len(), "replaying queued edits");
            for event in &queued {
                if let Err(err) = replay(
                    &mut model,
                    &mut working,
                    &mut version,
                    reference.text(),
                    event,
                    &self.config,
                ) {
                    tracing::warn!(%err, generation, "queued edits do not apply; restarting");
                    self.request_initialize();
                    return;
                }
            }
        }
    }

    fn publish(
        self: &Arc<Self>,
        core: &mut Core,
        model: DiffModel,
        reference: &ReferenceSnapshot,
        version: u64,
    ) -> DiffModelEvent {
        self.watch_reference(core, reference.document());
        let old = mem::replace(&mut core.model, model);
        let old_reference = core.reference.replace(reference.text().clone());
        core.synced_version = version;
        core.state = DifferState::Synchronized;
        core.pending = None;
        core.last_index = 0;
        tracing::debug!(
            version,
            differences = core.model.differences().len(),
            "line differ synchronized"
        );
        DiffModelEvent::reset(
            old.differences(),
            old_reference,
            core.model.differences(),
            core.reference.clone(),
        )
    }

    fn fail_initialization(&self, generation: u64, err: &SnapshotError) {
        tracing::warn!(%err, generation, "reference unavailable; diff model cleared");
        let event = {
            let mut core = self.lock_core();
            if self.generation.load(Ordering::SeqCst) != generation {
                return;
            }
            core.stalled = true;
            core.queued.clear();
            core.last_index = 0;
            if let Some(watch) = core.reference_watch.take() {
                watch.detach();
            }
            let old = mem::take(&mut core.model);
            let old_reference = core.reference.take();
            DiffModelEvent::reset(old.differences(), old_reference, &[], None)
        };
        self.fire(&event);
    }

    fn watch_reference(self: &Arc<Self>, core: &mut Core, document: Option<&TextDocument>) {
        if let (Some(watch), Some(document)) = (&core.reference_watch, document)
            && watch.document.same_document(document)
        {
            return;
        }
        if let Some(watch) = core.reference_watch.take() {
            watch.detach();
        }
        if let Some(document) = document {
            let listener = document.add_listener(Arc::new(ReferenceListener {
                shared: Arc::downgrade(self),
            }));
            core.reference_watch = Some(Attachment {
                document: document.clone(),
                listener,
            });
        }
    }

    fn before_edit(&self, text: &Rope, event: &DocumentEvent) {
        let mut core = self.lock_core();
        core.pending = None;
        if core.state != DifferState::Synchronized {
            return;
        }
        match LineEdit::analyze(text, event) {
            Ok(edit) => {
                core.pending = Some(PendingEdit {
                    edit,
                    version: event.version,
                });
            }
            Err(err) => tracing::warn!(%err, "edit does not fit the working document"),
        }
    }

    fn after_edit(self: &Arc<Self>, text: &Rope, event: &DocumentEvent) {
        let (update, generation) = {
            let mut core = self.lock_core();
            let pending = core.pending.take();
            match core.state {
                DifferState::Suspended => return,
                DifferState::Initializing => {
                    if !core.stalled {
                        core.queued.push(event.clone());
                    }
                    return;
                }
                DifferState::Synchronized => {}
            }

            let expected = core.synced_version + 1;
            match pending {
                Some(pending) if pending.version == event.version && event.version == expected => {
                    core.synced_version = event.version;
                    match core.model.apply_edit(&pending.edit, text, &self.config) {
                        Ok(delta) => (
                            Some(DiffModelEvent::from_delta(&delta, &core.reference)),
                            None,
                        ),
                        Err(fallback) => {
                            tracing::debug!(
                                ?fallback,
                                version = event.version,
                                "incremental update refused; reinitializing"
                            );
                            (None, self.begin_initialize(&mut core))
                        }
                    }
                }
                _ => {
                    tracing::warn!(
                        version = event.version,
                        expected,
                        "edit notification out of sequence; reinitializing"
                    );
                    (None, self.begin_initialize(&mut core))
                }
            }
        };

        if let Some(generation) = generation {
            self.schedule(generation);
        }
        if let Some(update) = update
            && !update.is_empty()
        {
            self.fire(&update);
        }
    }

    fn fire(&self, event: &DiffModelEvent) {
        if event.is_empty() {
            return;
        }
        let listeners: Vec<DiffModelListener> = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in listeners {
            if panic::catch_unwind(AssertUnwindSafe(|| listener(event))).is_err() {
                tracing::warn!("diff model listener panicked");
            }
        }
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        let core = self.core.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(working) = core.working.take() {
            working.detach();
        }
        if let Some(watch) = core.reference_watch.take() {
            watch.detach();
        }
        if let Some(provider) = core.provider.take() {
            provider.dispose();
        }
    }
}

fn replay(
    model: &mut DiffModel,
    working: &mut Rope,
    version: &mut u64,
    reference: &Rope,
    event: &DocumentEvent,
    config: &DifferConfig,
) -> Result<(), LocationError> {
    if event.version != *version + 1 {
        return Err(LocationError::ConcurrentModification {
            expected: *version + 1,
            actual: event.version,
        });
    }
    let edit = LineEdit::analyze(working, event)?;
    event.apply_to(working)?;
    *version = event.version;
    if let Err(fallback) = model.apply_edit(&edit, working, config) {
        tracing::trace!(?fallback, "replayed edit recomputes the full diff");
        *model = DiffModel::new(reference, working);
    }
    Ok(())
}

fn worker_loop(shared: Weak<Shared>, inbox: mpsc::Receiver<u64>, debounce: Duration) {
    while let Ok(mut generation) = inbox.recv() {
        loop {
            match inbox.recv_timeout(debounce) {
                Ok(newer) => generation = newer,
                Err(RecvTimeoutError::Timeout) => break,
                Err(RecvTimeoutError::Disconnected) => return,
            }
        }
        let Some(shared) = shared.upgrade() else {
            return;
        };
        shared.run_initialization(generation);
    }
}

struct WorkingListener {
    shared: Weak<Shared>,
}

impl DocumentListener for WorkingListener {
    fn document_about_to_be_changed(&self, text: &Rope, event: &DocumentEvent) {
        if let Some(shared) = self.shared.upgrade() {
            shared.before_edit(text, event);
        }
    }

    fn document_changed(&self, text: &Rope, event: &DocumentEvent) {
        if let Some(shared) = self.shared.upgrade() {
            shared.after_edit(text, event);
        }
    }
}

struct ReferenceListener {
    shared: Weak<Shared>,
}

impl DocumentListener for ReferenceListener {
    fn document_about_to_be_changed(&self, _text: &Rope, _event: &DocumentEvent) {}

    fn document_changed(&self, _text: &Rope, _event: &DocumentEvent) {
        if let Some(shared) = self.shared.upgrade() {
            tracing::debug!("reference document edited; reinitializing");
            shared.request_initialize();
        }
    }
}
