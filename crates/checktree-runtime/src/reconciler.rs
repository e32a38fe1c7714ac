//! The reconciliation loop.
//!
//! [`Reconciler`] owns all mutable selection state — node store, checked
//! set, edit ledger, debounce window — and is the only component that
//! mutates any of it. Inputs are external records, user toggles, and
//! loader completions; outputs are per-node display state, the loading
//! set, and debounced minimal records.
//!
//! # State machine
//!
//! - `Idle` → external record arrives → `ApplyingExternal`: ledger and
//!   checked set are rebuilt from the record, nothing is emitted (an
//!   incoming record must never echo back out), → `Idle`.
//! - `Idle`/`Editing` → user toggle → `Editing`: checked set and ledger
//!   are updated, the debounce window restarts.
//! - `Editing` → window elapses on poll → `Idle`: a minimal record is
//!   synthesized and handed out, unless its content matches the last
//!   one seen.
//!
//! Everything runs on the caller's thread. The host pumps the loop:
//! forward queued load requests to its transport, report completions
//! back, and poll for due emissions from its timer.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::time::{Duration, Instant};

use checktree_core::{
    Node, NodeDisplay, NodeId, NodeStore, OverrideRecord, compute_display, resolve_checked,
};
use core::fmt;
use tracing::{debug, trace, warn};

use crate::emitter::{DEFAULT_DEBOUNCE_WINDOW, DebouncedEmitter, EmitAction};
use crate::ledger::{Decision, EditLedger};
use crate::loader::{ChildLoader, LoadError, ParentKey};

/// Configuration for a [`Reconciler`].
#[derive(Clone, Debug)]
pub struct ReconcilerConfig {
    /// Coalescing window for record emission.
    pub debounce_window: Duration,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            debounce_window: DEFAULT_DEBOUNCE_WINDOW,
        }
    }
}

impl ReconcilerConfig {
    /// Set the emission coalescing window.
    #[must_use]
    pub fn with_debounce_window(mut self, window: Duration) -> Self {
        self.debounce_window = window;
        self
    }
}

/// Where the loop currently is.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Phase {
    /// Nothing pending.
    #[default]
    Idle,
    /// An external record is being applied.
    ApplyingExternal,
    /// User edits accumulated; an emission window is pending.
    Editing,
}

impl Phase {
    /// Stable string form for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::ApplyingExternal => "applying_external",
            Self::Editing => "editing",
        }
    }
}

/// Callback type for emitted records.
pub type OnRecordChange = Box<dyn Fn(&OverrideRecord) + Send>;
/// Callback type for loading-set changes.
pub type OnLoadingChange = Box<dyn Fn(&BTreeSet<ParentKey>) + Send>;

/// Optional host callbacks.
///
/// Hosts that prefer a push interface register closures here; hosts
/// that poll can ignore this entirely and use the values returned from
/// [`Reconciler::poll_at`] and [`Reconciler::loading`].
#[derive(Default)]
pub struct ChangeHooks {
    on_record_change: Option<OnRecordChange>,
    on_loading_change: Option<OnLoadingChange>,
}

impl fmt::Debug for ChangeHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeHooks")
            .field("on_record_change", &self.on_record_change.is_some())
            .field("on_loading_change", &self.on_loading_change.is_some())
            .finish()
    }
}

impl ChangeHooks {
    /// Create an empty hooks instance.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the callback fired when a record is emitted.
    #[must_use]
    pub fn on_record_change<F>(mut self, callback: F) -> Self
    where
        F: Fn(&OverrideRecord) + Send + 'static,
    {
        self.on_record_change = Some(Box::new(callback));
        self
    }

    /// Set the callback fired when the loading set changes.
    #[must_use]
    pub fn on_loading_change<F>(mut self, callback: F) -> Self
    where
        F: Fn(&BTreeSet<ParentKey>) + Send + 'static,
    {
        self.on_loading_change = Some(Box::new(callback));
        self
    }

    fn fire_record_change(&self, record: &OverrideRecord) {
        if let Some(ref cb) = self.on_record_change {
            cb(record);
        }
    }

    fn fire_loading_change(&self, loading: &BTreeSet<ParentKey>) {
        if let Some(ref cb) = self.on_loading_change {
            cb(loading);
        }
    }
}

/// Snapshot of loop counters and sizes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReconcilerStats {
    /// Nodes currently loaded.
    pub nodes: usize,
    /// Explicit decisions in the ledger.
    pub edits: usize,
    /// User toggles processed.
    pub toggles: u64,
    /// External records applied.
    pub applies: u64,
    /// Records emitted.
    pub emits: u64,
    /// Windows that fired with unchanged content.
    pub suppressed_emits: u64,
    /// Loader completions discarded after teardown.
    pub discarded_completions: u64,
    /// Loads that failed and were cleared for retry.
    pub failed_loads: u64,
    /// Parents currently awaiting children.
    pub pending_loads: usize,
}

/// Owner of all selection state; see the module docs.
#[derive(Debug)]
pub struct Reconciler {
    config: ReconcilerConfig,
    store: NodeStore,
    /// Ids currently displayed as on. Maintained incrementally on
    /// toggles and rebuilt from the ledger when the store changes.
    checked: BTreeSet<NodeId>,
    ledger: EditLedger,
    emitter: DebouncedEmitter,
    display: HashMap<NodeId, NodeDisplay>,
    phase: Phase,
    expanded: BTreeSet<NodeId>,
    /// Parents ever requested. Never cleared on success: a completed
    /// load is not re-requested for the rest of the session.
    requested: HashSet<ParentKey>,
    loading: BTreeSet<ParentKey>,
    queued_requests: Vec<ParentKey>,
    hooks: ChangeHooks,
    /// Cleared at teardown; late loader completions are discarded.
    alive: bool,
    toggles: u64,
    applies: u64,
    emits: u64,
    suppressed_emits: u64,
    discarded_completions: u64,
    failed_loads: u64,
}

impl Reconciler {
    /// Create a reconciler with the given configuration.
    #[must_use]
    pub fn new(config: ReconcilerConfig) -> Self {
        let emitter = DebouncedEmitter::new(config.debounce_window);
        Self {
            config,
            store: NodeStore::new(),
            checked: BTreeSet::new(),
            ledger: EditLedger::new(),
            emitter,
            display: HashMap::new(),
            phase: Phase::Idle,
            expanded: BTreeSet::new(),
            requested: HashSet::new(),
            loading: BTreeSet::new(),
            queued_requests: Vec::new(),
            hooks: ChangeHooks::new(),
            alive: true,
            toggles: 0,
            applies: 0,
            emits: 0,
            suppressed_emits: 0,
            discarded_completions: 0,
            failed_loads: 0,
        }
    }

    /// Attach host callbacks.
    #[must_use]
    pub fn with_hooks(mut self, hooks: ChangeHooks) -> Self {
        self.hooks = hooks;
        self
    }

    // --- inputs -----------------------------------------------------

    /// Request the initial root load.
    ///
    /// Keyed through the requested set like every other load, so a host
    /// that bootstraps twice issues exactly one request.
    pub fn start(&mut self) {
        self.request_children(None);
    }

    /// Upsert nodes into the store and rederive all state.
    ///
    /// Callable at any time, including before any load was requested
    /// (pre-seeded trees). Never touches the ledger: new descendants of
    /// an overridden ancestor inherit through resolution alone.
    pub fn merge_nodes(&mut self, nodes: Vec<Node>) {
        let merged = self.store.merge(nodes);
        self.rederive();
        trace!(
            target: "checktree.reconcile",
            merged,
            total = self.store.len(),
            "nodes merged"
        );
    }

    /// Apply an externally supplied record.
    ///
    /// Rebuilds the ledger as a direct copy and the checked set through
    /// resolution. Cancels any pending emission and installs the record
    /// as the suppression baseline — an incoming record is never echoed
    /// back out. Applying the same record twice is idempotent.
    pub fn apply_record(&mut self, record: &OverrideRecord) {
        self.phase = Phase::ApplyingExternal;
        self.ledger.rebuild_from(record);
        self.checked = resolve_checked(&self.store, record);
        self.emitter.note_external(record);
        self.refresh_display();
        self.applies += 1;
        debug!(
            target: "checktree.reconcile",
            force_on = record.force_on().len(),
            force_off = record.force_off().len(),
            "external record applied"
        );
        self.phase = Phase::Idle;
    }

    /// Toggle a node now.
    pub fn toggle(&mut self, id: &NodeId) {
        self.toggle_at(id, Instant::now());
    }

    /// Toggle a node at an explicit time (for deterministic tests and
    /// hosts that own a clock).
    ///
    /// The new value is the negation of the node's displayed checked
    /// value. The node and every loaded descendant follow it in the
    /// checked set; the ledger records the decision and drops the
    /// descendants' superseded entries. A toggle on an id that is not
    /// loaded is ignored.
    pub fn toggle_at(&mut self, id: &NodeId, now: Instant) {
        if !self.store.contains(id) {
            trace!(target: "checktree.reconcile", id = %id, "toggle on unknown id ignored");
            return;
        }
        let current = self.display.get(id).copied().unwrap_or_default().checked;
        let target = !current;

        if target {
            self.checked.insert(id.clone());
        } else {
            self.checked.remove(id);
        }
        for descendant in self.store.descendants(id) {
            if target {
                self.checked.insert(descendant);
            } else {
                self.checked.remove(&descendant);
            }
        }

        self.ledger
            .record_toggle(id, Decision::from_checked(target), &self.store);
        self.emitter.mark_dirty_at(now);
        self.phase = Phase::Editing;
        self.toggles += 1;
        self.refresh_display();
        debug!(
            target: "checktree.reconcile",
            id = %id,
            on = target,
            edits = self.ledger.len(),
            "toggle recorded"
        );
    }

    // --- emission ---------------------------------------------------

    /// Poll for a due emission now.
    pub fn poll(&mut self) -> Option<OverrideRecord> {
        self.poll_at(Instant::now())
    }

    /// Poll for a due emission at an explicit time.
    ///
    /// Returns the freshly synthesized minimal record exactly when the
    /// debounce window has elapsed and its content differs from the
    /// last record seen. Fires the record-change hook on emission.
    pub fn poll_at(&mut self, now: Instant) -> Option<OverrideRecord> {
        if !self.emitter.is_pending() {
            return None;
        }
        let candidate = self.ledger.synthesize();
        match self.emitter.poll_at(now, &candidate) {
            EmitAction::None => None,
            EmitAction::Unchanged => {
                self.phase = Phase::Idle;
                self.suppressed_emits += 1;
                trace!(target: "checktree.reconcile", "emission suppressed: content unchanged");
                None
            }
            EmitAction::Emit(record) => {
                self.phase = Phase::Idle;
                self.emits += 1;
                debug!(
                    target: "checktree.reconcile",
                    force_on = record.force_on().len(),
                    force_off = record.force_off().len(),
                    "record emitted"
                );
                self.hooks.fire_record_change(&record);
                Some(record)
            }
        }
    }

    /// Remaining time until the pending emission fires, if one is
    /// pending. Hosts integrating a timer wheel schedule their next
    /// wakeup from this.
    #[must_use]
    pub fn time_until_emit(&self, now: Instant) -> Option<Duration> {
        self.emitter.time_until_emit(now)
    }

    // --- expansion & lazy loading -----------------------------------

    /// Mark a node expanded, requesting its children if none are loaded
    /// and they were never requested before.
    pub fn expand(&mut self, id: &NodeId) {
        if !self.store.contains(id) {
            return;
        }
        self.expanded.insert(id.clone());
        if self.store.children(id).is_empty() {
            self.request_children(Some(id.clone()));
        }
    }

    /// Mark a node collapsed. Display-only: the ledger and checked set
    /// are untouched, so re-expanding restores the same state.
    pub fn collapse(&mut self, id: &NodeId) {
        self.expanded.remove(id);
    }

    /// Whether a node is currently marked expanded.
    #[must_use]
    pub fn is_expanded(&self, id: &NodeId) -> bool {
        self.expanded.contains(id)
    }

    /// Drain load requests queued since the last call. The host
    /// forwards each to its transport and later reports back through
    /// [`complete_load`](Self::complete_load) or
    /// [`fail_load`](Self::fail_load).
    #[must_use]
    pub fn take_load_requests(&mut self) -> Vec<ParentKey> {
        std::mem::take(&mut self.queued_requests)
    }

    /// Forward all queued requests to a loader.
    pub fn pump_loader(&mut self, loader: &mut dyn ChildLoader) {
        for key in self.take_load_requests() {
            loader.load_children(key.as_ref());
        }
    }

    /// Report a completed child load.
    ///
    /// Discarded entirely after [`teardown`](Self::teardown). Merges the
    /// nodes and rederives state; never writes into the ledger.
    pub fn complete_load(&mut self, parent: &ParentKey, nodes: Vec<Node>) {
        if !self.alive {
            self.discarded_completions += 1;
            trace!(target: "checktree.load", "completion after teardown discarded");
            return;
        }
        self.loading.remove(parent);
        self.store.merge(nodes);
        self.rederive();
        self.hooks.fire_loading_change(&self.loading);
        debug!(
            target: "checktree.load",
            total = self.store.len(),
            pending = self.loading.len(),
            "children merged"
        );
    }

    /// Report a failed child load.
    ///
    /// Clears the requested entry so a future expand retries, and the
    /// loading entry so the pending indicator disappears. Recovery is
    /// local: nothing propagates to toggle/apply callers.
    pub fn fail_load(&mut self, parent: &ParentKey, error: &LoadError) {
        if !self.alive {
            self.discarded_completions += 1;
            return;
        }
        self.loading.remove(parent);
        self.requested.remove(parent);
        self.failed_loads += 1;
        warn!(target: "checktree.load", error = %error, "child load failed; retry allowed");
        self.hooks.fire_loading_change(&self.loading);
    }

    /// Mark the owning view as torn down. Subsequent loader completions
    /// and failures are discarded without mutating state.
    pub fn teardown(&mut self) {
        self.alive = false;
    }

    /// Whether the owning view is still live.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.alive
    }

    // --- outputs ----------------------------------------------------

    /// Per-node display state, recomputed after every mutation.
    #[must_use]
    pub fn display(&self) -> &HashMap<NodeId, NodeDisplay> {
        &self.display
    }

    /// Display state of one node.
    #[must_use]
    pub fn node_display(&self, id: &NodeId) -> Option<NodeDisplay> {
        self.display.get(id).copied()
    }

    /// Ids currently displayed as on.
    #[must_use]
    pub fn checked_ids(&self) -> &BTreeSet<NodeId> {
        &self.checked
    }

    /// Parents currently awaiting a child load.
    #[must_use]
    pub fn loading(&self) -> &BTreeSet<ParentKey> {
        &self.loading
    }

    /// Whether a specific parent is awaiting children.
    #[must_use]
    pub fn is_loading(&self, key: &ParentKey) -> bool {
        self.loading.contains(key)
    }

    /// The loaded nodes.
    #[must_use]
    pub fn store(&self) -> &NodeStore {
        &self.store
    }

    /// Current loop phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The configuration in effect.
    #[must_use]
    pub fn config(&self) -> &ReconcilerConfig {
        &self.config
    }

    /// Synthesize the minimal record for the current ledger without
    /// touching the emission machinery.
    #[must_use]
    pub fn synthesize_record(&self) -> OverrideRecord {
        self.ledger.synthesize()
    }

    /// Counter and size snapshot.
    #[must_use]
    pub fn stats(&self) -> ReconcilerStats {
        ReconcilerStats {
            nodes: self.store.len(),
            edits: self.ledger.len(),
            toggles: self.toggles,
            applies: self.applies,
            emits: self.emits,
            suppressed_emits: self.suppressed_emits,
            discarded_completions: self.discarded_completions,
            failed_loads: self.failed_loads,
            pending_loads: self.loading.len(),
        }
    }

    // --- internals --------------------------------------------------

    fn request_children(&mut self, key: ParentKey) {
        if self.requested.contains(&key) {
            return;
        }
        self.requested.insert(key.clone());
        self.loading.insert(key.clone());
        self.queued_requests.push(key);
        self.hooks.fire_loading_change(&self.loading);
        debug!(
            target: "checktree.load",
            pending = self.loading.len(),
            "child load requested"
        );
    }

    /// Rebuild checked set and display from the ledger. The ledger is
    /// the source of truth for explicit decisions; everything else is
    /// a pure function of (store, ledger).
    fn rederive(&mut self) {
        self.checked = resolve_checked(&self.store, &self.ledger.synthesize());
        self.refresh_display();
    }

    fn refresh_display(&mut self) {
        self.display = compute_display(&self.store, &self.checked);
    }
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new(ReconcilerConfig::default())
    }
}
