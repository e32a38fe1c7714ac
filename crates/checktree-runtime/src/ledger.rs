//! Session record of explicit selection decisions.
//!
//! The [`EditLedger`] tracks exactly which ids currently hold an
//! explicit decision — a user toggle, or an entry copied from an applied
//! external record. Ids whose state is purely inherited are never in the
//! ledger; that property is what keeps the synthesized record minimal
//! instead of growing with every loaded descendant.
//!
//! # Invariants
//!
//! - Every key corresponds to an explicit action. Node arrival never
//!   inserts entries.
//! - After [`record_toggle`](EditLedger::record_toggle) on `id`, no
//!   loaded descendant of `id` remains in the ledger — their state is
//!   again inherited from `id`.

use std::collections::BTreeMap;

use checktree_core::{NodeId, NodeStore, OverrideRecord};

/// An explicit on/off decision for a single id.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    /// Forced on.
    On,
    /// Forced off.
    Off,
}

impl Decision {
    /// Decision matching a desired checked value.
    #[must_use]
    pub fn from_checked(checked: bool) -> Self {
        if checked { Self::On } else { Self::Off }
    }

    /// Whether this decision forces the node on.
    #[must_use]
    pub fn is_on(self) -> bool {
        matches!(self, Self::On)
    }
}

/// Mapping from id to explicit decision.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EditLedger {
    entries: BTreeMap<NodeId, Decision>,
}

impl EditLedger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of explicit decisions held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no explicit decision is held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The decision recorded for `id`, if any.
    #[must_use]
    pub fn get(&self, id: &NodeId) -> Option<Decision> {
        self.entries.get(id).copied()
    }

    /// Replace the ledger with a direct copy of an external record.
    ///
    /// No inference: force-on ids become [`Decision::On`], force-off ids
    /// become [`Decision::Off`], everything else is dropped.
    pub fn rebuild_from(&mut self, record: &OverrideRecord) {
        self.entries.clear();
        for id in record.force_on() {
            self.entries.insert(id.clone(), Decision::On);
        }
        for id in record.force_off() {
            self.entries.insert(id.clone(), Decision::Off);
        }
    }

    /// Record a toggle of `id` to `decision`.
    ///
    /// Every currently-loaded descendant of `id` is dropped from the
    /// ledger: their previous explicit decisions are superseded and
    /// their state is once again inherited from `id`.
    pub fn record_toggle(&mut self, id: &NodeId, decision: Decision, store: &NodeStore) {
        self.entries.insert(id.clone(), decision);
        for descendant in store.descendants(id) {
            self.entries.remove(&descendant);
        }
    }

    /// Project the ledger into a minimal override record.
    #[must_use]
    pub fn synthesize(&self) -> OverrideRecord {
        OverrideRecord::new(
            self.entries
                .iter()
                .filter(|(_, d)| d.is_on())
                .map(|(id, _)| id.clone()),
            self.entries
                .iter()
                .filter(|(_, d)| !d.is_on())
                .map(|(id, _)| id.clone()),
        )
    }
}
