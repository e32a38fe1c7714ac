//! The externally-visible override record.
//!
//! An [`OverrideRecord`] is the minimal persisted form of a selection:
//! two disjoint sets of ids, force-on and force-off. Everything else a
//! consumer sees (per-node checked state, mixed markers) is derived from
//! this record plus the loaded nodes.
//!
//! # Invariants
//!
//! - An id never appears in both sets. This holds by construction:
//!   [`OverrideRecord::new`] normalizes duplicated ids with force-on
//!   winning, and no mutating access to the raw sets is exposed.
//! - Equality is set equality; the order ids arrived in is irrelevant.
//!
//! # Wire format
//!
//! Serialized as two arrays, `forceOn` and `forceOff`. Arrays are
//! order-independent; deserialization re-normalizes, so a malformed
//! record (same id on both sides) loads without error.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::node::NodeId;

/// Minimal persisted selection state: force-on and force-off id sets.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OverrideRecord {
    force_on: BTreeSet<NodeId>,
    force_off: BTreeSet<NodeId>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecordWire {
    #[serde(default)]
    force_on: Vec<NodeId>,
    #[serde(default)]
    force_off: Vec<NodeId>,
}

impl OverrideRecord {
    /// Build a record from raw id collections.
    ///
    /// An id present on both sides resolves to force-on.
    #[must_use]
    pub fn new<I, J>(force_on: I, force_off: J) -> Self
    where
        I: IntoIterator<Item = NodeId>,
        J: IntoIterator<Item = NodeId>,
    {
        let force_on: BTreeSet<NodeId> = force_on.into_iter().collect();
        let force_off = force_off
            .into_iter()
            .filter(|id| !force_on.contains(id))
            .collect();
        Self {
            force_on,
            force_off,
        }
    }

    /// An empty record: every node inherits, everything resolves off.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Ids forced on.
    #[must_use]
    pub fn force_on(&self) -> &BTreeSet<NodeId> {
        &self.force_on
    }

    /// Ids forced off.
    #[must_use]
    pub fn force_off(&self) -> &BTreeSet<NodeId> {
        &self.force_off
    }

    /// Whether the record carries no overrides at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.force_on.is_empty() && self.force_off.is_empty()
    }

    /// Total number of overridden ids.
    #[must_use]
    pub fn len(&self) -> usize {
        self.force_on.len() + self.force_off.len()
    }
}

impl Serialize for OverrideRecord {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        RecordWire {
            force_on: self.force_on.iter().cloned().collect(),
            force_off: self.force_off.iter().cloned().collect(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for OverrideRecord {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let wire = RecordWire::deserialize(deserializer)?;
        Ok(Self::new(wire.force_on, wire.force_off))
    }
}
