//! Inheritance resolution: override record + node store → effective state.
//!
//! Effective state flows parent to child. Each node either carries its
//! own override or inherits the value threaded down from its parent;
//! unoverridden roots default to off. The walk is a single top-down
//! pass, so cost is linear in the number of loaded nodes regardless of
//! tree depth.

use std::collections::{HashMap, HashSet};

use crate::node::NodeId;
use crate::record::OverrideRecord;
use crate::store::NodeStore;

/// Compute the effective on/off value for every loaded node.
///
/// Roots (including nodes whose parent has not been loaded) start from
/// the default `false`. A `force_on` entry flips the threaded value to
/// `true`, a `force_off` entry to `false`; the nearest overridden
/// ancestor therefore wins over any farther one. Visited ids are
/// tracked so malformed parent cycles cannot loop.
#[must_use]
pub fn resolve_effective(store: &NodeStore, record: &OverrideRecord) -> HashMap<NodeId, bool> {
    let mut effective = HashMap::with_capacity(store.len());
    let mut visited: HashSet<NodeId> = HashSet::with_capacity(store.len());
    let mut stack: Vec<(NodeId, bool)> =
        store.roots().iter().map(|id| (id.clone(), false)).collect();

    while let Some((id, inherited)) = stack.pop() {
        if !visited.insert(id.clone()) {
            continue;
        }
        let value = if record.force_on().contains(&id) {
            true
        } else if record.force_off().contains(&id) {
            false
        } else {
            inherited
        };
        for child in store.children(&id) {
            stack.push((child.clone(), value));
        }
        effective.insert(id, value);
    }

    effective
}

/// Ids resolving to `true`, collected into a sorted set.
///
/// Convenience projection of [`resolve_effective`] for callers that
/// track the checked ids as a set.
#[must_use]
pub fn resolve_checked(
    store: &NodeStore,
    record: &OverrideRecord,
) -> std::collections::BTreeSet<NodeId> {
    resolve_effective(store, record)
        .into_iter()
        .filter_map(|(id, on)| on.then_some(id))
        .collect()
}
