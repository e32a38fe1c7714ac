//! Tri-state display aggregation.
//!
//! For rendering, an internal node summarizes its loaded children:
//! fully on, fully off, or mixed. Aggregation only sees children that
//! have actually been loaded — unfetched children do not count toward
//! "all" or "some", so a parent with no loaded children behaves like a
//! leaf and falls back to its own effective value.
//!
//! The computation is a pure derivation of (store, checked set); callers
//! recompute it whenever either input changes.

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::node::NodeId;
use crate::store::NodeStore;

/// Per-node display state: the checkbox value and the mixed marker.
///
/// When `indeterminate` is `true`, `checked` is reported as `false` and
/// carries no independent meaning — the node renders as partial.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NodeDisplay {
    /// Whether the node renders checked.
    pub checked: bool,
    /// Whether the node renders as partially selected.
    pub indeterminate: bool,
}

impl NodeDisplay {
    /// Leaf-like state from a plain boolean.
    #[must_use]
    pub fn leaf(checked: bool) -> Self {
        Self {
            checked,
            indeterminate: false,
        }
    }

    /// The mixed state.
    #[must_use]
    pub fn mixed() -> Self {
        Self {
            checked: false,
            indeterminate: true,
        }
    }
}

/// Compute display state for every loaded node, bottom-up.
///
/// `checked` is the set of ids whose effective value is on (see
/// [`resolve_checked`](crate::resolve::resolve_checked)).
#[must_use]
pub fn compute_display(
    store: &NodeStore,
    checked: &BTreeSet<NodeId>,
) -> HashMap<NodeId, NodeDisplay> {
    // Preorder pass: parents are recorded before their descendants, so
    // walking the order backwards visits children first.
    let mut order = Vec::with_capacity(store.len());
    let mut visited: HashSet<NodeId> = HashSet::with_capacity(store.len());
    let mut stack: Vec<NodeId> = store.roots().iter().cloned().collect();
    while let Some(id) = stack.pop() {
        if !visited.insert(id.clone()) {
            continue;
        }
        for child in store.children(&id) {
            stack.push(child.clone());
        }
        order.push(id);
    }

    let mut display: HashMap<NodeId, NodeDisplay> = HashMap::with_capacity(order.len());
    for id in order.iter().rev() {
        let summaries: Vec<NodeDisplay> = store
            .children(id)
            .iter()
            .filter_map(|child| display.get(child).copied())
            .collect();

        let state = if summaries.is_empty() {
            NodeDisplay::leaf(checked.contains(id))
        } else if summaries.iter().all(|s| s.checked && !s.indeterminate) {
            NodeDisplay::leaf(true)
        } else if summaries.iter().all(|s| !s.checked && !s.indeterminate) {
            NodeDisplay::leaf(false)
        } else {
            NodeDisplay::mixed()
        };
        display.insert(id.clone(), state);
    }

    display
}
