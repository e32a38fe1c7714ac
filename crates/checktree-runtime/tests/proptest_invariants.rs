//! Property-based invariant tests for resolution, the edit ledger, and
//! the reconciler.
//!
//! Invariants checked for arbitrary generated forests:
//!
//! 1. Resolution agrees with a per-node reference walk: the nearest
//!    overridden ancestor wins, unoverridden chains default off.
//! 2. Synthesized records never place an id in both sets.
//! 3. Round-trip law: applying a synthesized record to a fresh session
//!    over the same store reproduces the checked set that produced it.
//! 4. The incrementally maintained checked set always agrees with a
//!    full re-resolution from the ledger.
//! 5. Merging new nodes never changes the synthesized record.
//! 6. No panics on arbitrary toggle/merge/apply sequences.

use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use checktree_core::{
    Node, NodeId, NodeStore, OverrideRecord, resolve_checked, resolve_effective,
};
use checktree_runtime::{Reconciler, ReconcilerConfig};
use proptest::prelude::*;

/// Decode a forest from per-node parent codes. Node `i` may only have a
/// parent with a smaller index, so the result is always acyclic.
fn build_forest(codes: &[usize]) -> Vec<Node> {
    codes
        .iter()
        .enumerate()
        .map(|(i, code)| {
            let node = Node::new(format!("n{i}"), format!("Node {i}"));
            if i == 0 {
                return node;
            }
            match code % (i + 1) {
                0 => node,
                m => node.with_parent(format!("n{}", m - 1)),
            }
        })
        .collect()
}

/// Decode an override record: per node, 3 ⇒ force-on, 4 ⇒ force-off.
fn build_record(codes: &[usize]) -> OverrideRecord {
    let on = codes
        .iter()
        .enumerate()
        .filter(|(_, c)| **c % 5 == 3)
        .map(|(i, _)| NodeId::new(format!("n{i}")));
    let off: Vec<NodeId> = codes
        .iter()
        .enumerate()
        .filter(|(_, c)| **c % 5 == 4)
        .map(|(i, _)| NodeId::new(format!("n{i}")))
        .collect();
    OverrideRecord::new(on, off)
}

fn forest_strategy() -> impl Strategy<Value = Vec<Node>> {
    prop::collection::vec(0usize..1000, 1..40).prop_map(|codes| build_forest(&codes))
}

/// Reference resolution: climb the ancestor chain until an override is
/// found; default off. Independent of the store's traversal order.
fn reference_effective(nodes: &[Node], record: &OverrideRecord, start: &NodeId) -> bool {
    let by_id: HashMap<&NodeId, &Node> = nodes.iter().map(|n| (&n.id, n)).collect();
    let mut seen: HashSet<&NodeId> = HashSet::new();
    let mut cursor = Some(start);
    while let Some(id) = cursor {
        if !seen.insert(id) {
            break;
        }
        if record.force_on().contains(id) {
            return true;
        }
        if record.force_off().contains(id) {
            return false;
        }
        cursor = by_id.get(id).and_then(|n| n.parent.as_ref());
    }
    false
}

proptest! {
    #[test]
    fn resolution_matches_reference_walk(
        codes in prop::collection::vec(0usize..1000, 1..40),
        record_codes in prop::collection::vec(0usize..1000, 40),
    ) {
        let nodes = build_forest(&codes);
        let record = build_record(&record_codes[..nodes.len()]);
        let mut store = NodeStore::new();
        store.merge(nodes.clone());

        let effective = resolve_effective(&store, &record);
        for node in &nodes {
            let expected = reference_effective(&nodes, &record, &node.id);
            prop_assert_eq!(
                effective.get(&node.id).copied(),
                Some(expected),
                "node {} diverged from reference",
                node.id
            );
        }
    }

    #[test]
    fn synthesized_records_are_disjoint(
        codes in prop::collection::vec(0usize..1000, 1..30),
        toggles in prop::collection::vec(0usize..30, 0..15),
    ) {
        let nodes = build_forest(&codes);
        let mut rec = Reconciler::new(ReconcilerConfig::default());
        rec.merge_nodes(nodes.clone());

        let mut now = Instant::now();
        for t in &toggles {
            let target = NodeId::new(format!("n{}", t % nodes.len()));
            rec.toggle_at(&target, now);
            now += Duration::from_millis(1);
        }

        let record = rec.synthesize_record();
        let overlap: Vec<_> = record
            .force_on()
            .intersection(record.force_off())
            .collect();
        prop_assert!(overlap.is_empty(), "overlapping ids: {overlap:?}");
    }

    #[test]
    fn synthesized_record_round_trips_checked_set(
        codes in prop::collection::vec(0usize..1000, 1..30),
        toggles in prop::collection::vec(0usize..30, 0..15),
    ) {
        let nodes = build_forest(&codes);
        let mut editor = Reconciler::new(ReconcilerConfig::default());
        editor.merge_nodes(nodes.clone());

        let mut now = Instant::now();
        for t in &toggles {
            let target = NodeId::new(format!("n{}", t % nodes.len()));
            editor.toggle_at(&target, now);
            now += Duration::from_millis(1);
        }

        let mut replica = Reconciler::new(ReconcilerConfig::default());
        replica.merge_nodes(nodes);
        replica.apply_record(&editor.synthesize_record());
        prop_assert_eq!(replica.checked_ids(), editor.checked_ids());
    }

    #[test]
    fn incremental_checked_set_agrees_with_full_resolution(
        codes in prop::collection::vec(0usize..1000, 1..30),
        toggles in prop::collection::vec(0usize..30, 1..12),
    ) {
        let nodes = build_forest(&codes);
        let mut rec = Reconciler::new(ReconcilerConfig::default());
        rec.merge_nodes(nodes.clone());

        let mut now = Instant::now();
        for t in &toggles {
            let target = NodeId::new(format!("n{}", t % nodes.len()));
            rec.toggle_at(&target, now);
            now += Duration::from_millis(1);

            let resolved = resolve_checked(rec.store(), &rec.synthesize_record());
            prop_assert_eq!(rec.checked_ids(), &resolved);
        }
    }

    #[test]
    fn merging_nodes_never_changes_the_record(
        codes in prop::collection::vec(0usize..1000, 1..20),
        record_codes in prop::collection::vec(0usize..1000, 20),
        extra in prop::collection::vec(0usize..1000, 1..10),
    ) {
        let nodes = build_forest(&codes);
        let record = build_record(&record_codes[..nodes.len()]);
        let mut rec = Reconciler::new(ReconcilerConfig::default());
        rec.merge_nodes(nodes.clone());
        rec.apply_record(&record);

        let before = rec.synthesize_record();
        let fresh: Vec<Node> = extra
            .iter()
            .enumerate()
            .map(|(i, code)| {
                Node::new(format!("m{i}"), format!("Late {i}"))
                    .with_parent(format!("n{}", code % nodes.len()))
            })
            .collect();
        rec.merge_nodes(fresh);

        prop_assert_eq!(rec.synthesize_record(), before);
    }

    #[test]
    fn arbitrary_sequences_do_not_panic(
        codes in prop::collection::vec(0usize..1000, 1..20),
        ops in prop::collection::vec((0usize..4, 0usize..40), 0..20),
    ) {
        let nodes = build_forest(&codes);
        let mut rec = Reconciler::new(ReconcilerConfig::default());
        rec.merge_nodes(nodes.clone());

        let mut now = Instant::now();
        for &(op, arg) in &ops {
            let target = NodeId::new(format!("n{}", arg % (nodes.len() + 3)));
            match op {
                0 => rec.toggle_at(&target, now),
                1 => rec.expand(&target),
                2 => rec.collapse(&target),
                _ => {
                    let _ = rec.poll_at(now);
                }
            }
            now += Duration::from_millis(7);
        }
        let _ = rec.take_load_requests();
        let _ = rec.stats();
    }
}
