#![forbid(unsafe_code)]

//! Control loop for lazily loaded selection trees.
//!
//! `checktree-core` defines the pure model — nodes, the override
//! record, and the derivations from one to the other. This crate adds
//! the stateful half: the [`EditLedger`] of explicit decisions, the
//! [`DebouncedEmitter`] that coalesces bursts of edits into single
//! record emissions, and the [`Reconciler`] that owns all of it and
//! coordinates the lazy-loading boundary with the host.
//!
//! # Host integration
//!
//! Everything is single-threaded and pump-driven: the host calls into
//! the reconciler from its own event loop and owns the clock.
//!
//! ```
//! use checktree_core::{Node, NodeId};
//! use checktree_runtime::{Reconciler, ReconcilerConfig};
//! use std::time::{Duration, Instant};
//!
//! let mut rec = Reconciler::new(ReconcilerConfig::default());
//! rec.merge_nodes(vec![Node::new("root", "Everything")]);
//!
//! let now = Instant::now();
//! rec.toggle_at(&NodeId::new("root"), now);
//!
//! // The host's timer fires after the debounce window:
//! let record = rec.poll_at(now + Duration::from_millis(100)).unwrap();
//! assert!(record.force_on().contains(&NodeId::new("root")));
//! ```

pub mod emitter;
pub mod ledger;
pub mod loader;
pub mod reconciler;

pub use emitter::{DEFAULT_DEBOUNCE_WINDOW, DebouncedEmitter, EmitAction};
pub use ledger::{Decision, EditLedger};
pub use loader::{ChildLoader, LoadError, ParentKey};
pub use reconciler::{
    ChangeHooks, Phase, Reconciler, ReconcilerConfig, ReconcilerStats,
};
