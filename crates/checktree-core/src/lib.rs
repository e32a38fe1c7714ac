#![forbid(unsafe_code)]

//! Core selection-state model for lazily loaded hierarchies.
//!
//! This crate holds the pure half of the engine: the flat
//! [`NodeStore`], the persisted [`OverrideRecord`], and the two
//! derivations that connect them — inheritance resolution
//! ([`resolve_effective`]) and tri-state display aggregation
//! ([`compute_display`]). Nothing here performs I/O, owns a timer, or
//! mutates anything it does not own; the stateful control loop lives in
//! `checktree-runtime`.
//!
//! # Model
//!
//! Selection is stored as overrides, not as the full derived set: an id
//! is either forced on, forced off, or inherits from its nearest
//! overridden ancestor (default off). Children arrive incrementally, and
//! because derivations are pure functions of (store, record), newly
//! loaded nodes pick up inherited state without the record growing.

pub mod display;
pub mod node;
pub mod record;
pub mod resolve;
pub mod store;

pub use display::{NodeDisplay, compute_display};
pub use node::{Node, NodeId};
pub use record::OverrideRecord;
pub use resolve::{resolve_checked, resolve_effective};
pub use store::NodeStore;
