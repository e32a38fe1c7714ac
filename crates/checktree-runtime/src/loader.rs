//! The child-loading boundary.
//!
//! The engine never fetches anything itself. When an expand needs
//! children that are not loaded, the reconciler queues a request keyed
//! by parent id; the host forwards it to whatever transport it owns and
//! later reports completion or failure back to the reconciler.
//!
//! # Failure Modes
//!
//! | Condition | Behavior | Observable as |
//! |-----------|----------|---------------|
//! | Load fails | Request entry cleared, retry allowed on next expand | Loading set shrinks, no children appear |
//! | Load never resolves | Parent stays in the loading set | Subtree stays pending; rest of the tree unaffected |
//! | Completion after teardown | Discarded, no state mutation | Nothing |

use core::fmt;

use checktree_core::NodeId;

/// Key of a child-load request. `None` addresses the forest roots —
/// the initial bootstrap request at session start.
pub type ParentKey = Option<NodeId>;

/// Supplies children for a parent on request.
///
/// Implementations may resolve synchronously (calling straight back
/// into [`Reconciler::complete_load`](crate::reconciler::Reconciler::complete_load)
/// once the pump returns) or asynchronously from a different context.
/// Each key is requested at most once unless a failure clears it.
pub trait ChildLoader {
    /// Begin loading the children of `parent` (`None` for the roots).
    fn load_children(&mut self, parent: Option<&NodeId>);
}

/// Why a child load did not complete.
#[derive(Debug)]
pub enum LoadError {
    /// The transport failed; the message is host-defined.
    Transport(String),
    /// The request was cancelled before it resolved.
    Cancelled,
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Transport(msg) => write!(f, "child load failed: {msg}"),
            LoadError::Cancelled => write!(f, "child load cancelled"),
        }
    }
}

impl std::error::Error for LoadError {}

impl From<std::io::Error> for LoadError {
    fn from(e: std::io::Error) -> Self {
        LoadError::Transport(e.to_string())
    }
}
