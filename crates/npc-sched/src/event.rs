//! Lifecycle events delivered to node watchers.

use npc_core::NodeId;

use crate::Status;

/// A lifecycle edge of one node.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NodeEvent {
    /// The node became the in-progress leaf, or a passive registered with it.
    Registered,
    Unregistered,
    Reset,
    ForcedSuccess,
    ForcedFailure,
    /// The node settled; the payload is never `Status::Running`.
    Concluded(Status),
    /// The node was a root discarded from the queue without concluding.
    Removed,
}

/// Multi-subscriber observer attached with [`NodeTree::watch`][crate::NodeTree::watch].
pub type Watcher = Box<dyn FnMut(NodeId, &NodeEvent) + Send>;
