//! Behavior-tree invariant violations.
//!
//! These are programmer errors, not runtime failure modes: the public
//! mutators log them and panic.  `NodeTree::check_attach` exposes the same
//! checks as a `Result` for callers that want to test a link first.

use thiserror::Error;

use npc_core::NodeId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("node {0} does not exist")]
    UnknownNode(NodeId),

    #[error("node {0} cannot be linked to itself")]
    SelfReference(NodeId),

    #[error("node {child} is already attached under {parent}")]
    AlreadyAttached { child: NodeId, parent: NodeId },

    #[error("linking {child} under {parent} would create a cycle")]
    Cycle { parent: NodeId, child: NodeId },

    #[error("node {0} has concluded and must be reset before reuse")]
    Concluded(NodeId),

    #[error("node {0} is a queued root")]
    QueuedRoot(NodeId),

    #[error("node {child} is not linked under {parent}")]
    NotLinked { parent: NodeId, child: NodeId },

    #[error("detaching {0} would orphan a registered node")]
    DetachRegistered(NodeId),

    #[error("node {0} is registered and cannot be despawned")]
    DespawnRegistered(NodeId),
}

pub type TreeResult<T> = Result<T, TreeError>;

/// Log and panic on an invariant violation.
#[cold]
#[track_caller]
pub(crate) fn violation(err: TreeError) -> ! {
    tracing::error!(%err, "behavior tree invariant violated");
    panic!("{err}")
}
