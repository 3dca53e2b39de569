//! Deferred requests issued from inside node callbacks.
//!
//! Callbacks never see the scheduler itself.  They push commands here and
//! the scheduler applies them once the callback returns:
//!
//! - force flags take effect immediately after the callback;
//! - structural commands (`interrupt`, `set_autonomy`, `remove_by_name`)
//!   raise the break-hint when issued mid-pass and are applied after the
//!   pass ends, so the tree being walked is never mutated under the walk.

use npc_core::NodeId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Command {
    FlagSuccess(NodeId),
    FlagFailure(NodeId),
    Interrupt(NodeId),
    SetAutonomy(NodeId),
    RemoveByName(String),
    Break,
}

impl Command {
    /// Structural commands reshape the queue and must wait for the pass to end.
    pub(crate) fn is_structural(&self) -> bool {
        matches!(
            self,
            Command::Interrupt(_) | Command::SetAutonomy(_) | Command::RemoveByName(_)
        )
    }
}

/// Command buffer handed to node callbacks through [`NodeCx`][crate::NodeCx].
#[derive(Debug, Default)]
pub struct Commands {
    queue: Vec<Command>,
}

impl Commands {
    /// Force `node` to conclude *succeeded* at its next visit.
    pub fn flag_success(&mut self, node: NodeId) {
        self.queue.push(Command::FlagSuccess(node));
    }

    /// Force `node` to conclude *failed* at its next visit.
    pub fn flag_failure(&mut self, node: NodeId) {
        self.queue.push(Command::FlagFailure(node));
    }

    /// Pre-empt the active root with `root`.
    pub fn interrupt(&mut self, root: NodeId) {
        self.queue.push(Command::Interrupt(root));
    }

    /// Replace the whole queue with `root`.
    pub fn set_autonomy(&mut self, root: NodeId) {
        self.queue.push(Command::SetAutonomy(root));
    }

    /// Drop the first queued root called `name`.
    pub fn remove_by_name(&mut self, name: impl Into<String>) {
        self.queue.push(Command::RemoveByName(name.into()));
    }

    /// Abandon the current validation pass; it restarts from the root next tick.
    pub fn request_break(&mut self) {
        self.queue.push(Command::Break);
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub(crate) fn drain(&mut self) -> std::vec::Drain<'_, Command> {
        self.queue.drain(..)
    }
}
