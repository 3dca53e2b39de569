//! Reports of roots leaving the queue.

use npc_core::NodeId;

use crate::Status;

/// How a root left the queue.
///
/// `Removed` is a terminal transition of its own: the root was discarded by
/// `set_autonomy`, `remove_by_name`, or `clear` without concluding, and must
/// not be read as a failure.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Conclusion {
    Succeeded,
    Failed,
    Removed,
}

impl Conclusion {
    /// `Some(true)` / `Some(false)` for a natural conclusion, `None` when removed.
    pub fn outcome(self) -> Option<bool> {
        match self {
            Conclusion::Succeeded => Some(true),
            Conclusion::Failed => Some(false),
            Conclusion::Removed => None,
        }
    }

    pub(crate) fn from_status(status: Status) -> Option<Conclusion> {
        match status {
            Status::Running => None,
            Status::Success => Some(Conclusion::Succeeded),
            Status::Failure => Some(Conclusion::Failed),
        }
    }
}

/// One root leaving the queue, collected until the owner drains them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settlement {
    pub root:       NodeId,
    pub name:       String,
    pub conclusion: Conclusion,
}
