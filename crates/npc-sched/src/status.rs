//! Tri-state evaluation result.

use std::fmt;

/// Outcome of evaluating a behavior node.
///
/// `Running` means "tick me again"; the other two are terminal until the node
/// is explicitly reset.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum Status {
    #[default]
    Running,
    Success,
    Failure,
}

impl Status {
    /// `true` once the node has concluded either way.
    #[inline]
    pub fn is_settled(self) -> bool {
        !matches!(self, Status::Running)
    }

    #[inline]
    pub fn is_success(self) -> bool {
        matches!(self, Status::Success)
    }

    #[inline]
    pub fn is_failure(self) -> bool {
        matches!(self, Status::Failure)
    }

    /// `None` while running, `Some(true)` on success, `Some(false)` on failure.
    #[inline]
    pub fn outcome(self) -> Option<bool> {
        match self {
            Status::Running => None,
            Status::Success => Some(true),
            Status::Failure => Some(false),
        }
    }
}

impl From<Option<bool>> for Status {
    fn from(v: Option<bool>) -> Self {
        match v {
            None => Status::Running,
            Some(true) => Status::Success,
            Some(false) => Status::Failure,
        }
    }
}

impl From<bool> for Status {
    /// A plain predicate: `true` settles as success, `false` keeps running.
    fn from(done: bool) -> Self {
        if done { Status::Success } else { Status::Running }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Status::Running => "running",
            Status::Success => "success",
            Status::Failure => "failure",
        })
    }
}
