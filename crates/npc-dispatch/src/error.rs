use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// `set_task` was called from an activation or deactivation hook, or
    /// from the listener query of an ongoing transition.
    #[error("set_task({requested}) issued while switching units; transitions must not nest")]
    Reentrant { requested: String },
}

pub type DispatchResult<T> = Result<T, DispatchError>;
