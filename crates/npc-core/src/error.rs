//! Framework error type.
//!
//! Sub-crates define their own error enums and either convert them into
//! `CoreError` or wrap it as one variant, whichever keeps error sites clean.

use thiserror::Error;

use crate::CharacterId;

/// The top-level error type for `npc-core` and a common base for sub-crates.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("character {0} not found")]
    CharacterNotFound(CharacterId),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shorthand result type for all `npc-*` crates.
pub type CoreResult<T> = Result<T, CoreError>;
