//! Cross-cutting actions foreign subsystems must ask about, and gestures.

use npc_core::{CharacterId, Point};

/// An action that some subsystem other than the current unit wants to take
/// on the character.
///
/// Units refuse a permission while they need exclusive control of that
/// aspect of the character; anything not refused is allowed.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumIter,
    strum::AsRefStr,
)]
#[strum(serialize_all = "snake_case")]
#[non_exhaustive]
pub enum Permission {
    /// Turn the whole character (e.g. to face someone who bumped into it).
    RootRotation,
    /// Move the character's root (shoves, knock-backs).
    RootMotion,
    /// Replace the current animation with a one-off reaction.
    AnimationOverride,
    /// Point the head and eyes at something.
    LookAt,
    /// Be used as the target of another character's interaction.
    Interact,
    /// Be drawn into a conversation.
    Converse,
    /// Have the scheduler's active root pre-empted from outside.
    Interrupt,
}

/// A discrete external event offered to the dispatcher's units.
#[derive(Clone, Debug, PartialEq)]
pub struct Gesture {
    /// Who made the gesture; `None` for scripted or environmental events.
    pub source: Option<CharacterId>,
    pub label:  String,
    /// Where the gesture came from.
    pub at:     Point,
}

impl Gesture {
    pub fn new(source: Option<CharacterId>, label: impl Into<String>, at: Point) -> Self {
        Self { source, label: label.into(), at }
    }

    #[inline]
    pub fn is(&self, label: &str) -> bool {
        self.label == label
    }
}
