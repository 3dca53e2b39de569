//! Physical-contact notification payload.

use crate::{CharacterId, Point};

/// Something touched a character this tick.
///
/// Produced by the host's contact detection and routed to the current
/// behavior unit and the scheduler's registered leaf.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Contact {
    /// The other character, or `None` for static scenery.
    pub other: Option<CharacterId>,
    /// Where the touch happened.
    pub point: Point,
    /// Penetration depth in metres; larger means a harder bump.
    pub depth: f32,
}
