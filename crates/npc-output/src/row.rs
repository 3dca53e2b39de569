//! Plain data row types written by output backends.

use npc_sim::CharacterSnapshot;

/// One character's state at a snapshot tick, flattened for tabular output.
#[derive(Debug, Clone, PartialEq)]
pub struct CharacterSnapshotRow {
    pub character_id: u32,
    pub tick:         u64,
    pub x:            f32,
    pub y:            f32,
    pub z:            f32,
    /// Yaw in radians.
    pub facing:       f32,
    pub unit:         String,
    /// Active root name; empty when the scheduler is idle.
    pub root:         String,
    pub animation:    u16,
    pub moving:       bool,
    /// Held prop id; `u32::MAX` when empty-handed.
    pub holding:      u32,
}

impl CharacterSnapshotRow {
    pub fn from_snapshot(tick: u64, s: &CharacterSnapshot) -> Self {
        Self {
            character_id: s.id.0,
            tick,
            x:            s.position.x,
            y:            s.position.y,
            z:            s.position.z,
            facing:       s.facing,
            unit:         s.unit.clone(),
            root:         s.root.clone().unwrap_or_default(),
            animation:    s.animation.0,
            moving:       s.moving,
            holding:      s.holding.map_or(u32::MAX, |p| p.0),
        }
    }
}

/// Summary statistics for one simulation tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickSummaryRow {
    pub tick:         u64,
    /// Simulated seconds at the start of the tick.
    pub elapsed_secs: f64,
    pub busy:         u64,
    pub moving:       u64,
    pub contacts:     u64,
    pub gestures:     u64,
}
