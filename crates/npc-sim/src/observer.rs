//! Simulation observer trait and the plain data it receives.

use npc_core::{AnimId, CharacterId, Point, PropId, Tick};

/// One character's observable state at a snapshot tick.
#[derive(Debug, Clone, PartialEq)]
pub struct CharacterSnapshot {
    pub id:        CharacterId,
    pub position:  Point,
    pub facing:    f32,
    /// `Debug` name of the current behavior unit.
    pub unit:      String,
    /// Name of the scheduler's active root, if any.
    pub root:      Option<String>,
    pub animation: AnimId,
    pub moving:    bool,
    pub holding:   Option<PropId>,
}

/// Per-tick counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickStats {
    /// Characters whose scheduler has a root queued.
    pub busy:     usize,
    /// Characters following a path.
    pub moving:   usize,
    /// Contact notifications delivered this tick.
    pub contacts: usize,
    pub gestures: usize,
}

/// Callbacks invoked by [`Sim::run`][crate::Sim::run] at tick boundaries.
///
/// All methods default to no-ops.
///
/// ```rust,ignore
/// struct Progress;
///
/// impl SimObserver for Progress {
///     fn on_tick_end(&mut self, tick: Tick, stats: &TickStats) {
///         if tick.0 % 300 == 0 {
///             println!("{tick}: {} busy, {} walking", stats.busy, stats.moving);
///         }
///     }
/// }
/// ```
pub trait SimObserver {
    fn on_tick_start(&mut self, _tick: Tick) {}

    fn on_tick_end(&mut self, _tick: Tick, _stats: &TickStats) {}

    /// Every `config.output_interval_ticks` ticks, in ascending id order.
    fn on_snapshot(&mut self, _tick: Tick, _characters: &[CharacterSnapshot]) {}

    fn on_sim_end(&mut self, _final_tick: Tick) {}
}

/// A [`SimObserver`] that does nothing.
pub struct NoopObserver;

impl SimObserver for NoopObserver {}
