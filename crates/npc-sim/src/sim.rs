//! The `Sim` struct and its three-phase tick loop.

use std::sync::Arc;

use tracing::{debug, info};

use npc_core::{CharacterId, Contact, Frame, SimClock, SimConfig, Tick};
use npc_dispatch::{Gesture, Permission, UnitKind};
use npc_nav::WaypointGraph;

use crate::{Character, CharacterSnapshot, PropTable, SimError, SimObserver, SimResult, TickStats};

/// The host loop.
///
/// Each tick runs three phases over every character:
///
/// 1. **Fixed**: walking and turning, the dispatcher's fixed phase, then
///    contact detection.  Characters closer than `config.contact_radius`
///    on the ground plane both receive a [`Contact`].
/// 2. **Update**: queued gestures, the current unit's update, one scheduler
///    validation pass, and the in-progress leaf's `tick`.
/// 3. **Late**: animation blends finish and animation-changed is routed,
///    then the late phase.
///
/// Characters never read each other's state inside a phase, so with the
/// `parallel` feature every phase runs on Rayon's pool.  Contact detection
/// between phases is sequential and in ascending id order.
///
/// Create via [`SimBuilder`][crate::SimBuilder].
pub struct Sim<K: UnitKind> {
    pub config: SimConfig,
    pub clock:  SimClock,

    /// Indexed by `CharacterId`.
    pub characters: Vec<Character<K>>,

    /// Shared with every character's body.
    pub props: Arc<PropTable>,
    pub graph: Arc<WaypointGraph>,

    #[cfg(feature = "parallel")]
    pub(crate) pool: Option<rayon::ThreadPool>,
}

impl<K: UnitKind> Sim<K> {
    // ── Public API ────────────────────────────────────────────────────────

    /// Run from the current tick to `config.end_tick()`.
    pub fn run<O: SimObserver>(&mut self, observer: &mut O) -> SimResult<()> {
        info!(characters = self.characters.len(), ticks = self.config.total_ticks, "run start");
        while self.clock.current_tick < self.config.end_tick() {
            self.step(observer);
        }
        observer.on_sim_end(self.clock.current_tick);
        info!(final_tick = %self.clock.current_tick, "run end");
        Ok(())
    }

    /// Run exactly `n` ticks from the current position, ignoring `end_tick`.
    pub fn run_ticks<O: SimObserver>(&mut self, n: u64, observer: &mut O) -> SimResult<()> {
        for _ in 0..n {
            self.step(observer);
        }
        Ok(())
    }

    fn step<O: SimObserver>(&mut self, observer: &mut O) {
        let now = self.clock.current_tick;
        observer.on_tick_start(now);
        let stats = self.process_tick(self.clock.frame());
        observer.on_tick_end(now, &stats);
        let interval = self.config.output_interval_ticks;
        if interval > 0 && now.0 % interval == 0 {
            observer.on_snapshot(now, &self.snapshots());
        }
        self.clock.advance();
    }

    pub fn character(&self, id: CharacterId) -> SimResult<&Character<K>> {
        self.characters.get(id.index()).ok_or(SimError::CharacterNotFound(id))
    }

    pub fn character_mut(&mut self, id: CharacterId) -> SimResult<&mut Character<K>> {
        self.characters.get_mut(id.index()).ok_or(SimError::CharacterNotFound(id))
    }

    /// Switch a character's unit from outside (a cutscene, a quest trigger).
    pub fn set_task(&mut self, id: CharacterId, kind: K, outcome: Option<bool>) -> SimResult<()> {
        self.character_mut(id)?.set_task(kind, outcome);
        Ok(())
    }

    pub fn request_permission(&self, id: CharacterId, permission: Permission) -> SimResult<bool> {
        Ok(self.character(id)?.request_permission(permission))
    }

    pub fn is_unit_active(&self, id: CharacterId, kind: K) -> SimResult<bool> {
        Ok(self.character(id)?.dispatcher.is_unit_active(kind))
    }

    /// Queue `gesture` for one character's next update phase.
    pub fn gesture(&mut self, to: CharacterId, gesture: Gesture) -> SimResult<()> {
        self.character_mut(to)?.queue_gesture(gesture);
        Ok(())
    }

    /// Queue `gesture` for every character within `radius` of where it was
    /// made, except its source.  Returns how many will receive it.
    pub fn broadcast(&mut self, gesture: Gesture, radius: f32) -> usize {
        let mut n = 0;
        for c in &mut self.characters {
            if Some(c.id()) == gesture.source || !c.body.is_near(gesture.at, radius) {
                continue;
            }
            c.queue_gesture(gesture.clone());
            n += 1;
        }
        n
    }

    pub fn snapshots(&self) -> Vec<CharacterSnapshot> {
        self.characters.iter().map(Character::snapshot).collect()
    }

    // ── Core tick processing ──────────────────────────────────────────────

    fn process_tick(&mut self, frame: Frame) -> TickStats {
        // ── Phase 1: fixed update and contacts ────────────────────────────
        self.for_each(|c| {
            c.fixed_update(frame);
            0
        });
        let found = detect_contacts(&self.characters, self.config.contact_radius);
        for (id, contact) in found {
            self.characters[id.index()].queue_contact(contact);
        }
        let contacts = self.for_each(Character::deliver_contacts);

        // ── Phase 2: update ───────────────────────────────────────────────
        let gestures = self.for_each(|c| c.update(frame));

        // ── Phase 3: late update ──────────────────────────────────────────
        self.for_each(|c| {
            c.late_update(frame);
            0
        });

        let stats = TickStats {
            busy:     self.characters.iter().filter(|c| c.is_busy()).count(),
            moving:   self.characters.iter().filter(|c| c.body.is_moving()).count(),
            contacts,
            gestures,
        };
        if contacts > 0 || gestures > 0 {
            debug!(tick = %frame.tick, contacts, gestures, "tick events");
        }
        stats
    }

    /// Run `f` on every character and sum what it returns.
    #[cfg(not(feature = "parallel"))]
    fn for_each<F>(&mut self, f: F) -> usize
    where
        F: Fn(&mut Character<K>) -> usize + Send + Sync,
    {
        self.characters.iter_mut().map(f).sum()
    }

    #[cfg(feature = "parallel")]
    fn for_each<F>(&mut self, f: F) -> usize
    where
        F: Fn(&mut Character<K>) -> usize + Send + Sync,
    {
        use rayon::prelude::*;

        let characters = &mut self.characters;
        match &self.pool {
            Some(pool) => pool.install(|| characters.par_iter_mut().map(f).sum()),
            None => characters.par_iter_mut().map(f).sum(),
        }
    }

    /// Advance one tick by hand, without an observer.
    pub fn tick(&mut self) -> TickStats {
        let stats = self.process_tick(self.clock.frame());
        self.clock.advance();
        stats
    }

    #[inline]
    pub fn now(&self) -> Tick {
        self.clock.current_tick
    }
}

// ── Contact detection ─────────────────────────────────────────────────────────

/// Every pair closer than `radius` on the ground plane, reported to both
/// sides, in ascending id order.
fn detect_contacts<K: UnitKind>(characters: &[Character<K>], radius: f32) -> Vec<(CharacterId, Contact)> {
    let mut out = Vec::new();
    if radius <= 0.0 {
        return out;
    }
    for (i, a) in characters.iter().enumerate() {
        for b in &characters[i + 1..] {
            let (pa, pb) = (a.body.position, b.body.position);
            let dist = pa.planar_distance(pb);
            if dist >= radius {
                continue;
            }
            let depth = radius - dist;
            out.push((a.id(), Contact { other: Some(b.id()), point: pb, depth }));
            out.push((b.id(), Contact { other: Some(a.id()), point: pa, depth }));
        }
    }
    out.sort_by_key(|(id, _)| *id);
    out
}
