//! Shared props and first-come-first-served arbitration.
//!
//! A prop (a keg, a chair, the bar's only mop) can be held by one character
//! at a time.  Characters that ask while it is taken queue up and are served
//! in arrival order.  The table is shared between characters through an
//! `Arc`, so each arbiter sits behind its own lock.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{trace, warn};

use npc_core::{CharacterId, Point, PropId};

// ── Arbiter ───────────────────────────────────────────────────────────────────

/// FCFS ownership of one prop.
#[derive(Debug, Clone)]
pub struct Arbiter {
    position: Point,
    holder:   Option<CharacterId>,
    waiting:  VecDeque<CharacterId>,
}

impl Arbiter {
    pub fn new(position: Point) -> Self {
        Self { position, holder: None, waiting: VecDeque::new() }
    }

    /// Take the prop if it is free and `who` is first in line.  Otherwise
    /// `who` joins the line (once) and `false` is returned.
    pub fn acquire(&mut self, who: CharacterId) -> bool {
        if self.holder == Some(who) {
            return true;
        }
        let first = self.waiting.front().is_none_or(|&w| w == who);
        if self.holder.is_none() && first {
            if self.waiting.front() == Some(&who) {
                self.waiting.pop_front();
            }
            self.holder = Some(who);
            return true;
        }
        if !self.waiting.contains(&who) {
            self.waiting.push_back(who);
        }
        false
    }

    /// Give the prop back.  `false` if `who` was not holding it.
    pub fn release(&mut self, who: CharacterId) -> bool {
        if self.holder != Some(who) {
            return false;
        }
        self.holder = None;
        true
    }

    /// Leave the line without taking the prop.
    pub fn cancel(&mut self, who: CharacterId) {
        self.waiting.retain(|&w| w != who);
    }

    #[inline]
    pub fn holder(&self) -> Option<CharacterId> {
        self.holder
    }

    #[inline]
    pub fn position(&self) -> Point {
        self.position
    }

    pub fn set_position(&mut self, position: Point) {
        self.position = position;
    }

    pub fn queue_len(&self) -> usize {
        self.waiting.len()
    }

    /// Where `who` stands: 0 for the holder, 1 and up for the line in
    /// arrival order, `None` when `who` has not asked.
    pub fn queue_position(&self, who: CharacterId) -> Option<usize> {
        if self.holder == Some(who) {
            return Some(0);
        }
        self.waiting.iter().position(|&w| w == who).map(|i| i + 1)
    }
}

// ── PropTable ─────────────────────────────────────────────────────────────────

struct Prop {
    name:    String,
    arbiter: Mutex<Arbiter>,
}

/// Every prop in a scene.  Built up front, then shared read-only (the locks
/// provide the mutation).
#[derive(Default)]
pub struct PropTable {
    props: Vec<Prop>,
}

impl PropTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: impl Into<String>, position: Point) -> PropId {
        let id = PropId(self.props.len() as u32);
        self.props.push(Prop { name: name.into(), arbiter: Mutex::new(Arbiter::new(position)) });
        id
    }

    pub fn len(&self) -> usize {
        self.props.len()
    }

    pub fn is_empty(&self) -> bool {
        self.props.is_empty()
    }

    pub fn find(&self, name: &str) -> Option<PropId> {
        self.props.iter().position(|p| p.name == name).map(|i| PropId(i as u32))
    }

    pub fn name(&self, prop: PropId) -> Option<&str> {
        self.props.get(prop.index()).map(|p| p.name.as_str())
    }

    /// Run `f` with the prop's arbiter locked.  `None` for an unknown prop.
    ///
    /// A lock poisoned by a panicking holder is recovered: the arbiter's
    /// state is always consistent between calls.
    pub fn with<R>(&self, prop: PropId, f: impl FnOnce(&mut Arbiter) -> R) -> Option<R> {
        let Some(p) = self.props.get(prop.index()) else {
            warn!(%prop, "unknown prop");
            return None;
        };
        let mut guard: MutexGuard<'_, Arbiter> =
            p.arbiter.lock().unwrap_or_else(PoisonError::into_inner);
        Some(f(&mut guard))
    }

    pub fn acquire(&self, prop: PropId, who: CharacterId) -> bool {
        let got = self.with(prop, |a| a.acquire(who)).unwrap_or(false);
        trace!(%prop, %who, got, "prop acquire");
        got
    }

    pub fn release(&self, prop: PropId, who: CharacterId) -> bool {
        self.with(prop, |a| a.release(who)).unwrap_or(false)
    }

    pub fn cancel(&self, prop: PropId, who: CharacterId) {
        self.with(prop, |a| a.cancel(who));
    }

    pub fn holder(&self, prop: PropId) -> Option<CharacterId> {
        self.with(prop, |a| a.holder()).flatten()
    }

    /// See [`Arbiter::queue_position`].  `None` also for an unknown prop.
    pub fn queue_position(&self, prop: PropId, who: CharacterId) -> Option<usize> {
        self.with(prop, |a| a.queue_position(who)).flatten()
    }

    pub fn position(&self, prop: PropId) -> Option<Point> {
        self.with(prop, |a| a.position())
    }
}

impl std::fmt::Debug for PropTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.props.iter().map(|p| &p.name)).finish()
    }
}
