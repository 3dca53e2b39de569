//! The `BehaviorUnit` trait and the context its hooks receive.

use std::fmt::Debug;
use std::hash::Hash;

use strum::{EnumCount, IntoEnumIterator};
use tracing::error;

use npc_core::{AnimId, Contact, Frame, NodeId};
use npc_sched::{Scheduler, Settlement, Task};

use crate::{DispatchError, DispatchResult, Gesture, Permission};

// ── UnitKind ──────────────────────────────────────────────────────────────────

/// The closed set of behavior kinds a character can be in.
///
/// Implemented automatically for any fieldless enum deriving
/// `strum::EnumIter` and `strum::EnumCount`.  Declaration order is
/// registration order.
pub trait UnitKind:
    Copy + Eq + Hash + Debug + IntoEnumIterator + EnumCount + Send + Sync + 'static
{
}

impl<T> UnitKind for T where
    T: Copy + Eq + Hash + Debug + IntoEnumIterator + EnumCount + Send + Sync + 'static
{
}

// ── UnitCx ────────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub(crate) struct Requests<K> {
    pub(crate) next: Option<(K, Option<bool>)>,
    pub(crate) poll: bool,
}

impl<K> Default for Requests<K> {
    fn default() -> Self {
        Self { next: None, poll: false }
    }
}

/// What a unit hook may touch: the character state, the character's
/// scheduler, and transition requests to the dispatcher.
///
/// A requested `set_task` is applied after the hook returns.
pub struct UnitCx<'a, K, C> {
    pub ctx:       &'a mut C,
    scheduler:     &'a mut Scheduler<C>,
    me:            K,
    frame:         Frame,
    transitioning: bool,
    requests:      &'a mut Requests<K>,
}

impl<'a, K: UnitKind, C> UnitCx<'a, K, C> {
    pub(crate) fn new(
        ctx:           &'a mut C,
        scheduler:     &'a mut Scheduler<C>,
        me:            K,
        frame:         Frame,
        transitioning: bool,
        requests:      &'a mut Requests<K>,
    ) -> Self {
        Self { ctx, scheduler, me, frame, transitioning, requests }
    }

    /// The kind of the unit being called.
    #[inline]
    pub fn me(&self) -> K {
        self.me
    }

    #[inline]
    pub fn frame(&self) -> Frame {
        self.frame
    }

    #[inline]
    pub fn scheduler(&self) -> &Scheduler<C> {
        &*self.scheduler
    }

    #[inline]
    pub fn scheduler_mut(&mut self) -> &mut Scheduler<C> {
        &mut *self.scheduler
    }

    pub fn spawn(&mut self, name: impl Into<String>, task: impl Task<C> + 'static) -> NodeId {
        self.scheduler.spawn(name, task)
    }

    pub fn set_autonomy(&mut self, root: NodeId) {
        self.scheduler.set_autonomy(root, self.ctx);
    }

    pub fn interrupt(&mut self, root: NodeId) -> bool {
        self.scheduler.interrupt(root, self.ctx)
    }

    pub fn remove_by_name(&mut self, name: &str) -> Option<NodeId> {
        self.scheduler.remove_by_name(name, self.ctx)
    }

    /// Discard every queued root.
    pub fn clear_scheduler(&mut self) {
        self.scheduler.clear(self.ctx);
    }

    /// Ask to be consulted, through
    /// [`regain_control`][BehaviorUnit::regain_control], on the next
    /// transition that carries an outcome.
    pub fn poll_next_outcome(&mut self) {
        self.requests.poll = true;
    }

    /// Request a switch to `kind` once this hook returns.
    ///
    /// Fails with [`DispatchError::Reentrant`] inside an activation or
    /// deactivation hook.  The last request made by one hook wins.
    pub fn try_set_task(&mut self, kind: K, outcome: Option<bool>) -> DispatchResult<()> {
        if self.transitioning {
            return Err(DispatchError::Reentrant { requested: format!("{kind:?}") });
        }
        self.requests.next = Some((kind, outcome));
        Ok(())
    }

    /// [`try_set_task`][Self::try_set_task], panicking on re-entry.
    #[track_caller]
    pub fn set_task(&mut self, kind: K, outcome: Option<bool>) {
        if let Err(err) = self.try_set_task(kind, outcome) {
            error!(unit = ?self.me, %err, "dispatcher invariant violated");
            panic!("{err}");
        }
    }
}

// ── BehaviorUnit ──────────────────────────────────────────────────────────────

/// A top-level named behavior.  Exactly one unit per character is current.
///
/// Every hook has a default, so a unit implements only what it cares about.
/// Phase and event hooks run only on the current unit; `on_gesture` may run
/// on any unit (see [`Dispatcher::gesture`][crate::Dispatcher::gesture]).
pub trait BehaviorUnit<K: UnitKind, C>: Send {
    fn on_activate(&mut self, _cx: &mut UnitCx<'_, K, C>) {}

    fn on_deactivate(&mut self, _cx: &mut UnitCx<'_, K, C>) {}

    fn fixed_update(&mut self, _cx: &mut UnitCx<'_, K, C>) {}

    fn update(&mut self, _cx: &mut UnitCx<'_, K, C>) {}

    fn late_update(&mut self, _cx: &mut UnitCx<'_, K, C>) {}

    fn on_animation_change(&mut self, _cx: &mut UnitCx<'_, K, C>, _old: AnimId, _new: AnimId) {}

    fn on_contact(&mut self, _cx: &mut UnitCx<'_, K, C>, _contact: &Contact) {}

    /// A root left the scheduler's queue while this unit was current.
    fn on_settled(&mut self, _settlement: &Settlement, _cx: &mut UnitCx<'_, K, C>) {}

    /// Called on the polling unit when a transition reports `outcome`.
    /// Return `true` to become current again instead of the requested unit.
    fn regain_control(&mut self, _outcome: bool, _cx: &mut UnitCx<'_, K, C>) -> bool {
        false
    }

    /// May a foreign subsystem perform `permission` right now?
    fn permits(&self, _permission: Permission) -> bool {
        true
    }

    /// Return `true` if the gesture was handled.
    fn on_gesture(&mut self, _gesture: &Gesture, _cx: &mut UnitCx<'_, K, C>) -> bool {
        false
    }
}
