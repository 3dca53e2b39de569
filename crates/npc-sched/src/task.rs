//! The `Task` trait: what a behavior node actually does.

use std::marker::PhantomData;

use npc_core::{AnimId, Contact, Frame, NodeId, Tick};

use crate::{Commands, Status};

// ── NodeCx ────────────────────────────────────────────────────────────────────

/// Everything a node callback may touch.
///
/// `ctx` is the character state the scheduler is driving (body, animator,
/// locomotion, …).  `cmds` is the only way to affect other nodes or the
/// queue; see [`Commands`].
pub struct NodeCx<'a, C> {
    pub ctx:  &'a mut C,
    pub cmds: &'a mut Commands,
    id:       NodeId,
    name:     &'a str,
    frame:    Frame,
}

impl<'a, C> NodeCx<'a, C> {
    pub(crate) fn new(
        ctx:   &'a mut C,
        cmds:  &'a mut Commands,
        id:    NodeId,
        name:  &'a str,
        frame: Frame,
    ) -> Self {
        Self { ctx, cmds, id, name, frame }
    }

    /// Handle of the node being called.
    #[inline]
    pub fn id(&self) -> NodeId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        self.name
    }

    #[inline]
    pub fn frame(&self) -> Frame {
        self.frame
    }

    #[inline]
    pub fn tick(&self) -> Tick {
        self.frame.tick
    }
}

// ── Task ──────────────────────────────────────────────────────────────────────

/// Behavior attached to a node.
///
/// Only [`progress`][Self::progress] is required.  Every other method is a
/// callback slot with a no-op default:
///
/// | Slot                    | Fires when                                          |
/// |-------------------------|-----------------------------------------------------|
/// | `on_registered`         | node becomes the in-progress leaf (or its passive)  |
/// | `on_unregistered`       | node stops being registered                         |
/// | `on_reset`              | `NodeTree::reset` clears the node                   |
/// | `fixed_tick` / `tick` / `late_tick` | each phase, only while registered       |
/// | `on_animation_change`   | the character's animation changed, while registered |
/// | `on_contact`            | something touched the character, while registered   |
/// | `on_forced_success`     | the node is flagged for success                     |
/// | `on_removed`            | the node was a root dropped from the queue          |
///
/// `progress` must not have side effects beyond what the tick callbacks
/// already produce; it may be called on nodes that are not registered
/// (passives of an ancestor are evaluated that way).
pub trait Task<C>: Send {
    /// Evaluate the node.  Called at most once per validation pass, and only
    /// after every requirement has succeeded.
    fn progress(&mut self, cx: &mut NodeCx<'_, C>) -> Status;

    fn on_registered(&mut self, _cx: &mut NodeCx<'_, C>) {}

    fn on_unregistered(&mut self, _cx: &mut NodeCx<'_, C>) {}

    /// Clear per-run state.  No character context is available here: reset
    /// happens while trees are being rebuilt.
    fn on_reset(&mut self) {}

    fn fixed_tick(&mut self, _cx: &mut NodeCx<'_, C>) {}

    fn tick(&mut self, _cx: &mut NodeCx<'_, C>) {}

    fn late_tick(&mut self, _cx: &mut NodeCx<'_, C>) {}

    fn on_animation_change(&mut self, _cx: &mut NodeCx<'_, C>, _old: AnimId, _new: AnimId) {}

    fn on_contact(&mut self, _cx: &mut NodeCx<'_, C>, _contact: &Contact) {}

    fn on_forced_success(&mut self) {}

    fn on_removed(&mut self, _cx: &mut NodeCx<'_, C>) {}
}

// ── Closure tasks ─────────────────────────────────────────────────────────────

/// A [`Task`] built from a closure; see [`from_fn`].
pub struct FnTask<C, F> {
    f:       F,
    _marker: PhantomData<fn(&mut C)>,
}

/// Wrap a closure as a task that has nothing but a `progress` body.
///
/// Handy for predicate roots ("am I there and facing it?").  When the
/// context type can't be inferred from the closure, prefer
/// [`NodeTree::spawn_fn`][crate::NodeTree::spawn_fn].
pub fn from_fn<C, F>(f: F) -> FnTask<C, F>
where
    F: FnMut(&mut NodeCx<'_, C>) -> Status + Send,
{
    FnTask { f, _marker: PhantomData }
}

impl<C, F> Task<C> for FnTask<C, F>
where
    F: FnMut(&mut NodeCx<'_, C>) -> Status + Send,
{
    fn progress(&mut self, cx: &mut NodeCx<'_, C>) -> Status {
        (self.f)(cx)
    }
}
