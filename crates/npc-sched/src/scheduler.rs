//! `Scheduler`: the per-character root queue and validation pass.
//!
//! # Tick anatomy
//!
//! ```text
//! progress(ctx, frame)
//!   └─ visit(front root)                    one depth-first pass
//!        ├─ passives          → visit as passives (never gate the parent)
//!        ├─ forced flag?      → conclude, return
//!        ├─ requirements[i]   → visit in order
//!        │     Failure → conclude parent Failure (short-circuit)
//!        │     Running → return Running (that branch holds the leaf)
//!        ├─ register as in-progress leaf (unregister the previous one first)
//!        └─ task.progress()   → cache if settled
//!   └─ root settled?          → dequeue, unregister, record Settlement
//!   └─ apply deferred structural commands
//! dispatch(phase, ctx, frame)  → leaf + registered passives only
//! ```
//!
//! Only the in-progress leaf and the passives registered with it receive
//! phase callbacks.  Routing is a direct call from [`Scheduler::dispatch`],
//! so there is nothing to subscribe or unsubscribe.

use std::collections::VecDeque;

use tracing::{debug, trace, warn};

use npc_core::{AnimId, Contact, Frame, NodeId};

use crate::commands::Command;
use crate::error::violation;
use crate::tree::Link;
use crate::{
    Commands, Conclusion, NodeCx, NodeEvent, NodeTree, Settlement, Status, Task, TreeError,
};

/// Which per-phase callback [`Scheduler::dispatch`] delivers.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    Fixed,
    Update,
    Late,
}

#[derive(Copy, Clone, PartialEq, Eq)]
enum Mode {
    /// Walking the requirement chain of the active root; may move the leaf.
    Gating,
    /// Evaluating a passive branch; never touches registration.
    Passive,
}

/// The pass was abandoned because the break-hint went up.
struct Aborted;

type Visit = Result<Status, Aborted>;

// ── Scheduler ─────────────────────────────────────────────────────────────────

/// Owns one character's node arena and root queue.
pub struct Scheduler<C> {
    tree:        NodeTree<C>,
    queue:       VecDeque<NodeId>,
    in_progress: Option<NodeId>,
    /// The leaf first, then every passive registered with it.
    registered:  Vec<NodeId>,
    break_hint:  bool,
    in_pass:     bool,
    cmds:        Commands,
    deferred:    Vec<Command>,
    settlements: Vec<Settlement>,
    frame:       Frame,
}

impl<C> Default for Scheduler<C> {
    fn default() -> Self {
        Self {
            tree:        NodeTree::new(),
            queue:       VecDeque::new(),
            in_progress: None,
            registered:  Vec::new(),
            break_hint:  false,
            in_pass:     false,
            cmds:        Commands::default(),
            deferred:    Vec::new(),
            settlements: Vec::new(),
            frame:       Frame::default(),
        }
    }
}

impl<C> Scheduler<C> {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Tree access ───────────────────────────────────────────────────────

    #[inline]
    pub fn tree(&self) -> &NodeTree<C> {
        &self.tree
    }

    #[inline]
    pub fn tree_mut(&mut self) -> &mut NodeTree<C> {
        &mut self.tree
    }

    /// Shorthand for `tree_mut().spawn(..)`.
    pub fn spawn(&mut self, name: impl Into<String>, task: impl Task<C> + 'static) -> NodeId {
        self.tree.spawn(name, task)
    }

    // ── Introspection ─────────────────────────────────────────────────────

    /// The registered in-progress leaf, if any.
    #[inline]
    pub fn in_progress(&self) -> Option<NodeId> {
        self.in_progress
    }

    /// The active root.
    #[inline]
    pub fn front(&self) -> Option<NodeId> {
        self.queue.front().copied()
    }

    #[inline]
    pub fn queue(&self) -> &VecDeque<NodeId> {
        &self.queue
    }

    /// Every registered node: the leaf first, then its passives.
    #[inline]
    pub fn registered(&self) -> &[NodeId] {
        &self.registered
    }

    #[inline]
    pub fn is_idle(&self) -> bool {
        self.queue.is_empty()
    }

    /// Did the most recent pass raise the break-hint?
    #[inline]
    pub fn break_hint(&self) -> bool {
        self.break_hint
    }

    /// Is an unfinished root called `name` queued?
    pub fn contains_root_named(&self, name: &str) -> bool {
        self.queue.iter().any(|&r| self.tree.name(r) == name)
    }

    /// Hand over every settlement recorded since the last drain, oldest first.
    pub fn drain_settlements(&mut self) -> std::vec::Drain<'_, Settlement> {
        self.settlements.drain(..)
    }

    // ── Queue operations ──────────────────────────────────────────────────

    /// Discard every queued root and install `root` as the only one.
    ///
    /// Discarded roots settle as [`Conclusion::Removed`].  Panics if `root`
    /// is linked under another node or has concluded without a reset.
    pub fn set_autonomy(&mut self, root: NodeId, ctx: &mut C) {
        self.set_autonomy_now(root, ctx);
        self.flush(ctx);
    }

    /// Put `root` in front of the active root without discarding anything.
    ///
    /// Returns `false` and leaves the queue alone when an unfinished root
    /// with the same name is already queued.
    pub fn interrupt(&mut self, root: NodeId, ctx: &mut C) -> bool {
        let accepted = self.interrupt_now(root, ctx);
        self.flush(ctx);
        accepted
    }

    /// Discard the first queued root called `name`, wherever it sits.
    pub fn remove_by_name(&mut self, name: &str, ctx: &mut C) -> Option<NodeId> {
        let removed = self.remove_now(name, ctx);
        self.flush(ctx);
        removed
    }

    /// Discard every queued root.
    pub fn clear(&mut self, ctx: &mut C) {
        self.unregister_all(ctx);
        while let Some(root) = self.queue.pop_front() {
            self.retire(root, ctx);
        }
        self.flush(ctx);
    }

    fn set_autonomy_now(&mut self, root: NodeId, ctx: &mut C) {
        if self.queue.len() == 1 && self.queue[0] == root {
            return;
        }
        if !self.tree.node(root).queued {
            self.check_root(root);
        }
        self.unregister_all(ctx);
        let old: Vec<NodeId> = self.queue.drain(..).collect();
        for r in old.into_iter().filter(|&r| r != root) {
            self.retire(r, ctx);
        }
        self.queue.push_back(root);
        self.tree.node_mut(root).queued = true;
        debug!(%root, name = self.tree.name(root), "autonomy set");
    }

    fn interrupt_now(&mut self, root: NodeId, ctx: &mut C) -> bool {
        let name = self.tree.name(root);
        if self.contains_root_named(name) {
            warn!(%root, name, "interrupt refused: a root with this name is still queued");
            return false;
        }
        self.check_root(root);
        self.unregister_all(ctx);
        self.queue.push_front(root);
        self.tree.node_mut(root).queued = true;
        debug!(%root, name = self.tree.name(root), queued = self.queue.len(), "interrupted");
        true
    }

    fn remove_now(&mut self, name: &str, ctx: &mut C) -> Option<NodeId> {
        let pos = self.queue.iter().position(|&r| self.tree.name(r) == name)?;
        if pos == 0 {
            self.unregister_all(ctx);
        }
        let root = self.queue.remove(pos)?;
        self.retire(root, ctx);
        Some(root)
    }

    /// A root may be installed only when it is detached and unconcluded.
    fn check_root(&self, root: NodeId) {
        let node = self.tree.node(root);
        if let Some((parent, _)) = node.parent {
            violation(TreeError::AlreadyAttached { child: root, parent });
        }
        if node.queued {
            violation(TreeError::QueuedRoot(root));
        }
        if node.result.is_settled() {
            violation(TreeError::Concluded(root));
        }
    }

    /// Silent terminal transition for a root leaving the queue unconcluded.
    fn retire(&mut self, root: NodeId, ctx: &mut C) {
        self.tree.node_mut(root).queued = false;
        self.invoke(root, ctx, |task, cx| task.on_removed(cx));
        self.tree.emit(root, NodeEvent::Removed);
        let name = self.tree.name(root).to_owned();
        debug!(%root, %name, "root removed");
        self.settlements.push(Settlement { root, name, conclusion: Conclusion::Removed });
    }

    // ── Validation pass ───────────────────────────────────────────────────

    /// Run one validation pass over the active root.
    ///
    /// Returns the root's status after the pass, or `None` when the queue is
    /// empty or the pass was abandoned on the break-hint.  A settled root is
    /// dequeued here; the next root is first visited on the following call.
    ///
    /// An abandoned pass leaves registration as it stood when the hint went
    /// up.  The one exception is a break raised from a new leaf's
    /// `on_registered`: the previous leaf is already unregistered by then, so
    /// the new leaf stays registered and the next pass keeps it without
    /// firing `on_registered` again.
    pub fn progress(&mut self, ctx: &mut C, frame: Frame) -> Option<Status> {
        self.frame = frame;
        self.break_hint = false;
        let root = self.front()?;

        self.in_pass = true;
        let outcome = self.visit(root, Mode::Gating, ctx);
        self.in_pass = false;

        let result = match outcome {
            Ok(status) => {
                if status.is_settled() {
                    self.settle_front(root, status, ctx);
                }
                Some(status)
            }
            Err(Aborted) => {
                debug!(%root, tick = %frame.tick, "validation pass abandoned");
                None
            }
        };
        self.flush(ctx);
        result
    }

    fn visit(&mut self, id: NodeId, mode: Mode, ctx: &mut C) -> Visit {
        let settled = self.tree.node(id).result;
        if settled.is_settled() {
            return Ok(settled);
        }

        // Passives first: a flag carried down to them resolves in the same
        // visit as their parent's.
        let mut i = 0;
        while let Some(p) = self.tree.node(id).child(Link::Passive, i) {
            self.visit(p, Mode::Passive, ctx)?;
            if self.break_hint {
                return Err(Aborted);
            }
            i += 1;
        }

        if let Some(forced) = self.tree.node(id).forced() {
            self.conclude(id, forced, ctx);
            return Ok(forced);
        }

        let mut i = 0;
        while let Some(r) = self.tree.node(id).child(Link::Requirement, i) {
            let status = self.visit(r, mode, ctx)?;
            if self.break_hint {
                return Err(Aborted);
            }
            match status {
                Status::Success => i += 1,
                Status::Running => return Ok(Status::Running),
                Status::Failure => {
                    self.conclude(id, Status::Failure, ctx);
                    return Ok(Status::Failure);
                }
            }
        }

        if mode == Mode::Gating {
            self.make_leaf(id, ctx);
            if self.break_hint {
                return Err(Aborted);
            }
        }
        // A flag raised by a callback earlier in this pass wins over progress.
        if let Some(forced) = self.tree.node(id).forced() {
            self.conclude(id, forced, ctx);
            return Ok(forced);
        }

        let status = self.invoke(id, ctx, |task, cx| task.progress(cx));
        if status.is_settled() {
            self.conclude(id, status, ctx);
        }
        Ok(status)
    }

    fn conclude(&mut self, id: NodeId, status: Status, ctx: &mut C) {
        let node = self.tree.node_mut(id);
        node.result = status;
        let registered = node.registered;
        debug!(node = %id, name = self.tree.name(id), %status, "node concluded");
        self.tree.emit(id, NodeEvent::Concluded(status));
        // The leaf keeps its registration until it is replaced; a settled
        // passive drops out straight away.
        if registered && self.in_progress != Some(id) {
            self.unregister_branch(id, ctx);
        }
    }

    fn settle_front(&mut self, root: NodeId, status: Status, ctx: &mut C) {
        self.queue.pop_front();
        self.tree.node_mut(root).queued = false;
        self.unregister_all(ctx);
        let Some(conclusion) = Conclusion::from_status(status) else {
            return;
        };
        let name = self.tree.name(root).to_owned();
        debug!(%root, %name, ?conclusion, "root settled");
        self.settlements.push(Settlement { root, name, conclusion });
    }

    // ── Registration ──────────────────────────────────────────────────────

    /// Unregister the old leaf, then register `id`.  Never the other way
    /// round, even if `id`'s `on_registered` raises the break-hint.
    fn make_leaf(&mut self, id: NodeId, ctx: &mut C) {
        if self.in_progress == Some(id) {
            return;
        }
        self.unregister_all(ctx);
        self.in_progress = Some(id);
        self.register_branch(id, ctx);
    }

    /// Register `id` and, transitively, its unsettled passives.
    fn register_branch(&mut self, id: NodeId, ctx: &mut C) {
        let node = self.tree.node_mut(id);
        if node.registered || node.result.is_settled() {
            return;
        }
        node.registered = true;
        self.registered.push(id);
        trace!(node = %id, name = self.tree.name(id), "registered");
        self.invoke(id, ctx, |task, cx| task.on_registered(cx));
        self.tree.emit(id, NodeEvent::Registered);

        let mut i = 0;
        while let Some(p) = self.tree.node(id).child(Link::Passive, i) {
            self.register_branch(p, ctx);
            i += 1;
        }
    }

    fn unregister_branch(&mut self, id: NodeId, ctx: &mut C) {
        let mut i = 0;
        while let Some(p) = self.tree.node(id).child(Link::Passive, i) {
            self.unregister_branch(p, ctx);
            i += 1;
        }
        self.unregister_one(id, ctx);
    }

    fn unregister_all(&mut self, ctx: &mut C) {
        self.in_progress = None;
        while let Some(id) = self.registered.pop() {
            self.unregister_one(id, ctx);
        }
    }

    fn unregister_one(&mut self, id: NodeId, ctx: &mut C) {
        let node = self.tree.node_mut(id);
        if !node.registered {
            return;
        }
        node.registered = false;
        self.registered.retain(|&r| r != id);
        trace!(node = %id, name = self.tree.name(id), "unregistered");
        self.invoke(id, ctx, |task, cx| task.on_unregistered(cx));
        self.tree.emit(id, NodeEvent::Unregistered);
    }

    // ── Phase routing ─────────────────────────────────────────────────────

    /// Deliver one phase callback to the leaf and its registered passives.
    pub fn dispatch(&mut self, phase: Phase, ctx: &mut C, frame: Frame) {
        self.frame = frame;
        self.for_each_registered(ctx, |task, cx| match phase {
            Phase::Fixed => task.fixed_tick(cx),
            Phase::Update => task.tick(cx),
            Phase::Late => task.late_tick(cx),
        });
    }

    /// The character's animation changed from `old` to `new`.
    pub fn animation_changed(&mut self, ctx: &mut C, old: AnimId, new: AnimId) {
        self.for_each_registered(ctx, |task, cx| task.on_animation_change(cx, old, new));
    }

    /// Something touched the character.
    pub fn contact(&mut self, ctx: &mut C, contact: &Contact) {
        self.for_each_registered(ctx, |task, cx| task.on_contact(cx, contact));
    }

    fn for_each_registered<F>(&mut self, ctx: &mut C, mut f: F)
    where
        F: FnMut(&mut dyn Task<C>, &mut NodeCx<'_, C>),
    {
        let mut i = 0;
        while let Some(&id) = self.registered.get(i) {
            self.invoke(id, ctx, &mut f);
            i += 1;
        }
        self.flush(ctx);
    }

    // ── Callbacks and commands ────────────────────────────────────────────

    /// Call into one node's task, then apply whatever it asked for.
    fn invoke<R, F>(&mut self, id: NodeId, ctx: &mut C, f: F) -> R
    where
        F: FnOnce(&mut dyn Task<C>, &mut NodeCx<'_, C>) -> R,
    {
        let frame = self.frame;
        let node = self.tree.node_mut(id);
        let mut cx = NodeCx::new(ctx, &mut self.cmds, id, &node.name, frame);
        let out = f(node.task.as_mut(), &mut cx);
        self.apply_commands();
        out
    }

    /// Flags land immediately; structural commands wait for the pass to end.
    fn apply_commands(&mut self) {
        for cmd in self.cmds.drain() {
            match cmd {
                Command::FlagSuccess(id) => self.tree.flag_success(id),
                Command::FlagFailure(id) => self.tree.flag_failure(id),
                Command::Break => self.break_hint |= self.in_pass,
                structural => {
                    debug_assert!(structural.is_structural());
                    self.break_hint |= self.in_pass;
                    self.deferred.push(structural);
                }
            }
        }
    }

    /// Apply deferred structural commands.  Commands raised by the callbacks
    /// those fire are applied in the same call.
    fn flush(&mut self, ctx: &mut C) {
        while !self.deferred.is_empty() {
            for cmd in std::mem::take(&mut self.deferred) {
                match cmd {
                    Command::Interrupt(root) => {
                        self.interrupt_now(root, ctx);
                    }
                    Command::SetAutonomy(root) => self.set_autonomy_now(root, ctx),
                    Command::RemoveByName(name) => {
                        self.remove_now(&name, ctx);
                    }
                    Command::FlagSuccess(_) | Command::FlagFailure(_) | Command::Break => {}
                }
            }
        }
    }
}
