//! `NodeTree` — per-scheduler arena of behavior nodes.
//!
//! # Ownership
//!
//! Nodes live in a flat `Vec` of slots and refer to each other by
//! [`NodeId`] handle.  A node has at most one parent link, which is either a
//! *requirement* link or a *passive* link, never both:
//!
//! ```text
//!            root
//!        ┌────┴─────┬─────────┐
//!     req[0]     req[1]    passive
//!     (MoveTo)  (FaceTo)  (LookAt)
//! ```
//!
//! Because every node knows its parent, cycle detection is a walk up the
//! parent chain from the prospective parent.  Despawned slots go onto a free
//! list and their handles are reused by later `spawn` calls.
//!
//! # Invariant violations
//!
//! Linking a node to itself, to a second parent, under one of its own
//! descendants, or linking a concluded or queued node panics.  So does
//! detaching a subtree that holds a registered node.  Use
//! [`check_attach`][NodeTree::check_attach] to test a link without panicking.

use tracing::trace;

use npc_core::NodeId;

use crate::error::violation;
use crate::{NodeCx, NodeEvent, Status, Task, TreeError, TreeResult, Watcher, task};

/// Which list of its parent a node sits in.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Link {
    Requirement,
    Passive,
}

// ── Node ──────────────────────────────────────────────────────────────────────

pub(crate) struct Node<C> {
    pub(crate) name:           String,
    pub(crate) task:           Box<dyn Task<C>>,
    pub(crate) requirements:   Vec<NodeId>,
    pub(crate) passives:       Vec<NodeId>,
    pub(crate) parent:         Option<(NodeId, Link)>,
    /// Cached settled result; `Running` until the node concludes.
    pub(crate) result:         Status,
    pub(crate) forced_success: bool,
    pub(crate) forced_failure: bool,
    pub(crate) registered:     bool,
    /// Set while the node sits in its scheduler's root queue.
    pub(crate) queued:         bool,
    watchers:                  Vec<Watcher>,
}

impl<C> Node<C> {
    /// The pending forced result, failure first.
    pub(crate) fn forced(&self) -> Option<Status> {
        if self.forced_failure {
            Some(Status::Failure)
        } else if self.forced_success {
            Some(Status::Success)
        } else {
            None
        }
    }

    pub(crate) fn child(&self, link: Link, i: usize) -> Option<NodeId> {
        match link {
            Link::Requirement => self.requirements.get(i).copied(),
            Link::Passive => self.passives.get(i).copied(),
        }
    }
}

// ── NodeTree ──────────────────────────────────────────────────────────────────

/// Arena of behavior nodes for one scheduler.
pub struct NodeTree<C> {
    slots: Vec<Option<Node<C>>>,
    free:  Vec<NodeId>,
    live:  usize,
}

impl<C> Default for NodeTree<C> {
    fn default() -> Self {
        Self { slots: Vec::new(), free: Vec::new(), live: 0 }
    }
}

impl<C> NodeTree<C> {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Lifetime ──────────────────────────────────────────────────────────

    /// Add a detached, unconcluded node and return its handle.
    pub fn spawn(&mut self, name: impl Into<String>, task: impl Task<C> + 'static) -> NodeId {
        self.spawn_boxed(name, Box::new(task))
    }

    pub fn spawn_boxed(&mut self, name: impl Into<String>, task: Box<dyn Task<C>>) -> NodeId {
        let node = Node {
            name: name.into(),
            task,
            requirements: Vec::new(),
            passives: Vec::new(),
            parent: None,
            result: Status::Running,
            forced_success: false,
            forced_failure: false,
            registered: false,
            queued: false,
            watchers: Vec::new(),
        };
        self.live += 1;
        match self.free.pop() {
            Some(id) => {
                self.slots[id.index()] = Some(node);
                id
            }
            None => {
                let id = NodeId(self.slots.len() as u32);
                self.slots.push(Some(node));
                id
            }
        }
    }

    /// Spawn a node whose only behavior is the `progress` closure `f`.
    pub fn spawn_fn<F>(&mut self, name: impl Into<String>, f: F) -> NodeId
    where
        F: FnMut(&mut NodeCx<'_, C>) -> Status + Send + 'static,
        C: 'static,
    {
        self.spawn(name, task::from_fn(f))
    }

    /// Remove a node from the arena.
    ///
    /// The node is unlinked from its parent and its children become detached
    /// roots.  Panics if the node is registered or queued.
    pub fn despawn(&mut self, id: NodeId) {
        let node = self.node(id);
        if node.registered {
            violation(TreeError::DespawnRegistered(id));
        }
        if node.queued {
            violation(TreeError::QueuedRoot(id));
        }
        if let Some((parent, link)) = node.parent {
            self.unlink(parent, id, link);
        }
        self.clear_links(id);
        self.slots[id.index()] = None;
        self.free.push(id);
        self.live -= 1;
    }

    #[inline]
    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Number of live nodes.
    #[inline]
    pub fn len(&self) -> usize {
        self.live
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    // ── Queries ───────────────────────────────────────────────────────────

    pub fn name(&self, id: NodeId) -> &str {
        &self.node(id).name
    }

    /// `Running` until the node concludes, then its settled result.
    pub fn status(&self, id: NodeId) -> Status {
        self.node(id).result
    }

    pub fn is_concluded(&self, id: NodeId) -> bool {
        self.node(id).result.is_settled()
    }

    pub fn is_registered(&self, id: NodeId) -> bool {
        self.node(id).registered
    }

    pub fn is_requirement(&self, id: NodeId) -> bool {
        matches!(self.node(id).parent, Some((_, Link::Requirement)))
    }

    pub fn is_passive(&self, id: NodeId) -> bool {
        matches!(self.node(id).parent, Some((_, Link::Passive)))
    }

    /// `true` while a force flag waits for the node's next visit.
    pub fn is_flagged(&self, id: NodeId) -> bool {
        self.node(id).forced().is_some()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent.map(|(p, _)| p)
    }

    pub fn requirements(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).requirements
    }

    pub fn passives(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).passives
    }

    /// `id` and everything linked below it, depth first, parents before
    /// children.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(n) = stack.pop() {
            out.push(n);
            let node = self.node(n);
            stack.extend(node.passives.iter().rev());
            stack.extend(node.requirements.iter().rev());
        }
        out
    }

    // ── Structure ─────────────────────────────────────────────────────────

    /// Would linking `child` under `parent` be legal?
    pub fn check_attach(&self, parent: NodeId, child: NodeId) -> TreeResult<()> {
        let Some(p) = self.get(parent) else {
            return Err(TreeError::UnknownNode(parent));
        };
        let Some(c) = self.get(child) else {
            return Err(TreeError::UnknownNode(child));
        };
        if parent == child {
            return Err(TreeError::SelfReference(child));
        }
        if let Some((existing, _)) = c.parent {
            return Err(TreeError::AlreadyAttached { child, parent: existing });
        }
        if c.queued {
            return Err(TreeError::QueuedRoot(child));
        }
        if c.result.is_settled() {
            return Err(TreeError::Concluded(child));
        }
        let mut cursor = p.parent.map(|(up, _)| up);
        while let Some(up) = cursor {
            if up == child {
                return Err(TreeError::Cycle { parent, child });
            }
            cursor = self.node(up).parent.map(|(next, _)| next);
        }
        Ok(())
    }

    /// Append `child` to `parent`'s ordered requirements.
    pub fn add_requirement(&mut self, parent: NodeId, child: NodeId) {
        self.link(parent, child, Link::Requirement, false);
    }

    /// Insert `child` at the front of `parent`'s requirements so it is
    /// validated before every existing requirement.
    pub fn prepend_requirement(&mut self, parent: NodeId, child: NodeId) {
        self.link(parent, child, Link::Requirement, true);
    }

    pub fn add_passive(&mut self, parent: NodeId, child: NodeId) {
        self.link(parent, child, Link::Passive, false);
    }

    pub fn remove_requirement(&mut self, parent: NodeId, child: NodeId) {
        self.detach(parent, child, Link::Requirement);
    }

    pub fn remove_passive(&mut self, parent: NodeId, child: NodeId) {
        self.detach(parent, child, Link::Passive);
    }

    /// Detach every requirement and passive of `id`.
    pub fn clear_links(&mut self, id: NodeId) {
        let node = self.node(id);
        let children: Vec<NodeId> =
            node.requirements.iter().chain(node.passives.iter()).copied().collect();
        if let Some(&busy) = children.iter().find(|&&c| self.subtree_registered(c)) {
            violation(TreeError::DetachRegistered(busy));
        }
        let node = self.node_mut(id);
        node.requirements.clear();
        node.passives.clear();
        for c in children {
            self.node_mut(c).parent = None;
        }
    }

    fn link(&mut self, parent: NodeId, child: NodeId, link: Link, front: bool) {
        if let Err(err) = self.check_attach(parent, child) {
            violation(err);
        }
        let p = self.node_mut(parent);
        let list = match link {
            Link::Requirement => &mut p.requirements,
            Link::Passive => &mut p.passives,
        };
        if front {
            list.insert(0, child);
        } else {
            list.push(child);
        }
        self.node_mut(child).parent = Some((parent, link));
        trace!(%parent, %child, ?link, "linked");
    }

    fn detach(&mut self, parent: NodeId, child: NodeId, link: Link) {
        if self.node(child).parent != Some((parent, link)) {
            violation(TreeError::NotLinked { parent, child });
        }
        if self.subtree_registered(child) {
            violation(TreeError::DetachRegistered(child));
        }
        self.unlink(parent, child, link);
    }

    fn unlink(&mut self, parent: NodeId, child: NodeId, link: Link) {
        let p = self.node_mut(parent);
        match link {
            Link::Requirement => p.requirements.retain(|&c| c != child),
            Link::Passive => p.passives.retain(|&c| c != child),
        }
        self.node_mut(child).parent = None;
        trace!(%parent, %child, ?link, "unlinked");
    }

    fn subtree_registered(&self, id: NodeId) -> bool {
        self.descendants(id).into_iter().any(|n| self.node(n).registered)
    }

    // ── State ─────────────────────────────────────────────────────────────

    /// Force `id` to conclude *succeeded* at its next visit.
    ///
    /// Idempotent, and ignored on a node that has already concluded.  The
    /// flag is carried over to the node's currently registered passives.
    pub fn flag_success(&mut self, id: NodeId) {
        let node = self.node_mut(id);
        if node.result.is_settled() || node.forced_success {
            return;
        }
        node.forced_success = true;
        node.task.on_forced_success();
        trace!(node = %id, "flagged for success");
        self.emit(id, NodeEvent::ForcedSuccess);
        for p in self.registered_passives(id) {
            self.flag_success(p);
        }
    }

    /// Force `id` to conclude *failed* at its next visit.  Takes precedence
    /// over a pending success flag.
    pub fn flag_failure(&mut self, id: NodeId) {
        let node = self.node_mut(id);
        if node.result.is_settled() || node.forced_failure {
            return;
        }
        node.forced_failure = true;
        trace!(node = %id, "flagged for failure");
        self.emit(id, NodeEvent::ForcedFailure);
        for p in self.registered_passives(id) {
            self.flag_failure(p);
        }
    }

    /// Clear both force flags and the settled result so the node can be
    /// linked and run again.
    pub fn reset(&mut self, id: NodeId) {
        let node = self.node_mut(id);
        node.result = Status::Running;
        node.forced_success = false;
        node.forced_failure = false;
        node.task.on_reset();
        self.emit(id, NodeEvent::Reset);
    }

    /// Reset `root` and every node linked below it.
    pub fn reset_tree(&mut self, root: NodeId) {
        for id in self.descendants(root) {
            self.reset(id);
        }
    }

    /// Subscribe to every lifecycle event of `id`.
    pub fn watch(&mut self, id: NodeId, f: impl FnMut(NodeId, &NodeEvent) + Send + 'static) {
        self.node_mut(id).watchers.push(Box::new(f));
    }

    fn registered_passives(&self, id: NodeId) -> Vec<NodeId> {
        self.node(id).passives.iter().copied().filter(|&p| self.node(p).registered).collect()
    }

    // ── Crate internals ───────────────────────────────────────────────────

    pub(crate) fn emit(&mut self, id: NodeId, event: NodeEvent) {
        for w in &mut self.node_mut(id).watchers {
            w(id, &event);
        }
    }

    fn get(&self, id: NodeId) -> Option<&Node<C>> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    #[track_caller]
    pub(crate) fn node(&self, id: NodeId) -> &Node<C> {
        match self.get(id) {
            Some(n) => n,
            None => violation(TreeError::UnknownNode(id)),
        }
    }

    #[track_caller]
    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node<C> {
        match self.slots.get_mut(id.index()).and_then(Option::as_mut) {
            Some(n) => n,
            None => violation(TreeError::UnknownNode(id)),
        }
    }
}
