//! `Dispatcher`: one character's registry of behavior units.
//!
//! # Transitions
//!
//! ```text
//! set_task(kind, outcome)
//!   kind == current                 → no-op
//!   outcome = Some(o), listener = L → L.regain_control(o)? → target = L
//!                                     listener cleared either way
//!   current.on_deactivate()
//!   current = target
//!   target.on_activate()
//! ```
//!
//! Hooks never call the dispatcher directly.  A `set_task` made from an
//! ordinary hook through [`UnitCx`] is applied once that hook returns; one
//! made while a transition is running is a programmer error and panics.
//!
//! Settlements reported by the scheduler are forwarded to whichever unit is
//! current when they are drained.

use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use npc_core::{AnimId, Contact, Frame};
use npc_sched::{Phase, Scheduler};

use crate::unit::Requests;
use crate::{BehaviorUnit, Gesture, Permission, UnitCx, UnitKind};

type UnitBox<K, C> = Box<dyn BehaviorUnit<K, C>>;

pub struct Dispatcher<K: UnitKind, C> {
    /// Registration order (`K::iter()` order); `units[i]` belongs to `kinds[i]`.
    kinds:         Vec<K>,
    units:         Vec<UnitBox<K, C>>,
    index:         FxHashMap<K, usize>,
    default:       K,
    current:       Option<K>,
    listener:      Option<K>,
    pending:       Option<(K, Option<bool>)>,
    scheduler:     Scheduler<C>,
    transitioning: bool,
    frame:         Frame,
}

impl<K: UnitKind, C> Dispatcher<K, C> {
    /// Build one unit per kind with `factory`, in declaration order.
    ///
    /// The factory also receives the character's scheduler so units can
    /// spawn the nodes they will reuse for the character's whole life.
    pub fn new<F>(default: K, mut factory: F) -> Self
    where
        F: FnMut(K, &mut Scheduler<C>) -> UnitBox<K, C>,
    {
        let mut scheduler = Scheduler::new();
        let mut kinds = Vec::with_capacity(K::COUNT);
        let mut units = Vec::with_capacity(K::COUNT);
        let mut index = FxHashMap::default();
        for kind in K::iter() {
            index.insert(kind, kinds.len());
            kinds.push(kind);
            units.push(factory(kind, &mut scheduler));
        }
        Self {
            kinds,
            units,
            index,
            default,
            current: None,
            listener: None,
            pending: None,
            scheduler,
            transitioning: false,
            frame: Frame::default(),
        }
    }

    /// Activate the default unit if nothing is current yet.
    pub fn start(&mut self, ctx: &mut C) {
        if self.current.is_none() {
            self.set_task(self.default, None, ctx);
        }
    }

    // ── Queries ───────────────────────────────────────────────────────────

    #[inline]
    pub fn current(&self) -> Option<K> {
        self.current
    }

    #[inline]
    pub fn default_kind(&self) -> K {
        self.default
    }

    /// The unit waiting to hear the next transition outcome, if any.
    #[inline]
    pub fn listener(&self) -> Option<K> {
        self.listener
    }

    #[inline]
    pub fn is_unit_active(&self, kind: K) -> bool {
        self.current == Some(kind)
    }

    /// Ask the current unit whether `permission` may be exercised.  Always
    /// `true` before the first activation.
    pub fn request_permission(&self, permission: Permission) -> bool {
        match self.current {
            Some(kind) => self.units[self.slot(kind)].permits(permission),
            None => true,
        }
    }

    #[inline]
    pub fn scheduler(&self) -> &Scheduler<C> {
        &self.scheduler
    }

    #[inline]
    pub fn scheduler_mut(&mut self) -> &mut Scheduler<C> {
        &mut self.scheduler
    }

    // ── Transitions ───────────────────────────────────────────────────────

    /// Make `kind` current, reporting `outcome` to a polling listener first.
    pub fn set_task(&mut self, kind: K, outcome: Option<bool>, ctx: &mut C) {
        if self.current == Some(kind) {
            return;
        }
        let mut target = kind;
        if let Some(outcome) = outcome {
            if let Some(listener) = self.listener.take() {
                self.transitioning = true;
                let regain = self.run_unit(listener, ctx, |u, cx| u.regain_control(outcome, cx));
                self.transitioning = false;
                debug!(?listener, outcome, regain, "listener consulted");
                if regain {
                    target = listener;
                }
            }
        }
        if self.current == Some(target) {
            return;
        }

        let previous = self.current;
        self.transitioning = true;
        if let Some(old) = previous {
            self.run_unit(old, ctx, |u, cx| u.on_deactivate(cx));
        }
        self.current = Some(target);
        self.run_unit(target, ctx, |u, cx| u.on_activate(cx));
        self.transitioning = false;
        debug!(from = ?previous, to = ?target, tick = %self.frame.tick, "unit switched");

        self.forward_settlements(ctx);
    }

    // ── Phases ────────────────────────────────────────────────────────────

    pub fn fixed_update(&mut self, ctx: &mut C, frame: Frame) {
        self.frame = frame;
        self.with_current(ctx, |u, cx| u.fixed_update(cx));
        self.scheduler.dispatch(Phase::Fixed, ctx, frame);
        self.forward_settlements(ctx);
    }

    /// Current unit's update, then one scheduler pass, then the leaf's tick.
    pub fn update(&mut self, ctx: &mut C, frame: Frame) {
        self.frame = frame;
        self.with_current(ctx, |u, cx| u.update(cx));
        self.scheduler.progress(ctx, frame);
        self.forward_settlements(ctx);
        self.scheduler.dispatch(Phase::Update, ctx, frame);
        self.forward_settlements(ctx);
    }

    pub fn late_update(&mut self, ctx: &mut C, frame: Frame) {
        self.frame = frame;
        self.with_current(ctx, |u, cx| u.late_update(cx));
        self.scheduler.dispatch(Phase::Late, ctx, frame);
        self.forward_settlements(ctx);
    }

    pub fn animation_changed(&mut self, ctx: &mut C, old: AnimId, new: AnimId) {
        self.with_current(ctx, |u, cx| u.on_animation_change(cx, old, new));
        self.scheduler.animation_changed(ctx, old, new);
        self.forward_settlements(ctx);
    }

    pub fn contact(&mut self, ctx: &mut C, contact: &Contact) {
        self.with_current(ctx, |u, cx| u.on_contact(cx, contact));
        self.scheduler.contact(ctx, contact);
        self.forward_settlements(ctx);
    }

    /// Offer `gesture` to the current unit, then (unless the current unit
    /// is the default one) to every other unit in reverse registration
    /// order.  Returns `true` once some unit handles it.
    pub fn gesture(&mut self, gesture: &Gesture, ctx: &mut C) -> bool {
        let Some(current) = self.current else {
            return false;
        };
        let mut handled = self.run_unit(current, ctx, |u, cx| u.on_gesture(gesture, cx));
        if !handled && current != self.default {
            for i in (0..self.kinds.len()).rev() {
                let kind = self.kinds[i];
                if kind == current {
                    continue;
                }
                if self.run_unit(kind, ctx, |u, cx| u.on_gesture(gesture, cx)) {
                    trace!(unit = ?kind, label = %gesture.label, "gesture handled by non-current unit");
                    handled = true;
                    break;
                }
            }
        }
        self.apply_pending(ctx);
        self.forward_settlements(ctx);
        handled
    }

    // ── Internals ─────────────────────────────────────────────────────────

    fn slot(&self, kind: K) -> usize {
        self.index[&kind]
    }

    fn with_current<F>(&mut self, ctx: &mut C, f: F)
    where
        F: FnOnce(&mut dyn BehaviorUnit<K, C>, &mut UnitCx<'_, K, C>),
    {
        if let Some(kind) = self.current {
            self.run_unit(kind, ctx, f);
            self.apply_pending(ctx);
        }
    }

    /// Call one unit's hook, then record the requests it made.
    fn run_unit<R, F>(&mut self, kind: K, ctx: &mut C, f: F) -> R
    where
        F: FnOnce(&mut dyn BehaviorUnit<K, C>, &mut UnitCx<'_, K, C>) -> R,
    {
        let slot = self.slot(kind);
        let mut requests = Requests::default();
        let mut cx = UnitCx::new(
            ctx,
            &mut self.scheduler,
            kind,
            self.frame,
            self.transitioning,
            &mut requests,
        );
        let out = f(self.units[slot].as_mut(), &mut cx);
        if requests.poll {
            trace!(unit = ?kind, "polling next outcome");
            self.listener = Some(kind);
        }
        if requests.next.is_some() {
            self.pending = requests.next;
        }
        out
    }

    fn apply_pending(&mut self, ctx: &mut C) {
        while let Some((kind, outcome)) = self.pending.take() {
            self.set_task(kind, outcome, ctx);
        }
    }

    fn forward_settlements(&mut self, ctx: &mut C) {
        loop {
            let batch: Vec<_> = self.scheduler.drain_settlements().collect();
            if batch.is_empty() {
                return;
            }
            for settlement in &batch {
                let Some(kind) = self.current else {
                    trace!(root = %settlement.root, "settlement with no current unit dropped");
                    continue;
                };
                self.run_unit(kind, ctx, |u, cx| u.on_settled(settlement, cx));
                self.apply_pending(ctx);
            }
        }
    }
}

impl<K: UnitKind, C> std::fmt::Debug for Dispatcher<K, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("current", &self.current)
            .field("listener", &self.listener)
            .field("queued_roots", &self.scheduler.queue().len())
            .finish()
    }
}
