//! The tavern's behavior units.
//!
//! | Unit     | Does                                                          |
//! |----------|---------------------------------------------------------------|
//! | `Idle`   | loiters, then picks `Wander` or `Fetch`; answers waves        |
//! | `Wander` | strolls to a random spot and lingers                          |
//! | `Fetch`  | keg, then bar; hands each leg to `Walk` and listens for it    |
//! | `Walk`   | walks to whatever `Fetch` wrote down, reports the outcome     |
//! | `Greet`  | turns to a waver and waves back; picks up waves `Wander` ignores |

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use strum::{EnumCount, EnumIter};
use tracing::{debug, info};

use npc_core::{NodeId, Point, Tick};
use npc_dispatch::{BehaviorUnit, Gesture, IdleUnit, Permission, UnitCx};
use npc_sched::Settlement;
use npc_sim::{Body, ClaimProp, FaceToward, MoveTo, PlayAnimation, Wait, clip};

use crate::layout::Places;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, EnumCount)]
pub enum Conduct {
    Idle,
    Wander,
    Fetch,
    Walk,
    Greet,
}

type Cx<'a> = UnitCx<'a, Conduct, Body>;

/// What one character's units leave for each other.
#[derive(Debug, Default)]
pub struct Notes {
    walk_to:  Option<Point>,
    greet_at: Option<Point>,
}

pub type SharedNotes = Arc<Mutex<Notes>>;

fn notes(shared: &SharedNotes) -> MutexGuard<'_, Notes> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

pub fn unit_for(kind: Conduct, places: &Arc<Places>, shared: &SharedNotes) -> Box<dyn BehaviorUnit<Conduct, Body>> {
    let notes = Arc::clone(shared);
    match kind {
        Conduct::Idle => Box::new(Loiter { notes, pause: 0.0, since: Tick::ZERO }),
        Conduct::Wander => Box::new(Wander { places: Arc::clone(places), root: None }),
        Conduct::Fetch => Box::new(Fetch {
            places: Arc::clone(places),
            notes,
            stage: Stage::Start,
            walked: None,
            root: None,
            next: None,
        }),
        Conduct::Walk => Box::new(Walk { notes, root: None, next: None }),
        Conduct::Greet => Box::new(Greet { notes, root: None, next: None }),
    }
}

/// Despawn a settled root and everything under it.
fn discard(cx: &mut Cx<'_>, root: NodeId) {
    let tree = cx.scheduler_mut().tree_mut();
    for id in tree.descendants(root).into_iter().rev() {
        tree.despawn(id);
    }
}

/// `settlement` belongs to the root held in `slot`.  Clears the slot.
fn owns(slot: &mut Option<NodeId>, settlement: &Settlement) -> bool {
    if *slot == Some(settlement.root) {
        *slot = None;
        return true;
    }
    false
}

// ── Idle ──────────────────────────────────────────────────────────────────────

struct Loiter {
    notes: SharedNotes,
    pause: f32,
    since: Tick,
}

impl BehaviorUnit<Conduct, Body> for Loiter {
    fn on_activate(&mut self, cx: &mut Cx<'_>) {
        <IdleUnit as BehaviorUnit<Conduct, Body>>::on_activate(&mut IdleUnit, cx);
        self.pause = cx.ctx.rng.gen_range(1.0..4.0);
        self.since = cx.frame().tick;
    }

    fn update(&mut self, cx: &mut Cx<'_>) {
        if cx.frame().secs_since(self.since) < self.pause {
            return;
        }
        let next = if cx.ctx.rng.gen_bool(0.35) { Conduct::Fetch } else { Conduct::Wander };
        cx.set_task(next, None);
    }

    fn on_gesture(&mut self, gesture: &Gesture, cx: &mut Cx<'_>) -> bool {
        if !gesture.is("wave") {
            return false;
        }
        notes(&self.notes).greet_at = Some(gesture.at);
        cx.set_task(Conduct::Greet, None);
        true
    }
}

// ── Wander ────────────────────────────────────────────────────────────────────

struct Wander {
    places: Arc<Places>,
    root:   Option<NodeId>,
}

impl BehaviorUnit<Conduct, Body> for Wander {
    fn on_activate(&mut self, cx: &mut Cx<'_>) {
        let Some(&spot) = cx.ctx.rng.choose(&self.places.spots) else {
            return;
        };
        let linger = cx.ctx.rng.gen_range(1.0..3.0);
        let tree = cx.scheduler_mut().tree_mut();
        let root = tree.spawn("wander", Wait::new(linger));
        let walk = tree.spawn("stroll", MoveTo::new(spot).timeout(30.0));
        tree.add_requirement(root, walk);
        cx.set_autonomy(root);
        self.root = Some(root);
    }

    fn on_deactivate(&mut self, cx: &mut Cx<'_>) {
        if let Some(root) = self.root.take() {
            if cx.remove_by_name("wander").is_some() {
                discard(cx, root);
            }
        }
    }

    fn on_settled(&mut self, settlement: &Settlement, cx: &mut Cx<'_>) {
        if !owns(&mut self.root, settlement) {
            return;
        }
        discard(cx, settlement.root);
        cx.set_task(Conduct::Idle, settlement.conclusion.outcome());
    }
}

// ── Fetch ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Start,
    ToKeg,
    Drawing,
    Serving,
}

/// Walk to the keg, draw a mug, carry it to the bar.
///
/// Each walk is delegated to `Walk` with this unit polling the outcome, so
/// control comes straight back here when a leg ends.
struct Fetch {
    places: Arc<Places>,
    notes:  SharedNotes,
    stage:  Stage,
    walked: Option<bool>,
    root:   Option<NodeId>,
    next:   Option<(Conduct, Option<bool>)>,
}

impl Fetch {
    fn walk(&mut self, to: Point, stage: Stage, cx: &mut Cx<'_>) {
        notes(&self.notes).walk_to = Some(to);
        self.stage = stage;
        cx.poll_next_outcome();
        cx.set_task(Conduct::Walk, None);
    }

    fn done(&mut self, success: bool, cx: &mut Cx<'_>) -> (Conduct, Option<bool>) {
        if let Some(prop) = cx.ctx.release_prop() {
            debug!(id = %cx.ctx.id(), %prop, "prop put down");
        }
        self.stage = Stage::Start;
        if success {
            info!(id = %cx.ctx.id(), "ale served");
        }
        (Conduct::Idle, Some(success))
    }
}

impl BehaviorUnit<Conduct, Body> for Fetch {
    fn on_activate(&mut self, cx: &mut Cx<'_>) {
        match (self.stage, self.walked.take()) {
            (Stage::ToKeg, Some(true)) => {
                let tree = cx.scheduler_mut().tree_mut();
                let root = tree.spawn("draw ale", PlayAnimation::new(clip::REACH).hold(1.5));
                let claim = tree.spawn("claim keg", ClaimProp::new(self.places.keg).timeout(8.0));
                tree.add_requirement(root, claim);
                cx.set_autonomy(root);
                self.root = Some(root);
                self.stage = Stage::Drawing;
            }
            (Stage::Serving, Some(true)) => self.next = Some(self.done(true, cx)),
            (_, Some(false)) => self.next = Some(self.done(false, cx)),
            _ => self.stage = Stage::Start,
        }
    }

    fn update(&mut self, cx: &mut Cx<'_>) {
        if let Some((kind, outcome)) = self.next.take() {
            cx.set_task(kind, outcome);
            return;
        }
        if self.stage == Stage::Start {
            self.walk(self.places.keg_at, Stage::ToKeg, cx);
        }
    }

    fn on_settled(&mut self, settlement: &Settlement, cx: &mut Cx<'_>) {
        if !owns(&mut self.root, settlement) {
            return;
        }
        discard(cx, settlement.root);
        if settlement.conclusion.outcome() == Some(true) {
            cx.ctx.release_prop();
            self.walk(self.places.bar, Stage::Serving, cx);
        } else {
            let (kind, outcome) = self.done(false, cx);
            cx.set_task(kind, outcome);
        }
    }

    fn regain_control(&mut self, outcome: bool, _cx: &mut Cx<'_>) -> bool {
        if !matches!(self.stage, Stage::ToKeg | Stage::Serving) {
            return false;
        }
        self.walked = Some(outcome);
        true
    }

    fn permits(&self, permission: Permission) -> bool {
        permission != Permission::Interact
    }

    /// Too busy to wave.
    fn on_gesture(&mut self, _gesture: &Gesture, _cx: &mut Cx<'_>) -> bool {
        true
    }
}

// ── Walk ──────────────────────────────────────────────────────────────────────

struct Walk {
    notes: SharedNotes,
    root:  Option<NodeId>,
    next:  Option<(Conduct, Option<bool>)>,
}

impl BehaviorUnit<Conduct, Body> for Walk {
    fn on_activate(&mut self, cx: &mut Cx<'_>) {
        let Some(to) = notes(&self.notes).walk_to.take() else {
            self.next = Some((Conduct::Idle, Some(false)));
            return;
        };
        let root = cx.spawn("walk", MoveTo::new(to).timeout(30.0));
        cx.set_autonomy(root);
        self.root = Some(root);
    }

    fn update(&mut self, cx: &mut Cx<'_>) {
        if let Some((kind, outcome)) = self.next.take() {
            cx.set_task(kind, outcome);
        }
    }

    fn on_settled(&mut self, settlement: &Settlement, cx: &mut Cx<'_>) {
        if !owns(&mut self.root, settlement) {
            return;
        }
        discard(cx, settlement.root);
        cx.set_task(Conduct::Idle, settlement.conclusion.outcome());
    }

    fn on_gesture(&mut self, _gesture: &Gesture, _cx: &mut Cx<'_>) -> bool {
        true
    }
}

// ── Greet ─────────────────────────────────────────────────────────────────────

struct Greet {
    notes: SharedNotes,
    root:  Option<NodeId>,
    next:  Option<(Conduct, Option<bool>)>,
}

impl BehaviorUnit<Conduct, Body> for Greet {
    fn on_activate(&mut self, cx: &mut Cx<'_>) {
        let Some(at) = notes(&self.notes).greet_at.take() else {
            self.next = Some((Conduct::Idle, None));
            return;
        };
        let tree = cx.scheduler_mut().tree_mut();
        let root = tree.spawn("greet", PlayAnimation::new(clip::WAVE).hold(1.0));
        let turn = tree.spawn("face waver", FaceToward::new(at));
        tree.add_requirement(root, turn);
        cx.set_autonomy(root);
        self.root = Some(root);
    }

    fn update(&mut self, cx: &mut Cx<'_>) {
        if let Some((kind, outcome)) = self.next.take() {
            cx.set_task(kind, outcome);
        }
    }

    fn on_settled(&mut self, settlement: &Settlement, cx: &mut Cx<'_>) {
        if !owns(&mut self.root, settlement) {
            return;
        }
        discard(cx, settlement.root);
        cx.set_task(Conduct::Idle, None);
    }

    fn permits(&self, permission: Permission) -> bool {
        permission != Permission::RootRotation
    }

    /// Reached only when the current unit let a wave through.
    fn on_gesture(&mut self, gesture: &Gesture, cx: &mut Cx<'_>) -> bool {
        if !gesture.is("wave") {
            return false;
        }
        if self.root.is_none() {
            notes(&self.notes).greet_at = Some(gesture.at);
            cx.set_task(Conduct::Greet, None);
        }
        true
    }
}
