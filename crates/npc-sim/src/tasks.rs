//! Stock behavior nodes for [`Body`]-driven characters.
//!
//! | Task            | Succeeds when                                   | Fails when                     |
//! |-----------------|-------------------------------------------------|--------------------------------|
//! | [`MoveTo`]      | within `tolerance` of the target                | no path, or timed out          |
//! | [`FaceToward`]  | facing the target within `tolerance`            | never                          |
//! | [`PlayAnimation`] | the clip is on screen (and held long enough)  | never                          |
//! | [`Wait`]        | `secs` have passed since first evaluation       | never                          |
//! | [`ClaimProp`]   | the character holds the prop                    | timed out in the line          |
//! | [`Reached`]     | standing at a point (optionally facing it)      | never                          |
//!
//! Timeouts count from the node's first evaluation and are cleared by
//! `reset`, so a reset node times out afresh.

use tracing::debug;

use npc_core::{AnimId, Frame, Point, PropId, Tick};
use npc_sched::{NodeCx, Status, Task};

use crate::Body;
use crate::animator::clip;

/// Elapsed-time bookkeeping for an optional limit.
#[derive(Debug, Clone, Copy, Default)]
struct Deadline {
    limit: Option<f32>,
    since: Option<Tick>,
}

impl Deadline {
    fn new(limit: Option<f32>) -> Self {
        Self { limit, since: None }
    }

    /// Starts the clock on first call.
    fn expired(&mut self, frame: Frame) -> bool {
        let since = *self.since.get_or_insert(frame.tick);
        self.limit.is_some_and(|l| frame.secs_since(since) >= l)
    }

    fn reset(&mut self) {
        self.since = None;
    }
}

// ── MoveTo ────────────────────────────────────────────────────────────────────

/// Walk to a point.
#[derive(Debug, Clone)]
pub struct MoveTo {
    target:    Point,
    tolerance: f32,
    deadline:  Deadline,
    requested: bool,
}

impl MoveTo {
    pub const DEFAULT_TOLERANCE: f32 = 0.25;

    pub fn new(target: Point) -> Self {
        Self {
            target,
            tolerance: Self::DEFAULT_TOLERANCE,
            deadline: Deadline::default(),
            requested: false,
        }
    }

    pub fn tolerance(mut self, metres: f32) -> Self {
        self.tolerance = metres;
        self
    }

    /// Give up after `secs` seconds.
    pub fn timeout(mut self, secs: f32) -> Self {
        self.deadline = Deadline::new(Some(secs));
        self
    }

    pub fn target(&self) -> Point {
        self.target
    }
}

impl Task<Body> for MoveTo {
    fn progress(&mut self, cx: &mut NodeCx<'_, Body>) -> Status {
        if cx.ctx.is_near(self.target, self.tolerance) {
            return Status::Success;
        }
        if self.deadline.expired(cx.frame()) {
            debug!(node = cx.name(), id = %cx.ctx.id(), "move timed out");
            return Status::Failure;
        }
        if self.requested && cx.ctx.path_failed() {
            return Status::Failure;
        }
        Status::Running
    }

    fn on_registered(&mut self, cx: &mut NodeCx<'_, Body>) {
        if !cx.ctx.is_near(self.target, self.tolerance) {
            cx.ctx.walk_to(self.target);
            self.requested = true;
        }
    }

    fn on_unregistered(&mut self, cx: &mut NodeCx<'_, Body>) {
        if self.requested {
            cx.ctx.stop();
        }
    }

    fn tick(&mut self, cx: &mut NodeCx<'_, Body>) {
        let body = &mut *cx.ctx;
        let idle = !body.is_moving() && !body.is_searching() && !body.path_failed();
        if idle && !body.is_near(self.target, self.tolerance) {
            body.walk_to(self.target);
            self.requested = true;
        }
    }

    fn on_reset(&mut self) {
        self.requested = false;
        self.deadline.reset();
    }
}

// ── FaceToward ────────────────────────────────────────────────────────────────

/// Turn to look at a point.
#[derive(Debug, Clone)]
pub struct FaceToward {
    target:    Point,
    tolerance: f32,
}

impl FaceToward {
    /// About five degrees.
    pub const DEFAULT_TOLERANCE: f32 = 0.09;

    pub fn new(target: Point) -> Self {
        Self { target, tolerance: Self::DEFAULT_TOLERANCE }
    }

    pub fn tolerance(mut self, radians: f32) -> Self {
        self.tolerance = radians;
        self
    }
}

impl Task<Body> for FaceToward {
    fn progress(&mut self, cx: &mut NodeCx<'_, Body>) -> Status {
        cx.ctx.is_facing(self.target, self.tolerance).into()
    }

    fn on_registered(&mut self, cx: &mut NodeCx<'_, Body>) {
        cx.ctx.face_toward(self.target);
    }

    fn tick(&mut self, cx: &mut NodeCx<'_, Body>) {
        if !cx.ctx.is_turning() && !cx.ctx.is_facing(self.target, self.tolerance) {
            cx.ctx.face_toward(self.target);
        }
    }
}

// ── PlayAnimation ─────────────────────────────────────────────────────────────

/// Play a clip, optionally holding it for a while before succeeding.
///
/// Returns the character to [`clip::IDLE`] when the node stops being the
/// in-progress leaf with its clip still requested.
#[derive(Debug, Clone)]
pub struct PlayAnimation {
    clip:  AnimId,
    hold:  Option<f32>,
    since: Option<Tick>,
}

impl PlayAnimation {
    pub fn new(clip: AnimId) -> Self {
        Self { clip, hold: None, since: None }
    }

    /// Keep the clip on screen for `secs` seconds.
    pub fn hold(mut self, secs: f32) -> Self {
        self.hold = Some(secs);
        self
    }
}

impl Task<Body> for PlayAnimation {
    fn progress(&mut self, cx: &mut NodeCx<'_, Body>) -> Status {
        let Some(since) = self.since else {
            return Status::Running;
        };
        match self.hold {
            Some(secs) if cx.frame().secs_since(since) < secs => Status::Running,
            _ => Status::Success,
        }
    }

    fn on_registered(&mut self, cx: &mut NodeCx<'_, Body>) {
        cx.ctx.animator.set_target(self.clip);
        if cx.ctx.animator.current() == self.clip && self.since.is_none() {
            self.since = Some(cx.tick());
        }
    }

    fn on_animation_change(&mut self, cx: &mut NodeCx<'_, Body>, _old: AnimId, new: AnimId) {
        if new == self.clip && self.since.is_none() {
            self.since = Some(cx.tick());
        }
    }

    fn on_unregistered(&mut self, cx: &mut NodeCx<'_, Body>) {
        if self.clip != clip::IDLE && cx.ctx.animator.target() == self.clip {
            cx.ctx.animator.set_target(clip::IDLE);
        }
    }

    fn on_reset(&mut self) {
        self.since = None;
    }
}

// ── Wait ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Wait {
    secs:  f32,
    since: Option<Tick>,
}

impl Wait {
    pub fn new(secs: f32) -> Self {
        Self { secs, since: None }
    }
}

impl Task<Body> for Wait {
    fn progress(&mut self, cx: &mut NodeCx<'_, Body>) -> Status {
        let since = *self.since.get_or_insert(cx.tick());
        (cx.frame().secs_since(since) >= self.secs).into()
    }

    fn on_reset(&mut self) {
        self.since = None;
    }
}

// ── ClaimProp ─────────────────────────────────────────────────────────────────

/// Get hold of a shared prop, queueing behind whoever has it.
#[derive(Debug, Clone)]
pub struct ClaimProp {
    prop:     PropId,
    deadline: Deadline,
}

impl ClaimProp {
    pub fn new(prop: PropId) -> Self {
        Self { prop, deadline: Deadline::default() }
    }

    /// Stop queueing after `secs` seconds.
    pub fn timeout(mut self, secs: f32) -> Self {
        self.deadline = Deadline::new(Some(secs));
        self
    }
}

impl Task<Body> for ClaimProp {
    fn progress(&mut self, cx: &mut NodeCx<'_, Body>) -> Status {
        if cx.ctx.held() == Some(self.prop) {
            return Status::Success;
        }
        if self.deadline.expired(cx.frame()) {
            debug!(node = cx.name(), prop = %self.prop, "gave up waiting for prop");
            return Status::Failure;
        }
        Status::Running
    }

    fn on_registered(&mut self, cx: &mut NodeCx<'_, Body>) {
        cx.ctx.acquire_prop(self.prop);
    }

    fn tick(&mut self, cx: &mut NodeCx<'_, Body>) {
        cx.ctx.acquire_prop(self.prop);
    }

    fn on_unregistered(&mut self, cx: &mut NodeCx<'_, Body>) {
        if cx.ctx.held() != Some(self.prop) {
            cx.ctx.cancel_claim(self.prop);
        }
    }

    fn on_reset(&mut self) {
        self.deadline.reset();
    }
}

// ── Reached ───────────────────────────────────────────────────────────────────

/// Predicate: standing at `point`, and facing it when `facing` is set.
///
/// Meant as a root whose requirements do the walking and turning.
#[derive(Debug, Clone)]
pub struct Reached {
    point:  Point,
    radius: f32,
    facing: Option<f32>,
}

impl Reached {
    pub fn new(point: Point, radius: f32) -> Self {
        Self { point, radius, facing: None }
    }

    /// Also require facing `point` to within `radians`.
    pub fn facing(mut self, radians: f32) -> Self {
        self.facing = Some(radians);
        self
    }
}

impl Task<Body> for Reached {
    fn progress(&mut self, cx: &mut NodeCx<'_, Body>) -> Status {
        let near = cx.ctx.is_near(self.point, self.radius);
        let aligned = self.facing.is_none_or(|tol| cx.ctx.is_facing(self.point, tol));
        (near && aligned).into()
    }
}
