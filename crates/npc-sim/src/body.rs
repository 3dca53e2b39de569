//! `Body`: the character state behavior nodes and units read and write.
//!
//! A body is the scheduler's context type.  Nodes never move the character
//! themselves; they set a locomotion target, a facing target, or a target
//! animation, and the host loop's fixed and late phases carry those out.

use std::sync::Arc;

use tracing::trace;

use npc_core::{CharacterId, CharacterRng, Point, PropId, wrap_angle, yaw_delta};
use npc_nav::Navigator;

use crate::animator::clip;
use crate::{Animator, PropTable};

/// Default turning speed in radians per second.
pub const DEFAULT_TURN_RATE: f32 = std::f32::consts::PI;

pub struct Body {
    id: CharacterId,

    pub position:  Point,
    /// Yaw in radians; see [`npc_core::geo`].
    pub facing:    f32,
    pub turn_rate: f32,
    target_facing: Option<f32>,

    pub nav:      Navigator,
    pub animator: Animator,
    pub rng:      CharacterRng,

    props: Arc<PropTable>,
    held:  Option<PropId>,
}

impl Body {
    pub fn new(
        id:       CharacterId,
        position: Point,
        facing:   f32,
        nav:      Navigator,
        props:    Arc<PropTable>,
        rng:      CharacterRng,
    ) -> Self {
        Self {
            id,
            position,
            facing: wrap_angle(facing),
            turn_rate: DEFAULT_TURN_RATE,
            target_facing: None,
            nav,
            animator: Animator::default(),
            rng,
            props,
            held: None,
        }
    }

    #[inline]
    pub fn id(&self) -> CharacterId {
        self.id
    }

    // ── Locomotion ────────────────────────────────────────────────────────

    /// Start walking to `to`.  The path search runs on the next fixed step.
    pub fn walk_to(&mut self, to: Point) {
        self.nav.request(self.position, to);
        self.animator.set_target(clip::WALK);
    }

    /// Stop walking (and turning toward the path).
    pub fn stop(&mut self) {
        if self.nav.is_moving() || self.nav.is_searching() {
            self.nav.stop();
            self.target_facing = None;
        }
        if self.animator.target() == clip::WALK {
            self.animator.set_target(clip::IDLE);
        }
    }

    #[inline]
    pub fn is_searching(&self) -> bool {
        self.nav.is_searching()
    }

    #[inline]
    pub fn is_moving(&self) -> bool {
        self.nav.is_moving()
    }

    #[inline]
    pub fn path_failed(&self) -> bool {
        self.nav.failed()
    }

    /// Within `tolerance` metres of `point` on the ground plane.
    pub fn is_near(&self, point: Point, tolerance: f32) -> bool {
        self.position.planar_distance(point) <= tolerance
    }

    // ── Facing ────────────────────────────────────────────────────────────

    /// Turn toward `point` over the next fixed steps.  A point under the
    /// character's feet leaves the facing alone.
    pub fn face_toward(&mut self, point: Point) {
        if let Some(yaw) = self.position.yaw_to(point) {
            self.target_facing = Some(wrap_angle(yaw));
        }
    }

    pub fn face_yaw(&mut self, yaw: f32) {
        self.target_facing = Some(wrap_angle(yaw));
    }

    /// Facing `point` to within `tolerance` radians.
    pub fn is_facing(&self, point: Point, tolerance: f32) -> bool {
        match self.position.yaw_to(point) {
            Some(yaw) => yaw_delta(self.facing, yaw).abs() <= tolerance,
            None => true,
        }
    }

    #[inline]
    pub fn is_turning(&self) -> bool {
        self.target_facing.is_some()
    }

    /// One fixed step of walking and turning.
    pub fn locomote(&mut self, dt: f32) {
        if self.nav.is_searching() || self.nav.is_moving() {
            self.position = self.nav.advance(self.position, dt);
            if let Some(heading) = self.nav.heading_from(self.position) {
                self.target_facing = Some(heading);
            }
            if self.nav.arrived() || self.nav.failed() {
                trace!(id = %self.id, at = %self.position, arrived = self.nav.arrived(), "walk ended");
                if self.animator.target() == clip::WALK {
                    self.animator.set_target(clip::IDLE);
                }
            }
        }
        if let Some(target) = self.target_facing {
            let delta = yaw_delta(self.facing, target);
            let max = self.turn_rate * dt;
            if delta.abs() <= max {
                self.facing = target;
                self.target_facing = None;
            } else {
                self.facing = wrap_angle(self.facing + max.copysign(delta));
            }
        }
    }

    // ── Props ─────────────────────────────────────────────────────────────

    pub fn props(&self) -> &PropTable {
        &self.props
    }

    /// Try to take `prop`; queues this character if it is taken.
    pub fn acquire_prop(&mut self, prop: PropId) -> bool {
        if self.held == Some(prop) {
            return true;
        }
        let got = self.props.acquire(prop, self.id);
        if got {
            self.held = Some(prop);
        }
        got
    }

    /// Leave the line for `prop` without taking it.
    pub fn cancel_claim(&mut self, prop: PropId) {
        self.props.cancel(prop, self.id);
    }

    /// This character's place in line for `prop`; 0 while holding it.
    pub fn queue_position(&self, prop: PropId) -> Option<usize> {
        self.props.queue_position(prop, self.id)
    }

    /// Put down whatever is held.
    pub fn release_prop(&mut self) -> Option<PropId> {
        let prop = self.held.take()?;
        self.props.release(prop, self.id);
        Some(prop)
    }

    #[inline]
    pub fn held(&self) -> Option<PropId> {
        self.held
    }
}

impl std::fmt::Debug for Body {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Body")
            .field("id", &self.id)
            .field("position", &self.position)
            .field("facing", &self.facing)
            .field("animation", &self.animator.current())
            .field("held", &self.held)
            .finish()
    }
}
