//! Scene-space coordinates and heading helpers.
//!
//! The world is y-up.  Locomotion and facing are planar: headings are yaw
//! angles in radians about the y axis, measured from +z toward +x, so a
//! character with `facing == 0.0` looks down +z.

use std::f32::consts::{PI, TAU};

/// A position in scene space, in metres.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0, z: 0.0 };

    #[inline]
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// A point on the ground plane (`y == 0`).
    #[inline]
    pub fn flat(x: f32, z: f32) -> Self {
        Self { x, y: 0.0, z }
    }

    /// Euclidean distance in metres.
    pub fn distance(self, other: Point) -> f32 {
        let (dx, dy, dz) = (other.x - self.x, other.y - self.y, other.z - self.z);
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Distance on the ground plane, ignoring height.
    pub fn planar_distance(self, other: Point) -> f32 {
        let (dx, dz) = (other.x - self.x, other.z - self.z);
        (dx * dx + dz * dz).sqrt()
    }

    /// Yaw (radians) a character standing at `self` must face to look at
    /// `other`.  Returns `None` when the two points coincide on the plane.
    pub fn yaw_to(self, other: Point) -> Option<f32> {
        let (dx, dz) = (other.x - self.x, other.z - self.z);
        if dx.abs() < f32::EPSILON && dz.abs() < f32::EPSILON {
            return None;
        }
        Some(dx.atan2(dz))
    }

    /// Move from `self` toward `other` by at most `step` metres.
    ///
    /// Never overshoots: returns `other` when it is closer than `step`.
    pub fn step_toward(self, other: Point, step: f32) -> Point {
        let dist = self.distance(other);
        if dist <= step || dist < f32::EPSILON {
            return other;
        }
        let t = step / dist;
        Point {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
            z: self.z + (other.z - self.z) * t,
        }
    }

    /// `[x, y, z]`, the layout used by spatial indexes.
    #[inline]
    pub fn to_array(self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.2}, {:.2}, {:.2})", self.x, self.y, self.z)
    }
}

/// Normalise an angle to `(-π, π]`.
pub fn wrap_angle(angle: f32) -> f32 {
    let mut a = angle % TAU;
    if a <= -PI {
        a += TAU;
    } else if a > PI {
        a -= TAU;
    }
    a
}

/// Signed shortest rotation from heading `from` to heading `to`, in `(-π, π]`.
#[inline]
pub fn yaw_delta(from: f32, to: f32) -> f32 {
    wrap_angle(to - from)
}
