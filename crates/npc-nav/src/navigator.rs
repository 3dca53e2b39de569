//! Per-character path following.
//!
//! A [`Navigator`] is the locomotion collaborator behavior nodes talk to:
//!
//! | Call              | Effect                                                   |
//! |-------------------|----------------------------------------------------------|
//! | `request(a, b)`   | queue a search; `is_searching()` until the next advance  |
//! | `begin_path(a, b)`| search now and start following, or fail                  |
//! | `advance(p, dt)`  | resolve a pending search, then walk along the path       |
//! | `stop()`          | drop the path and any pending search                     |
//!
//! Paths start at the waypoint nearest the origin and end at the exact
//! requested destination, so a character walks onto the graph, along it, and
//! off it again.

use std::sync::Arc;

use tracing::{debug, warn};

use npc_core::Point;

use crate::{DijkstraRouter, NavError, NavResult, Router, WaypointGraph};

/// Default walking speed in metres per second.
pub const DEFAULT_SPEED: f32 = 1.4;

// ── Path ──────────────────────────────────────────────────────────────────────

/// Corners to walk through, in order, ending at the destination.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Path {
    pub corners: Vec<Point>,
    /// Total length in metres, measured from the requested origin.
    pub length:  f32,
}

impl Path {
    #[inline]
    pub fn destination(&self) -> Option<Point> {
        self.corners.last().copied()
    }

    /// Seconds needed at `speed` metres per second.
    pub fn travel_secs(&self, speed: f32) -> f32 {
        if speed <= 0.0 { f32::INFINITY } else { self.length / speed }
    }
}

// ── Navigator ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
enum Phase {
    Idle,
    Searching { from: Point, to: Point },
    Following,
    Arrived,
    Failed,
}

pub struct Navigator<R: Router = DijkstraRouter> {
    graph:  Arc<WaypointGraph>,
    router: R,
    speed:  f32,
    phase:  Phase,
    path:   Option<Path>,
    /// Index of the corner being walked toward.
    next:   usize,
    error:  Option<NavError>,
}

impl Navigator<DijkstraRouter> {
    /// A navigator over `graph` with the default router and walking speed.
    pub fn new(graph: Arc<WaypointGraph>) -> Self {
        Self::with_router(graph, DijkstraRouter)
    }
}

impl<R: Router> Navigator<R> {
    pub fn with_router(graph: Arc<WaypointGraph>, router: R) -> Self {
        Self {
            graph,
            router,
            speed: DEFAULT_SPEED,
            phase: Phase::Idle,
            path: None,
            next: 0,
            error: None,
        }
    }

    /// Builder-style speed override, metres per second.
    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    #[inline]
    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
    }

    pub fn graph(&self) -> &WaypointGraph {
        &self.graph
    }

    // ── Requests ──────────────────────────────────────────────────────────

    /// Ask for a path; the search runs on the next [`advance`](Self::advance).
    pub fn request(&mut self, from: Point, to: Point) {
        self.clear();
        self.phase = Phase::Searching { from, to };
    }

    /// Search immediately and start following the result.
    ///
    /// On failure the navigator is left in the failed state with the error
    /// available from [`failure`](Self::failure).
    pub fn begin_path(&mut self, from: Point, to: Point) -> NavResult<&Path> {
        self.clear();
        match self.search(from, to) {
            Ok(path) => {
                debug!(%from, %to, corners = path.corners.len(), length = path.length, "path found");
                self.phase = Phase::Following;
                Ok(&*self.path.insert(path))
            }
            Err(err) => {
                warn!(%from, %to, %err, "path search failed");
                self.phase = Phase::Failed;
                self.error = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Abandon the current path or pending search.
    pub fn stop(&mut self) {
        if self.phase != Phase::Idle {
            debug!(phase = ?self.phase, "navigation stopped");
        }
        self.clear();
    }

    fn clear(&mut self) {
        self.phase = Phase::Idle;
        self.path = None;
        self.next = 0;
        self.error = None;
    }

    fn search(&self, from: Point, to: Point) -> NavResult<Path> {
        let (Some(start), Some(end)) = (self.graph.nearest(from), self.graph.nearest(to)) else {
            return Err(NavError::EmptyGraph(to));
        };
        let route = self.router.route(&self.graph, start, end)?;

        let mut corners = Vec::with_capacity(route.links.len() + 2);
        corners.push(self.graph.position_of(start)?);
        corners.extend(route.waypoints(&self.graph).map(|w| self.graph.position[w.index()]));
        corners.push(to);
        corners.dedup_by(|a, b| a.distance(*b) < f32::EPSILON);

        let mut length = 0.0;
        let mut at = from;
        for &c in &corners {
            length += at.distance(c);
            at = c;
        }
        Ok(Path { corners, length })
    }

    // ── Motion ────────────────────────────────────────────────────────────

    /// Move from `position` along the path for `dt` seconds and return the
    /// new position.  A pending search is resolved first.
    pub fn advance(&mut self, position: Point, dt: f32) -> Point {
        if let Phase::Searching { from, to } = self.phase {
            // Failure is recorded on self; nothing to walk this frame.
            if self.begin_path(from, to).is_err() {
                return position;
            }
        }
        if self.phase != Phase::Following {
            return position;
        }
        let Some(path) = &self.path else {
            return position;
        };

        let mut pos = position;
        let mut budget = self.speed * dt;
        while self.next < path.corners.len() {
            let corner = path.corners[self.next];
            let d = pos.distance(corner);
            if d > budget {
                pos = pos.step_toward(corner, budget);
                break;
            }
            pos = corner;
            budget -= d;
            self.next += 1;
        }
        if self.next >= path.corners.len() {
            debug!(at = %pos, "destination reached");
            self.phase = Phase::Arrived;
        }
        pos
    }

    // ── Queries ───────────────────────────────────────────────────────────

    #[inline]
    pub fn is_searching(&self) -> bool {
        matches!(self.phase, Phase::Searching { .. })
    }

    /// Following a path and not yet there.
    #[inline]
    pub fn is_moving(&self) -> bool {
        self.phase == Phase::Following
    }

    #[inline]
    pub fn arrived(&self) -> bool {
        self.phase == Phase::Arrived
    }

    #[inline]
    pub fn failed(&self) -> bool {
        self.phase == Phase::Failed
    }

    pub fn failure(&self) -> Option<&NavError> {
        self.error.as_ref()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_ref()
    }

    /// Where the current path or pending search ends.
    pub fn destination(&self) -> Option<Point> {
        match self.phase {
            Phase::Searching { to, .. } => Some(to),
            _ => self.path.as_ref().and_then(Path::destination),
        }
    }

    /// Heading toward the next corner while moving.
    pub fn heading_from(&self, position: Point) -> Option<f32> {
        if !self.is_moving() {
            return None;
        }
        let corner = self.path.as_ref()?.corners.get(self.next)?;
        position.yaw_to(*corner)
    }
}

impl<R: Router> std::fmt::Debug for Navigator<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Navigator")
            .field("phase", &self.phase)
            .field("next", &self.next)
            .field("speed", &self.speed)
            .finish()
    }
}
