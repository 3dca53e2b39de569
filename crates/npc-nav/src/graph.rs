//! Waypoint graph representation and builder.
//!
//! # Data layout
//!
//! Outgoing links are stored in **Compressed Sparse Row (CSR)** form.  Given a
//! `WaypointId w`, its links occupy
//!
//! ```text
//! link_to[ out_start[w] .. out_start[w+1] ]
//! ```
//!
//! `link_from`, `link_to`, and `link_len` are sorted by source waypoint and
//! indexed by `LinkId`, so walking a waypoint's links is a contiguous scan.
//!
//! # Spatial index
//!
//! An R-tree (via `rstar`) maps a scene position to the nearest waypoint.
//! Path requests name arbitrary points; both ends are snapped through it.

use rstar::{PointDistance, RTree, RTreeObject, AABB};

use npc_core::{LinkId, Point, WaypointId};

use crate::{NavError, NavResult};

// ── R-tree entry ──────────────────────────────────────────────────────────────

#[derive(Clone)]
struct WaypointEntry {
    point: [f32; 3],
    id:    WaypointId,
}

impl RTreeObject for WaypointEntry {
    type Envelope = AABB<[f32; 3]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for WaypointEntry {
    fn distance_2(&self, point: &[f32; 3]) -> f32 {
        let dx = self.point[0] - point[0];
        let dy = self.point[1] - point[1];
        let dz = self.point[2] - point[2];
        dx * dx + dy * dy + dz * dz
    }
}

// ── WaypointGraph ─────────────────────────────────────────────────────────────

/// Directed waypoint graph in CSR format plus a spatial index for snapping.
///
/// Built once per scene with [`WaypointGraphBuilder`] and shared read-only
/// between characters.
pub struct WaypointGraph {
    /// Scene position of each waypoint.  Indexed by `WaypointId`.
    pub position: Vec<Point>,

    /// CSR row pointer.  Length = `waypoint_count + 1`.
    pub out_start: Vec<u32>,

    /// Source waypoint of each link; needed to walk a route backwards.
    pub link_from: Vec<WaypointId>,

    pub link_to: Vec<WaypointId>,

    /// Length of each link in metres.
    pub link_len: Vec<f32>,

    spatial_idx: RTree<WaypointEntry>,
}

impl WaypointGraph {
    /// A graph with no waypoints.  Every path request against it fails.
    pub fn empty() -> Self {
        WaypointGraphBuilder::new().build()
    }

    pub fn waypoint_count(&self) -> usize {
        self.position.len()
    }

    pub fn link_count(&self) -> usize {
        self.link_to.len()
    }

    pub fn is_empty(&self) -> bool {
        self.position.is_empty()
    }

    pub fn contains(&self, id: WaypointId) -> bool {
        id.index() < self.position.len()
    }

    /// Position of `id`, or [`NavError::WaypointNotFound`].
    pub fn position_of(&self, id: WaypointId) -> NavResult<Point> {
        self.position.get(id.index()).copied().ok_or(NavError::WaypointNotFound(id))
    }

    #[inline]
    pub fn out_links(&self, w: WaypointId) -> impl Iterator<Item = LinkId> + '_ {
        let start = self.out_start[w.index()] as usize;
        let end   = self.out_start[w.index() + 1] as usize;
        (start..end).map(|i| LinkId(i as u32))
    }

    #[inline]
    pub fn out_degree(&self, w: WaypointId) -> usize {
        (self.out_start[w.index() + 1] - self.out_start[w.index()]) as usize
    }

    // ── Spatial queries ───────────────────────────────────────────────────

    /// The waypoint closest to `pos`; `None` only for an empty graph.
    pub fn nearest(&self, pos: Point) -> Option<WaypointId> {
        self.spatial_idx.nearest_neighbor(&pos.to_array()).map(|e| e.id)
    }

    /// Up to `k` waypoints nearest to `pos`, closest first.
    pub fn k_nearest(&self, pos: Point, k: usize) -> Vec<WaypointId> {
        self.spatial_idx
            .nearest_neighbor_iter(&pos.to_array())
            .take(k)
            .map(|e| e.id)
            .collect()
    }
}

impl std::fmt::Debug for WaypointGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WaypointGraph")
            .field("waypoints", &self.waypoint_count())
            .field("links", &self.link_count())
            .finish()
    }
}

// ── WaypointGraphBuilder ──────────────────────────────────────────────────────

/// Collect waypoints and links in any order, then [`build`](Self::build).
///
/// ```
/// use npc_core::Point;
/// use npc_nav::WaypointGraphBuilder;
///
/// let mut b = WaypointGraphBuilder::new();
/// let door = b.add_waypoint(Point::flat(0.0, 0.0));
/// let bar  = b.add_waypoint(Point::flat(4.0, 3.0));
/// b.add_corridor(door, bar);
/// let graph = b.build();
/// assert_eq!(graph.link_count(), 2);
/// assert_eq!(graph.link_len[0], 5.0);
/// ```
#[derive(Default)]
pub struct WaypointGraphBuilder {
    waypoints: Vec<Point>,
    raw_links: Vec<RawLink>,
}

struct RawLink {
    from: WaypointId,
    to:   WaypointId,
    len:  f32,
}

impl WaypointGraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a waypoint; ids are sequential from 0.
    pub fn add_waypoint(&mut self, pos: Point) -> WaypointId {
        let id = WaypointId(self.waypoints.len() as u32);
        self.waypoints.push(pos);
        id
    }

    /// One-way link whose length is the distance between the two waypoints.
    pub fn add_link(&mut self, from: WaypointId, to: WaypointId) {
        let len = self.waypoints[from.index()].distance(self.waypoints[to.index()]);
        self.add_link_with_len(from, to, len);
    }

    /// One-way link with an explicit cost, e.g. to make a crowded aisle
    /// dearer than its geometry.
    pub fn add_link_with_len(&mut self, from: WaypointId, to: WaypointId, len: f32) {
        self.raw_links.push(RawLink { from, to, len });
    }

    /// Links in both directions.
    pub fn add_corridor(&mut self, a: WaypointId, b: WaypointId) {
        self.add_link(a, b);
        self.add_link(b, a);
    }

    pub fn waypoint_count(&self) -> usize { self.waypoints.len() }
    pub fn link_count(&self) -> usize { self.raw_links.len() }

    pub fn build(self) -> WaypointGraph {
        let count = self.waypoints.len();
        let mut raw = self.raw_links;
        raw.sort_by_key(|l| l.from.0);

        let link_from: Vec<WaypointId> = raw.iter().map(|l| l.from).collect();
        let link_to:   Vec<WaypointId> = raw.iter().map(|l| l.to).collect();
        let link_len:  Vec<f32>        = raw.iter().map(|l| l.len).collect();

        let mut out_start = vec![0u32; count + 1];
        for l in &raw {
            out_start[l.from.index() + 1] += 1;
        }
        for i in 1..=count {
            out_start[i] += out_start[i - 1];
        }
        debug_assert_eq!(out_start[count] as usize, raw.len());

        let entries: Vec<WaypointEntry> = self
            .waypoints
            .iter()
            .enumerate()
            .map(|(i, p)| WaypointEntry { point: p.to_array(), id: WaypointId(i as u32) })
            .collect();

        WaypointGraph {
            position: self.waypoints,
            out_start,
            link_from,
            link_to,
            link_len,
            spatial_idx: RTree::bulk_load(entries),
        }
    }
}
