//! Unit tests for npc-nav.
//!
//! All graphs are hand-built on the ground plane.

use std::sync::Arc;

use npc_core::{Point, WaypointId};

use crate::{DijkstraRouter, NavError, Navigator, Router, WaypointGraph, WaypointGraphBuilder};

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Five waypoints (x, z):
///
/// ```text
///   0:(0,0) ── 1:(4,0) ── 2:(8,0)
///     │                     │
///   3:(0,4) ────────────── 4:(8,4)
/// ```
///
/// Link costs make 0→1→2→4 (3 + 3 + 3 = 9) cheaper than 0→3→4 (4 + 20).
fn tavern() -> (WaypointGraph, [WaypointId; 5]) {
    let mut b = WaypointGraphBuilder::new();
    let w0 = b.add_waypoint(Point::flat(0.0, 0.0));
    let w1 = b.add_waypoint(Point::flat(4.0, 0.0));
    let w2 = b.add_waypoint(Point::flat(8.0, 0.0));
    let w3 = b.add_waypoint(Point::flat(0.0, 4.0));
    let w4 = b.add_waypoint(Point::flat(8.0, 4.0));
    for (a, c, len) in [(w0, w1, 3.0), (w1, w2, 3.0), (w2, w4, 3.0), (w0, w3, 4.0), (w3, w4, 20.0)] {
        b.add_link_with_len(a, c, len);
        b.add_link_with_len(c, a, len);
    }
    (b.build(), [w0, w1, w2, w3, w4])
}

/// Two waypoints ten metres apart along +x.
fn hallway() -> Arc<WaypointGraph> {
    let mut b = WaypointGraphBuilder::new();
    let a = b.add_waypoint(Point::flat(0.0, 0.0));
    let c = b.add_waypoint(Point::flat(10.0, 0.0));
    b.add_corridor(a, c);
    Arc::new(b.build())
}

fn close(a: Point, b: Point) -> bool {
    a.distance(b) < 1e-4
}

// ── Graph ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod graph_tests {
    use super::*;

    #[test]
    fn empty_build() {
        let g = WaypointGraph::empty();
        assert!(g.is_empty());
        assert_eq!(g.link_count(), 0);
        assert_eq!(g.nearest(Point::ORIGIN), None);
    }

    #[test]
    fn corridor_lengths_come_from_geometry() {
        let mut b = WaypointGraphBuilder::new();
        let a = b.add_waypoint(Point::flat(0.0, 0.0));
        let c = b.add_waypoint(Point::flat(3.0, 4.0));
        b.add_corridor(a, c);
        assert_eq!(b.link_count(), 2);
        let g = b.build();
        assert_eq!(g.link_len, vec![5.0, 5.0]);
    }

    #[test]
    fn csr_degrees_and_sources() {
        let (g, [w0, w1, w2, w3, w4]) = tavern();
        for w in [w0, w1, w2, w3, w4] {
            assert_eq!(g.out_degree(w), 2);
            for l in g.out_links(w) {
                assert_eq!(g.link_from[l.index()], w);
            }
        }
    }

    #[test]
    fn one_way_link_has_no_return() {
        let mut b = WaypointGraphBuilder::new();
        let a = b.add_waypoint(Point::flat(0.0, 0.0));
        let c = b.add_waypoint(Point::flat(1.0, 0.0));
        b.add_link(a, c);
        let g = b.build();
        assert_eq!(g.out_degree(a), 1);
        assert_eq!(g.out_degree(c), 0);
    }

    #[test]
    fn nearest_snaps_to_closest_waypoint() {
        let (g, [w0, w1, _, w3, _]) = tavern();
        assert_eq!(g.nearest(Point::flat(0.0, 0.0)), Some(w0));
        assert_eq!(g.nearest(Point::flat(1.5, 0.2)), Some(w0));
        assert_eq!(g.nearest(Point::flat(2.5, 0.2)), Some(w1));
        assert_eq!(g.k_nearest(Point::flat(0.0, 3.0), 2), vec![w3, w0]);
    }

    #[test]
    fn position_of_unknown_waypoint_errors() {
        let (g, [w0, ..]) = tavern();
        assert_eq!(g.position_of(w0), Ok(Point::flat(0.0, 0.0)));
        assert_eq!(g.position_of(WaypointId(99)), Err(NavError::WaypointNotFound(WaypointId(99))));
    }
}

// ── Routing ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod routing_tests {
    use super::*;

    #[test]
    fn same_waypoint_is_trivial() {
        let (g, [w0, ..]) = tavern();
        let r = DijkstraRouter.route(&g, w0, w0).unwrap();
        assert!(r.is_trivial());
        assert_eq!(r.length, 0.0);
    }

    #[test]
    fn cheapest_route_wins() {
        let (g, [w0, w1, w2, _, w4]) = tavern();
        let r = DijkstraRouter.route(&g, w0, w4).unwrap();
        assert_eq!(r.length, 9.0);
        assert_eq!(r.waypoints(&g).collect::<Vec<_>>(), vec![w1, w2, w4]);
        assert_eq!(g.link_from[r.links[0].index()], w0);
    }

    #[test]
    fn disconnected_waypoints_have_no_route() {
        let mut b = WaypointGraphBuilder::new();
        let a = b.add_waypoint(Point::flat(0.0, 0.0));
        let c = b.add_waypoint(Point::flat(1.0, 0.0));
        let g = b.build();
        assert_eq!(DijkstraRouter.route(&g, a, c), Err(NavError::NoRoute { from: a, to: c }));
    }

    #[test]
    fn unknown_waypoint_is_rejected() {
        let (g, [w0, ..]) = tavern();
        let err = DijkstraRouter.route(&g, w0, WaypointId(42)).unwrap_err();
        assert_eq!(err, NavError::WaypointNotFound(WaypointId(42)));
    }
}

// ── Navigator ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod navigator_tests {
    use super::*;

    #[test]
    fn begin_path_walks_onto_along_and_off_the_graph() {
        let (g, _) = tavern();
        let mut nav = Navigator::new(Arc::new(g));
        let from = Point::flat(0.5, 0.0);
        let to = Point::flat(8.0, 5.0);
        let path = nav.begin_path(from, to).unwrap().clone();
        assert_eq!(path.corners, vec![
            Point::flat(0.0, 0.0),
            Point::flat(4.0, 0.0),
            Point::flat(8.0, 0.0),
            Point::flat(8.0, 4.0),
            to,
        ]);
        // 0.5 back to the graph, 8 along x, 5 along z.
        assert!((path.length - 13.5).abs() < 1e-4);
        assert!(nav.is_moving());
        assert_eq!(nav.destination(), Some(to));
    }

    #[test]
    fn advance_moves_at_speed_and_arrives() {
        let mut nav = Navigator::new(hallway()).with_speed(3.0);
        nav.begin_path(Point::ORIGIN, Point::flat(10.0, 0.0)).unwrap();

        let mut pos = Point::ORIGIN;
        pos = nav.advance(pos, 1.0);
        assert!(close(pos, Point::flat(3.0, 0.0)));
        assert!(!nav.arrived());

        pos = nav.advance(pos, 1.0);
        pos = nav.advance(pos, 1.0);
        assert!(!nav.arrived());
        pos = nav.advance(pos, 1.0);
        assert!(nav.arrived());
        assert_eq!(pos, Point::flat(10.0, 0.0));

        // Arrived navigators stay put.
        assert_eq!(nav.advance(pos, 1.0), pos);
    }

    #[test]
    fn request_resolves_on_next_advance() {
        let mut nav = Navigator::new(hallway()).with_speed(2.0);
        nav.request(Point::ORIGIN, Point::flat(10.0, 0.0));
        assert!(nav.is_searching());
        assert!(nav.path().is_none());
        assert_eq!(nav.destination(), Some(Point::flat(10.0, 0.0)));

        let pos = nav.advance(Point::ORIGIN, 0.5);
        assert!(!nav.is_searching());
        assert!(nav.is_moving());
        assert!(close(pos, Point::flat(1.0, 0.0)));
    }

    #[test]
    fn failed_search_is_reported() {
        let mut b = WaypointGraphBuilder::new();
        b.add_waypoint(Point::flat(0.0, 0.0));
        b.add_waypoint(Point::flat(10.0, 0.0));
        let mut nav = Navigator::new(Arc::new(b.build()));

        nav.request(Point::ORIGIN, Point::flat(10.0, 0.0));
        let pos = nav.advance(Point::ORIGIN, 1.0);
        assert_eq!(pos, Point::ORIGIN);
        assert!(nav.failed());
        assert!(matches!(nav.failure(), Some(NavError::NoRoute { .. })));
    }

    #[test]
    fn empty_graph_cannot_path() {
        let mut nav = Navigator::new(Arc::new(WaypointGraph::empty()));
        let to = Point::flat(1.0, 1.0);
        assert_eq!(nav.begin_path(Point::ORIGIN, to), Err(NavError::EmptyGraph(to)));
        assert!(nav.failed());
    }

    #[test]
    fn stop_clears_everything() {
        let mut nav = Navigator::new(hallway());
        nav.begin_path(Point::ORIGIN, Point::flat(10.0, 0.0)).unwrap();
        nav.stop();
        assert!(!nav.is_moving());
        assert!(nav.path().is_none());
        assert_eq!(nav.destination(), None);
        assert_eq!(nav.advance(Point::ORIGIN, 1.0), Point::ORIGIN);
    }

    #[test]
    fn heading_points_at_the_next_corner() {
        let mut nav = Navigator::new(hallway());
        assert_eq!(nav.heading_from(Point::ORIGIN), None);
        nav.begin_path(Point::ORIGIN, Point::flat(10.0, 0.0)).unwrap();
        let pos = nav.advance(Point::ORIGIN, 0.1);
        let yaw = nav.heading_from(pos).unwrap();
        assert!((yaw - std::f32::consts::FRAC_PI_2).abs() < 1e-5);
    }
}
