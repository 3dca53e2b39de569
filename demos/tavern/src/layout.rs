//! The tavern floor plan: waypoints, corridors, and the keg.

use npc_core::{Point, PropId};
use npc_nav::{WaypointGraph, WaypointGraphBuilder};
use npc_sim::PropTable;

/// Named spots the units walk between.
#[derive(Debug, Clone)]
pub struct Places {
    /// Where idle characters drift to.
    pub spots:  Vec<Point>,
    /// Where drawn ale is served.
    pub bar:    Point,
    pub keg:    PropId,
    pub keg_at: Point,
}

/// Build the seven-waypoint tavern.
///
/// ```text
///   hearth(0,6) ── table_a(4,6) ── table_b(8,6)
///     │              │               │
///   door(0,0) ──── hall(4,0) ───── bar(8,0) ── cellar(12,0)
/// ```
///
/// The keg stands in the cellar.
pub fn build_tavern() -> (WaypointGraph, PropTable, Places) {
    let mut b = WaypointGraphBuilder::new();

    let door    = b.add_waypoint(Point::flat(0.0, 0.0));
    let hall    = b.add_waypoint(Point::flat(4.0, 0.0));
    let bar     = b.add_waypoint(Point::flat(8.0, 0.0));
    let cellar  = b.add_waypoint(Point::flat(12.0, 0.0));
    let hearth  = b.add_waypoint(Point::flat(0.0, 6.0));
    let table_a = b.add_waypoint(Point::flat(4.0, 6.0));
    let table_b = b.add_waypoint(Point::flat(8.0, 6.0));

    for (a, c) in [
        (door, hall),
        (hall, bar),
        (bar, cellar),
        (door, hearth),
        (hearth, table_a),
        (table_a, table_b),
        (hall, table_a),
        (bar, table_b),
    ] {
        b.add_corridor(a, c);
    }
    let graph = b.build();

    let mut props = PropTable::new();
    let keg_at = Point::flat(12.0, 0.0);
    let keg = props.add("keg", keg_at);

    let places = Places {
        spots: vec![
            Point::flat(0.0, 0.0),
            Point::flat(4.0, 0.0),
            Point::flat(0.0, 6.0),
            Point::flat(4.0, 6.0),
            Point::flat(8.0, 6.0),
        ],
        bar: Point::flat(8.0, 0.0),
        keg,
        keg_at,
    };
    (graph, props, places)
}
