//! Routing trait and default Dijkstra implementation.
//!
//! Costs are accumulated as whole millimetres so the search heap can order
//! them exactly; [`Route::length`] reports metres.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use npc_core::{LinkId, WaypointId};

use crate::{NavError, NavResult, WaypointGraph};

// ── Route ─────────────────────────────────────────────────────────────────────

/// Links to traverse in order, and their summed length.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub links:  Vec<LinkId>,
    pub length: f32,
}

impl Route {
    /// `true` when source and destination are the same waypoint.
    pub fn is_trivial(&self) -> bool {
        self.links.is_empty()
    }

    /// Waypoints visited after the start, ending at the destination.
    pub fn waypoints<'g>(&'g self, graph: &'g WaypointGraph) -> impl Iterator<Item = WaypointId> + 'g {
        self.links.iter().map(move |l| graph.link_to[l.index()])
    }
}

// ── Router trait ──────────────────────────────────────────────────────────────

/// Pluggable path search.
///
/// `Send + Sync` so one router can serve characters ticked on different
/// threads.
pub trait Router: Send + Sync {
    /// Route between two waypoints.  `from == to` yields an empty route.
    fn route(&self, graph: &WaypointGraph, from: WaypointId, to: WaypointId) -> NavResult<Route>;
}

// ── DijkstraRouter ────────────────────────────────────────────────────────────

/// Dijkstra over the CSR graph using `link_len` as cost.
#[derive(Clone, Copy, Debug, Default)]
pub struct DijkstraRouter;

impl Router for DijkstraRouter {
    fn route(&self, graph: &WaypointGraph, from: WaypointId, to: WaypointId) -> NavResult<Route> {
        for id in [from, to] {
            if !graph.contains(id) {
                return Err(NavError::WaypointNotFound(id));
            }
        }
        dijkstra(graph, from, to)
    }
}

#[inline]
fn link_cost_mm(graph: &WaypointGraph, link: LinkId) -> u32 {
    (graph.link_len[link.index()].max(0.0) * 1000.0) as u32
}

fn dijkstra(graph: &WaypointGraph, from: WaypointId, to: WaypointId) -> NavResult<Route> {
    if from == to {
        return Ok(Route { links: vec![], length: 0.0 });
    }

    let n = graph.waypoint_count();
    let mut dist      = vec![u32::MAX; n];
    let mut prev_link = vec![LinkId::INVALID; n];
    dist[from.index()] = 0;

    // Reverse turns the max-heap into a min-heap; the id breaks ties
    // deterministically.
    let mut heap: BinaryHeap<Reverse<(u32, WaypointId)>> = BinaryHeap::new();
    heap.push(Reverse((0, from)));

    while let Some(Reverse((cost, w))) = heap.pop() {
        if w == to {
            return Ok(reconstruct(graph, &prev_link, to));
        }
        if cost > dist[w.index()] {
            continue;
        }
        for link in graph.out_links(w) {
            let next = graph.link_to[link.index()];
            let new_cost = cost.saturating_add(link_cost_mm(graph, link));
            if new_cost < dist[next.index()] {
                dist[next.index()] = new_cost;
                prev_link[next.index()] = link;
                heap.push(Reverse((new_cost, next)));
            }
        }
    }

    Err(NavError::NoRoute { from, to })
}

fn reconstruct(graph: &WaypointGraph, prev_link: &[LinkId], to: WaypointId) -> Route {
    let mut links = Vec::new();
    let mut cur = to;
    loop {
        let l = prev_link[cur.index()];
        if l == LinkId::INVALID {
            break;
        }
        links.push(l);
        cur = graph.link_from[l.index()];
    }
    links.reverse();
    let length = links.iter().map(|l| graph.link_len[l.index()]).sum();
    Route { links, length }
}
