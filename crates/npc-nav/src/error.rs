//! Navigation error type.

use thiserror::Error;

use npc_core::{Point, WaypointId};

/// Errors produced by `npc-nav`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NavError {
    #[error("no route from {from} to {to}")]
    NoRoute { from: WaypointId, to: WaypointId },

    #[error("waypoint {0} not found in graph")]
    WaypointNotFound(WaypointId),

    #[error("cannot path to {0}: the waypoint graph is empty")]
    EmptyGraph(Point),
}

pub type NavResult<T> = Result<T, NavError>;
