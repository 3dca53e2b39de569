//! `npc-nav` — waypoint graph, snapping, routing, and path following.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                   |
//! |---------------|------------------------------------------------------------|
//! | [`graph`]     | `WaypointGraph` (CSR + R-tree), `WaypointGraphBuilder`     |
//! | [`router`]    | `Router` trait, `Route`, `DijkstraRouter`                  |
//! | [`navigator`] | `Navigator` path follower, `Path`                          |
//! | [`error`]     | `NavError`, `NavResult<T>`                                 |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                       |
//! |---------|--------------------------------------------------------------|
//! | `serde` | Derives `Serialize`/`Deserialize` on `Path`.                 |

pub mod error;
pub mod graph;
pub mod navigator;
pub mod router;

#[cfg(test)]
mod tests;

pub use error::{NavError, NavResult};
pub use graph::{WaypointGraph, WaypointGraphBuilder};
pub use navigator::{DEFAULT_SPEED, Navigator, Path};
pub use router::{DijkstraRouter, Route, Router};
