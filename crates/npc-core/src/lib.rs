//! `npc-core` — foundational types for the `rust_npc` character framework.
//!
//! This crate is a dependency of every other `npc-*` crate.  It intentionally
//! has no `npc-*` dependencies and minimal external ones (only `rand` and
//! `thiserror`, plus optional `serde`).
//!
//! # What lives here
//!
//! | Module          | Contents                                                |
//! |-----------------|---------------------------------------------------------|
//! | [`ids`]         | `CharacterId`, `NodeId`, `WaypointId`, `LinkId`, `AnimId`, `PropId` |
//! | [`geo`]         | `Point`, yaw helpers                                    |
//! | [`time`]        | `Tick`, `Frame`, `SimClock`, `SimConfig`                |
//! | [`rng`]         | `CharacterRng` (per-character), `SimRng` (global)       |
//! | [`contact`]     | `Contact`, the physical-contact payload                 |
//! | [`error`]       | `CoreError`, `CoreResult`                               |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public data types.   |

pub mod contact;
pub mod error;
pub mod geo;
pub mod ids;
pub mod rng;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use contact::Contact;
pub use error::{CoreError, CoreResult};
pub use geo::{Point, wrap_angle, yaw_delta};
pub use ids::{AnimId, CharacterId, LinkId, NodeId, PropId, WaypointId};
pub use rng::{CharacterRng, SimRng};
pub use time::{Frame, SimClock, SimConfig, Tick};
