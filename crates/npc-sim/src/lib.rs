//! `npc-sim` — character bodies, stock behavior nodes, and the host loop.
//!
//! # Three-phase tick loop
//!
//! ```text
//! for tick in 0..config.total_ticks:
//!   ① Fixed   : walk along paths and turn toward facing targets, then the
//!               dispatcher's fixed phase.  Characters closer than
//!               config.contact_radius receive a Contact each, delivered in
//!               ascending id order.
//!   ② Update  : queued gestures, then the current unit's update, one
//!               scheduler validation pass, and the in-progress leaf's tick.
//!               Settlements reach the current unit as soon as they exist.
//!   ③ Late    : animation blends finish; a changed clip is routed to the
//!               in-progress leaf and its requirements.  Then the late phase.
//! ```
//!
//! | Module        | Contents                                                |
//! |---------------|---------------------------------------------------------|
//! | [`animator`]  | `Animator`, the stock `clip` ids                        |
//! | [`props`]     | `PropTable`, first-come-first-served `Arbiter`          |
//! | [`body`]      | `Body`, the scheduler context type                      |
//! | [`tasks`]     | `MoveTo`, `FaceToward`, `PlayAnimation`, `Wait`, `ClaimProp`, `Reached` |
//! | [`character`] | `Character`, a body plus its dispatcher                 |
//! | [`sim`]       | `Sim`, the tick loop                                    |
//! | [`builder`]   | `SimBuilder`                                            |
//! | [`observer`]  | `SimObserver`, `CharacterSnapshot`, `TickStats`         |
//!
//! # Cargo features
//!
//! | Feature    | Effect                                                 |
//! |------------|--------------------------------------------------------|
//! | `parallel` | Runs every phase on Rayon's thread pool.               |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use npc_core::{Point, SimConfig};
//! use npc_dispatch::IdleUnit;
//! use npc_sim::{NoopObserver, SimBuilder};
//!
//! let mut sim = SimBuilder::new(SimConfig::default(), Mode::Idle, |_, _, _| Box::new(IdleUnit))
//!     .character(Point::flat(0.0, 0.0))
//!     .build()?;
//! sim.run(&mut NoopObserver)?;
//! ```

pub mod animator;
pub mod body;
pub mod builder;
pub mod character;
pub mod error;
pub mod observer;
pub mod props;
pub mod sim;
pub mod tasks;


pub use animator::{Animator, DEFAULT_BLEND_TICKS, clip};
pub use body::{Body, DEFAULT_TURN_RATE};
pub use builder::SimBuilder;
pub use character::Character;
pub use error::{SimError, SimResult};
pub use observer::{CharacterSnapshot, NoopObserver, SimObserver, TickStats};
pub use props::{Arbiter, PropTable};
pub use sim::Sim;
pub use tasks::{ClaimProp, FaceToward, MoveTo, PlayAnimation, Reached, Wait};
