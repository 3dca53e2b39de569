//! `npc-dispatch` — top-level behavior units for one character.
//!
//! # Crate layout
//!
//! | Module         | Contents                                                  |
//! |----------------|-----------------------------------------------------------|
//! | [`unit`]       | `BehaviorUnit` hooks, `UnitCx`, the `UnitKind` bound      |
//! | [`dispatcher`] | `Dispatcher`: registry, transitions, phase routing        |
//! | [`idle`]       | `IdleUnit`, the do-nothing fallback                       |
//! | [`permission`] | `Permission` gate vocabulary and `Gesture` events         |
//! | [`error`]      | `DispatchError`, `DispatchResult<T>`                      |
//!
//! # Design notes
//!
//! A unit kind is a fieldless enum; the dispatcher holds one boxed unit per
//! variant, created once by a factory.  The dispatcher also owns the
//! character's [`Scheduler`][npc_sched::Scheduler] and forwards each
//! settlement it drains to the unit that is current at that moment.
//!
//! ```ignore
//! #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, EnumCount)]
//! enum Conduct { Idle, Fetch, Greet }
//!
//! let mut d = Dispatcher::new(Conduct::Idle, |kind, sched| match kind {
//!     Conduct::Idle  => Box::new(IdleUnit),
//!     Conduct::Fetch => Box::new(FetchUnit::new(sched)),
//!     Conduct::Greet => Box::new(GreetUnit::default()),
//! });
//! d.start(&mut body);
//! ```

pub mod dispatcher;
pub mod error;
pub mod idle;
pub mod permission;
pub mod unit;

#[cfg(test)]
mod tests;

pub use dispatcher::Dispatcher;
pub use error::{DispatchError, DispatchResult};
pub use idle::IdleUnit;
pub use permission::{Gesture, Permission};
pub use unit::{BehaviorUnit, UnitCx, UnitKind};
