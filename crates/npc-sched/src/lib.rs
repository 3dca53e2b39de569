//! `npc-sched` — behavior nodes and the per-character tick scheduler.
//!
//! # Crate layout
//!
//! | Module         | Contents                                                      |
//! |----------------|---------------------------------------------------------------|
//! | [`status`]     | `Status` tri-state (`Running` / `Success` / `Failure`)        |
//! | [`task`]       | `Task` trait (callback slots), `NodeCx`, closure tasks        |
//! | [`commands`]   | `Commands` buffer: force flags and deferred queue changes     |
//! | [`tree`]       | `NodeTree` arena: requirements, passives, flags, reset        |
//! | [`event`]      | `NodeEvent` lifecycle edges, `Watcher`                        |
//! | [`scheduler`]  | `Scheduler`: root queue, validation pass, phase routing       |
//! | [`settlement`] | `Settlement`, `Conclusion` reports of roots leaving the queue |
//! | [`error`]      | `TreeError`, `TreeResult<T>`                                  |
//!
//! # Design notes
//!
//! A scheduler is owned by exactly one character and is driven from that
//! character's tick, so nothing here locks.  The context type `C` is the
//! character state node callbacks read and write; the scheduler never looks
//! inside it.
//!
//! Nodes never hold a reference to the scheduler.  Anything a callback wants
//! to change outside its own task goes through [`Commands`], which keeps the
//! tree stable while a validation pass is walking it.

pub mod commands;
pub mod error;
pub mod event;
pub mod scheduler;
pub mod settlement;
pub mod status;
pub mod task;
pub mod tree;


pub use commands::Commands;
pub use error::{TreeError, TreeResult};
pub use event::{NodeEvent, Watcher};
pub use scheduler::{Phase, Scheduler};
pub use settlement::{Conclusion, Settlement};
pub use status::Status;
pub use task::{FnTask, NodeCx, Task, from_fn};
pub use tree::{Link, NodeTree};
