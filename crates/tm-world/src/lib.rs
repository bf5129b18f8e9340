//! `tm-world` — the simulation backend as seen by the traffic manager.
//!
//! # Crate layout
//!
//! | Module     | Contents                                                        |
//! |------------|-----------------------------------------------------------------|
//! | [`actor`]  | `Actor` trait, `ActorRef` shared handle                         |
//! | [`filter`] | `ActorFilter` — type-id glob such as `"vehicle.*"`              |
//! | [`world`]  | `WorldBackend` trait — enumerate live actors                    |
//! | [`memory`] | `InMemoryWorld`, `SimActor` — backend for tests and demos       |
//! | [`error`]  | `WorldError`, `WorldResult<T>`                                  |
//!
//! # Liveness
//!
//! Actors can be destroyed by the backend at any moment, including between
//! the time a handle was obtained and the time it is read.  Every state
//! read is therefore fallible ([`Actor::state`]); callers decide whether a
//! destroyed actor is fatal or merely skipped.

pub mod actor;
pub mod error;
pub mod filter;
pub mod memory;
pub mod world;


pub use actor::{Actor, ActorRef};
pub use error::{WorldError, WorldResult};
pub use filter::ActorFilter;
pub use memory::{InMemoryWorld, SimActor};
pub use world::WorldBackend;
