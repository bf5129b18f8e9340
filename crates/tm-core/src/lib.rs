//! `tm-core` — foundational types for the `rust_tm` traffic manager.
//!
//! This crate is a dependency of every other `tm-*` crate.  It intentionally
//! has no `tm-*` dependencies and minimal external ones (only `thiserror`,
//! plus optional `serde`).
//!
//! # What lives here
//!
//! | Module      | Contents                                                  |
//! |-------------|-----------------------------------------------------------|
//! | [`ids`]     | `ActorId`                                                 |
//! | [`version`] | `Version` — pipeline message sequence numbers             |
//! | [`geom`]    | `Vector3D` / `Location`, planar helpers                   |
//! | [`actor`]   | `ActorState`, `Extent`, `Waypoint`                        |
//! | [`config`]  | `CollisionConfig` and its reference constants             |
//! | [`error`]   | `TmError`, `TmResult`                                     |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |

pub mod actor;
pub mod config;
pub mod error;
pub mod geom;
pub mod ids;
pub mod version;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use actor::{ActorState, Extent, Waypoint};
pub use config::CollisionConfig;
pub use error::{TmError, TmResult};
pub use geom::{Location, Vector3D};
pub use ids::ActorId;
pub use version::Version;
