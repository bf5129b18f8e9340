//! `tm-spatial` — coarse spatial indexing for collision candidate queries.
//!
//! # Crate layout
//!
//! | Module    | Contents                                                      |
//! |-----------|---------------------------------------------------------------|
//! | [`grid`]  | `VicinityGrid` — uniform hash grid over actor positions       |
//! | [`error`] | `SpatialError`, `SpatialResult<T>`                            |
//!
//! The grid holds managed and unregistered actors alike; it only knows ids
//! and the last location each id was bucketed at.

pub mod error;
pub mod grid;


pub use error::{SpatialError, SpatialResult};
pub use grid::{CellKey, VicinityGrid};
