//! `tm-geometry` — footprint polygons and the collision negotiation rule.
//!
//! # Crate layout
//!
//! | Module          | Contents                                                   |
//! |-----------------|------------------------------------------------------------|
//! | [`footprint`]   | `boundary`, `geodesic_boundary`, `Footprint`               |
//! | [`polygon`]     | `overlap`, `clearance` over closed rings                   |
//! | [`negotiation`] | `ActorView`, `Assessment`, `assess`, `negotiate` (+ `_against`) |
//! | [`draw`]        | `DebugDraw` trait, `NoopDebugDraw`, `draw_ring`            |
//!
//! # Conventions
//!
//! A ring is a slice of [`Location`][tm_core::Location]s listed once each;
//! the closing edge from the last point back to the first is implied.  Only
//! `x`/`y` take part in polygon operations; `z` is carried along for
//! drawing.
//!
//! Rings are ordered clockwise in the simulator's left-handed frame (which
//! is counter-clockwise in a conventional right-handed plot).  The polygon
//! operations normalise winding themselves, so callers never need to care.

pub mod draw;
pub mod footprint;
pub mod negotiation;
pub mod polygon;


pub use draw::{Color, DebugDraw, NoopDebugDraw, draw_ring};
pub use footprint::{Footprint, boundary, geodesic_boundary};
pub use negotiation::{ActorView, Assessment, assess, assess_against, negotiate, negotiate_against};
pub use polygon::{clearance, overlap};
