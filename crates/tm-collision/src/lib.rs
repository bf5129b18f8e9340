//! `tm-collision` — the collision-hazard stage of the traffic manager.
//!
//! Sits between localization (which publishes each managed vehicle with its
//! forward path buffer) and motion planning (which reads one hazard flag per
//! vehicle).
//!
//! # Tick
//!
//! ```text
//! receive   newest LocalizationFrame; rebuild id → slot lookup
//! prepare   (one pool thread, before any worker starts)
//!             tracker: discover unregistered actors every discovery_interval,
//!                      refresh or evict tracked actors every tick
//!             grid:    re-bucket managed vehicles, drop ids that left the frame
//! execute   (every worker, contiguous slot range)
//!             for each ego: grid neighbors → exact distance gate → negotiate
//!             against the ego footprint, built once per ego;
//!             stop at the first hazard; skip candidates that cannot be read
//! send      publish the filled HazardFrame; flip output buffers
//! ```
//!
//! # Crate layout
//!
//! | Module      | Contents                                                   |
//! |-------------|------------------------------------------------------------|
//! | [`frame`]   | `LocalizationData`, `HazardRecord`, frame aliases          |
//! | [`tracker`] | `UnregisteredTracker`, `MaintenanceReport`                 |
//! | [`outcome`] | `CandidateOutcome`, `SkipReason`                           |
//! | [`stage`]   | `CollisionStage`, `CollisionContext`, `CollisionStats`     |
//! | [`builder`] | `CollisionStageBuilder`                                    |
//! | [`error`]   | `CollisionError`, `CollisionResult<T>`                     |

pub mod builder;
pub mod error;
pub mod frame;
pub mod outcome;
pub mod stage;
pub mod tracker;


pub use builder::CollisionStageBuilder;
pub use error::{CollisionError, CollisionResult};
pub use frame::{HazardFrame, HazardRecord, LocalizationData, LocalizationFrame};
pub use outcome::{CandidateOutcome, SkipReason};
pub use stage::{CollisionContext, CollisionStage, CollisionStats};
pub use tracker::{MaintenanceReport, UnregisteredTracker};
