//! The `WorldBackend` trait.

use crate::{ActorFilter, ActorRef};

/// The simulation backend that owns every actor in the world.
///
/// The collision stage only ever enumerates actors through this trait; it
/// never spawns or destroys them.
pub trait WorldBackend: Send + Sync {
    /// All live actors whose type id matches `filter`.
    ///
    /// The order is unspecified.  An actor returned here may be destroyed
    /// before the caller reads it.
    fn actors(&self, filter: &ActorFilter) -> Vec<ActorRef>;
}
