//! The `Actor` trait — a live handle onto one world entity.

use std::sync::Arc;

use tm_core::{ActorId, ActorState};

use crate::WorldResult;

/// A handle onto a live world actor.
///
/// Handles are shared between the world backend, the localization frame,
/// and the collision stage's unregistered-actor set, so implementations must
/// be `Send + Sync`.  Reads go to the backend each time; nothing is cached.
pub trait Actor: Send + Sync {
    /// The backend-assigned identifier.  Stable for the actor's lifetime.
    fn id(&self) -> ActorId;

    /// Blueprint type such as `"vehicle.tesla.model3"`.
    fn type_id(&self) -> &str;

    /// `false` once the backend has destroyed the actor.
    fn is_alive(&self) -> bool;

    /// Current kinematic state.
    ///
    /// # Errors
    ///
    /// [`WorldError::ActorDestroyed`][crate::WorldError::ActorDestroyed] if
    /// the actor is no longer alive.
    fn state(&self) -> WorldResult<ActorState>;
}

/// Shared, type-erased actor handle.
pub type ActorRef = Arc<dyn Actor>;
