//! An in-process world backend.
//!
//! `InMemoryWorld` stands in for the simulator in tests and demos: actors
//! are spawned with an explicit state, moved by writing a new state, and
//! destroyed on demand.  Destroyed actors stay readable through handles
//! already handed out, but report `is_alive() == false` and fail
//! [`Actor::state`].

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use tm_core::{ActorId, ActorState, Location};

use crate::{Actor, ActorFilter, ActorRef, WorldBackend, WorldError, WorldResult};

// ── SimActor ──────────────────────────────────────────────────────────────────

/// An actor owned by an [`InMemoryWorld`].
pub struct SimActor {
    id:      ActorId,
    type_id: String,
    alive:   AtomicBool,
    state:   RwLock<ActorState>,
}

impl SimActor {
    fn new(id: ActorId, type_id: &str, state: ActorState) -> Self {
        Self {
            id,
            type_id: type_id.to_string(),
            alive:   AtomicBool::new(true),
            state:   RwLock::new(state),
        }
    }

    /// Overwrite the whole kinematic state.
    pub fn set_state(&self, state: ActorState) {
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = state;
    }

    /// Teleport without touching heading or velocity.
    pub fn set_location(&self, location: Location) {
        self.state.write().unwrap_or_else(PoisonError::into_inner).location = location;
    }

    /// Last written state, regardless of liveness.
    pub fn last_state(&self) -> ActorState {
        *self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn kill(&self) {
        self.alive.store(false, Ordering::Release);
    }
}

impl Actor for SimActor {
    fn id(&self) -> ActorId {
        self.id
    }

    fn type_id(&self) -> &str {
        &self.type_id
    }

    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    fn state(&self) -> WorldResult<ActorState> {
        if !self.is_alive() {
            return Err(WorldError::ActorDestroyed(self.id));
        }
        Ok(self.last_state())
    }
}

// ── InMemoryWorld ─────────────────────────────────────────────────────────────

/// A thread-safe collection of [`SimActor`]s implementing [`WorldBackend`].
///
/// Ids are assigned sequentially starting at 1.
pub struct InMemoryWorld {
    actors:  RwLock<Vec<Arc<SimActor>>>,
    next_id: AtomicU32,
}

impl InMemoryWorld {
    pub fn new() -> Self {
        Self {
            actors:  RwLock::new(Vec::new()),
            next_id: AtomicU32::new(1),
        }
    }

    /// Spawn an actor of type `type_id` and return its handle.
    pub fn spawn(&self, type_id: &str, state: ActorState) -> Arc<SimActor> {
        let id = ActorId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let actor = Arc::new(SimActor::new(id, type_id, state));
        self.actors
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::clone(&actor));
        actor
    }

    /// Destroy `id`.  Handles held elsewhere observe the death.
    pub fn destroy(&self, id: ActorId) -> WorldResult<()> {
        let mut actors = self.actors.write().unwrap_or_else(PoisonError::into_inner);
        let pos = actors
            .iter()
            .position(|a| a.id == id)
            .ok_or(WorldError::ActorNotFound(id))?;
        let actor = actors.swap_remove(pos);
        actor.kill();
        Ok(())
    }

    /// Handle to a live actor.
    pub fn get(&self, id: ActorId) -> Option<Arc<SimActor>> {
        self.actors
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|a| a.id == id)
            .cloned()
    }

    /// Number of live actors.
    pub fn len(&self) -> usize {
        self.actors.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl WorldBackend for InMemoryWorld {
    fn actors(&self, filter: &ActorFilter) -> Vec<ActorRef> {
        self.actors
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|a| a.is_alive() && filter.matches(&a.type_id))
            .map(|a| Arc::clone(a) as ActorRef)
            .collect()
    }
}
