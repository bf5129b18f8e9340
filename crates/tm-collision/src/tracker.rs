//! Bookkeeping for world actors this simulation does not manage.
//!
//! Two speeds:
//!
//! ```text
//! discovery  (every discovery_interval)  list world actors matching the filter;
//!                                        track ids that are neither managed
//!                                        nor already tracked
//! refresh    (every tick)                alive → re-bucket in the grid
//!                                        dead  → erase from grid, stop tracking
//! ```
//!
//! Polling the whole world is expensive, so it is rate limited; liveness
//! and position are cheap per-actor reads and run every tick.

use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;
use tracing::debug;

use tm_core::{ActorId, CollisionConfig};
use tm_spatial::VicinityGrid;
use tm_world::{ActorFilter, ActorRef, WorldBackend};

/// Counts from one [`UnregisteredTracker::maintain`] call.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct MaintenanceReport {
    /// Whether the world was polled this call.
    pub polled:     bool,
    pub discovered: usize,
    pub evicted:    usize,
    /// Tracked ids that turned up in the managed snapshot.
    pub adopted:    usize,
}

pub struct UnregisteredTracker {
    actors:         FxHashMap<ActorId, ActorRef>,
    filter:         ActorFilter,
    interval:       Duration,
    last_discovery: Instant,
    discoveries:    u64,
    evictions:      u64,
}

impl UnregisteredTracker {
    /// `now` starts the discovery clock: the first poll happens once
    /// `interval` has elapsed from it.
    pub fn new(filter: ActorFilter, interval: Duration, now: Instant) -> Self {
        Self {
            actors: FxHashMap::default(),
            filter,
            interval,
            last_discovery: now,
            discoveries: 0,
            evictions: 0,
        }
    }

    pub fn from_config(config: &CollisionConfig, now: Instant) -> Self {
        Self::new(ActorFilter::new(&config.actor_filter), config.discovery_interval, now)
    }

    /// `true` once at least `interval` has passed since the last poll.
    pub fn discovery_due(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.last_discovery) >= self.interval
    }

    /// Poll `world` now, regardless of the interval.
    ///
    /// Returns the number of newly tracked actors.
    pub fn discover(
        &mut self,
        now:     Instant,
        world:   &dyn WorldBackend,
        managed: &FxHashMap<ActorId, usize>,
    ) -> usize {
        self.last_discovery = now;
        let mut found = 0;
        for actor in world.actors(&self.filter) {
            let id = actor.id();
            if managed.contains_key(&id) || self.actors.contains_key(&id) {
                continue;
            }
            debug!(actor = %id, type_id = actor.type_id(), "tracking unregistered actor");
            self.actors.insert(id, actor);
            found += 1;
        }
        self.discoveries += found as u64;
        found
    }

    /// One maintenance pass: rate-limited discovery, then a liveness and
    /// position refresh of every tracked actor.
    ///
    /// Ids present in `managed` are dropped from the tracked set without
    /// touching the grid; the managed refresh owns their grid entry.
    pub fn maintain(
        &mut self,
        now:     Instant,
        world:   &dyn WorldBackend,
        managed: &FxHashMap<ActorId, usize>,
        grid:    &mut VicinityGrid,
    ) -> MaintenanceReport {
        let mut report = MaintenanceReport::default();
        if self.discovery_due(now) {
            report.polled     = true;
            report.discovered = self.discover(now, world, managed);
        }

        let before = self.actors.len();
        self.actors.retain(|id, _| !managed.contains_key(id));
        report.adopted = before - self.actors.len();

        let mut dead = Vec::new();
        for (&id, actor) in &self.actors {
            let location = match actor.state() {
                Ok(state) if actor.is_alive() => state.location,
                _ => {
                    dead.push(id);
                    continue;
                }
            };
            if grid.update(id, location).is_err() {
                debug!(actor = %id, "unregistered actor has no finite location");
                dead.push(id);
            }
        }
        for id in dead {
            self.actors.remove(&id);
            grid.erase(id);
            debug!(actor = %id, "evicted unregistered actor");
        }
        report.evicted  = before - report.adopted - self.actors.len();
        self.evictions += report.evicted as u64;
        report
    }

    pub fn get(&self, id: ActorId) -> Option<&ActorRef> {
        self.actors.get(&id)
    }

    pub fn contains(&self, id: ActorId) -> bool {
        self.actors.contains_key(&id)
    }

    pub fn ids(&self) -> impl Iterator<Item = ActorId> + '_ {
        self.actors.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.actors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    /// Actors ever added by discovery.
    pub fn discoveries(&self) -> u64 {
        self.discoveries
    }

    /// Actors ever evicted as dead.
    pub fn evictions(&self) -> u64 {
        self.evictions
    }
}
