//! A four-way crossing with two managed roads and one lane of outside traffic.
//!
//! ```text
//!                 ▲ northbound (managed)
//!                 │
//!   ◄─────────────┼───────────── westbound (unregistered traffic)
//!   ─────────────►┼────────────► eastbound (managed)
//!                 │
//! ```
//!
//! Every road is 200 m long and centred on the crossing.  Managed vehicles
//! wrap back to the start of their road; traffic vehicles are destroyed at
//! the end and respawned at the start under a new id.

use std::sync::Arc;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use tm_collision::LocalizationData;
use tm_core::{ActorState, Extent, Location, Vector3D, Waypoint};
use tm_world::{Actor, ActorRef, InMemoryWorld, SimActor, WorldResult};

pub const HALF_ROAD: f64 = 100.0;
const LANE_OFFSET:   f64 = 1.75;
/// Waypoints handed to the collision stage, 1 m apart.
pub const PATH_POINTS: usize = 40;

pub const MANAGED_TYPE: &str = "vehicle.tesla.model3";
pub const TRAFFIC_TYPE: &str = "vehicle.carlamotors.carlacola";

const BODY: Extent = Extent::new(2.3, 1.0, 0.8);

// ── Road ──────────────────────────────────────────────────────────────────────

/// A straight lane parameterised by station `s ∈ [0, length)`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Road {
    pub origin:  Location,
    pub heading: Vector3D,
    pub length:  f64,
}

impl Road {
    pub fn eastbound() -> Self {
        Self {
            origin:  Location::planar(-HALF_ROAD, -LANE_OFFSET),
            heading: Vector3D::planar(1.0, 0.0),
            length:  2.0 * HALF_ROAD,
        }
    }

    pub fn northbound() -> Self {
        Self {
            origin:  Location::planar(LANE_OFFSET, -HALF_ROAD),
            heading: Vector3D::planar(0.0, 1.0),
            length:  2.0 * HALF_ROAD,
        }
    }

    pub fn westbound() -> Self {
        Self {
            origin:  Location::planar(HALF_ROAD, LANE_OFFSET),
            heading: Vector3D::planar(-1.0, 0.0),
            length:  2.0 * HALF_ROAD,
        }
    }

    pub fn at(&self, s: f64) -> Location {
        self.origin + self.heading * s
    }

    /// Station of the point on the lane closest to `location`.
    pub fn station(&self, location: Location) -> f64 {
        let d = location - self.origin;
        d.x * self.heading.x + d.y * self.heading.y
    }

    /// `points` waypoints 1 m apart starting at station `s`.  The path runs
    /// straight past the end of the road.
    pub fn path_ahead(&self, s: f64, points: usize) -> Vec<Waypoint> {
        (0..points)
            .map(|k| Waypoint::new(self.at(s + k as f64), self.heading))
            .collect()
    }

    pub fn state_at(&self, s: f64, speed: f64) -> ActorState {
        ActorState {
            location: self.at(s),
            heading:  self.heading,
            extent:   BODY,
            velocity: self.heading * speed,
        }
    }
}

// ── Vehicle ───────────────────────────────────────────────────────────────────

pub struct Vehicle {
    pub actor:  Arc<SimActor>,
    pub road:   Road,
    /// Speed when not yielding, m/s.
    pub cruise: f64,
}

impl Vehicle {
    pub fn station(&self) -> f64 {
        self.road.station(self.actor.last_state().location)
    }

    /// What localization publishes for this vehicle: a path buffer starting
    /// at the front bumper.
    pub fn localization(&self) -> LocalizationData {
        let state = self.actor.last_state();
        let front = self.road.station(state.location) + state.extent.x;
        LocalizationData::new(
            Arc::clone(&self.actor) as ActorRef,
            Arc::new(self.road.path_ahead(front, PATH_POINTS)),
        )
    }

    /// Move `speed * dt` metres along the road.  Returns `true` if the
    /// vehicle ran off the end and was wrapped to the start.
    pub fn advance(&self, speed: f64, dt: f64) -> bool {
        let s = self.station() + speed * dt;
        let wrapped = s >= self.road.length;
        let s = if wrapped { s - self.road.length } else { s };
        self.actor.set_state(self.road.state_at(s, speed));
        wrapped
    }
}

// ── Scenario ──────────────────────────────────────────────────────────────────

pub struct Scenario {
    pub world:   Arc<InMemoryWorld>,
    /// Managed vehicles in localization order.
    pub managed: Arc<Vec<Vehicle>>,
    pub traffic: Vec<Vehicle>,
}

impl Scenario {
    /// Spread `vehicles` managed vehicles over the two managed roads and
    /// `traffic` unregistered ones over the westbound lane.  Positions and
    /// cruise speeds are drawn from `seed`.
    pub fn generate(vehicles: usize, traffic: usize, seed: u64) -> Self {
        let mut rng = SmallRng::seed_from_u64(seed);
        let world = Arc::new(InMemoryWorld::new());

        let roads    = [Road::eastbound(), Road::northbound()];
        let per_road = vehicles.div_ceil(2).max(1);
        let managed  = (0..vehicles)
            .map(|i| spawn_on(&world, &mut rng, MANAGED_TYPE, roads[i % 2], i / 2, per_road))
            .collect();

        let traffic = (0..traffic)
            .map(|i| spawn_on(&world, &mut rng, TRAFFIC_TYPE, Road::westbound(), i, traffic))
            .collect();

        Self { world, managed: Arc::new(managed), traffic }
    }

    /// Advance every traffic vehicle at its cruise speed.  Vehicles that
    /// reach the end of the lane are destroyed and respawned at its start.
    ///
    /// Returns how many were respawned.
    pub fn step_traffic(&mut self, dt: f64) -> WorldResult<usize> {
        let mut respawned = 0;
        for vehicle in &mut self.traffic {
            if !vehicle.advance(vehicle.cruise, dt) {
                continue;
            }
            let state = vehicle.actor.last_state();
            self.world.destroy(vehicle.actor.id())?;
            vehicle.actor = self.world.spawn(TRAFFIC_TYPE, state);
            respawned += 1;
        }
        Ok(respawned)
    }
}

/// Place vehicle `slot` of `slots` evenly along `road` with a little jitter.
fn spawn_on(
    world: &InMemoryWorld,
    rng:   &mut SmallRng,
    kind:  &str,
    road:  Road,
    slot:  usize,
    slots: usize,
) -> Vehicle {
    let spacing = road.length / slots.max(1) as f64;
    let s       = slot as f64 * spacing + rng.gen_range(0.0..spacing * 0.25);
    let cruise  = rng.gen_range(6.0..12.0);
    Vehicle {
        actor: world.spawn(kind, road.state_at(s, cruise)),
        road,
        cruise,
    }
}
