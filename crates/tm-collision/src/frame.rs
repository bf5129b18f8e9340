//! Snapshots exchanged with the neighbouring stages.

use std::sync::Arc;

use tm_core::Waypoint;
use tm_world::ActorRef;

/// One managed vehicle as produced by the localization stage.
#[derive(Clone)]
pub struct LocalizationData {
    pub actor:  ActorRef,
    /// Forward path buffer.  Shared with localization; never mutated here.
    pub buffer: Arc<Vec<Waypoint>>,
}

impl LocalizationData {
    pub fn new(actor: ActorRef, buffer: Arc<Vec<Waypoint>>) -> Self {
        Self { actor, buffer }
    }
}

/// Per-vehicle hazard decision handed to the motion planner.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct HazardRecord {
    /// `true` if the vehicle must yield this tick.
    pub hazard: bool,
}

/// Input snapshot: slot `i` describes the `i`-th managed vehicle.
pub type LocalizationFrame = Arc<Vec<LocalizationData>>;

/// Output snapshot, index-aligned with the [`LocalizationFrame`] it was
/// computed from.
pub type HazardFrame = Arc<Vec<HazardRecord>>;
