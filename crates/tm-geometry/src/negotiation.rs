//! The pairwise yield rule.
//!
//! Each actor evaluates the rule from its own point of view.  When the two
//! corridors overlap, the actor whose box is farther from the other's
//! corridor yields:
//!
//! ```text
//! hazard(ref) ⇔ overlap(geo_ref, geo_other)
//!              ∧ clearance(box_ref, geo_other) > clearance(box_other, geo_ref)
//! ```
//!
//! The rule is deliberately asymmetric and evaluating it with the roles
//! swapped usually gives the opposite answer.  Equal clearances give no
//! hazard on either side.

use tm_core::{ActorState, CollisionConfig, Waypoint};

use crate::{Footprint, clearance, overlap};

/// One side of a negotiation: a state snapshot plus the actor's path buffer
/// if it is managed by this simulation.
#[derive(Copy, Clone, Debug)]
pub struct ActorView<'a> {
    pub state: ActorState,
    pub path:  Option<&'a [Waypoint]>,
}

impl<'a> ActorView<'a> {
    /// A managed actor with a path buffer.
    pub fn managed(state: ActorState, path: &'a [Waypoint]) -> Self {
        Self { state, path: Some(path) }
    }

    /// An actor observed in the world without a path buffer.
    pub fn unregistered(state: ActorState) -> Self {
        Self { state, path: None }
    }

    pub fn footprint(&self, config: &CollisionConfig) -> Footprint {
        Footprint::new(&self.state, self.path, config)
    }
}

/// How a negotiation was decided.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Assessment {
    /// Elevations differ by at least the vertical threshold.
    VerticallySeparated,
    /// The corridors do not overlap.
    NoOverlap,
    /// A footprint could not be turned into a polygon.
    Malformed,
    /// Corridors overlap; decided on clearances.
    Contested {
        /// Distance from the reference box to the other actor's corridor.
        reference_clearance: f64,
        /// Distance from the other actor's box to the reference corridor.
        other_clearance:     f64,
    },
}

impl Assessment {
    /// `true` if the reference actor must yield.
    #[inline]
    pub fn is_hazard(&self) -> bool {
        match *self {
            Assessment::Contested { reference_clearance, other_clearance } => {
                reference_clearance > other_clearance
            }
            _ => false,
        }
    }
}

/// Evaluate the yield rule for `reference` against `other` and report why.
pub fn assess(reference: &ActorView<'_>, other: &ActorView<'_>, config: &CollisionConfig) -> Assessment {
    if vertically_separated(reference.state.location.z, other.state.location.z, config) {
        return Assessment::VerticallySeparated;
    }
    assess_against(&reference.footprint(config), other, config)
}

/// [`assess`] with the reference footprint already built.
pub fn assess_against(reference: &Footprint, other: &ActorView<'_>, config: &CollisionConfig) -> Assessment {
    if vertically_separated(reference.location.z, other.state.location.z, config) {
        return Assessment::VerticallySeparated;
    }

    let other = other.footprint(config);
    if !overlap(&reference.geodesic, &other.geodesic, config.zero_area) {
        return Assessment::NoOverlap;
    }

    match (
        clearance(&reference.boundary, &other.geodesic),
        clearance(&other.boundary, &reference.geodesic),
    ) {
        (Some(reference_clearance), Some(other_clearance)) => Assessment::Contested {
            reference_clearance,
            other_clearance,
        },
        _ => Assessment::Malformed,
    }
}

#[inline]
fn vertically_separated(a: f64, b: f64, config: &CollisionConfig) -> bool {
    let dz = (a - b).abs();
    dz.is_nan() || dz >= config.vertical_overlap_threshold
}

/// `true` if `reference` must treat `other` as a collision hazard.
#[inline]
pub fn negotiate(reference: &ActorView<'_>, other: &ActorView<'_>, config: &CollisionConfig) -> bool {
    assess(reference, other, config).is_hazard()
}

/// [`negotiate`] with the reference footprint already built.
#[inline]
pub fn negotiate_against(reference: &Footprint, other: &ActorView<'_>, config: &CollisionConfig) -> bool {
    assess_against(reference, other, config).is_hazard()
}
