//! Actor footprints: the physical box and the forward corridor.

use tm_core::{ActorState, CollisionConfig, Location, Vector3D, Waypoint};

/// Forward vector used when an actor's heading has no planar component.
const FALLBACK_HEADING: Vector3D = Vector3D::planar(1.0, 0.0);

/// The actor's rectangular outline on the ground plane.
///
/// Four corners: front on the `-perpendicular` side, rear on the same side,
/// rear on the `+perpendicular` side, front on the `+perpendicular` side.
/// That is clockwise in the simulator's left-handed frame.  The heading is
/// flattened and normalised first, so the rectangle always has the declared
/// half extents regardless of pitch.
pub fn boundary(state: &ActorState) -> Vec<Location> {
    let heading = state.heading.flatten().normalized().unwrap_or(FALLBACK_HEADING);
    let along  = heading * state.extent.x;
    let across = heading.perpendicular() * state.extent.y;
    let c = state.location;

    vec![
        c + along - across,
        c - along - across,
        c - along + across,
        c + along + across,
    ]
}

/// The boundary fused with a corridor along the actor's path buffer.
///
/// The corridor covers the leading waypoints whose distance from the first
/// waypoint is below [`CollisionConfig::corridor_length`] for the actor's
/// current speed.  Each covered waypoint contributes a left and right edge
/// point at the actor's half width, perpendicular to the waypoint's forward
/// vector.  The ring is
///
/// ```text
/// right edge (far → near) · boundary corners · left edge (near → far)
/// ```
///
/// Without a path buffer (unregistered actors) or with an empty one, the
/// result is exactly [`boundary`].
pub fn geodesic_boundary(
    state:  &ActorState,
    path:   Option<&[Waypoint]>,
    config: &CollisionConfig,
) -> Vec<Location> {
    let bbox = boundary(state);
    let Some(path) = path.filter(|p| !p.is_empty()) else {
        return bbox;
    };

    let length    = config.corridor_length(state.speed());
    let length_sq = length * length;
    let width     = state.extent.y;
    let first     = path[0];

    let mut left  = Vec::new();
    let mut right = Vec::new();
    for waypoint in path.iter().take_while(|w| first.distance_squared(w) < length_sq) {
        // A waypoint without a planar direction cannot place its edge points.
        let Some(across) = waypoint.forward.perpendicular().normalized() else {
            continue;
        };
        let offset = across * width;
        left.push(waypoint.location + offset);
        right.push(waypoint.location - offset);
    }

    let mut ring = Vec::with_capacity(left.len() + right.len() + bbox.len());
    ring.extend(right.into_iter().rev());
    ring.extend(bbox);
    ring.extend(left);
    ring
}

/// Both footprints of one actor.  An ego's footprint is built once per tick
/// and reused against every candidate.
#[derive(Clone, Debug, PartialEq)]
pub struct Footprint {
    /// Bounding-box centre.
    pub location: Location,
    pub boundary: Vec<Location>,
    pub geodesic: Vec<Location>,
}

impl Footprint {
    pub fn new(state: &ActorState, path: Option<&[Waypoint]>, config: &CollisionConfig) -> Self {
        Self {
            location:  state.location,
            boundary:  boundary(state),
            geodesic:  geodesic_boundary(state, path, config),
        }
    }
}
