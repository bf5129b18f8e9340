//! Plain kinematic data read from the world backend once per use.
//!
//! Geometry code never talks to a live actor: it works on an `ActorState`
//! captured at the moment of evaluation, so a footprint is always built from
//! one consistent set of values even if the backend moves the actor
//! concurrently.

use crate::{Location, Vector3D};

/// Bounding-box half extents in the actor's local frame.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Extent {
    /// Half length, along the heading.
    pub x: f64,
    /// Half width, across the heading.
    pub y: f64,
    /// Half height.
    pub z: f64,
}

impl Extent {
    #[inline]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Snapshot of one actor's kinematic state.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActorState {
    /// Bounding-box centre in world coordinates.
    pub location: Location,
    /// Forward vector of the actor's transform.  May carry pitch; footprint
    /// code projects it onto the ground plane.
    pub heading:  Vector3D,
    /// Bounding-box half extents.
    pub extent:   Extent,
    /// Linear velocity.
    pub velocity: Vector3D,
}

impl ActorState {
    /// Velocity magnitude in m/s.
    #[inline]
    pub fn speed(&self) -> f64 {
        self.velocity.length()
    }
}

/// One entry of a path buffer produced by the localization stage.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Waypoint {
    pub location: Location,
    /// Lane direction at this waypoint.
    pub forward:  Vector3D,
}

impl Waypoint {
    #[inline]
    pub fn new(location: Location, forward: Vector3D) -> Self {
        Self { location, forward }
    }

    #[inline]
    pub fn distance_squared(&self, other: &Waypoint) -> f64 {
        self.location.distance_squared(other.location)
    }
}
