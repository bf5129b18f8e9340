//! 3-D vector type and the planar helpers the collision stage needs.
//!
//! Coordinates are `f64`, matching the `geo` polygons the footprints are
//! converted into.

use std::ops::{Add, Mul, Neg, Sub};

/// A 3-D vector in world units (metres).  Also used for positions.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vector3D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// A world position.
pub type Location = Vector3D;

impl Vector3D {
    pub const ZERO: Vector3D = Vector3D { x: 0.0, y: 0.0, z: 0.0 };

    #[inline]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Vector on the ground plane (`z = 0`).
    #[inline]
    pub const fn planar(x: f64, y: f64) -> Self {
        Self { x, y, z: 0.0 }
    }

    #[inline]
    pub fn length(self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Squared 3-D distance.
    #[inline]
    pub fn distance_squared(self, other: Vector3D) -> f64 {
        let d = self - other;
        d.x * d.x + d.y * d.y + d.z * d.z
    }

    /// Squared distance on the ground plane, ignoring elevation.
    #[inline]
    pub fn distance_squared_2d(self, other: Vector3D) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Drop the vertical component.
    #[inline]
    pub fn flatten(self) -> Vector3D {
        Vector3D::planar(self.x, self.y)
    }

    /// Unit vector in the same direction, or `None` for a (near-)zero or
    /// non-finite vector.
    pub fn normalized(self) -> Option<Vector3D> {
        let len = self.length();
        if len.is_finite() && len > f64::EPSILON {
            Some(self * (1.0 / len))
        } else {
            None
        }
    }

    /// The ground-plane perpendicular `(-y, x, 0)`.
    ///
    /// In the simulator's left-handed frame this points to the right of a
    /// forward vector when viewed from above.
    #[inline]
    pub fn perpendicular(self) -> Vector3D {
        Vector3D::planar(-self.y, self.x)
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl Add for Vector3D {
    type Output = Vector3D;
    #[inline]
    fn add(self, rhs: Vector3D) -> Vector3D {
        Vector3D::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vector3D {
    type Output = Vector3D;
    #[inline]
    fn sub(self, rhs: Vector3D) -> Vector3D {
        Vector3D::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vector3D {
    type Output = Vector3D;
    #[inline]
    fn mul(self, rhs: f64) -> Vector3D {
        Vector3D::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Neg for Vector3D {
    type Output = Vector3D;
    #[inline]
    fn neg(self) -> Vector3D {
        Vector3D::new(-self.x, -self.y, -self.z)
    }
}

impl std::fmt::Display for Vector3D {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.2}, {:.2}, {:.2})", self.x, self.y, self.z)
    }
}
