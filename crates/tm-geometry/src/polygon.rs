//! Overlap and distance between closed rings.
//!
//! Both operations go through `geo`.  Input that cannot form a polygon
//! (fewer than three points, any non-finite coordinate) is not an error:
//! `overlap` reports no overlap and `clearance` reports no distance.

use geo::algorithm::orient::{Direction, Orient};
use geo::{Area, BooleanOps, BoundingRect, Coord, EuclideanDistance, LineString, Polygon, Rect};

use tm_core::Location;

/// Convert a ring to a `geo` polygon, or `None` if it is degenerate.
pub(crate) fn to_polygon(ring: &[Location]) -> Option<Polygon<f64>> {
    if ring.len() < 3 || ring.iter().any(|p| !(p.x.is_finite() && p.y.is_finite())) {
        return None;
    }
    let coords: Vec<Coord<f64>> = ring.iter().map(|p| Coord { x: p.x, y: p.y }).collect();
    // `Polygon::new` closes the exterior ring.
    Some(Polygon::new(LineString::new(coords), vec![]).orient(Direction::Default))
}

#[inline]
fn rects_touch(a: Rect<f64>, b: Rect<f64>) -> bool {
    a.min().x <= b.max().x && b.min().x <= a.max().x
        && a.min().y <= b.max().y && b.min().y <= a.max().y
}

/// `true` iff the intersection of the two rings has at least one piece with
/// area greater than `zero_area`.
///
/// Rings that merely share an edge or a vertex produce zero-area pieces and
/// do not overlap.  Symmetric in its two ring arguments.
pub fn overlap(ring_a: &[Location], ring_b: &[Location], zero_area: f64) -> bool {
    let (Some(a), Some(b)) = (to_polygon(ring_a), to_polygon(ring_b)) else {
        return false;
    };
    match (a.bounding_rect(), b.bounding_rect()) {
        (Some(ra), Some(rb)) if rects_touch(ra, rb) => {}
        _ => return false,
    }
    a.intersection(&b)
        .iter()
        .any(|piece| piece.unsigned_area() > zero_area)
}

/// Minimum planar distance between the two rings; `0.0` when they touch or
/// intersect, `None` if either ring is degenerate.
pub fn clearance(ring_a: &[Location], ring_b: &[Location]) -> Option<f64> {
    let a = to_polygon(ring_a)?;
    let b = to_polygon(ring_b)?;
    Some(a.euclidean_distance(&b))
}
