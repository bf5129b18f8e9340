//! Debug drawing of footprints.

use tm_core::{Location, Vector3D};

/// 8-bit RGB colour.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const RED: Color = Color { r: 255, g: 0, b: 0 };
}

/// Line-drawing collaborator used for visualisation only.
///
/// Hazard detection calls this from worker threads, so implementations
/// must be `Send + Sync`.  Nothing drawn here affects any result.
pub trait DebugDraw: Send + Sync {
    /// Draw one segment that disappears after `life_time` seconds.
    fn draw_line(&self, begin: Location, end: Location, thickness: f32, color: Color, life_time: f32);
}

/// A [`DebugDraw`] that draws nothing.
pub struct NoopDebugDraw;

impl DebugDraw for NoopDebugDraw {
    fn draw_line(&self, _begin: Location, _end: Location, _thickness: f32, _color: Color, _life_time: f32) {}
}

/// Draw every edge of `ring`, including the closing edge, lifted 1 m so it
/// is not hidden by the road surface.
pub fn draw_ring(draw: &dyn DebugDraw, ring: &[Location]) {
    let lift = Vector3D::new(0.0, 0.0, 1.0);
    for (i, &point) in ring.iter().enumerate() {
        let next = ring[(i + 1) % ring.len()];
        draw.draw_line(point + lift, next + lift, 0.1, Color::RED, 0.1);
    }
}
