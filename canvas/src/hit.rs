//! Eraser hit-testing.
//!
//! A stroke is hit when any of its sample points, projected to screen space
//! through the current camera, lies strictly within [`HIT_RADIUS_PX`] of the
//! eraser. This is a per-point approximation: a long segment passing under
//! the eraser between two distant samples is not hit.

#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use frames::Stroke;

use crate::camera::{Camera, Point};
use crate::consts::HIT_RADIUS_PX;

/// Whether `stroke` is under the eraser at `eraser_screen`.
#[must_use]
pub fn stroke_hit(stroke: &Stroke, camera: &Camera, eraser_screen: Point) -> bool {
    stroke.points.iter().any(|p| {
        let screen = camera.world_to_screen(Point::new(p.x, p.y));
        screen.dist(eraser_screen) < HIT_RADIUS_PX
    })
}

/// Remove every stroke under the eraser. Returns how many were removed.
pub fn erase(strokes: &mut Vec<Stroke>, camera: &Camera, eraser_screen: Point) -> usize {
    let before = strokes.len();
    strokes.retain(|s| !stroke_hit(s, camera, eraser_screen));
    before - strokes.len()
}
