//! World/screen transform.
//!
//! `screen = world * zoom + pan`. Every zoom change goes through
//! [`Camera::zoom_about`], which keeps the world point under a screen anchor
//! fixed. Zoom buttons anchor on the viewport center, pinches on the midpoint
//! of the two contacts.

#[cfg(test)]
#[path = "camera_test.rs"]
mod camera_test;

use crate::consts::{
    CONTROLLER_ZOOM_MAX, CONTROLLER_ZOOM_MIN, DISPLAY_ZOOM_MAX, DISPLAY_ZOOM_MIN, ZOOM_STEP,
};

/// A point in either screen or world space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Midpoint between two points.
    #[must_use]
    pub fn midpoint(self, other: Self) -> Self {
        Self { x: (self.x + other.x) * 0.5, y: (self.y + other.y) * 0.5 }
    }

    /// Euclidean distance to `other`.
    #[must_use]
    pub fn dist(self, other: Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Allowed zoom range for one surface type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomBounds {
    pub min: f64,
    pub max: f64,
}

impl ZoomBounds {
    pub const CONTROLLER: Self = Self { min: CONTROLLER_ZOOM_MIN, max: CONTROLLER_ZOOM_MAX };
    pub const DISPLAY: Self = Self { min: DISPLAY_ZOOM_MIN, max: DISPLAY_ZOOM_MAX };

    /// Clamp `zoom` into range. Zero, negative and NaN become `min`;
    /// positive infinity becomes `max`.
    #[must_use]
    pub fn clamp(self, zoom: f64) -> f64 {
        if zoom.is_nan() || zoom <= 0.0 {
            return self.min;
        }
        zoom.clamp(self.min, self.max)
    }
}

/// Camera state for pan/zoom.
///
/// `pan_x` / `pan_y` are in CSS pixels.
/// `zoom` is a scale factor (1.0 = no zoom).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub pan_x: f64,
    pub pan_y: f64,
    pub zoom: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self { pan_x: 0.0, pan_y: 0.0, zoom: 1.0 }
    }
}

impl Camera {
    /// Convert a screen-space point (CSS pixels) to world coordinates.
    #[must_use]
    pub fn screen_to_world(&self, screen: Point) -> Point {
        Point {
            x: (screen.x - self.pan_x) / self.zoom,
            y: (screen.y - self.pan_y) / self.zoom,
        }
    }

    /// Convert a world-space point to screen coordinates (CSS pixels).
    #[must_use]
    pub fn world_to_screen(&self, world: Point) -> Point {
        Point {
            x: world.x * self.zoom + self.pan_x,
            y: world.y * self.zoom + self.pan_y,
        }
    }

    /// Convert a world-space length to screen pixels.
    #[must_use]
    pub fn world_len_to_screen(&self, world_len: f64) -> f64 {
        world_len * self.zoom
    }

    /// Same camera with zoom forced into `bounds` and non-finite pan reset.
    #[must_use]
    pub fn sanitized(self, bounds: ZoomBounds) -> Self {
        let finite_or_zero = |v: f64| if v.is_finite() { v } else { 0.0 };
        Self { pan_x: finite_or_zero(self.pan_x), pan_y: finite_or_zero(self.pan_y), zoom: bounds.clamp(self.zoom) }
    }

    /// Zoom to `new_zoom` (clamped) keeping the world point under `anchor`
    /// on screen at `anchor`.
    #[must_use]
    pub fn zoom_about(&self, anchor: Point, new_zoom: f64, bounds: ZoomBounds) -> Self {
        let world = self.screen_to_world(anchor);
        let zoom = bounds.clamp(new_zoom);
        Self { pan_x: anchor.x - world.x * zoom, pan_y: anchor.y - world.y * zoom, zoom }
    }

    /// One discrete zoom-in step about `center`.
    #[must_use]
    pub fn zoom_in(&self, center: Point, bounds: ZoomBounds) -> Self {
        self.zoom_about(center, self.zoom * ZOOM_STEP, bounds)
    }

    /// One discrete zoom-out step about `center`.
    #[must_use]
    pub fn zoom_out(&self, center: Point, bounds: ZoomBounds) -> Self {
        self.zoom_about(center, self.zoom / ZOOM_STEP, bounds)
    }

    /// Translate by a screen-space delta. Not divided by zoom.
    #[must_use]
    pub fn panned_by(&self, dx: f64, dy: f64) -> Self {
        Self { pan_x: self.pan_x + dx, pan_y: self.pan_y + dy, zoom: self.zoom }
    }
}
