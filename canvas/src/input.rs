//! Gesture recognizer: turns raw pointer/touch contacts into draw, pan and
//! pinch-zoom gestures.
//!
//! The state machine is driven by the number of simultaneous contacts and the
//! active tool at the moment the first contact lands:
//!
//! - one contact with [`Tool::Pan`] drags the camera in screen space;
//! - one contact with any other tool draws;
//! - a second contact always switches to pinch-zoom, discarding a draft in
//!   progress;
//! - lifting one finger of a pinch does not resume drawing or panning. The
//!   recognizer sits in [`GestureState::Released`] until every contact is up.
//!
//! Events are reported in screen space. Camera updates are absolute and are
//! always derived from the camera captured when the gesture started, so
//! repeated moves never accumulate drift.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use frames::Tool;

use crate::camera::{Camera, Point, ZoomBounds};

/// Host-assigned identifier of one pointer or touch contact.
pub type PointerId = i32;

/// Current gesture.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum GestureState {
    /// No contacts.
    #[default]
    Idle,
    /// One contact is producing a draft stroke.
    Draw { pointer: PointerId },
    /// One contact is dragging the camera.
    Pan { pointer: PointerId, start_screen: Point, start_camera: Camera },
    /// Two contacts are pinching.
    Zoom { pointers: (PointerId, PointerId), start_dist: f64, start_mid: Point, start_camera: Camera },
    /// A gesture ended while contacts remain; waits for all of them to lift.
    Released,
}

/// Output of the recognizer, consumed by the engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureEvent {
    DrawStart { screen: Point, pressure: f64 },
    DrawMove { screen: Point, pressure: f64 },
    /// The draft is finished and should be committed, trailed or dropped per tool.
    DrawEnd,
    /// The draft is abandoned (a pinch started).
    DrawCancel,
    /// New absolute camera from a pan or pinch.
    Camera(Camera),
}

#[derive(Debug, Clone, Copy)]
struct Contact {
    id: PointerId,
    screen: Point,
}

/// Pointer/touch gesture state machine for one surface.
#[derive(Debug, Clone)]
pub struct GestureRecognizer {
    state: GestureState,
    contacts: Vec<Contact>,
    bounds: ZoomBounds,
}

impl GestureRecognizer {
    #[must_use]
    pub fn new(bounds: ZoomBounds) -> Self {
        Self { state: GestureState::Idle, contacts: Vec::new(), bounds }
    }

    #[must_use]
    pub fn state(&self) -> GestureState {
        self.state
    }

    /// Number of contacts currently down.
    #[must_use]
    pub fn contact_count(&self) -> usize {
        self.contacts.len()
    }

    /// A contact landed.
    pub fn pointer_down(
        &mut self,
        id: PointerId,
        screen: Point,
        pressure: f64,
        tool: Tool,
        camera: &Camera,
    ) -> Vec<GestureEvent> {
        if let Some(c) = self.contacts.iter_mut().find(|c| c.id == id) {
            c.screen = screen;
        } else {
            self.contacts.push(Contact { id, screen });
        }

        match (self.state, self.contacts.len()) {
            (GestureState::Idle, 1) => {
                if tool.draws() {
                    self.state = GestureState::Draw { pointer: id };
                    vec![GestureEvent::DrawStart { screen, pressure }]
                } else {
                    self.state = GestureState::Pan { pointer: id, start_screen: screen, start_camera: *camera };
                    Vec::new()
                }
            }
            (GestureState::Draw { .. }, 2) => {
                self.begin_zoom(camera);
                vec![GestureEvent::DrawCancel]
            }
            (GestureState::Pan { .. } | GestureState::Released, 2) => {
                self.begin_zoom(camera);
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    /// A contact moved.
    pub fn pointer_move(&mut self, id: PointerId, screen: Point, pressure: f64) -> Vec<GestureEvent> {
        let Some(contact) = self.contacts.iter_mut().find(|c| c.id == id) else {
            return Vec::new();
        };
        contact.screen = screen;

        match self.state {
            GestureState::Draw { pointer } if pointer == id => vec![GestureEvent::DrawMove { screen, pressure }],
            GestureState::Pan { pointer, start_screen, start_camera } if pointer == id => {
                let cam = start_camera.panned_by(screen.x - start_screen.x, screen.y - start_screen.y);
                vec![GestureEvent::Camera(cam)]
            }
            GestureState::Zoom { pointers: (a, b), start_dist, start_mid, start_camera } if id == a || id == b => {
                let (Some(pa), Some(pb)) = (self.position(a), self.position(b)) else {
                    return Vec::new();
                };
                if start_dist <= 0.0 {
                    return Vec::new();
                }
                let mid = pa.midpoint(pb);
                let zoom = start_camera.zoom * (pa.dist(pb) / start_dist);
                let cam = start_camera
                    .zoom_about(start_mid, zoom, self.bounds)
                    .panned_by(mid.x - start_mid.x, mid.y - start_mid.y);
                vec![GestureEvent::Camera(cam)]
            }
            _ => Vec::new(),
        }
    }

    /// A contact lifted or was cancelled by the platform.
    pub fn pointer_up(&mut self, id: PointerId) -> Vec<GestureEvent> {
        let Some(index) = self.contacts.iter().position(|c| c.id == id) else {
            return Vec::new();
        };
        self.contacts.remove(index);

        let mut events = Vec::new();
        match self.state {
            GestureState::Draw { pointer } if pointer == id => events.push(GestureEvent::DrawEnd),
            GestureState::Draw { .. } | GestureState::Idle => return events,
            GestureState::Pan { .. } | GestureState::Zoom { .. } | GestureState::Released => {}
        }
        self.state = if self.contacts.is_empty() { GestureState::Idle } else { GestureState::Released };
        events
    }

    /// Drop every contact without emitting events.
    pub fn reset(&mut self) {
        self.contacts.clear();
        self.state = GestureState::Idle;
    }

    fn position(&self, id: PointerId) -> Option<Point> {
        self.contacts.iter().find(|c| c.id == id).map(|c| c.screen)
    }

    fn begin_zoom(&mut self, camera: &Camera) {
        let (Some(a), Some(b)) = (self.contacts.first().copied(), self.contacts.get(1).copied()) else {
            return;
        };
        self.state = GestureState::Zoom {
            pointers: (a.id, b.id),
            start_dist: a.screen.dist(b.screen),
            start_mid: a.screen.midpoint(b.screen),
            start_camera: *camera,
        };
    }
}
