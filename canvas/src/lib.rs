//! Drawing engine for the inkboard surfaces.
//!
//! This crate is compiled to WebAssembly and runs in the browser on all three
//! surfaces: the display that owns the board, the controller that draws on it
//! remotely, and the presenter window that mirrors the display. It turns raw
//! pointer events into strokes, replays remote input, keeps the pan/zoom
//! camera, erases by hit-testing and renders everything onto a 2D canvas. The
//! host JavaScript layer only wires DOM events, peer links and timers to the
//! engine and performs the [`engine::Action`]s it returns.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Per-surface engine and testable [`engine::EngineCore`] |
//! | [`host`] | Notebook navigation and persistence on the display |
//! | [`doc`] | Page model and the storage boundary |
//! | [`camera`] | Pan/zoom camera and coordinate conversions |
//! | [`input`] | Gesture state machine |
//! | [`stroke`] | Variable-width stroke outlines and SVG path data |
//! | [`hit`] | Eraser hit-testing |
//! | [`laser`] | Laser trail fade-out |
//! | [`render`] | Draw plan and `Canvas2D` painter |
//! | [`sync`] | Peer bookkeeping and inbound message filtering |
//! | [`consts`] | Shared numeric constants (zoom limits, outline tuning, etc.) |

pub mod camera;
pub mod consts;
pub mod doc;
pub mod engine;
pub mod hit;
pub mod host;
pub mod input;
pub mod laser;
pub mod render;
pub mod stroke;
pub mod sync;
