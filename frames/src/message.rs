//! Peer message schema.
//!
//! Two independent channels use this crate:
//!
//! - **controller ↔ display** exchange [`Message`] values over the peer
//!   channel. The display owns the board and pushes `sync_board` snapshots;
//!   the controller pushes raw world-space input and tool changes.
//! - **display → presenter** broadcasts a full [`MirrorState`] on the local
//!   same-device channel. The presenter never answers.
//!
//! The relay in front of the peer channel speaks [`RelayNotice`].

#[cfg(test)]
#[path = "message_test.rs"]
mod message_test;

use serde::{Deserialize, Serialize};

use crate::model::{
    Color, DEFAULT_PRESSURE, DEFAULT_SIZE, Dimensions, LaserTrail, PanOffset, Point, Stroke, Tool, ToolPatch,
    ToolState,
};

/// A message on the controller ↔ display peer channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Message {
    /// Full board snapshot, display → controller.
    SyncBoard { payload: BoardSnapshot },
    /// Display tool state, display → controller.
    SyncTools { payload: ToolPatch },
    /// Controller tool change. Not throttled.
    ToolChange(ToolPatch),
    /// Begin a stroke at a world-space point.
    Start(InputEvent),
    /// Extend the stroke. Rate limited by the sender.
    Move(InputEvent),
    /// Finish the stroke. Coordinates are ignored.
    End(InputEvent),
    /// Discrete viewport command.
    Command { command: ZoomCommand },
    /// Relative pan as fractions of the receiver's viewport size.
    Pan(PanDelta),
}

impl Message {
    /// Every `type` discriminator this enum understands.
    pub const TYPES: &'static [&'static str] =
        &["sync_board", "sync_tools", "tool_change", "start", "move", "end", "command", "pan"];

    /// The wire discriminator of this message.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SyncBoard { .. } => "sync_board",
            Self::SyncTools { .. } => "sync_tools",
            Self::ToolChange(_) => "tool_change",
            Self::Start(_) => "start",
            Self::Move(_) => "move",
            Self::End(_) => "end",
            Self::Command { .. } => "command",
            Self::Pan(_) => "pan",
        }
    }
}

/// One raw input sample from the controller, in world coordinates.
///
/// Tool, color and size are echoed on every event so the display can replay
/// the stroke with the tool that was active when it was drawn.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputEvent {
    pub x: f64,
    pub y: f64,
    pub pressure: f64,
    pub color: Color,
    pub size: f64,
    pub tool: Tool,
}

impl Default for InputEvent {
    fn default() -> Self {
        Self { x: 0.0, y: 0.0, pressure: DEFAULT_PRESSURE, color: Color::default(), size: DEFAULT_SIZE, tool: Tool::Pen }
    }
}

impl InputEvent {
    /// An event at `point` stamped with the sender's current tool state.
    #[must_use]
    pub fn at(point: Point, tools: ToolState) -> Self {
        Self { x: point.x, y: point.y, pressure: point.pressure, color: tools.color, size: tools.size, tool: tools.tool }
    }

    /// The `end` marker: zeroed coordinates, current tool state.
    #[must_use]
    pub fn end(tools: ToolState) -> Self {
        Self { x: 0.0, y: 0.0, pressure: 0.0, color: tools.color, size: tools.size, tool: tools.tool }
    }

    /// The sampled world point.
    #[must_use]
    pub fn point(&self) -> Point {
        Point::new(self.x, self.y, self.pressure)
    }

    /// The tool state echoed in this event.
    #[must_use]
    pub fn tools(&self) -> ToolState {
        ToolState { tool: self.tool, color: self.color, size: self.size }
    }
}

/// Full-state snapshot of the display's board.
///
/// Always carries the whole stroke list; receivers replace rather than merge.
/// A `null` or absent `backgroundImage` clears the receiver's background.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BoardSnapshot {
    pub strokes: Vec<Stroke>,
    pub background_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool: Option<Tool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zoom: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pan: Option<PanOffset>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<Dimensions>,
}

/// Discrete zoom command sent by a controller's buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ZoomCommand {
    ZoomIn,
    ZoomOut,
    ResetZoom,
}

/// Relative pan, as fractions of the receiving viewport's width and height.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PanDelta {
    pub dx: f64,
    pub dy: f64,
}

/// Full display state mirrored to the read-only presenter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MirrorState {
    pub lines: Vec<Stroke>,
    pub laser_lines: Vec<LaserTrail>,
    /// Points of the in-progress draft, if any.
    pub current_points: Option<Vec<Point>>,
    pub tool: Tool,
    pub color: Color,
    pub size: f64,
    pub zoom: f64,
    pub pan: PanOffset,
    pub background_image_src: Option<String>,
    pub dimensions: Dimensions,
}

impl Default for MirrorState {
    fn default() -> Self {
        let tools = ToolState::default();
        Self {
            lines: Vec::new(),
            laser_lines: Vec::new(),
            current_points: None,
            tool: tools.tool,
            color: tools.color,
            size: tools.size,
            zoom: 1.0,
            pan: PanOffset::default(),
            background_image_src: None,
            dimensions: Dimensions::default(),
        }
    }
}

/// Control messages injected by the relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RelayNotice {
    /// A controller joined the display's identity.
    PeerOpen { peer: String },
    /// The controller left.
    PeerClosed { peer: String },
    /// The relay refused this connection.
    Rejected { reason: String },
}

impl RelayNotice {
    pub const TYPES: &'static [&'static str] = &["peer_open", "peer_closed", "rejected"];
}
