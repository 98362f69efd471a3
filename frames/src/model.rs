//! Board data model shared by every surface and the wire.
//!
//! Points are world-space samples. Strokes are immutable once committed; the
//! engine only ever appends or removes whole strokes.

#[cfg(test)]
#[path = "model_test.rs"]
mod model_test;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Pressure assumed when the input device reports none.
pub const DEFAULT_PRESSURE: f64 = 0.5;

/// Default stroke thickness (before zoom scaling).
pub const DEFAULT_SIZE: f64 = 6.0;

/// Ink color used for laser trails.
pub const LASER_COLOR: Color = Color::rgb(0xef, 0x44, 0x44);

/// Laser trail thickness (before zoom scaling).
pub const LASER_SIZE: f64 = 6.0;

// =============================================================
// Point
// =============================================================

/// A sampled world-space point with pen pressure in `[0, 1]`.
///
/// Serialized as `[x, y, pressure]`. Deserialization also accepts the object
/// form `{x, y, pressure}` used by older controller payloads.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PointRepr", into = "[f64; 3]")]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub pressure: f64,
}

impl Point {
    /// Build a point, normalizing pressure into `[0, 1]`.
    #[must_use]
    pub fn new(x: f64, y: f64, pressure: f64) -> Self {
        Self { x, y, pressure: normalize_pressure(Some(pressure)) }
    }

    /// Build a point with the default pressure.
    #[must_use]
    pub fn at(x: f64, y: f64) -> Self {
        Self { x, y, pressure: DEFAULT_PRESSURE }
    }
}

/// Map a reported pressure to `[0, 1]`. Missing, zero-or-negative and
/// non-finite readings fall back to [`DEFAULT_PRESSURE`].
#[must_use]
pub fn normalize_pressure(pressure: Option<f64>) -> f64 {
    match pressure {
        Some(p) if p.is_finite() && p > 0.0 => p.min(1.0),
        _ => DEFAULT_PRESSURE,
    }
}

impl From<Point> for [f64; 3] {
    fn from(p: Point) -> Self {
        [p.x, p.y, p.pressure]
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PointRepr {
    Tuple(Vec<f64>),
    Object {
        x: f64,
        y: f64,
        #[serde(default)]
        pressure: Option<f64>,
    },
}

impl TryFrom<PointRepr> for Point {
    type Error = String;

    fn try_from(repr: PointRepr) -> Result<Self, Self::Error> {
        match repr {
            PointRepr::Tuple(values) => match values.as_slice() {
                [x, y] => Ok(Self { x: *x, y: *y, pressure: DEFAULT_PRESSURE }),
                [x, y, p, ..] => Ok(Self { x: *x, y: *y, pressure: normalize_pressure(Some(*p)) }),
                _ => Err(format!("point needs at least 2 coordinates, got {}", values.len())),
            },
            PointRepr::Object { x, y, pressure } => Ok(Self { x, y, pressure: normalize_pressure(pressure) }),
        }
    }
}

// =============================================================
// Color
// =============================================================

/// Error returned when parsing a hex color fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid color `{0}`: expected #rrggbb or #rgb")]
pub struct ColorParseError(pub String);

/// 24-bit RGB ink color, carried on the wire as `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// CSS color string (`#rrggbb`).
    #[must_use]
    pub fn css(self) -> String {
        self.to_string()
    }
}

impl Default for Color {
    /// Near-black default ink.
    fn default() -> Self {
        Self::rgb(0x1e, 0x1e, 0x1e)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for Color {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ColorParseError(s.to_owned());
        let hex = s.trim().strip_prefix('#').ok_or_else(err)?;
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(err());
        }
        let channel = |digits: &str| u8::from_str_radix(digits, 16).map_err(|_| err());
        match hex.len() {
            6 => Ok(Self::rgb(channel(&hex[0..2])?, channel(&hex[2..4])?, channel(&hex[4..6])?)),
            3 => {
                let expand = |i: usize| channel(&hex[i..=i]).map(|v| v * 17);
                Ok(Self::rgb(expand(0)?, expand(1)?, expand(2)?))
            }
            _ => Err(err()),
        }
    }
}

impl TryFrom<String> for Color {
    type Error = ColorParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(c: Color) -> Self {
        c.to_string()
    }
}

// =============================================================
// Tool
// =============================================================

/// Which tool is currently active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    /// Opaque ink.
    #[default]
    Pen,
    /// Translucent multiply-blended ink.
    Highlighter,
    /// Removes committed strokes under the pointer.
    Eraser,
    /// Ephemeral glowing ink that fades out and is never committed.
    Laser,
    /// Screen-space drag navigation (controller only).
    Pan,
}

impl Tool {
    /// Whether strokes drawn with this tool end up in the page's stroke list.
    #[must_use]
    pub fn commits(self) -> bool {
        matches!(self, Self::Pen | Self::Highlighter)
    }

    /// Whether a pointer contact with this tool produces a draft stroke.
    #[must_use]
    pub fn draws(self) -> bool {
        !matches!(self, Self::Pan)
    }

    /// Keyboard shortcut mapping used by the display (`p`, `e`, `h`, `l`).
    #[must_use]
    pub fn from_shortcut(key: &str) -> Option<Self> {
        match key.to_ascii_lowercase().as_str() {
            "p" => Some(Self::Pen),
            "e" => Some(Self::Eraser),
            "h" => Some(Self::Highlighter),
            "l" => Some(Self::Laser),
            _ => None,
        }
    }
}

// =============================================================
// Stroke
// =============================================================

/// A committed (or draft) stroke in world coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "StrokeWire", into = "StrokeWire")]
pub struct Stroke {
    pub points: Vec<Point>,
    pub color: Color,
    /// Thickness before zoom scaling. Always positive.
    pub size: f64,
    pub tool: Tool,
}

impl Stroke {
    #[must_use]
    pub fn new(points: Vec<Point>, tool: Tool, color: Color, size: f64) -> Self {
        Self { points, color, size: sanitize_size(size), tool }
    }

    /// Derived flag kept on the wire for older readers.
    #[must_use]
    pub fn is_highlighter(&self) -> bool {
        self.tool == Tool::Highlighter
    }
}

/// Replace non-positive or non-finite sizes with [`DEFAULT_SIZE`].
#[must_use]
pub fn sanitize_size(size: f64) -> f64 {
    if size.is_finite() && size > 0.0 { size } else { DEFAULT_SIZE }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StrokeWire {
    #[serde(default)]
    points: Vec<Point>,
    #[serde(default)]
    color: Color,
    #[serde(default = "default_size")]
    size: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool: Option<Tool>,
    #[serde(default)]
    is_highlighter: bool,
}

fn default_size() -> f64 {
    DEFAULT_SIZE
}

impl From<StrokeWire> for Stroke {
    fn from(wire: StrokeWire) -> Self {
        // Stored pages predating the tool field only carry the highlighter flag.
        let tool = wire
            .tool
            .unwrap_or(if wire.is_highlighter { Tool::Highlighter } else { Tool::Pen });
        Self::new(wire.points, tool, wire.color, wire.size)
    }
}

impl From<Stroke> for StrokeWire {
    fn from(stroke: Stroke) -> Self {
        let is_highlighter = stroke.is_highlighter();
        Self {
            points: stroke.points,
            color: stroke.color,
            size: stroke.size,
            tool: Some(stroke.tool),
            is_highlighter,
        }
    }
}

// =============================================================
// Laser trail
// =============================================================

/// A finished laser stroke fading out. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaserTrail {
    pub points: Vec<Point>,
    /// Current opacity in `[0, 1]`.
    pub opacity: f64,
}

impl LaserTrail {
    /// A fresh trail at full opacity.
    #[must_use]
    pub fn new(points: Vec<Point>) -> Self {
        Self { points, opacity: 1.0 }
    }
}

// =============================================================
// Viewport values
// =============================================================

/// Size of the authoring surface, used to stretch the background image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub w: f64,
    pub h: f64,
}

impl Default for Dimensions {
    fn default() -> Self {
        Self { w: 1000.0, h: 1000.0 }
    }
}

/// Pan offset in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PanOffset {
    pub x: f64,
    pub y: f64,
}

// =============================================================
// Tool state
// =============================================================

/// Shared `(tool, color, size)` triple, last writer wins.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToolState {
    pub tool: Tool,
    pub color: Color,
    pub size: f64,
}

impl Default for ToolState {
    fn default() -> Self {
        Self { tool: Tool::Pen, color: Color::default(), size: DEFAULT_SIZE }
    }
}

impl ToolState {
    /// Merge the present fields of `patch`. Returns `true` if anything changed.
    pub fn apply(&mut self, patch: &ToolPatch) -> bool {
        let before = *self;
        if let Some(tool) = patch.tool {
            self.tool = tool;
        }
        if let Some(color) = patch.color {
            self.color = color;
        }
        if let Some(size) = patch.size
            && size.is_finite()
            && size > 0.0
        {
            self.size = size;
        }
        before != *self
    }

    /// A patch carrying every field of this state.
    #[must_use]
    pub fn to_patch(self) -> ToolPatch {
        ToolPatch { tool: Some(self.tool), color: Some(self.color), size: Some(self.size) }
    }
}

/// Sparse tool update. Only present fields are applied.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ToolPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool: Option<Tool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
}

impl ToolPatch {
    #[must_use]
    pub fn tool(tool: Tool) -> Self {
        Self { tool: Some(tool), ..Self::default() }
    }

    #[must_use]
    pub fn color(color: Color) -> Self {
        Self { color: Some(color), ..Self::default() }
    }

    #[must_use]
    pub fn size(size: f64) -> Self {
        Self { size: Some(size), ..Self::default() }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tool.is_none() && self.color.is_none() && self.size.is_none()
    }
}
