//! Rendering: turns a surface's state into pixels.
//!
//! Rendering happens in two steps. [`plan_frame`] is pure: it projects every
//! stroke to screen space, outlines it and returns an ordered list of
//! [`DrawCommand`]s. [`paint`] replays that list onto a
//! [`web_sys::CanvasRenderingContext2d`] and is the only place that touches
//! the browser.
//!
//! Draw order is fixed: background, committed strokes oldest first, laser
//! trails, then the draft on top.
//!
//! All fallible `Canvas2D` calls propagate errors via `Result<(), JsValue>`.

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

use std::f64::consts::PI;

use frames::model::{LASER_COLOR, LASER_SIZE};
use frames::{Color, Dimensions, LaserTrail, Point as InkPoint, Stroke, Tool, ToolState};
use wasm_bindgen::JsValue;
use web_sys::{CanvasRenderingContext2d, HtmlImageElement, Path2d};

use crate::camera::{Camera, Point};
use crate::consts::{ERASER_PREVIEW_FILL, HIT_RADIUS_PX, LASER_GLOW_PX};
use crate::stroke;

/// Canvas compositing mode for a fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Composite {
    SourceOver,
    Multiply,
}

impl Composite {
    #[must_use]
    pub fn as_css(self) -> &'static str {
        match self {
            Self::SourceOver => "source-over",
            Self::Multiply => "multiply",
        }
    }
}

/// Paint parameters for one filled outline.
#[derive(Debug, Clone, PartialEq)]
pub struct FillStyle {
    pub color: String,
    pub alpha: f64,
    pub composite: Composite,
    /// Shadow blur radius; the shadow uses the fill color.
    pub glow: Option<f64>,
}

/// One drawing step, in screen space (CSS pixels).
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear { width: f64, height: f64 },
    Background { src: String, x: f64, y: f64, width: f64, height: f64 },
    FillPath { path: String, style: FillStyle },
    Circle { x: f64, y: f64, radius: f64, fill: &'static str },
}

/// The in-progress stroke as the renderer sees it.
#[derive(Debug, Clone, Copy)]
pub struct DraftView<'a> {
    pub points: &'a [InkPoint],
    pub tools: ToolState,
}

/// Read-only view of everything a frame needs.
#[derive(Debug, Clone, Copy)]
pub struct Scene<'a> {
    pub camera: Camera,
    pub viewport: Dimensions,
    pub strokes: &'a [Stroke],
    pub background: Option<&'a str>,
    /// World-space rectangle the background is stretched into.
    pub dimensions: Dimensions,
    pub trails: &'a [LaserTrail],
    pub draft: Option<DraftView<'a>>,
    pub highlighter_alpha: f64,
}

// =============================================================
// Plan
// =============================================================

/// Build the ordered draw list for one frame.
#[must_use]
pub fn plan_frame(scene: &Scene<'_>) -> Vec<DrawCommand> {
    let cam = scene.camera;
    let mut out = vec![DrawCommand::Clear { width: scene.viewport.w, height: scene.viewport.h }];

    if let Some(src) = scene.background {
        let origin = cam.world_to_screen(Point::new(0.0, 0.0));
        out.push(DrawCommand::Background {
            src: src.to_owned(),
            x: origin.x,
            y: origin.y,
            width: cam.world_len_to_screen(scene.dimensions.w),
            height: cam.world_len_to_screen(scene.dimensions.h),
        });
    }

    for s in scene.strokes {
        if let Some(style) = ink_style(s.tool, s.color, 1.0, scene.highlighter_alpha) {
            push_fill(&mut out, &cam, &s.points, s.size, style);
        }
    }

    for trail in scene.trails {
        push_fill(&mut out, &cam, &trail.points, LASER_SIZE, laser_style(trail.opacity));
    }

    if let Some(draft) = scene.draft {
        let tools = draft.tools;
        match tools.tool {
            Tool::Laser => push_fill(&mut out, &cam, draft.points, LASER_SIZE, laser_style(1.0)),
            Tool::Eraser => {
                if let Some(last) = draft.points.last() {
                    let at = cam.world_to_screen(Point::new(last.x, last.y));
                    out.push(DrawCommand::Circle { x: at.x, y: at.y, radius: HIT_RADIUS_PX, fill: ERASER_PREVIEW_FILL });
                }
            }
            Tool::Pen | Tool::Highlighter => {
                if let Some(style) = ink_style(tools.tool, tools.color, 1.0, scene.highlighter_alpha) {
                    push_fill(&mut out, &cam, draft.points, tools.size, style);
                }
            }
            Tool::Pan => {}
        }
    }

    out
}

/// Fill style for committed ink. `None` for tools that leave no ink.
#[must_use]
pub fn ink_style(tool: Tool, color: Color, opacity: f64, highlighter_alpha: f64) -> Option<FillStyle> {
    match tool {
        Tool::Pen => Some(FillStyle { color: color.css(), alpha: opacity, composite: Composite::SourceOver, glow: None }),
        Tool::Highlighter => Some(FillStyle {
            color: color.css(),
            alpha: highlighter_alpha * opacity,
            composite: Composite::Multiply,
            glow: None,
        }),
        Tool::Laser => Some(laser_style(opacity)),
        Tool::Eraser | Tool::Pan => None,
    }
}

fn laser_style(opacity: f64) -> FillStyle {
    FillStyle { color: LASER_COLOR.css(), alpha: opacity, composite: Composite::SourceOver, glow: Some(LASER_GLOW_PX) }
}

fn push_fill(out: &mut Vec<DrawCommand>, cam: &Camera, points: &[InkPoint], size: f64, style: FillStyle) {
    let screen: Vec<InkPoint> = points
        .iter()
        .map(|p| {
            let s = cam.world_to_screen(Point::new(p.x, p.y));
            InkPoint { x: s.x, y: s.y, pressure: p.pressure }
        })
        .collect();
    if let Some(path) = stroke::stroke_path(&screen, cam.world_len_to_screen(size)) {
        out.push(DrawCommand::FillPath { path, style });
    }
}

// =============================================================
// Paint
// =============================================================

/// Replay a draw list. `background` is the decoded image for the frame's
/// [`DrawCommand::Background`], if the host has finished loading it.
///
/// # Errors
///
/// Returns `Err` if any `Canvas2D` call fails (e.g. invalid path data).
pub fn paint(
    ctx: &CanvasRenderingContext2d,
    commands: &[DrawCommand],
    background: Option<&HtmlImageElement>,
    dpr: f64,
) -> Result<(), JsValue> {
    ctx.set_transform(dpr, 0.0, 0.0, dpr, 0.0, 0.0)?;
    for cmd in commands {
        match cmd {
            DrawCommand::Clear { width, height } => ctx.clear_rect(0.0, 0.0, *width, *height),
            DrawCommand::Background { x, y, width, height, .. } => {
                if let Some(img) = background {
                    ctx.draw_image_with_html_image_element_and_dw_and_dh(img, *x, *y, *width, *height)?;
                }
            }
            DrawCommand::FillPath { path, style } => fill_path(ctx, path, style)?,
            DrawCommand::Circle { x, y, radius, fill } => {
                ctx.save();
                ctx.set_fill_style_str(fill);
                ctx.begin_path();
                ctx.arc(*x, *y, *radius, 0.0, 2.0 * PI)?;
                ctx.fill();
                ctx.restore();
            }
        }
    }
    Ok(())
}

fn fill_path(ctx: &CanvasRenderingContext2d, path: &str, style: &FillStyle) -> Result<(), JsValue> {
    let path = Path2d::new_with_path_string(path)?;
    ctx.save();
    ctx.set_fill_style_str(&style.color);
    ctx.set_global_alpha(style.alpha);
    ctx.set_global_composite_operation(style.composite.as_css())?;
    if let Some(blur) = style.glow {
        ctx.set_shadow_blur(blur);
        ctx.set_shadow_color(&style.color);
    }
    ctx.fill_with_path_2d(&path);
    ctx.restore();
    Ok(())
}
