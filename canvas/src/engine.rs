//! Per-surface engine.
//!
//! DESIGN
//! ======
//! One [`EngineCore`] drives one surface ([`SurfaceKind`]). It owns the
//! camera, tool state, current page, the single draft slot, the laser
//! animator and the peer bookkeeping for its role. Every handler returns a
//! list of [`Action`]s; the host performs them (send on the peer link, post
//! to the presenter channel, arm or clear the decay interval, schedule an
//! animation frame). The core never touches the browser, so it can be tested
//! natively. [`Engine`] wraps it with the canvas element and the clock.
//!
//! ROLES
//! =====
//! - **Display** owns the board. It replays the writer controller's
//!   `start/move/end` into the same draft logic as local input, answers
//!   viewport commands, and pushes full `sync_board` snapshots to the writer
//!   on connect and on every page, background or viewport change. After each
//!   frame it mirrors its state to the presenter.
//! - **Controller** draws locally and streams world-space input to the
//!   display, throttling `move`. It renders whatever the display last sent.
//! - **Presenter** only re-renders mirrored state.
//!
//! DRAFT OWNERSHIP
//! ===============
//! The draft belongs to exactly one producer. A `start` from any producer
//! replaces it; `move` and `end` only apply when they come from the owner.

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

use frames::throttle::MoveThrottle;
use frames::{
    BoardSnapshot, Dimensions, InputEvent, LaserTrail, Message, MirrorState, PanDelta, PanOffset, Point as InkPoint,
    Stroke, Tool, ToolPatch, ToolState, ZoomCommand, decode_mirror,
};
use tracing::{debug, info};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement};

use crate::camera::{Camera, Point, ZoomBounds};
use crate::consts::{CONTROLLER_HIGHLIGHTER_ALPHA, DISPLAY_HIGHLIGHTER_ALPHA};
use crate::doc::Page;
use crate::input::{GestureEvent, GestureRecognizer, PointerId};
use crate::laser::{DecayAnimator, DecayConfig, TimerCommand};
use crate::render::{self, DraftView, Scene};
use crate::sync::{Admission, ConnectionStatus, Links, PeerId, parse_inbound};

/// Which role this engine plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceKind {
    Display,
    Controller,
    Presenter,
}

impl SurfaceKind {
    #[must_use]
    pub fn zoom_bounds(self) -> ZoomBounds {
        match self {
            Self::Controller => ZoomBounds::CONTROLLER,
            Self::Display | Self::Presenter => ZoomBounds::DISPLAY,
        }
    }

    #[must_use]
    pub fn decay(self) -> DecayConfig {
        match self {
            Self::Controller => DecayConfig::CONTROLLER,
            Self::Display | Self::Presenter => DecayConfig::DISPLAY,
        }
    }

    #[must_use]
    pub fn highlighter_alpha(self) -> f64 {
        match self {
            Self::Controller => CONTROLLER_HIGHLIGHTER_ALPHA,
            Self::Display | Self::Presenter => DISPLAY_HIGHLIGHTER_ALPHA,
        }
    }
}

/// Producer of the current draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftOwner {
    /// This surface's pointer.
    Local,
    /// A controller's `start/move/end` stream.
    Remote(PeerId),
    /// The display's draft, mirrored to a presenter.
    Mirror,
}

/// An in-progress stroke.
#[derive(Debug, Clone, PartialEq)]
pub struct Draft {
    pub owner: DraftOwner,
    /// World-space samples.
    pub points: Vec<InkPoint>,
    /// Tool state captured at `start`.
    pub tools: ToolState,
    erased: bool,
}

/// Side effects requested by the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Schedule one animation frame, then call [`EngineCore::on_frame`].
    RequestFrame,
    /// Send on the controller's link to its display.
    Send(Message),
    /// Send to one controller connected to this display.
    SendTo(PeerId, Message),
    /// Refuse a controller; the host closes its link.
    RejectPeer(PeerId),
    /// Post to the presenter channel.
    Mirror(MirrorState),
    StartDecayTimer { interval_ms: u32 },
    StopDecayTimer,
    /// Load (or clear) the background image.
    LoadBackground(Option<String>),
    /// The controller's link changed state.
    StatusChanged(ConnectionStatus),
}

fn timer_action(cmd: Option<TimerCommand>) -> Option<Action> {
    match cmd? {
        TimerCommand::Start { interval_ms } => Some(Action::StartDecayTimer { interval_ms }),
        TimerCommand::Stop => Some(Action::StopDecayTimer),
    }
}

/// Core engine state: all logic that doesn't depend on the canvas element.
///
/// Separated from `Engine` so it can be tested without WASM/browser dependencies.
#[derive(Debug)]
pub struct EngineCore {
    kind: SurfaceKind,
    camera: Camera,
    tools: ToolState,
    page: Page,
    draft: Option<Draft>,
    laser: DecayAnimator,
    gestures: GestureRecognizer,
    links: Links,
    status: ConnectionStatus,
    throttle: MoveThrottle,
    viewport: Dimensions,
    frame_pending: bool,
    mirror_dirty: bool,
}

impl EngineCore {
    #[must_use]
    pub fn new(kind: SurfaceKind) -> Self {
        let viewport = Dimensions::default();
        let mut page = Page::new();
        if kind == SurfaceKind::Display {
            page.dimensions = viewport;
        }
        Self {
            kind,
            camera: Camera::default(),
            tools: ToolState::default(),
            page,
            draft: None,
            laser: DecayAnimator::new(kind.decay()),
            gestures: GestureRecognizer::new(kind.zoom_bounds()),
            links: Links::new(),
            status: ConnectionStatus::Connecting,
            throttle: MoveThrottle::default(),
            viewport,
            frame_pending: false,
            mirror_dirty: false,
        }
    }

    // =============================================================
    // Queries
    // =============================================================

    #[must_use]
    pub fn kind(&self) -> SurfaceKind {
        self.kind
    }

    #[must_use]
    pub fn camera(&self) -> Camera {
        self.camera
    }

    #[must_use]
    pub fn tools(&self) -> ToolState {
        self.tools
    }

    #[must_use]
    pub fn page(&self) -> &Page {
        &self.page
    }

    #[must_use]
    pub fn draft(&self) -> Option<&Draft> {
        self.draft.as_ref()
    }

    #[must_use]
    pub fn trails(&self) -> &[LaserTrail] {
        self.laser.trails()
    }

    #[must_use]
    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    /// The controller currently allowed to write (display only).
    #[must_use]
    pub fn writer(&self) -> Option<&PeerId> {
        self.links.writer()
    }

    #[must_use]
    pub fn viewport(&self) -> Dimensions {
        self.viewport
    }

    /// Full board snapshot as sent in `sync_board`.
    #[must_use]
    pub fn board_snapshot(&self) -> BoardSnapshot {
        BoardSnapshot {
            strokes: self.page.strokes().to_vec(),
            background_image: self.page.background().map(str::to_owned),
            tool: Some(self.tools.tool),
            color: Some(self.tools.color),
            size: Some(self.tools.size),
            zoom: Some(self.camera.zoom),
            pan: Some(PanOffset { x: self.camera.pan_x, y: self.camera.pan_y }),
            dimensions: Some(self.page.dimensions),
        }
    }

    /// Full state as posted to the presenter.
    #[must_use]
    pub fn mirror_state(&self) -> MirrorState {
        let tools = self.draft.as_ref().map_or(self.tools, |d| d.tools);
        MirrorState {
            lines: self.page.strokes().to_vec(),
            laser_lines: self.laser.trails().to_vec(),
            current_points: self.draft.as_ref().map(|d| d.points.clone()),
            tool: tools.tool,
            color: tools.color,
            size: tools.size,
            zoom: self.camera.zoom,
            pan: PanOffset { x: self.camera.pan_x, y: self.camera.pan_y },
            background_image_src: self.page.background().map(str::to_owned),
            dimensions: self.page.dimensions,
        }
    }

    /// Read-only view for the renderer.
    #[must_use]
    pub fn scene(&self) -> Scene<'_> {
        Scene {
            camera: self.camera,
            viewport: self.viewport,
            strokes: self.page.strokes(),
            background: self.page.background(),
            dimensions: self.page.dimensions,
            trails: self.laser.trails(),
            draft: self.draft.as_ref().map(|d| DraftView { points: &d.points, tools: d.tools }),
            highlighter_alpha: self.kind.highlighter_alpha(),
        }
    }

    // =============================================================
    // Frames
    // =============================================================

    fn request_frame(&mut self, out: &mut Vec<Action>) {
        self.mirror_dirty = true;
        if !self.frame_pending {
            self.frame_pending = true;
            out.push(Action::RequestFrame);
        }
    }

    /// The host drew a frame. On the display, emits the presenter mirror if
    /// anything changed since the previous frame.
    pub fn on_frame(&mut self) -> Vec<Action> {
        self.frame_pending = false;
        if self.kind == SurfaceKind::Display && self.mirror_dirty {
            self.mirror_dirty = false;
            return vec![Action::Mirror(self.mirror_state())];
        }
        self.mirror_dirty = false;
        Vec::new()
    }

    /// One decay interval elapsed.
    pub fn on_decay_tick(&mut self) -> Vec<Action> {
        let mut out = Vec::new();
        out.extend(timer_action(self.laser.tick()));
        self.request_frame(&mut out);
        out
    }

    // =============================================================
    // Viewport
    // =============================================================

    /// The surface was resized. On the display the viewport doubles as the
    /// page dimensions peers stretch the background to.
    pub fn set_viewport(&mut self, width: f64, height: f64) -> Vec<Action> {
        let mut out = Vec::new();
        self.viewport = Dimensions { w: width, h: height };
        if self.kind == SurfaceKind::Display {
            self.page.dimensions = self.viewport;
            self.broadcast_board(&mut out);
        }
        self.request_frame(&mut out);
        out
    }

    pub fn zoom_in(&mut self) -> Vec<Action> {
        self.apply_zoom_command(ZoomCommand::ZoomIn)
    }

    pub fn zoom_out(&mut self) -> Vec<Action> {
        self.apply_zoom_command(ZoomCommand::ZoomOut)
    }

    pub fn reset_zoom(&mut self) -> Vec<Action> {
        self.apply_zoom_command(ZoomCommand::ResetZoom)
    }

    fn viewport_center(&self) -> Point {
        Point::new(self.viewport.w * 0.5, self.viewport.h * 0.5)
    }

    fn apply_zoom_command(&mut self, command: ZoomCommand) -> Vec<Action> {
        let bounds = self.kind.zoom_bounds();
        let center = self.viewport_center();
        let cam = match command {
            ZoomCommand::ZoomIn => self.camera.zoom_in(center, bounds),
            ZoomCommand::ZoomOut => self.camera.zoom_out(center, bounds),
            ZoomCommand::ResetZoom => Camera::default(),
        };
        let mut out = Vec::new();
        self.set_camera(cam, &mut out);
        out
    }

    fn set_camera(&mut self, cam: Camera, out: &mut Vec<Action>) {
        self.camera = cam.sanitized(self.kind.zoom_bounds());
        if self.kind == SurfaceKind::Display {
            self.broadcast_board(out);
        }
        self.request_frame(out);
    }

    // =============================================================
    // Tools
    // =============================================================

    pub fn set_tool(&mut self, tool: Tool) -> Vec<Action> {
        self.apply_local_tools(ToolPatch::tool(tool))
    }

    pub fn set_color(&mut self, color: frames::Color) -> Vec<Action> {
        self.apply_local_tools(ToolPatch::color(color))
    }

    pub fn set_size(&mut self, size: f64) -> Vec<Action> {
        self.apply_local_tools(ToolPatch::size(size))
    }

    /// Display keyboard shortcut (`p`, `e`, `h`, `l`).
    pub fn on_key(&mut self, key: &str) -> Vec<Action> {
        if self.kind != SurfaceKind::Display {
            return Vec::new();
        }
        match Tool::from_shortcut(key) {
            Some(tool) => self.set_tool(tool),
            None => Vec::new(),
        }
    }

    fn apply_local_tools(&mut self, patch: ToolPatch) -> Vec<Action> {
        let mut out = Vec::new();
        if self.kind == SurfaceKind::Presenter || !self.tools.apply(&patch) {
            return out;
        }
        match self.kind {
            SurfaceKind::Controller => {
                if self.status.is_open() {
                    out.push(Action::Send(Message::ToolChange(patch)));
                }
            }
            SurfaceKind::Display => {
                if let Some(writer) = self.links.writer() {
                    let msg = Message::SyncTools { payload: self.tools.to_patch() };
                    out.push(Action::SendTo(writer.clone(), msg));
                }
            }
            SurfaceKind::Presenter => {}
        }
        self.request_frame(&mut out);
        out
    }

    // =============================================================
    // Local pointer input
    // =============================================================

    pub fn on_pointer_down(&mut self, id: PointerId, screen: Point, pressure: f64, now_ms: f64) -> Vec<Action> {
        if self.kind == SurfaceKind::Presenter {
            return Vec::new();
        }
        let events = self.gestures.pointer_down(id, screen, pressure, self.tools.tool, &self.camera);
        self.handle_gestures(events, now_ms)
    }

    pub fn on_pointer_move(&mut self, id: PointerId, screen: Point, pressure: f64, now_ms: f64) -> Vec<Action> {
        if self.kind == SurfaceKind::Presenter {
            return Vec::new();
        }
        let events = self.gestures.pointer_move(id, screen, pressure);
        self.handle_gestures(events, now_ms)
    }

    pub fn on_pointer_up(&mut self, id: PointerId, now_ms: f64) -> Vec<Action> {
        if self.kind == SurfaceKind::Presenter {
            return Vec::new();
        }
        let events = self.gestures.pointer_up(id);
        self.handle_gestures(events, now_ms)
    }

    fn handle_gestures(&mut self, events: Vec<GestureEvent>, now_ms: f64) -> Vec<Action> {
        let mut out = Vec::new();
        for event in events {
            match event {
                GestureEvent::DrawStart { screen, pressure } => self.local_start(screen, pressure, now_ms, &mut out),
                GestureEvent::DrawMove { screen, pressure } => self.local_move(screen, pressure, now_ms, &mut out),
                GestureEvent::DrawEnd => self.local_end(now_ms, &mut out),
                GestureEvent::DrawCancel => {
                    if self.take_draft(&DraftOwner::Local).is_some() {
                        debug!("pinch started; discarding local draft");
                        self.request_frame(&mut out);
                    }
                }
                GestureEvent::Camera(cam) => self.set_camera(cam, &mut out),
            }
        }
        out
    }

    fn local_start(&mut self, screen: Point, pressure: f64, now_ms: f64, out: &mut Vec<Action>) {
        let world = self.camera.screen_to_world(screen);
        let point = InkPoint::new(world.x, world.y, pressure);
        let tools = self.tools;
        let erased = tools.tool == Tool::Eraser && self.page.erase_at(&self.camera, screen) > 0;
        self.draft = Some(Draft { owner: DraftOwner::Local, points: vec![point], tools, erased });
        self.send_input(Message::Start(InputEvent::at(point, tools)), now_ms, out);
        self.request_frame(out);
    }

    fn local_move(&mut self, screen: Point, pressure: f64, now_ms: f64, out: &mut Vec<Action>) {
        let world = self.camera.screen_to_world(screen);
        let point = InkPoint::new(world.x, world.y, pressure);
        let Some(draft) = self.draft.as_mut().filter(|d| d.owner == DraftOwner::Local) else {
            return;
        };
        draft.points.push(point);
        if draft.tools.tool == Tool::Eraser && self.page.erase_at(&self.camera, screen) > 0 {
            draft.erased = true;
        }
        let tools = draft.tools;
        self.send_input(Message::Move(InputEvent::at(point, tools)), now_ms, out);
        self.request_frame(out);
    }

    fn local_end(&mut self, now_ms: f64, out: &mut Vec<Action>) {
        let Some(draft) = self.take_draft(&DraftOwner::Local) else {
            return;
        };
        let tools = draft.tools;
        self.finish_draft(draft, out);
        self.send_input(Message::End(InputEvent::end(tools)), now_ms, out);
    }

    fn send_input(&mut self, msg: Message, now_ms: f64, out: &mut Vec<Action>) {
        if self.kind != SurfaceKind::Controller || !self.status.is_open() {
            return;
        }
        if self.throttle.admit(&msg, now_ms) {
            out.push(Action::Send(msg));
        }
    }

    fn take_draft(&mut self, owner: &DraftOwner) -> Option<Draft> {
        if self.draft.as_ref().is_some_and(|d| d.owner == *owner) { self.draft.take() } else { None }
    }

    /// Resolve a finished draft per tool: commit ink, trail a laser, or drop.
    fn finish_draft(&mut self, draft: Draft, out: &mut Vec<Action>) {
        let ToolState { tool, color, size } = draft.tools;
        let mut changed = draft.erased;
        if tool.commits() {
            self.page.commit(Stroke::new(draft.points, tool, color, size));
            changed |= draft.owner == DraftOwner::Local;
        } else if tool == Tool::Laser {
            out.extend(timer_action(self.laser.push(LaserTrail::new(draft.points))));
        }
        if changed && self.kind == SurfaceKind::Display {
            self.broadcast_board(out);
        }
        self.request_frame(out);
    }

    // =============================================================
    // Display: controller links
    // =============================================================

    /// A controller's link opened. The first one becomes the writer and gets
    /// a full snapshot; others are rejected.
    pub fn on_peer_open(&mut self, peer: &PeerId) -> Vec<Action> {
        if self.kind != SurfaceKind::Display {
            return Vec::new();
        }
        match self.links.open(peer) {
            Admission::Accepted => {
                vec![Action::SendTo(peer.clone(), Message::SyncBoard { payload: self.board_snapshot() })]
            }
            Admission::Rejected => vec![Action::RejectPeer(peer.clone())],
        }
    }

    /// A controller's link closed or failed. Its unfinished draft is dropped.
    pub fn on_peer_closed(&mut self, peer: &PeerId) -> Vec<Action> {
        let mut out = Vec::new();
        if self.kind != SurfaceKind::Display || !self.links.close(peer) {
            return out;
        }
        if self.take_draft(&DraftOwner::Remote(peer.clone())).is_some() {
            self.request_frame(&mut out);
        }
        out
    }

    /// Raw text from a controller. Anything from a non-writer, malformed or
    /// of unknown type is dropped.
    pub fn on_peer_message(&mut self, peer: &PeerId, text: &str) -> Vec<Action> {
        if self.kind != SurfaceKind::Display || !self.links.is_writer(peer) {
            debug!(%peer, "ignoring message from non-writer");
            return Vec::new();
        }
        match parse_inbound(text) {
            Some(msg) => self.apply_remote(peer, msg),
            None => Vec::new(),
        }
    }

    /// Apply a decoded controller message.
    pub fn apply_remote(&mut self, peer: &PeerId, msg: Message) -> Vec<Action> {
        let mut out = Vec::new();
        if self.kind != SurfaceKind::Display || !self.links.is_writer(peer) {
            return out;
        }
        match msg {
            Message::Start(ev) => {
                let tools = ev.tools();
                if !tools.tool.draws() {
                    return out;
                }
                let point = ev.point();
                let erased = tools.tool == Tool::Eraser && self.erase_world(point) > 0;
                self.draft = Some(Draft { owner: DraftOwner::Remote(peer.clone()), points: vec![point], tools, erased });
                self.request_frame(&mut out);
            }
            Message::Move(ev) => {
                let owner = DraftOwner::Remote(peer.clone());
                let point = ev.point();
                let Some(draft) = self.draft.as_mut().filter(|d| d.owner == owner) else {
                    return out;
                };
                draft.points.push(point);
                if draft.tools.tool == Tool::Eraser {
                    let screen = self.camera.world_to_screen(Point::new(point.x, point.y));
                    if self.page.erase_at(&self.camera, screen) > 0 {
                        draft.erased = true;
                    }
                }
                self.request_frame(&mut out);
            }
            Message::End(_) => {
                if let Some(draft) = self.take_draft(&DraftOwner::Remote(peer.clone())) {
                    self.finish_draft(draft, &mut out);
                }
            }
            Message::ToolChange(mut patch) => {
                if patch.tool == Some(Tool::Pan) {
                    patch.tool = None;
                }
                if self.tools.apply(&patch) {
                    self.request_frame(&mut out);
                }
            }
            Message::Command { command } => out = self.apply_zoom_command(command),
            Message::Pan(PanDelta { dx, dy }) => {
                let cam = self.camera.panned_by(dx * self.viewport.w, dy * self.viewport.h);
                self.set_camera(cam, &mut out);
            }
            other @ (Message::SyncBoard { .. } | Message::SyncTools { .. }) => {
                debug!(kind = other.kind(), "display ignores board sync from a controller");
            }
        }
        out
    }

    fn erase_world(&mut self, point: InkPoint) -> usize {
        let screen = self.camera.world_to_screen(Point::new(point.x, point.y));
        self.page.erase_at(&self.camera, screen)
    }

    fn broadcast_board(&self, out: &mut Vec<Action>) {
        if let Some(writer) = self.links.writer() {
            out.push(Action::SendTo(writer.clone(), Message::SyncBoard { payload: self.board_snapshot() }));
        }
    }

    // =============================================================
    // Controller: link to the display
    // =============================================================

    /// The link to the display changed state.
    pub fn on_status(&mut self, status: ConnectionStatus) -> Vec<Action> {
        let mut out = Vec::new();
        if self.kind != SurfaceKind::Controller || self.status == status {
            return out;
        }
        info!(status = status.label(), "display link status changed");
        self.status = status;
        if !status.is_open() {
            self.throttle.reset();
        }
        out.push(Action::StatusChanged(status));
        self.request_frame(&mut out);
        out
    }

    /// Raw text from the display. Ignored unless the link is open.
    pub fn on_message(&mut self, text: &str) -> Vec<Action> {
        if self.kind != SurfaceKind::Controller || !self.status.is_open() {
            return Vec::new();
        }
        match parse_inbound(text) {
            Some(msg) => self.apply_display_message(msg),
            None => Vec::new(),
        }
    }

    /// Apply a decoded display message.
    pub fn apply_display_message(&mut self, msg: Message) -> Vec<Action> {
        let mut out = Vec::new();
        if self.kind != SurfaceKind::Controller {
            return out;
        }
        match msg {
            Message::SyncBoard { payload } => self.apply_snapshot(payload, &mut out),
            Message::SyncTools { payload } => {
                if self.tools.apply(&payload) {
                    self.request_frame(&mut out);
                }
            }
            other => debug!(kind = other.kind(), "controller ignores message"),
        }
        out
    }

    fn apply_snapshot(&mut self, snap: BoardSnapshot, out: &mut Vec<Action>) {
        self.page.replace_strokes(snap.strokes);
        self.tools.apply(&ToolPatch { tool: snap.tool, color: snap.color, size: snap.size });
        if snap.zoom.is_some() || snap.pan.is_some() {
            let pan = snap.pan.unwrap_or(PanOffset { x: self.camera.pan_x, y: self.camera.pan_y });
            let zoom = snap.zoom.unwrap_or(self.camera.zoom);
            self.camera = Camera { pan_x: pan.x, pan_y: pan.y, zoom }.sanitized(self.kind.zoom_bounds());
        }
        if let Some(dimensions) = snap.dimensions {
            self.page.dimensions = dimensions;
        }
        self.replace_background(snap.background_image, out);
        self.request_frame(out);
    }

    fn replace_background(&mut self, url: Option<String>, out: &mut Vec<Action>) {
        if self.page.background() != url.as_deref() {
            self.page.set_background(url.clone());
            out.push(Action::LoadBackground(url));
        }
    }

    /// Ask the display to zoom.
    pub fn send_command(&mut self, command: ZoomCommand) -> Vec<Action> {
        self.send_control(Message::Command { command })
    }

    /// Ask the display to pan by a fraction of its viewport.
    pub fn send_pan(&mut self, dx: f64, dy: f64) -> Vec<Action> {
        self.send_control(Message::Pan(PanDelta { dx, dy }))
    }

    fn send_control(&self, msg: Message) -> Vec<Action> {
        if self.kind == SurfaceKind::Controller && self.status.is_open() { vec![Action::Send(msg)] } else { Vec::new() }
    }

    // =============================================================
    // Presenter
    // =============================================================

    /// Raw text from the presenter channel.
    pub fn on_mirror(&mut self, text: &str) -> Vec<Action> {
        match decode_mirror(text) {
            Ok(state) => self.apply_mirror(state),
            Err(err) => {
                debug!(error = %err, "ignoring malformed mirror state");
                Vec::new()
            }
        }
    }

    /// Replace everything with the display's mirrored state.
    pub fn apply_mirror(&mut self, state: MirrorState) -> Vec<Action> {
        let mut out = Vec::new();
        if self.kind != SurfaceKind::Presenter {
            return out;
        }
        let tools = ToolState { tool: state.tool, color: state.color, size: state.size };
        self.page.replace_strokes(state.lines);
        self.laser.replace(state.laser_lines);
        self.draft = state
            .current_points
            .map(|points| Draft { owner: DraftOwner::Mirror, points, tools, erased: false });
        self.tools = tools;
        self.camera =
            Camera { pan_x: state.pan.x, pan_y: state.pan.y, zoom: state.zoom }.sanitized(self.kind.zoom_bounds());
        self.page.dimensions = state.dimensions;
        self.replace_background(state.background_image_src, &mut out);
        self.request_frame(&mut out);
        out
    }

    // =============================================================
    // Page
    // =============================================================

    /// Show a different page. Any draft is dropped.
    pub fn load_page(&mut self, mut page: Page) -> Vec<Action> {
        let mut out = Vec::new();
        if self.kind == SurfaceKind::Display {
            page.dimensions = self.viewport;
        }
        if page.background() != self.page.background() {
            out.push(Action::LoadBackground(page.background().map(str::to_owned)));
        }
        self.page = page;
        self.draft = None;
        self.gestures.reset();
        out.extend(timer_action(self.laser.clear()));
        self.broadcast_board(&mut out);
        self.request_frame(&mut out);
        out
    }

    /// Set or clear the current page's background.
    pub fn set_background(&mut self, url: Option<String>) -> Vec<Action> {
        let mut out = Vec::new();
        self.replace_background(url, &mut out);
        self.broadcast_board(&mut out);
        self.request_frame(&mut out);
        out
    }

    /// Clear the unsaved flag after the host persisted the page.
    pub fn mark_saved(&mut self) {
        self.page.mark_saved();
    }

    // =============================================================
    // Teardown
    // =============================================================

    /// The surface is going away. Drops the draft, every contact and every
    /// laser trail; stops the decay timer if one is running. Nothing is sent
    /// to peers.
    pub fn unmount(&mut self) -> Vec<Action> {
        self.draft = None;
        self.gestures.reset();
        self.frame_pending = false;
        self.mirror_dirty = false;
        timer_action(self.laser.clear()).into_iter().collect()
    }
}

// =============================================================
// Engine
// =============================================================

/// The full canvas engine. Wraps `EngineCore` and owns the browser canvas element.
pub struct Engine {
    canvas: HtmlCanvasElement,
    background: Option<HtmlImageElement>,
    dpr: f64,
    pub core: EngineCore,
}

impl Engine {
    /// Create a new engine bound to the given canvas element.
    #[must_use]
    pub fn new(canvas: HtmlCanvasElement, kind: SurfaceKind) -> Self {
        Self { canvas, background: None, dpr: 1.0, core: EngineCore::new(kind) }
    }

    fn now_ms() -> f64 {
        js_sys::Date::now()
    }

    /// Update viewport dimensions (CSS pixels) and device pixel ratio.
    pub fn set_viewport(&mut self, width_css: f64, height_css: f64, dpr: f64) -> Vec<Action> {
        self.dpr = dpr;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        {
            self.canvas.set_width((width_css * dpr).round() as u32);
            self.canvas.set_height((height_css * dpr).round() as u32);
        }
        self.core.set_viewport(width_css, height_css)
    }

    /// Hand over the decoded background image after a [`Action::LoadBackground`].
    pub fn set_background_image(&mut self, image: Option<HtmlImageElement>) -> Vec<Action> {
        self.background = image;
        let mut out = Vec::new();
        self.core.request_frame(&mut out);
        out
    }

    pub fn on_pointer_down(&mut self, id: PointerId, screen: Point, pressure: f64) -> Vec<Action> {
        self.core.on_pointer_down(id, screen, pressure, Self::now_ms())
    }

    pub fn on_pointer_move(&mut self, id: PointerId, screen: Point, pressure: f64) -> Vec<Action> {
        self.core.on_pointer_move(id, screen, pressure, Self::now_ms())
    }

    pub fn on_pointer_up(&mut self, id: PointerId) -> Vec<Action> {
        self.core.on_pointer_up(id, Self::now_ms())
    }

    /// Tear down before the canvas element is removed.
    pub fn unmount(&mut self) -> Vec<Action> {
        self.background = None;
        self.core.unmount()
    }

    /// Draw the current state, then report post-frame actions.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the 2D context is unavailable or a `Canvas2D` call fails.
    pub fn render(&mut self) -> Result<Vec<Action>, JsValue> {
        if let Some(ctx) = self.canvas.get_context("2d")? {
            let ctx: CanvasRenderingContext2d = ctx.dyn_into()?;
            let plan = render::plan_frame(&self.core.scene());
            render::paint(&ctx, &plan, self.background.as_ref(), self.dpr)?;
        }
        Ok(self.core.on_frame())
    }
}
