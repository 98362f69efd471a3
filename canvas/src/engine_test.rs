#![allow(clippy::float_cmp)]

use super::*;
use frames::Color;

const EPSILON: f64 = 1e-9;

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

fn black_pen() -> ToolState {
    ToolState { tool: Tool::Pen, color: Color::rgb(0, 0, 0), size: 6.0 }
}

fn with_tool(tool: Tool) -> ToolState {
    ToolState { tool, ..black_pen() }
}

fn event(x: f64, y: f64, tools: ToolState) -> InputEvent {
    InputEvent::at(InkPoint::new(x, y, 0.6), tools)
}

fn display_with_writer() -> (EngineCore, PeerId) {
    let mut core = EngineCore::new(SurfaceKind::Display);
    let peer = PeerId::new("controller-1");
    core.on_peer_open(&peer);
    (core, peer)
}

fn connected_controller() -> EngineCore {
    let mut core = EngineCore::new(SurfaceKind::Controller);
    core.on_status(ConnectionStatus::Open);
    core
}

/// Replay one remote stroke from `peer`.
fn remote_stroke(core: &mut EngineCore, peer: &PeerId, points: &[(f64, f64)], tools: ToolState) -> Vec<Action> {
    let mut out = Vec::new();
    for (i, &(x, y)) in points.iter().enumerate() {
        let msg = if i == 0 { Message::Start(event(x, y, tools)) } else { Message::Move(event(x, y, tools)) };
        out.extend(core.apply_remote(peer, msg));
    }
    out.extend(core.apply_remote(peer, Message::End(InputEvent::end(tools))));
    out
}

fn sent(actions: &[Action]) -> Vec<&Message> {
    actions
        .iter()
        .filter_map(|a| match a {
            Action::Send(msg) => Some(msg),
            _ => None,
        })
        .collect()
}

fn boards_sent(actions: &[Action]) -> Vec<&BoardSnapshot> {
    actions
        .iter()
        .filter_map(|a| match a {
            Action::SendTo(_, Message::SyncBoard { payload }) => Some(payload),
            _ => None,
        })
        .collect()
}

fn kinds(messages: &[&Message]) -> Vec<&'static str> {
    messages.iter().map(|m| m.kind()).collect()
}

// =============================================================
// Display: remote replay
// =============================================================

#[test]
fn remote_pen_stroke_commits_once() {
    let (mut core, peer) = display_with_writer();
    remote_stroke(&mut core, &peer, &[(10.0, 10.0), (12.0, 10.0)], black_pen());

    let strokes = core.page().strokes();
    assert_eq!(strokes.len(), 1);
    assert_eq!(strokes[0].tool, Tool::Pen);
    assert_eq!(strokes[0].color, Color::rgb(0, 0, 0));
    assert_eq!(strokes[0].size, 6.0);
    assert_eq!(strokes[0].points, vec![InkPoint::new(10.0, 10.0, 0.6), InkPoint::new(12.0, 10.0, 0.6)]);
    assert!(core.trails().is_empty());
    assert!(core.draft().is_none());
}

#[test]
fn remote_commit_is_not_echoed() {
    let (mut core, peer) = display_with_writer();
    let actions = remote_stroke(&mut core, &peer, &[(10.0, 10.0), (12.0, 10.0)], black_pen());
    assert!(boards_sent(&actions).is_empty());
}

#[test]
fn remote_draft_tracks_moves() {
    let (mut core, peer) = display_with_writer();
    core.apply_remote(&peer, Message::Start(event(1.0, 1.0, black_pen())));
    core.apply_remote(&peer, Message::Move(event(2.0, 2.0, black_pen())));
    let draft = core.draft().map(|d| (d.owner.clone(), d.points.len()));
    assert_eq!(draft, Some((DraftOwner::Remote(peer), 2)));
}

#[test]
fn remote_eraser_removes_strokes_within_radius() {
    let (mut core, peer) = display_with_writer();
    remote_stroke(&mut core, &peer, &[(100.0, 100.0), (110.0, 100.0)], black_pen());
    remote_stroke(&mut core, &peer, &[(100.0, 300.0), (110.0, 300.0)], black_pen());

    let actions = remote_stroke(&mut core, &peer, &[(105.0, 110.0)], with_tool(Tool::Eraser));

    let strokes = core.page().strokes();
    assert_eq!(strokes.len(), 1);
    assert!(approx_eq(strokes[0].points[0].y, 300.0));
    let boards = boards_sent(&actions);
    assert_eq!(boards.len(), 1);
    assert_eq!(boards[0].strokes.len(), 1);
}

#[test]
fn remote_eraser_far_away_keeps_everything() {
    let (mut core, peer) = display_with_writer();
    remote_stroke(&mut core, &peer, &[(100.0, 100.0), (110.0, 100.0)], black_pen());
    let actions = remote_stroke(&mut core, &peer, &[(105.0, 130.0), (140.0, 140.0)], with_tool(Tool::Eraser));
    assert_eq!(core.page().strokes().len(), 1);
    assert!(boards_sent(&actions).is_empty());
}

#[test]
fn remote_eraser_uses_display_camera() {
    let (mut core, peer) = display_with_writer();
    remote_stroke(&mut core, &peer, &[(100.0, 100.0)], black_pen());
    // 15 world units apart: a hit at zoom 1, a miss at zoom 2 (30px).
    core.apply_zoom_command(ZoomCommand::ZoomIn);
    core.apply_zoom_command(ZoomCommand::ZoomIn);
    core.apply_zoom_command(ZoomCommand::ZoomIn);
    core.apply_zoom_command(ZoomCommand::ZoomIn);
    assert!(core.camera().zoom > 2.0);
    remote_stroke(&mut core, &peer, &[(100.0, 115.0)], with_tool(Tool::Eraser));
    assert_eq!(core.page().strokes().len(), 1);
}

#[test]
fn remote_laser_becomes_trail_and_starts_timer() {
    let (mut core, peer) = display_with_writer();
    let actions = remote_stroke(&mut core, &peer, &[(0.0, 0.0), (5.0, 5.0)], with_tool(Tool::Laser));
    assert!(core.page().strokes().is_empty());
    assert_eq!(core.trails().len(), 1);
    assert!(approx_eq(core.trails()[0].opacity, 1.0));
    assert!(actions.contains(&Action::StartDecayTimer { interval_ms: 20 }));
}

#[test]
fn remote_pan_tool_is_ignored() {
    let (mut core, peer) = display_with_writer();
    remote_stroke(&mut core, &peer, &[(0.0, 0.0), (5.0, 5.0)], with_tool(Tool::Pan));
    assert!(core.draft().is_none());
    assert!(core.page().strokes().is_empty());
}

#[test]
fn later_start_replaces_draft() {
    let (mut core, peer) = display_with_writer();
    core.apply_remote(&peer, Message::Start(event(1.0, 1.0, black_pen())));
    core.apply_remote(&peer, Message::Start(event(50.0, 50.0, black_pen())));
    core.apply_remote(&peer, Message::End(InputEvent::end(black_pen())));
    let strokes = core.page().strokes();
    assert_eq!(strokes.len(), 1);
    assert_eq!(strokes[0].points.len(), 1);
    assert!(approx_eq(strokes[0].points[0].x, 50.0));
}

#[test]
fn local_start_takes_over_remote_draft() {
    let (mut core, peer) = display_with_writer();
    core.apply_remote(&peer, Message::Start(event(1.0, 1.0, black_pen())));
    core.on_pointer_down(1, Point::new(30.0, 30.0), 0.5, 0.0);
    core.apply_remote(&peer, Message::Move(event(2.0, 2.0, black_pen())));
    core.apply_remote(&peer, Message::End(InputEvent::end(black_pen())));
    assert!(core.page().strokes().is_empty());
    assert_eq!(core.draft().map(|d| d.owner.clone()), Some(DraftOwner::Local));
}

#[test]
fn end_without_draft_is_noop() {
    let (mut core, peer) = display_with_writer();
    core.apply_remote(&peer, Message::End(InputEvent::end(black_pen())));
    assert!(core.page().strokes().is_empty());
}

// =============================================================
// Display: links
// =============================================================

#[test]
fn writer_gets_snapshot_on_connect() {
    let mut core = EngineCore::new(SurfaceKind::Display);
    core.set_background(Some("slide.png".to_owned()));
    let peer = PeerId::new("c");
    let actions = core.on_peer_open(&peer);
    let boards = boards_sent(&actions);
    assert_eq!(boards.len(), 1);
    assert_eq!(boards[0].background_image.as_deref(), Some("slide.png"));
    assert_eq!(boards[0].zoom, Some(1.0));
    assert_eq!(boards[0].tool, Some(Tool::Pen));
}

#[test]
fn second_controller_is_rejected_and_ignored() {
    let (mut core, _) = display_with_writer();
    let intruder = PeerId::new("controller-2");
    assert_eq!(core.on_peer_open(&intruder), vec![Action::RejectPeer(intruder.clone())]);

    let text = frames::encode_message(&Message::Start(event(1.0, 1.0, black_pen())));
    assert!(core.on_peer_message(&intruder, &text).is_empty());
    assert!(core.draft().is_none());
}

#[test]
fn writer_text_is_decoded_and_applied() {
    let (mut core, peer) = display_with_writer();
    let text = r##"{"type":"start","x":4,"y":5,"pressure":0.5,"color":"#ef4444","size":3,"tool":"highlighter"}"##;
    core.on_peer_message(&peer, text);
    let draft = core.draft().map(|d| d.tools);
    assert_eq!(draft, Some(ToolState { tool: Tool::Highlighter, color: Color::rgb(0xef, 0x44, 0x44), size: 3.0 }));
}

#[test]
fn unknown_and_malformed_text_is_dropped() {
    let (mut core, peer) = display_with_writer();
    assert!(core.on_peer_message(&peer, r#"{"type":"wave"}"#).is_empty());
    assert!(core.on_peer_message(&peer, "{").is_empty());
}

#[test]
fn writer_disconnect_drops_draft_and_input() {
    let (mut core, peer) = display_with_writer();
    core.apply_remote(&peer, Message::Start(event(1.0, 1.0, black_pen())));
    core.on_peer_closed(&peer);
    assert!(core.draft().is_none());
    assert!(core.writer().is_none());

    core.apply_remote(&peer, Message::Start(event(1.0, 1.0, black_pen())));
    assert!(core.draft().is_none());
}

#[test]
fn slot_frees_after_writer_leaves() {
    let (mut core, peer) = display_with_writer();
    core.on_peer_closed(&peer);
    let next = PeerId::new("controller-2");
    let actions = core.on_peer_open(&next);
    assert_eq!(boards_sent(&actions).len(), 1);
    assert_eq!(core.writer(), Some(&next));
}

// =============================================================
// Display: tools and viewport
// =============================================================

#[test]
fn tool_change_applies_but_never_pan() {
    let (mut core, peer) = display_with_writer();
    core.apply_remote(&peer, Message::ToolChange(ToolPatch { tool: Some(Tool::Pan), color: None, size: Some(12.0) }));
    assert_eq!(core.tools().tool, Tool::Pen);
    assert_eq!(core.tools().size, 12.0);
}

#[test]
fn shortcut_switches_tool_and_syncs_writer() {
    let (mut core, peer) = display_with_writer();
    let actions = core.on_key("e");
    assert_eq!(core.tools().tool, Tool::Eraser);
    let expected = Message::SyncTools { payload: core.tools().to_patch() };
    assert!(actions.contains(&Action::SendTo(peer, expected)));
    assert!(core.on_key("x").is_empty());
}

#[test]
fn zoom_command_scales_about_center_and_syncs() {
    let (mut core, peer) = display_with_writer();
    core.set_viewport(800.0, 600.0);
    let actions = core.apply_remote(&peer, Message::Command { command: ZoomCommand::ZoomIn });

    let cam = core.camera();
    assert!(approx_eq(cam.zoom, 1.2));
    let center = cam.world_to_screen(Point::new(400.0, 300.0));
    assert!(approx_eq(center.x, 400.0) && approx_eq(center.y, 300.0));
    let boards = boards_sent(&actions);
    assert_eq!(boards.len(), 1);
    assert_eq!(boards[0].zoom, Some(cam.zoom));
}

#[test]
fn display_zoom_is_clamped() {
    let (mut core, _) = display_with_writer();
    for _ in 0..20 {
        core.zoom_in();
    }
    assert!(approx_eq(core.camera().zoom, 3.0));
    for _ in 0..40 {
        core.zoom_out();
    }
    assert!(approx_eq(core.camera().zoom, 0.5));
    core.reset_zoom();
    assert_eq!(core.camera(), Camera::default());
}

#[test]
fn pan_command_is_fraction_of_viewport() {
    let (mut core, peer) = display_with_writer();
    core.set_viewport(800.0, 600.0);
    core.apply_remote(&peer, Message::Pan(PanDelta { dx: 0.1, dy: -0.5 }));
    assert!(approx_eq(core.camera().pan_x, 80.0));
    assert!(approx_eq(core.camera().pan_y, -300.0));
}

#[test]
fn resize_updates_dimensions_and_syncs() {
    let (mut core, _) = display_with_writer();
    let actions = core.set_viewport(1280.0, 720.0);
    assert_eq!(core.page().dimensions, Dimensions { w: 1280.0, h: 720.0 });
    assert_eq!(boards_sent(&actions)[0].dimensions, Some(Dimensions { w: 1280.0, h: 720.0 }));
}

#[test]
fn local_display_stroke_is_synced_to_writer() {
    let (mut core, _) = display_with_writer();
    core.on_pointer_down(1, Point::new(10.0, 10.0), 0.5, 0.0);
    core.on_pointer_move(1, Point::new(20.0, 10.0), 0.5, 10.0);
    let actions = core.on_pointer_up(1, 20.0);
    assert_eq!(core.page().strokes().len(), 1);
    assert!(sent(&actions).is_empty());
    assert_eq!(boards_sent(&actions)[0].strokes.len(), 1);
}

#[test]
fn load_page_drops_laser_trails() {
    let (mut core, peer) = display_with_writer();
    remote_stroke(&mut core, &peer, &[(0.0, 0.0), (5.0, 5.0)], with_tool(Tool::Laser));
    assert_eq!(core.trails().len(), 1);
    let actions = core.load_page(Page::new());
    assert!(core.trails().is_empty());
    assert!(actions.contains(&Action::StopDecayTimer));
}

#[test]
fn background_change_loads_and_syncs() {
    let (mut core, _) = display_with_writer();
    let actions = core.set_background(Some("a.png".to_owned()));
    assert!(actions.contains(&Action::LoadBackground(Some("a.png".to_owned()))));
    assert_eq!(boards_sent(&actions).len(), 1);

    let actions = core.set_background(None);
    assert!(actions.contains(&Action::LoadBackground(None)));
    assert_eq!(core.page().background(), None);
}

#[test]
fn load_page_drops_draft_and_syncs() {
    let (mut core, peer) = display_with_writer();
    core.apply_remote(&peer, Message::Start(event(1.0, 1.0, black_pen())));
    let mut page = Page::new();
    page.commit(Stroke::new(vec![InkPoint::at(0.0, 0.0)], Tool::Pen, Color::default(), 4.0));
    let actions = core.load_page(page);
    assert!(core.draft().is_none());
    assert_eq!(core.page().strokes().len(), 1);
    assert_eq!(boards_sent(&actions)[0].strokes.len(), 1);
}

// =============================================================
// Display: frames, mirror and decay
// =============================================================

#[test]
fn frame_requests_coalesce() {
    let (mut core, peer) = display_with_writer();
    let first = core.apply_remote(&peer, Message::Start(event(1.0, 1.0, black_pen())));
    let second = core.apply_remote(&peer, Message::Move(event(2.0, 1.0, black_pen())));
    assert!(first.contains(&Action::RequestFrame));
    assert!(!second.contains(&Action::RequestFrame));
    core.on_frame();
    let third = core.apply_remote(&peer, Message::Move(event(3.0, 1.0, black_pen())));
    assert!(third.contains(&Action::RequestFrame));
}

#[test]
fn display_mirrors_after_each_changed_frame() {
    let (mut core, peer) = display_with_writer();
    core.apply_remote(&peer, Message::Start(event(1.0, 1.0, black_pen())));
    let actions = core.on_frame();
    match actions.as_slice() {
        [Action::Mirror(state)] => {
            assert_eq!(state.current_points.as_ref().map(Vec::len), Some(1));
            assert_eq!(state.tool, Tool::Pen);
        }
        other => panic!("expected one mirror action, got {other:?}"),
    }
    assert!(core.on_frame().is_empty());
}

#[test]
fn decay_runs_until_trails_fade() {
    let (mut core, peer) = display_with_writer();
    remote_stroke(&mut core, &peer, &[(0.0, 0.0)], with_tool(Tool::Laser));
    let mut stopped_at = None;
    for tick in 1..=100 {
        if core.on_decay_tick().contains(&Action::StopDecayTimer) {
            stopped_at = Some(tick);
            break;
        }
    }
    assert_eq!(stopped_at, Some(50));
    assert!(core.trails().is_empty());
}

// =============================================================
// Controller
// =============================================================

#[test]
fn controller_streams_local_stroke() {
    let mut core = connected_controller();
    core.on_pointer_down(1, Point::new(10.0, 10.0), 0.6, 0.0);
    let mut actions = core.on_pointer_move(1, Point::new(12.0, 10.0), 0.6, 20.0);
    actions.extend(core.on_pointer_up(1, 40.0));

    assert_eq!(kinds(&sent(&actions)), vec!["move", "end"]);
    assert_eq!(core.page().strokes().len(), 1);
    assert_eq!(core.page().strokes()[0].points.len(), 2);
}

#[test]
fn controller_start_carries_world_point_and_tools() {
    let mut core = connected_controller();
    core.apply_display_message(Message::SyncBoard {
        payload: BoardSnapshot { zoom: Some(2.0), pan: Some(PanOffset { x: 10.0, y: 0.0 }), ..BoardSnapshot::default() },
    });
    let actions = core.on_pointer_down(1, Point::new(30.0, 40.0), 0.6, 0.0);
    let expected = Message::Start(InputEvent::at(InkPoint::new(10.0, 20.0, 0.6), core.tools()));
    assert_eq!(sent(&actions), vec![&expected]);
}

#[test]
fn controller_throttles_moves() {
    let mut core = connected_controller();
    let mut actions = core.on_pointer_down(1, Point::new(0.0, 0.0), 0.5, 0.0);
    actions.extend(core.on_pointer_move(1, Point::new(1.0, 0.0), 0.5, 5.0));
    actions.extend(core.on_pointer_move(1, Point::new(2.0, 0.0), 0.5, 10.0));
    actions.extend(core.on_pointer_move(1, Point::new(3.0, 0.0), 0.5, 17.0));
    actions.extend(core.on_pointer_up(1, 18.0));
    assert_eq!(kinds(&sent(&actions)), vec!["start", "move", "end"]);
    // Throttled samples still land in the local stroke.
    assert_eq!(core.page().strokes()[0].points.len(), 4);
}

#[test]
fn offline_controller_draws_without_sending() {
    let mut core = EngineCore::new(SurfaceKind::Controller);
    let mut actions = core.on_pointer_down(1, Point::new(0.0, 0.0), 0.5, 0.0);
    actions.extend(core.on_pointer_up(1, 10.0));
    assert!(sent(&actions).is_empty());
    assert_eq!(core.page().strokes().len(), 1);
}

#[test]
fn controller_eraser_erases_locally_and_streams() {
    let mut core = connected_controller();
    core.apply_display_message(Message::SyncBoard {
        payload: BoardSnapshot {
            strokes: vec![Stroke::new(vec![InkPoint::at(50.0, 50.0)], Tool::Pen, Color::default(), 6.0)],
            ..BoardSnapshot::default()
        },
    });
    core.set_tool(Tool::Eraser);
    let mut actions = core.on_pointer_down(1, Point::new(55.0, 55.0), 0.5, 100.0);
    actions.extend(core.on_pointer_up(1, 120.0));
    assert!(core.page().strokes().is_empty());
    let messages = sent(&actions);
    assert_eq!(kinds(&messages), vec!["start", "end"]);
    assert!(matches!(messages[0], Message::Start(ev) if ev.tool == Tool::Eraser));
}

#[test]
fn controller_laser_is_never_committed() {
    let mut core = connected_controller();
    core.set_tool(Tool::Laser);
    core.on_pointer_down(1, Point::new(0.0, 0.0), 0.5, 0.0);
    let actions = core.on_pointer_up(1, 10.0);
    assert!(core.page().strokes().is_empty());
    assert_eq!(core.trails().len(), 1);
    assert!(actions.contains(&Action::StartDecayTimer { interval_ms: 30 }));
}

#[test]
fn pinch_discards_draft_without_end() {
    let mut core = connected_controller();
    core.on_pointer_down(1, Point::new(100.0, 100.0), 0.5, 0.0);
    let actions = core.on_pointer_down(2, Point::new(200.0, 100.0), 0.5, 50.0);
    assert!(core.draft().is_none());
    assert!(sent(&actions).is_empty());
    assert!(core.page().strokes().is_empty());
}

#[test]
fn controller_pinch_is_local_only() {
    let mut core = connected_controller();
    core.on_pointer_down(1, Point::new(100.0, 100.0), 0.5, 0.0);
    core.on_pointer_down(2, Point::new(200.0, 100.0), 0.5, 0.0);
    let actions = core.on_pointer_move(2, Point::new(300.0, 100.0), 0.5, 10.0);
    assert!(approx_eq(core.camera().zoom, 2.0));
    assert!(sent(&actions).is_empty());
}

#[test]
fn tool_change_is_sent_once_per_change() {
    let mut core = connected_controller();
    let actions = core.set_color(Color::rgb(0x3b, 0x82, 0xf6));
    assert_eq!(sent(&actions), vec![&Message::ToolChange(ToolPatch::color(Color::rgb(0x3b, 0x82, 0xf6)))]);
    assert!(core.set_color(Color::rgb(0x3b, 0x82, 0xf6)).is_empty());

    let actions = core.set_size(20.0);
    assert_eq!(sent(&actions), vec![&Message::ToolChange(ToolPatch::size(20.0))]);
}

#[test]
fn sync_board_replaces_strokes_and_adopts_view() {
    let mut core = connected_controller();
    core.on_pointer_down(1, Point::new(0.0, 0.0), 0.5, 0.0);
    core.on_pointer_up(1, 5.0);

    let snapshot = BoardSnapshot {
        strokes: Vec::new(),
        background_image: None,
        tool: Some(Tool::Highlighter),
        color: Some(Color::rgb(0x10, 0xb9, 0x81)),
        size: None,
        zoom: Some(50.0),
        pan: Some(PanOffset { x: 5.0, y: 6.0 }),
        dimensions: Some(Dimensions { w: 640.0, h: 480.0 }),
    };
    core.apply_display_message(Message::SyncBoard { payload: snapshot });

    assert!(core.page().strokes().is_empty());
    assert_eq!(core.tools().tool, Tool::Highlighter);
    assert_eq!(core.tools().size, 6.0);
    assert!(approx_eq(core.camera().zoom, 10.0));
    assert!(approx_eq(core.camera().pan_x, 5.0));
    assert_eq!(core.page().dimensions, Dimensions { w: 640.0, h: 480.0 });
}

#[test]
fn sync_board_null_background_clears() {
    let mut core = connected_controller();
    let actions = core.apply_display_message(Message::SyncBoard {
        payload: BoardSnapshot { background_image: Some("x.png".to_owned()), ..BoardSnapshot::default() },
    });
    assert!(actions.contains(&Action::LoadBackground(Some("x.png".to_owned()))));

    let actions = core.on_message(r#"{"type":"sync_board","payload":{"strokes":[],"backgroundImage":null}}"#);
    assert!(actions.contains(&Action::LoadBackground(None)));
    assert_eq!(core.page().background(), None);
}

#[test]
fn sync_tools_applies_patch() {
    let mut core = connected_controller();
    core.on_message(r#"{"type":"sync_tools","payload":{"tool":"laser"}}"#);
    assert_eq!(core.tools().tool, Tool::Laser);
    assert_eq!(core.tools().size, 6.0);
}

#[test]
fn controller_ignores_messages_until_open() {
    let mut core = EngineCore::new(SurfaceKind::Controller);
    assert!(core.on_message(r#"{"type":"sync_tools","payload":{"tool":"laser"}}"#).is_empty());
    assert_eq!(core.tools().tool, Tool::Pen);
}

#[test]
fn status_changes_are_reported_once() {
    let mut core = EngineCore::new(SurfaceKind::Controller);
    let actions = core.on_status(ConnectionStatus::Open);
    assert!(actions.contains(&Action::StatusChanged(ConnectionStatus::Open)));
    assert!(core.on_status(ConnectionStatus::Open).is_empty());
    let actions = core.on_status(ConnectionStatus::Errored);
    assert!(actions.contains(&Action::StatusChanged(ConnectionStatus::Errored)));
    assert_eq!(core.status().label(), "Connection Failed");
}

#[test]
fn remote_view_commands_need_open_link() {
    let mut core = EngineCore::new(SurfaceKind::Controller);
    assert!(core.send_command(ZoomCommand::ZoomIn).is_empty());
    core.on_status(ConnectionStatus::Open);
    assert_eq!(
        core.send_pan(0.25, 0.0),
        vec![Action::Send(Message::Pan(PanDelta { dx: 0.25, dy: 0.0 }))]
    );
}

#[test]
fn controller_zoom_buttons_use_wide_bounds() {
    let mut core = connected_controller();
    for _ in 0..30 {
        core.zoom_in();
    }
    assert!(approx_eq(core.camera().zoom, 10.0));
    assert!(core.on_frame().is_empty());
}

// =============================================================
// Presenter
// =============================================================

#[test]
fn presenter_renders_mirrored_state() {
    let (mut display, peer) = display_with_writer();
    display.set_background(Some("bg.png".to_owned()));
    remote_stroke(&mut display, &peer, &[(1.0, 1.0), (2.0, 2.0)], black_pen());
    display.apply_remote(&peer, Message::Start(event(5.0, 5.0, with_tool(Tool::Highlighter))));
    let text = frames::encode_mirror(&display.mirror_state());

    let mut presenter = EngineCore::new(SurfaceKind::Presenter);
    let actions = presenter.on_mirror(&text);

    assert!(actions.contains(&Action::LoadBackground(Some("bg.png".to_owned()))));
    assert_eq!(presenter.page().strokes(), display.page().strokes());
    let draft = presenter.draft().map(|d| (d.owner.clone(), d.tools.tool));
    assert_eq!(draft, Some((DraftOwner::Mirror, Tool::Highlighter)));
    assert!(presenter.on_frame().is_empty());
}

#[test]
fn presenter_ignores_pointer_and_malformed_state() {
    let mut presenter = EngineCore::new(SurfaceKind::Presenter);
    assert!(presenter.on_pointer_down(1, Point::new(1.0, 1.0), 0.5, 0.0).is_empty());
    assert!(presenter.on_mirror("nope").is_empty());
    assert!(presenter.draft().is_none());
}

#[test]
fn scene_uses_surface_highlighter_alpha() {
    assert!(approx_eq(EngineCore::new(SurfaceKind::Controller).scene().highlighter_alpha, 0.5));
    assert!(approx_eq(EngineCore::new(SurfaceKind::Presenter).scene().highlighter_alpha, 0.3));
}

// =============================================================
// Teardown
// =============================================================

#[test]
fn unmount_stops_decay_timer() {
    let (mut core, peer) = display_with_writer();
    remote_stroke(&mut core, &peer, &[(0.0, 0.0), (5.0, 5.0)], with_tool(Tool::Laser));
    assert_eq!(core.unmount(), vec![Action::StopDecayTimer]);
    assert!(core.trails().is_empty());

    let actions = remote_stroke(&mut core, &peer, &[(1.0, 1.0), (2.0, 2.0)], with_tool(Tool::Laser));
    assert!(actions.contains(&Action::StartDecayTimer { interval_ms: 20 }));
}

#[test]
fn unmount_drops_draft_and_contacts() {
    let mut core = connected_controller();
    core.on_pointer_down(1, Point::new(10.0, 10.0), 0.5, 0.0);
    assert!(core.draft().is_some());

    assert!(core.unmount().is_empty());
    assert!(core.draft().is_none());
    assert!(sent(&core.on_pointer_move(1, Point::new(20.0, 20.0), 0.5, 40.0)).is_empty());

    core.on_pointer_down(2, Point::new(30.0, 30.0), 0.5, 80.0);
    assert_eq!(core.draft().map(|d| d.points.len()), Some(1));
}

#[test]
fn unmount_when_idle_is_quiet() {
    assert!(EngineCore::new(SurfaceKind::Display).unmount().is_empty());
}
