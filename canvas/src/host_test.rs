use frames::{Color, Point as InkPoint, Tool};

use super::*;
use crate::camera::Point;
use crate::doc::MemoryPageStore;
use crate::engine::SurfaceKind;
use crate::sync::PeerId;

fn host_with_pages(count: usize) -> (PageHost<MemoryPageStore>, Vec<PageId>) {
    let mut store = MemoryPageStore::new();
    let ids = store.add_notebook("lecture", count);
    (PageHost::new(store), ids)
}

fn draw_dot(engine: &mut EngineCore, x: f64, y: f64) {
    engine.on_pointer_down(1, Point::new(x, y), 0.5, 0.0);
    engine.on_pointer_up(1, 10.0);
}

fn display() -> EngineCore {
    EngineCore::new(SurfaceKind::Display)
}

#[test]
fn open_shows_first_page() {
    let (mut host, ids) = host_with_pages(3);
    let mut engine = display();
    host.open("lecture", &mut engine).unwrap();
    assert_eq!(host.current(), Some(&ids[0]));
    assert_eq!(host.position(), (1, 3));
    assert_eq!(engine.page().id.as_ref(), Some(&ids[0]));
}

#[test]
fn open_empty_notebook_creates_a_page() {
    let (mut host, _) = host_with_pages(0);
    let mut engine = display();
    host.open("lecture", &mut engine).unwrap();
    assert_eq!(host.position(), (1, 1));
}

#[test]
fn open_unknown_notebook_fails() {
    let (mut host, _) = host_with_pages(1);
    let mut engine = display();
    let err = host.open("missing", &mut engine).unwrap_err();
    assert_eq!(err, StoreError::NotebookNotFound("missing".to_owned()));
    assert_eq!(host.position(), (0, 0));
}

#[test]
fn next_saves_then_loads() {
    let (mut host, ids) = host_with_pages(2);
    let mut engine = display();
    host.open("lecture", &mut engine).unwrap();
    draw_dot(&mut engine, 10.0, 10.0);

    host.next_page(&mut engine).unwrap();

    assert_eq!(host.current(), Some(&ids[1]));
    assert!(engine.page().strokes().is_empty());
    assert_eq!(host.store().record(&ids[0]).map(|r| r.strokes.len()), Some(1));
}

#[test]
fn navigation_stops_at_ends() {
    let (mut host, ids) = host_with_pages(2);
    let mut engine = display();
    host.open("lecture", &mut engine).unwrap();
    assert!(host.prev_page(&mut engine).unwrap().is_empty());
    host.next_page(&mut engine).unwrap();
    assert!(host.next_page(&mut engine).unwrap().is_empty());
    assert_eq!(host.current(), Some(&ids[1]));
    host.prev_page(&mut engine).unwrap();
    assert_eq!(host.current(), Some(&ids[0]));
}

#[test]
fn failed_save_aborts_navigation() {
    let (mut host, ids) = host_with_pages(2);
    let mut engine = display();
    host.open("lecture", &mut engine).unwrap();
    draw_dot(&mut engine, 10.0, 10.0);
    host.store.set_fail_writes(true);

    assert!(host.next_page(&mut engine).is_err());

    assert_eq!(host.current(), Some(&ids[0]));
    assert_eq!(engine.page().strokes().len(), 1);
    assert!(engine.page().is_unsaved());
}

#[test]
fn clean_page_navigates_even_when_writes_fail() {
    let (mut host, ids) = host_with_pages(2);
    let mut engine = display();
    host.open("lecture", &mut engine).unwrap();
    host.store.set_fail_writes(true);
    host.next_page(&mut engine).unwrap();
    assert_eq!(host.current(), Some(&ids[1]));
}

#[test]
fn add_page_appends_and_shows_it() {
    let (mut host, _) = host_with_pages(1);
    let mut engine = display();
    host.open("lecture", &mut engine).unwrap();
    draw_dot(&mut engine, 10.0, 10.0);

    host.add_page(&mut engine).unwrap();

    assert_eq!(host.position(), (2, 2));
    assert!(engine.page().strokes().is_empty());
    assert!(!engine.page().is_unsaved());
}

#[test]
fn save_clears_unsaved_flag() {
    let (mut host, ids) = host_with_pages(1);
    let mut engine = display();
    host.open("lecture", &mut engine).unwrap();
    draw_dot(&mut engine, 10.0, 10.0);
    host.save(&mut engine).unwrap();
    assert!(!engine.page().is_unsaved());
    assert_eq!(host.store().record(&ids[0]).map(|r| r.strokes.len()), Some(1));
}

#[test]
fn loaded_strokes_come_from_store() {
    let mut store = MemoryPageStore::new();
    let ids = store.add_notebook("lecture", 1);
    let stroke = frames::Stroke::new(vec![InkPoint::at(3.0, 4.0)], Tool::Highlighter, Color::rgb(1, 2, 3), 9.0);
    store.save_page(&ids[0], std::slice::from_ref(&stroke)).unwrap();
    let mut host = PageHost::new(store);
    let mut engine = display();
    host.open("lecture", &mut engine).unwrap();
    assert_eq!(engine.page().strokes(), &[stroke]);
}

#[test]
fn background_is_persisted_and_broadcast() {
    let (mut host, ids) = host_with_pages(1);
    let mut engine = display();
    let peer = PeerId::new("c");
    engine.on_peer_open(&peer);
    host.open("lecture", &mut engine).unwrap();

    let actions = host.set_background(Some("slide.png".to_owned()), &mut engine).unwrap();

    assert_eq!(
        host.store().record(&ids[0]).and_then(|r| r.background_image_url.clone()),
        Some("slide.png".to_owned())
    );
    assert!(actions.contains(&Action::LoadBackground(Some("slide.png".to_owned()))));
    assert!(actions.iter().any(|a| matches!(a, Action::SendTo(p, frames::Message::SyncBoard { .. }) if *p == peer)));
}

#[test]
fn failed_background_write_leaves_engine_alone() {
    let (mut host, _) = host_with_pages(1);
    let mut engine = display();
    host.open("lecture", &mut engine).unwrap();
    host.store.set_fail_writes(true);
    assert!(host.set_background(Some("x.png".to_owned()), &mut engine).is_err());
    assert_eq!(engine.page().background(), None);
}

#[test]
fn page_change_syncs_writer() {
    let (mut host, _) = host_with_pages(2);
    let mut engine = display();
    let peer = PeerId::new("c");
    engine.on_peer_open(&peer);
    host.open("lecture", &mut engine).unwrap();
    let actions = host.next_page(&mut engine).unwrap();
    assert!(actions.iter().any(|a| matches!(a, Action::SendTo(_, frames::Message::SyncBoard { .. }))));
}
