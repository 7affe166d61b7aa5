use chrono::{Duration, Utc};
use egui::{Pos2, pos2};
use ftc_scout::persistence::{self, EncodeQuality, MAX_SAVE_ATTEMPTS};
use ftc_scout::tool::{CANVAS_CLEAR_COLOR, PALETTE};
use ftc_scout::{
    CanvasConfig, CanvasSession, InputEvent, Renderer, SaveStatus, ScoutingStore, SnapshotStore, Tool,
};
use image::{ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;

const TEAM: u32 = 16236;

fn session() -> CanvasSession {
    CanvasSession::new(TEAM, &CanvasConfig::default()).unwrap()
}

// Helper to run one pointer gesture through the session
fn gesture(session: &mut CanvasSession, points: &[Pos2], now: f64) {
    session.handle_event(InputEvent::PointerDown { position: points[0] }, now);
    for &position in &points[1..] {
        session.handle_event(InputEvent::PointerMove { position }, now);
    }
    session.handle_event(InputEvent::PointerUp, now);
}

fn white_png(width: u32, height: u32) -> Vec<u8> {
    let image = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]));
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png).unwrap();
    bytes
}

fn alpha_at(session: &CanvasSession, x: u32, y: u32) -> u8 {
    session.renderer().pixmap().pixel(x, y).unwrap().alpha()
}

#[test]
fn test_gestures_build_history() {
    let mut session = session();
    for i in 0..4 {
        let y = 100.0 + i as f32 * 20.0;
        gesture(&mut session, &[pos2(10.0, y), pos2(200.0, y)], 1.0);
    }
    assert_eq!(session.strokes().len(), 4);
    assert_eq!(session.history().len(), 5);
    assert_eq!(session.history().cursor(), 4);
    assert!(!session.is_drawing());
}

#[test]
fn test_erase_then_undo_then_redo() {
    let mut session = session();

    // A: red pen across (10,10)
    session.set_stroke_width(10);
    gesture(&mut session, &[pos2(0.0, 10.0), pos2(100.0, 10.0)], 0.0);
    // B: eraser over the left part of A
    session.set_tool(Tool::Eraser);
    gesture(&mut session, &[pos2(0.0, 10.0), pos2(40.0, 10.0)], 0.0);
    assert_eq!(alpha_at(&session, 10, 10), 0);

    assert!(session.undo());
    let pixel = session.renderer().pixmap().pixel(10, 10).unwrap();
    assert_eq!(pixel.alpha(), 255);
    assert!(pixel.red() > 200);

    assert!(session.redo());
    assert_eq!(alpha_at(&session, 10, 10), 0);
    // Outside the eraser A is still there
    assert!(session.renderer().pixmap().pixel(80, 10).unwrap().red() > 200);
}

#[test]
fn test_eraser_cuts_through_background_and_grid() {
    let mut session = session();
    session.import_background(&white_png(40, 40)).unwrap();
    session.set_tool(Tool::Eraser);
    // Crosses the grid line at x = 100
    gesture(&mut session, &[pos2(80.0, 130.0), pos2(120.0, 130.0)], 0.0);

    for x in [90, 100, 110] {
        assert_eq!(alpha_at(&session, x, 130), 0);
        assert_eq!(session.renderer().display_color_at(x, 130), Some(CANVAS_CLEAR_COLOR));
    }
}

#[test]
fn test_single_point_gesture_paints_nothing() {
    let mut session = session();
    let before = session.renderer().pixmap().clone();
    session.set_stroke_width(10);
    gesture(&mut session, &[pos2(25.0, 25.0)], 0.0);

    assert_eq!(session.strokes().len(), 1);
    assert_eq!(session.renderer().pixmap().data(), before.data());
}

#[test]
fn test_pointer_leave_commits_stroke() {
    let mut session = session();
    session.handle_event(InputEvent::PointerDown { position: pos2(10.0, 300.0) }, 0.0);
    session.handle_event(InputEvent::PointerMove { position: pos2(60.0, 300.0) }, 0.0);
    session.handle_event(InputEvent::PointerLeave, 0.0);
    assert_eq!(session.strokes().len(), 1);
    assert!(!session.is_drawing());

    // A stray move after leaving starts nothing
    session.handle_event(InputEvent::PointerMove { position: pos2(70.0, 300.0) }, 0.0);
    session.handle_event(InputEvent::PointerUp, 0.0);
    assert_eq!(session.strokes().len(), 1);
}

#[test]
fn test_tool_change_does_not_affect_committed_strokes() {
    let mut session = session();
    gesture(&mut session, &[pos2(10.0, 300.0), pos2(200.0, 300.0)], 0.0);
    session.set_color(PALETTE[1].1);
    session.set_stroke_width(8);

    let stroke = &session.strokes()[0];
    assert_eq!(stroke.color(), PALETTE[0].1);
    assert_eq!(stroke.width(), 3);
}

#[test]
fn test_clear_leaves_single_baseline_and_saves() {
    let mut store = ScoutingStore::new();
    let mut session = session();
    gesture(&mut session, &[pos2(10.0, 300.0), pos2(200.0, 300.0)], 0.0);
    gesture(&mut session, &[pos2(10.0, 320.0), pos2(200.0, 320.0)], 0.0);

    session.clear(5.0);
    assert!(session.strokes().is_empty());
    assert_eq!(session.history().len(), 1);
    assert_eq!(session.history().cursor(), 0);
    assert!(!session.undo());
    assert_eq!(session.renderer().display_color_at(120, 320), Some(CANVAS_CLEAR_COLOR));

    // Clear saves right away
    assert!(session.poll_saves(5.0, &mut store, "").unwrap().is_ok());
    assert!(store.get(TEAM).is_some());
}

#[test]
fn test_background_stroke_export_layer_order() {
    let mut session = session();
    session.import_background(&white_png(120, 80)).unwrap();
    gesture(&mut session, &[pos2(20.0, 200.0), pos2(300.0, 200.0)], 0.0);

    let exported = session.export().unwrap();
    assert_eq!(exported.file_name, format!("team-{}-scouting.png", TEAM));

    let image = image::load_from_memory(&exported.bytes).unwrap().to_rgba8();
    assert_eq!(image.dimensions(), (1200, 800));

    // Clear colour with white at 30% on top
    let background = image.get_pixel(25, 25).0;
    assert!((81..=86).contains(&background[0]));
    assert_eq!(background[3], 255);

    // Grid lines sit above the background and are darker
    let grid = image.get_pixel(49, 25).0[0].min(image.get_pixel(50, 25).0[0]);
    assert!(grid < background[0]);

    // Strokes are on top of both
    let stroke = image.get_pixel(50, 200).0;
    assert!(stroke[0] > 200);
    assert!(stroke[1] < 100);
}

#[test]
fn test_failed_background_import_keeps_previous() {
    let mut session = session();
    session.import_background(&white_png(10, 10)).unwrap();
    let before = session.renderer().pixmap().clone();

    assert!(session.import_background(b"not an image").is_err());
    assert!(session.has_background());
    assert_eq!(session.renderer().pixmap().data(), before.data());
}

#[test]
fn test_save_after_gesture_is_keyed_by_team_and_later() {
    let mut store = ScoutingStore::new();
    let blank = Renderer::new(1200, 800).unwrap();
    let previous = Utc::now() + Duration::hours(1);
    store
        .save_snapshot(
            TEAM,
            &persistence::encode_png(blank.pixmap(), EncodeQuality::Fast).unwrap(),
            "fast intake",
            previous,
        )
        .unwrap();

    let (mut session, notes) = CanvasSession::open(TEAM, &CanvasConfig::default(), &store).unwrap();
    assert_eq!(notes, "fast intake");
    assert!(session.has_prior_snapshot());

    gesture(&mut session, &[pos2(10.0, 300.0), pos2(200.0, 300.0)], 1.0);
    assert_eq!(session.save_status(), &SaveStatus::Pending);
    assert!(session.poll_saves(1.05, &mut store, &notes).is_none());

    let saved_at = session.poll_saves(1.2, &mut store, &notes).unwrap().unwrap();
    assert!(saved_at > previous);

    let record = store.load_snapshot(TEAM).unwrap().unwrap();
    assert_eq!(record.last_modified, saved_at);
    assert_eq!(record.notes, "fast intake");
    let saved = persistence::decode_raster(&record.raster.unwrap()).unwrap();
    assert!(saved.pixel(100, 300).unwrap().red() > 200);
    assert_eq!(store.len(), 1);
}

#[test]
fn test_undecodable_snapshot_starts_blank() {
    let mut store = ScoutingStore::new();
    store.save_snapshot(TEAM, b"garbage", "", Utc::now()).unwrap();

    let (session, _) = CanvasSession::open(TEAM, &CanvasConfig::default(), &store).unwrap();
    assert!(!session.has_prior_snapshot());
    assert_eq!(session.renderer().display_color_at(25, 25), Some(CANVAS_CLEAR_COLOR));
}

#[test]
fn test_restored_snapshot_survives_undo() {
    let mut first = session();
    first.set_stroke_width(10);
    gesture(&mut first, &[pos2(0.0, 10.0), pos2(100.0, 10.0)], 0.0);
    let mut store = ScoutingStore::new();
    first.flush_saves(0.0, &mut store, "").unwrap().unwrap();
    drop(first);

    let (mut second, _) = CanvasSession::open(TEAM, &CanvasConfig::default(), &store).unwrap();
    assert!(second.history().current().is_empty());
    assert!(second.renderer().pixmap().pixel(10, 10).unwrap().red() > 200);

    gesture(&mut second, &[pos2(0.0, 300.0), pos2(100.0, 300.0)], 0.0);
    assert!(second.undo());
    assert!(second.renderer().pixmap().pixel(10, 10).unwrap().red() > 200);
}

#[test]
fn test_quota_failure_is_surfaced_and_keeps_drawing() {
    let mut store = ScoutingStore::new().with_quota(Some(16));
    let mut session = session();
    gesture(&mut session, &[pos2(10.0, 300.0), pos2(200.0, 300.0)], 0.0);

    let mut now = 0.0;
    for _ in 0..MAX_SAVE_ATTEMPTS {
        now += 10.0;
        assert!(session.poll_saves(now, &mut store, "").unwrap().is_err());
    }
    assert!(matches!(session.save_status(), SaveStatus::Failed { .. }));
    assert!(store.is_empty());
    assert_eq!(session.strokes().len(), 1);
    assert_eq!(session.history().cursor(), 1);
}

#[test]
fn test_background_shows_over_restored_drawing() {
    let mut first = session();
    gesture(&mut first, &[pos2(10.0, 310.0), pos2(200.0, 310.0)], 0.0);
    let mut store = ScoutingStore::new();
    first.flush_saves(0.0, &mut store, "").unwrap().unwrap();

    let (mut second, _) = CanvasSession::open(TEAM, &CanvasConfig::default(), &store).unwrap();
    assert!(second.has_prior_snapshot());
    let before = second.renderer().display_color_at(25, 25).unwrap();
    second.import_background(&white_png(40, 40)).unwrap();
    let after = second.renderer().display_color_at(25, 25).unwrap();
    assert_ne!(after, before);
    assert!((81..=86).contains(&after.r()));

    let image = image::load_from_memory(&second.export().unwrap().bytes).unwrap().to_rgba8();
    assert!((81..=86).contains(&image.get_pixel(25, 25).0[0]));
    // The restored stroke is still visible under the tint
    let stroke = image.get_pixel(120, 310).0;
    assert!(stroke[0] > 200);
    assert!(stroke[1] < 150);
}

#[test]
fn test_eraser_across_pen_stroke_then_undo() {
    let mut session = session();
    session.set_stroke_width(10);
    gesture(&mut session, &[pos2(0.0, 0.0), pos2(10.0, 10.0), pos2(20.0, 5.0)], 0.0);
    session.set_tool(Tool::Eraser);
    gesture(&mut session, &[pos2(5.0, 5.0), pos2(15.0, 15.0)], 0.0);

    assert_eq!(session.strokes().len(), 2);
    assert_eq!(session.history().len(), 3);
    assert_eq!(alpha_at(&session, 7, 7), 0);
    assert_eq!(alpha_at(&session, 10, 10), 0);
    // The far end of A is out of the eraser's reach
    let tail = session.renderer().pixmap().pixel(22, 5).unwrap();
    assert_eq!(tail.alpha(), 255);
    assert!(tail.red() > 200);

    assert!(session.undo());
    assert_eq!(session.history().cursor(), 1);
    let pixel = session.renderer().pixmap().pixel(7, 7).unwrap();
    assert_eq!(pixel.alpha(), 255);
    assert!(pixel.red() > 200);
}

#[test]
fn test_live_eraser_cuts_before_release() {
    let mut session = session();
    session.set_stroke_width(10);
    gesture(&mut session, &[pos2(0.0, 10.0), pos2(100.0, 10.0)], 0.0);
    session.take_dirty();

    session.set_tool(Tool::Eraser);
    session.handle_event(InputEvent::PointerDown { position: pos2(0.0, 10.0) }, 0.0);
    session.handle_event(InputEvent::PointerMove { position: pos2(40.0, 10.0) }, 0.0);
    assert!(session.is_drawing());
    assert!(session.take_dirty());
    assert_eq!(alpha_at(&session, 10, 10), 0);
    assert!(session.renderer().pixmap().pixel(80, 10).unwrap().red() > 200);

    session.handle_event(InputEvent::PointerUp, 0.0);
    assert_eq!(alpha_at(&session, 10, 10), 0);
}
