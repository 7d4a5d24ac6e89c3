mod common;

use egui::{Color32, Pos2, Vec2, pos2};
use image::Rgba;
use shake_report::session::SessionState;
use shake_report::{AnnotationSession, PointerEvent, RecordFile, SessionError, ToolKind};

fn stroke(session: &mut AnnotationSession, points: &[Pos2]) {
    session.pointer(PointerEvent::Down(points[0])).unwrap();
    for point in &points[1..] {
        session.pointer(PointerEvent::Move(*point)).unwrap();
    }
    session.pointer(PointerEvent::Up(*points.last().unwrap())).unwrap();
}

fn wide_session() -> AnnotationSession {
    AnnotationSession::open(common::screenshot(400, 200), Vec2::new(300.0, 300.0), &[]).unwrap()
}

#[test]
fn test_composite_aligns_with_image_content() {
    let mut session = wide_session();
    // Center of the container is the center of the image.
    stroke(&mut session, &[pos2(150.0, 150.0)]);
    // Top-left corner of the displayed rect.
    stroke(&mut session, &[pos2(2.0, 77.0)]);

    let outcome = session.finish().unwrap();
    let image = outcome.image;
    assert_eq!(image.dimensions(), (400, 200));

    assert_eq!(*image.get_pixel(200, 100), Rgba([255, 0, 0, 255]));
    assert_eq!(*image.get_pixel(2, 2), Rgba([255, 0, 0, 255]));
    // Pen width 4 scales to about 5.3 image pixels.
    assert_eq!(*image.get_pixel(200, 90), Rgba([240, 240, 240, 255]));
    assert_eq!(*image.get_pixel(390, 190), Rgba([240, 240, 240, 255]));
}

#[test]
fn test_tall_image_composite() {
    let mut session =
        AnnotationSession::open(common::screenshot(200, 400), Vec2::new(300.0, 300.0), &[]).unwrap();
    stroke(&mut session, &[pos2(76.0, 1.0), pos2(76.0, 299.0)]);

    let image = session.finish().unwrap().image;
    // x = (76 - 75) * 4/3 in image space, full height.
    assert_eq!(image.get_pixel(1, 10)[0], 255);
    assert_eq!(image.get_pixel(1, 390)[0], 255);
    assert_eq!(image.get_pixel(1, 10)[1], 0);
    assert_eq!(image.get_pixel(100, 200)[1], 240);
}

#[test]
fn test_strokes_in_letterbox_are_clipped() {
    let mut session = wide_session();
    stroke(&mut session, &[pos2(10.0, 5.0), pos2(290.0, 5.0)]);

    let outcome = session.finish().unwrap();
    assert_eq!(outcome.records.len(), 1);
    assert!(outcome.image.pixels().all(|p| *p == Rgba([240, 240, 240, 255])));
}

#[test]
fn test_highlighter_blends_with_screenshot() {
    let mut session = wide_session();
    session.select_tool(ToolKind::Highlighter).unwrap();
    session.set_hue(Color32::from_rgb(0, 0, 0)).unwrap();
    stroke(&mut session, &[pos2(100.0, 150.0), pos2(200.0, 150.0)]);

    let image = session.finish().unwrap().image;
    let pixel = image.get_pixel(200, 100);
    // 240 * 0.4 over black at 60% opacity
    assert!((90..=100).contains(&pixel[0]), "got {:?}", pixel);
    assert_eq!(pixel[3], 255);
}

#[test]
fn test_undo_then_clear_flow() {
    let mut session = wide_session();
    stroke(&mut session, &[pos2(10.0, 100.0), pos2(20.0, 100.0)]);
    stroke(&mut session, &[pos2(10.0, 120.0), pos2(20.0, 120.0)]);

    assert!(session.undo().unwrap().is_some());
    assert_eq!(session.records().len(), 1);

    let request = session.request_clear_all().unwrap();
    session.clear_all(request).unwrap();
    assert!(session.records().is_empty());
    assert!(session.undo().unwrap().is_none());

    // The editing view carries nothing over from cleared strokes.
    let preview = session.preview().unwrap();
    let pixel = preview.get_pixel(15, 100);
    assert!(pixel[1] > 200 && pixel[2] > 200, "stale stroke pixel {:?}", pixel);
    assert_eq!(session.state(), SessionState::Open);
}

#[test]
fn test_resume_from_saved_records() {
    let mut first = wide_session();
    stroke(&mut first, &[pos2(40.0, 100.0), pos2(60.0, 140.0), pos2(90.0, 120.0)]);
    first.select_tool(ToolKind::Highlighter).unwrap();
    stroke(&mut first, &[pos2(100.0, 200.0), pos2(250.0, 200.0)]);
    let outcome = first.finish().unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("annotations.json");
    outcome.record_file().save(&path).unwrap();
    let loaded = RecordFile::load(&path).unwrap();

    assert_eq!(loaded.records, outcome.records);
    assert_eq!(loaded.canvas_size(), Vec2::new(300.0, 300.0));

    let mut second =
        AnnotationSession::open(common::screenshot(400, 200), loaded.canvas_size(), &loaded.records).unwrap();
    assert_eq!(second.records(), outcome.records);

    let resumed = second.finish().unwrap();
    assert_eq!(resumed.image, outcome.image);
}

#[test]
fn test_finished_session_rejects_everything() {
    let mut session = wide_session();
    session.finish().unwrap();

    assert!(matches!(
        session.select_tool(ToolKind::Pen),
        Err(SessionError::InvalidTransition { .. })
    ));
    assert!(session.set_hue(Color32::BLUE).is_err());
    assert!(session.preview().is_err());
    assert!(session.finish().is_err());
}
