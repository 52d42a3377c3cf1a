mod common;

use std::path::Path;

use approx::assert_abs_diff_eq;
use common::{snapshot, MockViewer, RecordingEncoder};
use keyreel_core::{
    apply, extract, AnimationSession, AttributeRegistry, Config, Easing, InterpolationKind,
    KeyreelError, LayerInfo, Placement, StopHandle,
};

fn session() -> AnimationSession {
    AnimationSession::new(Config::default()).unwrap()
}

/// Capture start, middle and end with the default 15 steps each.
fn captured(session: &mut AnimationSession, viewer: &mut MockViewer) {
    for name in ["viewer-start", "viewer-middle", "viewer-end"] {
        apply(&snapshot(name), viewer);
        session.capture_keyframe(&*viewer, Placement::Append).unwrap();
    }
}

#[test]
fn extraction_reproduces_fixture() {
    let start = snapshot("viewer-start");
    let viewer = MockViewer::from_snapshot(&start);
    let captured = extract(&viewer, &AttributeRegistry::viewer_default());
    assert_eq!(captured, start);
    assert_eq!(captured.paths(), start.paths());
}

#[test]
fn extraction_tolerates_heterogeneous_layers() {
    let mut viewer = MockViewer::from_snapshot(&snapshot("viewer-start"));
    viewer.layers.push(LayerInfo::new("spots", "points"));
    viewer.values.insert(
        common::path("layers.spots.opacity"),
        keyreel_core::Value::Scalar(0.4),
    );
    // Image-only attributes on a points layer are ignored.
    viewer.values.insert(
        common::path("layers.spots.gamma"),
        keyreel_core::Value::Scalar(2.0),
    );
    let snap = extract(&viewer, &AttributeRegistry::viewer_default());
    assert_eq!(snap.layer_names(), vec!["cells", "spots"]);
    assert!(snap.get(&common::path("layers.spots.opacity")).is_some());
    assert!(snap.get(&common::path("layers.spots.gamma")).is_none());
    assert!(snap.get(&common::path("layers.spots.shear")).is_none());
}

#[test]
fn capture_and_scrub() {
    let mut session = session();
    let mut viewer = MockViewer::from_snapshot(&snapshot("viewer-start"));
    captured(&mut session, &mut viewer);
    assert_eq!(session.store().len(), 3);
    assert_eq!(session.frame_count(), 31);
    assert_eq!(session.current_frame(), 30);

    session.set_to_keyframe(0, &mut viewer).unwrap();
    assert!(viewer.shows(&snapshot("viewer-start")));
    assert_eq!(session.current_frame(), 0);

    session.set_movie_frame_index(-1, &mut viewer).unwrap();
    assert!(viewer.shows(&snapshot("viewer-end")));
    assert_eq!(session.current_frame(), 30);

    session.set_movie_frame_index(15, &mut viewer).unwrap();
    assert!(viewer.shows(&snapshot("viewer-middle")));

    session.set_movie_frame_index(7, &mut viewer).unwrap();
    let expected = (4f64.ln() * 7.0 / 15.0).exp();
    assert_abs_diff_eq!(viewer.scalar("camera.zoom"), expected, epsilon = 1e-12);

    // Re-showing the same frame writes nothing.
    let writes = viewer.writes;
    let report = session.set_movie_frame_index(7, &mut viewer).unwrap();
    assert_eq!(report.written, 0);
    assert_eq!(viewer.writes, writes);

    assert!(matches!(
        session.set_movie_frame_index(31, &mut viewer),
        Err(KeyreelError::IndexOutOfRange { index: 31, len: 31 })
    ));
    assert!(session.set_movie_frame_index(-32, &mut viewer).is_err());
}

#[test]
fn insert_after_and_replace() {
    let mut session = session();
    let mut viewer = MockViewer::from_snapshot(&snapshot("viewer-start"));
    captured(&mut session, &mut viewer);

    apply(&snapshot("viewer-middle"), &mut viewer);
    let kf = session
        .capture_keyframe_with(&viewer, 4, Easing::EASE_IN, Placement::InsertAfter(0))
        .unwrap();
    assert_eq!(kf.position, 1);
    assert_eq!(kf.name, "Key Frame 3");
    assert_eq!(session.store().len(), 4);
    assert_eq!(session.current_frame(), 4);

    apply(&snapshot("viewer-end"), &mut viewer);
    session
        .capture_keyframe(&viewer, Placement::Replace(0))
        .unwrap();
    assert_eq!(session.store().len(), 4);
    assert_eq!(*session.store().get(0).unwrap().snapshot, snapshot("viewer-end"));

    assert!(session
        .capture_keyframe(&viewer, Placement::InsertAfter(9))
        .is_err());
    assert!(session
        .capture_keyframe(&viewer, Placement::Replace(4))
        .is_err());
}

#[test]
fn store_edits_invalidate_scrub_cache() {
    let mut session = session();
    let mut viewer = MockViewer::from_snapshot(&snapshot("viewer-start"));
    captured(&mut session, &mut viewer);

    session.set_movie_frame_index(5, &mut viewer).unwrap();
    let before = viewer.scalar("layers.cells.opacity");
    session.store_mut().update(1, Some(5), None).unwrap();
    session.set_movie_frame_index(5, &mut viewer).unwrap();
    // Frame 5 is now keyframe 1 itself.
    assert_abs_diff_eq!(viewer.scalar("layers.cells.opacity"), 0.5, epsilon = 1e-12);
    assert!(before > 0.5);
}

#[test]
fn config_overrides_reach_captured_rules() {
    let config = Config::from_json_str(
        r#"{ "interpolation_overrides": { "camera.zoom": "default" }, "default_steps": 2 }"#,
    )
    .unwrap();
    let mut session = AnimationSession::new(config).unwrap();
    let viewer = MockViewer::from_snapshot(&snapshot("viewer-start"));
    let kf = session.capture_keyframe(&viewer, Placement::Append).unwrap();
    assert_eq!(kf.steps, 2);
    let zoom = kf.snapshot.get(&common::path("camera.zoom")).unwrap();
    assert_eq!(zoom.interpolation, InterpolationKind::Default);
}

#[test]
fn animate_uses_session_config() {
    let mut config = Config::default();
    config.default_steps = 3;
    config.encoder.fps = 30;
    let mut session = AnimationSession::new(config).unwrap();
    let mut viewer = MockViewer::from_snapshot(&snapshot("viewer-start"));
    captured(&mut session, &mut viewer);

    let mut encoder = RecordingEncoder::default();
    let summary = session
        .animate(
            &mut viewer,
            &mut encoder,
            Path::new("movie.gif"),
            &StopHandle::new(),
            |_| {},
        )
        .unwrap();
    assert_eq!(summary.frames, 7);
    assert_eq!(encoder.frames.len(), 7);
    let (_, options) = encoder.opened.unwrap();
    assert_eq!(options.fps, 30);
    assert_eq!(options.quality, None);
}
