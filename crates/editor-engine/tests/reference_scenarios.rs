//! Worked examples for the editing session.

use flipbook_common::config::AppConfig;
use flipbook_editor_engine::{Action, Editor};
use flipbook_frame_model::{Snapshot, SnapshotDocument, Stroke};
use flipbook_render_engine::compositor::OverlayKind;

const MS: u64 = 1_000_000;

fn drawn(x: f64) -> Snapshot {
    let mut doc = SnapshotDocument::empty(1000.0, 562.5);
    doc.lines
        .push(Stroke::new("#444", 2.0, &[(x, 100.0), (x + 40.0, 180.0)]));
    Snapshot::from_document(&doc).unwrap()
}

#[test]
fn onion_skin_and_keyframe_overlays() {
    let mut editor = Editor::default();
    let a = drawn(10.0);
    let b = drawn(300.0);
    editor.set_frame_data(3, a.clone());
    editor.set_frame_data(5, b.clone());
    editor.dispatch(Action::ToggleKeyframe(5)).unwrap();
    editor.dispatch(Action::SetActiveFrame(4)).unwrap();

    let layers = editor.overlays();
    assert_eq!(layers.len(), 2);

    assert_eq!(
        (layers[0].index, layers[0].opacity, layers[0].kind),
        (3, 0.33, OverlayKind::OnionSkin)
    );
    assert_eq!(layers[0].snapshot, a);

    assert_eq!(
        (layers[1].index, layers[1].opacity, layers[1].kind),
        (5, 0.5, OverlayKind::Keyframe)
    );
    let recolored = layers[1].snapshot.parse().unwrap();
    let original = b.parse().unwrap();
    assert!(recolored.lines.iter().all(|l| l.color == "#facc15"));
    assert_eq!(recolored.lines[0].points, original.lines[0].points);
    assert_eq!(recolored.lines[0].radius, original.lines[0].radius);

    // Overlays never write back.
    assert_eq!(editor.frames()[5], b);
}

#[test]
fn keyframes_are_left_out_of_the_onion_skin() {
    let mut editor = Editor::default();
    editor.set_frame_data(2, drawn(10.0));
    editor.set_frame_data(3, drawn(20.0));
    editor.toggle_keyframe(3).unwrap();
    editor.set_active_frame(4).unwrap();

    let layers = editor.overlays();
    let plan: Vec<(usize, OverlayKind)> = layers.iter().map(|l| (l.index, l.kind)).collect();
    assert_eq!(
        plan,
        vec![(2, OverlayKind::OnionSkin), (3, OverlayKind::Keyframe)]
    );
}

#[test]
fn playback_gate_at_twelve_fps() {
    let mut editor = Editor::default();
    editor
        .dispatch(Action::SetPlaying {
            playing: true,
            now_ns: 0,
        })
        .unwrap();

    assert!(!editor.tick(83 * MS));
    assert_eq!(editor.active_frame(), 0);
    assert!(editor.tick(84 * MS));
    assert_eq!(editor.active_frame(), 1);
}

#[test]
fn playback_rate_is_independent_of_tick_rate() {
    let mut editor = Editor::default();
    editor.set_fps(24).unwrap();
    editor.set_playing(true, 0);

    // A 144 Hz tick source over one second.
    let advances = (1..=144u64)
        .filter(|n| editor.tick(n * 1_000_000_000 / 144))
        .count();
    assert!((20..=24).contains(&advances), "advanced {advances} times");
}

#[test]
fn shrinking_the_sequence() {
    let mut config = AppConfig::default();
    config.editor.frame_count = 12;
    let mut editor = Editor::new(&config).unwrap();
    editor.toggle_keyframe(1).unwrap();
    editor.toggle_keyframe(6).unwrap();
    editor.toggle_keyframe(11).unwrap();
    editor.set_active_frame(9).unwrap();

    editor.dispatch(Action::SetPendingFrameCount(5)).unwrap();
    editor.dispatch(Action::ApplyFrameCount).unwrap();

    assert_eq!(editor.frames().len(), 5);
    assert_eq!(editor.active_frame(), 4);
    assert_eq!(
        editor.store().keyframes().iter().copied().collect::<Vec<_>>(),
        vec![1]
    );
    assert!(!editor.is_playing());
}

#[test]
fn pending_count_is_clamped() {
    let mut editor = Editor::default();
    editor.set_pending_frame_count(0);
    assert_eq!(editor.view().pending_frame_count, 1);
    editor.set_pending_frame_count(500);
    assert_eq!(editor.view().pending_frame_count, 120);
    assert_eq!(editor.num_frames(), 12);
}
