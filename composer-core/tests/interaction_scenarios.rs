//! Interaction Scenario Tests
//!
//! Drives an `EditorSession` through full pointer gestures:
//! - Default text layer placement
//! - Drag coalescing into one history entry
//! - Snap convergence on release
//! - Duplicate-move (alt-drag)
//! - Marquee selection
//! - Group resize and rotated single-layer resize
//! - Locked layer immunity
//! - Undo/redo round-trips

use composer_core::{
    ComposerError, EditorEvent, EditorSession, KeyModifiers, Layer, LayerId, LayerKind,
    LayerStack, PointerEvent, ShapeKind, Transform, DEFAULT_TEXT,
};

fn down(x: f32, y: f32) -> EditorEvent {
    PointerEvent::down(x, y).into()
}

fn down_with(x: f32, y: f32, modifiers: KeyModifiers) -> EditorEvent {
    PointerEvent::down(x, y).with_modifiers(modifiers).into()
}

fn moved(x: f32, y: f32) -> EditorEvent {
    PointerEvent::moved(x, y).into()
}

fn up(x: f32, y: f32) -> EditorEvent {
    PointerEvent::up(x, y).into()
}

fn rect_layer(x: f32, y: f32, width: f32, height: f32) -> Layer {
    Layer::shape(ShapeKind::Rectangle, "#336699").with_transform(Transform {
        x,
        y,
        width,
        height,
        rotation: 0.0,
    })
}

/// Canvas 1000x1000 with A = (100,100 200x100) below B = (500,600 100x100).
fn two_boxes() -> (EditorSession, LayerId, LayerId) {
    let mut session = EditorSession::with_canvas(1000, 1000);
    let a = session.add_layer(rect_layer(100.0, 100.0, 200.0, 100.0));
    let b = session.add_layer(rect_layer(500.0, 600.0, 100.0, 100.0));
    session.deselect();
    (session, a, b)
}

fn x_of(session: &EditorSession, id: LayerId) -> f32 {
    session.layer(id).expect("layer exists").transform.x
}

// ============================================================================
// Text Layer Defaults
// ============================================================================

#[test]
fn test_new_text_layer_on_empty_canvas() {
    let mut session = EditorSession::with_canvas(1024, 1024);
    let id = session.add_text_layer();

    assert_eq!(session.layers().len(), 1);
    let layer = session.layer(id).expect("text layer");
    match &layer.kind {
        LayerKind::Text(style) => assert_eq!(style.content, DEFAULT_TEXT),
        other => panic!("expected text layer, got {other:?}"),
    }
    assert!((layer.transform.x + layer.transform.width / 2.0 - 512.0).abs() < f32::EPSILON);
    assert!(layer.visible);
    assert!(!layer.locked);
    assert!(session.is_canvas_initialized());
}

// ============================================================================
// Move & History
// ============================================================================

#[test]
fn test_drag_coalesces_into_one_entry() {
    let (mut session, a, _) = two_boxes();
    let before = session.history_len();

    session.dispatch(down(150.0, 150.0));
    for step in 1..=25 {
        #[allow(clippy::cast_precision_loss)]
        let offset = step as f32 * 2.0;
        session.dispatch(moved(150.0 + offset, 150.0 + offset));
    }
    session.dispatch(up(200.0, 200.0));

    assert_eq!(session.history_len(), before + 1);
    assert!((x_of(&session, a) - 150.0).abs() < f32::EPSILON);
    assert!(session.interaction().is_idle());
}

#[test]
fn test_click_without_drag_records_nothing() {
    let (mut session, _, _) = two_boxes();
    let before = session.history_len();
    session.dispatch(down(150.0, 150.0));
    session.dispatch(up(150.0, 150.0));
    assert_eq!(session.history_len(), before);
}

#[test]
fn test_snap_converges_edges_exactly() {
    let (mut session, a, b) = two_boxes();

    session.dispatch(down(550.0, 650.0));
    // Proposed left edge of B lands at 303; A's right edge is 300.
    session.dispatch(moved(353.0, 650.0));
    assert_eq!(session.snap_lines().len(), 1);
    session.dispatch(up(353.0, 650.0));

    let a_right = {
        let t = session.layer(a).expect("a").transform;
        t.x + t.width
    };
    assert_eq!(x_of(&session, b), a_right);
    assert!(session.snap_lines().is_empty());
}

#[test]
fn test_undo_redo_restores_exact_stacks() {
    let (mut session, a, _) = two_boxes();
    let mut snapshots: Vec<LayerStack> = vec![session.stack().clone()];

    session.dispatch(down(150.0, 150.0));
    session.dispatch(moved(180.0, 170.0));
    session.dispatch(up(180.0, 170.0));
    snapshots.push(session.stack().clone());

    session.set_layer_opacity(a, 40.0);
    snapshots.push(session.stack().clone());

    session.add_text_layer();
    snapshots.push(session.stack().clone());

    for expected in snapshots.iter().rev().skip(1) {
        assert!(session.undo());
        assert_eq!(session.stack(), expected);
    }
    for expected in snapshots.iter().skip(1) {
        assert!(session.redo());
        assert_eq!(session.stack(), expected);
    }
    assert!(!session.redo());
}

// ============================================================================
// Duplicate-Move
// ============================================================================

#[test]
fn test_alt_click_without_move_creates_nothing() {
    let (mut session, _, _) = two_boxes();
    let before = session.history_len();
    session.dispatch(down_with(150.0, 150.0, KeyModifiers::ALT));
    session.dispatch(up(150.0, 150.0));
    assert_eq!(session.layers().len(), 2);
    assert_eq!(session.history_len(), before);
}

#[test]
fn test_alt_drag_duplicates_lazily() {
    let (mut session, a, _) = two_boxes();
    let before = session.history_len();

    session.dispatch(down_with(150.0, 150.0, KeyModifiers::ALT));
    assert_eq!(session.layers().len(), 2);

    session.dispatch(moved(170.0, 230.0));
    session.dispatch(moved(190.0, 260.0));
    session.dispatch(up(190.0, 260.0));

    assert_eq!(session.layers().len(), 3);
    assert_eq!(session.history_len(), before + 1);
    assert!((x_of(&session, a) - 100.0).abs() < f32::EPSILON);

    let copy = session.selection().single().expect("copy selected");
    assert_ne!(copy, a);
    assert!((x_of(&session, copy) - 140.0).abs() < f32::EPSILON);
    assert_eq!(
        session.stack().index_of(copy).map(|i| i + 1),
        session.stack().index_of(a)
    );

    assert!(session.undo());
    assert_eq!(session.layers().len(), 2);
}

// ============================================================================
// Marquee & Resize
// ============================================================================

#[test]
fn test_marquee_selects_intersecting_layers() {
    let (mut session, a, b) = two_boxes();

    session.dispatch(down(50.0, 50.0));
    session.dispatch(moved(320.0, 220.0));
    session.dispatch(up(320.0, 220.0));
    assert_eq!(session.selection().ids(), &[a]);

    session.dispatch(down_with(450.0, 550.0, KeyModifiers::SHIFT));
    session.dispatch(moved(650.0, 750.0));
    session.dispatch(up(650.0, 750.0));
    assert_eq!(session.selection().ids(), &[b, a]);
}

#[test]
fn test_group_resize_scales_rigidly() {
    let (mut session, a, b) = two_boxes();
    session.select_all();
    assert_eq!(session.selection().len(), 2);

    // Bottom-right handle of the group box (100,100)-(600,700).
    session.dispatch(down(600.0, 700.0));
    session.dispatch(moved(1100.0, 700.0));
    session.dispatch(up(1100.0, 700.0));

    let ta = session.layer(a).expect("a").transform;
    let tb = session.layer(b).expect("b").transform;
    assert!((ta.x - 100.0).abs() < 1e-3);
    assert!((ta.width - 400.0).abs() < 1e-3);
    assert!((tb.x - 900.0).abs() < 1e-3);
    assert!((tb.width - 200.0).abs() < 1e-3);
    assert!((tb.height - 100.0).abs() < 1e-3);
}

#[test]
fn test_rotated_layer_resize_pivots_on_opposite_edge() {
    let mut session = EditorSession::with_canvas(1000, 1000);
    let id = session.add_layer(Layer::shape(ShapeKind::Rectangle, "#336699").with_transform(
        Transform {
            x: 400.0,
            y: 450.0,
            width: 200.0,
            height: 100.0,
            rotation: 90.0,
        },
    ));
    let before = session.selection_bounds().expect("selected");
    assert!((before.x - 450.0).abs() < 1e-3);
    assert!((before.width - 100.0).abs() < 1e-3);
    assert!((before.height - 200.0).abs() < 1e-3);

    // Right handle of the on-screen box, dragged 100px to the right.
    session.dispatch(down(550.0, 500.0));
    session.dispatch(moved(650.0, 500.0));
    session.dispatch(up(650.0, 500.0));

    let after = session.selection_bounds().expect("still selected");
    assert!((after.x - 450.0).abs() < 1e-2, "left edge moved to {}", after.x);
    assert!((after.width - 200.0).abs() < 1e-2, "width is {}", after.width);
    assert!((after.y - 400.0).abs() < 1e-2);
    assert!((after.height - 200.0).abs() < 1e-2, "height is {}", after.height);

    let t = session.layer(id).expect("layer").transform;
    assert!((t.width - 200.0).abs() < 1e-2);
    assert!((t.height - 200.0).abs() < 1e-2);
    assert!((t.rotation - 90.0).abs() < f32::EPSILON);
}

// ============================================================================
// Locked Layers
// ============================================================================

#[test]
fn test_locked_layer_is_immune() {
    let (mut session, a, _) = two_boxes();
    session.set_layer_locked(a, true);
    let locked = session.stack().clone();

    // Click passes through to empty canvas.
    session.dispatch(down(150.0, 150.0));
    session.dispatch(moved(250.0, 250.0));
    session.dispatch(up(250.0, 250.0));
    assert!(session.selection().is_empty());
    assert_eq!(session.stack(), &locked);

    // Marquee over it selects nothing.
    session.dispatch(down(50.0, 50.0));
    session.dispatch(moved(320.0, 220.0));
    session.dispatch(up(320.0, 220.0));
    assert!(session.selection().is_empty());

    // Selecting it directly is refused, so resize/rotate cannot start.
    assert!(matches!(
        session.select(a, false),
        Err(ComposerError::LayerLocked(_))
    ));
    session.dispatch(down(300.0, 200.0));
    session.dispatch(moved(400.0, 300.0));
    session.dispatch(up(400.0, 300.0));
    assert_eq!(session.stack(), &locked);
}

#[test]
fn test_locking_selected_layer_deselects_it() {
    let (mut session, a, b) = two_boxes();
    session.select_all();
    session.set_layer_locked(a, true);
    assert_eq!(session.selection().ids(), &[b]);

    session.select_all();
    assert_eq!(session.selection().ids(), &[b]);
}
