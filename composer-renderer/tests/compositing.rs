//! Compositing Integration Tests
//!
//! Renders real editor sessions and checks pixels:
//! - Stack order (overlap pixel equals the topmost layer)
//! - Blend operators
//! - Single-layer capture at natural resolution
//! - Group capture bounds
//! - Pen selection extraction into a new layer
//! - Text alignment, wrapping, line spacing and case transforms with a real font
//! - Import followed by flatten/export

use std::path::Path;

use composer_core::{
    Background, BlendMode, EditorEvent, EditorSession, ImageAsset, Layer, LayerKind, PointerEvent,
    ShapeKind, TextAlign, TextStyle, TextTransform, Tool, Transform,
};
use composer_renderer::{
    extract_selection_to_layer, import_files, png_data_url, Compositor, ExportFormat, FontBook,
    SessionExporter,
};
use tiny_skia::{Color, Pixmap};

fn rect_layer(x: f32, y: f32, w: f32, h: f32, fill: &str) -> Layer {
    Layer::shape(ShapeKind::Rectangle, fill).with_transform(Transform {
        x,
        y,
        width: w,
        height: h,
        rotation: 0.0,
    })
}

fn rgba(pixmap: &Pixmap, x: u32, y: u32) -> [u8; 4] {
    let c = pixmap.pixel(x, y).expect("pixel in range").demultiply();
    [c.red(), c.green(), c.blue(), c.alpha()]
}

/// Solid-color PNG as a data URL.
fn solid_png(width: u32, height: u32, color: Color) -> String {
    let mut pixmap = Pixmap::new(width, height).expect("pixmap");
    pixmap.fill(color);
    png_data_url(&pixmap).expect("encode")
}

// ============================================================================
// Stack order
// ============================================================================

#[test]
fn test_overlap_pixel_is_topmost_layer() {
    let mut session = EditorSession::with_canvas(100, 100);
    session.add_layer(rect_layer(0.0, 0.0, 60.0, 60.0, "#ff0000"));
    session.add_layer(rect_layer(40.0, 40.0, 60.0, 60.0, "#0000ff"));

    let mut compositor = Compositor::new();
    let out = compositor.flatten(&session, 1.0).expect("flatten");

    assert_eq!(rgba(&out, 50, 50), [0, 0, 255, 255]);
    assert_eq!(rgba(&out, 10, 10), [255, 0, 0, 255]);
    assert_eq!(rgba(&out, 90, 10), [255, 255, 255, 255]);
}

#[test]
fn test_reorder_changes_overlap_winner() {
    let mut session = EditorSession::with_canvas(100, 100);
    let red = session.add_layer(rect_layer(0.0, 0.0, 60.0, 60.0, "#ff0000"));
    session.add_layer(rect_layer(40.0, 40.0, 60.0, 60.0, "#0000ff"));
    assert!(session.reorder_layer(red, composer_core::ReorderDirection::ToFront));

    let mut compositor = Compositor::new();
    let out = compositor.flatten(&session, 1.0).expect("flatten");
    assert_eq!(rgba(&out, 50, 50), [255, 0, 0, 255]);
}

#[test]
fn test_multiply_blend() {
    let mut session = EditorSession::with_canvas(10, 10);
    session.add_layer(rect_layer(0.0, 0.0, 10.0, 10.0, "#ffff00"));
    session.add_layer(
        rect_layer(0.0, 0.0, 10.0, 10.0, "#00ffff").with_blend_mode(BlendMode::Multiply),
    );

    let mut compositor = Compositor::new();
    let out = compositor.flatten(&session, 1.0).expect("flatten");
    assert_eq!(rgba(&out, 5, 5), [0, 255, 0, 255]);
}

// ============================================================================
// Captures
// ============================================================================

#[test]
fn test_capture_layer_uses_natural_resolution() {
    let src = solid_png(80, 40, Color::from_rgba8(0, 200, 0, 255));
    let mut layer = Layer::image(src, 80, 40).with_transform(Transform {
        x: 10.0,
        y: 10.0,
        width: 20.0,
        height: 10.0,
        rotation: 33.0,
    });
    layer.opacity = 100.0;

    let mut compositor = Compositor::new();
    let out = compositor.capture_layer(&layer).expect("capture");
    assert_eq!((out.width(), out.height()), (80, 40));
    assert_eq!(rgba(&out, 0, 0), [0, 200, 0, 255]);
    assert_eq!(rgba(&out, 79, 39), [0, 200, 0, 255]);
}

#[test]
fn test_capture_group_covers_joint_bounds() {
    let layers = vec![
        rect_layer(10.0, 10.0, 20.0, 20.0, "#000000"),
        rect_layer(50.0, 40.0, 10.0, 10.0, "#000000"),
    ];
    let mut compositor = Compositor::new();
    let out = compositor.capture_group(&layers).expect("capture");
    assert_eq!((out.width(), out.height()), (50, 40));
    assert_eq!(rgba(&out, 0, 0)[3], 255);
    assert_eq!(rgba(&out, 30, 5)[3], 0);
}

// ============================================================================
// Region extraction
// ============================================================================

#[test]
fn test_pen_selection_becomes_layer_above_source() {
    let mut session = EditorSession::with_canvas(100, 100);
    let source = session.add_image_layer(ImageAsset::new(
        solid_png(100, 100, Color::from_rgba8(255, 0, 0, 255)),
        100,
        100,
    ));
    session.dispatch(EditorEvent::SetTool(Tool::Pen));
    for (x, y) in [(20.0, 20.0), (60.0, 20.0), (60.0, 50.0), (20.0, 50.0)] {
        session.dispatch(PointerEvent::down(x, y).into());
        session.dispatch(PointerEvent::up(x, y).into());
    }
    session.dispatch(EditorEvent::ClosePenPath);
    assert!(session.selection_path().is_some());

    let mut compositor = Compositor::new();
    let before = session.history_len();
    let region = extract_selection_to_layer(&mut session, &mut compositor).expect("extract");

    assert_eq!(session.history_len(), before + 1);
    assert_eq!(session.layers()[0].id, region);
    assert_eq!(session.layers()[1].id, source);
    assert!(session.selection_path().is_none());

    let layer = session.layer(region).expect("region layer");
    assert!((layer.transform.x - 20.0).abs() < 0.5);
    assert!((layer.transform.width - 40.0).abs() < 0.5);
    let LayerKind::Image { natural_width, natural_height, .. } = layer.kind else {
        panic!("region should be an image layer");
    };
    assert_eq!((natural_width, natural_height), (40, 30));

    // Undo removes the region again.
    assert!(session.undo());
    assert!(session.layer(region).is_none());
}

// ============================================================================
// Text
// ============================================================================

/// DejaVu Sans (Bitstream Vera license, see `tests/fixtures/DejaVuSans-LICENSE.txt`).
fn fixture_compositor() -> Compositor {
    let mut fonts = FontBook::new();
    fonts
        .load_fallback_file(&Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/DejaVuSans.ttf"))
        .expect("fixture font");
    Compositor::with_fonts(fonts)
}

fn text_style(content: &str, font_size: f32, align: TextAlign) -> TextStyle {
    TextStyle {
        content: content.to_string(),
        font_size,
        align,
        color: "#000000".to_string(),
        ..TextStyle::default()
    }
}

/// Flatten one text layer at the origin of a transparent canvas.
fn render_text(style: TextStyle, width: f32, height: f32) -> Pixmap {
    let mut session = EditorSession::with_canvas(width as u32, height as u32);
    session.set_background(Background::Transparent);
    session.add_layer(Layer::text(style).with_transform(Transform {
        x: 0.0,
        y: 0.0,
        width,
        height,
        rotation: 0.0,
    }));
    fixture_compositor().flatten(&session, 1.0).expect("flatten")
}

fn inked(pixmap: &Pixmap) -> impl Iterator<Item = (u32, u32)> + '_ {
    (0..pixmap.height()).flat_map(move |y| {
        (0..pixmap.width()).filter_map(move |x| {
            (pixmap.pixel(x, y).expect("pixel").alpha() > 0).then_some((x, y))
        })
    })
}

/// Leftmost and rightmost inked columns.
fn ink_columns(pixmap: &Pixmap) -> (u32, u32) {
    inked(pixmap).fold((u32::MAX, 0), |(lo, hi), (x, _)| (lo.min(x), hi.max(x)))
}

/// Topmost and bottommost inked rows.
fn ink_rows(pixmap: &Pixmap) -> (u32, u32) {
    inked(pixmap).fold((u32::MAX, 0), |(lo, hi), (_, y)| (lo.min(y), hi.max(y)))
}

fn has_ink_in_rows(pixmap: &Pixmap, rows: std::ops::Range<u32>) -> bool {
    inked(pixmap).any(|(_, y)| rows.contains(&y))
}

#[test]
fn test_text_alignment_places_ink() {
    let left = ink_columns(&render_text(text_style("Hi", 24.0, TextAlign::Left), 100.0, 40.0));
    let center = ink_columns(&render_text(text_style("Hi", 24.0, TextAlign::Center), 100.0, 40.0));
    let right = ink_columns(&render_text(text_style("Hi", 24.0, TextAlign::Right), 100.0, 40.0));

    assert!(left.0 <= 5, "left-aligned ink starts at {}", left.0);
    assert!(right.1 >= 94, "right-aligned ink ends at {}", right.1);
    assert!(left.0 < center.0 && center.0 < right.0);

    let margin_left = i64::from(center.0);
    let margin_right = 99 - i64::from(center.1);
    assert!(
        (margin_left - margin_right).abs() <= 3,
        "centered ink {center:?} is off-center"
    );

    // Alignment moves the run without changing it.
    let span = |(lo, hi): (u32, u32)| hi - lo;
    assert!(span(left).abs_diff(span(center)) <= 2);
    assert!(span(left).abs_diff(span(right)) <= 2);
}

#[test]
fn test_text_wraps_onto_second_line() {
    // 20px font, 1.2 line height: line bands are 0..24 and 24..48.
    let narrow = render_text(text_style("word word", 20.0, TextAlign::Left), 80.0, 80.0);
    assert!(has_ink_in_rows(&narrow, 0..24));
    assert!(has_ink_in_rows(&narrow, 24..48));
    assert!(!has_ink_in_rows(&narrow, 48..80));

    let wide = render_text(text_style("word word", 20.0, TextAlign::Left), 200.0, 80.0);
    assert!(has_ink_in_rows(&wide, 0..24));
    assert!(!has_ink_in_rows(&wide, 24..80));
}

#[test]
fn test_line_height_spaces_lines() {
    let mut spaced = text_style("word word", 20.0, TextAlign::Left);
    spaced.line_height = 2.0;
    // Bands are now 0..40 and 40..80.
    let out = render_text(spaced, 80.0, 100.0);
    assert!(has_ink_in_rows(&out, 0..40));
    assert!(has_ink_in_rows(&out, 40..80));
    assert!(!has_ink_in_rows(&out, 30..44));
    assert!(!has_ink_in_rows(&out, 80..100));
}

#[test]
fn test_uppercase_transform_draws_capitals() {
    let lower = render_text(text_style("ace", 40.0, TextAlign::Left), 120.0, 60.0);
    let mut caps = text_style("ace", 40.0, TextAlign::Left);
    caps.text_transform = TextTransform::Uppercase;
    let upper = render_text(caps, 120.0, 60.0);

    // Cap height is well above x-height at 40px.
    let (lower_top, lower_bottom) = ink_rows(&lower);
    let (upper_top, upper_bottom) = ink_rows(&upper);
    assert!(upper_top + 4 <= lower_top, "caps top {upper_top}, lowercase top {lower_top}");
    assert!(upper_bottom.abs_diff(lower_bottom) <= 2);
}

#[test]
fn test_missing_font_skips_text_only() {
    let mut session = EditorSession::with_canvas(50, 50);
    session.set_background(Background::Transparent);
    session.add_layer(rect_layer(0.0, 0.0, 10.0, 10.0, "#ff0000"));
    session.add_layer(Layer::text(text_style("Hi", 24.0, TextAlign::Left)));

    let out = Compositor::new().flatten(&session, 1.0).expect("flatten");
    assert_eq!(rgba(&out, 5, 5), [255, 0, 0, 255]);
    assert_eq!(inked(&out).count(), 100);
}

// ============================================================================
// Import and export
// ============================================================================

#[test]
fn test_import_then_export_png() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("photo.png");
    let mut pixmap = Pixmap::new(300, 200).expect("pixmap");
    pixmap.fill(Color::from_rgba8(10, 20, 30, 255));
    pixmap.save_png(&path).expect("save");

    let mut session = EditorSession::default();
    import_files(&mut session, &[&path]).expect("import");
    assert_eq!((session.canvas().width, session.canvas().height), (300, 200));

    let mut compositor = Compositor::new();
    let png = SessionExporter::with_defaults()
        .export(&mut compositor, &session, ExportFormat::Png)
        .expect("export");
    let decoded = composer_renderer::decode_image(&png).expect("decode");
    assert_eq!((decoded.width, decoded.height), (300, 200));
    assert_eq!(&decoded.data[..4], &[10, 20, 30, 255]);
}
