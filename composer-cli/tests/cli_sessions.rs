//! CLI Session Tests
//!
//! Exercises the subcommand functions over real files:
//! - New session documents
//! - Import + flatten to PNG and JPEG
//! - Layer capture at natural resolution
//! - Pen extraction saved back to the document
//! - Generation results applied as one undo step

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use composer_ai::{GenerationError, GenerationRequest, GenerationResult, ImageGenerator};
use composer_cli::{commands, CliArgs};
use composer_core::{Background, EditorConfig, EditorSession, LayerKind, ShapeKind};
use composer_renderer::{Compositor, ExportFormat, SessionExporter};

/// Generator that returns canned images, or fails with an empty result.
struct StaticGenerator(Option<Vec<String>>);

#[async_trait]
impl ImageGenerator for StaticGenerator {
    async fn generate(&self, _request: GenerationRequest) -> GenerationResult<Vec<String>> {
        self.0.clone().ok_or(GenerationError::EmptyResult)
    }
}

fn solid_session(width: u32, height: u32, fill: &str) -> EditorSession {
    let mut session = EditorSession::with_canvas(width, height);
    session.set_background(Background::Solid(fill.to_string()));
    session
}

fn solid_png_file(path: &Path, width: u32, height: u32, fill: &str) {
    let bytes = SessionExporter::with_defaults()
        .export(&mut Compositor::new(), &solid_session(width, height, fill), ExportFormat::Png)
        .expect("export");
    std::fs::write(path, bytes).expect("write png");
}

fn run(args: &[&str]) -> anyhow::Result<()> {
    use clap::Parser;
    let mut argv = vec!["layer-composer"];
    argv.extend_from_slice(args);
    let args = CliArgs::try_parse_from(argv)?;
    tokio::runtime::Runtime::new()?.block_on(commands::run(args))
}

fn path_str(path: &Path) -> &str {
    path.to_str().expect("utf-8 path")
}

fn open(path: &Path) -> EditorSession {
    commands::open_session(path, EditorConfig::default()).expect("open session")
}

fn imported_session(dir: &Path) -> PathBuf {
    let photo = dir.join("photo.png");
    solid_png_file(&photo, 120, 80, "#ff0000");
    let session = dir.join("session.json");
    run(&["import", path_str(&session), path_str(&photo)]).expect("import");
    session
}

// ============================================================================
// Documents
// ============================================================================

#[test]
fn test_new_session_document() {
    let dir = tempfile::tempdir().expect("tempdir");
    let session = dir.path().join("blank.json");
    run(&[
        "new",
        path_str(&session),
        "--width",
        "640",
        "--height",
        "480",
        "--background",
        "transparent",
    ])
    .expect("new");

    let opened = open(&session);
    assert_eq!((opened.canvas().width, opened.canvas().height), (640, 480));
    assert_eq!(opened.canvas().background, Background::Transparent);
    assert!(opened.layers().is_empty());
}

#[test]
fn test_sized_canvas_survives_first_import() {
    let dir = tempfile::tempdir().expect("tempdir");
    let session = dir.path().join("sized.json");
    run(&["new", path_str(&session), "--width", "800", "--height", "600"]).expect("new");

    let photo = dir.path().join("photo.png");
    solid_png_file(&photo, 64, 32, "#ff0000");
    run(&["import", path_str(&session), path_str(&photo)]).expect("import");

    let opened = open(&session);
    assert_eq!((opened.canvas().width, opened.canvas().height), (800, 600));
    assert_eq!(opened.layers().len(), 1);
}

#[test]
fn test_unsized_new_session_takes_first_image_size() {
    let dir = tempfile::tempdir().expect("tempdir");
    let session = dir.path().join("unsized.json");
    run(&["new", path_str(&session)]).expect("new");

    let photo = dir.path().join("photo.png");
    solid_png_file(&photo, 64, 32, "#ff0000");
    run(&["import", path_str(&session), path_str(&photo)]).expect("import");

    let opened = open(&session);
    assert_eq!((opened.canvas().width, opened.canvas().height), (64, 32));
}

#[test]
fn test_missing_session_is_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let missing = dir.path().join("missing.json");
    let out = dir.path().join("out.png");
    assert!(run(&["flatten", path_str(&missing), path_str(&out)]).is_err());
}

// ============================================================================
// Import / flatten / capture
// ============================================================================

#[test]
fn test_import_sets_canvas_and_flattens() {
    let dir = tempfile::tempdir().expect("tempdir");
    let session = imported_session(dir.path());

    let opened = open(&session);
    assert_eq!(opened.layers().len(), 1);
    assert_eq!((opened.canvas().width, opened.canvas().height), (120, 80));

    let png = dir.path().join("flat.png");
    run(&["flatten", path_str(&session), path_str(&png), "--scale", "0.5"]).expect("flatten");
    let decoded = composer_renderer::decode_image(&std::fs::read(&png).expect("read")).expect("decode");
    assert_eq!((decoded.width, decoded.height), (60, 40));

    let jpg = dir.path().join("flat.jpg");
    run(&["flatten", path_str(&session), path_str(&jpg)]).expect("flatten jpeg");
    assert_eq!(&std::fs::read(&jpg).expect("read")[..2], &[0xFF, 0xD8]);

    let gif = dir.path().join("flat.gif");
    assert!(run(&["flatten", path_str(&session), path_str(&gif)]).is_err());
}

#[test]
fn test_capture_single_layer() {
    let dir = tempfile::tempdir().expect("tempdir");
    let session = imported_session(dir.path());
    let id = open(&session).layers()[0].id.to_string();

    let out = dir.path().join("layer.png");
    run(&["capture", path_str(&session), path_str(&out), &id]).expect("capture");
    let decoded = composer_renderer::decode_image(&std::fs::read(&out).expect("read")).expect("decode");
    assert_eq!((decoded.width, decoded.height), (120, 80));

    assert!(run(&["capture", path_str(&session), path_str(&out), "not-an-id"]).is_err());
}

// ============================================================================
// Extract
// ============================================================================

#[test]
fn test_extract_adds_region_layer() {
    let dir = tempfile::tempdir().expect("tempdir");
    let session = imported_session(dir.path());
    let source = open(&session).layers()[0].id;

    run(&[
        "extract",
        path_str(&session),
        &source.to_string(),
        "10,10",
        "50,10",
        "50,40",
        "10,40",
    ])
    .expect("extract");

    let opened = open(&session);
    assert_eq!(opened.layers().len(), 2);
    assert_eq!(opened.layers()[1].id, source);
    let LayerKind::Image { natural_width, natural_height, .. } = &opened.layers()[0].kind else {
        panic!("region should be an image layer");
    };
    assert_eq!((*natural_width, *natural_height), (40, 30));
}

#[test]
fn test_extract_refuses_non_image() {
    let mut session = EditorSession::with_canvas(100, 100);
    let shape = session.add_shape_layer(ShapeKind::Rectangle, "#000000");
    let mut compositor = Compositor::new();
    let points = ["1,1", "50,1", "50,50"].map(String::from);
    assert!(commands::extract(&mut session, &mut compositor, &shape.to_string(), &points).is_err());
    assert_eq!(session.layers().len(), 1);
}

// ============================================================================
// Generate
// ============================================================================

#[tokio::test]
async fn test_generated_images_are_one_undo_step() {
    let mut session = EditorSession::with_canvas(64, 64);
    session.add_shape_layer(ShapeKind::Ellipse, "#00ff00");
    let before = session.history_len();

    let url = SessionExporter::with_defaults()
        .export_data_url(&mut Compositor::new(), &solid_session(32, 32, "#0000ff"), ExportFormat::Png)
        .expect("data url");
    let generator = StaticGenerator(Some(vec![url.clone(), url]));

    let changed = commands::generate(&mut session, &generator, GenerationRequest::new("x"))
        .await
        .expect("generate");
    assert!(changed);
    assert_eq!(session.layers().len(), 3);
    assert_eq!(session.history_len(), before + 1);

    assert!(session.undo());
    assert_eq!(session.layers().len(), 1);
}

#[tokio::test]
async fn test_failed_generation_leaves_session_untouched() {
    let mut session = EditorSession::with_canvas(64, 64);
    session.add_shape_layer(ShapeKind::Ellipse, "#00ff00");
    let before = session.history_len();

    let generator = StaticGenerator(None);
    let result = commands::generate(&mut session, &generator, GenerationRequest::new("x")).await;

    assert!(result.is_err());
    assert_eq!(session.layers().len(), 1);
    assert_eq!(session.history_len(), before);
}

#[test]
fn test_generate_without_endpoint_fails_early() {
    let dir = tempfile::tempdir().expect("tempdir");
    let session = imported_session(dir.path());
    let preset = dir.path().join("preset.json");
    let result = run(&[
        "--ai-url",
        "",
        "generate",
        path_str(&session),
        "--prompt",
        "paint it",
        "--save-preset",
        path_str(&preset),
    ]);
    assert!(result.is_err());

    let saved = composer_core::Preset::from_json(&std::fs::read_to_string(&preset).expect("read"))
        .expect("preset");
    assert_eq!(saved.prompt(), Some("paint it"));
    assert_eq!(open(&session).layers().len(), 1);
}
