//! Subcommand implementations.

use std::path::Path;

use anyhow::{bail, Context, Result};
use composer_ai::{
    GenerationOutcome, GenerationRequest, HttpGeneratorConfig, HttpImageGenerator, ImageGenerator,
    JobSlots,
};
use composer_core::{
    Background, EditorConfig, EditorEvent, EditorSession, LayerId, Point, PointerEvent, Preset,
    SessionDocument, Tool,
};
use composer_renderer::{
    asset_from_data_url, encode_png, extract_selection_to_layer, import_files, png_data_url,
    Compositor, ExportConfig, ExportFormat, FontBook, SessionExporter,
};

use crate::{CliArgs, CliConfig, Command};

/// Job slot used for whole-canvas generations.
pub const CANVAS_SLOT: &str = "canvas";

/// App id written into presets saved from the command line.
const CLI_APP_ID: &str = "layer-composer";

/// Run a parsed command line.
///
/// # Errors
///
/// Returns an error if the command fails; the session file is only
/// rewritten after a successful edit.
pub async fn run(args: CliArgs) -> Result<()> {
    let command = args.command.clone();
    let config = CliConfig::from(args);
    let editor = load_editor_config(config.config_path.as_deref())?;

    match command {
        Command::New {
            session,
            width,
            height,
            background,
        } => new_session(&session, editor, width, height, background),
        Command::Layers { session } => {
            let session = open_session(&session, editor)?;
            println!("{}", serde_json::to_string_pretty(session.layers())?);
            Ok(())
        }
        Command::Import { session: path, files } => {
            let mut session = open_or_create_session(&path, editor)?;
            let ids = import_files(&mut session, &files).context("import failed")?;
            save_session(&session, &path)?;
            tracing::info!("Added {} layers to {}", ids.len(), path.display());
            Ok(())
        }
        Command::Flatten {
            session,
            output,
            scale,
            quality,
        } => {
            let session = open_session(&session, editor)?;
            let mut compositor = build_compositor(config.font.as_deref())?;
            flatten(&session, &mut compositor, &output, scale, quality)
        }
        Command::Capture {
            session,
            output,
            layers,
        } => {
            let session = open_session(&session, editor)?;
            let mut compositor = build_compositor(config.font.as_deref())?;
            capture(&session, &mut compositor, &layers, &output)
        }
        Command::Extract {
            session: path,
            layer,
            points,
        } => {
            let mut session = open_session(&path, editor)?;
            let mut compositor = build_compositor(config.font.as_deref())?;
            let id = extract(&mut session, &mut compositor, &layer, &points)?;
            save_session(&session, &path)?;
            println!("{id}");
            Ok(())
        }
        Command::Generate {
            session: path,
            prompt,
            preset,
            save_preset,
            no_input,
        } => {
            let mut session = open_session(&path, editor)?;
            let mut compositor = build_compositor(config.font.as_deref())?;
            let request = build_request(
                &session,
                &mut compositor,
                prompt,
                preset.as_deref(),
                save_preset.as_deref(),
                no_input,
            )?;
            let generator = http_generator(&config)?;
            if generate(&mut session, &generator, request).await? {
                save_session(&session, &path)?;
            }
            Ok(())
        }
    }
}

/// Load the editor configuration, or defaults when no file is given.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_editor_config(path: Option<&Path>) -> Result<EditorConfig> {
    let Some(path) = path else {
        return Ok(EditorConfig::default());
    };
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    EditorConfig::from_json(&json).with_context(|| format!("invalid config {}", path.display()))
}

/// Compositor with an optional fallback font.
///
/// # Errors
///
/// Returns an error if the font cannot be loaded.
pub fn build_compositor(font: Option<&Path>) -> Result<Compositor> {
    let mut fonts = FontBook::new();
    if let Some(path) = font {
        fonts.load_fallback_file(path)?;
    } else {
        tracing::debug!("No font configured; text layers will be skipped");
    }
    Ok(Compositor::with_fonts(fonts))
}

/// Open a session document.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a valid document.
pub fn open_session(path: &Path, config: EditorConfig) -> Result<EditorSession> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read session {}", path.display()))?;
    let session = SessionDocument::from_json(&json)
        .and_then(|doc| doc.into_session(config))
        .with_context(|| format!("invalid session {}", path.display()))?;
    Ok(session)
}

/// Open a session document, or start an empty session if it does not exist.
///
/// # Errors
///
/// Returns an error if an existing file cannot be opened.
pub fn open_or_create_session(path: &Path, config: EditorConfig) -> Result<EditorSession> {
    if path.exists() {
        open_session(path, config)
    } else {
        tracing::info!("Starting new session at {}", path.display());
        Ok(EditorSession::new(config))
    }
}

/// Write a session document.
///
/// # Errors
///
/// Returns an error if serialization or the write fails.
pub fn save_session(session: &EditorSession, path: &Path) -> Result<()> {
    let json = SessionDocument::from_session(session).to_json()?;
    std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    tracing::debug!("Saved {} layers to {}", session.layers().len(), path.display());
    Ok(())
}

/// Parse an `x,y` pair.
///
/// # Errors
///
/// Returns an error if the text is not two comma-separated numbers.
pub fn parse_point(text: &str) -> Result<Point> {
    let (x, y) = text
        .split_once(',')
        .with_context(|| format!("expected x,y but got '{text}'"))?;
    let x: f32 = x.trim().parse().with_context(|| format!("bad x in '{text}'"))?;
    let y: f32 = y.trim().parse().with_context(|| format!("bad y in '{text}'"))?;
    Ok(Point::new(x, y))
}

fn parse_layer_id(text: &str) -> Result<LayerId> {
    LayerId::parse(text).with_context(|| format!("'{text}' is not a layer id"))
}

fn new_session(
    path: &Path,
    editor: EditorConfig,
    width: Option<u32>,
    height: Option<u32>,
    background: Option<String>,
) -> Result<()> {
    let mut session = EditorSession::new(editor);
    if width.is_some() || height.is_some() {
        let canvas = session.canvas().clone();
        session.set_canvas_size(width.unwrap_or(canvas.width), height.unwrap_or(canvas.height));
    }
    if let Some(color) = background {
        session.set_background(if color.eq_ignore_ascii_case("transparent") {
            Background::Transparent
        } else {
            Background::Solid(color)
        });
    }
    save_session(&session, path)
}

fn flatten(session: &EditorSession, compositor: &mut Compositor, output: &Path, scale: f32, quality: u8) -> Result<()> {
    let format = output
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(ExportFormat::from_extension)
        .with_context(|| format!("cannot tell PNG or JPEG from {}", output.display()))?;
    let exporter = SessionExporter::new(ExportConfig {
        scale,
        jpeg_quality: quality,
        ..ExportConfig::default()
    });
    let bytes = exporter.export(compositor, session, format)?;
    std::fs::write(output, bytes).with_context(|| format!("failed to write {}", output.display()))?;
    Ok(())
}

fn capture(session: &EditorSession, compositor: &mut Compositor, ids: &[String], output: &Path) -> Result<()> {
    let layers = ids
        .iter()
        .map(|text| {
            let id = parse_layer_id(text)?;
            session
                .layer(id)
                .cloned()
                .with_context(|| format!("no layer {id} in session"))
        })
        .collect::<Result<Vec<_>>>()?;

    let pixmap = match layers.as_slice() {
        [single] => compositor.capture_layer(single)?,
        group => compositor.capture_group(group)?,
    };
    std::fs::write(output, encode_png(&pixmap)?)
        .with_context(|| format!("failed to write {}", output.display()))?;
    tracing::info!("Captured {} layers to {}", layers.len(), output.display());
    Ok(())
}

/// Draw a pen polygon over `layer` and extract it into a new layer.
///
/// # Errors
///
/// Returns an error if the layer is missing, locked, not an image, or the
/// polygon has fewer than three points.
pub fn extract(session: &mut EditorSession, compositor: &mut Compositor, layer: &str, points: &[String]) -> Result<LayerId> {
    let id = parse_layer_id(layer)?;
    let points = points.iter().map(|p| parse_point(p)).collect::<Result<Vec<_>>>()?;

    session.select(id, false)?;
    session.dispatch(EditorEvent::SetTool(Tool::Pen));
    for point in &points {
        session.dispatch(PointerEvent::down(point.x, point.y).into());
        session.dispatch(PointerEvent::up(point.x, point.y).into());
    }
    if session.close_pen_path().is_none() {
        bail!("layer {id} cannot take a pen selection (needs an unlocked image layer and 3+ points)");
    }
    Ok(extract_selection_to_layer(session, compositor)?)
}

fn build_request(
    session: &EditorSession,
    compositor: &mut Compositor,
    prompt: Option<String>,
    preset: Option<&Path>,
    save_preset: Option<&Path>,
    no_input: bool,
) -> Result<GenerationRequest> {
    let preset = preset
        .map(|path| {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read preset {}", path.display()))?;
            Preset::from_json(&json).with_context(|| format!("invalid preset {}", path.display()))
        })
        .transpose()?;

    let mut request = preset
        .as_ref()
        .map_or_else(GenerationRequest::default, |p| GenerationRequest::from_preset(p, Vec::new()));
    if let Some(prompt) = prompt {
        request.prompt = prompt;
    }
    if request.prompt.trim().is_empty() {
        bail!("a prompt is required (--prompt or a preset with one)");
    }

    if let Some(path) = save_preset {
        let app_id = preset.as_ref().map_or(CLI_APP_ID, |p| p.app_id.as_str());
        std::fs::write(path, request.to_preset(app_id).to_json()?)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }

    if !no_input {
        let canvas = compositor.flatten(session, 1.0)?;
        request.images.push(png_data_url(&canvas)?);
    }
    Ok(request)
}

fn http_generator(config: &CliConfig) -> Result<HttpImageGenerator> {
    let endpoint = config
        .ai_url
        .as_deref()
        .context("no generation endpoint; pass --ai-url or set COMPOSER_AI_URL")?;
    let mut http = HttpGeneratorConfig::new(endpoint);
    http.token.clone_from(&config.ai_token);
    Ok(HttpImageGenerator::new(http)?)
}

/// Run one generation in the canvas slot and add the results as layers.
///
/// Ctrl-C cancels the job. Returns whether the session changed; failures
/// and cancellation leave it untouched.
///
/// # Errors
///
/// Returns an error if the service fails or a result cannot be decoded.
pub async fn generate(session: &mut EditorSession, generator: &dyn ImageGenerator, request: GenerationRequest) -> Result<bool> {
    let slots = JobSlots::new();
    let outcome = tokio::select! {
        outcome = slots.run(CANVAS_SLOT, generator.generate(request)) => outcome?,
        _ = tokio::signal::ctrl_c() => {
            slots.cancel(CANVAS_SLOT);
            GenerationOutcome::Cancelled
        }
    };

    match outcome {
        GenerationOutcome::Completed(images) => {
            let ids = apply_generated(session, &images)?;
            tracing::info!("Added {} generated layers", ids.len());
            Ok(true)
        }
        GenerationOutcome::Failed(message) => bail!("generation failed: {message}"),
        GenerationOutcome::Cancelled => {
            tracing::warn!("Generation cancelled; session unchanged");
            Ok(false)
        }
    }
}

/// Add generated images as layers in one history entry.
///
/// Every image is decoded before the session is touched.
///
/// # Errors
///
/// Returns an error if any result is not a decodable data URL.
pub fn apply_generated(session: &mut EditorSession, images: &[String]) -> Result<Vec<LayerId>> {
    let assets = images
        .iter()
        .map(|url| asset_from_data_url(url))
        .collect::<Result<Vec<_>, _>>()
        .context("generation returned an unreadable image")?;
    Ok(session.add_image_layers(assets))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_point_forms() {
        assert_eq!(parse_point("10, 20.5").expect("point"), Point::new(10.0, 20.5));
        assert!(parse_point("10").is_err());
        assert!(parse_point("a,b").is_err());
    }

    #[test]
    fn missing_config_uses_defaults() {
        let config = load_editor_config(None).expect("config");
        assert_eq!(config, EditorConfig::default());
    }

    #[test]
    fn bad_layer_id_is_reported() {
        let err = parse_layer_id("nope").expect_err("should fail");
        assert!(err.to_string().contains("nope"));
    }
}
