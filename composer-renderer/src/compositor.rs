//! Layer compositor.
//!
//! Each visible layer is rendered into its own local pixmap (unrotated,
//! `width × height` scaled), then drawn onto the output with a rotation
//! about its center, its opacity and its blend operator. Paint state lives
//! in the per-layer `PixmapPaint` only, so nothing leaks between layers.
//!
//! ```text
//! layers (index 0 = top) ──rev──▶ render_content ──▶ draw_pixmap(rotate, opacity, blend) ──▶ output
//! ```

use composer_core::{
    bounding_box_of, Background, BlendMode, ComposerError, EditorSession, Layer, LayerKind, Rect,
    ShapeKind,
};
use tiny_skia::{
    Color, FillRule, FilterQuality, Paint, PathBuilder, Pixmap, PixmapPaint, Transform,
};

use crate::cache::ImageCache;
use crate::color::parse_color_or;
use crate::error::{RenderError, RenderResult};
use crate::text::{draw_text, FontBook};

/// Map a layer blend mode onto the tiny-skia operator.
#[must_use]
pub fn skia_blend_mode(mode: BlendMode) -> tiny_skia::BlendMode {
    use tiny_skia::BlendMode as Skia;
    match mode {
        BlendMode::Normal => Skia::SourceOver,
        BlendMode::Multiply => Skia::Multiply,
        BlendMode::Screen => Skia::Screen,
        BlendMode::Overlay => Skia::Overlay,
        BlendMode::Darken => Skia::Darken,
        BlendMode::Lighten => Skia::Lighten,
        BlendMode::ColorDodge => Skia::ColorDodge,
        BlendMode::ColorBurn => Skia::ColorBurn,
        BlendMode::HardLight => Skia::HardLight,
        BlendMode::SoftLight => Skia::SoftLight,
        BlendMode::Difference => Skia::Difference,
        BlendMode::Exclusion => Skia::Exclusion,
        BlendMode::Hue => Skia::Hue,
        BlendMode::Saturation => Skia::Saturation,
        BlendMode::Color => Skia::Color,
        BlendMode::Luminosity => Skia::Luminosity,
    }
}

/// Placement of a layer's local pixmap: rotate about the box center, which
/// sits at `(cx, cy)` in output pixels.
fn layer_transform(cx: f32, cy: f32, half_w: f32, half_h: f32, rotation_deg: f32) -> Transform {
    let (sin, cos) = rotation_deg.to_radians().sin_cos();
    let (a, b, c, d) = (cos, sin, -sin, cos);
    let tx = cx - (a * half_w + c * half_h);
    let ty = cy - (b * half_w + d * half_h);
    Transform::from_row(a, b, c, d, tx, ty)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn pixel_size(units: f32, scale: f32) -> u32 {
    (units * scale).ceil().max(1.0) as u32
}

fn new_pixmap(width: u32, height: u32) -> RenderResult<Pixmap> {
    Pixmap::new(width, height)
        .ok_or_else(|| RenderError::Surface(format!("cannot allocate {width}x{height} pixmap")))
}

/// Renders layer stacks to rasters.
#[derive(Debug, Default)]
pub struct Compositor {
    fonts: FontBook,
    cache: ImageCache,
}

impl Compositor {
    /// Compositor with no fonts and an empty image cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Compositor using the given fonts.
    #[must_use]
    pub fn with_fonts(fonts: FontBook) -> Self {
        Self {
            fonts,
            cache: ImageCache::new(),
        }
    }

    /// Registered fonts.
    #[must_use]
    pub fn fonts(&self) -> &FontBook {
        &self.fonts
    }

    /// Mutable access to the registered fonts.
    pub fn fonts_mut(&mut self) -> &mut FontBook {
        &mut self.fonts
    }

    /// Decoded image cache.
    #[must_use]
    pub fn cache(&self) -> &ImageCache {
        &self.cache
    }

    /// Render `layers` (index 0 topmost) into a raster covering `bounds`.
    ///
    /// The output is `bounds × scale` pixels. Hidden layers are skipped,
    /// as are text layers whose font cannot be resolved.
    ///
    /// # Errors
    ///
    /// Returns an error if a surface cannot be allocated or an image source
    /// cannot be decoded.
    pub fn render(&mut self, layers: &[Layer], bounds: Rect, background: &Background, scale: f32) -> RenderResult<Pixmap> {
        let scale = if scale.is_finite() && scale > 0.0 { scale } else { 1.0 };
        let mut output = new_pixmap(pixel_size(bounds.width, scale), pixel_size(bounds.height, scale))?;

        if let Background::Solid(color) = background {
            output.fill(parse_color_or(color, Color::WHITE));
        }

        for layer in layers.iter().rev().filter(|layer| layer.visible) {
            let t = &layer.transform;
            let width = pixel_size(t.width, scale);
            let height = pixel_size(t.height, scale);
            let Some(local) = self.render_content(layer, width, height)? else {
                continue;
            };

            let center = t.center();
            let transform = layer_transform(
                (center.x - bounds.x) * scale,
                (center.y - bounds.y) * scale,
                t.width * scale / 2.0,
                t.height * scale / 2.0,
                t.rotation,
            );
            let paint = PixmapPaint {
                opacity: (layer.opacity / 100.0).clamp(0.0, 1.0),
                blend_mode: skia_blend_mode(layer.blend_mode),
                quality: FilterQuality::Bilinear,
            };
            output.draw_pixmap(0, 0, local.as_ref(), &paint, transform, None);
        }

        tracing::debug!(
            "Composited {} layers into {}x{}",
            layers.len(),
            output.width(),
            output.height()
        );
        Ok(output)
    }

    /// Render a layer's content, unrotated and at full opacity, into a
    /// `width × height` pixmap.
    ///
    /// Returns `Ok(None)` for text layers with no usable font.
    ///
    /// # Errors
    ///
    /// Returns an error if the surface cannot be allocated or an image
    /// source cannot be decoded.
    #[allow(clippy::cast_precision_loss)]
    pub fn render_content(&mut self, layer: &Layer, width: u32, height: u32) -> RenderResult<Option<Pixmap>> {
        let mut local = new_pixmap(width, height)?;
        let (w, h) = (width as f32, height as f32);

        match &layer.kind {
            LayerKind::Image { src, .. } => {
                let image = self.cache.get_or_load(src)?;
                let transform = Transform::from_scale(
                    w / image.width() as f32,
                    h / image.height() as f32,
                );
                let paint = PixmapPaint {
                    quality: FilterQuality::Bilinear,
                    ..PixmapPaint::default()
                };
                local.draw_pixmap(0, 0, image.as_ref(), &paint, transform, None);
            }
            LayerKind::Shape { shape, fill } => {
                let rect = tiny_skia::Rect::from_xywh(0.0, 0.0, w, h)
                    .ok_or_else(|| RenderError::Surface(format!("degenerate shape {w}x{h}")))?;
                let path = match shape {
                    ShapeKind::Rectangle => PathBuilder::from_rect(rect),
                    ShapeKind::Ellipse => PathBuilder::from_oval(rect)
                        .ok_or_else(|| RenderError::Surface(format!("degenerate ellipse {w}x{h}")))?,
                };
                let mut paint = Paint::default();
                paint.set_color(parse_color_or(fill, Color::BLACK));
                paint.anti_alias = true;
                local.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
            }
            LayerKind::Text(style) => {
                let Some(face) = self.fonts.resolve(style) else {
                    tracing::warn!(
                        "No font for family '{}'; skipping text layer {}",
                        style.font_family,
                        layer.id
                    );
                    return Ok(None);
                };
                let scale = w / layer.transform.width.max(f32::EPSILON);
                let color = parse_color_or(&style.color, Color::BLACK);
                draw_text(&mut local, face, style, layer.transform.width, scale, color);
            }
        }
        Ok(Some(local))
    }

    /// Flatten the session's layer stack over its canvas.
    ///
    /// # Errors
    ///
    /// See [`Compositor::render`].
    pub fn flatten(&mut self, session: &EditorSession, scale: f32) -> RenderResult<Pixmap> {
        let canvas = session.canvas();
        tracing::info!(
            "Flattening {} layers at {}x{} (scale {scale})",
            session.layers().len(),
            canvas.width,
            canvas.height
        );
        self.render(session.layers(), canvas.rect(), &canvas.background, scale)
    }

    /// Capture one layer with its rotation reset.
    ///
    /// Image layers come out at their source's natural resolution; other
    /// layers at one pixel per unit. Opacity and blend mode still apply.
    ///
    /// # Errors
    ///
    /// See [`Compositor::render`].
    #[allow(clippy::cast_precision_loss)]
    pub fn capture_layer(&mut self, layer: &Layer) -> RenderResult<Pixmap> {
        let mut upright = layer.clone();
        upright.transform.rotation = 0.0;
        upright.visible = true;
        let scale = match &layer.kind {
            LayerKind::Image { natural_width, .. } => *natural_width as f32 / layer.transform.width,
            _ => 1.0,
        };
        let bounds = upright.transform.rect();
        self.render(&[upright], bounds, &Background::Transparent, scale)
    }

    /// Capture several layers, in stack order, over their joint bounds.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty group, otherwise see
    /// [`Compositor::render`].
    pub fn capture_group(&mut self, layers: &[Layer]) -> RenderResult<Pixmap> {
        let bounds = bounding_box_of(layers)
            .ok_or_else(|| ComposerError::InvalidOperation("cannot capture an empty group".into()))?;
        self.render(layers, bounds, &Background::Transparent, 1.0)
    }
}
