//! Text layout and glyph rasterization for text layers.
//!
//! Layout is a greedy word wrap against the layer width. Line `i` occupies
//! the band `i * line_height .. (i + 1) * line_height` from the top of the
//! box, with the glyph run centered vertically inside its band.

use std::collections::HashMap;
use std::path::Path;

use ab_glyph::{point, Font, FontArc, GlyphId, ScaleFont};
use composer_core::{FontStyle, TextAlign, TextStyle};
use tiny_skia::{Color, Pixmap};

use crate::error::{RenderError, RenderResult};

/// Width of a run of text in pixels.
pub trait TextMeasure {
    /// Advance width of `text` laid out on one line.
    fn width(&self, text: &str) -> f32;
}

/// Every character advances by the same amount. Used for layout tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedAdvance(pub f32);

impl TextMeasure for FixedAdvance {
    #[allow(clippy::cast_precision_loss)]
    fn width(&self, text: &str) -> f32 {
        text.chars().count() as f32 * self.0
    }
}

/// Measures with a real font at a given pixel size, kerning included.
#[derive(Debug, Clone, Copy)]
pub struct FontMeasure<'a> {
    font: &'a FontArc,
    size: f32,
}

impl<'a> FontMeasure<'a> {
    /// Measure with `font` at `size` pixels.
    #[must_use]
    pub fn new(font: &'a FontArc, size: f32) -> Self {
        Self { font, size }
    }
}

impl TextMeasure for FontMeasure<'_> {
    fn width(&self, text: &str) -> f32 {
        let scaled = self.font.as_scaled(self.size);
        let mut width = 0.0;
        let mut last: Option<GlyphId> = None;
        for ch in text.chars() {
            let id = self.font.glyph_id(ch);
            if let Some(prev) = last {
                width += scaled.kern(prev, id);
            }
            width += scaled.h_advance(id);
            last = Some(id);
        }
        width
    }
}

/// Greedy word wrap.
///
/// `\n` always breaks. Words are joined with single spaces while the line
/// still fits in `max_width`; a word wider than `max_width` gets a line of
/// its own rather than being split.
#[must_use]
pub fn wrap_lines(text: &str, max_width: f32, measure: &impl TextMeasure) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            if current.is_empty() {
                current.push_str(word);
                continue;
            }
            let candidate = format!("{current} {word}");
            if measure.width(&candidate) <= max_width {
                current = candidate;
            } else {
                lines.push(std::mem::replace(&mut current, word.to_string()));
            }
        }
        lines.push(current);
    }
    lines
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct FontKey {
    family: String,
    bold: bool,
    italic: bool,
}

impl FontKey {
    fn new(family: &str, bold: bool, italic: bool) -> Self {
        Self {
            family: family.trim().to_lowercase(),
            bold,
            italic,
        }
    }
}

/// Font faces by family, weight and slant.
#[derive(Clone, Default)]
pub struct FontBook {
    faces: HashMap<FontKey, FontArc>,
    fallback: Option<FontArc>,
}

impl std::fmt::Debug for FontBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontBook")
            .field("faces", &self.faces.len())
            .field("fallback", &self.fallback.is_some())
            .finish()
    }
}

impl FontBook {
    /// Create an empty font book.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a face for a family.
    pub fn insert(&mut self, family: &str, bold: bool, italic: bool, font: FontArc) {
        self.faces.insert(FontKey::new(family, bold, italic), font);
    }

    /// Parse and register a face from raw font bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not a TrueType/OpenType font.
    pub fn insert_bytes(&mut self, family: &str, bold: bool, italic: bool, bytes: Vec<u8>) -> RenderResult<()> {
        let font = FontArc::try_from_vec(bytes)
            .map_err(|e| RenderError::Font(format!("{family}: {e}")))?;
        self.insert(family, bold, italic, font);
        Ok(())
    }

    /// Load a font file and register it for a family.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_font_file(&mut self, path: &Path, family: &str, bold: bool, italic: bool) -> RenderResult<()> {
        let bytes = std::fs::read(path)
            .map_err(|e| RenderError::Font(format!("{}: {e}", path.display())))?;
        self.insert_bytes(family, bold, italic, bytes)?;
        tracing::info!("Loaded font {} as '{family}'", path.display());
        Ok(())
    }

    /// Face used when no registered family matches.
    pub fn set_fallback(&mut self, font: FontArc) {
        self.fallback = Some(font);
    }

    /// Load a font file as the fallback face.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_fallback_file(&mut self, path: &Path) -> RenderResult<()> {
        let bytes = std::fs::read(path)
            .map_err(|e| RenderError::Font(format!("{}: {e}", path.display())))?;
        let font = FontArc::try_from_vec(bytes)
            .map_err(|e| RenderError::Font(format!("{}: {e}", path.display())))?;
        self.set_fallback(font);
        tracing::info!("Loaded fallback font {}", path.display());
        Ok(())
    }

    /// Whether no faces are available at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty() && self.fallback.is_none()
    }

    /// Best face for a text style.
    ///
    /// Tries the exact weight/slant, then the regular face of the family,
    /// then any face of the family, then the fallback. An italic style
    /// served by an upright face is sheared at draw time.
    #[must_use]
    pub fn resolve(&self, style: &TextStyle) -> Option<ResolvedFace<'_>> {
        let italic = style.font_style == FontStyle::Italic;
        let exact = FontKey::new(&style.font_family, style.is_bold(), italic);
        let regular = FontKey::new(&style.font_family, false, false);

        let found = self
            .faces
            .get_key_value(&exact)
            .or_else(|| self.faces.get_key_value(&regular))
            .or_else(|| self.faces.iter().find(|(key, _)| key.family == exact.family));

        match found {
            Some((key, font)) => Some(ResolvedFace {
                font,
                synthetic_italic: italic && !key.italic,
            }),
            None => self.fallback.as_ref().map(|font| ResolvedFace {
                font,
                synthetic_italic: italic,
            }),
        }
    }
}

/// A face picked for a text style.
#[derive(Clone, Copy)]
pub struct ResolvedFace<'a> {
    /// Face to draw with.
    pub font: &'a FontArc,
    /// Whether glyphs need a slant the face does not have.
    pub synthetic_italic: bool,
}

/// Draw a text layer's content into its local pixmap.
///
/// `scale` maps layer units to pixmap pixels. The pixmap is expected to be
/// `width * scale` wide.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]
pub fn draw_text(pixmap: &mut Pixmap, face: ResolvedFace<'_>, style: &TextStyle, box_width: f32, scale: f32, color: Color) {
    let font = face.font;
    let size = style.font_size * scale;
    if size <= 0.0 || !size.is_finite() {
        return;
    }
    let max_width = box_width * scale;
    let line_height = style.line_height_px() * scale;
    let content = style.text_transform.apply(&style.content);
    let lines = wrap_lines(&content, max_width, &FontMeasure::new(font, size));

    let scaled = font.as_scaled(size);
    let glyph_height = scaled.ascent() - scaled.descent();
    let rgba = color.to_color_u8();

    let width = pixmap.width() as i32;
    let height = pixmap.height() as i32;
    let stride = pixmap.width() as usize;
    let pixels = pixmap.pixels_mut();

    for (index, line) in lines.iter().enumerate() {
        let line_width = FontMeasure::new(font, size).width(line);
        let start_x = match style.align {
            TextAlign::Left => 0.0,
            TextAlign::Center => (max_width - line_width) / 2.0,
            TextAlign::Right => max_width - line_width,
        };
        let baseline = index as f32 * line_height + (line_height - glyph_height) / 2.0 + scaled.ascent();

        let mut cursor = start_x;
        let mut last: Option<GlyphId> = None;
        for ch in line.chars() {
            let id = font.glyph_id(ch);
            if let Some(prev) = last {
                cursor += scaled.kern(prev, id);
            }
            let glyph = id.with_scale_and_position(size, point(cursor, baseline));
            cursor += scaled.h_advance(id);
            last = Some(id);

            let Some(outlined) = font.outline_glyph(glyph) else {
                continue;
            };
            let bounds = outlined.px_bounds();
            outlined.draw(|gx, gy, coverage| {
                let py = bounds.min.y + gy as f32;
                let mut px = bounds.min.x + gx as f32;
                if face.synthetic_italic {
                    px += (baseline - py) * 0.2;
                }
                let (ix, iy) = (px.round() as i32, py.round() as i32);
                if ix < 0 || iy < 0 || ix >= width || iy >= height {
                    return;
                }
                blend_coverage(&mut pixels[iy as usize * stride + ix as usize], rgba, coverage);
            });
        }
    }
}

/// Source-over a solid color at `coverage` onto a premultiplied pixel.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn blend_coverage(dst: &mut tiny_skia::PremultipliedColorU8, color: tiny_skia::ColorU8, coverage: f32) {
    let alpha = f32::from(color.alpha()) / 255.0 * coverage.clamp(0.0, 1.0);
    if alpha <= 0.0 {
        return;
    }
    let inv = 1.0 - alpha;
    let mix = |src: u8, dst: u8| -> u8 {
        f32::from(src)
            .mul_add(alpha, f32::from(dst) * inv)
            .round()
            .clamp(0.0, 255.0) as u8
    };
    let a = mix(255, dst.alpha());
    let r = mix(color.red(), dst.red()).min(a);
    let g = mix(color.green(), dst.green()).min(a);
    let b = mix(color.blue(), dst.blue()).min(a);
    if let Some(blended) = tiny_skia::PremultipliedColorU8::from_rgba(r, g, b, a) {
        *dst = blended;
    }
}
