//! Session export to PNG/JPEG bytes and data URLs.
//!
//! Flattens an [`EditorSession`] through the [`Compositor`] and encodes the
//! result. PNG keeps alpha; JPEG is composited over a matte color first.

use composer_core::EditorSession;
use image::ImageEncoder;
use tiny_skia::Pixmap;

use crate::compositor::Compositor;
use crate::error::{RenderError, RenderResult};
use crate::image::{to_data_uri, ImageFormat};

/// Export output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    /// PNG image.
    #[default]
    Png,
    /// JPEG image.
    Jpeg,
}

impl ExportFormat {
    /// Pick a format from a file extension (`png`, `jpg`, `jpeg`).
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ImageFormat::from_extension(ext) {
            ImageFormat::Png => Some(Self::Png),
            ImageFormat::Jpeg => Some(Self::Jpeg),
            _ => None,
        }
    }

    /// Matching image format for data URLs.
    #[must_use]
    pub fn image_format(self) -> ImageFormat {
        match self {
            Self::Png => ImageFormat::Png,
            Self::Jpeg => ImageFormat::Jpeg,
        }
    }
}

/// Configuration for session export.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Scale factor applied to the canvas size (e.g. 2.0 for retina).
    pub scale: f32,
    /// JPEG quality 1-100 (default: 85).
    pub jpeg_quality: u8,
    /// Color behind transparent pixels in JPEG output, as RGB bytes.
    pub matte: [u8; 3],
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            scale: 1.0,
            jpeg_quality: 85,
            matte: [255, 255, 255],
        }
    }
}

/// Exports editor sessions to encoded rasters.
#[derive(Debug, Clone, Default)]
pub struct SessionExporter {
    config: ExportConfig,
}

impl SessionExporter {
    /// Create a new exporter with the given configuration.
    #[must_use]
    pub fn new(config: ExportConfig) -> Self {
        Self { config }
    }

    /// Create an exporter with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(ExportConfig::default())
    }

    /// Exporter configuration.
    #[must_use]
    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Flatten the session and encode it.
    ///
    /// # Errors
    ///
    /// Returns an error if compositing or encoding fails.
    pub fn export(&self, compositor: &mut Compositor, session: &EditorSession, format: ExportFormat) -> RenderResult<Vec<u8>> {
        let pixmap = compositor.flatten(session, self.config.scale)?;
        let bytes = self.encode(&pixmap, format)?;
        tracing::info!(
            "Exported {}x{} {format:?} ({} bytes)",
            pixmap.width(),
            pixmap.height(),
            bytes.len()
        );
        Ok(bytes)
    }

    /// Flatten the session and wrap the encoded bytes in a data URL.
    ///
    /// # Errors
    ///
    /// Returns an error if compositing or encoding fails.
    pub fn export_data_url(&self, compositor: &mut Compositor, session: &EditorSession, format: ExportFormat) -> RenderResult<String> {
        let bytes = self.export(compositor, session, format)?;
        Ok(to_data_uri(&bytes, format.image_format()))
    }

    /// Encode an already rendered pixmap.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn encode(&self, pixmap: &Pixmap, format: ExportFormat) -> RenderResult<Vec<u8>> {
        match format {
            ExportFormat::Png => encode_png(pixmap),
            ExportFormat::Jpeg => encode_jpeg(pixmap, self.config.jpeg_quality, self.config.matte),
        }
    }
}

/// Encode a pixmap as PNG.
///
/// # Errors
///
/// Returns an error if encoding fails.
pub fn encode_png(pixmap: &Pixmap) -> RenderResult<Vec<u8>> {
    pixmap
        .encode_png()
        .map_err(|e| RenderError::Encode(format!("PNG encoding failed: {e}")))
}

/// Encode a pixmap as a PNG data URL.
///
/// # Errors
///
/// Returns an error if encoding fails.
pub fn png_data_url(pixmap: &Pixmap) -> RenderResult<String> {
    Ok(to_data_uri(&encode_png(pixmap)?, ImageFormat::Png))
}

/// Encode a pixmap as JPEG, compositing it over `matte`.
///
/// # Errors
///
/// Returns an error if encoding fails.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn encode_jpeg(pixmap: &Pixmap, quality: u8, matte: [u8; 3]) -> RenderResult<Vec<u8>> {
    let (width, height) = (pixmap.width(), pixmap.height());
    let mut rgb_data = Vec::with_capacity(pixmap.data().len() / 4 * 3);
    // Pixmap data is premultiplied: out = src + matte * (1 - a).
    for pixel in pixmap.data().chunks_exact(4) {
        let inv = 1.0 - f32::from(pixel[3]) / 255.0;
        for (channel, bg) in pixel[..3].iter().zip(matte) {
            rgb_data.push(f32::from(bg).mul_add(inv, f32::from(*channel)).round().min(255.0) as u8);
        }
    }

    let mut buf = std::io::Cursor::new(Vec::new());
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100));
    encoder
        .write_image(&rgb_data, width, height, image::ColorType::Rgb8.into())
        .map_err(|e| RenderError::Encode(format!("JPEG encoding failed: {e}")))?;

    Ok(buf.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use composer_core::{Background, ShapeKind};

    fn session() -> EditorSession {
        let mut session = EditorSession::with_canvas(64, 32);
        session.add_shape_layer(ShapeKind::Ellipse, "#336699");
        session
    }

    #[test]
    fn test_png_export_produces_valid_bytes() {
        let mut compositor = Compositor::new();
        let png = SessionExporter::with_defaults()
            .export(&mut compositor, &session(), ExportFormat::Png)
            .expect("png export");
        assert_eq!(&png[0..4], &[137, 80, 78, 71]);
    }

    #[test]
    fn test_jpeg_export_produces_valid_bytes() {
        let mut compositor = Compositor::new();
        let mut session = session();
        session.set_background(Background::Transparent);
        let jpeg = SessionExporter::with_defaults()
            .export(&mut compositor, &session, ExportFormat::Jpeg)
            .expect("jpeg export");
        assert_eq!(&jpeg[0..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_scale_factor() {
        let mut compositor = Compositor::new();
        let exporter = SessionExporter::new(ExportConfig {
            scale: 2.0,
            ..ExportConfig::default()
        });
        let png = exporter
            .export(&mut compositor, &session(), ExportFormat::Png)
            .expect("png export");
        let decoded = crate::image::decode_image(&png).expect("decode");
        assert_eq!((decoded.width, decoded.height), (128, 64));
    }

    #[test]
    fn test_data_url() {
        let mut compositor = Compositor::new();
        let url = SessionExporter::with_defaults()
            .export_data_url(&mut compositor, &session(), ExportFormat::Jpeg)
            .expect("data url");
        assert!(url.starts_with("data:image/jpeg;base64,"));
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(ExportFormat::from_extension("JPG"), Some(ExportFormat::Jpeg));
        assert_eq!(ExportFormat::from_extension("png"), Some(ExportFormat::Png));
        assert_eq!(ExportFormat::from_extension("webp"), None);
    }

    #[test]
    fn test_matte_fills_transparency() {
        let pixmap = Pixmap::new(2, 2).expect("pixmap");
        let jpeg = encode_jpeg(&pixmap, 90, [0, 0, 0]).expect("jpeg");
        let decoded = crate::image::decode_image(&jpeg).expect("decode");
        assert!(decoded.data[0] < 8);
    }
}
