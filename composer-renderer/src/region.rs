//! Pen-selection region extraction.

use composer_core::{EditorSession, Layer, LayerId, LayerKind, SelectionPath};
use tiny_skia::{FillRule, IntRect, Mask, PathBuilder, Pixmap, PixmapPaint, Transform};

use crate::compositor::Compositor;
use crate::error::{RenderError, RenderResult};
use crate::export::png_data_url;

const EDGE_EPSILON: f32 = 1e-3;

/// A cropped, clipped copy of part of a layer.
#[derive(Debug, Clone)]
pub struct ExtractedRegion {
    /// PNG data URL of the region.
    pub data_url: String,
    /// Pixel width.
    pub width: u32,
    /// Pixel height.
    pub height: u32,
}

/// Cut the area inside `path` out of `layer`.
///
/// The layer is rendered unrotated in its own frame (images at their
/// natural resolution), everything outside the polygon is cleared and the
/// result is cropped to the polygon's bounds.
///
/// # Errors
///
/// Returns an error if `path` belongs to another layer, the layer cannot be
/// rendered, or the bounds fall outside the layer.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]
pub fn extract_region(compositor: &mut Compositor, layer: &Layer, path: &SelectionPath) -> RenderResult<ExtractedRegion> {
    if path.layer_id != layer.id {
        return Err(RenderError::Resource(format!(
            "selection belongs to layer {}, not {}",
            path.layer_id, layer.id
        )));
    }

    let t = &layer.transform;
    let (width, height) = match &layer.kind {
        LayerKind::Image {
            natural_width,
            natural_height,
            ..
        } => ((*natural_width).max(1), (*natural_height).max(1)),
        _ => (t.width.ceil().max(1.0) as u32, t.height.ceil().max(1.0) as u32),
    };
    let (sx, sy) = (width as f32 / t.width, height as f32 / t.height);

    let local = compositor
        .render_content(layer, width, height)?
        .ok_or_else(|| RenderError::Font(format!("layer {} has no usable font", layer.id)))?;

    let mut builder = PathBuilder::new();
    let mut points = path.points.iter();
    if let Some(first) = points.next() {
        builder.move_to(first.x, first.y);
    }
    for p in points {
        builder.line_to(p.x, p.y);
    }
    builder.close();
    let polygon = builder
        .finish()
        .ok_or_else(|| RenderError::Surface("degenerate selection polygon".into()))?;

    let mut mask = Mask::new(width, height)
        .ok_or_else(|| RenderError::Surface(format!("cannot allocate {width}x{height} mask")))?;
    mask.fill_path(&polygon, FillRule::EvenOdd, true, Transform::from_scale(sx, sy));

    let mut clipped = Pixmap::new(width, height)
        .ok_or_else(|| RenderError::Surface(format!("cannot allocate {width}x{height} pixmap")))?;
    clipped.draw_pixmap(0, 0, local.as_ref(), &PixmapPaint::default(), Transform::identity(), Some(&mask));

    // Bezier sampling leaves float noise on integral edges.
    let b = &path.bounds;
    let x0 = (b.x * sx + EDGE_EPSILON).floor().max(0.0) as u32;
    let y0 = (b.y * sy + EDGE_EPSILON).floor().max(0.0) as u32;
    let x1 = ((b.x + b.width) * sx - EDGE_EPSILON).ceil().min(width as f32) as u32;
    let y1 = ((b.y + b.height) * sy - EDGE_EPSILON).ceil().min(height as f32) as u32;
    let crop = IntRect::from_xywh(x0 as i32, y0 as i32, x1.saturating_sub(x0), y1.saturating_sub(y0))
        .ok_or_else(|| RenderError::Surface("selection lies outside the layer".into()))?;
    let cropped = clipped
        .clone_rect(crop)
        .ok_or_else(|| RenderError::Surface("selection lies outside the layer".into()))?;

    Ok(ExtractedRegion {
        data_url: png_data_url(&cropped)?,
        width: cropped.width(),
        height: cropped.height(),
    })
}

/// Extract the session's pen selection into a new image layer above its
/// source, as one history entry.
///
/// # Errors
///
/// Returns an error if there is no selection path, its layer is gone, or
/// rendering fails. The session is untouched on error.
pub fn extract_selection_to_layer(session: &mut EditorSession, compositor: &mut Compositor) -> RenderResult<LayerId> {
    let path = session
        .selection_path()
        .cloned()
        .ok_or_else(|| composer_core::ComposerError::InvalidOperation("no pen selection to extract".into()))?;
    let layer = session
        .layer(path.layer_id)
        .cloned()
        .ok_or_else(|| composer_core::ComposerError::LayerNotFound(path.layer_id.to_string()))?;

    let region = extract_region(compositor, &layer, &path)?;
    tracing::debug!("Extracted {}x{} region from {}", region.width, region.height, layer.id);
    Ok(session.place_extracted_region(region.data_url, region.width, region.height)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use composer_core::{Point, Rect, ShapeKind, Transform as Geometry};

    fn square_layer() -> Layer {
        Layer::shape(ShapeKind::Rectangle, "#ff0000").with_transform(Geometry {
            x: 0.0,
            y: 0.0,
            width: 40.0,
            height: 40.0,
            rotation: 0.0,
        })
    }

    fn triangle(layer: &Layer) -> SelectionPath {
        SelectionPath {
            layer_id: layer.id,
            points: vec![Point::new(10.0, 10.0), Point::new(30.0, 10.0), Point::new(10.0, 30.0)],
            bounds: Rect::new(10.0, 10.0, 20.0, 20.0),
        }
    }

    #[test]
    fn region_is_cropped_and_clipped() {
        let mut compositor = Compositor::new();
        let layer = square_layer();
        let region = extract_region(&mut compositor, &layer, &triangle(&layer)).expect("extract");
        assert_eq!((region.width, region.height), (20, 20));

        let decoded = crate::image::decode_data_uri(&region.data_url).expect("decode");
        let alpha = |x: u32, y: u32| decoded.data[((y * decoded.width + x) * 4 + 3) as usize];
        assert_eq!(alpha(2, 2), 255);
        assert_eq!(alpha(18, 18), 0);
    }

    #[test]
    fn path_for_another_layer_is_rejected() {
        let mut compositor = Compositor::new();
        let layer = square_layer();
        let other = square_layer();
        assert!(extract_region(&mut compositor, &layer, &triangle(&other)).is_err());
    }

    #[test]
    fn no_selection_path_is_an_error() {
        let mut compositor = Compositor::new();
        let mut session = EditorSession::with_canvas(100, 100);
        session.add_shape_layer(ShapeKind::Rectangle, "#000");
        let before = session.history_len();
        assert!(matches!(
            extract_selection_to_layer(&mut session, &mut compositor),
            Err(RenderError::Core(_))
        ));
        assert_eq!(session.history_len(), before);
    }
}
