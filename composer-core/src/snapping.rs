//! Alignment snapping for move interactions.

use serde::{Deserialize, Serialize};

use crate::geometry::Rect;

/// Default snap distance in screen pixels.
pub const DEFAULT_SNAP_THRESHOLD_PX: f32 = 6.0;

/// Orientation of a snap guide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapAxis {
    /// A vertical guide at a fixed x.
    Vertical,
    /// A horizontal guide at a fixed y.
    Horizontal,
}

/// A transient alignment guide shown while dragging.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SnapLine {
    /// Guide orientation.
    pub axis: SnapAxis,
    /// Canvas coordinate of the guide (x for vertical, y for horizontal).
    pub position: f32,
}

/// Snapping settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SnapConfig {
    /// Whether moves snap at all.
    pub enabled: bool,
    /// Snap distance in screen pixels; divided by zoom to get canvas units.
    pub threshold_px: f32,
}

impl Default for SnapConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold_px: DEFAULT_SNAP_THRESHOLD_PX,
        }
    }
}

/// Corrected move delta plus the guides that produced it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapResult {
    /// Corrected horizontal delta.
    pub dx: f32,
    /// Corrected vertical delta.
    pub dy: f32,
    /// At most one guide per axis.
    pub lines: Vec<SnapLine>,
}

/// Correct a proposed move so the moving box aligns with nearby edges.
///
/// `targets` are the bounds of every non-moving layer; the canvas edges and
/// center are always considered after them. Each axis snaps independently and
/// at most once, to the first target within range of the moving box's min
/// edge, then its center, then its max edge.
#[must_use]
pub fn snap_move(
    moving: Rect,
    dx: f32,
    dy: f32,
    targets: &[Rect],
    canvas: Rect,
    zoom: f32,
    config: &SnapConfig,
) -> SnapResult {
    let mut result = SnapResult {
        dx,
        dy,
        lines: Vec::new(),
    };
    if !config.enabled {
        return result;
    }

    let threshold = config.threshold_px / zoom.max(f32::EPSILON);
    let moved = moving.translate(dx, dy);

    let x_targets = targets
        .iter()
        .chain(std::iter::once(&canvas))
        .flat_map(|r| [r.x, r.center().x, r.right()]);
    if let Some((correction, position)) =
        first_match([moved.x, moved.center().x, moved.right()], x_targets, threshold)
    {
        result.dx += correction;
        result.lines.push(SnapLine {
            axis: SnapAxis::Vertical,
            position,
        });
    }

    let y_targets = targets
        .iter()
        .chain(std::iter::once(&canvas))
        .flat_map(|r| [r.y, r.center().y, r.bottom()]);
    if let Some((correction, position)) =
        first_match([moved.y, moved.center().y, moved.bottom()], y_targets, threshold)
    {
        result.dy += correction;
        result.lines.push(SnapLine {
            axis: SnapAxis::Horizontal,
            position,
        });
    }

    result
}

fn first_match(
    sources: [f32; 3],
    targets: impl Iterator<Item = f32> + Clone,
    threshold: f32,
) -> Option<(f32, f32)> {
    sources.into_iter().find_map(|source| {
        targets
            .clone()
            .find(|target| (target - source).abs() <= threshold)
            .map(|target| (target - source, target))
    })
}
