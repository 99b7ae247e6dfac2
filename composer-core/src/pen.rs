//! Pen tool paths and the closed selection polygons they produce.
//!
//! Nodes are placed in canvas space. Finalizing closes the loop, flattens each
//! cubic segment to [`BEZIER_STEPS`] line points and maps everything into the
//! local frame of the layer the path was drawn against, so the selection
//! stays glued to the layer whatever its rotation.

use serde::{Deserialize, Serialize};

use crate::geometry::{canvas_point_to_layer_local, Point, Rect};
use crate::{Layer, LayerId};

/// Line points emitted per cubic segment.
pub const BEZIER_STEPS: usize = 16;

/// Fewest nodes that make a usable selection.
pub const MIN_PATH_NODES: usize = 3;

/// One anchor of a pen path with its two Bezier handles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PenNode {
    /// On-curve point.
    pub anchor: Point,
    /// Handle controlling the segment arriving at this node.
    pub in_handle: Point,
    /// Handle controlling the segment leaving this node.
    pub out_handle: Point,
}

impl PenNode {
    /// A sharp corner: both handles sit on the anchor.
    #[must_use]
    pub fn corner(anchor: Point) -> Self {
        Self {
            anchor,
            in_handle: anchor,
            out_handle: anchor,
        }
    }

    /// A smooth node with symmetric handles; `out_handle` is mirrored for `in`.
    #[must_use]
    pub fn smooth(anchor: Point, out_handle: Point) -> Self {
        Self {
            anchor,
            in_handle: out_handle.mirrored_about(anchor),
            out_handle,
        }
    }
}

/// An in-progress pen path drawn against a single layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PenPath {
    target: LayerId,
    nodes: Vec<PenNode>,
}

impl PenPath {
    /// Start an empty path for the given layer.
    #[must_use]
    pub fn new(target: LayerId) -> Self {
        Self {
            target,
            nodes: Vec::new(),
        }
    }

    /// Layer the path is drawn against.
    #[must_use]
    pub fn target(&self) -> LayerId {
        self.target
    }

    /// Nodes placed so far.
    #[must_use]
    pub fn nodes(&self) -> &[PenNode] {
        &self.nodes
    }

    /// Place a corner node.
    pub fn push_corner(&mut self, anchor: Point) {
        self.nodes.push(PenNode::corner(anchor));
    }

    /// Drag the last node's out-handle to `point`, mirroring the in-handle.
    pub fn drag_last_handle(&mut self, point: Point) {
        if let Some(last) = self.nodes.last_mut() {
            *last = PenNode::smooth(last.anchor, point);
        }
    }

    /// Whether a click at `point` should close the path.
    #[must_use]
    pub fn closes_at(&self, point: Point, radius: f32) -> bool {
        self.nodes.len() >= MIN_PATH_NODES
            && self
                .nodes
                .first()
                .is_some_and(|first| first.anchor.distance(point) <= radius)
    }

    /// Close the path into a selection against `layer`.
    ///
    /// Returns `None` when the layer is not this path's target or fewer than
    /// [`MIN_PATH_NODES`] nodes were placed.
    #[must_use]
    pub fn finalize(&self, layer: &Layer) -> Option<SelectionPath> {
        if layer.id != self.target {
            return None;
        }
        build_selection_path(&self.nodes, layer)
    }
}

/// A closed polygon in a layer's local coordinate space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionPath {
    /// Layer whose local space the points live in.
    pub layer_id: LayerId,
    /// Polygon vertices; the last connects back to the first.
    pub points: Vec<Point>,
    /// Axis-aligned bounds of `points` in local space.
    pub bounds: Rect,
}

impl SelectionPath {
    /// Even-odd point-in-polygon test in local space.
    #[must_use]
    pub fn contains(&self, point: Point) -> bool {
        let mut inside = false;
        let n = self.points.len();
        let mut j = n.wrapping_sub(1);
        for i in 0..n {
            let a = self.points[i];
            let b = self.points[j];
            if (a.y > point.y) != (b.y > point.y) {
                let cross_x = (b.x - a.x) * (point.y - a.y) / (b.y - a.y) + a.x;
                if point.x < cross_x {
                    inside = !inside;
                }
            }
            j = i;
        }
        inside
    }
}

/// Sample a cubic Bezier at `steps` evenly spaced parameters in `[0, 1)`.
///
/// The end point is left out; it is the first sample of the next segment.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn flatten_cubic(p0: Point, p1: Point, p2: Point, p3: Point, steps: usize) -> Vec<Point> {
    let steps = steps.max(1);
    (0..steps)
        .map(|i| {
            let t = i as f32 / steps as f32;
            let mt = 1.0 - t;
            let a = mt * mt * mt;
            let b = 3.0 * mt * mt * t;
            let c = 3.0 * mt * t * t;
            let d = t * t * t;
            Point::new(
                a * p0.x + b * p1.x + c * p2.x + d * p3.x,
                a * p0.y + b * p1.y + c * p2.y + d * p3.y,
            )
        })
        .collect()
}

/// Flatten a closed loop of pen nodes into `layer`'s local space.
///
/// Returns `None` for fewer than [`MIN_PATH_NODES`] nodes.
#[must_use]
pub fn build_selection_path(nodes: &[PenNode], layer: &Layer) -> Option<SelectionPath> {
    if nodes.len() < MIN_PATH_NODES {
        tracing::debug!("Pen path with {} nodes produces no selection", nodes.len());
        return None;
    }

    let points: Vec<Point> = nodes
        .iter()
        .zip(nodes.iter().cycle().skip(1))
        .flat_map(|(from, to)| {
            flatten_cubic(from.anchor, from.out_handle, to.in_handle, to.anchor, BEZIER_STEPS)
        })
        .map(|p| canvas_point_to_layer_local(p, layer))
        .collect();

    let bounds = Rect::covering(points.iter().copied())?;
    Some(SelectionPath {
        layer_id: layer.id,
        points,
        bounds,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ShapeKind, Transform};

    fn layer_at(x: f32, y: f32, rotation: f32) -> Layer {
        Layer::shape(ShapeKind::Rectangle, "#000").with_transform(Transform {
            x,
            y,
            width: 200.0,
            height: 100.0,
            rotation,
        })
    }

    #[test]
    fn too_few_nodes_is_no_selection() {
        let layer = layer_at(0.0, 0.0, 0.0);
        let nodes = [
            PenNode::corner(Point::new(0.0, 0.0)),
            PenNode::corner(Point::new(10.0, 0.0)),
        ];
        assert!(build_selection_path(&nodes, &layer).is_none());
    }

    #[test]
    fn corner_triangle_in_local_space() {
        let layer = layer_at(100.0, 50.0, 0.0);
        let nodes = [
            PenNode::corner(Point::new(110.0, 60.0)),
            PenNode::corner(Point::new(210.0, 60.0)),
            PenNode::corner(Point::new(110.0, 140.0)),
        ];
        let path = build_selection_path(&nodes, &layer).expect("path");
        assert_eq!(path.points.len(), 3 * BEZIER_STEPS);
        assert_eq!(path.points[0], Point::new(10.0, 10.0));
        assert!((path.bounds.x - 10.0).abs() < 1e-4);
        assert!((path.bounds.right() - 110.0).abs() < 1e-4);
        assert!((path.bounds.bottom() - 90.0).abs() < 1e-4);
        assert!(path.contains(Point::new(20.0, 20.0)));
        assert!(!path.contains(Point::new(100.0, 80.0)));
    }

    #[test]
    fn smooth_nodes_bulge_outward() {
        let layer = layer_at(0.0, 0.0, 0.0);
        let nodes = [
            PenNode::smooth(Point::new(50.0, 10.0), Point::new(80.0, 10.0)),
            PenNode::smooth(Point::new(90.0, 50.0), Point::new(90.0, 80.0)),
            PenNode::smooth(Point::new(50.0, 90.0), Point::new(20.0, 90.0)),
            PenNode::smooth(Point::new(10.0, 50.0), Point::new(10.0, 20.0)),
        ];
        let path = build_selection_path(&nodes, &layer).expect("path");
        // Curved segments reach beyond the straight diamond between anchors.
        assert!(path.contains(Point::new(75.0, 25.0)));
    }

    #[test]
    fn rotated_layer_maps_points_into_local_frame() {
        let layer = layer_at(0.0, 0.0, 90.0);
        // Layer center is (100, 50); its local top-left corner sits at canvas (150, -50).
        let nodes = [
            PenNode::corner(Point::new(150.0, -50.0)),
            PenNode::corner(Point::new(150.0, 50.0)),
            PenNode::corner(Point::new(100.0, 50.0)),
        ];
        let path = build_selection_path(&nodes, &layer).expect("path");
        let first = path.points[0];
        assert!(first.x.abs() < 1e-3 && first.y.abs() < 1e-3);
    }

    #[test]
    fn pen_path_closes_near_first_node() {
        let layer = layer_at(0.0, 0.0, 0.0);
        let mut pen = PenPath::new(layer.id);
        pen.push_corner(Point::new(10.0, 10.0));
        pen.push_corner(Point::new(50.0, 10.0));
        assert!(!pen.closes_at(Point::new(11.0, 11.0), 8.0));
        pen.push_corner(Point::new(30.0, 40.0));
        assert!(pen.closes_at(Point::new(11.0, 11.0), 8.0));
        assert!(pen.finalize(&layer).is_some());
        assert!(pen.finalize(&layer_at(0.0, 0.0, 0.0)).is_none());
    }

    #[test]
    fn drag_sets_symmetric_handles() {
        let mut pen = PenPath::new(LayerId::new());
        pen.push_corner(Point::new(10.0, 10.0));
        pen.drag_last_handle(Point::new(20.0, 15.0));
        let node = pen.nodes()[0];
        assert_eq!(node.out_handle, Point::new(20.0, 15.0));
        assert_eq!(node.in_handle, Point::new(0.0, 5.0));
    }
}
