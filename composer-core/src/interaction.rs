//! Pointer interaction states and the transform math behind them.
//!
//! The session holds exactly one [`Interaction`] at a time. Every drag state
//! keeps the stack as it was when the drag started (`origin`) and recomputes
//! the live stack from it on each pointer-move, so the result only depends on
//! the current pointer position and never accumulates rounding error.

use serde::{Deserialize, Serialize};

use crate::geometry::{rotate_about, Point, Rect};
use crate::layer::{Transform, MIN_LAYER_SIZE};
use crate::{LayerId, LayerStack};

/// Grab radius of resize handles, in screen pixels.
pub const HANDLE_RADIUS_PX: f32 = 8.0;

/// Distance of the rotate handle above the selection box, in screen pixels.
pub const ROTATE_HANDLE_OFFSET_PX: f32 = 28.0;

/// Pointer travel below which a marquee still counts as a click.
pub const DRAG_THRESHOLD_PX: f32 = 3.0;

/// Click radius around the first pen node that closes the path.
pub const PEN_CLOSE_RADIUS_PX: f32 = 8.0;

/// Rotation step used while the snap modifier is held.
pub const ROTATION_SNAP_DEGREES: f32 = 45.0;

/// One of the eight resize handles of a bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[allow(missing_docs)]
pub enum Handle {
    TopLeft,
    Top,
    TopRight,
    Right,
    BottomRight,
    Bottom,
    BottomLeft,
    Left,
}

impl Handle {
    /// All handles, corners first so they win over overlapping edge handles.
    pub const ALL: [Self; 8] = [
        Self::TopLeft,
        Self::TopRight,
        Self::BottomRight,
        Self::BottomLeft,
        Self::Top,
        Self::Right,
        Self::Bottom,
        Self::Left,
    ];

    /// Horizontal side the handle drags: -1 left, 0 none, 1 right.
    #[must_use]
    pub const fn horizontal(self) -> i8 {
        match self {
            Self::TopLeft | Self::Left | Self::BottomLeft => -1,
            Self::Top | Self::Bottom => 0,
            Self::TopRight | Self::Right | Self::BottomRight => 1,
        }
    }

    /// Vertical side the handle drags: -1 top, 0 none, 1 bottom.
    #[must_use]
    pub const fn vertical(self) -> i8 {
        match self {
            Self::TopLeft | Self::Top | Self::TopRight => -1,
            Self::Left | Self::Right => 0,
            Self::BottomLeft | Self::Bottom | Self::BottomRight => 1,
        }
    }

    /// Whether this is a corner handle.
    #[must_use]
    pub const fn is_corner(self) -> bool {
        self.horizontal() != 0 && self.vertical() != 0
    }

    /// Position of the handle on `bounds`.
    #[must_use]
    pub fn position(self, bounds: Rect) -> Point {
        let x = match self.horizontal() {
            -1 => bounds.x,
            0 => bounds.center().x,
            _ => bounds.right(),
        };
        let y = match self.vertical() {
            -1 => bounds.y,
            0 => bounds.center().y,
            _ => bounds.bottom(),
        };
        Point::new(x, y)
    }
}

/// Handle under `point`, if any lies within `radius`.
#[must_use]
pub fn handle_at(bounds: Rect, point: Point, radius: f32) -> Option<Handle> {
    Handle::ALL
        .into_iter()
        .find(|h| h.position(bounds).distance(point) <= radius)
}

/// Position of the rotate handle, `offset` above the top-center of `bounds`.
#[must_use]
pub fn rotate_handle_position(bounds: Rect, offset: f32) -> Point {
    Point::new(bounds.center().x, bounds.y - offset)
}

/// Per-axis scale and pivot produced by dragging a resize handle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResizeFactors {
    /// Horizontal scale factor.
    pub sx: f32,
    /// Vertical scale factor.
    pub sy: f32,
    /// Fixed point on the opposite edge/corner.
    pub pivot: Point,
}

/// Scale factors for dragging `handle` of `bounds` by `(dx, dy)`.
///
/// Corner handles keep the aspect ratio when `keep_aspect` is set: the axis
/// with the larger aspect-normalized drag drives both, and an exact tie goes
/// to the horizontal axis. The dragged box never shrinks below
/// [`MIN_LAYER_SIZE`] and never flips.
#[must_use]
pub fn resize_factors(handle: Handle, bounds: Rect, dx: f32, dy: f32, keep_aspect: bool) -> ResizeFactors {
    let width = bounds.width.max(MIN_LAYER_SIZE);
    let height = bounds.height.max(MIN_LAYER_SIZE);

    let new_width = match handle.horizontal() {
        -1 => width - dx,
        0 => width,
        _ => width + dx,
    }
    .max(MIN_LAYER_SIZE);
    let new_height = match handle.vertical() {
        -1 => height - dy,
        0 => height,
        _ => height + dy,
    }
    .max(MIN_LAYER_SIZE);

    let mut sx = new_width / width;
    let mut sy = new_height / height;
    if keep_aspect && handle.is_corner() {
        let aspect = width / height;
        if dx.abs() >= dy.abs() * aspect {
            sy = sx;
        } else {
            sx = sy;
        }
    }

    let pivot = Point::new(
        if handle.horizontal() == -1 {
            bounds.right()
        } else {
            bounds.x
        },
        if handle.vertical() == -1 {
            bounds.bottom()
        } else {
            bounds.y
        },
    );

    ResizeFactors { sx, sy, pivot }
}

/// Scale a layer transform about a shared pivot.
///
/// The layer center moves with the group, so a multi-selection resizes as
/// one rigid group. The layer's own axes scale by how far the on-screen box
/// stretches along them: a layer turned 90° takes `sy` on its width and `sx`
/// on its height.
#[must_use]
pub fn scale_transform(transform: &Transform, factors: &ResizeFactors) -> Transform {
    let center = transform.center();
    let pivot = factors.pivot;
    let new_center = Point::new(
        (center.x - pivot.x).mul_add(factors.sx, pivot.x),
        (center.y - pivot.y).mul_add(factors.sy, pivot.y),
    );
    let (sin, cos) = transform.rotation.to_radians().sin_cos();
    let width_scale = (cos * factors.sx).hypot(sin * factors.sy);
    let height_scale = (sin * factors.sx).hypot(cos * factors.sy);
    let width = (transform.width * width_scale).max(MIN_LAYER_SIZE);
    let height = (transform.height * height_scale).max(MIN_LAYER_SIZE);
    Transform {
        x: new_center.x - width / 2.0,
        y: new_center.y - height / 2.0,
        width,
        height,
        rotation: transform.rotation,
    }
}

/// Resize a single rotated layer by dragging `handle` of its on-screen box.
///
/// The handle maps to the nearest handle of the layer's own frame and the
/// pointer travel is measured along the layer's axes. The opposite edge or
/// corner stays put on screen.
#[must_use]
pub fn resize_in_layer_frame(
    transform: &Transform,
    handle: Handle,
    screen_bounds: Rect,
    start: Point,
    current: Point,
    keep_aspect: bool,
) -> Transform {
    let center = transform.center();
    let local = Rect::new(0.0, 0.0, transform.width, transform.height);
    let to_canvas = |p: Point| {
        rotate_about(
            Point::new(transform.x + p.x, transform.y + p.y),
            center,
            transform.rotation,
        )
    };

    let grabbed = handle.position(screen_bounds);
    let local_handle = Handle::ALL
        .into_iter()
        .filter(|h| h.is_corner() == handle.is_corner())
        .min_by(|a, b| {
            let da = to_canvas(a.position(local)).distance(grabbed);
            let db = to_canvas(b.position(local)).distance(grabbed);
            da.total_cmp(&db)
        })
        .unwrap_or(handle);

    let along = rotate_about(current, start, -transform.rotation);
    let factors = resize_factors(
        local_handle,
        local,
        along.x - start.x,
        along.y - start.y,
        keep_aspect,
    );

    let pivot = factors.pivot;
    let local_center = local.center();
    let new_center = to_canvas(Point::new(
        (local_center.x - pivot.x).mul_add(factors.sx, pivot.x),
        (local_center.y - pivot.y).mul_add(factors.sy, pivot.y),
    ));
    let width = (transform.width * factors.sx).max(MIN_LAYER_SIZE);
    let height = (transform.height * factors.sy).max(MIN_LAYER_SIZE);
    Transform {
        x: new_center.x - width / 2.0,
        y: new_center.y - height / 2.0,
        width,
        height,
        rotation: transform.rotation,
    }
}

/// Angle from `center` to `point` in degrees.
#[must_use]
pub fn angle_degrees(center: Point, point: Point) -> f32 {
    (point.y - center.y).atan2(point.x - center.x).to_degrees()
}

/// New rotation after dragging from `start` to `current` around `center`.
#[must_use]
pub fn rotation_for(center: Point, start: Point, current: Point, initial: f32, snap: bool) -> f32 {
    let rotation = initial + angle_degrees(center, current) - angle_degrees(center, start);
    if snap {
        (rotation / ROTATION_SNAP_DEGREES).round() * ROTATION_SNAP_DEGREES
    } else {
        rotation
    }
}

/// The pointer interaction currently in progress.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Interaction {
    /// Nothing in progress.
    #[default]
    Idle,

    /// Dragging selected layers.
    Move {
        /// Pointer position at pointer-down.
        start: Point,
        /// Stack when the move began.
        origin: LayerStack,
        /// Layers being moved.
        moving: Vec<LayerId>,
        /// Bounding box of `moving` in `origin`.
        start_bounds: Rect,
    },

    /// Alt-drag armed; duplicates on the first pointer-move.
    DuplicateMove {
        /// Pointer position at pointer-down.
        start: Point,
    },

    /// Dragging a resize handle.
    Resize {
        /// Handle being dragged.
        handle: Handle,
        /// Pointer position at pointer-down.
        start: Point,
        /// Stack when the resize began.
        origin: LayerStack,
        /// Layers being resized.
        targets: Vec<LayerId>,
        /// Shared bounding box of `targets` in `origin`.
        start_bounds: Rect,
    },

    /// Dragging the rotate handle of a single layer.
    Rotate {
        /// Layer being rotated.
        layer: LayerId,
        /// Rotation pivot (layer center).
        center: Point,
        /// Pointer position at pointer-down.
        start: Point,
        /// Rotation when the drag began.
        initial_rotation: f32,
    },

    /// Dragging a selection rectangle.
    Marquee {
        /// Pointer position at pointer-down.
        start: Point,
        /// Latest pointer position.
        current: Point,
        /// Whether hits are added to the prior selection.
        additive: bool,
        /// Selection before the marquee began (kept when additive).
        base: Vec<LayerId>,
        /// Whether the pointer ever left the click threshold.
        dragged: bool,
    },

    /// Dragging out the handles of the pen node just placed.
    PenHandle {
        /// Anchor of the node being edited.
        anchor: Point,
    },
}

impl Interaction {
    /// Whether no interaction is in progress.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Short name of the state, for logs and host UIs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Move { .. } => "move",
            Self::DuplicateMove { .. } => "duplicate-move",
            Self::Resize { .. } => "resize",
            Self::Rotate { .. } => "rotate",
            Self::Marquee { .. } => "marquee",
            Self::PenHandle { .. } => "pen-path-building",
        }
    }

    /// Current marquee rectangle, if a marquee drag is in progress.
    #[must_use]
    pub fn marquee_rect(&self) -> Option<Rect> {
        match self {
            Self::Marquee {
                start,
                current,
                dragged: true,
                ..
            } => Some(Rect::from_points(*start, *current)),
            _ => None,
        }
    }
}
