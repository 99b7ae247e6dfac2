//! Geometry primitives and the canvas ⇄ layer-local coordinate transforms.
//!
//! The forward render transform of a layer is "translate to the box, then
//! rotate about the box center". Hit-testing and pen paths go through
//! [`canvas_point_to_layer_local`], which must stay the exact inverse of
//! [`layer_local_to_canvas`] or selections drift away from the pixels.

use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

use crate::layer::Layer;

/// A point in canvas (or layer-local) coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate.
    pub x: f32,
    /// Y coordinate.
    pub y: f32,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Reflect `self` through `pivot`.
    #[must_use]
    pub fn mirrored_about(self, pivot: Self) -> Self {
        Self::new(2.0f32.mul_add(pivot.x, -self.x), 2.0f32.mul_add(pivot.y, -self.y))
    }
}

impl Add for Point {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// An axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Width (never negative).
    pub width: f32,
    /// Height (never negative).
    pub height: f32,
}

impl Rect {
    /// Create a rectangle from its top-left corner and size.
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Normalized rectangle spanning two arbitrary corner points.
    #[must_use]
    pub fn from_points(a: Point, b: Point) -> Self {
        let x = a.x.min(b.x);
        let y = a.y.min(b.y);
        Self::new(x, y, (a.x - b.x).abs(), (a.y - b.y).abs())
    }

    /// Right edge.
    #[must_use]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Bottom edge.
    #[must_use]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Center point.
    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Whether the point lies inside (edges inclusive).
    #[must_use]
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x && point.x <= self.right() && point.y >= self.y && point.y <= self.bottom()
    }

    /// Whether two rectangles overlap or touch.
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        self.x <= other.right()
            && other.x <= self.right()
            && self.y <= other.bottom()
            && other.y <= self.bottom()
    }

    /// Smallest rectangle covering both.
    #[must_use]
    pub fn union(self, other: Self) -> Self {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Self::new(x, y, right - x, bottom - y)
    }

    /// Rectangle shifted by a delta.
    #[must_use]
    pub fn translate(self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// Smallest rectangle covering a set of points, `None` when empty.
    #[must_use]
    pub fn covering(points: impl IntoIterator<Item = Point>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let (mut min, mut max) = (first, first);
        for p in iter {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
        Some(Self::from_points(min, max))
    }
}

/// Rotate `point` about `center` by `degrees` (clockwise on a y-down canvas).
#[must_use]
pub fn rotate_about(point: Point, center: Point, degrees: f32) -> Point {
    let (sin, cos) = degrees.to_radians().sin_cos();
    let dx = point.x - center.x;
    let dy = point.y - center.y;
    Point::new(
        center.x + dx.mul_add(cos, -(dy * sin)),
        center.y + dx.mul_add(sin, dy * cos),
    )
}

/// Normalize an angle in degrees into `[0, 360)` for display.
#[must_use]
pub fn normalize_degrees(degrees: f32) -> f32 {
    degrees.rem_euclid(360.0)
}

/// Smallest axis-aligned rectangle covering every given layer.
///
/// Rotated layers contribute the box around their four rotated corners.
/// Returns `None` for an empty input: "no selection" has no bounding box.
#[must_use]
pub fn bounding_box_of<'a>(layers: impl IntoIterator<Item = &'a Layer>) -> Option<Rect> {
    layers.into_iter().map(Layer::bounds).reduce(Rect::union)
}

/// Map a canvas-space point into the layer's own `0..width × 0..height` frame.
#[must_use]
pub fn canvas_point_to_layer_local(point: Point, layer: &Layer) -> Point {
    let t = &layer.transform;
    let unrotated = rotate_about(point, t.center(), -t.rotation);
    Point::new(unrotated.x - t.x, unrotated.y - t.y)
}

/// Map a layer-local point back into canvas space.
#[must_use]
pub fn layer_local_to_canvas(point: Point, layer: &Layer) -> Point {
    let t = &layer.transform;
    let placed = Point::new(t.x + point.x, t.y + point.y);
    rotate_about(placed, t.center(), t.rotation)
}
