//! Layers - the atomic editable units of a composition.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geometry::{canvas_point_to_layer_local, rotate_about, Point, Rect};

/// Smallest width/height a layer can be resized to.
pub const MIN_LAYER_SIZE: f32 = 1.0;

/// Default content of a freshly added text layer.
pub const DEFAULT_TEXT: &str = "Hello World";

/// Unique identifier for a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LayerId(Uuid);

impl LayerId {
    /// Create a new unique layer ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create from an existing UUID.
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Parse a layer ID from its string form.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not a valid UUID.
    pub fn parse(value: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(value).map(Self)
    }
}

impl Default for LayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for LayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Pixel compositing operator used when painting a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[allow(missing_docs)]
pub enum BlendMode {
    /// Source-over; the platform default operator.
    #[default]
    Normal,
    Multiply,
    Screen,
    Overlay,
    Darken,
    Lighten,
    ColorDodge,
    ColorBurn,
    HardLight,
    SoftLight,
    Difference,
    Exclusion,
    Hue,
    Saturation,
    Color,
    Luminosity,
}

/// Horizontal alignment of text lines inside the layer box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    /// Lines start at the left edge.
    Left,
    /// Lines are centered.
    #[default]
    Center,
    /// Lines end at the right edge.
    Right,
}

/// Font slant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    /// Upright.
    #[default]
    Normal,
    /// Italic.
    Italic,
}

/// Case transform applied to text before layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextTransform {
    /// Text drawn as typed.
    #[default]
    None,
    /// ALL CAPS.
    Uppercase,
    /// all lower case.
    Lowercase,
    /// First Letter Of Each Word.
    Capitalize,
}

impl TextTransform {
    /// Apply the transform to a string.
    #[must_use]
    pub fn apply(self, text: &str) -> String {
        match self {
            Self::None => text.to_string(),
            Self::Uppercase => text.to_uppercase(),
            Self::Lowercase => text.to_lowercase(),
            Self::Capitalize => {
                let mut out = String::with_capacity(text.len());
                let mut at_word_start = true;
                for ch in text.chars() {
                    if at_word_start && ch.is_alphabetic() {
                        out.extend(ch.to_uppercase());
                        at_word_start = false;
                    } else {
                        out.push(ch);
                        at_word_start = ch.is_whitespace();
                    }
                }
                out
            }
        }
    }
}

/// Typography and content of a text layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    /// Text content; `\n` forces a line break.
    pub content: String,
    /// Font family name.
    pub font_family: String,
    /// Font size in pixels.
    pub font_size: f32,
    /// CSS-style numeric weight (400 regular, 700 bold).
    pub font_weight: u16,
    /// Upright or italic.
    #[serde(default)]
    pub font_style: FontStyle,
    /// Fill color as a CSS hex string.
    pub color: String,
    /// Horizontal alignment.
    #[serde(default)]
    pub align: TextAlign,
    /// Line height as a multiple of the font size.
    pub line_height: f32,
    /// Case transform.
    #[serde(default)]
    pub text_transform: TextTransform,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            content: DEFAULT_TEXT.to_string(),
            font_family: "sans-serif".to_string(),
            font_size: 48.0,
            font_weight: 400,
            font_style: FontStyle::Normal,
            color: "#000000".to_string(),
            align: TextAlign::Center,
            line_height: 1.2,
            text_transform: TextTransform::None,
        }
    }
}

impl TextStyle {
    /// Distance between consecutive baselines in pixels.
    #[must_use]
    pub fn line_height_px(&self) -> f32 {
        self.font_size * self.line_height
    }

    /// Whether the weight should render with a bold face.
    #[must_use]
    pub fn is_bold(&self) -> bool {
        self.font_weight >= 600
    }
}

/// Geometry of a shape layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    /// Box filling the whole layer.
    #[default]
    Rectangle,
    /// Ellipse inscribed in the layer box.
    Ellipse,
}

/// Variant payload of a layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum LayerKind {
    /// A raster image.
    Image {
        /// Raster source: data URL or file path.
        src: String,
        /// Decoded pixel width of the source.
        natural_width: u32,
        /// Decoded pixel height of the source.
        natural_height: u32,
    },

    /// A block of text.
    Text(TextStyle),

    /// A filled vector shape.
    Shape {
        /// Shape geometry.
        shape: ShapeKind,
        /// Fill color as a CSS hex string.
        fill: String,
    },
}

impl LayerKind {
    /// Short lowercase tag of the variant.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Image { .. } => "image",
            Self::Text(_) => "text",
            Self::Shape { .. } => "shape",
        }
    }
}

/// Position, size and rotation of a layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// X position of the unrotated box (pixels from canvas left).
    pub x: f32,
    /// Y position of the unrotated box (pixels from canvas top).
    pub y: f32,
    /// Width of the unrotated box.
    pub width: f32,
    /// Height of the unrotated box.
    pub height: f32,
    /// Rotation in degrees about the box center, stored unbounded.
    pub rotation: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 100.0,
            height: 100.0,
            rotation: 0.0,
        }
    }
}

impl Transform {
    /// Unrotated box.
    #[must_use]
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    /// Center of the box; the rotation pivot.
    #[must_use]
    pub fn center(&self) -> Point {
        self.rect().center()
    }
}

/// A layer with content, geometry and paint settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    /// Unique identifier, stable for the layer's lifetime.
    pub id: LayerId,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Content variant.
    pub kind: LayerKind,
    /// Position and size.
    pub transform: Transform,
    /// Opacity in percent, `0..=100`.
    pub opacity: f32,
    /// Compositing operator.
    #[serde(default)]
    pub blend_mode: BlendMode,
    /// Hidden layers are neither rendered nor hit-tested.
    pub visible: bool,
    /// Locked layers render but cannot be selected or transformed.
    pub locked: bool,
}

impl Layer {
    /// Create a new visible, unlocked, fully opaque layer.
    #[must_use]
    pub fn new(kind: LayerKind) -> Self {
        let name = match &kind {
            LayerKind::Image { .. } => "Image".to_string(),
            LayerKind::Text(style) => style.content.chars().take(24).collect(),
            LayerKind::Shape { shape, .. } => format!("{shape:?}"),
        };
        Self {
            id: LayerId::new(),
            name,
            kind,
            transform: Transform::default(),
            opacity: 100.0,
            blend_mode: BlendMode::Normal,
            visible: true,
            locked: false,
        }
    }

    /// Image layer sized to the source's natural dimensions.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn image(src: impl Into<String>, natural_width: u32, natural_height: u32) -> Self {
        Self::new(LayerKind::Image {
            src: src.into(),
            natural_width,
            natural_height,
        })
        .with_transform(Transform {
            width: natural_width.max(1) as f32,
            height: natural_height.max(1) as f32,
            ..Transform::default()
        })
    }

    /// Text layer with the given style.
    #[must_use]
    pub fn text(style: TextStyle) -> Self {
        Self::new(LayerKind::Text(style))
    }

    /// Shape layer with the given fill.
    #[must_use]
    pub fn shape(shape: ShapeKind, fill: impl Into<String>) -> Self {
        Self::new(LayerKind::Shape {
            shape,
            fill: fill.into(),
        })
    }

    /// Set the transform, clamping the size to [`MIN_LAYER_SIZE`].
    #[must_use]
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self.set_size(transform.width, transform.height);
        self
    }

    /// Set the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the opacity (clamped to `0..=100`).
    #[must_use]
    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.set_opacity(opacity);
        self
    }

    /// Set the blend mode.
    #[must_use]
    pub fn with_blend_mode(mut self, blend_mode: BlendMode) -> Self {
        self.blend_mode = blend_mode;
        self
    }

    /// Set the locked flag.
    #[must_use]
    pub fn with_locked(mut self, locked: bool) -> Self {
        self.locked = locked;
        self
    }

    /// Set the visibility flag.
    #[must_use]
    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    /// Resize the unrotated box, never below [`MIN_LAYER_SIZE`].
    pub fn set_size(&mut self, width: f32, height: f32) {
        self.transform.width = clamp_size(width);
        self.transform.height = clamp_size(height);
    }

    /// Set the opacity, clamped to `0..=100`.
    pub fn set_opacity(&mut self, opacity: f32) {
        self.opacity = if opacity.is_nan() {
            100.0
        } else {
            opacity.clamp(0.0, 100.0)
        };
    }

    /// Whether the layer takes part in hit-testing and selection.
    #[must_use]
    pub fn is_interactive(&self) -> bool {
        self.visible && !self.locked
    }

    /// The four corners of the rotated box, clockwise from top-left.
    #[must_use]
    pub fn corners(&self) -> [Point; 4] {
        let r = self.transform.rect();
        let c = r.center();
        let deg = self.transform.rotation;
        [
            rotate_about(Point::new(r.x, r.y), c, deg),
            rotate_about(Point::new(r.right(), r.y), c, deg),
            rotate_about(Point::new(r.right(), r.bottom()), c, deg),
            rotate_about(Point::new(r.x, r.bottom()), c, deg),
        ]
    }

    /// Axis-aligned bounds of the rotated box.
    ///
    /// Exactly the unrotated box when the rotation is a multiple of 360°.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        if crate::geometry::normalize_degrees(self.transform.rotation) == 0.0 {
            return self.transform.rect();
        }
        Rect::covering(self.corners()).unwrap_or_else(|| self.transform.rect())
    }

    /// Whether a canvas-space point falls inside the rotated box.
    #[must_use]
    pub fn contains_point(&self, point: Point) -> bool {
        let local = canvas_point_to_layer_local(point, self);
        local.x >= 0.0
            && local.y >= 0.0
            && local.x <= self.transform.width
            && local.y <= self.transform.height
    }

    /// Copy of this layer under a fresh id.
    #[must_use]
    pub fn duplicate(&self) -> Self {
        let mut copy = self.clone();
        copy.id = LayerId::new();
        copy.name = format!("{} copy", self.name);
        copy
    }
}

fn clamp_size(value: f32) -> f32 {
    if value.is_nan() {
        MIN_LAYER_SIZE
    } else {
        value.max(MIN_LAYER_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_is_clamped() {
        let mut layer = Layer::shape(ShapeKind::Rectangle, "#ff0000");
        layer.set_size(-5.0, 0.0);
        assert!((layer.transform.width - MIN_LAYER_SIZE).abs() < f32::EPSILON);
        assert!((layer.transform.height - MIN_LAYER_SIZE).abs() < f32::EPSILON);
    }

    #[test]
    fn opacity_is_clamped() {
        let layer = Layer::shape(ShapeKind::Ellipse, "#00ff00").with_opacity(140.0);
        assert!((layer.opacity - 100.0).abs() < f32::EPSILON);
        let layer = layer.with_opacity(-3.0);
        assert!(layer.opacity.abs() < f32::EPSILON);
    }

    #[test]
    fn rotated_contains_point() {
        let layer = Layer::shape(ShapeKind::Rectangle, "#000").with_transform(Transform {
            x: 0.0,
            y: 40.0,
            width: 100.0,
            height: 20.0,
            rotation: 90.0,
        });
        // Rotated 90° the box becomes tall and thin around (50, 50).
        assert!(layer.contains_point(Point::new(50.0, 5.0)));
        assert!(!layer.contains_point(Point::new(5.0, 50.0)));
    }

    #[test]
    fn text_transform_variants() {
        assert_eq!(TextTransform::Uppercase.apply("hello"), "HELLO");
        assert_eq!(TextTransform::Lowercase.apply("HeLLo"), "hello");
        assert_eq!(TextTransform::Capitalize.apply("hello big world"), "Hello Big World");
        assert_eq!(TextTransform::None.apply("As Is"), "As Is");
    }

    #[test]
    fn duplicate_gets_new_id() {
        let layer = Layer::image("data:image/png;base64,AAAA", 10, 10);
        let copy = layer.duplicate();
        assert_ne!(layer.id, copy.id);
        assert_eq!(layer.transform, copy.transform);
    }

    #[test]
    fn blend_mode_serializes_kebab_case() {
        let json = serde_json::to_string(&BlendMode::ColorDodge).expect("serialize");
        assert_eq!(json, "\"color-dodge\"");
    }

    #[test]
    fn layer_id_parse_roundtrip() {
        let id = LayerId::new();
        assert_eq!(LayerId::parse(&id.to_string()).expect("parse"), id);
        assert!(LayerId::parse("not-a-uuid").is_err());
    }
}
