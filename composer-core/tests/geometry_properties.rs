//! Property tests for layer geometry.

use composer_core::{
    bounding_box_of, canvas_point_to_layer_local, layer_local_to_canvas, Layer, Point, ShapeKind,
    Transform,
};
use proptest::prelude::*;

fn layer_strategy() -> impl Strategy<Value = Layer> {
    (
        -2000.0f32..2000.0,
        -2000.0f32..2000.0,
        1.0f32..1500.0,
        1.0f32..1500.0,
        -720.0f32..720.0,
    )
        .prop_map(|(x, y, width, height, rotation)| {
            Layer::shape(ShapeKind::Rectangle, "#000").with_transform(Transform {
                x,
                y,
                width,
                height,
                rotation,
            })
        })
}

proptest! {
    #[test]
    fn inverse_transform_roundtrips(
        layer in layer_strategy(),
        px in -3000.0f32..3000.0,
        py in -3000.0f32..3000.0,
    ) {
        let point = Point::new(px, py);
        let back = layer_local_to_canvas(canvas_point_to_layer_local(point, &layer), &layer);
        prop_assert!((back.x - point.x).abs() < 0.05, "x: {} vs {}", back.x, point.x);
        prop_assert!((back.y - point.y).abs() < 0.05, "y: {} vs {}", back.y, point.y);
    }

    #[test]
    fn bounding_box_covers_rotated_corners(layers in prop::collection::vec(layer_strategy(), 1..6)) {
        let bounds = bounding_box_of(&layers).expect("non-empty input has bounds");
        for layer in &layers {
            for corner in layer.corners() {
                prop_assert!(corner.x >= bounds.x - 1e-2 && corner.x <= bounds.right() + 1e-2);
                prop_assert!(corner.y >= bounds.y - 1e-2 && corner.y <= bounds.bottom() + 1e-2);
            }
        }
    }

    #[test]
    fn unrotated_bounding_box_is_exact(
        x in -2000.0f32..2000.0,
        y in -2000.0f32..2000.0,
        width in 1.0f32..1500.0,
        height in 1.0f32..1500.0,
    ) {
        let layer = Layer::shape(ShapeKind::Ellipse, "#fff").with_transform(Transform {
            x,
            y,
            width,
            height,
            rotation: 0.0,
        });
        let bounds = bounding_box_of([&layer]).expect("bounds");
        prop_assert_eq!(bounds, layer.transform.rect());
    }
}

#[test]
fn empty_input_has_no_bounding_box() {
    let none: Vec<Layer> = Vec::new();
    assert!(bounding_box_of(&none).is_none());
}
