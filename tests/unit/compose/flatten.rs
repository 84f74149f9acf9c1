use super::*;

use std::sync::Arc;

use kurbo::Rect;

use crate::fetch::loader::ImageHandle;

fn solid_layer(id: &str, w: u32, h: u32, pixel: [u8; 4], frame: Rect, opacity: f64) -> RenderedLayer {
    let mut bytes = Vec::with_capacity((w as usize) * (h as usize) * 4);
    for _ in 0..(w * h) {
        bytes.extend_from_slice(&pixel);
    }
    RenderedLayer {
        id: id.to_string(),
        source_uri: format!("ipfs://{id}"),
        image: ImageHandle {
            uri: format!("ipfs://{id}"),
            width: w,
            height: h,
            rgba8_premul: Arc::new(bytes),
        },
        natural_width: w,
        natural_height: h,
        frame,
        opacity,
    }
}

#[test]
fn single_opaque_layer_at_origin_reproduces_pixels() {
    let layer = solid_layer(
        "a",
        2,
        2,
        [10, 20, 30, 255],
        Rect::new(0.0, 0.0, 2.0, 2.0),
        1.0,
    );
    let frame = flatten(2, 2, std::slice::from_ref(&layer)).unwrap();
    assert_eq!(frame.rgba8_premul, *layer.image.rgba8_premul);
}

#[test]
fn later_layers_composite_over_earlier_ones() {
    let below = solid_layer(
        "below",
        1,
        1,
        [200, 0, 0, 255],
        Rect::new(0.0, 0.0, 1.0, 1.0),
        1.0,
    );
    let above = solid_layer(
        "above",
        1,
        1,
        [0, 200, 0, 255],
        Rect::new(0.0, 0.0, 1.0, 1.0),
        1.0,
    );
    let frame = flatten(1, 1, &[below, above]).unwrap();
    assert_eq!(&frame.rgba8_premul[..], &[0, 200, 0, 255]);
}

#[test]
fn offsets_and_clipping_place_pixels_correctly() {
    let layer = solid_layer(
        "a",
        2,
        1,
        [50, 50, 50, 255],
        // One pixel lands at (2, 1), the other is clipped off-canvas.
        Rect::new(2.0, 1.0, 4.0, 2.0),
        1.0,
    );
    let frame = flatten(3, 2, &[layer]).unwrap();
    let px = |x: usize, y: usize| {
        let i = (y * 3 + x) * 4;
        [
            frame.rgba8_premul[i],
            frame.rgba8_premul[i + 1],
            frame.rgba8_premul[i + 2],
            frame.rgba8_premul[i + 3],
        ]
    };
    assert_eq!(px(2, 1), [50, 50, 50, 255]);
    assert_eq!(px(0, 0), [0, 0, 0, 0]);
    assert_eq!(px(1, 1), [0, 0, 0, 0]);
}

#[test]
fn zero_opacity_layer_leaves_canvas_untouched() {
    let layer = solid_layer(
        "a",
        1,
        1,
        [255, 255, 255, 255],
        Rect::new(0.0, 0.0, 1.0, 1.0),
        0.0,
    );
    let frame = flatten(1, 1, &[layer]).unwrap();
    assert_eq!(&frame.rgba8_premul[..], &[0, 0, 0, 0]);
}

#[test]
fn half_opacity_halves_contribution() {
    let layer = solid_layer(
        "a",
        1,
        1,
        [255, 255, 255, 255],
        Rect::new(0.0, 0.0, 1.0, 1.0),
        0.5,
    );
    let frame = flatten(1, 1, &[layer]).unwrap();
    // 255 * 128/255 rounds to 128.
    assert_eq!(&frame.rgba8_premul[..], &[128, 128, 128, 128]);
}

#[test]
fn degenerate_canvas_is_rejected() {
    assert!(flatten(0, 10, &[]).is_err());
}

#[test]
fn over_operator_matches_premultiplied_source_over() {
    // Opaque source replaces destination.
    assert_eq!(
        over([10, 10, 10, 255], [200, 0, 0, 255], 1.0),
        [200, 0, 0, 255]
    );
    // Transparent source leaves destination.
    assert_eq!(over([10, 10, 10, 255], [0, 0, 0, 0], 1.0), [10, 10, 10, 255]);
}
