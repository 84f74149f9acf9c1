use super::*;

use std::io::Cursor;

use crate::config::EngineConfig;

fn png_bytes(width: u32, height: u32, pixel: [u8; 4]) -> Vec<u8> {
    let mut img = image::RgbaImage::new(width, height);
    for px in img.pixels_mut() {
        *px = image::Rgba(pixel);
    }
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

#[test]
fn decode_premultiplies_alpha() {
    let bytes = png_bytes(2, 1, [255, 0, 0, 128]);
    let handle = decode_image("ipfs://x", &bytes).unwrap();
    assert_eq!((handle.width, handle.height), (2, 1));
    // 255 * 128 / 255 rounds to 128.
    assert_eq!(handle.rgba8_premul[0], 128);
    assert_eq!(handle.rgba8_premul[3], 128);
}

#[test]
fn decode_zero_alpha_clears_color_channels() {
    let bytes = png_bytes(1, 1, [200, 200, 200, 0]);
    let handle = decode_image("ipfs://x", &bytes).unwrap();
    assert_eq!(&handle.rgba8_premul[..], &[0, 0, 0, 0]);
}

#[test]
fn undecodable_bytes_are_an_error() {
    assert!(decode_image("ipfs://x", b"not an image").is_err());
}

#[test]
fn cache_is_keyed_by_uri() {
    let cache = ImageCache::new();
    assert!(cache.is_empty());

    let handle = decode_image("ipfs://a", &png_bytes(1, 1, [1, 2, 3, 255])).unwrap();
    cache.insert(handle);
    assert_eq!(cache.len(), 1);
    assert!(cache.get("ipfs://a").is_some());
    assert!(cache.get("ipfs://b").is_none());
}

#[tokio::test]
async fn valid_cached_handle_short_circuits_http_source() {
    let source = HttpLayerSource::new(
        GatewayClient::new(EngineConfig {
            gateways: vec![],
            ..EngineConfig::default()
        })
        .unwrap(),
    );

    let cached = decode_image("ipfs://a", &png_bytes(1, 1, [9, 9, 9, 255])).unwrap();
    // No gateways are configured, so anything but the cached path would fail.
    let handle = source
        .load_image("ipfs://a", Some(cached), &|_| {})
        .await
        .unwrap();
    assert_eq!(handle.uri, "ipfs://a");

    // A handle for another URI is not valid and must not be returned.
    let stale = decode_image("ipfs://other", &png_bytes(1, 1, [9, 9, 9, 255])).unwrap();
    assert!(source.load_image("ipfs://a", Some(stale), &|_| {}).await.is_err());
}
