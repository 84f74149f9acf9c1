use image::{RgbaImage, imageops};

use crate::{
    compose::orchestrator::RenderedLayer,
    foundation::error::{LaminaError, LaminaResult},
};

/// Flattened frame in premultiplied RGBA8.
#[derive(Clone, Debug)]
pub struct FrameRgba {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Row-major premultiplied RGBA8 bytes.
    pub rgba8_premul: Vec<u8>,
}

/// Collapse an ordered layer stack into one frame.
///
/// Layers composite bottom-up with source-over onto a transparent canvas,
/// each resampled to its resolved pixel box and weighted by its resolved
/// opacity. Boxes extending past the canvas are clipped.
pub fn flatten(width: u32, height: u32, layers: &[RenderedLayer]) -> LaminaResult<FrameRgba> {
    if width == 0 || height == 0 {
        return Err(LaminaError::validation(
            "flatten canvas dimensions must be > 0",
        ));
    }

    let mut dst = vec![0u8; (width as usize) * (height as usize) * 4];
    for layer in layers {
        blit_layer(&mut dst, width, height, layer)?;
    }

    Ok(FrameRgba {
        width,
        height,
        rgba8_premul: dst,
    })
}

fn blit_layer(
    dst: &mut [u8],
    dst_w: u32,
    dst_h: u32,
    layer: &RenderedLayer,
) -> LaminaResult<()> {
    let box_w = layer.frame.width().round().max(0.0) as u32;
    let box_h = layer.frame.height().round().max(0.0) as u32;
    if box_w == 0 || box_h == 0 || layer.opacity <= 0.0 {
        return Ok(());
    }

    let src = resample(layer, box_w, box_h)?;
    let left = layer.frame.x0.round() as i64;
    let top = layer.frame.y0.round() as i64;
    let opacity = layer.opacity.clamp(0.0, 1.0) as f32;

    for sy in 0..box_h {
        let dy = top + i64::from(sy);
        if dy < 0 || dy >= i64::from(dst_h) {
            continue;
        }
        for sx in 0..box_w {
            let dx = left + i64::from(sx);
            if dx < 0 || dx >= i64::from(dst_w) {
                continue;
            }
            let si = ((sy as usize) * (box_w as usize) + (sx as usize)) * 4;
            let di = ((dy as usize) * (dst_w as usize) + (dx as usize)) * 4;
            let blended = over(
                [dst[di], dst[di + 1], dst[di + 2], dst[di + 3]],
                [src[si], src[si + 1], src[si + 2], src[si + 3]],
                opacity,
            );
            dst[di..di + 4].copy_from_slice(&blended);
        }
    }
    Ok(())
}

fn resample(layer: &RenderedLayer, box_w: u32, box_h: u32) -> LaminaResult<Vec<u8>> {
    let image = RgbaImage::from_raw(
        layer.natural_width,
        layer.natural_height,
        layer.image.rgba8_premul.as_ref().clone(),
    )
    .ok_or_else(|| {
        LaminaError::validation(format!(
            "layer '{}' pixel buffer does not match its dimensions",
            layer.id
        ))
    })?;

    if layer.natural_width == box_w && layer.natural_height == box_h {
        return Ok(image.into_raw());
    }
    // Premultiplied channels resample without fringing artifacts.
    Ok(imageops::resize(&image, box_w, box_h, imageops::FilterType::Triangle).into_raw())
}

/// Source-over for premultiplied RGBA8 with an extra opacity weight.
pub fn over(dst: [u8; 4], src: [u8; 4], opacity: f32) -> [u8; 4] {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 || src[3] == 0 {
        return dst;
    }

    let op = ((opacity * 255.0).round() as i32).clamp(0, 255) as u16;
    let sa = mul_div255(u16::from(src[3]), op);
    if sa == 0 {
        return dst;
    }

    let inv = 255u16 - u16::from(sa);
    let mut out = [0u8; 4];
    out[3] = mul_div255(u16::from(dst[3]), inv).saturating_add(sa);
    for i in 0..3 {
        let sc = mul_div255(u16::from(src[i]), op);
        let dc = mul_div255(u16::from(dst[i]), inv);
        out[i] = sc.saturating_add(dc);
    }
    out
}

fn mul_div255(x: u16, y: u16) -> u8 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u8
}

#[cfg(test)]
#[path = "../../tests/unit/compose/flatten.rs"]
mod tests;
