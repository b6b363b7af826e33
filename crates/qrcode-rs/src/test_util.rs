//! Lossless rasterisation helpers shared by the decoder-side tests.

use crate::bit_matrix::BitMatrix;
use crate::qr_code::QrCode;

/// Renders a symbol into a BitMatrix at `scale` pixels per module with a
/// quiet zone of `margin` modules on every side.
pub fn rasterize(qr: &QrCode, scale: i32, margin: i32) -> BitMatrix {
    let size = qr.size();
    let px = (size + 2 * margin) * scale;
    let mut matrix = BitMatrix::new(px as u32, px as u32);
    for y in 0..size {
        for x in 0..size {
            if qr.get_module(x, y) {
                matrix.set_region((x + margin) * scale, (y + margin) * scale, scale, scale);
            }
        }
    }
    matrix
}

/// Renders a symbol as a tightly-packed RGBA buffer, dark modules black
/// on a white quiet zone. Returns (pixels, width, height).
pub fn rasterize_rgba(qr: &QrCode, scale: i32, margin: i32) -> (Vec<u8>, u32, u32) {
    let matrix = rasterize(qr, scale, margin);
    let (w, h) = (matrix.width(), matrix.height());
    let mut data = Vec::with_capacity((w * h * 4) as usize);
    for y in 0..h {
        for x in 0..w {
            let v = if matrix.get(x, y) { 0u8 } else { 255u8 };
            data.extend_from_slice(&[v, v, v, 255]);
        }
    }
    (data, w as u32, h as u32)
}

/// Rotates an RGBA buffer by 180 degrees.
pub fn rotate_rgba_half_turn(data: &[u8], width: u32, height: u32) -> Vec<u8> {
    let mut rotated = vec![0u8; data.len()];
    let (w, h) = (width as usize, height as usize);
    for y in 0..h {
        for x in 0..w {
            let src = (y * w + x) * 4;
            let dst = ((h - 1 - y) * w + (w - 1 - x)) * 4;
            rotated[dst..dst + 4].copy_from_slice(&data[src..src + 4]);
        }
    }
    rotated
}
