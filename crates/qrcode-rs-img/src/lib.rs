//! Image-file collaborator for the `qrcode-rs` codec: renders encoded
//! symbols to monochrome PNG or GIF bytes, and feeds image files or
//! buffers through the decoder as RGBA.

use std::io::Cursor;
use std::path::Path;

use image::codecs::gif::GifEncoder;
use image::{DynamicImage, Frame, ImageBuffer, ImageFormat, Luma};
use qrcode_rs::{decode_rgba_with_options, DecodeOptions, Decoded, QrCode};

mod error;

pub use error::QrImageError;

// Paints the symbol dark-on-light with a light quiet zone around it.
fn paint(qr: &QrCode, module_size: u32, margin: u32) -> ImageBuffer<Luma<u8>, Vec<u8>> {
    let total = (qr.size() as u32 + 2 * margin) * module_size;
    ImageBuffer::from_fn(total, total, |x, y| {
        let mx = (x / module_size) as i32 - margin as i32;
        let my = (y / module_size) as i32 - margin as i32;
        if qr.get_module(mx, my) {
            Luma([0u8])
        } else {
            Luma([255u8])
        }
    })
}

/// Renders a symbol as PNG bytes at `module_size` pixels per module with
/// a `margin`-module quiet zone (the standard wants at least 4).
pub fn render_png(qr: &QrCode, module_size: u32, margin: u32) -> Result<Vec<u8>, QrImageError> {
    if module_size == 0 {
        return Err(QrImageError::InvalidRenderParameters);
    }
    let mut w = Cursor::new(Vec::new());
    DynamicImage::ImageLuma8(paint(qr, module_size, margin)).write_to(&mut w, ImageFormat::Png)?;
    Ok(w.into_inner())
}

/// Renders a symbol as a single-frame GIF.
pub fn render_gif(qr: &QrCode, module_size: u32, margin: u32) -> Result<Vec<u8>, QrImageError> {
    if module_size == 0 {
        return Err(QrImageError::InvalidRenderParameters);
    }
    let rgba = DynamicImage::ImageLuma8(paint(qr, module_size, margin)).into_rgba8();
    let mut buffer = Vec::new();
    {
        let mut encoder = GifEncoder::new(&mut buffer);
        encoder.encode_frame(Frame::new(rgba))?;
    }
    Ok(buffer)
}

/// Runs the decoder over any image buffer the `image` crate can load.
///
/// Returns `Ok(None)` when the image loads but holds no readable symbol.
pub fn decode_image_bytes(
    buffer: &[u8],
    options: DecodeOptions,
) -> Result<Option<Decoded>, QrImageError> {
    let dynamic_image = image::load_from_memory(buffer)?;
    Ok(decode_loaded(dynamic_image, options))
}

/// Runs the decoder over an image file.
pub fn decode_image_file(
    path: impl AsRef<Path>,
    options: DecodeOptions,
) -> Result<Option<Decoded>, QrImageError> {
    let dynamic_image = image::open(path)?;
    Ok(decode_loaded(dynamic_image, options))
}

fn decode_loaded(dynamic_image: DynamicImage, options: DecodeOptions) -> Option<Decoded> {
    let rgba = dynamic_image.into_rgba8();
    let (width, height) = (rgba.width(), rgba.height());
    decode_rgba_with_options(rgba.as_raw(), width, height, options)
}

#[cfg(test)]
mod should {
    use super::*;
    use qrcode_rs::CodeEcc;

    #[test]
    fn round_trip_through_png() {
        let qr = QrCode::encode_text("PNG ROUND TRIP", CodeEcc::Medium).unwrap();
        let png = render_png(&qr, 4, 4).unwrap();
        assert_eq!(&png[1..4], b"PNG");
        let decoded = decode_image_bytes(&png, DecodeOptions::default()).unwrap().unwrap();
        assert_eq!(decoded.text, "PNG ROUND TRIP");
    }

    #[test]
    fn round_trip_through_gif() {
        let qr = QrCode::encode_text("GIF ROUND TRIP", CodeEcc::Medium).unwrap();
        let gif = render_gif(&qr, 4, 4).unwrap();
        assert_eq!(&gif[..3], b"GIF");
        let decoded = decode_image_bytes(&gif, DecodeOptions::default()).unwrap().unwrap();
        assert_eq!(decoded.text, "GIF ROUND TRIP");
    }

    #[test]
    fn reject_a_zero_module_size() {
        let qr = QrCode::encode_text("X", CodeEcc::Low).unwrap();
        assert!(matches!(
            render_png(&qr, 0, 4),
            Err(QrImageError::InvalidRenderParameters)
        ));
    }

    #[test]
    fn surface_image_errors_on_garbage_input() {
        assert!(matches!(
            decode_image_bytes(&[0x00, 0x01, 0x02], DecodeOptions::default()),
            Err(QrImageError::Image(_))
        ));
    }

    #[test]
    fn report_no_symbol_in_a_plain_image() {
        let blank = ImageBuffer::from_pixel(64, 64, Luma([255u8]));
        let mut w = Cursor::new(Vec::new());
        DynamicImage::ImageLuma8(blank).write_to(&mut w, ImageFormat::Png).unwrap();
        let result = decode_image_bytes(&w.into_inner(), DecodeOptions::default()).unwrap();
        assert!(result.is_none());
    }
}
