use image::ImageError;
use qrcode_rs::QrError;
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QrImageError {
    #[error("image error: {0}")]
    Image(#[from] ImageError),

    #[error("qr error: {0}")]
    Qr(#[from] QrError),

    #[error("invalid render parameters: module size and margin must be non-zero sized")]
    InvalidRenderParameters,
}
