//! The decoder pipeline: binarize, locate, extract, decode, with the
//! configured inversion passes and a mirrored retry on the sampled
//! matrix before a located symbol is given up.

use serde::{Deserialize, Serialize};

use crate::binarize::binarize;
use crate::bit_matrix::BitMatrix;
use crate::decode_data::{decode_data, Chunk, DecodedData};
use crate::decode_matrix::decode_matrix;
use crate::error::QrError;
use crate::extract::extract;
use crate::locate::{locate, Point};
use crate::version::Version;

/// Which binarisation polarities a decode call tries, and in what order.
///
/// Symbols printed light-on-dark only read through the inverted image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InversionAttempts {
    /// Only the normal dark-on-light reading.
    #[default]
    DontInvert,
    /// Only the inverted reading.
    OnlyInvert,
    /// Normal first, inverted second.
    AttemptBoth,
    /// Inverted first, normal second.
    InvertFirst,
}

/// Decoder configuration. Plain data, one knob so far.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecodeOptions {
    pub inversion_attempts: InversionAttempts,
}

/// Where the symbol sits in the image: the three finder centres and the
/// alignment anchor that located it, plus the four sampled-grid corners
/// mapped back to pixel space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub top_left: Point,
    pub top_right: Point,
    pub bottom_left: Point,
    pub alignment_pattern: Point,
    pub top_left_corner: Point,
    pub top_right_corner: Point,
    pub bottom_right_corner: Point,
    pub bottom_left_corner: Point,
}

/// A successfully decoded symbol.
///
/// The decoder never partially returns: every field is populated, or the
/// decode call yields `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decoded {
    /// The concatenated textual content of all data segments.
    pub text: String,
    /// The raw content bytes (UTF-8 for byte segments, ASCII for numeric
    /// and alphanumeric, Shift-JIS pairs for kanji).
    pub bytes: Vec<u8>,
    /// The typed segments in payload order.
    pub chunks: Vec<Chunk>,
    /// The symbol version, 1 to 40.
    pub version: u8,
    pub location: Location,
}

/// Decodes the first QR symbol found in a tightly-packed RGBA buffer,
/// with default options.
pub fn decode_rgba(data: &[u8], width: u32, height: u32) -> Option<Decoded> {
    decode_rgba_with_options(data, width, height, DecodeOptions::default())
}

/// Decodes with explicit options. Returns `None` when every configured
/// pass fails; a malformed buffer (wrong length) never panics.
pub fn decode_rgba_with_options(
    data: &[u8],
    width: u32,
    height: u32,
    options: DecodeOptions,
) -> Option<Decoded> {
    if (width * height) == 0 || data.len() != (width as usize) * (height as usize) * 4 {
        return None;
    }
    use InversionAttempts::*;
    let binarized = binarize(
        data,
        width,
        height,
        !matches!(options.inversion_attempts, DontInvert),
    );
    let normal = binarized.matrix;
    let inverted = binarized.inverted;

    match options.inversion_attempts {
        DontInvert => scan(&normal),
        OnlyInvert => inverted.as_ref().and_then(scan),
        AttemptBoth => scan(&normal).or_else(|| inverted.as_ref().and_then(scan)),
        InvertFirst => inverted.as_ref().and_then(scan).or_else(|| scan(&normal)),
    }
}

// One full pass over one polarity of the binarized image.
fn scan(image: &BitMatrix) -> Option<Decoded> {
    let location = locate(image)?;
    let extracted = extract(image, &location);
    let (payload, version) = decode_with_mirror_retry(&extracted.matrix)?;

    let d = location.dimension as f64;
    let corner = |x: f64, y: f64| extracted.transform.apply(x, y);
    Some(Decoded {
        text: payload.text,
        bytes: payload.bytes,
        chunks: payload.chunks,
        version: version.value(),
        location: Location {
            top_left: location.top_left,
            top_right: location.top_right,
            bottom_left: location.bottom_left,
            alignment_pattern: location.alignment_pattern,
            top_left_corner: corner(0.0, 0.0),
            top_right_corner: corner(d, 0.0),
            bottom_right_corner: corner(d, d),
            bottom_left_corner: corner(0.0, d),
        },
    })
}

// Soft failures get one more chance with the matrix mirrored across the
// main diagonal, which undoes a transposed sampling.
fn decode_with_mirror_retry(matrix: &BitMatrix) -> Option<(DecodedData, Version)> {
    match decode_sampled(matrix) {
        Ok(result) => Some(result),
        Err(_) => {
            let mut mirrored = matrix.clone();
            mirrored.mirror();
            decode_sampled(&mirrored).ok()
        }
    }
}

fn decode_sampled(matrix: &BitMatrix) -> Result<(DecodedData, Version), QrError> {
    let (codewords, version) = decode_matrix(matrix)?;
    let payload = decode_data(&codewords, version)?;
    Ok((payload, version))
}
