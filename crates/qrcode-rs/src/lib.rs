//! Bidirectional QR Code codec: generates symbols from text strings and
//! byte arrays, and reads them back out of rasterised images.
//!
//! The encoder covers the QR Code Model 2 specification per ISO/IEC
//! 18004: all 40 versions (sizes), all 4 error correction levels, and the
//! numeric, alphanumeric, byte (UTF-8) and kanji (Shift-JIS) character
//! encoding modes. The decoder runs the inverse pipeline over a raw RGBA
//! pixel buffer: adaptive binarisation, finder/alignment pattern
//! location, perspective extraction, format and version recovery,
//! de-masking, de-interleaving, Reed-Solomon correction and segment
//! parsing, with optional inverted-image and mirrored-matrix retries.
//!
//! # Encoding
//!
//! ```
//! use qrcode_rs::{CodeEcc, QrCode};
//!
//! let qr = QrCode::encode_text("Hello, world!", CodeEcc::Medium).unwrap();
//! for y in 0..qr.size() {
//!     for x in 0..qr.size() {
//!         let _dark = qr.get_module(x, y);
//!         // ... paint the module ...
//!     }
//! }
//! ```
//!
//! Manual parameters: minimum and maximum version, a forced mask pattern,
//! and error-correction boosting are available through
//! `QrCode::encode_segments_advanced`, and custom segment lists allow
//! mode switching mid-payload.
//!
//! # Decoding
//!
//! ```no_run
//! use qrcode_rs::decode_rgba;
//!
//! # let (pixels, width, height): (Vec<u8>, u32, u32) = (vec![], 0, 0);
//! if let Some(found) = decode_rgba(&pixels, width, height) {
//!     println!("{} (version {})", found.text, found.version);
//! }
//! ```

// The set of all legal characters in alphanumeric mode,
// where each character value maps to the index in the string.
pub static ALPHANUMERIC_CHARSET: &str = "0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ $%*+-./:";

mod binarize;
mod bit_buffer;
mod bit_matrix;
mod code_ecc;
mod decode_data;
mod decode_matrix;
mod decoder;
mod error;
mod extract;
mod finder_penalty;
mod gf256;
mod kanji;
mod locate;
mod mask;
mod poly;
mod qr_code;
mod reed_solomon;
mod segment;
mod segment_mode;
mod tables;
mod version;

#[cfg(test)]
mod test_util;

pub use binarize::{binarize as binarize_rgba, Binarized};
pub use bit_buffer::{get_bit, BitBuffer, BitReader};
pub use bit_matrix::BitMatrix;
pub use code_ecc::CodeEcc;
pub use decode_data::{Chunk, DecodedData};
pub use decoder::{
    decode_rgba, decode_rgba_with_options, DecodeOptions, Decoded, InversionAttempts, Location,
};
pub use error::QrError;
pub use locate::{locate, Point, SymbolLocation};
pub use mask::Mask;
pub use qr_code::QrCode;
pub use segment::Segment;
pub use segment_mode::SegmentMode;
pub use version::Version;

/*---- Constants and tables ----*/

// For use in get_penalty_score(), when evaluating which mask is best.
pub const PENALTY_N1: i32 = 3;
pub const PENALTY_N2: i32 = 3;
pub const PENALTY_N3: i32 = 40;
pub const PENALTY_N4: i32 = 10;
