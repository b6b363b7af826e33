//! Unicode &#x2194; Shift-JIS bridging for Kanji mode.
//!
//! The character tables themselves come from `encoding_rs`; this module
//! adds the QR-specific part: validating that every character lands in
//! one of the two double-byte JIS X 0208 windows and folding each pair
//! into the 13-bit form the symbology stores.

use encoding_rs::SHIFT_JIS;

use crate::error::QrError;

fn encoding_error(reason: String) -> QrError {
    QrError::Encoding { mode: "kanji", reason }
}

/// Encodes the text as a sequence of two-byte Shift-JIS codes, one pair
/// per character. Single-byte characters (ASCII, halfwidth katakana) and
/// characters with no Shift-JIS mapping are not valid Kanji-mode input.
pub fn sjis_bytes(text: &str) -> Result<Vec<u8>, QrError> {
    let mut bytes = Vec::with_capacity(text.chars().count() * 2);
    let mut buf = [0u8; 4];
    for c in text.chars() {
        let (encoded, _, had_errors) = SHIFT_JIS.encode(c.encode_utf8(&mut buf));
        if had_errors || encoded.len() != 2 {
            return Err(encoding_error(format!("{c:?} has no double-byte Shift-JIS form")));
        }
        bytes.extend_from_slice(&encoded);
    }
    Ok(bytes)
}

/// Folds one two-byte Shift-JIS code into its 13-bit stored value.
///
/// Codes in [0x8140, 0x9FFC] rebase at 0x8140, codes in [0xE040, 0xEBBF]
/// at 0xC140; the adjusted bytes (hi, lo) become `hi * 0xC0 + lo`.
pub fn pack(sjis: u16) -> Result<u16, QrError> {
    let adjusted = match sjis {
        0x8140..=0x9FFC => sjis - 0x8140,
        0xE040..=0xEBBF => sjis - 0xC140,
        _ => {
            return Err(encoding_error(format!("Shift-JIS code {sjis:#06X} outside Kanji mode")));
        }
    };
    Ok((adjusted >> 8) * 0xC0 + (adjusted & 0xFF))
}

/// The inverse of `pack`: reconstructs the two-byte Shift-JIS code from
/// a 13-bit stored value.
pub fn unpack(value: u16) -> u16 {
    let assembled = (value / 0xC0) << 8 | value % 0xC0;
    if assembled < 0x1F00 {
        assembled + 0x8140
    } else {
        assembled + 0xC140
    }
}

/// Decodes Shift-JIS bytes to text, substituting U+FFFD where a pair has
/// no mapping (the decode side never hard-fails on charset content).
pub fn decode_sjis(bytes: &[u8]) -> String {
    let (text, _, _) = SHIFT_JIS.decode(bytes);
    text.into_owned()
}

/// Tests whether the given string can be encoded as a segment in Kanji mode.
pub fn is_kanji(text: &str) -> bool {
    !text.is_empty()
        && sjis_bytes(text).map_or(false, |bytes| {
            bytes
                .chunks(2)
                .all(|pair| pack(u16::from(pair[0]) << 8 | u16::from(pair[1])).is_ok())
        })
}

#[cfg(test)]
mod should {
    use super::*;

    #[test]
    fn encode_kanji_to_known_pairs() {
        assert_eq!(sjis_bytes("漢字").unwrap(), vec![0x8A, 0xBF, 0x8E, 0x9A]);
    }

    #[test]
    fn reject_single_byte_characters() {
        assert!(sjis_bytes("A").is_err());
        assert!(sjis_bytes("漢A字").is_err());
    }

    #[test]
    fn reject_unmappable_characters() {
        assert!(sjis_bytes("漢\u{1F600}").is_err());
    }

    #[test]
    fn pack_both_windows() {
        assert_eq!(pack(0x8140).unwrap(), 0);
        assert_eq!(pack(0x8ABF).unwrap(), 9 * 0xC0 + 0x7F);
        assert_eq!(pack(0xE040).unwrap(), 0x1F * 0xC0 + 0x00);
        assert_eq!(pack(0xEBBF).unwrap(), 0x2A * 0xC0 + 0x7F);
        assert!(pack(0x00A0).is_err());
        assert!(pack(0xA000).is_err());
    }

    #[test]
    fn unpack_every_packed_code() {
        // Trail bytes below 0x40 never occur in Shift-JIS, so only codes
        // with a valid trail are required to round-trip.
        for range in [0x8140u16..=0x9FFC, 0xE040u16..=0xEBBF] {
            for sjis in range.filter(|s| (0x40..=0xFC).contains(&(s & 0xFF))) {
                let packed = pack(sjis).unwrap();
                assert!(packed < 1 << 13);
                assert_eq!(unpack(packed), sjis);
            }
        }
    }

    #[test]
    fn round_trip_text_through_sjis() {
        let text = "漢字テスト";
        let bytes = sjis_bytes(text).unwrap();
        assert_eq!(decode_sjis(&bytes), text);
    }

    #[test]
    fn classify_kanji_strings() {
        assert!(is_kanji("漢字"));
        assert!(!is_kanji(""));
        assert!(!is_kanji("ABC"));
        assert!(!is_kanji("漢字!"));
    }
}
