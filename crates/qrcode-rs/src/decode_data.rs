//! Parsing corrected data codewords as a sequence of typed segments.

use serde::{Deserialize, Serialize};

use crate::bit_buffer::BitReader;
use crate::error::QrError;
use crate::kanji;
use crate::segment_mode::{SegmentMode, TERMINATOR_BITS};
use crate::version::Version;
use crate::ALPHANUMERIC_CHARSET;

/// One decoded segment with its literal content.
///
/// `Eci` and `StructuredAppend` are reported but not interpreted: the
/// assignment number and the append header pass through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Chunk {
    Numeric { text: String },
    Alphanumeric { text: String },
    Byte { bytes: Vec<u8>, text: String },
    Kanji { bytes: Vec<u8>, text: String },
    Eci { assignment: u32 },
    StructuredAppend { index: u8, total: u8, parity: u8 },
}

/// The parsed payload: concatenated text, raw bytes, and the chunk list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedData {
    pub text: String,
    pub bytes: Vec<u8>,
    pub chunks: Vec<Chunk>,
}

/// Reads segments until a terminator or the end of the stream.
///
/// Running dry in the middle of a segment body returns what was gathered
/// so far; non-zero residue where a terminator belongs is an error (the
/// caller may still retry a mirrored read).
pub(crate) fn decode_data(data: &[u8], version: Version) -> Result<DecodedData, QrError> {
    let mut stream = BitReader::new(data);
    let mut result = DecodedData::default();

    while stream.available() >= 4 {
        let mode_bits = stream.read_bits(4)?;
        if mode_bits == TERMINATOR_BITS {
            return Ok(result); // terminator; padding after it is free-form
        }
        let Some(mode) = SegmentMode::from_mode_bits(mode_bits) else {
            return Err(QrError::Format("unknown mode indicator"));
        };
        let outcome = match mode {
            SegmentMode::Numeric => decode_numeric(&mut stream, version, &mut result),
            SegmentMode::Alphanumeric => decode_alphanumeric(&mut stream, version, &mut result),
            SegmentMode::Byte => decode_byte(&mut stream, version, &mut result),
            SegmentMode::Kanji => decode_kanji(&mut stream, version, &mut result),
            SegmentMode::Eci => decode_eci(&mut stream, &mut result),
            SegmentMode::StructuredAppend => decode_structured_append(&mut stream, &mut result),
        };
        match outcome {
            Ok(()) => {}
            // An underfilled final segment keeps its predecessors.
            Err(QrError::EndOfStream { .. }) => return Ok(result),
            Err(other) => return Err(other),
        }
    }

    // No terminator was reached: the residue must be all zero bits.
    let leftover = stream.available();
    if leftover > 0 && stream.read_bits(leftover)? != 0 {
        return Err(QrError::Format("non-zero bits after the final segment"));
    }
    Ok(result)
}

fn read_char_count(
    stream: &mut BitReader,
    mode: SegmentMode,
    version: Version,
) -> Result<usize, QrError> {
    Ok(stream.read_bits(usize::from(mode.num_char_count_bits(version)))? as usize)
}

fn decode_numeric(
    stream: &mut BitReader,
    version: Version,
    out: &mut DecodedData,
) -> Result<(), QrError> {
    let mut count = read_char_count(stream, SegmentMode::Numeric, version)?;
    let mut text = String::with_capacity(count);

    let push_digits = |value: u32, digits: u32, text: &mut String| {
        if value >= 10u32.pow(digits) {
            return Err(QrError::Format("numeric group out of range"));
        }
        for i in (0..digits).rev() {
            let digit = (value / 10u32.pow(i)) % 10;
            text.push(char::from(b'0' + digit as u8));
        }
        Ok(())
    };
    while count >= 3 {
        push_digits(stream.read_bits(10)?, 3, &mut text)?;
        count -= 3;
    }
    if count == 2 {
        push_digits(stream.read_bits(7)?, 2, &mut text)?;
    } else if count == 1 {
        push_digits(stream.read_bits(4)?, 1, &mut text)?;
    }

    out.bytes.extend_from_slice(text.as_bytes());
    out.text.push_str(&text);
    out.chunks.push(Chunk::Numeric { text });
    Ok(())
}

fn decode_alphanumeric(
    stream: &mut BitReader,
    version: Version,
    out: &mut DecodedData,
) -> Result<(), QrError> {
    let mut count = read_char_count(stream, SegmentMode::Alphanumeric, version)?;
    let mut text = String::with_capacity(count);

    let charset = ALPHANUMERIC_CHARSET.as_bytes();
    let push_char = |value: u32, text: &mut String| {
        if value >= 45 {
            return Err(QrError::Format("alphanumeric value out of range"));
        }
        text.push(char::from(charset[value as usize]));
        Ok(())
    };
    while count >= 2 {
        let pair = stream.read_bits(11)?;
        push_char(pair / 45, &mut text)?;
        push_char(pair % 45, &mut text)?;
        count -= 2;
    }
    if count == 1 {
        push_char(stream.read_bits(6)?, &mut text)?;
    }

    out.bytes.extend_from_slice(text.as_bytes());
    out.text.push_str(&text);
    out.chunks.push(Chunk::Alphanumeric { text });
    Ok(())
}

fn decode_byte(
    stream: &mut BitReader,
    version: Version,
    out: &mut DecodedData,
) -> Result<(), QrError> {
    let count = read_char_count(stream, SegmentMode::Byte, version)?;
    let mut bytes = Vec::with_capacity(count);
    for _ in 0..count {
        bytes.push(stream.read_bits(8)? as u8);
    }
    // UTF-8 with lossy fallback: a malformed sequence never fails the
    // segment, it just surfaces replacement characters.
    let text = String::from_utf8_lossy(&bytes).into_owned();

    out.bytes.extend_from_slice(&bytes);
    out.text.push_str(&text);
    out.chunks.push(Chunk::Byte { bytes, text });
    Ok(())
}

fn decode_kanji(
    stream: &mut BitReader,
    version: Version,
    out: &mut DecodedData,
) -> Result<(), QrError> {
    let count = read_char_count(stream, SegmentMode::Kanji, version)?;
    let mut bytes = Vec::with_capacity(count * 2);
    for _ in 0..count {
        let sjis = kanji::unpack(stream.read_bits(13)? as u16);
        bytes.extend_from_slice(&sjis.to_be_bytes());
    }
    let text = kanji::decode_sjis(&bytes);

    out.bytes.extend_from_slice(&bytes);
    out.text.push_str(&text);
    out.chunks.push(Chunk::Kanji { bytes, text });
    Ok(())
}

fn decode_eci(stream: &mut BitReader, out: &mut DecodedData) -> Result<(), QrError> {
    let assignment = if stream.read_bits(1)? == 0 {
        stream.read_bits(7)?
    } else if stream.read_bits(1)? == 0 {
        stream.read_bits(14)?
    } else if stream.read_bits(1)? == 0 {
        stream.read_bits(21)?
    } else {
        return Err(QrError::Format("malformed ECI designator"));
    };
    out.chunks.push(Chunk::Eci { assignment });
    Ok(())
}

fn decode_structured_append(stream: &mut BitReader, out: &mut DecodedData) -> Result<(), QrError> {
    let index = stream.read_bits(4)? as u8;
    let total = stream.read_bits(4)? as u8;
    let parity = stream.read_bits(8)? as u8;
    out.chunks.push(Chunk::StructuredAppend { index, total, parity });
    Ok(())
}

#[cfg(test)]
mod should {
    use super::*;
    use crate::bit_buffer::BitBuffer;
    use crate::segment::Segment;

    // Packs segments exactly as the encoder does, terminator included.
    fn stream_of(segments: &[Segment], version: Version, terminator: bool) -> Vec<u8> {
        let mut bb = BitBuffer(Vec::new());
        for seg in segments {
            bb.append_bits(seg.mode.mode_bits(), 4);
            bb.append_bits(seg.numchars as u32, seg.mode.num_char_count_bits(version));
            bb.0.extend_from_slice(&seg.data);
        }
        if terminator {
            bb.append_bits(0, 4);
        }
        bb.to_bytes()
    }

    #[test]
    fn parse_a_numeric_segment() {
        let data = stream_of(&[Segment::make_numeric("0123456789").unwrap()], Version::new(1), true);
        let decoded = decode_data(&data, Version::new(1)).unwrap();
        assert_eq!(decoded.text, "0123456789");
        assert_eq!(decoded.bytes, b"0123456789");
        assert_eq!(decoded.chunks, vec![Chunk::Numeric { text: "0123456789".into() }]);
    }

    #[test]
    fn parse_an_alphanumeric_segment() {
        let data =
            stream_of(&[Segment::make_alphanumeric("HELLO WORLD").unwrap()], Version::new(1), true);
        let decoded = decode_data(&data, Version::new(1)).unwrap();
        assert_eq!(decoded.text, "HELLO WORLD");
        assert_eq!(decoded.chunks.len(), 1);
    }

    #[test]
    fn parse_utf8_bytes() {
        let payload = "Hello, 世界!";
        let data = stream_of(&[Segment::make_bytes(payload.as_bytes())], Version::new(1), true);
        let decoded = decode_data(&data, Version::new(1)).unwrap();
        assert_eq!(decoded.text, payload);
        assert_eq!(decoded.bytes, payload.as_bytes());
        match &decoded.chunks[0] {
            Chunk::Byte { bytes, text } => {
                assert_eq!(bytes, payload.as_bytes());
                assert_eq!(text, payload);
            }
            other => panic!("expected a byte chunk, got {other:?}"),
        }
    }

    #[test]
    fn fall_back_bytewise_on_malformed_utf8() {
        let bytes = [0x41, 0xFF, 0x42];
        let data = stream_of(&[Segment::make_bytes(&bytes)], Version::new(1), true);
        let decoded = decode_data(&data, Version::new(1)).unwrap();
        assert_eq!(decoded.bytes, bytes);
        assert_eq!(decoded.text, "A\u{FFFD}B");
    }

    #[test]
    fn parse_a_kanji_segment() {
        let data = stream_of(&[Segment::make_kanji("漢字").unwrap()], Version::new(1), true);
        let decoded = decode_data(&data, Version::new(1)).unwrap();
        assert_eq!(decoded.text, "漢字");
        assert_eq!(decoded.bytes, vec![0x8A, 0xBF, 0x8E, 0x9A]);
        match &decoded.chunks[0] {
            Chunk::Kanji { bytes, .. } => assert_eq!(bytes, &vec![0x8A, 0xBF, 0x8E, 0x9A]),
            other => panic!("expected a kanji chunk, got {other:?}"),
        }
    }

    #[test]
    fn parse_mixed_segments_in_order() {
        let segs = [
            Segment::make_numeric("42").unwrap(),
            Segment::make_alphanumeric("AB").unwrap(),
        ];
        let data = stream_of(&segs, Version::new(1), true);
        let decoded = decode_data(&data, Version::new(1)).unwrap();
        assert_eq!(decoded.text, "42AB");
        assert_eq!(decoded.chunks.len(), 2);
    }

    #[test]
    fn report_an_eci_designator_without_interpreting_it() {
        let mut bb = BitBuffer(Vec::new());
        bb.append_bits(0b0111, 4); // ECI mode
        bb.append_bits(26, 8); // one-byte form: 0 + 7-bit assignment
        bb.append_bits(0, 4); // terminator
        let decoded = decode_data(&bb.to_bytes(), Version::new(1)).unwrap();
        assert_eq!(decoded.chunks, vec![Chunk::Eci { assignment: 26 }]);
        assert!(decoded.text.is_empty());
    }

    #[test]
    fn report_a_structured_append_header() {
        let mut bb = BitBuffer(Vec::new());
        bb.append_bits(0b0011, 4);
        bb.append_bits(2, 4); // index
        bb.append_bits(7, 4); // total
        bb.append_bits(0xA5, 8); // parity
        bb.append_bits(0, 4);
        let decoded = decode_data(&bb.to_bytes(), Version::new(1)).unwrap();
        assert_eq!(
            decoded.chunks,
            vec![Chunk::StructuredAppend { index: 2, total: 7, parity: 0xA5 }]
        );
    }

    #[test]
    fn treat_an_immediate_terminator_as_an_empty_payload() {
        let decoded = decode_data(&[0x00, 0xEC, 0x11], Version::new(1)).unwrap();
        assert!(decoded.text.is_empty());
        assert!(decoded.chunks.is_empty());
    }

    #[test]
    fn keep_chunks_gathered_before_the_stream_ran_dry() {
        // A numeric segment announcing more digits than the stream holds.
        let mut bb = BitBuffer(Vec::new());
        let seg = Segment::make_numeric("123").unwrap();
        bb.append_bits(seg.mode.mode_bits(), 4);
        bb.append_bits(seg.numchars as u32, 10);
        bb.0.extend_from_slice(&seg.data);
        bb.append_bits(0b0001, 4); // another numeric header...
        bb.append_bits(57, 10); // ...claiming 57 digits that never come
        let decoded = decode_data(&bb.to_bytes(), Version::new(1)).unwrap();
        assert_eq!(decoded.text, "123");
        assert_eq!(decoded.chunks.len(), 1);
    }

    #[test]
    fn reject_an_unknown_mode_indicator() {
        let mut bb = BitBuffer(Vec::new());
        bb.append_bits(0b0101, 4);
        bb.append_bits(0, 12);
        assert!(matches!(
            decode_data(&bb.to_bytes(), Version::new(1)),
            Err(QrError::Format("unknown mode indicator"))
        ));
    }

    #[test]
    fn reject_garbage_where_the_terminator_belongs() {
        // A 2-digit numeric segment consumes 21 bits, leaving 3 bits of
        // residue in the 3-byte stream; they must be zero, and are not.
        let mut bb = BitBuffer(Vec::new());
        let seg = Segment::make_numeric("12").unwrap();
        bb.append_bits(seg.mode.mode_bits(), 4);
        bb.append_bits(2, 10);
        bb.0.extend_from_slice(&seg.data);
        bb.append_bits(0b101, 3);
        assert!(matches!(
            decode_data(&bb.to_bytes(), Version::new(1)),
            Err(QrError::Format("non-zero bits after the final segment"))
        ));
    }

    #[test]
    fn serialize_chunks_with_a_type_tag() {
        let chunk = Chunk::Numeric { text: "7".into() };
        let json = serde_json::to_string(&chunk).unwrap();
        assert_eq!(json, r#"{"type":"Numeric","text":"7"}"#);
    }
}
