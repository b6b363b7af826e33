use crate::bit_buffer::BitBuffer;
use crate::error::QrError;
use crate::kanji;
use crate::segment_mode::SegmentMode;
use crate::version::Version;
use crate::ALPHANUMERIC_CHARSET;

/// A segment of character/binary data in a QR Code symbol.
///
/// Instances of this struct are immutable.
///
/// The mid-level way to create a segment is to take the payload data
/// and call a static factory function such as `Segment::make_numeric()`.
/// The low-level way to create a segment is to custom-make the bit buffer
/// and call the `Segment::new()` constructor with appropriate values.
///
/// This segment struct imposes no length restrictions, but QR Codes have
/// restrictions. Even in the most favorable conditions, a QR Code can
/// only hold 7089 characters of data. Any segment longer than this is
/// meaningless for the purpose of generating QR Codes.
#[derive(Clone, PartialEq, Eq)]
pub struct Segment {
    // The mode indicator of this segment. Accessed through mode().
    pub mode: SegmentMode,

    // The length of this segment's unencoded data. Measured in characters for
    // numeric/alphanumeric/kanji mode and bytes for byte mode.
    // Not the same as the data's bit length. Accessed through num_chars().
    pub numchars: usize,

    // The data bits of this segment. Accessed through data().
    pub data: Vec<bool>,
}

impl Segment {
    /*---- Static factory functions (mid level) ----*/

    /// Returns a segment representing the given binary data encoded in byte mode.
    ///
    /// All input byte slices are acceptable.
    ///
    /// Any text string can be converted to UTF-8 bytes and encoded as a byte mode segment.
    pub fn make_bytes(data: &[u8]) -> Self {
        let mut bb = BitBuffer(Vec::with_capacity(data.len() * 8));
        for &b in data {
            bb.append_bits(u32::from(b), 8);
        }
        Segment::new(SegmentMode::Byte, data.len(), bb.0)
    }

    /// Returns a segment representing the given string of decimal digits
    /// encoded in numeric mode: groups of 3 digits in 10 bits, a trailing
    /// pair in 7, a trailing digit in 4.
    pub fn make_numeric(text: &str) -> Result<Self, QrError> {
        let mut bb = BitBuffer(Vec::with_capacity(text.len() * 3 + (text.len() + 2) / 3));
        let mut accumdata: u32 = 0;
        let mut accumcount: u8 = 0;
        for c in text.chars() {
            let digit = c.to_digit(10).ok_or_else(|| QrError::Encoding {
                mode: "numeric",
                reason: format!("{c:?} is not a decimal digit"),
            })?;
            accumdata = accumdata * 10 + digit;
            accumcount += 1;
            if accumcount == 3 {
                bb.append_bits(accumdata, 10);
                accumdata = 0;
                accumcount = 0;
            }
        }
        if accumcount > 0 {
            // 1 or 2 digits remaining
            bb.append_bits(accumdata, accumcount * 3 + 1);
        }
        Ok(Segment::new(SegmentMode::Numeric, text.chars().count(), bb.0))
    }

    /// Returns a segment representing the given text string encoded in
    /// alphanumeric mode: pairs in 11 bits, a trailing character in 6.
    ///
    /// The characters allowed are: 0 to 9, A to Z (uppercase only), space,
    /// dollar, percent, asterisk, plus, hyphen, period, slash, colon.
    pub fn make_alphanumeric(text: &str) -> Result<Self, QrError> {
        let mut bb = BitBuffer(Vec::with_capacity(text.len() * 5 + (text.len() + 1) / 2));
        let mut accumdata: u32 = 0;
        let mut accumcount: u32 = 0;
        let mut numchars: usize = 0;
        for c in text.chars() {
            let i = ALPHANUMERIC_CHARSET.find(c).ok_or_else(|| QrError::Encoding {
                mode: "alphanumeric",
                reason: format!("{c:?} is outside the 45-character set"),
            })?;
            accumdata = accumdata * 45 + i as u32;
            accumcount += 1;
            numchars += 1;
            if accumcount == 2 {
                bb.append_bits(accumdata, 11);
                accumdata = 0;
                accumcount = 0;
            }
        }
        if accumcount > 0 {
            // 1 character remaining
            bb.append_bits(accumdata, 6);
        }
        Ok(Segment::new(SegmentMode::Alphanumeric, numchars, bb.0))
    }

    /// Returns a segment representing the given text encoded in Kanji
    /// mode: each character's two-byte Shift-JIS code folded into 13 bits.
    pub fn make_kanji(text: &str) -> Result<Self, QrError> {
        let sjis = kanji::sjis_bytes(text)?;
        let mut bb = BitBuffer(Vec::with_capacity(sjis.len() / 2 * 13));
        for pair in sjis.chunks(2) {
            let code = u16::from(pair[0]) << 8 | u16::from(pair[1]);
            bb.append_bits(u32::from(kanji::pack(code)?), 13);
        }
        Ok(Segment::new(SegmentMode::Kanji, sjis.len() / 2, bb.0))
    }

    /// Returns a list of zero or more segments to represent the given
    /// Unicode text string.
    ///
    /// The densest single mode whose alphabet covers the whole string is
    /// chosen; byte mode (UTF-8) is the catch-all.
    pub fn make_segments(text: &str) -> Result<Vec<Self>, QrError> {
        if text.is_empty() {
            Ok(vec![])
        } else if Segment::is_numeric(text) {
            Ok(vec![Segment::make_numeric(text)?])
        } else if Segment::is_alphanumeric(text) {
            Ok(vec![Segment::make_alphanumeric(text)?])
        } else {
            Ok(vec![Segment::make_bytes(text.as_bytes())])
        }
    }

    /*---- Constructor (low level) ----*/

    /// Creates a new QR Code segment with the given attributes and data.
    ///
    /// The character count (numchars) must agree with the mode and
    /// the bit buffer length, but the constraint isn't checked.
    pub fn new(mode: SegmentMode, numchars: usize, data: Vec<bool>) -> Self {
        Self { mode, numchars, data }
    }

    /*---- Instance field getters ----*/

    /// Returns the mode indicator of this segment.
    pub fn mode(&self) -> SegmentMode {
        self.mode
    }

    /// Returns the character count field of this segment.
    pub fn num_chars(&self) -> usize {
        self.numchars
    }

    /// Returns the data bits of this segment.
    pub fn data(&self) -> &Vec<bool> {
        &self.data
    }

    /*---- Other static functions ----*/

    // Calculates and returns the number of bits needed to encode the given
    // segments at the given version. The result is None if a segment has too many
    // characters to fit its length field, or the total bits exceeds usize::MAX.
    pub fn get_total_bits(segs: &[Self], version: Version) -> Option<usize> {
        let mut result: usize = 0;
        for seg in segs {
            let ccbits: u8 = seg.mode.num_char_count_bits(version);
            // ccbits can be as large as 16, but usize can be as small as 16
            if let Some(limit) = 1usize.checked_shl(ccbits.into()) {
                if seg.numchars >= limit {
                    return None; // The segment's length doesn't fit the field's bit width
                }
            }
            result = result.checked_add(4 + usize::from(ccbits))?;
            result = result.checked_add(seg.data.len())?;
        }
        Some(result)
    }

    /// Tests whether the given string can be encoded as a segment in numeric mode.
    ///
    /// A string is encodable iff each character is in the range 0 to 9.
    pub fn is_numeric(text: &str) -> bool {
        text.chars().all(|c| c.is_ascii_digit())
    }

    /// Tests whether the given string can be encoded as a segment in alphanumeric mode.
    ///
    /// A string is encodable iff each character is in the following set: 0 to 9, A to Z
    /// (uppercase only), space, dollar, percent, asterisk, plus, hyphen, period, slash, colon.
    pub fn is_alphanumeric(text: &str) -> bool {
        text.chars().all(|c| ALPHANUMERIC_CHARSET.contains(c))
    }

    /// Tests whether the given string can be encoded as a segment in Kanji mode.
    pub fn is_kanji(text: &str) -> bool {
        kanji::is_kanji(text)
    }
}
