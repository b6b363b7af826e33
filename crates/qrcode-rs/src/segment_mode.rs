use crate::version::Version;

/// The 4-bit terminator indicator that ends the data bit stream.
pub const TERMINATOR_BITS: u32 = 0x0;

/// Describes how a segment's data bits are interpreted.
///
/// `Eci` and `StructuredAppend` occur only on the decode side: the
/// encoder never produces them (structured-append encoding and active ECI
/// are out of scope), but the segment decoder reports their headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentMode {
    Numeric,
    Alphanumeric,
    Byte,
    Kanji,
    Eci,
    StructuredAppend,
}

impl SegmentMode {
    // Returns an unsigned 4-bit integer value (range 0 to 15)
    // representing the mode indicator bits for this mode object.
    pub fn mode_bits(&self) -> u32 {
        use SegmentMode::*;
        match self {
            Numeric => 0x1,
            Alphanumeric => 0x2,
            StructuredAppend => 0x3,
            Byte => 0x4,
            Eci => 0x7,
            Kanji => 0x8,
        }
    }

    /// The inverse of `mode_bits`; `None` for indicators the symbology
    /// does not define (or that this codec does not handle).
    pub fn from_mode_bits(bits: u32) -> Option<Self> {
        use SegmentMode::*;
        match bits {
            0x1 => Some(Numeric),
            0x2 => Some(Alphanumeric),
            0x3 => Some(StructuredAppend),
            0x4 => Some(Byte),
            0x7 => Some(Eci),
            0x8 => Some(Kanji),
            _ => None,
        }
    }

    // Returns the bit width of the character count field for a segment in
    // this mode in a QR Code at the given version number. The width steps
    // up at the version 10 and version 27 size classes.
    pub fn num_char_count_bits(&self, ver: Version) -> u8 {
        use SegmentMode::*;
        (match self {
            Numeric => [10, 12, 14],
            Alphanumeric => [9, 11, 13],
            Byte => [8, 16, 16],
            Kanji => [8, 10, 12],
            Eci | StructuredAppend => [0, 0, 0],
        })[usize::from((ver.value() + 7) / 17)]
    }
}
