/// The error correction level in a QR Code symbol.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub enum CodeEcc {
    /// The QR Code can tolerate about  7% erroneous codewords.
    Low,
    /// The QR Code can tolerate about 15% erroneous codewords.
    Medium,
    /// The QR Code can tolerate about 25% erroneous codewords.
    Quartile,
    /// The QR Code can tolerate about 30% erroneous codewords.
    High,
}

impl CodeEcc {
    // Returns an unsigned 2-bit integer (in the range 0 to 3).
    pub fn ordinal(self) -> usize {
        use CodeEcc::*;
        match self {
            Low => 0,
            Medium => 1,
            Quartile => 2,
            High => 3,
        }
    }

    // The 2-bit value carried in the format information. This is on the
    // wire and is NOT the ordinal: L=1, M=0, Q=3, H=2.
    pub fn format_bits(self) -> u8 {
        use CodeEcc::*;
        match self {
            Low => 1,
            Medium => 0,
            Quartile => 3,
            High => 2,
        }
    }

    /// The inverse of `format_bits`, used when reading format information.
    pub fn from_format_bits(bits: u8) -> Option<Self> {
        use CodeEcc::*;
        match bits {
            0 => Some(Medium),
            1 => Some(Low),
            2 => Some(High),
            3 => Some(Quartile),
            _ => None,
        }
    }
}

#[cfg(test)]
mod should {
    use super::*;

    #[test]
    fn round_trip_the_wire_encoding() {
        for ecl in [CodeEcc::Low, CodeEcc::Medium, CodeEcc::Quartile, CodeEcc::High] {
            assert_eq!(CodeEcc::from_format_bits(ecl.format_bits()), Some(ecl));
        }
        assert_eq!(CodeEcc::from_format_bits(4), None);
    }
}
