//! Static symbology tables, sourced verbatim from ISO/IEC 18004.
//!
//! Nothing in here is derived at runtime: the Reed-Solomon block
//! parameters, alignment-pattern centres, pre-computed BCH version words
//! and masked format words are embedded as the standard prints them.

use crate::code_ecc::CodeEcc;
use crate::version::Version;

pub static ECC_CODEWORDS_PER_BLOCK: [[i8; 41]; 4] = [
    // Version: (note that index 0 is for padding, and is set to an illegal value)
    //0,  1,  2,  3,  4,  5,  6,  7,  8,  9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23, 24, 25, 26, 27, 28, 29, 30, 31, 32, 33, 34, 35, 36, 37, 38, 39, 40    Error correction level
    [
        -1, 7, 10, 15, 20, 26, 18, 20, 24, 30, 18, 20, 24, 26, 30, 22, 24, 28, 30, 28, 28, 28, 28,
        30, 30, 26, 28, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30,
    ], // Low
    [
        -1, 10, 16, 26, 18, 24, 16, 18, 22, 22, 26, 30, 22, 22, 24, 24, 28, 28, 26, 26, 26, 26, 28,
        28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28,
    ], // Medium
    [
        -1, 13, 22, 18, 26, 18, 24, 18, 22, 20, 24, 28, 26, 24, 20, 30, 24, 28, 28, 26, 30, 28, 30,
        30, 30, 30, 28, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30,
    ], // Quartile
    [
        -1, 17, 28, 22, 16, 22, 28, 26, 26, 24, 28, 24, 28, 22, 24, 24, 30, 28, 28, 26, 28, 30, 24,
        30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30,
    ], // High
];

pub static NUM_ERROR_CORRECTION_BLOCKS: [[i8; 41]; 4] = [
    // Version: (note that index 0 is for padding, and is set to an illegal value)
    //0, 1, 2, 3, 4, 5, 6, 7, 8, 9,10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23, 24, 25, 26, 27, 28, 29, 30, 31, 32, 33, 34, 35, 36, 37, 38, 39, 40    Error correction level
    [
        -1, 1, 1, 1, 1, 1, 2, 2, 2, 2, 4, 4, 4, 4, 4, 6, 6, 6, 6, 7, 8, 8, 9, 9, 10, 12, 12, 12,
        13, 14, 15, 16, 17, 18, 19, 19, 20, 21, 22, 24, 25,
    ], // Low
    [
        -1, 1, 1, 1, 2, 2, 4, 4, 4, 5, 5, 5, 8, 9, 9, 10, 10, 11, 13, 14, 16, 17, 17, 18, 20, 21,
        23, 25, 26, 28, 29, 31, 33, 35, 37, 38, 40, 43, 45, 47, 49,
    ], // Medium
    [
        -1, 1, 1, 2, 2, 4, 4, 6, 6, 8, 8, 8, 10, 12, 16, 12, 17, 16, 18, 21, 20, 23, 23, 25, 27,
        29, 34, 34, 35, 38, 40, 43, 45, 48, 51, 53, 56, 59, 62, 65, 68,
    ], // Quartile
    [
        -1, 1, 1, 2, 4, 4, 4, 5, 6, 8, 8, 11, 11, 16, 16, 18, 16, 19, 21, 25, 25, 25, 34, 30, 32,
        35, 37, 40, 42, 45, 48, 51, 54, 57, 60, 63, 66, 70, 74, 77, 81,
    ], // High
];

/// Alignment-pattern centre coordinates per version (row and column axes
/// alike), index 0 padding. ISO 18004 Annex E.
pub static ALIGNMENT_PATTERN_POSITIONS: [&[i32]; 41] = [
    &[],
    &[],
    &[6, 18],
    &[6, 22],
    &[6, 26],
    &[6, 30],
    &[6, 34],
    &[6, 22, 38],
    &[6, 24, 42],
    &[6, 26, 46],
    &[6, 28, 50],
    &[6, 30, 54],
    &[6, 32, 58],
    &[6, 34, 62],
    &[6, 26, 46, 66],
    &[6, 26, 48, 70],
    &[6, 26, 50, 74],
    &[6, 30, 54, 78],
    &[6, 30, 56, 82],
    &[6, 30, 58, 86],
    &[6, 34, 62, 90],
    &[6, 28, 50, 72, 94],
    &[6, 26, 50, 74, 98],
    &[6, 30, 54, 78, 102],
    &[6, 28, 54, 80, 106],
    &[6, 32, 58, 84, 110],
    &[6, 30, 58, 86, 114],
    &[6, 34, 62, 90, 118],
    &[6, 26, 50, 74, 98, 122],
    &[6, 30, 54, 78, 102, 126],
    &[6, 26, 52, 78, 104, 130],
    &[6, 30, 56, 82, 108, 134],
    &[6, 34, 60, 86, 112, 138],
    &[6, 30, 58, 86, 114, 142],
    &[6, 34, 62, 90, 118, 146],
    &[6, 30, 54, 78, 102, 126, 150],
    &[6, 24, 50, 76, 102, 128, 154],
    &[6, 28, 54, 80, 106, 132, 158],
    &[6, 32, 58, 84, 110, 136, 162],
    &[6, 26, 54, 82, 110, 138, 166],
    &[6, 30, 58, 86, 114, 142, 170],
];

/// 18-bit BCH-protected version words for versions 7 through 40.
/// ISO 18004 Annex D, generator G18 = x^12+x^11+x^10+x^9+x^8+x^5+x^2+1.
pub static VERSION_INFO: [u32; 34] = [
    0x07C94, 0x085BC, 0x09A99, 0x0A4D3, 0x0BBF6, 0x0C762, 0x0D847, 0x0E60D, 0x0F928, 0x10B78,
    0x1145D, 0x12A17, 0x13532, 0x149A6, 0x15683, 0x168C9, 0x177EC, 0x18EC4, 0x191E1, 0x1AFAB,
    0x1B08E, 0x1CC1A, 0x1D33F, 0x1ED75, 0x1F250, 0x209D5, 0x216F0, 0x228BA, 0x2379F, 0x24B0B,
    0x2542E, 0x26A64, 0x27541, 0x28C69,
];

/// The 32 masked 15-bit format words, indexed by the 5-bit payload
/// `(ec_format_bits << 3) | mask`. ISO 18004 Annex C, generator
/// G15 = x^10+x^8+x^5+x^4+x^2+x+1 and XOR mask 0x5412.
pub static FORMAT_INFO: [u16; 32] = [
    0x5412, 0x5125, 0x5E7C, 0x5B4B, 0x45F9, 0x40CE, 0x4F97, 0x4AA0, // Medium
    0x77C4, 0x72F3, 0x7DAA, 0x789D, 0x662F, 0x6318, 0x6C41, 0x6976, // Low
    0x1689, 0x13BE, 0x1CE7, 0x19D0, 0x0762, 0x0255, 0x0D0C, 0x083B, // High
    0x355F, 0x3068, 0x3F31, 0x3A06, 0x24B4, 0x2183, 0x2EDA, 0x2BED, // Quartile
];

// Returns an entry from the given table based on the given values.
pub(crate) fn table_get(table: &'static [[i8; 41]; 4], ver: Version, ecl: CodeEcc) -> usize {
    table[ecl.ordinal()][usize::from(ver.value())] as usize
}

/// Returns the number of data bits that can be stored in a QR Code of the
/// given version number, after all function modules are excluded. This
/// includes remainder bits, so it might not be a multiple of 8. The result
/// is in the range [208, 29648].
pub fn num_raw_data_modules(ver: Version) -> usize {
    let v = usize::from(ver.value());
    let mut result: usize = (16 * v + 128) * v + 64;
    let numalign = ALIGNMENT_PATTERN_POSITIONS[v].len();
    if numalign > 0 {
        result -= (25 * numalign - 10) * numalign - 55;
        if v >= 7 {
            result -= 36;
        }
    }
    debug_assert!((208..=29648).contains(&result));
    result
}

/// Returns the number of 8-bit data (i.e. not error correction) codewords
/// contained in any QR Code of the given version number and error
/// correction level, with remainder bits discarded.
pub fn num_data_codewords(ver: Version, ecl: CodeEcc) -> usize {
    num_raw_data_modules(ver) / 8
        - table_get(&ECC_CODEWORDS_PER_BLOCK, ver, ecl)
            * table_get(&NUM_ERROR_CORRECTION_BLOCKS, ver, ecl)
}

/// The Reed-Solomon block structure of one (version, EC level) pair.
///
/// Blocks are ordered short-first as the standard interleaves them; each
/// block carries `data_lens[i]` data codewords plus `ecc_len` error
/// correction codewords.
pub(crate) struct BlockLayout {
    pub ecc_len: usize,
    pub data_lens: Vec<usize>,
}

impl BlockLayout {
    pub fn of(ver: Version, ecl: CodeEcc) -> Self {
        let num_blocks = table_get(&NUM_ERROR_CORRECTION_BLOCKS, ver, ecl);
        let ecc_len = table_get(&ECC_CODEWORDS_PER_BLOCK, ver, ecl);
        let raw_codewords = num_raw_data_modules(ver) / 8;
        let num_short_blocks = num_blocks - raw_codewords % num_blocks;
        let short_total_len = raw_codewords / num_blocks;
        let data_lens = (0..num_blocks)
            .map(|i| short_total_len - ecc_len + usize::from(i >= num_short_blocks))
            .collect();
        Self { ecc_len, data_lens }
    }

    pub fn total_codewords(&self) -> usize {
        self.data_lens.iter().sum::<usize>() + self.data_lens.len() * self.ecc_len
    }
}

#[cfg(test)]
mod should {
    use super::*;

    #[test]
    fn count_raw_modules_at_the_extremes() {
        assert_eq!(num_raw_data_modules(Version::new(1)), 208);
        assert_eq!(num_raw_data_modules(Version::new(40)), 29648);
    }

    #[test]
    fn report_known_data_capacities() {
        // ISO 18004 table 7: total data codewords.
        assert_eq!(num_data_codewords(Version::new(1), CodeEcc::Low), 19);
        assert_eq!(num_data_codewords(Version::new(1), CodeEcc::Quartile), 13);
        assert_eq!(num_data_codewords(Version::new(1), CodeEcc::High), 9);
        assert_eq!(num_data_codewords(Version::new(5), CodeEcc::Quartile), 62);
        assert_eq!(num_data_codewords(Version::new(40), CodeEcc::Low), 2956);
    }

    #[test]
    fn split_version_five_quartile_into_even_blocks() {
        // 5-Q: 2 blocks of (33, 15) + 2 blocks of (34, 16), 18 ECC each.
        let layout = BlockLayout::of(Version::new(5), CodeEcc::Quartile);
        assert_eq!(layout.ecc_len, 18);
        assert_eq!(layout.data_lens, vec![15, 15, 16, 16]);
        assert_eq!(layout.total_codewords(), num_raw_data_modules(Version::new(5)) / 8);
    }

    #[test]
    fn keep_alignment_centres_on_the_timing_grid() {
        for v in 2..=40usize {
            let centres = ALIGNMENT_PATTERN_POSITIONS[v];
            assert_eq!(centres[0], 6, "version {v}");
            let size = 4 * v as i32 + 17;
            assert_eq!(*centres.last().unwrap(), size - 7, "version {v}");
        }
    }

    #[test]
    fn keep_format_words_seven_bits_apart() {
        // BCH(15,5) has minimum distance 7 between distinct codewords.
        for i in 0..32 {
            for j in (i + 1)..32 {
                let diff = (FORMAT_INFO[i] ^ FORMAT_INFO[j]).count_ones();
                assert!(diff >= 7, "entries {i} and {j} differ by only {diff} bits");
            }
        }
    }

    #[test]
    fn match_the_bch_recurrence_for_version_words() {
        // Each entry is (v << 12) | rem where rem is the G18 remainder.
        for (i, &word) in VERSION_INFO.iter().enumerate() {
            let v = i as u32 + 7;
            let mut rem = v;
            for _ in 0..12 {
                rem = (rem << 1) ^ ((rem >> 11) * 0x1F25);
            }
            assert_eq!(word, v << 12 | rem, "version {v}");
        }
    }

    #[test]
    fn match_the_bch_recurrence_for_format_words() {
        for data in 0..32u32 {
            let mut rem = data;
            for _ in 0..10 {
                rem = (rem << 1) ^ ((rem >> 9) * 0x537);
            }
            assert_eq!(u32::from(FORMAT_INFO[data as usize]), (data << 10 | rem) ^ 0x5412);
        }
    }
}
