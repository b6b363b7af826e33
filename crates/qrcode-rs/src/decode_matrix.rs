//! Reading a sampled symbol back into corrected data codewords: version
//! and format recovery, function-pattern masking, the zig-zag read path,
//! block de-interleaving and Reed-Solomon correction.

use crate::bit_matrix::BitMatrix;
use crate::code_ecc::CodeEcc;
use crate::error::QrError;
use crate::mask::Mask;
use crate::reed_solomon;
use crate::tables::{self, BlockLayout};
use crate::version::Version;

/// The payload of the 15-bit format information.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FormatInfo {
    pub ecc_level: CodeEcc,
    pub mask: Mask,
}

/// Recovers the version: small symbols carry it in their dimension, and
/// versions 7 and up carry two mirrored 18-bit BCH words.
pub(crate) fn read_version(matrix: &BitMatrix) -> Result<Version, QrError> {
    let dimension = matrix.height();
    if dimension <= 41 {
        return Version::from_dimension(dimension as usize)
            .ok_or(QrError::Format("implausible symbol dimension"));
    }

    let mut top_right_bits: u32 = 0;
    for y in (0..=5).rev() {
        for x in ((dimension - 11)..=(dimension - 9)).rev() {
            top_right_bits = top_right_bits << 1 | u32::from(matrix.get(x, y));
        }
    }
    let mut bottom_left_bits: u32 = 0;
    for x in (0..=5).rev() {
        for y in ((dimension - 11)..=(dimension - 9)).rev() {
            bottom_left_bits = bottom_left_bits << 1 | u32::from(matrix.get(x, y));
        }
    }

    let mut best: Option<(u8, u32)> = None;
    for (i, &word) in tables::VERSION_INFO.iter().enumerate() {
        let version = i as u8 + 7;
        if word == top_right_bits || word == bottom_left_bits {
            return Ok(Version::new(version));
        }
        for observed in [top_right_bits, bottom_left_bits] {
            let difference = (word ^ observed).count_ones();
            if best.map_or(true, |(_, d)| difference < d) {
                best = Some((version, difference));
            }
        }
    }
    match best {
        // The version words are 8 bits apart, so up to 3 flipped bits
        // still identify a unique word.
        Some((version, difference)) if difference <= 3 => Ok(Version::new(version)),
        _ => Err(QrError::Format("version info beyond correction")),
    }
}

/// Recovers (EC level, mask) from the two 15-bit format copies, accepting
/// up to 3 flipped bits against the closest table entry.
pub(crate) fn read_format_information(matrix: &BitMatrix) -> Result<FormatInfo, QrError> {
    let dimension = matrix.height();

    // First copy, wrapped around the top-left finder.
    let mut top_left_bits: u32 = 0;
    for x in 0..=8 {
        if x != 6 {
            top_left_bits = top_left_bits << 1 | u32::from(matrix.get(x, 8));
        }
    }
    for y in (0..=7).rev() {
        if y != 6 {
            top_left_bits = top_left_bits << 1 | u32::from(matrix.get(8, y));
        }
    }

    // Second copy, split between the top-right and bottom-left corners.
    let mut split_bits: u32 = 0;
    for y in ((dimension - 7)..=(dimension - 1)).rev() {
        split_bits = split_bits << 1 | u32::from(matrix.get(8, y));
    }
    for x in (dimension - 8)..dimension {
        split_bits = split_bits << 1 | u32::from(matrix.get(x, 8));
    }

    let mut best: Option<(usize, u32)> = None;
    for (index, &word) in tables::FORMAT_INFO.iter().enumerate() {
        let word = u32::from(word);
        if word == top_left_bits || word == split_bits {
            best = Some((index, 0));
            break;
        }
        for observed in [top_left_bits, split_bits] {
            let difference = (word ^ observed).count_ones();
            if best.map_or(true, |(_, d)| difference < d) {
                best = Some((index, difference));
            }
        }
    }
    match best {
        Some((index, difference)) if difference <= 3 => {
            let ecc_level = CodeEcc::from_format_bits((index >> 3) as u8)
                .ok_or(QrError::Format("format info beyond correction"))?;
            Ok(FormatInfo { ecc_level, mask: Mask::new((index & 7) as u8) })
        }
        _ => Err(QrError::Format("format info beyond correction")),
    }
}

// Marks every cell belonging to a function pattern: finders with their
// separators and format strips, alignment patterns, timing tracks, and
// the version blocks on large symbols.
fn build_function_pattern_mask(version: Version) -> BitMatrix {
    let d = version.dimension() as i32;
    let mut mask = BitMatrix::new(d as u32, d as u32);
    mask.set_region(0, 0, 9, 9);
    mask.set_region(d - 8, 0, 8, 9);
    mask.set_region(0, d - 8, 9, 8);

    let centres = tables::ALIGNMENT_PATTERN_POSITIONS[usize::from(version.value())];
    for &cx in centres {
        for &cy in centres {
            if !((cx == 6 && cy == 6) || (cx == 6 && cy == d - 7) || (cx == d - 7 && cy == 6)) {
                mask.set_region(cx - 2, cy - 2, 5, 5);
            }
        }
    }

    mask.set_region(6, 9, 1, d - 17); // vertical timing
    mask.set_region(9, 6, d - 17, 1); // horizontal timing

    if version.value() >= 7 {
        mask.set_region(d - 11, 0, 3, 6);
        mask.set_region(0, d - 11, 6, 3);
    }
    mask
}

// Walks the same two-column zig-zag the encoder wrote, un-masking each
// data module and packing bits into codewords; up to 7 remainder bits at
// the end of the path are dropped.
fn read_codewords(matrix: &BitMatrix, version: Version, data_mask: Mask) -> Vec<u8> {
    let d = matrix.height();
    let function_mask = build_function_pattern_mask(version);
    let mut codewords = Vec::with_capacity(tables::num_raw_data_modules(version) / 8);
    let mut current_byte: u32 = 0;
    let mut bits_read = 0;

    let mut right = d - 1;
    while right >= 1 {
        if right == 6 {
            right = 5;
        }
        for vert in 0..d {
            for j in 0..2 {
                let x = right - j;
                let upward = (right + 1) & 2 == 0;
                let y = if upward { d - 1 - vert } else { vert };
                if function_mask.get(x, y) {
                    continue;
                }
                let bit = matrix.get(x, y) ^ data_mask.is_inverted(x, y);
                current_byte = current_byte << 1 | u32::from(bit);
                bits_read += 1;
                if bits_read == 8 {
                    codewords.push(current_byte as u8);
                    bits_read = 0;
                    current_byte = 0;
                }
            }
        }
        right -= 2;
    }
    codewords
}

/// Decodes a sampled matrix down to corrected data codewords.
///
/// Fails softly (for the caller to retry mirrored) when the symbol reads
/// fewer codewords than its block structure demands or a block is beyond
/// Reed-Solomon repair; excess codewords are truncated.
pub(crate) fn decode_matrix(matrix: &BitMatrix) -> Result<(Vec<u8>, Version), QrError> {
    let version = read_version(matrix)?;
    let format = read_format_information(matrix)?;
    let codewords = read_codewords(matrix, version, format.mask);

    let layout = BlockLayout::of(version, format.ecc_level);
    if codewords.len() < layout.total_codewords() {
        return Err(QrError::Format("fewer codewords than the block structure requires"));
    }

    // De-interleave: data columns across blocks (short blocks first drop
    // out early), then ECC columns.
    let mut blocks: Vec<Vec<u8>> = layout
        .data_lens
        .iter()
        .map(|&len| Vec::with_capacity(len + layout.ecc_len))
        .collect();
    let max_data_len = layout.data_lens.iter().copied().max().unwrap_or(0);
    let mut cursor = 0usize;
    for i in 0..max_data_len {
        for (block, &len) in blocks.iter_mut().zip(&layout.data_lens) {
            if i < len {
                block.push(codewords[cursor]);
                cursor += 1;
            }
        }
    }
    for _ in 0..layout.ecc_len {
        for block in blocks.iter_mut() {
            block.push(codewords[cursor]);
            cursor += 1;
        }
    }

    let mut data = Vec::with_capacity(layout.data_lens.iter().sum());
    for (block, &len) in blocks.iter_mut().zip(&layout.data_lens) {
        reed_solomon::correct_errors(block, layout.ecc_len)?;
        data.extend_from_slice(&block[..len]);
    }
    Ok((data, version))
}
