//! Capacity and block-structure tables from the QR Code Model 2 specification.
//!
//! Shared by the encoder (capacity planning, block split) and the decoder
//! (de-interleaving). Static, read-only, safe to share across threads.

use crate::models::ECLevel;

/// Block structure for one (version, EC level) pair.
pub struct EcBlockInfo {
    /// Number of error correction blocks
    pub num_blocks: usize,
    /// ECC codewords in each block
    pub ecc_per_block: usize,
}

// Index: [ec_level][version]; index 0 is padding.
const ECC_CODEWORDS_PER_BLOCK: [[i8; 41]; 4] = [
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

const NUM_ERROR_CORRECTION_BLOCKS: [[i8; 41]; 4] = [
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

/// Number of data modules available in a symbol of the given version, after
/// excluding all function patterns. Includes remainder bits, so it may not
/// be a multiple of 8. Result is in [208, 29648].
pub fn num_raw_data_modules(version: u8) -> usize {
    debug_assert!((1..=40).contains(&version));
    let ver = version as usize;
    let mut result = (16 * ver + 128) * ver + 64;
    if ver >= 2 {
        let num_align = ver / 7 + 2;
        result -= (25 * num_align - 10) * num_align - 55;
        if ver >= 7 {
            result -= 36;
        }
    }
    debug_assert!((208..=29648).contains(&result));
    result
}

/// Number of 8-bit data codewords (not error correction) for the given
/// version and EC level, remainder bits discarded.
pub fn num_data_codewords(version: u8, ec_level: ECLevel) -> usize {
    let idx = ec_level.ordinal();
    let ver = version as usize;
    num_raw_data_modules(version) / 8
        - ECC_CODEWORDS_PER_BLOCK[idx][ver] as usize * NUM_ERROR_CORRECTION_BLOCKS[idx][ver] as usize
}

/// Block count and per-block ECC length for the given version and EC level.
pub fn ec_block_info(version: u8, ec_level: ECLevel) -> Option<EcBlockInfo> {
    if !(1..=40).contains(&version) {
        return None;
    }
    let idx = ec_level.ordinal();
    let ecc = ECC_CODEWORDS_PER_BLOCK[idx][version as usize];
    let blocks = NUM_ERROR_CORRECTION_BLOCKS[idx][version as usize];
    if ecc <= 0 || blocks <= 0 {
        return None;
    }
    Some(EcBlockInfo {
        num_blocks: blocks as usize,
        ecc_per_block: ecc as usize,
    })
}

/// Ascending alignment pattern center positions for a version, used on both
/// axes. Empty for version 1.
pub fn alignment_pattern_positions(version: u8) -> Vec<usize> {
    if version == 1 {
        return Vec::new();
    }
    let size = 17 + 4 * version as usize;
    let num_align = (version / 7 + 2) as usize;
    let step = if version == 32 {
        26
    } else {
        // ceil((size - 13) / (num_align * 2 - 2)) * 2
        let denom = num_align * 2 - 2;
        (size - 13).div_ceil(denom) * 2
    };

    let mut positions = vec![6usize];
    let mut pos = size - 7;
    while positions.len() < num_align {
        positions.insert(1, pos);
        pos -= step;
    }
    positions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_data_modules() {
        assert_eq!(num_raw_data_modules(1), 208);
        assert_eq!(num_raw_data_modules(2), 359);
        assert_eq!(num_raw_data_modules(7), 1568);
        assert_eq!(num_raw_data_modules(40), 29648);
    }

    #[test]
    fn test_data_codewords() {
        // Version 1: 26 total codewords
        assert_eq!(num_data_codewords(1, ECLevel::L), 19);
        assert_eq!(num_data_codewords(1, ECLevel::M), 16);
        assert_eq!(num_data_codewords(1, ECLevel::Q), 13);
        assert_eq!(num_data_codewords(1, ECLevel::H), 9);
        // Version 2
        assert_eq!(num_data_codewords(2, ECLevel::Q), 22);
    }

    #[test]
    fn test_block_info() {
        let info = ec_block_info(5, ECLevel::H).unwrap();
        assert_eq!(info.num_blocks, 4);
        assert_eq!(info.ecc_per_block, 22);
        assert!(ec_block_info(0, ECLevel::L).is_none());
        assert!(ec_block_info(41, ECLevel::L).is_none());
    }

    #[test]
    fn test_alignment_positions() {
        assert!(alignment_pattern_positions(1).is_empty());
        assert_eq!(alignment_pattern_positions(2), vec![6, 18]);
        assert_eq!(alignment_pattern_positions(7), vec![6, 22, 38]);
        assert_eq!(
            alignment_pattern_positions(32),
            vec![6, 34, 60, 86, 112, 138]
        );
        assert_eq!(
            alignment_pattern_positions(40),
            vec![6, 30, 58, 86, 114, 142, 170]
        );
    }

    #[test]
    fn test_codewords_consistent_with_blocks() {
        // Data + ECC codewords must fill the raw capacity for every version/level.
        for version in 1..=40u8 {
            for level in [ECLevel::L, ECLevel::M, ECLevel::Q, ECLevel::H] {
                let info = ec_block_info(version, level).unwrap();
                let total = num_raw_data_modules(version) / 8;
                assert_eq!(
                    num_data_codewords(version, level)
                        + info.num_blocks * info.ecc_per_block,
                    total,
                    "v{version} {level:?}"
                );
            }
        }
    }
}
