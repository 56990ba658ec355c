//! Format information recovery: the 15-bit field carrying EC level and
//! mask pattern, stored twice and protected by BCH(15,5).

use std::sync::OnceLock;

use crate::encoder::format_info_bits;
use crate::error::DecodeError;
use crate::models::{BitMatrix, ECLevel, MaskPattern};

const FORMAT_INFO_MASK: u32 = 0x5412;

/// Decoded format field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatInfo {
    /// Error correction level of the symbol
    pub ec_level: ECLevel,
    /// Data mask applied to the symbol
    pub mask: MaskPattern,
}

/// All 32 valid (already masked) format codewords with their data bits.
fn format_table() -> &'static [(u32, u8); 32] {
    static TABLE: OnceLock<[(u32, u8); 32]> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut table = [(0u32, 0u8); 32];
        for data in 0..32u8 {
            let ec_level = ECLevel::from_format_bits(data >> 3).expect("2-bit value");
            let mask = MaskPattern::new(data & 0x07).expect("3-bit value");
            table[data as usize] = (format_info_bits(ec_level, mask), data);
        }
        table
    })
}

/// Read both format copies from an unprocessed matrix and decode them.
pub fn read_format_info(matrix: &BitMatrix) -> Result<FormatInfo, DecodeError> {
    let dimension = matrix.width();
    let bit = |x: usize, y: usize, acc: u32| (acc << 1) | matrix.get(x, y) as u32;

    // First copy, around the top-left finder, most significant bit first
    let mut copy1 = 0u32;
    for x in 0..6 {
        copy1 = bit(x, 8, copy1);
    }
    copy1 = bit(7, 8, copy1);
    copy1 = bit(8, 8, copy1);
    copy1 = bit(8, 7, copy1);
    for y in (0..6).rev() {
        copy1 = bit(8, y, copy1);
    }

    // Second copy, split along the other two finders
    let mut copy2 = 0u32;
    for y in (dimension - 7..dimension).rev() {
        copy2 = bit(8, y, copy2);
    }
    for x in dimension - 8..dimension {
        copy2 = bit(x, 8, copy2);
    }

    decode_format_bits(copy1, copy2).ok_or(DecodeError::Format("unreadable format info"))
}

/// Nearest-match decode over the 32 valid codewords, accepting Hamming
/// distance up to 3. Retries with the fixed XOR mask stripped, for symbols
/// written without it.
pub fn decode_format_bits(copy1: u32, copy2: u32) -> Option<FormatInfo> {
    do_decode(copy1, copy2)
        .or_else(|| do_decode(copy1 ^ FORMAT_INFO_MASK, copy2 ^ FORMAT_INFO_MASK))
}

fn do_decode(copy1: u32, copy2: u32) -> Option<FormatInfo> {
    let mut best_data = None;
    let mut best_difference = u32::MAX;
    for &(codeword, data) in format_table() {
        if codeword == copy1 || codeword == copy2 {
            best_data = Some(data);
            best_difference = 0;
            break;
        }
        let difference = (copy1 ^ codeword).count_ones();
        if difference < best_difference {
            best_difference = difference;
            best_data = Some(data);
        }
        if copy1 != copy2 {
            let difference = (copy2 ^ codeword).count_ones();
            if difference < best_difference {
                best_difference = difference;
                best_data = Some(data);
            }
        }
    }
    if best_difference > 3 {
        return None;
    }
    let data = best_data?;
    Some(FormatInfo {
        ec_level: ECLevel::from_format_bits(data >> 3)?,
        mask: MaskPattern::new(data & 0x07)?,
    })
}
