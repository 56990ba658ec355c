//! Codeword extraction: walk the zigzag placement order over an
//! unmasked matrix and pack data-module bits into bytes, MSB first.

use crate::decoder::function_mask::FunctionMask;
use crate::error::DecodeError;
use crate::models::BitMatrix;
use crate::tables;

/// Read every data module in placement order and pack them into bytes.
pub fn extract_codewords(
    matrix: &BitMatrix,
    version: u8,
    func: &FunctionMask,
) -> Result<Vec<u8>, DecodeError> {
    let size = func.size();
    let expected = tables::num_raw_data_modules(version) / 8;
    let mut codewords = Vec::with_capacity(expected);
    let mut current = 0u8;
    let mut bits_read = 0u8;

    // Same traversal the placement step uses: column pairs right to
    // left, vertical timing column shared between two pairs.
    let mut right = size as i32 - 1;
    while right >= 1 {
        if right == 6 {
            right = 5;
        }
        for vert in 0..size {
            for j in 0..2 {
                let x = (right - j) as usize;
                let upward = (right + 1) & 2 == 0;
                let y = if upward { size - 1 - vert } else { vert };
                if func.is_function(x, y) {
                    continue;
                }
                current = (current << 1) | matrix.get(x, y) as u8;
                bits_read += 1;
                if bits_read == 8 {
                    codewords.push(current);
                    current = 0;
                    bits_read = 0;
                }
            }
        }
        right -= 2;
    }
    // Remainder bits (0, 3, 4 or 7 depending on version) are dropped

    if codewords.len() != expected {
        return Err(DecodeError::Format("wrong codeword count"));
    }
    Ok(codewords)
}

/// Sequential MSB-first reader over the corrected data codewords.
pub struct BitReader<'a> {
    bytes: &'a [u8],
    byte_offset: usize,
    bit_offset: usize,
}

impl<'a> BitReader<'a> {
    /// Reader positioned at the first bit of `bytes`.
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, byte_offset: 0, bit_offset: 0 }
    }

    /// Bits left to read.
    pub fn available(&self) -> usize {
        8 * (self.bytes.len() - self.byte_offset) - self.bit_offset
    }

    /// Read up to 21 bits (the longest QR field). None when the stream
    /// runs dry.
    pub fn read_bits(&mut self, count: usize) -> Option<u32> {
        if count == 0 || count > 21 || count > self.available() {
            return None;
        }
        let mut result = 0u32;
        for _ in 0..count {
            let byte = self.bytes[self.byte_offset];
            let bit = (byte >> (7 - self.bit_offset)) & 1;
            result = (result << 1) | bit as u32;
            self.bit_offset += 1;
            if self.bit_offset == 8 {
                self.bit_offset = 0;
                self.byte_offset += 1;
            }
        }
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_reader() {
        let mut reader = BitReader::new(&[0b1010_0101, 0b1100_0011]);
        assert_eq!(reader.available(), 16);
        assert_eq!(reader.read_bits(4), Some(0b1010));
        assert_eq!(reader.read_bits(6), Some(0b0101_11));
        assert_eq!(reader.available(), 6);
        assert_eq!(reader.read_bits(6), Some(0b00_0011));
        assert_eq!(reader.read_bits(1), None);
    }

    #[test]
    fn test_codeword_count_per_version() {
        for version in [1u8, 5, 7, 25, 40] {
            let func = FunctionMask::new(version);
            let matrix = BitMatrix::square(func.size());
            let codewords = extract_codewords(&matrix, version, &func).unwrap();
            assert_eq!(
                codewords.len(),
                tables::num_raw_data_modules(version) / 8,
                "version {version}"
            );
        }
    }

    #[test]
    fn test_all_dark_data_modules_give_ff() {
        let func = FunctionMask::new(2);
        let mut matrix = BitMatrix::square(25);
        for y in 0..25 {
            for x in 0..25 {
                if !func.is_function(x, y) {
                    matrix.set(x, y, true);
                }
            }
        }
        let codewords = extract_codewords(&matrix, 2, &func).unwrap();
        assert!(codewords.iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn test_first_codeword_read_from_bottom_right() {
        // The first byte comes from the 4x2 block in the bottom-right
        // corner, read bottom to top.
        let func = FunctionMask::new(1);
        let mut matrix = BitMatrix::square(21);
        matrix.set(20, 20, true); // MSB of byte 0
        matrix.set(19, 17, true); // LSB of byte 0
        let codewords = extract_codewords(&matrix, 1, &func).unwrap();
        assert_eq!(codewords[0], 0x81);
        assert!(codewords[1..].iter().all(|&b| b == 0));
    }
}
