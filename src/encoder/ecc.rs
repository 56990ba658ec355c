//! Reed-Solomon error correction generation and codeword interleaving.

use crate::error::EncodeError;
use crate::gf256::Gf256;
use crate::models::ECLevel;
use crate::tables;

/// Coefficients of the degree-`degree` RS generator polynomial
/// prod_{i=0}^{degree-1} (x - 2^i), leading monic term omitted.
/// Highest power first.
pub fn reed_solomon_divisor(degree: usize) -> Vec<u8> {
    debug_assert!((1..=255).contains(&degree));
    let mut result = vec![0u8; degree];
    result[degree - 1] = 1; // start with the polynomial 1

    // Multiply by (x - 2^i) for each root, dropping the leading term.
    let mut root = 1u8;
    for _ in 0..degree {
        for j in 0..degree {
            result[j] = Gf256::mul(result[j], root);
            if j + 1 < degree {
                result[j] ^= result[j + 1];
            }
        }
        root = Gf256::mul(root, 2);
    }
    result
}

/// Remainder of `data` * x^degree divided by the generator polynomial.
pub fn reed_solomon_remainder(data: &[u8], divisor: &[u8]) -> Vec<u8> {
    let mut result = vec![0u8; divisor.len()];
    for &b in data {
        let factor = b ^ result[0];
        result.rotate_left(1);
        *result.last_mut().unwrap() = 0;
        for (r, &coef) in result.iter_mut().zip(divisor) {
            *r ^= Gf256::mul(coef, factor);
        }
    }
    result
}

/// Split data codewords into blocks, compute per-block ECC, and interleave
/// into the final transmission sequence.
pub fn add_ecc_and_interleave(
    data: &[u8],
    version: u8,
    ec_level: ECLevel,
) -> Result<Vec<u8>, EncodeError> {
    if data.len() != tables::num_data_codewords(version, ec_level) {
        return Err(EncodeError::InvalidParameter("wrong data codeword count"));
    }
    let info = tables::ec_block_info(version, ec_level)
        .ok_or(EncodeError::InvalidParameter("invalid version"))?;
    let num_blocks = info.num_blocks;
    let block_ecc_len = info.ecc_per_block;
    let raw_codewords = tables::num_raw_data_modules(version) / 8;
    let num_short_blocks = num_blocks - raw_codewords % num_blocks;
    let short_block_len = raw_codewords / num_blocks;

    // Each long block carries one extra data codeword.
    let divisor = reed_solomon_divisor(block_ecc_len);
    let mut blocks: Vec<Vec<u8>> = Vec::with_capacity(num_blocks);
    let mut offset = 0usize;
    for i in 0..num_blocks {
        let data_len = short_block_len - block_ecc_len + usize::from(i >= num_short_blocks);
        let block_data = &data[offset..offset + data_len];
        offset += data_len;
        let mut block = block_data.to_vec();
        if i < num_short_blocks {
            // Pad short blocks so every block has the same interleave length.
            block.push(0);
        }
        block.extend(reed_solomon_remainder(block_data, &divisor));
        blocks.push(block);
    }
    debug_assert_eq!(offset, data.len());

    let mut result = Vec::with_capacity(raw_codewords);
    for i in 0..blocks[0].len() {
        for (j, block) in blocks.iter().enumerate() {
            // Skip the padding codeword in short blocks.
            if i != short_block_len - block_ecc_len || j >= num_short_blocks {
                result.push(block[i]);
            }
        }
    }
    debug_assert_eq!(result.len(), raw_codewords);
    Ok(result)
}
