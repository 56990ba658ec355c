//! De-interleaving: split the raw codeword sequence back into the
//! per-block data+ECC groups the encoder interleaved.

use crate::error::DecodeError;
use crate::models::ECLevel;
use crate::tables;

/// One error correction block: data codewords followed by ECC codewords.
pub struct DataBlock {
    /// How many leading codewords carry data (the rest are ECC)
    pub num_data_codewords: usize,
    /// Data codewords followed by ECC codewords
    pub codewords: Vec<u8>,
}

/// Undo the byte-wise interleave. Short blocks come first and carry one
/// fewer data codeword than long blocks.
pub fn deinterleave(
    raw: &[u8],
    version: u8,
    ec_level: ECLevel,
) -> Result<Vec<DataBlock>, DecodeError> {
    let info = tables::ec_block_info(version, ec_level)
        .ok_or(DecodeError::Format("invalid version"))?;
    let total_codewords = tables::num_raw_data_modules(version) / 8;
    if raw.len() != total_codewords {
        return Err(DecodeError::Format("wrong codeword count"));
    }

    let num_blocks = info.num_blocks;
    let ecc_per_block = info.ecc_per_block;
    let short_block_len = total_codewords / num_blocks;
    let num_short_blocks = num_blocks - total_codewords % num_blocks;
    let short_data_len = short_block_len - ecc_per_block;

    let mut blocks: Vec<DataBlock> = (0..num_blocks)
        .map(|i| {
            let num_data = short_data_len + usize::from(i >= num_short_blocks);
            DataBlock {
                num_data_codewords: num_data,
                codewords: vec![0u8; num_data + ecc_per_block],
            }
        })
        .collect();

    let mut offset = 0usize;
    // Data rounds shared by every block
    for i in 0..short_data_len {
        for block in blocks.iter_mut() {
            block.codewords[i] = raw[offset];
            offset += 1;
        }
    }
    // The extra data codeword of each long block
    for block in blocks.iter_mut().skip(num_short_blocks) {
        block.codewords[short_data_len] = raw[offset];
        offset += 1;
    }
    // ECC rounds
    for i in 0..ecc_per_block {
        for block in blocks.iter_mut() {
            let idx = block.num_data_codewords + i;
            block.codewords[idx] = raw[offset];
            offset += 1;
        }
    }
    debug_assert_eq!(offset, raw.len());
    Ok(blocks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::ecc::add_ecc_and_interleave;

    #[test]
    fn test_single_block_roundtrip() {
        let data: Vec<u8> = (0..19).collect();
        let raw = add_ecc_and_interleave(&data, 1, ECLevel::L).unwrap();
        let blocks = deinterleave(&raw, 1, ECLevel::L).unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].num_data_codewords, 19);
        assert_eq!(&blocks[0].codewords[..19], &data[..]);
    }

    #[test]
    fn test_multi_block_roundtrip() {
        // Version 5 H: 2 short blocks (11 data), 2 long blocks (12 data)
        let data: Vec<u8> = (0..46).collect();
        let raw = add_ecc_and_interleave(&data, 5, ECLevel::H).unwrap();
        let blocks = deinterleave(&raw, 5, ECLevel::H).unwrap();
        assert_eq!(blocks.len(), 4);
        assert_eq!(blocks[0].num_data_codewords, 11);
        assert_eq!(blocks[3].num_data_codewords, 12);

        // Concatenated data portions reproduce the original sequence
        let mut recovered = Vec::new();
        for block in &blocks {
            recovered.extend_from_slice(&block.codewords[..block.num_data_codewords]);
        }
        assert_eq!(recovered, data);
    }

    #[test]
    fn test_wrong_length_rejected() {
        let raw = vec![0u8; 10];
        assert!(deinterleave(&raw, 1, ECLevel::L).is_err());
    }
}
