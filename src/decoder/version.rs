//! Version information recovery for versions 7+: an 18-bit BCH(18,6) field
//! stored twice near the top-right and bottom-left finders.

use std::sync::OnceLock;

use crate::encoder::version_info_bits;
use crate::error::DecodeError;
use crate::models::{BitMatrix, Version};

/// Valid version codewords for versions 7-40.
fn version_table() -> &'static [(u32, u8); 34] {
    static TABLE: OnceLock<[(u32, u8); 34]> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut table = [(0u32, 0u8); 34];
        for (i, entry) in table.iter_mut().enumerate() {
            let version = i as u8 + 7;
            *entry = (
                version_info_bits(Version::new(version).expect("7..=40")),
                version,
            );
        }
        table
    })
}

/// Determine the symbol version. Below the version-info threshold the
/// dimension alone decides; otherwise both 18-bit copies are read and
/// matched against the valid codewords with distance up to 3.
pub fn read_version(matrix: &BitMatrix) -> Result<Version, DecodeError> {
    let dimension = matrix.width();
    let provisional =
        Version::from_dimension(dimension).ok_or(DecodeError::Format("bad dimension"))?;
    if provisional.number() < 7 {
        return Ok(provisional);
    }

    let bit = |x: usize, y: usize, acc: u32| (acc << 1) | matrix.get(x, y) as u32;
    let ij_min = dimension - 11;

    // Top-right block, columns dimension-11..dimension-9, MSB first
    let mut copy1 = 0u32;
    for y in (0..6).rev() {
        for x in (ij_min..dimension - 8).rev() {
            copy1 = bit(x, y, copy1);
        }
    }
    // Bottom-left block is the transpose
    let mut copy2 = 0u32;
    for x in (0..6).rev() {
        for y in (ij_min..dimension - 8).rev() {
            copy2 = bit(x, y, copy2);
        }
    }

    match decode_version_bits(copy1, copy2) {
        Some(version) if version.dimension() == dimension => Ok(version),
        // Neither copy decodes to a codeword matching the dimension
        _ => Err(DecodeError::Format("unreadable version info")),
    }
}

/// Nearest-match decode accepting Hamming distance up to 3.
pub fn decode_version_bits(copy1: u32, copy2: u32) -> Option<Version> {
    let mut best_version = 0u8;
    let mut best_difference = u32::MAX;
    for &(codeword, version) in version_table() {
        if codeword == copy1 || codeword == copy2 {
            return Version::new(version);
        }
        let difference = (copy1 ^ codeword).count_ones();
        if difference < best_difference {
            best_difference = difference;
            best_version = version;
        }
        if copy1 != copy2 {
            let difference = (copy2 ^ codeword).count_ones();
            if difference < best_difference {
                best_difference = difference;
                best_version = version;
            }
        }
    }
    (best_difference <= 3).then(|| Version::new(best_version)).flatten()
}
