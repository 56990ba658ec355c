//! QR symbol generation: segments to codewords to masked module grid.

/// Reed-Solomon generation and interleaving
pub mod ecc;
/// Module placement and mask selection
pub mod matrix;
/// Data segments and bit packing
pub mod segment;

use crate::error::EncodeError;
use crate::models::{ECLevel, MaskPattern, Symbol, Version};
use crate::tables;

use matrix::MatrixBuilder;
use segment::{BitBuffer, Segment};

pub(crate) use matrix::{format_info_bits, version_info_bits};

const PAD_BYTES: [u32; 2] = [0xEC, 0x11];

/// Knobs for symbol generation. The defaults search the full version range,
/// pick the mask by penalty score, and boost the EC level when spare
/// capacity allows.
#[derive(Debug, Clone)]
pub struct EncodeOptions {
    /// Smallest version the search may pick
    pub min_version: Version,
    /// Largest version the search may pick
    pub max_version: Version,
    /// Force a specific mask instead of penalty-based selection
    pub mask: Option<MaskPattern>,
    /// Raise the EC level when it fits in the chosen version for free
    pub boost_ecc: bool,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            min_version: Version::MIN,
            max_version: Version::MAX,
            mask: None,
            boost_ecc: true,
        }
    }
}

/// Encode Unicode text at the given EC level, using the most compact mode
/// its characters allow and the smallest version that fits.
pub fn encode_text(text: &str, ec_level: ECLevel) -> Result<Symbol, EncodeError> {
    encode_segments(
        &Segment::make_segments(text),
        ec_level,
        &EncodeOptions::default(),
    )
}

/// Encode raw binary data in byte mode.
pub fn encode_bytes(data: &[u8], ec_level: ECLevel) -> Result<Symbol, EncodeError> {
    encode_segments(
        &[Segment::make_bytes(data)],
        ec_level,
        &EncodeOptions::default(),
    )
}

/// Encode pre-built segments. This is the most general entry point; the
/// text and byte helpers call through it.
pub fn encode_segments(
    segments: &[Segment],
    ec_level: ECLevel,
    options: &EncodeOptions,
) -> Result<Symbol, EncodeError> {
    if options.min_version > options.max_version {
        return Err(EncodeError::InvalidParameter("empty version range"));
    }

    // Smallest version in range whose data capacity fits the segments.
    let mut version = options.min_version;
    let data_used_bits = loop {
        let capacity = tables::num_data_codewords(version.number(), ec_level) * 8;
        match Segment::total_bits(segments, version.number()) {
            Some(used) if used <= capacity => break used,
            _ if version == options.max_version => {
                return Err(EncodeError::DataTooLong {
                    needed: Segment::total_bits(segments, version.number()).unwrap_or(usize::MAX),
                    capacity,
                });
            }
            _ => {
                version = Version::new(version.number() + 1)
                    .expect("max_version bounds the search");
            }
        }
    };

    // Boost the EC level as far as the fixed version allows.
    let mut ec_level = ec_level;
    if options.boost_ecc {
        for candidate in [ECLevel::M, ECLevel::Q, ECLevel::H] {
            if candidate > ec_level
                && data_used_bits <= tables::num_data_codewords(version.number(), candidate) * 8
            {
                ec_level = candidate;
            }
        }
    }

    // Segment headers and payloads
    let mut bits = BitBuffer::new();
    for seg in segments {
        bits.append_bits(seg.mode().mode_bits(), 4);
        bits.append_bits(
            seg.num_chars() as u32,
            seg.mode().char_count_bits(version.number()),
        );
        bits.extend(seg.data());
    }
    debug_assert_eq!(bits.len(), data_used_bits);

    // Terminator, byte alignment, then alternating pad codewords
    let capacity_bits = tables::num_data_codewords(version.number(), ec_level) * 8;
    bits.append_bits(0, 4.min(capacity_bits - bits.len()));
    bits.append_bits(0, (8 - bits.len() % 8) % 8);
    let mut pad = PAD_BYTES.iter().cycle();
    while bits.len() < capacity_bits {
        bits.append_bits(*pad.next().unwrap(), 8);
    }
    debug_assert_eq!(bits.len() % 8, 0);

    let codewords = ecc::add_ecc_and_interleave(&bits.to_bytes(), version.number(), ec_level)?;
    let mut builder = MatrixBuilder::new(version, ec_level);
    builder.draw_codewords(&codewords)?;
    Ok(builder.into_symbol(options.mask))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_picks_smallest_version() {
        let symbol = encode_text("HELLO WORLD", ECLevel::L).unwrap();
        assert_eq!(symbol.version().number(), 1);
    }

    #[test]
    fn test_encode_empty_string() {
        // Zero segments still produce a valid (all-padding) version 1 symbol.
        let symbol = encode_text("", ECLevel::L).unwrap();
        assert_eq!(symbol.version().number(), 1);
    }

    #[test]
    fn test_boost_ecc() {
        // "HELLO WORLD" needs 74 data bits; version 1 holds 104 at Q but
        // only 72 at H, so boosting from L stops at Q.
        let symbol = encode_text("HELLO WORLD", ECLevel::L).unwrap();
        assert_eq!(symbol.ec_level(), ECLevel::Q);

        let options = EncodeOptions {
            boost_ecc: false,
            ..EncodeOptions::default()
        };
        let segments = Segment::make_segments("HELLO WORLD");
        let symbol = encode_segments(&segments, ECLevel::L, &options).unwrap();
        assert_eq!(symbol.ec_level(), ECLevel::L);
    }

    #[test]
    fn test_data_too_long() {
        let text = "A".repeat(5000);
        assert!(matches!(
            encode_text(&text, ECLevel::H),
            Err(EncodeError::DataTooLong { .. })
        ));
    }

    #[test]
    fn test_version_range_respected() {
        let options = EncodeOptions {
            min_version: Version::new(5).unwrap(),
            max_version: Version::new(5).unwrap(),
            ..EncodeOptions::default()
        };
        let segments = Segment::make_segments("123");
        let symbol = encode_segments(&segments, ECLevel::L, &options).unwrap();
        assert_eq!(symbol.version().number(), 5);

        let too_small = EncodeOptions {
            min_version: Version::new(1).unwrap(),
            max_version: Version::new(1).unwrap(),
            ..EncodeOptions::default()
        };
        let long = Segment::make_segments(&"7".repeat(100));
        assert!(encode_segments(&long, ECLevel::H, &too_small).is_err());
    }

    #[test]
    fn test_forced_mask() {
        for index in 0..8u8 {
            let options = EncodeOptions {
                mask: MaskPattern::new(index),
                ..EncodeOptions::default()
            };
            let segments = Segment::make_segments("MASK TEST");
            let symbol = encode_segments(&segments, ECLevel::M, &options).unwrap();
            assert_eq!(symbol.mask().index(), index);
        }
    }

    #[test]
    fn test_encode_bytes_binary_safe() {
        let data = [0x00u8, 0xFF, 0x80, 0x7F];
        let symbol = encode_bytes(&data, ECLevel::M).unwrap();
        assert_eq!(symbol.version().number(), 1);
    }
}
