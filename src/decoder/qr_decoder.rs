//! Symbol decoding: format/version recovery, unmasking, codeword
//! extraction, Reed-Solomon correction and bitstream parsing.

use crate::decoder::bitstream::{self, BitReader};
use crate::decoder::charset::{self, CharacterSet};
use crate::decoder::datablock;
use crate::decoder::format;
use crate::decoder::function_mask::FunctionMask;
use crate::decoder::modes::{AlphanumericDecoder, ByteDecoder, KanjiDecoder, NumericDecoder};
use crate::decoder::reed_solomon;
use crate::decoder::unmask::unmask;
use crate::decoder::version;
use crate::encoder::segment::Mode;
use crate::error::DecodeError;
use crate::models::{BitMatrix, DecoderResult, StructuredAppend, Version};

/// Decode a sampled module grid. Retries the mirror image when the
/// straight read fails, since a transposed sample is the common result
/// of swapped finder corners.
pub fn decode_matrix(
    bits: &BitMatrix,
    character_set: Option<CharacterSet>,
) -> Result<DecoderResult, DecodeError> {
    match decode_oriented(bits, character_set) {
        Ok(result) => Ok(result),
        Err(first_error) => {
            let mut mirrored = bits.clone();
            mirrored.mirror();
            match decode_oriented(&mirrored, character_set) {
                Ok(mut result) => {
                    result.mirrored = true;
                    Ok(result)
                }
                Err(_) => Err(first_error),
            }
        }
    }
}

fn decode_oriented(
    bits: &BitMatrix,
    character_set: Option<CharacterSet>,
) -> Result<DecoderResult, DecodeError> {
    let symbol_version = version::read_version(bits)?;
    let format_info = format::read_format_info(bits)?;
    let func = FunctionMask::new(symbol_version.number());
    if func.size() != bits.width() {
        return Err(DecodeError::Format("dimension mismatch"));
    }

    let mut matrix = bits.clone();
    unmask(&mut matrix, format_info.mask, &func);

    let raw = bitstream::extract_codewords(&matrix, symbol_version.number(), &func)?;
    let blocks = datablock::deinterleave(&raw, symbol_version.number(), format_info.ec_level)?;

    let mut data = Vec::new();
    for mut block in blocks {
        let ecc_len = block.codewords.len() - block.num_data_codewords;
        reed_solomon::correct_errors(&mut block.codewords, ecc_len)?;
        data.extend_from_slice(&block.codewords[..block.num_data_codewords]);
    }

    let parsed = parse_bitstream(&data, symbol_version, character_set)?;
    Ok(DecoderResult {
        text: parsed.text,
        bytes: parsed.bytes,
        byte_segments: parsed.byte_segments,
        version: symbol_version,
        ec_level: format_info.ec_level,
        mask: format_info.mask,
        mirrored: false,
        structured_append: parsed.structured_append,
        points: Vec::new(),
    })
}

struct ParsedStream {
    text: String,
    bytes: Vec<u8>,
    byte_segments: Vec<Vec<u8>>,
    structured_append: Option<StructuredAppend>,
}

// Mode indicators beyond the four data modes
const MODE_TERMINATOR: u32 = 0x0;
const MODE_STRUCTURED_APPEND: u32 = 0x3;
const MODE_FNC1_FIRST: u32 = 0x5;
const MODE_ECI: u32 = 0x7;
const MODE_FNC1_SECOND: u32 = 0x9;

/// Walk the segment stream until the terminator or the bits run out.
fn parse_bitstream(
    data: &[u8],
    symbol_version: Version,
    character_set: Option<CharacterSet>,
) -> Result<ParsedStream, DecodeError> {
    let mut reader = BitReader::new(data);
    let mut text = String::new();
    let mut bytes = Vec::new();
    let mut byte_segments = Vec::new();
    let mut structured_append = None;
    let mut eci_charset: Option<CharacterSet> = None;
    let mut fnc1 = false;

    loop {
        // Fewer than 4 bits left counts as an implicit terminator
        if reader.available() < 4 {
            break;
        }
        let mode = reader
            .read_bits(4)
            .ok_or(DecodeError::Format("truncated stream"))?;
        match mode {
            MODE_TERMINATOR => break,
            MODE_STRUCTURED_APPEND => {
                if reader.available() < 16 {
                    return Err(DecodeError::Format("truncated structured append"));
                }
                let sequence = reader.read_bits(8).unwrap_or(0) as u8;
                let parity = reader.read_bits(8).unwrap_or(0) as u8;
                structured_append = Some(StructuredAppend { sequence, parity });
            }
            MODE_FNC1_FIRST | MODE_FNC1_SECOND => {
                fnc1 = true;
            }
            MODE_ECI => {
                let value = parse_eci_value(&mut reader)?;
                eci_charset = Some(
                    CharacterSet::from_eci(value).ok_or(DecodeError::Format("unknown ECI value"))?,
                );
            }
            _ => {
                let data_mode = match mode {
                    0x1 => Mode::Numeric,
                    0x2 => Mode::Alphanumeric,
                    0x4 => Mode::Byte,
                    0x8 => Mode::Kanji,
                    _ => return Err(DecodeError::Format("invalid mode indicator")),
                };
                let count_bits = data_mode.char_count_bits(symbol_version.number());
                let count = reader
                    .read_bits(count_bits)
                    .ok_or(DecodeError::Format("truncated character count"))?
                    as usize;
                match data_mode {
                    Mode::Numeric => {
                        let segment = NumericDecoder::decode(&mut reader, count)
                            .ok_or(DecodeError::Format("bad numeric segment"))?;
                        bytes.extend_from_slice(segment.as_bytes());
                        text.push_str(&segment);
                    }
                    Mode::Alphanumeric => {
                        let segment = AlphanumericDecoder::decode(&mut reader, count, fnc1)
                            .ok_or(DecodeError::Format("bad alphanumeric segment"))?;
                        bytes.extend_from_slice(segment.as_bytes());
                        text.push_str(&segment);
                    }
                    Mode::Byte => {
                        let segment = ByteDecoder::decode(&mut reader, count)
                            .ok_or(DecodeError::Format("bad byte segment"))?;
                        let charset = eci_charset
                            .or(character_set)
                            .unwrap_or_else(|| charset::guess_encoding(&segment));
                        text.push_str(&charset.decode(&segment));
                        bytes.extend_from_slice(&segment);
                        byte_segments.push(segment);
                    }
                    Mode::Kanji => {
                        let segment = KanjiDecoder::decode(&mut reader, count)
                            .ok_or(DecodeError::Format("bad kanji segment"))?;
                        bytes.extend_from_slice(segment.as_bytes());
                        text.push_str(&segment);
                    }
                    Mode::Eci => unreachable!(),
                }
            }
        }
    }

    Ok(ParsedStream {
        text,
        bytes,
        byte_segments,
        structured_append,
    })
}

/// ECI assignment value: 1, 2 or 3 bytes depending on the prefix bits.
fn parse_eci_value(reader: &mut BitReader<'_>) -> Result<u32, DecodeError> {
    let first = reader
        .read_bits(8)
        .ok_or(DecodeError::Format("truncated ECI designator"))?;
    if first & 0x80 == 0 {
        return Ok(first & 0x7F);
    }
    if first & 0xC0 == 0x80 {
        let second = reader
            .read_bits(8)
            .ok_or(DecodeError::Format("truncated ECI designator"))?;
        return Ok(((first & 0x3F) << 8) | second);
    }
    if first & 0xE0 == 0xC0 {
        let rest = reader
            .read_bits(16)
            .ok_or(DecodeError::Format("truncated ECI designator"))?;
        return Ok(((first & 0x1F) << 16) | rest);
    }
    Err(DecodeError::Format("bad ECI designator"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::segment::Segment;
    use crate::encoder::{encode_segments, encode_text, EncodeOptions};
    use crate::models::ECLevel;

    #[test]
    fn test_roundtrip_numeric() {
        let symbol =
            encode_text("3141592653589793", ECLevel::M).unwrap();
        let result = decode_matrix(symbol.matrix(), None).unwrap();
        assert_eq!(result.text, "3141592653589793");
        assert_eq!(result.version, symbol.version());
        assert_eq!(result.ec_level, symbol.ec_level());
        assert!(!result.mirrored);
    }

    #[test]
    fn test_roundtrip_alphanumeric() {
        let symbol = encode_text("HELLO WORLD", ECLevel::Q).unwrap();
        let result = decode_matrix(symbol.matrix(), None).unwrap();
        assert_eq!(result.text, "HELLO WORLD");
    }

    #[test]
    fn test_roundtrip_byte_utf8() {
        let symbol = encode_text("grüße, 世界", ECLevel::M).unwrap();
        let result = decode_matrix(symbol.matrix(), None).unwrap();
        assert_eq!(result.text, "grüße, 世界");
        assert_eq!(result.byte_segments.len(), 1);
    }

    #[test]
    fn test_roundtrip_mirrored() {
        let symbol = encode_text("MIRROR TEST 1", ECLevel::L).unwrap();
        let mut mirrored = symbol.matrix().clone();
        mirrored.mirror();
        let result = decode_matrix(&mirrored, None).unwrap();
        assert_eq!(result.text, "MIRROR TEST 1");
        assert!(result.mirrored);
    }

    #[test]
    fn test_roundtrip_eci_segment() {
        let segments = vec![
            Segment::make_eci(26).unwrap(),
            Segment::make_bytes("χαίρε".as_bytes()),
        ];
        let symbol = encode_segments(&segments, ECLevel::M, &EncodeOptions::default()).unwrap();
        let result = decode_matrix(symbol.matrix(), None).unwrap();
        assert_eq!(result.text, "χαίρε");
    }

    #[test]
    fn test_roundtrip_latin1_bytes() {
        let segments = vec![Segment::make_bytes(&[b'c', b'a', b'f', 0xE9])];
        let symbol = encode_segments(&segments, ECLevel::M, &EncodeOptions::default()).unwrap();
        let result = decode_matrix(symbol.matrix(), None).unwrap();
        assert_eq!(result.text, "café");
        assert_eq!(result.bytes, vec![b'c', b'a', b'f', 0xE9]);
    }

    #[test]
    fn test_correctable_damage() {
        let symbol =
            encode_text("DAMAGE TOLERANCE", ECLevel::H).unwrap();
        let mut matrix = symbol.matrix().clone();
        // Flip a few data modules well inside the symbol
        for &(x, y) in &[(12, 12), (13, 12), (12, 13), (14, 15)] {
            matrix.toggle(x, y);
        }
        let result = decode_matrix(&matrix, None).unwrap();
        assert_eq!(result.text, "DAMAGE TOLERANCE");
    }

    #[test]
    fn test_decode_is_mask_invariant() {
        // The same payload behind each of the 8 masks reads back identically
        let segments = Segment::make_segments("MASK INVARIANT");
        for index in 0..8u8 {
            let options = EncodeOptions {
                mask: crate::models::MaskPattern::new(index),
                ..EncodeOptions::default()
            };
            let symbol = encode_segments(&segments, ECLevel::M, &options).unwrap();
            let result = decode_matrix(symbol.matrix(), None).unwrap();
            assert_eq!(result.text, "MASK INVARIANT", "mask {index}");
            assert_eq!(result.mask.index(), index);
        }
    }

    #[test]
    fn test_roundtrip_empty_string() {
        let symbol = encode_text("", ECLevel::L).unwrap();
        let result = decode_matrix(symbol.matrix(), None).unwrap();
        assert_eq!(result.text, "");
        assert!(result.bytes.is_empty());
    }

    #[test]
    fn test_blank_matrix_fails() {
        let matrix = BitMatrix::square(21);
        assert!(decode_matrix(&matrix, None).is_err());
    }
}
