//! Data segments: runs of characters encoded in one QR mode.
//!
//! A message becomes a sequence of segments, each carrying its own mode
//! indicator and character count field. Segment data bits are fixed here;
//! only the count field width varies with the chosen version.

use crate::error::EncodeError;

const ALPHANUMERIC_CHARSET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ $%*+-./:";

/// Growable bit string, most significant bit first.
#[derive(Debug, Clone, Default)]
pub struct BitBuffer {
    bits: Vec<bool>,
}

impl BitBuffer {
    /// Empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Length in bits.
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// True when no bits have been appended.
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Append the low `count` bits of `value`, most significant first.
    pub fn append_bits(&mut self, value: u32, count: usize) {
        debug_assert!(count <= 31);
        debug_assert!(count == 31 || value >> count == 0, "value out of range");
        for i in (0..count).rev() {
            self.bits.push((value >> i) & 1 != 0);
        }
    }

    /// Append all bits of another buffer.
    pub fn extend(&mut self, other: &BitBuffer) {
        self.bits.extend_from_slice(&other.bits);
    }

    /// Pack into bytes, zero-padding the final partial byte.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = vec![0u8; self.bits.len().div_ceil(8)];
        for (i, &bit) in self.bits.iter().enumerate() {
            if bit {
                bytes[i / 8] |= 0x80 >> (i % 8);
            }
        }
        bytes
    }
}

/// Segment encoding mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Digits 0-9, packed three per 10 bits
    Numeric,
    /// Digits, uppercase letters and nine symbols, two per 11 bits
    Alphanumeric,
    /// Raw 8-bit data
    Byte,
    /// Shift-JIS characters, 13 bits each
    Kanji,
    /// Extended Channel Interpretation designator (no characters)
    Eci,
}

impl Mode {
    /// 4-bit mode indicator placed before the segment.
    pub fn mode_bits(&self) -> u32 {
        match self {
            Mode::Numeric => 0x1,
            Mode::Alphanumeric => 0x2,
            Mode::Byte => 0x4,
            Mode::Kanji => 0x8,
            Mode::Eci => 0x7,
        }
    }

    /// Width of the character count field for a given version.
    pub fn char_count_bits(&self, version: u8) -> usize {
        let band = match version {
            1..=9 => 0,
            10..=26 => 1,
            _ => 2,
        };
        match self {
            Mode::Numeric => [10, 12, 14][band],
            Mode::Alphanumeric => [9, 11, 13][band],
            Mode::Byte => [8, 16, 16][band],
            Mode::Kanji => [8, 10, 12][band],
            Mode::Eci => 0,
        }
    }
}

/// A mode, a character count, and the segment's data bits.
#[derive(Debug, Clone)]
pub struct Segment {
    mode: Mode,
    num_chars: usize,
    data: BitBuffer,
}

impl Segment {
    /// Encoding mode of this segment.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Character count (not bit count) for the count field.
    pub fn num_chars(&self) -> usize {
        self.num_chars
    }

    /// The segment's data bits, count field excluded.
    pub fn data(&self) -> &BitBuffer {
        &self.data
    }

    /// Whether every character can go in a numeric segment.
    pub fn is_numeric(text: &str) -> bool {
        text.bytes().all(|b| b.is_ascii_digit())
    }

    /// Whether every character can go in an alphanumeric segment.
    pub fn is_alphanumeric(text: &str) -> bool {
        text.bytes().all(|b| ALPHANUMERIC_CHARSET.contains(&b))
    }

    /// Digits packed in groups of three, 10 bits per group.
    pub fn make_numeric(text: &str) -> Result<Self, EncodeError> {
        if !Self::is_numeric(text) {
            return Err(EncodeError::InvalidParameter("non-digit in numeric segment"));
        }
        let mut data = BitBuffer::new();
        for chunk in text.as_bytes().chunks(3) {
            let mut value = 0u32;
            for &b in chunk {
                value = value * 10 + (b - b'0') as u32;
            }
            data.append_bits(value, chunk.len() * 3 + 1);
        }
        Ok(Self {
            mode: Mode::Numeric,
            num_chars: text.len(),
            data,
        })
    }

    /// Characters from the 45-symbol alphanumeric set, packed in pairs of
    /// 11 bits.
    pub fn make_alphanumeric(text: &str) -> Result<Self, EncodeError> {
        let mut data = BitBuffer::new();
        let mut iter = text.bytes();
        loop {
            let Some(first) = iter.next() else { break };
            let a = alphanumeric_value(first)?;
            match iter.next() {
                Some(second) => {
                    let b = alphanumeric_value(second)?;
                    data.append_bits(a * 45 + b, 11);
                }
                None => data.append_bits(a, 6),
            }
        }
        Ok(Self {
            mode: Mode::Alphanumeric,
            num_chars: text.len(),
            data,
        })
    }

    /// Arbitrary bytes, 8 bits each.
    pub fn make_bytes(bytes: &[u8]) -> Self {
        let mut data = BitBuffer::new();
        for &b in bytes {
            data.append_bits(b as u32, 8);
        }
        Self {
            mode: Mode::Byte,
            num_chars: bytes.len(),
            data,
        }
    }

    /// Kanji mode: each character is a two-byte Shift-JIS code compacted
    /// into 13 bits. Rejects text outside the double-byte JIS X 0208 range.
    pub fn make_kanji(text: &str) -> Result<Self, EncodeError> {
        let (sjis, _, had_errors) = encoding_rs::SHIFT_JIS.encode(text);
        if had_errors || sjis.len() != 2 * text.chars().count() {
            return Err(EncodeError::InvalidParameter("not kanji-mode encodable"));
        }
        let mut data = BitBuffer::new();
        for pair in sjis.chunks(2) {
            let code = ((pair[0] as u32) << 8) | pair[1] as u32;
            let offset = match code {
                0x8140..=0x9FFC => 0x8140,
                0xE040..=0xEBBF => 0xC140,
                _ => return Err(EncodeError::InvalidParameter("not kanji-mode encodable")),
            };
            let shifted = code - offset;
            data.append_bits((shifted >> 8) * 0xC0 + (shifted & 0xFF), 13);
        }
        Ok(Self {
            mode: Mode::Kanji,
            num_chars: text.chars().count(),
            data,
        })
    }

    /// Extended Channel Interpretation designator. Carries no characters;
    /// it switches the interpretation of following byte segments.
    pub fn make_eci(assign_value: u32) -> Result<Self, EncodeError> {
        let mut data = BitBuffer::new();
        if assign_value < (1 << 7) {
            data.append_bits(assign_value, 8);
        } else if assign_value < (1 << 14) {
            data.append_bits(0b10, 2);
            data.append_bits(assign_value, 14);
        } else if assign_value < 1_000_000 {
            data.append_bits(0b110, 3);
            data.append_bits(assign_value, 21);
        } else {
            return Err(EncodeError::InvalidParameter("ECI value out of range"));
        }
        Ok(Self {
            mode: Mode::Eci,
            num_chars: 0,
            data,
        })
    }

    /// Split text into the smallest natural segment: numeric if all digits,
    /// alphanumeric if the 45-symbol set covers it, otherwise UTF-8 bytes.
    pub fn make_segments(text: &str) -> Vec<Segment> {
        if text.is_empty() {
            Vec::new()
        } else if Self::is_numeric(text) {
            vec![Self::make_numeric(text).unwrap()]
        } else if Self::is_alphanumeric(text) {
            vec![Self::make_alphanumeric(text).unwrap()]
        } else {
            vec![Self::make_bytes(text.as_bytes())]
        }
    }

    /// Total bit length of the given segments at a version, or None when a
    /// segment's character count overflows its count field.
    pub fn total_bits(segments: &[Segment], version: u8) -> Option<usize> {
        let mut result = 0usize;
        for seg in segments {
            let ccbits = seg.mode.char_count_bits(version);
            if ccbits < usize::BITS as usize && seg.num_chars >= (1 << ccbits) {
                return None;
            }
            result += 4 + ccbits + seg.data.len();
        }
        Some(result)
    }
}

fn alphanumeric_value(b: u8) -> Result<u32, EncodeError> {
    ALPHANUMERIC_CHARSET
        .iter()
        .position(|&c| c == b)
        .map(|i| i as u32)
        .ok_or(EncodeError::InvalidParameter(
            "character not in alphanumeric set",
        ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_bits_msb_first() {
        let mut buf = BitBuffer::new();
        buf.append_bits(0b101, 3);
        buf.append_bits(0b0110, 4);
        assert_eq!(buf.len(), 7);
        assert_eq!(buf.to_bytes(), vec![0b1010110_0]);
    }

    #[test]
    fn test_append_bits_uses_bit_positions() {
        // Each output bit must be (value >> i) & 1, not a comparison
        // against the loop index.
        let mut buf = BitBuffer::new();
        buf.append_bits(0xA5, 8);
        assert_eq!(buf.to_bytes(), vec![0xA5]);
        let mut buf = BitBuffer::new();
        buf.append_bits(1, 8);
        assert_eq!(buf.to_bytes(), vec![0x01]);
    }

    #[test]
    fn test_numeric_segment() {
        let seg = Segment::make_numeric("01234567").unwrap();
        assert_eq!(seg.num_chars(), 8);
        // 012 345 67 -> 10 + 10 + 7 bits
        assert_eq!(seg.data().len(), 27);
        assert!(Segment::make_numeric("12a").is_err());
    }

    #[test]
    fn test_alphanumeric_segment() {
        let seg = Segment::make_alphanumeric("AC-42").unwrap();
        assert_eq!(seg.num_chars(), 5);
        // 2 pairs of 11 bits + 1 final 6-bit char
        assert_eq!(seg.data().len(), 28);
        assert!(Segment::make_alphanumeric("ab").is_err());
    }

    #[test]
    fn test_byte_segment() {
        let seg = Segment::make_bytes(b"\x00\xFF");
        assert_eq!(seg.num_chars(), 2);
        assert_eq!(seg.data().to_bytes(), vec![0x00, 0xFF]);
    }

    #[test]
    fn test_kanji_segment() {
        // "点" is Shift-JIS 0x935F; compacted: (0x12 * 0xC0 + 0x1F) = 0xD9F
        let seg = Segment::make_kanji("点").unwrap();
        assert_eq!(seg.num_chars(), 1);
        assert_eq!(seg.data().len(), 13);
        assert_eq!(seg.data().to_bytes(), vec![0x6C, 0xF8]);
        // ASCII has no double-byte Shift-JIS form
        assert!(Segment::make_kanji("abc").is_err());
    }

    #[test]
    fn test_eci_segment_widths() {
        assert_eq!(Segment::make_eci(26).unwrap().data().len(), 8);
        assert_eq!(Segment::make_eci(200).unwrap().data().len(), 16);
        assert_eq!(Segment::make_eci(20000).unwrap().data().len(), 24);
        assert!(Segment::make_eci(1_000_000).is_err());
    }

    #[test]
    fn test_make_segments_mode_choice() {
        assert_eq!(Segment::make_segments("123")[0].mode(), Mode::Numeric);
        assert_eq!(
            Segment::make_segments("HELLO WORLD")[0].mode(),
            Mode::Alphanumeric
        );
        assert_eq!(Segment::make_segments("hello")[0].mode(), Mode::Byte);
        assert!(Segment::make_segments("").is_empty());
    }

    #[test]
    fn test_total_bits() {
        let segs = Segment::make_segments("HELLO WORLD");
        // 4 mode + 9 count + 6 pairs/chars: 5*11 + 6 = 61 data bits
        assert_eq!(Segment::total_bits(&segs, 1), Some(74));
        // Wider count field at version 10
        assert_eq!(Segment::total_bits(&segs, 10), Some(76));
    }

    #[test]
    fn test_total_bits_overflow() {
        let long = "1".repeat(1024);
        let segs = Segment::make_segments(&long);
        // 10-bit count field cannot hold 1024
        assert_eq!(Segment::total_bits(&segs, 1), None);
        assert!(Segment::total_bits(&segs, 10).is_some());
    }
}
