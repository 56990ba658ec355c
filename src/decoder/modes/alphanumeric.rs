use crate::decoder::bitstream::BitReader;

/// Alphanumeric character set: 0-9, A-Z, space, $%*+-./:
const ALPHANUMERIC_TABLE: [char; 45] = [
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I',
    'J', 'K', 'L', 'M', 'N', 'O', 'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z', ' ', '$',
    '%', '*', '+', '-', '.', '/', ':',
];

/// Alphanumeric mode decoder (mode indicator 0010).
/// Pairs = 11 bits, trailing single = 6 bits.
pub struct AlphanumericDecoder;

impl AlphanumericDecoder {
    /// Decode `character_count` characters. In FNC1 mode `%` escapes
    /// turn into GS separators.
    pub fn decode(
        reader: &mut BitReader<'_>,
        character_count: usize,
        fnc1: bool,
    ) -> Option<String> {
        let mut result = String::with_capacity(character_count);
        let mut remaining = character_count;

        while remaining >= 2 {
            let value = reader.read_bits(11)?;
            if value >= 45 * 45 {
                return None;
            }
            result.push(ALPHANUMERIC_TABLE[(value / 45) as usize]);
            result.push(ALPHANUMERIC_TABLE[(value % 45) as usize]);
            remaining -= 2;
        }
        if remaining == 1 {
            let value = reader.read_bits(6)?;
            if value >= 45 {
                return None;
            }
            result.push(ALPHANUMERIC_TABLE[value as usize]);
        }

        if fnc1 {
            // In FNC1 mode "%" is the GS separator and "%%" a literal "%"
            let mut translated = String::with_capacity(result.len());
            let mut chars = result.chars().peekable();
            while let Some(c) = chars.next() {
                if c == '%' {
                    if chars.peek() == Some(&'%') {
                        chars.next();
                        translated.push('%');
                    } else {
                        translated.push('\u{1D}');
                    }
                } else {
                    translated.push(c);
                }
            }
            return Some(translated);
        }
        Some(result)
    }
}
