use crate::decoder::bitstream::BitReader;

/// Numeric mode decoder (mode indicator 0001).
/// Groups of 3 digits = 10 bits, 2 digits = 7 bits, 1 digit = 4 bits.
pub struct NumericDecoder;

impl NumericDecoder {
    /// Decode `character_count` digits.
    pub fn decode(reader: &mut BitReader<'_>, character_count: usize) -> Option<String> {
        let mut result = String::with_capacity(character_count);
        let mut remaining = character_count;

        while remaining >= 3 {
            let value = reader.read_bits(10)?;
            if value >= 1000 {
                return None;
            }
            result.push(digit(value / 100)?);
            result.push(digit((value / 10) % 10)?);
            result.push(digit(value % 10)?);
            remaining -= 3;
        }
        if remaining == 2 {
            let value = reader.read_bits(7)?;
            if value >= 100 {
                return None;
            }
            result.push(digit(value / 10)?);
            result.push(digit(value % 10)?);
        } else if remaining == 1 {
            let value = reader.read_bits(4)?;
            if value >= 10 {
                return None;
            }
            result.push(digit(value)?);
        }
        Some(result)
    }
}

fn digit(value: u32) -> Option<char> {
    char::from_digit(value, 10)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_three_digit_group() {
        // 1017 as one 10-bit group of "101" plus a single "7"
        let bytes = [0b0001_1001, 0b0101_1100];
        let mut reader = BitReader::new(&bytes);
        assert_eq!(NumericDecoder::decode(&mut reader, 4).unwrap(), "1017");
    }

    #[test]
    fn test_decode_rejects_out_of_range_group() {
        // 10-bit value 1023 is not a valid 3-digit group
        let bytes = [0xFF, 0xC0];
        let mut reader = BitReader::new(&bytes);
        assert!(NumericDecoder::decode(&mut reader, 3).is_none());
    }

    #[test]
    fn test_decode_truncated_stream() {
        let bytes = [0x00];
        let mut reader = BitReader::new(&bytes);
        assert!(NumericDecoder::decode(&mut reader, 3).is_none());
    }
}
