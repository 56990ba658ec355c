use crate::decoder::bitstream::BitReader;

/// Byte mode decoder (mode indicator 0100). Returns the raw bytes;
/// interpreting them as text is the caller's job since the character
/// set depends on ECI state and content heuristics.
pub struct ByteDecoder;

impl ByteDecoder {
    /// Read `character_count` raw bytes.
    pub fn decode(reader: &mut BitReader<'_>, character_count: usize) -> Option<Vec<u8>> {
        if reader.available() < 8 * character_count {
            return None;
        }
        let mut bytes = Vec::with_capacity(character_count);
        for _ in 0..character_count {
            bytes.push(reader.read_bits(8)? as u8);
        }
        Some(bytes)
    }
}
