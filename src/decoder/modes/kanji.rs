use crate::decoder::bitstream::BitReader;

/// Kanji mode decoder (mode indicator 1000). Each character is a 13-bit
/// compaction of a two-byte Shift-JIS code point.
pub struct KanjiDecoder;

impl KanjiDecoder {
    /// Decode `character_count` Shift-JIS characters.
    pub fn decode(reader: &mut BitReader<'_>, character_count: usize) -> Option<String> {
        let mut sjis = Vec::with_capacity(2 * character_count);
        for _ in 0..character_count {
            let value = reader.read_bits(13)?;
            // Undo the compaction back to the two-byte code
            let assembled = ((value / 0xC0) << 8) | (value % 0xC0);
            let code = if assembled < 0x1F00 {
                assembled + 0x8140
            } else {
                assembled + 0xC140
            };
            sjis.push((code >> 8) as u8);
            sjis.push((code & 0xFF) as u8);
        }
        let (text, _, had_errors) = encoding_rs::SHIFT_JIS.decode(&sjis);
        if had_errors {
            return None;
        }
        Some(text.into_owned())
    }
}
