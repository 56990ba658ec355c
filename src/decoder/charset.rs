//! Character set handling for byte-mode payloads: ECI designator
//! mapping and a content-based encoding guess for symbols without one.

use encoding_rs::Encoding;

/// Text encodings a byte segment may carry. ISO-8859-1 is handled
/// directly (byte value = code point); everything else goes through
/// encoding_rs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharacterSet {
    /// ISO-8859-1 (Latin-1), the historical QR default
    Iso8859_1,
    /// Shift-JIS, common in Japanese symbols
    ShiftJis,
    /// UTF-8
    Utf8,
    /// Any other encoding reachable through an ECI designator
    Other(&'static Encoding),
}

impl CharacterSet {
    /// Map an ECI assignment value to an encoding.
    pub fn from_eci(value: u32) -> Option<CharacterSet> {
        use encoding_rs::*;
        Some(match value {
            1 | 3 => CharacterSet::Iso8859_1,
            4 => CharacterSet::Other(ISO_8859_2),
            5 => CharacterSet::Other(ISO_8859_3),
            6 => CharacterSet::Other(ISO_8859_4),
            7 => CharacterSet::Other(ISO_8859_5),
            8 => CharacterSet::Other(ISO_8859_6),
            9 => CharacterSet::Other(ISO_8859_7),
            10 => CharacterSet::Other(ISO_8859_8),
            11 => CharacterSet::Other(WINDOWS_1254),
            12 => CharacterSet::Other(ISO_8859_10),
            13 => CharacterSet::Other(WINDOWS_874),
            15 => CharacterSet::Other(ISO_8859_13),
            16 => CharacterSet::Other(ISO_8859_14),
            17 => CharacterSet::Other(ISO_8859_15),
            18 => CharacterSet::Other(ISO_8859_16),
            20 => CharacterSet::ShiftJis,
            21 => CharacterSet::Other(WINDOWS_1250),
            22 => CharacterSet::Other(WINDOWS_1251),
            23 => CharacterSet::Other(WINDOWS_1252),
            24 => CharacterSet::Other(WINDOWS_1256),
            25 => CharacterSet::Other(UTF_16BE),
            26 | 27 | 170 => CharacterSet::Utf8,
            28 => CharacterSet::Other(BIG5),
            29 => CharacterSet::Other(GB18030),
            30 => CharacterSet::Other(EUC_KR),
            _ => return None,
        })
    }

    /// Decode a byte segment to text, replacing invalid sequences.
    pub fn decode(&self, bytes: &[u8]) -> String {
        match self {
            CharacterSet::Iso8859_1 => bytes.iter().map(|&b| b as char).collect(),
            CharacterSet::ShiftJis => encoding_rs::SHIFT_JIS.decode(bytes).0.into_owned(),
            CharacterSet::Utf8 => encoding_rs::UTF_8.decode(bytes).0.into_owned(),
            CharacterSet::Other(encoding) => encoding.decode(bytes).0.into_owned(),
        }
    }
}

/// Guess the encoding of a byte segment without an ECI designator.
/// Runs UTF-8, ISO-8859-1 and Shift-JIS validity checks in one pass and
/// picks by the usual statistics (katakana runs, high Latin-1 bytes).
pub fn guess_encoding(bytes: &[u8]) -> CharacterSet {
    let length = bytes.len();

    let mut can_be_iso88591 = true;
    let mut iso_high_other = 0usize;

    let mut can_be_utf8 = true;
    let mut utf8_bytes_left = 0usize;
    let mut utf_multibyte_chars = 0usize;

    let mut can_be_shift_jis = true;
    let mut sjis_bytes_left = 0usize;
    let mut sjis_katakana_chars = 0usize;
    let mut sjis_cur_katakana_len = 0usize;
    let mut sjis_cur_double_len = 0usize;
    let mut sjis_max_katakana_len = 0usize;
    let mut sjis_max_double_len = 0usize;

    let utf8_bom = bytes.len() > 3 && bytes[0] == 0xEF && bytes[1] == 0xBB && bytes[2] == 0xBF;

    for &value in bytes {
        if !(can_be_iso88591 || can_be_shift_jis || can_be_utf8) {
            break;
        }

        if can_be_utf8 {
            if utf8_bytes_left > 0 {
                if value & 0x80 == 0 {
                    can_be_utf8 = false;
                } else {
                    utf8_bytes_left -= 1;
                }
            } else if value & 0x80 != 0 {
                if value & 0x40 == 0 {
                    can_be_utf8 = false;
                } else if value & 0x20 == 0 {
                    utf8_bytes_left += 1;
                    utf_multibyte_chars += 1;
                } else if value & 0x10 == 0 {
                    utf8_bytes_left += 2;
                    utf_multibyte_chars += 1;
                } else if value & 0x08 == 0 {
                    utf8_bytes_left += 3;
                    utf_multibyte_chars += 1;
                } else {
                    can_be_utf8 = false;
                }
            }
        }

        if can_be_iso88591 {
            if value > 0x7F && value < 0xA0 {
                can_be_iso88591 = false;
            } else if value > 0x9F && (value < 0xC0 || value == 0xD7 || value == 0xF7) {
                iso_high_other += 1;
            }
        }

        if can_be_shift_jis {
            if sjis_bytes_left > 0 {
                if value < 0x40 || value == 0x7F || value > 0xFC {
                    can_be_shift_jis = false;
                } else {
                    sjis_bytes_left -= 1;
                }
            } else if value == 0x80 || value == 0xA0 || value > 0xEF {
                can_be_shift_jis = false;
            } else if value > 0xA0 && value < 0xE0 {
                sjis_katakana_chars += 1;
                sjis_cur_double_len = 0;
                sjis_cur_katakana_len += 1;
                sjis_max_katakana_len = sjis_max_katakana_len.max(sjis_cur_katakana_len);
            } else if value > 0x7F {
                sjis_bytes_left += 1;
                sjis_cur_katakana_len = 0;
                sjis_cur_double_len += 1;
                sjis_max_double_len = sjis_max_double_len.max(sjis_cur_double_len);
            } else {
                sjis_cur_katakana_len = 0;
                sjis_cur_double_len = 0;
            }
        }
    }

    // Truncated trailing sequences invalidate the whole guess
    if utf8_bytes_left > 0 {
        can_be_utf8 = false;
    }
    if sjis_bytes_left > 0 {
        can_be_shift_jis = false;
    }

    if can_be_utf8 && (utf8_bom || utf_multibyte_chars > 0) {
        return CharacterSet::Utf8;
    }
    if can_be_shift_jis && (sjis_max_katakana_len >= 3 || sjis_max_double_len >= 3) {
        return CharacterSet::ShiftJis;
    }
    if can_be_iso88591 && can_be_shift_jis {
        let looks_japanese = sjis_max_katakana_len == 2 && sjis_katakana_chars == 2;
        return if looks_japanese || iso_high_other * 10 >= length {
            CharacterSet::ShiftJis
        } else {
            CharacterSet::Iso8859_1
        };
    }
    if can_be_iso88591 {
        return CharacterSet::Iso8859_1;
    }
    if can_be_shift_jis {
        return CharacterSet::ShiftJis;
    }
    if can_be_utf8 {
        return CharacterSet::Utf8;
    }
    CharacterSet::Utf8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_guesses_latin1() {
        assert_eq!(guess_encoding(b"https://example.com/path?q=1"), CharacterSet::Iso8859_1);
    }

    #[test]
    fn test_utf8_multibyte_detected() {
        assert_eq!(guess_encoding("héllo wörld".as_bytes()), CharacterSet::Utf8);
        assert_eq!(guess_encoding("日本語".as_bytes()), CharacterSet::Utf8);
    }

    #[test]
    fn test_shift_jis_katakana_run() {
        // Three single-byte katakana in a row
        let bytes = [0xB1u8, 0xB2, 0xB3];
        assert_eq!(guess_encoding(&bytes), CharacterSet::ShiftJis);
    }

    #[test]
    fn test_latin1_high_bytes() {
        // 0xE9 is a valid Latin-1 letter and a Shift-JIS lead byte; the
        // truncated second byte rules Shift-JIS out.
        let bytes = [b'c', b'a', b'f', 0xE9];
        assert_eq!(guess_encoding(&bytes), CharacterSet::Iso8859_1);
        assert_eq!(CharacterSet::Iso8859_1.decode(&bytes), "café");
    }

    #[test]
    fn test_eci_mapping() {
        assert_eq!(CharacterSet::from_eci(26), Some(CharacterSet::Utf8));
        assert_eq!(CharacterSet::from_eci(20), Some(CharacterSet::ShiftJis));
        assert_eq!(CharacterSet::from_eci(3), Some(CharacterSet::Iso8859_1));
        assert_eq!(CharacterSet::from_eci(999), None);
    }

    #[test]
    fn test_shift_jis_decode() {
        // "アイウ" in Shift-JIS single-byte katakana form
        let bytes = [0xB1u8, 0xB2, 0xB3];
        assert_eq!(CharacterSet::ShiftJis.decode(&bytes), "ｱｲｳ");
    }
}
