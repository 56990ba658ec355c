//! Data mode decoders, one per QR segment mode:
//! numeric, alphanumeric, byte and kanji.

/// Alphanumeric mode (11 bits per character pair)
pub mod alphanumeric;
/// Byte mode (raw 8-bit data)
pub mod byte;
/// Kanji mode (13-bit Shift-JIS compaction)
pub mod kanji;
/// Numeric mode (10 bits per digit triple)
pub mod numeric;

pub use alphanumeric::AlphanumericDecoder;
pub use byte::ByteDecoder;
pub use kanji::KanjiDecoder;
pub use numeric::NumericDecoder;
