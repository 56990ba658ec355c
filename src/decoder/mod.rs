//! Symbol decoding: everything that happens after detection has
//! produced a clean module grid.
//!
//! - Format and version information recovery (BCH protected fields)
//! - Unmasking and zigzag codeword extraction
//! - Block de-interleaving and Reed-Solomon error correction
//! - Segment parsing (numeric, alphanumeric, byte, kanji, ECI)

/// Codeword extraction and sequential bit reading
pub mod bitstream;
/// ECI mapping and encoding guess for byte segments
pub mod charset;
/// De-interleaving into error correction blocks
pub mod datablock;
/// Format information recovery (EC level, mask pattern)
pub mod format;
/// Function module map (finder/timing/format/alignment/version)
pub mod function_mask;
/// Data mode decoders
pub mod modes;
/// Decode pipeline over a sampled module grid
pub mod qr_decoder;
/// Reed-Solomon error correction
pub mod reed_solomon;
/// Mask removal
pub mod unmask;
/// Version information recovery (versions 7-40)
pub mod version;

pub use charset::CharacterSet;
pub use qr_decoder::decode_matrix;
