//! QR Code (ISO/IEC 18004 Model 2) encoder and decoder.
//!
//! Encoding goes from text or raw bytes to a [`Symbol`]: segment packing,
//! Reed-Solomon error correction, module placement and penalty-scored mask
//! selection. Decoding goes the other way from camera-grade images:
//! binarization, finder pattern search, perspective rectification, then
//! format recovery, error correction and segment parsing.
//!
//! ```
//! use qr_codec::{encode_text, ECLevel};
//!
//! let symbol = encode_text("HELLO WORLD", ECLevel::M).unwrap();
//! assert_eq!(symbol.size(), 21);
//! ```

#![warn(missing_docs)]
#![allow(clippy::missing_docs_in_private_items)]

/// Symbol decoding (error correction, format recovery, segment parsing)
pub mod decoder;
/// Symbol detection in images (finder patterns, rectification)
pub mod detector;
/// Symbol generation (segments, ECC, matrix building)
pub mod encoder;
/// Error types
pub mod error;
/// GF(256) field arithmetic shared by encoder and decoder
pub mod gf256;
/// Grayscale image sources and adapters
pub mod luminance;
/// Core data structures (Symbol, BitMatrix, Point, ...)
pub mod models;
/// Capacity and error correction tables
pub mod tables;
/// Binarization and geometry helpers
pub mod utils;

pub use decoder::CharacterSet;
pub use encoder::{encode_bytes, encode_segments, encode_text, EncodeOptions};
pub use error::{DecodeError, EncodeError};
pub use luminance::{Luma8Source, LuminanceSource};
pub use models::{
    BitMatrix, DecoderResult, ECLevel, MaskPattern, Point, StructuredAppend, Symbol, Version,
};

use utils::binarization::Binarizer;

/// Knobs for the decode pipeline.
#[derive(Debug, Clone, Default)]
pub struct DecodeHints {
    /// Spend more time searching (smaller scan stride)
    pub try_harder: bool,
    /// The image is a clean axis-aligned render, not a photo
    pub pure_barcode: bool,
    /// Force the text encoding of byte segments instead of guessing
    pub character_set: Option<CharacterSet>,
}

/// Decode the first QR symbol found in a grayscale image.
pub fn decode<S: LuminanceSource>(source: &S) -> Result<DecoderResult, DecodeError> {
    decode_with_hints(source, &DecodeHints::default())
}

/// Decode with explicit pipeline hints. The hybrid binarizer runs first;
/// when nothing is found the global-histogram binarizer gets a try, since
/// the two fail on different lighting conditions.
pub fn decode_with_hints<S: LuminanceSource>(
    source: &S,
    hints: &DecodeHints,
) -> Result<DecoderResult, DecodeError> {
    let gray = source.matrix();
    let (width, height) = (source.width(), source.height());

    if hints.pure_barcode {
        return decode_pure(&gray, width, height, hints);
    }

    match run_pipeline(&gray, width, height, Binarizer::Hybrid, hints) {
        Ok(result) => Ok(result),
        Err(DecodeError::NotFound) => {
            run_pipeline(&gray, width, height, Binarizer::GlobalHistogram, hints)
        }
        Err(e) => Err(e),
    }
}

/// Decode an already-sampled module grid directly.
pub fn decode_bit_matrix(bits: &BitMatrix) -> Result<DecoderResult, DecodeError> {
    decoder::decode_matrix(bits, None)
}

fn run_pipeline(
    gray: &[u8],
    width: usize,
    height: usize,
    binarizer: Binarizer,
    hints: &DecodeHints,
) -> Result<DecoderResult, DecodeError> {
    let binary = binarizer.binarize(gray, width, height)?;
    let detected = detector::Detector::new(&binary).detect(hints.try_harder)?;
    let mut result = decoder::decode_matrix(&detected.bits, hints.character_set)?;
    result.points = detected.points;
    Ok(result)
}

/// Pure-render path: direct module sampling first, finder-based detection
/// without the diagonal cross-check when that misses.
fn decode_pure(
    gray: &[u8],
    width: usize,
    height: usize,
    hints: &DecodeHints,
) -> Result<DecoderResult, DecodeError> {
    let binary = Binarizer::Hybrid.binarize(gray, width, height)?;
    if let Ok(bits) = detector::extract_pure_bits(&binary) {
        if let Ok(result) = decoder::decode_matrix(&bits, hints.character_set) {
            return Ok(result);
        }
    }
    let detected = detector::Detector::new(&binary).detect_pure()?;
    let mut result = decoder::decode_matrix(&detected.bits, hints.character_set)?;
    result.points = detected.points;
    Ok(result)
}
