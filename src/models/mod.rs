/// Bit-packed module grid
pub mod matrix;
/// Image-space points
pub mod point;
/// Symbol, version, EC level and mask types
pub mod symbol;

pub use matrix::BitMatrix;
pub use point::Point;
pub use symbol::{DecoderResult, ECLevel, MaskPattern, StructuredAppend, Symbol, Version};
