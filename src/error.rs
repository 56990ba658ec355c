use thiserror::Error;

/// Errors reported by the encoding entry points.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// The payload does not fit any version in the allowed range, even at
    /// the lowest error correction level the caller permitted.
    #[error("data too long: {needed} bits needed, {capacity} available")]
    DataTooLong { needed: usize, capacity: usize },
    /// A caller-supplied argument (version range, mask index, ECI value,
    /// segment content) is outside its legal range.
    #[error("invalid parameter: {0}")]
    InvalidParameter(&'static str),
}

/// Errors reported by the decoding entry points.
///
/// `NotFound` is the common, retryable outcome (point the camera again);
/// `Format` and `Checksum` mean a symbol was located but its contents
/// could not be read. All three are terminal for a single attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// No QR code could be located in the image.
    #[error("no QR code found in image")]
    NotFound,
    /// The bit layout of the located symbol is structurally invalid.
    #[error("format error: {0}")]
    Format(&'static str),
    /// Reed-Solomon correction failed; more errors than the code can fix.
    #[error("checksum error: uncorrectable data")]
    Checksum,
}
