use super::{BitMatrix, Point};

/// QR Code symbol version (1-40, Model 2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Version(u8);

impl Version {
    /// Smallest version (21x21 modules)
    pub const MIN: Version = Version(1);
    /// Largest version (177x177 modules)
    pub const MAX: Version = Version(40);

    /// Create a version, checking the 1-40 range.
    pub fn new(number: u8) -> Option<Self> {
        (1..=40).contains(&number).then_some(Self(number))
    }

    /// Derive the version from a symbol dimension (21, 25, ... 177).
    pub fn from_dimension(dimension: usize) -> Option<Self> {
        if dimension < 21 || dimension > 177 || (dimension - 17) % 4 != 0 {
            return None;
        }
        Self::new(((dimension - 17) / 4) as u8)
    }

    /// The version number (1-40)
    pub fn number(&self) -> u8 {
        self.0
    }

    /// Symbol dimension in modules (width = height = 4*version + 17)
    pub fn dimension(&self) -> usize {
        4 * self.0 as usize + 17
    }
}

/// Error correction level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ECLevel {
    /// Low (~7% recovery capacity)
    L,
    /// Medium (~15% recovery capacity)
    M,
    /// Quartile (~25% recovery capacity)
    Q,
    /// High (~30% recovery capacity)
    H,
}

impl ECLevel {
    /// Table row index (L=0, M=1, Q=2, H=3)
    pub fn ordinal(&self) -> usize {
        match self {
            ECLevel::L => 0,
            ECLevel::M => 1,
            ECLevel::Q => 2,
            ECLevel::H => 3,
        }
    }

    /// The 2-bit value stored in the format information field.
    /// Note this is not the ordinal: L=01, M=00, Q=11, H=10.
    pub fn format_bits(&self) -> u8 {
        match self {
            ECLevel::L => 1,
            ECLevel::M => 0,
            ECLevel::Q => 3,
            ECLevel::H => 2,
        }
    }

    /// Decode the 2-bit format-field value back to a level.
    pub fn from_format_bits(bits: u8) -> Option<Self> {
        match bits & 0x03 {
            0 => Some(ECLevel::M),
            1 => Some(ECLevel::L),
            2 => Some(ECLevel::H),
            3 => Some(ECLevel::Q),
            _ => None,
        }
    }
}

/// Mask pattern (0-7)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaskPattern(u8);

impl MaskPattern {
    /// Create a mask pattern, checking the 0-7 range.
    pub fn new(index: u8) -> Option<Self> {
        (index < 8).then_some(Self(index))
    }

    /// The mask index (0-7)
    pub fn index(&self) -> u8 {
        self.0
    }

    /// Whether the module at column x, row y is inverted by this mask.
    /// Masking is an involution: applying the same mask twice is identity.
    pub fn is_masked(&self, x: usize, y: usize) -> bool {
        match self.0 {
            0 => (x + y) % 2 == 0,
            1 => y % 2 == 0,
            2 => x % 3 == 0,
            3 => (x + y) % 3 == 0,
            4 => (x / 3 + y / 2) % 2 == 0,
            5 => x * y % 2 + x * y % 3 == 0,
            6 => (x * y % 2 + x * y % 3) % 2 == 0,
            7 => ((x + y) % 2 + x * y % 3) % 2 == 0,
            _ => unreachable!(),
        }
    }
}

/// An encoded QR symbol: an immutable square grid of modules plus the
/// metadata that produced it.
#[derive(Debug, Clone)]
pub struct Symbol {
    version: Version,
    ec_level: ECLevel,
    mask: MaskPattern,
    modules: BitMatrix,
}

impl Symbol {
    pub(crate) fn new(
        version: Version,
        ec_level: ECLevel,
        mask: MaskPattern,
        modules: BitMatrix,
    ) -> Self {
        debug_assert_eq!(modules.width(), version.dimension());
        debug_assert_eq!(modules.height(), version.dimension());
        Self {
            version,
            ec_level,
            mask,
            modules,
        }
    }

    /// Symbol version
    pub fn version(&self) -> Version {
        self.version
    }

    /// Error correction level actually used (may be boosted above the request)
    pub fn ec_level(&self) -> ECLevel {
        self.ec_level
    }

    /// Mask pattern committed into the symbol
    pub fn mask(&self) -> MaskPattern {
        self.mask
    }

    /// Width and height in modules
    pub fn size(&self) -> usize {
        self.version.dimension()
    }

    /// Module color at (x, y): true = black, false = white.
    /// Out-of-bounds coordinates return white.
    pub fn module(&self, x: usize, y: usize) -> bool {
        self.modules.get(x, y)
    }

    /// The module grid (for consumers that want bulk access)
    pub fn matrix(&self) -> &BitMatrix {
        &self.modules
    }

    /// Render the symbol as an SVG document string with the given quiet
    /// border width in modules.
    pub fn to_svg_string(&self, border: usize) -> String {
        let mut path = String::new();
        for y in 0..self.size() {
            for x in 0..self.size() {
                if self.module(x, y) {
                    if !path.is_empty() {
                        path.push(' ');
                    }
                    path.push_str(&format!("M{},{}h1v1h-1z", x + border, y + border));
                }
            }
        }
        let view = self.size() + border * 2;
        format!(
            concat!(
                "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n",
                "<svg xmlns=\"http://www.w3.org/2000/svg\" version=\"1.1\" ",
                "viewBox=\"0 0 {v} {v}\" stroke=\"none\">\n",
                "  <rect width=\"100%\" height=\"100%\" fill=\"#ffffff\"/>\n",
                "  <path d=\"{p}\" fill=\"#000000\"/>\n",
                "</svg>\n"
            ),
            v = view,
            p = path
        )
    }
}

/// Structured-append metadata carried by a multi-symbol message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StructuredAppend {
    /// Symbol sequence indicator: index in high nibble, total-1 in low nibble
    pub sequence: u8,
    /// Parity byte over the whole message
    pub parity: u8,
}

/// Final output of a successful decode.
#[derive(Debug, Clone)]
pub struct DecoderResult {
    /// Decoded content as text
    pub text: String,
    /// Raw decoded bytes (all segments concatenated)
    pub bytes: Vec<u8>,
    /// Raw bytes of each byte-mode segment, in order
    pub byte_segments: Vec<Vec<u8>>,
    /// Symbol version
    pub version: Version,
    /// Error correction level of the symbol
    pub ec_level: ECLevel,
    /// Mask pattern recovered from format info
    pub mask: MaskPattern,
    /// True when the symbol was read through the mirrored-orientation retry
    pub mirrored: bool,
    /// Structured-append metadata, if present
    pub structured_append: Option<StructuredAppend>,
    /// Corner points in image coordinates (empty for direct matrix decodes)
    pub points: Vec<Point>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_dimension() {
        assert_eq!(Version::new(1).unwrap().dimension(), 21);
        assert_eq!(Version::new(2).unwrap().dimension(), 25);
        assert_eq!(Version::new(40).unwrap().dimension(), 177);
        assert!(Version::new(0).is_none());
        assert!(Version::new(41).is_none());
    }

    #[test]
    fn test_version_from_dimension() {
        assert_eq!(Version::from_dimension(21), Version::new(1));
        assert_eq!(Version::from_dimension(177), Version::new(40));
        assert!(Version::from_dimension(20).is_none());
        assert!(Version::from_dimension(23).is_none());
        assert!(Version::from_dimension(181).is_none());
    }

    #[test]
    fn test_ec_level_format_bits() {
        for level in [ECLevel::L, ECLevel::M, ECLevel::Q, ECLevel::H] {
            assert_eq!(ECLevel::from_format_bits(level.format_bits()), Some(level));
        }
        assert_eq!(ECLevel::from_format_bits(0b01), Some(ECLevel::L));
        assert_eq!(ECLevel::from_format_bits(0b00), Some(ECLevel::M));
    }

    #[test]
    fn test_mask_pattern() {
        let mask = MaskPattern::new(0).unwrap();
        assert!(mask.is_masked(0, 0));
        assert!(!mask.is_masked(0, 1));
        assert!(mask.is_masked(1, 1));
        assert!(MaskPattern::new(8).is_none());
    }

    #[test]
    fn test_mask_involution() {
        for index in 0..8u8 {
            let mask = MaskPattern::new(index).unwrap();
            let mut grid = BitMatrix::square(21);
            grid.set(5, 9, true);
            grid.set(12, 3, true);
            let original = grid.clone();
            for _ in 0..2 {
                for y in 0..21 {
                    for x in 0..21 {
                        if mask.is_masked(x, y) {
                            grid.toggle(x, y);
                        }
                    }
                }
            }
            for y in 0..21 {
                for x in 0..21 {
                    assert_eq!(grid.get(x, y), original.get(x, y), "mask {index}");
                }
            }
        }
    }
}
