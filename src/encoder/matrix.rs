//! Module placement: function patterns, format and version information,
//! zigzag codeword layout, masking, and penalty-based mask selection.

use rayon::prelude::*;

use crate::error::EncodeError;
use crate::models::{BitMatrix, ECLevel, MaskPattern, Symbol, Version};
use crate::tables;

const PENALTY_N1: i32 = 3;
const PENALTY_N2: i32 = 3;
const PENALTY_N3: i32 = 40;
const PENALTY_N4: i32 = 10;

/// Format information: 5 data bits (EC level + mask) extended with 10 BCH
/// remainder bits, XORed with the fixed mask 0x5412.
pub(crate) fn format_info_bits(ec_level: ECLevel, mask: MaskPattern) -> u32 {
    let data = ((ec_level.format_bits() as u32) << 3) | mask.index() as u32;
    let mut rem = data;
    for _ in 0..10 {
        rem = (rem << 1) ^ ((rem >> 9) * 0x537);
    }
    ((data << 10) | rem) ^ 0x5412
}

/// Version information: 6 data bits extended with 12 BCH remainder bits.
/// Only defined for versions 7 and up.
pub(crate) fn version_info_bits(version: Version) -> u32 {
    debug_assert!(version.number() >= 7);
    let data = version.number() as u32;
    let mut rem = data;
    for _ in 0..12 {
        rem = (rem << 1) ^ ((rem >> 11) * 0x1F25);
    }
    (data << 12) | rem
}

/// In-progress symbol grid. Tracks which modules belong to function
/// patterns so codeword placement and masking skip them.
#[derive(Clone)]
pub struct MatrixBuilder {
    version: Version,
    ec_level: ECLevel,
    size: usize,
    modules: BitMatrix,
    is_function: BitMatrix,
}

impl MatrixBuilder {
    /// Fresh grid with all function patterns already drawn.
    pub fn new(version: Version, ec_level: ECLevel) -> Self {
        let size = version.dimension();
        let mut builder = Self {
            version,
            ec_level,
            size,
            modules: BitMatrix::square(size),
            is_function: BitMatrix::square(size),
        };
        builder.draw_function_patterns();
        builder
    }

    fn set_function(&mut self, x: i32, y: i32, dark: bool) {
        if x < 0 || y < 0 || x as usize >= self.size || y as usize >= self.size {
            return;
        }
        self.modules.set(x as usize, y as usize, dark);
        self.is_function.set(x as usize, y as usize, true);
    }

    fn draw_function_patterns(&mut self) {
        let size = self.size as i32;

        // Timing patterns
        for i in 0..size {
            self.set_function(6, i, i % 2 == 0);
            self.set_function(i, 6, i % 2 == 0);
        }

        // Finder patterns with separators, clipped at the edges
        self.draw_finder_pattern(3, 3);
        self.draw_finder_pattern(size - 4, 3);
        self.draw_finder_pattern(3, size - 4);

        // Alignment patterns, skipping the three finder corners
        let positions = tables::alignment_pattern_positions(self.version.number());
        let count = positions.len();
        for (i, &cy) in positions.iter().enumerate() {
            for (j, &cx) in positions.iter().enumerate() {
                let in_finder = (i == 0 && j == 0)
                    || (i == 0 && j == count - 1)
                    || (i == count - 1 && j == 0);
                if !in_finder {
                    self.draw_alignment_pattern(cx as i32, cy as i32);
                }
            }
        }

        // Reserve format and version areas with a placeholder mask
        self.draw_format_bits(MaskPattern::new(0).unwrap());
        self.draw_version_info();
    }

    fn draw_finder_pattern(&mut self, cx: i32, cy: i32) {
        for dy in -4..=4 {
            for dx in -4..=4 {
                let dist = dx.max(-dx).max(dy.max(-dy));
                self.set_function(cx + dx, cy + dy, dist != 2 && dist != 4);
            }
        }
    }

    fn draw_alignment_pattern(&mut self, cx: i32, cy: i32) {
        for dy in -2..=2i32 {
            for dx in -2..=2i32 {
                let dist = dx.abs().max(dy.abs());
                self.set_function(cx + dx, cy + dy, dist != 1);
            }
        }
    }

    /// Draw both copies of the 15 format bits for the given mask.
    pub fn draw_format_bits(&mut self, mask: MaskPattern) {
        let bits = format_info_bits(self.ec_level, mask);
        let bit = |i: usize| (bits >> i) & 1 != 0;
        let size = self.size as i32;

        // First copy around the top-left finder
        for i in 0..6 {
            self.set_function(8, i as i32, bit(i));
        }
        self.set_function(8, 7, bit(6));
        self.set_function(8, 8, bit(7));
        self.set_function(7, 8, bit(8));
        for i in 9..15 {
            self.set_function(14 - i as i32, 8, bit(i));
        }

        // Second copy along the other two finders
        for i in 0..8 {
            self.set_function(size - 1 - i as i32, 8, bit(i));
        }
        for i in 8..15 {
            self.set_function(8, size - 15 + i as i32, bit(i));
        }

        // Dark module
        self.set_function(8, size - 8, true);
    }

    fn draw_version_info(&mut self) {
        if self.version.number() < 7 {
            return;
        }
        let bits = version_info_bits(self.version);
        let size = self.size as i32;
        for i in 0..18i32 {
            let bit = (bits >> i) & 1 != 0;
            let a = size - 11 + i % 3;
            let b = i / 3;
            self.set_function(a, b, bit);
            self.set_function(b, a, bit);
        }
    }

    /// Place interleaved codewords in the zigzag order: two-module columns
    /// from the right edge, alternating upward and downward, skipping
    /// column 6 and every function module. Remainder modules stay light.
    pub fn draw_codewords(&mut self, data: &[u8]) -> Result<(), EncodeError> {
        if data.len() != tables::num_raw_data_modules(self.version.number()) / 8 {
            return Err(EncodeError::InvalidParameter("wrong codeword count"));
        }
        let size = self.size;
        let mut i = 0usize;
        let mut right = size as i32 - 1;
        while right >= 1 {
            if right == 6 {
                right = 5;
            }
            for vert in 0..size {
                for j in 0..2 {
                    let x = (right - j) as usize;
                    let upward = (right + 1) & 2 == 0;
                    let y = if upward { size - 1 - vert } else { vert };
                    if !self.is_function.get(x, y) && i < data.len() * 8 {
                        let dark = (data[i >> 3] >> (7 - (i & 7))) & 1 != 0;
                        self.modules.set(x, y, dark);
                        i += 1;
                    }
                }
            }
            right -= 2;
        }
        debug_assert_eq!(i, data.len() * 8);
        Ok(())
    }

    /// XOR the mask over every non-function module. Involution.
    pub fn apply_mask(&mut self, mask: MaskPattern) {
        for y in 0..self.size {
            for x in 0..self.size {
                if mask.is_masked(x, y) && !self.is_function.get(x, y) {
                    self.modules.toggle(x, y);
                }
            }
        }
    }

    /// Penalty score over the current module colors, lower is better.
    pub fn penalty_score(&self) -> i32 {
        let size = self.size;
        let mut result = 0i32;

        // Adjacent same-color runs, rows then columns, plus finder-lookalike
        // patterns with their light borders.
        for y in 0..size {
            let mut run_color = false;
            let mut run_x = 0i32;
            let mut history = FinderPenalty::new(size);
            for x in 0..size {
                if self.modules.get(x, y) == run_color {
                    run_x += 1;
                    if run_x == 5 {
                        result += PENALTY_N1;
                    } else if run_x > 5 {
                        result += 1;
                    }
                } else {
                    history.add_run(run_x);
                    if !run_color {
                        result += history.count_patterns() * PENALTY_N3;
                    }
                    run_color = self.modules.get(x, y);
                    run_x = 1;
                }
            }
            result += history.terminate_and_count(run_color, run_x) * PENALTY_N3;
        }
        for x in 0..size {
            let mut run_color = false;
            let mut run_y = 0i32;
            let mut history = FinderPenalty::new(size);
            for y in 0..size {
                if self.modules.get(x, y) == run_color {
                    run_y += 1;
                    if run_y == 5 {
                        result += PENALTY_N1;
                    } else if run_y > 5 {
                        result += 1;
                    }
                } else {
                    history.add_run(run_y);
                    if !run_color {
                        result += history.count_patterns() * PENALTY_N3;
                    }
                    run_color = self.modules.get(x, y);
                    run_y = 1;
                }
            }
            result += history.terminate_and_count(run_color, run_y) * PENALTY_N3;
        }

        // 2x2 blocks of one color
        for y in 0..size - 1 {
            for x in 0..size - 1 {
                let color = self.modules.get(x, y);
                if color == self.modules.get(x + 1, y)
                    && color == self.modules.get(x, y + 1)
                    && color == self.modules.get(x + 1, y + 1)
                {
                    result += PENALTY_N2;
                }
            }
        }

        // Dark/light balance, in 5% steps away from 50%
        let mut dark = 0i32;
        for y in 0..size {
            for x in 0..size {
                if self.modules.get(x, y) {
                    dark += 1;
                }
            }
        }
        let total = (size * size) as i32;
        let k = ((dark * 20 - total * 10).abs() + total - 1) / total - 1;
        debug_assert!((0..=9).contains(&k));
        result += k * PENALTY_N4;

        result
    }

    /// Commit the codewords with the best (or requested) mask and finish
    /// the symbol. Candidate masks are scored in parallel.
    pub fn into_symbol(self, mask: Option<MaskPattern>) -> Symbol {
        let chosen = match mask {
            Some(m) => m,
            None => (0..8u8)
                .into_par_iter()
                .map(|index| {
                    let m = MaskPattern::new(index).unwrap();
                    let mut candidate = self.clone();
                    candidate.apply_mask(m);
                    candidate.draw_format_bits(m);
                    (candidate.penalty_score(), index)
                })
                .min_by_key(|&(score, index)| (score, index))
                .map(|(_, index)| MaskPattern::new(index).unwrap())
                .unwrap(),
        };

        let mut builder = self;
        builder.apply_mask(chosen);
        builder.draw_format_bits(chosen);
        Symbol::new(builder.version, builder.ec_level, chosen, builder.modules)
    }

    #[cfg(test)]
    fn module(&self, x: usize, y: usize) -> bool {
        self.modules.get(x, y)
    }

    #[cfg(test)]
    fn is_function_module(&self, x: usize, y: usize) -> bool {
        self.is_function.get(x, y)
    }
}

/// Run-length history for the finder-lookalike penalty (rule N3). Tracks
/// the last 7 runs on the current line; the line edges count as light runs
/// of at least 4 modules.
struct FinderPenalty {
    size: i32,
    history: [i32; 7],
}

impl FinderPenalty {
    fn new(size: usize) -> Self {
        Self {
            size: size as i32,
            history: [0; 7],
        }
    }

    fn add_run(&mut self, mut length: i32) {
        if self.history[0] == 0 {
            // First run on the line: the quiet edge extends it.
            length += self.size;
        }
        self.history.rotate_right(1);
        self.history[0] = length;
    }

    /// Number of 1:1:3:1:1 patterns bordered by 4 light modules ending at
    /// the current position.
    fn count_patterns(&self) -> i32 {
        let h = &self.history;
        let n = h[1];
        debug_assert!(n <= self.size * 3);
        let core = n > 0 && h[2] == n && h[3] == n * 3 && h[4] == n && h[5] == n;
        i32::from(core && h[0] >= n * 4 && h[6] >= n)
            + i32::from(core && h[6] >= n * 4 && h[0] >= n)
    }

    fn terminate_and_count(&mut self, current_run_color: bool, mut current_run_length: i32) -> i32 {
        if current_run_color {
            self.add_run(current_run_length);
            current_run_length = 0;
        }
        current_run_length += self.size;
        self.add_run(current_run_length);
        self.count_patterns()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder(version: u8, level: ECLevel) -> MatrixBuilder {
        MatrixBuilder::new(Version::new(version).unwrap(), level)
    }

    #[test]
    fn test_format_info_known_value() {
        // M level, mask 5: published reference value
        let bits = format_info_bits(ECLevel::M, MaskPattern::new(5).unwrap());
        assert_eq!(bits, 0x40CE);
        // L level mask 4
        let bits = format_info_bits(ECLevel::L, MaskPattern::new(4).unwrap());
        assert_eq!(bits, 0x662F);
        // M level mask 0 is the fixed XOR mask itself
        let bits = format_info_bits(ECLevel::M, MaskPattern::new(0).unwrap());
        assert_eq!(bits, 0x5412);
    }

    #[test]
    fn test_version_info_known_value() {
        assert_eq!(version_info_bits(Version::new(7).unwrap()), 0x07C94);
        assert_eq!(version_info_bits(Version::new(21).unwrap()), 0x15683);
    }

    #[test]
    fn test_finder_patterns_drawn() {
        let b = builder(1, ECLevel::L);
        // Center of top-left finder is dark, ring at distance 2 is light
        assert!(b.module(3, 3));
        assert!(!b.module(3, 5));
        assert!(b.module(3, 6) || b.is_function_module(3, 6));
        // Separators are light
        assert!(!b.module(7, 7));
        // Other two finders
        assert!(b.module(17, 3));
        assert!(b.module(3, 17));
    }

    #[test]
    fn test_timing_pattern() {
        let b = builder(2, ECLevel::L);
        for i in 8..17 {
            assert_eq!(b.module(i, 6), i % 2 == 0);
            assert_eq!(b.module(6, i), i % 2 == 0);
            assert!(b.is_function_module(i, 6));
        }
    }

    #[test]
    fn test_alignment_pattern_v2() {
        let b = builder(2, ECLevel::L);
        // Version 2 alignment center at (18, 18)
        assert!(b.module(18, 18));
        assert!(!b.module(17, 18));
        assert!(b.module(16, 18));
        assert!(b.is_function_module(18, 18));
    }

    #[test]
    fn test_version_info_drawn_for_v7() {
        let b = builder(7, ECLevel::L);
        let size = 45;
        for i in 0..18usize {
            assert!(b.is_function_module(size - 11 + i % 3, i / 3));
            assert!(b.is_function_module(i / 3, size - 11 + i % 3));
        }
        // No version info below 7
        let b6 = builder(6, ECLevel::L);
        assert!(!b6.is_function_module(0, 41 - 11));
    }

    #[test]
    fn test_dark_module() {
        let b = builder(1, ECLevel::L);
        assert!(b.module(8, 13));
        assert!(b.is_function_module(8, 13));
    }

    #[test]
    fn test_codeword_count_checked() {
        let mut b = builder(1, ECLevel::L);
        assert!(b.draw_codewords(&[0u8; 10]).is_err());
        assert!(b.draw_codewords(&[0u8; 26]).is_ok());
    }

    #[test]
    fn test_mask_is_involution_on_builder() {
        let mut b = builder(1, ECLevel::L);
        b.draw_codewords(&[0x96u8; 26]).unwrap();
        let mask = MaskPattern::new(3).unwrap();
        let before: Vec<bool> = (0..21 * 21)
            .map(|i| b.module(i % 21, i / 21))
            .collect();
        b.apply_mask(mask);
        b.apply_mask(mask);
        let after: Vec<bool> = (0..21 * 21)
            .map(|i| b.module(i % 21, i / 21))
            .collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_penalty_prefers_mixed_grid() {
        // An all-dark grid must score much worse than a real masked symbol.
        let mut uniform = builder(1, ECLevel::L);
        uniform.draw_codewords(&[0xFFu8; 26]).unwrap();
        let mut mixed = builder(1, ECLevel::L);
        mixed.draw_codewords(&[0x5Au8; 26]).unwrap();
        assert!(uniform.penalty_score() > mixed.penalty_score());
    }

    #[test]
    fn test_into_symbol_picks_lowest_penalty() {
        let mut b = builder(1, ECLevel::L);
        b.draw_codewords(&[0x37u8; 26]).unwrap();
        let auto = b.clone().into_symbol(None);
        let auto_mask = auto.mask();

        // Forcing the chosen mask reproduces the same modules.
        let forced = b.clone().into_symbol(Some(auto_mask));
        for y in 0..21 {
            for x in 0..21 {
                assert_eq!(auto.module(x, y), forced.module(x, y));
            }
        }

        // No other mask scores strictly lower.
        for index in 0..8u8 {
            let m = MaskPattern::new(index).unwrap();
            let mut candidate = b.clone();
            candidate.apply_mask(m);
            candidate.draw_format_bits(m);
            let mut chosen = b.clone();
            chosen.apply_mask(auto_mask);
            chosen.draw_format_bits(auto_mask);
            assert!(candidate.penalty_score() >= chosen.penalty_score());
        }
    }
}
