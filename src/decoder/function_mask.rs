use crate::models::BitMatrix;
use crate::tables;

/// Function module map for a specific QR version:
/// true = function module (not data), false = data module.
pub struct FunctionMask {
    mask: BitMatrix,
}

impl FunctionMask {
    /// Compute the map for a version: finders, separators, timing,
    /// alignment, format/version areas and the dark module.
    pub fn new(version: u8) -> Self {
        let size = 17 + 4 * version as usize;
        let mut mask = BitMatrix::square(size);

        // Finder patterns + separators (up to 9x9 areas, clipped to bounds)
        Self::mark_finder_area(&mut mask, 0, 0);
        Self::mark_finder_area(&mut mask, size - 7, 0);
        Self::mark_finder_area(&mut mask, 0, size - 7);

        // Timing patterns (row 6 and column 6)
        for i in 0..size {
            mask.set(6, i, true);
            mask.set(i, 6, true);
        }

        // Alignment patterns, skipping the three finder corners
        let align = tables::alignment_pattern_positions(version);
        for &cy in &align {
            for &cx in &align {
                let in_tl = cx <= 8 && cy <= 8;
                let in_tr = cx >= size - 9 && cy <= 8;
                let in_bl = cx <= 8 && cy >= size - 9;
                if in_tl || in_tr || in_bl {
                    continue;
                }
                for dy in 0..5 {
                    for dx in 0..5 {
                        mask.set(cx - 2 + dx, cy - 2 + dy, true);
                    }
                }
            }
        }

        // Format info areas
        for i in 0..9 {
            if i != 6 {
                mask.set(8, i, true);
                mask.set(i, 8, true);
            }
        }
        for i in 0..8 {
            mask.set(size - 1 - i, 8, true);
            mask.set(8, size - 1 - i, true);
        }

        // Dark module
        mask.set(8, size - 8, true);

        // Version info (v7+)
        if version >= 7 {
            for dy in 0..6 {
                for dx in 0..3 {
                    mask.set(size - 11 + dx, dy, true);
                    mask.set(dy, size - 11 + dx, true);
                }
            }
        }

        Self { mask }
    }

    /// Symbol dimension in modules.
    pub fn size(&self) -> usize {
        self.mask.width()
    }

    /// True when (x, y) belongs to a function pattern, not data.
    pub fn is_function(&self, x: usize, y: usize) -> bool {
        self.mask.get(x, y)
    }

    /// Number of data-carrying modules, remainder bits included.
    pub fn data_modules_count(&self) -> usize {
        let size = self.mask.width();
        let mut count = 0;
        for y in 0..size {
            for x in 0..size {
                if !self.mask.get(x, y) {
                    count += 1;
                }
            }
        }
        count
    }

    fn mark_finder_area(mask: &mut BitMatrix, x: usize, y: usize) {
        let size = mask.width();
        let start_x = x.saturating_sub(1);
        let start_y = y.saturating_sub(1);
        let end_x = (x + 8).min(size);
        let end_y = (y + 8).min(size);
        for yy in start_y..end_y {
            for xx in start_x..end_x {
                mask.set(xx, yy, true);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_module_count_matches_capacity() {
        for version in [1u8, 2, 7, 32, 40] {
            let mask = FunctionMask::new(version);
            assert_eq!(
                mask.data_modules_count(),
                tables::num_raw_data_modules(version),
                "version {version}"
            );
        }
    }

    #[test]
    fn test_function_areas_v1() {
        let mask = FunctionMask::new(1);
        assert_eq!(mask.size(), 21);
        // Finder and separator
        assert!(mask.is_function(0, 0));
        assert!(mask.is_function(7, 7));
        // Timing
        assert!(mask.is_function(10, 6));
        assert!(mask.is_function(6, 10));
        // Format areas
        assert!(mask.is_function(8, 8));
        assert!(mask.is_function(20, 8));
        assert!(mask.is_function(8, 20));
        // Dark module
        assert!(mask.is_function(8, 13));
        // A data module
        assert!(!mask.is_function(10, 10));
        assert!(!mask.is_function(20, 20));
    }
}
