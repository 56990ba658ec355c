/// Compact bit matrix for storing binary module data
#[derive(Debug, Clone)]
pub struct BitMatrix {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl BitMatrix {
    /// Create a new bit matrix with given dimensions, all bits clear
    pub fn new(width: usize, height: usize) -> Self {
        let bytes_needed = (width * height).div_ceil(8);
        Self {
            width,
            height,
            data: vec![0; bytes_needed],
        }
    }

    /// Create a square matrix
    pub fn square(dimension: usize) -> Self {
        Self::new(dimension, dimension)
    }

    /// Get matrix width
    pub fn width(&self) -> usize {
        self.width
    }

    /// Get matrix height
    pub fn height(&self) -> usize {
        self.height
    }

    /// Get bit at (x, y). Out-of-bounds reads return false (white).
    pub fn get(&self, x: usize, y: usize) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        let index = y * self.width + x;
        (self.data[index / 8] >> (index % 8)) & 1 == 1
    }

    /// Set bit at (x, y). Out-of-bounds writes are ignored.
    pub fn set(&mut self, x: usize, y: usize, value: bool) {
        if x >= self.width || y >= self.height {
            return;
        }
        let index = y * self.width + x;
        if value {
            self.data[index / 8] |= 1 << (index % 8);
        } else {
            self.data[index / 8] &= !(1 << (index % 8));
        }
    }

    /// Toggle bit at (x, y)
    pub fn toggle(&mut self, x: usize, y: usize) {
        if x >= self.width || y >= self.height {
            return;
        }
        let index = y * self.width + x;
        self.data[index / 8] ^= 1 << (index % 8);
    }

    /// Clear all bits to 0
    pub fn clear(&mut self) {
        self.data.fill(0);
    }

    /// First set bit in row-major order, as (x, y).
    pub fn top_left_on_bit(&self) -> Option<(usize, usize)> {
        for y in 0..self.height {
            for x in 0..self.width {
                if self.get(x, y) {
                    return Some((x, y));
                }
            }
        }
        None
    }

    /// Last set bit in row-major order, as (x, y).
    pub fn bottom_right_on_bit(&self) -> Option<(usize, usize)> {
        for y in (0..self.height).rev() {
            for x in (0..self.width).rev() {
                if self.get(x, y) {
                    return Some((x, y));
                }
            }
        }
        None
    }

    /// Reflect a square matrix about its main diagonal in place.
    /// Used by the decoder's mirrored-orientation retry.
    pub fn mirror(&mut self) {
        debug_assert_eq!(self.width, self.height);
        for x in 0..self.width {
            for y in (x + 1)..self.height {
                if self.get(x, y) != self.get(y, x) {
                    self.toggle(x, y);
                    self.toggle(y, x);
                }
            }
        }
    }
}

impl Default for BitMatrix {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_matrix() {
        let mut matrix = BitMatrix::new(8, 8);
        assert_eq!(matrix.width(), 8);
        assert_eq!(matrix.height(), 8);

        matrix.set(3, 4, true);
        assert!(matrix.get(3, 4));
        assert!(!matrix.get(3, 3));

        matrix.toggle(3, 4);
        assert!(!matrix.get(3, 4));

        matrix.clear();
        assert!(!matrix.get(3, 4));
    }

    #[test]
    fn test_out_of_bounds() {
        let mut matrix = BitMatrix::new(8, 8);
        matrix.set(10, 10, true); // Should not panic
        assert!(!matrix.get(10, 10));
    }

    #[test]
    fn test_mirror_is_involution() {
        let mut matrix = BitMatrix::square(5);
        matrix.set(1, 3, true);
        matrix.set(4, 0, true);
        matrix.set(2, 2, true);

        let original = matrix.clone();
        matrix.mirror();
        assert!(matrix.get(3, 1));
        assert!(matrix.get(0, 4));
        assert!(matrix.get(2, 2));
        matrix.mirror();
        for y in 0..5 {
            for x in 0..5 {
                assert_eq!(matrix.get(x, y), original.get(x, y));
            }
        }
    }
}
