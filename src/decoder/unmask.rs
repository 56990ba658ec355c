//! Undo the data mask by XORing the mask predicate over every data module.
//! The same operation the encoder applied, so it is its own inverse.

use crate::decoder::function_mask::FunctionMask;
use crate::models::{BitMatrix, MaskPattern};

/// Toggle every data module the mask predicate selects.
pub fn unmask(matrix: &mut BitMatrix, mask: MaskPattern, func: &FunctionMask) {
    let size = func.size();
    for y in 0..size {
        for x in 0..size {
            if !func.is_function(x, y) && mask.is_masked(x, y) {
                matrix.toggle(x, y);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unmask_toggles_masked_data_modules() {
        let mut matrix = BitMatrix::square(21);
        matrix.set(10, 10, true);
        let func = FunctionMask::new(1);

        // Pattern 0: (x + y) % 2 == 0, so (10,10) toggles
        unmask(&mut matrix, MaskPattern::new(0).unwrap(), &func);
        assert!(!matrix.get(10, 10));

        // Function modules are left alone
        let mut matrix = BitMatrix::square(21);
        matrix.set(0, 0, true);
        unmask(&mut matrix, MaskPattern::new(0).unwrap(), &func);
        assert!(matrix.get(0, 0));
    }

    #[test]
    fn test_unmask_is_involution() {
        let mut matrix = BitMatrix::square(21);
        matrix.set(9, 12, true);
        matrix.set(15, 15, true);
        let original = matrix.clone();
        let func = FunctionMask::new(1);
        let mask = MaskPattern::new(6).unwrap();

        unmask(&mut matrix, mask, &func);
        unmask(&mut matrix, mask, &func);
        for y in 0..21 {
            for x in 0..21 {
                assert_eq!(matrix.get(x, y), original.get(x, y));
            }
        }
    }
}
