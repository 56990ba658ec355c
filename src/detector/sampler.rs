//! Grid sampling: read module colors through a perspective transform.

use crate::error::DecodeError;
use crate::models::{BitMatrix, Point};
use crate::utils::geometry::PerspectiveTransform;

/// Sample a `dimension` x `dimension` module grid from the image. Each
/// module center in grid space is pushed through the transform; samples up
/// to one pixel outside the image are nudged back in, anything further out
/// fails with `NotFound`.
pub fn sample_grid(
    image: &BitMatrix,
    transform: &PerspectiveTransform,
    dimension: usize,
) -> Result<BitMatrix, DecodeError> {
    let width = image.width() as isize;
    let height = image.height() as isize;
    let mut bits = BitMatrix::square(dimension);

    for y in 0..dimension {
        for x in 0..dimension {
            let p = transform.transform(&Point::new(x as f32 + 0.5, y as f32 + 0.5));
            let px = nudge(p.x.floor() as isize, width)?;
            let py = nudge(p.y.floor() as isize, height)?;
            if image.get(px, py) {
                bits.set(x, y, true);
            }
        }
    }
    Ok(bits)
}

fn nudge(value: isize, limit: isize) -> Result<usize, DecodeError> {
    if value == -1 {
        Ok(0)
    } else if value == limit {
        Ok((limit - 1) as usize)
    } else if value < 0 || value > limit {
        Err(DecodeError::NotFound)
    } else {
        Ok(value as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity_scaled(scale: f32) -> PerspectiveTransform {
        let src = [
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
        ];
        let dst = [
            Point::new(0.0, 0.0),
            Point::new(10.0 * scale, 0.0),
            Point::new(10.0 * scale, 10.0 * scale),
            Point::new(0.0, 10.0 * scale),
        ];
        PerspectiveTransform::from_points(&src, &dst).unwrap()
    }

    #[test]
    fn test_sample_identity() {
        // 10x10 image, 2px per module, checkerboard of 2x2 blocks
        let mut image = BitMatrix::new(10, 10);
        for y in 0..10 {
            for x in 0..10 {
                if (x / 2 + y / 2) % 2 == 0 {
                    image.set(x, y, true);
                }
            }
        }
        let transform = identity_scaled(2.0);
        let bits = sample_grid(&image, &transform, 5).unwrap();
        for y in 0..5 {
            for x in 0..5 {
                assert_eq!(bits.get(x, y), (x + y) % 2 == 0, "({x},{y})");
            }
        }
    }

    #[test]
    fn test_sample_out_of_bounds_fails() {
        let image = BitMatrix::new(10, 10);
        // 4px per module puts samples far outside the 10px image
        let transform = identity_scaled(4.0);
        assert!(matches!(
            sample_grid(&image, &transform, 5),
            Err(DecodeError::NotFound)
        ));
    }

    #[test]
    fn test_nudge() {
        assert_eq!(nudge(-1, 10).unwrap(), 0);
        assert_eq!(nudge(10, 10).unwrap(), 9);
        assert_eq!(nudge(5, 10).unwrap(), 5);
        assert!(nudge(-2, 10).is_err());
        assert!(nudge(12, 10).is_err());
    }
}
