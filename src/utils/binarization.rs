//! Binarization: grayscale to black/white module candidates.
//!
//! Two strategies behind one closed enum. `GlobalHistogram` picks a single
//! threshold from a 32-bucket luminance histogram and suits clean, evenly
//! lit images. `Hybrid` thresholds 8x8 blocks against a smoothed local
//! black point and survives shadows and gradients.

use crate::error::DecodeError;
use crate::models::BitMatrix;

const LUMINANCE_BITS: usize = 5;
const LUMINANCE_SHIFT: usize = 8 - LUMINANCE_BITS;
const LUMINANCE_BUCKETS: usize = 1 << LUMINANCE_BITS;

const BLOCK_SIZE_POWER: usize = 3;
const BLOCK_SIZE: usize = 1 << BLOCK_SIZE_POWER;
const MINIMUM_DIMENSION: usize = BLOCK_SIZE * 5;
const MIN_DYNAMIC_RANGE: usize = 24;

/// Binarization strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binarizer {
    /// One global threshold from a bimodal histogram
    GlobalHistogram,
    /// Block-adaptive local thresholds (default for camera input)
    Hybrid,
}

impl Binarizer {
    /// Threshold a row-major luma buffer into a BitMatrix where true = black.
    pub fn binarize(
        &self,
        gray: &[u8],
        width: usize,
        height: usize,
    ) -> Result<BitMatrix, DecodeError> {
        debug_assert_eq!(gray.len(), width * height);
        match self {
            Binarizer::GlobalHistogram => global_histogram(gray, width, height),
            Binarizer::Hybrid => {
                if width < MINIMUM_DIMENSION || height < MINIMUM_DIMENSION {
                    // Too small for meaningful blocks
                    global_histogram(gray, width, height)
                } else {
                    Ok(hybrid(gray, width, height))
                }
            }
        }
    }
}

fn global_histogram(gray: &[u8], width: usize, height: usize) -> Result<BitMatrix, DecodeError> {
    let mut buckets = [0u32; LUMINANCE_BUCKETS];
    for &pixel in gray {
        buckets[pixel as usize >> LUMINANCE_SHIFT] += 1;
    }
    let black_point = estimate_black_point(&buckets)?;

    let mut matrix = BitMatrix::new(width, height);
    for y in 0..height {
        let row = &gray[y * width..(y + 1) * width];
        for x in 0..width {
            // 3-tap smoothing knocks out single-pixel noise at cell edges.
            let left = row[x.saturating_sub(1)] as u32;
            let center = row[x] as u32;
            let right = row[(x + 1).min(width - 1)] as u32;
            let luma = (left + 2 * center + right) / 4;
            if (luma as usize) < black_point {
                matrix.set(x, y, true);
            }
        }
    }
    Ok(matrix)
}

/// Find the valley between the two dominant histogram peaks. Fails when the
/// image has no meaningful contrast.
fn estimate_black_point(buckets: &[u32; LUMINANCE_BUCKETS]) -> Result<usize, DecodeError> {
    let mut first_peak = 0usize;
    let mut first_peak_size = 0u32;
    let mut max_bucket_count = 0u32;
    for (x, &count) in buckets.iter().enumerate() {
        if count > first_peak_size {
            first_peak = x;
            first_peak_size = count;
        }
        max_bucket_count = max_bucket_count.max(count);
    }

    // Second peak: favors distance from the first as well as height.
    let mut second_peak = 0usize;
    let mut second_peak_score = 0u64;
    for (x, &count) in buckets.iter().enumerate() {
        let distance = x.abs_diff(first_peak) as u64;
        let score = count as u64 * distance * distance;
        if score > second_peak_score {
            second_peak = x;
            second_peak_score = score;
        }
    }
    // A single occupied bucket scores every candidate zero: no contrast
    if second_peak_score == 0 {
        return Err(DecodeError::NotFound);
    }

    let (low, high) = if first_peak < second_peak {
        (first_peak, second_peak)
    } else {
        (second_peak, first_peak)
    };
    if high - low <= LUMINANCE_BUCKETS / 16 {
        return Err(DecodeError::NotFound);
    }

    let mut best_valley = high - 1;
    let mut best_valley_score = -1i64;
    for x in (low + 1..high).rev() {
        let from_low = (x - low) as i64;
        let score =
            from_low * from_low * (high - x) as i64 * (max_bucket_count - buckets[x]) as i64;
        if score > best_valley_score {
            best_valley = x;
            best_valley_score = score;
        }
    }
    Ok(best_valley << LUMINANCE_SHIFT)
}

fn hybrid(gray: &[u8], width: usize, height: usize) -> BitMatrix {
    let sub_width = width.div_ceil(BLOCK_SIZE);
    let sub_height = height.div_ceil(BLOCK_SIZE);
    let black_points = calculate_black_points(gray, sub_width, sub_height, width, height);

    let mut matrix = BitMatrix::new(width, height);
    for by in 0..sub_height {
        let y_offset = (by * BLOCK_SIZE).min(height - BLOCK_SIZE);
        for bx in 0..sub_width {
            let x_offset = (bx * BLOCK_SIZE).min(width - BLOCK_SIZE);
            // Average the black points of a 5x5 block neighborhood.
            let left = cap(bx, sub_width - 3);
            let top = cap(by, sub_height - 3);
            let mut sum = 0u32;
            for dy in 0..5 {
                let row = &black_points[(top + dy - 2) * sub_width..];
                for dx in 0..5 {
                    sum += row[left + dx - 2] as u32;
                }
            }
            let average = (sum / 25) as u8;
            threshold_block(gray, x_offset, y_offset, average, width, &mut matrix);
        }
    }
    matrix
}

fn cap(value: usize, max: usize) -> usize {
    value.clamp(2, max)
}

fn threshold_block(
    gray: &[u8],
    x_offset: usize,
    y_offset: usize,
    threshold: u8,
    stride: usize,
    matrix: &mut BitMatrix,
) {
    for y in 0..BLOCK_SIZE {
        let offset = (y_offset + y) * stride + x_offset;
        for x in 0..BLOCK_SIZE {
            if gray[offset + x] <= threshold {
                matrix.set(x_offset + x, y_offset + y, true);
            }
        }
    }
}

/// Per-block black point: the block average, or for low-contrast blocks a
/// carry-over from already computed neighbors so solid regions inside a
/// symbol stay black.
fn calculate_black_points(
    gray: &[u8],
    sub_width: usize,
    sub_height: usize,
    width: usize,
    height: usize,
) -> Vec<u8> {
    let mut black_points = vec![0u8; sub_width * sub_height];
    for by in 0..sub_height {
        let y_offset = (by * BLOCK_SIZE).min(height - BLOCK_SIZE);
        for bx in 0..sub_width {
            let x_offset = (bx * BLOCK_SIZE).min(width - BLOCK_SIZE);
            let mut sum = 0u32;
            let mut min = 0xFFu8;
            let mut max = 0u8;
            for y in 0..BLOCK_SIZE {
                let offset = (y_offset + y) * width + x_offset;
                for x in 0..BLOCK_SIZE {
                    let pixel = gray[offset + x];
                    sum += pixel as u32;
                    min = min.min(pixel);
                    max = max.max(pixel);
                }
            }

            let mut average = (sum >> (BLOCK_SIZE_POWER * 2)) as usize;
            if (max - min) as usize <= MIN_DYNAMIC_RANGE {
                // Flat block: assume white unless surrounded by darker blocks.
                average = min as usize / 2;
                if by > 0 && bx > 0 {
                    let up = black_points[(by - 1) * sub_width + bx] as usize;
                    let left = black_points[by * sub_width + bx - 1] as usize;
                    let up_left = black_points[(by - 1) * sub_width + bx - 1] as usize;
                    let neighbor_average = (up + 2 * left + up_left) / 4;
                    if (min as usize) < neighbor_average {
                        average = neighbor_average;
                    }
                }
            }
            black_points[by * sub_width + bx] = average as u8;
        }
    }
    black_points
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bimodal_image(width: usize, height: usize) -> Vec<u8> {
        // Left half dark, right half light
        let mut gray = vec![0u8; width * height];
        for y in 0..height {
            for x in 0..width {
                gray[y * width + x] = if x < width / 2 { 30 } else { 220 };
            }
        }
        gray
    }

    #[test]
    fn test_global_histogram_splits_bimodal() {
        let gray = bimodal_image(64, 64);
        let matrix = Binarizer::GlobalHistogram.binarize(&gray, 64, 64).unwrap();
        assert!(matrix.get(5, 30));
        assert!(!matrix.get(60, 30));
    }

    #[test]
    fn test_global_histogram_rejects_flat() {
        let gray = vec![128u8; 64 * 64];
        assert!(matches!(
            Binarizer::GlobalHistogram.binarize(&gray, 64, 64),
            Err(DecodeError::NotFound)
        ));
    }

    #[test]
    fn test_hybrid_splits_bimodal() {
        let gray = bimodal_image(64, 64);
        let matrix = Binarizer::Hybrid.binarize(&gray, 64, 64).unwrap();
        assert!(matrix.get(5, 30));
        assert!(!matrix.get(60, 30));
    }

    #[test]
    fn test_hybrid_handles_gradient() {
        // Dark squares on a horizontal illumination gradient
        let (w, h) = (80, 80);
        let mut gray = vec![0u8; w * h];
        for y in 0..h {
            for x in 0..w {
                let background = 120 + x as i32;
                let dark = (x / 10 + y / 10) % 2 == 0;
                let value = if dark { background - 90 } else { background };
                gray[y * w + x] = value.clamp(0, 255) as u8;
            }
        }
        let matrix = Binarizer::Hybrid.binarize(&gray, w, h).unwrap();
        // Dark square near the bright edge must still come out black.
        assert!(matrix.get(75, 14));
        assert!(!matrix.get(75, 4));
    }

    #[test]
    fn test_hybrid_small_image_falls_back() {
        let gray = bimodal_image(16, 16);
        let matrix = Binarizer::Hybrid.binarize(&gray, 16, 16).unwrap();
        assert!(matrix.get(2, 8));
        assert!(!matrix.get(13, 8));
    }
}
