//! Symbol detection: locate the finder patterns, estimate geometry, and
//! rectify the module grid out of the binarized image.

pub mod alignment;
pub mod finder;
pub mod sampler;

use crate::error::DecodeError;
use crate::models::{BitMatrix, Point, Version};
use crate::utils::geometry::{self, PerspectiveTransform};

use alignment::{AlignmentPattern, AlignmentPatternFinder};
use finder::{FinderPatternFinder, FinderPatternInfo};

/// A rectified module grid plus the image-space points that produced it.
pub struct DetectorResult {
    /// Sampled module grid, one bit per module
    pub bits: BitMatrix,
    /// Bottom-left, top-left, top-right finder centers, then the alignment
    /// center when one was found
    pub points: Vec<Point>,
}

/// Runs the detection pipeline over one binarized image.
pub struct Detector<'a> {
    image: &'a BitMatrix,
}

impl<'a> Detector<'a> {
    /// Detector over a binarized image (true = black).
    pub fn new(image: &'a BitMatrix) -> Self {
        Self { image }
    }

    /// Find a QR symbol and sample its module grid.
    pub fn detect(&self, try_harder: bool) -> Result<DetectorResult, DecodeError> {
        let info = FinderPatternFinder::new(self.image).find(try_harder)?;
        self.process_finder_pattern_info(&info)
    }

    /// Detection for clean synthetic input: the diagonal cross-check
    /// rejects hard-edged renders, so it is skipped here.
    pub fn detect_pure(&self) -> Result<DetectorResult, DecodeError> {
        let info = FinderPatternFinder::new(self.image)
            .skip_diagonal_check()
            .find(false)?;
        self.process_finder_pattern_info(&info)
    }

    fn process_finder_pattern_info(
        &self,
        info: &FinderPatternInfo,
    ) -> Result<DetectorResult, DecodeError> {
        let top_left = &info.top_left;
        let top_right = &info.top_right;
        let bottom_left = &info.bottom_left;

        let module_size = (top_left.estimated_module_size
            + top_right.estimated_module_size
            + bottom_left.estimated_module_size)
            / 3.0;
        if module_size < 1.0 {
            return Err(DecodeError::NotFound);
        }
        let dimension = compute_dimension(
            &top_left.position,
            &top_right.position,
            &bottom_left.position,
            module_size,
        )?;
        let version =
            Version::from_dimension(dimension).ok_or(DecodeError::NotFound)?;
        let modules_between_centers = (dimension - 7) as f32;

        // Alignment pattern sits 3 modules in from the bottom-right corner.
        let mut alignment_pattern = None;
        if version.number() > 1 {
            let bottom_right_x = top_right.position.x - top_left.position.x + bottom_left.position.x;
            let bottom_right_y = top_right.position.y - top_left.position.y + bottom_left.position.y;
            let correction = 1.0 - 3.0 / modules_between_centers;
            let est_x = top_left.position.x + correction * (bottom_right_x - top_left.position.x);
            let est_y = top_left.position.y + correction * (bottom_right_y - top_left.position.y);

            // Widen the search window geometrically until something is found
            for allowance in [4, 8, 16] {
                match self.find_alignment_in_region(module_size, est_x, est_y, allowance as f32) {
                    Ok(found) => {
                        alignment_pattern = Some(found);
                        break;
                    }
                    Err(DecodeError::NotFound) => continue,
                    Err(e) => return Err(e),
                }
            }
        }

        let transform = create_transform(
            &top_left.position,
            &top_right.position,
            &bottom_left.position,
            alignment_pattern.as_ref().map(|a| &a.position),
            dimension,
        )
        .ok_or(DecodeError::NotFound)?;
        let bits = sampler::sample_grid(self.image, &transform, dimension)?;

        let mut points = vec![
            bottom_left.position,
            top_left.position,
            top_right.position,
        ];
        if let Some(ap) = alignment_pattern {
            points.push(ap.position);
        }
        Ok(DetectorResult { bits, points })
    }

    fn find_alignment_in_region(
        &self,
        module_size: f32,
        est_x: f32,
        est_y: f32,
        allowance_factor: f32,
    ) -> Result<AlignmentPattern, DecodeError> {
        let allowance = (allowance_factor * module_size) as isize;
        let est_x = est_x as isize;
        let est_y = est_y as isize;
        let left = (est_x - allowance).max(0) as usize;
        let right = ((est_x + allowance) as usize).min(self.image.width() - 1);
        if ((right - left) as f32) < module_size * 3.0 {
            return Err(DecodeError::NotFound);
        }
        let top = (est_y - allowance).max(0) as usize;
        let bottom = ((est_y + allowance) as usize).min(self.image.height() - 1);
        if ((bottom - top) as f32) < module_size * 3.0 {
            return Err(DecodeError::NotFound);
        }
        AlignmentPatternFinder::new(
            self.image,
            left,
            top,
            right - left,
            bottom - top,
            module_size,
        )
        .find()
    }
}

/// Symbol dimension from finder center distances, snapped to the nearest
/// valid 4k+1 count.
fn compute_dimension(
    top_left: &Point,
    top_right: &Point,
    bottom_left: &Point,
    module_size: f32,
) -> Result<usize, DecodeError> {
    let tltr = (geometry::distance(top_left, top_right) / module_size).round() as usize;
    let tlbl = (geometry::distance(top_left, bottom_left) / module_size).round() as usize;
    let mut dimension = (tltr + tlbl) / 2 + 7;
    match dimension % 4 {
        0 => dimension += 1,
        1 => {}
        2 => dimension -= 1,
        _ => return Err(DecodeError::NotFound),
    }
    Ok(dimension)
}

/// Transform from module-grid coordinates to image pixels. The finder
/// centers pin three corners at (3.5, 3.5) offsets; the fourth comes from
/// the alignment pattern, or a parallelogram guess when there is none.
fn create_transform(
    top_left: &Point,
    top_right: &Point,
    bottom_left: &Point,
    alignment: Option<&Point>,
    dimension: usize,
) -> Option<PerspectiveTransform> {
    let dim_minus_three = dimension as f32 - 3.5;
    let (bottom_right, source_bottom_right) = match alignment {
        Some(a) => (*a, Point::new(dim_minus_three - 3.0, dim_minus_three - 3.0)),
        None => (
            Point::new(
                top_right.x - top_left.x + bottom_left.x,
                top_right.y - top_left.y + bottom_left.y,
            ),
            Point::new(dim_minus_three, dim_minus_three),
        ),
    };
    PerspectiveTransform::from_points(
        &[
            Point::new(3.5, 3.5),
            Point::new(dim_minus_three, 3.5),
            source_bottom_right,
            Point::new(3.5, dim_minus_three),
        ],
        &[*top_left, *top_right, bottom_right, *bottom_left],
    )
}

/// Direct module sampling for perfectly axis-aligned synthetic images
/// (the `pure_barcode` hint): no finder scan, no perspective math.
pub fn extract_pure_bits(image: &BitMatrix) -> Result<BitMatrix, DecodeError> {
    let (left, top) = image.top_left_on_bit().ok_or(DecodeError::NotFound)?;
    let (right, bottom) = image.bottom_right_on_bit().ok_or(DecodeError::NotFound)?;
    let module_size = pure_module_size(image, left, top)?;

    let width = right - left + 1;
    let height = bottom - top + 1;
    let dimension = (width as f32 / module_size).round() as usize;
    if dimension != (height as f32 / module_size).round() as usize {
        return Err(DecodeError::NotFound);
    }
    if dimension < 21 || dimension % 4 != 1 {
        return Err(DecodeError::NotFound);
    }

    let mut bits = BitMatrix::square(dimension);
    for y in 0..dimension {
        let py = top + (y as f32 * module_size + module_size / 2.0) as usize;
        for x in 0..dimension {
            let px = left + (x as f32 * module_size + module_size / 2.0) as usize;
            if image.get(px, py) {
                bits.set(x, y, true);
            }
        }
    }
    Ok(bits)
}

/// Module size from the top-left finder pattern: walk the diagonal through
/// five color transitions (the full 1:1:3:1:1 cross-section is 7 modules).
fn pure_module_size(image: &BitMatrix, left: usize, top: usize) -> Result<f32, DecodeError> {
    let (mut x, mut y) = (left, top);
    let mut in_black = true;
    let mut transitions = 0;
    while x < image.width() && y < image.height() {
        if in_black != image.get(x, y) {
            transitions += 1;
            if transitions == 5 {
                break;
            }
            in_black = !in_black;
        }
        x += 1;
        y += 1;
    }
    if x == image.width() || y == image.height() {
        return Err(DecodeError::NotFound);
    }
    Ok((x - left) as f32 / 7.0)
}
