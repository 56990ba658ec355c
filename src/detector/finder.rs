//! Finder pattern location: scans for the 1:1:3:1:1 black-white ratio that
//! marks the three corner squares of a QR symbol.

use crate::error::DecodeError;
use crate::models::{BitMatrix, Point};
use crate::utils::geometry;

const CENTER_QUORUM: usize = 2;
const MIN_SKIP: usize = 3;
const MAX_MODULES: usize = 97;

/// A candidate finder pattern center.
#[derive(Debug, Clone, Copy)]
pub struct FinderPattern {
    /// Center in image coordinates
    pub position: Point,
    /// Module size implied by the 1:1:3:1:1 run widths
    pub estimated_module_size: f32,
    /// Number of scan lines that confirmed this center
    pub count: usize,
}

impl FinderPattern {
    /// Whether a new sighting is close enough to be the same pattern.
    fn about_equals(&self, module_size: f32, i: f32, j: f32) -> bool {
        if (i - self.position.y).abs() <= module_size && (j - self.position.x).abs() <= module_size
        {
            let delta = (module_size - self.estimated_module_size).abs();
            delta <= 1.0 || delta <= self.estimated_module_size
        } else {
            false
        }
    }

    /// Merge a new sighting into this center with a weighted average.
    fn combine_estimate(&self, i: f32, j: f32, new_module_size: f32) -> FinderPattern {
        let combined_count = self.count + 1;
        let weight = self.count as f32;
        FinderPattern {
            position: Point::new(
                (weight * self.position.x + j) / combined_count as f32,
                (weight * self.position.y + i) / combined_count as f32,
            ),
            estimated_module_size: (weight * self.estimated_module_size + new_module_size)
                / combined_count as f32,
            count: combined_count,
        }
    }
}

/// The three finder patterns ordered top-left, top-right, bottom-left.
pub struct FinderPatternInfo {
    /// Pattern adjacent to both others
    pub top_left: FinderPattern,
    /// Pattern clockwise from top-left
    pub top_right: FinderPattern,
    /// Pattern counterclockwise from top-left
    pub bottom_left: FinderPattern,
}

/// Row-scanning search for finder pattern centers.
pub struct FinderPatternFinder<'a> {
    image: &'a BitMatrix,
    possible_centers: Vec<FinderPattern>,
    /// Skip the diagonal cross-check (pure synthetic input)
    skip_diagonal_check: bool,
}

impl<'a> FinderPatternFinder<'a> {
    /// Finder over a binarized image.
    pub fn new(image: &'a BitMatrix) -> Self {
        Self {
            image,
            possible_centers: Vec::new(),
            skip_diagonal_check: false,
        }
    }

    /// Disable the diagonal cross-check, which rejects the hard edges of
    /// clean synthetic renders.
    pub fn skip_diagonal_check(mut self) -> Self {
        self.skip_diagonal_check = true;
        self
    }

    /// Scan the image for three mutually consistent finder patterns.
    pub fn find(mut self, try_harder: bool) -> Result<FinderPatternInfo, DecodeError> {
        let max_i = self.image.height();
        let max_j = self.image.width();

        // Coarse row stride assuming the symbol fills at least a quarter of
        // the image; try_harder drops to the minimum.
        let mut i_skip = (3 * max_i) / (4 * MAX_MODULES);
        if i_skip < MIN_SKIP || try_harder {
            i_skip = MIN_SKIP;
        }

        let mut done = false;
        let mut i = i_skip - 1;
        while i < max_i && !done {
            let mut state_count = [0usize; 5];
            let mut current_state = 0usize;
            for j in 0..max_j {
                if self.image.get(j, i) {
                    // Black pixel
                    if current_state & 1 == 1 {
                        current_state += 1;
                    }
                    state_count[current_state] += 1;
                } else if current_state & 1 == 0 {
                    // White pixel while counting a black run
                    if current_state == 4 {
                        if found_pattern_cross(&state_count) {
                            if self.handle_possible_center(&state_count, i, j) {
                                i_skip = 2;
                                if self.have_multiply_confirmed_centers() {
                                    done = true;
                                    break;
                                }
                            }
                            state_count = [0; 5];
                            current_state = 0;
                        } else {
                            // Shift the window two runs left and keep going
                            state_count.rotate_left(2);
                            state_count[3] = 1;
                            state_count[4] = 0;
                            current_state = 3;
                        }
                    } else {
                        current_state += 1;
                        state_count[current_state] += 1;
                    }
                } else {
                    state_count[current_state] += 1;
                }
            }
            if found_pattern_cross(&state_count) {
                self.handle_possible_center(&state_count, i, max_j);
            }
            i += i_skip;
        }

        let [a, b, c] = self.select_best_patterns()?;
        Ok(order_best_patterns(a, b, c))
    }

    fn have_multiply_confirmed_centers(&self) -> bool {
        let confirmed: Vec<&FinderPattern> = self
            .possible_centers
            .iter()
            .filter(|p| p.count >= CENTER_QUORUM)
            .collect();
        if confirmed.len() < 3 {
            return false;
        }
        // The confirmed centers must agree on module size within 5%.
        let total: f32 = confirmed.iter().map(|p| p.estimated_module_size).sum();
        let average = total / confirmed.len() as f32;
        let deviation: f32 = confirmed
            .iter()
            .map(|p| (p.estimated_module_size - average).abs())
            .sum();
        deviation <= 0.05 * total
    }

    /// Verify a horizontal sighting by re-scanning vertically, horizontally
    /// and diagonally through the candidate center, then record it.
    fn handle_possible_center(&mut self, state_count: &[usize; 5], i: usize, j: usize) -> bool {
        let state_count_total: usize = state_count.iter().sum();
        let mut center_j = center_from_end(state_count, j);
        let Some(center_i) =
            self.cross_check_vertical(i, center_j as usize, state_count[2], state_count_total)
        else {
            return false;
        };
        let Some(new_center_j) = self.cross_check_horizontal(
            center_j as usize,
            center_i as usize,
            state_count[2],
            state_count_total,
        ) else {
            return false;
        };
        center_j = new_center_j;
        if !self.skip_diagonal_check && !self.cross_check_diagonal(center_i as usize, center_j as usize)
        {
            return false;
        }

        let estimated_module_size = state_count_total as f32 / 7.0;
        for center in self.possible_centers.iter_mut() {
            if center.about_equals(estimated_module_size, center_i, center_j) {
                *center = center.combine_estimate(center_i, center_j, estimated_module_size);
                return true;
            }
        }
        self.possible_centers.push(FinderPattern {
            position: Point::new(center_j, center_i),
            estimated_module_size,
            count: 1,
        });
        false
    }

    fn cross_check_vertical(
        &self,
        start_i: usize,
        center_j: usize,
        max_count: usize,
        original_total: usize,
    ) -> Option<f32> {
        let image = self.image;
        let max_i = image.height();
        let mut state_count = [0usize; 5];

        // Walk up from the center
        let mut i = start_i as isize;
        while i >= 0 && image.get(center_j, i as usize) {
            state_count[2] += 1;
            i -= 1;
        }
        if i < 0 {
            return None;
        }
        while i >= 0 && !image.get(center_j, i as usize) && state_count[1] <= max_count {
            state_count[1] += 1;
            i -= 1;
        }
        if i < 0 || state_count[1] > max_count {
            return None;
        }
        while i >= 0 && image.get(center_j, i as usize) && state_count[0] <= max_count {
            state_count[0] += 1;
            i -= 1;
        }
        if state_count[0] > max_count {
            return None;
        }

        // Walk down from the center
        let mut i = start_i + 1;
        while i < max_i && image.get(center_j, i) {
            state_count[2] += 1;
            i += 1;
        }
        if i == max_i {
            return None;
        }
        while i < max_i && !image.get(center_j, i) && state_count[3] < max_count {
            state_count[3] += 1;
            i += 1;
        }
        if i == max_i || state_count[3] >= max_count {
            return None;
        }
        while i < max_i && image.get(center_j, i) && state_count[4] < max_count {
            state_count[4] += 1;
            i += 1;
        }
        if state_count[4] >= max_count {
            return None;
        }

        // Reject if the vertical extent differs wildly from the horizontal.
        let state_count_total: usize = state_count.iter().sum();
        if 5 * state_count_total.abs_diff(original_total) >= 2 * original_total {
            return None;
        }
        found_pattern_cross(&state_count).then(|| center_from_end(&state_count, i))
    }

    fn cross_check_horizontal(
        &self,
        start_j: usize,
        center_i: usize,
        max_count: usize,
        original_total: usize,
    ) -> Option<f32> {
        let image = self.image;
        let max_j = image.width();
        let mut state_count = [0usize; 5];

        let mut j = start_j as isize;
        while j >= 0 && image.get(j as usize, center_i) {
            state_count[2] += 1;
            j -= 1;
        }
        if j < 0 {
            return None;
        }
        while j >= 0 && !image.get(j as usize, center_i) && state_count[1] <= max_count {
            state_count[1] += 1;
            j -= 1;
        }
        if j < 0 || state_count[1] > max_count {
            return None;
        }
        while j >= 0 && image.get(j as usize, center_i) && state_count[0] <= max_count {
            state_count[0] += 1;
            j -= 1;
        }
        if state_count[0] > max_count {
            return None;
        }

        let mut j = start_j + 1;
        while j < max_j && image.get(j, center_i) {
            state_count[2] += 1;
            j += 1;
        }
        if j == max_j {
            return None;
        }
        while j < max_j && !image.get(j, center_i) && state_count[3] < max_count {
            state_count[3] += 1;
            j += 1;
        }
        if j == max_j || state_count[3] >= max_count {
            return None;
        }
        while j < max_j && image.get(j, center_i) && state_count[4] < max_count {
            state_count[4] += 1;
            j += 1;
        }
        if state_count[4] >= max_count {
            return None;
        }

        let state_count_total: usize = state_count.iter().sum();
        if 5 * state_count_total.abs_diff(original_total) >= original_total {
            return None;
        }
        found_pattern_cross(&state_count).then(|| center_from_end(&state_count, j))
    }

    /// The 1:1:3:1:1 ratio must also hold along the main diagonal through
    /// the center.
    fn cross_check_diagonal(&self, center_i: usize, center_j: usize) -> bool {
        let image = self.image;
        let mut state_count = [0usize; 5];

        // Up-left
        let mut i = 0usize;
        while center_i >= i && center_j >= i && image.get(center_j - i, center_i - i) {
            state_count[2] += 1;
            i += 1;
        }
        if center_i < i || center_j < i {
            return false;
        }
        while center_i >= i && center_j >= i && !image.get(center_j - i, center_i - i) {
            state_count[1] += 1;
            i += 1;
        }
        if center_i < i || center_j < i {
            return false;
        }
        while center_i >= i && center_j >= i && image.get(center_j - i, center_i - i) {
            state_count[0] += 1;
            i += 1;
        }

        // Down-right
        let max_i = image.height();
        let max_j = image.width();
        let mut i = 1usize;
        while center_i + i < max_i && center_j + i < max_j && image.get(center_j + i, center_i + i)
        {
            state_count[2] += 1;
            i += 1;
        }
        while center_i + i < max_i && center_j + i < max_j && !image.get(center_j + i, center_i + i)
        {
            state_count[3] += 1;
            i += 1;
        }
        while center_i + i < max_i && center_j + i < max_j && image.get(center_j + i, center_i + i)
        {
            state_count[4] += 1;
            i += 1;
        }
        found_pattern_cross(&state_count)
    }

    /// Pick the three best-confirmed centers, breaking ties by closeness
    /// to the mean module size.
    fn select_best_patterns(&mut self) -> Result<[FinderPattern; 3], DecodeError> {
        let centers = &mut self.possible_centers;
        centers.retain(|p| p.count >= CENTER_QUORUM);
        if centers.len() < 3 {
            return Err(DecodeError::NotFound);
        }
        if centers.len() > 3 {
            let total: f32 = centers.iter().map(|p| p.estimated_module_size).sum();
            let average = total / centers.len() as f32;
            centers.sort_by(|a, b| {
                let da = (a.estimated_module_size - average).abs();
                let db = (b.estimated_module_size - average).abs();
                b.count
                    .cmp(&a.count)
                    .then(da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal))
            });
            centers.truncate(3);
        }
        Ok([centers[0], centers[1], centers[2]])
    }
}

/// True when the five runs match 1:1:3:1:1 within half a module per unit
/// run and 1.5 modules for the center run.
pub(crate) fn found_pattern_cross(state_count: &[usize; 5]) -> bool {
    let total: usize = state_count.iter().sum();
    if total < 7 {
        return false;
    }
    let module_size = total as f32 / 7.0;
    let max_variance = module_size / 2.0;
    (module_size - state_count[0] as f32).abs() < max_variance
        && (module_size - state_count[1] as f32).abs() < max_variance
        && (3.0 * module_size - state_count[2] as f32).abs() < 3.0 * max_variance
        && (module_size - state_count[3] as f32).abs() < max_variance
        && (module_size - state_count[4] as f32).abs() < max_variance
}

/// Center x of the middle run, given the position one past its last pixel.
fn center_from_end(state_count: &[usize; 5], end: usize) -> f32 {
    (end - state_count[4] - state_count[3]) as f32 - state_count[2] as f32 / 2.0
}

/// Assign the roles: the pair with the largest separation spans the
/// diagonal (top-right to bottom-left); the cross product fixes which is
/// which.
fn order_best_patterns(a: FinderPattern, b: FinderPattern, c: FinderPattern) -> FinderPatternInfo {
    let d_ab = geometry::distance(&a.position, &b.position);
    let d_bc = geometry::distance(&b.position, &c.position);
    let d_ac = geometry::distance(&a.position, &c.position);

    let (top_left, mut p1, mut p2) = if d_bc >= d_ab && d_bc >= d_ac {
        (a, b, c)
    } else if d_ac >= d_bc && d_ac >= d_ab {
        (b, a, c)
    } else {
        (c, a, b)
    };

    // In image coordinates (y down), (bottom_left - top_left) x
    // (top_right - top_left) is negative for a correctly oriented symbol.
    if geometry::cross_product_z(&top_left.position, &p1.position, &p2.position) > 0.0 {
        std::mem::swap(&mut p1, &mut p2);
    }
    FinderPatternInfo {
        top_left,
        top_right: p2,
        bottom_left: p1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draw_finder(image: &mut BitMatrix, left: usize, top: usize, scale: usize) {
        for dy in 0..7usize {
            for dx in 0..7usize {
                let cx = dx as i32 - 3;
                let cy = dy as i32 - 3;
                let dist = cx.abs().max(cy.abs());
                if dist != 2 {
                    for sy in 0..scale {
                        for sx in 0..scale {
                            image.set(left + dx * scale + sx, top + dy * scale + sy, true);
                        }
                    }
                }
            }
        }
    }

    fn synthetic_image() -> BitMatrix {
        // Three finder patterns at the corners, 4px per module
        let mut image = BitMatrix::new(120, 120);
        draw_finder(&mut image, 10, 10, 4);
        draw_finder(&mut image, 82, 10, 4);
        draw_finder(&mut image, 10, 82, 4);
        image
    }

    #[test]
    fn test_found_pattern_cross() {
        assert!(found_pattern_cross(&[1, 1, 3, 1, 1]));
        assert!(found_pattern_cross(&[4, 4, 12, 4, 4]));
        assert!(found_pattern_cross(&[4, 5, 11, 4, 4]));
        assert!(!found_pattern_cross(&[4, 4, 4, 4, 4]));
        assert!(!found_pattern_cross(&[1, 1, 1, 1, 0]));
    }

    #[test]
    fn test_center_from_end() {
        // Runs of 2,2,6,2,2 ending at x=14: center run spans [4,10)
        assert_eq!(center_from_end(&[2, 2, 6, 2, 2], 14), 7.0);
    }

    #[test]
    fn test_find_three_patterns() {
        let image = synthetic_image();
        let info = FinderPatternFinder::new(&image).find(true).unwrap();

        // Centers sit 3.5 modules (14px) in from each pattern origin
        assert!((info.top_left.position.x - 24.0).abs() < 2.0);
        assert!((info.top_left.position.y - 24.0).abs() < 2.0);
        assert!((info.top_right.position.x - 96.0).abs() < 2.0);
        assert!((info.top_right.position.y - 24.0).abs() < 2.0);
        assert!((info.bottom_left.position.x - 24.0).abs() < 2.0);
        assert!((info.bottom_left.position.y - 96.0).abs() < 2.0);
        assert!((info.top_left.estimated_module_size - 4.0).abs() < 1.0);
    }

    #[test]
    fn test_not_found_on_blank() {
        let image = BitMatrix::new(100, 100);
        assert!(FinderPatternFinder::new(&image).find(true).is_err());
    }

    #[test]
    fn test_order_best_patterns() {
        let make = |x: f32, y: f32| FinderPattern {
            position: Point::new(x, y),
            estimated_module_size: 4.0,
            count: 2,
        };
        let info = order_best_patterns(make(90.0, 10.0), make(10.0, 10.0), make(10.0, 90.0));
        assert_eq!(info.top_left.position, Point::new(10.0, 10.0));
        assert_eq!(info.top_right.position, Point::new(90.0, 10.0));
        assert_eq!(info.bottom_left.position, Point::new(10.0, 90.0));
    }
}
