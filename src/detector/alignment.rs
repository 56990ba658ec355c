//! Alignment pattern location: searches a small window near the expected
//! position for the single dark module flanked by light modules that marks
//! the center of an alignment pattern (versions 2+).

use crate::error::DecodeError;
use crate::models::{BitMatrix, Point};

/// A confirmed alignment pattern center.
#[derive(Debug, Clone, Copy)]
pub struct AlignmentPattern {
    /// Center in image coordinates
    pub position: Point,
    /// Module size implied by the run widths at the center
    pub estimated_module_size: f32,
}

impl AlignmentPattern {
    fn about_equals(&self, module_size: f32, i: f32, j: f32) -> bool {
        if (i - self.position.y).abs() <= module_size && (j - self.position.x).abs() <= module_size
        {
            let delta = (module_size - self.estimated_module_size).abs();
            delta <= 1.0 || delta <= self.estimated_module_size
        } else {
            false
        }
    }

    fn combine_estimate(&self, i: f32, j: f32, new_module_size: f32) -> AlignmentPattern {
        AlignmentPattern {
            position: Point::new((self.position.x + j) / 2.0, (self.position.y + i) / 2.0),
            estimated_module_size: (self.estimated_module_size + new_module_size) / 2.0,
        }
    }
}

/// Scans a window for light-dark-light runs of one module each. The runs
/// tracked are white, black, white; a match centers on the black run.
pub struct AlignmentPatternFinder<'a> {
    image: &'a BitMatrix,
    start_x: usize,
    start_y: usize,
    width: usize,
    height: usize,
    module_size: f32,
    possible_centers: Vec<AlignmentPattern>,
}

impl<'a> AlignmentPatternFinder<'a> {
    /// Search window must lie inside the image.
    pub fn new(
        image: &'a BitMatrix,
        start_x: usize,
        start_y: usize,
        width: usize,
        height: usize,
        module_size: f32,
    ) -> Self {
        debug_assert!(start_x + width <= image.width());
        debug_assert!(start_y + height <= image.height());
        Self {
            image,
            start_x,
            start_y,
            width,
            height,
            module_size,
            possible_centers: Vec::new(),
        }
    }

    /// Scan rows starting from the middle of the window and fanning out.
    /// A second sighting of the same center returns immediately; otherwise
    /// the first unconfirmed sighting is accepted at the end.
    pub fn find(mut self) -> Result<AlignmentPattern, DecodeError> {
        let max_j = self.start_x + self.width;
        let middle_i = self.start_y + self.height / 2;

        for i_gen in 0..self.height {
            let offset = (i_gen + 1) / 2;
            let i = if i_gen & 1 == 0 {
                middle_i + offset
            } else {
                match middle_i.checked_sub(offset) {
                    Some(v) => v,
                    None => continue,
                }
            };
            if i >= self.image.height() {
                continue;
            }

            // state_count holds [white, black, white] run lengths
            let mut state_count = [0usize; 3];
            let mut j = self.start_x;
            // Burn leading white; a run cut off by the window edge has an
            // unknown length.
            while j < max_j && !self.image.get(j, i) {
                j += 1;
            }
            let mut current_state = 0usize;
            while j < max_j {
                if self.image.get(j, i) {
                    if current_state == 1 {
                        state_count[1] += 1;
                    } else if current_state == 2 {
                        if self.found_pattern_cross(&state_count) {
                            if let Some(confirmed) = self.handle_possible_center(&state_count, i, j)
                            {
                                return Ok(confirmed);
                            }
                        }
                        // Slide the window: trailing white becomes leading
                        state_count[0] = state_count[2];
                        state_count[1] = 1;
                        state_count[2] = 0;
                        current_state = 1;
                    } else {
                        current_state += 1;
                        state_count[current_state] += 1;
                    }
                } else {
                    if current_state == 1 {
                        current_state += 1;
                    }
                    state_count[current_state] += 1;
                }
                j += 1;
            }
            if self.found_pattern_cross(&state_count) {
                if let Some(confirmed) = self.handle_possible_center(&state_count, i, max_j) {
                    return Ok(confirmed);
                }
            }
        }

        self.possible_centers
            .first()
            .copied()
            .ok_or(DecodeError::NotFound)
    }

    /// All three runs within half a module of the expected size.
    fn found_pattern_cross(&self, state_count: &[usize; 3]) -> bool {
        let max_variance = self.module_size / 2.0;
        state_count
            .iter()
            .all(|&count| (self.module_size - count as f32).abs() < max_variance)
    }

    fn handle_possible_center(
        &mut self,
        state_count: &[usize; 3],
        i: usize,
        j: usize,
    ) -> Option<AlignmentPattern> {
        let state_count_total: usize = state_count.iter().sum();
        let center_j = center_from_end(state_count, j);
        let center_i = self.cross_check_vertical(
            i,
            center_j as usize,
            2 * state_count[1],
            state_count_total,
        )?;

        let estimated_module_size = state_count_total as f32 / 3.0;
        for center in &self.possible_centers {
            if center.about_equals(estimated_module_size, center_i, center_j) {
                return Some(center.combine_estimate(center_i, center_j, estimated_module_size));
            }
        }
        self.possible_centers.push(AlignmentPattern {
            position: Point::new(center_j, center_i),
            estimated_module_size,
        });
        None
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
        let mut state_count = [0usize; 3];

        let mut i = start_i as isize;
        while i >= 0 && image.get(center_j, i as usize) && state_count[1] <= max_count {
            state_count[1] += 1;
            i -= 1;
        }
        if i < 0 || state_count[1] > max_count {
            return None;
        }
        while i >= 0 && !image.get(center_j, i as usize) && state_count[0] <= max_count {
            state_count[0] += 1;
            i -= 1;
        }
        if state_count[0] > max_count {
            return None;
        }

        let mut i = start_i + 1;
        while i < max_i && image.get(center_j, i) && state_count[1] <= max_count {
            state_count[1] += 1;
            i += 1;
        }
        if i == max_i || state_count[1] > max_count {
            return None;
        }
        while i < max_i && !image.get(center_j, i) && state_count[2] <= max_count {
            state_count[2] += 1;
            i += 1;
        }
        if state_count[2] > max_count {
            return None;
        }

        let state_count_total: usize = state_count.iter().sum();
        if 5 * state_count_total.abs_diff(original_total) >= 2 * original_total {
            return None;
        }
        self.found_pattern_cross(&state_count)
            .then(|| center_from_end(&state_count, i))
    }
}

/// Center of the black run, given the position one past the trailing white.
fn center_from_end(state_count: &[usize; 3], end: usize) -> f32 {
    (end - state_count[2]) as f32 - state_count[1] as f32 / 2.0
}
