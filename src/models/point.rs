//! Image-space position used by the detector and grid sampler.

/// A point in pixel coordinates. Kept as f32 since finder and alignment
/// centers land between pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    /// Horizontal pixel coordinate
    pub x: f32,
    /// Vertical pixel coordinate
    pub y: f32,
}

impl Point {
    /// Point at the given pixel coordinates.
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_construction() {
        let p = Point::new(3.5, 17.5);
        assert_eq!(p.x, 3.5);
        assert_eq!(p.y, 17.5);
        assert_eq!(Point::default(), Point::new(0.0, 0.0));
    }
}
