//! Luminance sources: the grayscale views the binarizer reads from.
//!
//! A `LuminanceSource` hands out rows of 8-bit luma values. Adapters wrap
//! another source to invert, crop, or rotate without copying pixel data
//! until `matrix()` is called.

use rayon::prelude::*;

// ITU-R BT.601 luma coefficients scaled to /256 fixed point.
const COEF_R: u32 = 77;
const COEF_G: u32 = 150;
const COEF_B: u32 = 29;

/// A rectangle of 8-bit luminance values.
pub trait LuminanceSource {
    /// Width in pixels
    fn width(&self) -> usize;

    /// Height in pixels
    fn height(&self) -> usize;

    /// Copy row `y` into `row`, resizing it as needed.
    fn get_row(&self, y: usize, row: &mut Vec<u8>);

    /// The whole rectangle as a row-major luma buffer.
    fn matrix(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.width() * self.height());
        let mut row = Vec::new();
        for y in 0..self.height() {
            self.get_row(y, &mut row);
            out.extend_from_slice(&row);
        }
        out
    }
}

/// Owned 8-bit grayscale image.
#[derive(Debug, Clone)]
pub struct Luma8Source {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl Luma8Source {
    /// Wrap an existing row-major luma buffer. `data.len()` must equal
    /// `width * height`.
    pub fn new(data: Vec<u8>, width: usize, height: usize) -> Self {
        debug_assert_eq!(data.len(), width * height);
        Self {
            width,
            height,
            data,
        }
    }

    /// Convert packed RGB pixels to luma, one rayon task per row.
    pub fn from_rgb(rgb: &[u8], width: usize, height: usize) -> Self {
        let mut gray = vec![0u8; width * height];
        gray.par_chunks_mut(width).enumerate().for_each(|(y, row)| {
            let row_start = y * width * 3;
            for x in 0..width {
                let idx = row_start + x * 3;
                let r = rgb[idx] as u32;
                let g = rgb[idx + 1] as u32;
                let b = rgb[idx + 2] as u32;
                row[x] = ((COEF_R * r + COEF_G * g + COEF_B * b) >> 8).min(255) as u8;
            }
        });
        Self::new(gray, width, height)
    }

    /// Convert packed RGBA pixels to luma, ignoring alpha.
    pub fn from_rgba(rgba: &[u8], width: usize, height: usize) -> Self {
        let mut gray = vec![0u8; width * height];
        gray.par_chunks_mut(width).enumerate().for_each(|(y, row)| {
            let row_start = y * width * 4;
            for x in 0..width {
                let idx = row_start + x * 4;
                let r = rgba[idx] as u32;
                let g = rgba[idx + 1] as u32;
                let b = rgba[idx + 2] as u32;
                row[x] = ((COEF_R * r + COEF_G * g + COEF_B * b) >> 8).min(255) as u8;
            }
        });
        Self::new(gray, width, height)
    }
}

impl LuminanceSource for Luma8Source {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn get_row(&self, y: usize, row: &mut Vec<u8>) {
        debug_assert!(y < self.height);
        let start = y * self.width;
        row.clear();
        row.extend_from_slice(&self.data[start..start + self.width]);
    }

    fn matrix(&self) -> Vec<u8> {
        self.data.clone()
    }
}

/// Photometric inversion of another source (light-on-dark symbols).
pub struct Inverted<S>(pub S);

impl<S: LuminanceSource> LuminanceSource for Inverted<S> {
    fn width(&self) -> usize {
        self.0.width()
    }

    fn height(&self) -> usize {
        self.0.height()
    }

    fn get_row(&self, y: usize, row: &mut Vec<u8>) {
        self.0.get_row(y, row);
        for v in row.iter_mut() {
            *v = 255 - *v;
        }
    }
}

/// Axis-aligned sub-rectangle of another source.
pub struct Cropped<S> {
    inner: S,
    left: usize,
    top: usize,
    width: usize,
    height: usize,
}

impl<S: LuminanceSource> Cropped<S> {
    /// Crop region must lie fully inside the inner source.
    pub fn new(inner: S, left: usize, top: usize, width: usize, height: usize) -> Option<Self> {
        if left + width > inner.width() || top + height > inner.height() {
            return None;
        }
        Some(Self {
            inner,
            left,
            top,
            width,
            height,
        })
    }
}

impl<S: LuminanceSource> LuminanceSource for Cropped<S> {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn get_row(&self, y: usize, row: &mut Vec<u8>) {
        let mut full = Vec::new();
        self.inner.get_row(self.top + y, &mut full);
        row.clear();
        row.extend_from_slice(&full[self.left..self.left + self.width]);
    }
}

/// The inner source rotated 90 degrees counterclockwise.
pub struct Rotated90<S>(pub S);

impl<S: LuminanceSource> LuminanceSource for Rotated90<S> {
    fn width(&self) -> usize {
        self.0.height()
    }

    fn height(&self) -> usize {
        self.0.width()
    }

    fn get_row(&self, y: usize, row: &mut Vec<u8>) {
        // Output row y is the inner column (inner_width - 1 - y), top to bottom.
        let inner_x = self.0.width() - 1 - y;
        let inner = self.0.matrix();
        row.clear();
        row.reserve(self.0.height());
        for inner_y in 0..self.0.height() {
            row.push(inner[inner_y * self.0.width() + inner_x]);
        }
    }

    fn matrix(&self) -> Vec<u8> {
        let inner = self.0.matrix();
        let (w, h) = (self.0.width(), self.0.height());
        let mut out = vec![0u8; w * h];
        for y in 0..h {
            for x in 0..w {
                out[(w - 1 - x) * h + y] = inner[y * w + x];
            }
        }
        out
    }
}
