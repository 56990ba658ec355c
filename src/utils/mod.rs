//! Utility modules shared by the detector and decoder:
//! - Binarization (global histogram and block-adaptive hybrid)
//! - Geometry (perspective transforms, distance calculations)

pub mod binarization;
pub mod geometry;
