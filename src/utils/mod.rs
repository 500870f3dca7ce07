//! Image processing helpers shared by the detector and the sampler
//!
//! - Grayscale conversion of packed RGB/RGBA buffers
//! - Binarization (tiled hybrid threshold, Otsu)
//! - Perspective transforms

/// Hybrid and Otsu thresholding
pub mod binarization;
/// Homography between module and image space
pub mod geometry;
/// Packed pixel buffers to luma
pub mod grayscale;
