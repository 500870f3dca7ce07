//! Symbol rasterization and the inverse grid sampler used by the decoder

use image::Rgb;

/// Module grid to pixels, PNG output
pub mod raster;
/// Pixels back to a module grid through a homography
pub mod sampler;

pub use raster::{render, render_with, to_png};
pub use sampler::{sample_grid, sample_grid_with};

/// Raster settings; the default reads `QR_MODULE_PX` and `QR_BORDER`
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    /// Pixels per module side
    pub module_px: u32,
    /// Quiet zone width in modules
    pub border: u32,
    /// Dark module colour
    pub foreground: Rgb<u8>,
    /// Light module and quiet zone colour
    pub background: Rgb<u8>,
}
