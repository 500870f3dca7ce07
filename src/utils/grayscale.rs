//! Packed RGB/RGBA buffers to luminance.
//!
//! Y = (76*R + 150*G + 29*B) >> 8, the integer form of 0.299/0.587/0.114.

use image::GrayImage;
use rayon::prelude::*;

const COEF_R: u32 = 76;
const COEF_G: u32 = 150;
const COEF_B: u32 = 29;

/// Row count at which conversion moves to the rayon pool
const PARALLEL_MIN_ROWS: usize = 512;

#[inline]
fn luma(px: &[u8]) -> u8 {
    ((COEF_R * px[0] as u32 + COEF_G * px[1] as u32 + COEF_B * px[2] as u32) >> 8) as u8
}

/// Gray image from packed pixels with `channels` bytes each (3 or 4; alpha
/// is ignored). `None` when the buffer is shorter than `width * height`
/// pixels or the channel count is unsupported.
pub fn to_gray(pixels: &[u8], width: usize, height: usize, channels: usize) -> Option<GrayImage> {
    if !(3..=4).contains(&channels) {
        return None;
    }
    let needed = width.checked_mul(height)?.checked_mul(channels)?;
    if pixels.len() < needed {
        return None;
    }

    let mut gray = vec![0u8; width * height];
    if width > 0 {
        let convert_row = |(out, src): (&mut [u8], &[u8])| {
            for (y, px) in out.iter_mut().zip(src.chunks_exact(channels)) {
                *y = luma(px);
            }
        };
        let src = &pixels[..needed];
        if height >= PARALLEL_MIN_ROWS {
            gray.par_chunks_mut(width)
                .zip(src.par_chunks(width * channels))
                .for_each(convert_row);
        } else {
            gray.chunks_mut(width)
                .zip(src.chunks(width * channels))
                .for_each(convert_row);
        }
    }
    GrayImage::from_raw(u32::try_from(width).ok()?, u32::try_from(height).ok()?, gray)
}
