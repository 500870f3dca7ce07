use std::io::Cursor;

use image::{ImageOutputFormat, Rgb, RgbImage};

use super::RenderOptions;
use crate::error::RenderError;
use crate::models::SymbolMatrix;

/// Rasterize `symbol` with `module_px`-pixel modules and a `border`-module
/// quiet zone painted in `background`.
pub fn render(
    symbol: &SymbolMatrix,
    module_px: u32,
    border: u32,
    foreground: Rgb<u8>,
    background: Rgb<u8>,
) -> Result<RgbImage, RenderError> {
    let invalid = || RenderError::InvalidDimensions { module_px, border };
    if module_px < 1 {
        return Err(invalid());
    }
    let modules = u32::try_from(symbol.size()).map_err(|_| invalid())?;
    let side = border
        .checked_mul(2)
        .and_then(|quiet| quiet.checked_add(modules))
        .and_then(|total| total.checked_mul(module_px))
        .ok_or_else(invalid)?;

    Ok(RgbImage::from_fn(side, side, |px, py| {
        let (mx, my) = (px / module_px, py / module_px);
        let inside = (border..border + modules).contains(&mx)
            && (border..border + modules).contains(&my);
        if inside && symbol.get((mx - border) as usize, (my - border) as usize) {
            foreground
        } else {
            background
        }
    }))
}

/// [`render`] with the size and colours taken from `options`
pub fn render_with(symbol: &SymbolMatrix, options: &RenderOptions) -> Result<RgbImage, RenderError> {
    render(
        symbol,
        options.module_px,
        options.border,
        options.foreground,
        options.background,
    )
}

/// Encode a raster as PNG bytes
pub fn to_png(image: &RgbImage) -> Result<Vec<u8>, RenderError> {
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)?;
    Ok(bytes)
}
