//! QR Registry - QR code encoding, rasterization, image decoding and a
//! persisted registry of generated symbols.
//!
//! Encoding is byte mode across versions 1-40 at any error correction level.
//! Decoding takes any image the `image` crate can read and returns a
//! [`ScanOutcome`]; failure to find or read a symbol is a value, not an error.
//!
//! ```no_run
//! use qr_registry::{ECLevel, ScanOutcome, decode, encode, render};
//! use image::{DynamicImage, Rgb};
//!
//! let symbol = encode(b"hello", ECLevel::M).unwrap();
//! let raster = render(&symbol, 8, 4, Rgb([0, 0, 0]), Rgb([255, 255, 255])).unwrap();
//! match decode(&DynamicImage::ImageRgb8(raster)) {
//!     ScanOutcome::Decoded { payload } => assert_eq!(payload, b"hello"),
//!     other => panic!("{other:?}"),
//! }
//! ```

#![warn(missing_docs)]
#![allow(clippy::missing_docs_in_private_items)]

/// HTTP-boundary request handlers and response types
pub mod api;
/// `MatrixEncoder` / `ImageDecoder` traits and the default codec
pub mod codec;
/// Constant tables, Reed-Solomon, BCH, format/version info and function masks
pub mod common;
/// Environment-backed tuning knobs
pub mod config;
/// Module grid to payload (error correction, format extraction, data modes)
pub mod decoder;
/// Finder, triple and alignment detection
pub mod detector;
/// Payload to module grid
pub mod encoder;
/// Error enums
pub mod error;
/// Core data structures (BitMatrix, Point, SymbolMatrix, records, outcomes)
pub mod models;
/// Whole-image decode pipeline
pub mod pipeline;
/// Record and artifact persistence
pub mod registry;
/// Rasterizer and grid sampler
pub mod render;
/// Grayscale, binarization and geometry helpers
pub mod utils;

use image::DynamicImage;

pub use codec::{ImageDecoder, MatrixEncoder, QrCodec};
pub use config::{DecoderConfig, RegistryConfig};
pub use encoder::{EncodeOptions, QrEncoder, encode};
pub use error::{ApiError, EncodeError, RegistryError, RenderError};
pub use models::{
    BitMatrix, CorruptDetail, DecodedSymbol, ECLevel, MaskPattern, NotFoundReason, Point,
    QrRecord, RecordId, ScanOutcome, SymbolMatrix, Version,
};
pub use registry::Registry;
pub use render::{RenderOptions, render, sample_grid, to_png};

/// Decode an image with the default [`DecoderConfig`]
pub fn decode(image: &DynamicImage) -> ScanOutcome {
    pipeline::decode_image(&image.to_luma8(), &DecoderConfig::default())
}

/// Decode a packed RGB buffer (3 bytes per pixel)
///
/// A buffer shorter than `width * height * 3` is reported as an empty image.
pub fn decode_rgb(pixels: &[u8], width: usize, height: usize) -> ScanOutcome {
    match utils::grayscale::to_gray(pixels, width, height, 3) {
        Some(gray) => pipeline::decode_image(&gray, &DecoderConfig::default()),
        None => ScanOutcome::NotFound {
            reason: NotFoundReason::EmptyImage,
        },
    }
}
