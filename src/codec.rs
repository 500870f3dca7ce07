//! Encoder and decoder seams.
//!
//! The registry and the API layer work against [`MatrixEncoder`] and
//! [`ImageDecoder`] so either side can be swapped in tests.

use image::DynamicImage;

use crate::config::DecoderConfig;
use crate::encoder::{EncodeOptions, QrEncoder};
use crate::error::EncodeError;
use crate::models::{ECLevel, ScanOutcome, SymbolMatrix};
use crate::pipeline::decode_image;

/// Payload to module grid
pub trait MatrixEncoder: Send + Sync {
    /// Build the symbol for `payload` at `level`
    fn encode(&self, payload: &[u8], level: ECLevel) -> Result<SymbolMatrix, EncodeError>;
}

/// Image to payload
pub trait ImageDecoder: Send + Sync {
    /// Locate and read symbols in `image`; never fails, see [`ScanOutcome`]
    fn decode(&self, image: &DynamicImage) -> ScanOutcome;
}

/// Default codec: [`QrEncoder`] plus the binarize-locate-sample pipeline
#[derive(Debug, Clone, Default)]
pub struct QrCodec {
    encoder: QrEncoder,
    decoder: DecoderConfig,
}

impl QrCodec {
    /// Codec with explicit encoder options and decoder tuning
    pub fn new(encode: EncodeOptions, decode: DecoderConfig) -> Self {
        Self {
            encoder: QrEncoder::new(encode),
            decoder: decode,
        }
    }
}

impl MatrixEncoder for QrCodec {
    fn encode(&self, payload: &[u8], level: ECLevel) -> Result<SymbolMatrix, EncodeError> {
        self.encoder.encode(payload, level)
    }
}

impl ImageDecoder for QrCodec {
    fn decode(&self, image: &DynamicImage) -> ScanOutcome {
        decode_image(&image.to_luma8(), &self.decoder)
    }
}
