//! Byte-mode QR encoder
//!
//! Payload bytes become a single byte-mode segment in the smallest version
//! that fits, followed by Reed-Solomon EC, block interleaving, zig-zag
//! placement and penalty-driven mask selection.

/// MSB-first bit buffer
pub mod bits;
/// Mask selection penalty rules
pub mod mask_penalty;
/// Function pattern drawing and codeword placement
pub mod placement;

use rayon::prelude::*;
use tracing::debug;

use crate::common::format::FormatInfo;
use crate::common::function_mask::FunctionMask;
use crate::common::reed_solomon::ReedSolomonEncoder;
use crate::common::tables::{
    byte_capacity, byte_count_bits, ec_block_info, num_data_codewords, num_total_codewords,
};
use crate::error::EncodeError;
use crate::models::{BitMatrix, ECLevel, MaskPattern, SymbolMatrix, Version};

use bits::BitBuffer;
use mask_penalty::penalty_score;
use placement::{draw_function_patterns, place_codewords};

const MODE_BYTE: u32 = 0b0100;
const PAD_BYTES: [u8; 2] = [0xEC, 0x11];

/// Which payloads the encoder accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Charset {
    /// Any byte sequence
    #[default]
    Bytes,
    /// Only well-formed UTF-8 text
    Utf8,
}

/// Encoder settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeOptions {
    /// Smallest version the encoder may pick
    pub min_version: Version,
    /// Largest version the encoder may pick; payloads that do not fit fail
    pub max_version: Version,
    /// Force a mask instead of searching all eight
    pub mask: Option<MaskPattern>,
    /// Payload character set profile
    pub charset: Charset,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            min_version: Version::MIN,
            max_version: Version::MAX,
            mask: None,
            charset: Charset::Bytes,
        }
    }
}

impl EncodeOptions {
    /// Pin the symbol to a single version
    pub fn fixed_version(version: Version) -> Self {
        Self {
            min_version: version,
            max_version: version,
            ..Self::default()
        }
    }
}

/// QR symbol encoder
#[derive(Debug, Clone, Default)]
pub struct QrEncoder {
    options: EncodeOptions,
}

impl QrEncoder {
    /// Encoder bound to `options`
    pub fn new(options: EncodeOptions) -> Self {
        Self { options }
    }

    /// Options every call uses
    pub fn options(&self) -> &EncodeOptions {
        &self.options
    }

    /// Encode `payload` at `ec_level`
    pub fn encode(&self, payload: &[u8], ec_level: ECLevel) -> Result<SymbolMatrix, EncodeError> {
        let opts = &self.options;
        if payload.is_empty() {
            return Err(EncodeError::EmptyPayload);
        }
        if opts.min_version > opts.max_version {
            return Err(EncodeError::InvalidVersionRange {
                min: opts.min_version,
                max: opts.max_version,
            });
        }
        if opts.charset == Charset::Utf8 {
            if let Err(err) = std::str::from_utf8(payload) {
                return Err(EncodeError::UnsupportedCharacterSet {
                    offset: err.valid_up_to(),
                });
            }
        }

        let version = select_version(payload.len(), ec_level, opts)?;
        let data = data_codewords(payload, version, ec_level);
        let codewords = add_ec_and_interleave(&data, version, ec_level);

        let func = FunctionMask::new(version);
        let mut base = BitMatrix::square(version.size());
        draw_function_patterns(&mut base, version, ec_level);
        place_codewords(&mut base, &func, &codewords);

        let (mask, modules) = match opts.mask {
            Some(mask) => (mask, apply(&base, &func, ec_level, mask)),
            None => choose_mask(&base, &func, ec_level),
        };

        debug!(
            len = payload.len(),
            version = version.number(),
            level = %ec_level,
            mask = mask.index(),
            "encoded symbol"
        );
        Ok(SymbolMatrix::new(version, ec_level, mask, modules))
    }
}

/// Encode with default options (smallest version in 1..=40, best mask)
pub fn encode(payload: &[u8], ec_level: ECLevel) -> Result<SymbolMatrix, EncodeError> {
    QrEncoder::default().encode(payload, ec_level)
}

fn select_version(
    len: usize,
    ec_level: ECLevel,
    opts: &EncodeOptions,
) -> Result<Version, EncodeError> {
    opts.min_version
        .range_to(opts.max_version)
        .find(|&v| len <= byte_capacity(v, ec_level))
        .ok_or_else(|| EncodeError::PayloadTooLarge {
            len,
            max: byte_capacity(opts.max_version, ec_level),
            level: ec_level,
            version: opts.max_version,
        })
}

/// Mode + count header, payload, terminator and pad codewords
fn data_codewords(payload: &[u8], version: Version, ec_level: ECLevel) -> Vec<u8> {
    let capacity_bits = num_data_codewords(version, ec_level) * 8;
    let mut bb = BitBuffer::with_capacity(capacity_bits);
    bb.append_bits(MODE_BYTE, 4);
    bb.append_bits(payload.len() as u32, byte_count_bits(version));
    for &byte in payload {
        bb.append_bits(byte as u32, 8);
    }

    let terminator = (capacity_bits - bb.len()).min(4);
    bb.append_bits(0, terminator);
    bb.append_bits(0, (8 - bb.len() % 8) % 8);

    let mut data = bb.to_bytes();
    let needed = capacity_bits / 8;
    let pad_count = needed - data.len();
    data.extend(PAD_BYTES.iter().cycle().take(pad_count));
    data
}

/// Split into blocks, append EC to each, then interleave column-wise
fn add_ec_and_interleave(data: &[u8], version: Version, ec_level: ECLevel) -> Vec<u8> {
    let info = ec_block_info(version, ec_level);
    let total = num_total_codewords(version);
    let num_short = info.num_blocks - total % info.num_blocks;
    let short_data_len = total / info.num_blocks - info.ecc_per_block;
    let rs = ReedSolomonEncoder::new(info.ecc_per_block);

    let mut blocks: Vec<(&[u8], Vec<u8>)> = Vec::with_capacity(info.num_blocks);
    let mut offset = 0;
    for i in 0..info.num_blocks {
        let len = short_data_len + usize::from(i >= num_short);
        let chunk = &data[offset..offset + len];
        offset += len;
        blocks.push((chunk, rs.remainder(chunk)));
    }

    let mut result = Vec::with_capacity(total);
    for i in 0..=short_data_len {
        for (chunk, _) in &blocks {
            if let Some(&byte) = chunk.get(i) {
                result.push(byte);
            }
        }
    }
    for i in 0..info.ecc_per_block {
        for (_, ecc) in &blocks {
            result.push(ecc[i]);
        }
    }
    result
}

fn apply(base: &BitMatrix, func: &FunctionMask, ec_level: ECLevel, mask: MaskPattern) -> BitMatrix {
    let mut candidate = base.clone();
    func.apply_mask(&mut candidate, mask);
    FormatInfo::new(ec_level, mask).write(&mut candidate);
    candidate
}

/// Score all eight masks; the lowest penalty wins, ties go to the lower index
fn choose_mask(
    base: &BitMatrix,
    func: &FunctionMask,
    ec_level: ECLevel,
) -> (MaskPattern, BitMatrix) {
    let scored: Vec<(MaskPattern, u32, BitMatrix)> = MaskPattern::ALL
        .par_iter()
        .map(|&mask| {
            let candidate = apply(base, func, ec_level, mask);
            let score = penalty_score(&candidate);
            (mask, score, candidate)
        })
        .collect();

    match scored
        .into_iter()
        .min_by_key(|(mask, score, _)| (*score, mask.index()))
    {
        Some((mask, _, matrix)) => (mask, matrix),
        None => (MaskPattern::Pattern0, apply(base, func, ec_level, MaskPattern::Pattern0)),
    }
}
