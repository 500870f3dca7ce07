//! From a located finder triple to a payload.
//!
//! For each plausible version the grid is sampled through a homography,
//! checked for finder and timing structure, then unmasked, de-interleaved,
//! Reed-Solomon corrected and parsed into segments.

mod blocks;
mod geometry;
mod payload;
mod structure;

#[cfg(test)]
mod tests;

use image::GrayImage;
use tracing::trace;

use crate::common::format::FormatInfo;
use crate::common::function_mask::FunctionMask;
use crate::common::version::read_version_info;
use crate::detector::FinderTriple;
use crate::models::{
    BitMatrix, CorruptDetail, CorruptStage, DecodedSymbol, ECLevel, MaskPattern, Version,
};
use crate::render::sample_grid_with;

/// Result of reading one finder triple
#[derive(Debug, Clone)]
pub enum SymbolRead {
    /// Payload recovered
    Decoded(DecodedSymbol),
    /// A symbol grid was found but its content could not be recovered
    Corrupt(CorruptDetail),
    /// No version produced a grid with symbol structure
    Rejected,
}

/// Content of a module grid, independent of where it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleRead {
    /// Payload bytes
    pub data: Vec<u8>,
    /// Level from the format information
    pub ec_level: ECLevel,
    /// Mask from the format information
    pub mask_pattern: MaskPattern,
    /// Codewords fixed by Reed-Solomon across all blocks
    pub corrected_errors: usize,
}

/// Main QR decoder for located regions
pub struct QrDecoder;

impl QrDecoder {
    /// Decode the symbol whose finders are `triple`.
    ///
    /// Tries the estimated version and its neighbours; for version 7 and up
    /// a readable version block that disagrees adds its version to the list.
    pub fn decode(
        gray: &GrayImage,
        binary: &BitMatrix,
        triple: &FinderTriple,
        sample_grid: usize,
    ) -> SymbolRead {
        let estimated = triple.estimated_version();
        let mut candidates: Vec<Version> = [
            estimated,
            estimated.wrapping_sub(1),
            estimated.saturating_add(1),
        ]
        .into_iter()
        .filter_map(Version::new)
        .collect();

        let mut best: Option<CorruptDetail> = None;
        let mut next = 0;
        while next < candidates.len() {
            let version = candidates[next];
            next += 1;

            let Some(corners) = geometry::symbol_corners(binary, triple, version) else {
                continue;
            };
            let Some(symbol) = sample_grid_with(gray, &corners, version, sample_grid) else {
                continue;
            };
            if !structure::looks_like_symbol(symbol.modules()) {
                trace!(version = version.number(), "grid lacks symbol structure");
                continue;
            }
            if version.has_version_info() {
                if let Some(read) = read_version_info(symbol.modules()) {
                    if read != version {
                        if !candidates.contains(&read) {
                            candidates.push(read);
                        }
                        continue;
                    }
                }
            }

            match Self::decode_modules(symbol.modules(), version) {
                Ok(read) => {
                    return SymbolRead::Decoded(DecodedSymbol {
                        data: read.data,
                        version,
                        ec_level: read.ec_level,
                        mask_pattern: read.mask_pattern,
                        position: corners,
                        corrected_errors: read.corrected_errors,
                    });
                }
                Err(detail) => {
                    trace!(version = version.number(), %detail, "symbol unreadable");
                    if best.as_ref().is_none_or(|b| detail.rank() > b.rank()) {
                        best = Some(detail);
                    }
                }
            }
        }

        match best {
            Some(detail) => SymbolRead::Corrupt(detail),
            None => SymbolRead::Rejected,
        }
    }

    /// Decode an upright module grid of the given version
    pub fn decode_modules(modules: &BitMatrix, version: Version) -> Result<ModuleRead, CorruptDetail> {
        let format = FormatInfo::read(modules)
            .ok_or_else(|| CorruptDetail::format_unreadable(version.number()))?;

        let function = FunctionMask::new(version);
        let mut unmasked = modules.clone();
        function.apply_mask(&mut unmasked, format.mask_pattern);
        let codewords = read_codewords(&unmasked, &function);

        let corrected = blocks::correct_blocks(&codewords, version, format.ec_level)?;
        match payload::decode_segments(&corrected.data, version) {
            Some(data) if !data.is_empty() => Ok(ModuleRead {
                data,
                ec_level: format.ec_level,
                mask_pattern: format.mask_pattern,
                corrected_errors: corrected.errors,
            }),
            _ => Err(CorruptDetail {
                stage: CorruptStage::Payload,
                version: Some(version.number()),
                ec_level: Some(format.ec_level),
                failed_blocks: 0,
                total_blocks: 0,
                max_block_errors: 0,
                correctable_per_block: 0,
            }),
        }
    }
}

/// Codewords along the zig-zag walk, MSB first; remainder bits dropped
fn read_codewords(unmasked: &BitMatrix, function: &FunctionMask) -> Vec<u8> {
    function
        .data_module_positions()
        .chunks_exact(8)
        .map(|byte| {
            byte.iter()
                .fold(0u8, |acc, &(x, y)| (acc << 1) | unmasked.get(x, y) as u8)
        })
        .collect()
}
