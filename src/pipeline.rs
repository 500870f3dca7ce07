//! Whole-image decode.
//!
//! Binarize, locate finder patterns, read every plausible triple, then reduce
//! the per-triple reads to one [`ScanOutcome`]. The tiled binarizer runs
//! first; a global Otsu pass runs only when the first pass decoded nothing.

use image::GrayImage;
use rayon::prelude::*;
use tracing::debug;

use crate::config::DecoderConfig;
use crate::decoder::qr_decoder::{QrDecoder, SymbolRead};
use crate::detector::{FinderDetector, FinderTriple, select_triples};
use crate::models::{BitMatrix, CorruptDetail, DecodedSymbol, NotFoundReason, ScanOutcome};
use crate::utils::binarization::{hybrid_binarize, otsu_binarize};

/// Decode every symbol in `gray` and classify the result
pub fn decode_image(gray: &GrayImage, config: &DecoderConfig) -> ScanOutcome {
    if gray.width() == 0 || gray.height() == 0 {
        return ScanOutcome::NotFound {
            reason: NotFoundReason::EmptyImage,
        };
    }
    scan(gray, config).into_outcome()
}

/// Every distinct symbol decoded in `gray`, with its location and metadata
pub fn decode_symbols(gray: &GrayImage, config: &DecoderConfig) -> Vec<DecodedSymbol> {
    if gray.width() == 0 || gray.height() == 0 {
        return Vec::new();
    }
    let mut pass = scan(gray, config);
    pass.dedupe();
    pass.decoded
}

fn scan(gray: &GrayImage, config: &DecoderConfig) -> PassResult {
    let hybrid = hybrid_binarize(gray, config.tile_size, config.min_dynamic_range);
    let first = run_pass(gray, &hybrid, config);
    if !first.decoded.is_empty() || !config.otsu_fallback {
        return first;
    }
    debug!("tiled pass decoded nothing, retrying with a global threshold");
    let otsu = otsu_binarize(gray);
    first.merge(run_pass(gray, &otsu, config))
}

#[derive(Debug, Default)]
struct PassResult {
    finders: usize,
    triples: usize,
    decoded: Vec<DecodedSymbol>,
    corrupt: Option<CorruptDetail>,
}

fn run_pass(gray: &GrayImage, binary: &BitMatrix, config: &DecoderConfig) -> PassResult {
    let patterns = FinderDetector::detect(binary);
    let triples = if patterns.len() >= 3 {
        select_triples(binary, &patterns, config.max_triples)
    } else {
        Vec::new()
    };

    let read = |triple: &FinderTriple| QrDecoder::decode(gray, binary, triple, config.sample_grid);
    let reads: Vec<SymbolRead> = if config.parallel {
        triples.par_iter().map(read).collect()
    } else {
        triples.iter().map(read).collect()
    };

    let mut result = PassResult {
        finders: patterns.len(),
        triples: triples.len(),
        ..PassResult::default()
    };
    for read in reads {
        match read {
            SymbolRead::Decoded(symbol) => result.decoded.push(symbol),
            SymbolRead::Corrupt(detail) => result.keep_corrupt(detail),
            SymbolRead::Rejected => {}
        }
    }
    debug!(
        finders = result.finders,
        triples = result.triples,
        decoded = result.decoded.len(),
        corrupt = result.corrupt.is_some(),
        "pass complete"
    );
    result
}

impl PassResult {
    fn keep_corrupt(&mut self, detail: CorruptDetail) {
        if self.corrupt.as_ref().is_none_or(|c| detail.rank() > c.rank()) {
            self.corrupt = Some(detail);
        }
    }

    fn merge(mut self, other: PassResult) -> PassResult {
        self.finders = self.finders.max(other.finders);
        self.triples = self.triples.max(other.triples);
        self.decoded.extend(other.decoded);
        if let Some(detail) = other.corrupt {
            self.keep_corrupt(detail);
        }
        self
    }

    /// Drop repeat reads of the same payload, keeping the first
    fn dedupe(&mut self) {
        let mut seen: Vec<Vec<u8>> = Vec::new();
        self.decoded.retain(|symbol| {
            if seen.contains(&symbol.data) {
                false
            } else {
                seen.push(symbol.data.clone());
                true
            }
        });
    }

    fn into_outcome(mut self) -> ScanOutcome {
        self.dedupe();
        match self.decoded.len() {
            0 => {}
            1 => {
                let payload = self.decoded.remove(0).data;
                return ScanOutcome::Decoded { payload };
            }
            _ => {
                return ScanOutcome::Ambiguous {
                    candidates: self.decoded.into_iter().map(|s| s.data).collect(),
                };
            }
        }
        if let Some(detail) = self.corrupt {
            return ScanOutcome::Corrupt { detail };
        }
        let reason = if self.finders < 3 {
            NotFoundReason::TooFewFinders {
                found: self.finders,
            }
        } else {
            NotFoundReason::NoConsistentGeometry {
                finders: self.finders,
                triples: self.triples,
            }
        };
        ScanOutcome::NotFound { reason }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::encode;
    use crate::models::{CorruptStage, ECLevel, MaskPattern, Point, Version};
    use crate::render::render;
    use image::{Luma, Rgb, imageops};

    fn config() -> DecoderConfig {
        DecoderConfig {
            parallel: false,
            ..DecoderConfig::default()
        }
    }

    fn symbol(data: &[u8]) -> DecodedSymbol {
        DecodedSymbol {
            data: data.to_vec(),
            version: Version::MIN,
            ec_level: ECLevel::M,
            mask_pattern: MaskPattern::Pattern0,
            position: [Point::new(0.0, 0.0); 4],
            corrected_errors: 0,
        }
    }

    fn corrupt(stage: CorruptStage, failed_blocks: usize) -> CorruptDetail {
        CorruptDetail {
            stage,
            version: Some(1),
            ec_level: None,
            failed_blocks,
            total_blocks: 1,
            max_block_errors: 0,
            correctable_per_block: 0,
        }
    }

    #[test]
    fn test_empty_image() {
        let gray = GrayImage::new(0, 0);
        assert_eq!(
            decode_image(&gray, &config()),
            ScanOutcome::NotFound {
                reason: NotFoundReason::EmptyImage
            }
        );
        assert!(decode_symbols(&gray, &config()).is_empty());
    }

    #[test]
    fn test_blank_page_has_no_finders() {
        let gray = GrayImage::from_pixel(200, 150, Luma([250]));
        assert_eq!(
            decode_image(&gray, &config()),
            ScanOutcome::NotFound {
                reason: NotFoundReason::TooFewFinders { found: 0 }
            }
        );
    }

    #[test]
    fn test_decodes_rendered_symbol() {
        let symbol = encode(b"pipeline", ECLevel::L).unwrap();
        let rgb = render(&symbol, 4, 4, Rgb([0, 0, 0]), Rgb([255, 255, 255])).unwrap();
        let gray = imageops::grayscale(&rgb);
        assert_eq!(
            decode_image(&gray, &config()),
            ScanOutcome::Decoded {
                payload: b"pipeline".to_vec()
            }
        );

        let parallel = DecoderConfig {
            parallel: true,
            ..config()
        };
        assert_eq!(decode_image(&gray, &parallel).payload(), Some(&b"pipeline"[..]));
    }

    #[test]
    fn test_outcome_reduction() {
        let single = PassResult {
            finders: 6,
            triples: 3,
            decoded: vec![symbol(b"a"), symbol(b"a")],
            corrupt: Some(corrupt(CorruptStage::ErrorCorrection, 1)),
        };
        assert_eq!(
            single.into_outcome(),
            ScanOutcome::Decoded {
                payload: b"a".to_vec()
            }
        );

        let two = PassResult {
            decoded: vec![symbol(b"a"), symbol(b"b"), symbol(b"a")],
            ..PassResult::default()
        };
        assert_eq!(
            two.into_outcome(),
            ScanOutcome::Ambiguous {
                candidates: vec![b"a".to_vec(), b"b".to_vec()]
            }
        );

        let geometry = PassResult {
            finders: 4,
            triples: 0,
            ..PassResult::default()
        };
        assert_eq!(
            geometry.into_outcome(),
            ScanOutcome::NotFound {
                reason: NotFoundReason::NoConsistentGeometry {
                    finders: 4,
                    triples: 0
                }
            }
        );
    }

    #[test]
    fn test_keeps_furthest_corrupt_stage() {
        let mut pass = PassResult::default();
        pass.keep_corrupt(corrupt(CorruptStage::FormatInfo, 0));
        pass.keep_corrupt(corrupt(CorruptStage::ErrorCorrection, 3));
        pass.keep_corrupt(corrupt(CorruptStage::ErrorCorrection, 1));
        pass.keep_corrupt(corrupt(CorruptStage::FormatInfo, 0));

        let other = PassResult {
            corrupt: Some(corrupt(CorruptStage::ErrorCorrection, 2)),
            ..PassResult::default()
        };
        let merged = pass.merge(other);
        assert_eq!(
            merged.into_outcome(),
            ScanOutcome::Corrupt {
                detail: corrupt(CorruptStage::ErrorCorrection, 1)
            }
        );
    }
}
