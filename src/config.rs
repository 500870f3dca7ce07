//! Runtime tuning.
//!
//! Every knob has a compiled default that can be overridden once per process
//! through a `QR_*` environment variable. Unparsable values fall back to the
//! default; values are clamped to sane ranges.

use std::sync::OnceLock;
use std::time::Duration;

use image::Rgb;

use crate::models::ECLevel;
use crate::render::RenderOptions;

fn parse_env_u64(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

fn parse_env_usize(name: &str, default: usize) -> usize {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(default)
}

fn parse_env_u32(name: &str, default: u32) -> u32 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<u32>().ok())
        .unwrap_or(default)
}

fn parse_env_bool_u8(name: &str, default: bool) -> bool {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<u8>().ok())
        .map(|v| v != 0)
        .unwrap_or(default)
}

static STORE_TIMEOUT_MS: OnceLock<u64> = OnceLock::new();

pub(crate) fn store_timeout_ms() -> u64 {
    *STORE_TIMEOUT_MS.get_or_init(|| parse_env_u64("QR_STORE_TIMEOUT_MS", 2_000).max(1))
}

static SAMPLE_GRID: OnceLock<usize> = OnceLock::new();

pub(crate) fn sample_grid() -> usize {
    *SAMPLE_GRID.get_or_init(|| parse_env_usize("QR_SAMPLE_GRID", 3).clamp(1, 5))
}

static MAX_TRIPLES: OnceLock<usize> = OnceLock::new();

pub(crate) fn max_triples() -> usize {
    *MAX_TRIPLES.get_or_init(|| parse_env_usize("QR_MAX_TRIPLES", 40).clamp(1, 400))
}

static MODULE_PX: OnceLock<u32> = OnceLock::new();

pub(crate) fn module_px() -> u32 {
    *MODULE_PX.get_or_init(|| parse_env_u32("QR_MODULE_PX", 10).clamp(1, 64))
}

static BORDER: OnceLock<u32> = OnceLock::new();

pub(crate) fn border_modules() -> u32 {
    *BORDER.get_or_init(|| parse_env_u32("QR_BORDER", 4).min(64))
}

static PARALLEL: OnceLock<bool> = OnceLock::new();

pub(crate) fn parallel() -> bool {
    *PARALLEL.get_or_init(|| parse_env_bool_u8("QR_PARALLEL", true))
}

/// Image decoder tuning
#[derive(Debug, Clone, PartialEq)]
pub struct DecoderConfig {
    /// Side of the binarizer tiles in pixels
    pub tile_size: usize,
    /// Tiles with a smaller luminance range are treated as flat
    pub min_dynamic_range: u8,
    /// Pixels sampled per module side when reading the grid (k x k)
    pub sample_grid: usize,
    /// Finder triples tried per binarization pass
    pub max_triples: usize,
    /// Retry with a global Otsu threshold when the tiled pass finds nothing
    pub otsu_fallback: bool,
    /// Evaluate finder triples on the rayon pool
    pub parallel: bool,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            tile_size: 8,
            min_dynamic_range: 24,
            sample_grid: sample_grid(),
            max_triples: max_triples(),
            otsu_fallback: true,
            parallel: parallel(),
        }
    }
}

/// Registry tuning
#[derive(Debug, Clone, PartialEq)]
pub struct RegistryConfig {
    /// Upper bound on each persistence call
    pub store_timeout: Duration,
    /// How stored artifacts are rasterized
    pub render: RenderOptions,
    /// Level used when the caller does not pick one
    pub default_level: ECLevel,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            store_timeout: Duration::from_millis(store_timeout_ms()),
            render: RenderOptions::default(),
            default_level: ECLevel::L,
        }
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            module_px: module_px(),
            border: border_modules(),
            foreground: Rgb([0, 0, 0]),
            background: Rgb([255, 255, 255]),
        }
    }
}
