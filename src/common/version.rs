/// Version information blocks (versions 7-40)
use crate::common::bch::{bch_encode, nearest_codeword};
use crate::models::{BitMatrix, Version};

const VERSION_GENERATOR: u32 = 0x1F25;
const MAX_VERSION_DISTANCE: u32 = 3;

/// 18-bit version codeword (6 data bits + 12 BCH bits)
pub fn version_bits(version: Version) -> u32 {
    bch_encode(version.number() as u32, VERSION_GENERATOR, 12)
}

/// Draw both version blocks; no-op below version 7
pub fn write_version_info(matrix: &mut BitMatrix, version: Version) {
    if !version.has_version_info() {
        return;
    }
    let size = matrix.width();
    let bits = version_bits(version);
    for i in 0..18 {
        let bit = (bits >> i) & 1 == 1;
        let a = size - 11 + i % 3;
        let b = i / 3;
        matrix.set(a, b, bit);
        matrix.set(b, a, bit);
    }
}

/// Read the version from either block, preferring the closer codeword
pub fn read_version_info(matrix: &BitMatrix) -> Option<Version> {
    let size = matrix.width();
    if size < 45 {
        return None;
    }
    let mut top_right = 0u32;
    let mut bottom_left = 0u32;
    for i in 0..18 {
        let a = size - 11 + i % 3;
        let b = i / 3;
        top_right |= (matrix.get(a, b) as u32) << i;
        bottom_left |= (matrix.get(b, a) as u32) << i;
    }

    let candidates = || {
        Version::new(7)
            .into_iter()
            .flat_map(|first| first.range_to(Version::MAX))
            .map(|v| (v, version_bits(v)))
    };
    let first = nearest_codeword(top_right, candidates(), MAX_VERSION_DISTANCE);
    let second = nearest_codeword(bottom_left, candidates(), MAX_VERSION_DISTANCE);
    match (first, second) {
        (Some((a, da)), Some((b, db))) => Some(if db < da { b } else { a }),
        (Some((a, _)), None) => Some(a),
        (None, Some((b, _))) => Some(b),
        (None, None) => None,
    }
}
