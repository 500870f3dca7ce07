use crate::common::format::FormatInfo;
use crate::common::function_mask::{FunctionMask, alignment_centers};
use crate::common::version::write_version_info;
use crate::models::{BitMatrix, ECLevel, MaskPattern, Version};

/// Draw finders, separators, timing, alignment and version patterns.
///
/// Format modules get a placeholder (level, mask 0); the encoder rewrites them
/// once the mask is chosen.
pub fn draw_function_patterns(matrix: &mut BitMatrix, version: Version, ec_level: ECLevel) {
    let size = version.size();

    for i in 0..size {
        matrix.set(6, i, i % 2 == 0);
        matrix.set(i, 6, i % 2 == 0);
    }

    for (cx, cy) in [(3, 3), (size - 4, 3), (3, size - 4)] {
        draw_finder(matrix, cx, cy);
    }

    for (cx, cy) in alignment_centers(version) {
        for dy in -2isize..=2 {
            for dx in -2isize..=2 {
                let ring = dx.abs().max(dy.abs());
                let x = (cx as isize + dx) as usize;
                let y = (cy as isize + dy) as usize;
                matrix.set(x, y, ring != 1);
            }
        }
    }

    FormatInfo::new(ec_level, MaskPattern::Pattern0).write(matrix);
    write_version_info(matrix, version);
}

// 7x7 finder plus its one-module light separator, clipped at the edges
fn draw_finder(matrix: &mut BitMatrix, cx: usize, cy: usize) {
    for dy in -4isize..=4 {
        for dx in -4isize..=4 {
            let x = cx as isize + dx;
            let y = cy as isize + dy;
            if x < 0 || y < 0 {
                continue;
            }
            let ring = dx.abs().max(dy.abs());
            matrix.set(x as usize, y as usize, ring != 2 && ring != 4);
        }
    }
}

/// Lay the interleaved codewords along the zig-zag path, MSB first.
/// Remainder modules past the last codeword stay light.
pub fn place_codewords(matrix: &mut BitMatrix, func: &FunctionMask, codewords: &[u8]) {
    let total_bits = codewords.len() * 8;
    for (i, (x, y)) in func.data_module_positions().into_iter().enumerate() {
        let bit = i < total_bits && (codewords[i >> 3] >> (7 - (i & 7))) & 1 == 1;
        matrix.set(x, y, bit);
    }
}
