use crate::common::reed_solomon::ReedSolomonDecoder;
use crate::common::tables::ec_block_info;
use crate::models::{CorruptDetail, CorruptStage, ECLevel, Version};

/// Data codewords after correction
pub(super) struct Corrected {
    pub data: Vec<u8>,
    pub errors: usize,
}

/// Undo the column-wise interleave (short blocks first) and run Reed-Solomon
/// on every block. Blocks that cannot be repaired are counted, not skipped.
pub(super) fn correct_blocks(
    codewords: &[u8],
    version: Version,
    ec_level: ECLevel,
) -> Result<Corrected, CorruptDetail> {
    let info = ec_block_info(version, ec_level);
    let rs = ReedSolomonDecoder::new(info.ecc_per_block);
    let failure = |failed_blocks, max_block_errors| CorruptDetail {
        stage: CorruptStage::ErrorCorrection,
        version: Some(version.number()),
        ec_level: Some(ec_level),
        failed_blocks,
        total_blocks: info.num_blocks,
        max_block_errors,
        correctable_per_block: rs.capacity(),
    };

    let total = codewords.len();
    let ecc_total = info.num_blocks * info.ecc_per_block;
    if total <= ecc_total {
        return Err(failure(info.num_blocks, 0));
    }
    let data_total = total - ecc_total;
    let num_long_blocks = data_total % info.num_blocks;
    let num_short_blocks = info.num_blocks - num_long_blocks;
    let short_len = data_total / info.num_blocks;
    let data_len = |b: usize| if b < num_short_blocks { short_len } else { short_len + 1 };

    let mut blocks: Vec<Vec<u8>> = (0..info.num_blocks)
        .map(|_| Vec::with_capacity(short_len + 1 + info.ecc_per_block))
        .collect();
    let mut stream = codewords.iter().copied();
    for i in 0..=short_len {
        for (b, block) in blocks.iter_mut().enumerate() {
            if i < data_len(b) {
                block.extend(stream.next());
            }
        }
    }
    for _ in 0..info.ecc_per_block {
        for block in blocks.iter_mut() {
            block.extend(stream.next());
        }
    }

    let mut failed = 0;
    let mut max_errors = 0;
    let mut corrected = 0;
    for block in blocks.iter_mut() {
        match rs.decode(block) {
            Ok(repaired) => {
                corrected += repaired;
                max_errors = max_errors.max(repaired);
            }
            Err(err) => {
                failed += 1;
                max_errors = max_errors.max(err.estimated_errors());
            }
        }
    }
    if failed > 0 {
        return Err(failure(failed, max_errors));
    }

    let mut data = Vec::with_capacity(data_total);
    for (b, block) in blocks.iter().enumerate() {
        data.extend_from_slice(&block[..data_len(b)]);
    }
    Ok(Corrected {
        data,
        errors: corrected,
    })
}
