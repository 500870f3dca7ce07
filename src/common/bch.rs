/// BCH codes protecting format (15,5) and version (18,6) information

/// Append the `degree`-bit BCH remainder of `data` under `generator`
pub fn bch_encode(data: u32, generator: u32, degree: u32) -> u32 {
    let mut rem = data;
    for _ in 0..degree {
        rem = (rem << 1) ^ ((rem >> (degree - 1)) * generator);
    }
    (data << degree) | (rem & ((1 << degree) - 1))
}

/// Closest valid codeword to `received`, accepted within `max_distance` bits.
///
/// `candidates` yields `(value, codeword)`; ties keep the first candidate.
pub fn nearest_codeword<T: Copy>(
    received: u32,
    candidates: impl IntoIterator<Item = (T, u32)>,
    max_distance: u32,
) -> Option<(T, u32)> {
    let mut best: Option<(T, u32)> = None;
    for (value, code) in candidates {
        let distance = (received ^ code).count_ones();
        match best {
            Some((_, d)) if distance >= d => {}
            _ => best = Some((value, distance)),
        }
    }
    best.filter(|&(_, d)| d <= max_distance)
}
