//! Reed-Solomon coding over GF(256) for QR codewords.
//!
//! Field polynomial x^8 + x^4 + x^3 + x^2 + 1 (0x11D), generator roots
//! alpha^0 .. alpha^(n-1). Codewords are stored highest degree first, the
//! same order they appear in the symbol.

/// GF(256) field operations using log/exp tables
pub struct Gf256;

static LOG_TABLE: [u8; 256] = [
    0, 0, 1, 25, 2, 50, 26, 198, 3, 223, 51, 238, 27, 104, 199, 75, 4, 100, 224, 14, 52, 141, 239,
    129, 28, 193, 105, 248, 200, 8, 76, 113, 5, 138, 101, 47, 225, 36, 15, 33, 53, 147, 142, 218,
    240, 18, 130, 69, 29, 181, 194, 125, 106, 39, 249, 185, 201, 154, 9, 120, 77, 228, 114, 166, 6,
    191, 139, 98, 102, 221, 48, 253, 226, 152, 37, 179, 16, 145, 34, 136, 54, 208, 148, 206, 143,
    150, 219, 189, 241, 210, 19, 92, 131, 56, 70, 64, 30, 66, 182, 163, 195, 72, 126, 110, 107, 58,
    40, 84, 250, 133, 186, 61, 202, 94, 155, 159, 10, 21, 121, 43, 78, 212, 229, 172, 115, 243,
    167, 87, 7, 112, 192, 247, 140, 128, 99, 13, 103, 74, 222, 237, 49, 197, 254, 24, 227, 165,
    153, 119, 38, 184, 180, 124, 17, 68, 146, 217, 35, 32, 137, 46, 55, 63, 209, 91, 149, 188, 207,
    205, 144, 135, 151, 178, 220, 252, 190, 97, 242, 86, 211, 171, 20, 42, 93, 158, 132, 60, 57,
    83, 71, 109, 65, 162, 31, 45, 67, 216, 183, 123, 164, 118, 196, 23, 73, 236, 127, 12, 111, 246,
    108, 161, 59, 82, 41, 157, 85, 170, 251, 96, 134, 177, 187, 204, 62, 90, 203, 89, 95, 176, 156,
    169, 160, 81, 11, 245, 22, 235, 122, 117, 44, 215, 79, 174, 213, 233, 230, 231, 173, 232, 116,
    214, 244, 234, 168, 80, 88, 175,
];

static EXP_TABLE: [u8; 256] = [
    1, 2, 4, 8, 16, 32, 64, 128, 29, 58, 116, 232, 205, 135, 19, 38, 76, 152, 45, 90, 180, 117,
    234, 201, 143, 3, 6, 12, 24, 48, 96, 192, 157, 39, 78, 156, 37, 74, 148, 53, 106, 212, 181,
    119, 238, 193, 159, 35, 70, 140, 5, 10, 20, 40, 80, 160, 93, 186, 105, 210, 185, 111, 222, 161,
    95, 190, 97, 194, 153, 47, 94, 188, 101, 202, 137, 15, 30, 60, 120, 240, 253, 231, 211, 187,
    107, 214, 177, 127, 254, 225, 223, 163, 91, 182, 113, 226, 217, 175, 67, 134, 17, 34, 68, 136,
    13, 26, 52, 104, 208, 189, 103, 206, 129, 31, 62, 124, 248, 237, 199, 147, 59, 118, 236, 197,
    151, 51, 102, 204, 133, 23, 46, 92, 184, 109, 218, 169, 79, 158, 33, 66, 132, 21, 42, 84, 168,
    77, 154, 41, 82, 164, 85, 170, 73, 146, 57, 114, 228, 213, 183, 115, 230, 209, 191, 99, 198,
    145, 63, 126, 252, 229, 215, 179, 123, 246, 241, 255, 227, 219, 171, 75, 150, 49, 98, 196, 149,
    55, 110, 220, 165, 87, 174, 65, 130, 25, 50, 100, 200, 141, 7, 14, 28, 56, 112, 224, 221, 167,
    83, 166, 81, 162, 89, 178, 121, 242, 249, 239, 195, 155, 43, 86, 172, 69, 138, 9, 18, 36, 72,
    144, 61, 122, 244, 245, 247, 243, 251, 235, 203, 139, 11, 22, 44, 88, 176, 125, 250, 233, 207,
    131, 27, 54, 108, 216, 173, 71, 142, 1,
];

impl Gf256 {
    /// Product in GF(256)
    pub fn mul(a: u8, b: u8) -> u8 {
        if a == 0 || b == 0 {
            return 0;
        }
        let log_a = LOG_TABLE[a as usize] as usize;
        let log_b = LOG_TABLE[b as usize] as usize;
        EXP_TABLE[(log_a + log_b) % 255]
    }

    /// `a / b`, `None` when `b` is zero
    pub fn div(a: u8, b: u8) -> Option<u8> {
        if b == 0 {
            return None;
        }
        if a == 0 {
            return Some(0);
        }
        let log_a = LOG_TABLE[a as usize] as usize;
        let log_b = LOG_TABLE[b as usize] as usize;
        Some(EXP_TABLE[(log_a + 255 - log_b) % 255])
    }

    /// alpha^n for any exponent; negative exponents wrap
    pub fn exp(n: isize) -> u8 {
        EXP_TABLE[n.rem_euclid(255) as usize]
    }

    /// Evaluate a polynomial stored lowest degree first
    fn eval_ascending(poly: &[u8], x: u8) -> u8 {
        poly.iter()
            .rev()
            .fold(0u8, |acc, &coeff| Self::mul(acc, x) ^ coeff)
    }
}

/// Reasons a block cannot be repaired
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RsError {
    /// The error locator degree exceeds what the EC codewords can fix
    #[error("at least {estimated} errors, block corrects {capacity}")]
    TooManyErrors { estimated: usize, capacity: usize },
    /// The locator does not split into distinct in-range roots
    #[error("error locator of degree {degree} has {roots} roots in the block")]
    LocatorMismatch { degree: usize, roots: usize },
    /// Syndromes stay non-zero after applying the correction
    #[error("residual syndrome after correction")]
    Residual { estimated: usize },
    /// Block longer than the field allows
    #[error("block of {0} codewords exceeds 255")]
    BlockTooLong(usize),
}

impl RsError {
    /// Lower bound on the number of corrupted codewords
    pub fn estimated_errors(&self) -> usize {
        match *self {
            RsError::TooManyErrors { estimated, .. } => estimated,
            RsError::LocatorMismatch { degree, .. } => degree,
            RsError::Residual { estimated } => estimated,
            RsError::BlockTooLong(_) => 0,
        }
    }
}

/// Systematic encoder producing EC codewords for one block
#[derive(Debug, Clone)]
pub struct ReedSolomonEncoder {
    // Generator coefficients, highest degree first, monic term omitted
    generator: Vec<u8>,
}

impl ReedSolomonEncoder {
    /// Encoder producing `degree` EC codewords per block
    pub fn new(degree: usize) -> Self {
        let mut generator = vec![0u8; degree];
        if let Some(last) = generator.last_mut() {
            *last = 1;
        }
        let mut root = 1u8;
        for _ in 0..degree {
            for j in 0..degree {
                generator[j] = Gf256::mul(generator[j], root);
                if j + 1 < degree {
                    generator[j] ^= generator[j + 1];
                }
            }
            root = Gf256::mul(root, 0x02);
        }
        Self { generator }
    }

    /// EC codewords per block
    pub fn degree(&self) -> usize {
        self.generator.len()
    }

    /// EC codewords for `data`: the remainder of data * x^n divided by the generator
    pub fn remainder(&self, data: &[u8]) -> Vec<u8> {
        let n = self.degree();
        let mut result = vec![0u8; n];
        if n == 0 {
            return result;
        }
        for &byte in data {
            let factor = byte ^ result[0];
            result.rotate_left(1);
            result[n - 1] = 0;
            for (r, &g) in result.iter_mut().zip(&self.generator) {
                *r ^= Gf256::mul(g, factor);
            }
        }
        result
    }
}

/// Reed-Solomon decoder for QR codes
#[derive(Debug, Clone, Copy)]
pub struct ReedSolomonDecoder {
    num_ecc_codewords: usize,
}

impl ReedSolomonDecoder {
    /// Decoder for blocks carrying `num_ecc_codewords` EC codewords
    pub fn new(num_ecc_codewords: usize) -> Self {
        Self { num_ecc_codewords }
    }

    /// Errors one block can always correct
    pub fn capacity(&self) -> usize {
        self.num_ecc_codewords / 2
    }

    /// Correct `received` in place; returns how many codewords were repaired
    pub fn decode(&self, received: &mut [u8]) -> Result<usize, RsError> {
        let n = received.len();
        if n > 255 {
            return Err(RsError::BlockTooLong(n));
        }

        let syndromes = self.syndromes(received);
        if syndromes.iter().all(|&s| s == 0) {
            return Ok(0);
        }

        let locator = berlekamp_massey(&syndromes);
        let degree = locator.len() - 1;
        if degree > self.capacity() {
            return Err(RsError::TooManyErrors {
                estimated: degree,
                capacity: self.capacity(),
            });
        }

        // Chien search: position j holds x^(n-1-j), so its root is alpha^-(n-1-j)
        let positions: Vec<usize> = (0..n)
            .filter(|&j| {
                let x_inv = Gf256::exp(-((n - 1 - j) as isize));
                Gf256::eval_ascending(&locator, x_inv) == 0
            })
            .collect();
        if positions.len() != degree {
            return Err(RsError::LocatorMismatch {
                degree,
                roots: positions.len(),
            });
        }

        // Forney with first consecutive root alpha^0: e = X * omega(X^-1) / locator'(X^-1)
        let mut omega = vec![0u8; syndromes.len()];
        for (i, &s) in syndromes.iter().enumerate() {
            for (j, &l) in locator.iter().enumerate() {
                if i + j < omega.len() {
                    omega[i + j] ^= Gf256::mul(s, l);
                }
            }
        }
        let derivative: Vec<u8> = locator
            .iter()
            .enumerate()
            .skip(1)
            .map(|(i, &c)| if i % 2 == 1 { c } else { 0 })
            .collect();

        for &pos in &positions {
            let exponent = (n - 1 - pos) as isize;
            let x = Gf256::exp(exponent);
            let x_inv = Gf256::exp(-exponent);
            let numerator = Gf256::mul(x, Gf256::eval_ascending(&omega, x_inv));
            let denominator = Gf256::eval_ascending(&derivative, x_inv);
            let magnitude =
                Gf256::div(numerator, denominator).ok_or(RsError::LocatorMismatch {
                    degree,
                    roots: positions.len(),
                })?;
            received[pos] ^= magnitude;
        }

        if self.syndromes(received).iter().any(|&s| s != 0) {
            return Err(RsError::Residual { estimated: degree });
        }
        Ok(degree)
    }

    fn syndromes(&self, received: &[u8]) -> Vec<u8> {
        (0..self.num_ecc_codewords)
            .map(|i| {
                let alpha_i = Gf256::exp(i as isize);
                received
                    .iter()
                    .fold(0u8, |acc, &c| Gf256::mul(acc, alpha_i) ^ c)
            })
            .collect()
    }
}

/// Error locator polynomial, lowest degree first
fn berlekamp_massey(syndromes: &[u8]) -> Vec<u8> {
    let mut current = vec![1u8];
    let mut previous = vec![1u8];
    let mut length = 0usize;
    let mut shift = 1usize;
    let mut previous_discrepancy = 1u8;

    for n in 0..syndromes.len() {
        let mut discrepancy = syndromes[n];
        for i in 1..=length.min(current.len() - 1) {
            discrepancy ^= Gf256::mul(current[i], syndromes[n - i]);
        }

        if discrepancy == 0 {
            shift += 1;
            continue;
        }

        // previous_discrepancy is never zero once assigned
        let coef = Gf256::div(discrepancy, previous_discrepancy).unwrap_or(0);
        let mut next = current.clone();
        if next.len() < previous.len() + shift {
            next.resize(previous.len() + shift, 0);
        }
        for (i, &b) in previous.iter().enumerate() {
            next[i + shift] ^= Gf256::mul(coef, b);
        }

        if 2 * length <= n {
            length = n + 1 - length;
            previous = std::mem::replace(&mut current, next);
            previous_discrepancy = discrepancy;
            shift = 1;
        } else {
            current = next;
            shift += 1;
        }
    }

    current.truncate(length + 1);
    current
}
