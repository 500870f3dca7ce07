//! Mask selection penalty (four rules from the QR standard).

use crate::models::BitMatrix;

const PENALTY_N1: u32 = 3;
const PENALTY_N2: u32 = 3;
const PENALTY_N3: u32 = 40;
const PENALTY_N4: u32 = 10;

/// Total penalty of a fully drawn symbol (lower is better)
pub fn penalty_score(matrix: &BitMatrix) -> u32 {
    let size = matrix.width();
    let mut result = 0u32;

    for y in 0..size {
        result += line_penalty(size, |x| matrix.get(x, y));
    }
    for x in 0..size {
        result += line_penalty(size, |y| matrix.get(x, y));
    }

    for y in 0..size.saturating_sub(1) {
        for x in 0..size - 1 {
            let color = matrix.get(x, y);
            if color == matrix.get(x + 1, y)
                && color == matrix.get(x, y + 1)
                && color == matrix.get(x + 1, y + 1)
            {
                result += PENALTY_N2;
            }
        }
    }

    let total = (size * size) as i64;
    if total > 0 {
        let dark = matrix.count_ones() as i64;
        // steps of 5% away from an even split, rounded up
        let k = ((dark * 20 - total * 10).abs() + total - 1) / total - 1;
        result += k.max(0) as u32 * PENALTY_N4;
    }

    result
}

// Rules 1 and 3 along one row or column
fn line_penalty(size: usize, module: impl Fn(usize) -> bool) -> u32 {
    let mut result = 0u32;
    let mut run_color = false;
    let mut run_len = 0usize;
    let mut history = RunHistory::new(size);

    for i in 0..size {
        let color = module(i);
        if color == run_color {
            run_len += 1;
            if run_len == 5 {
                result += PENALTY_N1;
            } else if run_len > 5 {
                result += 1;
            }
        } else {
            history.push(run_len);
            if !run_color {
                result += history.finder_like() * PENALTY_N3;
            }
            run_color = color;
            run_len = 1;
        }
    }
    result + history.finish(run_color, run_len) * PENALTY_N3
}

/// The last seven run lengths of a line, newest first.
/// The light quiet zone around the symbol counts as part of the edge runs.
struct RunHistory {
    size: usize,
    runs: [usize; 7],
}

impl RunHistory {
    fn new(size: usize) -> Self {
        Self { size, runs: [0; 7] }
    }

    fn push(&mut self, mut run_len: usize) {
        if self.runs[0] == 0 {
            run_len += self.size;
        }
        self.runs.copy_within(0..6, 1);
        self.runs[0] = run_len;
    }

    // 1:1:3:1:1 dark core with 4 light modules on either side
    fn finder_like(&self) -> u32 {
        let r = &self.runs;
        let n = r[1];
        let core = n > 0 && r[2] == n && r[3] == n * 3 && r[4] == n && r[5] == n;
        u32::from(core && r[0] >= n * 4 && r[6] >= n) + u32::from(core && r[6] >= n * 4 && r[0] >= n)
    }

    fn finish(mut self, run_color: bool, mut run_len: usize) -> u32 {
        if run_color {
            self.push(run_len);
            run_len = 0;
        }
        run_len += self.size;
        self.push(run_len);
        self.finder_like()
    }
}
