//! Planar homography between module space and image space

use crate::models::Point;

/// 3x3 projective transform with `a33` normalised to 1
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerspectiveTransform {
    a11: f64,
    a12: f64,
    a13: f64,
    a21: f64,
    a22: f64,
    a23: f64,
    a31: f64,
    a32: f64,
}

impl PerspectiveTransform {
    /// Transform taking each `src[i]` onto `dst[i]`.
    ///
    /// `None` when three of the points are collinear or the system is
    /// otherwise singular.
    pub fn from_points(src: &[Point; 4], dst: &[Point; 4]) -> Option<Self> {
        let mut a = [[0.0f64; 8]; 8];
        let mut b = [0.0f64; 8];

        for (i, (s, d)) in src.iter().zip(dst.iter()).enumerate() {
            let row = i * 2;
            a[row] = [s.x, s.y, 1.0, 0.0, 0.0, 0.0, -d.x * s.x, -d.x * s.y];
            b[row] = d.x;
            a[row + 1] = [0.0, 0.0, 0.0, s.x, s.y, 1.0, -d.y * s.x, -d.y * s.y];
            b[row + 1] = d.y;
        }

        let h = solve_linear_system(a, b)?;
        let transform = Self {
            a11: h[0],
            a12: h[1],
            a13: h[2],
            a21: h[3],
            a22: h[4],
            a23: h[5],
            a31: h[6],
            a32: h[7],
        };
        h.iter().all(|v| v.is_finite()).then_some(transform)
    }

    /// Map a point; the result is non-finite on the line at infinity
    pub fn transform(&self, p: &Point) -> Point {
        let denominator = self.a31 * p.x + self.a32 * p.y + 1.0;
        if denominator.abs() < 1e-12 {
            return Point::new(f64::INFINITY, f64::INFINITY);
        }
        Point::new(
            (self.a11 * p.x + self.a12 * p.y + self.a13) / denominator,
            (self.a21 * p.x + self.a22 * p.y + self.a23) / denominator,
        )
    }
}

/// Gaussian elimination with partial pivoting
#[allow(clippy::needless_range_loop)]
fn solve_linear_system(mut a: [[f64; 8]; 8], mut b: [f64; 8]) -> Option<[f64; 8]> {
    let n = 8;

    for i in 0..n {
        let mut max_row = i;
        for k in (i + 1)..n {
            if a[k][i].abs() > a[max_row][i].abs() {
                max_row = k;
            }
        }
        if a[max_row][i].abs() < 1e-12 {
            return None;
        }
        a.swap(i, max_row);
        b.swap(i, max_row);

        for k in (i + 1)..n {
            let factor = a[k][i] / a[i][i];
            b[k] -= factor * b[i];
            for j in i..n {
                a[k][j] -= factor * a[i][j];
            }
        }
    }

    let mut x = [0.0f64; 8];
    for i in (0..n).rev() {
        let mut sum = b[i];
        for j in (i + 1)..n {
            sum -= a[i][j] * x[j];
        }
        x[i] = sum / a[i][i];
    }
    Some(x)
}
