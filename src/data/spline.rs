use thiserror::Error;

// ---------------------------------------------------------------------------
// Bounded cubic interpolant
// ---------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq)]
pub enum SplineError {
    #[error("x and y have different lengths ({x} vs {y})")]
    LengthMismatch { x: usize, y: usize },

    #[error("need at least 2 points to interpolate, got {0}")]
    TooFewPoints(usize),

    #[error("x values must be strictly ascending (index {0})")]
    NotAscending(usize),

    #[error("non-finite value at index {0}")]
    NonFinite(usize),
}

/// Not-a-knot cubic spline that never extrapolates.
///
/// Inside `[x_first, x_last]` the spline passes through every knot with C²
/// continuity. Any query outside that domain (or a NaN query) yields the
/// configured `fill` value instead of an error.
#[derive(Debug, Clone)]
pub struct BoundedSpline {
    x: Vec<f64>,
    /// `[a, b, c, d]` for each segment: a + b·dx + c·dx² + d·dx³
    coeffs: Vec<[f64; 4]>,
    fill: f64,
}

impl BoundedSpline {
    /// Build the spline over knots given in ascending `x` order.
    ///
    /// The input order is trusted: no re-sort is performed, and a descending
    /// or repeated `x` is rejected.
    pub fn new(x: Vec<f64>, y: Vec<f64>, fill: f64) -> Result<Self, SplineError> {
        if x.len() != y.len() {
            return Err(SplineError::LengthMismatch {
                x: x.len(),
                y: y.len(),
            });
        }
        if x.len() < 2 {
            return Err(SplineError::TooFewPoints(x.len()));
        }
        if let Some(i) = x
            .iter()
            .zip(&y)
            .position(|(xi, yi)| !xi.is_finite() || !yi.is_finite())
        {
            return Err(SplineError::NonFinite(i));
        }
        if let Some(i) = (1..x.len()).find(|&i| x[i] <= x[i - 1]) {
            return Err(SplineError::NotAscending(i));
        }

        let coeffs = not_a_knot_coefficients(&x, &y);
        Ok(Self { x, coeffs, fill })
    }

    /// Domain covered by the knots.
    pub fn domain(&self) -> (f64, f64) {
        (self.x[0], self.x[self.x.len() - 1])
    }

    pub fn fill(&self) -> f64 {
        self.fill
    }

    pub fn evaluate(&self, x: f64) -> f64 {
        let (lo, hi) = self.domain();
        // NaN fails both comparisons and lands here too.
        if !(x >= lo && x <= hi) {
            return self.fill;
        }

        let segment = self.find_segment(x);
        let dx = x - self.x[segment];
        let [a, b, c, d] = self.coeffs[segment];
        a + b * dx + c * dx * dx + d * dx * dx * dx
    }

    /// Evaluate at every point of `xs`.
    pub fn sample(&self, xs: &[f64]) -> Vec<f64> {
        xs.iter().map(|&x| self.evaluate(x)).collect()
    }

    /// Index of the left knot of the segment containing `x` (binary search).
    fn find_segment(&self, x: f64) -> usize {
        let mut left = 0;
        let mut right = self.x.len() - 1;
        while left + 1 < right {
            let mid = (left + right) / 2;
            if x < self.x[mid] {
                right = mid;
            } else {
                left = mid;
            }
        }
        left
    }
}

/// Not-a-knot cubic spline coefficients: the third derivative is continuous
/// at `x[1]` and `x[n-2]`, so with 4 knots this is the single cubic through
/// them. Three knots give the parabola through them, two a straight line.
fn not_a_knot_coefficients(x: &[f64], y: &[f64]) -> Vec<[f64; 4]> {
    let n = x.len();
    let h: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();
    let slope: Vec<f64> = (0..n - 1).map(|i| (y[i + 1] - y[i]) / h[i]).collect();

    // Second derivative at every knot.
    let m: Vec<f64> = match n {
        2 => vec![0.0; 2],
        3 => vec![2.0 * (slope[1] - slope[0]) / (x[2] - x[0]); 3],
        _ => not_a_knot_second_derivatives(&h, &slope),
    };

    (0..n - 1)
        .map(|j| {
            let b = slope[j] - h[j] * (2.0 * m[j] + m[j + 1]) / 6.0;
            let d = (m[j + 1] - m[j]) / (6.0 * h[j]);
            [y[j], b, m[j] / 2.0, d]
        })
        .collect()
}

/// Solve for the second derivatives with the end knots' conditions folded
/// into the first and last interior rows (Thomas algorithm). Needs n ≥ 4.
fn not_a_knot_second_derivatives(h: &[f64], slope: &[f64]) -> Vec<f64> {
    let n = h.len() + 1;
    let size = n - 2;

    // Interior rows: h[i-1]·M[i-1] + 2(h[i-1]+h[i])·M[i] + h[i]·M[i+1] = 6(s[i]-s[i-1])
    let mut sub: Vec<f64> = (1..n - 1).map(|i| h[i - 1]).collect();
    let mut diag: Vec<f64> = (1..n - 1).map(|i| 2.0 * (h[i - 1] + h[i])).collect();
    let mut sup: Vec<f64> = (1..n - 1).map(|i| h[i]).collect();
    let mut rhs: Vec<f64> = (1..n - 1).map(|i| 6.0 * (slope[i] - slope[i - 1])).collect();

    // M[0] = ((h0+h1)·M[1] - h0·M[2]) / h1
    let (h0, h1) = (h[0], h[1]);
    sub[0] = 0.0;
    diag[0] = (h0 + h1) * (h0 + 2.0 * h1) / h1;
    sup[0] = (h1 * h1 - h0 * h0) / h1;

    // M[n-1] = ((a+b)·M[n-2] - b·M[n-3]) / a
    let (a, b) = (h[n - 3], h[n - 2]);
    let last = size - 1;
    sub[last] = (a * a - b * b) / a;
    diag[last] = (a + b) * (2.0 * a + b) / a;
    sup[last] = 0.0;

    for k in 1..size {
        let w = sub[k] / diag[k - 1];
        diag[k] -= w * sup[k - 1];
        rhs[k] -= w * rhs[k - 1];
    }
    let mut interior = vec![0.0; size];
    interior[last] = rhs[last] / diag[last];
    for k in (0..last).rev() {
        interior[k] = (rhs[k] - sup[k] * interior[k + 1]) / diag[k];
    }

    let first = ((h0 + h1) * interior[0] - h0 * interior[1]) / h1;
    let end = ((a + b) * interior[last] - b * interior[last - 1]) / a;

    let mut m = Vec::with_capacity(n);
    m.push(first);
    m.extend(interior);
    m.push(end);
    m
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const FILL: f64 = 1e-4;

    #[test]
    fn passes_through_knots() {
        let x = vec![0.3, 0.5, 0.6, 0.9, 1.0];
        let y = vec![0.1, 0.8, 0.85, 0.4, 0.2];
        let spline = BoundedSpline::new(x.clone(), y.clone(), FILL).unwrap();
        for (xi, yi) in x.iter().zip(&y) {
            assert_relative_eq!(spline.evaluate(*xi), *yi, epsilon = 1e-12);
        }
    }

    #[test]
    fn two_points_is_linear() {
        let spline = BoundedSpline::new(vec![0.0, 1.0], vec![0.0, 1.0], FILL).unwrap();
        assert_relative_eq!(spline.evaluate(0.25), 0.25, epsilon = 1e-12);
        assert_relative_eq!(spline.evaluate(0.75), 0.75, epsilon = 1e-12);
    }

    #[test]
    fn four_knots_give_the_interpolating_cubic() {
        // Lagrange cubic through (0.4, 0.1), (0.5, 0.2), (0.6, 0.5), (0.7, 0.9).
        let spline = BoundedSpline::new(
            vec![0.4, 0.5, 0.6, 0.7],
            vec![0.1, 0.2, 0.5, 0.9],
            FILL,
        )
        .unwrap();
        assert_relative_eq!(spline.evaluate(0.45), 0.11875, epsilon = 1e-12);
        assert_relative_eq!(spline.evaluate(0.55), 0.33125, epsilon = 1e-12);
        assert_relative_eq!(spline.evaluate(0.65), 0.69375, epsilon = 1e-12);
    }

    #[test]
    fn reproduces_cubic_data_exactly() {
        let cubic = |x: f64| 0.2 + 0.5 * x - 1.5 * x * x + 0.8 * x * x * x;
        let x: Vec<f64> = vec![0.3, 0.45, 0.5, 0.7, 0.75, 1.1];
        let y: Vec<f64> = x.iter().map(|&v| cubic(v)).collect();
        let spline = BoundedSpline::new(x, y, FILL).unwrap();
        for q in [0.31, 0.48, 0.6, 0.74, 0.9, 1.05] {
            assert_relative_eq!(spline.evaluate(q), cubic(q), epsilon = 1e-10);
        }
    }

    #[test]
    fn three_knots_give_the_parabola() {
        let parabola = |x: f64| 1.0 - 2.0 * (x - 0.6) * (x - 0.6);
        let x = vec![0.3, 0.5, 0.9];
        let y: Vec<f64> = x.iter().map(|&v| parabola(v)).collect();
        let spline = BoundedSpline::new(x, y, FILL).unwrap();
        assert_relative_eq!(spline.evaluate(0.7), parabola(0.7), epsilon = 1e-12);
        assert_relative_eq!(spline.evaluate(0.4), parabola(0.4), epsilon = 1e-12);
    }

    #[test]
    fn reproduces_linear_data_exactly() {
        let x: Vec<f64> = (0..6).map(|i| i as f64 * 0.1).collect();
        let y: Vec<f64> = x.iter().map(|v| 0.5 * v + 0.1).collect();
        let spline = BoundedSpline::new(x, y, FILL).unwrap();
        assert_relative_eq!(spline.evaluate(0.33), 0.5 * 0.33 + 0.1, epsilon = 1e-12);
    }

    #[test]
    fn out_of_domain_returns_fill() {
        let spline = BoundedSpline::new(vec![0.4, 0.5, 0.6], vec![0.2, 0.9, 0.3], FILL).unwrap();
        assert_eq!(spline.evaluate(0.1), FILL);
        assert_eq!(spline.evaluate(0.61), FILL);
        assert_eq!(spline.evaluate(f64::NAN), FILL);
        assert_eq!(spline.evaluate(f64::INFINITY), FILL);
        assert!(spline.evaluate(0.1) > 0.0);
    }

    #[test]
    fn rejects_unsorted_or_short_input() {
        assert_eq!(
            BoundedSpline::new(vec![0.5, 0.4, 0.6], vec![0.0; 3], FILL).unwrap_err(),
            SplineError::NotAscending(1)
        );
        assert_eq!(
            BoundedSpline::new(vec![0.5, 0.5], vec![0.0; 2], FILL).unwrap_err(),
            SplineError::NotAscending(1)
        );
        assert_eq!(
            BoundedSpline::new(vec![0.5], vec![0.0], FILL).unwrap_err(),
            SplineError::TooFewPoints(1)
        );
        assert!(matches!(
            BoundedSpline::new(vec![0.5, 0.6], vec![0.0], FILL),
            Err(SplineError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn sample_covers_every_point() {
        let spline = BoundedSpline::new(vec![0.4, 0.6], vec![0.5, 0.5], FILL).unwrap();
        let out = spline.sample(&[0.3, 0.4, 0.5, 0.6, 0.7]);
        assert_eq!(out, vec![FILL, 0.5, 0.5, 0.5, FILL]);
    }
}
