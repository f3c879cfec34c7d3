use crate::types::{MetricsError, Result};
use crate::utils::{solve_profile, validate_signal, ProfileMatrix};

const DEGREE: usize = 2;

/// Quadratic interpolating B-spline through the points (i, values\[i\]).
///
/// Knots are x₀ (three times), the midpoints (xᵢ + xᵢ₊₁)/2 for
/// i = 1..n-3, and x_{n-1} (three times): Greville sites with the second
/// and second-to-last midpoints dropped, so the spline has exactly n
/// coefficients and passes through every sample.
#[derive(Debug, Clone)]
pub struct QuadraticSpline {
    knots: Vec<f64>,
    coefs: Vec<f64>,
}

impl QuadraticSpline {
    /// Fit the spline to samples located at 0, 1, ..., n-1.
    pub fn fit(values: &[f64]) -> Result<Self> {
        let n = values.len();
        if n < DEGREE + 1 {
            return Err(MetricsError::InsufficientData(format!(
                "quadratic interpolation needs at least {} points, got {n}",
                DEGREE + 1
            )));
        }
        validate_signal(values, DEGREE + 1, "interpolated signal")?;

        let knots = build_knots(n);

        // Collocation system: row i holds the basis functions active at x = i.
        let rows: Vec<(usize, Vec<f64>)> = (0..n)
            .map(|i| {
                let x = i as f64;
                let span = find_span(&knots, n, x);
                (span - DEGREE, basis_functions(&knots, span, x).to_vec())
            })
            .collect();
        let coefs = solve_profile(&ProfileMatrix::new(rows), values)?;

        tracing::trace!(n_points = n, n_knots = knots.len(), "fitted quadratic spline");

        Ok(Self { knots, coefs })
    }

    /// Number of samples the spline was fitted to.
    pub fn len(&self) -> usize {
        self.coefs.len()
    }

    /// Whether the spline has no coefficients (never true for a fitted spline).
    pub fn is_empty(&self) -> bool {
        self.coefs.is_empty()
    }

    /// Evaluate the spline at `x`. Points outside `[0, n-1]` are
    /// extrapolated from the boundary polynomial pieces.
    pub fn eval(&self, x: f64) -> f64 {
        let n = self.coefs.len();
        let span = find_span(&self.knots, n, x);
        let basis = basis_functions(&self.knots, span, x);
        basis
            .iter()
            .enumerate()
            .map(|(r, b)| b * self.coefs[span - DEGREE + r])
            .sum()
    }
}

/// Upsample a signal by an integer rate using quadratic interpolation.
///
/// The spline is evaluated at k / rate for k = 0 .. (n-1)·rate - 1, i.e. on
/// the fractional grid from 0 up to but excluding the last sample index.
pub fn interpolate(signal: &[f64], rate: usize) -> Result<Vec<f64>> {
    if rate == 0 {
        return Err(MetricsError::InvalidInput(
            "interpolation rate must be positive".into(),
        ));
    }
    let spline = QuadraticSpline::fit(signal)?;
    let n_points = (signal.len() - 1).checked_mul(rate).ok_or_else(|| {
        MetricsError::InvalidInput(format!(
            "interpolation rate {rate} overflows the output length"
        ))
    })?;
    let step = rate as f64;
    Ok((0..n_points)
        .map(|k| spline.eval(k as f64 / step))
        .collect())
}

fn build_knots(n: usize) -> Vec<f64> {
    let last = (n - 1) as f64;
    let mut knots = Vec::with_capacity(n + DEGREE + 1);
    knots.extend([0.0; DEGREE + 1]);
    knots.extend((1..n.saturating_sub(2)).map(|i| i as f64 + 0.5));
    knots.extend([last; DEGREE + 1]);
    knots
}

/// Index `l` of the knot interval t\[l\] <= x < t\[l+1\], clamped to the
/// valid range [degree, n-1] so the end point uses the last interval.
fn find_span(knots: &[f64], n: usize, x: f64) -> usize {
    knots
        .partition_point(|&t| t <= x)
        .saturating_sub(1)
        .clamp(DEGREE, n - 1)
}

/// Non-zero B-spline basis values N_{span-2..=span, 2}(x) (Cox-de Boor).
fn basis_functions(knots: &[f64], span: usize, x: f64) -> [f64; DEGREE + 1] {
    let mut basis = [0.0; DEGREE + 1];
    let mut left = [0.0; DEGREE + 1];
    let mut right = [0.0; DEGREE + 1];
    basis[0] = 1.0;
    for j in 1..=DEGREE {
        left[j] = x - knots[span + 1 - j];
        right[j] = knots[span + j] - x;
        let mut saved = 0.0;
        for r in 0..j {
            let temp = basis[r] / (right[r + 1] + left[j - r]);
            basis[r] = saved + right[r + 1] * temp;
            saved = left[j - r] * temp;
        }
        basis[j] = saved;
    }
    basis
}
