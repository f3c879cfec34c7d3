use faer::Mat;

use crate::types::{MetricsError, Result};

/// Validate that a matrix meets minimum dimension requirements and contains no NaN/Inf.
pub fn validate_matrix(x: &Mat<f64>, min_rows: usize, min_cols: usize) -> Result<()> {
    let (rows, cols) = (x.nrows(), x.ncols());
    if rows < min_rows {
        return Err(MetricsError::InvalidInput(format!(
            "matrix has {rows} rows, need at least {min_rows}"
        )));
    }
    if cols < min_cols {
        return Err(MetricsError::InvalidInput(format!(
            "matrix has {cols} columns, need at least {min_cols}"
        )));
    }
    for j in 0..cols {
        for i in 0..rows {
            if !x[(i, j)].is_finite() {
                return Err(MetricsError::InvalidInput(
                    "matrix contains NaN or Inf values".to_string(),
                ));
            }
        }
    }
    Ok(())
}

/// Validate that a matrix is square and finite.
pub fn validate_square(x: &Mat<f64>) -> Result<()> {
    validate_matrix(x, 1, 1)?;
    if x.nrows() != x.ncols() {
        return Err(MetricsError::InvalidInput(format!(
            "matrix is {}x{}, expected a square matrix",
            x.nrows(),
            x.ncols()
        )));
    }
    Ok(())
}

/// Validate that a signal has at least `min_len` samples and no NaN/Inf.
pub fn validate_signal(x: &[f64], min_len: usize, what: &str) -> Result<()> {
    if x.len() < min_len {
        return Err(MetricsError::InvalidInput(format!(
            "{what} has {} samples, need at least {min_len}",
            x.len()
        )));
    }
    if x.iter().any(|v| !v.is_finite()) {
        return Err(MetricsError::InvalidInput(format!(
            "{what} contains NaN or Inf values"
        )));
    }
    Ok(())
}

/// Arithmetic mean (0.0 for an empty slice).
pub fn mean(x: &[f64]) -> f64 {
    if x.is_empty() {
        return 0.0;
    }
    x.iter().sum::<f64>() / x.len() as f64
}

/// Unbiased sample variance (n - 1 denominator).
pub fn sample_variance(x: &[f64]) -> f64 {
    let n = x.len();
    if n < 2 {
        return 0.0;
    }
    let mu = mean(x);
    x.iter().map(|v| (v - mu) * (v - mu)).sum::<f64>() / (n - 1) as f64
}

/// Column means of a matrix (mean over rows, i.e. over time).
pub fn column_means(x: &Mat<f64>) -> Vec<f64> {
    let (nrows, ncols) = (x.nrows(), x.ncols());
    let mut means = vec![0.0; ncols];
    for j in 0..ncols {
        let mut sum = 0.0;
        for i in 0..nrows {
            sum += x[(i, j)];
        }
        means[j] = sum / nrows as f64;
    }
    means
}

/// Copy column `j` of a matrix into a vector.
pub fn column(x: &Mat<f64>, j: usize) -> Vec<f64> {
    (0..x.nrows()).map(|i| x[(i, j)]).collect()
}

/// Stack matrices with equal column counts along the row (time) axis.
pub fn stack_rows(blocks: &[Mat<f64>]) -> Result<Mat<f64>> {
    let ncols = match blocks.first() {
        Some(b) => b.ncols(),
        None => return Err(MetricsError::InvalidInput("empty batch".into())),
    };
    if blocks.iter().any(|b| b.ncols() != ncols) {
        return Err(MetricsError::InvalidInput(
            "batch elements have different numbers of columns".into(),
        ));
    }
    let nrows: usize = blocks.iter().map(|b| b.nrows()).sum();
    let mut out = Mat::<f64>::zeros(nrows, ncols);
    let mut offset = 0;
    for b in blocks {
        for j in 0..ncols {
            for i in 0..b.nrows() {
                out[(offset + i, j)] = b[(i, j)];
            }
        }
        offset += b.nrows();
    }
    Ok(out)
}

/// A square matrix stored by row profile: row `i` holds the contiguous
/// columns `first[i] ..= first[i] + values[i].len() - 1`.
///
/// Rows must have nondecreasing first and last columns, which keeps
/// elimination fill-in inside the profile.
#[derive(Debug, Clone)]
pub struct ProfileMatrix {
    rows: Vec<(usize, Vec<f64>)>,
}

impl ProfileMatrix {
    pub fn new(rows: Vec<(usize, Vec<f64>)>) -> Self {
        Self { rows }
    }

    pub fn dim(&self) -> usize {
        self.rows.len()
    }

    fn last(&self, i: usize) -> usize {
        let (first, vals) = &self.rows[i];
        first + vals.len() - 1
    }

    fn get(&self, i: usize, j: usize) -> f64 {
        let (first, vals) = &self.rows[i];
        if j < *first {
            return 0.0;
        }
        vals.get(j - first).copied().unwrap_or(0.0)
    }
}

/// Solve `Ax = b` for a profile-stored matrix by Gaussian elimination
/// without pivoting.
///
/// Only valid for matrices that need no pivoting, such as B-spline
/// collocation matrices (totally positive).
pub fn solve_profile(a: &ProfileMatrix, b: &[f64]) -> Result<Vec<f64>> {
    let n = a.dim();
    if b.len() != n {
        return Err(MetricsError::InvalidInput(format!(
            "right-hand side has {} entries, matrix has {n} rows",
            b.len()
        )));
    }
    for i in 0..n {
        let (first, vals) = &a.rows[i];
        if vals.is_empty() || *first > i || first + vals.len() <= i {
            return Err(MetricsError::InvalidInput(format!(
                "row {i} does not cover the diagonal"
            )));
        }
        if i > 0 && (*first < a.rows[i - 1].0 || a.last(i) < a.last(i - 1)) {
            return Err(MetricsError::InvalidInput(format!(
                "row {i} breaks the monotone profile"
            )));
        }
    }

    let mut m = a.clone();
    let mut rhs = b.to_vec();

    for col in 0..n {
        let pivot = m.get(col, col);
        if pivot.abs() < 1e-14 {
            return Err(MetricsError::SolveFailed(format!(
                "zero pivot in column {col}"
            )));
        }
        let last = m.last(col);
        for row in (col + 1)..n {
            if m.rows[row].0 > col {
                break;
            }
            let factor = m.get(row, col) / pivot;
            if factor == 0.0 {
                continue;
            }
            for j in col..=last {
                let sub = factor * m.get(col, j);
                let first = m.rows[row].0;
                m.rows[row].1[j - first] -= sub;
            }
            rhs[row] -= factor * rhs[col];
        }
    }

    // Back substitution
    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let mut sum = rhs[i];
        for j in (i + 1)..=m.last(i) {
            sum -= m.get(i, j) * x[j];
        }
        x[i] = sum / m.get(i, i);
    }

    Ok(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_near(a: f64, b: f64, eps: f64) {
        assert!(
            (a - b).abs() < eps,
            "expected {a} ≈ {b} (diff = {})",
            (a - b).abs()
        );
    }

    #[test]
    fn test_validate_matrix_ok() {
        let m = Mat::<f64>::identity(3, 3);
        assert!(validate_matrix(&m, 1, 1).is_ok());
    }

    #[test]
    fn test_validate_matrix_nan() {
        let mut m = Mat::<f64>::zeros(2, 2);
        m[(0, 1)] = f64::NAN;
        assert!(validate_matrix(&m, 1, 1).is_err());
    }

    #[test]
    fn test_validate_square_rejects_rectangular() {
        let m = Mat::<f64>::zeros(2, 3);
        assert!(matches!(
            validate_square(&m),
            Err(MetricsError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_validate_signal() {
        assert!(validate_signal(&[1.0, 2.0, 3.0], 3, "signal").is_ok());
        assert!(validate_signal(&[1.0, 2.0], 3, "signal").is_err());
        assert!(validate_signal(&[1.0, f64::INFINITY, 3.0], 3, "signal").is_err());
    }

    #[test]
    fn test_mean_and_variance() {
        let x = [1.0, 2.0, 3.0, 4.0];
        assert_near(mean(&x), 2.5, 1e-12);
        assert_near(sample_variance(&x), 5.0 / 3.0, 1e-12);
        assert_eq!(mean(&[]), 0.0);
    }

    #[test]
    fn test_column_means() {
        let mut m = Mat::<f64>::zeros(2, 2);
        m[(0, 0)] = 1.0;
        m[(1, 0)] = 3.0;
        m[(0, 1)] = 2.0;
        m[(1, 1)] = 4.0;
        let means = column_means(&m);
        assert_near(means[0], 2.0, 1e-12);
        assert_near(means[1], 3.0, 1e-12);
    }

    #[test]
    fn test_stack_rows() {
        let a = Mat::<f64>::identity(2, 2);
        let b = Mat::<f64>::zeros(3, 2);
        let s = stack_rows(&[a, b]).unwrap();
        assert_eq!(s.nrows(), 5);
        assert_eq!(s.ncols(), 2);
        assert_eq!(s[(1, 1)], 1.0);
        assert_eq!(s[(4, 1)], 0.0);
        assert!(stack_rows(&[]).is_err());
    }

    #[test]
    fn test_solve_profile_tridiagonal() {
        // [2 1 0; 1 2 1; 0 1 2] x = [4, 8, 8] -> x = [1, 2, 3]
        let a = ProfileMatrix::new(vec![
            (0, vec![2.0, 1.0]),
            (0, vec![1.0, 2.0, 1.0]),
            (1, vec![1.0, 2.0]),
        ]);
        let x = solve_profile(&a, &[4.0, 8.0, 8.0]).unwrap();
        assert_near(x[0], 1.0, 1e-12);
        assert_near(x[1], 2.0, 1e-12);
        assert_near(x[2], 3.0, 1e-12);
    }

    #[test]
    fn test_solve_profile_zero_pivot() {
        let a = ProfileMatrix::new(vec![(0, vec![0.0, 1.0]), (0, vec![1.0, 0.0])]);
        assert!(matches!(
            solve_profile(&a, &[1.0, 1.0]),
            Err(MetricsError::SolveFailed(_))
        ));
    }

    #[test]
    fn test_solve_profile_rejects_bad_shape() {
        let a = ProfileMatrix::new(vec![(1, vec![1.0]), (0, vec![1.0, 1.0])]);
        assert!(solve_profile(&a, &[1.0, 1.0]).is_err());
        let ok = ProfileMatrix::new(vec![(0, vec![1.0])]);
        assert!(solve_profile(&ok, &[1.0, 2.0]).is_err());
    }
}
