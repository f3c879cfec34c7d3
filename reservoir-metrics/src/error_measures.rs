use faer::Mat;

use crate::types::{MetricsError, Result};
use crate::utils::{mean, sample_variance};

/// Trait for error measures comparing an aligned signal with a reference.
///
/// Implementations must be pure: the same inputs give the same value.
pub trait ErrorMeasure: Send + Sync {
    /// Error between `aligned` and `reference` (equal lengths).
    fn measure(&self, aligned: &[f64], reference: &[f64]) -> f64;

    /// Measure name.
    fn name(&self) -> &str;
}

/// Normalized root-mean-square error.
///
/// NRMSE = sqrt(mean((a - r)²) / (½ (var(r) + var(a))))
///
/// Normalised by the average of both signals' unbiased variances, the
/// convention of reservoir-computing pattern generation benchmarks.
#[derive(Debug, Clone, Copy, Default)]
pub struct Nrmse;

impl ErrorMeasure for Nrmse {
    fn measure(&self, aligned: &[f64], reference: &[f64]) -> f64 {
        let combined_var = 0.5 * (sample_variance(reference) + sample_variance(aligned));
        (squared_error(aligned, reference) / combined_var).sqrt()
    }
    fn name(&self) -> &str {
        "nrmse"
    }
}

/// Root-mean-square error.
#[derive(Debug, Clone, Copy, Default)]
pub struct Rmse;

impl ErrorMeasure for Rmse {
    fn measure(&self, aligned: &[f64], reference: &[f64]) -> f64 {
        squared_error(aligned, reference).sqrt()
    }
    fn name(&self) -> &str {
        "rmse"
    }
}

/// Mean squared error.
#[derive(Debug, Clone, Copy, Default)]
pub struct Mse;

impl ErrorMeasure for Mse {
    fn measure(&self, aligned: &[f64], reference: &[f64]) -> f64 {
        squared_error(aligned, reference)
    }
    fn name(&self) -> &str {
        "mse"
    }
}

/// Error measure from a closure.
pub struct ClosureMeasure<F: Fn(&[f64], &[f64]) -> f64 + Send + Sync> {
    func: F,
    name: String,
}

impl<F: Fn(&[f64], &[f64]) -> f64 + Send + Sync> ClosureMeasure<F> {
    pub fn new(func: F, name: impl Into<String>) -> Self {
        Self {
            func,
            name: name.into(),
        }
    }
}

impl<F: Fn(&[f64], &[f64]) -> f64 + Send + Sync> ErrorMeasure for ClosureMeasure<F> {
    fn measure(&self, aligned: &[f64], reference: &[f64]) -> f64 {
        (self.func)(aligned, reference)
    }
    fn name(&self) -> &str {
        &self.name
    }
}

fn squared_error(a: &[f64], b: &[f64]) -> f64 {
    let diffs: Vec<f64> = a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).collect();
    mean(&diffs)
}

/// Generalized squared cosine similarity between two SVD pairs.
///
/// sim = ‖diag(√sa) uaᵀ ub diag(√sb)‖²_F / (‖sa‖ ‖sb‖)
///
/// `sa`, `sb` are singular values and `ua`, `ub` hold the matching
/// singular vectors as columns. Equals 1 for identical pairs and 0 for
/// pairs spanning orthogonal subspaces.
pub fn generalized_squared_cosine(
    sa: &[f64],
    ua: &Mat<f64>,
    sb: &[f64],
    ub: &Mat<f64>,
) -> Result<f64> {
    if ua.ncols() != sa.len() || ub.ncols() != sb.len() {
        return Err(MetricsError::InvalidInput(
            "singular vector count does not match singular values".into(),
        ));
    }
    if ua.nrows() != ub.nrows() {
        return Err(MetricsError::InvalidInput(format!(
            "singular vectors have different dimensions ({} vs {})",
            ua.nrows(),
            ub.nrows()
        )));
    }
    if sa.iter().chain(sb).any(|s| *s < 0.0 || !s.is_finite()) {
        return Err(MetricsError::InvalidInput(
            "singular values must be finite and non-negative".into(),
        ));
    }

    let den = norm(sa) * norm(sb);
    if den == 0.0 {
        return Err(MetricsError::NumericalError(
            "generalized squared cosine of a zero spectrum".into(),
        ));
    }

    let cross = ua.transpose() * ub;
    let mut num = 0.0;
    for i in 0..sa.len() {
        for j in 0..sb.len() {
            let v = sa[i].sqrt() * cross[(i, j)] * sb[j].sqrt();
            num += v * v;
        }
    }

    Ok(num / den)
}

fn norm(x: &[f64]) -> f64 {
    x.iter().map(|v| v * v).sum::<f64>().sqrt()
}
