use std::f64::consts::PI;

use faer::Mat;
use rayon::prelude::*;

use crate::types::{EntropyConfig, MetricsError, Result};
use crate::utils::{column, column_means, mean, sample_variance, stack_rows, validate_matrix};

/// Per-variable differential entropy of samples (samples × variables).
///
/// Each variable's density is estimated with a Gaussian kernel density
/// estimate (Scott bandwidth h = σ n^(-1/5)), and its entropy
/// -∫ p ln p is integrated over `[config.lower, config.upper]` with
/// composite Simpson quadrature. Variables are processed in parallel.
pub fn entropy(x: &Mat<f64>, config: &EntropyConfig) -> Result<Vec<f64>> {
    validate_matrix(x, 0, 1)?;
    if x.nrows() < 2 {
        return Err(MetricsError::InsufficientData(format!(
            "entropy needs at least 2 samples, got {}",
            x.nrows()
        )));
    }
    if !config.lower.is_finite() || !config.upper.is_finite() || config.lower >= config.upper {
        return Err(MetricsError::InvalidInput(format!(
            "invalid integration range [{}, {}]",
            config.lower, config.upper
        )));
    }
    if config.n_intervals == 0 {
        return Err(MetricsError::InvalidInput(
            "n_intervals must be positive".into(),
        ));
    }

    (0..x.ncols())
        .into_par_iter()
        .map(|j| {
            let samples = column(x, j);
            let kde = GaussianKde::new(&samples).ok_or_else(|| {
                MetricsError::InvalidInput(format!("variable {j} has zero variance"))
            })?;
            Ok(simpson(
                |v| {
                    let p = kde.density(v);
                    if p > 0.0 {
                        -p * p.ln()
                    } else {
                        0.0
                    }
                },
                config.lower,
                config.upper,
                config.n_intervals,
            ))
        })
        .collect()
}

/// [`entropy`] over a batch, stacking every element along the time axis.
pub fn entropy_batched(batch: &[Mat<f64>], config: &EntropyConfig) -> Result<Vec<f64>> {
    entropy(&stack_rows(batch)?, config)
}

struct GaussianKde<'a> {
    samples: &'a [f64],
    bandwidth: f64,
    norm: f64,
}

impl<'a> GaussianKde<'a> {
    /// `None` when the samples have zero variance.
    fn new(samples: &'a [f64]) -> Option<Self> {
        let n = samples.len() as f64;
        let sigma = sample_variance(samples).sqrt();
        if sigma <= 0.0 {
            return None;
        }
        let bandwidth = sigma * n.powf(-0.2);
        Some(Self {
            samples,
            bandwidth,
            norm: 1.0 / (n * bandwidth * (2.0 * PI).sqrt()),
        })
    }

    fn density(&self, x: f64) -> f64 {
        let sum: f64 = self
            .samples
            .iter()
            .map(|s| {
                let z = (x - s) / self.bandwidth;
                (-0.5 * z * z).exp()
            })
            .sum();
        sum * self.norm
    }
}

/// Composite Simpson rule; `n` is rounded up to an even count.
fn simpson<F: Fn(f64) -> f64>(f: F, a: f64, b: f64, n: usize) -> f64 {
    let n = n + n % 2;
    let h = (b - a) / n as f64;
    let mut sum = f(a) + f(b);
    for k in 1..n {
        let w = if k % 2 == 1 { 4.0 } else { 2.0 };
        sum += w * f(a + k as f64 * h);
    }
    sum * h / 3.0
}

/// Covariance of two equal-length series: mean((x - x̄)(y - ȳ)).
pub fn cov(x: &[f64], y: &[f64]) -> Result<f64> {
    if x.len() != y.len() {
        return Err(MetricsError::InvalidInput(format!(
            "series lengths differ ({} vs {})",
            x.len(),
            y.len()
        )));
    }
    if x.is_empty() {
        return Err(MetricsError::InvalidInput("empty series".into()));
    }
    let (mx, my) = (mean(x), mean(y));
    let products: Vec<f64> = x.iter().zip(y).map(|(a, b)| (a - mx) * (b - my)).collect();
    Ok(mean(&products))
}

/// Autocorrelation coefficients for lags 0..=n_lags, normalised by lag 0.
///
/// Every lag compares the first `len - n_lags` samples with the window
/// shifted by the lag, so all coefficients use the same sample count. That
/// comparison length must be at least `n_lags`.
pub fn autocorrelation_function(x: &[f64], n_lags: usize) -> Result<Vec<f64>> {
    let comparison_len = x.len().checked_sub(n_lags).filter(|&c| c >= n_lags && c > 0);
    let c = comparison_len.ok_or_else(|| {
        MetricsError::InvalidInput(format!(
            "comparison length must be at least the number of lags \
             (series of length {}, {n_lags} lags, comparison length of {})",
            x.len(),
            x.len() as i64 - n_lags as i64
        ))
    })?;

    let head = &x[..c];
    let c0 = cov(head, head)?;
    if c0 == 0.0 {
        return Err(MetricsError::NumericalError(
            "autocorrelation of a constant series".into(),
        ));
    }

    let mut coefs = Vec::with_capacity(n_lags + 1);
    coefs.push(1.0);
    for lag in 1..=n_lags {
        coefs.push(cov(head, &x[lag..lag + c])? / c0);
    }
    Ok(coefs)
}

/// Per-channel autocorrelation coefficients of a (time × channels) series.
///
/// Returns a (channels × n_coefs+1) matrix.
pub fn autocorrelation_coefs(x: &Mat<f64>, n_coefs: usize) -> Result<Mat<f64>> {
    validate_matrix(x, 1, 1)?;
    // Lag count is validated per channel before anything is allocated.
    let per_channel = (0..x.ncols())
        .map(|ch| autocorrelation_function(&column(x, ch), n_coefs))
        .collect::<Result<Vec<_>>>()?;
    Ok(Mat::from_fn(per_channel.len(), n_coefs + 1, |ch, k| {
        per_channel[ch][k]
    }))
}

/// [`autocorrelation_coefs`] for every element of a batch.
pub fn autocorrelation_coefs_batched(
    batch: &[Mat<f64>],
    n_coefs: usize,
) -> Result<Vec<Mat<f64>>> {
    batch
        .iter()
        .map(|x| autocorrelation_coefs(x, n_coefs))
        .collect()
}

/// Average class probabilities through time (time × classes → classes).
pub fn average_prob(x: &Mat<f64>) -> Result<Vec<f64>> {
    validate_matrix(x, 1, 1)?;
    Ok(column_means(x))
}

/// Index of the class with the highest time-averaged value (first on ties).
pub fn max_average_through_time(x: &Mat<f64>) -> Result<usize> {
    let avg = average_prob(x)?;
    let mut best = 0;
    for (i, v) in avg.iter().enumerate() {
        if *v > avg[best] {
            best = i;
        }
    }
    Ok(best)
}
