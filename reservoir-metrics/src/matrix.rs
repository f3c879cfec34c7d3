use faer::Mat;

use crate::error_measures::generalized_squared_cosine;
use crate::types::{MetricsError, Result, SvdComponents};
use crate::utils::{validate_matrix, validate_square};

/// Default singular value threshold for [`rank`].
pub const DEFAULT_RANK_TOL: f64 = 1e-14;

/// Singular values of a matrix, in decreasing order.
pub fn singular_values(m: &Mat<f64>) -> Result<Vec<f64>> {
    validate_matrix(m, 1, 1)?;
    let svd = m
        .svd()
        .map_err(|e| MetricsError::SvdFailed(format!("{e:?}")))?;
    let s_col = svd.S().column_vector();
    Ok((0..s_col.nrows()).map(|i| s_col[i]).collect())
}

/// Numerical rank: number of singular values strictly above `tol`.
pub fn rank(m: &Mat<f64>, tol: f64) -> Result<usize> {
    Ok(singular_values(m)?.iter().filter(|&&s| s > tol).count())
}

/// Quota of a conceptor matrix: sum of singular values over the number of rows.
pub fn quota(conceptor: &Mat<f64>) -> Result<f64> {
    let s = singular_values(conceptor)?;
    Ok(s.iter().sum::<f64>() / conceptor.nrows() as f64)
}

/// State correlation matrix R = XᵀX / n for states X (time × neurons).
pub fn correlation_matrix(states: &Mat<f64>) -> Result<Mat<f64>> {
    validate_matrix(states, 1, 1)?;
    let n = states.nrows() as f64;
    let gram = states.transpose() * states;
    let mut r = Mat::<f64>::zeros(gram.nrows(), gram.ncols());
    for j in 0..gram.ncols() {
        for i in 0..gram.nrows() {
            r[(i, j)] = gram[(i, j)] / n;
        }
    }
    Ok(r)
}

/// SVD of the state correlation matrix.
pub fn correlation_svd(states: &Mat<f64>) -> Result<SvdComponents> {
    let r = correlation_matrix(states)?;
    let svd = r
        .svd()
        .map_err(|e| MetricsError::SvdFailed(format!("{e:?}")))?;
    let s_col = svd.S().column_vector();
    Ok(SvdComponents {
        u: svd.U().to_owned(),
        s: (0..s_col.nrows()).map(|i| s_col[i]).collect(),
        v: svd.V().to_owned(),
    })
}

/// Pairwise generalized squared cosine similarity of SVD pairs.
///
/// Entry (i, j) compares `svds[i]` with `svds[j]`; the diagonal is 1.
pub fn similarity_matrix(svds: &[SvdComponents]) -> Result<Mat<f64>> {
    let n = svds.len();
    let mut sim = Mat::<f64>::zeros(n, n);
    for (i, a) in svds.iter().enumerate() {
        for (j, b) in svds.iter().enumerate() {
            sim[(i, j)] = generalized_squared_cosine(&a.s, &a.u, &b.s, &b.u)?;
        }
    }
    Ok(sim)
}

/// Spectral radius: largest eigenvalue magnitude of a square matrix.
pub fn spectral_radius(m: &Mat<f64>) -> Result<f64> {
    validate_square(m)?;
    let eigen = m
        .as_ref()
        .eigen()
        .map_err(|e| MetricsError::EigenFailed(format!("{e:?}")))?;
    let ev = eigen.S().column_vector();
    Ok((0..ev.nrows())
        .map(|i| (ev[i].re * ev[i].re + ev[i].im * ev[i].im).sqrt())
        .fold(0.0_f64, f64::max))
}

/// Effective spectral radius of a leaky-integrator layer:
/// ρ((1 - a) I + a W) for leaky rate `a`.
pub fn deep_spectral_radius(w: &Mat<f64>, leaky_rate: f64) -> Result<f64> {
    validate_square(w)?;
    if !leaky_rate.is_finite() {
        return Err(MetricsError::InvalidInput(
            "leaky rate must be finite".into(),
        ));
    }
    let n = w.nrows();
    let mut effective = Mat::<f64>::zeros(n, n);
    for j in 0..n {
        for i in 0..n {
            let identity = if i == j { 1.0 - leaky_rate } else { 0.0 };
            effective[(i, j)] = identity + leaky_rate * w[(i, j)];
        }
    }
    spectral_radius(&effective)
}
