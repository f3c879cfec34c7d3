//! # reservoir-metrics
//!
//! Numeric utilities for analysing the states and outputs of recurrent
//! dynamical models such as echo-state networks:
//!
//! - **Pattern alignment** ([`align_best`], [`align_with_error`],
//!   [`rank_all_matches`], [`filter_by_threshold`]): phase-shift search of a
//!   generated signal against a reference pattern on a quadratically
//!   interpolated grid
//! - **Interpolation** ([`interpolate`], [`QuadraticSpline`]): integer-rate
//!   upsampling with an interpolating quadratic spline
//! - **Error measures** ([`ErrorMeasure`], [`Nrmse`], [`Rmse`], [`Mse`]):
//!   pluggable scoring of aligned signals
//! - **Matrix measures** ([`rank`], [`quota`], [`spectral_radius`],
//!   [`deep_spectral_radius`], [`correlation_matrix`], [`similarity_matrix`])
//! - **Statistics** ([`entropy`], [`cov`], [`autocorrelation_function`],
//!   [`autocorrelation_coefs`], [`average_prob`])
//!
//! All functions are pure; nothing is cached between calls.
//!
//! ## Quick Start
//!
//! ```rust
//! use reservoir_metrics::{align_with_error, AlignConfig, Nrmse};
//!
//! let reference = [0.0, 1.0, 2.0, 3.0, 2.0, 1.0, 0.0];
//! let generated = [5.0, 5.0, 0.0, 1.0, 2.0, 3.0, 2.0, 1.0, 0.0, 5.0, 5.0];
//!
//! let config = AlignConfig::with_rate(4);
//! let alignment = align_with_error(&reference, &generated, &config, &Nrmse).unwrap();
//! assert_eq!(alignment.original_offset, 2);
//! assert!(alignment.error < 1e-6);
//! ```
//!
//! ## References
//!
//! - Jaeger (2014), *Controlling Recurrent Neural Networks by Conceptors*,
//!   arXiv:1403.3369
//! - de Boor (1978), *A Practical Guide to Splines*, Springer

pub mod types;
pub mod utils;

pub mod align;
pub mod error_measures;
pub mod interpolate;
pub mod matrix;
pub mod stats;

pub use align::{
    align_best, align_with_error, filter_by_threshold, rank_all_matches, rank_candidates,
    scan_phase_shifts, PhaseScan,
};
pub use error_measures::{
    generalized_squared_cosine, ClosureMeasure, ErrorMeasure, Mse, Nrmse, Rmse,
};
pub use interpolate::{interpolate, QuadraticSpline};
pub use matrix::{
    correlation_matrix, correlation_svd, deep_spectral_radius, quota, rank, similarity_matrix,
    singular_values, spectral_radius, DEFAULT_RANK_TOL,
};
pub use stats::{
    autocorrelation_coefs, autocorrelation_coefs_batched, autocorrelation_function, average_prob,
    cov, entropy, entropy_batched, max_average_through_time,
};
pub use types::{
    AlignConfig, Alignment, BestAlignment, EntropyConfig, MetricsError, PhaseCandidate,
    RankedMatches, Result, SvdComponents, ThresholdMatches, ThresholdMean,
};
