use faer::Mat;

/// Error types for reservoir metric computations.
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("insufficient data: {0}")]
    InsufficientData(String),

    #[error("SVD computation failed: {0}")]
    SvdFailed(String),

    #[error("eigendecomposition failed: {0}")]
    EigenFailed(String),

    #[error("linear solve failed: {0}")]
    SolveFailed(String),

    #[error("numerical error: {0}")]
    NumericalError(String),
}

pub type Result<T> = std::result::Result<T, MetricsError>;

/// How the mean error of threshold-filtered matches is normalised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThresholdMean {
    /// Sum of errors divided by the number of matches (NaN when empty).
    #[default]
    Matches,
    /// Sum of errors divided by the number of matches plus one.
    ///
    /// Reproduces the historical EchoTorch output, which starts its
    /// counter at one. Yields 0.0 when nothing matches.
    MatchesPlusOne,
}

/// Configuration for phase-search alignment.
#[derive(Debug, Clone)]
pub struct AlignConfig {
    /// Integer upsampling factor applied to both signals before the search.
    pub interpolation_rate: usize,
    /// Denominator policy for [`crate::filter_by_threshold`].
    pub threshold_mean: ThresholdMean,
}

impl Default for AlignConfig {
    fn default() -> Self {
        Self {
            interpolation_rate: 1,
            threshold_mean: ThresholdMean::Matches,
        }
    }
}

impl AlignConfig {
    /// Config with the given interpolation rate and default mean policy.
    pub fn with_rate(interpolation_rate: usize) -> Self {
        Self {
            interpolation_rate,
            ..Default::default()
        }
    }
}

/// Configuration for kernel-density entropy estimation.
#[derive(Debug, Clone)]
pub struct EntropyConfig {
    /// Lower integration bound.
    pub lower: f64,
    /// Upper integration bound.
    pub upper: f64,
    /// Number of Simpson sub-intervals (rounded up to even).
    pub n_intervals: usize,
}

impl Default for EntropyConfig {
    fn default() -> Self {
        Self {
            lower: -1.0,
            upper: 1.0,
            n_intervals: 512,
        }
    }
}

/// Components of a singular value decomposition.
#[derive(Debug, Clone)]
pub struct SvdComponents {
    /// Left singular vectors, one per column.
    pub u: Mat<f64>,
    /// Singular values in decreasing order.
    pub s: Vec<f64>,
    /// Right singular vectors, one per column.
    pub v: Mat<f64>,
}

/// One scanned phase shift: window start in the interpolated generated
/// signal and its Euclidean distance to the interpolated reference.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseCandidate {
    pub offset: usize,
    pub distance: f64,
}

/// Best alignment without an error measure.
#[derive(Debug, Clone)]
pub struct BestAlignment {
    /// Offset in the interpolated generated signal.
    pub offset: usize,
    /// Offset at the original sampling rate, `ceil(offset / rate)`.
    pub original_offset: usize,
    /// Generated signal realigned at the reference's sampling rate.
    pub aligned: Vec<f64>,
}

/// An alignment scored against the reference pattern.
#[derive(Debug, Clone)]
pub struct Alignment {
    /// Generated signal realigned at the reference's sampling rate.
    pub aligned: Vec<f64>,
    /// Offset at the original sampling rate, `ceil(offset / rate)`.
    pub original_offset: usize,
    /// Error measure of `aligned` against the reference.
    pub error: f64,
    /// Offset in the interpolated generated signal.
    pub offset: usize,
}

/// Every candidate, ranked by distance.
#[derive(Debug, Clone)]
pub struct RankedMatches {
    /// Original-rate offsets in ranking order.
    pub original_offsets: Vec<usize>,
    /// Error of each ranked candidate.
    pub errors: Vec<f64>,
    /// Mean error over all candidates.
    pub mean_error: f64,
    /// Ranked candidates (interpolated offset and distance).
    pub candidates: Vec<PhaseCandidate>,
}

/// Candidates whose distance fell below a threshold.
#[derive(Debug, Clone)]
pub struct ThresholdMatches {
    /// Original-rate offsets of the matches, in ascending offset order.
    pub original_offsets: Vec<usize>,
    /// Error of each match.
    pub errors: Vec<f64>,
    /// Mean error, normalised according to [`ThresholdMean`].
    pub mean_error: f64,
    /// Distance of every scanned offset, matched or not.
    pub distances: Vec<f64>,
    /// Retained candidates.
    pub candidates: Vec<PhaseCandidate>,
}

impl ThresholdMatches {
    /// Number of retained matches.
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// Whether no offset passed the threshold.
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}
