//! Pattern alignment by exhaustive phase-shift search.
//!
//! Both the reference pattern and the generated signal are upsampled by
//! quadratic interpolation. Every reference-length window of the upsampled
//! generated signal is scored by its Euclidean distance to the upsampled
//! reference; a selection policy then picks the window(s) to report, each
//! downsampled back to the reference's sampling rate.

use rayon::prelude::*;

use crate::error_measures::ErrorMeasure;
use crate::interpolate::interpolate;
use crate::types::{
    AlignConfig, Alignment, BestAlignment, MetricsError, PhaseCandidate, RankedMatches, Result,
    ThresholdMatches, ThresholdMean,
};

/// Distances of every phase shift of an upsampled generated signal.
#[derive(Debug, Clone)]
pub struct PhaseScan {
    /// Upsampled generated signal.
    pub generated: Vec<f64>,
    /// One candidate per offset, in ascending offset order.
    pub candidates: Vec<PhaseCandidate>,
    /// Sample count of the reference at its original rate.
    pub reference_len: usize,
    /// Interpolation rate used for both signals.
    pub rate: usize,
}

impl PhaseScan {
    /// Upsample both signals and score every offset.
    ///
    /// With L the upsampled generated length and M the upsampled reference
    /// length, offsets 0 .. L-M-1 are scanned (L - M candidates). Fails
    /// when the generated signal is not strictly longer than the reference.
    pub fn new(reference: &[f64], generated: &[f64], rate: usize) -> Result<Self> {
        let reference_int = interpolate(reference, rate)?;
        let generated_int = interpolate(generated, rate)?;

        let l = generated_int.len();
        let m = reference_int.len();
        if l <= m {
            return Err(MetricsError::InvalidInput(format!(
                "empty search space: generated signal ({} samples, {l} interpolated) \
                 must be longer than the reference ({} samples, {m} interpolated)",
                generated.len(),
                reference.len()
            )));
        }

        let candidates = scan_phase_shifts(&reference_int, &generated_int);

        tracing::debug!(
            reference_len = reference.len(),
            generated_len = generated.len(),
            rate,
            n_shifts = candidates.len(),
            "scanned phase shifts"
        );

        Ok(Self {
            generated: generated_int,
            candidates,
            reference_len: reference.len(),
            rate,
        })
    }

    /// Number of scanned offsets.
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// Whether no offset was scanned (never true for a constructed scan).
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Raw distance of every offset, in offset order.
    pub fn distances(&self) -> Vec<f64> {
        self.candidates.iter().map(|c| c.distance).collect()
    }

    /// Candidate with the smallest distance; the lowest offset wins ties.
    pub fn best(&self) -> Option<PhaseCandidate> {
        let (first, rest) = self.candidates.split_first()?;
        let mut best = *first;
        for c in rest {
            if c.distance < best.distance {
                best = *c;
            }
        }
        Some(best)
    }

    fn require_best(&self) -> Result<PhaseCandidate> {
        self.best()
            .ok_or_else(|| MetricsError::InvalidInput("no phase shifts to select from".into()))
    }

    /// Offset converted back to the original sampling rate (rounded up).
    pub fn original_offset(&self, offset: usize) -> usize {
        offset.div_ceil(self.rate)
    }

    /// Window starting at `offset`, downsampled to the reference length by
    /// taking every `rate`-th sample.
    pub fn realign(&self, offset: usize) -> Vec<f64> {
        self.generated[offset..]
            .iter()
            .step_by(self.rate)
            .take(self.reference_len)
            .copied()
            .collect()
    }

    /// Realign at `candidate` and score the result against `reference`.
    pub fn score(
        &self,
        candidate: PhaseCandidate,
        reference: &[f64],
        measure: &dyn ErrorMeasure,
    ) -> Alignment {
        let aligned = self.realign(candidate.offset);
        let error = measure.measure(&aligned, reference);
        Alignment {
            aligned,
            original_offset: self.original_offset(candidate.offset),
            error,
            offset: candidate.offset,
        }
    }
}

/// Euclidean distance between `reference` and each window of `generated`
/// with the same length, for offsets 0 .. len(generated) - len(reference) - 1.
///
/// Offsets are scored in parallel; the output is in offset order.
pub fn scan_phase_shifts(reference: &[f64], generated: &[f64]) -> Vec<PhaseCandidate> {
    let m = reference.len();
    let n_shifts = generated.len().saturating_sub(m);
    (0..n_shifts)
        .into_par_iter()
        .map(|offset| {
            let distance = generated[offset..offset + m]
                .iter()
                .zip(reference)
                .map(|(g, r)| (g - r) * (g - r))
                .sum::<f64>()
                .sqrt();
            PhaseCandidate { offset, distance }
        })
        .collect()
}

/// Candidates sorted by ascending distance. The sort is stable, so equal
/// distances keep their input order.
pub fn rank_candidates(candidates: &[PhaseCandidate]) -> Vec<PhaseCandidate> {
    let mut ranked = candidates.to_vec();
    ranked.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    ranked
}

/// Find the best-matching phase of `generated` for `reference`.
///
/// Returns the offset in the interpolated signal, the corresponding
/// original-rate offset and the realigned signal.
pub fn align_best(
    reference: &[f64],
    generated: &[f64],
    config: &AlignConfig,
) -> Result<BestAlignment> {
    let scan = PhaseScan::new(reference, generated, config.interpolation_rate)?;
    let best = scan.require_best()?;
    tracing::debug!(offset = best.offset, distance = best.distance, "best phase");
    Ok(BestAlignment {
        offset: best.offset,
        original_offset: scan.original_offset(best.offset),
        aligned: scan.realign(best.offset),
    })
}

/// Best-matching phase, scored with `measure` against the reference.
pub fn align_with_error(
    reference: &[f64],
    generated: &[f64],
    config: &AlignConfig,
    measure: &dyn ErrorMeasure,
) -> Result<Alignment> {
    let scan = PhaseScan::new(reference, generated, config.interpolation_rate)?;
    let best = scan.require_best()?;
    tracing::debug!(offset = best.offset, distance = best.distance, "best phase");
    Ok(scan.score(best, reference, measure))
}

/// Rank every phase shift by distance and score each one.
///
/// Equal distances keep ascending offset order.
pub fn rank_all_matches(
    reference: &[f64],
    generated: &[f64],
    config: &AlignConfig,
    measure: &dyn ErrorMeasure,
) -> Result<RankedMatches> {
    let scan = PhaseScan::new(reference, generated, config.interpolation_rate)?;

    let ranked = rank_candidates(&scan.candidates);

    let mut original_offsets = Vec::with_capacity(ranked.len());
    let mut errors = Vec::with_capacity(ranked.len());
    for &candidate in &ranked {
        let alignment = scan.score(candidate, reference, measure);
        original_offsets.push(alignment.original_offset);
        errors.push(alignment.error);
    }
    let mean_error = errors.iter().sum::<f64>() / errors.len() as f64;

    tracing::debug!(n_matches = ranked.len(), mean_error, "ranked phases");

    Ok(RankedMatches {
        original_offsets,
        errors,
        mean_error,
        candidates: ranked,
    })
}

/// Keep the phase shifts whose distance is strictly below `threshold`.
///
/// Matches stay in ascending offset order. The mean error is normalised
/// according to `config.threshold_mean`.
pub fn filter_by_threshold(
    reference: &[f64],
    generated: &[f64],
    config: &AlignConfig,
    threshold: f64,
    measure: &dyn ErrorMeasure,
) -> Result<ThresholdMatches> {
    if threshold.is_nan() {
        return Err(MetricsError::InvalidInput("threshold is NaN".into()));
    }
    let scan = PhaseScan::new(reference, generated, config.interpolation_rate)?;

    let matches: Vec<PhaseCandidate> = scan
        .candidates
        .iter()
        .filter(|c| c.distance < threshold)
        .copied()
        .collect();

    let mut original_offsets = Vec::with_capacity(matches.len());
    let mut errors = Vec::with_capacity(matches.len());
    for &candidate in &matches {
        let alignment = scan.score(candidate, reference, measure);
        original_offsets.push(alignment.original_offset);
        errors.push(alignment.error);
    }

    let total: f64 = errors.iter().sum();
    let mean_error = match config.threshold_mean {
        ThresholdMean::Matches if errors.is_empty() => f64::NAN,
        ThresholdMean::Matches => total / errors.len() as f64,
        ThresholdMean::MatchesPlusOne => total / (errors.len() + 1) as f64,
    };

    tracing::debug!(
        threshold,
        n_matches = matches.len(),
        n_shifts = scan.len(),
        "filtered phases"
    );

    Ok(ThresholdMatches {
        original_offsets,
        errors,
        mean_error,
        distances: scan.distances(),
        candidates: matches,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error_measures::{ClosureMeasure, Nrmse, Rmse};

    fn assert_near(a: f64, b: f64, eps: f64) {
        assert!(
            (a - b).abs() < eps,
            "expected {a} ≈ {b} (diff = {})",
            (a - b).abs()
        );
    }

    const REFERENCE: [f64; 7] = [0.0, 1.0, 2.0, 3.0, 2.0, 1.0, 0.0];
    const GENERATED: [f64; 11] = [5.0, 5.0, 0.0, 1.0, 2.0, 3.0, 2.0, 1.0, 0.0, 5.0, 5.0];

    #[test]
    fn test_scan_phase_shifts_counts_and_order() {
        let reference = [1.0, 2.0];
        let generated = [0.0, 1.0, 2.0, 3.0, 4.0];
        let scan = scan_phase_shifts(&reference, &generated);
        // len(generated) - len(reference) offsets, the final window excluded
        assert_eq!(scan.len(), 3);
        for (i, c) in scan.iter().enumerate() {
            assert_eq!(c.offset, i);
        }
        assert_near(scan[1].distance, 0.0, 1e-15);
        assert_near(scan[0].distance, 2.0_f64.sqrt(), 1e-12);
    }

    #[test]
    fn test_best_breaks_ties_by_lowest_offset() {
        let scan = PhaseScan {
            generated: vec![0.0; 8],
            candidates: vec![
                PhaseCandidate { offset: 0, distance: 2.0 },
                PhaseCandidate { offset: 1, distance: 0.5 },
                PhaseCandidate { offset: 2, distance: 0.5 },
                PhaseCandidate { offset: 3, distance: 1.0 },
            ],
            reference_len: 3,
            rate: 1,
        };
        assert_eq!(scan.best().unwrap().offset, 1);
    }

    #[test]
    fn test_original_offset_rounds_up() {
        let scan = PhaseScan {
            generated: vec![0.0; 16],
            candidates: vec![PhaseCandidate { offset: 0, distance: 0.0 }],
            reference_len: 3,
            rate: 4,
        };
        assert_eq!(scan.original_offset(0), 0);
        assert_eq!(scan.original_offset(1), 1);
        assert_eq!(scan.original_offset(4), 1);
        assert_eq!(scan.original_offset(5), 2);
    }

    #[test]
    fn test_realign_takes_every_rate_th_sample() {
        let scan = PhaseScan {
            generated: (0..20).map(|i| i as f64).collect(),
            candidates: vec![PhaseCandidate { offset: 0, distance: 0.0 }],
            reference_len: 4,
            rate: 3,
        };
        assert_eq!(scan.realign(2), vec![2.0, 5.0, 8.0, 11.0]);
    }

    #[test]
    fn test_align_best_embedded_copy() {
        let best = align_best(&REFERENCE, &GENERATED, &AlignConfig::default()).unwrap();
        assert_eq!(best.offset, 2);
        assert_eq!(best.original_offset, 2);
        assert_eq!(best.aligned.len(), REFERENCE.len());
        for (a, r) in best.aligned.iter().zip(&REFERENCE) {
            assert_near(*a, *r, 1e-10);
        }
    }

    #[test]
    fn test_align_with_error_embedded_copy() {
        let alignment =
            align_with_error(&REFERENCE, &GENERATED, &AlignConfig::default(), &Nrmse).unwrap();
        assert_eq!(alignment.original_offset, 2);
        assert_eq!(alignment.offset, 2);
        assert_near(alignment.error, 0.0, 1e-9);
    }

    #[test]
    fn test_align_with_error_upsampled() {
        let alignment =
            align_with_error(&REFERENCE, &GENERATED, &AlignConfig::with_rate(4), &Rmse).unwrap();
        assert_eq!(alignment.offset, 8);
        assert_eq!(alignment.original_offset, 2);
        assert_eq!(alignment.aligned.len(), REFERENCE.len());
        assert_near(alignment.error, 0.0, 1e-9);
    }

    #[test]
    fn test_align_rejects_empty_search_space() {
        let err = align_best(&GENERATED, &REFERENCE, &AlignConfig::default()).unwrap_err();
        assert!(matches!(err, MetricsError::InvalidInput(_)));
        // Equal lengths also leave no offsets to scan
        let err = align_best(&REFERENCE, &REFERENCE, &AlignConfig::with_rate(2)).unwrap_err();
        assert!(matches!(err, MetricsError::InvalidInput(_)));
    }

    #[test]
    fn test_align_rejects_short_reference() {
        let err = align_best(&[1.0, 2.0], &GENERATED, &AlignConfig::default()).unwrap_err();
        assert!(matches!(err, MetricsError::InsufficientData(_)));
    }

    #[test]
    fn test_align_rejects_zero_rate() {
        let err = align_best(&REFERENCE, &GENERATED, &AlignConfig::with_rate(0)).unwrap_err();
        assert!(matches!(err, MetricsError::InvalidInput(_)));
    }

    #[test]
    fn test_rank_all_matches_sorted() {
        let config = AlignConfig::with_rate(2);
        let ranked = rank_all_matches(&REFERENCE, &GENERATED, &config, &Rmse).unwrap();
        // L - M = 2 * 10 - 2 * 6
        assert_eq!(ranked.candidates.len(), 8);
        assert_eq!(ranked.errors.len(), 8);
        assert_eq!(ranked.original_offsets.len(), 8);
        for w in ranked.candidates.windows(2) {
            assert!(w[0].distance <= w[1].distance);
        }
        assert_eq!(ranked.candidates[0].offset, 4);
        assert_eq!(ranked.original_offsets[0], 2);
        let mean: f64 = ranked.errors.iter().sum::<f64>() / 8.0;
        assert_near(ranked.mean_error, mean, 1e-12);
    }

    #[test]
    fn test_rank_candidates_stable_on_ties() {
        let candidates = vec![
            PhaseCandidate { offset: 0, distance: 1.0 },
            PhaseCandidate { offset: 1, distance: 0.25 },
            PhaseCandidate { offset: 2, distance: 1.0 },
            PhaseCandidate { offset: 3, distance: 0.25 },
            PhaseCandidate { offset: 4, distance: 0.1 },
        ];
        let offsets: Vec<usize> = rank_candidates(&candidates)
            .iter()
            .map(|c| c.offset)
            .collect();
        assert_eq!(offsets, vec![4, 1, 3, 0, 2]);
    }

    #[test]
    fn test_filter_by_threshold_infinite_keeps_all() {
        let config = AlignConfig::default();
        let all = filter_by_threshold(&REFERENCE, &GENERATED, &config, f64::INFINITY, &Rmse)
            .unwrap();
        assert_eq!(all.len(), 4);
        assert_eq!(all.distances.len(), 4);
        let offsets: Vec<usize> = all.candidates.iter().map(|c| c.offset).collect();
        assert_eq!(offsets, vec![0, 1, 2, 3]);
        assert_eq!(all.original_offsets, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_filter_by_threshold_zero_keeps_none() {
        let config = AlignConfig::default();
        let none = filter_by_threshold(&REFERENCE, &GENERATED, &config, 0.0, &Rmse).unwrap();
        assert!(none.is_empty());
        assert!(none.mean_error.is_nan());
        assert_eq!(none.distances.len(), 4);
    }

    #[test]
    fn test_filter_by_threshold_mean_policies() {
        let threshold = 1e-6;
        let corrected =
            filter_by_threshold(&REFERENCE, &GENERATED, &AlignConfig::default(), threshold, &Rmse)
                .unwrap();
        assert_eq!(corrected.original_offsets, vec![2]);

        let constant = ClosureMeasure::new(|_: &[f64], _: &[f64]| 3.0, "constant");
        let corrected = filter_by_threshold(
            &REFERENCE,
            &GENERATED,
            &AlignConfig::default(),
            f64::INFINITY,
            &constant,
        )
        .unwrap();
        assert_near(corrected.mean_error, 3.0, 1e-12);

        let legacy_config = AlignConfig {
            threshold_mean: ThresholdMean::MatchesPlusOne,
            ..Default::default()
        };
        let legacy = filter_by_threshold(
            &REFERENCE,
            &GENERATED,
            &legacy_config,
            f64::INFINITY,
            &constant,
        )
        .unwrap();
        // 4 matches, sum 12, divided by 5
        assert_near(legacy.mean_error, 12.0 / 5.0, 1e-12);

        let legacy_empty =
            filter_by_threshold(&REFERENCE, &GENERATED, &legacy_config, 0.0, &constant).unwrap();
        assert_eq!(legacy_empty.mean_error, 0.0);
    }

    #[test]
    fn test_filter_by_threshold_rejects_nan() {
        let err = filter_by_threshold(
            &REFERENCE,
            &GENERATED,
            &AlignConfig::default(),
            f64::NAN,
            &Rmse,
        )
        .unwrap_err();
        assert!(matches!(err, MetricsError::InvalidInput(_)));
    }
}
