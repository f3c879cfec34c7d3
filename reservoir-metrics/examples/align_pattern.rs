//! Align a generated signal against a reference pattern.

use reservoir_metrics::{
    align_with_error, filter_by_threshold, rank_all_matches, AlignConfig, Nrmse,
};

fn main() {
    // Reference: one period of a slow oscillation
    let reference: Vec<f64> = (0..20)
        .map(|i| (2.0 * std::f64::consts::PI * i as f64 / 20.0).sin())
        .collect();

    // Generated: the same oscillation with a fractional phase lag and a little drift
    let generated: Vec<f64> = (0..60)
        .map(|i| {
            let t = i as f64 - 0.35;
            (2.0 * std::f64::consts::PI * t / 20.0).sin() + 0.002 * i as f64
        })
        .collect();

    let config = AlignConfig::with_rate(10);

    let best = align_with_error(&reference, &generated, &config, &Nrmse).unwrap();
    println!("Best alignment");
    println!("  Interpolated offset: {}", best.offset);
    println!("  Original-rate offset: {}", best.original_offset);
    println!("  NRMSE: {:.6}", best.error);

    let ranked = rank_all_matches(&reference, &generated, &config, &Nrmse).unwrap();
    println!("\nRanked phases ({} candidates):", ranked.candidates.len());
    for (c, e) in ranked.candidates.iter().zip(&ranked.errors).take(5) {
        println!("  offset {:4}  distance {:.4}  nrmse {:.4}", c.offset, c.distance, e);
    }
    println!("  Mean NRMSE: {:.4}", ranked.mean_error);

    let close = filter_by_threshold(&reference, &generated, &config, 1.0, &Nrmse).unwrap();
    println!("\nPhases with distance < 1.0: {}", close.len());
    println!("  Original-rate offsets: {:?}", close.original_offsets);
}
