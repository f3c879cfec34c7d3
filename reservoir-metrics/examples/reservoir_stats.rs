//! Summary statistics of a small leaky echo-state reservoir.

use reservoir_metrics::{
    autocorrelation_coefs, correlation_matrix, deep_spectral_radius, entropy, quota, rank,
    spectral_radius, EntropyConfig, DEFAULT_RANK_TOL,
};

fn main() {
    let n = 20;
    let leaky_rate = 0.3;

    // Deterministic sparse recurrent weights
    let mut w = faer::Mat::<f64>::zeros(n, n);
    for i in 0..n {
        for j in 0..n {
            if (i * 13 + j * 7) % 5 == 0 {
                w[(i, j)] = ((i * 31 + j * 17) % 11) as f64 / 11.0 - 0.5;
            }
        }
    }
    let rho = spectral_radius(&w).unwrap();
    for j in 0..n {
        for i in 0..n {
            w[(i, j)] *= 0.9 / rho;
        }
    }

    // Drive the reservoir with a sine input
    let n_time = 500;
    let mut states = faer::Mat::<f64>::zeros(n_time, n);
    let mut x = vec![0.0; n];
    for t in 0..n_time {
        let u = (0.2 * t as f64).sin();
        let mut next = vec![0.0; n];
        for i in 0..n {
            let mut pre = 0.5 * u * ((i % 3) as f64 - 1.5);
            for j in 0..n {
                pre += w[(i, j)] * x[j];
            }
            next[i] = (1.0 - leaky_rate) * x[i] + leaky_rate * pre.tanh();
        }
        x = next;
        for i in 0..n {
            states[(t, i)] = x[i];
        }
    }

    println!("Reservoir ({n} neurons, leaky rate {leaky_rate})");
    println!("  Spectral radius: {:.4}", spectral_radius(&w).unwrap());
    println!(
        "  Effective spectral radius: {:.4}",
        deep_spectral_radius(&w, leaky_rate).unwrap()
    );

    let r = correlation_matrix(&states).unwrap();
    println!("\nState correlation matrix");
    println!("  Rank: {}", rank(&r, DEFAULT_RANK_TOL).unwrap());
    println!("  Quota: {:.6}", quota(&r).unwrap());

    let h = entropy(&states, &EntropyConfig::default()).unwrap();
    println!("\nEntropy of the first neurons:");
    for (i, v) in h.iter().take(5).enumerate() {
        println!("  neuron {i}: {v:.4}");
    }

    let acf = autocorrelation_coefs(&states, 5).unwrap();
    println!("\nAutocorrelation of neuron 0:");
    for k in 0..6 {
        println!("  lag {k}: {:.4}", acf[(0, k)]);
    }
}
