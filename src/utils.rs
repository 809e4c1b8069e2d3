use rand_distr::LogNormal;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

/// Base seed for the current scenario iteration, set by main before each run
pub static RAND_SEED: AtomicU64 = AtomicU64::new(0);

/// When set, every cleared round is written as a CSV line to the Auction log event
pub static VERBOSE_AUCTION: AtomicBool = AtomicBool::new(false);

/// Number of SimulationRun instances executed since the last reset
pub static TOTAL_SIMULATION_RUNS: AtomicUsize = AtomicUsize::new(0);

/// Derive a seed for one random stream from the global iteration seed
/// Different streams (tie breaking, valuations, ...) use different offsets so they stay independent
pub fn get_seed(offset: u64) -> u64 {
    RAND_SEED.load(Ordering::Relaxed).wrapping_add(offset)
}

/// Index of the largest element, first occurrence wins on ties
/// Returns None for an empty slice. NaN entries are never selected.
pub fn argmax_index(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (index, &value) in values.iter().enumerate() {
        if value.is_nan() {
            continue;
        }
        match best {
            Some((_, best_value)) if value <= best_value => {}
            _ => best = Some((index, value)),
        }
    }
    best.map(|(index, _)| index)
}

/// Convert mean and standard deviation to log-normal distribution parameters
/// Returns (μ, σ) for LogNormal(μ, σ)
///
/// - σ = sqrt(ln(1 + s²/m²))
/// - μ = ln(m) - σ²/2
fn lognormal_from_mean_stddev(mean: f64, stddev: f64) -> (f64, f64) {
    let variance = stddev * stddev;
    let sigma_squared = (1.0 + variance / (mean * mean)).ln();
    let sigma = sigma_squared.sqrt();
    let mu = mean.ln() - sigma_squared / 2.0;
    (mu, sigma)
}

/// Create a log-normal distribution from mean and standard deviation
/// Panics if mean is not positive (scenario setup error)
pub fn lognormal_dist(mean: f64, stddev: f64) -> LogNormal<f64> {
    let (mu, sigma) = lognormal_from_mean_stddev(mean, stddev);
    LogNormal::new(mu, sigma).expect("Invalid log-normal parameters")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};
    use rand_distr::Distribution;

    #[test]
    fn test_argmax_first_occurrence_wins() {
        assert_eq!(argmax_index(&[3.0, 7.0, 7.0, 1.0]), Some(1));
        assert_eq!(argmax_index(&[5.0, 5.0, 5.0]), Some(0));
    }

    #[test]
    fn test_argmax_empty_and_nan() {
        assert_eq!(argmax_index(&[]), None);
        assert_eq!(argmax_index(&[f64::NAN, 2.0, 1.0]), Some(1));
        assert_eq!(argmax_index(&[f64::NAN]), None);
    }

    #[test]
    fn test_argmax_negative_values() {
        assert_eq!(argmax_index(&[-4.0, -1.0, -1.0]), Some(1));
    }

    #[test]
    fn test_lognormal_mean_is_close() {
        let dist = lognormal_dist(100.0, 20.0);
        let mut rng = StdRng::seed_from_u64(7);
        let n = 20000;
        let mean = (0..n).map(|_| dist.sample(&mut rng)).sum::<f64>() / n as f64;
        assert!((mean - 100.0).abs() < 2.0, "sample mean {} too far from 100", mean);
    }
}
