//! Sample statistics for released values.
//!
//! These are the numbers a reporting layer prints or plots; the core only
//! computes them.

use serde::Serialize;

/// Sample mean (0 for an empty slice)
pub fn mean(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().sum::<f64>() / samples.len() as f64
}

/// Unbiased sample variance (0 for fewer than two samples)
pub fn variance(samples: &[f64]) -> f64 {
    if samples.len() < 2 {
        return 0.0;
    }
    let m = mean(samples);
    let sum_sq: f64 = samples.iter().map(|x| (x - m).powi(2)).sum();
    sum_sq / (samples.len() - 1) as f64
}

pub fn std_dev(samples: &[f64]) -> f64 {
    variance(samples).sqrt()
}

/// Mean of |x - center|; for Laplace noise around the true value this estimates the scale b
pub fn mean_absolute_deviation(samples: &[f64], center: f64) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().map(|x| (x - center).abs()).sum::<f64>() / samples.len() as f64
}

/// Kolmogorov-Smirnov distance between the empirical CDF of `samples` and `cdf`
pub fn ks_statistic<F>(samples: &[f64], cdf: F) -> f64
where
    F: Fn(f64) -> f64,
{
    if samples.is_empty() {
        return 0.0;
    }
    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let n = sorted.len() as f64;
    sorted
        .iter()
        .enumerate()
        .map(|(i, &x)| {
            let f = cdf(x);
            let below = f - i as f64 / n;
            let above = (i + 1) as f64 / n - f;
            below.max(above)
        })
        .fold(0.0, f64::max)
}

/// Summary of a batch of noisy releases
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NoiseSummary {
    pub count: usize,
    pub mean: f64,
    pub std_dev: f64,
    /// Mean absolute deviation around the sample mean
    pub mean_abs_dev: f64,
    pub min: f64,
    pub max: f64,
}

impl NoiseSummary {
    /// `None` for an empty batch
    pub fn from_samples(samples: &[f64]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }
        let m = mean(samples);
        Some(Self {
            count: samples.len(),
            mean: m,
            std_dev: std_dev(samples),
            mean_abs_dev: mean_absolute_deviation(samples, m),
            min: samples.iter().copied().fold(f64::INFINITY, f64::min),
            max: samples.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_moments_of_small_sample() {
        let xs = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(mean(&xs), 2.5);
        assert!((variance(&xs) - 5.0 / 3.0).abs() < 1e-12);
        assert_eq!(mean_absolute_deviation(&xs, 2.5), 1.0);
    }

    #[test]
    fn test_degenerate_inputs() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(variance(&[3.0]), 0.0);
        assert!(NoiseSummary::from_samples(&[]).is_none());
    }

    #[test]
    fn test_ks_statistic_of_uniform_grid() {
        // Midpoints of n equal cells are at distance 1/(2n) from the uniform CDF
        let n = 100;
        let xs: Vec<f64> = (0..n).map(|i| (i as f64 + 0.5) / n as f64).collect();
        let d = ks_statistic(&xs, |x| x.clamp(0.0, 1.0));
        assert!((d - 0.005).abs() < 1e-12);
    }

    #[test]
    fn test_summary() {
        let summary = NoiseSummary::from_samples(&[40.0, 42.0, 44.0]).unwrap();
        assert_eq!(summary.count, 3);
        assert_eq!(summary.mean, 42.0);
        assert_eq!(summary.min, 40.0);
        assert_eq!(summary.max, 44.0);
        assert!((summary.std_dev - 2.0).abs() < 1e-12);
    }
}
