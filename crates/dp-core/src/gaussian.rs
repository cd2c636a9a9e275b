//! Gaussian Mechanism for Differential Privacy
//!
//! Implements the Gaussian mechanism for achieving (ε, δ)-differential privacy.
//!
//! # Mathematical Foundation
//!
//! For a numeric query f with sensitivity Δf, the Gaussian mechanism adds
//! noise drawn from a normal distribution:
//!
//! ```text
//! M(D) = f(D) + N(0, σ²)
//! σ = √(2 ln(1.25/δ)) · Δf / ε
//! ```
//!
//! This is the classical calibration (Dwork & Roth, Theorem A.1), not the
//! tighter Balle-Wang analytic bound. Its proof assumes ε ≤ 1; larger ε is
//! accepted but logged, see [`GaussianMechanism::classical_bound_holds`].
//!
//! # Privacy Guarantee
//!
//! ```text
//! P[M(D) ∈ S] ≤ e^ε · P[M(D') ∈ S] + δ
//! ```
//!
//! δ = 0 is rejected: Gaussian noise cannot give pure DP.
//!
//! # Box-Muller Transform
//!
//! ```text
//! Given U₁ ∈ (0, 1], U₂ ∈ [0, 1):
//! Z = √(-2 ln U₁) · cos(2π U₂)  ~ N(0, 1)
//! ```

use rand::Rng;
use tracing::{debug, warn};

use crate::error::{DomainError, Result};
use crate::rng::box_muller_pair;
use crate::validation::{validate_epsilon, validate_gaussian_delta, validate_sensitivity};

/// Largest ε for which the classical σ formula is proven
pub const CLASSICAL_EPSILON_LIMIT: f64 = 1.0;

/// Gaussian mechanism for (ε, δ)-differential privacy
pub struct GaussianMechanism;

impl GaussianMechanism {
    /// Sample from standard normal N(0, 1)
    pub fn sample_standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
        let (u1, u2) = box_muller_pair(rng);
        (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
    }

    /// Sample from N(0, σ²); σ = 0 is the point mass at 0
    pub fn sample<R: Rng + ?Sized>(sigma: f64, rng: &mut R) -> Result<f64> {
        if !sigma.is_finite() || sigma < 0.0 {
            return Err(DomainError::new(
                "sigma",
                sigma,
                "Sigma must be finite and non-negative",
            )
            .into());
        }
        if sigma == 0.0 {
            return Ok(0.0);
        }
        Ok(Self::sample_standard_normal(rng) * sigma)
    }

    /// Whether the classical calibration is proven for this ε
    pub fn classical_bound_holds(epsilon: f64) -> bool {
        epsilon <= CLASSICAL_EPSILON_LIMIT
    }

    /// Compute the required σ for (ε, δ)-differential privacy
    ///
    /// σ = √(2 ln(1.25/δ)) · Δf / ε
    pub fn compute_sigma(sensitivity: f64, epsilon: f64, delta: f64) -> Result<f64> {
        validate_sensitivity(sensitivity)?;
        validate_epsilon(epsilon)?;
        validate_gaussian_delta(delta)?;

        if !Self::classical_bound_holds(epsilon) {
            warn!(
                epsilon,
                limit = CLASSICAL_EPSILON_LIMIT,
                "classical gaussian calibration is only proven for epsilon <= 1"
            );
        }

        let sigma = (2.0 * (1.25 / delta).ln()).sqrt() * (sensitivity / epsilon);
        if !sigma.is_finite() {
            return Err(DomainError::new(
                "epsilon",
                epsilon,
                "Epsilon so small that sigma overflows",
            )
            .into());
        }
        Ok(sigma)
    }

    /// Release `true_value` with (ε, δ)-differential privacy
    ///
    /// # Example
    /// ```
    /// use dp_core::{rng::SecureRng, GaussianMechanism};
    ///
    /// let mut rng = SecureRng::seeded(7);
    /// // Mean of 1000 records in [0, 100]
    /// let noisy = GaussianMechanism::release(50.0, 0.1, 0.5, 1e-6, &mut rng).unwrap();
    /// assert!(noisy.is_finite());
    /// ```
    pub fn release<R: Rng + ?Sized>(
        true_value: f64,
        sensitivity: f64,
        epsilon: f64,
        delta: f64,
        rng: &mut R,
    ) -> Result<f64> {
        let sigma = Self::compute_sigma(sensitivity, epsilon, delta)?;
        let noise = Self::sample(sigma, rng)?;
        debug!(epsilon, delta, sensitivity, sigma, "gaussian release");
        Ok(true_value + noise)
    }

    /// σ²
    pub fn variance(sensitivity: f64, epsilon: f64, delta: f64) -> Result<f64> {
        let sigma = Self::compute_sigma(sensitivity, epsilon, delta)?;
        Ok(sigma * sigma)
    }

    /// For N(0, σ²), 95% of values fall within [-1.96σ, 1.96σ]
    pub fn confidence_interval_95(sensitivity: f64, epsilon: f64, delta: f64) -> Result<f64> {
        let sigma = Self::compute_sigma(sensitivity, epsilon, delta)?;
        Ok(1.96 * sigma)
    }
}
