//! Laplace Mechanism for Differential Privacy
//!
//! Implements the classic Laplace mechanism for achieving (ε, 0)-differential privacy.
//!
//! # Mathematical Foundation
//!
//! For a numeric query f with sensitivity Δf (the maximum change in f when
//! one record changes), the Laplace mechanism adds noise drawn from
//! the Laplace distribution:
//!
//! ```text
//! M(D) = f(D) + Lap(0, Δf/ε)
//! ```
//!
//! The Laplace distribution with scale b = Δf/ε has PDF:
//!
//! ```text
//! p(x) = (1/2b) * e^(-|x|/b)
//! ```
//!
//! # Privacy Guarantee
//!
//! For any two neighboring datasets D and D':
//!
//! ```text
//! P[M(D) ∈ S] ≤ e^ε · P[M(D') ∈ S]
//! ```
//!
//! The guarantee only holds if the sampler really draws from Lap(0, b); the
//! tests check the sampler against [`LaplaceMechanism::cdf`].
//!
//! # Inverse CDF Sampling
//!
//! ```text
//! F(x) = 0.5 + 0.5 * sign(x) * (1 - e^(-|x|/b))
//! F^(-1)(u) = -b * sign(u - 0.5) * ln(1 - 2|u - 0.5|)
//! ```
//!
//! For u ~ Uniform(0, 1), F^(-1)(u) ~ Laplace(0, b)

use rand::Rng;
use tracing::debug;

use crate::error::{DomainError, Result};
use crate::rng::uniform_centered;
use crate::validation::{validate_epsilon, validate_sensitivity};

/// Laplace mechanism for (ε, 0)-differential privacy
pub struct LaplaceMechanism;

impl LaplaceMechanism {
    /// Sample from Laplace(0, scale)
    ///
    /// For U ~ Uniform(-0.5, 0.5):
    /// X = -scale * sign(U) * ln(1 - 2|U|)
    ///
    /// A scale of exactly 0 is the degenerate distribution at 0.
    pub fn sample<R: Rng + ?Sized>(scale: f64, rng: &mut R) -> Result<f64> {
        if !scale.is_finite() || scale < 0.0 {
            return Err(DomainError::new(
                "scale",
                scale,
                "Scale must be finite and non-negative",
            )
            .into());
        }
        if scale == 0.0 {
            return Ok(0.0);
        }

        let u = uniform_centered(rng);
        Ok(-scale * u.signum() * (1.0 - 2.0 * u.abs()).ln())
    }

    /// Compute the scale parameter for given sensitivity and epsilon
    ///
    /// scale = Δf / ε
    pub fn compute_scale(sensitivity: f64, epsilon: f64) -> Result<f64> {
        validate_sensitivity(sensitivity)?;
        validate_epsilon(epsilon)?;
        let scale = sensitivity / epsilon;
        if !scale.is_finite() {
            return Err(DomainError::new(
                "epsilon",
                epsilon,
                "Epsilon so small that the noise scale overflows",
            )
            .into());
        }
        Ok(scale)
    }

    /// Release `true_value` with (ε, 0)-differential privacy
    ///
    /// # Arguments
    /// * `true_value` - The exact query answer
    /// * `sensitivity` - The L1 sensitivity (Δf) of the query
    /// * `epsilon` - Privacy parameter (lower = more private)
    /// * `rng` - Caller-owned random source
    ///
    /// # Returns
    /// true_value + Lap(0, sensitivity/epsilon)
    ///
    /// # Example
    /// ```
    /// use dp_core::{rng::SecureRng, LaplaceMechanism};
    ///
    /// let mut rng = SecureRng::seeded(42);
    /// // Count query has sensitivity 1
    /// let noisy = LaplaceMechanism::release(100.0, 1.0, 0.1, &mut rng).unwrap();
    /// assert!(noisy.is_finite());
    /// ```
    pub fn release<R: Rng + ?Sized>(
        true_value: f64,
        sensitivity: f64,
        epsilon: f64,
        rng: &mut R,
    ) -> Result<f64> {
        let scale = Self::compute_scale(sensitivity, epsilon)?;
        let noise = Self::sample(scale, rng)?;
        debug!(epsilon, sensitivity, scale, "laplace release");
        Ok(true_value + noise)
    }

    /// Var(Lap(0, b)) = 2b²
    pub fn variance(sensitivity: f64, epsilon: f64) -> Result<f64> {
        let scale = Self::compute_scale(sensitivity, epsilon)?;
        Ok(2.0 * scale * scale)
    }

    /// SD = √2 · Δf/ε
    pub fn std_dev(sensitivity: f64, epsilon: f64) -> Result<f64> {
        Ok(Self::variance(sensitivity, epsilon)?.sqrt())
    }

    /// Half-width of the interval holding 95% of the noise
    ///
    /// P(|X| < x) = 1 - e^(-x/b), so x = b · ln(20) ≈ 3b
    pub fn confidence_interval_95(sensitivity: f64, epsilon: f64) -> Result<f64> {
        let scale = Self::compute_scale(sensitivity, epsilon)?;
        Ok(-scale * 0.05_f64.ln())
    }

    /// CDF of Laplace(0, scale) at `x`
    pub fn cdf(x: f64, scale: f64) -> f64 {
        if scale <= 0.0 {
            return if x < 0.0 { 0.0 } else { 1.0 };
        }
        if x < 0.0 {
            0.5 * (x / scale).exp()
        } else {
            1.0 - 0.5 * (-x / scale).exp()
        }
    }
}
