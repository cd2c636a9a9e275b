//! Mechanism selection.
//!
//! Both mechanisms share the [`Query`] contract and differ only in how the
//! noise scale is derived, so they are a plain enum picked at the call site.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::gaussian::GaussianMechanism;
use crate::laplace::LaplaceMechanism;
use crate::params::PrivacyParams;
use crate::sensitivity::SensitivityResult;

/// One release request; built per query and never stored
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub true_value: f64,
    pub sensitivity: SensitivityResult,
    pub params: PrivacyParams,
}

impl Query {
    pub fn new(true_value: f64, sensitivity: SensitivityResult, params: PrivacyParams) -> Self {
        Self {
            true_value,
            sensitivity,
            params,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mechanism {
    /// Lap(0, Δf/ε); pure ε-DP, any δ in the params is unused
    Laplace,
    /// N(0, σ²) with the classical σ; needs δ > 0
    Gaussian,
}

impl Mechanism {
    /// Laplace for pure parameters, Gaussian otherwise
    pub fn for_params(params: &PrivacyParams) -> Self {
        if params.is_pure() {
            Mechanism::Laplace
        } else {
            Mechanism::Gaussian
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Mechanism::Laplace => "laplace",
            Mechanism::Gaussian => "gaussian",
        }
    }

    /// Laplace scale b or Gaussian σ for this query, validating every input
    pub fn noise_scale(&self, query: &Query) -> Result<f64> {
        query.params.validate()?;
        let sensitivity = query.sensitivity.value();
        match self {
            Mechanism::Laplace => LaplaceMechanism::compute_scale(sensitivity, query.params.epsilon),
            Mechanism::Gaussian => GaussianMechanism::compute_sigma(
                sensitivity,
                query.params.epsilon,
                query.params.delta,
            ),
        }
    }

    /// Noisy answer for `query`
    pub fn release<R: Rng + ?Sized>(&self, query: &Query, rng: &mut R) -> Result<f64> {
        let scale = self.noise_scale(query)?;
        self.perturb(query.true_value, scale, rng)
    }

    /// Add noise at an already-validated scale
    pub(crate) fn perturb<R: Rng + ?Sized>(
        &self,
        true_value: f64,
        scale: f64,
        rng: &mut R,
    ) -> Result<f64> {
        let noise = match self {
            Mechanism::Laplace => LaplaceMechanism::sample(scale, rng)?,
            Mechanism::Gaussian => GaussianMechanism::sample(scale, rng)?,
        };
        Ok(true_value + noise)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::SecureRng;
    use crate::sensitivity::{bounded_mean, counting};

    #[test]
    fn test_for_params() {
        let pure = PrivacyParams::pure(1.0).unwrap();
        let approx = PrivacyParams::approximate(1.0, 1e-5).unwrap();
        assert_eq!(Mechanism::for_params(&pure), Mechanism::Laplace);
        assert_eq!(Mechanism::for_params(&approx), Mechanism::Gaussian);
    }

    #[test]
    fn test_noise_scale_per_variant() {
        let query = Query::new(
            42.0,
            counting(),
            PrivacyParams::approximate(0.5, 1e-5).unwrap(),
        );
        assert_eq!(Mechanism::Laplace.noise_scale(&query).unwrap(), 2.0);
        let sigma = Mechanism::Gaussian.noise_scale(&query).unwrap();
        let expected = GaussianMechanism::compute_sigma(1.0, 0.5, 1e-5).unwrap();
        assert_eq!(sigma, expected);
    }

    #[test]
    fn test_gaussian_rejects_pure_query() {
        let query = Query::new(1.0, counting(), PrivacyParams::pure(1.0).unwrap());
        let mut rng = SecureRng::seeded(0);
        assert!(Mechanism::Gaussian.release(&query, &mut rng).unwrap_err().is_domain());
    }

    #[test]
    fn test_hand_built_params_are_revalidated() {
        let query = Query::new(
            1.0,
            counting(),
            PrivacyParams {
                epsilon: -1.0,
                delta: 0.0,
            },
        );
        let mut rng = SecureRng::seeded(0);
        assert!(Mechanism::Laplace.release(&query, &mut rng).is_err());
    }

    #[test]
    fn test_release_matches_direct_mechanism_calls() {
        let sensitivity = bounded_mean(0.0, 1.0, 100).unwrap();
        let params = PrivacyParams::approximate(0.8, 1e-6).unwrap();
        let query = Query::new(0.5, sensitivity, params);

        let mut a = SecureRng::seeded(5);
        let mut b = SecureRng::seeded(5);
        let via_enum = Mechanism::Gaussian.release(&query, &mut a).unwrap();
        let direct = GaussianMechanism::release(0.5, 0.01, 0.8, 1e-6, &mut b).unwrap();
        assert_eq!(via_enum, direct);

        let mut a = SecureRng::seeded(6);
        let mut b = SecureRng::seeded(6);
        let via_enum = Mechanism::Laplace.release(&query, &mut a).unwrap();
        let direct = LaplaceMechanism::release(0.5, 0.01, 0.8, &mut b).unwrap();
        assert_eq!(via_enum, direct);
    }
}
