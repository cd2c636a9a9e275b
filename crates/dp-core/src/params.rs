//! Privacy parameters (ε, δ).

use std::fmt;
use std::ops::Add;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::validation::{validate_delta, validate_epsilon, validate_gaussian_delta};

/// Privacy parameters for one release, a ledger capacity, or a spend total
///
/// Constructors validate; mechanisms and the ledger re-validate on use, so a
/// value assembled field-by-field cannot bypass the checks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PrivacyParams {
    /// Privacy loss parameter epsilon (smaller = more private)
    pub epsilon: f64,
    /// Failure probability delta; 0 denotes pure DP
    #[serde(default)]
    pub delta: f64,
}

impl PrivacyParams {
    /// (ε, δ) with ε > 0 and δ in [0, 1)
    pub fn new(epsilon: f64, delta: f64) -> Result<Self> {
        validate_epsilon(epsilon)?;
        validate_delta(delta)?;
        Ok(Self { epsilon, delta })
    }

    /// Pure ε-DP parameters (δ = 0)
    pub fn pure(epsilon: f64) -> Result<Self> {
        Self::new(epsilon, 0.0)
    }

    /// Approximate (ε, δ)-DP parameters with δ in (0, 1)
    pub fn approximate(epsilon: f64, delta: f64) -> Result<Self> {
        validate_epsilon(epsilon)?;
        validate_gaussian_delta(delta)?;
        Ok(Self { epsilon, delta })
    }

    /// Nothing spent. Not a valid per-query parameter set.
    pub const fn zero() -> Self {
        Self {
            epsilon: 0.0,
            delta: 0.0,
        }
    }

    pub(crate) const fn from_validated(epsilon: f64, delta: f64) -> Self {
        Self { epsilon, delta }
    }

    /// Re-check the invariants on a value that may have been built by hand
    pub fn validate(&self) -> Result<()> {
        validate_epsilon(self.epsilon)?;
        validate_delta(self.delta)?;
        Ok(())
    }

    pub fn is_pure(&self) -> bool {
        self.delta == 0.0
    }

    /// Component-wise difference, floored at zero
    pub fn saturating_sub(self, other: Self) -> Self {
        Self {
            epsilon: (self.epsilon - other.epsilon).max(0.0),
            delta: (self.delta - other.delta).max(0.0),
        }
    }
}

impl Default for PrivacyParams {
    fn default() -> Self {
        Self::zero()
    }
}

/// Basic composition of two spends
impl Add for PrivacyParams {
    type Output = PrivacyParams;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            epsilon: self.epsilon + rhs.epsilon,
            delta: self.delta + rhs.delta,
        }
    }
}

impl fmt::Display for PrivacyParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(ε={}, δ={})", self.epsilon, self.delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors() {
        let pure = PrivacyParams::pure(1.0).unwrap();
        assert!(pure.is_pure());
        assert_eq!(pure.delta, 0.0);

        let approx = PrivacyParams::approximate(1.0, 1e-5).unwrap();
        assert!(!approx.is_pure());

        assert!(PrivacyParams::pure(0.0).is_err());
        assert!(PrivacyParams::new(1.0, 1.0).is_err());
        assert!(PrivacyParams::approximate(1.0, 0.0).is_err());
    }

    #[test]
    fn test_hand_built_value_fails_validation() {
        let bogus = PrivacyParams {
            epsilon: -2.0,
            delta: 0.0,
        };
        assert!(bogus.validate().is_err());
        assert!(PrivacyParams::zero().validate().is_err());
    }

    #[test]
    fn test_add_and_saturating_sub() {
        let a = PrivacyParams::new(0.5, 1e-6).unwrap();
        let b = PrivacyParams::new(0.25, 2e-6).unwrap();
        let sum = a + b;
        assert_eq!(sum.epsilon, 0.75);
        assert!((sum.delta - 3e-6).abs() < 1e-18);

        let diff = a.saturating_sub(b);
        assert_eq!(diff.epsilon, 0.25);
        assert_eq!(diff.delta, 0.0);
    }

    #[test]
    fn test_delta_defaults_to_zero_when_deserialized() {
        let params: PrivacyParams = serde_json::from_str(r#"{"epsilon": 0.5}"#).unwrap();
        assert_eq!(params, PrivacyParams::pure(0.5).unwrap());
    }
}
