//! Input Validation for Differential Privacy Parameters
//!
//! Every mechanism, the ledger and the auditor run their inputs through
//! these checks before doing any work. Violations are returned as
//! [`DomainError`]s and are never clamped.
//!
//! # Parameter Constraints
//!
//! ## Epsilon (ε)
//! - Must be positive (> 0) and finite
//! - Smaller = more private, but more noise
//! - Values > 10 provide minimal privacy protection (accepted, logged)
//!
//! ## Delta (δ)
//! - Must be in [0, 1)
//! - δ = 0 gives pure ε-DP (Laplace mechanism)
//! - The Gaussian mechanism needs δ in (0, 1)
//!
//! ## Sensitivity (Δf)
//! - Must be non-negative and finite
//! - Depends on the query type:
//!   - Count query: Δf = 1
//!   - Mean query over n records in [lo, hi]: Δf = (hi - lo) / n

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::DomainError;
use crate::params::PrivacyParams;

/// Above this epsilon the guarantee is nearly meaningless; accepted with a warning
pub const MAX_RECOMMENDED_EPSILON: f64 = 10.0;

type Validation = std::result::Result<(), DomainError>;

/// Validate epsilon parameter
///
/// # Constraints
/// - Must be finite
/// - Must be positive (> 0); tiny values are valid, the noise scale is checked where it is derived
/// - Values above [`MAX_RECOMMENDED_EPSILON`] pass but are logged
pub fn validate_epsilon(epsilon: f64) -> Validation {
    if !epsilon.is_finite() {
        return Err(DomainError::new(
            "epsilon",
            epsilon,
            "Epsilon must be a finite number",
        ));
    }

    if epsilon <= 0.0 {
        return Err(DomainError::new("epsilon", epsilon, "Epsilon must be positive"));
    }

    if epsilon > MAX_RECOMMENDED_EPSILON {
        warn!(
            epsilon,
            ceiling = MAX_RECOMMENDED_EPSILON,
            "epsilon above recommended ceiling; privacy guarantee is weak"
        );
    }

    Ok(())
}

/// Validate delta parameter
///
/// # Constraints
/// - Must be finite
/// - Must be in [0, 1)
pub fn validate_delta(delta: f64) -> Validation {
    if !delta.is_finite() {
        return Err(DomainError::new("delta", delta, "Delta must be a finite number"));
    }

    if delta < 0.0 {
        return Err(DomainError::new("delta", delta, "Delta must be non-negative"));
    }

    if delta >= 1.0 {
        return Err(DomainError::new("delta", delta, "Delta must be less than 1"));
    }

    Ok(())
}

/// Validate delta for the Gaussian mechanism, which is inherently approximate
///
/// Same as [`validate_delta`] but additionally rejects δ = 0.
pub fn validate_gaussian_delta(delta: f64) -> Validation {
    validate_delta(delta)?;
    if delta == 0.0 {
        return Err(DomainError::new(
            "delta",
            delta,
            "Gaussian mechanism requires delta > 0",
        ));
    }
    Ok(())
}

/// Validate sensitivity parameter
///
/// # Constraints
/// - Must be finite
/// - Must be non-negative (a zero-sensitivity query needs no noise)
pub fn validate_sensitivity(sensitivity: f64) -> Validation {
    if !sensitivity.is_finite() {
        return Err(DomainError::new(
            "sensitivity",
            sensitivity,
            "Sensitivity must be a finite number",
        ));
    }

    if sensitivity < 0.0 {
        return Err(DomainError::new(
            "sensitivity",
            sensitivity,
            "Sensitivity must be non-negative",
        ));
    }

    Ok(())
}

/// Validate a record count used as a divisor
pub fn validate_record_count(n: usize) -> Validation {
    if n == 0 {
        return Err(DomainError::new(
            "record_count",
            0.0,
            "Record count must be positive",
        ));
    }
    Ok(())
}

/// Validate an audit trial count
pub fn validate_trials(trials: usize) -> Validation {
    if trials == 0 {
        return Err(DomainError::new("trials", 0.0, "Trial count must be positive"));
    }
    Ok(())
}

/// Validate all DP parameters together
///
/// # Arguments
/// * `epsilon` - Privacy parameter
/// * `delta` - Failure probability (0 for pure ε-DP)
/// * `sensitivity` - Query sensitivity
pub fn validate_dp_parameters(epsilon: f64, delta: f64, sensitivity: f64) -> Validation {
    validate_epsilon(epsilon)?;
    validate_delta(delta)?;
    validate_sensitivity(sensitivity)?;
    Ok(())
}

/// Validate that dataset size is sufficient for the delta parameter
///
/// For meaningful (ε, δ)-DP we need δ < 1/n, otherwise the δ term
/// permits releasing a whole record.
pub fn validate_delta_for_dataset(delta: f64, dataset_size: usize) -> Validation {
    validate_record_count(dataset_size)?;

    let max_delta = 1.0 / (dataset_size as f64);

    if delta >= max_delta {
        return Err(DomainError::new(
            "delta",
            delta,
            format!(
                "Delta too large for dataset size {}: should be < {} (1/n)",
                dataset_size, max_delta
            ),
        ));
    }

    Ok(())
}

/// Privacy levels for parameter recommendations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrivacyLevel {
    VeryHigh,
    High,
    Medium,
    Low,
}

/// Recommended privacy parameters for common use cases
#[derive(Debug, Clone, Copy)]
pub struct RecommendedParameters {
    pub params: PrivacyParams,
    pub description: &'static str,
}

/// Get recommended parameters for different privacy levels
pub fn recommended_parameters(level: PrivacyLevel) -> RecommendedParameters {
    let (epsilon, delta, description) = match level {
        PrivacyLevel::VeryHigh => (0.1, 1e-9, "Very high privacy: sensitive individual records"),
        PrivacyLevel::High => (0.5, 1e-7, "High privacy: suitable for most aggregate analytics"),
        PrivacyLevel::Medium => (1.0, 1e-6, "Medium privacy: balance of utility and privacy"),
        PrivacyLevel::Low => (3.0, 1e-5, "Lower privacy: higher utility, less noise"),
    };
    RecommendedParameters {
        params: PrivacyParams::from_validated(epsilon, delta),
        description,
    }
}
