//! Sensitivity Analysis
//!
//! Global sensitivity Δf is the largest change in a query's output when one
//! record of the input changes. Mechanisms calibrate their noise to it.
//!
//! Sensitivities here are derived from the *shape* of the query, never from
//! sample data: comparing f on two concrete neighbouring datasets only gives
//! a witness (a lower bound on Δf), not the maximum. [`witness`] exposes
//! that comparison so declared bounds can be refuted in tests.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, Result};
use crate::validation::{validate_record_count, validate_sensitivity};

/// How a sensitivity value was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SensitivityMetric {
    /// Count over {0, 1} indicator records
    Counting,
    /// Mean over n records bounded in [lo, hi]
    BoundedReal,
    /// Caller-declared upper bound
    Custom,
}

/// Query shapes with known global sensitivity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum QueryKind {
    Counting,
    BoundedMean { lo: f64, hi: f64, n: usize },
    Custom { declared: f64 },
}

/// Δf for a declared query shape
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensitivityResult {
    value: f64,
    metric: SensitivityMetric,
}

impl SensitivityResult {
    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn metric(&self) -> SensitivityMetric {
        self.metric
    }

    /// Whether this bound is consistent with an observed neighbouring difference
    ///
    /// `false` proves the declared bound wrong; `true` proves nothing.
    pub fn covers(&self, witness: f64) -> bool {
        witness <= self.value
    }
}

/// Sensitivity of a query shape
pub fn sensitivity(kind: QueryKind) -> Result<SensitivityResult> {
    match kind {
        QueryKind::Counting => Ok(counting()),
        QueryKind::BoundedMean { lo, hi, n } => bounded_mean(lo, hi, n),
        QueryKind::Custom { declared: value } => declared(value),
    }
}

/// Count over binary records: one record flips the count by exactly one
pub fn counting() -> SensitivityResult {
    SensitivityResult {
        value: 1.0,
        metric: SensitivityMetric::Counting,
    }
}

/// Mean of `n` records each in [lo, hi]: Δf = (hi - lo) / n
pub fn bounded_mean(lo: f64, hi: f64, n: usize) -> Result<SensitivityResult> {
    validate_record_count(n)?;
    if !lo.is_finite() {
        return Err(DomainError::new("lo", lo, "Lower bound must be finite").into());
    }
    if !hi.is_finite() {
        return Err(DomainError::new("hi", hi, "Upper bound must be finite").into());
    }
    if hi < lo {
        return Err(DomainError::new(
            "hi",
            hi,
            format!("Upper bound below lower bound {}", lo),
        )
        .into());
    }

    let value = (hi - lo) / n as f64;
    validate_sensitivity(value)?;
    Ok(SensitivityResult {
        value,
        metric: SensitivityMetric::BoundedReal,
    })
}

/// Accept a caller-declared upper bound on Δf without inferring anything
pub fn declared(value: f64) -> Result<SensitivityResult> {
    validate_sensitivity(value)?;
    Ok(SensitivityResult {
        value,
        metric: SensitivityMetric::Custom,
    })
}

/// |f(d1) - f(d2)| for one pair of neighbouring datasets
pub fn witness<D, F>(query: F, d1: &D, d2: &D) -> f64
where
    D: ?Sized,
    F: Fn(&D) -> f64,
{
    (query(d1) - query(d2)).abs()
}
