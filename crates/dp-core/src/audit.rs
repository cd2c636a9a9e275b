//! Empirical Indistinguishability Audit
//!
//! Runs a mechanism many times on two neighbouring datasets and compares
//! how often an output event fires on each side. For an ε-DP mechanism
//!
//! ```text
//! e^-ε ≤ P[M(A) ∈ S] / P[M(B) ∈ S] ≤ e^ε
//! ```
//!
//! so a measured ratio far outside that band points at a broken sampler or
//! a miscomputed scale.
//!
//! # Tolerance
//!
//! The measured ratio is noisy, more so with few trials. The audit compares
//! |ln(p_A / p_B)| against ε plus `z` standard errors, where the standard
//! error of the log ratio comes from the delta method:
//!
//! ```text
//! SE ≈ √((1 - p_A)/(n·p_A) + (1 - p_B)/(n·p_B))
//! ```
//!
//! Both the log ratio and its SE use continuity-corrected probabilities
//! ((k + ½)/(n + 1)), so an event that never fires on one side yields a
//! finite ratio and a wide tolerance instead of ln(1e-12). The floored
//! p_A / p_B is still what [`AuditResult::empirical_ratio`] reports.
//!
//! A passing audit is a sanity check, never a proof of privacy.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{DomainError, Result};
use crate::validation::{validate_epsilon, validate_trials};

/// Auditor settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Standard errors of slack granted above ε
    pub confidence_z: f64,
    /// Fewer events than this on either side and the bound cannot be confirmed
    pub min_events: usize,
    /// Lower bound applied to empirical probabilities before dividing
    pub probability_floor: f64,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            confidence_z: 3.0,
            min_events: 30,
            probability_floor: 1e-12,
        }
    }
}

impl AuditConfig {
    pub fn with_confidence_z(mut self, z: f64) -> Self {
        self.confidence_z = z;
        self
    }

    pub fn with_min_events(mut self, min_events: usize) -> Self {
        self.min_events = min_events;
        self
    }

    pub fn with_probability_floor(mut self, floor: f64) -> Self {
        self.probability_floor = floor;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.confidence_z.is_finite() || self.confidence_z < 0.0 {
            return Err(DomainError::new(
                "confidence_z",
                self.confidence_z,
                "Confidence multiplier must be finite and non-negative",
            )
            .into());
        }
        if !(self.probability_floor > 0.0 && self.probability_floor < 1.0) {
            return Err(DomainError::new(
                "probability_floor",
                self.probability_floor,
                "Probability floor must be in (0, 1)",
            )
            .into());
        }
        Ok(())
    }
}

/// Outcome class of an audit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditVerdict {
    /// Ratio within e^ε (plus tolerance) with enough events to say so
    Passed,
    /// No violation seen, but too few events to confirm the bound
    Inconclusive,
    /// Ratio beyond e^ε even after the trial-count tolerance
    Violation,
}

/// One audit run
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AuditResult {
    /// p_A / p_B (floored probabilities)
    pub empirical_ratio: f64,
    /// e^ε
    pub theoretical_bound: f64,
    /// True only for [`AuditVerdict::Passed`]
    pub passed: bool,
    pub verdict: AuditVerdict,
    pub epsilon: f64,
    pub trials: usize,
    pub events_a: usize,
    pub events_b: usize,
    pub p_a: f64,
    pub p_b: f64,
    /// Allowed excess of |ln ratio| over ε
    pub tolerance: f64,
}

impl AuditResult {
    /// max(ratio, 1/ratio)
    pub fn worst_ratio(&self) -> f64 {
        self.empirical_ratio.max(1.0 / self.empirical_ratio)
    }

    /// e^(ε + tolerance), the largest ratio that is not a violation
    pub fn allowed_ratio(&self) -> f64 {
        (self.epsilon + self.tolerance).exp()
    }
}

/// Runs indistinguishability audits with a fixed configuration
#[derive(Debug, Clone, Default)]
pub struct Auditor {
    config: AuditConfig,
}

impl Auditor {
    pub fn new(config: AuditConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AuditConfig {
        &self.config
    }

    /// Audit `mechanism` on neighbouring datasets `dataset_a` / `dataset_b`
    ///
    /// # Arguments
    /// * `mechanism` - Releases a noisy value for a dataset
    /// * `event` - Output predicate whose frequency is compared
    /// * `trials` - Runs per side
    /// * `epsilon` - The guarantee the mechanism claims
    /// * `rng` - Passed through to every mechanism call
    ///
    /// Mechanism errors abort the audit and are returned as-is.
    #[allow(clippy::too_many_arguments)]
    pub fn audit<D, R, M, E>(
        &self,
        mut mechanism: M,
        dataset_a: &D,
        dataset_b: &D,
        mut event: E,
        trials: usize,
        epsilon: f64,
        rng: &mut R,
    ) -> Result<AuditResult>
    where
        D: ?Sized,
        R: Rng + ?Sized,
        M: FnMut(&D, &mut R) -> Result<f64>,
        E: FnMut(f64) -> bool,
    {
        validate_trials(trials)?;
        validate_epsilon(epsilon)?;
        self.config.validate()?;

        let mut count_events = |dataset: &D, rng: &mut R| -> Result<usize> {
            let mut events = 0;
            for _ in 0..trials {
                if event(mechanism(dataset, &mut *rng)?) {
                    events += 1;
                }
            }
            Ok(events)
        };
        let events_a = count_events(dataset_a, &mut *rng)?;
        let events_b = count_events(dataset_b, &mut *rng)?;

        let result = self.evaluate(events_a, events_b, trials, epsilon)?;
        match result.verdict {
            AuditVerdict::Violation => warn!(
                epsilon,
                trials,
                ratio = result.empirical_ratio,
                bound = result.theoretical_bound,
                tolerance = result.tolerance,
                "indistinguishability audit found a violation"
            ),
            verdict => info!(
                epsilon,
                trials,
                ratio = result.empirical_ratio,
                bound = result.theoretical_bound,
                ?verdict,
                "indistinguishability audit finished"
            ),
        }
        Ok(result)
    }

    /// Score event counts from an audit already run
    pub fn evaluate(
        &self,
        events_a: usize,
        events_b: usize,
        trials: usize,
        epsilon: f64,
    ) -> Result<AuditResult> {
        validate_trials(trials)?;
        validate_epsilon(epsilon)?;
        if events_a.max(events_b) > trials {
            return Err(DomainError::new(
                "events",
                events_a.max(events_b) as f64,
                format!("Event count exceeds trial count {}", trials),
            )
            .into());
        }

        let n = trials as f64;
        let floor = self.config.probability_floor;
        let p_a = (events_a as f64 / n).max(floor);
        let p_b = (events_b as f64 / n).max(floor);
        let empirical_ratio = p_a / p_b;

        // The floored ratio is only reported; the verdict uses the same
        // continuity-corrected estimator as the standard error, so a side
        // with zero events does not turn into ln(1e-12).
        let tolerance =
            self.config.confidence_z * log_ratio_standard_error(events_a, events_b, n);
        let excess = corrected_log_ratio(events_a, events_b).abs() - epsilon;

        let verdict = if excess > tolerance {
            AuditVerdict::Violation
        } else if events_a.min(events_b) < self.config.min_events {
            AuditVerdict::Inconclusive
        } else {
            AuditVerdict::Passed
        };

        Ok(AuditResult {
            empirical_ratio,
            theoretical_bound: epsilon.exp(),
            passed: verdict == AuditVerdict::Passed,
            verdict,
            epsilon,
            trials,
            events_a,
            events_b,
            p_a,
            p_b,
            tolerance,
        })
    }
}

/// ln(p_A / p_B) with continuity-corrected proportions; the (n + 1) cancels
fn corrected_log_ratio(events_a: usize, events_b: usize) -> f64 {
    ((events_a as f64 + 0.5) / (events_b as f64 + 0.5)).ln()
}

/// Delta-method SE of ln(p_A / p_B) with continuity-corrected proportions
fn log_ratio_standard_error(events_a: usize, events_b: usize, n: f64) -> f64 {
    let term = |events: usize| {
        let p = (events as f64 + 0.5) / (n + 1.0);
        (1.0 - p) / (n * p)
    };
    (term(events_a) + term(events_b)).sqrt()
}

/// [`Auditor::audit`] with the default configuration
pub fn audit<D, R, M, E>(
    mechanism: M,
    dataset_a: &D,
    dataset_b: &D,
    event: E,
    trials: usize,
    epsilon: f64,
    rng: &mut R,
) -> Result<AuditResult>
where
    D: ?Sized,
    R: Rng + ?Sized,
    M: FnMut(&D, &mut R) -> Result<f64>,
    E: FnMut(f64) -> bool,
{
    Auditor::default().audit(mechanism, dataset_a, dataset_b, event, trials, epsilon, rng)
}
