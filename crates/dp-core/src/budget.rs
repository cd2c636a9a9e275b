//! Privacy Budget Accounting
//!
//! Tracks privacy budget consumption for one privacy-protected session
//! under basic composition.
//!
//! # Why Budget Tracking Matters
//!
//! Each differentially private release consumes some privacy budget (ε, δ).
//! Without tracking, an adversary could ask the same question many times
//! and average the noise away.
//!
//! # Basic Composition
//!
//! Releasing k results with (ε_i, δ_i)-DP each is (Σε_i, Σδ_i)-DP overall.
//! A charge is admitted only if both sums stay within the capacity. Advanced
//! and Rényi composition are deliberately not offered.
//!
//! # Budget Exhaustion
//!
//! Once ε is used up the ledger is exhausted and refuses every further
//! charge. Spend never decreases; the only way back is the explicitly
//! named [`BudgetLedger::administrative_reset`].

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{DomainError, DpError, Result};
use crate::params::PrivacyParams;

/// Rounding allowance per accumulated term, relative to the capacity
///
/// Summing k charges in f64 can drift by at most about k·ε_mach of the
/// total. The ledger forgives exactly that much, which keeps 0.1 + 0.2 from
/// being refused against a capacity of 0.3 without admitting any request
/// whose exact value exceeds what remains.
pub const ACCOUNTING_SLACK: f64 = f64::EPSILON;

/// Ledger lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerState {
    /// Charges are still possible
    Open,
    /// ε is used up; history stays readable
    Exhausted,
}

/// Budget ledger for one session
#[derive(Debug, Clone, Serialize)]
pub struct BudgetLedger {
    capacity: PrivacyParams,
    spent: PrivacyParams,
    /// One entry per accepted charge, in order
    history: Vec<PrivacyParams>,
}


impl BudgetLedger {
    /// Create a ledger with capacity (ε_total, δ_total)
    ///
    /// δ_total may be 0 for a pure-DP session.
    pub fn new(capacity: PrivacyParams) -> Result<Self> {
        capacity.validate()?;
        Ok(Self {
            capacity,
            spent: PrivacyParams::zero(),
            history: Vec::new(),
        })
    }

    /// Pure-DP session with capacity (ε_total, 0)
    pub fn pure(total_epsilon: f64) -> Result<Self> {
        Self::new(PrivacyParams::pure(total_epsilon)?)
    }

    pub fn capacity(&self) -> PrivacyParams {
        self.capacity
    }

    pub fn spent(&self) -> PrivacyParams {
        self.spent
    }

    pub fn history(&self) -> &[PrivacyParams] {
        &self.history
    }

    /// Number of accepted charges
    pub fn query_count(&self) -> usize {
        self.history.len()
    }

    /// capacity − spent
    pub fn remaining(&self) -> PrivacyParams {
        self.capacity.saturating_sub(self.spent)
    }

    pub fn state(&self) -> LedgerState {
        if self.is_exhausted() {
            LedgerState::Exhausted
        } else {
            LedgerState::Open
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.capacity.epsilon - self.spent.epsilon <= self.slack(self.capacity.epsilon)
    }

    /// Worst-case rounding of the running sum plus one more term; zero for a zero limit
    fn slack(&self, limit: f64) -> f64 {
        (self.history.len() + 1) as f64 * ACCOUNTING_SLACK * limit
    }

    /// `total <= limit`, forgiving only float rounding of the sum
    fn within(&self, total: f64, limit: f64) -> bool {
        total <= limit + self.slack(limit)
    }

    /// Whether `charge(params)` would succeed right now
    pub fn can_charge(&self, params: &PrivacyParams) -> bool {
        params.validate().is_ok() && self.check(params).is_ok()
    }

    fn check(&self, params: &PrivacyParams) -> Result<()> {
        let proposed = self.spent + *params;
        if self.is_exhausted()
            || !self.within(proposed.epsilon, self.capacity.epsilon)
            || !self.within(proposed.delta, self.capacity.delta)
        {
            return Err(DpError::BudgetExceeded {
                requested: *params,
                remaining: self.remaining(),
            });
        }
        Ok(())
    }

    /// Charge one release against the budget
    ///
    /// Either the full `params` are admitted (history appended, spend
    /// updated) or nothing changes and [`DpError::BudgetExceeded`] reports
    /// what is left. Never clips a request to fit.
    pub fn charge(&mut self, params: PrivacyParams) -> Result<()> {
        params.validate()?;

        if let Err(e) = self.check(&params) {
            warn!(
                requested_epsilon = params.epsilon,
                requested_delta = params.delta,
                remaining_epsilon = self.remaining().epsilon,
                remaining_delta = self.remaining().delta,
                "privacy charge rejected"
            );
            return Err(e);
        }

        let total = self.spent + params;
        // Only rounding can put the sum above capacity here
        self.spent = PrivacyParams {
            epsilon: total.epsilon.min(self.capacity.epsilon),
            delta: total.delta.min(self.capacity.delta),
        };
        self.history.push(params);

        debug!(
            epsilon = params.epsilon,
            delta = params.delta,
            spent_epsilon = self.spent.epsilon,
            spent_delta = self.spent.delta,
            queries = self.history.len(),
            "privacy charge accepted"
        );
        if self.is_exhausted() {
            info!(
                capacity_epsilon = self.capacity.epsilon,
                queries = self.history.len(),
                "privacy budget exhausted"
            );
        }
        Ok(())
    }

    /// Discard all spend and history
    ///
    /// Administrative only: a reset ledger no longer bounds what the
    /// session has already released.
    pub fn administrative_reset(&mut self) {
        warn!(
            discarded_epsilon = self.spent.epsilon,
            discarded_delta = self.spent.delta,
            discarded_queries = self.history.len(),
            "privacy ledger administratively reset"
        );
        self.spent = PrivacyParams::zero();
        self.history.clear();
    }

    /// Serialize the ledger state for reporting
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// A ledger shared between threads
///
/// Check and update happen under one lock, so two concurrent charges can
/// never both pass against the same stale spend.
#[derive(Debug, Clone)]
pub struct SharedLedger {
    inner: Arc<Mutex<BudgetLedger>>,
}

impl SharedLedger {
    pub fn new(ledger: BudgetLedger) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ledger)),
        }
    }

    pub fn charge(&self, params: PrivacyParams) -> Result<()> {
        self.inner.lock().charge(params)
    }

    pub fn remaining(&self) -> PrivacyParams {
        self.inner.lock().remaining()
    }

    pub fn spent(&self) -> PrivacyParams {
        self.inner.lock().spent()
    }

    pub fn state(&self) -> LedgerState {
        self.inner.lock().state()
    }

    pub fn query_count(&self) -> usize {
        self.inner.lock().query_count()
    }

    /// Point-in-time copy of the ledger
    pub fn snapshot(&self) -> BudgetLedger {
        self.inner.lock().clone()
    }

    pub fn administrative_reset(&self) {
        self.inner.lock().administrative_reset()
    }
}

impl From<BudgetLedger> for SharedLedger {
    fn from(ledger: BudgetLedger) -> Self {
        Self::new(ledger)
    }
}

/// Total privacy loss of a sequence of releases under basic composition
///
/// For k (ε_i, δ_i)-DP mechanisms: (Σε_i, Σδ_i)
pub fn basic_composition(charges: &[PrivacyParams]) -> PrivacyParams {
    charges
        .iter()
        .fold(PrivacyParams::zero(), |total, params| total + *params)
}

/// Total cost of `count` identical releases
pub fn repeated(params: PrivacyParams, count: usize) -> Result<PrivacyParams> {
    params.validate()?;
    if count == 0 {
        return Err(DomainError::new("count", 0.0, "Query count must be positive").into());
    }
    Ok(PrivacyParams {
        epsilon: params.epsilon * count as f64,
        delta: params.delta * count as f64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pure(epsilon: f64) -> PrivacyParams {
        PrivacyParams::pure(epsilon).unwrap()
    }

    #[test]
    fn test_ledger_creation() {
        let ledger = BudgetLedger::pure(1.0).unwrap();
        assert_eq!(ledger.capacity(), pure(1.0));
        assert_eq!(ledger.remaining(), pure(1.0));
        assert_eq!(ledger.spent(), PrivacyParams::zero());
        assert_eq!(ledger.query_count(), 0);
        assert_eq!(ledger.state(), LedgerState::Open);

        assert!(BudgetLedger::pure(0.0).is_err());
        assert!(BudgetLedger::new(PrivacyParams::zero()).is_err());
    }

    #[test]
    fn test_four_half_epsilon_queries_exhaust_two() {
        let mut ledger = BudgetLedger::pure(2.0).unwrap();
        for _ in 0..4 {
            ledger.charge(pure(0.5)).unwrap();
        }
        assert_eq!(ledger.remaining(), PrivacyParams::zero());
        assert_eq!(ledger.state(), LedgerState::Exhausted);

        let err = ledger.charge(pure(0.5)).unwrap_err();
        assert!(matches!(err, DpError::BudgetExceeded { .. }));
        assert_eq!(err.shortfall(), Some(PrivacyParams::zero()));

        // History stays readable after exhaustion
        assert_eq!(ledger.history().len(), 4);
    }

    #[test]
    fn test_rejected_charge_leaves_state_unchanged() {
        let mut ledger = BudgetLedger::pure(0.5).unwrap();
        ledger.charge(pure(0.3)).unwrap();
        ledger.charge(pure(0.15)).unwrap();
        let before = ledger.clone();

        // Only 0.05 remains; no clipping to fit
        let err = ledger.charge(pure(0.1)).unwrap_err();
        match err {
            DpError::BudgetExceeded {
                requested,
                remaining,
            } => {
                assert_eq!(requested, pure(0.1));
                assert!((remaining.epsilon - 0.05).abs() < 1e-12);
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(ledger.spent(), before.spent());
        assert_eq!(ledger.history(), before.history());
    }

    #[test]
    fn test_delta_capacity_enforced() {
        let mut ledger = BudgetLedger::new(PrivacyParams::new(10.0, 1e-5).unwrap()).unwrap();
        let query = PrivacyParams::approximate(0.1, 4e-6).unwrap();
        ledger.charge(query).unwrap();
        ledger.charge(query).unwrap();
        assert!(ledger.charge(query).is_err());
        // Pure queries still fit; δ is not the binding constraint for them
        ledger.charge(pure(0.1)).unwrap();
        assert_eq!(ledger.state(), LedgerState::Open);
    }

    #[test]
    fn test_pure_session_refuses_any_delta() {
        let mut ledger = BudgetLedger::pure(5.0).unwrap();
        let err = ledger
            .charge(PrivacyParams::approximate(0.1, 1e-9).unwrap())
            .unwrap_err();
        assert!(matches!(err, DpError::BudgetExceeded { .. }));
        assert_eq!(ledger.query_count(), 0);
    }

    #[test]
    fn test_invalid_charge_is_domain_error() {
        let mut ledger = BudgetLedger::pure(1.0).unwrap();
        let err = ledger
            .charge(PrivacyParams {
                epsilon: -0.5,
                delta: 0.0,
            })
            .unwrap_err();
        assert!(err.is_domain());
        assert_eq!(ledger.spent(), PrivacyParams::zero());
    }

    #[test]
    fn test_float_rounding_does_not_refuse_exact_fit() {
        let mut ledger = BudgetLedger::pure(0.3).unwrap();
        ledger.charge(pure(0.1)).unwrap();
        ledger.charge(pure(0.2)).unwrap();
        assert!(ledger.spent().epsilon <= ledger.capacity().epsilon);
        assert!(ledger.is_exhausted());
    }

    #[test]
    fn test_excess_beyond_rounding_is_refused() {
        let mut ledger = BudgetLedger::pure(1.0).unwrap();
        ledger.charge(pure(0.5)).unwrap();
        let err = ledger.charge(pure(0.5 + 9e-13)).unwrap_err();
        assert!(matches!(err, DpError::BudgetExceeded { .. }));
        assert_eq!(ledger.spent(), pure(0.5));

        ledger.charge(pure(0.5)).unwrap();
        assert_eq!(basic_composition(ledger.history()), ledger.spent());
    }

    #[test]
    fn test_composition_equivalence() {
        let first = PrivacyParams::new(0.3, 1e-6).unwrap();
        let second = PrivacyParams::new(0.45, 2e-6).unwrap();
        let capacity = PrivacyParams::new(2.0, 1e-5).unwrap();

        let mut sequential = BudgetLedger::new(capacity).unwrap();
        sequential.charge(first).unwrap();
        sequential.charge(second).unwrap();

        let mut reversed = BudgetLedger::new(capacity).unwrap();
        reversed.charge(second).unwrap();
        reversed.charge(first).unwrap();

        let mut combined = BudgetLedger::new(capacity).unwrap();
        combined.charge(first + second).unwrap();

        assert_eq!(sequential.spent(), combined.spent());
        assert_eq!(reversed.spent(), combined.spent());
        assert_eq!(basic_composition(&[first, second]), combined.spent());
    }

    #[test]
    fn test_administrative_reset() {
        let mut ledger = BudgetLedger::pure(1.0).unwrap();
        ledger.charge(pure(0.5)).unwrap();
        ledger.charge(pure(0.5)).unwrap();
        assert!(ledger.is_exhausted());

        ledger.administrative_reset();

        assert_eq!(ledger.remaining(), pure(1.0));
        assert_eq!(ledger.query_count(), 0);
        assert_eq!(ledger.state(), LedgerState::Open);
    }

    #[test]
    fn test_can_charge_has_no_side_effects() {
        let ledger = BudgetLedger::pure(1.0).unwrap();
        assert!(ledger.can_charge(&pure(1.0)));
        assert!(!ledger.can_charge(&pure(1.5)));
        assert!(!ledger.can_charge(&PrivacyParams::zero()));
        assert_eq!(ledger.query_count(), 0);
    }

    #[test]
    fn test_repeated_and_basic_composition() {
        let total = repeated(PrivacyParams::new(0.5, 1e-6).unwrap(), 4).unwrap();
        assert_eq!(total.epsilon, 2.0);
        assert!((total.delta - 4e-6).abs() < 1e-18);
        assert!(repeated(pure(0.5), 0).is_err());
        assert_eq!(basic_composition(&[]), PrivacyParams::zero());
    }

    #[test]
    fn test_ledger_json_report() {
        let mut ledger = BudgetLedger::pure(1.0).unwrap();
        ledger.charge(pure(0.25)).unwrap();
        let json: serde_json::Value = serde_json::from_str(&ledger.to_json().unwrap()).unwrap();
        assert_eq!(json["spent"]["epsilon"], 0.25);
        assert_eq!(json["history"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_shared_ledger_never_overspends_under_contention() {
        let shared = SharedLedger::new(BudgetLedger::pure(1.0).unwrap());
        let accepted: usize = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    let ledger = shared.clone();
                    scope.spawn(move || {
                        (0..50)
                            .filter(|_| ledger.charge(pure(0.01)).is_ok())
                            .count()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).sum()
        });

        assert_eq!(accepted, 100);
        assert_eq!(shared.query_count(), 100);
        assert!(shared.spent().epsilon <= 1.0);
        assert_eq!(shared.state(), LedgerState::Exhausted);
    }
}

/// Property-based tests using proptest
#[cfg(test)]
mod proptest_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Spend never decreases and never passes capacity
        #[test]
        fn spend_monotone_and_bounded(
            total in 0.5..20.0f64,
            charges in proptest::collection::vec(0.01..2.0f64, 1..60)
        ) {
            let mut ledger = BudgetLedger::pure(total).unwrap();
            let mut previous = ledger.spent().epsilon;

            for epsilon in charges {
                let _ = ledger.charge(PrivacyParams::pure(epsilon).unwrap());
                let current = ledger.spent().epsilon;
                prop_assert!(current >= previous, "spend fell from {} to {}", previous, current);
                prop_assert!(current <= ledger.capacity().epsilon);
                prop_assert!(ledger.remaining().epsilon >= 0.0);
                previous = current;
            }
        }

        /// Spend is the basic composition of the history, up to summation rounding
        #[test]
        fn spent_matches_history_composition(
            total in 0.5..20.0f64,
            charges in proptest::collection::vec(0.01..2.0f64, 1..60)
        ) {
            let mut ledger = BudgetLedger::pure(total).unwrap();
            for epsilon in charges {
                let _ = ledger.charge(PrivacyParams::pure(epsilon).unwrap());
                let composed = basic_composition(ledger.history()).epsilon;
                let rounding = (ledger.query_count() + 1) as f64 * f64::EPSILON * total;
                prop_assert!(
                    (composed - ledger.spent().epsilon).abs() <= rounding,
                    "history sums to {} but spent is {}", composed, ledger.spent().epsilon
                );
            }
        }

        /// History length matches the number of accepted charges
        #[test]
        fn history_counts_accepted_charges(
            total in 1.0..10.0f64,
            charges in proptest::collection::vec(0.1..0.5f64, 1..30)
        ) {
            let mut ledger = BudgetLedger::pure(total).unwrap();
            let mut accepted = 0usize;
            for epsilon in charges {
                if ledger.charge(PrivacyParams::pure(epsilon).unwrap()).is_ok() {
                    accepted += 1;
                }
            }
            prop_assert_eq!(ledger.query_count(), accepted);
        }

        /// Two charges leave the same spend as one combined charge, in either order
        #[test]
        fn two_charges_compose_additively(
            e1 in 0.01..1.0f64,
            e2 in 0.01..1.0f64,
            d1 in 0.0..1e-6f64,
            d2 in 0.0..1e-6f64
        ) {
            let capacity = PrivacyParams::new(5.0, 1e-5).unwrap();
            let a = PrivacyParams::new(e1, d1).unwrap();
            let b = PrivacyParams::new(e2, d2).unwrap();

            let mut forward = BudgetLedger::new(capacity).unwrap();
            forward.charge(a).unwrap();
            forward.charge(b).unwrap();

            let mut backward = BudgetLedger::new(capacity).unwrap();
            backward.charge(b).unwrap();
            backward.charge(a).unwrap();

            let mut single = BudgetLedger::new(capacity).unwrap();
            single.charge(a + b).unwrap();

            prop_assert_eq!(forward.spent(), single.spent());
            prop_assert_eq!(backward.spent(), single.spent());
        }
    }
}
