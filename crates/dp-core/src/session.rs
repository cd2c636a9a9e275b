//! Privacy Session
//!
//! Ties the pieces together for one privacy-protected session: every
//! release is validated, charged to the session ledger, and only then
//! sampled.
//!
//! ```
//! use dp_core::{sensitivity, PrivacyParams, PrivacySession, Query, SessionConfig};
//!
//! let config = SessionConfig::new().with_capacity(1.0, 0.0).with_seed(42);
//! let mut session = PrivacySession::from_config(&config).unwrap();
//!
//! let query = Query::new(120.0, sensitivity::counting(), PrivacyParams::pure(0.5).unwrap());
//! let noisy = session.release(&query).unwrap();
//! assert!(noisy.is_finite());
//! assert!((session.remaining().epsilon - 0.5).abs() < 1e-12);
//! ```

use rand_chacha::ChaCha20Rng;
use tracing::debug;

use crate::audit::{AuditResult, Auditor};
use crate::budget::{BudgetLedger, SharedLedger};
use crate::config::SessionConfig;
use crate::error::Result;
use crate::mechanism::{Mechanism, Query};
use crate::params::PrivacyParams;
use crate::rng::SecureRng;

/// One privacy-protected session: a ledger, a noise stream, and an auditor
#[derive(Debug)]
pub struct PrivacySession {
    ledger: SharedLedger,
    rng: ChaCha20Rng,
    auditor: Auditor,
}

impl PrivacySession {
    /// Open a session over an existing ledger
    ///
    /// The ledger may be shared with other sessions; every charge goes
    /// through its lock.
    pub fn new(ledger: SharedLedger, rng: ChaCha20Rng, auditor: Auditor) -> Self {
        Self {
            ledger,
            rng,
            auditor,
        }
    }

    /// Open a fresh session from configuration
    pub fn from_config(config: &SessionConfig) -> Result<Self> {
        config.validate()?;
        let ledger = BudgetLedger::new(config.capacity()?)?;
        let rng = SecureRng::from_seed_option(config.seed)?;
        let auditor = Auditor::new(config.audit)?;
        Ok(Self::new(ledger.into(), rng, auditor))
    }

    /// Release `query` with the mechanism its parameters call for
    ///
    /// Laplace for pure parameters, Gaussian when δ > 0.
    pub fn release(&mut self, query: &Query) -> Result<f64> {
        self.release_with(Mechanism::for_params(&query.params), query)
    }

    /// Release `query` with an explicit mechanism
    ///
    /// Invalid queries are rejected before anything is charged, and a
    /// rejected charge draws no noise.
    pub fn release_with(&mut self, mechanism: Mechanism, query: &Query) -> Result<f64> {
        let scale = mechanism.noise_scale(query)?;
        self.ledger.charge(query.params)?;
        let noisy = mechanism.perturb(query.true_value, scale, &mut self.rng)?;

        debug!(
            mechanism = mechanism.name(),
            scale,
            epsilon = query.params.epsilon,
            delta = query.params.delta,
            "released noisy value"
        );
        Ok(noisy)
    }

    /// Audit a mechanism with this session's auditor and noise stream
    ///
    /// Audits are a test of the mechanism, not a release, so nothing is
    /// charged to the ledger.
    #[allow(clippy::too_many_arguments)]
    pub fn audit<D, M, E>(
        &mut self,
        mechanism: M,
        dataset_a: &D,
        dataset_b: &D,
        event: E,
        trials: usize,
        epsilon: f64,
    ) -> Result<AuditResult>
    where
        D: ?Sized,
        M: FnMut(&D, &mut ChaCha20Rng) -> Result<f64>,
        E: FnMut(f64) -> bool,
    {
        self.auditor.audit(
            mechanism,
            dataset_a,
            dataset_b,
            event,
            trials,
            epsilon,
            &mut self.rng,
        )
    }

    pub fn ledger(&self) -> &SharedLedger {
        &self.ledger
    }

    pub fn auditor(&self) -> &Auditor {
        &self.auditor
    }

    pub fn remaining(&self) -> PrivacyParams {
        self.ledger.remaining()
    }

    pub fn spent(&self) -> PrivacyParams {
        self.ledger.spent()
    }
}
