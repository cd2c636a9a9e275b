//! Differential Privacy Core
//!
//! Differential privacy primitives for releasing aggregate statistics:
//! - Global sensitivity for counting, bounded-mean and declared queries
//! - Laplace mechanism for (ε, 0)-DP
//! - Gaussian mechanism for (ε, δ)-DP
//! - Privacy budget accounting under basic composition
//! - Empirical indistinguishability audits
//!
//! # Mathematical Guarantees
//!
//! For any two neighbouring datasets D and D' (differing in one record) and
//! any output set S:
//!
//! P[M(D) ∈ S] ≤ e^ε · P[M(D') ∈ S] + δ
//!
//! Where:
//! - ε (epsilon): Privacy loss parameter (lower = more private)
//! - δ (delta): Probability of privacy failure (should be negligible, e.g., 10^-6)
//!
//! # Example
//!
//! ```
//! use dp_core::{sensitivity, BudgetLedger, LaplaceMechanism, PrivacyParams, SecureRng};
//!
//! let mut rng = SecureRng::seeded(7);
//! let mut ledger = BudgetLedger::pure(1.0).unwrap();
//!
//! // Count query over binary records
//! let delta_f = sensitivity::counting().value();
//! let params = PrivacyParams::pure(0.1).unwrap();
//!
//! // Charge first, then release
//! ledger.charge(params).unwrap();
//! let noisy = LaplaceMechanism::release(42.0, delta_f, params.epsilon, &mut rng).unwrap();
//! assert!(noisy.is_finite());
//! ```
//!
//! No floating-point sampler is hardened against side channels or
//! floating-point attacks; the guarantees hold for the idealised mechanisms.

pub mod audit;
pub mod budget;
pub mod config;
pub mod error;
pub mod gaussian;
pub mod laplace;
pub mod mechanism;
pub mod params;
pub mod rng;
pub mod sensitivity;
pub mod session;
pub mod stats;
pub mod validation;

// Re-export commonly used items
pub use audit::{audit, AuditConfig, AuditResult, AuditVerdict, Auditor};
pub use budget::{basic_composition, BudgetLedger, LedgerState, SharedLedger};
pub use config::SessionConfig;
pub use error::{DomainError, DpError, Result};
pub use gaussian::GaussianMechanism;
pub use laplace::LaplaceMechanism;
pub use mechanism::{Mechanism, Query};
pub use params::PrivacyParams;
pub use rng::SecureRng;
pub use sensitivity::{QueryKind, SensitivityMetric, SensitivityResult};
pub use session::PrivacySession;
pub use stats::NoiseSummary;
pub use validation::{recommended_parameters, PrivacyLevel};
