//! Error types for differential privacy operations.

use serde::Serialize;
use thiserror::Error;

use crate::params::PrivacyParams;

/// A parameter violated a mechanism or ledger precondition.
#[derive(Debug, Clone, PartialEq, Serialize, Error)]
#[error("Invalid {parameter} {value}: {reason}")]
pub struct DomainError {
    /// Name of the offending parameter (`epsilon`, `delta`, `sensitivity`, ...)
    pub parameter: &'static str,
    /// The rejected value
    pub value: f64,
    /// Human-readable reason
    pub reason: String,
}

impl DomainError {
    pub fn new(parameter: &'static str, value: f64, reason: impl Into<String>) -> Self {
        Self {
            parameter,
            value,
            reason: reason.into(),
        }
    }
}

/// DP errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DpError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(
        "Privacy budget exceeded: requested (ε={:.4}, δ={:.2e}), remaining (ε={:.4}, δ={:.2e})",
        .requested.epsilon, .requested.delta, .remaining.epsilon, .remaining.delta
    )]
    BudgetExceeded {
        requested: PrivacyParams,
        remaining: PrivacyParams,
    },

    #[error("Entropy error: {0}")]
    Entropy(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl DpError {
    /// True for errors caused by the caller's inputs, as opposed to budget state.
    pub fn is_domain(&self) -> bool {
        matches!(self, DpError::Domain(_))
    }

    /// Remaining budget carried by a [`DpError::BudgetExceeded`].
    pub fn shortfall(&self) -> Option<PrivacyParams> {
        match self {
            DpError::BudgetExceeded { remaining, .. } => Some(*remaining),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for DpError {
    fn from(e: serde_json::Error) -> Self {
        DpError::Config(e.to_string())
    }
}

/// Result type for DP operations
pub type Result<T> = std::result::Result<T, DpError>;
