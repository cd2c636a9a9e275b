//! Session configuration.
//!
//! A [`SessionConfig`] is everything needed to open a
//! [`PrivacySession`](crate::session::PrivacySession): the total budget, an
//! optional seed for reproducible runs, and the audit thresholds. It is
//! plain serde data so it can live in a JSON file next to the dataset.

use serde::{Deserialize, Serialize};

use crate::audit::AuditConfig;
use crate::error::{DpError, Result};
use crate::params::PrivacyParams;

/// Configuration for one privacy-protected session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Total ε the session may spend
    pub capacity_epsilon: f64,
    /// Total δ the session may spend (0 for a pure-DP session)
    pub capacity_delta: f64,
    /// Fixed seed for reproducible noise; `None` keys from OS entropy
    pub seed: Option<u64>,
    pub audit: AuditConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            capacity_epsilon: 1.0,
            capacity_delta: 0.0,
            seed: None,
            audit: AuditConfig::default(),
        }
    }
}

impl SessionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the total budget
    pub fn with_capacity(mut self, epsilon: f64, delta: f64) -> Self {
        self.capacity_epsilon = epsilon;
        self.capacity_delta = delta;
        self
    }

    /// Seed the noise stream (tests and reproducible demos only)
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_audit(mut self, audit: AuditConfig) -> Self {
        self.audit = audit;
        self
    }

    /// Capacity as validated parameters
    pub fn capacity(&self) -> Result<PrivacyParams> {
        PrivacyParams::new(self.capacity_epsilon, self.capacity_delta)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.capacity()?;
        self.audit.validate()
    }

    /// Parse and validate a JSON document
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(DpError::from)
    }
}
