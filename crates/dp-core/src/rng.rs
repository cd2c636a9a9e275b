//! Random Sources for DP Mechanisms
//!
//! Mechanisms never reach for an ambient generator: every sampling call
//! takes the caller's `&mut R where R: Rng`, so a session owns its stream
//! and tests can replay one from a seed.
//!
//! [`SecureRng`] builds the default source, a ChaCha20 stream cipher RNG,
//! either from a fixed seed (reproducible) or from OS entropy via
//! `getrandom` (urandom / BCryptGenRandom / Web Crypto).
//!
//! # Uniform Helpers
//!
//! The inverse-CDF and Box-Muller transforms need uniforms on specific
//! half-open intervals; the helpers below produce them from 53 random bits
//! (the f64 mantissa width) so no value in the range is over-represented.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

use crate::error::{DpError, Result};

const MANTISSA_SCALE: f64 = (1u64 << 53) as f64;

/// Factory for the ChaCha20 source used by sessions
pub struct SecureRng;

impl SecureRng {
    /// Deterministic stream for reproducible runs
    pub fn seeded(seed: u64) -> ChaCha20Rng {
        ChaCha20Rng::seed_from_u64(seed)
    }

    /// Stream keyed from the OS entropy source
    ///
    /// # Returns
    /// * `Err(DpError::Entropy)` if the OS source is unavailable
    pub fn from_os_entropy() -> Result<ChaCha20Rng> {
        let mut key = [0u8; 32];
        getrandom::getrandom(&mut key)
            .map_err(|e| DpError::Entropy(format!("Failed to get entropy: {}", e)))?;
        Ok(ChaCha20Rng::from_seed(key))
    }

    /// Seeded when a seed is configured, OS-keyed otherwise
    pub fn from_seed_option(seed: Option<u64>) -> Result<ChaCha20Rng> {
        match seed {
            Some(s) => Ok(Self::seeded(s)),
            None => Self::from_os_entropy(),
        }
    }
}

/// Uniform f64 in [0, 1)
pub fn uniform_f64<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    (rng.next_u64() >> 11) as f64 / MANTISSA_SCALE
}

/// Uniform f64 in (-0.5, 0.5)
///
/// -0.5 is rejected: the Laplace inverse CDF maps it to ln(0).
pub fn uniform_centered<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    loop {
        let centered = uniform_f64(rng) - 0.5;
        if centered > -0.5 {
            return centered;
        }
    }
}

/// Two independent uniforms for the Box-Muller transform
///
/// `u1` lies in (0, 1] so that `ln(u1)` is finite; `u2` lies in [0, 1).
pub fn box_muller_pair<R: Rng + ?Sized>(rng: &mut R) -> (f64, f64) {
    let u1 = 1.0 - uniform_f64(rng);
    let u2 = uniform_f64(rng);
    (u1, u2)
}
