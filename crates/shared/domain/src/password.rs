//! Password hashing capability.
//!
//! The user store never sees a plaintext password past this boundary: it hands the
//! plaintext to an injected [`PasswordHasher`] and persists only the resulting
//! PHC-format string.

use argon2::{
    password_hash::{
        rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString,
    },
    Algorithm, Argon2, Params, Version,
};

use crate::constants::{DEFAULT_HASH_ITERATIONS, DEFAULT_HASH_MEMORY_KIB, DEFAULT_HASH_PARALLELISM};
use crate::error::{DomainError, DomainResult};

/// One-way, salted password hashing.
pub trait PasswordHasher: Send + Sync {
    /// Hash a plaintext password into a self-describing hash string.
    fn hash(&self, plain_text: &str) -> DomainResult<String>;

    /// Check a plaintext password against a stored hash.
    ///
    /// Malformed hashes verify as `false`.
    fn verify(&self, plain_text: &str, hash: &str) -> bool;
}

/// Argon2id hasher with configurable cost.
#[derive(Clone)]
pub struct Argon2Hasher {
    params: Params,
}

// Params carry no secrets, but keep the output short
impl std::fmt::Debug for Argon2Hasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Argon2Hasher")
            .field("m_cost", &self.params.m_cost())
            .field("t_cost", &self.params.t_cost())
            .field("p_cost", &self.params.p_cost())
            .finish()
    }
}

impl Argon2Hasher {
    /// Create a hasher with explicit Argon2 costs.
    ///
    /// # Errors
    /// Returns a password error if the parameters are out of Argon2's accepted range.
    pub fn with_params(memory_kib: u32, iterations: u32, parallelism: u32) -> DomainResult<Self> {
        let params = Params::new(memory_kib, iterations, parallelism, None)
            .map_err(|e| DomainError::password(format!("Invalid Argon2 parameters: {}", e)))?;
        Ok(Self { params })
    }

    /// Cheapest parameters Argon2 accepts. Only suitable for tests.
    pub fn insecure_fast() -> Self {
        Self {
            params: Params::new(Params::MIN_M_COST, Params::MIN_T_COST, 1, None)
                .unwrap_or_default(),
        }
    }

    #[inline]
    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

impl Default for Argon2Hasher {
    fn default() -> Self {
        Self::with_params(
            DEFAULT_HASH_MEMORY_KIB,
            DEFAULT_HASH_ITERATIONS,
            DEFAULT_HASH_PARALLELISM,
        )
        .unwrap_or_else(|_| Self {
            params: Params::default(),
        })
    }
}

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, plain_text: &str) -> DomainResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2()
            .hash_password(plain_text.as_bytes(), &salt)
            .map_err(|e| DomainError::password(format!("Password hash failed: {}", e)))?;
        Ok(hash.to_string())
    }

    fn verify(&self, plain_text: &str, hash: &str) -> bool {
        // Costs are read from the PHC string, so any Argon2 instance verifies
        match PasswordHash::new(hash) {
            Ok(parsed) => self
                .argon2()
                .verify_password(plain_text.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }
}
