//! Password hashing and verification using Argon2id
//!
//! Digests are PHC strings, so the algorithm, cost parameters and the
//! 16-byte random salt travel with the hash:
//! `$argon2id$v=19$m=65536,t=3,p=4$<salt>$<hash>`
//!
//! Werkzeug digests left by the previous service still verify (see
//! [`super::legacy`]); callers replace them with Argon2id once the
//! plaintext is known to match.
//!
//! Hashing is CPU and memory heavy. Async callers go through
//! [`CredentialHasher::hash_blocking`] / [`CredentialHasher::verify_blocking`],
//! which move the work onto the blocking thread pool.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use cuidapet_core::PasswordConfig;
use thiserror::Error;

use super::legacy::{self, WerkzeugDigest};

/// Password hashing errors
#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("Failed to hash password: {0}")]
    HashingFailed(String),

    #[error("Invalid hashing parameters: {0}")]
    InvalidParams(String),

    #[error("Hashing task failed: {0}")]
    TaskFailed(String),
}

/// One-way credential hasher configured with fixed Argon2 costs
#[derive(Debug, Clone)]
pub struct CredentialHasher {
    params: Params,
}

impl CredentialHasher {
    /// Build a hasher, rejecting out-of-range cost parameters up front
    pub fn new(config: &PasswordConfig) -> Result<Self, PasswordError> {
        let params = Params::new(
            config.memory_cost,
            config.time_cost,
            config.parallelism,
            config.output_len,
        )
        .map_err(|e| PasswordError::InvalidParams(e.to_string()))?;

        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash a plaintext password with a fresh random salt
    ///
    /// The same plaintext hashed twice yields two different digests.
    pub fn hash(&self, plaintext: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);

        let digest = self
            .argon2()
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|e| PasswordError::HashingFailed(e.to_string()))?;

        Ok(digest.to_string())
    }

    /// Check a plaintext against a stored digest
    ///
    /// A malformed digest is treated as a mismatch.
    pub fn verify(&self, digest: &str, plaintext: &str) -> bool {
        if legacy::is_werkzeug(digest) {
            return match WerkzeugDigest::parse(digest).and_then(|d| d.verify(plaintext)) {
                Ok(matched) => matched,
                Err(e) => {
                    tracing::warn!(error = %e, "Stored werkzeug digest is unusable");
                    false
                }
            };
        }

        let parsed = match PasswordHash::new(digest) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!(error = %e, "Stored password digest is malformed");
                return false;
            }
        };

        match self.argon2().verify_password(plaintext.as_bytes(), &parsed) {
            Ok(()) => true,
            Err(argon2::password_hash::Error::Password) => false,
            Err(e) => {
                tracing::warn!(error = %e, "Password verification failed");
                false
            }
        }
    }

    /// True for digests that should be replaced with a fresh Argon2id hash
    pub fn needs_upgrade(&self, digest: &str) -> bool {
        legacy::is_werkzeug(digest)
    }

    /// [`hash`](Self::hash) on the blocking pool
    pub async fn hash_blocking(&self, plaintext: &str) -> Result<String, PasswordError> {
        let hasher = self.clone();
        let plaintext = plaintext.to_string();

        tokio::task::spawn_blocking(move || hasher.hash(&plaintext))
            .await
            .map_err(|e| PasswordError::TaskFailed(e.to_string()))?
    }

    /// [`verify`](Self::verify) on the blocking pool
    pub async fn verify_blocking(&self, digest: &str, plaintext: &str) -> bool {
        let hasher = self.clone();
        let digest = digest.to_string();
        let plaintext = plaintext.to_string();

        match tokio::task::spawn_blocking(move || hasher.verify(&digest, &plaintext)).await {
            Ok(matched) => matched,
            Err(e) => {
                tracing::error!(error = %e, "Password verification task failed");
                false
            }
        }
    }
}
