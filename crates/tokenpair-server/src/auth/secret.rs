//! Refresh-secret generation, transport encoding and argon2id hashing.

use argon2::password_hash::rand_core::{OsRng, RngCore};
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Length in bytes of a raw refresh secret.
pub const REFRESH_SECRET_LEN: usize = 32;

/// Raw refresh-token material. Never persisted.
pub type RefreshSecret = [u8; REFRESH_SECRET_LEN];

/// Fill a fresh refresh secret from the OS random source.
pub fn generate_refresh_secret() -> Result<RefreshSecret, argon2::password_hash::rand_core::Error> {
    let mut secret = [0u8; REFRESH_SECRET_LEN];
    OsRng.try_fill_bytes(&mut secret)?;
    Ok(secret)
}

/// New random session identifier.
pub fn generate_session_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Transport form handed to clients.
pub fn encode_refresh_token(secret: &[u8]) -> String {
    STANDARD.encode(secret)
}

/// Inverse of [`encode_refresh_token`].
pub fn decode_refresh_token(token: &str) -> Result<Vec<u8>, base64::DecodeError> {
    STANDARD.decode(token)
}

/// argon2id hasher for refresh secrets.
#[derive(Clone)]
pub struct SecretHasher {
    argon2: Argon2<'static>,
}

impl SecretHasher {
    /// Build a hasher with explicit cost parameters (memory in KiB).
    pub fn with_cost(
        memory_kib: u32,
        iterations: u32,
        parallelism: u32,
    ) -> Result<Self, argon2::Error> {
        let params = Params::new(memory_kib, iterations, parallelism, None)?;
        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Hash a secret with a random salt into a PHC string.
    pub fn hash(&self, secret: &[u8]) -> Result<String, argon2::password_hash::Error> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self.argon2.hash_password(secret, &salt)?;
        Ok(hash.to_string())
    }

    /// Verify a secret against a stored PHC string.
    ///
    /// `Ok(false)` means a well-formed hash that does not match; a malformed
    /// stored hash is an error.
    pub fn verify(&self, secret: &[u8], hash: &str) -> Result<bool, argon2::password_hash::Error> {
        let parsed_hash = PasswordHash::new(hash)?;
        match self.argon2.verify_password(secret, &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Cheapest valid parameters, for tests only.
    #[cfg(test)]
    #[allow(clippy::expect_used)]
    pub(crate) fn for_testing() -> Self {
        Self::with_cost(Params::MIN_M_COST.max(64), 1, 1).expect("valid argon2 test params")
    }
}

impl Default for SecretHasher {
    fn default() -> Self {
        Self {
            argon2: Argon2::default(),
        }
    }
}
