//! # Secret Hashing
//!
//! Argon2id hashing for user passwords and client secrets, with legacy
//! bcrypt hashes accepted on verification.
//!
//! ## Parameters
//!
//! | Parameter | Value | Purpose |
//! |-----------|-------|---------|
//! | Memory | 100 MiB | makes GPU attacks expensive |
//! | Iterations | 2 | time cost |
//! | Parallelism | 2 | lanes |
//! | Salt | 16 B random | per-hash, generated by `SaltString` |
//!
//! New hashes are always Argon2id in PHC string format:
//!
//! ```text
//! $argon2id$v=19$m=102400,t=2,p=2$<salt>$<hash>
//! ```
//!
//! ## Legacy Hashes
//!
//! Rows migrated from the previous deployment may still hold bcrypt hashes
//! (`$2a$`/`$2b$`/`$2y$`, 14 rounds). [`SecretHasher::verify`] dispatches on
//! the PHC prefix so those secrets keep verifying; re-hashing happens
//! naturally when the secret is next changed. `hash` never produces bcrypt.
//!
//! ## Security Notes
//!
//! - Tag comparison is constant-time in both schemes.
//! - A verification mismatch is `Ok(false)`, not an error; callers map it
//!   to the single `InvalidCredentials` kind so the response never reveals
//!   whether the subject exists or the secret was wrong.

use crate::errors::{AuthError, AuthResult};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};

// =============================================================================
// Secret Hasher
// =============================================================================

/// Hashing service for passwords and client secrets.
///
/// `Clone + Send + Sync`; each hash operation draws a fresh random salt.
/// Hashing is CPU-bound - callers on async executors should move calls onto
/// a blocking worker (`web::block` / `spawn_blocking`).
#[derive(Clone)]
pub struct SecretHasher {
    argon2: Argon2<'static>,
}

impl Default for SecretHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl SecretHasher {
    /// Creates a hasher with the service's Argon2id parameters.
    pub fn new() -> Self {
        let params = Params::new(
            100 * 1024, // 100 MiB memory cost (KiB units)
            2,          // iterations
            2,          // lanes
            None,       // default output length (32 bytes)
        )
        .expect("static Argon2 params are valid");

        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        Self { argon2 }
    }

    /// Hashes a secret for storage.
    ///
    /// Returns the PHC string (algorithm, version, params, salt, tag).
    pub fn hash(&self, secret: &str) -> AuthResult<String> {
        let salt = SaltString::generate(&mut OsRng);

        self.argon2
            .hash_password(secret.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::Internal(format!("Secret hashing failed: {e}")))
    }

    /// Verifies a secret against a stored hash.
    ///
    /// Dispatches on the hash prefix: `$2...` goes to bcrypt, everything
    /// else is parsed as a PHC string and verified with Argon2.
    ///
    /// # Returns
    ///
    /// - `Ok(true)` - secret matches
    /// - `Ok(false)` - secret does not match
    /// - `Err(...)` - stored hash is malformed
    pub fn verify(&self, secret: &str, hashed: &str) -> AuthResult<bool> {
        if hashed.starts_with("$2") {
            return bcrypt::verify(secret, hashed)
                .map_err(|e| AuthError::Internal(format!("Invalid bcrypt hash: {e}")));
        }

        let parsed = PasswordHash::new(hashed)
            .map_err(|e| AuthError::Internal(format!("Invalid secret hash format: {e}")))?;

        match self.argon2.verify_password(secret.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AuthError::Internal(format!("Secret verification failed: {e}"))),
        }
    }
}

// Implement Debug manually to avoid exposing internal state
impl std::fmt::Debug for SecretHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretHasher").finish_non_exhaustive()
    }
}

// =============================================================================
// Tests
// =============================================================================
