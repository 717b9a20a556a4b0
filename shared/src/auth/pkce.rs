//! # PKCE Code Generation
//!
//! Proof Key for Code Exchange (RFC 7636), S256 method, used by the
//! third-party identity flow.
//!
//! One authorization attempt produces three values:
//!
//! | Value | Construction | Travels |
//! |-------|--------------|---------|
//! | `state` | UUIDv4 | to the provider and back on the callback |
//! | `code_verifier` | 48 random bytes, base64url (64 chars) | to the provider only at token exchange |
//! | `code_challenge` | base64url(SHA-256(verifier)) | in the authorization URL |
//!
//! The triple is stored keyed by `state` with a short TTL; the callback
//! `pop`s it, making each `state` single-use.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Verifier entropy in bytes; encodes to a 64-character URL-safe string.
const VERIFIER_BYTES: usize = 48;

/// A PKCE state/verifier/challenge triple.
///
/// Stored as JSON in the codes store under `codes:{state}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PkceCodes {
    /// Opaque request identifier echoed back by the provider.
    pub state: String,
    /// Secret proof, revealed only at token exchange.
    pub code_verifier: String,
    /// S256 commitment to the verifier, sent in the authorization URL.
    pub code_challenge: String,
}

impl PkceCodes {
    /// Generates a fresh triple from OS randomness.
    pub fn generate() -> Self {
        let mut bytes = [0u8; VERIFIER_BYTES];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        let code_verifier = URL_SAFE_NO_PAD.encode(bytes);
        let code_challenge = Self::challenge_for(&code_verifier);

        Self {
            state: Uuid::new_v4().to_string(),
            code_verifier,
            code_challenge,
        }
    }

    /// Computes the S256 challenge for a verifier.
    pub fn challenge_for(verifier: &str) -> String {
        let digest = Sha256::digest(verifier.as_bytes());
        URL_SAFE_NO_PAD.encode(digest)
    }
}

// =============================================================================
// Tests
// =============================================================================
