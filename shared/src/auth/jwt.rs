//! # JWT Signing and Decoding
//!
//! HS256 bearer tokens for both principal classes. The signer takes an
//! arbitrary serializable payload (client or user claims) and injects the
//! timing and identity claims itself:
//!
//! | Claim | Injected | Value |
//! |-------|----------|-------|
//! | `exp` | yes | unix-seconds, float |
//! | `iat` | yes | unix-seconds, float |
//! | `token_type` | yes | `access` or `refresh` |
//! | `jti` | yes | fresh UUIDv4 per token |
//! | `iss`, `sub`, `realm`, ... | no | provided by the payload |
//!
//! ## Decode Semantics
//!
//! [`TokenSigner::decode`] verifies the signature and nothing else:
//!
//! - `exp` is **not** validated - expired tokens are an introspection
//!   concern, and the endpoint reports them as `active = false` rather
//!   than failing.
//! - `aud` is **not** validated - realm binding is enforced against the
//!   `realm` claim at introspection.
//!
//! A token that fails to decode (bad signature, malformed) raises
//! [`AuthError::InvalidToken`].

use crate::config::JwtConfig;
use crate::errors::{AuthError, AuthResult};
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

// =============================================================================
// Token Type
// =============================================================================

/// Distinguishes access from refresh tokens inside the token itself.
///
/// Introspection and the refresh flow read this claim; a refresh token
/// cannot silently serve as an access token or vice versa.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    /// Short-lived token presented on every authenticated call.
    Access,
    /// Longer-lived token exchanged for fresh pairs.
    Refresh,
}

impl TokenType {
    /// The wire value of the `token_type` claim.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Access => "access",
            Self::Refresh => "refresh",
        }
    }
}

// =============================================================================
// Signer
// =============================================================================

/// HS256 token signer and verifier.
///
/// Created once at startup from [`JwtConfig`] and shared via `Arc`; the
/// keys are immutable after construction (no rotation protocol - the key
/// is static configuration).
#[derive(Clone)]
pub struct TokenSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
}

impl TokenSigner {
    /// Builds a signer from configuration.
    ///
    /// # Errors
    ///
    /// `AuthError::Internal` when `JWT_ALGORITHM` names an algorithm
    /// `jsonwebtoken` does not know.
    pub fn new(config: &JwtConfig) -> AuthResult<Self> {
        let algorithm = Algorithm::from_str(&config.algorithm)
            .map_err(|_| AuthError::Internal(format!("Unknown JWT algorithm: {}", config.algorithm)))?;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(config.secret_key.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret_key.as_bytes()),
            algorithm,
        })
    }

    /// Signs a payload into a token of the given type and lifetime.
    ///
    /// The payload must serialize to a JSON object; `exp`, `iat`,
    /// `token_type`, and a fresh `jti` are injected on top of it.
    pub fn sign<P: Serialize>(
        &self,
        payload: &P,
        token_type: TokenType,
        expires_in: Duration,
    ) -> AuthResult<String> {
        let mut claims = match serde_json::to_value(payload) {
            Ok(serde_json::Value::Object(map)) => map,
            Ok(_) => {
                return Err(AuthError::Internal(
                    "Token payload must serialize to a JSON object".to_string(),
                ))
            }
            Err(e) => return Err(AuthError::Internal(format!("Payload serialization failed: {e}"))),
        };

        let now = Utc::now().timestamp_micros() as f64 / 1_000_000.0;
        claims.insert("iat".to_string(), serde_json::json!(now));
        claims.insert(
            "exp".to_string(),
            serde_json::json!(now + expires_in.as_secs_f64()),
        );
        claims.insert(
            "token_type".to_string(),
            serde_json::json!(token_type.as_str()),
        );
        claims.insert("jti".to_string(), serde_json::json!(Uuid::new_v4()));

        jsonwebtoken::encode(&Header::new(self.algorithm), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(format!("Token signing failed: {e}")))
    }

    /// Verifies the signature and returns the deserialized claims.
    ///
    /// Expiry and audience are deliberately not validated here; see the
    /// module docs.
    pub fn decode<C: DeserializeOwned>(&self, token: &str) -> AuthResult<C> {
        let mut validation = Validation::new(self.algorithm);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.set_required_spec_claims::<&str>(&[]);

        jsonwebtoken::decode::<C>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|_| AuthError::InvalidToken)
    }
}

// Implement Debug manually to avoid exposing keys
impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner")
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Tests
// =============================================================================
