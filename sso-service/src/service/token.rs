//! # Token Service
//!
//! Issues bearer tokens and applies the introspection policy.
//!
//! ## Issuance
//!
//! | Principal | Tokens | Lifetimes |
//! |-----------|--------|-----------|
//! | User | access + refresh pair | 15 min / 7 days |
//! | Client | access only | 30 min |
//!
//! Both tokens of a pair are signed over the same payload; they differ only
//! in `token_type`, `exp`, and `jti`.
//!
//! ## Introspection policy
//!
//! Decoding verifies the signature only. Policy is layered on top, in order:
//!
//! 1. Undecodable token → `Unauthorized("Invalid token")` - fail loudly.
//! 2. Realm claim absent or different from the introspecting realm:
//!    clients get `Unauthorized`, users get `active=false` (a user may hold
//!    tokens for several realms across a switch; a client never does).
//! 3. `exp` in the past → `active=false, cause="Token expired"` - expiry is
//!    reported, not raised (RFC 7662 §2.2).
//! 4. Otherwise the parsed claims with `active=true`.

use chrono::Utc;
use shared::auth::jwt::{TokenSigner, TokenType};
use shared::config::JwtConfig;
use shared::errors::{AuthError, AuthResult};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::domain::{ClientClaims, ClientPayload, ClientToken, TokenPair, UserClaims, UserPayload};

/// Token issuance and introspection.
///
/// Cheap to clone; created once in `main` and shared by every service that
/// issues or inspects tokens.
#[derive(Debug, Clone)]
pub struct TokenService {
    signer: Arc<TokenSigner>,
    config: JwtConfig,
}

impl TokenService {
    pub fn new(signer: Arc<TokenSigner>, config: JwtConfig) -> Self {
        Self { signer, config }
    }

    /// Issuer URL stamped into every payload.
    pub fn issuer(&self) -> &str {
        &self.config.issuer
    }

    // =========================================================================
    // ISSUANCE
    // =========================================================================

    /// Issues an access/refresh pair for a user session.
    pub fn issue_pair(&self, payload: &UserPayload, session_id: Uuid) -> AuthResult<TokenPair> {
        let access_token = self.signer.sign(
            payload,
            TokenType::Access,
            Duration::from_secs(self.config.access_ttl_seconds),
        )?;
        let refresh_token = self.signer.sign(
            payload,
            TokenType::Refresh,
            Duration::from_secs(self.config.refresh_ttl_seconds),
        )?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            session_id,
            expires_at: Utc::now().timestamp() + self.config.access_ttl_seconds as i64,
        })
    }

    /// Issues an access token for a client. Machines get no refresh token;
    /// they re-authenticate with their credentials.
    pub fn issue_client_token(&self, payload: &ClientPayload) -> AuthResult<ClientToken> {
        let access_token = self.signer.sign(
            payload,
            TokenType::Access,
            Duration::from_secs(self.config.client_access_ttl_seconds),
        )?;

        Ok(ClientToken {
            access_token,
            expires_at: Utc::now().timestamp() + self.config.client_access_ttl_seconds as i64,
        })
    }

    // =========================================================================
    // INTROSPECTION
    // =========================================================================

    /// Introspects a client access token against a realm.
    pub fn introspect_client(&self, token: &str, realm_slug: &str) -> AuthResult<ClientClaims> {
        let claims: ClientClaims = self
            .signer
            .decode(token)
            .map_err(|_| AuthError::Unauthorized("Invalid token".to_string()))?;

        match claims.realm.as_deref() {
            Some(realm) if realm == realm_slug => {}
            _ => {
                return Err(AuthError::Unauthorized(
                    "Invalid token in this realm".to_string(),
                ))
            }
        }

        if Self::is_expired(claims.exp) {
            return Ok(ClientClaims::inactive("Token expired"));
        }

        Ok(claims.activated())
    }

    /// Applies the user-token policy (realm binding, expiry).
    ///
    /// The session-presence gate lives in
    /// [`crate::service::UserAuthService::introspect`], which calls this
    /// after the session check.
    pub fn introspect_user_token(&self, token: &str, realm_slug: &str) -> AuthResult<UserClaims> {
        let claims: UserClaims = self
            .signer
            .decode(token)
            .map_err(|_| AuthError::Unauthorized("Invalid token".to_string()))?;

        match claims.realm.as_deref() {
            Some(realm) if realm == realm_slug => {}
            _ => return Ok(UserClaims::inactive("Invalid token in this realm")),
        }

        if Self::is_expired(claims.exp) {
            return Ok(UserClaims::inactive("Token expired"));
        }

        Ok(claims.activated())
    }

    fn is_expired(exp: Option<f64>) -> bool {
        let now = Utc::now().timestamp_micros() as f64 / 1_000_000.0;
        exp.is_some_and(|exp| exp < now)
    }
}

// =============================================================================
// Tests
// =============================================================================
