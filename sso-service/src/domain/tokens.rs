//! # Token Payloads and Issued Tokens
//!
//! The payload structs are exactly what goes under the signer - the signer
//! adds `exp`, `iat`, `token_type`, and `jti` on top (see
//! `shared::auth::jwt`). Payload construction happens at the documented
//! points only; there are no implicit serialization hooks.
//!
//! | Payload | Claims |
//! |---------|--------|
//! | [`ClientPayload`] | `iss`, `sub` = client_id, `scope` (space-joined), `realm` |
//! | [`UserPayload`] | `iss`, `sub` = user id, `email`, `status`, `realm`, `roles` (space-joined) |

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::claims::UserClaims;
use super::entities::{Client, User};
use super::enums::{Role, UserStatus};

// =============================================================================
// PAYLOADS
// =============================================================================

/// Space-joins roles in their stable order.
pub fn join_roles(roles: &[Role]) -> String {
    roles
        .iter()
        .map(Role::as_str)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Claims a client access token is signed over.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientPayload {
    /// Issuer URL
    pub iss: String,
    /// The public client id
    pub sub: String,
    /// Space-joined effective scopes granted on this token
    pub scope: String,
    /// Realm slug the token is bound to
    pub realm: String,
}

impl ClientPayload {
    /// Builds the payload for a client in a realm.
    ///
    /// `scopes` is the *validated effective* scope list, not the client's
    /// full registration.
    pub fn new(client: &Client, issuer: &str, realm_slug: &str, scopes: &[String]) -> Self {
        Self {
            iss: issuer.to_string(),
            sub: client.client_id.clone(),
            scope: scopes.join(" "),
            realm: realm_slug.to_string(),
        }
    }
}

/// Claims a user token pair is signed over.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPayload {
    /// Issuer URL
    pub iss: String,
    /// Stringified user id
    pub sub: String,
    /// Email, when the account has one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Account status at issuance time
    pub status: UserStatus,
    /// Realm slug the token is bound to
    pub realm: String,
    /// Space-joined role list
    pub roles: String,
}

impl UserPayload {
    /// Builds the payload for a user authenticated into a realm.
    pub fn new(user: &User, issuer: &str, realm_slug: &str, roles: &[Role]) -> Self {
        Self {
            iss: issuer.to_string(),
            sub: user.id.to_string(),
            email: user.email.clone(),
            status: user.status,
            realm: realm_slug.to_string(),
            roles: join_roles(roles),
        }
    }

    /// Rebuilds a payload from active introspection claims (refresh flow).
    ///
    /// The caller has already overlaid freshly resolved roles into the
    /// claims; timing claims are dropped and re-injected by the signer.
    pub fn from_claims(claims: &UserClaims, issuer: &str) -> Self {
        Self {
            iss: claims.iss.clone().unwrap_or_else(|| issuer.to_string()),
            sub: claims.sub.clone().unwrap_or_default(),
            email: claims.email.clone(),
            status: claims.status.unwrap_or(UserStatus::Active),
            realm: claims.realm.clone().unwrap_or_default(),
            roles: join_roles(claims.roles.as_deref().unwrap_or(&[])),
        }
    }
}

// =============================================================================
// ISSUED TOKENS
// =============================================================================

/// Access/refresh pair issued to a user.
///
/// `session_id` is never serialized into response bodies; it reaches the
/// client only through the HttpOnly session cookie.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    /// Short-lived access token (JWT)
    pub access_token: String,
    /// Refresh token (JWT), exchanged at `/auth/refresh`
    pub refresh_token: String,
    /// Backing session; travels in the cookie, not the body
    #[serde(skip_serializing, default = "Uuid::new_v4")]
    pub session_id: Uuid,
    /// Access-token expiry in unix-seconds
    pub expires_at: i64,
}

/// Access token issued to a client. No refresh token for machines - they
/// re-authenticate with their credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientToken {
    /// Access token (JWT)
    pub access_token: String,
    /// Expiry in unix-seconds
    pub expires_at: i64,
}

// =============================================================================
// Tests
// =============================================================================
