//! # Domain Entities
//!
//! Persistent business objects of the SSO core.
//!
//! ## Entity Overview
//!
//! ```text
//! ┌──────────┐ 1:N ┌──────────┐        ┌──────────────────┐
//! │  Realm   │────▶│  Client  │        │ IdentityProvider │
//! └────┬─────┘     └──────────┘        └────────┬─────────┘
//!      │ 1:N                                    │ 1:N
//!      ▼                                        ▼
//! ┌──────────┐ N:M ┌──────────┐ 1:N  ┌──────────────────┐
//! │  Group   │◀───▶│   User   │─────▶│   UserIdentity   │
//! └──────────┘     └────┬─────┘      └──────────────────┘
//!                       │ 1:N (TTL store, not Postgres)
//!                       ▼
//!                  ┌──────────┐
//!                  │ Session  │
//!                  └──────────┘
//! ```
//!
//! All entities except [`Session`] are owned by the persistent repositories;
//! the core reads them and only writes users (local registration and OAuth
//! register). Sessions live in the TTL store for their lifetime.
//!
//! ## Tenant isolation
//!
//! Clients and groups carry a `realm_id`; users and identity providers are
//! global, with role membership resolved per realm through groups.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::enums::{ClientType, GrantType, IdentityProtocol, Role, UserStatus};

// =============================================================================
// REALM
// =============================================================================

/// Logical tenant. Every authenticated path is scoped by the realm `slug`
/// (`https://sso.example.com/{slug}/auth/login`).
///
/// A disabled realm rejects all authentications inside it.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Realm {
    /// Unique identifier
    pub id: Uuid,
    /// External identifier used on every authenticated path; unique
    pub slug: String,
    /// Display name
    pub name: String,
    /// Optional description
    pub description: Option<String>,
    /// Disabled realms reject all authentications
    pub enabled: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// CLIENT
// =============================================================================

/// Machine principal registered inside a realm.
///
/// # Invariants
///
/// - `client_type = public` excludes the `client_credentials` grant
/// - at least one grant type
/// - `(realm_id, client_id)` unique
/// - the secret is stored only as a hash
/// - every scope matches `[A-Za-z0-9]+(:[A-Za-z0-9]+)*`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    /// Internal identifier
    pub id: Uuid,
    /// Owning realm
    pub realm_id: Uuid,
    /// Public identifier presented on the token request
    pub client_id: String,
    /// Hash of the client secret (Argon2id, legacy bcrypt accepted)
    #[serde(skip_serializing)]
    pub client_secret_hash: String,
    /// Display name
    pub name: String,
    /// Optional description
    pub description: Option<String>,
    /// OAuth2 client profile
    pub client_type: ClientType,
    /// Permitted token-acquisition methods
    pub grant_types: Vec<GrantType>,
    /// Registered redirect URIs (authorization-code clients)
    pub redirect_uris: Vec<String>,
    /// Scopes the client may request
    pub scopes: Vec<String>,
    /// Disabled clients cannot authenticate
    pub enabled: bool,
    /// Optional credential expiry
    pub expires_at: Option<DateTime<Utc>>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// USER
// =============================================================================

/// Human principal. Global, not realm-scoped; realm membership is expressed
/// through groups.
///
/// A user created through an identity provider has no `password_hash`, and
/// local login is not available to them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier
    pub id: Uuid,
    /// Email, lowercased at storage; optional for provider-only accounts
    pub email: Option<String>,
    /// Optional display username
    pub username: Option<String>,
    /// Argon2id hash; `None` for provider-created accounts
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    /// Lifecycle status; `banned`/`deleted` block authentication
    pub status: UserStatus,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Data required to create a local user.
///
/// The password must be pre-hashed; repositories never see plaintext.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Email (will be lowercased by the repository)
    pub email: Option<String>,
    /// Optional display username
    pub username: Option<String>,
    /// Pre-hashed password
    pub password_hash: Option<String>,
    /// Initial status
    pub status: UserStatus,
}

/// Data required to create a user together with a provider identity in one
/// logical unit (OAuth registration).
#[derive(Debug, Clone)]
pub struct NewIdentity {
    /// Registered identity provider
    pub provider_id: Uuid,
    /// The user's identifier at the provider
    pub provider_user_id: String,
    /// Email reported by the provider (lowercased)
    pub email: String,
}

// =============================================================================
// GROUPS
// =============================================================================

/// Role-bearing group inside a realm.
///
/// Membership lives in the `user_groups` join table (`(user_id, group_id)`
/// unique); the core only ever reads the groups of one user in one realm.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    /// Unique identifier
    pub id: Uuid,
    /// Owning realm
    pub realm_id: Uuid,
    /// Group name
    pub name: String,
    /// Optional description
    pub description: Option<String>,
    /// Roles granted through membership
    pub roles: Vec<Role>,
}

// =============================================================================
// IDENTITY PROVIDERS
// =============================================================================

/// Registered third-party identity provider (VK, Yandex, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityProvider {
    /// Unique identifier
    pub id: Uuid,
    /// Registration key; matches the adapter name (`vk`, `yandex`); unique
    pub name: String,
    /// Protocol spoken by the provider
    pub protocol: IdentityProtocol,
    /// Application id issued by the provider
    pub client_id: String,
    /// Application secret issued by the provider
    #[serde(skip_serializing)]
    pub client_secret: String,
    /// Scopes requested during authorization
    pub scopes: Vec<String>,
    /// Disabled providers reject link/callback flows
    pub enabled: bool,
}

/// Link between a local user and their account at a provider.
///
/// `provider_user_id` is globally unique within a provider;
/// `(user_id, provider_user_id)` unique.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct UserIdentity {
    /// Unique identifier
    pub id: Uuid,
    /// Local user
    pub user_id: Uuid,
    /// Registered provider
    pub provider_id: Uuid,
    /// The user's identifier at the provider
    pub provider_user_id: String,
    /// Email bound to the provider account
    pub email: String,
}

// =============================================================================
// SESSION
// =============================================================================

/// Server-tracked login context, stored in the TTL store under
/// `session:{session_id}`.
///
/// Presence of the session is a precondition for every user-token
/// introspection success; logout deletes it, which is the revocation
/// mechanism for the whole token family.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Session key, issued at login
    pub session_id: Uuid,
    /// Owning user
    pub user_id: Uuid,
    /// Expiry in unix-seconds; the store TTL tracks this value
    pub expires_at: i64,
    /// User-Agent of the creating request
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// IP address of the creating request
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    /// Last activity in unix-seconds (float, sub-second precision)
    pub last_activity: f64,
}

impl Session {
    /// Allocates a fresh session for a user with the given lifetime.
    pub fn start(user_id: Uuid, ttl_seconds: u64) -> Self {
        let now = Utc::now();
        Self {
            session_id: Uuid::new_v4(),
            user_id,
            expires_at: now.timestamp() + ttl_seconds as i64,
            user_agent: None,
            ip_address: None,
            last_activity: now.timestamp_micros() as f64 / 1_000_000.0,
        }
    }

    /// Seconds until expiry, floored at zero.
    pub fn remaining_seconds(&self) -> u64 {
        (self.expires_at - Utc::now().timestamp()).max(0) as u64
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_start_sets_expiry_ahead() {
        let session = Session::start(Uuid::new_v4(), 3600);
        let remaining = session.remaining_seconds();
        assert!(remaining > 3590 && remaining <= 3600);
    }

    #[test]
    fn test_session_remaining_floors_at_zero() {
        let mut session = Session::start(Uuid::new_v4(), 10);
        session.expires_at = Utc::now().timestamp() - 100;
        assert_eq!(session.remaining_seconds(), 0);
    }

    #[test]
    fn test_session_serializes_without_empty_options() {
        let session = Session::start(Uuid::new_v4(), 60);
        let json = serde_json::to_value(&session).unwrap();
        assert!(json.get("user_agent").is_none());
        assert!(json.get("ip_address").is_none());
        assert!(json.get("expires_at").is_some());
    }

    #[test]
    fn test_client_secret_hash_never_serializes() {
        let client = Client {
            id: Uuid::new_v4(),
            realm_id: Uuid::new_v4(),
            client_id: "svc-a".to_string(),
            client_secret_hash: "$argon2id$...".to_string(),
            name: "Service A".to_string(),
            description: None,
            client_type: ClientType::ServiceAccount,
            grant_types: vec![GrantType::ClientCredentials],
            redirect_uris: vec![],
            scopes: vec!["api:read".to_string()],
            enabled: true,
            expires_at: None,
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&client).unwrap();
        assert!(json.get("client_secret_hash").is_none());
    }

    #[test]
    fn test_user_password_hash_never_serializes() {
        let user = User {
            id: Uuid::new_v4(),
            email: Some("u@x.y".to_string()),
            username: None,
            password_hash: Some("$argon2id$...".to_string()),
            status: UserStatus::Active,
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["email"], "u@x.y");
    }
}
