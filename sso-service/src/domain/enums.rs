//! # Domain Enumerations
//!
//! Closed vocabularies shared by entities, tokens, and claims.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// ROLE
// =============================================================================

/// RBAC label granted through group membership, scoped to a realm.
///
/// Roles travel in user tokens as a space-joined string (`"admin user"`).
/// `Ord` gives the stable order used when deduplicating before joining, so
/// split-then-join round-trips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Superadmin,
    Admin,
    User,
    Guest,
}

impl Role {
    /// The wire value used in claims and the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Superadmin => "superadmin",
            Self::Admin => "admin",
            Self::User => "user",
            Self::Guest => "guest",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "superadmin" => Ok(Self::Superadmin),
            "admin" => Ok(Self::Admin),
            "user" => Ok(Self::User),
            "guest" => Ok(Self::Guest),
            other => Err(format!("Unknown role: {other}")),
        }
    }
}

/// Roles granted to a user with no group membership in the realm.
pub const DEFAULT_ROLES: [Role; 1] = [Role::User];

// =============================================================================
// USER STATUS
// =============================================================================

/// Lifecycle status of a user account.
///
/// `Banned` and `Deleted` block every authentication path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    /// Registered, email not yet verified.
    Registered,
    /// Email confirmed.
    EmailVerified,
    /// Fully active account.
    Active,
    /// Temporarily deactivated.
    Inactive,
    /// Banned by an administrator.
    Banned,
    /// Soft-deleted.
    Deleted,
}

impl UserStatus {
    /// Whether this status blocks authentication.
    pub fn is_blocked(&self) -> bool {
        matches!(self, Self::Banned | Self::Deleted)
    }

    /// The wire value used in claims and the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Registered => "registered",
            Self::EmailVerified => "email_verified",
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Banned => "banned",
            Self::Deleted => "deleted",
        }
    }
}

impl FromStr for UserStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "registered" => Ok(Self::Registered),
            "email_verified" => Ok(Self::EmailVerified),
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            "banned" => Ok(Self::Banned),
            "deleted" => Ok(Self::Deleted),
            other => Err(format!("Unknown user status: {other}")),
        }
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// CLIENT TYPE
// =============================================================================

/// OAuth2 client profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClientType {
    /// SPA or mobile app - cannot keep a secret.
    Public,
    /// Server-side application holding a secret.
    Confidential,
    /// Machine principal for service-to-service calls.
    ServiceAccount,
}

impl FromStr for ClientType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(Self::Public),
            "confidential" => Ok(Self::Confidential),
            "service-account" => Ok(Self::ServiceAccount),
            other => Err(format!("Unknown client type: {other}")),
        }
    }
}

// =============================================================================
// GRANT TYPE
// =============================================================================

/// How a client may obtain tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantType {
    AuthorizationCode,
    ClientCredentials,
    RefreshToken,
}

impl GrantType {
    /// The wire value used in token requests and the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthorizationCode => "authorization_code",
            Self::ClientCredentials => "client_credentials",
            Self::RefreshToken => "refresh_token",
        }
    }
}

impl FromStr for GrantType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "authorization_code" => Ok(Self::AuthorizationCode),
            "client_credentials" => Ok(Self::ClientCredentials),
            "refresh_token" => Ok(Self::RefreshToken),
            other => Err(format!("Unknown grant type: {other}")),
        }
    }
}

// =============================================================================
// IDENTITY PROTOCOL
// =============================================================================

/// Protocol spoken by a third-party identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityProtocol {
    Oauth,
    Oidc,
}

impl FromStr for IdentityProtocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "oauth" => Ok(Self::Oauth),
            "oidc" => Ok(Self::Oidc),
            other => Err(format!("Unknown identity protocol: {other}")),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
