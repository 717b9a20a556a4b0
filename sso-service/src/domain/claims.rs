//! # Introspection Claims
//!
//! RFC 7662-style claim models returned by the introspection endpoints.
//!
//! Two outcomes exist for a structurally valid token:
//!
//! - `active = true` with the parsed claims, or
//! - `active = false` with a `cause` (`"Token expired"`, `"Invalid token
//!   in this realm"`).
//!
//! Structurally broken tokens never produce a claims object - they raise
//! `Unauthorized` before this model is built.
//!
//! ## Roles wire format
//!
//! Inside a JWT, roles travel as a space-joined string (`"admin user"`).
//! The introspection response presents them as a list. The custom serde
//! module below accepts both shapes on input and always emits the list.

use serde::{Deserialize, Serialize};
use shared::auth::TokenType;
use uuid::Uuid;

use super::enums::{Role, UserStatus};

// =============================================================================
// CLIENT CLAIMS
// =============================================================================

/// Introspection result for a client access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientClaims {
    /// Whether the token is currently usable
    #[serde(default)]
    pub active: bool,
    /// Why the token is inactive (absent when active)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_type: Option<TokenType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    /// The public client id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    /// Expiry in unix-seconds (float)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<f64>,
    /// Issued-at in unix-seconds (float)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jti: Option<Uuid>,
    /// Realm slug the token is bound to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub realm: Option<String>,
    /// Space-joined scope string as carried in the token
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl ClientClaims {
    /// An inactive result with the given cause.
    pub fn inactive(cause: impl Into<String>) -> Self {
        Self {
            active: false,
            cause: Some(cause.into()),
            token_type: None,
            iss: None,
            sub: None,
            exp: None,
            iat: None,
            jti: None,
            realm: None,
            scope: None,
        }
    }

    /// Marks decoded claims as active.
    pub fn activated(mut self) -> Self {
        self.active = true;
        self.cause = None;
        self
    }
}

// =============================================================================
// USER CLAIMS
// =============================================================================

/// Introspection result for a user token (access or refresh).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    /// Whether the token is currently usable
    #[serde(default)]
    pub active: bool,
    /// Why the token is inactive (absent when active)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_type: Option<TokenType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    /// Stringified user id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<UserStatus>,
    /// Expiry in unix-seconds (float)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<f64>,
    /// Issued-at in unix-seconds (float)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jti: Option<Uuid>,
    /// Realm slug the token is bound to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub realm: Option<String>,
    /// Role list; space-joined string inside the JWT, list on the response
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "roles_claim::deserialize"
    )]
    pub roles: Option<Vec<Role>>,
}

impl UserClaims {
    /// An inactive result with the given cause.
    pub fn inactive(cause: impl Into<String>) -> Self {
        Self {
            active: false,
            cause: Some(cause.into()),
            token_type: None,
            iss: None,
            sub: None,
            email: None,
            status: None,
            exp: None,
            iat: None,
            jti: None,
            realm: None,
            roles: None,
        }
    }

    /// Marks decoded claims as active.
    pub fn activated(mut self) -> Self {
        self.active = true;
        self.cause = None;
        self
    }

    /// Parses the `sub` claim into a user id.
    pub fn user_id(&self) -> Option<Uuid> {
        self.sub.as_deref().and_then(|s| Uuid::parse_str(s).ok())
    }
}

// =============================================================================
// Roles (de)serialization
// =============================================================================

mod roles_claim {
    use super::Role;
    use serde::de::{self, Deserializer};
    use serde::Deserialize;

    /// Accepts either the JWT shape (`"admin user"`) or an explicit list
    /// (`["admin", "user"]`).
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Vec<Role>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RolesRepr {
            Joined(String),
            List(Vec<Role>),
        }

        match Option::<RolesRepr>::deserialize(deserializer)? {
            None => Ok(None),
            Some(RolesRepr::List(roles)) => Ok(Some(roles)),
            Some(RolesRepr::Joined(joined)) => {
                let roles = joined
                    .split_whitespace()
                    .map(|r| r.parse::<Role>().map_err(de::Error::custom))
                    .collect::<Result<Vec<Role>, _>>()?;
                Ok(Some(roles))
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roles_deserialize_from_joined_string() {
        let claims: UserClaims =
            serde_json::from_str(r#"{"sub":"u1","roles":"admin user"}"#).unwrap();
        assert_eq!(claims.roles, Some(vec![Role::Admin, Role::User]));
        assert!(!claims.active);
    }

    #[test]
    fn test_roles_deserialize_from_list() {
        let claims: UserClaims =
            serde_json::from_str(r#"{"sub":"u1","roles":["guest"]}"#).unwrap();
        assert_eq!(claims.roles, Some(vec![Role::Guest]));
    }

    #[test]
    fn test_roles_serialize_as_list() {
        let claims = UserClaims {
            roles: Some(vec![Role::Admin, Role::User]),
            ..UserClaims::inactive("x")
        }
        .activated();
        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json["roles"], serde_json::json!(["admin", "user"]));
        assert_eq!(json["active"], true);
        assert!(json.get("cause").is_none());
    }

    #[test]
    fn test_unknown_role_in_token_is_an_error() {
        let result: Result<UserClaims, _> =
            serde_json::from_str(r#"{"sub":"u1","roles":"overlord"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_inactive_carries_cause() {
        let claims = ClientClaims::inactive("Token expired");
        assert!(!claims.active);
        assert_eq!(claims.cause.as_deref(), Some("Token expired"));

        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json["cause"], "Token expired");
        assert!(json.get("scope").is_none());
    }

    #[test]
    fn test_user_id_parses_sub() {
        let id = Uuid::new_v4();
        let claims = UserClaims {
            sub: Some(id.to_string()),
            ..UserClaims::inactive("x")
        };
        assert_eq!(claims.user_id(), Some(id));

        let bad = UserClaims {
            sub: Some("not-a-uuid".to_string()),
            ..UserClaims::inactive("x")
        };
        assert_eq!(bad.user_id(), None);
    }
}
