//! # Data Transfer Objects
//!
//! Request and response bodies of the SSO API. Field names follow the OAuth2
//! wire conventions (`access_token`, `grant_type`, ...), so everything stays
//! snake_case.
//!
//! Token responses serialize the domain types directly ([`TokenPair`]
//! excludes `session_id`; it travels only in the HttpOnly cookie).
//!
//! [`TokenPair`]: crate::domain::TokenPair

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::domain::{User, UserStatus};

// =============================================================================
// OAUTH (clients)
// =============================================================================

/// Body of `POST /{realm}/oauth/token` - the client-credentials grant.
///
/// ```json
/// {
///   "grant_type": "client_credentials",
///   "client_id": "svc-a",
///   "client_secret": "...",
///   "scope": "api:read api:write"
/// }
/// ```
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ClientCredentialsRequest {
    /// Must be `client_credentials`; anything else is rejected
    #[validate(length(min = 1, message = "grant_type is required"))]
    pub grant_type: String,

    /// Public client identifier
    #[validate(length(min = 1, message = "client_id is required"))]
    pub client_id: String,

    /// Client secret
    #[validate(length(min = 1, message = "client_secret is required"))]
    pub client_secret: String,

    /// Space-joined requested scopes
    #[serde(default)]
    pub scope: String,
}

/// Body of the introspection endpoints.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct IntrospectRequest {
    /// The token under inspection
    #[validate(length(min = 1, message = "token is required"))]
    pub token: String,
}

// =============================================================================
// USERS
// =============================================================================

/// Body of `POST /registration`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Email; becomes the login identifier, lowercased at storage
    #[validate(email(message = "Invalid email format"))]
    #[validate(length(max = 255, message = "Email too long"))]
    pub email: String,

    /// Plain text password
    #[validate(length(min = 8, max = 128, message = "Password must be 8-128 characters"))]
    pub password: String,
}

/// Body of `POST /{realm}/auth/login`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email used at registration
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Plain text password
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Body of `POST /{realm}/auth/refresh`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RefreshRequest {
    /// The refresh token from the last issued pair
    #[validate(length(min = 1, message = "refresh_token is required"))]
    pub refresh_token: String,
}

/// Body of `POST /{realm}/auth/switch-realm`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SwitchRealmRequest {
    /// Slug of the realm to switch into
    #[validate(length(min = 1, message = "target_realm is required"))]
    pub target_realm: String,

    /// A refresh token valid in the current realm
    #[validate(length(min = 1, message = "refresh_token is required"))]
    pub refresh_token: String,
}

// =============================================================================
// RESPONSES
// =============================================================================

/// Response of `GET /oauth/{provider}/link`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkResponse {
    /// Authorization URL the browser should be sent to
    pub url: String,
}

/// Public view of a user (no credential material).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: Option<String>,
    pub username: Option<String>,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            username: user.username,
            status: user.status,
            created_at: user.created_at,
        }
    }
}

/// Health probe response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub timestamp: String,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn test_register_request_rejects_bad_email() {
        let request = RegisterRequest {
            email: "not-an-email".to_string(),
            password: "longenough1".to_string(),
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_register_request_rejects_short_password() {
        let request = RegisterRequest {
            email: "u@x.y".to_string(),
            password: "short".to_string(),
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_client_credentials_scope_defaults_to_empty() {
        let request: ClientCredentialsRequest = serde_json::from_str(
            r#"{"grant_type":"client_credentials","client_id":"svc","client_secret":"s"}"#,
        )
        .unwrap();
        assert_eq!(request.scope, "");
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_user_response_hides_credentials() {
        let user = User {
            id: Uuid::new_v4(),
            email: Some("u@x.y".to_string()),
            username: None,
            password_hash: Some("$argon2id$...".to_string()),
            status: UserStatus::Registered,
            created_at: Utc::now(),
        };
        let response = UserResponse::from(user);
        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["status"], "registered");
    }
}
