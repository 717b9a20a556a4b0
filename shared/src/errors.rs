//! # Error Taxonomy
//!
//! Unified error handling for the SSO service with automatic HTTP conversion.
//!
//! ## Error Kinds
//!
//! ```text
//! ┌──────────────────────────┬─────────────────────┬──────────────────────────┐
//! │ Authentication (401)     │ Authorization (403) │ Request (400)            │
//! ├──────────────────────────┼─────────────────────┼──────────────────────────┤
//! │ InvalidCredentials       │ NotEnabled          │ UnsupportedGrantType     │
//! │ Unauthorized             │ PermissionDenied    │ BadRequest               │
//! │ InvalidToken             │                     │ Validation               │
//! ├──────────────────────────┴─────────────────────┴──────────────────────────┤
//! │ Resources (404, 409)     │ Server (500, 502)                              │
//! ├──────────────────────────┼────────────────────────────────────────────────┤
//! │ NotFound                 │ Database, Redis, Internal                      │
//! │ AlreadyExists            │ Provider (upstream identity provider)          │
//! └──────────────────────────┴────────────────────────────────────────────────┘
//! ```
//!
//! Two rules shape the taxonomy:
//!
//! - Credential failures never reveal whether the subject exists or the
//!   secret was wrong beyond the shared `InvalidCredentials` kind.
//! - A structurally broken token raises `Unauthorized`; an *expired* token
//!   is not an error at all - introspection reports `active = false`.
//!
//! ## HTTP Response Format
//!
//! ```json
//! {
//!   "code": "INVALID_CREDENTIALS",
//!   "message": "Invalid password",
//!   "timestamp": "2026-01-15T10:30:00Z"
//! }
//! ```

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::ValidationErrors;

// =============================================================================
// Type Aliases
// =============================================================================

/// Result type alias for handlers and services.
pub type AuthResult<T> = Result<T, AuthError>;

// =============================================================================
// Main Error Enum
// =============================================================================

/// Application error type with automatic HTTP status mapping.
///
/// Variants carry a human-readable message where callers need to
/// distinguish causes ("Invalid email" vs "Invalid password" stay internal
/// to logs; the HTTP layer sees one `INVALID_CREDENTIALS` code).
#[derive(Debug, Error)]
pub enum AuthError {
    // =========================================================================
    // Grant / request errors (400 Bad Request)
    // =========================================================================
    /// Grant type is unknown or forbidden for the client.
    #[error("Unsupported grant type: {0}")]
    UnsupportedGrantType(String),

    /// Consumed or missing PKCE state, mismatched realm argument, and other
    /// semantically invalid requests.
    #[error("{0}")]
    BadRequest(String),

    /// Request body failed declarative validation.
    #[error("Validation error")]
    Validation(#[from] ValidationErrors),

    // =========================================================================
    // Authentication errors (401 Unauthorized)
    // =========================================================================
    /// Password or client secret mismatch, or unknown subject on login.
    #[error("{0}")]
    InvalidCredentials(String),

    /// Missing or invalid token, missing session.
    #[error("{0}")]
    Unauthorized(String),

    /// Token decode or signature failure. Internal to the token service;
    /// surfaces to callers as `Unauthorized`.
    #[error("Invalid token")]
    InvalidToken,

    // =========================================================================
    // Authorization errors (403 Forbidden)
    // =========================================================================
    /// Disabled client or realm, banned user.
    #[error("{0}")]
    NotEnabled(String),

    /// Empty scope intersection, disabled target realm.
    #[error("{0}")]
    PermissionDenied(String),

    // =========================================================================
    // Resource errors (404 Not Found, 409 Conflict)
    // =========================================================================
    /// Identity provider not registered, or other missing resource.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Unique-constraint violation on create.
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    // =========================================================================
    // Server errors (500, 502)
    // =========================================================================
    /// PostgreSQL query failed. Details logged, generic message returned.
    #[error("Database error")]
    Database(#[from] sqlx::Error),

    /// Redis operation failed. Details logged, generic message returned.
    #[error("Session store error")]
    Redis(#[from] redis::RedisError),

    /// Upstream identity provider returned an error or was unreachable.
    #[error("Identity provider error: {0}")]
    Provider(String),

    /// Unspecified internal error.
    #[error("Internal server error")]
    Internal(String),
}

// =============================================================================
// Error Methods
// =============================================================================

impl AuthError {
    /// Returns a machine-readable error code.
    ///
    /// Codes are stable and usable by API clients for programmatic handling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::UnsupportedGrantType(_) => "UNSUPPORTED_GRANT_TYPE",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::InvalidCredentials(_) => "INVALID_CREDENTIALS",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::NotEnabled(_) => "NOT_ENABLED",
            Self::PermissionDenied(_) => "PERMISSION_DENIED",
            Self::NotFound(_) => "NOT_FOUND",
            Self::AlreadyExists(_) => "ALREADY_EXISTS",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Redis(_) => "STORE_ERROR",
            Self::Provider(_) => "PROVIDER_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    ///
    /// Single source of truth for the error-to-status mapping.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::UnsupportedGrantType(_) | Self::BadRequest(_) | Self::Validation(_) => {
                StatusCode::BAD_REQUEST
            }

            Self::InvalidCredentials(_) | Self::Unauthorized(_) | Self::InvalidToken => {
                StatusCode::UNAUTHORIZED
            }

            Self::NotEnabled(_) | Self::PermissionDenied(_) => StatusCode::FORBIDDEN,

            Self::NotFound(_) => StatusCode::NOT_FOUND,

            Self::AlreadyExists(_) => StatusCode::CONFLICT,

            Self::Database(_) | Self::Redis(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }

            Self::Provider(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Returns `true` if this is a server-side error (5xx).
    ///
    /// Server errors are logged at ERROR level and never expose internal
    /// details to clients. Client errors (4xx) log at WARN.
    pub fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Database(_) | Self::Redis(_) | Self::Internal(_) | Self::Provider(_)
        )
    }
}

// =============================================================================
// Response Structure
// =============================================================================

/// Standard error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Machine-readable error code for programmatic handling
    pub code: String,

    /// Human-readable message (for debugging, not for user display)
    pub message: String,

    /// Additional error details (field-level validation errors)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,

    /// When the error occurred (ISO 8601)
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl ErrorResponse {
    /// Builds a response body from an error.
    ///
    /// Server-side errors are reduced to their generic message so internal
    /// details (SQL, Redis, upstream bodies) never leak to clients.
    pub fn new(error: &AuthError) -> Self {
        let details = match error {
            AuthError::Validation(errors) => Some(serde_json::to_value(errors).unwrap_or_default()),
            _ => None,
        };

        let message = if error.is_server_error() {
            match error {
                AuthError::Provider(_) => "Identity provider error".to_string(),
                _ => "Internal server error".to_string(),
            }
        } else {
            error.to_string()
        };

        Self {
            code: error.error_code().to_string(),
            message,
            details,
            timestamp: chrono::Utc::now(),
        }
    }
}

// =============================================================================
// Actix-web Integration
// =============================================================================

/// Allows returning `AuthError` directly from handlers; the error converts
/// to an HTTP response with the mapped status code and JSON body.
impl ResponseError for AuthError {
    fn status_code(&self) -> StatusCode {
        self.status_code()
    }

    fn error_response(&self) -> HttpResponse {
        if self.is_server_error() {
            tracing::error!(code = self.error_code(), error = %self, "Request failed");
        } else {
            tracing::warn!(code = self.error_code(), error = %self, "Request rejected");
        }
        let response = ErrorResponse::new(self);
        HttpResponse::build(self.status_code()).json(response)
    }
}

// =============================================================================
// Tests
// =============================================================================
