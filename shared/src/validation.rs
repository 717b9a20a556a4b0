//! # Request and Scope Validation
//!
//! Bridges the `validator` derive macros to the error taxonomy, and checks
//! the scope label format used across clients and tokens.
//!
//! ## Scope format
//!
//! A scope is one or more alphanumeric segments joined by colons:
//!
//! ```text
//! api            valid
//! api:read       valid
//! api:read:v2    valid
//! api::read      invalid (empty segment)
//! api-read       invalid (non-alphanumeric)
//! ```

use crate::errors::AuthError;
use validator::Validate;

// =============================================================================
// Request Validation
// =============================================================================

/// Validates a request DTO that implements `Validate`.
///
/// Returns `AuthError::Validation` carrying the field-level errors, which
/// serializes into the 400 response body.
pub fn validate_request<T: Validate>(request: &T) -> Result<(), AuthError> {
    request.validate().map_err(AuthError::Validation)
}

// =============================================================================
// Scope Validation
// =============================================================================

/// Checks that a single scope label matches `[A-Za-z0-9]+(:[A-Za-z0-9]+)*`.
pub fn is_valid_scope(scope: &str) -> bool {
    !scope.is_empty()
        && scope
            .split(':')
            .all(|segment| !segment.is_empty() && segment.chars().all(|c| c.is_ascii_alphanumeric()))
}

/// Validates a list of scope labels, returning the list unchanged.
///
/// # Errors
///
/// `AuthError::BadRequest` naming the first malformed scope.
pub fn validate_scopes(scopes: &[String]) -> Result<(), AuthError> {
    for scope in scopes {
        if !is_valid_scope(scope) {
            return Err(AuthError::BadRequest(format!("Invalid scope format: {scope}")));
        }
    }
    Ok(())
}

/// Splits a space-joined scope string into labels, validating each.
///
/// The client-credentials grant carries its requested scope as a single
/// space-joined string (`"api:read api:write"`).
pub fn parse_scope(scope: &str) -> Result<Vec<String>, AuthError> {
    let scopes: Vec<String> = scope
        .split_whitespace()
        .map(|s| s.to_string())
        .collect();
    validate_scopes(&scopes)?;
    Ok(scopes)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_scope_formats() {
        assert!(is_valid_scope("api"));
        assert!(is_valid_scope("api:read"));
        assert!(is_valid_scope("api:read:v2"));
        assert!(is_valid_scope("Payments01:refund"));
    }

    #[test]
    fn test_invalid_scope_formats() {
        assert!(!is_valid_scope(""));
        assert!(!is_valid_scope("api:"));
        assert!(!is_valid_scope(":read"));
        assert!(!is_valid_scope("api::read"));
        assert!(!is_valid_scope("api-read"));
        assert!(!is_valid_scope("api read"));
    }

    #[test]
    fn test_parse_scope_splits_on_whitespace() {
        let scopes = parse_scope("api:read api:write").unwrap();
        assert_eq!(scopes, vec!["api:read".to_string(), "api:write".to_string()]);
    }

    #[test]
    fn test_parse_scope_rejects_malformed_label() {
        let result = parse_scope("api:read bad~scope");
        assert!(matches!(result, Err(AuthError::BadRequest(_))));
    }

    #[test]
    fn test_parse_scope_empty_string() {
        let scopes = parse_scope("").unwrap();
        assert!(scopes.is_empty());
    }
}
