//! # Client Credential Verifier
//!
//! The client-credentials grant: a machine principal presents its id and
//! secret and receives a short-lived access token. No refresh token is
//! involved - clients simply re-authenticate.
//!
//! ## Verification order
//!
//! 1. grant type must be `client_credentials`
//! 2. realm must exist and be enabled
//! 3. client must exist in the realm (`Unauthorized`, not `NotFound` - the
//!    response must not reveal which realms know which client ids)
//! 4. client must be enabled
//! 5. secret must verify against the stored hash
//! 6. the requested scopes are intersected with the registration; an empty
//!    intersection denies the request
//!
//! The issued token carries the *effective* scopes - the intersection, in
//! request order - never the client's full registration.

use shared::auth::SecretHasher;
use shared::errors::{AuthError, AuthResult};
use shared::validation::parse_scope;
use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::{ClientPayload, ClientToken, GrantType};
use crate::repository::{ClientRepo, RealmRepo};
use crate::service::TokenService;

/// Authentication service for machine principals.
#[derive(Clone)]
pub struct ClientAuthService {
    realms: Arc<dyn RealmRepo>,
    clients: Arc<dyn ClientRepo>,
    hasher: Arc<SecretHasher>,
    tokens: TokenService,
}

impl ClientAuthService {
    pub fn new(
        realms: Arc<dyn RealmRepo>,
        clients: Arc<dyn ClientRepo>,
        hasher: Arc<SecretHasher>,
        tokens: TokenService,
    ) -> Self {
        Self {
            realms,
            clients,
            hasher,
            tokens,
        }
    }

    /// Runs the client-credentials grant and issues an access token.
    pub async fn authenticate(
        &self,
        realm_slug: &str,
        grant_type: &str,
        client_id: &str,
        client_secret: &str,
        scope: &str,
    ) -> AuthResult<ClientToken> {
        if grant_type != GrantType::ClientCredentials.as_str() {
            return Err(AuthError::UnsupportedGrantType(grant_type.to_string()));
        }

        let realm = self
            .realms
            .get_by_slug(realm_slug)
            .await?
            .ok_or_else(|| AuthError::Unauthorized("Unknown realm".to_string()))?;
        if !realm.enabled {
            return Err(AuthError::NotEnabled("Realm is not enabled".to_string()));
        }

        let client = self
            .clients
            .get_by_client_id(&realm.slug, client_id)
            .await?
            .ok_or_else(|| {
                warn!(realm = realm_slug, client_id, "Token request for unknown client");
                AuthError::Unauthorized("Client unauthorized in this realm".to_string())
            })?;
        if !client.enabled {
            return Err(AuthError::NotEnabled("Client not enabled yet".to_string()));
        }

        // Argon2 verification is CPU-bound; keep it off the executor.
        let hasher = self.hasher.clone();
        let secret = client_secret.to_string();
        let hash = client.client_secret_hash.clone();
        let secret_matches = tokio::task::spawn_blocking(move || hasher.verify(&secret, &hash))
            .await
            .map_err(|e| AuthError::Internal(format!("Verification task failed: {e}")))??;

        if !secret_matches {
            warn!(realm = realm_slug, client_id, "Client secret mismatch");
            return Err(AuthError::InvalidCredentials(
                "Client credentials invalid".to_string(),
            ));
        }

        let requested = parse_scope(scope)?;
        let effective = Self::validate_scopes(&requested, &client.scopes, false)
            .ok_or_else(|| AuthError::PermissionDenied("Client permission denied".to_string()))?;

        info!(
            realm = realm_slug,
            client_id,
            scope = %effective.join(" "),
            "Client authenticated"
        );

        let payload = ClientPayload::new(&client, self.tokens.issuer(), &realm.slug, &effective);
        self.tokens.issue_client_token(&payload)
    }

    /// Intersects requested scopes with the permitted set, preserving
    /// request order.
    ///
    /// - `strict = true`: any requested scope outside the permitted set
    ///   fails the whole request (`None`).
    /// - `strict = false` (the grant's mode): the intersection is granted.
    ///
    /// Returns `None` when the result would be empty.
    pub fn validate_scopes(
        requested: &[String],
        permitted: &[String],
        strict: bool,
    ) -> Option<Vec<String>> {
        let valid: Vec<String> = requested
            .iter()
            .filter(|scope| permitted.contains(scope))
            .cloned()
            .collect();

        if strict && valid.len() != requested.len() {
            return None;
        }
        if valid.is_empty() {
            return None;
        }
        Some(valid)
    }
}

// =============================================================================
// Tests
// =============================================================================
