//! # OAuth Service
//!
//! Composes the per-provider adapters with the codes store, user repository,
//! session store, role resolver, and token service.
//!
//! ## Side-effect ordering (register)
//!
//! User creation precedes identity creation (one transaction inside the
//! repository), which precedes the session insert, which precedes token
//! issuance. A failure anywhere before issuance never leaks an
//! authenticated session to the caller.
//!
//! ## Ownership
//!
//! The engine references the repositories and stores; nothing references
//! the engine back. Adapters are held as trait objects keyed by name.

use shared::errors::{AuthError, AuthResult};
use shared::store::Store;
use shared::auth::PkceCodes;
use shared::config::SessionConfig;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use crate::domain::{NewIdentity, Realm, Session, TokenPair, User, UserPayload};
use crate::repository::{IdentityProviderRepo, RealmRepo, UserRepo};
use crate::service::{RoleResolver, TokenService};

use super::{OAuthCallback, OAuthProvider};

/// Register-or-login resolution over third-party identities.
#[derive(Clone)]
pub struct OAuthService {
    providers: HashMap<&'static str, Arc<dyn OAuthProvider>>,
    registry: Arc<dyn IdentityProviderRepo>,
    users: Arc<dyn UserRepo>,
    realms: Arc<dyn RealmRepo>,
    sessions: Arc<dyn Store<Session>>,
    codes: Arc<dyn Store<PkceCodes>>,
    tokens: TokenService,
    roles: RoleResolver,
    config: SessionConfig,
}

impl OAuthService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        providers: Vec<Arc<dyn OAuthProvider>>,
        registry: Arc<dyn IdentityProviderRepo>,
        users: Arc<dyn UserRepo>,
        realms: Arc<dyn RealmRepo>,
        sessions: Arc<dyn Store<Session>>,
        codes: Arc<dyn Store<PkceCodes>>,
        tokens: TokenService,
        roles: RoleResolver,
        config: SessionConfig,
    ) -> Self {
        let providers = providers
            .into_iter()
            .map(|provider| (provider.name(), provider))
            .collect();
        Self {
            providers,
            registry,
            users,
            realms,
            sessions,
            codes,
            tokens,
            roles,
            config,
        }
    }

    // =========================================================================
    // LINK
    // =========================================================================

    /// Mints PKCE codes, stores them keyed by `state`, and returns the
    /// provider's authorization URL.
    pub async fn authorization_url(&self, provider_name: &str) -> AuthResult<String> {
        let provider = self.provider(provider_name)?;
        let codes = PkceCodes::generate();
        self.codes
            .add(&codes.state, &codes, self.config.codes_ttl_seconds)
            .await?;
        info!(provider = provider.name(), state = %codes.state, "Authorization URL issued");
        Ok(provider.authorization_url(&codes))
    }

    // =========================================================================
    // REGISTER
    // =========================================================================

    /// Registers a new user from a provider callback and logs them in.
    pub async fn register(
        &self,
        realm_slug: &str,
        provider_name: &str,
        callback: &OAuthCallback,
    ) -> AuthResult<TokenPair> {
        let provider = self.provider(provider_name)?;
        let realm = self.check_realm(realm_slug).await?;

        let registration = self
            .registry
            .get_by_name(provider.name())
            .await?
            .ok_or_else(|| AuthError::NotFound("Provider not found".to_string()))?;
        if !registration.enabled {
            return Err(AuthError::NotEnabled("Provider is not enabled".to_string()));
        }

        let access_token = self.consume_callback(provider.as_ref(), callback).await?;
        let identity = provider.userinfo(&access_token).await?;

        let user = self
            .users
            .create_with_identity(NewIdentity {
                provider_id: registration.id,
                provider_user_id: identity.provider_user_id,
                email: identity.email,
            })
            .await?;

        info!(user_id = %user.id, provider = provider.name(), realm = %realm.slug, "User registered via provider");
        self.issue_for(&realm, &user).await
    }

    // =========================================================================
    // AUTHENTICATE
    // =========================================================================

    /// Logs in an existing user through a provider callback.
    pub async fn authenticate(
        &self,
        realm_slug: &str,
        provider_name: &str,
        callback: &OAuthCallback,
    ) -> AuthResult<TokenPair> {
        let provider = self.provider(provider_name)?;
        let realm = self.check_realm(realm_slug).await?;

        let access_token = self.consume_callback(provider.as_ref(), callback).await?;
        let identity = provider.userinfo(&access_token).await?;

        let user = self
            .users
            .get_by_provider(&identity.provider_user_id)
            .await?
            .ok_or_else(|| AuthError::BadRequest("User not found".to_string()))?;

        info!(user_id = %user.id, provider = provider.name(), realm = %realm.slug, "User authenticated via provider");
        self.issue_for(&realm, &user).await
    }

    // =========================================================================
    // HELPERS
    // =========================================================================

    fn provider(&self, name: &str) -> AuthResult<&Arc<dyn OAuthProvider>> {
        self.providers
            .get(name)
            .ok_or_else(|| AuthError::NotFound(format!("Unknown identity provider: {name}")))
    }

    async fn check_realm(&self, slug: &str) -> AuthResult<Realm> {
        let realm = self
            .realms
            .get_by_slug(slug)
            .await?
            .ok_or_else(|| AuthError::Unauthorized("Unknown realm".to_string()))?;
        if !realm.enabled {
            return Err(AuthError::NotEnabled("Realm is not enabled".to_string()));
        }
        Ok(realm)
    }

    /// Pops the stored PKCE codes for the callback state and exchanges the
    /// authorization code. The `pop` makes every state single-use: a replay
    /// finds nothing and fails before any provider call.
    async fn consume_callback(
        &self,
        provider: &dyn OAuthProvider,
        callback: &OAuthCallback,
    ) -> AuthResult<String> {
        let codes = self.codes.pop(&callback.state).await?.ok_or_else(|| {
            AuthError::BadRequest("Authorization state is missing or already used".to_string())
        })?;
        provider.exchange(callback, &codes.code_verifier).await
    }

    /// Roles, payload, session, pair - the shared tail of both flows.
    async fn issue_for(&self, realm: &Realm, user: &User) -> AuthResult<TokenPair> {
        let roles = self.roles.resolve(&realm.slug, user.id).await?;
        let payload = UserPayload::new(user, self.tokens.issuer(), &realm.slug, &roles);

        let session = Session::start(user.id, self.config.ttl_seconds);
        self.sessions
            .add(
                &session.session_id.to_string(),
                &session,
                session.remaining_seconds(),
            )
            .await?;

        self.tokens.issue_pair(&payload, session.session_id)
    }
}

// =============================================================================
// Tests
// =============================================================================
