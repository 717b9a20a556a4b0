//! # User Authentication Service
//!
//! Local-password login and the session-bound token lifecycle: registration,
//! introspection, refresh, logout, and realm switching.
//!
//! ## Session model
//!
//! ```text
//! login ──▶ Session (7 d TTL) ──▶ issue access/refresh pair
//!                │
//!    refresh ────┤ remaining < 5 d?  slide TTL forward by 2 d
//!                │
//!    logout ─────┴──▶ delete session  (revokes the whole token family:
//!                     introspection requires session presence)
//! ```
//!
//! The refresh token is *not* rotated on refresh; revocation relies on the
//! short access-token lifetime plus session presence. Deleting the session
//! is the single revocation switch.
//!
//! ## Realm switch
//!
//! A valid refresh token in realm A plus a live session buys a new pair for
//! realm B without re-entering credentials. The session is reused; only the
//! payload realm and roles change.

use shared::auth::SecretHasher;
use shared::errors::{AuthError, AuthResult};
use shared::store::Store;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{NewUser, Session, TokenPair, User, UserClaims, UserPayload, UserStatus};
use crate::repository::{RealmRepo, UserRepo};
use crate::service::{RoleResolver, TokenService};
use shared::config::SessionConfig;

/// Authentication service for human principals.
#[derive(Clone)]
pub struct UserAuthService {
    users: Arc<dyn UserRepo>,
    realms: Arc<dyn RealmRepo>,
    sessions: Arc<dyn Store<Session>>,
    hasher: Arc<SecretHasher>,
    tokens: TokenService,
    roles: RoleResolver,
    config: SessionConfig,
}

impl UserAuthService {
    pub fn new(
        users: Arc<dyn UserRepo>,
        realms: Arc<dyn RealmRepo>,
        sessions: Arc<dyn Store<Session>>,
        hasher: Arc<SecretHasher>,
        tokens: TokenService,
        roles: RoleResolver,
        config: SessionConfig,
    ) -> Self {
        Self {
            users,
            realms,
            sessions,
            hasher,
            tokens,
            roles,
            config,
        }
    }

    // =========================================================================
    // REGISTRATION
    // =========================================================================

    /// Registers a local user with email and password.
    ///
    /// The password is hashed off the executor; a duplicate email surfaces
    /// as `AlreadyExists`.
    pub async fn register(&self, email: &str, password: &str) -> AuthResult<User> {
        let hasher = self.hasher.clone();
        let password = password.to_string();
        let password_hash = tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AuthError::Internal(format!("Hashing task failed: {e}")))??;

        let user = self
            .users
            .create(NewUser {
                email: Some(email.to_string()),
                username: None,
                password_hash: Some(password_hash),
                status: UserStatus::Registered,
            })
            .await?;

        info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    // =========================================================================
    // LOGIN
    // =========================================================================

    /// Authenticates a user with email and password inside a realm.
    ///
    /// On success a fresh session is stored and a token pair issued against
    /// it. An unknown email and a missing password hash produce the same
    /// `InvalidCredentials` as a wrong password - the response never
    /// reveals which check failed.
    pub async fn authenticate(
        &self,
        realm_slug: &str,
        email: &str,
        password: &str,
    ) -> AuthResult<TokenPair> {
        let realm = self
            .realms
            .get_by_slug(realm_slug)
            .await?
            .ok_or_else(|| AuthError::Unauthorized("Unknown realm".to_string()))?;
        if !realm.enabled {
            return Err(AuthError::NotEnabled("Realm is not enabled".to_string()));
        }

        let user = self
            .users
            .get_by_email(email)
            .await?
            .ok_or_else(|| AuthError::InvalidCredentials("Invalid email".to_string()))?;
        let Some(password_hash) = user.password_hash.clone() else {
            // Provider-only account; local login is not available to it.
            return Err(AuthError::InvalidCredentials("Invalid email".to_string()));
        };
        if user.status.is_blocked() {
            warn!(user_id = %user.id, status = %user.status, "Blocked user attempted login");
            return Err(AuthError::NotEnabled("User is banned".to_string()));
        }

        let hasher = self.hasher.clone();
        let password = password.to_string();
        let password_matches =
            tokio::task::spawn_blocking(move || hasher.verify(&password, &password_hash))
                .await
                .map_err(|e| AuthError::Internal(format!("Verification task failed: {e}")))??;
        if !password_matches {
            warn!(user_id = %user.id, "Failed login attempt");
            return Err(AuthError::InvalidCredentials("Invalid password".to_string()));
        }

        let roles = self.roles.resolve(&realm.slug, user.id).await?;
        let payload = UserPayload::new(&user, self.tokens.issuer(), &realm.slug, &roles);

        let session = self.start_session(user.id).await?;

        info!(user_id = %user.id, realm = %realm.slug, session_id = %session.session_id, "User logged in");
        self.tokens.issue_pair(&payload, session.session_id)
    }

    // =========================================================================
    // INTROSPECTION
    // =========================================================================

    /// Introspects a user token bound to a session.
    ///
    /// Session presence is the precondition: no session, no verdict - the
    /// call fails `Unauthorized` before the token is even decoded.
    pub async fn introspect(
        &self,
        token: &str,
        realm_slug: &str,
        session_id: Uuid,
    ) -> AuthResult<UserClaims> {
        if !self.sessions.exists(&session_id.to_string()).await? {
            return Err(AuthError::Unauthorized("Session not found".to_string()));
        }
        self.tokens.introspect_user_token(token, realm_slug)
    }

    // =========================================================================
    // REFRESH
    // =========================================================================

    /// Exchanges a refresh token for a new pair, sliding the session TTL
    /// forward when it runs low.
    ///
    /// Roles are re-resolved on every refresh, so a group change takes
    /// effect at the next refresh without touching the session.
    pub async fn refresh(
        &self,
        token: &str,
        realm_slug: &str,
        session_id: Uuid,
    ) -> AuthResult<TokenPair> {
        let session = self
            .sessions
            .get(&session_id.to_string())
            .await?
            .ok_or_else(|| AuthError::Unauthorized("Session not found or expired".to_string()))?;

        let mut claims = self.introspect(token, realm_slug, session_id).await?;
        if !claims.active {
            return Err(AuthError::Unauthorized(
                claims.cause.unwrap_or_else(|| "Invalid token".to_string()),
            ));
        }

        let user_id = claims
            .user_id()
            .ok_or_else(|| AuthError::Unauthorized("Invalid token".to_string()))?;
        claims.roles = Some(self.roles.resolve(realm_slug, user_id).await?);

        let remaining = session.remaining_seconds();
        if remaining < self.config.refresh_threshold_seconds {
            self.sessions
                .refresh_ttl(
                    &session_id.to_string(),
                    remaining + self.config.refresh_extension_seconds,
                )
                .await?;
            info!(session_id = %session_id, "Session TTL extended");
        }

        let payload = UserPayload::from_claims(&claims, self.tokens.issuer());
        self.tokens.issue_pair(&payload, session_id)
    }

    // =========================================================================
    // LOGOUT
    // =========================================================================

    /// Deletes the session, revoking every token bound to it.
    ///
    /// An already-absent session is client-visible: the caller holds a
    /// cookie for something that no longer exists.
    pub async fn logout(&self, session_id: Uuid) -> AuthResult<()> {
        let deleted = self.sessions.delete(&session_id.to_string()).await?;
        if !deleted {
            return Err(AuthError::Unauthorized(
                "Session expired, maybe already logout".to_string(),
            ));
        }
        info!(session_id = %session_id, "User logged out");
        Ok(())
    }

    // =========================================================================
    // REALM SWITCH
    // =========================================================================

    /// Re-issues tokens for a different realm without re-authenticating.
    ///
    /// Requires a live session and an active refresh token in the current
    /// realm. The target realm must exist and be enabled; the user must not
    /// be blocked. The session is reused.
    pub async fn switch_realm(
        &self,
        current_realm: &str,
        target_realm: &str,
        refresh_token: &str,
        session_id: Uuid,
    ) -> AuthResult<TokenPair> {
        if current_realm == target_realm {
            return Err(AuthError::BadRequest("Realms must be different".to_string()));
        }

        self.sessions
            .get(&session_id.to_string())
            .await?
            .ok_or_else(|| {
                AuthError::Unauthorized("Invalid session or session expired".to_string())
            })?;

        let claims = self
            .introspect(refresh_token, current_realm, session_id)
            .await?;
        if !claims.active {
            return Err(AuthError::Unauthorized(
                claims.cause.unwrap_or_else(|| "Invalid token".to_string()),
            ));
        }

        let realm = match self.realms.get_by_slug(target_realm).await? {
            Some(realm) if realm.enabled => realm,
            _ => {
                warn!(target = target_realm, "Realm switch to missing or disabled realm");
                return Err(AuthError::PermissionDenied(
                    "Realm switching not allowed".to_string(),
                ));
            }
        };

        let user_id = claims
            .user_id()
            .ok_or_else(|| AuthError::Unauthorized("Invalid token".to_string()))?;
        let user = self
            .users
            .get(user_id)
            .await?
            .ok_or_else(|| AuthError::NotFound(format!("user:{user_id}")))?;
        if user.status.is_blocked() {
            return Err(AuthError::PermissionDenied("User is banned".to_string()));
        }

        let roles = self.roles.resolve(&realm.slug, user.id).await?;
        let payload = UserPayload::new(&user, self.tokens.issuer(), &realm.slug, &roles);

        info!(user_id = %user.id, from = current_realm, to = %realm.slug, "Realm switched");
        // Session reuse: the existing session backs the new pair.
        self.tokens.issue_pair(&payload, session_id)
    }

    // =========================================================================
    // HELPERS
    // =========================================================================

    /// Allocates a session and stores it with TTL equal to its remaining
    /// lifetime.
    async fn start_session(&self, user_id: Uuid) -> AuthResult<Session> {
        let session = Session::start(user_id, self.config.ttl_seconds);
        self.sessions
            .add(
                &session.session_id.to_string(),
                &session,
                session.remaining_seconds(),
            )
            .await?;
        Ok(session)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Realm, Role};
    use crate::repository::{MockRealmRepo, MockUserRepo};
    use chrono::Utc;
    use shared::auth::jwt::TokenSigner;
    use shared::config::JwtConfig;
    use shared::store::MemoryStore;

    fn jwt_config() -> JwtConfig {
        JwtConfig {
            secret_key: "test_secret_key_minimum_32_chars_required".to_string(),
            algorithm: "HS256".to_string(),
            issuer: "https://sso.test".to_string(),
            access_ttl_seconds: 900,
            refresh_ttl_seconds: 604_800,
            client_access_ttl_seconds: 1800,
        }
    }

    fn realm(slug: &str, enabled: bool) -> Realm {
        Realm {
            id: Uuid::new_v4(),
            slug: slug.to_string(),
            name: slug.to_string(),
            description: None,
            enabled,
            created_at: Utc::now(),
        }
    }

    fn user_with_password(password_hash: Option<String>, status: UserStatus) -> User {
        User {
            id: Uuid::new_v4(),
            email: Some("u@x.y".to_string()),
            username: None,
            password_hash,
            status,
            created_at: Utc::now(),
        }
    }

    struct Harness {
        users: MockUserRepo,
        realms: MockRealmRepo,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                users: MockUserRepo::new(),
                realms: MockRealmRepo::new(),
            }
        }

        fn enabled_realms(mut self) -> Self {
            self.realms
                .expect_get_by_slug()
                .returning(|slug| Ok(Some(realm(slug, true))));
            self
        }

        fn no_groups(mut self) -> Self {
            self.users.expect_get_groups().returning(|_, _| Ok(vec![]));
            self
        }

        fn build(self) -> (UserAuthService, Arc<MemoryStore<Session>>, TokenService) {
            let config = jwt_config();
            let tokens =
                TokenService::new(Arc::new(TokenSigner::new(&config).unwrap()), config);
            let sessions = Arc::new(MemoryStore::<Session>::new("session"));
            let users: Arc<dyn UserRepo> = Arc::new(self.users);
            let service = UserAuthService::new(
                users.clone(),
                Arc::new(self.realms),
                sessions.clone(),
                Arc::new(SecretHasher::new()),
                tokens.clone(),
                RoleResolver::new(users),
                SessionConfig::default(),
            );
            (service, sessions, tokens)
        }
    }

    #[tokio::test]
    async fn test_login_issues_pair_and_session() {
        let hash = SecretHasher::new().hash("Hunter2!").unwrap();
        let user = user_with_password(Some(hash), UserStatus::Active);
        let user_id = user.id;

        let mut harness = Harness::new().enabled_realms().no_groups();
        harness
            .users
            .expect_get_by_email()
            .returning(move |_| Ok(Some(user.clone())));

        let (service, sessions, tokens) = harness.build();
        let pair = service.authenticate("acme", "u@x.y", "Hunter2!").await.unwrap();

        assert!(sessions.exists(&pair.session_id.to_string()).await.unwrap());

        let claims = tokens
            .introspect_user_token(&pair.refresh_token, "acme")
            .unwrap();
        assert!(claims.active);
        assert_eq!(claims.sub.as_deref(), Some(user_id.to_string().as_str()));
        assert_eq!(claims.roles, Some(vec![Role::User]));
        assert_eq!(claims.realm.as_deref(), Some("acme"));
    }

    #[tokio::test]
    async fn test_unknown_email_and_wrong_password_same_error_kind() {
        let hash = SecretHasher::new().hash("Hunter2!").unwrap();
        let user = user_with_password(Some(hash), UserStatus::Active);

        let mut harness = Harness::new().enabled_realms();
        let known = user.clone();
        harness.users.expect_get_by_email().returning(move |email| {
            if email == "u@x.y" {
                Ok(Some(known.clone()))
            } else {
                Ok(None)
            }
        });

        let (service, _, _) = harness.build();

        let unknown = service.authenticate("acme", "ghost@x.y", "Hunter2!").await;
        let wrong = service.authenticate("acme", "u@x.y", "nope").await;
        assert!(matches!(unknown, Err(AuthError::InvalidCredentials(_))));
        assert!(matches!(wrong, Err(AuthError::InvalidCredentials(_))));
    }

    #[tokio::test]
    async fn test_provider_only_account_cannot_login_locally() {
        let user = user_with_password(None, UserStatus::Active);

        let mut harness = Harness::new().enabled_realms();
        harness
            .users
            .expect_get_by_email()
            .returning(move |_| Ok(Some(user.clone())));

        let (service, _, _) = harness.build();
        let result = service.authenticate("acme", "u@x.y", "anything").await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials(_))));
    }

    #[tokio::test]
    async fn test_banned_and_deleted_users_are_blocked() {
        for status in [UserStatus::Banned, UserStatus::Deleted] {
            let hash = SecretHasher::new().hash("Hunter2!").unwrap();
            let user = user_with_password(Some(hash), status);

            let mut harness = Harness::new().enabled_realms();
            harness
                .users
                .expect_get_by_email()
                .returning(move |_| Ok(Some(user.clone())));

            let (service, _, _) = harness.build();
            let result = service.authenticate("acme", "u@x.y", "Hunter2!").await;
            assert!(matches!(result, Err(AuthError::NotEnabled(_))));
        }
    }

    #[tokio::test]
    async fn test_introspect_requires_session() {
        let harness = Harness::new();
        let (service, _, _) = harness.build();

        let result = service
            .introspect("some-token", "acme", Uuid::new_v4())
            .await;
        assert!(matches!(result, Err(AuthError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_refresh_rotates_access_token() {
        let hash = SecretHasher::new().hash("Hunter2!").unwrap();
        let user = user_with_password(Some(hash), UserStatus::Active);

        let mut harness = Harness::new().enabled_realms().no_groups();
        harness
            .users
            .expect_get_by_email()
            .returning(move |_| Ok(Some(user.clone())));

        let (service, _, _) = harness.build();
        let p1 = service.authenticate("acme", "u@x.y", "Hunter2!").await.unwrap();

        let introspected = service
            .introspect(&p1.refresh_token, "acme", p1.session_id)
            .await
            .unwrap();
        assert!(introspected.active);

        let p2 = service
            .refresh(&p1.refresh_token, "acme", p1.session_id)
            .await
            .unwrap();
        assert_ne!(p2.access_token, p1.access_token);
        assert_eq!(p2.session_id, p1.session_id);
    }

    #[tokio::test]
    async fn test_refresh_without_session_is_unauthorized() {
        let harness = Harness::new();
        let (service, _, _) = harness.build();

        let result = service.refresh("token", "acme", Uuid::new_v4()).await;
        assert!(matches!(result, Err(AuthError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_refresh_with_wrong_realm_token_is_unauthorized() {
        let hash = SecretHasher::new().hash("Hunter2!").unwrap();
        let user = user_with_password(Some(hash), UserStatus::Active);

        let mut harness = Harness::new().enabled_realms().no_groups();
        harness
            .users
            .expect_get_by_email()
            .returning(move |_| Ok(Some(user.clone())));

        let (service, _, _) = harness.build();
        let pair = service.authenticate("acme", "u@x.y", "Hunter2!").await.unwrap();

        // Token is bound to "acme"; refreshing against "beta" must fail.
        let result = service
            .refresh(&pair.refresh_token, "beta", pair.session_id)
            .await;
        assert!(matches!(result, Err(AuthError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_logout_revokes_introspection() {
        let hash = SecretHasher::new().hash("Hunter2!").unwrap();
        let user = user_with_password(Some(hash), UserStatus::Active);

        let mut harness = Harness::new().enabled_realms().no_groups();
        harness
            .users
            .expect_get_by_email()
            .returning(move |_| Ok(Some(user.clone())));

        let (service, sessions, _) = harness.build();
        let pair = service.authenticate("acme", "u@x.y", "Hunter2!").await.unwrap();

        service.logout(pair.session_id).await.unwrap();
        assert!(!sessions.exists(&pair.session_id.to_string()).await.unwrap());

        let result = service
            .introspect(&pair.access_token, "acme", pair.session_id)
            .await;
        assert!(matches!(result, Err(AuthError::Unauthorized(_))));

        // Second logout is client-visible too.
        let again = service.logout(pair.session_id).await;
        assert!(matches!(again, Err(AuthError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_switch_realm_reuses_session_and_rebinds_tokens() {
        let hash = SecretHasher::new().hash("Hunter2!").unwrap();
        let user = user_with_password(Some(hash), UserStatus::Active);
        let by_email = user.clone();
        let by_id = user.clone();

        let mut harness = Harness::new().no_groups();
        harness
            .realms
            .expect_get_by_slug()
            .returning(|slug| Ok(Some(realm(slug, true))));
        harness
            .users
            .expect_get_by_email()
            .returning(move |_| Ok(Some(by_email.clone())));
        harness
            .users
            .expect_get()
            .returning(move |_| Ok(Some(by_id.clone())));

        let (service, _, tokens) = harness.build();
        let pair = service.authenticate("acme", "u@x.y", "Hunter2!").await.unwrap();

        let switched = service
            .switch_realm("acme", "beta", &pair.refresh_token, pair.session_id)
            .await
            .unwrap();

        assert_eq!(switched.session_id, pair.session_id);
        let claims = tokens
            .introspect_user_token(&switched.access_token, "beta")
            .unwrap();
        assert!(claims.active);
        assert_eq!(claims.realm.as_deref(), Some("beta"));
    }

    #[tokio::test]
    async fn test_switch_to_disabled_realm_is_denied() {
        let hash = SecretHasher::new().hash("Hunter2!").unwrap();
        let user = user_with_password(Some(hash), UserStatus::Active);

        let mut harness = Harness::new().no_groups();
        harness.realms.expect_get_by_slug().returning(|slug| {
            // "ghost" exists but is disabled; everything else is enabled.
            Ok(Some(realm(slug, slug != "ghost")))
        });
        harness
            .users
            .expect_get_by_email()
            .returning(move |_| Ok(Some(user.clone())));

        let (service, _, _) = harness.build();
        let pair = service.authenticate("acme", "u@x.y", "Hunter2!").await.unwrap();

        let result = service
            .switch_realm("acme", "ghost", &pair.refresh_token, pair.session_id)
            .await;
        assert!(matches!(result, Err(AuthError::PermissionDenied(_))));
    }

    #[tokio::test]
    async fn test_switch_to_same_realm_is_bad_request() {
        let harness = Harness::new();
        let (service, _, _) = harness.build();

        let result = service
            .switch_realm("acme", "acme", "token", Uuid::new_v4())
            .await;
        assert!(matches!(result, Err(AuthError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_switch_realm_blocked_user_is_denied() {
        let hash = SecretHasher::new().hash("Hunter2!").unwrap();
        let active = user_with_password(Some(hash), UserStatus::Active);
        let mut banned = active.clone();
        banned.status = UserStatus::Banned;

        let mut harness = Harness::new().no_groups();
        harness
            .realms
            .expect_get_by_slug()
            .returning(|slug| Ok(Some(realm(slug, true))));
        harness
            .users
            .expect_get_by_email()
            .returning(move |_| Ok(Some(active.clone())));
        // Banned between login and switch.
        harness
            .users
            .expect_get()
            .returning(move |_| Ok(Some(banned.clone())));

        let (service, _, _) = harness.build();
        let pair = service.authenticate("acme", "u@x.y", "Hunter2!").await.unwrap();

        let result = service
            .switch_realm("acme", "beta", &pair.refresh_token, pair.session_id)
            .await;
        assert!(matches!(result, Err(AuthError::PermissionDenied(_))));
    }

    #[tokio::test]
    async fn test_register_hashes_password() {
        let mut harness = Harness::new();
        harness.users.expect_create().returning(|new_user| {
            let hash = new_user.password_hash.clone().unwrap();
            assert!(hash.starts_with("$argon2id$"));
            Ok(User {
                id: Uuid::new_v4(),
                email: new_user.email,
                username: new_user.username,
                password_hash: new_user.password_hash,
                status: new_user.status,
                created_at: Utc::now(),
            })
        });

        let (service, _, _) = harness.build();
        let user = service.register("New@X.Y", "Hunter2!").await.unwrap();
        assert_eq!(user.status, UserStatus::Registered);
    }
}
