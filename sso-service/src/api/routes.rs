//! # Route Configuration
//!
//! ```text
//! /
//! ├── health                                    GET  → health_check
//! ├── registration                              POST → register_user
//! ├── oauth/{provider}/link                     GET  → provider_link
//! │
//! └── {realm}/
//!     ├── oauth/
//!     │   ├── token                             POST → issue_client_token
//!     │   ├── introspect                        POST → introspect_client_token
//!     │   └── {provider}/
//!     │       ├── registration                  POST → oauth_register
//!     │       └── authentication                POST → oauth_authenticate
//!     └── auth/
//!         ├── login                             POST → login_user
//!         ├── introspect                        POST → introspect_user_token
//!         ├── refresh                           POST → refresh_tokens
//!         ├── logout                            POST → logout_user
//!         └── switch-realm                      POST → switch_realm
//! ```
//!
//! Literal segments (`token`, `introspect`) are registered before the
//! `{provider}` captures so they always win the match.

use actix_web::web;

use super::handlers;

/// Registers all routes. Called from `main` during app construction.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        // Liveness probe for load balancers and orchestration
        .route("/health", web::get().to(handlers::health_check))
        // Registration and provider links are global: users are not
        // realm-scoped, realm membership comes from groups.
        .route("/registration", web::post().to(handlers::register_user))
        .route(
            "/oauth/{provider}/link",
            web::get().to(handlers::provider_link),
        )
        // Realm-scoped authentication surface
        .service(
            web::scope("/{realm}")
                .service(
                    web::scope("/oauth")
                        .route("/token", web::post().to(handlers::issue_client_token))
                        .route(
                            "/introspect",
                            web::post().to(handlers::introspect_client_token),
                        )
                        .route(
                            "/{provider}/registration",
                            web::post().to(handlers::oauth_register),
                        )
                        .route(
                            "/{provider}/authentication",
                            web::post().to(handlers::oauth_authenticate),
                        ),
                )
                .service(
                    web::scope("/auth")
                        .route("/login", web::post().to(handlers::login_user))
                        .route(
                            "/introspect",
                            web::post().to(handlers::introspect_user_token),
                        )
                        .route("/refresh", web::post().to(handlers::refresh_tokens))
                        .route("/logout", web::post().to(handlers::logout_user))
                        .route("/switch-realm", web::post().to(handlers::switch_realm)),
                ),
        );
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Realm, Session, User, UserStatus};
    use crate::oauth::OAuthService;
    use crate::repository::{
        MockClientRepo, MockIdentityProviderRepo, MockRealmRepo, MockUserRepo, RealmRepo, UserRepo,
    };
    use crate::service::{ClientAuthService, RoleResolver, TokenService, UserAuthService};
    use crate::AppState;
    use actix_web::{test, web::Data, App};
    use chrono::Utc;
    use shared::auth::jwt::TokenSigner;
    use shared::auth::{PkceCodes, SecretHasher};
    use shared::config::{JwtConfig, SessionConfig};
    use shared::store::MemoryStore;
    use std::sync::Arc;
    use uuid::Uuid;

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

    /// Builds an AppState over mocks: one active user `u@x.y` / `Hunter2!`
    /// in any enabled realm, no group memberships.
    fn test_state() -> AppState {
        let hasher = Arc::new(SecretHasher::new());
        let password_hash = hasher.hash("Hunter2!").unwrap();
        let user = User {
            id: Uuid::new_v4(),
            email: Some("u@x.y".to_string()),
            username: None,
            password_hash: Some(password_hash),
            status: UserStatus::Active,
            created_at: Utc::now(),
        };

        let mut users = MockUserRepo::new();
        users
            .expect_get_by_email()
            .returning(move |_| Ok(Some(user.clone())));
        users.expect_get_groups().returning(|_, _| Ok(vec![]));
        let users: Arc<dyn UserRepo> = Arc::new(users);

        let mut realms = MockRealmRepo::new();
        realms.expect_get_by_slug().returning(|slug| {
            Ok(Some(Realm {
                id: Uuid::new_v4(),
                slug: slug.to_string(),
                name: slug.to_string(),
                description: None,
                enabled: true,
                created_at: Utc::now(),
            }))
        });
        let realms: Arc<dyn RealmRepo> = Arc::new(realms);

        let config = jwt_config();
        let tokens = TokenService::new(Arc::new(TokenSigner::new(&config).unwrap()), config);
        let sessions: Arc<MemoryStore<Session>> = Arc::new(MemoryStore::new("session"));
        let roles = RoleResolver::new(users.clone());
        let session_config = SessionConfig::default();

        AppState {
            client_auth: ClientAuthService::new(
                realms.clone(),
                Arc::new(MockClientRepo::new()),
                hasher.clone(),
                tokens.clone(),
            ),
            user_auth: UserAuthService::new(
                users.clone(),
                realms.clone(),
                sessions.clone(),
                hasher,
                tokens.clone(),
                roles.clone(),
                session_config.clone(),
            ),
            oauth: OAuthService::new(
                vec![],
                Arc::new(MockIdentityProviderRepo::new()),
                users,
                realms,
                sessions.clone(),
                Arc::new(MemoryStore::<PkceCodes>::new("codes")),
                tokens.clone(),
                roles,
                session_config.clone(),
            ),
            tokens,
            sessions,
            session_config,
        }
    }

    #[actix_web::test]
    async fn test_login_introspect_logout_over_http() {
        let app = test::init_service(
            App::new()
                .app_data(Data::new(test_state()))
                .configure(configure),
        )
        .await;

        // Login: body carries the pair, the cookie carries the session.
        let request = test::TestRequest::post()
            .uri("/acme/auth/login")
            .set_json(serde_json::json!({"email": "u@x.y", "password": "Hunter2!"}))
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), 200);

        let cookie = response
            .response()
            .cookies()
            .find(|c| c.name() == "session_id")
            .expect("login sets the session cookie")
            .into_owned();

        let body: serde_json::Value = test::read_body_json(response).await;
        assert!(body.get("access_token").is_some());
        assert!(body.get("refresh_token").is_some());
        assert!(body.get("session_id").is_none());

        // Introspection with the cookie succeeds.
        let token = body["access_token"].as_str().unwrap().to_string();
        let request = test::TestRequest::post()
            .uri("/acme/auth/introspect")
            .cookie(cookie.clone())
            .set_json(serde_json::json!({"token": token}))
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), 200);
        let claims: serde_json::Value = test::read_body_json(response).await;
        assert_eq!(claims["active"], true);
        assert_eq!(claims["realm"], "acme");

        // Logout clears the session; introspection now fails 401.
        let request = test::TestRequest::post()
            .uri("/acme/auth/logout")
            .cookie(cookie.clone())
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), 204);

        let request = test::TestRequest::post()
            .uri("/acme/auth/introspect")
            .cookie(cookie)
            .set_json(serde_json::json!({"token": token}))
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), 401);
    }

    #[actix_web::test]
    async fn test_introspect_without_cookie_is_unauthorized() {
        let app = test::init_service(
            App::new()
                .app_data(Data::new(test_state()))
                .configure(configure),
        )
        .await;

        let request = test::TestRequest::post()
            .uri("/acme/auth/introspect")
            .set_json(serde_json::json!({"token": "whatever"}))
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), 401);
    }
}
