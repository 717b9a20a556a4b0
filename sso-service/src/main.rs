//! # SSO Service
//!
//! Multi-tenant single sign-on and OAuth2 authorization service. It
//! authenticates two classes of principals - service **clients** (the
//! client-credentials grant) and human **users** (local password or a
//! third-party identity provider) - and issues short-lived bearer tokens
//! that downstream services validate through introspection. Tenants are
//! isolated by **realms**.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer (api/)                         │
//! │            routes  ·  handlers  ·  DTOs  ·  session cookie       │
//! └───────┬──────────────────────┬──────────────────────┬─────────────┘
//!         ▼                      ▼                      ▼
//! ┌───────────────┐   ┌──────────────────┐   ┌──────────────────────┐
//! │ ClientAuth    │   │ UserAuth         │   │ OAuth engine         │
//! │ (credentials) │   │ (login/refresh/  │   │ (PKCE, VK, Yandex)   │
//! │               │   │  logout/switch)  │   │                      │
//! └──────┬────────┘   └───────┬──────────┘   └──────────┬───────────┘
//!        │        TokenService · RoleResolver           │
//!        ▼                     ▼                        ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Repositories (Postgres)        │  Stores (Redis, TTL)            │
//! │  realms · clients · users ·     │  session:{id} · codes:{state}   │
//! │  groups · identity providers    │                                 │
//! └───────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Endpoints
//!
//! | Method | Path | Purpose |
//! |--------|------|---------|
//! | GET  | `/health` | liveness (DB + session store) |
//! | POST | `/registration` | local user registration |
//! | GET  | `/oauth/{provider}/link` | provider authorization URL |
//! | POST | `/{realm}/oauth/token` | client-credentials grant |
//! | POST | `/{realm}/oauth/introspect` | client token introspection |
//! | POST | `/{realm}/oauth/{provider}/registration` | OAuth register callback |
//! | POST | `/{realm}/oauth/{provider}/authentication` | OAuth login callback |
//! | POST | `/{realm}/auth/login` | local password login |
//! | POST | `/{realm}/auth/introspect` | user token introspection |
//! | POST | `/{realm}/auth/refresh` | refresh the token pair |
//! | POST | `/{realm}/auth/logout` | end the session |
//! | POST | `/{realm}/auth/switch-realm` | re-issue tokens for another realm |
//!
//! ## Configuration
//!
//! Loaded once from the environment by [`shared::config::AppConfig`]:
//! `JWT_SECRET_KEY`, `JWT_ALGORITHM`, `POSTGRES_*` / `DATABASE_URL`,
//! `REDIS_*`, `VK_APP_ID` / `VK_APP_SECRET` / `VK_REDIRECT_URI`,
//! `YANDEX_APP_ID` / `YANDEX_APP_SECRET`.

use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use shared::auth::jwt::TokenSigner;
use shared::auth::{PkceCodes, SecretHasher};
use shared::config::{AppConfig, SessionConfig};
use shared::store::{RedisStore, Store};
use shared::{database, tracing_config};
use std::sync::Arc;
use tracing::info;

mod api;
mod domain;
mod oauth;
mod repository;
mod service;

use domain::Session;
use oauth::{OAuthService, VkProvider, YandexProvider};
use repository::{
    PgClientRepository, PgIdentityProviderRepository, PgRealmRepository, PgUserRepository,
};
use service::{ClientAuthService, RoleResolver, TokenService, UserAuthService};

/// Shared application state injected into all request handlers.
pub struct AppState {
    /// Client-credentials verification
    pub client_auth: ClientAuthService,
    /// Local login and the session-bound token lifecycle
    pub user_auth: UserAuthService,
    /// Third-party identity flows
    pub oauth: OAuthService,
    /// Token issuance and introspection policy
    pub tokens: TokenService,
    /// Session store handle (health checks)
    pub sessions: Arc<dyn Store<Session>>,
    /// Session lifetimes (cookie max-age)
    pub session_config: SessionConfig,
}

/// Entry point.
///
/// # Initialization Sequence
///
/// 1. Load configuration from the environment
/// 2. Initialize structured logging
/// 3. Connect PostgreSQL (run pending migrations) and Redis
/// 4. Wire services (fail-fast `expect` on anything unrecoverable)
/// 5. Start the HTTP server
///
/// Actix handles SIGTERM/SIGINT: it stops accepting connections, drains
/// in-flight requests, then drops the pools.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let config = AppConfig::from_env().expect("Failed to load configuration");

    tracing_config::init_tracing(&config.service_name, config.is_production());

    info!(
        service = %config.service_name,
        host = %config.server.host,
        port = %config.server.port,
        "Starting sso-service"
    );

    // ─────────────────────────────────────────────────────────────────────
    // Storage
    // ─────────────────────────────────────────────────────────────────────
    let db_pool = database::create_pool(&config.database)
        .await
        .expect("Failed to create database pool");
    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .expect("Failed to run database migrations");

    let redis_conn = shared::store::connect(&config.redis.connection_url())
        .await
        .expect("Failed to connect to Redis");
    let sessions: Arc<dyn Store<Session>> =
        Arc::new(RedisStore::new(redis_conn.clone(), "session"));
    let codes: Arc<dyn Store<PkceCodes>> = Arc::new(RedisStore::new(redis_conn, "codes"));

    // ─────────────────────────────────────────────────────────────────────
    // Services
    // ─────────────────────────────────────────────────────────────────────
    let signer = Arc::new(TokenSigner::new(&config.jwt).expect("Invalid JWT configuration"));
    let tokens = TokenService::new(signer, config.jwt.clone());
    let hasher = Arc::new(SecretHasher::new());

    let realms = Arc::new(PgRealmRepository::new(db_pool.clone()));
    let clients = Arc::new(PgClientRepository::new(db_pool.clone()));
    let users = Arc::new(PgUserRepository::new(db_pool.clone()));
    let providers = Arc::new(PgIdentityProviderRepository::new(db_pool.clone()));
    let roles = RoleResolver::new(users.clone());

    let client_auth = ClientAuthService::new(
        realms.clone(),
        clients,
        hasher.clone(),
        tokens.clone(),
    );
    let user_auth = UserAuthService::new(
        users.clone(),
        realms.clone(),
        sessions.clone(),
        hasher,
        tokens.clone(),
        roles.clone(),
        config.session.clone(),
    );
    let oauth = OAuthService::new(
        vec![
            Arc::new(VkProvider::new(config.vk.clone())),
            Arc::new(YandexProvider::new(config.yandex.clone())),
        ],
        providers,
        users,
        realms,
        sessions.clone(),
        codes,
        tokens.clone(),
        roles,
        config.session.clone(),
    );

    let app_state = web::Data::new(AppState {
        client_auth,
        user_auth,
        oauth,
        tokens,
        sessions,
        session_config: config.session.clone(),
    });
    let db_pool = web::Data::new(db_pool);

    // ─────────────────────────────────────────────────────────────────────
    // HTTP server
    // ─────────────────────────────────────────────────────────────────────
    let server_host = config.server.host.clone();
    let server_port = config.server.port;

    info!("Server listening on {}:{}", server_host, server_port);

    let mut server = HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .wrap(cors)
            .wrap(middleware::Compress::default())
            .wrap(tracing_actix_web::TracingLogger::default())
            .app_data(app_state.clone())
            .app_data(db_pool.clone())
            .configure(api::routes::configure)
    });

    if config.server.workers > 0 {
        server = server.workers(config.server.workers);
    }

    server.bind((server_host, server_port))?.run().await
}
