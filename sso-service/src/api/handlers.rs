//! # Request Handlers
//!
//! Each handler follows the same pattern:
//!
//! 1. **Extract** path, body, and the session cookie
//! 2. **Validate** the body (`validator`)
//! 3. **Call** the service layer
//! 4. **Translate** the result (JSON body, cookie updates)
//!
//! ## The session cookie
//!
//! `session_id` travels exclusively in an HttpOnly `SameSite=Lax` cookie.
//! Login, refresh, and the OAuth callbacks (re)set it; logout removes it.
//! Token-pair bodies never contain the session id.

use actix_web::cookie::{time::Duration as CookieDuration, Cookie, SameSite};
use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;
use shared::errors::AuthError;
use shared::validation::validate_request;
use sqlx::PgPool;
use uuid::Uuid;

use crate::oauth::OAuthCallback;
use crate::AppState;

use super::dto::{
    ClientCredentialsRequest, HealthResponse, IntrospectRequest, LinkResponse, LoginRequest,
    RefreshRequest, RegisterRequest, SwitchRealmRequest, UserResponse,
};

// =============================================================================
// COOKIE HELPERS
// =============================================================================

/// Builds the session cookie set on login, refresh, and OAuth callbacks.
fn session_cookie(session_id: Uuid, max_age_seconds: u64) -> Cookie<'static> {
    Cookie::build("session_id", session_id.to_string())
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(CookieDuration::seconds(max_age_seconds as i64))
        .finish()
}

/// Reads the session id cookie, if present and well-formed.
fn session_from_request(req: &HttpRequest) -> Option<Uuid> {
    req.cookie("session_id")
        .and_then(|cookie| Uuid::parse_str(cookie.value()).ok())
}

// =============================================================================
// HEALTH
// =============================================================================

/// `GET /health` - service, database, and session-store liveness.
pub async fn health_check(
    state: web::Data<AppState>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AuthError> {
    shared::database::health_check(&pool).await?;
    state.sessions.exists("healthcheck").await?;

    Ok(HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        service: "sso-service".to_string(),
        timestamp: Utc::now().to_rfc3339(),
    }))
}

// =============================================================================
// CLIENTS
// =============================================================================

/// `POST /{realm}/oauth/token` - the client-credentials grant.
pub async fn issue_client_token(
    state: web::Data<AppState>,
    realm: web::Path<String>,
    body: web::Json<ClientCredentialsRequest>,
) -> Result<HttpResponse, AuthError> {
    let body = body.into_inner();
    validate_request(&body)?;

    let token = state
        .client_auth
        .authenticate(
            &realm,
            &body.grant_type,
            &body.client_id,
            &body.client_secret,
            &body.scope,
        )
        .await?;

    Ok(HttpResponse::Ok().json(token))
}

/// `POST /{realm}/oauth/introspect` - client token introspection.
pub async fn introspect_client_token(
    state: web::Data<AppState>,
    realm: web::Path<String>,
    body: web::Json<IntrospectRequest>,
) -> Result<HttpResponse, AuthError> {
    let body = body.into_inner();
    validate_request(&body)?;

    let claims = state.tokens.introspect_client(&body.token, &realm)?;
    Ok(HttpResponse::Ok().json(claims))
}

// =============================================================================
// REGISTRATION
// =============================================================================

/// `POST /registration` - local user registration.
pub async fn register_user(
    state: web::Data<AppState>,
    body: web::Json<RegisterRequest>,
) -> Result<HttpResponse, AuthError> {
    let body = body.into_inner();
    validate_request(&body)?;

    let user = state.user_auth.register(&body.email, &body.password).await?;
    Ok(HttpResponse::Created().json(UserResponse::from(user)))
}

// =============================================================================
// LOGIN / INTROSPECT / REFRESH
// =============================================================================

/// `POST /{realm}/auth/login` - local password login. Sets the session
/// cookie alongside the token pair.
pub async fn login_user(
    state: web::Data<AppState>,
    realm: web::Path<String>,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse, AuthError> {
    let body = body.into_inner();
    validate_request(&body)?;

    let pair = state
        .user_auth
        .authenticate(&realm, &body.email, &body.password)
        .await?;

    Ok(HttpResponse::Ok()
        .cookie(session_cookie(pair.session_id, state.session_config.ttl_seconds))
        .json(pair))
}

/// `POST /{realm}/auth/introspect` - user token introspection. The session
/// id comes from the cookie; a missing cookie reads as a missing session.
pub async fn introspect_user_token(
    state: web::Data<AppState>,
    realm: web::Path<String>,
    body: web::Json<IntrospectRequest>,
    req: HttpRequest,
) -> Result<HttpResponse, AuthError> {
    let body = body.into_inner();
    validate_request(&body)?;

    let session_id = session_from_request(&req)
        .ok_or_else(|| AuthError::Unauthorized("Session not found".to_string()))?;

    let claims = state
        .user_auth
        .introspect(&body.token, &realm, session_id)
        .await?;
    Ok(HttpResponse::Ok().json(claims))
}

/// `POST /{realm}/auth/refresh` - exchanges the refresh token for a new
/// pair and re-sets the (possibly extended) session cookie.
pub async fn refresh_tokens(
    state: web::Data<AppState>,
    realm: web::Path<String>,
    body: web::Json<RefreshRequest>,
    req: HttpRequest,
) -> Result<HttpResponse, AuthError> {
    let body = body.into_inner();
    validate_request(&body)?;

    let session_id = session_from_request(&req)
        .ok_or_else(|| AuthError::Unauthorized("Session not found or expired".to_string()))?;

    let pair = state
        .user_auth
        .refresh(&body.refresh_token, &realm, session_id)
        .await?;

    Ok(HttpResponse::Ok()
        .cookie(session_cookie(pair.session_id, state.session_config.ttl_seconds))
        .json(pair))
}

// =============================================================================
// LOGOUT / REALM SWITCH
// =============================================================================

/// `POST /{realm}/auth/logout` - deletes the session and removes the
/// cookie. 204 on success.
pub async fn logout_user(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<HttpResponse, AuthError> {
    let session_id = session_from_request(&req)
        .ok_or_else(|| AuthError::Unauthorized("Session id is missing in cookies".to_string()))?;

    state.user_auth.logout(session_id).await?;

    let mut removal = Cookie::new("session_id", "");
    removal.set_path("/");
    removal.make_removal();

    Ok(HttpResponse::NoContent().cookie(removal).finish())
}

/// `POST /{realm}/auth/switch-realm` - re-issues tokens for another realm
/// on the same session.
pub async fn switch_realm(
    state: web::Data<AppState>,
    realm: web::Path<String>,
    body: web::Json<SwitchRealmRequest>,
    req: HttpRequest,
) -> Result<HttpResponse, AuthError> {
    let body = body.into_inner();
    validate_request(&body)?;

    let session_id = session_from_request(&req)
        .ok_or_else(|| AuthError::Unauthorized("Session id is missing in cookies".to_string()))?;

    let pair = state
        .user_auth
        .switch_realm(&realm, &body.target_realm, &body.refresh_token, session_id)
        .await?;

    Ok(HttpResponse::Ok().json(pair))
}

// =============================================================================
// IDENTITY PROVIDERS
// =============================================================================

/// `GET /oauth/{provider}/link` - authorization URL for a provider.
pub async fn provider_link(
    state: web::Data<AppState>,
    provider: web::Path<String>,
) -> Result<HttpResponse, AuthError> {
    let url = state.oauth.authorization_url(&provider).await?;
    Ok(HttpResponse::Ok().json(LinkResponse { url }))
}

/// `POST /{realm}/oauth/{provider}/registration` - OAuth register callback.
pub async fn oauth_register(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    body: web::Json<OAuthCallback>,
) -> Result<HttpResponse, AuthError> {
    let (realm, provider) = path.into_inner();
    let pair = state.oauth.register(&realm, &provider, &body).await?;

    Ok(HttpResponse::Created()
        .cookie(session_cookie(pair.session_id, state.session_config.ttl_seconds))
        .json(pair))
}

/// `POST /{realm}/oauth/{provider}/authentication` - OAuth login callback.
pub async fn oauth_authenticate(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    body: web::Json<OAuthCallback>,
) -> Result<HttpResponse, AuthError> {
    let (realm, provider) = path.into_inner();
    let pair = state.oauth.authenticate(&realm, &provider, &body).await?;

    Ok(HttpResponse::Ok()
        .cookie(session_cookie(pair.session_id, state.session_config.ttl_seconds))
        .json(pair))
}
