//! # OAuth Provider Engine
//!
//! Third-party identity flow (OAuth2 Authorization Code + PKCE, S256) used
//! for user registration and login.
//!
//! ## Pieces
//!
//! | Component | Role |
//! |-----------|------|
//! | [`OAuthProvider`] | Per-provider adapter: authorization URL, code exchange, userinfo |
//! | [`OAuthService`] | Composed flows: link URL, register, authenticate; owns the PKCE codes store |
//! | [`VkProvider`], [`YandexProvider`] | Concrete adapters speaking each provider's wire contract |
//!
//! ## Flow
//!
//! ```text
//! GET  /oauth/{provider}/link         ─▶ generate PKCE codes, store by state,
//!                                        return the authorization URL
//!                 │
//!        user authorizes at the provider, browser returns {code, state}
//!                 │
//! POST /{realm}/oauth/{provider}/...  ─▶ pop codes by state (single use!),
//!                                        exchange code+verifier for an
//!                                        access token, fetch userinfo,
//!                                        register-or-login, issue pair
//! ```
//!
//! The `pop` is the replay defense: a second callback carrying the same
//! `state` finds nothing and fails `BadRequest` before any provider call.

pub mod service;
pub mod vk;
pub mod yandex;

pub use service::OAuthService;
pub use vk::VkProvider;
pub use yandex::YandexProvider;

use async_trait::async_trait;
use serde::Deserialize;
use shared::auth::PkceCodes;
use shared::errors::AuthResult;

// =============================================================================
// Callback and identity types
// =============================================================================

/// Parameters the browser brings back from the provider.
#[derive(Debug, Clone, Deserialize)]
pub struct OAuthCallback {
    /// Authorization code to exchange
    pub code: String,
    /// Opaque state minted at link time; keys the stored PKCE codes
    pub state: String,
    /// VK-specific device identifier; absent for other providers
    #[serde(default)]
    pub device_id: Option<String>,
}

/// What a provider knows about the authenticated user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderIdentity {
    /// The user's identifier at the provider (globally unique per provider)
    pub provider_user_id: String,
    /// Email reported by the provider, lowercased
    pub email: String,
}

// =============================================================================
// Adapter contract
// =============================================================================

/// Per-provider adapter. One registered implementation per identity
/// provider; the name matches the row in the provider registry.
#[async_trait]
pub trait OAuthProvider: Send + Sync {
    /// Registration key (`vk`, `yandex`).
    fn name(&self) -> &'static str;

    /// Builds the provider-specific authorization URL for freshly minted
    /// PKCE codes. Pure - storage of the codes is the engine's job.
    fn authorization_url(&self, codes: &PkceCodes) -> String;

    /// Exchanges the callback's authorization code (plus the stored
    /// verifier) for a provider access token.
    async fn exchange(&self, callback: &OAuthCallback, code_verifier: &str) -> AuthResult<String>;

    /// Fetches the user's identity with a provider access token.
    async fn userinfo(&self, access_token: &str) -> AuthResult<ProviderIdentity>;
}

// =============================================================================
// Wire helpers
// =============================================================================

/// Providers are inconsistent about numeric ids - VK returns `user_id` as a
/// number or a string depending on the endpoint version, Yandex's `id` is a
/// string. Normalize both to `String`.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Text(String),
        Number(i64),
    }

    Ok(match Repr::deserialize(deserializer)? {
        Repr::Text(s) => s,
        Repr::Number(n) => n.to_string(),
    })
}

// =============================================================================
// Tests
// =============================================================================
