//! # VK Adapter
//!
//! Wire contract of the VK id platform:
//!
//! | Step | Request |
//! |------|---------|
//! | authorize | `GET {base}/authorize?client_id&redirect_uri&response_type=code&state&scope=email&code_challenge&code_challenge_method=S256` |
//! | token | `POST {base}/oauth2/auth`, JSON `{grant_type, code, code_verifier, client_id, device_id, redirect_uri, state}` |
//! | userinfo | `POST {base}/oauth2/user_info`, JSON `{access_token, client_id}` → `{user: {user_id, email, ...}}` |
//!
//! VK insists on the `device_id` the browser received alongside the code;
//! a callback without it cannot be exchanged.

use async_trait::async_trait;
use serde::Deserialize;
use shared::auth::PkceCodes;
use shared::config::VkConfig;
use shared::errors::{AuthError, AuthResult};
use tracing::debug;
use url::Url;

use super::{string_or_number, OAuthCallback, OAuthProvider, ProviderIdentity};

/// Adapter for the VK id platform.
#[derive(Debug, Clone)]
pub struct VkProvider {
    config: VkConfig,
    http: reqwest::Client,
}

impl VkProvider {
    pub fn new(config: VkConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }
}

// =============================================================================
// Wire shapes
// =============================================================================

#[derive(Debug, Deserialize)]
struct VkTokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct VkUserinfoResponse {
    user: VkUser,
}

#[derive(Debug, Deserialize)]
struct VkUser {
    #[serde(deserialize_with = "string_or_number")]
    user_id: String,
    email: String,
}

// =============================================================================
// Adapter
// =============================================================================

#[async_trait]
impl OAuthProvider for VkProvider {
    fn name(&self) -> &'static str {
        "vk"
    }

    fn authorization_url(&self, codes: &PkceCodes) -> String {
        let mut url = Url::parse(&self.config.authorize_url())
            .expect("VK authorize URL is validated at startup");
        url.query_pairs_mut()
            .append_pair("client_id", &self.config.app_id)
            .append_pair("redirect_uri", &self.config.redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("state", &codes.state)
            .append_pair("scope", "email")
            .append_pair("code_challenge", &codes.code_challenge)
            .append_pair("code_challenge_method", "S256");
        url.to_string()
    }

    async fn exchange(&self, callback: &OAuthCallback, code_verifier: &str) -> AuthResult<String> {
        let device_id = callback.device_id.as_deref().ok_or_else(|| {
            AuthError::BadRequest("device_id is required for the VK callback".to_string())
        })?;

        let body = serde_json::json!({
            "grant_type": "authorization_code",
            "code": callback.code,
            "code_verifier": code_verifier,
            "client_id": self.config.app_id,
            "device_id": device_id,
            "redirect_uri": self.config.redirect_uri,
            "state": callback.state,
        });

        debug!(state = %callback.state, "Exchanging VK authorization code");
        let response = self
            .http
            .post(self.config.token_url())
            .json(&body)
            .send()
            .await
            .map_err(|e| AuthError::Provider(format!("vk token request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AuthError::Provider(format!(
                "vk token endpoint returned {}",
                response.status()
            )));
        }

        let token: VkTokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::Provider(format!("vk token response malformed: {e}")))?;
        Ok(token.access_token)
    }

    async fn userinfo(&self, access_token: &str) -> AuthResult<ProviderIdentity> {
        let body = serde_json::json!({
            "access_token": access_token,
            "client_id": self.config.app_id,
        });

        let response = self
            .http
            .post(self.config.userinfo_url())
            .json(&body)
            .send()
            .await
            .map_err(|e| AuthError::Provider(format!("vk userinfo request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AuthError::Provider(format!(
                "vk userinfo endpoint returned {}",
                response.status()
            )));
        }

        let userinfo: VkUserinfoResponse = response
            .json()
            .await
            .map_err(|e| AuthError::Provider(format!("vk userinfo response malformed: {e}")))?;

        Ok(ProviderIdentity {
            provider_user_id: userinfo.user.user_id,
            email: userinfo.user.email.to_lowercase(),
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(base_url: &str) -> VkConfig {
        VkConfig {
            app_id: "51234567".to_string(),
            app_secret: "vk-secret".to_string(),
            redirect_uri: "https://app.example.com/callback".to_string(),
            base_url: base_url.to_string(),
        }
    }

    fn callback(state: &str) -> OAuthCallback {
        OAuthCallback {
            code: "auth-code".to_string(),
            state: state.to_string(),
            device_id: Some("device-1".to_string()),
        }
    }

    #[test]
    fn test_authorization_url_carries_pkce_params() {
        let provider = VkProvider::new(config("https://id.vk.com"));
        let codes = PkceCodes::generate();
        let url = Url::parse(&provider.authorization_url(&codes)).unwrap();

        let params: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(url.path(), "/authorize");
        assert_eq!(params["client_id"], "51234567");
        assert_eq!(params["response_type"], "code");
        assert_eq!(params["state"], codes.state);
        assert_eq!(params["scope"], "email");
        assert_eq!(params["code_challenge"], codes.code_challenge);
        assert_eq!(params["code_challenge_method"], "S256");
        assert_eq!(params["redirect_uri"], "https://app.example.com/callback");
    }

    #[tokio::test]
    async fn test_exchange_posts_the_vk_json_contract() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth2/auth"))
            .and(body_partial_json(serde_json::json!({
                "grant_type": "authorization_code",
                "code": "auth-code",
                "client_id": "51234567",
                "device_id": "device-1",
                "state": "state-1",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "vk-at",
                "user_id": 42,
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = VkProvider::new(config(&server.uri()));
        let token = provider
            .exchange(&callback("state-1"), "verifier-value")
            .await
            .unwrap();
        assert_eq!(token, "vk-at");
    }

    #[tokio::test]
    async fn test_exchange_without_device_id_is_bad_request() {
        let provider = VkProvider::new(config("https://id.vk.com"));
        let mut cb = callback("state-1");
        cb.device_id = None;

        let result = provider.exchange(&cb, "verifier").await;
        assert!(matches!(result, Err(AuthError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_exchange_maps_provider_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth2/auth"))
            .respond_with(ResponseTemplate::new(400))
            .mount(&server)
            .await;

        let provider = VkProvider::new(config(&server.uri()));
        let result = provider.exchange(&callback("state-1"), "verifier").await;
        assert!(matches!(result, Err(AuthError::Provider(_))));
    }

    #[tokio::test]
    async fn test_userinfo_lowercases_email_and_stringifies_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth2/user_info"))
            .and(body_partial_json(serde_json::json!({
                "access_token": "vk-at",
                "client_id": "51234567",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "user": { "user_id": 42, "email": "User@Example.COM" }
            })))
            .mount(&server)
            .await;

        let provider = VkProvider::new(config(&server.uri()));
        let identity = provider.userinfo("vk-at").await.unwrap();
        assert_eq!(
            identity,
            ProviderIdentity {
                provider_user_id: "42".to_string(),
                email: "user@example.com".to_string(),
            }
        );
    }
}
