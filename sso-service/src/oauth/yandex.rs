//! # Yandex Adapter
//!
//! Wire contract of Yandex OAuth:
//!
//! | Step | Request |
//! |------|---------|
//! | authorize | `GET {oauth}/authorize?client_id&response_type=code&state&scope=login:info login:email&code_challenge&code_challenge_method=S256` |
//! | token | `POST {oauth}/token`, form-encoded `{grant_type, code, client_id, client_secret, code_verifier}` |
//! | userinfo | `GET {login}/info?oauth_token&format=json` → `{id, default_email, ...}` |
//!
//! Unlike VK, the token request is form-encoded and carries the application
//! secret; there is no redirect URI or device id on the wire.

use async_trait::async_trait;
use serde::Deserialize;
use shared::auth::PkceCodes;
use shared::config::YandexConfig;
use shared::errors::{AuthError, AuthResult};
use tracing::debug;
use url::Url;

use super::{string_or_number, OAuthCallback, OAuthProvider, ProviderIdentity};

/// Adapter for Yandex OAuth.
#[derive(Debug, Clone)]
pub struct YandexProvider {
    config: YandexConfig,
    http: reqwest::Client,
}

impl YandexProvider {
    pub fn new(config: YandexConfig) -> Self {
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
struct YandexTokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct YandexUserinfoResponse {
    #[serde(deserialize_with = "string_or_number")]
    id: String,
    default_email: String,
}

// =============================================================================
// Adapter
// =============================================================================

#[async_trait]
impl OAuthProvider for YandexProvider {
    fn name(&self) -> &'static str {
        "yandex"
    }

    fn authorization_url(&self, codes: &PkceCodes) -> String {
        let mut url = Url::parse(&self.config.authorize_url())
            .expect("Yandex authorize URL is validated at startup");
        url.query_pairs_mut()
            .append_pair("client_id", &self.config.app_id)
            .append_pair("response_type", "code")
            .append_pair("state", &codes.state)
            .append_pair("scope", "login:info login:email")
            .append_pair("code_challenge", &codes.code_challenge)
            .append_pair("code_challenge_method", "S256");
        url.to_string()
    }

    async fn exchange(&self, callback: &OAuthCallback, code_verifier: &str) -> AuthResult<String> {
        let form = [
            ("grant_type", "authorization_code"),
            ("code", callback.code.as_str()),
            ("client_id", self.config.app_id.as_str()),
            ("client_secret", self.config.app_secret.as_str()),
            ("code_verifier", code_verifier),
        ];

        debug!(state = %callback.state, "Exchanging Yandex authorization code");
        let response = self
            .http
            .post(self.config.token_url())
            .form(&form)
            .send()
            .await
            .map_err(|e| AuthError::Provider(format!("yandex token request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AuthError::Provider(format!(
                "yandex token endpoint returned {}",
                response.status()
            )));
        }

        let token: YandexTokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::Provider(format!("yandex token response malformed: {e}")))?;
        Ok(token.access_token)
    }

    async fn userinfo(&self, access_token: &str) -> AuthResult<ProviderIdentity> {
        let response = self
            .http
            .get(&self.config.userinfo_url)
            .query(&[("oauth_token", access_token), ("format", "json")])
            .send()
            .await
            .map_err(|e| AuthError::Provider(format!("yandex userinfo request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AuthError::Provider(format!(
                "yandex userinfo endpoint returned {}",
                response.status()
            )));
        }

        let userinfo: YandexUserinfoResponse = response
            .json()
            .await
            .map_err(|e| AuthError::Provider(format!("yandex userinfo response malformed: {e}")))?;

        Ok(ProviderIdentity {
            provider_user_id: userinfo.id,
            email: userinfo.default_email.to_lowercase(),
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(server: &MockServer) -> YandexConfig {
        YandexConfig {
            app_id: "yandex-app".to_string(),
            app_secret: "yandex-secret".to_string(),
            oauth_base_url: server.uri(),
            userinfo_url: format!("{}/info", server.uri()),
        }
    }

    #[test]
    fn test_authorization_url_carries_pkce_params() {
        let config = YandexConfig {
            app_id: "yandex-app".to_string(),
            ..Default::default()
        };
        let provider = YandexProvider::new(config);
        let codes = PkceCodes::generate();
        let url = Url::parse(&provider.authorization_url(&codes)).unwrap();

        let params: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(url.host_str(), Some("oauth.yandex.ru"));
        assert_eq!(params["client_id"], "yandex-app");
        assert_eq!(params["state"], codes.state);
        assert_eq!(params["scope"], "login:info login:email");
        assert_eq!(params["code_challenge"], codes.code_challenge);
        assert_eq!(params["code_challenge_method"], "S256");
        // No redirect_uri on the Yandex authorize URL.
        assert!(!params.contains_key("redirect_uri"));
    }

    #[tokio::test]
    async fn test_exchange_posts_the_form_contract() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=authorization_code"))
            .and(body_string_contains("code=auth-code"))
            .and(body_string_contains("client_secret=yandex-secret"))
            .and(body_string_contains("code_verifier=verifier-value"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "ya-at",
                "token_type": "bearer",
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = YandexProvider::new(config(&server));
        let callback = OAuthCallback {
            code: "auth-code".to_string(),
            state: "state-1".to_string(),
            device_id: None,
        };
        let token = provider.exchange(&callback, "verifier-value").await.unwrap();
        assert_eq!(token, "ya-at");
    }

    #[tokio::test]
    async fn test_userinfo_reads_default_email() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/info"))
            .and(query_param("oauth_token", "ya-at"))
            .and(query_param("format", "json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "731200",
                "default_email": "U@X.Y",
            })))
            .mount(&server)
            .await;

        let provider = YandexProvider::new(config(&server));
        let identity = provider.userinfo("ya-at").await.unwrap();
        assert_eq!(
            identity,
            ProviderIdentity {
                provider_user_id: "731200".to_string(),
                email: "u@x.y".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_provider_error_status_maps_to_provider_kind() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let provider = YandexProvider::new(config(&server));
        let callback = OAuthCallback {
            code: "auth-code".to_string(),
            state: "state-1".to_string(),
            device_id: None,
        };
        let result = provider.exchange(&callback, "verifier").await;
        assert!(matches!(result, Err(AuthError::Provider(_))));
    }
}
