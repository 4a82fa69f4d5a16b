//! OpenID Connect client for Google sign-in.

use std::time::Duration;

use thiserror::Error;
use tokio::sync::OnceCell;
use url::Url;

use crate::config::AppConfig;

use super::types::{
    AuthenticatedIdentity, AuthorizationRedirect, PendingAuthorization, ProviderMetadata,
    TokenResponse, UserInfo,
};

/// Scopes requested on every login.
pub const LOGIN_SCOPES: &[&str] = &["openid", "email", "profile"];

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{operation} failed with status {status}: {detail}")]
    Provider {
        operation: &'static str,
        status: u16,
        detail: String,
    },

    #[error("Token response did not include an id_token")]
    MissingIdToken,

    #[error("Authorization state missing or does not match")]
    StateMismatch,
}

/// Client for the identity provider. Built once at startup and shared read-only.
pub struct OidcClient {
    client_id: String,
    client_secret: String,
    discovery_url: Url,
    http: reqwest::Client,
    metadata: OnceCell<ProviderMetadata>,
}

impl OidcClient {
    pub fn new(config: &AppConfig) -> Result<Self, AuthError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()?;

        Ok(Self {
            client_id: config.google_client_id.clone(),
            client_secret: config.google_client_secret.clone(),
            discovery_url: config.discovery_url.clone(),
            http,
            metadata: OnceCell::new(),
        })
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Provider metadata, fetched on first use. A failed fetch is retried on the next call.
    pub async fn metadata(&self) -> Result<&ProviderMetadata, AuthError> {
        self.metadata
            .get_or_try_init(|| self.fetch_metadata())
            .await
    }

    async fn fetch_metadata(&self) -> Result<ProviderMetadata, AuthError> {
        tracing::debug!("Fetching provider metadata from {}", self.discovery_url);

        let response = self.http.get(self.discovery_url.clone()).send().await?;
        let response = ensure_success(response, "discovery").await?;
        let metadata: ProviderMetadata = response.json().await?;

        tracing::info!("Loaded provider metadata for issuer {}", metadata.issuer);
        Ok(metadata)
    }

    /// Start a login: build the provider authorization URL for `redirect_uri`
    /// along with the request state to keep until the callback arrives.
    pub async fn authorize_redirect(
        &self,
        redirect_uri: &Url,
    ) -> Result<AuthorizationRedirect, AuthError> {
        let metadata = self.metadata().await?;
        let pending = PendingAuthorization::new(redirect_uri);
        let url = self.authorization_url(&metadata.authorization_endpoint, &pending);

        Ok(AuthorizationRedirect { url, pending })
    }

    fn authorization_url(&self, endpoint: &Url, pending: &PendingAuthorization) -> Url {
        let mut url = endpoint.clone();
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", &pending.redirect_uri)
            .append_pair("scope", &LOGIN_SCOPES.join(" "))
            .append_pair("state", &pending.state);
        url
    }

    /// Finish a login: trade the authorization code for tokens and load the user's claims.
    pub async fn authorize_access_token(
        &self,
        code: &str,
        pending: &PendingAuthorization,
    ) -> Result<AuthenticatedIdentity, AuthError> {
        let tokens = self.exchange_code(code, &pending.redirect_uri).await?;
        let id_token = tokens.id_token.ok_or(AuthError::MissingIdToken)?;
        let user = self.fetch_userinfo(&tokens.access_token).await?;

        Ok(AuthenticatedIdentity { user, id_token })
    }

    async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<TokenResponse, AuthError> {
        let metadata = self.metadata().await?;
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", redirect_uri),
        ];

        let response = self
            .http
            .post(metadata.token_endpoint.clone())
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&params)
            .send()
            .await?;

        let response = ensure_success(response, "token exchange").await?;
        response.json::<TokenResponse>().await.map_err(Into::into)
    }

    async fn fetch_userinfo(&self, access_token: &str) -> Result<UserInfo, AuthError> {
        let metadata = self.metadata().await?;

        let response = self
            .http
            .get(metadata.userinfo_endpoint.clone())
            .bearer_auth(access_token)
            .send()
            .await?;

        let response = ensure_success(response, "userinfo request").await?;
        response.json::<UserInfo>().await.map_err(Into::into)
    }
}

/// Find the request this session started that the callback's `state` answers.
pub fn verify_state<'a>(
    pending: &'a [PendingAuthorization],
    state: Option<&str>,
) -> Result<&'a PendingAuthorization, AuthError> {
    let state = state.ok_or(AuthError::StateMismatch)?;
    pending
        .iter()
        .find(|request| request.state == state)
        .ok_or(AuthError::StateMismatch)
}

async fn ensure_success(
    response: reqwest::Response,
    operation: &'static str,
) -> Result<reqwest::Response, AuthError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let detail = response.text().await.unwrap_or_default();
    Err(AuthError::Provider {
        operation,
        status,
        detail,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;

    fn pending() -> PendingAuthorization {
        PendingAuthorization::new(&"http://localhost:8001/".parse().unwrap())
    }

    #[test]
    fn test_authorization_url_contains_login_params() {
        let client = OidcClient::new(&test_config()).unwrap();
        let endpoint: Url = "https://accounts.google.com/o/oauth2/v2/auth".parse().unwrap();
        let pending = pending();

        let url = client.authorization_url(&endpoint, &pending);
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();

        assert_eq!(url.path(), "/o/oauth2/v2/auth");
        assert!(pairs.contains(&("response_type".into(), "code".into())));
        assert!(pairs.contains(&("client_id".into(), "test-client-id".into())));
        assert!(pairs.contains(&("redirect_uri".into(), "http://localhost:8001/".into())));
        assert!(pairs.contains(&("scope".into(), "openid email profile".into())));
        assert!(pairs.contains(&("state".into(), pending.state.clone())));
    }

    #[test]
    fn test_pending_state_unique_per_request() {
        assert_ne!(pending().state, pending().state);
    }

    #[test]
    fn test_verify_state_finds_any_outstanding_request() {
        let first = pending();
        let second = pending();
        let outstanding = vec![first.clone(), second.clone()];

        assert_eq!(verify_state(&outstanding, Some(&first.state)).unwrap(), &first);
        assert_eq!(verify_state(&outstanding, Some(&second.state)).unwrap(), &second);
    }

    #[test]
    fn test_verify_state_rejects_mismatch_and_missing() {
        let pending = pending();
        let outstanding = vec![pending.clone()];

        assert!(matches!(
            verify_state(&outstanding, Some("forged")),
            Err(AuthError::StateMismatch)
        ));
        assert!(matches!(
            verify_state(&outstanding, None),
            Err(AuthError::StateMismatch)
        ));
        assert!(matches!(
            verify_state(&[], Some(&pending.state)),
            Err(AuthError::StateMismatch)
        ));
    }
}
