//! Provider-facing data types for the sign-in flow.

use serde::{Deserialize, Serialize};
use url::Url;

/// Subset of the provider's OpenID configuration document this server uses.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderMetadata {
    pub issuer: String,
    pub authorization_endpoint: Url,
    pub token_endpoint: Url,
    pub userinfo_endpoint: Url,
    #[serde(default)]
    pub jwks_uri: Option<Url>,
}

/// Token set returned by the provider's token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub id_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// Identity claims from the userinfo endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_verified: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
}

/// Authorization request kept in the session between the redirect and the callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingAuthorization {
    pub state: String,
    /// Exact `redirect_uri` sent to the provider; repeated on token exchange.
    pub redirect_uri: String,
}

impl PendingAuthorization {
    pub fn new(redirect_uri: &Url) -> Self {
        Self {
            state: uuid::Uuid::new_v4().simple().to_string(),
            redirect_uri: redirect_uri.to_string(),
        }
    }
}

/// Where to send the browser, plus the request state to remember.
#[derive(Debug, Clone)]
pub struct AuthorizationRedirect {
    pub url: Url,
    pub pending: PendingAuthorization,
}

/// Outcome of a successful callback.
#[derive(Debug, Clone)]
pub struct AuthenticatedIdentity {
    pub user: UserInfo,
    pub id_token: String,
}
