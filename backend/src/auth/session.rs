//! Signed-cookie session.
//!
//! The whole session is one cookie: `SessionData` as JSON, base64url encoded,
//! signed with the key derived from `SESSION_SECRET`. A cookie that fails
//! verification or decoding reads as an empty session.

use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::SignedCookieJar;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use time::Duration;

use crate::config::AppConfig;

use super::types::{AuthenticatedIdentity, PendingAuthorization, UserInfo};

pub const SESSION_COOKIE: &str = "session";

/// Logins a browser may have in flight at once (tabs, reloads). Oldest dropped first.
pub const MAX_PENDING_AUTHORIZATIONS: usize = 5;

/// Everything this server keeps about a browser.
///
/// `user` and `id_token` are set together by [`SessionData::authenticate`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
    /// Outstanding authorization requests, oldest first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pending: Vec<PendingAuthorization>,
}

impl SessionData {
    /// Read the session from the request cookies.
    pub fn from_jar(jar: &SignedCookieJar) -> Self {
        match jar.get(SESSION_COOKIE) {
            Some(cookie) => Self::decode(cookie.value()).unwrap_or_else(|| {
                tracing::debug!("Discarding undecodable session cookie");
                Self::default()
            }),
            None => Self::default(),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    /// Remember a new authorization request alongside any still in flight.
    pub fn begin_authorization(&mut self, pending: PendingAuthorization) {
        self.pending.push(pending);
        while self.pending.len() > MAX_PENDING_AUTHORIZATIONS {
            self.pending.remove(0);
        }
    }

    /// Record a completed login. Drops every pending authorization request.
    pub fn authenticate(&mut self, identity: AuthenticatedIdentity) {
        self.user = Some(identity.user);
        self.id_token = Some(identity.id_token);
        self.pending.clear();
    }

    pub fn encode(&self) -> Result<String, serde_json::Error> {
        let json = serde_json::to_vec(self)?;
        Ok(URL_SAFE_NO_PAD.encode(json))
    }

    pub fn decode(value: &str) -> Option<Self> {
        let json = URL_SAFE_NO_PAD.decode(value).ok()?;
        serde_json::from_slice(&json).ok()
    }

    /// Write the session back as a signed cookie on `jar`.
    pub fn store(
        &self,
        jar: SignedCookieJar,
        config: &AppConfig,
    ) -> Result<SignedCookieJar, serde_json::Error> {
        let cookie = Cookie::build((SESSION_COOKIE, self.encode()?))
            .path("/")
            .http_only(true)
            .secure(config.session_https_only)
            .same_site(SameSite::Lax)
            .max_age(Duration::seconds(config.session_max_age_secs))
            .build();

        Ok(jar.add(cookie))
    }
}
