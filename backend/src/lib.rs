use std::sync::Arc;

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;

pub mod auth;
pub mod config;
pub mod error;
mod routes;

pub use routes::create_app;

use crate::auth::{AuthError, OidcClient};
use crate::config::AppConfig;

/// Shared, read-only state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub oidc: Arc<OidcClient>,
    cookie_key: Key,
}

impl AppState {
    pub fn new(config: AppConfig) -> Result<Self, AuthError> {
        let oidc = OidcClient::new(&config)?;
        let cookie_key = Key::derive_from(config.session_secret.as_bytes());

        Ok(Self {
            config: Arc::new(config),
            oidc: Arc::new(oidc),
            cookie_key,
        })
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}
