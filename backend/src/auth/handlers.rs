//! Sign-in HTTP handlers.

use axum::{
    extract::{RawQuery, State},
    http::{header, HeaderMap, Uri},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use axum_extra::extract::SignedCookieJar;
use shared::{ErrorResponse, IdTokenResponse, LoginStatusResponse};
use url::Url;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

use super::client::verify_state;
use super::session::SessionData;

/// Query parameters the provider sends back on the callback.
///
/// Parsed by hand so a repeated key never rejects the request; the first
/// occurrence wins.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

impl CallbackParams {
    pub fn from_query(query: Option<&str>) -> Self {
        let mut params = Self::default();
        let Some(query) = query else {
            return params;
        };

        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            let slot = match key.as_ref() {
                "code" => &mut params.code,
                "state" => &mut params.state,
                "error" => &mut params.error,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into_owned());
            }
        }
        params
    }
}

/// Single entry point for the whole login flow.
///
/// - Signed in: report the signed-in email.
/// - `code` present: this is the provider's callback. Exchange the code,
///   store the identity in the session and redirect to `/`.
/// - Otherwise: redirect to the provider, with this request's URL as the callback.
pub async fn home(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    uri: Uri,
) -> ApiResult<Response> {
    let mut session = SessionData::from_jar(&jar);
    let params = CallbackParams::from_query(query.as_deref());

    if let Some(user) = &session.user {
        return Ok(Json(LoginStatusResponse::logged_in(user.email.clone())).into_response());
    }

    if let Some(code) = params.code.as_deref() {
        let pending = verify_state(&session.pending, params.state.as_deref())
            .map_err(|e| {
                tracing::warn!("Rejected login callback: {}", e);
                e
            })?
            .clone();

        let identity = state.oidc.authorize_access_token(code, &pending).await?;
        tracing::info!(
            "Successful login for: {}",
            identity.user.email.as_deref().unwrap_or(&identity.user.sub)
        );

        session.authenticate(identity);
        let jar = session.store(jar, &state.config)?;
        return Ok((jar, Redirect::to("/")).into_response());
    }

    if let Some(error) = params.error.as_deref() {
        tracing::warn!("Provider returned error on callback: {}", error);
    }

    let callback = request_url(state.config.public_url.as_ref(), &headers, &uri)?;
    let redirect = state.oidc.authorize_redirect(&callback).await?;
    tracing::debug!("Redirecting to provider, callback {}", callback);

    session.begin_authorization(redirect.pending);
    let jar = session.store(jar, &state.config)?;
    Ok((jar, Redirect::to(redirect.url.as_str())).into_response())
}

/// Return the stored ID token and the client ID it was issued for.
pub async fn id_token(State(state): State<AppState>, jar: SignedCookieJar) -> Response {
    match SessionData::from_jar(&jar).id_token {
        Some(id_token) => Json(IdTokenResponse {
            id_token,
            client_id: state.oidc.client_id().to_string(),
        })
        .into_response(),
        None => Json(ErrorResponse::not_authenticated()).into_response(),
    }
}

/// Absolute URL of the current request, as the browser addressed it.
fn request_url(public_url: Option<&Url>, headers: &HeaderMap, uri: &Uri) -> ApiResult<Url> {
    let path_and_query = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");

    if let Some(base) = public_url {
        return base
            .join(path_and_query)
            .map_err(|e| ApiError::bad_request(format!("Invalid request path: {}", e)));
    }

    let host = headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .or_else(|| uri.authority().map(|authority| authority.as_str()))
        .ok_or_else(|| ApiError::bad_request("Missing Host header"))?;

    Url::parse(&format!("http://{}{}", host, path_and_query))
        .map_err(|e| ApiError::bad_request(format!("Invalid request URL: {}", e)))
}
