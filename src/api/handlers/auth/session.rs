//! Login and logout: the session exchanger.

use axum::{
    Json,
    extract::Extension,
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::{debug, error};

use super::{provider::ExchangeOutcome, state::AuthState, types::LoginRequest};
use crate::api::error::{ErrorResponse, GENERIC_AUTH_FAILURE, ProxyError};

#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 204, description = "Credentials accepted, session cookie set"),
        (status = 401, description = "Credentials missing or rejected by the identity provider", body = ErrorResponse),
        (status = 403, description = "Origin not allowed", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn login(
    auth_state: Extension<Arc<AuthState>>,
    request: Option<Json<LoginRequest>>,
) -> Result<impl IntoResponse, ProxyError> {
    let Some(credentials) = request.and_then(|Json(request)| request.into_credentials()) else {
        return Err(ProxyError::InvalidCredentials);
    };

    let session = match auth_state.provider().sign_in_with_password(&credentials).await {
        ExchangeOutcome::Session(session) => session,
        ExchangeOutcome::Rejected(reason) => {
            debug!("Login rejected by identity provider");
            return Err(ProxyError::AuthExchangeFailed(
                reason.unwrap_or_else(|| GENERIC_AUTH_FAILURE.to_string()),
            ));
        }
    };

    let cookie = auth_state
        .config()
        .cookie_policy()
        .set_cookie(&session.access_token, session.cookie_max_age())
        .map_err(|err| {
            error!("Failed to encode session cookie: {err}");
            ProxyError::Internal(err.to_string())
        })?;

    let mut headers = HeaderMap::new();
    headers.insert(SET_COOKIE, cookie);
    Ok((StatusCode::NO_CONTENT, headers))
}

#[utoipa::path(
    post,
    path = "/logout",
    responses(
        (status = 204, description = "Session cookie cleared"),
        (status = 403, description = "Origin not allowed", body = ErrorResponse)
    ),
    tag = "auth"
)]
// Only the browser cookie is removed; the token stays valid at the provider until it expires.
pub async fn logout(
    auth_state: Extension<Arc<AuthState>>,
) -> Result<impl IntoResponse, ProxyError> {
    let cookie = auth_state
        .config()
        .cookie_policy()
        .clear_cookie()
        .map_err(|err| {
            error!("Failed to encode clearing cookie: {err}");
            ProxyError::Internal(err.to_string())
        })?;

    let mut headers = HeaderMap::new();
    headers.insert(SET_COOKIE, cookie);
    Ok((StatusCode::NO_CONTENT, headers))
}
