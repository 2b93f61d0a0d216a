//! Logout and refresh endpoints plus the cookie helpers shared with the
//! authentication gate.

use axum::{
    extract::Extension,
    http::{
        header::{InvalidHeaderValue, COOKIE, SET_COOKIE},
        HeaderMap, HeaderValue,
    },
    response::IntoResponse,
    Json,
};
use serde_json::json;
use std::sync::Arc;
use tracing::{instrument, warn};

use super::types::RefreshRequest;
use crate::api::error::ApiError;
use crate::keycloak::{types::TokenPair, KeycloakClient};

pub(crate) const ACCESS_COOKIE: &str = "access_token";
pub(crate) const REFRESH_COOKIE: &str = "refresh_token";

#[utoipa::path(
    post,
    path = "/api/v1/refresh",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "New token pair issued, cookies reissued"),
        (status = 400, description = "Missing refresh token"),
        (status = 401, description = "Refresh rejected by the provider")
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn refresh(
    kc: Extension<Arc<KeycloakClient>>,
    payload: Option<Json<RefreshRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let Some(Json(body)) = payload else {
        return Err(ApiError::Validation("invalid request body".to_string()));
    };

    if body.refresh_token.is_empty() {
        return Err(ApiError::Validation(
            "refresh token not provided".to_string(),
        ));
    }

    let pair = kc
        .refresh(&body.refresh_token)
        .await
        .map_err(|err| ApiError::auth_with("failed to refresh token", err))?;

    let headers = session_cookies(&pair);

    Ok((
        headers,
        Json(json!({"message": "token refreshed successfully", "user": pair})),
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/logout",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Session cookies cleared"),
        (status = 400, description = "Missing refresh token")
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn logout(
    kc: Extension<Arc<KeycloakClient>>,
    payload: Option<Json<RefreshRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let Some(Json(body)) = payload else {
        return Err(ApiError::Validation("invalid request body".to_string()));
    };

    if body.refresh_token.is_empty() {
        return Err(ApiError::Validation(
            "refresh token not provided".to_string(),
        ));
    }

    // Provider failures are logged and swallowed so the client-side cookies
    // are always cleared.
    if let Err(err) = kc.logout(&body.refresh_token).await {
        warn!("keycloak logout failed: {err}");
    }

    Ok((
        clear_session_cookies(),
        Json(json!({"message": "logout successful"})),
    ))
}

/// Build an `HttpOnly` cookie carrying a token.
pub(crate) fn auth_cookie(name: &str, value: &str) -> Result<HeaderValue, InvalidHeaderValue> {
    HeaderValue::from_str(&format!("{name}={value}; Path=/; HttpOnly; SameSite=Lax"))
}

fn clear_cookie(name: &str) -> Result<HeaderValue, InvalidHeaderValue> {
    HeaderValue::from_str(&format!("{name}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0"))
}

/// `Set-Cookie` headers reissuing both session cookies from a token pair.
pub(crate) fn session_cookies(pair: &TokenPair) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if let Ok(cookie) = auth_cookie(ACCESS_COOKIE, &pair.access_token) {
        headers.append(SET_COOKIE, cookie);
    }
    if let Ok(cookie) = auth_cookie(REFRESH_COOKIE, &pair.refresh_token) {
        headers.append(SET_COOKIE, cookie);
    }
    headers
}

/// `Set-Cookie` headers expiring both session cookies immediately.
pub(crate) fn clear_session_cookies() -> HeaderMap {
    let mut headers = HeaderMap::new();
    for name in [ACCESS_COOKIE, REFRESH_COOKIE] {
        if let Ok(cookie) = clear_cookie(name) {
            headers.append(SET_COOKIE, cookie);
        }
    }
    headers
}

/// Read a single cookie from the request `Cookie` header.
pub(crate) fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let header = headers.get(COOKIE)?;
    let value = header.to_str().ok()?;
    for pair in value.split(';') {
        let trimmed = pair.trim();
        let mut parts = trimmed.splitn(2, '=');
        let key = parts.next()?.trim();
        let val = parts.next()?.trim();
        if key == name {
            return Some(val.to_string());
        }
    }
    None
}
