//! Authentication gate for protected routes.
//!
//! The gate extracts a bearer credential from the `access_token` cookie or the
//! `Authorization` header, introspects it once against Keycloak and lets the
//! request through when the token is active. Inactive tokens get exactly one
//! silent refresh attempt via the `refresh_token` cookie: on success both
//! cookies are reissued and the handler sees the new access token, on failure
//! the cookies are cleared and the request is rejected.

use axum::{
    extract::{Extension, Request},
    http::{
        header::{AUTHORIZATION, SET_COOKIE},
        HeaderMap,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::debug;

use super::error::ApiError;
use super::handlers::session::{
    clear_session_cookies, cookie_value, session_cookies, ACCESS_COOKIE, REFRESH_COOKIE,
};
use crate::keycloak::KeycloakClient;

/// Access token attached to the request once the gate has validated it.
///
/// Carries the refreshed token when the gate performed a silent refresh.
#[derive(Clone, Debug)]
pub struct AccessToken(pub String);

pub(crate) enum Credential {
    Token(String),
    Missing,
    Malformed,
}

/// Cookie first, then a strict `Bearer <token>` header.
pub(crate) fn extract_credential(headers: &HeaderMap) -> Credential {
    if let Some(token) = cookie_value(headers, ACCESS_COOKIE).filter(|token| !token.is_empty()) {
        return Credential::Token(token);
    }

    let Some(header) = headers.get(AUTHORIZATION) else {
        return Credential::Missing;
    };

    let Ok(value) = header.to_str() else {
        return Credential::Malformed;
    };

    let parts: Vec<&str> = value.split(' ').collect();
    if parts.len() == 2 && parts[0] == "Bearer" && !parts[1].is_empty() {
        Credential::Token(parts[1].to_string())
    } else {
        Credential::Malformed
    }
}

pub async fn require_session(
    kc: Extension<Arc<KeycloakClient>>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = match extract_credential(request.headers()) {
        Credential::Token(token) => token,
        Credential::Missing => {
            return ApiError::auth("access token required").into_response();
        }
        Credential::Malformed => {
            return ApiError::auth("invalid authorization header format").into_response();
        }
    };

    let active = match kc.introspect(&token).await {
        Ok(active) => active,
        Err(err) => {
            let mut response = ApiError::Provider {
                details: err.to_string(),
            }
            .into_response();
            clear_cookies_on(&mut response);
            return response;
        }
    };

    if active {
        request.extensions_mut().insert(AccessToken(token));
        return next.run(request).await;
    }

    debug!("access token inactive, attempting refresh");

    let Some(refresh_token) =
        cookie_value(request.headers(), REFRESH_COOKIE).filter(|token| !token.is_empty())
    else {
        return ApiError::auth("session expired, no refresh token found").into_response();
    };

    match kc.refresh(&refresh_token).await {
        Ok(pair) => {
            let cookies = session_cookies(&pair);
            request
                .extensions_mut()
                .insert(AccessToken(pair.access_token));

            let mut response = next.run(request).await;
            for cookie in cookies.get_all(SET_COOKIE) {
                response.headers_mut().append(SET_COOKIE, cookie.clone());
            }
            response
        }
        Err(err) => {
            let mut response =
                ApiError::auth_with("session expired, token refresh failed", err).into_response();
            clear_cookies_on(&mut response);
            response
        }
    }
}

fn clear_cookies_on(response: &mut Response) {
    for cookie in clear_session_cookies().get_all(SET_COOKIE) {
        response.headers_mut().append(SET_COOKIE, cookie.clone());
    }
}
