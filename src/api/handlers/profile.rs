//! Profile endpoints for the authenticated user.
//!
//! `GET /api/v1/me` is the ungated legacy endpoint: it resolves the token
//! itself and never refreshes. The `/api/v1/user/me` family sits behind the
//! authentication gate and reads the validated [`AccessToken`] extension.

use axum::{
    extract::Extension,
    http::{header::SET_COOKIE, HeaderMap},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use std::sync::Arc;
use tracing::instrument;

use super::session::{clear_session_cookies, ACCESS_COOKIE};
use super::types::UserPayload;
use crate::api::error::ApiError;
use crate::api::gate::{extract_credential, AccessToken, Credential};
use crate::keycloak::{types::UserRecord, KeycloakClient};

#[utoipa::path(
    get,
    path = "/api/v1/me",
    responses(
        (status = 200, description = "Profile of the token's subject", body = UserRecord),
        (status = 401, description = "No or invalid access token")
    ),
    tag = "profile"
)]
#[instrument(skip_all)]
pub async fn me(
    headers: HeaderMap,
    kc: Extension<Arc<KeycloakClient>>,
) -> Result<impl IntoResponse, ApiError> {
    let token = match extract_credential(&headers) {
        Credential::Token(token) => token,
        Credential::Missing => return Err(ApiError::auth("no access token provided")),
        Credential::Malformed => return Err(ApiError::auth("invalid authorization header format")),
    };

    let user = kc
        .profile(&token)
        .await
        .map_err(|err| ApiError::auth_with("invalid or expired token", err))?;

    Ok(Json(user))
}

#[utoipa::path(
    get,
    path = "/api/v1/user/me",
    responses(
        (status = 200, description = "Profile of the current user", body = UserRecord),
        (status = 401, description = "Session expired or invalid")
    ),
    tag = "profile"
)]
#[instrument(skip_all)]
pub async fn get_current_user(
    kc: Extension<Arc<KeycloakClient>>,
    Extension(AccessToken(token)): Extension<AccessToken>,
) -> Result<impl IntoResponse, ApiError> {
    let user = kc
        .profile(&token)
        .await
        .map_err(|err| ApiError::auth_with("invalid or expired token", err))?;

    Ok(Json(user))
}

#[utoipa::path(
    put,
    path = "/api/v1/user/me",
    request_body = UserPayload,
    responses(
        (status = 200, description = "Profile updated"),
        (status = 401, description = "Session expired or invalid"),
        (status = 500, description = "Provider rejected the update")
    ),
    tag = "profile"
)]
#[instrument(skip_all)]
pub async fn update_current_user(
    kc: Extension<Arc<KeycloakClient>>,
    Extension(AccessToken(token)): Extension<AccessToken>,
    payload: Option<Json<UserPayload>>,
) -> Result<impl IntoResponse, ApiError> {
    let Some(Json(payload)) = payload else {
        return Err(ApiError::Validation("invalid request body".to_string()));
    };

    let user_id = current_user_id(&kc, &token).await?;

    let mut user = UserRecord::from(payload);
    user.id = Some(user_id.clone());

    kc.update_user(&user_id, &user)
        .await
        .map_err(|err| ApiError::Update {
            details: err.to_string(),
        })?;

    Ok(Json(json!({"message": "profile updated successfully"})))
}

#[utoipa::path(
    delete,
    path = "/api/v1/user/me",
    responses(
        (status = 200, description = "Account deleted, session cookies cleared"),
        (status = 401, description = "Session expired or invalid"),
        (status = 500, description = "Provider rejected the delete")
    ),
    tag = "profile"
)]
#[instrument(skip_all)]
pub async fn delete_current_user(
    kc: Extension<Arc<KeycloakClient>>,
    Extension(AccessToken(token)): Extension<AccessToken>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = current_user_id(&kc, &token).await?;

    kc.delete_user(&user_id)
        .await
        .map_err(|err| ApiError::Delete {
            details: err.to_string(),
        })?;

    // The account is gone, expire the session cookies with it
    let mut headers = HeaderMap::new();
    for cookie in clear_session_cookies().get_all(SET_COOKIE) {
        if cookie
            .to_str()
            .is_ok_and(|value| value.starts_with(ACCESS_COOKIE))
        {
            headers.append(SET_COOKIE, cookie.clone());
        }
    }

    Ok((
        headers,
        Json(json!({"message": "account deleted successfully"})),
    ))
}

/// Resolve the gated token to its Keycloak user id.
async fn current_user_id(kc: &KeycloakClient, token: &str) -> Result<String, ApiError> {
    let profile = kc
        .profile(token)
        .await
        .map_err(|err| ApiError::auth_with("invalid or expired token", err))?;

    profile
        .id
        .ok_or_else(|| ApiError::auth("invalid or expired token"))
}
