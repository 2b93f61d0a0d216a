use axum::{extract::Extension, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, instrument};

use super::session::session_cookies;
use super::types::LoginRequest;
use crate::api::error::ApiError;
use crate::keycloak::KeycloakClient;

fn validate(login: &LoginRequest) -> Result<(), ApiError> {
    if login.username.is_empty() || login.password.is_empty() {
        return Err(ApiError::Validation(
            "username and password are required".to_string(),
        ));
    }
    Ok(())
}

#[utoipa::path(
    post,
    path = "/api/v1/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful, session cookies set"),
        (status = 400, description = "Missing username or password"),
        (status = 401, description = "Credentials rejected by the provider")
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn login(
    kc: Extension<Arc<KeycloakClient>>,
    payload: Option<Json<LoginRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let Some(Json(login)) = payload else {
        return Err(ApiError::Validation("invalid request body".to_string()));
    };

    validate(&login)?;

    debug!("login attempt for username: {}", login.username);

    let pair = kc
        .login(&login.username, &login.password)
        .await
        .map_err(|err| ApiError::auth_with("login failed", err))?;

    let headers = session_cookies(&pair);

    Ok((
        headers,
        Json(json!({"message": "login successful", "user": pair})),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(username: &str, password: &str) -> LoginRequest {
        LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn validate_accepts_full_credentials() {
        assert!(validate(&request("alice", "wonder")).is_ok());
    }

    #[test]
    fn validate_rejects_empty_username() {
        assert!(validate(&request("", "wonder")).is_err());
    }

    #[test]
    fn validate_rejects_empty_password() {
        let err = validate(&request("alice", "")).unwrap_err();
        assert_eq!(err.to_string(), "username and password are required");
    }

    #[test]
    fn validate_passes_input_through_verbatim() {
        // No trimming, whitespace counts as a value
        assert!(validate(&request(" alice ", " ")).is_ok());
    }
}
