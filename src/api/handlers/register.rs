use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, instrument};

use super::types::RegisterRequest;
use crate::api::error::ApiError;
use crate::keycloak::KeycloakClient;

fn validate(register: &RegisterRequest) -> Result<(), ApiError> {
    if register.firstname.is_empty()
        || register.lastname.is_empty()
        || register.username.is_empty()
        || register.email.is_empty()
        || register.password.is_empty()
    {
        return Err(ApiError::Validation("all fields are required".to_string()));
    }
    Ok(())
}

#[utoipa::path(
    post,
    path = "/api/v1/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered"),
        (status = 400, description = "Missing required fields"),
        (status = 500, description = "Provider failed to provision the user")
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn register(
    kc: Extension<Arc<KeycloakClient>>,
    payload: Option<Json<RegisterRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let Some(Json(register)) = payload else {
        return Err(ApiError::Validation("invalid request body".to_string()));
    };

    validate(&register)?;

    debug!(
        "registration attempt for username: {}, email: {}",
        register.username, register.email
    );

    kc.register(
        &register.firstname,
        &register.lastname,
        &register.username,
        &register.email,
        &register.password,
    )
    .await
    .map_err(|err| ApiError::Provisioning {
        details: err.to_string(),
    })?;

    Ok((
        StatusCode::CREATED,
        Json(json!({"message": "user registered successfully"})),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> RegisterRequest {
        RegisterRequest {
            firstname: "Alice".to_string(),
            lastname: "Doe".to_string(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password: "wonder".to_string(),
        }
    }

    #[test]
    fn validate_accepts_complete_request() {
        assert!(validate(&request()).is_ok());
    }

    #[test]
    fn validate_rejects_each_empty_field() {
        for field in ["firstname", "lastname", "username", "email", "password"] {
            let mut register = request();
            match field {
                "firstname" => register.firstname.clear(),
                "lastname" => register.lastname.clear(),
                "username" => register.username.clear(),
                "email" => register.email.clear(),
                _ => register.password.clear(),
            }
            let err = validate(&register).unwrap_err();
            assert_eq!(err.to_string(), "all fields are required", "{field}");
        }
    }
}
