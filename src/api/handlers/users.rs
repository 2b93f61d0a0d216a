//! Admin-level user management by id, gated behind the authentication gate.

use axum::{
    extract::{Extension, Path},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use std::sync::Arc;
use tracing::instrument;

use super::types::UserPayload;
use crate::api::error::ApiError;
use crate::keycloak::{types::UserRecord, KeycloakClient};

fn require_id(user_id: &str) -> Result<(), ApiError> {
    if user_id.is_empty() {
        return Err(ApiError::Validation("user ID is required".to_string()));
    }
    Ok(())
}

#[utoipa::path(
    get,
    path = "/api/v1/user/{id}",
    params(("id" = String, Path, description = "Keycloak user id")),
    responses(
        (status = 200, description = "User record", body = UserRecord),
        (status = 404, description = "Unknown user id")
    ),
    tag = "users"
)]
#[instrument(skip_all, fields(user_id = %user_id))]
pub async fn get_user(
    Path(user_id): Path<String>,
    kc: Extension<Arc<KeycloakClient>>,
) -> Result<impl IntoResponse, ApiError> {
    require_id(&user_id)?;

    let user = kc
        .get_user_by_id(&user_id)
        .await
        .map_err(|err| ApiError::NotFound {
            details: err.to_string(),
        })?;

    Ok(Json(user))
}

#[utoipa::path(
    put,
    path = "/api/v1/user/{id}",
    params(("id" = String, Path, description = "Keycloak user id")),
    request_body = UserPayload,
    responses(
        (status = 200, description = "User updated"),
        (status = 500, description = "Provider rejected the update")
    ),
    tag = "users"
)]
#[instrument(skip_all, fields(user_id = %user_id))]
pub async fn update_user(
    Path(user_id): Path<String>,
    kc: Extension<Arc<KeycloakClient>>,
    payload: Option<Json<UserPayload>>,
) -> Result<impl IntoResponse, ApiError> {
    require_id(&user_id)?;

    let Some(Json(payload)) = payload else {
        return Err(ApiError::Validation("invalid request body".to_string()));
    };

    let mut user = UserRecord::from(payload);
    user.id = Some(user_id.clone());

    kc.update_user(&user_id, &user)
        .await
        .map_err(|err| ApiError::Update {
            details: err.to_string(),
        })?;

    Ok(Json(json!({"message": "user updated successfully"})))
}

#[utoipa::path(
    delete,
    path = "/api/v1/user/{id}",
    params(("id" = String, Path, description = "Keycloak user id")),
    responses(
        (status = 200, description = "User deleted"),
        (status = 500, description = "Provider rejected the delete")
    ),
    tag = "users"
)]
#[instrument(skip_all, fields(user_id = %user_id))]
pub async fn delete_user(
    Path(user_id): Path<String>,
    kc: Extension<Arc<KeycloakClient>>,
) -> Result<impl IntoResponse, ApiError> {
    require_id(&user_id)?;

    kc.delete_user(&user_id)
        .await
        .map_err(|err| ApiError::Delete {
            details: err.to_string(),
        })?;

    Ok(Json(json!({"message": "user deleted successfully"})))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_id_rejects_empty_segment() {
        let err = require_id("").unwrap_err();
        assert_eq!(err.to_string(), "user ID is required");
    }

    #[test]
    fn require_id_accepts_any_non_empty_id() {
        assert!(require_id("1234-abcd").is_ok());
    }
}
