//! HTTP error taxonomy for the gateway.
//!
//! Every failure path answers with a JSON object carrying at least an `error`
//! key. Downstream Keycloak failures keep the provider's message in a
//! `details` field, nothing is retried locally.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or malformed input, rejected before any provider call.
    #[error("{0}")]
    Validation(String),

    /// Bad credentials or an expired, unrefreshable session.
    #[error("{message}")]
    Auth {
        message: String,
        details: Option<String>,
    },

    /// Unknown user id.
    #[error("user not found")]
    NotFound { details: String },

    /// Provider failure while creating a user.
    #[error("user creation failed")]
    Provisioning { details: String },

    /// Provider failure while updating a user.
    #[error("update failed")]
    Update { details: String },

    /// Provider failure while deleting a user.
    #[error("delete failed")]
    Delete { details: String },

    /// The provider itself could not be consulted.
    #[error("failed to introspect token")]
    Provider { details: String },
}

impl ApiError {
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
            details: None,
        }
    }

    pub fn auth_with(message: impl Into<String>, details: impl ToString) -> Self {
        Self::Auth {
            message: message.into(),
            details: Some(details.to_string()),
        }
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Auth { .. } => StatusCode::UNAUTHORIZED,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Provisioning { .. } | Self::Update { .. } | Self::Delete { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Provider { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn details(&self) -> Option<&str> {
        match self {
            Self::Validation(_) => None,
            Self::Auth { details, .. } => details.as_deref(),
            Self::NotFound { details }
            | Self::Provisioning { details }
            | Self::Update { details }
            | Self::Delete { details }
            | Self::Provider { details } => Some(details),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details() {
            Some(details) => json!({"error": self.to_string(), "details": details}),
            None => json!({"error": self.to_string()}),
        };

        (self.status(), Json(body)).into_response()
    }
}
