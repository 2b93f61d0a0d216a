//! Request types for the gateway endpoints.
//!
//! All fields default to empty strings so the validators, not serde, decide
//! what a missing field means. Values are forwarded to Keycloak verbatim, no
//! trimming or case folding happens here.

use crate::keycloak::types::UserRecord;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct RegisterRequest {
    #[serde(default)]
    pub firstname: String,
    #[serde(default)]
    pub lastname: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Mutable user fields accepted on update endpoints.
#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct UserPayload {
    #[serde(default)]
    pub firstname: String,
    #[serde(default)]
    pub lastname: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
}

impl From<UserPayload> for UserRecord {
    fn from(payload: UserPayload) -> Self {
        Self {
            first_name: Some(payload.firstname),
            last_name: Some(payload.lastname),
            username: Some(payload.username),
            email: Some(payload.email),
            ..Self::default()
        }
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_default_to_empty() {
        let login: LoginRequest = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(login.username.is_empty());
        assert!(login.password.is_empty());

        let register: RegisterRequest =
            serde_json::from_value(serde_json::json!({"username": "alice"})).unwrap();
        assert_eq!(register.username, "alice");
        assert!(register.email.is_empty());
    }

    #[test]
    fn user_payload_maps_to_camel_case_record() {
        let payload = UserPayload {
            firstname: "Alice".to_string(),
            lastname: "Doe".to_string(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
        };
        let record = UserRecord::from(payload);
        assert_eq!(record.first_name.as_deref(), Some("Alice"));
        assert_eq!(record.id, None);
    }
}
