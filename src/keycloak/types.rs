//! Wire types for Keycloak's token and admin REST endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Token pair returned by the OIDC token endpoint on login and refresh.
#[derive(ToSchema, Serialize, Deserialize, Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
    #[serde(default)]
    pub expires_in: u64,
    #[serde(default)]
    pub token_type: String,
}

/// Introspection result, only the `active` flag is consumed.
#[derive(Deserialize, Debug)]
pub struct Introspection {
    #[serde(default)]
    pub active: bool,
}

/// Keycloak `UserRepresentation`, camelCase on the wire.
///
/// Returned verbatim to API clients for profile and admin lookups, Keycloak
/// owns the record.
#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

/// Subject claims from the `userinfo` endpoint.
#[derive(Deserialize, Debug)]
pub struct UserInfo {
    pub sub: String,
    #[serde(default)]
    pub preferred_username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Password credential for the admin `reset-password` endpoint.
#[derive(Serialize, Debug)]
pub struct CredentialRepresentation {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
    pub temporary: bool,
}

impl CredentialRepresentation {
    #[must_use]
    pub fn password(value: String) -> Self {
        Self {
            kind: "password".to_string(),
            value,
            temporary: false,
        }
    }
}
