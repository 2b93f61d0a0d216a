//! Keycloak adapter: token grants, introspection and admin user management.
//!
//! Every operation is a single REST round trip to Keycloak. Privileged calls
//! go through [`KeycloakClient::admin_token`], which caches the admin grant
//! in-process and renews it shortly before expiry instead of logging in for
//! every call.

pub mod types;

use reqwest::{header::LOCATION, Client, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

use types::{CredentialRepresentation, Introspection, TokenPair, UserInfo, UserRecord};

static APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

// A slow provider must not stall request tasks indefinitely
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// Renew the cached admin token when less than this remains on its lease
const ADMIN_TOKEN_SLACK: Duration = Duration::from_secs(10);

/// Connection settings for the wrapped Keycloak instance.
///
/// Built once from CLI/env arguments and passed into the client constructor,
/// nothing reads the process environment after startup.
#[derive(Debug, Clone)]
pub struct KeycloakConfig {
    pub base_url: String,
    pub realm: String,
    pub client_id: String,
    pub client_secret: SecretString,
    pub admin_username: String,
    pub admin_password: SecretString,
    pub admin_realm: String,
}

#[derive(Debug, Error)]
pub enum KeycloakError {
    #[error("keycloak request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("{status}: {message}")]
    Rejected { status: StatusCode, message: String },
}

#[derive(Debug)]
struct CachedAdminToken {
    token: String,
    expires_at: Instant,
}

/// HTTP client for Keycloak's token and admin APIs.
#[derive(Debug)]
pub struct KeycloakClient {
    http: Client,
    config: KeycloakConfig,
    admin: Mutex<Option<CachedAdminToken>>,
}

impl KeycloakClient {
    /// Build the client with bounded connect/request deadlines.
    /// # Errors
    /// Returns an error if the underlying HTTP client cannot be constructed.
    pub fn new(config: KeycloakConfig) -> anyhow::Result<Self> {
        let http = Client::builder()
            .user_agent(APP_USER_AGENT)
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            config,
            admin: Mutex::new(None),
        })
    }

    #[must_use]
    pub fn config(&self) -> &KeycloakConfig {
        &self.config
    }

    fn openid_url(&self, realm: &str, endpoint: &str) -> String {
        format!(
            "{}/realms/{realm}/protocol/openid-connect/{endpoint}",
            self.config.base_url
        )
    }

    fn admin_url(&self, endpoint: &str) -> String {
        format!(
            "{}/admin/realms/{}/users{endpoint}",
            self.config.base_url, self.config.realm
        )
    }

    /// Password grant for an end user of the configured realm.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<TokenPair, KeycloakError> {
        let response = self
            .http
            .post(self.openid_url(&self.config.realm, "token"))
            .form(&[
                ("grant_type", "password"),
                ("client_id", &self.config.client_id),
                ("client_secret", self.config.client_secret.expose_secret()),
                ("username", username),
                ("password", password),
            ])
            .send()
            .await?;

        Ok(parse(response).await?.json::<TokenPair>().await?)
    }

    /// Exchange a refresh token for a new token pair.
    #[instrument(skip(self, refresh_token))]
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, KeycloakError> {
        let response = self
            .http
            .post(self.openid_url(&self.config.realm, "token"))
            .form(&[
                ("grant_type", "refresh_token"),
                ("client_id", &self.config.client_id),
                ("client_secret", self.config.client_secret.expose_secret()),
                ("refresh_token", refresh_token),
            ])
            .send()
            .await?;

        Ok(parse(response).await?.json::<TokenPair>().await?)
    }

    /// Invalidate the session behind a refresh token.
    #[instrument(skip(self, refresh_token))]
    pub async fn logout(&self, refresh_token: &str) -> Result<(), KeycloakError> {
        let response = self
            .http
            .post(self.openid_url(&self.config.realm, "logout"))
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.expose_secret()),
                ("refresh_token", refresh_token),
            ])
            .send()
            .await?;

        parse(response).await?;

        Ok(())
    }

    /// Ask Keycloak whether an access token is still active.
    ///
    /// Inactive tokens come back as `Ok(false)`, only transport or provider
    /// failures produce an error.
    #[instrument(skip(self, token))]
    pub async fn introspect(&self, token: &str) -> Result<bool, KeycloakError> {
        let response = self
            .http
            .post(self.openid_url(&self.config.realm, "token/introspect"))
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.expose_secret()),
                ("token", token),
            ])
            .send()
            .await?;

        let introspection = parse(response).await?.json::<Introspection>().await?;

        Ok(introspection.active)
    }

    /// Admin access token, cached until shortly before expiry.
    ///
    /// The mutex serializes concurrent renewals so a burst of privileged
    /// requests performs a single admin login.
    async fn admin_token(&self) -> Result<String, KeycloakError> {
        let mut cached = self.admin.lock().await;

        if let Some(admin) = cached.as_ref() {
            if admin.expires_at > Instant::now() + ADMIN_TOKEN_SLACK {
                return Ok(admin.token.clone());
            }
        }

        debug!("acquiring admin token");

        let response = self
            .http
            .post(self.openid_url(&self.config.admin_realm, "token"))
            .form(&[
                ("grant_type", "password"),
                ("client_id", "admin-cli"),
                ("username", &self.config.admin_username),
                ("password", self.config.admin_password.expose_secret()),
            ])
            .send()
            .await?;

        let pair = parse(response).await?.json::<TokenPair>().await?;

        // An absurd expires_in would overflow Instant, skip caching instead
        let token = pair.access_token;
        *cached = Instant::now()
            .checked_add(Duration::from_secs(pair.expires_in))
            .map(|expires_at| CachedAdminToken {
                token: token.clone(),
                expires_at,
            });

        Ok(token)
    }

    /// Provision a new user: create the record, set a permanent password and
    /// trigger the verification email.
    ///
    /// Steps are not transactional. When setting the password fails the
    /// created user remains in Keycloak without a credential. The email send
    /// is best effort and never fails the registration.
    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        first_name: &str,
        last_name: &str,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<(), KeycloakError> {
        let admin_token = self.admin_token().await?;

        let user = UserRecord {
            first_name: Some(first_name.to_string()),
            last_name: Some(last_name.to_string()),
            username: Some(username.to_string()),
            email: Some(email.to_string()),
            enabled: Some(true),
            ..UserRecord::default()
        };

        let response = self
            .http
            .post(self.admin_url(""))
            .bearer_auth(&admin_token)
            .json(&user)
            .send()
            .await?;

        let response = parse(response).await?;
        let user_id = user_id_from_location(
            response
                .headers()
                .get(LOCATION)
                .and_then(|value| value.to_str().ok()),
        )
        .ok_or_else(|| KeycloakError::Rejected {
            status: StatusCode::BAD_GATEWAY,
            message: "user created but no Location header returned".to_string(),
        })?;

        let credential = CredentialRepresentation::password(password.to_string());
        let response = self
            .http
            .put(self.admin_url(&format!("/{user_id}/reset-password")))
            .bearer_auth(&admin_token)
            .json(&credential)
            .send()
            .await?;

        parse(response).await?;

        if let Err(err) = self.send_verify_email(&admin_token, &user_id).await {
            warn!("verification email for {user_id} not sent: {err}");
        }

        Ok(())
    }

    async fn send_verify_email(
        &self,
        admin_token: &str,
        user_id: &str,
    ) -> Result<(), KeycloakError> {
        let response = self
            .http
            .put(self.admin_url(&format!("/{user_id}/send-verify-email")))
            .bearer_auth(admin_token)
            .send()
            .await?;

        parse(response).await?;

        Ok(())
    }

    /// Fetch a user record by id with admin credentials.
    #[instrument(skip(self))]
    pub async fn get_user_by_id(&self, user_id: &str) -> Result<UserRecord, KeycloakError> {
        let admin_token = self.admin_token().await?;

        let response = self
            .http
            .get(self.admin_url(&format!("/{user_id}")))
            .bearer_auth(&admin_token)
            .send()
            .await?;

        Ok(parse(response).await?.json::<UserRecord>().await?)
    }

    /// Overwrite the mutable fields of a user record.
    #[instrument(skip(self, user))]
    pub async fn update_user(&self, user_id: &str, user: &UserRecord) -> Result<(), KeycloakError> {
        let admin_token = self.admin_token().await?;

        let response = self
            .http
            .put(self.admin_url(&format!("/{user_id}")))
            .bearer_auth(&admin_token)
            .json(user)
            .send()
            .await?;

        parse(response).await?;

        Ok(())
    }

    /// Remove a user record.
    #[instrument(skip(self))]
    pub async fn delete_user(&self, user_id: &str) -> Result<(), KeycloakError> {
        let admin_token = self.admin_token().await?;

        let response = self
            .http
            .delete(self.admin_url(&format!("/{user_id}")))
            .bearer_auth(&admin_token)
            .send()
            .await?;

        parse(response).await?;

        Ok(())
    }

    /// Resolve an access token to the full user record.
    ///
    /// The `userinfo` endpoint only yields the subject id, the record itself
    /// is re-fetched with admin credentials.
    #[instrument(skip(self, access_token))]
    pub async fn profile(&self, access_token: &str) -> Result<UserRecord, KeycloakError> {
        let response = self
            .http
            .get(self.openid_url(&self.config.realm, "userinfo"))
            .bearer_auth(access_token)
            .send()
            .await?;

        let info = parse(response).await?.json::<UserInfo>().await?;

        self.get_user_by_id(&info.sub).await
    }
}

/// Pass 2xx responses through, turn anything else into a `Rejected` error
/// carrying Keycloak's own message.
async fn parse(response: Response) -> Result<Response, KeycloakError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.json::<Value>().await.unwrap_or(Value::Null);

    Err(KeycloakError::Rejected {
        status,
        message: error_message(&body, status),
    })
}

fn error_message(body: &Value, status: StatusCode) -> String {
    for key in ["error_description", "errorMessage", "error"] {
        if let Some(message) = body[key].as_str() {
            return message.to_string();
        }
    }

    status
        .canonical_reason()
        .unwrap_or("provider request failed")
        .to_string()
}

fn user_id_from_location(location: Option<&str>) -> Option<String> {
    location?
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(base_url: &str) -> KeycloakConfig {
        KeycloakConfig {
            base_url: base_url.trim_end_matches('/').to_string(),
            realm: "gateway".to_string(),
            client_id: "auth-gateway".to_string(),
            client_secret: SecretString::from("s3cret".to_string()),
            admin_username: "admin".to_string(),
            admin_password: SecretString::from("hunter2".to_string()),
            admin_realm: "master".to_string(),
        }
    }

    fn token_body(access: &str, refresh: &str) -> Value {
        json!({
            "access_token": access,
            "refresh_token": refresh,
            "expires_in": 300,
            "token_type": "Bearer"
        })
    }

    #[test]
    fn user_id_from_location_takes_last_segment() {
        let location = Some("http://kc/admin/realms/gateway/users/1234-abcd");
        assert_eq!(
            user_id_from_location(location),
            Some("1234-abcd".to_string())
        );
        assert_eq!(user_id_from_location(None), None);
        assert_eq!(user_id_from_location(Some("")), None);
    }

    #[test]
    fn error_message_prefers_description() {
        let body = json!({"error": "invalid_grant", "error_description": "Invalid user credentials"});
        assert_eq!(
            error_message(&body, StatusCode::UNAUTHORIZED),
            "Invalid user credentials"
        );
        assert_eq!(
            error_message(&Value::Null, StatusCode::UNAUTHORIZED),
            "Unauthorized"
        );
    }

    #[tokio::test]
    async fn login_posts_password_grant() -> Result<()> {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/realms/gateway/protocol/openid-connect/token"))
            .and(body_string_contains("grant_type=password"))
            .and(body_string_contains("username=alice"))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body("at", "rt")))
            .expect(1)
            .mount(&server)
            .await;

        let client = KeycloakClient::new(test_config(&server.uri()))?;
        let pair = client.login("alice", "wonder").await?;

        assert_eq!(pair.access_token, "at");
        assert_eq!(pair.refresh_token, "rt");
        Ok(())
    }

    #[tokio::test]
    async fn login_surfaces_provider_message() -> Result<()> {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/realms/gateway/protocol/openid-connect/token"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": "invalid_grant",
                "error_description": "Invalid user credentials"
            })))
            .mount(&server)
            .await;

        let client = KeycloakClient::new(test_config(&server.uri()))?;
        let err = client.login("alice", "wrong").await.unwrap_err();

        assert!(err.to_string().contains("Invalid user credentials"));
        Ok(())
    }

    #[tokio::test]
    async fn introspect_reports_inactive_without_error() -> Result<()> {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(
                "/realms/gateway/protocol/openid-connect/token/introspect",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"active": false})))
            .mount(&server)
            .await;

        let client = KeycloakClient::new(test_config(&server.uri()))?;
        assert!(!client.introspect("stale").await?);
        Ok(())
    }

    #[tokio::test]
    async fn admin_token_is_cached_across_calls() -> Result<()> {
        let server = MockServer::start().await;

        // The admin grant must happen once even though two privileged calls run
        Mock::given(method("POST"))
            .and(path("/realms/master/protocol/openid-connect/token"))
            .and(body_string_contains("client_id=admin-cli"))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body("admin-at", "")))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/admin/realms/gateway/users/u1"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"id": "u1", "username": "alice"})),
            )
            .expect(2)
            .mount(&server)
            .await;

        let client = KeycloakClient::new(test_config(&server.uri()))?;
        let first = client.get_user_by_id("u1").await?;
        let second = client.get_user_by_id("u1").await?;

        assert_eq!(first.username.as_deref(), Some("alice"));
        assert_eq!(second.id.as_deref(), Some("u1"));
        Ok(())
    }

    #[tokio::test]
    async fn admin_token_with_absurd_expiry_is_not_cached() -> Result<()> {
        let server = MockServer::start().await;

        // expires_in that would overflow Instant must not panic, the grant
        // simply runs again on the next privileged call
        Mock::given(method("POST"))
            .and(path("/realms/master/protocol/openid-connect/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "admin-at",
                "expires_in": u64::MAX
            })))
            .expect(2)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/admin/realms/gateway/users/u1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "u1"})))
            .expect(2)
            .mount(&server)
            .await;

        let client = KeycloakClient::new(test_config(&server.uri()))?;
        client.get_user_by_id("u1").await?;
        client.get_user_by_id("u1").await?;
        Ok(())
    }

    #[tokio::test]
    async fn register_creates_user_and_sets_password() -> Result<()> {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/realms/master/protocol/openid-connect/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body("admin-at", "")))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/admin/realms/gateway/users"))
            .respond_with(ResponseTemplate::new(201).insert_header(
                "Location",
                format!("{}/admin/realms/gateway/users/new-user", server.uri()).as_str(),
            ))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("PUT"))
            .and(path("/admin/realms/gateway/users/new-user/reset-password"))
            .and(body_string_contains("password"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("PUT"))
            .and(path("/admin/realms/gateway/users/new-user/send-verify-email"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let client = KeycloakClient::new(test_config(&server.uri()))?;
        client
            .register("Alice", "Doe", "alice", "alice@example.com", "wonder")
            .await?;
        Ok(())
    }

    #[tokio::test]
    async fn register_succeeds_when_verification_email_fails() -> Result<()> {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/realms/master/protocol/openid-connect/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body("admin-at", "")))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/admin/realms/gateway/users"))
            .respond_with(
                ResponseTemplate::new(201)
                    .insert_header("Location", "/admin/realms/gateway/users/new-user"),
            )
            .mount(&server)
            .await;

        Mock::given(method("PUT"))
            .and(path("/admin/realms/gateway/users/new-user/reset-password"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        Mock::given(method("PUT"))
            .and(path("/admin/realms/gateway/users/new-user/send-verify-email"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = KeycloakClient::new(test_config(&server.uri()))?;
        client
            .register("Alice", "Doe", "alice", "alice@example.com", "wonder")
            .await?;
        Ok(())
    }

    #[tokio::test]
    async fn profile_resolves_subject_then_refetches() -> Result<()> {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/realms/gateway/protocol/openid-connect/userinfo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "sub": "u1",
                "preferred_username": "alice"
            })))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/realms/master/protocol/openid-connect/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body("admin-at", "")))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/admin/realms/gateway/users/u1"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"id": "u1", "username": "alice"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = KeycloakClient::new(test_config(&server.uri()))?;
        let record = client.profile("user-at").await?;
        assert_eq!(record.id.as_deref(), Some("u1"));
        Ok(())
    }
}
