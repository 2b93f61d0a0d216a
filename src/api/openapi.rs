use utoipa::OpenApi;

use crate::api::handlers::types::{LoginRequest, RefreshRequest, RegisterRequest, UserPayload};
use crate::keycloak::types::{TokenPair, UserRecord};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::api::handlers::health::health,
        crate::api::handlers::login::login,
        crate::api::handlers::register::register,
        crate::api::handlers::session::logout,
        crate::api::handlers::session::refresh,
        crate::api::handlers::profile::me,
        crate::api::handlers::profile::get_current_user,
        crate::api::handlers::profile::update_current_user,
        crate::api::handlers::profile::delete_current_user,
        crate::api::handlers::users::get_user,
        crate::api::handlers::users::update_user,
        crate::api::handlers::users::delete_user,
    ),
    components(schemas(
        LoginRequest,
        RegisterRequest,
        UserPayload,
        RefreshRequest,
        TokenPair,
        UserRecord,
    )),
    tags(
        (name = "health", description = "Service health"),
        (name = "auth", description = "Login, registration and session lifecycle"),
        (name = "profile", description = "Current user's profile"),
        (name = "users", description = "User management by id"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_all_gateway_paths() {
        let doc = ApiDoc::openapi();
        let paths = doc.paths.paths;
        for path in [
            "/api/v1/health",
            "/api/v1/login",
            "/api/v1/register",
            "/api/v1/logout",
            "/api/v1/refresh",
            "/api/v1/me",
            "/api/v1/user/me",
            "/api/v1/user/{id}",
        ] {
            assert!(paths.contains_key(path), "missing {path}");
        }
    }
}
