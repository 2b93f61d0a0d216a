use crate::keycloak::KeycloakClient;
use anyhow::Result;
use axum::{
    body::Body,
    extract::{Extension, MatchedPath},
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, ORIGIN, SET_COOKIE},
        HeaderName, HeaderValue, Method, Request, StatusCode, Uri,
    },
    middleware,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde_json::json;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::PropagateRequestIdLayer,
    set_header::SetRequestHeaderLayer,
    trace::TraceLayer,
};
use tracing::{info, info_span, Span};
use ulid::Ulid;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod error;
pub mod gate;
pub mod handlers;
mod openapi;

use handlers::{health, login, profile, register, session, users};

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub static APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

// The browser frontend the cookie contract is designed for
const FRONTEND_ORIGIN: &str = "http://localhost:3000";

/// Build the full gateway router around a shared Keycloak client.
///
/// Routes under `/api/v1/user` sit behind the authentication gate, everything
/// else resolves its own credentials or needs none.
pub fn router(client: Arc<KeycloakClient>) -> Router {
    let gated = Router::new()
        .route(
            "/user/me",
            get(profile::get_current_user)
                .put(profile::update_current_user)
                .delete(profile::delete_current_user),
        )
        .route(
            "/user/:id",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route_layer(middleware::from_fn(gate::require_session));

    let api = Router::new()
        .route("/health", get(health::health))
        .route("/login", post(login::login))
        .route("/register", post(register::register))
        .route("/logout", post(session::logout))
        .route("/refresh", post(session::refresh))
        .route("/me", get(profile::me))
        .merge(gated);

    Router::new()
        .route("/health", get(health::health))
        .nest("/api/v1", api)
        .merge(
            SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi::ApiDoc::openapi()),
        )
        .fallback(not_found)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(cors())
                .layer(Extension(client)),
        )
}

/// Start the server
/// # Errors
/// Return error if failed to start the server
pub async fn new(port: u16, client: Arc<KeycloakClient>) -> Result<()> {
    let app = router(client);

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::exact(HeaderValue::from_static(
            FRONTEND_ORIGIN,
        )))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            ORIGIN,
            CONTENT_TYPE,
            ACCEPT,
            AUTHORIZATION,
            HeaderName::from_static("x-requested-with"),
        ])
        .allow_credentials(true)
        .expose_headers([SET_COOKIE])
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}

// Catch-all for unmatched routes, always a JSON body
async fn not_found(method: Method, uri: Uri) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "route not found",
            "method": method.to_string(),
            "path": uri.path(),
        })),
    )
}
