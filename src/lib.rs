//! # Ingresso (Keycloak Authentication Gateway)
//!
//! `ingresso` is a thin HTTP gateway in front of a Keycloak realm. It exposes a
//! small JSON API for login, registration, token refresh, logout, profile
//! lookup and user management, forwards every operation to Keycloak's token
//! and admin REST endpoints, and propagates sessions through `HttpOnly`
//! cookies.
//!
//! The gateway owns no state: Keycloak is the source of truth for every user
//! record and token. Requests carrying an expired access token are silently
//! refreshed once via the `refresh_token` cookie before being rejected.

pub mod api;
pub mod cli;
pub mod keycloak;
