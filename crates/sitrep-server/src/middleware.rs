//! Request authentication middleware.

use axum::{
    body::Body,
    http::{HeaderMap, Request, StatusCode},
    middleware::Next,
    response::Response,
};
use sitrep_types::SessionUser;
use std::sync::Arc;

use crate::AppState;

/// The authenticated identity for the current request, resolved from the
/// bearer session token and passed to handlers via request extensions.
#[derive(Clone, Debug)]
pub struct SessionContext(pub SessionUser);

/// Extracts the bearer session token from request headers.
///
/// Accepts `Authorization: Bearer <token>` or the `X-Sitrep-Token` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    if let Some(val) = headers.get("Authorization") {
        let val_str = val.to_str().ok()?;
        return val_str.strip_prefix("Bearer ").map(|t| t.to_string());
    }
    if let Some(val) = headers.get("X-Sitrep-Token") {
        return val.to_str().ok().map(|t| t.to_string());
    }
    None
}

/// Middleware to authenticate requests via a bearer session token.
///
/// Resolves the token against the `sessions` table; unknown, expired, or
/// missing tokens are rejected with 401. On success a [`SessionContext`]
/// is inserted into request extensions.
pub async fn auth_middleware(mut req: Request<Body>, next: Next) -> Result<Response, StatusCode> {
    let token = bearer_token(req.headers()).ok_or(StatusCode::UNAUTHORIZED)?;

    let state = req
        .extensions()
        .get::<Arc<AppState>>()
        .ok_or(StatusCode::INTERNAL_SERVER_ERROR)?
        .clone();

    // Session lookup is a blocking DB operation.
    let user = tokio::task::spawn_blocking(move || {
        let conn = state
            .pool
            .get()
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

        // Any auth failure (including "not found") is Unauthorized.
        sitrep_auth::session_for_token(&conn, &token).map_err(|_| StatusCode::UNAUTHORIZED)
    })
    .await
    .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)??;

    req.extensions_mut().insert(SessionContext(user));

    Ok(next.run(req).await)
}
