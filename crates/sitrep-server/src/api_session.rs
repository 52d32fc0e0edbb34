//! Sign-in and sign-out handlers.

use crate::middleware::bearer_token;
use crate::AppState;
use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::Json,
};
use serde::{Deserialize, Serialize};
use sitrep_auth::AuthError;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SignInResponse {
    pub token: String,
    pub email: String,
}

/// POST /api/session
///
/// Verifies credentials and issues a bearer session token. Invalid
/// credentials yield 401 so the login view can block with an alert.
pub async fn sign_in_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<SignInRequest>,
) -> Result<Json<SignInResponse>, StatusCode> {
    let ttl = state.session_ttl_minutes;
    let pool = state.pool.clone();

    let session = tokio::task::spawn_blocking(move || {
        let conn = pool.get().map_err(|e| {
            tracing::error!(error = %e, "failed to get db connection for sign-in");
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
        sitrep_auth::sign_in(&conn, &payload.email, &payload.password, ttl).map_err(|e| match e {
            AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            other => {
                tracing::error!(error = %other, "sign-in failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        })
    })
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "sign-in task join error");
        StatusCode::INTERNAL_SERVER_ERROR
    })??;

    Ok(Json(SignInResponse {
        token: session.token,
        email: session.user.email,
    }))
}

/// DELETE /api/session
///
/// Revokes the bearer token presented with the request. Revoking an
/// already-revoked token succeeds; the caller's session is gone either way.
pub async fn sign_out_handler(
    Extension(state): Extension<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<StatusCode, StatusCode> {
    let token = bearer_token(&headers).ok_or(StatusCode::UNAUTHORIZED)?;
    let pool = state.pool.clone();

    tokio::task::spawn_blocking(move || {
        let conn = pool.get().map_err(|e| {
            tracing::error!(error = %e, "failed to get db connection for sign-out");
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
        sitrep_auth::sign_out(&conn, &token).map_err(|e| {
            tracing::error!(error = %e, "sign-out failed");
            StatusCode::INTERNAL_SERVER_ERROR
        })
    })
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "sign-out task join error");
        StatusCode::INTERNAL_SERVER_ERROR
    })??;

    Ok(StatusCode::NO_CONTENT)
}
