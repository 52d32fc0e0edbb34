use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{json, Value};
use sitrep_db::{create_pool, run_migrations, DbRuntimeSettings};
use sitrep_server::{app, AppState};
use sitrep_store::RecordStore;
use tower::ServiceExt;

fn test_state() -> (AppState, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("server.db");
    let pool = create_pool(path.to_str().unwrap(), DbRuntimeSettings::default()).unwrap();
    {
        let conn = pool.get().unwrap();
        run_migrations(&conn).unwrap();
        sitrep_auth::create_user(&conn, "ops@example.com", "hunter2").unwrap();
    }
    let state = AppState {
        pool: pool.clone(),
        store: RecordStore::new(pool),
        session_ttl_minutes: 60,
    };
    (state, dir)
}

fn sign_in_request(email: &str, password: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/session")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({"email": email, "password": password}).to_string(),
        ))
        .unwrap()
}

#[tokio::test]
async fn sign_in_issues_token() {
    let (state, _dir) = test_state();
    let app = app(state);

    let response = app
        .oneshot(sign_in_request("ops@example.com", "hunter2"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["email"], "ops@example.com");
    assert!(!json["token"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn sign_in_rejects_bad_credentials() {
    let (state, _dir) = test_state();
    let app = app(state);

    let response = app
        .clone()
        .oneshot(sign_in_request("ops@example.com", "wrong"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .oneshot(sign_in_request("nobody@example.com", "hunter2"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn sign_out_revokes_access() {
    let (state, _dir) = test_state();
    let app = app(state);

    let response = app
        .clone()
        .oneshot(sign_in_request("ops@example.com", "hunter2"))
        .await
        .unwrap();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let token = serde_json::from_slice::<Value>(&body).unwrap()["token"]
        .as_str()
        .unwrap()
        .to_string();

    // Token works against a protected route.
    let req = Request::builder()
        .uri("/api/reports")
        .header("Authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Sign out.
    let req = Request::builder()
        .method("DELETE")
        .uri("/api/session")
        .header("Authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // Token no longer works.
    let req = Request::builder()
        .uri("/api/reports")
        .header("Authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Signing out again is a no-op, not an error.
    let req = Request::builder()
        .method("DELETE")
        .uri("/api/session")
        .header("Authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn health_check_returns_ok() {
    let (state, _dir) = test_state();
    let app = app(state);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "ok");
}
