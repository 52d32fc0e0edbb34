use serde_json::json;
use sitrep_db::{create_pool, run_migrations, DbRuntimeSettings};
use sitrep_server::{app, AppState};
use sitrep_store::RecordStore;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;

async fn start_server() -> (String, AppState, tempfile::TempDir) {
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

    let app = app(state.clone());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server_url = format!("http://{}", addr);

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    (server_url, state, dir)
}

fn issue_token(state: &AppState) -> String {
    let conn = state.pool.get().unwrap();
    sitrep_auth::sign_in(&conn, "ops@example.com", "hunter2", 60)
        .unwrap()
        .token
}

/// Reads SSE chunks until one contains `needle`, or panics after `attempts`.
async fn read_until(response: &mut reqwest::Response, needle: &str, attempts: u32) -> String {
    for _ in 0..attempts {
        let chunk = tokio::time::timeout(Duration::from_secs(5), response.chunk())
            .await
            .expect("timed out waiting for SSE chunk")
            .expect("failed to read chunk")
            .expect("stream closed");
        let chunk_str = String::from_utf8(chunk.to_vec()).unwrap();
        if chunk_str.contains(needle) {
            return chunk_str;
        }
    }
    panic!("did not receive SSE chunk containing {needle:?}");
}

#[tokio::test]
async fn global_stream_delivers_snapshots_live() {
    let (server_url, state, _dir) = start_server().await;
    let token = issue_token(&state);

    let client = reqwest::Client::new();
    let mut response = client
        .get(format!("{}/events/reports", server_url))
        .bearer_auth(&token)
        .send()
        .await
        .expect("failed to connect to SSE stream");
    assert!(response.status().is_success());

    // The initial snapshot arrives without any store activity.
    let initial = read_until(&mut response, "event: snapshot", 5).await;
    assert!(initial.contains("data: []"), "store is empty: {initial}");

    // Submit a report over the API; the stream must redeliver.
    let submit = client
        .post(format!("{}/api/reports", server_url))
        .bearer_auth(&token)
        .json(&json!({
            "date": "2024-01-05",
            "code": "E-12",
            "unit": "Alpha",
            "description": "door jam",
            "severity": "high"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(submit.status(), reqwest::StatusCode::CREATED);

    let update = read_until(&mut response, "E-12", 5).await;
    assert!(update.contains("event: snapshot"));
    assert!(update.contains("\"unit\":\"Alpha\""));
}

#[tokio::test]
async fn unit_stream_only_delivers_matching_records() {
    let (server_url, state, _dir) = start_server().await;
    let token = issue_token(&state);

    let client = reqwest::Client::new();
    let mut response = client
        .get(format!("{}/events/units/Bravo", server_url))
        .bearer_auth(&token)
        .send()
        .await
        .expect("failed to connect to SSE stream");
    assert!(response.status().is_success());

    let initial = read_until(&mut response, "event: snapshot", 5).await;
    assert!(initial.contains("data: []"));

    // An Alpha record changes the store; the Bravo stream redelivers its
    // snapshot, which must still be empty.
    client
        .post(format!("{}/api/reports", server_url))
        .bearer_auth(&token)
        .json(&json!({
            "date": "2024-01-05",
            "code": "E-12",
            "unit": "Alpha",
            "description": "door jam"
        }))
        .send()
        .await
        .unwrap();

    let after_alpha = read_until(&mut response, "event: snapshot", 5).await;
    assert!(
        after_alpha.contains("data: []"),
        "Bravo stream must exclude Alpha records: {after_alpha}"
    );

    // A Bravo record shows up.
    client
        .post(format!("{}/api/reports", server_url))
        .bearer_auth(&token)
        .json(&json!({
            "date": "2024-01-06",
            "code": "E-13",
            "unit": "Bravo",
            "description": "gate stuck"
        }))
        .send()
        .await
        .unwrap();

    let update = read_until(&mut response, "E-13", 5).await;
    assert!(update.contains("\"unit\":\"Bravo\""));
}

#[tokio::test]
async fn stream_ends_with_terminal_lost_event_when_feed_breaks() {
    let (server_url, state, dir) = start_server().await;
    let token = issue_token(&state);

    let client = reqwest::Client::new();
    let mut response = client
        .get(format!("{}/events/reports", server_url))
        .bearer_auth(&token)
        .send()
        .await
        .expect("failed to connect to SSE stream");
    read_until(&mut response, "event: snapshot", 5).await;

    // Rebuild the table without the severity constraint and plant a row the
    // store cannot map, so feed re-queries fail while appends still work.
    {
        let conn =
            rusqlite::Connection::open(dir.path().join("server.db")).expect("failed to open db");
        conn.execute_batch(
            "DROP TABLE incident_reports;
             CREATE TABLE incident_reports (
                 id INTEGER PRIMARY KEY AUTOINCREMENT,
                 report_id TEXT NOT NULL UNIQUE,
                 date TEXT NOT NULL,
                 code TEXT NOT NULL,
                 unit TEXT NOT NULL,
                 description TEXT NOT NULL,
                 severity TEXT NOT NULL DEFAULT 'low',
                 created_at TEXT NOT NULL DEFAULT (datetime('now'))
             );
             INSERT INTO incident_reports (report_id, date, code, unit, description, severity)
             VALUES ('r-bad', '2024-01-05', 'E-0', 'Alpha', 'planted', 'catastrophic');",
        )
        .expect("failed to rebuild table");
    }

    // A successful submit publishes the change notice that triggers the
    // failing re-query.
    let submit = client
        .post(format!("{}/api/reports", server_url))
        .bearer_auth(&token)
        .json(&json!({
            "date": "2024-01-06",
            "code": "E-1",
            "unit": "Alpha",
            "description": "door jam"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(submit.status(), reqwest::StatusCode::CREATED);

    read_until(&mut response, "event: lost", 5).await;
}

#[tokio::test]
async fn stream_requires_authentication() {
    let (server_url, _state, _dir) = start_server().await;

    let client = reqwest::Client::new();
    let response = client
        .get(format!("{}/events/reports", server_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::UNAUTHORIZED);
}
