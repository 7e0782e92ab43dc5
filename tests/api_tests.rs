use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use media_portal::{
    AppConfig, AppState, create_router,
    clock::{ClockState, SystemClock},
    models::{NewSession, SessionStatus},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceExt;

#[derive(Debug)]
pub struct TestApp {
    pub address: String,
}

fn test_state() -> AppState {
    let config = AppConfig {
        max_auth_attempts: 3,
        ..AppConfig::default()
    };
    AppState::from_config(config, Arc::new(SystemClock) as ClockState)
}

async fn spawn_app() -> TestApp {
    let router = create_router(test_state());

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestApp { address }
}

async fn open_session(client: &reqwest::Client, app: &TestApp) -> String {
    let response = client
        .post(format!("{}/sessions", app.address))
        .send()
        .await
        .expect("post fail");
    assert_eq!(response.status(), 201);
    let created: NewSession = response.json().await.unwrap();
    created.session_id.to_string()
}

#[tokio::test]
async fn test_health_check() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let response = client
        .get(format!("{}/health", app.address))
        .send()
        .await
        .expect("req fail");
    assert!(response.status().is_success());
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_admin_login_lifecycle() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let session_id = open_session(&client, &app).await;

    // Admin routes are closed before login.
    let resp = client
        .get(format!("{}/admin/access-attempts", app.address))
        .header("x-session-id", &session_id)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    // Secret shortcut opens the modal.
    let resp = client
        .post(format!("{}/auth/keys", app.address))
        .header("x-session-id", &session_id)
        .json(&serde_json::json!({ "key": "q", "code": "KeyQ", "ctrl_key": true, "alt_key": true }))
        .send()
        .await
        .unwrap();
    let status: SessionStatus = resp.json().await.unwrap();
    assert!(status.show_auth);

    // Wrong password.
    let resp = client
        .post(format!("{}/auth/login", app.address))
        .header("x-session-id", &session_id)
        .json(&serde_json::json!({ "password": "guess" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    // Right password.
    let resp = client
        .post(format!("{}/auth/login", app.address))
        .header("x-session-id", &session_id)
        .header("user-agent", "api-test")
        .json(&serde_json::json!({ "password": "admin123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let status: SessionStatus = resp.json().await.unwrap();
    assert!(status.is_admin);
    assert!(!status.show_auth);
    assert!(status.expires_at.is_some());

    // Admin routes open up.
    let resp = client
        .get(format!("{}/admin/access-attempts", app.address))
        .header("x-session-id", &session_id)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let attempts: Vec<serde_json::Value> = resp.json().await.unwrap();
    assert_eq!(attempts.len(), 2);
    assert_eq!(attempts[1]["outcome"], "granted");
    assert_eq!(attempts[1]["user_agent"], "api-test");

    // Logout closes them again.
    let resp = client
        .post(format!("{}/auth/logout", app.address))
        .header("x-session-id", &session_id)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 204);

    let resp = client
        .get(format!("{}/admin/rate-limit", app.address))
        .header("x-session-id", &session_id)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);
}

#[tokio::test]
async fn test_rate_limited_login_returns_429() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let session_id = open_session(&client, &app).await;

    for _ in 0..3 {
        let resp = client
            .post(format!("{}/auth/login", app.address))
            .header("x-session-id", &session_id)
            .json(&serde_json::json!({ "password": "guess" }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 401);
    }

    let resp = client
        .post(format!("{}/auth/login", app.address))
        .header("x-session-id", &session_id)
        .json(&serde_json::json!({ "password": "admin123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 429);
}

#[tokio::test]
async fn test_session_routes_require_session_header() {
    let router = create_router(test_state());

    let response = router
        .oneshot(
            Request::builder()
                .uri("/auth/session")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_routes_require_session_header() {
    let router = create_router(test_state());

    let response = router
        .oneshot(
            Request::builder()
                .uri("/admin/rate-limit")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_openapi_document_served() {
    let router = create_router(test_state());

    let response = router
        .oneshot(
            Request::builder()
                .uri("/api-docs/openapi.json")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let doc: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert!(doc["paths"].get("/auth/login").is_some());
}

#[tokio::test]
async fn test_closed_session_id_stops_resolving() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let session_id = open_session(&client, &app).await;

    let resp = client
        .delete(format!("{}/auth/session", app.address))
        .header("x-session-id", &session_id)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 204);

    let resp = client
        .get(format!("{}/auth/session", app.address))
        .header("x-session-id", &session_id)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}
