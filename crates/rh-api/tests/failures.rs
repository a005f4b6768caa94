//! Failure paths driven through mocked ports.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use chrono::Utc;
use rh_api::{create_router, ApiPolicy, AppState, MiddlewareConfig};
use rh_core::models::{Identity, User};
use rh_core::traits::{MockContentRepo, MockMediaStore, MockSessionProvider};
use serde_json::Value;
use tower::ServiceExt;

fn signed_in_sessions() -> MockSessionProvider {
    let mut sessions = MockSessionProvider::new();
    sessions.expect_resolve().returning(|token| {
        (token == "good").then(|| Identity {
            id: "alice".to_string(),
            name: Some("Alice".to_string()),
            email: None,
            image: None,
        })
    });
    sessions
}

fn accept_upserts(repo: &mut MockContentRepo) {
    repo.expect_upsert_user().returning(|identity| {
        let now = Utc::now();
        Ok(User {
            id: identity.id.clone(),
            name: identity.name.clone(),
            email: identity.email.clone(),
            image: identity.image.clone(),
            created_at: now,
            updated_at: now,
        })
    });
}

async fn send(state: AppState, req: Request<Body>) -> (StatusCode, Value) {
    let router = create_router(Arc::new(state), MiddlewareConfig::default());
    let resp = router.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn store_failure_on_read_is_500_with_details() {
    let mut repo = MockContentRepo::new();
    repo.expect_get_article()
        .returning(|_| Err(anyhow::anyhow!("database is locked")));
    let state = AppState {
        repo: Box::new(repo),
        store: Box::new(MockMediaStore::new()),
        sessions: Box::new(MockSessionProvider::new()),
        policy: ApiPolicy::default(),
    };

    let req = Request::builder()
        .uri("/api/articles/0191c2f0-7d8a-7c4e-9f00-000000000000")
        .body(Body::empty())
        .unwrap();
    let (code, body) = send(state, req).await;
    assert_eq!(code, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Internal Server Error");
    assert_eq!(body["details"], "database is locked");
}

#[tokio::test]
async fn malformed_id_never_reaches_the_store() {
    let mut repo = MockContentRepo::new();
    repo.expect_get_article().never();
    let state = AppState {
        repo: Box::new(repo),
        store: Box::new(MockMediaStore::new()),
        sessions: Box::new(MockSessionProvider::new()),
        policy: ApiPolicy::default(),
    };

    let req = Request::builder().uri("/api/articles/1234").body(Body::empty()).unwrap();
    let (code, _) = send(state, req).await;
    assert_eq!(code, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn media_store_failure_aborts_upload() {
    let mut repo = MockContentRepo::new();
    accept_upserts(&mut repo);
    repo.expect_create_cad_model().never();

    let mut store = MockMediaStore::new();
    store
        .expect_save_upload()
        .returning(|_, _| Err(anyhow::anyhow!("bucket unavailable")));

    let state = AppState {
        repo: Box::new(repo),
        store: Box::new(store),
        sessions: Box::new(signed_in_sessions()),
        policy: ApiPolicy::default(),
    };

    let boundary = "x-boundary";
    let mut body = String::new();
    for (name, value) in [("title", "Arm"), ("description", "6-DOF"), ("category", "hardware")] {
        body.push_str(&format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
        ));
    }
    for (name, file_name) in [("file", "arm.step"), ("thumbnail", "arm.jpg")] {
        body.push_str(&format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n\r\nbytes\r\n"
        ));
    }
    body.push_str(&format!("--{boundary}--\r\n"));

    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/cad-models")
        .header(header::AUTHORIZATION, "Bearer good")
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={boundary}"))
        .body(Body::from(body))
        .unwrap();
    let (code, body) = send(state, req).await;
    assert_eq!(code, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["details"], "bucket unavailable");
}

#[tokio::test]
async fn dashboard_fails_when_any_read_fails() {
    let mut repo = MockContentRepo::new();
    accept_upserts(&mut repo);
    repo.expect_list_articles_by_user().returning(|_| Ok(Vec::new()));
    repo.expect_list_cad_models_by_user().returning(|_| Ok(Vec::new()));
    repo.expect_stats_for_user()
        .returning(|_| Err(anyhow::anyhow!("stats table missing")));
    repo.expect_saved_articles().returning(|_| Ok(Vec::new()));
    repo.expect_saved_cad_models().returning(|_| Ok(Vec::new()));

    let state = AppState {
        repo: Box::new(repo),
        store: Box::new(MockMediaStore::new()),
        sessions: Box::new(signed_in_sessions()),
        policy: ApiPolicy::default(),
    };

    let req = Request::builder()
        .uri("/api/dashboard")
        .header(header::AUTHORIZATION, "Bearer good")
        .body(Body::empty())
        .unwrap();
    let (code, body) = send(state, req).await;
    assert_eq!(code, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["details"], "stats table missing");
}

#[tokio::test]
async fn invalid_token_is_anonymous_not_an_error() {
    let mut repo = MockContentRepo::new();
    repo.expect_upsert_user().never();
    repo.expect_create_article().never();
    let state = AppState {
        repo: Box::new(repo),
        store: Box::new(MockMediaStore::new()),
        sessions: Box::new(signed_in_sessions()),
        policy: ApiPolicy::default(),
    };

    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/articles")
        .header(header::AUTHORIZATION, "Bearer expired")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"title":"t","content":"c","category":"software"}"#))
        .unwrap();
    let (code, _) = send(state, req).await;
    assert_eq!(code, StatusCode::UNAUTHORIZED);
}
