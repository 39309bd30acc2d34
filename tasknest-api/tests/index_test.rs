/// HTTP tests for the landing page

mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use common::{test_config, TestContext};
use std::io::Write;
use tasknest_api::routes::index::FALLBACK_PAGE;
use tower::ServiceExt;

async fn get_index(ctx: &TestContext) -> (StatusCode, String, String) {
    let response = ctx
        .app
        .clone()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    (status, content_type, String::from_utf8(body.to_vec()).unwrap())
}

#[tokio::test]
async fn test_index_renders_readme() {
    let mut readme = tempfile::NamedTempFile::new().unwrap();
    writeln!(readme, "# Task Manager API\n\nSign up with **POST /users**.").unwrap();

    let mut config = test_config();
    config.api.readme_path = readme.path().to_string_lossy().into_owned();
    let ctx = TestContext::with_config(config).await;

    let (status, content_type, body) = get_index(&ctx).await;

    assert_eq!(status, StatusCode::OK);
    assert!(content_type.starts_with("text/html"));
    assert!(body.contains("<h1>Task Manager API</h1>"));
    assert!(body.contains("<strong>POST /users</strong>"));
}

#[tokio::test]
async fn test_index_without_readme() {
    let ctx = TestContext::new().await;

    let (status, content_type, body) = get_index(&ctx).await;

    assert_eq!(status, StatusCode::OK);
    assert!(content_type.starts_with("text/html"));
    assert_eq!(body, FALLBACK_PAGE);
}
